pub mod board_config;
pub mod card;
pub mod equipment;
pub mod process;
pub mod user;
