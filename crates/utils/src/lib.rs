pub mod assets;
pub mod path;
