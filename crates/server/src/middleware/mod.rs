mod model_loaders;

pub use model_loaders::{
    load_card_middleware, load_equipment_middleware, load_process_middleware,
};
