pub mod catalog;

pub use catalog::{
    ActionCatalog, AntagonistAction, Command, ProtagonistAction, IDLE_SEED_VALUE,
};
