pub mod context;
pub mod settings;

pub use settings::{Config, GlobalOptions, PdmConfig, SelectionConfig, SyncConfig};
