pub mod config;
pub mod core;
pub mod errors;
pub mod store;

// Re-export commonly used items for convenience
pub use config::ServiceConfig;
pub use crate::core::*;
pub use errors::config_error::{ConfigError, ConfigResult};
pub use errors::store_error::{StoreError, StoreResult};
pub use errors::synthesis_error::{SynthesisError, SynthesisResult};
pub use store::{ObjectResultStore, ResultStore};
