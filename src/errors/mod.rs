pub mod config_error;
pub mod store_error;
pub mod synthesis_error;

pub use config_error::{ConfigError, ConfigResult};
pub use store_error::{StoreError, StoreResult};
pub use synthesis_error::{SynthesisError, SynthesisResult};
