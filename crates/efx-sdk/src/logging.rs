use tracing_subscriber::EnvFilter;

use crate::error::{SdkError, SdkResult};

/// Install a global fmt subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Fails if a global subscriber is already installed.
pub fn init(default_filter: &str) -> SdkResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| SdkError::Config(e.to_string()))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| SdkError::Logging(e.to_string()))
}
