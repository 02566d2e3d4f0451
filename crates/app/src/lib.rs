// Library exports for the boxfs binary and its tests

/**
 * Box REST API client implementing the
 *  remote store interface.
 */
pub mod box_api;
pub mod logging;
/**
 * On-disk state: the ~/.boxfs directory
 *  and its config.toml.
 */
pub mod state;
pub mod version;

pub use box_api::{ApiError, BoxApiClient};
pub use state::{ApiConfig, AppConfig, AppState, StateError};
pub use version::build_info;
