// StreamVault Services
// Business logic layer

mod activity_log;
mod events;
mod gateway;
mod refresh;
mod registry;
mod settings_store;
mod simulated;

pub use activity_log::*;
pub use events::*;
pub use gateway::*;
pub use refresh::*;
pub use registry::*;
pub use settings_store::*;
pub use simulated::*;
