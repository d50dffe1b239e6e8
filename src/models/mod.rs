// StreamVault Models
// Data structures for the console

mod activity;
mod console_settings;
mod stats;
mod stream;
mod view;

pub use activity::*;
pub use console_settings::*;
pub use stats::*;
pub use stream::*;
pub use view::*;
