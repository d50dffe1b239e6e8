// View Model
// The console's top-level screens

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Screen the console is currently showing. There is no other navigation
/// state; switching views never touches stream or settings data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Dashboard,
    Ingest,
    Active,
    Processed,
    Settings,
}

impl View {
    /// Human-readable heading for the screen
    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Ingest => "Stream Ingest",
            View::Active => "Active Streams",
            View::Processed => "Processed Videos",
            View::Settings => "Settings",
        }
    }

    /// All screens in navigation order
    pub fn all() -> &'static [View] {
        &[
            View::Dashboard,
            View::Ingest,
            View::Active,
            View::Processed,
            View::Settings,
        ]
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Dashboard => "dashboard",
            View::Ingest => "ingest",
            View::Active => "active",
            View::Processed => "processed",
            View::Settings => "settings",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dashboard" => Ok(View::Dashboard),
            "ingest" => Ok(View::Ingest),
            "active" => Ok(View::Active),
            "processed" => Ok(View::Processed),
            "settings" => Ok(View::Settings),
            other => Err(format!("Unknown view: {}", other)),
        }
    }
}
