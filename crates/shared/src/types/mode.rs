//! Update modes shared by balance and quantity mutations.

use serde::{Deserialize, Serialize};

/// How a ledger update combines the requested amount with the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateMode {
    /// Increase the current value by the amount.
    Add,
    /// Decrease the current value by the amount.
    Subtract,
    /// Replace the current value with the amount.
    #[serde(alias = "Update")]
    Set,
}

impl std::fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Add => "Add",
            Self::Subtract => "Subtract",
            Self::Set => "Set",
        };
        f.write_str(name)
    }
}
