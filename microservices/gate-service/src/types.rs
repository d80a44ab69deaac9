//! Gate Service types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateAction {
    Open,
    Close,
}

impl GateAction {
    pub fn as_str(self) -> &'static str {
        match self {
            GateAction::Open => "open",
            GateAction::Close => "close",
        }
    }
}

impl fmt::Display for GateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(GateAction::Open),
            "close" => Ok(GateAction::Close),
            _ => Err(()),
        }
    }
}

/// One row of `gate_log`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateLogEntry {
    pub id: i64,
    pub action: GateAction,
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}
