use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub blocks_path: Option<PathBuf>,
    pub hotkey: String,
    pub timing: PasteTiming,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            blocks_path: None,
            hotkey: "windows+f11".to_string(),
            timing: PasteTiming::default(),
        }
    }
}

impl AppSettings {
    pub fn resolve_blocks_path(&self) -> Option<PathBuf> {
        self.blocks_path
            .clone()
            .or_else(|| default_config_dir().map(|dir| dir.join("blocks.json")))
    }
}

pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("blockpaste"))
}

/// Pauses around a paste. A cold clipboard (nothing captured) settles slower
/// than a warm one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteTiming {
    pub cold_settle_ms: u64,
    pub warm_settle_ms: u64,
    pub focus_settle_ms: u64,
}

impl Default for PasteTiming {
    fn default() -> Self {
        Self {
            cold_settle_ms: 100,
            warm_settle_ms: 10,
            focus_settle_ms: 50,
        }
    }
}

impl PasteTiming {
    pub fn immediate() -> Self {
        Self {
            cold_settle_ms: 0,
            warm_settle_ms: 0,
            focus_settle_ms: 0,
        }
    }

    pub fn settle(&self, have_backup: bool) -> Duration {
        if have_backup {
            Duration::from_millis(self.warm_settle_ms)
        } else {
            Duration::from_millis(self.cold_settle_ms)
        }
    }

    pub fn focus_settle(&self) -> Duration {
        Duration::from_millis(self.focus_settle_ms)
    }
}
