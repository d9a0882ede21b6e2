//! Loading service configuration (store behaviour + subject seeds) from TOML.
//!
//! Every key is optional. Example:
//!
//! ```toml
//! [store]
//! snapshot_path = "data/levels.json"
//! duplicate_subject = "reject"   # or "overwrite"
//!
//! [[subjects]]
//! id = "alphabet"
//! name = "Alphabet"
//! description = "Letters A to Z"
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

pub const CONFIG_PATH_ENV: &str = "LEVELCRAFT_CONFIG_PATH";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub subjects: Vec<SubjectCfg>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct StoreConfig {
    /// JSON file the document tree is persisted to after every write.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    #[serde(default)]
    pub duplicate_subject: DuplicateSubjectPolicy,
}

/// What `createSubject` does when the subject document already exists.
#[derive(Clone, Copy, Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateSubjectPolicy {
    #[default]
    Reject,
    Overwrite,
}

/// Subject entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct SubjectCfg {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub fn parse_app_config(raw: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str::<AppConfig>(raw)
}

/// Attempt to load `AppConfig` from LEVELCRAFT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).ok()?;
    match std::fs::read_to_string(&path) {
        Ok(s) => match parse_app_config(&s) {
            Ok(cfg) => {
                info!(
                    target: "levelcraft",
                    %path,
                    subjects = cfg.subjects.len(),
                    "Loaded config (TOML)"
                );
                Some(cfg)
            }
            Err(e) => {
                error!(target: "levelcraft", %path, error = %e, "Failed to parse TOML config");
                None
            }
        },
        Err(e) => {
            error!(target: "levelcraft", %path, error = %e, "Failed to read TOML config file");
            None
        }
    }
}
