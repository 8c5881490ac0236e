//! Backend specification submitted with start/restart

use crate::domain::entities::User;
use serde::{Deserialize, Serialize};

/// The bundle of configuration text, protocol kind and initial user list
/// handed to `start`/`restart`. Transient input: the supervisor copies what
/// it needs into its own state and does not retain the spec itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSpec {
    pub kind: String,

    /// Opaque serialized configuration for the supervised core. Persisted
    /// verbatim to the core config path before each launch.
    pub raw_config: String,

    #[serde(default)]
    pub users: Vec<User>,

    #[serde(default)]
    pub keep_alive: bool,
}

impl BackendSpec {
    /// Spec with no initial users, as submitted by the REST surface.
    pub fn config_only(kind: impl Into<String>, raw_config: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            raw_config: raw_config.into(),
            users: Vec::new(),
            keep_alive: false,
        }
    }
}
