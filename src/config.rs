use crate::db::AdminSeed;
use std::path::PathBuf;

const DEFAULT_LOG_FILTER: &str = "rosterd=info";

/// Sidecar settings, read from the environment (and `.env` if present).
///
/// | Env Var                  | Default        |
/// |--------------------------|----------------|
/// | `ROSTERD_WORKSPACE`      | unset          |
/// | `ROSTERD_LOG`            | `rosterd=info` |
/// | `ROSTERD_ADMIN_USERNAME` | `admin`        |
/// | `ROSTERD_ADMIN_PASSWORD` | `admin123`     |
#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace opened before the first request, if any.
    pub workspace: Option<PathBuf>,
    pub log_filter: String,
    /// User created when a workspace has no users yet.
    pub admin: AdminSeed,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            workspace: non_empty("ROSTERD_WORKSPACE").map(PathBuf::from),
            log_filter: non_empty("ROSTERD_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.into()),
            admin: AdminSeed {
                username: non_empty("ROSTERD_ADMIN_USERNAME").unwrap_or_else(|| "admin".into()),
                password: get("ROSTERD_ADMIN_PASSWORD").unwrap_or_else(|| "admin123".into()),
            },
        }
    }
}
