//! Runtime configuration from environment variables

use std::env;
use std::path::{Path, PathBuf};

use crate::gazetteer::default_gazetteer_path;
use crate::sandbox::SandboxConfig;

pub const ENV_GAZETTEER: &str = "ASTROLABE_GAZETTEER";
pub const ENV_EPHE_PATH: &str = "ASTROLABE_EPHE_PATH";
pub const ENV_SANDBOX_PREFIX: &str = "ASTROLABE_SANDBOX_PREFIX";

/// Server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Gazetteer JSON file, always absolute
    pub gazetteer_path: PathBuf,
    /// Swiss Ephemeris data directory; `None` uses the built-in Moshier ephemeris
    pub ephe_path: Option<PathBuf>,
    pub sandbox: SandboxConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup, so tests need not touch the real environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gazetteer_path = non_empty(ENV_GAZETTEER)
            .map(PathBuf::from)
            .unwrap_or_else(default_gazetteer_path);

        let mut sandbox = SandboxConfig::default();
        if let Some(prefix) = non_empty(ENV_SANDBOX_PREFIX) {
            sandbox.prefix = prefix;
        }

        Self {
            gazetteer_path: absolutize(&gazetteer_path),
            ephe_path: non_empty(ENV_EPHE_PATH).map(|p| absolutize(Path::new(&p))),
            sandbox,
        }
    }
}

/// Anchor relative paths at startup, before any sandbox moves the working directory
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot resolve relative path");
            path.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let _serial = crate::sandbox::serial_guard();
        let cfg = config(&[]);
        assert!(cfg.gazetteer_path.is_absolute());
        assert!(cfg.gazetteer_path.ends_with("china_cities.json"));
        assert!(cfg.ephe_path.is_none());
        assert_eq!(cfg.sandbox, SandboxConfig::default());
    }

    #[test]
    fn test_overrides() {
        let _serial = crate::sandbox::serial_guard();
        let cfg = config(&[
            (ENV_GAZETTEER, "/srv/geo/cities.json"),
            (ENV_EPHE_PATH, "data/ephe"),
            (ENV_SANDBOX_PREFIX, "chart_"),
        ]);
        assert_eq!(cfg.gazetteer_path, PathBuf::from("/srv/geo/cities.json"));
        let ephe = cfg.ephe_path.unwrap();
        assert!(ephe.is_absolute());
        assert!(ephe.ends_with("data/ephe"));
        assert_eq!(cfg.sandbox.prefix, "chart_");
    }

    #[test]
    fn test_blank_values_ignored() {
        let _serial = crate::sandbox::serial_guard();
        let cfg = config(&[(ENV_EPHE_PATH, "  "), (ENV_SANDBOX_PREFIX, "")]);
        assert!(cfg.ephe_path.is_none());
        assert_eq!(cfg.sandbox.prefix, "astrolabe_work_");
    }
}
