//! Per-computation working directory and environment isolation
//!
//! Each engine call runs inside a fresh temporary directory which becomes the
//! working directory, with cache/temp variables pointed at it. Everything is
//! restored when the [`Sandbox`] guard drops, including during a panic.
//!
//! The working directory and environment are process-global, so sessions are
//! serialized on a single lock. Engines receive the [`SandboxContext`]
//! explicitly and should prefer it over reading the environment.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;

use crate::error::ChartError;

static ENGINE_LOCK: Mutex<()> = Mutex::new(());

/// Variables redirected into the sandbox
pub const SANDBOX_ENV_VARS: &[&str] = &["ASTROLABE_CACHE_DIR", "XDG_CACHE_HOME", "TMPDIR", "TMP", "TEMP"];

/// Cache folders created up front in every sandbox
pub const SANDBOX_SUBDIRS: &[&str] = &[".cache", "cache", ".astrolabe"];

/// How sandboxes are laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    pub prefix: String,
    pub env_vars: Vec<String>,
    pub subdirs: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            prefix: "astrolabe_work_".to_string(),
            env_vars: SANDBOX_ENV_VARS.iter().map(|s| s.to_string()).collect(),
            subdirs: SANDBOX_SUBDIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// What an engine call may use while it runs
#[derive(Debug, Clone)]
pub struct SandboxContext {
    root: PathBuf,
}

impl SandboxContext {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Guard holding one acquired sandbox
pub struct Sandbox {
    dir: Option<TempDir>,
    original_cwd: Option<PathBuf>,
    saved_env: Vec<(String, Option<OsString>)>,
}

impl Sandbox {
    /// Create the directory, switch into it and redirect the environment
    ///
    /// On error, whatever was already changed is undone by `Drop`.
    pub fn enter(config: &SandboxConfig) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(&config.prefix).tempdir()?;
        let root = dir.path().to_path_buf();

        let mut sandbox = Sandbox {
            dir: Some(dir),
            original_cwd: None,
            saved_env: Vec::with_capacity(config.env_vars.len()),
        };

        for sub in &config.subdirs {
            fs::create_dir_all(root.join(sub))?;
        }

        let cwd = env::current_dir()?;
        env::set_current_dir(&root)?;
        sandbox.original_cwd = Some(cwd);

        for key in &config.env_vars {
            sandbox.saved_env.push((key.clone(), env::var_os(key)));
            env::set_var(key, &root);
        }

        Ok(sandbox)
    }

    pub fn context(&self) -> SandboxContext {
        SandboxContext {
            root: self
                .dir
                .as_ref()
                .map(|d| d.path().to_path_buf())
                .unwrap_or_default(),
        }
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        if let Some(cwd) = self.original_cwd.take() {
            if let Err(e) = env::set_current_dir(&cwd) {
                tracing::warn!(path = %cwd.display(), error = %e, "failed to restore working directory");
            }
        }

        for (key, value) in self.saved_env.drain(..).rev() {
            match value {
                Some(v) => env::set_var(&key, v),
                None => env::remove_var(&key),
            }
        }

        // Best-effort: a leftover temp dir is logged, never reported to callers
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove sandbox directory");
            }
        }
    }
}

fn lock_engine() -> MutexGuard<'static, ()> {
    ENGINE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run `f` inside a fresh sandbox, restoring the process state afterwards
pub fn run_isolated<T>(
    config: &SandboxConfig,
    f: impl FnOnce(&SandboxContext) -> Result<T, ChartError>,
) -> Result<T, ChartError> {
    let _lock = lock_engine();
    let sandbox = Sandbox::enter(config)?;
    let ctx = sandbox.context();
    tracing::trace!(root = %ctx.root().display(), "entered sandbox");
    f(&ctx)
}

/// Serializes tests that observe the working directory or environment
#[cfg(test)]
pub(crate) fn serial_guard() -> MutexGuard<'static, ()> {
    static TESTS: Mutex<()> = Mutex::new(());
    TESTS.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(config: &SandboxConfig) -> (PathBuf, Vec<Option<OsString>>) {
        (
            env::current_dir().unwrap(),
            config.env_vars.iter().map(env::var_os).collect(),
        )
    }

    #[test]
    fn test_inside_sandbox_state() {
        let _serial = serial_guard();
        let config = SandboxConfig::default();

        let root = run_isolated(&config, |ctx| {
            let root = ctx.root().to_path_buf();
            assert_eq!(
                env::current_dir().unwrap().canonicalize().unwrap(),
                root.canonicalize().unwrap()
            );
            for key in &config.env_vars {
                assert_eq!(env::var_os(key), Some(root.clone().into_os_string()));
            }
            for sub in &config.subdirs {
                assert!(root.join(sub).is_dir());
            }
            Ok(root)
        })
        .unwrap();

        assert!(!root.exists());
    }

    #[test]
    fn test_restores_after_success_and_error() {
        let _serial = serial_guard();
        let config = SandboxConfig::default();
        let before = snapshot(&config);

        let ok: Result<u8, ChartError> = run_isolated(&config, |_| Ok(7));
        assert_eq!(ok.unwrap(), 7);
        assert_eq!(snapshot(&config), before);

        let err: Result<u8, ChartError> =
            run_isolated(&config, |_| Err(ChartError::Ephemeris("boom".to_string())));
        assert_eq!(err.unwrap_err().kind(), "Ephemeris");
        assert_eq!(snapshot(&config), before);
    }

    #[test]
    fn test_restores_after_panic() {
        let _serial = serial_guard();
        let config = SandboxConfig::default();
        let before = snapshot(&config);

        let mut seen_root = None;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: Result<(), ChartError> = run_isolated(&config, |ctx| {
                seen_root = Some(ctx.root().to_path_buf());
                panic!("engine crashed");
            });
        }));

        assert!(result.is_err());
        assert_eq!(snapshot(&config), before);
        assert!(!seen_root.unwrap().exists());

        // The lock survives the poisoned session
        let again: Result<(), ChartError> = run_isolated(&config, |_| Ok(()));
        assert!(again.is_ok());
    }

    #[test]
    fn test_unset_variable_is_removed_again() {
        let _serial = serial_guard();
        let config = SandboxConfig {
            env_vars: vec!["ASTROLABE_SANDBOX_PROBE".to_string()],
            ..SandboxConfig::default()
        };
        env::remove_var("ASTROLABE_SANDBOX_PROBE");

        run_isolated(&config, |_| {
            assert!(env::var_os("ASTROLABE_SANDBOX_PROBE").is_some());
            Ok(())
        })
        .unwrap();

        assert!(env::var_os("ASTROLABE_SANDBOX_PROBE").is_none());
    }
}
