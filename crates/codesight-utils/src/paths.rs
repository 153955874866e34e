//! Well-known locations for codesight state.
//!
//! Two roots matter:
//! - the per-project directory `<project>/.codesight/` (config, prompts, output)
//! - the user-level home (`CODESIGHT_HOME`, else `~/.codesight`) holding caches

use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;

/// Name of the per-project state directory.
pub const PROJECT_DIR_NAME: &str = ".codesight";

/// Default output file name inside the project directory.
pub const DEFAULT_OUTPUT_FILE: &str = "llm.txt";

// Thread-local override used only in tests to avoid process-global env races.
thread_local! {
    static THREAD_HOME: RefCell<Option<Utf8PathBuf>> = const { RefCell::new(None) };
}

/// Resolve codesight home:
/// 1) thread-local override (tests use this)
/// 2) env `CODESIGHT_HOME`
/// 3) `~/.codesight`, falling back to a relative `.codesight`
#[must_use]
pub fn codesight_home() -> Utf8PathBuf {
    if let Some(tl) = THREAD_HOME.with(|tl| tl.borrow().clone()) {
        return tl;
    }
    if let Ok(p) = std::env::var("CODESIGHT_HOME") {
        return Utf8PathBuf::from(p);
    }
    dirs::home_dir()
        .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
        .map(|home| home.join(PROJECT_DIR_NAME))
        .unwrap_or_else(|| Utf8PathBuf::from(PROJECT_DIR_NAME))
}

/// Returns `<CODESIGHT_HOME>/cache`
#[must_use]
pub fn cache_dir() -> Utf8PathBuf {
    codesight_home().join("cache")
}

/// Returns `<project>/.codesight`
#[must_use]
pub fn project_dir(project_root: &Utf8Path) -> Utf8PathBuf {
    project_root.join(PROJECT_DIR_NAME)
}

/// Resolve where the snapshot is written.
///
/// Absolute paths are used as given. Relative paths always land under
/// `<project>/.codesight/`, unless they already start with `.codesight/`.
#[must_use]
pub fn resolve_output_path(project_root: &Utf8Path, output_file: &Utf8Path) -> Utf8PathBuf {
    if output_file.is_absolute() {
        return output_file.to_path_buf();
    }
    let starts_in_project_dir = output_file
        .components()
        .next()
        .is_some_and(|c| c.as_str() == PROJECT_DIR_NAME);
    if starts_in_project_dir {
        project_root.join(output_file)
    } else {
        project_dir(project_root).join(output_file)
    }
}

/// mkdir -p; treat `AlreadyExists` as success (removes TOCTTOU races)
pub fn ensure_dir_all<P: AsRef<std::path::Path>>(p: P) -> std::io::Result<()> {
    match std::fs::create_dir_all(&p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// RAII guard for isolated home that clears thread-local state on drop
#[cfg(any(test, feature = "test-utils"))]
pub struct HomeGuard {
    inner: tempfile::TempDir,
}

#[cfg(any(test, feature = "test-utils"))]
impl Drop for HomeGuard {
    fn drop(&mut self) {
        THREAD_HOME.with(|tl| *tl.borrow_mut() = None);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl std::ops::Deref for HomeGuard {
    type Target = tempfile::TempDir;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Give this test a unique codesight home under the system temp dir.
///
/// Hold the `HomeGuard` for the test's duration so the directory stays alive.
#[cfg(any(test, feature = "test-utils"))]
#[must_use]
pub fn with_isolated_home() -> HomeGuard {
    let td = tempfile::TempDir::new().expect("create temp home");
    let p = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).expect("utf-8 temp dir");
    THREAD_HOME.with(|tl| *tl.borrow_mut() = Some(p));
    HomeGuard { inner: td }
}
