//! Path context for studio/project/app aware data directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Context for managing application paths based on studio/project/app structure.
#[derive(Debug, Clone)]
pub struct PathContext {
    /// Base path for all application data
    base_path: Arc<Path>,
    studio: String,
    project_id: String,
    app_id: &'static str,
}

impl PathContext {
    /// Creates a PathContext rooted in the platform's local data directory.
    ///
    /// Falls back to the working directory if the platform has none.
    pub fn new(
        studio: impl Into<String>,
        project_id: impl Into<String>,
        app_id: &'static str,
    ) -> Self {
        let base_path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::with_base_path(base_path, studio, project_id, app_id)
    }

    /// Creates a PathContext with an explicit base path (useful for testing).
    pub fn with_base_path(
        base_path: PathBuf,
        studio: impl Into<String>,
        project_id: impl Into<String>,
        app_id: &'static str,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            studio: studio.into(),
            project_id: project_id.into(),
            app_id,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn studio(&self) -> &str {
        &self.studio
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn app_id(&self) -> &str {
        self.app_id
    }

    /// `<base>/<studio>/<project_id>/<app_id>/`
    pub fn app_root(&self) -> PathBuf {
        self.base_path
            .join(&self.studio)
            .join(&self.project_id)
            .join(self.app_id)
    }

    /// Default configuration file: `<app_root>/lobby.toml`
    pub fn config_file(&self) -> PathBuf {
        self.app_root().join("lobby.toml")
    }

    /// `<app_root>/logs/`
    pub fn logs_dir(&self) -> PathBuf {
        self.app_root().join("logs")
    }

    /// Returns a log file path with timestamp: `<app_root>/logs/<app_id>.<timestamp>.log`
    pub fn log_file(&self, timestamp: &str) -> PathBuf {
        self.logs_dir().join(format!("{}.{}.log", self.app_id, timestamp))
    }

    /// Returns a log file path with current timestamp.
    pub fn log_file_now(&self) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        self.log_file(&timestamp)
    }

    /// Ensures all necessary directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.logs_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_studio_project_app() {
        let ctx = PathContext::with_base_path(PathBuf::from("/base"), "studio", "lobby", "browser");
        assert_eq!(ctx.app_root(), PathBuf::from("/base/studio/lobby/browser"));
        assert_eq!(
            ctx.log_file("20260101-000000"),
            PathBuf::from("/base/studio/lobby/browser/logs/browser.20260101-000000.log")
        );
        assert_eq!(
            ctx.config_file(),
            PathBuf::from("/base/studio/lobby/browser/lobby.toml")
        );
    }

    #[test]
    fn ensure_directories_creates_logs_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = PathContext::with_base_path(tmp.path().to_path_buf(), "s", "p", "a");
        ctx.ensure_directories().unwrap();
        assert!(ctx.logs_dir().is_dir());
        assert!(ctx.log_file_now().starts_with(ctx.logs_dir()));
    }
}
