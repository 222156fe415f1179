pub mod paths;

use std::marker::PhantomData;

pub use paths::PathContext;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Application infrastructure context.
///
/// Contains path management, version info, and logging infrastructure.
pub struct AppContext {
    pub path_context: PathContext,
    pub version: &'static str,
    /// The log guard must be kept alive for the duration of the application
    /// to ensure log messages are properly flushed.
    _log_guard: tracing_appender::non_blocking::WorkerGuard,
}

impl AppContext {
    pub fn app_id(&self) -> &str {
        self.path_context.app_id()
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn path_context(&self) -> &PathContext {
        &self.path_context
    }
}

/// Application metadata trait.
///
/// Define your application's identity by implementing this trait.
pub trait Application: Sized + 'static {
    const APP_ID: &'static str;
    const STUDIO: &'static str = "chicken105";
    const PROJECT_ID: &'static str = "lobby";
}

/// Builder performing the common process initialization.
pub struct AppBuilder<A: Application> {
    context: AppContext,
    _marker: PhantomData<A>,
}

impl<A: Application> AppBuilder<A> {
    /// Create a new application builder.
    ///
    /// - Sets up path context (platform-specific directories)
    /// - Initializes logging (file + console)
    /// - Ensures all directories exist
    pub fn new(version: &'static str) -> Result<Self, BoxError> {
        let path_context = PathContext::new(A::STUDIO, A::PROJECT_ID, A::APP_ID);
        Self::with_path_context(path_context, version)
    }

    /// Same as [`AppBuilder::new`] with an explicit path context.
    pub fn with_path_context(
        path_context: PathContext,
        version: &'static str,
    ) -> Result<Self, BoxError> {
        path_context.ensure_directories()?;

        // Get log file path and split into directory + filename
        let log_file_path = path_context.log_file_now();
        let log_dir = log_file_path
            .parent()
            .ok_or("log file path should have parent directory")?;
        let log_filename = log_file_path
            .file_name()
            .ok_or("log file path should have filename")?;

        let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Separate layer: file (non-blocking) + console (stdout)
        let file_layer = fmt::Layer::default()
            .with_target(true)
            .with_ansi(false)
            .with_writer(non_blocking)
            .with_filter(default_filter());

        let console_layer = fmt::Layer::default()
            .with_target(false)
            .with_filter(default_filter());

        tracing_subscriber::registry()
            .with(file_layer)
            .with(console_layer)
            .try_init()?;

        tracing::info!(
            app = A::APP_ID,
            version,
            log = %log_file_path.display(),
            "logging initialized"
        );

        Ok(Self {
            context: AppContext {
                path_context,
                version,
                _log_guard: guard,
            },
            _marker: PhantomData,
        })
    }

    pub fn build(self) -> AppContext {
        self.context
    }
}

/// `RUST_LOG` wins; otherwise INFO in debug builds and WARN in release.
fn default_filter() -> EnvFilter {
    #[cfg(debug_assertions)]
    let level = "info";

    #[cfg(not(debug_assertions))]
    let level = "warn";

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
