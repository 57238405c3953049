use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File logging configuration
///
/// All diagnostic output goes to the log file; the console is left to the
/// command's result line.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
    pub log_file: PathBuf,
    pub json: bool,
}

impl LoggingConfig {
    /// Install the global subscriber. Keep the returned guard alive until
    /// exit so buffered lines reach the file.
    pub fn init(&self) -> Result<WorkerGuard> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let (dir, file_name) = split_log_path(&self.log_file)?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {:?}", dir))?;

        let file_appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(false);

        let registry = Registry::default().with(env_filter);
        if self.json {
            registry.with(file_layer.json()).try_init()
        } else {
            registry.with(file_layer).try_init()
        }
        .context("Failed to install tracing subscriber")?;

        Ok(guard)
    }
}

fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Log file path {:?} has no file name", path))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Ok((dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_name_logs_to_current_dir() {
        let (dir, name) = split_log_path(Path::new("skiff.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "skiff.log");
    }

    #[test]
    fn directory_path_is_rejected() {
        assert!(split_log_path(Path::new("/")).is_err());
    }
}
