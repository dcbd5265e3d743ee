use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;

/// Where log records should go when no terminal is available for them.
///
/// `--log-file` wins over `HEXTERM_LOG_FILE`; debug builds fall back to a
/// timestamped file in the working directory.
pub fn log_file_path(explicit: Option<&str>) -> Option<PathBuf> {
    explicit
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HEXTERM_LOG_FILE").map(PathBuf::from))
        .or_else(|| {
            if cfg!(debug_assertions) {
                Some(PathBuf::from(format!(
                    "./log_{}.log",
                    Local::now().format("%Y%m%d%H%M%S")
                )))
            } else {
                None
            }
        })
}

/// Set up logging. The terminal UI owns the screen, so a file logger is
/// preferred; `env_logger` on stderr is the fallback.
pub fn init_common(explicit_log_file: Option<&str>) {
    if let Some(path) = log_file_path(explicit_log_file) {
        match init_file_logger(&path) {
            Ok(()) => return,
            Err(err) => eprintln!("{err:#}"),
        }
    }
    let _ = env_logger::try_init();
}

fn init_file_logger(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} {} [{}] - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(file)))
        .filter_level(LevelFilter::Debug)
        .parse_default_env()
        .try_init()
        .context("Logger already initialized")?;

    log::info!("hexterm {} logging to {}", env!("CARGO_PKG_VERSION"), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        assert_eq!(
            log_file_path(Some("/tmp/hexterm.log")),
            Some(PathBuf::from("/tmp/hexterm.log"))
        );
    }
}
