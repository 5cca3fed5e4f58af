// ================= 日志初始化 =================

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming};
use log::info;

use crate::constants::logging::{
    DEFAULT_LOG_LEVEL, LOG_DIR, LOG_FILE_MAX_COUNT, LOG_FILE_MAX_SIZE,
};

/// First candidate that exists (or can be created) as a directory, else `.`.
pub fn resolve_log_dir<P: AsRef<Path>>(candidates: &[P]) -> PathBuf {
    candidates
        .iter()
        .map(|p| AsRef::<Path>::as_ref(p))
        .find(|p| {
            std::fs::create_dir_all(p).ok();
            std::fs::metadata(p).map(|m| m.is_dir()).unwrap_or(false)
        })
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn log_basename(program_name: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d_%H_%M_%S").to_string();
    format!("{}_{}", program_name, timestamp)
}

pub fn initialize_logging(program_name: &str) -> Result<()> {
    let log_dir = resolve_log_dir(&[LOG_DIR]);
    let log_spec = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

    Logger::try_with_str(log_spec)?
        .format_for_files(flexi_logger::detailed_format)
        .format_for_stderr(flexi_logger::colored_opt_format)
        .log_to_file(
            FileSpec::default()
                .directory(&log_dir)
                .basename(log_basename(program_name))
                .suffix("log"),
        )
        .duplicate_to_stdout(Duplicate::Info)
        .rotate(
            Criterion::Size(LOG_FILE_MAX_SIZE),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_FILE_MAX_COUNT),
        )
        .start()?;

    info!("Log directory: {}", log_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_usable_candidate_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("logs").join("overlay");
        let chosen = resolve_log_dir(&[nested.clone()]);
        assert_eq!(chosen, nested);
        assert!(nested.is_dir());
    }

    #[test]
    fn falls_back_to_working_directory() {
        let tmp = tempfile::tempdir().unwrap();
        // a regular file cannot become a log directory
        let file = tmp.path().join("not_a_dir");
        std::fs::write(&file, b"x").unwrap();
        assert_eq!(resolve_log_dir(&[file]), PathBuf::from("."));

        let none: [&str; 0] = [];
        assert_eq!(resolve_log_dir(&none), PathBuf::from("."));
    }

    #[test]
    fn basename_prefixes_program() {
        let name = log_basename("winit_softbuffer_overlay");
        assert!(name.starts_with("winit_softbuffer_overlay_"));
        // YYYY-mm-dd_HH_MM_SS
        assert_eq!(name.len(), "winit_softbuffer_overlay_".len() + 19);
    }
}
