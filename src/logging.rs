//! Logger setup.
//!
//! Every record goes to stderr and is appended to the installer log file as
//! one timestamped line. `RUST_LOG` overrides the default `info` level.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Writes each buffer to stderr and, when open, to the log file.
pub struct TeeWriter {
    file: Option<File>,
}

impl TeeWriter {
    pub fn new(file: Option<File>) -> Self {
        Self { file }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            // a full disk must not take the installer down with it
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
        Ok(())
    }
}

/// Open the log file for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the logger. `log_file` of `None` logs to stderr only.
pub fn init_logger(log_file: Option<&Path>, verbose: bool) {
    use env_logger::{Builder, Target};

    let (file, open_error) = match log_file.map(open_log_file) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env() // RUST_LOG overrides
        .target(Target::Pipe(Box::new(TeeWriter::new(file))))
        .init();

    if let (Some(path), Some(e)) = (log_file, open_error) {
        log::warn!("Cannot open log file {}: {} (logging to stderr only)", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tee_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installer.log");
        std::fs::write(&path, "earlier\n").unwrap();

        let mut tee = TeeWriter::new(Some(open_log_file(&path).unwrap()));
        tee.write_all(b"line one\n").unwrap();
        tee.flush().unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier\nline one\n"
        );
    }

    #[test]
    fn test_tee_without_file() {
        let mut tee = TeeWriter::new(None);
        assert_eq!(tee.write(b"x").unwrap(), 1);
    }
}
