//! Rolling Logger
//!
//! Size-rotated log files plus an in-memory ring of recent lines, installed
//! as the global `tracing` subscriber. `log` records from library crates are
//! bridged in, so `log::info!` and `tracing::info!` land in the same files.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;

/// Rotation and buffer sizes
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Rotate once the active file would grow past this
    pub max_file_bytes: u64,
    /// Active file plus rotated ones
    pub max_files: usize,
    /// Lines kept in memory for `recent_lines()`
    pub recent_lines: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
            max_files: 3,
            recent_lines: 500,
        }
    }
}

static LOGGER: OnceLock<RollingLog> = OnceLock::new();

struct RollingState {
    dir: PathBuf,
    app_name: String,
    limits: Limits,
    file: File,
    written: u64,
    recent: VecDeque<String>,
}

impl RollingState {
    fn path(&self, index: usize) -> PathBuf {
        rotated_path(&self.dir, &self.app_name, index)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let last = self.limits.max_files.saturating_sub(1);
        if last == 0 {
            self.file = File::create(self.path(0))?;
            self.written = 0;
            return Ok(());
        }

        let _ = fs::remove_file(self.path(last));
        for index in (0..last).rev() {
            let from = self.path(index);
            if from.exists() {
                fs::rename(&from, self.path(index + 1))?;
            }
        }
        self.file = open_append(&self.path(0))?;
        self.written = 0;
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let bytes = line.len() as u64 + 1;
        if self.written > 0 && self.written + bytes > self.limits.max_file_bytes {
            self.rotate()?;
        }
        writeln!(self.file, "{}", line)?;
        self.written += bytes;

        if self.limits.recent_lines > 0 {
            if self.recent.len() == self.limits.recent_lines {
                self.recent.pop_front();
            }
            self.recent.push_back(line.to_string());
        }
        Ok(())
    }
}

fn rotated_path(dir: &Path, app_name: &str, index: usize) -> PathBuf {
    if index == 0 {
        dir.join(format!("{}.log", app_name))
    } else {
        dir.join(format!("{}.{}.log", app_name, index))
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Shared handle to the active log file and ring buffer
#[derive(Clone)]
pub struct RollingLog {
    state: Arc<Mutex<RollingState>>,
}

impl RollingLog {
    pub fn open(dir: impl Into<PathBuf>, app_name: &str) -> io::Result<Self> {
        Self::open_with(dir, app_name, Limits::default())
    }

    pub fn open_with(dir: impl Into<PathBuf>, app_name: &str, limits: Limits) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let path = rotated_path(&dir, app_name, 0);
        let file = open_append(&path)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            state: Arc::new(Mutex::new(RollingState {
                dir,
                app_name: app_name.to_string(),
                limits,
                file,
                written,
                recent: VecDeque::with_capacity(limits.recent_lines),
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RollingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append one line, rotating first if the active file is full
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        self.lock().write_line(line)
    }

    /// Lines still held in memory, oldest first
    pub fn recent(&self) -> Vec<String> {
        self.lock().recent.iter().cloned().collect()
    }
}

/// Buffers one formatted event and commits it line by line on drop
pub struct EventWriter {
    log: RollingLog,
    buf: Vec<u8>,
}

impl Write for EventWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        for line in text.lines().filter(|line| !line.is_empty()) {
            #[cfg(debug_assertions)]
            eprintln!("{}", line);
            let _ = self.log.write_line(line);
        }
    }
}

impl<'a> MakeWriter<'a> for RollingLog {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            log: self.clone(),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Local wall-clock timestamps with milliseconds
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global subscriber writing to `<log_dir>/<app_name>.log`
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), String> {
    let log = RollingLog::open(log_dir, app_name).map_err(|e| format!("Failed to open log file: {}", e))?;

    tracing_subscriber::fmt()
        .with_writer(log.clone())
        .with_ansi(false)
        .with_timer(LocalTime)
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .map_err(|e| format!("Failed to install logger: {}", e))?;

    LOGGER
        .set(log)
        .map_err(|_| "Logger already initialized".to_string())
}

fn installed() -> Result<&'static RollingLog, String> {
    LOGGER.get().ok_or_else(|| "Logger not initialized".to_string())
}

pub fn info(message: &str) -> Result<(), String> {
    installed()?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), String> {
    installed()?;
    tracing::error!("{}", message);
    Ok(())
}

/// Recent lines of the installed logger, oldest first
pub fn recent_lines() -> Vec<String> {
    installed().map(RollingLog::recent).unwrap_or_default()
}
