use std::{
    fs::File,
    io::{self, Write},
    sync::Mutex,
    time::Instant,
};

use chrono::Utc;
use once_cell::sync::OnceCell;

static LOGGER: OnceCell<Logger> = OnceCell::new();

/// Severity attached to every diagnostic line.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    const fn tag(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

struct LoggerImpl {
    pub sink: Box<dyn Write + Send>,
    pub start_instant: Instant,
    pub min_level: Level,
}

impl LoggerImpl {
    fn new(kind: LogKind, min_level: Level) -> Self {
        let start_instant = Instant::now();
        match kind {
            LogKind::STDOUT => Self {
                sink: Box::new(io::stdout()),
                start_instant,
                min_level,
            },
            LogKind::FILE => {
                let now = Utc::now();
                let filename = format!("archimedes-{}.log", now.timestamp());
                let path = std::env::temp_dir().join(filename);
                let sink: Box<dyn Write + Send> = match File::create(path) {
                    Ok(file) => Box::new(file),
                    // An unwritable temp dir should not take the emulator down.
                    Err(_) => Box::new(io::stdout()),
                };
                Self {
                    sink,
                    start_instant,
                    min_level,
                }
            }
        }
    }

    fn log<T>(&mut self, level: Level, data: T)
    where
        T: std::fmt::Display,
    {
        if level < self.min_level {
            return;
        }

        let now = self.start_instant.elapsed();
        let seconds = now.as_secs();
        let hours = seconds / 3600;
        let minutes = (seconds / 60) % 60;
        let seconds = seconds % 60;
        let milliseconds = now.subsec_millis();

        writeln!(
            self.sink,
            "[{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}] [{}] {data}",
            level.tag()
        )
        .ok();
    }
}

/// `LogKind` represents the kind of logging: `stdout` or `logfile`.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum LogKind {
    /// It logs to console, the default choice.
    STDOUT,

    /// It logs on a file in /tmp/archimedes-<timestamp>.log
    FILE,
}

struct Logger {
    pub inner_impl: Mutex<LoggerImpl>,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            inner_impl: Mutex::new(LoggerImpl::new(LogKind::STDOUT, Level::Info)),
        }
    }
}

impl Logger {
    fn new(kind: LogKind, min_level: Level) -> Self {
        Self {
            inner_impl: Mutex::new(LoggerImpl::new(kind, min_level)),
        }
    }

    fn log<T>(&self, level: Level, data: T)
    where
        T: std::fmt::Display,
    {
        if let Ok(ref mut inner) = self.inner_impl.lock() {
            inner.log(level, data);
        }
    }
}

pub fn init_logger(kind: LogKind, min_level: Level) {
    LOGGER.set(Logger::new(kind, min_level)).ok();
}

/// Logs through the installed logger, falling back to stderr when no logger
/// was installed (diagnostics still have to land somewhere).
pub fn log<T>(level: Level, data: T)
where
    T: std::fmt::Display,
{
    match LOGGER.get() {
        Some(logger) => logger.log(level, data),
        None => {
            writeln!(io::stderr(), "[{}] {data}", level.tag()).ok();
        }
    }
}

pub fn debug<T: std::fmt::Display>(data: T) {
    log(Level::Debug, data);
}

pub fn info<T: std::fmt::Display>(data: T) {
    log(Level::Info, data);
}

pub fn warn<T: std::fmt::Display>(data: T) {
    log(Level::Warn, data);
}

pub fn error<T: std::fmt::Display>(data: T) {
    log(Level::Error, data);
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{init_logger, log, Level, LogKind};

    #[test]
    fn logger_file() {
        init_logger(LogKind::FILE, Level::Debug);
        log(Level::Info, "ok".to_string());
        let dir = std::env::temp_dir();
        let files = fs::read_dir(dir).unwrap();
        for f in files.flatten() {
            let p = f.path();
            if let Some(ext) = p.extension() {
                let s = p.to_str().unwrap();
                if ext == "log" && s.contains("archimedes") {
                    let s = fs::read_to_string(p.clone()).unwrap();
                    fs::remove_file(p).unwrap();
                    assert_eq!(s, "[00:00:00.000] [INFO] ok\n".to_string());
                }
            }
        }
    }

    #[test]
    fn level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }
}
