//! Battle narration logger
//!
//! Narration is observational only. Messages go to stdout, to an in-memory
//! buffer (for tests and determinism checks), or both.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// Verbosity level for battle output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// Silent - no output during the match
    Silent = 0,
    /// Minimal - turn headers and the outcome
    Minimal = 1,
    /// Normal - plays, attacks, skill effects (default)
    #[default]
    Normal = 2,
    /// Verbose - queue traffic, cancelled casts, timers
    Verbose = 3,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

/// A captured log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
}

/// Read-only view of captured entries; derefs to a slice
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Logger owned by one match
pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    log_buffer: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    /// Create a new logger with default verbosity (Normal)
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            output_mode: OutputMode::default(),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Capture to the in-memory buffer only
    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    pub fn disable_capture(&mut self) {
        self.output_mode = OutputMode::Stdout;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    /// Would a message at `level` be kept anywhere?
    ///
    /// Callers check this before formatting so silent matches pay nothing.
    #[inline]
    pub fn wants(&self, level: VerbosityLevel) -> bool {
        level != VerbosityLevel::Silent && level <= self.verbosity
    }

    /// Access captured entries without copying
    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    pub fn clear_logs(&mut self) {
        self.log_buffer.borrow_mut().clear();
    }

    /// Print buffered entries to stdout and clear the buffer
    pub fn flush_buffer(&mut self) {
        for entry in self.log_buffer.borrow().iter() {
            if entry.level <= self.verbosity {
                Self::log_to_stdout(entry.level, &entry.message);
            }
        }
        self.clear_logs();
    }

    #[inline]
    fn log_to_stdout(level: VerbosityLevel, message: &str) {
        if level == VerbosityLevel::Minimal {
            println!("{}", message);
        } else {
            println!("  {}", message);
        }
    }

    #[inline]
    fn log(&self, level: VerbosityLevel, message: &str) {
        if !self.wants(level) {
            return;
        }
        if self.is_capturing() {
            self.log_buffer.borrow_mut().push(LogEntry {
                level,
                message: message.to_string(),
            });
        }
        if matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both) {
            Self::log_to_stdout(level, message);
        }
    }

    #[inline]
    pub fn minimal(&self, message: &str) {
        self.log(VerbosityLevel::Minimal, message);
    }

    #[inline]
    pub fn normal(&self, message: &str) {
        self.log(VerbosityLevel::Normal, message);
    }

    #[inline]
    pub fn verbose(&self, message: &str) {
        self.log(VerbosityLevel::Verbose, message);
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

// Cloning keeps settings but not captured lines
impl Clone for GameLogger {
    fn clone(&self) -> Self {
        GameLogger {
            verbosity: self.verbosity,
            output_mode: self.output_mode,
            log_buffer: RefCell::new(Vec::new()),
        }
    }
}
