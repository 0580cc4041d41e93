// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory console log the runtime and Print instructions write to.
//!
//! The frontend drains this into its log panel; nothing here touches a
//! real terminal.

/// Severity of a console entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Informational output (Print nodes).
    Info,
    /// Recoverable run-time problem (failed load, null resource).
    Warn,
    /// Internal error.
    Error,
}

/// One console line.
#[derive(Debug, Clone)]
pub struct ConsoleEntry {
    /// Severity.
    pub level: LogLevel,
    /// Formatted message.
    pub message: String,
}

/// Bounded console log.
#[derive(Debug, Default)]
pub struct ConsoleLog {
    entries: Vec<ConsoleEntry>,
}

impl ConsoleLog {
    /// Maximum retained entries; older lines are dropped.
    pub const MAX_ENTRIES: usize = 4096;

    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        if self.entries.len() >= Self::MAX_ENTRIES {
            self.entries.remove(0);
        }
        self.entries.push(ConsoleEntry {
            level,
            message: message.into(),
        });
    }

    /// Append an info line.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    /// Append a warning line.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message);
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> &[ConsoleEntry] {
        &self.entries
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
