//
// Copyright (c) The yangkit Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Diagnostic levels and the per-context sink.
//!
//! Messages admitted by the context's verbosity threshold are forwarded to
//! the `log` crate facade; errors are additionally recorded in the context's
//! last-error slot so callers can retrieve them after a failed operation.

use std::cell::{Cell, RefCell};

use crate::error::{Error, ErrorCode};

/// Verbosity levels, from quietest to noisiest.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum LogLevel {
    Error = 0,
    Warning,
    Verbose,
    Debug,
}

/// Per-context diagnostic sink.
#[derive(Debug)]
pub(crate) struct LogSink {
    level: Cell<LogLevel>,
    last_error: RefCell<Option<Error>>,
}

// ===== impl LogLevel =====

impl LogLevel {
    fn as_log(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Verbose => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }
}

// ===== impl LogSink =====

impl LogSink {
    pub(crate) fn new() -> LogSink {
        LogSink {
            level: Cell::new(LogLevel::Error),
            last_error: RefCell::new(None),
        }
    }

    pub(crate) fn level(&self) -> LogLevel {
        self.level.get()
    }

    pub(crate) fn set_level(&self, level: LogLevel) {
        self.level.set(level);
    }

    pub(crate) fn last_error(&self) -> Option<Error> {
        self.last_error.borrow().clone()
    }

    /// Record a validation error and forward it to the log facade.
    ///
    /// Returns the error so call sites can `return Err(..)` in one step.
    pub(crate) fn error(
        &self,
        errcode: ErrorCode,
        line: Option<u64>,
        msg: String,
    ) -> Error {
        let err = Error {
            errcode,
            msg: Some(msg),
            path: None,
            line,
        };
        self.forward(LogLevel::Error, line, err.msg.as_deref().unwrap_or(""));
        *self.last_error.borrow_mut() = Some(err.clone());
        err
    }

    pub(crate) fn warning(&self, line: Option<u64>, msg: &str) {
        self.forward(LogLevel::Warning, line, msg);
    }

    pub(crate) fn verbose(&self, msg: &str) {
        self.forward(LogLevel::Verbose, None, msg);
    }

    pub(crate) fn debug(&self, msg: &str) {
        self.forward(LogLevel::Debug, None, msg);
    }

    fn forward(&self, level: LogLevel, line: Option<u64>, msg: &str) {
        if level > self.level.get() {
            return;
        }
        match line {
            Some(line) => log::log!(
                target: "yangkit",
                level.as_log(),
                "line {}: {}",
                line,
                msg
            ),
            None => log::log!(target: "yangkit", level.as_log(), "{}", msg),
        }
    }
}
