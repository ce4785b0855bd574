// Copyright 2026 bytecache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    backtrace::Backtrace,
    fmt::{Debug, Display},
    sync::Arc,
};

use itertools::Itertools;

/// ErrorKind is all kinds of Error of bytecache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Config error.
    Config,
    /// Out of range.
    OutOfRange,
}

impl ErrorKind {
    /// Convert self into static str.
    pub fn into_static(self) -> &'static str {
        self.into()
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

impl From<ErrorKind> for &'static str {
    fn from(v: ErrorKind) -> &'static str {
        match v {
            ErrorKind::Config => "Config error",
            ErrorKind::OutOfRange => "Out of range",
        }
    }
}

/// Error is the error struct returned by all fallible bytecache functions.
///
/// Only construction is fallible. Data path operations report failure through their return values.
///
/// ## Display
///
/// - Via `Display`, the error is printed in a single line:
///
/// ```shell
/// Config error, context: { shards: 3 } => shards must be a power of two
/// ```
///
/// - Via `Debug`, the error is printed in multiple lines with context and backtrace (if captured).
///
/// - Via `{:#?}`, the error is printed as a conventional struct.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,

    context: Vec<(&'static str, String)>,

    backtrace: Option<Arc<Backtrace>>,
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            return f
                .debug_struct("Error")
                .field("kind", &self.kind)
                .field("message", &self.message)
                .field("context", &self.context)
                .field("backtrace", &self.backtrace)
                .finish();
        }

        match self.message.as_str() {
            "" => writeln!(f, "{}", self.kind)?,
            message => writeln!(f, "{} => {message}", self.kind)?,
        }
        if !self.context.is_empty() {
            let lines = self.context.iter().map(|(key, value)| format!("  {key}: {value}")).join("\n");
            write!(f, "\nContext:\n{lines}\n")?;
        }
        if let Some(backtrace) = &self.backtrace {
            write!(f, "\nBacktrace:\n{backtrace}\n")?;
        }
        Ok(())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.context.is_empty() {
            let pairs = self.context.iter().map(|(key, value)| format!("{key}: {value}")).join(", ");
            write!(f, ", context: {{ {pairs} }}")?;
        }
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::new(),
            backtrace: Some(Arc::new(Backtrace::capture())),
        }
    }

    /// Helper for creating an [`ErrorKind::Config`] error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error context.
    pub fn context(&self) -> &Vec<(&'static str, String)> {
        &self.context
    }

    /// Get the error backtrace.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_deref()
    }
}

/// Result type for bytecache.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn is_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn test_send_sync_static() {
        is_send_sync_static::<Error>();
    }

    #[test]
    fn test_error_display() {
        let err = Error::config("shards must be a power of two")
            .with_context("shards", 3)
            .with_context("capacity", 1024);

        assert_eq!(
            "Config error, context: { shards: 3, capacity: 1024 } => shards must be a power of two",
            err.to_string()
        );
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.message(), "shards must be a power of two");
        assert_eq!(err.context().len(), 2);
    }

    #[test]
    fn test_error_display_without_context() {
        let err = Error::new(ErrorKind::OutOfRange, "");
        assert_eq!("Out of range", err.to_string());
    }

    #[test]
    fn test_error_debug() {
        let err = Error::new(ErrorKind::OutOfRange, "arena too large").with_context("arena_size", 1u64 << 40);
        let debug = format!("{err:?}");
        assert!(debug.starts_with("Out of range => arena too large\n"));
        assert!(debug.contains("Context:\n  arena_size: 1099511627776\n"));

        let pretty = format!("{err:#?}");
        assert!(pretty.starts_with("Error {"));
    }

    #[test]
    fn test_error_clone() {
        let err = Error::config("").with_context("chunk_size", 0);
        let cloned = err.clone();
        assert_eq!(cloned.to_string(), "Config error, context: { chunk_size: 0 }");
        assert!(format!("{cloned:?}").starts_with("Config error\n\nContext:\n  chunk_size: 0\n"));
    }
}
