//
// Copyright (c) The yangkit Core Contributors
//
// SPDX-License-Identifier: MIT
//

use num_derive::FromPrimitive;

use crate::context::Context;

/// A convenience wrapper around `Result` for `yangkit::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured codes for validation and parse failures.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
pub enum ErrorCode {
    Other = 0,
    /// Allocation or capacity failure.
    Memory,
    /// Malformed XML document.
    Xml,
    /// File not found, not a regular file, or read failed.
    Io,
    /// Unknown statement in the YIN namespace.
    UnknownStatement,
    /// Statement present more times than its cardinality allows.
    TooManyStatements,
    /// Missing required argument (attribute or argument element).
    MissingArgument,
    /// Missing mandatory substatement.
    MissingStatement,
    /// Invalid argument value.
    InvalidArgument,
    /// Prefix does not resolve through the module's imports.
    UnresolvablePrefix,
    /// Referenced typedef does not exist in any visible scope.
    UnknownTypedef,
    /// Referenced grouping does not exist in any visible scope.
    UnknownGrouping,
    /// Referenced identity does not exist.
    UnknownIdentity,
    /// List declared as configuration with no key statement.
    MissingKey,
    /// Key name does not match any direct leaf child of the list.
    KeyNotFound,
    /// Key references a node that is not a leaf.
    KeyNotLeaf,
    /// Two keys reference the same leaf.
    DuplicateKey,
    /// Key leaf has type `empty`.
    KeyTypeEmpty,
    /// Key config flag differs from the list's.
    KeyConfigMismatch,
    /// Enum name already used within the enumeration.
    DuplicateEnumName,
    /// Enum value already assigned within the enumeration.
    DuplicateEnumValue,
    /// Enum name has leading or trailing whitespace.
    EnumNameWhitespace,
    /// A module with the same name and latest revision is already registered.
    DuplicateModule,
}

/// Enum listing possible errors from yangkit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    pub errcode: ErrorCode,
    pub msg: Option<String>,
    pub path: Option<String>,
    pub line: Option<u64>,
}

impl Error {
    /// Retrieve the last error recorded on the context.
    pub fn new(ctx: &Context) -> Error {
        ctx.last_error().unwrap_or_default()
    }

    pub(crate) fn other(msg: &str) -> Error {
        Self {
            msg: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl Default for Error {
    fn default() -> Self {
        Self {
            errcode: ErrorCode::Other,
            msg: None,
            path: None,
            line: None,
        }
    }
}

impl std::fmt::Display for Error {
    // Print only the base error message by default.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(msg) = &self.msg {
            write!(f, "{}", msg)
        } else {
            write!(f, "Unknown error: {:?}", self.errcode)
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error {
            errcode: ErrorCode::Io,
            msg: Some(err.to_string()),
            ..Default::default()
        }
    }
}
