//
// Copyright (c) The yangkit Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! YANG schema compiler and YIN toolkit written in Rust.
//!
//! The crate consumes YANG (RFC 6020) modules in their YIN (XML)
//! serialization and compiles them into a normalized, cross-linked schema
//! tree held by a shared [`context::Context`]. Typedefs, imports,
//! includes, identity hierarchies, groupings and list keys are resolved
//! across modules, including forward references.
//!
//! ## Design Goals
//! * Compile YIN schemas into queryable schema trees using idiomatic Rust
//! * Leverage Rust's ownership system so partially built schemas can never
//!   leak out of a failed parse
//! * Automatic resource management
//!
//! ## Example
//!
//! ```no_run
//! use yangkit::context::Context;
//!
//! let mut ctx = Context::new();
//! ctx.set_searchdir("./assets/yang").unwrap();
//! let module = ctx.load_module("ietf-interfaces", None).unwrap();
//! for snode in module.traverse() {
//!     println!("{}", snode.name());
//! }
//! ```

mod error;
mod utils;
mod yin;

pub mod context;
pub mod dict;
pub mod iter;
pub mod logging;
pub mod schema;
pub mod xml;

pub use crate::error::{Error, ErrorCode, Result};
