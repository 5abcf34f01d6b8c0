//! namedsql - Named SQL Parameter Rewriting
//!
//! Query templates are easier to read with descriptive placeholders such as
//! `:user_id`, but most low-level drivers only understand positional `?`.
//! This crate converts one into the other in a single lexical pass and reports
//! which name belongs to which position.
//!
//! ```
//! let rewritten = namedsql::rewrite(
//!     "SELECT * FROM logs WHERE message = 'Time: 10:30' AND user_id = :user_id",
//! );
//! assert_eq!(
//!     rewritten.query,
//!     "SELECT * FROM logs WHERE message = 'Time: 10:30' AND user_id = ?"
//! );
//! assert_eq!(rewritten.params, vec!["user_id"]);
//! ```
//!
//! # Module Organization
//! - [`rewrite`] - The placeholder scanner
//! - [`bind`] - Resolving parameter names to values
//! - [`config`] - Settings files and precedence
//! - [`error`] - Error types and codes
//! - [`output`] - JSON output envelope types
//! - [`logging`] - stderr logging setup
//! - [`mcp`] - MCP server over stdio
//!
//! The CLI and the MCP server are thin wrappers over the same library functions.

pub mod bind;
pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod output;
pub mod rewrite;

pub use bind::{bind, bind_template, from_fn, BoundQuery, FromFn, ParameterSource};
pub use config::{ConfigLocation, Settings, SettingsFile};
pub use error::{NamedSqlError, Result};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use rewrite::{rewrite, rewrite_with, RewriteOptions, RewrittenQuery};
