//! Named Parameter Rewriting
//!
//! Converts a query template that uses `:name` placeholders into the positional
//! `?` form expected by low-level drivers, together with the ordered list of
//! parameter names.
//!
//! # Scanning Rules
//! - Single left-to-right pass, one cursor, at most one byte of lookahead
//! - `:` followed by an ASCII letter or `_` starts a placeholder; the name runs
//!   over ASCII letters, digits and `_`
//! - Quoted text (`'...'` or `"..."`) is copied verbatim; a doubled delimiter
//!   inside the literal is an escaped quote
//! - `::` is a cast operator and is copied as a unit
//! - Anything else, including dangling colons, is copied through unchanged
//!
//! This is a lexical preprocessor, not a SQL parser. It never fails: ambiguous
//! or malformed input is copied through rather than rejected.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Scanner switches
///
/// Both extensions are off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOptions {
    /// Treat `-- ...` and `/* ... */` as opaque comments
    #[serde(default)]
    pub skip_comments: bool,

    /// Inside a literal, a backslash escapes the next character (MySQL)
    #[serde(default)]
    pub backslash_escapes: bool,
}

impl RewriteOptions {
    /// Options with comment awareness enabled
    #[must_use]
    pub const fn with_comments(mut self) -> Self {
        self.skip_comments = true;
        self
    }

    /// Options with backslash escapes enabled
    #[must_use]
    pub const fn with_backslash_escapes(mut self) -> Self {
        self.backslash_escapes = true;
        self
    }
}

/// Result of rewriting a template
///
/// The N-th substituted `?` in `query` binds to `params[N]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewrittenQuery {
    /// Query text with positional `?` placeholders
    pub query: String,

    /// Parameter names in placeholder order (repeats preserved)
    pub params: Vec<String>,

    /// Byte offset of each substituted `?` in `query`
    #[serde(skip)]
    slots: Vec<usize>,
}

impl RewrittenQuery {
    /// Number of substituted placeholders
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.params.len()
    }

    /// Whether the template contained any placeholder
    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        !self.params.is_empty()
    }

    /// Byte offsets of the substituted `?` characters
    ///
    /// Literal `?` characters already present in the template are not slots.
    #[must_use]
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    /// Parameter names deduplicated, in first-seen order
    #[must_use]
    pub fn distinct_params(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for name in &self.params {
            if !seen.contains(&name.as_str()) {
                seen.push(name.as_str());
            }
        }
        seen
    }

    /// Rebuild the original template by putting `:name` back at every slot
    #[must_use]
    pub fn to_template(&self) -> String {
        let extra: usize = self.params.iter().map(String::len).sum();
        let mut template = String::with_capacity(self.query.len() + extra);
        let mut last = 0;

        for (&slot, name) in self.slots.iter().zip(&self.params) {
            template.push_str(&self.query[last..slot]);
            template.push(':');
            template.push_str(name);
            last = slot + 1;
        }
        template.push_str(&self.query[last..]);

        template
    }

    /// Split into query text and parameter names
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.query, self.params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    Literal(u8),
    LineComment,
    BlockComment,
}

const fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

const fn is_name_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Rewrite a template with default options
///
/// # Example
/// ```
/// let rewritten = namedsql::rewrite("SELECT * FROM users WHERE id = :id");
/// assert_eq!(rewritten.query, "SELECT * FROM users WHERE id = ?");
/// assert_eq!(rewritten.params, vec!["id"]);
/// ```
#[must_use]
pub fn rewrite(template: &str) -> RewrittenQuery {
    rewrite_with(template, &RewriteOptions::default())
}

/// Rewrite a template with explicit scanner options
#[must_use]
pub fn rewrite_with(template: &str, options: &RewriteOptions) -> RewrittenQuery {
    // Every byte the scanner branches on is ASCII, so slicing at those
    // positions always lands on a char boundary.
    let bytes = template.as_bytes();
    let mut query = String::with_capacity(template.len());
    let mut params = Vec::new();
    let mut slots = Vec::new();

    let mut state = Scan::Code;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        match state {
            Scan::Code => match b {
                b'\'' | b'"' => {
                    state = Scan::Literal(b);
                    i += 1;
                }
                b':' if next == Some(b':') => i += 2,
                b':' if next.is_some_and(is_name_start) => {
                    let start = i + 1;
                    let len = bytes[start..].iter().take_while(|&&c| is_name_continue(c)).count();
                    let end = start + len;

                    query.push_str(&template[copied..i]);
                    slots.push(query.len());
                    query.push('?');
                    params.push(template[start..end].to_owned());

                    copied = end;
                    i = end;
                }
                b'-' if options.skip_comments && next == Some(b'-') => {
                    state = Scan::LineComment;
                    i += 2;
                }
                b'/' if options.skip_comments && next == Some(b'*') => {
                    state = Scan::BlockComment;
                    i += 2;
                }
                _ => i += 1,
            },
            Scan::Literal(quote) => {
                let escaped = (options.backslash_escapes && b == b'\\')
                    || (b == quote && next == Some(quote));
                if escaped {
                    i += 2;
                } else {
                    if b == quote {
                        state = Scan::Code;
                    }
                    i += 1;
                }
            }
            Scan::LineComment => {
                if b == b'\n' {
                    state = Scan::Code;
                }
                i += 1;
            }
            Scan::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    state = Scan::Code;
                    i += 2;
                } else {
                    i += 1;
                }
            }
        }
    }
    query.push_str(&template[copied..]);

    debug!(bytes = template.len(), params = params.len(), "rewrote template");

    RewrittenQuery { query, params, slots }
}
