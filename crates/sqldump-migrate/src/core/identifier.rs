//! Identifier validation and quoting for generated migrations.
//!
//! Table and column names come from untrusted input (a dump or a hand-edited
//! schema artifact) and are spliced into generated code. Every name is
//! validated and then quoted for the target language before it is emitted.

use crate::error::{MigrateError, Result};
use sha2::{Digest, Sha256};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Maximum PostgreSQL identifier length in bytes.
pub const PG_MAX_IDENTIFIER_BYTES: usize = 63;

/// Validate an identifier for security issues.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes or line breaks
/// - Identifiers exceeding maximum length
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::InvalidIdentifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::InvalidIdentifier(format!(
            "identifier contains null byte: {:?}",
            name
        )));
    }

    if name.contains('\n') || name.contains('\r') {
        return Err(MigrateError::InvalidIdentifier(format!(
            "identifier contains a line break: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::InvalidIdentifier(format!(
            "identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote a PostgreSQL identifier.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
///
/// ```ignore
/// assert_eq!(quote_pg("users")?, "\"users\"");
/// assert_eq!(quote_pg("table\"name")?, "\"table\"\"name\"");
/// ```
pub fn quote_pg(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a name as a PHP single-quoted string literal.
///
/// Only backslashes and single quotes are special inside PHP single quotes.
///
/// ```ignore
/// assert_eq!(quote_php("users")?, "'users'");
/// assert_eq!(quote_php("o'neil")?, "'o\\'neil'");
/// ```
pub fn quote_php(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!(
        "'{}'",
        name.replace('\\', "\\\\").replace('\'', "\\'")
    ))
}

/// Truncate a generated identifier to at most `max` bytes on a char boundary.
pub fn truncate_identifier(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

/// Hex digits of the hash suffix added by [`shorten_identifier`].
const SHORT_HASH_LEN: usize = 8;

/// Fit a generated identifier into `max` bytes.
///
/// Names that fit are returned unchanged. Longer names are truncated and
/// suffixed with a short SHA-256 of the full name, so two long names sharing
/// a prefix still map to different identifiers.
pub fn shorten_identifier(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let digest = format!("{:x}", Sha256::digest(name.as_bytes()));
    let keep = max.saturating_sub(SHORT_HASH_LEN + 1);
    format!(
        "{}_{}",
        truncate_identifier(name, keep),
        &digest[..SHORT_HASH_LEN]
    )
}
