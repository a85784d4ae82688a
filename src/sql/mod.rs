//! SQL generation module.
//!
//! Postgres-only building blocks for migration output:
//!
//! - [`types`] - column type tags ([`SqlType`])
//! - [`ddl`] - Data Definition Language builders (CREATE, ALTER, DROP, POLICY, TRIGGER)
//! - identifier and literal quoting
//! - [`split_statements`] for feeding a migration file to a per-statement endpoint

pub mod ddl;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use types::SqlType;

// Re-export DDL types
pub use ddl::{
    AlterAction, AlterTable, ColumnDef, Comment, CommentTarget, CreateExtension, CreateFunction,
    CreateIndex, CreatePolicy, CreateTable, CreateTrigger, DdlStatement, DropTable, PolicyCommand,
    ReferentialAction, TableConstraint,
};

/// Keywords that must be quoted when used as identifiers. Sorted.
const RESERVED: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both", "case",
    "cast", "check", "collate", "column", "constraint", "create", "current_date", "current_role",
    "current_time", "current_timestamp", "current_user", "default", "deferrable", "desc",
    "distinct", "do", "else", "end", "except", "false", "fetch", "for", "foreign", "from", "grant",
    "group", "having", "in", "initially", "intersect", "into", "lateral", "leading", "limit",
    "localtime", "localtimestamp", "not", "null", "offset", "on", "only", "or", "order", "placing",
    "primary", "references", "returning", "select", "session_user", "some", "symmetric", "table",
    "then", "to", "trailing", "true", "union", "unique", "user", "using", "variadic", "when",
    "where", "window", "with",
];

/// Quote an identifier only when Postgres would otherwise change or reject it.
///
/// Plain lowercase snake_case names that are not reserved words pass through
/// unchanged; anything else is double-quoted with embedded quotes doubled.
///
/// # Examples
///
/// ```
/// use quarry::sql::quote_ident;
///
/// assert_eq!(quote_ident("user_id"), "user_id");
/// assert_eq!(quote_ident("firstName"), "\"firstName\"");
/// assert_eq!(quote_ident("order"), "\"order\"");
/// ```
pub fn quote_ident(name: &str) -> String {
    if is_plain_ident(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn is_plain_ident(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
    starts_ok
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && RESERVED.binary_search(&name).is_err()
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Split a SQL script into individual statements.
///
/// Semicolons inside single-quoted strings, quoted identifiers, dollar-quoted
/// bodies (`$$ ... $$`, `$tag$ ... $tag$`), and comments do not end a
/// statement. Comment-only and blank fragments are dropped. Returned
/// statements keep their text but not the terminating semicolon.
pub fn split_statements(script: &str) -> Vec<String> {
    let bytes = script.as_bytes();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;
    let mut i = 0;

    while i < bytes.len() {
        let rest = &script[i..];

        if rest.starts_with("--") {
            let end = rest.find('\n').map_or(script.len(), |n| i + n + 1);
            current.push_str(&script[i..end]);
            i = end;
            continue;
        }

        if rest.starts_with("/*") {
            let end = rest[2..].find("*/").map_or(script.len(), |n| i + 2 + n + 2);
            current.push_str(&script[i..end]);
            i = end;
            continue;
        }

        match bytes[i] {
            b'\'' | b'"' => {
                let quote = bytes[i];
                let mut j = i + 1;
                while j < bytes.len() {
                    if bytes[j] == quote {
                        // Doubled quote is an escape
                        if bytes.get(j + 1) == Some(&quote) {
                            j += 2;
                            continue;
                        }
                        break;
                    }
                    j += 1;
                }
                let end = (j + 1).min(bytes.len());
                current.push_str(&script[i..end]);
                has_code = true;
                i = end;
            }
            b'$' => {
                if let Some(tag) = dollar_tag(rest) {
                    let body_start = i + tag.len();
                    let end = script[body_start..]
                        .find(tag)
                        .map_or(script.len(), |n| body_start + n + tag.len());
                    current.push_str(&script[i..end]);
                    has_code = true;
                    i = end;
                } else {
                    current.push('$');
                    has_code = true;
                    i += 1;
                }
            }
            b';' => {
                if has_code {
                    statements.push(current.trim().to_string());
                }
                current.clear();
                has_code = false;
                i += 1;
            }
            _ => {
                let ch_len = rest.chars().next().map_or(1, char::len_utf8);
                let chunk = &script[i..i + ch_len];
                if !chunk.trim().is_empty() {
                    has_code = true;
                }
                current.push_str(chunk);
                i += ch_len;
            }
        }
    }

    if has_code {
        statements.push(current.trim().to_string());
    }

    statements
}

/// Returns the opening `$tag$` at the start of `s`, if any.
fn dollar_tag(s: &str) -> Option<&str> {
    let inner = s.strip_prefix('$')?;
    let close = inner.find('$')?;
    let tag = &inner[..close];
    if tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !tag.starts_with(|c: char| c.is_ascii_digit())
    {
        Some(&s[..close + 2])
    } else {
        None
    }
}
