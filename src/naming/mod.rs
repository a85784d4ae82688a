//! Naming rules shared by the extractors and the model builder.
//!
//! - table-name normalization (snake_case, plural)
//! - declaration-name normalization (strip entity suffixes first)
//! - the identifier-reference convention used for foreign-key inference

mod inflection;

pub use inflection::{pluralize, pluralize_snake};

use inflector::Inflector;

/// Suffixes stripped from declaration names before they become table names.
const DECLARATION_SUFFIXES: &[&str] = &["Interface", "Type", "Model", "Entity", "Schema"];

/// Normalize a raw table identifier into a canonical table name.
///
/// Lower-cases, inserts underscores at word boundaries, collapses separators,
/// and pluralizes the last segment. Returns `None` when nothing usable is
/// left.
///
/// # Examples
/// ```
/// use quarry::naming::normalize_table_name;
///
/// assert_eq!(normalize_table_name("UserProfile").as_deref(), Some("user_profiles"));
/// assert_eq!(normalize_table_name("payments").as_deref(), Some("payments"));
/// assert_eq!(normalize_table_name("mass-intention").as_deref(), Some("mass_intentions"));
/// assert_eq!(normalize_table_name("  "), None);
/// ```
pub fn normalize_table_name(raw: &str) -> Option<String> {
    let snake = to_snake(raw)?;
    Some(pluralize_snake(&snake))
}

/// Normalize a declaration name (`UserProfileInterface`, `PaymentType`) into a
/// table name.
///
/// Only one trailing suffix is stripped, and never the whole name.
pub fn declaration_table_name(declaration: &str) -> Option<String> {
    let stem = DECLARATION_SUFFIXES
        .iter()
        .find_map(|suffix| {
            declaration
                .strip_suffix(suffix)
                .filter(|stem| !stem.is_empty())
        })
        .unwrap_or(declaration);
    normalize_table_name(stem)
}

/// Table referenced by a column under the identifier-reference convention.
///
/// A column ending in `_id`, or in `Id` / `ID` after a lowercase letter,
/// references the table its prefix normalizes to, so `campus_id` and
/// `.from('campus')` agree on `campuses`. `id` itself references nothing.
///
/// # Examples
/// ```
/// use quarry::naming::reference_target;
///
/// assert_eq!(reference_target("user_id").as_deref(), Some("users"));
/// assert_eq!(reference_target("churchId").as_deref(), Some("churches"));
/// assert_eq!(reference_target("mass_intention_id").as_deref(), Some("mass_intentions"));
/// assert_eq!(reference_target("id"), None);
/// assert_eq!(reference_target("paid"), None);
/// ```
pub fn reference_target(column: &str) -> Option<String> {
    normalize_table_name(reference_prefix(column)?)
}

fn reference_prefix(column: &str) -> Option<&str> {
    if let Some(prefix) = column.strip_suffix("_id") {
        return (!prefix.is_empty()).then_some(prefix);
    }

    let prefix = column
        .strip_suffix("Id")
        .or_else(|| column.strip_suffix("ID"))?;
    prefix
        .chars()
        .last()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .map(|_| prefix)
}

/// Returns true if `name` is lowercase snake_case (`[a-z_][a-z0-9_]*`).
pub fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn to_snake(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    let snake = if is_snake_case(&cleaned) {
        cleaned
    } else {
        cleaned.to_snake_case()
    };

    let collapsed = snake
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    (!collapsed.is_empty()).then_some(collapsed)
}
