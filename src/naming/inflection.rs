//! Pluralization for table names.
//!
//! Inflector does the work; the two tables below cover the words it
//! mishandles once they are already plural or have no plural at all.

use inflector::Inflector;

/// `(singular, plural)` pairs Inflector would re-pluralize or get wrong.
const IRREGULAR: &[(&str, &str)] = &[
    ("man", "men"),
    ("woman", "women"),
    ("medium", "media"),
    ("person", "people"),
    ("child", "children"),
];

/// Words used verbatim as table names.
const UNCOUNTABLE: &[&str] = &[
    "audio",
    "equipment",
    "feedback",
    "information",
    "metadata",
    "news",
    "progress",
    "series",
    "species",
    "staff",
];

/// Plural form of a single lowercase word. Already-plural input comes back
/// unchanged.
///
/// # Examples
/// ```
/// use quarry::naming::pluralize;
///
/// assert_eq!(pluralize("payment"), "payments");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("person"), "people");
/// assert_eq!(pluralize("progress"), "progress");
/// ```
pub fn pluralize(word: &str) -> String {
    let word = word.to_lowercase();
    if word.is_empty() || UNCOUNTABLE.contains(&word.as_str()) {
        return word;
    }

    IRREGULAR
        .iter()
        .find(|(singular, plural)| word == *singular || word == *plural)
        .map(|(_, plural)| plural.to_string())
        .unwrap_or_else(|| word.to_plural())
}

/// Pluralize the last segment of a snake_case name.
///
/// `mass_intention` becomes `mass_intentions`; `user_progress` is unchanged.
pub fn pluralize_snake(name: &str) -> String {
    match name.rsplit_once('_') {
        Some((head, last)) if !last.is_empty() => format!("{}_{}", head, pluralize(last)),
        _ => pluralize(name),
    }
}
