//! Identifier normalisation

use std::sync::LazyLock;

use regex::Regex;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z]+").expect("literal id pattern compiles"));

static ID_STANDARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z-]+$").expect("literal id pattern compiles"));

/// Lowercase id with every run of non-alphanumerics collapsed to `-`
///
/// Leading and trailing dashes are trimmed: `"AHU 01 / Supply"` becomes
/// `"ahu-01-supply"`.
pub fn to_id_standard(name: &str) -> String {
    NON_ALPHANUMERIC
        .replace_all(name, "-")
        .trim_matches('-')
        .to_lowercase()
}

/// True when `id` holds only ASCII letters, digits and dashes
pub fn is_id_standard(id: &str) -> bool {
    ID_STANDARD.is_match(id)
}
