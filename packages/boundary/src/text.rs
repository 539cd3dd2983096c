//! Name normalization and slug derivation.
//!
//! [`normalize`] produces the canonical matching form of a boundary
//! name; [`slugify`] derives the URL-safe unique identifier. Both are
//! deterministic so that re-imports of an unchanged dataset hit the
//! same rows.

use regex::Regex;
use std::sync::LazyLock;

/// Regex to strip punctuation characters that do not contribute to
/// name matching.
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,#'/\\\-&()]+").expect("valid regex"));

/// Regex for slug derivation: runs of anything that is not a letter or
/// digit collapse into a single hyphen.
static NON_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Normalizes a boundary name for matching.
///
/// The pipeline:
/// 1. Uppercase
/// 2. Strip punctuation (`.`, `,`, `#`, `'`, `/`, `\`, `-`, `&`, parens)
/// 3. Collapse whitespace
/// 4. Trim
#[must_use]
pub fn normalize(input: &str) -> String {
    let upper = input.to_uppercase();
    let no_punct = PUNCTUATION_RE.replace_all(&upper, " ");
    no_punct
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Derives a URL-safe slug from a name.
///
/// Lowercases, folds every run of non-alphanumeric characters into a
/// single hyphen, and trims leading/trailing hyphens. Numeric suffixes
/// survive unchanged, so `slugify("downtown-2")` is `"downtown-2"` —
/// the disambiguation retry depends on that.
#[must_use]
pub fn slugify(input: &str) -> String {
    let lower = input.to_lowercase();
    NON_SLUG_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mixed_case() {
        assert_eq!(normalize("Back Bay"), "BACK BAY");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(normalize("St. Mary's Park"), "ST MARY S PARK");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  North   End "), "NORTH END");
    }

    #[test]
    fn normalizes_ampersand() {
        assert_eq!(normalize("Fields & Farms"), "FIELDS FARMS");
    }

    #[test]
    fn slugifies_simple_name() {
        assert_eq!(slugify("Back Bay"), "back-bay");
    }

    #[test]
    fn slugifies_punctuation() {
        assert_eq!(slugify("St. Mary's Park"), "st-mary-s-park");
    }

    #[test]
    fn slugify_preserves_numeric_suffix() {
        assert_eq!(slugify("downtown-2"), "downtown-2");
    }

    #[test]
    fn slugify_trims_edge_hyphens() {
        assert_eq!(slugify("  (The) Loop!  "), "the-loop");
    }

    #[test]
    fn slug_of_munged_name_is_stable() {
        let base = slugify("Downtown");
        assert_eq!(slugify(&format!("{base}-{}", 2)), "downtown-2");
    }
}
