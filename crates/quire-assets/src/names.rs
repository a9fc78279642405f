//! Asset name sanitization.
//!
//! Every image name passes through [`sanitize_name`] before it touches the
//! filesystem, on write and on read alike. The result:
//! - contains only `[A-Za-z0-9._-]`
//! - contains no `/`, `\` or `..` sequence
//! - does not start with `.`
//! - is at most [`MAX_NAME_LEN`] bytes and never empty
//!
//! so joining it onto a publication's image directory can never produce a
//! path outside that directory.

use crate::error::{AssetError, AssetResult};

/// Longest sanitized name kept; longer names are truncated.
pub const MAX_NAME_LEN: usize = 128;

/// Sanitize a producer-supplied image name.
///
/// # Examples
///
/// ```
/// use quire_assets::names::sanitize_name;
///
/// assert_eq!(sanitize_name("diagram.png").unwrap(), "diagram.png");
/// assert_eq!(sanitize_name("../../etc/passwd").unwrap(), "____etc_passwd");
/// assert!(sanitize_name("").is_err());
/// ```
pub fn sanitize_name(raw: &str) -> AssetResult<String> {
    let flattened = raw.replace(['/', '\\'], "_").replace("..", "_");

    let mapped: String = flattened
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut name = mapped.trim_start_matches('.').to_string();
    // ASCII only at this point, so any byte index is a char boundary.
    name.truncate(MAX_NAME_LEN);

    if name.is_empty() {
        return Err(AssetError::InvalidName {
            name: raw.to_string(),
        });
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(sanitize_name("photo-1_final.JPG").unwrap(), "photo-1_final.JPG");
    }

    #[test]
    fn separators_are_flattened() {
        assert_eq!(sanitize_name("a/b\\c.png").unwrap(), "a_b_c.png");
    }

    #[test]
    fn traversal_sequences_are_rewritten() {
        assert_eq!(sanitize_name("../secret.png").unwrap(), "__secret.png");
        assert_eq!(sanitize_name("..\\..\\boot.ini").unwrap(), "____boot.ini");
        assert_eq!(sanitize_name("a...b.png").unwrap(), "a_.b.png");
    }

    #[test]
    fn leading_dots_are_stripped() {
        assert_eq!(sanitize_name(".hidden.png").unwrap(), "hidden.png");
        assert!(matches!(
            sanitize_name("."),
            Err(AssetError::InvalidName { .. })
        ));
    }

    #[test]
    fn disallowed_characters_become_underscores() {
        assert_eq!(sanitize_name("my pic (1).png").unwrap(), "my_pic__1_.png");
        assert_eq!(sanitize_name("résumé.png").unwrap(), "r_sum_.png");
        assert_eq!(sanitize_name("nul\0byte.png").unwrap(), "nul_byte.png");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            sanitize_name(""),
            Err(AssetError::InvalidName { .. })
        ));
    }

    #[test]
    fn long_names_are_truncated() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_name(&long).unwrap().len(), MAX_NAME_LEN);
    }

    proptest! {
        #[test]
        fn output_never_escapes(raw in ".{0,200}") {
            if let Ok(name) = sanitize_name(&raw) {
                prop_assert!(!name.is_empty());
                prop_assert!(name.len() <= MAX_NAME_LEN);
                prop_assert!(!name.contains(".."));
                prop_assert!(!name.contains('/'));
                prop_assert!(!name.contains('\\'));
                prop_assert!(!name.starts_with('.'));
                prop_assert!(name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
            }
        }

        #[test]
        fn sanitizing_is_idempotent(raw in "[ -~]{1,80}") {
            if let Ok(once) = sanitize_name(&raw) {
                prop_assert_eq!(sanitize_name(&once).unwrap(), once);
            }
        }
    }
}
