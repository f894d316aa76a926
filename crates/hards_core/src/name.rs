//! Name validation for datasets, datapoints and files.
//!
//! Valid names:
//! - Must be non-empty
//! - Must only contain ASCII letters, digits, `.`, `-` and `_`
//! - Must not be `.` or `..`
//! - Must be at most [`MAX_NAME_LEN`] bytes long
//!
//! Names become single path components in the storage layout, so these
//! rules are what keeps a name from escaping its parent.

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeSet;

/// Punctuation allowed in names besides ASCII letters and digits.
pub const NAME_PUNCTUATION: [char; 3] = ['.', '-', '_'];

/// Longest accepted name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Returns true if `c` may appear in a name.
#[must_use]
pub fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || NAME_PUNCTUATION.contains(&c)
}

/// Validate a dataset, datapoint or file name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use hards_core::name::validate_name;
///
/// assert!(validate_name("sample_01.v2-final").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name("a/b").is_err());
/// assert!(validate_name("..").is_err());
/// ```
///
/// # Errors
///
/// Returns [`CoreError::InvalidName`] describing the first rule broken.
pub fn validate_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_name(name, "name must not be empty"));
    }

    let invalid: BTreeSet<char> = name.chars().filter(|c| !is_valid_name_char(*c)).collect();
    if !invalid.is_empty() {
        let invalid: Vec<char> = invalid.into_iter().collect();
        return Err(CoreError::invalid_name(
            name,
            format!("contains invalid characters: {invalid:?}"),
        ));
    }

    // Would alias the node itself or its parent.
    if name == "." || name == ".." {
        return Err(CoreError::invalid_name(name, "must not be '.' or '..'"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(CoreError::invalid_name(
            name,
            format!("is {} bytes long, the limit is {MAX_NAME_LEN}", name.len()),
        ));
    }

    Ok(())
}

/// Returns true if `name` passes [`validate_name`].
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    validate_name(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_names() {
        for name in ["a", "A", "0", "test_dataset", "datapoint1", "v1.2-rc_3", ".hidden", "a..b", "..."] {
            assert!(validate_name(name).is_ok(), "expected {name:?} to be valid");
        }
    }

    #[test]
    fn empty_name() {
        let err = validate_name("").unwrap_err();
        assert!(matches!(err, CoreError::InvalidName { .. }));
    }

    #[test]
    fn dot_names() {
        assert!(validate_name(".").is_err());
        assert!(validate_name("..").is_err());
    }

    #[test]
    fn invalid_characters_are_reported() {
        let err = validate_name("d&tapoint").unwrap_err();
        match err {
            CoreError::InvalidName { name, reason } => {
                assert_eq!(name, "d&tapoint");
                assert!(reason.contains('&'));
            }
            other => panic!("unexpected error: {other}"),
        }

        for name in ["file*", "invalid(filename).txt", "a/b", "a\\b", "with space", "tab\t", "ünïcode"] {
            assert!(validate_name(name).is_err(), "expected {name:?} to be invalid");
        }
    }

    #[test]
    fn length_limit() {
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    proptest! {
        #[test]
        fn charset_names_are_accepted(name in "[A-Za-z0-9_-][A-Za-z0-9._-]{0,40}") {
            prop_assert!(is_valid_name(&name));
        }

        #[test]
        fn separators_are_rejected(
            prefix in "[A-Za-z0-9._-]{0,10}",
            bad in prop::sample::select(vec!['/', '\\', ' ', '\t', '\n', '*', '&', '(', ':', '?', '%', '~', 'é']),
            suffix in "[A-Za-z0-9._-]{0,10}",
        ) {
            let name = format!("{prefix}{bad}{suffix}");
            prop_assert!(!is_valid_name(&name));
        }
    }
}
