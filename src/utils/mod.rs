//! Utility functions and helpers.
//!
//! - Text padding for column output
//! - Camel-cased module names from hyphenated ones
//! - Token transforms over text and files ([`transform`])
//! - Worker pool configuration ([`thread_pool`])
//!
//! # Examples
//!
//! ```
//! use arbor::utils::{pad_left, pad_right};
//!
//! assert_eq!(pad_right("dir", 6, '.'), "dir...");
//! assert_eq!(pad_left("42", 4, ' '), "  42");
//! ```

/// Thread pool configuration for filesystem work
pub mod thread_pool;
/// Token replacement over text and files
pub mod transform;

pub use transform::{Transformer, transform_file};

/// Pads `value` on the right with `pad` until it is `width` characters long.
///
/// Values already at least `width` characters long are returned unchanged.
#[must_use]
pub fn pad_right(value: &str, width: usize, pad: char) -> String {
    let mut padded = value.to_string();
    padded.extend(std::iter::repeat_n(pad, pad_len(value, width)));
    padded
}

/// Pads `value` on the left with `pad` until it is `width` characters long.
///
/// Values already at least `width` characters long are returned unchanged.
#[must_use]
pub fn pad_left(value: &str, width: usize, pad: char) -> String {
    let mut padded: String = std::iter::repeat_n(pad, pad_len(value, width)).collect();
    padded.push_str(value);
    padded
}

fn pad_len(value: &str, width: usize) -> usize {
    width.saturating_sub(value.chars().count())
}

/// Suffix [`module_name`] appends when none is given.
pub const DEFAULT_NAME_SUFFIX: &str = "Module";

/// Turns a hyphenated name into a camel-cased identifier ending in `suffix`
/// (`Module` by default).
///
/// Each `-` followed by a letter or digit is dropped and the character after
/// it upper-cased. An existing suffix is matched case-insensitively and
/// normalised rather than appended twice.
///
/// ```
/// use arbor::utils::module_name;
///
/// assert_eq!(module_name("user-profile", None), "userProfileModule");
/// assert_eq!(module_name("admin-app", Some("App")), "adminApp");
/// ```
#[must_use]
pub fn module_name(name: &str, suffix: Option<&str>) -> String {
    let suffix = suffix.unwrap_or(DEFAULT_NAME_SUFFIX);
    let mut camel = String::with_capacity(name.len() + suffix.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '-' && next.is_ascii_alphanumeric() => {
                camel.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => camel.push(c),
        }
    }

    if let Some(start) = camel.len().checked_sub(suffix.len())
        && camel.is_char_boundary(start)
        && camel[start..].eq_ignore_ascii_case(suffix)
    {
        camel.truncate(start);
    }
    camel.push_str(suffix);
    camel
}
