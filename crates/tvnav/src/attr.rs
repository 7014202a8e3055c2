#![forbid(unsafe_code)]

//! Attribute coercion.
//!
//! Markup-style configuration writes boolean flags as bare attributes
//! (`focusable`), strings (`focusable="true"`), or real booleans. These
//! helpers normalize such values once, when a [`NodeConfig`] is built, so the
//! engine only ever sees plain `bool`s and `usize`s.
//!
//! [`NodeConfig`]: crate::node::NodeConfig

/// A raw attribute value as written by the author.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "layout", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "layout", serde(untagged))]
pub enum AttrValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Coerce an attribute to a flag.
///
/// The empty string (a bare attribute), the string `"true"`, and `true` are
/// truthy. Everything else, including `"false"`, `"1"`, and numbers, is
/// falsy.
///
/// ```
/// use tvnav::attr::{AttrValue, coerce_boolean};
///
/// assert!(coerce_boolean(&AttrValue::from("")));
/// assert!(coerce_boolean(&AttrValue::from(true)));
/// assert!(!coerce_boolean(&AttrValue::from("yes")));
/// ```
#[must_use]
pub fn coerce_boolean(value: &AttrValue) -> bool {
    match value {
        AttrValue::Bool(b) => *b,
        AttrValue::Text(s) => s.is_empty() || s == "true",
        AttrValue::Number(_) => false,
    }
}

/// Coerce an attribute to a grid row width.
///
/// Positive integers, numeric or decimal text, yield `Some`. Zero, negative
/// values, and anything unparsable yield `None` (list mode).
#[must_use]
pub fn coerce_grid_size(value: &AttrValue) -> Option<usize> {
    let n = match value {
        AttrValue::Number(n) => *n,
        AttrValue::Text(s) => s.trim().parse::<i64>().ok()?,
        AttrValue::Bool(_) => return None,
    };
    usize::try_from(n).ok().filter(|n| *n > 0)
}
