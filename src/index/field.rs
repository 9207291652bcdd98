//! The closed set of indexed page sections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WikindexError};

/// One section of a page. Each field has its own inverted index.
///
/// The declaration order is significant: it fixes the relevance vector slot
/// of each field (`title` is slot 1, `category` is slot 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Body,
    Ref,
    Infobox,
    Link,
    Category,
}

impl Field {
    /// All fields in slot order.
    pub const ALL: [Field; 6] = [
        Field::Title,
        Field::Body,
        Field::Ref,
        Field::Infobox,
        Field::Link,
        Field::Category,
    ];

    /// Fields searched by a query without field markers.
    pub const DEFAULT_SEARCH: [Field; 2] = [Field::Title, Field::Body];

    /// Directory / file name of this field in the index layout.
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Body => "body",
            Field::Ref => "ref",
            Field::Infobox => "infobox",
            Field::Link => "link",
            Field::Category => "category",
        }
    }

    /// Zero-based position in [`Field::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolve a query field marker: the field's initial or its full name,
    /// in any case. The six names have distinct initials.
    pub fn from_marker(marker: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| {
            let name = field.name();
            marker.eq_ignore_ascii_case(name) || marker.eq_ignore_ascii_case(&name[..1])
        })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = WikindexError;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .iter()
            .find(|f| f.name() == s)
            .copied()
            .ok_or_else(|| WikindexError::invalid_argument(format!("unknown field: {s}")))
    }
}

/// Per-field values indexed by [`Field`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerField<T> {
    values: [T; 6],
}

impl<T> PerField<T> {
    pub fn from_fn(mut f: impl FnMut(Field) -> T) -> Self {
        PerField {
            values: Field::ALL.map(&mut f),
        }
    }

    pub fn get(&self, field: Field) -> &T {
        &self.values[field.index()]
    }

    pub fn get_mut(&mut self, field: Field) -> &mut T {
        &mut self.values[field.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &T)> {
        Field::ALL.into_iter().zip(self.values.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Field, &mut T)> {
        Field::ALL.into_iter().zip(self.values.iter_mut())
    }
}

impl<T> IntoIterator for PerField<T> {
    type Item = (Field, T);
    type IntoIter = std::iter::Zip<std::array::IntoIter<Field, 6>, std::array::IntoIter<T, 6>>;

    fn into_iter(self) -> Self::IntoIter {
        Field::ALL.into_iter().zip(self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_order() {
        let names: Vec<_> = Field::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec!["title", "body", "ref", "infobox", "link", "category"]
        );
        assert_eq!(Field::Category.index(), 5);
    }

    #[test]
    fn test_marker_resolution() {
        assert_eq!(Field::from_marker("t"), Some(Field::Title));
        assert_eq!(Field::from_marker("B"), Some(Field::Body));
        assert_eq!(Field::from_marker("i"), Some(Field::Infobox));
        assert_eq!(Field::from_marker("category"), Some(Field::Category));
        assert_eq!(Field::from_marker("INFOBOX"), Some(Field::Infobox));
        assert_eq!(Field::from_marker("info"), None);
        assert_eq!(Field::from_marker("in"), None);
        assert_eq!(Field::from_marker("cat"), None);
        assert_eq!(Field::from_marker("titles"), None);
        assert_eq!(Field::from_marker("x"), None);
        assert_eq!(Field::from_marker(""), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("link".parse::<Field>().unwrap(), Field::Link);
        assert!("links".parse::<Field>().is_err());
    }
}
