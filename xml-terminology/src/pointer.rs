//! Term names and pointers.
//!
//! A [`Pointer`] addresses a term by descending from a root: `[:access, :machine, :person]`
//! names the `person` child of the `machine` child of the root term `access`.
//! Pointers are plain values, so resolving one never depends on global state.

use std::borrow::Borrow;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::TerminologyError;
use crate::parse::parse_segments;

/// Identifier of a term, unique among its siblings.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermName(Arc<str>);

impl TermName {
    /// Creates a new term name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TermName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// symbol-like, so that error messages read `:a => :b`
impl Debug for TermName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl Borrow<str> for TermName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TermName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TermName {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&TermName> for TermName {
    fn from(value: &TermName) -> Self {
        value.clone()
    }
}

/// Ordered sequence of term names, addressing a term by descending from a root.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Pointer(Vec<TermName>);

impl Pointer {
    /// Creates a pointer from its segments.
    pub fn new(segments: impl IntoIterator<Item = impl Into<TermName>>) -> Self {
        segments.into_iter().collect()
    }

    /// The segments of this pointer, outermost first.
    pub fn segments(&self) -> &[TermName] {
        &self.0
    }

    /// The first segment, if any.
    pub fn first(&self) -> Option<&TermName> {
        self.0.first()
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&TermName> {
        self.0.last()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the pointer has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new pointer with `name` appended.
    pub fn join(&self, name: impl Into<TermName>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// Iterates over the segments, outermost first.
    pub fn iter(&self) -> impl Iterator<Item = &TermName> {
        self.0.iter()
    }
}

impl<N: Into<TermName>> FromIterator<N> for Pointer {
    fn from_iter<T: IntoIterator<Item = N>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Pointer {
    fn from(value: [&str; N]) -> Self {
        value.into_iter().collect()
    }
}

impl From<&str> for Pointer {
    fn from(value: &str) -> Self {
        Self(vec![TermName::from(value)])
    }
}

impl From<TermName> for Pointer {
    fn from(value: TermName) -> Self {
        Self(vec![value])
    }
}

impl Display for Pointer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{segment:?}")?;
        }
        write!(f, "]")
    }
}

impl Debug for Pointer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for Pointer {
    type Err = TerminologyError;

    /// Parses `access/machine/person`, `:access :machine` or `[:access, :machine]`.
    /// Node indices are rejected; use [`IndexedPointer`] for those.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = parse_segments(s)?;
        if segments.iter().any(|segment| segment.index.is_some()) {
            return Err(TerminologyError::PointerSyntax {
                input: s.to_string(),
                message: "node indices are only allowed in indexed pointers".to_string(),
            });
        }
        Ok(segments.into_iter().map(|segment| segment.name).collect())
    }
}

/// One step of an [`IndexedPointer`]: a term name, optionally restricted to the n-th
/// matching node (zero-based).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct PointerSegment {
    /// Name of the child term to descend into.
    pub name: TermName,
    /// Zero-based position among the nodes matching this step.
    pub index: Option<usize>,
}

impl PointerSegment {
    /// An unindexed segment.
    pub fn new(name: impl Into<TermName>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    /// A segment selecting the `index`-th matching node.
    pub fn indexed(name: impl Into<TermName>, index: usize) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }
}

impl Display for PointerSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(index) => write!(f, "{:?}[{index}]", self.name),
            None => write!(f, "{:?}", self.name),
        }
    }
}

/// A pointer whose segments may select a specific node among several matches.
///
/// Used to build positional queries with [`Terminology::xpath_with_indexes`](crate::Terminology::xpath_with_indexes).
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct IndexedPointer(Vec<PointerSegment>);

impl IndexedPointer {
    /// Creates an indexed pointer from its segments.
    pub fn new(segments: impl IntoIterator<Item = PointerSegment>) -> Self {
        Self(segments.into_iter().collect())
    }

    /// The segments of this pointer, outermost first.
    pub fn segments(&self) -> &[PointerSegment] {
        &self.0
    }

    /// Drops the node indices.
    pub fn to_pointer(&self) -> Pointer {
        self.0.iter().map(|segment| segment.name.clone()).collect()
    }
}

impl From<Pointer> for IndexedPointer {
    fn from(value: Pointer) -> Self {
        Self(value.0.into_iter().map(PointerSegment::new).collect())
    }
}

impl Display for IndexedPointer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{segment}")?;
        }
        write!(f, "]")
    }
}

impl FromStr for IndexedPointer {
    type Err = TerminologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_segments(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pointer() {
        let pointer = Pointer::from(["access", "machine"]);
        assert_eq!("[:access, :machine]", pointer.to_string());
    }

    #[test]
    fn test_parse_slash_separated() {
        let pointer: Pointer = "access/machine/person".parse().unwrap();
        assert_eq!(Pointer::from(["access", "machine", "person"]), pointer);
    }

    #[test]
    fn test_parse_symbols() {
        let pointer: Pointer = ":access :machine".parse().unwrap();
        assert_eq!(Pointer::from(["access", "machine"]), pointer);
    }

    #[test]
    fn test_display_parses_back() {
        let pointer = Pointer::from(["title_info", "main_title"]);
        assert_eq!(pointer, pointer.to_string().parse::<Pointer>().unwrap());
    }

    #[test]
    fn test_parse_indexed() {
        let pointer: IndexedPointer = "[:person[0], :last_name]".parse().unwrap();
        assert_eq!(
            IndexedPointer::new([
                PointerSegment::indexed("person", 0),
                PointerSegment::new("last_name")
            ]),
            pointer
        );
    }

    #[test]
    fn test_plain_pointer_rejects_index() {
        let err = "person[1]/name".parse::<Pointer>().unwrap_err();
        assert!(matches!(err, TerminologyError::PointerSyntax { .. }));
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!("".parse::<Pointer>().is_err());
        assert!("[]".parse::<IndexedPointer>().is_err());
    }

    #[test]
    fn test_join() {
        let pointer = Pointer::from("access").join("machine");
        assert_eq!(Pointer::from(["access", "machine"]), pointer);
        assert_eq!(Some(&TermName::from("machine")), pointer.last());
    }
}
