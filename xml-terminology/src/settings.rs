//! The open settings bag carried by every [`TermBuilder`](crate::TermBuilder).
//!
//! Keys are either one of the keys the build step understands, or an arbitrary extension key
//! that is stored verbatim and carried onto the built term. Values are a small tagged union.

use std::fmt::{Display, Formatter};

use indexmap::{IndexMap, IndexSet};

use crate::pointer::Pointer;

/// Name of a setting.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Local name of the element (or attribute) the term matches. Defaults to the term name.
    Path,
    /// Attribute equality constraints, as an ordered mapping.
    Attributes,
    /// Whether the term must be present.
    Required,
    /// Data type of the term's content.
    DataType,
    /// Indexing hints, as a tag set.
    IndexAs,
    /// Child element holding the textual content of the term.
    DefaultContentPath,
    /// Namespace prefix of the term. `Nil` means no namespace.
    NamespacePrefix,
    /// Marks the term as a semantic alias of another term. Does not trigger a merge.
    VariantOf,
    /// Pointer to a term whose settings and children are imported.
    Ref,
    /// Pointer to a term this term forwards to.
    Proxy,
    /// Marks the term as the root element of the document.
    Root,
    /// Any other key, stored verbatim.
    Extension(String),
}

impl SettingKey {
    /// The textual name of this key.
    pub fn as_str(&self) -> &str {
        match self {
            SettingKey::Path => "path",
            SettingKey::Attributes => "attributes",
            SettingKey::Required => "required",
            SettingKey::DataType => "data_type",
            SettingKey::IndexAs => "index_as",
            SettingKey::DefaultContentPath => "default_content_path",
            SettingKey::NamespacePrefix => "namespace_prefix",
            SettingKey::VariantOf => "variant_of",
            SettingKey::Ref => "ref",
            SettingKey::Proxy => "proxy",
            SettingKey::Root => "root",
            SettingKey::Extension(key) => key,
        }
    }

    /// Returns true for keys the build step does not interpret.
    pub fn is_extension(&self) -> bool {
        matches!(self, SettingKey::Extension(_))
    }
}

impl From<&str> for SettingKey {
    fn from(value: &str) -> Self {
        match value {
            "path" => SettingKey::Path,
            "attributes" => SettingKey::Attributes,
            "required" => SettingKey::Required,
            "data_type" => SettingKey::DataType,
            "index_as" => SettingKey::IndexAs,
            "default_content_path" => SettingKey::DefaultContentPath,
            "namespace_prefix" => SettingKey::NamespacePrefix,
            "variant_of" => SettingKey::VariantOf,
            "ref" => SettingKey::Ref,
            "proxy" => SettingKey::Proxy,
            "root" => SettingKey::Root,
            other => SettingKey::Extension(other.to_string()),
        }
    }
}

impl Display for SettingKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value of a setting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingValue {
    /// Explicitly no value (used to clear the namespace prefix).
    Nil,
    /// A flag, such as `required` or `root`.
    Bool(bool),
    /// A string, such as a path or a data type.
    Str(String),
    /// An ordered set of tags.
    Tags(IndexSet<String>),
    /// A pointer to another term.
    Pointer(Pointer),
    /// Nested mapping. Nested mappings are merged key-wise during reference resolution.
    Map(IndexMap<String, SettingValue>),
}

impl SettingValue {
    /// Builds a nested mapping of strings, keeping the given order.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<SettingValue>,
    {
        SettingValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a tag set, keeping the given order and dropping duplicates.
    pub fn tags<T: Into<String>>(tags: impl IntoIterator<Item = T>) -> Self {
        SettingValue::Tags(tags.into_iter().map(Into::into).collect())
    }

    /// The string, if this is a [`SettingValue::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The flag, if this is a [`SettingValue::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The nested mapping, if this is a [`SettingValue::Map`].
    pub fn as_map(&self) -> Option<&IndexMap<String, SettingValue>> {
        match self {
            SettingValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Renders scalar values as text, as they would appear in an attribute value.
    pub fn to_text(&self) -> Option<String> {
        match self {
            SettingValue::Str(s) => Some(s.clone()),
            SettingValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Interprets the value as a pointer.
    ///
    /// Strings are parsed with the textual pointer syntax; a string that does not parse is
    /// taken as a single, literal segment (which will then fail to resolve).
    pub fn to_pointer(&self) -> Option<Pointer> {
        match self {
            SettingValue::Pointer(pointer) => Some(pointer.clone()),
            SettingValue::Str(s) => Some(s.parse().unwrap_or_else(|_| Pointer::from(s.as_str()))),
            _ => None,
        }
    }

    /// Short description of the shape of this value, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            SettingValue::Nil => "nil",
            SettingValue::Bool(_) => "boolean",
            SettingValue::Str(_) => "string",
            SettingValue::Tags(_) => "tag set",
            SettingValue::Pointer(_) => "pointer",
            SettingValue::Map(_) => "mapping",
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Str(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Str(value)
    }
}

impl From<Pointer> for SettingValue {
    fn from(value: Pointer) -> Self {
        SettingValue::Pointer(value)
    }
}

impl From<IndexMap<String, SettingValue>> for SettingValue {
    fn from(value: IndexMap<String, SettingValue>) -> Self {
        SettingValue::Map(value)
    }
}

impl<T: Into<SettingValue>> From<Option<T>> for SettingValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SettingValue::Nil, Into::into)
    }
}

/// Ordered mapping from [`SettingKey`] to [`SettingValue`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings(IndexMap<SettingKey, SettingValue>);

impl Settings {
    /// An empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &SettingKey) -> Option<&SettingValue> {
        self.0.get(key)
    }

    /// Returns true if the key is present, even when set to [`SettingValue::Nil`].
    pub fn contains_key(&self, key: &SettingKey) -> bool {
        self.0.contains_key(key)
    }

    /// Sets a value, keeping the key's position if it was already present.
    pub fn insert(
        &mut self,
        key: impl Into<SettingKey>,
        value: impl Into<SettingValue>,
    ) -> Option<SettingValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &SettingKey) -> Option<SettingValue> {
        self.0.shift_remove(key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&SettingKey, &SettingValue)> {
        self.0.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no setting is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The value stored under `key`, read as a pointer.
    pub fn pointer(&self, key: &SettingKey) -> Option<Pointer> {
        self.get(key).and_then(SettingValue::to_pointer)
    }

    /// The entries whose keys the build step does not interpret.
    pub fn extensions(&self) -> Settings {
        self.0
            .iter()
            .filter(|(key, _)| key.is_extension())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl FromIterator<(SettingKey, SettingValue)> for Settings {
    fn from_iter<T: IntoIterator<Item = (SettingKey, SettingValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Settings {
    type Item = (&'a SettingKey, &'a SettingValue);
    type IntoIter = indexmap::map::Iter<'a, SettingKey, SettingValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<String> for SettingKey {
    fn from(value: String) -> Self {
        SettingKey::from(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_roundtrip_names() {
        for name in ["path", "attributes", "ref", "proxy", "namespace_prefix"] {
            let key = SettingKey::from(name);
            assert!(!key.is_extension());
            assert_eq!(name, key.as_str());
        }
        assert_eq!(
            SettingKey::Extension("xmlns".to_string()),
            SettingKey::from("xmlns")
        );
    }

    #[test]
    fn test_insert_keeps_position() {
        let mut settings = Settings::new();
        settings.insert(SettingKey::Path, "a");
        settings.insert("label", "b");
        settings.insert(SettingKey::Path, "c");

        let keys: Vec<_> = settings.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(vec!["path", "label"], keys);
        assert_eq!(Some("c"), settings.get(&SettingKey::Path).and_then(SettingValue::as_str));
    }

    #[test]
    fn test_string_pointer() {
        let value = SettingValue::from("access/machine");
        assert_eq!(Some(Pointer::from(["access", "machine"])), value.to_pointer());
        assert_eq!(None, SettingValue::Bool(true).to_pointer());
    }

    #[test]
    fn test_extensions_only() {
        let mut settings = Settings::new();
        settings.insert(SettingKey::Required, true);
        settings.insert("xmlns", "http://example.com/ns");
        let extensions = settings.extensions();
        assert_eq!(1, extensions.len());
        assert!(extensions.contains_key(&SettingKey::from("xmlns")));
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(SettingValue::Nil, SettingValue::from(None::<&str>));
        assert_eq!(SettingValue::from("oxns"), SettingValue::from(Some("oxns")));
    }
}
