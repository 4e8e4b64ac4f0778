//! Resolved, built terms.

use std::fmt::{Display, Formatter};

use indexmap::{IndexMap, IndexSet};

use crate::pointer::{Pointer, TermName};
use crate::settings::{SettingKey, SettingValue, Settings};

/// Namespace prefix assumed for terms that do not declare one.
pub const DEFAULT_NAMESPACE_PREFIX: &str = "oxns";

/// Data type assumed for terms that do not declare one.
pub const DEFAULT_DATA_TYPE: &str = "string";

/// Index of a node in a [`Terminology`](crate::Terminology).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub(crate) usize);

impl Display for TermId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a term matches inside its parent element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermPath {
    /// A child element with this local name.
    Element(String),
    /// An attribute with this name.
    Attribute(String),
}

impl TermPath {
    fn from_setting(name: &TermName, value: Option<&SettingValue>) -> Self {
        let fallback = || TermPath::Element(name.to_string());
        match value {
            None | Some(SettingValue::Nil) => fallback(),
            Some(SettingValue::Str(path)) if path.is_empty() => fallback(),
            Some(SettingValue::Str(path)) => TermPath::Element(path.clone()),
            Some(SettingValue::Map(map)) => match map.get("attribute").and_then(SettingValue::to_text) {
                Some(attribute) => TermPath::Attribute(attribute),
                None => {
                    log::warn!("path of {name:?} is a mapping without an `attribute` entry; using the term name");
                    fallback()
                }
            },
            Some(other) => {
                log::warn!("path of {name:?} is a {}; using the term name", other.kind());
                fallback()
            }
        }
    }
}

/// The three path expressions synthesized for every term.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XPaths {
    /// Whole-document query, without attribute predicates.
    pub absolute: String,
    /// Whole-document query with one predicate per attribute constraint, on every segment.
    pub constrained: String,
    /// The term's own segment, for use against a context node.
    pub relative: String,
}

/// A built term.
///
/// Built once from a [`TermBuilder`](crate::TermBuilder) and read-only afterwards. Its derived
/// [`XPaths`] are always consistent with its own settings and those of its ancestors.
#[derive(Clone, Debug)]
pub struct Term {
    pub(crate) id: TermId,
    pub(crate) name: TermName,
    pub(crate) path: TermPath,
    pub(crate) namespace_prefix: Option<String>,
    pub(crate) attributes: IndexMap<String, String>,
    pub(crate) required: bool,
    pub(crate) data_type: String,
    pub(crate) index_as: IndexSet<String>,
    pub(crate) default_content_path: Option<String>,
    pub(crate) variant_of: Option<Pointer>,
    pub(crate) is_root: bool,
    pub(crate) extensions: Settings,
    pub(crate) children: IndexMap<TermName, TermId>,
    pub(crate) parent: Option<TermId>,
    pub(crate) xpaths: XPaths,
}

impl Term {
    /// Creates a term from resolved settings. Xpaths are left empty until synthesis runs.
    pub(crate) fn from_settings(
        id: TermId,
        name: &TermName,
        settings: &Settings,
        parent: Option<TermId>,
    ) -> Self {
        let text = |key: SettingKey| settings.get(&key).and_then(SettingValue::to_text);

        let namespace_prefix = match settings.get(&SettingKey::NamespacePrefix) {
            None => Some(DEFAULT_NAMESPACE_PREFIX.to_string()),
            Some(SettingValue::Nil) => None,
            Some(value) => value.to_text(),
        };

        let attributes = match settings.get(&SettingKey::Attributes) {
            Some(SettingValue::Map(map)) => map
                .iter()
                .filter_map(|(k, v)| match v.to_text() {
                    Some(v) => Some((k.clone(), v)),
                    None => {
                        log::warn!("attribute {k} of {name:?} is a {}; ignored", v.kind());
                        None
                    }
                })
                .collect(),
            _ => IndexMap::new(),
        };

        let index_as = match settings.get(&SettingKey::IndexAs) {
            Some(SettingValue::Tags(tags)) => tags.clone(),
            Some(SettingValue::Str(tag)) => IndexSet::from([tag.clone()]),
            _ => IndexSet::new(),
        };

        Self {
            id,
            name: name.clone(),
            path: TermPath::from_setting(name, settings.get(&SettingKey::Path)),
            namespace_prefix,
            attributes,
            required: settings
                .get(&SettingKey::Required)
                .and_then(SettingValue::as_bool)
                .unwrap_or(false),
            data_type: text(SettingKey::DataType).unwrap_or_else(|| DEFAULT_DATA_TYPE.to_string()),
            index_as,
            default_content_path: text(SettingKey::DefaultContentPath),
            variant_of: settings.pointer(&SettingKey::VariantOf),
            is_root: settings
                .get(&SettingKey::Root)
                .and_then(SettingValue::as_bool)
                .unwrap_or(false),
            extensions: settings.extensions(),
            children: IndexMap::new(),
            parent,
            xpaths: XPaths::default(),
        }
    }

    /// Id of this node in its terminology.
    pub fn id(&self) -> TermId {
        self.id
    }

    /// The term name.
    pub fn name(&self) -> &TermName {
        &self.name
    }

    /// What the term matches inside its parent.
    pub fn path(&self) -> &TermPath {
        &self.path
    }

    /// `None` when the term lives in no namespace.
    pub fn namespace_prefix(&self) -> Option<&str> {
        self.namespace_prefix.as_deref()
    }

    /// Attribute equality constraints, in declaration order.
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Whether the term must be present.
    pub fn required(&self) -> bool {
        self.required
    }

    /// Data type of the term's content, `string` unless declared.
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    /// Indexing hints, in declaration order.
    pub fn index_as(&self) -> &IndexSet<String> {
        &self.index_as
    }

    /// Child element holding the term's text content, if any.
    pub fn default_content_path(&self) -> Option<&str> {
        self.default_content_path.as_deref()
    }

    /// The term this one is a variant of.
    pub fn variant_of(&self) -> Option<&Pointer> {
        self.variant_of.as_ref()
    }

    /// Returns true for terms declared with `root = true`.
    pub fn is_root_term(&self) -> bool {
        self.is_root
    }

    /// Settings under keys the build step does not interpret, kept verbatim.
    pub fn extensions(&self) -> &Settings {
        &self.extensions
    }

    /// Looks up an extension setting by name.
    pub fn extension(&self, key: &str) -> Option<&SettingValue> {
        self.extensions.get(&SettingKey::from(key))
    }

    /// Id of the parent term. `None` for root terms.
    pub fn parent_id(&self) -> Option<TermId> {
        self.parent
    }

    /// Ids of the children, in declaration order.
    pub fn child_ids(&self) -> impl Iterator<Item = (&TermName, TermId)> {
        self.children.iter().map(|(name, id)| (name, *id))
    }

    /// All three synthesized xpaths.
    pub fn xpaths(&self) -> &XPaths {
        &self.xpaths
    }

    /// Whole-document xpath, without predicates.
    pub fn xpath_absolute(&self) -> &str {
        &self.xpaths.absolute
    }

    /// Whole-document xpath with attribute predicates on every segment.
    pub fn xpath_constrained(&self) -> &str {
        &self.xpaths.constrained
    }

    /// The term's own segment.
    pub fn xpath_relative(&self) -> &str {
        &self.xpaths.relative
    }
}

/// A term that owns no structure of its own and forwards to the term at [`TermProxy::proxy_pointer`].
///
/// The pointer is resolved against the children of the proxy's parent, or against the roots of
/// the terminology for a root-level proxy.
#[derive(Clone, Debug)]
pub struct TermProxy {
    pub(crate) id: TermId,
    pub(crate) name: TermName,
    pub(crate) proxy_pointer: Pointer,
    pub(crate) settings: Settings,
    pub(crate) parent: Option<TermId>,
}

impl TermProxy {
    /// Id of this node in its terminology.
    pub fn id(&self) -> TermId {
        self.id
    }

    /// The term name.
    pub fn name(&self) -> &TermName {
        &self.name
    }

    /// Where the proxy forwards to.
    pub fn proxy_pointer(&self) -> &Pointer {
        &self.proxy_pointer
    }

    /// The settings the proxy was declared with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Id of the parent term. `None` for root terms.
    pub fn parent_id(&self) -> Option<TermId> {
        self.parent
    }
}

/// A node of a built terminology.
#[derive(Clone, Debug)]
pub enum TermNode {
    /// A term with structure of its own.
    Term(Term),
    /// A proxy forwarding to another term.
    Proxy(TermProxy),
}

impl TermNode {
    /// Id of this node in its terminology.
    pub fn id(&self) -> TermId {
        match self {
            TermNode::Term(term) => term.id,
            TermNode::Proxy(proxy) => proxy.id,
        }
    }

    /// The term name.
    pub fn name(&self) -> &TermName {
        match self {
            TermNode::Term(term) => &term.name,
            TermNode::Proxy(proxy) => &proxy.name,
        }
    }

    /// Id of the parent term. `None` for root terms.
    pub fn parent_id(&self) -> Option<TermId> {
        match self {
            TermNode::Term(term) => term.parent,
            TermNode::Proxy(proxy) => proxy.parent,
        }
    }

    /// The term, unless this is a proxy.
    pub fn as_term(&self) -> Option<&Term> {
        match self {
            TermNode::Term(term) => Some(term),
            TermNode::Proxy(_) => None,
        }
    }

    /// The proxy, if this is one.
    pub fn as_proxy(&self) -> Option<&TermProxy> {
        match self {
            TermNode::Term(_) => None,
            TermNode::Proxy(proxy) => Some(proxy),
        }
    }

    pub(crate) fn as_term_mut(&mut self) -> Option<&mut Term> {
        match self {
            TermNode::Term(term) => Some(term),
            TermNode::Proxy(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(name: &str, settings: Settings) -> Term {
        Term::from_settings(TermId(0), &TermName::from(name), &settings, None)
    }

    #[test]
    fn test_defaults() {
        let term = build("person", Settings::new());
        assert_eq!(&TermPath::Element("person".to_string()), term.path());
        assert_eq!(Some(DEFAULT_NAMESPACE_PREFIX), term.namespace_prefix());
        assert_eq!(DEFAULT_DATA_TYPE, term.data_type());
        assert!(!term.required());
        assert!(!term.is_root_term());
        assert!(term.attributes().is_empty());
    }

    #[test]
    fn test_explicit_nil_namespace() {
        let mut settings = Settings::new();
        settings.insert(SettingKey::NamespacePrefix, SettingValue::Nil);
        assert_eq!(None, build("title", settings).namespace_prefix());
    }

    #[test]
    fn test_empty_path_falls_back_to_name() {
        let mut settings = Settings::new();
        settings.insert(SettingKey::Path, "");
        assert_eq!(
            &TermPath::Element("title".to_string()),
            build("title", settings).path()
        );
    }

    #[test]
    fn test_attribute_path() {
        let mut settings = Settings::new();
        settings.insert(SettingKey::Path, SettingValue::map([("attribute", "lang")]));
        assert_eq!(
            &TermPath::Attribute("lang".to_string()),
            build("language", settings).path()
        );
    }

    #[test]
    fn test_known_fields_copied() {
        let mut settings = Settings::new();
        settings.insert(SettingKey::Required, true);
        settings.insert(SettingKey::DataType, "date");
        settings.insert(SettingKey::IndexAs, SettingValue::tags(["facetable", "sortable"]));
        settings.insert(SettingKey::DefaultContentPath, "number");
        settings.insert(SettingKey::VariantOf, Pointer::from("access"));
        settings.insert(SettingKey::Attributes, SettingValue::map([("type", "volume")]));
        settings.insert("label", "Volume");

        let term = build("volume", settings);
        assert!(term.required());
        assert_eq!("date", term.data_type());
        assert_eq!(2, term.index_as().len());
        assert_eq!(Some("number"), term.default_content_path());
        assert_eq!(Some(&Pointer::from("access")), term.variant_of());
        assert_eq!(Some(&"volume".to_string()), term.attributes().get("type"));
        assert_eq!(Some(&SettingValue::from("Volume")), term.extension("label"));
        assert_eq!(1, term.extensions().len());
    }
}
