//! Mutable staging representation of a term, used while a terminology is being declared.

use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;

use crate::pointer::{Pointer, TermName};
use crate::settings::{SettingKey, SettingValue, Settings};

/// Identity of a [`TermBuilder`].
///
/// Clones of a builder share its identity, so a builder reached twice through a chain of
/// references is recognised as the same builder even when the chain runs over copies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuilderId(usize);

impl BuilderId {
    fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Staging entity for a single term.
///
/// A builder owns its children. Settings are an open bag: besides the keys the build step
/// interprets, any [extension key](TermBuilder::setting) is accepted and carried through.
///
/// ```
/// use xml_terminology::TermBuilder;
///
/// let person = TermBuilder::new("person")
///     .path("name")
///     .attributes([("type", "personal")])
///     .index_as(["facetable"])
///     .required(true);
/// assert_eq!("person", person.name().as_str());
/// ```
#[derive(Clone, Debug)]
pub struct TermBuilder {
    id: BuilderId,
    pub(crate) name: TermName,
    pub(crate) settings: Settings,
    pub(crate) children: IndexMap<TermName, TermBuilder>,
}

impl TermBuilder {
    /// Creates a builder without settings or children.
    pub fn new(name: impl Into<TermName>) -> Self {
        Self {
            id: BuilderId::fresh(),
            name: name.into(),
            settings: Settings::new(),
            children: IndexMap::new(),
        }
    }

    /// Identity shared by this builder and its clones.
    pub fn id(&self) -> BuilderId {
        self.id
    }

    /// The term name.
    pub fn name(&self) -> &TermName {
        &self.name
    }

    /// Every setting declared on this builder, including extension keys.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access to the settings bag.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Child builders, in declaration order.
    pub fn children(&self) -> impl Iterator<Item = &TermBuilder> {
        self.children.values()
    }

    /// Adds `child`, replacing any existing child with the same name.
    pub fn add_child(&mut self, child: TermBuilder) -> &mut Self {
        self.children.insert(child.name.clone(), child);
        self
    }

    /// The direct child named `name`.
    pub fn retrieve_child(&self, name: &str) -> Option<&TermBuilder> {
        self.children.get(name)
    }

    /// Mutable access to the direct child named `name`.
    pub fn retrieve_child_mut(&mut self, name: &str) -> Option<&mut TermBuilder> {
        self.children.get_mut(name)
    }

    /// Walks down the children of this builder along `pointer`.
    pub fn retrieve_descendant(&self, pointer: &Pointer) -> Option<&TermBuilder> {
        pointer
            .iter()
            .try_fold(self, |builder, name| builder.retrieve_child(name.as_str()))
    }

    /// Sets an arbitrary setting. Unknown keys are stored verbatim.
    pub fn setting(mut self, key: impl Into<SettingKey>, value: impl Into<SettingValue>) -> Self {
        self.settings.insert(key, value);
        self
    }

    /// Local name of the element the term matches. Defaults to the term name.
    pub fn path(self, path: impl Into<String>) -> Self {
        self.setting(SettingKey::Path, SettingValue::Str(path.into()))
    }

    /// Makes the term match an attribute of its parent element instead of a child element.
    pub fn attribute_path(self, attribute: impl Into<String>) -> Self {
        let attribute: String = attribute.into();
        self.setting(SettingKey::Path, SettingValue::map([("attribute", attribute)]))
    }

    /// Attribute equality constraints. Order is kept in generated predicates.
    pub fn attributes<K, V>(self, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map: IndexMap<String, SettingValue> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), SettingValue::Str(v.into())))
            .collect();
        self.setting(SettingKey::Attributes, map)
    }

    /// Marks the term as required.
    pub fn required(self, required: bool) -> Self {
        self.setting(SettingKey::Required, required)
    }

    /// Data type of the term's content, `string` unless set.
    pub fn data_type(self, data_type: impl Into<String>) -> Self {
        self.setting(SettingKey::DataType, SettingValue::Str(data_type.into()))
    }

    /// Indexing hints, e.g. `facetable` or `sortable`.
    pub fn index_as<T: Into<String>>(self, tags: impl IntoIterator<Item = T>) -> Self {
        self.setting(SettingKey::IndexAs, SettingValue::tags(tags))
    }

    /// Child element holding the term's text content.
    pub fn default_content_path(self, path: impl Into<String>) -> Self {
        self.setting(SettingKey::DefaultContentPath, SettingValue::Str(path.into()))
    }

    /// Namespace prefix used in generated xpaths. Defaults to `oxns`.
    pub fn namespace_prefix(self, prefix: impl Into<String>) -> Self {
        self.setting(SettingKey::NamespacePrefix, SettingValue::Str(prefix.into()))
    }

    /// Declares that the term lives in no namespace.
    pub fn no_namespace(self) -> Self {
        self.setting(SettingKey::NamespacePrefix, SettingValue::Nil)
    }

    /// Marks the term as a variant of the term at `term`. Nothing is imported.
    pub fn variant_of(self, term: impl Into<Pointer>) -> Self {
        self.setting(SettingKey::VariantOf, term.into())
    }

    /// Imports the settings and children of the term at `pointer` when this term is built.
    pub fn refers_to(self, pointer: impl Into<Pointer>) -> Self {
        self.setting(SettingKey::Ref, pointer.into())
    }

    /// Turns this term into an alias that forwards to the term at `pointer`.
    pub fn proxy(self, pointer: impl Into<Pointer>) -> Self {
        self.setting(SettingKey::Proxy, pointer.into())
    }

    /// Marks the term as the root element of the document.
    pub fn root(self, root: bool) -> Self {
        self.setting(SettingKey::Root, root)
    }

    /// Adds a child builder.
    pub fn child(mut self, child: TermBuilder) -> Self {
        self.add_child(child);
        self
    }

    /// Declares a child named `name`, configured by `f`.
    pub fn with_child(
        self,
        name: impl Into<TermName>,
        f: impl FnOnce(TermBuilder) -> TermBuilder,
    ) -> Self {
        self.child(f(TermBuilder::new(name)))
    }
}
