//! The terminology registry and the terminology it builds.

use indexmap::IndexMap;

use crate::builder::{BuilderId, TermBuilder};
use crate::error::TerminologyError;
use crate::pointer::{IndexedPointer, Pointer, TermName};
use crate::resolve::TermRegistry;
use crate::settings::SettingKey;
use crate::term::{Term, TermId, TermNode, TermPath, TermProxy};
use crate::xpath;

/// Registry of root [`TermBuilder`]s, used while a terminology is being declared.
///
/// References between builders are resolved against this registry when it is [built](Self::build).
///
/// ```
/// use xml_terminology::{Pointer, TerminologyBuilder};
///
/// let terminology = TerminologyBuilder::new()
///     .term("access", |t| t.with_child("machine", |m| m.with_child("person", |p| p)))
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     Some("//oxns:access/oxns:machine/oxns:person"),
///     terminology.xpath_for(&Pointer::from(["access", "machine", "person"]))
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct TerminologyBuilder {
    terms: IndexMap<TermName, TermBuilder>,
}

impl TerminologyBuilder {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a root term named `name`, configured by `f`.
    pub fn term(
        mut self,
        name: impl Into<TermName>,
        f: impl FnOnce(TermBuilder) -> TermBuilder,
    ) -> Self {
        self.add_term(f(TermBuilder::new(name)));
        self
    }

    /// Adds a root term, replacing any root term with the same name.
    pub fn add_term(&mut self, builder: TermBuilder) -> &mut Self {
        self.terms.insert(builder.name().clone(), builder);
        self
    }

    /// Root builders, in declaration order.
    pub fn root_term_builders(&self) -> impl Iterator<Item = &TermBuilder> {
        self.terms.values()
    }

    /// Returns the builder at `pointer`, descending from the root builders.
    pub fn retrieve_term_builder(&self, pointer: &Pointer) -> Result<&TermBuilder, TerminologyError> {
        let (first, rest) = pointer
            .segments()
            .split_first()
            .ok_or(TerminologyError::EmptyPointer)?;
        let no_such_term = |missing: &TermName| TerminologyError::NoSuchTerm {
            pointer: pointer.clone(),
            missing: missing.clone(),
        };

        let mut builder = self.terms.get(first).ok_or_else(|| no_such_term(first))?;
        for name in rest {
            builder = builder
                .retrieve_child(name.as_str())
                .ok_or_else(|| no_such_term(name))?;
        }
        Ok(builder)
    }

    /// Mutable access to the builder at `pointer`.
    pub fn retrieve_term_builder_mut(
        &mut self,
        pointer: &Pointer,
    ) -> Result<&mut TermBuilder, TerminologyError> {
        let (first, rest) = pointer
            .segments()
            .split_first()
            .ok_or(TerminologyError::EmptyPointer)?;
        let no_such_term = |missing: &TermName| TerminologyError::NoSuchTerm {
            pointer: pointer.clone(),
            missing: missing.clone(),
        };

        let mut builder = self
            .terms
            .get_mut(first)
            .ok_or_else(|| no_such_term(first))?;
        for name in rest {
            builder = builder
                .retrieve_child_mut(name.as_str())
                .ok_or_else(|| no_such_term(name))?;
        }
        Ok(builder)
    }

    /// Builds every root term into a [`Terminology`].
    ///
    /// The registry itself is left untouched: each root builder is copied, and references are
    /// resolved against the builders as they were declared.
    pub fn build(&self) -> Result<Terminology, TerminologyError> {
        let mut terminology = Terminology::default();
        for builder in self.terms.values() {
            let id = terminology.build_node(builder.clone(), None, Some(self), &mut Vec::new())?;
            terminology.roots.insert(builder.name().clone(), id);
        }
        terminology.link_proxies()?;
        let roots: Vec<_> = terminology.roots.values().copied().collect();
        for id in roots {
            terminology.regenerate_xpaths(id);
        }
        log::info!(
            "built terminology with {} root terms and {} nodes",
            terminology.roots.len(),
            terminology.nodes.len()
        );
        Ok(terminology)
    }
}

impl TermRegistry for TerminologyBuilder {
    fn resolve(&self, pointer: &Pointer) -> Result<&TermBuilder, TerminologyError> {
        self.retrieve_term_builder(pointer)
    }
}

impl TermBuilder {
    /// Builds this builder (and its children) into a terminology with a single root.
    ///
    /// This builder is not modified; its references are resolved on a copy. A builder that
    /// declares a `ref` somewhere in its tree needs a `registry`.
    pub fn build(&self, registry: Option<&dyn TermRegistry>) -> Result<Terminology, TerminologyError> {
        let mut terminology = Terminology::default();
        let id = terminology.build_node(self.clone(), None, registry, &mut Vec::new())?;
        terminology.roots.insert(self.name().clone(), id);
        terminology.link_proxies()?;
        terminology.regenerate_xpaths(id);
        Ok(terminology)
    }
}

/// A built terminology.
///
/// Nodes live in an arena and are addressed by [`TermId`]. Children are owned through their
/// parent's child map, and every node knows its parent id. A built terminology is not changed
/// by lookups and can be shared between threads.
#[derive(Clone, Debug, Default)]
pub struct Terminology {
    nodes: Vec<TermNode>,
    roots: IndexMap<TermName, TermId>,
}

impl Terminology {
    /// Resolves the references of `builder`, then adds it and its children to the arena.
    ///
    /// `ancestors` holds the builders currently being built above this one. A builder that
    /// imports a copy of one of its own ancestors would otherwise be expanded forever.
    fn build_node(
        &mut self,
        mut builder: TermBuilder,
        parent: Option<TermId>,
        registry: Option<&dyn TermRegistry>,
        ancestors: &mut Vec<(BuilderId, TermName)>,
    ) -> Result<TermId, TerminologyError> {
        if ancestors.iter().any(|(id, _)| *id == builder.id()) {
            let mut trail: Vec<_> = ancestors.iter().map(|(_, name)| name.clone()).collect();
            trail.push(builder.name().clone());
            return Err(TerminologyError::CircularReference { trail });
        }

        builder.resolve_refs(registry)?;
        let id = TermId(self.nodes.len());

        if let Some(proxy_pointer) = builder.settings.pointer(&SettingKey::Proxy) {
            log::info!("built proxy {:?} to {}", builder.name, proxy_pointer);
            self.nodes.push(TermNode::Proxy(TermProxy {
                id,
                name: builder.name,
                proxy_pointer,
                settings: builder.settings,
                parent,
            }));
            return Ok(id);
        }

        log::info!("built term {:?}", builder.name);
        self.nodes.push(TermNode::Term(Term::from_settings(
            id,
            &builder.name,
            &builder.settings,
            parent,
        )));

        ancestors.push((builder.id(), builder.name.clone()));
        for (name, child) in builder.children {
            let child_id = self.build_node(child, Some(id), registry, ancestors)?;
            if let Some(term) = self.nodes[id.0].as_term_mut() {
                term.children.insert(name, child_id);
            }
        }
        ancestors.pop();

        Ok(id)
    }

    /// Checks that every proxy leads to a term.
    fn link_proxies(&self) -> Result<(), TerminologyError> {
        for node in &self.nodes {
            if let TermNode::Proxy(proxy) = node {
                let target = self.follow(proxy.id, &mut Vec::new())?;
                log::debug!(
                    "proxy {:?} forwards to {:?}",
                    proxy.name,
                    self.nodes[target.0].name()
                );
            }
        }
        Ok(())
    }

    /// Follows `id` through any number of proxies to the term it stands for.
    ///
    /// `in_progress` holds the proxies whose targets are currently being resolved.
    fn follow(&self, id: TermId, in_progress: &mut Vec<TermId>) -> Result<TermId, TerminologyError> {
        let node = self
            .nodes
            .get(id.0)
            .ok_or(TerminologyError::UnknownTerm { id })?;
        let TermNode::Proxy(proxy) = node else {
            return Ok(id);
        };
        if in_progress.contains(&id) {
            let mut trail: Vec<_> = in_progress
                .iter()
                .map(|id| self.nodes[id.0].name().clone())
                .collect();
            trail.push(proxy.name.clone());
            return Err(TerminologyError::CircularReference { trail });
        }

        let bad_pointer = || TerminologyError::BadPointer {
            name: proxy.name.clone(),
            pointer: proxy.proxy_pointer.clone(),
        };

        in_progress.push(id);
        let mut scope = proxy.parent;
        let mut target = None;
        for name in proxy.proxy_pointer.iter() {
            let next = self.child(scope, name).ok_or_else(bad_pointer)?;
            let next = self.follow(next, in_progress)?;
            scope = Some(next);
            target = Some(next);
        }
        in_progress.pop();

        target.ok_or_else(bad_pointer)
    }

    /// The child named `name` of the term at `scope`, or the root named `name`.
    fn child(&self, scope: Option<TermId>, name: &TermName) -> Option<TermId> {
        match scope {
            None => self.roots.get(name).copied(),
            Some(scope) => self
                .term(scope)
                .and_then(|term| term.children.get(name).copied()),
        }
    }

    /// Walks `pointer` down from `scope`, following proxies.
    fn locate(&self, scope: Option<TermId>, pointer: &Pointer) -> Result<TermId, TerminologyError> {
        if pointer.is_empty() {
            return Err(TerminologyError::EmptyPointer);
        }
        let mut current = scope;
        for name in pointer.iter() {
            let next = self
                .child(current, name)
                .ok_or_else(|| TerminologyError::NoSuchTerm {
                    pointer: pointer.clone(),
                    missing: name.clone(),
                })?;
            current = Some(self.follow(next, &mut Vec::new())?);
        }
        current.ok_or(TerminologyError::EmptyPointer)
    }

    /// Returns the term at `pointer`, descending from the root terms.
    ///
    /// Proxies along the way are followed. Returns `None` as soon as a segment is absent.
    pub fn retrieve_term(&self, pointer: &Pointer) -> Option<&Term> {
        self.locate(None, pointer).ok().and_then(|id| self.term(id))
    }

    /// Returns the term at `pointer`, descending from the children of `term`.
    pub fn retrieve_from(&self, term: TermId, pointer: &Pointer) -> Option<&Term> {
        self.locate(Some(term), pointer)
            .ok()
            .and_then(|id| self.term(id))
    }

    /// Returns true if [`retrieve_term`](Self::retrieve_term) finds a term.
    pub fn has_term(&self, pointer: &Pointer) -> bool {
        self.retrieve_term(pointer).is_some()
    }

    /// The absolute xpath of the term at `pointer`.
    pub fn xpath_for(&self, pointer: &Pointer) -> Option<&str> {
        self.retrieve_term(pointer).map(Term::xpath_absolute)
    }

    /// Builds a query for a specific node, e.g. the second `name` and its `namePart`.
    ///
    /// Each segment is the addressed term's relative xpath with its attribute predicates, and a
    /// 1-based position predicate for segments that carry an index:
    /// `//oxns:name[@type="personal"][2]/oxns:namePart`. A segment that names a proxy expands
    /// into one step per term along the proxy's pointer, and its index applies to the last one.
    pub fn xpath_with_indexes(&self, pointer: &IndexedPointer) -> Option<String> {
        let mut scope = None;
        let mut steps = Vec::with_capacity(pointer.segments().len());

        for segment in pointer.segments() {
            let id = self.child(scope, &segment.name)?;
            let path = self.expand(id, &mut Vec::new())?;
            let (&last, _) = path.split_last()?;

            for &step in &path {
                let term = self.term(step)?;
                let mut text = term.xpath_relative().to_string();
                if let TermPath::Element(_) = term.path() {
                    text.push_str(&xpath::predicates(term.attributes()));
                }
                if step == last {
                    if let Some(index) = segment.index {
                        text.push_str(&format!("[{}]", index.checked_add(1)?));
                    }
                }
                steps.push(text);
            }
            scope = Some(last);
        }

        if steps.is_empty() {
            return None;
        }
        Some(format!("//{}", steps.join("/")))
    }

    /// The terms a node stands for, one per element step: the node itself for a term, and every
    /// term along its pointer for a proxy.
    fn expand(&self, id: TermId, in_progress: &mut Vec<TermId>) -> Option<Vec<TermId>> {
        let proxy = match self.node(id)? {
            TermNode::Term(_) => return Some(vec![id]),
            TermNode::Proxy(proxy) => proxy,
        };
        if in_progress.contains(&id) {
            return None;
        }

        in_progress.push(id);
        let mut scope = proxy.parent;
        let mut path = Vec::new();
        for name in proxy.proxy_pointer.iter() {
            let steps = self.expand(self.child(scope, name)?, in_progress)?;
            scope = steps.last().copied();
            path.extend(steps);
        }
        in_progress.pop();

        Some(path)
    }

    /// Root terms in declaration order.
    pub fn roots(&self) -> impl Iterator<Item = &TermNode> {
        self.roots.values().map(|id| &self.nodes[id.0])
    }

    /// Top-level terms declared with `root = true`.
    pub fn root_terms(&self) -> impl Iterator<Item = &Term> {
        self.roots()
            .filter_map(TermNode::as_term)
            .filter(|term| term.is_root_term())
    }

    /// The `xmlns` setting of the first root term.
    pub fn xmlns(&self) -> Option<&str> {
        self.root_extension("xmlns")
    }

    /// The `schema` setting of the first root term.
    pub fn schema(&self) -> Option<&str> {
        self.root_extension("schema")
    }

    fn root_extension(&self, key: &str) -> Option<&str> {
        self.root_terms()
            .next()
            .and_then(|term| term.extension(key))
            .and_then(|value| value.as_str())
    }

    /// The node with this id, term or proxy.
    pub fn node(&self, id: TermId) -> Option<&TermNode> {
        self.nodes.get(id.0)
    }

    /// The term with this id, or `None` if it is a proxy.
    pub fn term(&self, id: TermId) -> Option<&Term> {
        self.node(id).and_then(TermNode::as_term)
    }

    /// The parent term of the node with this id.
    pub fn parent(&self, id: TermId) -> Option<&Term> {
        self.node(id)
            .and_then(TermNode::parent_id)
            .and_then(|parent| self.term(parent))
    }

    /// Children of the term with this id, in declaration order. Proxies are not followed.
    pub fn children(&self, id: TermId) -> impl Iterator<Item = &TermNode> {
        self.term(id)
            .into_iter()
            .flat_map(|term| term.children.values())
            .map(|child| &self.nodes[child.0])
    }

    /// Every node reachable from the roots, parents before children.
    pub fn walk(&self) -> Vec<TermId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<_> = self.roots.values().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(term) = self.term(id) {
                stack.extend(term.children.values().rev().copied());
            }
        }
        order
    }

    /// The term a node stands for: the node itself for a term, the target for a proxy.
    pub fn resolve_proxy(&self, id: TermId) -> Result<&Term, TerminologyError> {
        let target = self.follow(id, &mut Vec::new())?;
        self.term(target)
            .ok_or(TerminologyError::UnknownTerm { id: target })
    }

    /// Builds `builder` and attaches it as a child of the term at `parent`.
    ///
    /// A child with the same name is replaced; its old subtree stays in the arena, detached.
    /// The xpaths of the new subtree are regenerated before returning. On error the terminology
    /// is left as it was.
    pub fn graft(
        &mut self,
        parent: &Pointer,
        builder: TermBuilder,
        registry: Option<&dyn TermRegistry>,
    ) -> Result<TermId, TerminologyError> {
        let parent_id = self.locate(None, parent)?;
        let name = builder.name().clone();
        let arena_len = self.nodes.len();

        let id = match self.build_node(builder, Some(parent_id), registry, &mut Vec::new()) {
            Ok(id) => id,
            Err(e) => {
                self.nodes.truncate(arena_len);
                return Err(e);
            }
        };

        let replaced = self.nodes[parent_id.0]
            .as_term_mut()
            .and_then(|term| term.children.insert(name.clone(), id));

        if let Err(e) = self.link_proxies() {
            if let Some(term) = self.nodes[parent_id.0].as_term_mut() {
                match replaced {
                    Some(old) => {
                        term.children.insert(name, old);
                    }
                    None => {
                        term.children.shift_remove(&name);
                    }
                }
            }
            self.nodes.truncate(arena_len);
            return Err(e);
        }

        log::info!("grafted {:?} under {}", name, parent);
        self.regenerate_xpaths(id);
        Ok(id)
    }

    /// Recomputes the xpaths of the node with this id and of everything below it.
    pub fn regenerate_xpaths(&mut self, id: TermId) {
        if id.0 < self.nodes.len() {
            xpath::regenerate(&mut self.nodes, id);
        }
    }
}
