//! Resolution of `ref` settings.
//!
//! A builder with a `ref` setting imports the settings and children of the builder that the
//! reference points at. References can be chained: the referenced builder may itself refer to
//! another one. [`TermBuilder::lookup_refs`] walks such a chain, and
//! [`TermBuilder::resolve_refs`] merges everything found along it into the referencing builder.

use crate::builder::{BuilderId, TermBuilder};
use crate::error::TerminologyError;
use crate::merge::two_layer_merge;
use crate::pointer::{Pointer, TermName};
use crate::settings::{SettingKey, SettingValue};

/// Lookup contract of a terminology registry.
///
/// Implemented by [`TerminologyBuilder`](crate::TerminologyBuilder); references are resolved
/// against whatever registry is passed in, never against global state.
pub trait TermRegistry {
    /// Returns the builder addressed by `pointer`, descending from the registry's roots.
    fn resolve(&self, pointer: &Pointer) -> Result<&TermBuilder, TerminologyError>;
}

/// Builders visited while following a chain of references, innermost last.
///
/// Kept as a linked list on the stack: every step of the chain only borrows its prefix.
#[derive(Clone, Copy)]
enum Trail<'a> {
    Start,
    Step {
        prefix: &'a Trail<'a>,
        id: BuilderId,
        name: &'a TermName,
    },
}

impl<'a> Trail<'a> {
    fn step(&'a self, builder: &'a TermBuilder) -> Trail<'a> {
        Trail::Step {
            prefix: self,
            id: builder.id(),
            name: builder.name(),
        }
    }

    fn contains(&self, builder: BuilderId) -> bool {
        match self {
            Trail::Start => false,
            Trail::Step { prefix, id, .. } => *id == builder || prefix.contains(builder),
        }
    }

    fn names(&self) -> Vec<TermName> {
        match self {
            Trail::Start => Vec::new(),
            Trail::Step { prefix, name, .. } => {
                let mut names = prefix.names();
                names.push((*name).clone());
                names
            }
        }
    }
}

impl TermBuilder {
    /// Follows the `ref` setting of this builder, transitively.
    ///
    /// Returns the builders that were referenced, nearest first. Builders without a `ref`
    /// setting return an empty list and do not need a registry.
    ///
    /// Fails with [`TerminologyError::BadPointer`] if a reference does not resolve,
    /// with [`TerminologyError::CircularReference`] if the chain revisits a builder, and with
    /// [`TerminologyError::MissingReferenceContext`] if a reference is found but no registry
    /// was given.
    pub fn lookup_refs<'r>(
        &self,
        registry: Option<&'r dyn TermRegistry>,
    ) -> Result<Vec<&'r TermBuilder>, TerminologyError> {
        self.lookup_refs_along(registry, &Trail::Start)
    }

    fn lookup_refs_along<'r>(
        &self,
        registry: Option<&'r dyn TermRegistry>,
        trail: &Trail<'_>,
    ) -> Result<Vec<&'r TermBuilder>, TerminologyError> {
        let Some(value) = self.settings.get(&SettingKey::Ref) else {
            return Ok(Vec::new());
        };
        let Some(pointer) = value.to_pointer() else {
            log::warn!("ref of {:?} is a {}; ignored", self.name, value.kind());
            return Ok(Vec::new());
        };
        let registry = registry.ok_or_else(|| TerminologyError::MissingReferenceContext {
            name: self.name.clone(),
        })?;

        let target = registry
            .resolve(&pointer)
            .map_err(|_| TerminologyError::BadPointer {
                name: self.name.clone(),
                pointer: pointer.clone(),
            })?;

        let trail = trail.step(self);
        if trail.contains(target.id()) {
            let mut names = trail.names();
            names.push(target.name.clone());
            return Err(TerminologyError::CircularReference { trail: names });
        }

        log::debug!("{:?} refers to {:?} at {}", self.name, target.name, pointer);
        let mut result = vec![target];
        result.extend(target.lookup_refs_along(Some(registry), &trail)?);
        Ok(result)
    }

    /// Merges the settings and children of every builder referenced by this one into it.
    ///
    /// Settings are merged with [`two_layer_merge`], this builder's own settings winning.
    /// Children are only added when this builder has no child of the same name. If no `path`
    /// is set afterwards, the path becomes the name of the last builder in the chain.
    ///
    /// The `ref` setting is removed at the end, so calling this again is a no-op.
    pub fn resolve_refs(
        &mut self,
        registry: Option<&dyn TermRegistry>,
    ) -> Result<&mut Self, TerminologyError> {
        let targets = self.lookup_refs(registry)?;
        if !targets.is_empty() {
            log::info!(
                "resolving {:?} through {}",
                self.name,
                targets
                    .iter()
                    .map(|t| format!("{:?}", t.name))
                    .collect::<Vec<_>>()
                    .join(" => ")
            );
        }

        for target in &targets {
            self.settings = two_layer_merge(&self.settings, &target.settings);
            for (name, child) in &target.children {
                if !self.children.contains_key(name) {
                    self.children.insert(name.clone(), child.clone());
                }
            }
        }

        if let Some(last) = targets.last() {
            if !self.settings.contains_key(&SettingKey::Path) {
                self.settings
                    .insert(SettingKey::Path, SettingValue::Str(last.name.to_string()));
            }
        }

        self.settings.remove(&SettingKey::Ref);
        Ok(self)
    }
}
