//! Path expression synthesis.
//!
//! Every built [`Term`] carries three xpaths derived from its own `path`, `namespace_prefix` and
//! `attributes`, and from the xpaths of its parent. [`regenerate`] recomputes them for a node and
//! all of its descendants, parents strictly before children. There is no incremental
//! recomputation: any structural edit regenerates the whole subtree below the edit.

use indexmap::IndexMap;

use crate::term::{Term, TermId, TermNode, TermPath, XPaths};

/// The segment a term contributes to a path, e.g. `oxns:person` or `@lang`.
pub(crate) fn segment(term: &Term) -> String {
    match (&term.path, term.namespace_prefix.as_deref()) {
        (TermPath::Attribute(attribute), _) => format!("@{attribute}"),
        (TermPath::Element(path), Some(prefix)) => format!("{prefix}:{path}"),
        (TermPath::Element(path), None) => path.clone(),
    }
}

/// One `[@name="value"]` predicate per attribute, in insertion order.
pub(crate) fn predicates(attributes: &IndexMap<String, String>) -> String {
    attributes
        .iter()
        .map(|(name, value)| format!("[@{name}={}]", quote(value)))
        .collect()
}

/// Quotes a string as an xpath literal.
pub(crate) fn quote(value: &str) -> String {
    match (value.contains('"'), value.contains('\'')) {
        (false, _) => format!("\"{value}\""),
        (true, false) => format!("'{value}'"),
        (true, true) => {
            // xpath 1.0 has no escapes
            let parts: Vec<_> = value
                .split('"')
                .map(|part| format!("\"{part}\""))
                .collect();
            format!("concat({})", parts.join(", '\"', "))
        }
    }
}

fn synthesize(term: &Term, parent: Option<&XPaths>) -> XPaths {
    let segment = segment(term);
    let predicates = match term.path {
        TermPath::Element(_) => predicates(&term.attributes),
        TermPath::Attribute(_) => String::new(),
    };

    let (absolute, constrained) = match parent {
        None => (format!("//{segment}"), format!("//{segment}{predicates}")),
        Some(parent) => (
            format!("{}/{segment}", parent.absolute),
            format!("{}/{segment}{predicates}", parent.constrained),
        ),
    };

    XPaths {
        absolute,
        constrained,
        relative: segment,
    }
}

/// Recomputes the xpaths of `start` and every term below it.
///
/// `start`'s parent must already carry up-to-date xpaths. Proxies carry no xpaths of their own
/// and own no children, so they end the walk.
pub(crate) fn regenerate(nodes: &mut [TermNode], start: TermId) {
    let mut stack = vec![start];

    while let Some(id) = stack.pop() {
        let parent_xpaths = nodes[id.0]
            .parent_id()
            .and_then(|parent| nodes[parent.0].as_term())
            .map(|parent| parent.xpaths.clone());

        let Some(term) = nodes[id.0].as_term_mut() else {
            continue;
        };
        term.xpaths = synthesize(term, parent_xpaths.as_ref());
        log::debug!("{:?} is at {}", term.name, term.xpaths.constrained);

        stack.extend(term.children.values().rev().copied());
    }
}
