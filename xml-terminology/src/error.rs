use thiserror::Error;

use crate::pointer::{Pointer, TermName};
use crate::term::TermId;

/// Errors raised while declaring, resolving or building a terminology.
///
/// All of these are declaration-time errors: none are retried, and any of them aborts the
/// construction of the terminology that raised it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminologyError {
    /// A `ref` or `proxy` pointer does not address an existing term.
    #[error("{name:?} refers to a term builder that doesn't exist. The bad pointer is {pointer}")]
    BadPointer {
        /// The term whose pointer could not be resolved.
        name: TermName,
        /// The offending pointer, verbatim.
        pointer: Pointer,
    },
    /// A registry lookup failed partway through a pointer.
    #[error(
        "no term builder exists at {pointer}; everything is fine until {missing:?}, which doesn't exist"
    )]
    NoSuchTerm {
        /// The pointer that was looked up.
        pointer: Pointer,
        /// The first segment of `pointer` without a matching term.
        missing: TermName,
    },
    /// A registry lookup was attempted with a pointer without segments.
    #[error("cannot retrieve a term builder with an empty pointer")]
    EmptyPointer,
    /// A chain of references (or proxies) loops back onto itself.
    #[error("Circular reference in terminology: {}", join_trail(.trail))]
    CircularReference {
        /// Every term visited, in traversal order, ending in the repeated one.
        trail: Vec<TermName>,
    },
    /// A builder declares a `ref` but has no registry to resolve it against.
    #[error("cannot look up references for the {name:?} builder: it is not attached to any terminology")]
    MissingReferenceContext {
        /// The builder that declared the reference.
        name: TermName,
    },
    /// A node id was used with a terminology it does not belong to.
    #[error("no node with id {id} exists in this terminology")]
    UnknownTerm {
        /// The id that was looked up.
        id: TermId,
    },
    /// The textual form of a pointer could not be parsed.
    #[error("invalid pointer {input:?}: {message}")]
    PointerSyntax {
        /// The text that was parsed.
        input: String,
        /// What the parser expected.
        message: String,
    },
}

fn join_trail(trail: &[TermName]) -> String {
    trail
        .iter()
        .map(|name| format!("{name:?}"))
        .collect::<Vec<_>>()
        .join(" => ")
}
