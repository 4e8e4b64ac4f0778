#![warn(missing_docs)]
//! Declare XML terminologies and compile them into xpath queries.
//!
//! A terminology is a tree of named terms, each describing where a piece of data lives inside a
//! class of XML documents. Terms are declared with [`TermBuilder`]s, registered in a
//! [`TerminologyBuilder`], and built into a [`Terminology`] whose terms carry three
//! synthesized xpaths each:
//!
//! * an absolute path for whole-document queries,
//! * a constrained path, which adds attribute predicates on every segment,
//! * a relative path, for queries against a context node.
//!
//! Terms can import the settings and children of another term through a reference
//! ([`TermBuilder::refers_to`]), and forward to another term entirely as a proxy
//! ([`TermBuilder::proxy`]).
//!
//! ```
//! use xml_terminology::{Pointer, TerminologyBuilder};
//!
//! let terminology = TerminologyBuilder::new()
//!     .term("name", |t| t.with_child("namePart", |p| p))
//!     .term("person", |t| t.refers_to("name").attributes([("type", "personal")]))
//!     .build()
//!     .unwrap();
//!
//! let part = terminology
//!     .retrieve_term(&Pointer::from(["person", "namePart"]))
//!     .unwrap();
//! assert_eq!("//oxns:name/oxns:namePart", part.xpath_absolute());
//! assert_eq!(
//!     r#"//oxns:name[@type="personal"]/oxns:namePart"#,
//!     part.xpath_constrained()
//! );
//! ```
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![allow(unknown_lints)]
#![allow(unexpected_cfgs)]

mod builder;
pub use builder::{BuilderId, TermBuilder};

mod error;
pub use error::TerminologyError;

mod merge;
pub use merge::two_layer_merge;

mod parse;

mod pointer;
pub use pointer::{IndexedPointer, Pointer, PointerSegment, TermName};

#[cfg(feature = "dot")]
mod render;
#[cfg(feature = "dot")]
pub use render::RenderSettings;

mod resolve;
pub use resolve::TermRegistry;

mod settings;
pub use settings::{SettingKey, SettingValue, Settings};

mod term;
pub use term::{
    Term, TermId, TermNode, TermPath, TermProxy, XPaths, DEFAULT_DATA_TYPE,
    DEFAULT_NAMESPACE_PREFIX,
};

mod terminology;
pub use terminology::{Terminology, TerminologyBuilder};

mod xpath;
