//! # dbusgen Schema
//!
//! D-Bus introspection XML parser and interface representation.
//!
//! This crate provides:
//! - Introspection XML parsing with attached documentation comments
//! - Structural validation and type signature checking
//! - A merged, immutable intermediate representation for code generation
//! - Canonical ordering of that representation

pub mod doc;
pub mod error;
pub mod ir;
pub mod order;
pub mod parser;
pub mod signature;
pub mod types;
pub mod validation;

pub use doc::DocComment;
pub use error::{ErrorKind, ParseError, SchemaError, SignatureError};
pub use ir::{InterfaceInfo, InterfaceIr, IrOptions};
pub use order::SortedIr;
pub use parser::parse_document;
pub use types::{
    Access, Annotation, ArgDef, Direction, InterfaceDef, MethodDef, Node, PropertyDef, SignalDef,
};
