//! # dbusgen Codegen
//!
//! GLib/GIO C bindings and reference documentation from D-Bus introspection XML.
//!
//! This crate provides:
//! - GLib version policy resolution
//! - C header and body generation
//! - DocBook and reStructuredText documentation generation
//! - A generator that runs the whole pipeline in memory

pub mod c;
pub mod docs;
pub mod error;
pub mod generator;
pub mod templates;
pub mod version;

pub use error::{CodegenError, ErrorKind};
pub use generator::{Artifact, Emit, Generator, GeneratorOptions, OutputMode};
pub use version::{PolicyThresholds, Version, VersionError, VersionPolicy};

/// Generates artifacts from a single introspection XML document.
///
/// # Arguments
/// * `xml` - Introspection XML content
/// * `options` - Output mode, versions and naming options
///
/// # Returns
/// The generated artifacts, one for C output or one per interface for documentation.
///
/// # Errors
/// Returns `CodegenError` if version resolution, parsing, or validation fails.
pub fn generate_from_xml(
    xml: &str,
    options: GeneratorOptions,
) -> Result<Vec<Artifact>, CodegenError> {
    Generator::new(options).generate(&[xml])
}
