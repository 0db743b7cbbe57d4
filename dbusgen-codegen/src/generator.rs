//! Pipeline wiring from introspection XML to generated artifacts.

use crate::c::{BodyGenerator, HeaderGenerator};
use crate::docs::{DocbookGenerator, RstGenerator};
use crate::error::CodegenError;
use crate::version::VersionPolicy;
use dbusgen_schema::{InterfaceIr, IrOptions, SortedIr, parse_document};

/// Name used for header and body output when none is given.
pub const DEFAULT_OUTPUT_NAME: &str = "stdout";

/// A generated file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name relative to the output location.
    pub name: String,
    /// Generated text.
    pub contents: String,
}

impl Artifact {
    /// Creates an artifact.
    #[must_use]
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Turns the sorted representation into artifacts.
pub trait Emit {
    /// Emits every artifact for `ir` under `policy`.
    fn emit(&self, ir: &SortedIr, policy: &VersionPolicy) -> Vec<Artifact>;
}

/// Kind of output requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// C header written under `output_name`.
    Header {
        /// Output file name, also used for the include guard.
        output_name: String,
    },
    /// C body written under `output_name`.
    Body {
        /// Output file name, used to derive the header include.
        output_name: String,
    },
    /// One DocBook document per interface.
    Docbook {
        /// File name prefix.
        prefix: String,
    },
    /// One reStructuredText document per interface.
    Rst {
        /// File name prefix.
        prefix: String,
    },
}

impl OutputMode {
    /// Builds the mode from the individual requests.
    ///
    /// # Errors
    /// Returns `CodegenError::OutputModeConflict` unless exactly one mode is requested.
    pub fn from_requests(
        header: bool,
        body: bool,
        docbook: Option<String>,
        rst: Option<String>,
        output_name: Option<&str>,
    ) -> Result<Self, CodegenError> {
        let requested = usize::from(header)
            + usize::from(body)
            + usize::from(docbook.is_some())
            + usize::from(rst.is_some());
        if requested != 1 {
            return Err(CodegenError::mode_conflict(requested));
        }

        let output_name = output_name.unwrap_or(DEFAULT_OUTPUT_NAME).to_string();
        let mode = if header {
            Self::Header { output_name }
        } else if body {
            Self::Body { output_name }
        } else if let Some(prefix) = docbook {
            Self::Docbook { prefix }
        } else if let Some(prefix) = rst {
            Self::Rst { prefix }
        } else {
            return Err(CodegenError::mode_conflict(0));
        };
        Ok(mode)
    }

    fn emitter(&self) -> Box<dyn Emit> {
        match self {
            Self::Header { output_name } => Box::new(HeaderGenerator::new(output_name.clone())),
            Self::Body { output_name } => Box::new(BodyGenerator::new(output_name.clone())),
            Self::Docbook { prefix } => Box::new(DocbookGenerator::new(prefix.clone())),
            Self::Rst { prefix } => Box::new(RstGenerator::new(prefix.clone())),
        }
    }
}

/// Options for a generator run.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Output mode.
    pub mode: OutputMode,
    /// Oldest GLib version the generated code must build against.
    pub min_required: Option<String>,
    /// Newest GLib API the generated code may use.
    pub max_allowed: Option<String>,
    /// Prefix stripped from interface names for C naming.
    pub interface_prefix: Option<String>,
    /// Namespace prepended to C names.
    pub c_namespace: Option<String>,
}

impl GeneratorOptions {
    /// Creates options for `mode` with defaults for everything else.
    #[must_use]
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            min_required: None,
            max_allowed: None,
            interface_prefix: None,
            c_namespace: None,
        }
    }
}

/// Runs the pipeline for one set of options.
pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    /// Creates a generator.
    #[must_use]
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generates artifacts from the given introspection documents.
    ///
    /// Nothing is returned unless every step succeeds.
    ///
    /// # Errors
    /// Returns the first version, parse, validation or merge error.
    pub fn generate(&self, documents: &[&str]) -> Result<Vec<Artifact>, CodegenError> {
        let policy = VersionPolicy::resolve(
            self.options.min_required.as_deref(),
            self.options.max_allowed.as_deref(),
        )?;

        let nodes = documents
            .iter()
            .map(|xml| parse_document(xml))
            .collect::<Result<Vec<_>, _>>()?;

        let ir_options = IrOptions {
            interface_prefix: self.options.interface_prefix.clone(),
            c_namespace: self.options.c_namespace.clone(),
        };
        let ir = SortedIr::from_ir(InterfaceIr::build(&nodes, &ir_options)?);

        let artifacts = self.options.mode.emitter().emit(&ir, &policy);
        for artifact in &artifacts {
            tracing::info!(
                name = %artifact.name,
                bytes = artifact.contents.len(),
                "generated artifact"
            );
        }
        Ok(artifacts)
    }
}
