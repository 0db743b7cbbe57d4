//! # dbusgen
//!
//! Generates GDBus C bindings and reference documentation from D-Bus
//! introspection XML files.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dbusgen_codegen::{Artifact, Generator, GeneratorOptions, OutputMode};
use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;

/// D-Bus code and documentation generator.
#[derive(Parser, Debug)]
#[command(name = "dbusgen", version, about, long_about = None)]
struct Cli {
    /// Introspection XML files.
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Generate C declarations.
    #[arg(long)]
    header: bool,

    /// Generate C implementation.
    #[arg(long)]
    body: bool,

    /// Write C output to this file.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Generate one DocBook page per interface, named PREFIX-NAME.xml.
    #[arg(long, value_name = "PREFIX")]
    generate_docbook: Option<String>,

    /// Generate one reStructuredText page per interface, named PREFIX-NAME.rst.
    #[arg(long, value_name = "PREFIX")]
    generate_rst: Option<String>,

    /// Directory for documentation output.
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_directory: PathBuf,

    /// Oldest GLib version the generated code must support.
    #[arg(long, value_name = "VERSION")]
    glib_min_required: Option<String>,

    /// Newest GLib API the generated code may use.
    #[arg(long, value_name = "VERSION")]
    glib_max_allowed: Option<String>,

    /// Prefix stripped from interface names for C naming.
    #[arg(long, value_name = "PREFIX")]
    interface_prefix: Option<String>,

    /// Namespace for generated C code.
    #[arg(long, value_name = "NAMESPACE")]
    c_namespace: Option<String>,
}

impl Cli {
    fn options(&self) -> Result<GeneratorOptions> {
        let output_name = self
            .output
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned());

        let mode = OutputMode::from_requests(
            self.header,
            self.body,
            self.generate_docbook.clone(),
            self.generate_rst.clone(),
            output_name.as_deref(),
        )?;
        if matches!(mode, OutputMode::Header { .. } | OutputMode::Body { .. })
            && self.output.is_none()
        {
            bail!("--output is required with --header and --body");
        }

        let mut options = GeneratorOptions::new(mode);
        options.min_required = self.glib_min_required.clone();
        options.max_allowed = self.glib_max_allowed.clone();
        options.interface_prefix = self.interface_prefix.clone();
        options.c_namespace = self.c_namespace.clone();
        Ok(options)
    }

    /// Returns where an artifact is written.
    fn destination(&self, artifact: &Artifact) -> PathBuf {
        match &self.output {
            Some(path) if self.header || self.body => path.clone(),
            _ => self.output_directory.join(&artifact.name),
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let options = cli.options()?;

    let mut documents = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        documents.push(xml);
    }
    let documents: Vec<&str> = documents.iter().map(String::as_str).collect();

    let artifacts = Generator::new(options).generate(&documents)?;

    if cli.header || cli.body {
        for artifact in &artifacts {
            let path = cli.destination(artifact);
            std::fs::write(&path, &artifact.contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::debug!(path = %path.display(), "wrote artifact");
        }
        return Ok(());
    }

    std::fs::create_dir_all(&cli.output_directory)
        .with_context(|| format!("failed to create {}", cli.output_directory.display()))?;
    write_documents(cli, &artifacts)
}

/// Writes every document to a temporary file in the output directory, then
/// moves them into place once all of them were written.
fn write_documents(cli: &Cli, artifacts: &[Artifact]) -> Result<()> {
    let mut staged = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = cli.destination(artifact);
        if path.is_dir() {
            bail!("cannot write {}: is a directory", path.display());
        }
        let mut file = NamedTempFile::new_in(&cli.output_directory).with_context(|| {
            format!("failed to create a file in {}", cli.output_directory.display())
        })?;
        file.write_all(artifact.contents.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        staged.push((file, path));
    }

    for (file, path) in staged {
        file.persist(&path)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote artifact");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("dbusgen: {e:#}");
            ExitCode::from(1)
        }
    }
}
