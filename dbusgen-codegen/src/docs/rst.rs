//! reStructuredText reference pages.

use super::{
    arg_description, brief, call_synopsis, deprecation_note, document_name, method_args,
    method_notes, paragraphs, property_synopsis, signal_args,
};
use crate::generator::{Artifact, Emit};
use crate::version::VersionPolicy;
use dbusgen_schema::ir::{ArgInfo, InterfaceInfo};
use dbusgen_schema::{DocComment, SortedIr};

/// Generator for one reStructuredText page per interface.
pub struct RstGenerator {
    prefix: String,
}

impl RstGenerator {
    /// Creates a generator writing files named `<prefix>-<interface>.rst`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Generates the page for one interface.
    #[must_use]
    pub fn generate_interface(&self, iface: &InterfaceInfo) -> String {
        let mut output = String::new();
        let doc = iface.doc.as_ref();

        output.push_str(&format!(".. _{}:\n\n", iface.name));
        output.push_str(&title(&iface.name, '=', true));
        output.push('\n');

        output.push_str(&title("Description", '-', true));
        output.push('\n');
        output.push_str(&format!(".. _{} Description:\n\n", iface.name));
        let brief = brief(doc);
        if !brief.is_empty() {
            output.push_str(brief);
            output.push_str("\n\n");
        }
        output.push_str(&prose(doc));
        output.push_str(&since(iface.ext.since.as_deref()));
        if iface.ext.deprecated {
            output.push_str(&warning(&deprecation_note("interface", &iface.name)));
        }

        if !iface.methods.is_empty() {
            output.push_str(&title("Methods", '-', true));
            output.push('\n');
            for method in &iface.methods {
                output.push_str(&format!(".. _{}.{}:\n\n", iface.name, method.name));
                output.push_str(&title(&method.name, '^', false));
                output.push('\n');
                output.push_str(&literal_block(&call_synopsis(
                    &method.name,
                    &method_args(method),
                )));
                let doc = method.doc.as_ref();
                output.push_str(&prose(doc));
                let args: Vec<&ArgInfo> = method.in_args.iter().chain(&method.out_args).collect();
                output.push_str(&arg_list(&args, doc));
                output.push_str(&since(method.ext.since.as_deref()));
                for note in method_notes(iface, method) {
                    output.push_str(&warning(&note));
                }
            }
        }

        if !iface.signals.is_empty() {
            output.push_str(&title("Signals", '-', true));
            output.push('\n');
            for signal in &iface.signals {
                output.push_str(&format!(".. _{}::{}:\n\n", iface.name, signal.name));
                output.push_str(&title(&signal.name, '^', false));
                output.push('\n');
                output.push_str(&literal_block(&call_synopsis(
                    &signal.name,
                    &signal_args(signal),
                )));
                let doc = signal.doc.as_ref();
                output.push_str(&prose(doc));
                let args: Vec<&ArgInfo> = signal.args.iter().collect();
                output.push_str(&arg_list(&args, doc));
                output.push_str(&since(signal.ext.since.as_deref()));
                if iface.ext.deprecated || signal.ext.deprecated {
                    output.push_str(&warning(&deprecation_note(
                        "signal",
                        &format!("\"{}\"", signal.name),
                    )));
                }
            }
        }

        if !iface.properties.is_empty() {
            output.push_str(&title("Properties", '-', true));
            output.push('\n');
            for property in &iface.properties {
                output.push_str(&format!(".. _{}:{}:\n\n", iface.name, property.name));
                output.push_str(&title(&property.name, '^', false));
                output.push('\n');
                output.push_str(&literal_block(&property_synopsis(property)));
                output.push_str(&prose(property.doc.as_ref()));
                output.push_str(&since(property.ext.since.as_deref()));
                if iface.ext.deprecated || property.ext.deprecated {
                    output.push_str(&warning(&deprecation_note(
                        "property",
                        &format!("\"{}\"", property.name),
                    )));
                }
            }
        }

        output
    }
}

impl Emit for RstGenerator {
    fn emit(&self, ir: &SortedIr, _policy: &VersionPolicy) -> Vec<Artifact> {
        ir.interfaces()
            .iter()
            .map(|iface| {
                Artifact::new(
                    document_name(&self.prefix, iface, "rst"),
                    self.generate_interface(iface),
                )
            })
            .collect()
    }
}

/// Section title underlined (and optionally overlined) with `marker`.
fn title(text: &str, marker: char, overline: bool) -> String {
    let rule: String = std::iter::repeat_n(marker, text.chars().count()).collect();
    if overline {
        format!("{rule}\n{text}\n{rule}\n")
    } else {
        format!("{text}\n{rule}\n")
    }
}

fn literal_block(text: &str) -> String {
    let mut output = String::from("::\n\n");
    for line in text.lines() {
        output.push_str("  ");
        output.push_str(line);
        output.push('\n');
    }
    output.push('\n');
    output
}

fn prose(doc: Option<&DocComment>) -> String {
    let mut output = String::new();
    for paragraph in paragraphs(doc) {
        output.push_str(paragraph);
        output.push_str("\n\n");
    }
    output
}

fn arg_list(args: &[&ArgInfo], doc: Option<&DocComment>) -> String {
    let mut output = String::new();
    for arg in args {
        output.push_str(&format!(
            "{}\n  {}\n\n",
            arg.name,
            arg_description(arg, doc)
        ));
    }
    output
}

fn since(version: Option<&str>) -> String {
    version
        .map(|v| format!(".. versionadded:: {v}\n\n"))
        .unwrap_or_default()
}

fn warning(text: &str) -> String {
    format!(".. warning::\n\n  {text}\n\n")
}
