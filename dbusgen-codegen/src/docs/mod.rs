//! Reference documentation generation.

pub mod docbook;
pub mod rst;

pub use docbook::DocbookGenerator;
pub use rst::RstGenerator;

use dbusgen_schema::DocComment;
use dbusgen_schema::ir::{ArgInfo, InterfaceInfo, MethodInfo, PropertyInfo, SignalInfo};
use dbusgen_schema::types::Direction;

/// Returns the file name of the document for `iface`.
#[must_use]
pub fn document_name(prefix: &str, iface: &InterfaceInfo, extension: &str) -> String {
    format!("{prefix}-{}.{extension}", iface.name)
}

/// Anchor-safe form of a qualified name.
pub(crate) fn anchor(name: &str) -> String {
    name.replace('.', "-")
}

/// Brief description of an element, empty when undocumented.
pub(crate) fn brief(doc: Option<&DocComment>) -> &str {
    doc.and_then(|d| d.brief.as_deref()).unwrap_or("")
}

/// Free text paragraphs of an element.
pub(crate) fn paragraphs(doc: Option<&DocComment>) -> &[String] {
    doc.map(|d| d.paragraphs.as_slice()).unwrap_or(&[])
}

/// Description of an argument, from the argument itself or its member's comment.
pub(crate) fn arg_description<'a>(arg: &'a ArgInfo, doc: Option<&'a DocComment>) -> &'a str {
    arg.doc
        .as_deref()
        .or_else(|| doc.and_then(|d| d.param(&arg.name)))
        .unwrap_or("")
}

pub(crate) fn direction(arg: &ArgInfo) -> &'static str {
    match arg.direction {
        Direction::In => "IN",
        Direction::Out => "OUT",
    }
}

/// One line per argument of a method call synopsis, without punctuation.
pub(crate) fn method_args(method: &MethodInfo) -> Vec<String> {
    method
        .in_args
        .iter()
        .chain(&method.out_args)
        .map(|arg| format!("{:<4}{} {}", direction(arg), arg.signature, arg.name))
        .collect()
}

pub(crate) fn signal_args(signal: &SignalInfo) -> Vec<String> {
    signal
        .args
        .iter()
        .map(|arg| format!("{} {}", arg.signature, arg.name))
        .collect()
}

/// Formats `Name (a,\n      b)` with continuation lines aligned after the
/// opening parenthesis.
pub(crate) fn call_synopsis(name: &str, args: &[String]) -> String {
    let indent = " ".repeat(name.len() + 2);
    let mut line = format!("{name} (");
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            line.push_str(",\n");
            line.push_str(&indent);
        }
        line.push_str(arg);
    }
    line.push(')');
    line
}

pub(crate) fn property_synopsis(property: &PropertyInfo) -> String {
    format!(
        "{:<10}{} {}",
        property.access.as_str(),
        property.signature,
        property.name
    )
}

/// Notes attached to a method beyond its description.
pub(crate) fn method_notes(iface: &InterfaceInfo, method: &MethodInfo) -> Vec<String> {
    let mut notes = Vec::new();
    if method.ext.no_reply {
        notes.push(format!(
            "The {}() method is annotated as not expecting a reply.",
            method.name
        ));
    }
    if iface.ext.deprecated || method.ext.deprecated {
        notes.push(deprecation_note("method", &format!("{}()", method.name)));
    }
    notes
}

pub(crate) fn deprecation_note(kind: &str, name: &str) -> String {
    format!("The {name} {kind} is deprecated.")
}
