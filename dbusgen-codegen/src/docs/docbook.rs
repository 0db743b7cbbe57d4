//! DocBook reference pages.

use super::{
    anchor, arg_description, brief, call_synopsis, deprecation_note, direction, document_name,
    method_args, method_notes, paragraphs, property_synopsis, signal_args,
};
use crate::generator::{Artifact, Emit};
use crate::version::VersionPolicy;
use dbusgen_schema::ir::{ArgInfo, InterfaceInfo, MethodInfo, PropertyInfo, SignalInfo};
use dbusgen_schema::{DocComment, SortedIr};
use quick_xml::escape::escape;

/// Generator for one DocBook `refentry` per interface.
pub struct DocbookGenerator {
    prefix: String,
}

impl DocbookGenerator {
    /// Creates a generator writing files named `<prefix>-<interface>.xml`.
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
        let name = escape(iface.name.as_str());
        let id = anchor(&iface.name);
        let doc = iface.doc.as_ref();

        output.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        output.push_str("<!DOCTYPE refentry PUBLIC \"-//OASIS//DTD DocBook XML V4.1.2//EN\"\n");
        output.push_str("               \"http://www.oasis-open.org/docbook/xml/4.1.2/docbookx.dtd\" [\n");
        output.push_str("]>\n");
        output.push_str(&format!("<refentry id=\"gdbus-{}\">\n", escape(iface.name.as_str())));
        output.push_str("  <refmeta>\n");
        output.push_str(&format!(
            "    <refentrytitle role=\"top_of_page\" id=\"gdbus-interface-{id}.top_of_page\">{name}</refentrytitle>\n"
        ));
        output.push_str(&format!(
            "  <indexterm zone=\"gdbus-interface-{id}.top_of_page\"><primary sortas=\"{}\">{name}</primary></indexterm>\n",
            escape(iface.ext.camel_name.as_str())
        ));
        output.push_str("  </refmeta>\n");
        output.push_str("  <refnamediv>\n");
        output.push_str(&format!("    <refname>{name}</refname>\n"));
        output.push_str(&format!("    <refpurpose>{}</refpurpose>\n", escape(brief(doc))));
        output.push_str("  </refnamediv>\n");

        if !iface.methods.is_empty() {
            output.push_str(&synopsis(
                "Methods",
                iface.methods.iter().map(|m| {
                    let link = format!(
                        "<link linkend=\"gdbus-method-{id}.{}\">{}</link>",
                        m.name, m.name
                    );
                    (m.name.as_str(), link, method_args(m))
                }),
            ));
        }
        if !iface.signals.is_empty() {
            output.push_str(&synopsis(
                "Signals",
                iface.signals.iter().map(|s| {
                    let link = format!(
                        "<link linkend=\"gdbus-signal-{id}.{}\">{}</link>",
                        s.name, s.name
                    );
                    (s.name.as_str(), link, signal_args(s))
                }),
            ));
        }
        if !iface.properties.is_empty() {
            output.push_str("  <refsect1 role=\"properties\">\n");
            output.push_str("    <title role=\"properties.title\">Properties</title>\n");
            output.push_str("    <synopsis>\n");
            for property in &iface.properties {
                output.push_str(&format!(
                    "<link linkend=\"gdbus-property-{id}.{}\">{}</link>\n",
                    property.name,
                    escape(property_synopsis(property))
                ));
            }
            output.push_str("</synopsis>\n");
            output.push_str("  </refsect1>\n");
        }

        output.push_str(&format!(
            "  <refsect1 role=\"desc\" id=\"gdbus-interface-{id}\">\n"
        ));
        output.push_str("    <title role=\"desc.title\">Description</title>\n");
        output.push_str(&prose(doc, "    "));
        output.push_str(&since(iface.ext.since.as_deref(), "    "));
        if iface.ext.deprecated {
            output.push_str(&warning(&deprecation_note("interface", &iface.name), "    "));
        }
        output.push_str("  </refsect1>\n");

        if !iface.methods.is_empty() {
            output.push_str("  <refsect1 role=\"details\" id=\"gdbus-methods-");
            output.push_str(&id);
            output.push_str("\">\n");
            output.push_str("    <title role=\"details.title\">Method Details</title>\n");
            for method in &iface.methods {
                output.push_str(&self.method_details(iface, method));
            }
            output.push_str("  </refsect1>\n");
        }

        if !iface.signals.is_empty() {
            output.push_str("  <refsect1 role=\"signals\" id=\"gdbus-signals-");
            output.push_str(&id);
            output.push_str("\">\n");
            output.push_str("    <title role=\"signals.title\">Signal Details</title>\n");
            for signal in &iface.signals {
                output.push_str(&self.signal_details(iface, signal));
            }
            output.push_str("  </refsect1>\n");
        }

        if !iface.properties.is_empty() {
            output.push_str("  <refsect1 role=\"property_details\" id=\"gdbus-property-details-");
            output.push_str(&id);
            output.push_str("\">\n");
            output.push_str("    <title role=\"property_details.title\">Property Details</title>\n");
            for property in &iface.properties {
                output.push_str(&self.property_details(iface, property));
            }
            output.push_str("  </refsect1>\n");
        }

        output.push_str("</refentry>\n");
        output
    }

    fn method_details(&self, iface: &InterfaceInfo, method: &MethodInfo) -> String {
        let mut output = String::new();
        let id = anchor(&iface.name);
        let doc = method.doc.as_ref();

        output.push_str(&format!(
            "    <refsect2 role=\"method\" id=\"gdbus-method-{id}.{}\">\n",
            method.name
        ));
        output.push_str(&format!("      <title>The {}() method</title>\n", method.name));
        output.push_str(&format!(
            "      <indexterm zone=\"gdbus-method-{id}.{}\"><primary sortas=\"{}.{}\">{}.{}()</primary></indexterm>\n",
            method.name, iface.ext.camel_name, method.name, escape(iface.name.as_str()), method.name
        ));
        output.push_str("<programlisting>\n");
        output.push_str(&escape(call_synopsis(&method.name, &method_args(method))));
        output.push_str("\n</programlisting>\n");
        output.push_str(&prose(doc, "      "));

        let args: Vec<&ArgInfo> = method.in_args.iter().chain(&method.out_args).collect();
        output.push_str(&arg_list(&args, doc, true));

        output.push_str(&since(method.ext.since.as_deref(), "      "));
        for note in method_notes(iface, method) {
            output.push_str(&warning(&note, "      "));
        }
        output.push_str("    </refsect2>\n");
        output
    }

    fn signal_details(&self, iface: &InterfaceInfo, signal: &SignalInfo) -> String {
        let mut output = String::new();
        let id = anchor(&iface.name);
        let doc = signal.doc.as_ref();

        output.push_str(&format!(
            "    <refsect2 role=\"signal\" id=\"gdbus-signal-{id}.{}\">\n",
            signal.name
        ));
        output.push_str(&format!("      <title>The \"{}\" signal</title>\n", signal.name));
        output.push_str(&format!(
            "      <indexterm zone=\"gdbus-signal-{id}.{}\"><primary sortas=\"{}::{}\">{}::{}</primary></indexterm>\n",
            signal.name, iface.ext.camel_name, signal.name, escape(iface.name.as_str()), signal.name
        ));
        output.push_str("<programlisting>\n");
        output.push_str(&escape(call_synopsis(&signal.name, &signal_args(signal))));
        output.push_str("\n</programlisting>\n");
        output.push_str(&prose(doc, "      "));

        let args: Vec<&ArgInfo> = signal.args.iter().collect();
        output.push_str(&arg_list(&args, doc, false));

        output.push_str(&since(signal.ext.since.as_deref(), "      "));
        if iface.ext.deprecated || signal.ext.deprecated {
            output.push_str(&warning(
                &deprecation_note("signal", &format!("\"{}\"", signal.name)),
                "      ",
            ));
        }
        output.push_str("    </refsect2>\n");
        output
    }

    fn property_details(&self, iface: &InterfaceInfo, property: &PropertyInfo) -> String {
        let mut output = String::new();
        let id = anchor(&iface.name);
        let doc = property.doc.as_ref();

        output.push_str(&format!(
            "    <refsect2 role=\"property\" id=\"gdbus-property-{id}.{}\">\n",
            property.name
        ));
        output.push_str(&format!(
            "      <title>The \"{}\" property</title>\n",
            property.name
        ));
        output.push_str(&format!(
            "      <indexterm zone=\"gdbus-property-{id}.{}\"><primary sortas=\"{}:{}\">{}:{}</primary></indexterm>\n",
            property.name, iface.ext.camel_name, property.name, escape(iface.name.as_str()), property.name
        ));
        output.push_str("<programlisting>\n");
        output.push_str(&escape(property_synopsis(property)));
        output.push_str("\n</programlisting>\n");
        output.push_str(&prose(doc, "      "));
        output.push_str(&since(property.ext.since.as_deref(), "      "));
        if iface.ext.deprecated || property.ext.deprecated {
            output.push_str(&warning(
                &deprecation_note("property", &format!("\"{}\"", property.name)),
                "      ",
            ));
        }
        output.push_str("    </refsect2>\n");
        output
    }
}

impl Emit for DocbookGenerator {
    fn emit(&self, ir: &SortedIr, _policy: &VersionPolicy) -> Vec<Artifact> {
        ir.interfaces()
            .iter()
            .map(|iface| {
                Artifact::new(
                    document_name(&self.prefix, iface, "xml"),
                    self.generate_interface(iface),
                )
            })
            .collect()
    }
}

/// A `refsynopsisdiv` listing members with links to their details.
fn synopsis<'a>(
    title: &str,
    members: impl Iterator<Item = (&'a str, String, Vec<String>)>,
) -> String {
    let mut output = String::new();
    output.push_str("  <refsynopsisdiv role=\"synopsis\">\n");
    output.push_str(&format!("    <title role=\"synopsis.title\">{title}</title>\n"));
    output.push_str("    <synopsis>\n");
    for (name, link, args) in members {
        let escaped: Vec<String> = args.iter().map(|a| escape(a.as_str()).into_owned()).collect();
        let text = call_synopsis(name, &escaped);
        output.push_str(&text.replacen(name, &link, 1));
        output.push_str(";\n");
    }
    output.push_str("</synopsis>\n");
    output.push_str("  </refsynopsisdiv>\n");
    output
}

fn prose(doc: Option<&DocComment>, indent: &str) -> String {
    let mut output = String::new();
    for paragraph in paragraphs(doc) {
        output.push_str(&format!("{indent}<para>{}</para>\n", escape(paragraph.as_str())));
    }
    output
}

fn arg_list(args: &[&ArgInfo], doc: Option<&DocComment>, with_direction: bool) -> String {
    if args.is_empty() {
        return String::new();
    }

    let mut output = String::new();
    output.push_str("      <variablelist role=\"params\">\n");
    for arg in args {
        let label = if with_direction {
            format!("{} {}", direction(arg), arg.signature)
        } else {
            arg.signature.clone()
        };
        output.push_str("        <varlistentry>\n");
        output.push_str(&format!(
            "          <term><literal>{} <parameter>{}</parameter></literal>:</term>\n",
            escape(label),
            escape(arg.name.as_str())
        ));
        output.push_str(&format!(
            "          <listitem><para>{}</para></listitem>\n",
            escape(arg_description(arg, doc))
        ));
        output.push_str("        </varlistentry>\n");
    }
    output.push_str("      </variablelist>\n");
    output
}

fn since(version: Option<&str>, indent: &str) -> String {
    version
        .map(|v| format!("{indent}<para role=\"since\">Since {}</para>\n", escape(v)))
        .unwrap_or_default()
}

fn warning(text: &str, indent: &str) -> String {
    format!("{indent}<warning><para>{}</para></warning>\n", escape(text))
}
