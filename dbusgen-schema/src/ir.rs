//! Intermediate representation for code generation.
//!
//! This module merges one or more parsed documents into a single set of
//! interfaces and computes everything the emitters need to know about each
//! entity: C names, value representation, fd passing and change
//! notification. Emitters only read these values, they never derive them.

use crate::doc::DocComment;
use crate::error::SchemaError;
use crate::signature::{contains_unix_fd, has_native_mapping, validate_signature};
use crate::validation::validate_node;
use crate::types::{
    Access, Annotation, ArgDef, Direction, InterfaceDef, MethodDef, Node, PropertyDef, SignalDef,
    annotations, find_annotation,
};
use std::collections::HashMap;

/// Naming options applied while building the representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrOptions {
    /// Prefix stripped from interface names before deriving C names.
    pub interface_prefix: Option<String>,
    /// Namespace prepended to every generated C identifier.
    pub c_namespace: Option<String>,
}

/// Merged interfaces of all input documents, in first-seen order.
///
/// Use [`crate::order::SortedIr`] for emission.
#[derive(Debug, Clone, Default)]
pub struct InterfaceIr {
    /// Interfaces with resolved metadata.
    pub interfaces: Vec<InterfaceInfo>,
}

impl InterfaceIr {
    /// Builds the representation from parsed documents.
    ///
    /// Identical declarations of one interface in several documents are
    /// merged; declarations that differ are rejected.
    ///
    /// # Errors
    /// Returns `SchemaError::InterfaceCollision` for conflicting declarations
    /// and `SchemaError::Signature` for invalid type signatures.
    pub fn build(nodes: &[Node], options: &IrOptions) -> Result<Self, SchemaError> {
        for node in nodes {
            validate_node(node)?;
        }

        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut merged: Vec<InterfaceDef> = Vec::new();

        for interface in nodes.iter().flat_map(Node::all_interfaces) {
            if let Some(&position) = index.get(interface.name.as_str()) {
                let previous = &mut merged[position];
                if previous.canonical() != interface.canonical() {
                    return Err(SchemaError::InterfaceCollision {
                        name: interface.name.clone(),
                    });
                }
                tracing::debug!(interface = %interface.name, "merging identical declaration");
                previous.merge_docs(interface);
                continue;
            }
            index.insert(&interface.name, merged.len());
            merged.push(interface.clone());
        }

        let interfaces = merged
            .iter()
            .map(|interface| InterfaceInfo::from_def(interface, options))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { interfaces })
    }

    /// Gets an interface by qualified name.
    #[must_use]
    pub fn get_interface(&self, name: &str) -> Option<&InterfaceInfo> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

/// Change notification policy of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmitsChangedSignal {
    /// Emits `PropertiesChanged` with the new value.
    #[default]
    True,
    /// Emits `PropertiesChanged` without the value.
    Invalidates,
    /// Never changes.
    Const,
    /// Changes without notification.
    False,
}

impl EmitsChangedSignal {
    /// Parses an annotation value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "true" => Some(Self::True),
            "invalidates" => Some(Self::Invalidates),
            "const" => Some(Self::Const),
            "false" => Some(Self::False),
            _ => None,
        }
    }

    /// Returns true if the generated skeleton notifies about changes.
    #[must_use]
    pub const fn emits(&self) -> bool {
        matches!(self, Self::True | Self::Invalidates)
    }
}

/// How a method transfers file descriptors out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FdPassing {
    /// No descriptors involved.
    #[default]
    None,
    /// Requested explicitly with `org.gtk.GDBus.C.UnixFD`.
    Annotated,
    /// An argument type contains `h` but no annotation asks for a list.
    Implied,
}

impl FdPassing {
    /// Returns true if generated code passes a `GUnixFDList`.
    ///
    /// `implied_enabled` tells whether handle-typed arguments alone are enough.
    #[must_use]
    pub const fn passes_fd_list(&self, implied_enabled: bool) -> bool {
        match self {
            Self::None => false,
            Self::Annotated => true,
            Self::Implied => implied_enabled,
        }
    }
}

/// Derived data of an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedArg {
    /// Value is handled as a boxed `GVariant`.
    pub use_gvariant: bool,
    /// Type contains a Unix file descriptor.
    pub contains_fd: bool,
}

/// Resolved argument.
#[derive(Debug, Clone)]
pub struct ArgInfo {
    /// Argument name.
    pub name: String,
    /// D-Bus type signature.
    pub signature: String,
    /// Direction.
    pub direction: Direction,
    /// Annotations.
    pub annotations: Vec<Annotation>,
    /// Description.
    pub doc: Option<String>,
    /// Derived data.
    pub ext: ExtendedArg,
}

impl ArgInfo {
    fn from_def(arg: &ArgDef) -> Result<Self, SchemaError> {
        validate_signature(&arg.signature)?;
        Ok(Self {
            name: arg.name.clone(),
            signature: arg.signature.clone(),
            direction: arg.direction,
            annotations: arg.annotations.clone(),
            doc: arg.doc.clone(),
            ext: ExtendedArg {
                use_gvariant: uses_gvariant(&arg.annotations, &arg.signature),
                contains_fd: contains_unix_fd(&arg.signature),
            },
        })
    }
}

/// Derived data shared by methods, signals and properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberNames {
    /// Lower-case underscore C name, e.g. `hello_fd`.
    pub name_lower: String,
    /// Hyphenated name used for GObject signals and properties.
    pub name_hyphen: String,
}

impl MemberNames {
    fn new(name: &str, annotations: &[Annotation]) -> Self {
        let base = find_annotation(annotations, annotations::C_NAME).unwrap_or(name);
        let name_lower = to_lower_underscore(base);
        Self {
            name_hyphen: name_lower.replace('_', "-"),
            name_lower,
        }
    }
}

/// Derived data of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedMethod {
    /// C names.
    pub names: MemberNames,
    /// File descriptor transfer.
    pub fd_passing: FdPassing,
    /// Caller does not wait for a reply.
    pub no_reply: bool,
    /// Marked deprecated.
    pub deprecated: bool,
    /// Version the method appeared in.
    pub since: Option<String>,
}

/// Resolved method.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Method name.
    pub name: String,
    /// Input arguments.
    pub in_args: Vec<ArgInfo>,
    /// Output arguments.
    pub out_args: Vec<ArgInfo>,
    /// Annotations.
    pub annotations: Vec<Annotation>,
    /// Documentation.
    pub doc: Option<DocComment>,
    /// Derived data.
    pub ext: ExtendedMethod,
}

impl MethodInfo {
    fn from_def(method: &MethodDef) -> Result<Self, SchemaError> {
        let in_args = method
            .in_args
            .iter()
            .map(ArgInfo::from_def)
            .collect::<Result<Vec<_>, _>>()?;
        let out_args = method
            .out_args
            .iter()
            .map(ArgInfo::from_def)
            .collect::<Result<Vec<_>, _>>()?;

        let unix_fd = find_annotation(&method.annotations, annotations::C_UNIX_FD)
            .is_some_and(|value| value != "false");
        let fd_passing = if unix_fd {
            FdPassing::Annotated
        } else if in_args.iter().chain(&out_args).any(|a| a.ext.contains_fd) {
            FdPassing::Implied
        } else {
            FdPassing::None
        };

        let doc = doc_or_annotation(method.doc.as_ref(), &method.name, &method.annotations);
        Ok(Self {
            name: method.name.clone(),
            ext: ExtendedMethod {
                names: MemberNames::new(&method.name, &method.annotations),
                fd_passing,
                no_reply: is_true(&method.annotations, annotations::NO_REPLY),
                deprecated: is_true(&method.annotations, annotations::DEPRECATED),
                since: since(&method.annotations, doc.as_ref()),
            },
            in_args,
            out_args,
            annotations: method.annotations.clone(),
            doc,
        })
    }
}

/// Derived data of a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedSignal {
    /// C names.
    pub names: MemberNames,
    /// Marked deprecated.
    pub deprecated: bool,
    /// Version the signal appeared in.
    pub since: Option<String>,
}

/// Resolved signal.
#[derive(Debug, Clone)]
pub struct SignalInfo {
    /// Signal name.
    pub name: String,
    /// Arguments.
    pub args: Vec<ArgInfo>,
    /// Annotations.
    pub annotations: Vec<Annotation>,
    /// Documentation.
    pub doc: Option<DocComment>,
    /// Derived data.
    pub ext: ExtendedSignal,
}

impl SignalInfo {
    fn from_def(signal: &SignalDef) -> Result<Self, SchemaError> {
        let args = signal
            .args
            .iter()
            .map(ArgInfo::from_def)
            .collect::<Result<Vec<_>, _>>()?;
        let doc = doc_or_annotation(signal.doc.as_ref(), &signal.name, &signal.annotations);

        Ok(Self {
            name: signal.name.clone(),
            ext: ExtendedSignal {
                names: MemberNames::new(&signal.name, &signal.annotations),
                deprecated: is_true(&signal.annotations, annotations::DEPRECATED),
                since: since(&signal.annotations, doc.as_ref()),
            },
            args,
            annotations: signal.annotations.clone(),
            doc,
        })
    }
}

/// Derived data of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedProperty {
    /// C names.
    pub names: MemberNames,
    /// Value is handled as a boxed `GVariant`.
    pub use_gvariant: bool,
    /// Change notification policy.
    pub emits_changed_signal: EmitsChangedSignal,
    /// Marked deprecated.
    pub deprecated: bool,
    /// Version the property appeared in.
    pub since: Option<String>,
}

/// Resolved property.
#[derive(Debug, Clone)]
pub struct PropertyInfo {
    /// Property name.
    pub name: String,
    /// D-Bus type signature.
    pub signature: String,
    /// Access mode.
    pub access: Access,
    /// Annotations.
    pub annotations: Vec<Annotation>,
    /// Documentation.
    pub doc: Option<DocComment>,
    /// Derived data.
    pub ext: ExtendedProperty,
}

impl PropertyInfo {
    fn from_def(
        property: &PropertyDef,
        interface_default: EmitsChangedSignal,
    ) -> Result<Self, SchemaError> {
        validate_signature(&property.signature)?;
        let emits_changed_signal =
            find_annotation(&property.annotations, annotations::EMITS_CHANGED_SIGNAL)
                .and_then(EmitsChangedSignal::parse)
                .unwrap_or(interface_default);
        let doc = doc_or_annotation(property.doc.as_ref(), &property.name, &property.annotations);

        Ok(Self {
            name: property.name.clone(),
            signature: property.signature.clone(),
            access: property.access,
            ext: ExtendedProperty {
                names: MemberNames::new(&property.name, &property.annotations),
                use_gvariant: uses_gvariant(&property.annotations, &property.signature),
                emits_changed_signal,
                deprecated: is_true(&property.annotations, annotations::DEPRECATED),
                since: since(&property.annotations, doc.as_ref()),
            },
            annotations: property.annotations.clone(),
            doc,
        })
    }
}

/// Derived data of an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedInterface {
    /// Namespaced CamelCase type name, e.g. `ComAcmeCoyote`.
    pub camel_name: String,
    /// Namespaced lower-case prefix for functions, e.g. `com_acme_coyote`.
    pub name_lower: String,
    /// Upper-case name without namespace, e.g. `COM_ACME_COYOTE`.
    pub name_upper: String,
    /// Upper-case namespace prefix including the trailing underscore, or empty.
    pub ns_upper: String,
    /// Hyphenated name, e.g. `com-acme-coyote`.
    pub name_hyphen: String,
    /// Marked deprecated.
    pub deprecated: bool,
    /// Version the interface appeared in.
    pub since: Option<String>,
}

/// Resolved interface.
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    /// Qualified dotted name.
    pub name: String,
    /// Methods.
    pub methods: Vec<MethodInfo>,
    /// Signals.
    pub signals: Vec<SignalInfo>,
    /// Properties.
    pub properties: Vec<PropertyInfo>,
    /// Annotations.
    pub annotations: Vec<Annotation>,
    /// Documentation.
    pub doc: Option<DocComment>,
    /// Derived data.
    pub ext: ExtendedInterface,
}

impl InterfaceInfo {
    /// Creates a resolved interface from a parsed definition.
    ///
    /// # Errors
    /// Returns `SchemaError::Signature` if any member has an invalid signature.
    pub fn from_def(interface: &InterfaceDef, options: &IrOptions) -> Result<Self, SchemaError> {
        let emits_default =
            find_annotation(&interface.annotations, annotations::EMITS_CHANGED_SIGNAL)
                .and_then(EmitsChangedSignal::parse)
                .unwrap_or_default();

        let methods = interface
            .methods
            .iter()
            .map(MethodInfo::from_def)
            .collect::<Result<Vec<_>, _>>()?;
        let signals = interface
            .signals
            .iter()
            .map(SignalInfo::from_def)
            .collect::<Result<Vec<_>, _>>()?;
        let properties = interface
            .properties
            .iter()
            .map(|p| PropertyInfo::from_def(p, emits_default))
            .collect::<Result<Vec<_>, _>>()?;

        let doc = doc_or_annotation(
            interface.doc.as_ref(),
            &interface.name,
            &interface.annotations,
        );
        let ext = interface_names(interface, options, doc.as_ref());

        Ok(Self {
            name: interface.name.clone(),
            methods,
            signals,
            properties,
            annotations: interface.annotations.clone(),
            doc,
            ext,
        })
    }

    /// Returns true if the interface has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.signals.is_empty() && self.properties.is_empty()
    }
}

/// Derives the C names of an interface.
fn interface_names(
    interface: &InterfaceDef,
    options: &IrOptions,
    doc: Option<&DocComment>,
) -> ExtendedInterface {
    let namespace = options.c_namespace.as_deref().unwrap_or("");
    let (ns_camel, ns_lower) = if namespace.is_empty() {
        (String::new(), String::new())
    } else {
        let lower = to_lower_underscore(namespace);
        (namespace.replace('_', ""), format!("{lower}_"))
    };

    let base = match find_annotation(&interface.annotations, annotations::C_NAME) {
        Some(name) => name.to_string(),
        None => {
            let stripped = options
                .interface_prefix
                .as_deref()
                .and_then(|prefix| interface.name.strip_prefix(prefix))
                .filter(|rest| !rest.is_empty())
                .unwrap_or(&interface.name);
            strip_dots(stripped)
        }
    };

    let uscore = to_lower_underscore(&base);
    ExtendedInterface {
        camel_name: format!("{ns_camel}{}", upper_first(&base)),
        name_lower: format!("{ns_lower}{uscore}"),
        name_upper: uscore.to_uppercase(),
        ns_upper: ns_lower.to_uppercase(),
        name_hyphen: uscore.replace('_', "-"),
        deprecated: is_true(&interface.annotations, annotations::DEPRECATED),
        since: since(&interface.annotations, doc),
    }
}

fn uses_gvariant(list: &[Annotation], signature: &str) -> bool {
    find_annotation(list, annotations::C_FORCE_GVARIANT).is_some() || !has_native_mapping(signature)
}

fn is_true(list: &[Annotation], name: &str) -> bool {
    find_annotation(list, name) == Some("true")
}

fn since(list: &[Annotation], doc: Option<&DocComment>) -> Option<String> {
    find_annotation(list, annotations::SINCE)
        .map(str::to_string)
        .or_else(|| doc.and_then(|d| d.since.clone()))
}

/// Returns the comment, or one built from `DocString` annotations.
fn doc_or_annotation(
    doc: Option<&DocComment>,
    symbol: &str,
    list: &[Annotation],
) -> Option<DocComment> {
    if let Some(doc) = doc {
        return Some(doc.clone());
    }
    let long = find_annotation(list, annotations::DOC_STRING);
    let short = find_annotation(list, annotations::DOC_STRING_SHORT);
    if long.is_none() && short.is_none() {
        return None;
    }
    Some(DocComment {
        symbol: symbol.to_string(),
        brief: short.map(str::to_string),
        paragraphs: long.map(|text| vec![text.to_string()]).unwrap_or_default(),
        ..DocComment::default()
    })
}

/// Converts CamelCase to lower case with underscores.
///
/// An underscore is inserted only where a lower-case character is followed
/// by an upper-case one, so `HelloFD` becomes `hello_fd`. Leading
/// underscores are kept.
#[must_use]
pub fn to_lower_underscore(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;
    let mut initial = true;

    for c in s.chars() {
        if initial && c == '_' {
            result.push(c);
            continue;
        }
        initial = false;

        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            prev_was_lower = false;
        } else {
            prev_was_lower = true;
        }
        result.extend(c.to_lowercase());
    }
    result
}

/// Removes dots from a dotted name, upper-casing the character after each.
#[must_use]
pub fn strip_dots(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut force_upper = false;

    for c in s.chars() {
        if c == '.' {
            force_upper = true;
        } else if force_upper {
            result.extend(c.to_uppercase());
            force_upper = false;
        } else {
            result.push(c);
        }
    }
    result
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn build(xml: &str) -> InterfaceIr {
        let node = parse_document(xml).expect("Failed to parse");
        InterfaceIr::build(&[node], &IrOptions::default()).expect("Failed to build")
    }

    #[test]
    fn test_to_lower_underscore() {
        assert_eq!(to_lower_underscore("HelloFD"), "hello_fd");
        assert_eq!(to_lower_underscore("RandomMethod"), "random_method");
        assert_eq!(to_lower_underscore("comAcmeCoyote"), "com_acme_coyote");
        assert_eq!(to_lower_underscore("FDPassing"), "fdpassing");
        assert_eq!(to_lower_underscore("_Private"), "_private");
        assert_eq!(to_lower_underscore("mood"), "mood");
    }

    #[test]
    fn test_strip_dots() {
        assert_eq!(strip_dots("com.acme.Coyote"), "comAcmeCoyote");
        assert_eq!(strip_dots("org.project.Bar.Frobnicator"), "orgProjectBarFrobnicator");
    }

    #[test]
    fn test_interface_names() {
        let ir = build(r#"<node><interface name="org.project.Bar.Frobnicator"/></node>"#);
        let ext = &ir.interfaces[0].ext;

        assert_eq!(ext.camel_name, "OrgProjectBarFrobnicator");
        assert_eq!(ext.name_lower, "org_project_bar_frobnicator");
        assert_eq!(ext.name_upper, "ORG_PROJECT_BAR_FROBNICATOR");
        assert_eq!(ext.name_hyphen, "org-project-bar-frobnicator");
        assert_eq!(ext.ns_upper, "");
    }

    #[test]
    fn test_interface_names_with_prefix_and_namespace() {
        let node = parse_document(r#"<node><interface name="com.acme.Coyote"/></node>"#)
            .expect("Failed to parse");
        let options = IrOptions {
            interface_prefix: Some("com.acme.".to_string()),
            c_namespace: Some("Acme".to_string()),
        };
        let ir = InterfaceIr::build(&[node], &options).expect("Failed to build");
        let ext = &ir.interfaces[0].ext;

        assert_eq!(ext.camel_name, "AcmeCoyote");
        assert_eq!(ext.name_lower, "acme_coyote");
        assert_eq!(ext.name_upper, "COYOTE");
        assert_eq!(ext.ns_upper, "ACME_");
    }

    #[test]
    fn test_c_name_annotation() {
        let ir = build(
            r#"<node><interface name="com.acme.Coyote">
              <annotation name="org.gtk.GDBus.C.Name" value="WileE"/>
              <method name="Run"><annotation name="org.gtk.GDBus.C.Name" value="Sprint"/></method>
            </interface></node>"#,
        );
        let iface = &ir.interfaces[0];
        assert_eq!(iface.ext.camel_name, "WileE");
        assert_eq!(iface.ext.name_lower, "wile_e");
        assert_eq!(iface.methods[0].ext.names.name_lower, "sprint");
    }

    #[test]
    fn test_fd_passing_classification() {
        let ir = build(
            r#"<node><interface name="FDPassing">
                <method name="HelloFD">
                  <annotation name="org.gtk.GDBus.C.UnixFD" value="1"/>
                  <arg name="greeting" direction="in" type="s"/>
                </method>
                <method name="NoAnnotation">
                  <arg name="greeting" direction="in" type="h"/>
                </method>
                <method name="NoAnnotationNested">
                  <arg name="files" type="a{sh}" direction="in"/>
                </method>
                <method name="Plain"/>
            </interface></node>"#,
        );
        let methods = &ir.interfaces[0].methods;
        assert_eq!(methods[0].ext.fd_passing, FdPassing::Annotated);
        assert_eq!(methods[1].ext.fd_passing, FdPassing::Implied);
        assert_eq!(methods[2].ext.fd_passing, FdPassing::Implied);
        assert_eq!(methods[3].ext.fd_passing, FdPassing::None);

        assert!(FdPassing::Annotated.passes_fd_list(false));
        assert!(!FdPassing::Implied.passes_fd_list(false));
        assert!(FdPassing::Implied.passes_fd_list(true));
    }

    #[test]
    fn test_property_metadata() {
        let ir = build(
            r#"<node><interface name="org.example.Props">
                <annotation name="org.freedesktop.DBus.Property.EmitsChangedSignal" value="false"/>
                <property name="Name" type="s" access="read"/>
                <property name="Settings" type="a{sv}" access="readwrite">
                  <annotation name="org.freedesktop.DBus.Property.EmitsChangedSignal" value="invalidates"/>
                </property>
                <property name="Count" type="u" access="read">
                  <annotation name="org.gtk.GDBus.C.ForceGVariant" value="true"/>
                </property>
                <property name="IconName" type="s" access="read"/>
            </interface></node>"#,
        );
        let props = &ir.interfaces[0].properties;

        assert!(!props[0].ext.use_gvariant);
        assert_eq!(props[0].ext.emits_changed_signal, EmitsChangedSignal::False);
        assert!(!props[0].ext.emits_changed_signal.emits());

        assert!(props[1].ext.use_gvariant);
        assert_eq!(props[1].ext.emits_changed_signal, EmitsChangedSignal::Invalidates);
        assert!(props[1].ext.emits_changed_signal.emits());

        assert!(props[2].ext.use_gvariant);
        assert_eq!(props[3].ext.names.name_hyphen, "icon-name");
    }

    #[test]
    fn test_emits_changed_signal_default() {
        let ir = build(
            r#"<node><interface name="org.example.Props">
                <property name="Name" type="s" access="read"/>
            </interface></node>"#,
        );
        assert_eq!(
            ir.interfaces[0].properties[0].ext.emits_changed_signal,
            EmitsChangedSignal::True
        );
    }

    #[test]
    fn test_since_and_deprecated() {
        let ir = build(
            r#"<node><interface name="org.example.Old">
                <!-- Frob:
                     @since 1.2

                     Frobs.
                -->
                <method name="Frob"/>
                <method name="Tweak">
                  <annotation name="org.freedesktop.DBus.Deprecated" value="true"/>
                  <annotation name="org.gtk.GDBus.Since" value="1.4"/>
                </method>
            </interface></node>"#,
        );
        let methods = &ir.interfaces[0].methods;
        assert_eq!(methods[0].ext.since.as_deref(), Some("1.2"));
        assert!(!methods[0].ext.deprecated);
        assert_eq!(methods[1].ext.since.as_deref(), Some("1.4"));
        assert!(methods[1].ext.deprecated);
    }

    #[test]
    fn test_doc_string_annotation() {
        let ir = build(
            r#"<node><interface name="org.example.Doc">
                <method name="Frob">
                  <annotation name="org.gtk.GDBus.DocString" value="Frobs things."/>
                </method>
            </interface></node>"#,
        );
        let doc = ir.interfaces[0].methods[0].doc.as_ref().expect("doc");
        assert_eq!(doc.body(), "Frobs things.");
    }

    #[test]
    fn test_merge_identical_interfaces() {
        let a = parse_document(r#"<node><interface name="org.example.A"><method name="M"/></interface></node>"#)
            .expect("parse a");
        let b = parse_document(
            r#"<node>
                 <!-- org.example.A: Documented here. -->
                 <interface name="org.example.A"><method name="M"/></interface>
                 <interface name="org.example.B"/>
               </node>"#,
        )
        .expect("parse b");

        let ir = InterfaceIr::build(&[a, b], &IrOptions::default()).expect("merge");
        assert_eq!(ir.interfaces.len(), 2);
        assert!(ir.get_interface("org.example.B").is_some());
    }

    #[test]
    fn test_conflicting_interfaces_rejected() {
        let a = parse_document(r#"<node><interface name="org.example.A"><method name="M"/></interface></node>"#)
            .expect("parse a");
        let b = parse_document(r#"<node><interface name="org.example.A"><method name="N"/></interface></node>"#)
            .expect("parse b");

        let err = InterfaceIr::build(&[a, b], &IrOptions::default()).expect_err("collision");
        assert!(matches!(err, SchemaError::InterfaceCollision { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::SchemaViolation);
    }

    #[test]
    fn test_merge_keeps_documentation_regardless_of_order() {
        let plain = r#"<node><interface name="org.example.A"><method name="M"/></interface></node>"#;
        let documented = r#"<node>
              <!-- org.example.A: Documented.
                   @since 1.2
              -->
              <interface name="org.example.A"><method name="M"/></interface>
            </node>"#;

        for order in [[plain, documented], [documented, plain]] {
            let nodes: Vec<Node> = order
                .iter()
                .map(|xml| parse_document(xml).expect("parse"))
                .collect();
            let ir = InterfaceIr::build(&nodes, &IrOptions::default()).expect("merge");
            let iface = &ir.interfaces[0];
            assert_eq!(iface.ext.since.as_deref(), Some("1.2"));
            assert!(iface.doc.is_some());
        }
    }

    #[test]
    fn test_merge_ignores_member_order() {
        let a = parse_document(
            r#"<node><interface name="org.example.A"><method name="X"/><method name="Y"/></interface></node>"#,
        )
        .expect("parse a");
        let b = parse_document(
            r#"<node><interface name="org.example.A"><method name="Y"/><method name="X"/></interface></node>"#,
        )
        .expect("parse b");

        let ir = InterfaceIr::build(&[a, b], &IrOptions::default()).expect("merge");
        assert_eq!(ir.interfaces.len(), 1);
        assert_eq!(ir.interfaces[0].methods.len(), 2);
    }

    #[test]
    fn test_invalid_name_on_unvalidated_tree() {
        let mut iface = InterfaceDef::new("org.example.Raw");
        iface.methods.push(MethodDef::new("Get&Set"));
        let mut node = Node::default();
        node.interfaces.push(iface);

        let err = InterfaceIr::build(&[node], &IrOptions::default()).expect_err("bad name");
        assert_eq!(err.kind(), crate::error::ErrorKind::SchemaViolation);
    }

    #[test]
    fn test_signature_checked_on_unvalidated_tree() {
        let mut iface = InterfaceDef::new("org.example.Raw");
        iface
            .properties
            .push(PropertyDef::new("Broken", "a{", Access::Read));
        let mut node = Node::default();
        node.interfaces.push(iface);

        let err = InterfaceIr::build(&[node], &IrOptions::default()).expect_err("bad signature");
        assert_eq!(err.kind(), crate::error::ErrorKind::TypeSignature);
    }
}
