//! Structural validation of parsed introspection documents.
//!
//! The parser already rejects malformed markup and misplaced elements; this
//! module checks what can only be seen once a container is complete: unique
//! names, well-formed signatures and annotation values.

use crate::error::ParseError;
use crate::signature::validate_signature;
use crate::types::{Annotation, ArgDef, InterfaceDef, Node, annotations};
use std::collections::HashSet;

/// Validates a parsed document for correctness.
///
/// # Arguments
/// * `node` - The document root
///
/// # Returns
/// Ok(()) if valid, or ParseError describing the first issue.
///
/// # Errors
/// Returns `ParseError` if validation fails.
pub fn validate_node(node: &Node) -> Result<(), ParseError> {
    let mut seen = HashSet::new();
    for interface in node.all_interfaces() {
        if !seen.insert(interface.name.as_str()) {
            return Err(ParseError::duplicate("interface", &interface.name, "document"));
        }
        validate_interface(interface)?;
    }
    Ok(())
}

/// Validates one interface and all of its members.
fn validate_interface(interface: &InterfaceDef) -> Result<(), ParseError> {
    if !is_interface_name(&interface.name) {
        return Err(ParseError::invalid_attr("interface", "name", &interface.name));
    }
    let container = format!("interface '{}'", interface.name);
    validate_annotations(&interface.annotations, &container)?;

    check_unique(
        "method",
        interface.methods.iter().map(|m| m.name.as_str()),
        &container,
    )?;
    check_unique(
        "signal",
        interface.signals.iter().map(|s| s.name.as_str()),
        &container,
    )?;
    check_unique(
        "property",
        interface.properties.iter().map(|p| p.name.as_str()),
        &container,
    )?;

    for method in &interface.methods {
        let target = format!("method '{}.{}'", interface.name, method.name);
        check_member_name("method", &method.name)?;
        validate_annotations(&method.annotations, &target)?;
        validate_args(&method.in_args, &target)?;
        validate_args(&method.out_args, &target)?;
    }

    for signal in &interface.signals {
        let target = format!("signal '{}.{}'", interface.name, signal.name);
        check_member_name("signal", &signal.name)?;
        validate_annotations(&signal.annotations, &target)?;
        validate_args(&signal.args, &target)?;
    }

    for property in &interface.properties {
        let target = format!("property '{}.{}'", interface.name, property.name);
        check_member_name("property", &property.name)?;
        validate_signature(&property.signature)?;
        validate_annotations(&property.annotations, &target)?;
    }

    Ok(())
}

/// Validates an argument list; names must be unique within it.
fn validate_args(args: &[ArgDef], container: &str) -> Result<(), ParseError> {
    check_unique("arg", args.iter().map(|a| a.name.as_str()), container)?;
    for arg in args {
        check_member_name("arg", &arg.name)?;
        validate_signature(&arg.signature)?;
        validate_annotations(&arg.annotations, &format!("arg '{}' of {container}", arg.name))?;
    }
    Ok(())
}

/// Checks values of annotations whose domain is known.
fn validate_annotations(list: &[Annotation], target: &str) -> Result<(), ParseError> {
    for annotation in list {
        let allowed: &[&str] = match annotation.name.as_str() {
            annotations::EMITS_CHANGED_SIGNAL => &["true", "false", "const", "invalidates"],
            annotations::DEPRECATED | annotations::NO_REPLY => &["true", "false"],
            _ => &[],
        };
        if !allowed.is_empty() && !allowed.contains(&annotation.value.as_str()) {
            return Err(ParseError::InvalidAnnotation {
                name: annotation.name.clone(),
                value: annotation.value.clone(),
                target: target.to_string(),
            });
        }
        validate_annotations(&annotation.annotations, target)?;
    }
    Ok(())
}

/// Maximum length of interface and member names.
const MAX_NAME_LENGTH: usize = 255;

/// Returns true for `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Member and argument names end up as C identifiers and inside generated
/// markup, so nothing else is accepted.
fn is_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Returns true for dot-separated identifiers of at most 255 bytes.
fn is_interface_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LENGTH && name.split('.').all(is_identifier)
}

fn check_member_name(element: &str, name: &str) -> Result<(), ParseError> {
    if name.len() > MAX_NAME_LENGTH || !is_identifier(name) {
        return Err(ParseError::invalid_attr(element, "name", name));
    }
    Ok(())
}

fn check_unique<'a>(
    kind: &str,
    names: impl Iterator<Item = &'a str>,
    container: &str,
) -> Result<(), ParseError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ParseError::duplicate(kind, name, container));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, ParseError};
    use crate::parser::parse_document;

    #[test]
    fn test_validate_valid_document() {
        let xml = r#"<node>
          <interface name="com.acme.Coyote">
            <method name="Run"><arg name="speed" type="d" direction="in"/></method>
            <signal name="Run"/>
            <property name="Mood" type="s" access="read">
              <annotation name="org.freedesktop.DBus.Property.EmitsChangedSignal" value="invalidates"/>
            </property>
          </interface>
        </node>"#;
        assert!(parse_document(xml).is_ok());
    }

    #[test]
    fn test_duplicate_interface_across_nodes() {
        let xml = r#"<node>
          <interface name="org.example.Foo"/>
          <node name="child"><interface name="org.example.Foo"/></node>
        </node>"#;
        let err = parse_document(xml).expect_err("duplicate interface");
        assert!(matches!(err, ParseError::DuplicateDefinition { .. }));
    }

    #[test]
    fn test_duplicate_members() {
        for body in [
            r#"<method name="M"/><method name="M"/>"#,
            r#"<signal name="S"/><signal name="S"/>"#,
            r#"<property name="P" type="s" access="read"/><property name="P" type="i" access="read"/>"#,
            r#"<method name="M"><arg name="a" type="s"/><arg name="a" type="i"/></method>"#,
        ] {
            let xml = format!(r#"<node><interface name="org.example.Foo">{body}</interface></node>"#);
            let err = parse_document(&xml).expect_err(body);
            assert!(
                matches!(err, ParseError::DuplicateDefinition { .. }),
                "{body}: {err}"
            );
        }
    }

    #[test]
    fn test_same_arg_name_in_and_out() {
        let xml = r#"<node><interface name="org.example.Foo">
            <method name="Echo">
              <arg name="value" type="s" direction="in"/>
              <arg name="value" type="s" direction="out"/>
            </method>
        </interface></node>"#;
        assert!(parse_document(xml).is_ok());
    }

    #[test]
    fn test_invalid_annotation_value() {
        let xml = r#"<node><interface name="org.example.Foo">
            <property name="P" type="s" access="read">
              <annotation name="org.freedesktop.DBus.Property.EmitsChangedSignal" value="sometimes"/>
            </property>
        </interface></node>"#;
        let err = parse_document(xml).expect_err("bad annotation");
        assert!(matches!(err, ParseError::InvalidAnnotation { .. }));
        assert_eq!(err.kind(), ErrorKind::SchemaViolation);
    }

    #[test]
    fn test_invalid_property_signature() {
        let xml = r#"<node><interface name="org.example.Foo">
            <property name="P" type="a" access="read"/>
        </interface></node>"#;
        let err = parse_document(xml).expect_err("bad signature");
        assert_eq!(err.kind(), ErrorKind::TypeSignature);
    }

    #[test]
    fn test_invalid_names_rejected() {
        for body in [
            r#"<interface name="org.example.Foo"><method name="Get&amp;Set"/></interface>"#,
            r#"<interface name="org.example.Foo"><signal name="2Fast"/></interface>"#,
            r#"<interface name="org.example.Foo"><property name="a-b" type="s" access="read"/></interface>"#,
            r#"<interface name="org.example.Foo"><method name="M"><arg name="x&quot;y" type="s"/></method></interface>"#,
            r#"<interface name="org..Foo"/>"#,
            r#"<interface name="org.example.&lt;Foo&gt;"/>"#,
        ] {
            let xml = format!("<node>{body}</node>");
            let err = parse_document(&xml).expect_err(body);
            assert!(
                matches!(err, ParseError::InvalidAttribute { .. }),
                "{body}: {err}"
            );
            assert_eq!(err.kind(), ErrorKind::SchemaViolation);
        }
    }

    #[test]
    fn test_identifier_names_accepted() {
        let xml = r#"<node><interface name="FDPassing">
            <method name="_private_2"><arg name="greeting_locale" type="s"/></method>
        </interface></node>"#;
        assert!(parse_document(xml).is_ok());
    }

    #[test]
    fn test_overlong_name_rejected() {
        let name = "a".repeat(256);
        let xml = format!(r#"<node><interface name="org.example.Foo"><method name="{name}"/></interface></node>"#);
        assert!(parse_document(&xml).is_err());
    }
}
