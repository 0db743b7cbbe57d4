//! D-Bus introspection XML parser.
//!
//! This module turns introspection XML into the syntax tree in
//! [`crate::types`], attaching documentation comments on the way, and runs
//! [`crate::validation`] on the result.

use crate::doc::DocComment;
use crate::error::ParseError;
use crate::types::{
    Access, Annotation, ArgDef, Direction, InterfaceDef, MethodDef, Node, PropertyDef, SignalDef,
};
use crate::validation::validate_node;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Elements with a fixed place in the document. Anything else is skipped.
const KNOWN_ELEMENTS: &[&str] = &[
    "node",
    "interface",
    "method",
    "signal",
    "property",
    "arg",
    "annotation",
];

/// Parses and validates one introspection document.
///
/// An empty or whitespace-only document yields a node without interfaces.
///
/// # Arguments
/// * `xml` - Introspection XML content
///
/// # Returns
/// The validated root node or a parse error.
///
/// # Errors
/// Returns `ParseError` if the XML is malformed, the structure is not a valid
/// interface description, or a type signature is invalid.
pub fn parse_document(xml: &str) -> Result<Node, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<Node> = None;
    let mut buf = Vec::new();

    loop {
        let position = reader.buffer_position() as u64;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                check_root(e, root.is_some(), position)?;
                root = Some(parse_node(&mut reader, e, false)?);
            }
            Ok(Event::Empty(ref e)) => {
                check_root(e, root.is_some(), position)?;
                root = Some(parse_node(&mut reader, e, true)?);
            }
            Ok(Event::Text(ref t)) => {
                let text = std::str::from_utf8(t.as_ref())?;
                if !text.trim().is_empty() {
                    return Err(ParseError::syntax(
                        position,
                        "text content outside of the root element",
                    ));
                }
            }
            Ok(Event::End(_)) => {
                return Err(ParseError::syntax(position, "unexpected closing tag"));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    let node = root.unwrap_or_default();
    validate_node(&node)?;
    Ok(node)
}

/// Checks that a top-level element may start the document.
fn check_root(e: &BytesStart<'_>, have_root: bool, position: u64) -> Result<(), ParseError> {
    if have_root {
        return Err(ParseError::syntax(position, "more than one root element"));
    }
    let name = element_name(e)?;
    if name != "node" {
        return Err(ParseError::illegal_nesting(name, "document"));
    }
    Ok(())
}

fn element_name(e: &BytesStart<'_>) -> Result<String, ParseError> {
    Ok(std::str::from_utf8(e.name().as_ref())?.to_string())
}

/// Attributes of one element, unescaped.
struct Attributes {
    element: &'static str,
    values: Vec<(String, String)>,
}

impl Attributes {
    fn read(element: &'static str, e: &BytesStart<'_>, position: u64) -> Result<Self, ParseError> {
        let mut values = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let raw = std::str::from_utf8(&attr.value)?;
            let value = quick_xml::escape::unescape(raw).map_err(|err| {
                ParseError::syntax(position, format!("attribute '{key}': {err}"))
            })?;
            values.push((key.to_string(), value.into_owned()));
        }
        Ok(Self { element, values })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn required(&self, key: &str) -> Result<&str, ParseError> {
        self.get(key)
            .ok_or_else(|| ParseError::missing_attr(self.element, key))
    }
}

/// A child element handed to a container's visitor.
struct Child<'e> {
    name: &'e str,
    start: &'e BytesStart<'e>,
    is_empty: bool,
    position: u64,
    doc: Option<DocComment>,
}

impl Child<'_> {
    /// Takes the pending comment if it documents `name`.
    fn doc_for(&mut self, name: &str) -> Option<DocComment> {
        self.doc.take().filter(|doc| doc.documents(name))
    }
}

/// Reads the children of the current element up to its end tag.
///
/// Unknown elements are skipped together with their content. Known elements
/// are passed to `visit`, which must consume them completely.
fn read_children<'a, F>(
    reader: &mut Reader<&'a [u8]>,
    context: &str,
    mut visit: F,
) -> Result<(), ParseError>
where
    F: FnMut(&mut Reader<&'a [u8]>, Child<'_>) -> Result<(), ParseError>,
{
    let mut buf = Vec::new();
    let mut pending: Option<DocComment> = None;

    loop {
        let position = reader.buffer_position() as u64;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let doc = pending.take();
                dispatch_child(reader, e, false, position, doc, context, &mut visit)?;
            }
            Ok(Event::Empty(ref e)) => {
                let doc = pending.take();
                dispatch_child(reader, e, true, position, doc, context, &mut visit)?;
            }
            Ok(Event::Comment(ref c)) => {
                let text = std::str::from_utf8(c.as_ref())?;
                pending = DocComment::parse(text);
                if pending.is_none() {
                    tracing::trace!(context, "ignoring comment without a symbol line");
                }
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => {
                return Err(ParseError::syntax(
                    position,
                    format!("unexpected end of document inside <{context}>"),
                ));
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Hands a known child element to `visit`, or skips an unknown one.
fn dispatch_child<'a, F>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'_>,
    is_empty: bool,
    position: u64,
    doc: Option<DocComment>,
    context: &str,
    visit: &mut F,
) -> Result<(), ParseError>
where
    F: FnMut(&mut Reader<&'a [u8]>, Child<'_>) -> Result<(), ParseError>,
{
    let name = element_name(start)?;
    if KNOWN_ELEMENTS.contains(&name.as_str()) {
        let child = Child {
            name: &name,
            start,
            is_empty,
            position,
            doc,
        };
        return visit(reader, child);
    }

    tracing::debug!(element = %name, context, "skipping unknown element");
    if !is_empty {
        skip_to_end(reader, &name)?;
    }
    Ok(())
}

/// Skips to the end of the current element.
fn skip_to_end(reader: &mut Reader<&[u8]>, tag_name: &str) -> Result<(), ParseError> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        let position = reader.buffer_position() as u64;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => {
                return Err(ParseError::syntax(
                    position,
                    format!("unexpected end of document inside <{tag_name}>"),
                ));
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Parses a node element and everything below it.
fn parse_node(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    is_empty: bool,
) -> Result<Node, ParseError> {
    let position = reader.buffer_position() as u64;
    let attrs = Attributes::read("node", e, position)?;
    let mut node = Node::new(attrs.get("name").map(str::to_string));

    if is_empty {
        return Ok(node);
    }

    read_children(reader, "node", |reader, mut child| match child.name {
        "node" => {
            let nested = parse_node(reader, child.start, child.is_empty)?;
            node.nodes.push(nested);
            Ok(())
        }
        "interface" => {
            let attrs = Attributes::read("interface", child.start, child.position)?;
            let name = attrs.required("name")?.to_string();
            let doc = child.doc_for(&name);
            let interface = parse_interface(reader, name, doc, child.is_empty)?;
            node.interfaces.push(interface);
            Ok(())
        }
        other => Err(ParseError::illegal_nesting(other, "node")),
    })?;

    Ok(node)
}

/// Parses an interface body.
fn parse_interface(
    reader: &mut Reader<&[u8]>,
    name: String,
    doc: Option<DocComment>,
    is_empty: bool,
) -> Result<InterfaceDef, ParseError> {
    let mut interface = InterfaceDef::new(name);
    interface.doc = doc;

    if is_empty {
        return Ok(interface);
    }

    read_children(reader, "interface", |reader, mut child| match child.name {
        "method" => {
            let attrs = Attributes::read("method", child.start, child.position)?;
            let mut method = MethodDef::new(attrs.required("name")?);
            method.doc = child.doc_for(&method.name);
            if !child.is_empty {
                parse_method_body(reader, &mut method)?;
            }
            attach_arg_docs(method.doc.as_ref(), &mut method.in_args);
            attach_arg_docs(method.doc.as_ref(), &mut method.out_args);
            interface.methods.push(method);
            Ok(())
        }
        "signal" => {
            let attrs = Attributes::read("signal", child.start, child.position)?;
            let mut signal = SignalDef::new(attrs.required("name")?);
            signal.doc = child.doc_for(&signal.name);
            if !child.is_empty {
                parse_signal_body(reader, &mut signal)?;
            }
            attach_arg_docs(signal.doc.as_ref(), &mut signal.args);
            interface.signals.push(signal);
            Ok(())
        }
        "property" => {
            let property = parse_property(reader, &mut child)?;
            interface.properties.push(property);
            Ok(())
        }
        "annotation" => {
            let annotation = parse_annotation(reader, &child)?;
            interface.annotations.push(annotation);
            Ok(())
        }
        other => Err(ParseError::illegal_nesting(other, "interface")),
    })?;

    Ok(interface)
}

/// Parses the args and annotations of a method.
fn parse_method_body(reader: &mut Reader<&[u8]>, method: &mut MethodDef) -> Result<(), ParseError> {
    let mut index = 0;
    read_children(reader, "method", |reader, child| match child.name {
        "arg" => {
            let attrs = Attributes::read("arg", child.start, child.position)?;
            let direction = match attrs.get("direction") {
                Some(value) => Direction::parse(value)
                    .ok_or_else(|| ParseError::invalid_attr("arg", "direction", value))?,
                None => Direction::In,
            };
            let arg = parse_arg(reader, &child, &attrs, direction, index)?;
            index += 1;
            method.add_arg(arg);
            Ok(())
        }
        "annotation" => {
            let annotation = parse_annotation(reader, &child)?;
            method.annotations.push(annotation);
            Ok(())
        }
        other => Err(ParseError::illegal_nesting(other, "method")),
    })
}

/// Parses the args and annotations of a signal.
fn parse_signal_body(reader: &mut Reader<&[u8]>, signal: &mut SignalDef) -> Result<(), ParseError> {
    read_children(reader, "signal", |reader, child| match child.name {
        "arg" => {
            let attrs = Attributes::read("arg", child.start, child.position)?;
            match attrs.get("direction") {
                None | Some("out") => {}
                Some(value) => return Err(ParseError::invalid_attr("arg", "direction", value)),
            }
            let arg = parse_arg(reader, &child, &attrs, Direction::Out, signal.args.len())?;
            signal.args.push(arg);
            Ok(())
        }
        "annotation" => {
            let annotation = parse_annotation(reader, &child)?;
            signal.annotations.push(annotation);
            Ok(())
        }
        other => Err(ParseError::illegal_nesting(other, "signal")),
    })
}

/// Parses an arg element. Unnamed args are called `arg_<index>`.
fn parse_arg(
    reader: &mut Reader<&[u8]>,
    child: &Child<'_>,
    attrs: &Attributes,
    direction: Direction,
    index: usize,
) -> Result<ArgDef, ParseError> {
    let name = attrs
        .get("name")
        .map_or_else(|| format!("arg_{index}"), str::to_string);
    let mut arg = ArgDef::new(name, attrs.required("type")?, direction);

    if !child.is_empty {
        read_children(reader, "arg", |reader, child| match child.name {
            "annotation" => {
                let annotation = parse_annotation(reader, &child)?;
                arg.annotations.push(annotation);
                Ok(())
            }
            other => Err(ParseError::illegal_nesting(other, "arg")),
        })?;
    }

    Ok(arg)
}

/// Parses a property element.
fn parse_property(
    reader: &mut Reader<&[u8]>,
    child: &mut Child<'_>,
) -> Result<PropertyDef, ParseError> {
    let attrs = Attributes::read("property", child.start, child.position)?;
    let name = attrs.required("name")?;
    let signature = attrs.required("type")?;
    let access_str = attrs.required("access")?;
    let access = Access::parse(access_str)
        .ok_or_else(|| ParseError::invalid_attr("property", "access", access_str))?;

    let mut property = PropertyDef::new(name, signature, access);
    property.doc = child.doc_for(name);

    if !child.is_empty {
        read_children(reader, "property", |reader, child| match child.name {
            "annotation" => {
                let annotation = parse_annotation(reader, &child)?;
                property.annotations.push(annotation);
                Ok(())
            }
            other => Err(ParseError::illegal_nesting(other, "property")),
        })?;
    }

    Ok(property)
}

/// Parses an annotation, including annotations nested inside it.
fn parse_annotation(
    reader: &mut Reader<&[u8]>,
    child: &Child<'_>,
) -> Result<Annotation, ParseError> {
    let attrs = Attributes::read("annotation", child.start, child.position)?;
    let mut annotation = Annotation::new(attrs.required("name")?, attrs.required("value")?);

    if !child.is_empty {
        read_children(reader, "annotation", |reader, child| match child.name {
            "annotation" => {
                let nested = parse_annotation(reader, &child)?;
                annotation.annotations.push(nested);
                Ok(())
            }
            other => Err(ParseError::illegal_nesting(other, "annotation")),
        })?;
    }

    Ok(annotation)
}

/// Copies `@name:` descriptions from the parent's comment onto its args.
fn attach_arg_docs(doc: Option<&DocComment>, args: &mut [ArgDef]) {
    let Some(doc) = doc else {
        return;
    };
    for arg in args {
        arg.doc = doc.param(&arg.name).map(str::to_string);
    }
}
