//! Syntax tree for D-Bus introspection documents.
//!
//! These types mirror the XML one-to-one. They are produced by the parser,
//! checked by [`crate::validation`] and lowered into [`crate::ir`].

use crate::doc::DocComment;

/// Annotation keys with meaning to the generator.
pub mod annotations {
    /// Overrides the C name of an interface or member.
    pub const C_NAME: &str = "org.gtk.GDBus.C.Name";
    /// Forces `GVariant` usage for an argument or property.
    pub const C_FORCE_GVARIANT: &str = "org.gtk.GDBus.C.ForceGVariant";
    /// Requests file descriptor list plumbing on a method.
    pub const C_UNIX_FD: &str = "org.gtk.GDBus.C.UnixFD";
    /// Version in which an element was introduced.
    pub const SINCE: &str = "org.gtk.GDBus.Since";
    /// Long documentation string.
    pub const DOC_STRING: &str = "org.gtk.GDBus.DocString";
    /// Short documentation string.
    pub const DOC_STRING_SHORT: &str = "org.gtk.GDBus.DocString.Short";
    /// Marks an element as deprecated.
    pub const DEPRECATED: &str = "org.freedesktop.DBus.Deprecated";
    /// Marks a method as not expecting a reply.
    pub const NO_REPLY: &str = "org.freedesktop.DBus.Method.NoReply";
    /// Change notification policy of a property.
    pub const EMITS_CHANGED_SIGNAL: &str = "org.freedesktop.DBus.Property.EmitsChangedSignal";
}

/// Namespaced key/value metadata attached to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Annotation key.
    pub name: String,
    /// Annotation value.
    pub value: String,
    /// Annotations on this annotation.
    pub annotations: Vec<Annotation>,
}

impl Annotation {
    /// Creates a new annotation.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            annotations: Vec::new(),
        }
    }
}

/// Looks up the value of the first annotation with the given key.
#[must_use]
pub fn find_annotation<'a>(annotations: &'a [Annotation], name: &str) -> Option<&'a str> {
    annotations
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.value.as_str())
}

/// Argument direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Passed from caller to callee.
    #[default]
    In,
    /// Passed back to the caller.
    Out,
}

impl Direction {
    /// Parses a direction attribute value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            _ => None,
        }
    }

    /// Returns the attribute spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// Property access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Read-only.
    Read,
    /// Write-only.
    Write,
    /// Readable and writable.
    ReadWrite,
}

impl Access {
    /// Parses an access attribute value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            "readwrite" => Some(Self::ReadWrite),
            _ => None,
        }
    }

    /// Returns the attribute spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::ReadWrite => "readwrite",
        }
    }

    /// Returns true if the property can be read.
    #[must_use]
    pub const fn is_readable(&self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// Returns true if the property can be written.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Method or signal argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDef {
    /// Argument name (generated as `arg_N` when absent in the XML).
    pub name: String,
    /// D-Bus type signature.
    pub signature: String,
    /// Direction.
    pub direction: Direction,
    /// Annotations.
    pub annotations: Vec<Annotation>,
    /// Description taken from the parent's `@name:` doc line.
    pub doc: Option<String>,
}

impl ArgDef {
    /// Creates a new argument.
    #[must_use]
    pub fn new(name: impl Into<String>, signature: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            direction,
            annotations: Vec::new(),
            doc: None,
        }
    }
}

/// Method definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    /// Method name.
    pub name: String,
    /// Input arguments in declaration order.
    pub in_args: Vec<ArgDef>,
    /// Output arguments in declaration order.
    pub out_args: Vec<ArgDef>,
    /// Annotations.
    pub annotations: Vec<Annotation>,
    /// Attached documentation.
    pub doc: Option<DocComment>,
}

impl MethodDef {
    /// Creates an empty method.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            in_args: Vec::new(),
            out_args: Vec::new(),
            annotations: Vec::new(),
            doc: None,
        }
    }

    /// Adds an argument to the list matching its direction.
    pub fn add_arg(&mut self, arg: ArgDef) {
        match arg.direction {
            Direction::In => self.in_args.push(arg),
            Direction::Out => self.out_args.push(arg),
        }
    }
}

/// Signal definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDef {
    /// Signal name.
    pub name: String,
    /// Arguments, all outgoing.
    pub args: Vec<ArgDef>,
    /// Annotations.
    pub annotations: Vec<Annotation>,
    /// Attached documentation.
    pub doc: Option<DocComment>,
}

impl SignalDef {
    /// Creates an empty signal.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            annotations: Vec::new(),
            doc: None,
        }
    }
}

/// Property definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    /// Property name.
    pub name: String,
    /// D-Bus type signature.
    pub signature: String,
    /// Access mode.
    pub access: Access,
    /// Annotations.
    pub annotations: Vec<Annotation>,
    /// Attached documentation.
    pub doc: Option<DocComment>,
}

impl PropertyDef {
    /// Creates a new property.
    #[must_use]
    pub fn new(name: impl Into<String>, signature: impl Into<String>, access: Access) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            access,
            annotations: Vec::new(),
            doc: None,
        }
    }
}

/// Interface definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDef {
    /// Qualified dotted name.
    pub name: String,
    /// Methods in declaration order.
    pub methods: Vec<MethodDef>,
    /// Signals in declaration order.
    pub signals: Vec<SignalDef>,
    /// Properties in declaration order.
    pub properties: Vec<PropertyDef>,
    /// Annotations.
    pub annotations: Vec<Annotation>,
    /// Attached documentation.
    pub doc: Option<DocComment>,
}

impl InterfaceDef {
    /// Creates an empty interface.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            signals: Vec::new(),
            properties: Vec::new(),
            annotations: Vec::new(),
            doc: None,
        }
    }

    /// Returns the comparable shape of this declaration.
    ///
    /// Documentation is removed and members are sorted by name, so two
    /// declarations that differ only in comments or member order compare
    /// equal. Arguments keep their order.
    #[must_use]
    pub fn canonical(&self) -> Self {
        let strip_args = |args: &[ArgDef]| -> Vec<ArgDef> {
            args.iter()
                .map(|a| ArgDef {
                    doc: None,
                    ..a.clone()
                })
                .collect()
        };

        let mut methods: Vec<MethodDef> = self
            .methods
            .iter()
            .map(|m| MethodDef {
                in_args: strip_args(&m.in_args),
                out_args: strip_args(&m.out_args),
                doc: None,
                ..m.clone()
            })
            .collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));

        let mut signals: Vec<SignalDef> = self
            .signals
            .iter()
            .map(|s| SignalDef {
                args: strip_args(&s.args),
                doc: None,
                ..s.clone()
            })
            .collect();
        signals.sort_by(|a, b| a.name.cmp(&b.name));

        let mut properties: Vec<PropertyDef> = self
            .properties
            .iter()
            .map(|p| PropertyDef {
                doc: None,
                ..p.clone()
            })
            .collect();
        properties.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            name: self.name.clone(),
            methods,
            signals,
            properties,
            annotations: self.annotations.clone(),
            doc: None,
        }
    }

    /// Folds the documentation of an equivalent declaration into this one.
    ///
    /// Where only one side is documented its comment is taken; where both
    /// are, the lexicographically smaller comment wins. The result does not
    /// depend on which declaration was seen first. Members are matched by
    /// name and arguments by position.
    pub fn merge_docs(&mut self, other: &InterfaceDef) {
        merge_comment(&mut self.doc, other.doc.as_ref());

        for method in &mut self.methods {
            if let Some(theirs) = other.methods.iter().find(|m| m.name == method.name) {
                merge_comment(&mut method.doc, theirs.doc.as_ref());
                merge_arg_docs(&mut method.in_args, &theirs.in_args);
                merge_arg_docs(&mut method.out_args, &theirs.out_args);
            }
        }
        for signal in &mut self.signals {
            if let Some(theirs) = other.signals.iter().find(|s| s.name == signal.name) {
                merge_comment(&mut signal.doc, theirs.doc.as_ref());
                merge_arg_docs(&mut signal.args, &theirs.args);
            }
        }
        for property in &mut self.properties {
            if let Some(theirs) = other.properties.iter().find(|p| p.name == property.name) {
                merge_comment(&mut property.doc, theirs.doc.as_ref());
            }
        }
    }
}

fn merge_comment(ours: &mut Option<DocComment>, theirs: Option<&DocComment>) {
    if let Some(theirs) = theirs {
        if ours.as_ref().is_none_or(|doc| theirs.raw < doc.raw) {
            *ours = Some(theirs.clone());
        }
    }
}

fn merge_arg_docs(ours: &mut [ArgDef], theirs: &[ArgDef]) {
    for (arg, other) in ours.iter_mut().zip(theirs) {
        if let Some(doc) = &other.doc {
            if arg.doc.as_ref().is_none_or(|current| doc < current) {
                arg.doc = Some(doc.clone());
            }
        }
    }
}

/// Object path node; the document root is always a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Object path, if given.
    pub path: Option<String>,
    /// Interfaces declared directly on this node.
    pub interfaces: Vec<InterfaceDef>,
    /// Child nodes.
    pub nodes: Vec<Node>,
}

impl Node {
    /// Creates an empty node.
    #[must_use]
    pub fn new(path: Option<String>) -> Self {
        Self {
            path,
            interfaces: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Returns every interface of this node and its descendants, depth first.
    #[must_use]
    pub fn all_interfaces(&self) -> Vec<&InterfaceDef> {
        let mut out: Vec<&InterfaceDef> = self.interfaces.iter().collect();
        for child in &self.nodes {
            out.extend(child.all_interfaces());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_parse() {
        assert_eq!(Access::parse("read"), Some(Access::Read));
        assert_eq!(Access::parse("readwrite"), Some(Access::ReadWrite));
        assert_eq!(Access::parse("rw"), None);
        assert!(Access::ReadWrite.is_readable());
        assert!(Access::ReadWrite.is_writable());
        assert!(!Access::Write.is_readable());
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("in"), Some(Direction::In));
        assert_eq!(Direction::parse("out"), Some(Direction::Out));
        assert_eq!(Direction::parse("inout"), None);
        assert_eq!(Direction::default(), Direction::In);
    }

    #[test]
    fn test_method_add_arg_splits_directions() {
        let mut method = MethodDef::new("Swap");
        method.add_arg(ArgDef::new("a", "s", Direction::In));
        method.add_arg(ArgDef::new("b", "s", Direction::Out));
        method.add_arg(ArgDef::new("c", "i", Direction::In));

        assert_eq!(method.in_args.len(), 2);
        assert_eq!(method.out_args.len(), 1);
        assert_eq!(method.in_args[1].name, "c");
    }

    #[test]
    fn test_find_annotation() {
        let annotations = vec![
            Annotation::new(annotations::DEPRECATED, "true"),
            Annotation::new(annotations::SINCE, "1.2"),
        ];
        assert_eq!(find_annotation(&annotations, annotations::SINCE), Some("1.2"));
        assert_eq!(find_annotation(&annotations, annotations::C_NAME), None);
    }

    #[test]
    fn test_all_interfaces_flattens_nested_nodes() {
        let mut root = Node::new(Some("/".to_string()));
        root.interfaces.push(InterfaceDef::new("org.example.A"));
        let mut child = Node::new(Some("child".to_string()));
        child.interfaces.push(InterfaceDef::new("org.example.B"));
        root.nodes.push(child);

        let names: Vec<&str> = root.all_interfaces().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["org.example.A", "org.example.B"]);
    }

    #[test]
    fn test_canonical_ignores_comments_and_member_order() {
        let mut a = InterfaceDef::new("org.example.A");
        let mut run = MethodDef::new("Run");
        run.doc = DocComment::parse("Run: Runs.");
        a.methods.push(run);
        a.methods.push(MethodDef::new("Stop"));

        let mut b = a.clone();
        b.methods.reverse();
        b.methods[1].doc = None;

        assert_ne!(a, b);
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_canonical_keeps_arg_order() {
        let mut a = InterfaceDef::new("org.example.A");
        let mut method = MethodDef::new("Pair");
        method.add_arg(ArgDef::new("x", "s", Direction::In));
        method.add_arg(ArgDef::new("y", "s", Direction::In));
        a.methods.push(method);

        let mut b = a.clone();
        b.methods[0].in_args.reverse();

        assert_ne!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_merge_docs_is_symmetric() {
        let mut plain = InterfaceDef::new("org.example.A");
        let mut method = MethodDef::new("Run");
        method.add_arg(ArgDef::new("speed", "d", Direction::In));
        plain.methods.push(method);

        let mut first = plain.clone();
        first.doc = DocComment::parse("org.example.A: First.");
        first.methods[0].in_args[0].doc = Some("Fast.".to_string());

        let mut second = plain.clone();
        second.doc = DocComment::parse("org.example.A: Second.");
        second.methods[0].doc = DocComment::parse("Run: Runs.");
        second.methods[0].in_args[0].doc = Some("Slow.".to_string());

        let mut forward = plain.clone();
        forward.merge_docs(&first);
        forward.merge_docs(&second);

        let mut backward = second.clone();
        backward.merge_docs(&plain);
        backward.merge_docs(&first);

        assert_eq!(forward, backward);
        assert_eq!(forward.doc.as_ref().and_then(|d| d.brief.as_deref()), Some("First."));
        assert!(forward.methods[0].doc.is_some());
        assert_eq!(forward.methods[0].in_args[0].doc.as_deref(), Some("Fast."));
    }
}
