//! GLib/GIO C code generation modules.

pub mod body;
pub mod header;
mod proxy;
mod skeleton;
pub mod types;

pub use body::BodyGenerator;
pub use header::HeaderGenerator;
pub use types::CKind;

use crate::version::VersionPolicy;
use dbusgen_schema::ir::{ArgInfo, ExtendedInterface, InterfaceInfo, MethodInfo, PropertyInfo};

/// Returns the include guard for a header written to `output_name`.
///
/// Non-alphanumeric characters become underscores, so `stdout` gives
/// `__STDOUT__` and `foo-bar.h` gives `__FOO_BAR_H__`.
#[must_use]
pub fn include_guard(output_name: &str) -> String {
    let name: String = output_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("__{name}__")
}

/// Returns the name of the header a body written to `output_name` includes.
#[must_use]
pub fn header_name(output_name: &str) -> String {
    let stem = match output_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => output_name,
    };
    format!("{stem}.h")
}

/// Escapes text for use inside a C string literal.
#[must_use]
pub fn c_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// GObject type macros for one of the generated types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TypeMacros {
    /// `NS_TYPE_NAME`
    pub type_id: String,
    /// `NS_NAME`
    pub cast: String,
    /// `NS_IS_NAME`
    pub is: String,
    /// CamelCase type name.
    pub camel: String,
    /// Lower-case function prefix.
    pub lower: String,
}

impl TypeMacros {
    /// Macros of the interface type itself.
    pub fn interface(ext: &ExtendedInterface) -> Self {
        Self::with_suffix(ext, "", "")
    }

    /// Macros of the generated proxy class.
    pub fn proxy(ext: &ExtendedInterface) -> Self {
        Self::with_suffix(ext, "_PROXY", "Proxy")
    }

    /// Macros of the generated skeleton class.
    pub fn skeleton(ext: &ExtendedInterface) -> Self {
        Self::with_suffix(ext, "_SKELETON", "Skeleton")
    }

    fn with_suffix(ext: &ExtendedInterface, upper: &str, camel: &str) -> Self {
        Self {
            type_id: format!("{}TYPE_{}{upper}", ext.ns_upper, ext.name_upper),
            cast: format!("{}{}{upper}", ext.ns_upper, ext.name_upper),
            is: format!("{}IS_{}{upper}", ext.ns_upper, ext.name_upper),
            camel: format!("{}{camel}", ext.camel_name),
            lower: format!("{}{}", ext.name_lower, upper.to_lowercase()),
        }
    }
}

/// Returns the C representation of an argument.
pub(crate) fn arg_kind(arg: &ArgInfo) -> CKind {
    CKind::classify(&arg.signature, arg.ext.use_gvariant)
}

/// Returns the C representation of a property.
pub(crate) fn property_kind(property: &PropertyInfo) -> CKind {
    CKind::classify(&property.signature, property.ext.use_gvariant)
}

/// Returns the attribute prefixing declarations of deprecated members.
pub(crate) fn deprecation(iface: &InterfaceInfo, member_deprecated: bool) -> &'static str {
    if iface.ext.deprecated || member_deprecated {
        "G_GNUC_DEPRECATED "
    } else {
        ""
    }
}

/// Formats a parameter list, one parameter per line.
pub(crate) fn param_list(params: &[String]) -> String {
    let mut output = String::from("(\n");
    for (i, param) in params.iter().enumerate() {
        output.push_str("    ");
        output.push_str(param);
        if i + 1 < params.len() {
            output.push(',');
        }
        output.push('\n');
    }
    output.pop();
    output.push(')');
    output
}

/// Formats the `GVariant` tuple format of an argument list.
pub(crate) fn tuple_format(args: &[ArgInfo]) -> String {
    let mut format = String::from("(");
    for arg in args {
        format.push_str(&arg_kind(arg).format(&arg.signature));
    }
    format.push(')');
    format
}

/// Parameter lists of the C functions generated for one method.
pub(crate) struct MethodFunctions<'a> {
    iface: &'a InterfaceInfo,
    method: &'a MethodInfo,
    /// Functions carry `GUnixFDList` parameters.
    pub fd_list: bool,
    /// Call functions carry `call_flags` and `timeout_msec`.
    pub call_flags: bool,
}

impl<'a> MethodFunctions<'a> {
    /// Applies the version policy to a method.
    pub fn new(iface: &'a InterfaceInfo, method: &'a MethodInfo, policy: &VersionPolicy) -> Self {
        Self {
            iface,
            method,
            fd_list: method
                .ext
                .fd_passing
                .passes_fd_list(policy.unconditional_fd_list_support),
            call_flags: policy.call_flags_and_timeout_params,
        }
    }

    /// Lower-case method name.
    pub fn name(&self) -> &str {
        &self.method.ext.names.name_lower
    }

    /// Parameters of the interface vtable handler.
    pub fn handler_params(&self) -> Vec<String> {
        let mut params = vec![
            format!("{} *object", self.iface.ext.camel_name),
            "GDBusMethodInvocation *invocation".to_string(),
        ];
        if self.fd_list {
            params.push("GUnixFDList *fd_list".to_string());
        }
        for arg in &self.method.in_args {
            params.push(format!("{}arg_{}", arg_kind(arg).ctype_in(), arg.name));
        }
        params
    }

    /// Parameters of the `complete` function.
    pub fn complete_params(&self) -> Vec<String> {
        let mut params = vec![
            format!("{} *object", self.iface.ext.camel_name),
            "GDBusMethodInvocation *invocation".to_string(),
        ];
        if self.fd_list {
            params.push("GUnixFDList *fd_list".to_string());
        }
        for arg in &self.method.out_args {
            params.push(format!("{}{}", arg_kind(arg).ctype_in(), arg.name));
        }
        params
    }

    /// Parameters of the asynchronous `call` function.
    pub fn call_params(&self) -> Vec<String> {
        let mut params = vec![format!("{} *proxy", self.iface.ext.camel_name)];
        params.extend(self.in_params());
        if self.fd_list {
            params.push("GUnixFDList *fd_list".to_string());
        }
        if self.call_flags {
            params.push("GDBusCallFlags call_flags".to_string());
            params.push("gint timeout_msec".to_string());
        }
        params.push("GCancellable *cancellable".to_string());
        params.push("GAsyncReadyCallback callback".to_string());
        params.push("gpointer user_data".to_string());
        params
    }

    /// Parameters of the `call_finish` function.
    pub fn finish_params(&self) -> Vec<String> {
        let mut params = vec![format!("{} *proxy", self.iface.ext.camel_name)];
        params.extend(self.out_params());
        if self.fd_list {
            params.push("GUnixFDList **out_fd_list".to_string());
        }
        params.push("GAsyncResult *res".to_string());
        params.push("GError **error".to_string());
        params
    }

    /// Parameters of the `call_sync` function.
    pub fn sync_params(&self) -> Vec<String> {
        let mut params = vec![format!("{} *proxy", self.iface.ext.camel_name)];
        params.extend(self.in_params());
        if self.fd_list {
            params.push("GUnixFDList  *fd_list".to_string());
        }
        if self.call_flags {
            params.push("GDBusCallFlags call_flags".to_string());
            params.push("gint timeout_msec".to_string());
        }
        params.extend(self.out_params());
        if self.fd_list {
            params.push("GUnixFDList **out_fd_list".to_string());
        }
        params.push("GCancellable *cancellable".to_string());
        params.push("GError **error".to_string());
        params
    }

    fn in_params(&self) -> impl Iterator<Item = String> + '_ {
        self.method
            .in_args
            .iter()
            .map(|arg| format!("{}arg_{}", arg_kind(arg).ctype_in(), arg.name))
    }

    fn out_params(&self) -> impl Iterator<Item = String> + '_ {
        self.method
            .out_args
            .iter()
            .map(|arg| format!("{}out_{}", arg_kind(arg).ctype_out(), arg.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbusgen_schema::{InterfaceIr, IrOptions, parse_document};

    const FD_XML: &str = r#"<node>
        <interface name="FDPassing">
          <method name="NoAnnotation">
            <arg name="greeting" direction="in" type="h"/>
            <arg name="response" direction="out" type="s"/>
          </method>
        </interface>
      </node>"#;

    fn fd_interface() -> InterfaceInfo {
        let node = parse_document(FD_XML).expect("parse");
        let ir = InterfaceIr::build(&[node], &IrOptions::default()).expect("ir");
        ir.interfaces[0].clone()
    }

    #[test]
    fn test_include_guard() {
        assert_eq!(include_guard("stdout"), "__STDOUT__");
        assert_eq!(include_guard("foo-bar.h"), "__FOO_BAR_H__");
    }

    #[test]
    fn test_c_escape() {
        assert_eq!(c_escape("plain"), "plain");
        assert_eq!(c_escape("say \"hi\"\n"), "say \\\"hi\\\"\\n");
        assert_eq!(c_escape("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_header_name() {
        assert_eq!(header_name("stdout"), "stdout.h");
        assert_eq!(header_name("coyote.c"), "coyote.h");
        assert_eq!(header_name(".hidden"), ".hidden.h");
    }

    #[test]
    fn test_type_macros() {
        let iface = fd_interface();
        let proxy = TypeMacros::proxy(&iface.ext);
        assert_eq!(proxy.type_id, "TYPE_FDPASSING_PROXY");
        assert_eq!(proxy.cast, "FDPASSING_PROXY");
        assert_eq!(proxy.camel, "FDPassingProxy");
        assert_eq!(proxy.lower, "fdpassing_proxy");
    }

    #[test]
    fn test_param_list() {
        let params = vec!["Foo *object".to_string(), "gint arg_x".to_string()];
        assert_eq!(param_list(&params), "(\n    Foo *object,\n    gint arg_x)");
    }

    #[test]
    fn test_fd_list_follows_policy() {
        let iface = fd_interface();
        let method = &iface.methods[0];

        let old = MethodFunctions::new(&iface, method, &VersionPolicy::default());
        assert!(!old.fd_list);
        assert!(!old.sync_params().iter().any(|p| p.contains("GUnixFDList")));

        let policy = VersionPolicy::resolve(Some("2.64"), None).expect("policy");
        let new = MethodFunctions::new(&iface, method, &policy);
        assert!(new.fd_list);
        assert_eq!(
            new.sync_params()
                .iter()
                .filter(|p| p.contains("GUnixFDList"))
                .count(),
            2
        );
        assert!(new.call_params().contains(&"GDBusCallFlags call_flags".to_string()));
    }

    #[test]
    fn test_tuple_format() {
        let iface = fd_interface();
        assert_eq!(tuple_format(&iface.methods[0].in_args), "(h)");
        assert_eq!(tuple_format(&iface.methods[0].out_args), "(s)");
    }
}
