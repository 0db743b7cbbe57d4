//! C body generation.

use super::proxy::ProxyEmitter;
use super::skeleton::SkeletonEmitter;
use super::{
    MethodFunctions, TypeMacros, arg_kind, c_escape, header_name, param_list, property_kind,
    tuple_format,
};
use crate::generator::{Artifact, Emit};
use crate::templates::{CONFIG_H_INCLUDE, HEADER_INCLUDES, TOP_COMMENT, TYPEDEFS_AND_HELPERS};
use crate::version::VersionPolicy;
use dbusgen_schema::ir::{ArgInfo, InterfaceInfo, MethodInfo, PropertyInfo, SignalInfo};
use dbusgen_schema::{Access, Annotation, SortedIr};

/// Generator for the implementation of every interface.
pub struct BodyGenerator {
    output_name: String,
}

impl BodyGenerator {
    /// Creates a body generator for a file named `output_name`.
    #[must_use]
    pub fn new(output_name: impl Into<String>) -> Self {
        Self {
            output_name: output_name.into(),
        }
    }

    /// Generates the complete body.
    #[must_use]
    pub fn generate(&self, ir: &SortedIr, policy: &VersionPolicy) -> String {
        let mut output = String::new();

        output.push_str(TOP_COMMENT);
        output.push_str("\n\n");
        output.push_str(CONFIG_H_INCLUDE);
        output.push_str("\n\n");
        output.push_str(&format!("#include \"{}\"\n\n", header_name(&self.output_name)));
        output.push_str(HEADER_INCLUDES);
        output.push_str("\n\n");
        output.push_str(TYPEDEFS_AND_HELPERS);
        output.push_str("\n\n");

        for iface in ir.interfaces() {
            let interface = InterfaceEmitter::new(iface, policy);
            output.push_str(&interface.generate());
            output.push_str(&ProxyEmitter::new(iface).definitions());
            output.push_str(&SkeletonEmitter::new(iface).definitions());
        }

        output
    }
}

impl Emit for BodyGenerator {
    fn emit(&self, ir: &SortedIr, policy: &VersionPolicy) -> Vec<Artifact> {
        vec![Artifact::new(self.output_name.clone(), self.generate(ir, policy))]
    }
}

/// Emits the introspection data, interface type and accessors of one interface.
struct InterfaceEmitter<'a> {
    iface: &'a InterfaceInfo,
    policy: &'a VersionPolicy,
    macros: TypeMacros,
}

impl<'a> InterfaceEmitter<'a> {
    fn new(iface: &'a InterfaceInfo, policy: &'a VersionPolicy) -> Self {
        Self {
            iface,
            policy,
            macros: TypeMacros::interface(&iface.ext),
        }
    }

    fn lower(&self) -> &str {
        &self.iface.ext.name_lower
    }

    fn generate(&self) -> String {
        let mut output = String::new();

        output.push_str("/* ------------------------------------------------------------------------ */\n");
        output.push_str(&format!("/* Code for interface {} */\n", self.iface.name));
        output.push_str("/* ------------------------------------------------------------------------ */\n\n");

        output.push_str(&self.generate_introspection());
        output.push_str(&self.generate_info_functions());
        output.push_str(&self.generate_interface_type());

        for property in &self.iface.properties {
            output.push_str(&self.generate_property_accessors(property));
        }
        for signal in &self.iface.signals {
            output.push_str(&self.generate_signal_emitter(signal));
        }
        for method in &self.iface.methods {
            output.push_str(&self.generate_method_calls(method));
        }
        for method in &self.iface.methods {
            output.push_str(&self.generate_complete(method));
        }

        output
    }

    /// Generates the static introspection tables.
    fn generate_introspection(&self) -> String {
        let mut output = String::new();
        let lower = self.lower().to_string();

        output.push_str("/* ---- Introspection data for ");
        output.push_str(&self.iface.name);
        output.push_str(" ---- */\n\n");

        for method in &self.iface.methods {
            output.push_str(&self.generate_method_info(method));
        }
        let methods = pointer_array(
            &mut output,
            "GDBusMethodInfo",
            &format!("_{lower}_method_info"),
            self.iface
                .methods
                .iter()
                .map(|m| format!("_{lower}_method_info_{}", m.ext.names.name_lower)),
        );

        for signal in &self.iface.signals {
            output.push_str(&self.generate_signal_info(signal));
        }
        let signals = pointer_array(
            &mut output,
            "GDBusSignalInfo",
            &format!("_{lower}_signal_info"),
            self.iface
                .signals
                .iter()
                .map(|s| format!("_{lower}_signal_info_{}", s.ext.names.name_lower)),
        );

        for property in &self.iface.properties {
            output.push_str(&self.generate_property_info(property));
        }
        let properties = pointer_array(
            &mut output,
            "GDBusPropertyInfo",
            &format!("_{lower}_property_info"),
            self.iface
                .properties
                .iter()
                .map(|p| format!("_{lower}_property_info_{}", p.ext.names.name_lower)),
        );

        let annotations = annotation_infos(
            &mut output,
            &format!("_{lower}"),
            &self.iface.annotations,
        );

        output.push_str(&format!(
            "static const _ExtendedGDBusInterfaceInfo _{lower}_interface_info =\n"
        ));
        output.push_str("{\n");
        output.push_str("  {\n");
        output.push_str("    -1,\n");
        output.push_str(&format!("    (gchar *) \"{}\",\n", self.iface.name));
        output.push_str(&format!("    {methods},\n"));
        output.push_str(&format!("    {signals},\n"));
        output.push_str(&format!("    {properties},\n"));
        output.push_str(&format!("    {annotations}\n"));
        output.push_str("  },\n");
        output.push_str(&format!("  \"{}\",\n", self.iface.ext.name_hyphen));
        output.push_str("};\n\n");

        output
    }

    fn generate_method_info(&self, method: &MethodInfo) -> String {
        let mut output = String::new();
        let prefix = format!("_{}_method_info_{}", self.lower(), method.ext.names.name_lower);

        let in_args = arg_infos(&mut output, &format!("{prefix}_IN_ARG"), &method.in_args);
        let out_args = arg_infos(&mut output, &format!("{prefix}_OUT_ARG"), &method.out_args);
        let annotations = annotation_infos(&mut output, &prefix, &method.annotations);
        let pass_fdlist = method
            .ext
            .fd_passing
            .passes_fd_list(self.policy.unconditional_fd_list_support);

        output.push_str(&format!("static const _ExtendedGDBusMethodInfo {prefix} =\n"));
        output.push_str("{\n");
        output.push_str("  {\n");
        output.push_str("    -1,\n");
        output.push_str(&format!("    (gchar *) \"{}\",\n", method.name));
        output.push_str(&format!("    {in_args},\n"));
        output.push_str(&format!("    {out_args},\n"));
        output.push_str(&format!("    {annotations}\n"));
        output.push_str("  },\n");
        output.push_str(&format!("  \"handle-{}\",\n", method.ext.names.name_hyphen));
        output.push_str(&format!("  {}\n", c_bool(pass_fdlist)));
        output.push_str("};\n\n");

        output
    }

    fn generate_signal_info(&self, signal: &SignalInfo) -> String {
        let mut output = String::new();
        let prefix = format!("_{}_signal_info_{}", self.lower(), signal.ext.names.name_lower);

        let args = arg_infos(&mut output, &format!("{prefix}_ARG"), &signal.args);
        let annotations = annotation_infos(&mut output, &prefix, &signal.annotations);

        output.push_str(&format!("static const _ExtendedGDBusSignalInfo {prefix} =\n"));
        output.push_str("{\n");
        output.push_str("  {\n");
        output.push_str("    -1,\n");
        output.push_str(&format!("    (gchar *) \"{}\",\n", signal.name));
        output.push_str(&format!("    {args},\n"));
        output.push_str(&format!("    {annotations}\n"));
        output.push_str("  },\n");
        output.push_str(&format!("  \"{}\"\n", signal.ext.names.name_hyphen));
        output.push_str("};\n\n");

        output
    }

    fn generate_property_info(&self, property: &PropertyInfo) -> String {
        let mut output = String::new();
        let prefix = format!(
            "_{}_property_info_{}",
            self.lower(),
            property.ext.names.name_lower
        );
        let annotations = annotation_infos(&mut output, &prefix, &property.annotations);
        let flags = match property.access {
            Access::Read => "G_DBUS_PROPERTY_INFO_FLAGS_READABLE",
            Access::Write => "G_DBUS_PROPERTY_INFO_FLAGS_WRITABLE",
            Access::ReadWrite => {
                "G_DBUS_PROPERTY_INFO_FLAGS_READABLE | G_DBUS_PROPERTY_INFO_FLAGS_WRITABLE"
            }
        };

        output.push_str(&format!("static const _ExtendedGDBusPropertyInfo {prefix} =\n"));
        output.push_str("{\n");
        output.push_str("  {\n");
        output.push_str("    -1,\n");
        output.push_str(&format!("    (gchar *) \"{}\",\n", property.name));
        output.push_str(&format!("    (gchar *) \"{}\",\n", property.signature));
        output.push_str(&format!("    {flags},\n"));
        output.push_str(&format!("    {annotations}\n"));
        output.push_str("  },\n");
        output.push_str(&format!("  \"{}\",\n", property.ext.names.name_hyphen));
        output.push_str(&format!("  {},\n", c_bool(property.ext.use_gvariant)));
        output.push_str(&format!(
            "  {}\n",
            c_bool(property.ext.emits_changed_signal.emits())
        ));
        output.push_str("};\n\n");

        output
    }

    /// Generates `*_interface_info` and `*_override_properties`.
    fn generate_info_functions(&self) -> String {
        let mut output = String::new();
        let lower = self.lower();

        output.push_str(&gtk_doc(
            &format!("{lower}_interface_info"),
            &format!("Gets a machine-readable description of the <link linkend=\"gdbus-interface-{}.top_of_page\">{}</link> D-Bus interface.", self.iface.name.replace('.', "-"), self.iface.name),
            Some("Returns: (transfer none): A #GDBusInterfaceInfo. Do not free."),
            self.iface.ext.since.as_deref(),
            false,
        ));
        output.push_str("GDBusInterfaceInfo *\n");
        output.push_str(&format!("{lower}_interface_info (void)\n"));
        output.push_str("{\n");
        output.push_str(&format!(
            "  return (GDBusInterfaceInfo *) &_{lower}_interface_info.parent_struct;\n"
        ));
        output.push_str("}\n\n");

        output.push_str("guint\n");
        if self.iface.properties.is_empty() {
            output.push_str(&format!(
                "{lower}_override_properties (GObjectClass *klass G_GNUC_UNUSED, guint property_id_begin)\n"
            ));
        } else {
            output.push_str(&format!(
                "{lower}_override_properties (GObjectClass *klass, guint property_id_begin)\n"
            ));
        }
        output.push_str("{\n");
        for property in &self.iface.properties {
            output.push_str(&format!(
                "  g_object_class_override_property (klass, property_id_begin++, \"{}\");\n",
                property.ext.names.name_hyphen
            ));
        }
        output.push_str("  return property_id_begin - 1;\n");
        output.push_str("}\n\n");

        output
    }

    /// Generates the GInterface with its signals and properties.
    fn generate_interface_type(&self) -> String {
        let mut output = String::new();
        let camel = &self.iface.ext.camel_name;
        let lower = self.lower();

        output.push_str(&gtk_doc(
            camel,
            &format!("Abstract interface type for the D-Bus interface <link linkend=\"gdbus-interface-{}.top_of_page\">{}</link>.", self.iface.name.replace('.', "-"), self.iface.name),
            None,
            self.iface.ext.since.as_deref(),
            self.iface.ext.deprecated,
        ));
        output.push_str(&format!("typedef {camel}Iface {camel}Interface;\n"));
        output.push_str(&format!("G_DEFINE_INTERFACE ({camel}, {lower}, G_TYPE_OBJECT)\n\n"));

        output.push_str("static void\n");
        if self.iface.is_empty() {
            output.push_str(&format!("{lower}_default_init ({camel}Iface *iface G_GNUC_UNUSED)\n"));
        } else {
            output.push_str(&format!("{lower}_default_init ({camel}Iface *iface)\n"));
        }
        output.push_str("{\n");

        if !self.iface.methods.is_empty() {
            output.push_str("  /* GObject signals for incoming D-Bus method calls: */\n");
            for method in &self.iface.methods {
                let f = MethodFunctions::new(self.iface, method, self.policy);
                let mut gtypes = vec!["G_TYPE_DBUS_METHOD_INVOCATION"];
                if f.fd_list {
                    gtypes.push("G_TYPE_UNIX_FD_LIST");
                }
                gtypes.extend(method.in_args.iter().map(|arg| arg_kind(arg).gtype()));

                output.push_str(&format!(
                    "  g_signal_new (\"handle-{}\",\n",
                    method.ext.names.name_hyphen
                ));
                output.push_str("    G_TYPE_FROM_INTERFACE (iface),\n");
                output.push_str("    G_SIGNAL_RUN_LAST,\n");
                output.push_str(&format!(
                    "    G_STRUCT_OFFSET ({camel}Iface, handle_{}),\n",
                    f.name()
                ));
                output.push_str("    g_signal_accumulator_true_handled,\n");
                output.push_str("    NULL,\n");
                output.push_str("    g_cclosure_marshal_generic,\n");
                output.push_str("    G_TYPE_BOOLEAN,\n");
                output.push_str(&format!(
                    "    {}, {});\n\n",
                    gtypes.len(),
                    gtypes.join(", ")
                ));
            }
        }

        if !self.iface.signals.is_empty() {
            output.push_str("  /* GObject signals for received D-Bus signals: */\n");
            for signal in &self.iface.signals {
                let gtypes: Vec<&str> = signal.args.iter().map(|arg| arg_kind(arg).gtype()).collect();
                output.push_str(&format!("  g_signal_new (\"{}\",\n", signal.ext.names.name_hyphen));
                output.push_str("    G_TYPE_FROM_INTERFACE (iface),\n");
                output.push_str("    G_SIGNAL_RUN_LAST,\n");
                output.push_str(&format!(
                    "    G_STRUCT_OFFSET ({camel}Iface, {}),\n",
                    signal.ext.names.name_lower
                ));
                output.push_str("    NULL,\n");
                output.push_str("    NULL,\n");
                output.push_str("    g_cclosure_marshal_generic,\n");
                output.push_str("    G_TYPE_NONE,\n");
                if gtypes.is_empty() {
                    output.push_str("    0);\n\n");
                } else {
                    output.push_str(&format!("    {}, {});\n\n", gtypes.len(), gtypes.join(", ")));
                }
            }
        }

        if !self.iface.properties.is_empty() {
            output.push_str("  /* GObject properties for D-Bus properties: */\n");
            for property in &self.iface.properties {
                let spec = property_kind(property).param_spec(
                    &property.ext.names.name_hyphen,
                    &property.name,
                    &property.signature,
                    "G_PARAM_READWRITE | G_PARAM_STATIC_STRINGS",
                );
                output.push_str("  g_object_interface_install_property (iface,\n");
                output.push_str(&format!("    {spec});\n"));
            }
        }

        output.push_str("}\n\n");
        output
    }

    fn generate_property_accessors(&self, property: &PropertyInfo) -> String {
        let mut output = String::new();
        let kind = property_kind(property);
        let camel = &self.iface.ext.camel_name;
        let lower = self.lower();
        let name = &property.ext.names.name_lower;
        let hyphen = &property.ext.names.name_hyphen;
        let since = property.ext.since.as_deref();
        let deprecated = self.iface.ext.deprecated || property.ext.deprecated;

        output.push_str(&gtk_doc(
            &format!("{lower}_get_{name}"),
            &format!(
                "Gets the value of the <link linkend=\"gdbus-property-{}.{}\">\"{}\"</link> D-Bus property.",
                self.iface.name.replace('.', "-"),
                property.name,
                property.name
            ),
            Some("Returns: The property value."),
            since,
            deprecated,
        ));
        output.push_str(kind.ctype_in());
        output.push('\n');
        output.push_str(&format!("{lower}_get_{name} ({camel} *object)\n"));
        output.push_str("{\n");
        output.push_str(&format!(
            "  g_return_val_if_fail ({} (object), {});\n\n",
            self.macros.is,
            kind.default_value()
        ));
        output.push_str(&format!(
            "  return {}_GET_IFACE (object)->get_{name} (object);\n",
            self.macros.cast
        ));
        output.push_str("}\n\n");

        if let Some(dup) = kind.ctype_dup() {
            output.push_str(&gtk_doc(
                &format!("{lower}_dup_{name}"),
                &format!(
                    "Gets a copy of the <link linkend=\"gdbus-property-{}.{}\">\"{}\"</link> D-Bus property.",
                    self.iface.name.replace('.', "-"),
                    property.name,
                    property.name
                ),
                Some("Returns: (transfer full) (nullable): The property value or %NULL if the property is not set."),
                since,
                deprecated,
            ));
            output.push_str(dup);
            output.push('\n');
            output.push_str(&format!("{lower}_dup_{name} ({camel} *object)\n"));
            output.push_str("{\n");
            output.push_str(&format!("  {dup}value;\n"));
            output.push_str(&format!(
                "  g_object_get (G_OBJECT (object), \"{hyphen}\", &value, NULL);\n"
            ));
            output.push_str("  return value;\n");
            output.push_str("}\n\n");
        }

        output.push_str("void\n");
        output.push_str(&format!(
            "{lower}_set_{name} ({camel} *object, {}value)\n",
            kind.ctype_in()
        ));
        output.push_str("{\n");
        output.push_str(&format!(
            "  g_object_set (G_OBJECT (object), \"{hyphen}\", value, NULL);\n"
        ));
        output.push_str("}\n\n");

        output
    }

    fn generate_signal_emitter(&self, signal: &SignalInfo) -> String {
        let mut output = String::new();
        let camel = &self.iface.ext.camel_name;
        let lower = self.lower();

        let mut params = vec![format!("{camel} *object")];
        params.extend(
            signal
                .args
                .iter()
                .map(|arg| format!("{}arg_{}", arg_kind(arg).ctype_in(), arg.name)),
        );

        output.push_str(&gtk_doc(
            &format!("{lower}_emit_{}", signal.ext.names.name_lower),
            &format!(
                "Emits the <link linkend=\"gdbus-signal-{}.{}\">\"{}\"</link> D-Bus signal.",
                self.iface.name.replace('.', "-"),
                signal.name,
                signal.name
            ),
            None,
            signal.ext.since.as_deref(),
            self.iface.ext.deprecated || signal.ext.deprecated,
        ));
        output.push_str("void\n");
        output.push_str(&format!(
            "{lower}_emit_{} {}\n",
            signal.ext.names.name_lower,
            param_list(&params)
        ));
        output.push_str("{\n");
        output.push_str(&format!(
            "  g_signal_emit_by_name (object, \"{}\"",
            signal.ext.names.name_hyphen
        ));
        for arg in &signal.args {
            output.push_str(&format!(", arg_{}", arg.name));
        }
        output.push_str(");\n");
        output.push_str("}\n\n");

        output
    }

    /// Generates the asynchronous, finish and synchronous call wrappers.
    fn generate_method_calls(&self, method: &MethodInfo) -> String {
        let mut output = String::new();
        let f = MethodFunctions::new(self.iface, method, self.policy);
        let lower = self.lower();
        let (flags, timeout) = if f.call_flags {
            ("call_flags", "timeout_msec")
        } else {
            ("G_DBUS_CALL_FLAGS_NONE", "-1")
        };
        let proxy_call = if f.fd_list {
            "g_dbus_proxy_call_with_unix_fd_list"
        } else {
            "g_dbus_proxy_call"
        };
        let since = method.ext.since.as_deref();
        let deprecated = self.iface.ext.deprecated || method.ext.deprecated;
        let link = format!(
            "<link linkend=\"gdbus-method-{}.{}\">{}()</link>",
            self.iface.name.replace('.', "-"),
            method.name,
            method.name
        );

        output.push_str(&gtk_doc(
            &format!("{lower}_call_{}", f.name()),
            &format!("Asynchronously invokes the {link} D-Bus method on @proxy."),
            None,
            since,
            deprecated,
        ));
        output.push_str("void\n");
        output.push_str(&format!(
            "{lower}_call_{} {}\n",
            f.name(),
            param_list(&f.call_params())
        ));
        output.push_str("{\n");
        output.push_str(&format!("  {proxy_call} (G_DBUS_PROXY (proxy),\n"));
        output.push_str(&format!("    \"{}\",\n", method.name));
        output.push_str(&format!("    {},\n", variant_new(&method.in_args, "arg_")));
        output.push_str(&format!("    {flags},\n"));
        output.push_str(&format!("    {timeout},\n"));
        if f.fd_list {
            output.push_str("    fd_list,\n");
        }
        output.push_str("    cancellable,\n");
        output.push_str("    callback,\n");
        output.push_str("    user_data);\n");
        output.push_str("}\n\n");

        output.push_str(&gtk_doc(
            &format!("{lower}_call_{}_finish", f.name()),
            &format!("Finishes an operation started with {lower}_call_{}().", f.name()),
            Some("Returns: (skip): %TRUE if the call succeeded, %FALSE if @error is set."),
            since,
            deprecated,
        ));
        output.push_str("gboolean\n");
        output.push_str(&format!(
            "{lower}_call_{}_finish {}\n",
            f.name(),
            param_list(&f.finish_params())
        ));
        output.push_str("{\n");
        output.push_str("  GVariant *_ret;\n");
        if f.fd_list {
            output.push_str(&format!(
                "  _ret = {proxy_call}_finish (G_DBUS_PROXY (proxy), out_fd_list, res, error);\n"
            ));
        } else {
            output.push_str(&format!(
                "  _ret = {proxy_call}_finish (G_DBUS_PROXY (proxy), res, error);\n"
            ));
        }
        output.push_str(&unpack_reply(&method.out_args));
        output.push_str("}\n\n");

        output.push_str(&gtk_doc(
            &format!("{lower}_call_{}_sync", f.name()),
            &format!("Synchronously invokes the {link} D-Bus method on @proxy. The calling thread is blocked until a reply is received."),
            Some("Returns: (skip): %TRUE if the call succeeded, %FALSE if @error is set."),
            since,
            deprecated,
        ));
        output.push_str("gboolean\n");
        output.push_str(&format!(
            "{lower}_call_{}_sync {}\n",
            f.name(),
            param_list(&f.sync_params())
        ));
        output.push_str("{\n");
        output.push_str("  GVariant *_ret;\n");
        output.push_str(&format!("  _ret = {proxy_call}_sync (G_DBUS_PROXY (proxy),\n"));
        output.push_str(&format!("    \"{}\",\n", method.name));
        output.push_str(&format!("    {},\n", variant_new(&method.in_args, "arg_")));
        output.push_str(&format!("    {flags},\n"));
        output.push_str(&format!("    {timeout},\n"));
        if f.fd_list {
            output.push_str("    fd_list,\n");
            output.push_str("    out_fd_list,\n");
        }
        output.push_str("    cancellable,\n");
        output.push_str("    error);\n");
        output.push_str(&unpack_reply(&method.out_args));
        output.push_str("}\n\n");

        output
    }

    /// Generates the server-side reply helper.
    fn generate_complete(&self, method: &MethodInfo) -> String {
        let mut output = String::new();
        let f = MethodFunctions::new(self.iface, method, self.policy);
        let lower = self.lower();

        let mut params = f.complete_params();
        if let Some(object) = params.first_mut() {
            object.push_str(" G_GNUC_UNUSED");
        }

        output.push_str(&gtk_doc(
            &format!("{lower}_complete_{}", f.name()),
            &format!(
                "Helper function used in service implementations to finish handling invocations of the <link linkend=\"gdbus-method-{}.{}\">{}()</link> D-Bus method.",
                self.iface.name.replace('.', "-"),
                method.name,
                method.name
            ),
            Some("This method will free @invocation, you cannot use it afterwards."),
            method.ext.since.as_deref(),
            self.iface.ext.deprecated || method.ext.deprecated,
        ));
        output.push_str("void\n");
        output.push_str(&format!(
            "{lower}_complete_{} {}\n",
            f.name(),
            param_list(&params)
        ));
        output.push_str("{\n");
        if f.fd_list {
            output.push_str("  g_dbus_method_invocation_return_value_with_unix_fd_list (invocation,\n");
            output.push_str(&format!("    {},\n", variant_new(&method.out_args, "")));
            output.push_str("    fd_list);\n");
        } else {
            output.push_str("  g_dbus_method_invocation_return_value (invocation,\n");
            output.push_str(&format!("    {});\n", variant_new(&method.out_args, "")));
        }
        output.push_str("}\n\n");

        output
    }
}

fn c_bool(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

/// Builds a `g_variant_new` call packing `args` named with `prefix`.
fn variant_new(args: &[ArgInfo], prefix: &str) -> String {
    let mut call = format!("g_variant_new (\"{}\"", tuple_format(args));
    for arg in args {
        call.push_str(&format!(",\n                   {prefix}{}", arg.name));
    }
    call.push(')');
    call
}

/// Generates the tail of a `finish`/`sync` wrapper unpacking a reply.
fn unpack_reply(out_args: &[ArgInfo]) -> String {
    let mut output = String::new();
    output.push_str("  if (_ret == NULL)\n");
    output.push_str("    goto _out;\n");
    output.push_str("  g_variant_get (_ret,\n");
    output.push_str(&format!("                 \"{}\"", tuple_format(out_args)));
    for arg in out_args {
        output.push_str(&format!(",\n                 out_{}", arg.name));
    }
    output.push_str(");\n");
    output.push_str("  g_variant_unref (_ret);\n");
    output.push_str("_out:\n");
    output.push_str("  return _ret != NULL;\n");
    output
}

/// Emits a NULL-terminated pointer array and returns the expression
/// referring to it, or `NULL` when there are no entries.
fn pointer_array(
    output: &mut String,
    info_type: &str,
    prefix: &str,
    entries: impl Iterator<Item = String>,
) -> String {
    let entries: Vec<String> = entries.collect();
    if entries.is_empty() {
        return "NULL".to_string();
    }

    output.push_str(&format!(
        "static const {info_type} * const {prefix}_pointers[] =\n"
    ));
    output.push_str("{\n");
    for entry in &entries {
        output.push_str(&format!("  &{entry}.parent_struct,\n"));
    }
    output.push_str("  NULL\n");
    output.push_str("};\n\n");

    format!("({info_type} **) &{prefix}_pointers")
}

/// Emits argument infos and returns the expression referring to them.
fn arg_infos(output: &mut String, prefix: &str, args: &[ArgInfo]) -> String {
    for arg in args {
        let name = format!("{prefix}_{}", arg.name);
        let annotations = annotation_infos(output, &name, &arg.annotations);
        output.push_str(&format!("static const _ExtendedGDBusArgInfo {name} =\n"));
        output.push_str("{\n");
        output.push_str("  {\n");
        output.push_str("    -1,\n");
        output.push_str(&format!("    (gchar *) \"{}\",\n", arg.name));
        output.push_str(&format!("    (gchar *) \"{}\",\n", arg.signature));
        output.push_str(&format!("    {annotations}\n"));
        output.push_str("  },\n");
        output.push_str(&format!("  {}\n", c_bool(arg.ext.use_gvariant)));
        output.push_str("};\n\n");
    }
    pointer_array(
        output,
        "GDBusArgInfo",
        prefix,
        args.iter().map(|arg| format!("{prefix}_{}", arg.name)),
    )
}

/// Emits annotation infos, nested ones first, and returns the expression
/// referring to them.
fn annotation_infos(output: &mut String, prefix: &str, annotations: &[Annotation]) -> String {
    if annotations.is_empty() {
        return "NULL".to_string();
    }

    let prefix = format!("{prefix}_annotation_info");
    for (index, annotation) in annotations.iter().enumerate() {
        let name = format!("{prefix}_{index}");
        let nested = annotation_infos(output, &name, &annotation.annotations);
        output.push_str(&format!("static const GDBusAnnotationInfo {name} =\n"));
        output.push_str("{\n");
        output.push_str("  -1,\n");
        output.push_str(&format!("  (gchar *) \"{}\",\n", c_escape(&annotation.name)));
        output.push_str(&format!("  (gchar *) \"{}\",\n", c_escape(&annotation.value)));
        output.push_str(&format!("  {nested}\n"));
        output.push_str("};\n\n");
    }

    output.push_str(&format!(
        "static const GDBusAnnotationInfo * const {prefix}_pointers[] =\n"
    ));
    output.push_str("{\n");
    for index in 0..annotations.len() {
        output.push_str(&format!("  &{prefix}_{index},\n"));
    }
    output.push_str("  NULL\n");
    output.push_str("};\n\n");

    format!("(GDBusAnnotationInfo **) &{prefix}_pointers")
}

/// Formats a gtk-doc comment block.
fn gtk_doc(
    symbol: &str,
    description: &str,
    returns: Option<&str>,
    since: Option<&str>,
    deprecated: bool,
) -> String {
    let mut output = String::new();
    output.push_str("/**\n");
    output.push_str(&format!(" * {symbol}:\n"));
    output.push_str(" *\n");
    output.push_str(&format!(" * {description}\n"));
    if let Some(returns) = returns {
        output.push_str(" *\n");
        output.push_str(&format!(" * {returns}\n"));
    }
    if let Some(since) = since {
        output.push_str(" *\n");
        output.push_str(&format!(" * Since: {since}\n"));
    }
    if deprecated {
        output.push_str(" *\n");
        output.push_str(" * Deprecated: The D-Bus member has been deprecated.\n");
    }
    output.push_str(" */\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbusgen_schema::{InterfaceIr, IrOptions, parse_document};

    fn sorted(xml: &str) -> SortedIr {
        let node = parse_document(xml).expect("parse");
        SortedIr::from_ir(InterfaceIr::build(&[node], &IrOptions::default()).expect("ir"))
    }

    const COYOTE: &str = r#"<node>
        <interface name="com.acme.Coyote">
          <method name="Run">
            <arg name="speed" direction="in" type="d"/>
            <arg name="distance" direction="out" type="u"/>
          </method>
          <method name="Attack">
            <annotation name="org.freedesktop.DBus.Deprecated" value="true"/>
            <arg name="target" direction="in" type="(si)"/>
          </method>
          <signal name="Surprised">
            <arg name="level" type="u"/>
          </signal>
          <property name="Mood" type="s" access="read"/>
          <property name="Speed" type="d" access="readwrite">
            <annotation name="org.freedesktop.DBus.Property.EmitsChangedSignal" value="false"/>
          </property>
        </interface>
      </node>"#;

    #[test]
    fn test_empty_body() {
        let body = BodyGenerator::new("stdout").generate(&sorted(""), &VersionPolicy::default());
        let expected = format!(
            "{TOP_COMMENT}\n\n{CONFIG_H_INCLUDE}\n\n#include \"stdout.h\"\n\n{HEADER_INCLUDES}\n\n{TYPEDEFS_AND_HELPERS}"
        );
        assert_eq!(body.trim(), expected);
    }

    #[test]
    fn test_helpers_emitted_once() {
        let xml = r#"<node>
            <interface name="com.acme.Coyote"><method name="Run"/></interface>
            <interface name="org.project.Bar.Frobnicator"><method name="RandomMethod"/></interface>
          </node>"#;
        let body = BodyGenerator::new("out.c").generate(&sorted(xml), &VersionPolicy::default());
        assert_eq!(body.matches("} _ExtendedGDBusArgInfo;").count(), 1);
        assert_eq!(body.matches("_g_value_equal (const GValue *a").count(), 1);
        assert!(body.contains("#include \"out.h\""));
    }

    #[test]
    fn test_introspection_data() {
        let body = BodyGenerator::new("coyote.c").generate(&sorted(COYOTE), &VersionPolicy::default());
        assert!(body.contains("static const _ExtendedGDBusArgInfo _com_acme_coyote_method_info_run_IN_ARG_speed ="));
        assert!(body.contains("(GDBusArgInfo **) &_com_acme_coyote_method_info_run_OUT_ARG_pointers"));
        assert!(body.contains("  \"handle-run\",\n  FALSE\n};"));
        assert!(body.contains("(gchar *) \"(si)\",\n    NULL\n  },\n  TRUE\n};"));
        assert!(body.contains("static const GDBusAnnotationInfo _com_acme_coyote_method_info_attack_annotation_info_0 ="));
        assert!(body.contains("  \"speed\",\n  FALSE,\n  FALSE\n};"));
        assert!(body.contains("  \"mood\",\n  FALSE,\n  TRUE\n};"));
        assert!(body.contains("G_DBUS_PROPERTY_INFO_FLAGS_READABLE | G_DBUS_PROPERTY_INFO_FLAGS_WRITABLE"));
        assert!(body.contains("static const _ExtendedGDBusInterfaceInfo _com_acme_coyote_interface_info ="));
        assert!(body.contains("  \"com-acme-coyote\",\n};"));
    }

    #[test]
    fn test_interface_type() {
        let body = BodyGenerator::new("coyote.c").generate(&sorted(COYOTE), &VersionPolicy::default());
        assert!(body.contains("G_DEFINE_INTERFACE (ComAcmeCoyote, com_acme_coyote, G_TYPE_OBJECT)"));
        assert!(body.contains("  g_signal_new (\"handle-run\","));
        assert!(body.contains("    2, G_TYPE_DBUS_METHOD_INVOCATION, G_TYPE_DOUBLE);"));
        assert!(body.contains("    1, G_TYPE_UINT);"));
        assert!(body.contains("g_param_spec_string (\"mood\", \"Mood\", \"Mood\", NULL, G_PARAM_READWRITE | G_PARAM_STATIC_STRINGS)"));
        assert!(body.contains("g_object_class_override_property (klass, property_id_begin++, \"speed\");"));
    }

    #[test]
    fn test_method_wrappers() {
        let body = BodyGenerator::new("coyote.c").generate(&sorted(COYOTE), &VersionPolicy::default());
        assert!(body.contains("  g_dbus_proxy_call (G_DBUS_PROXY (proxy),\n    \"Run\",\n    g_variant_new (\"(d)\",\n                   arg_speed),\n    G_DBUS_CALL_FLAGS_NONE,\n    -1,\n"));
        assert!(body.contains("  g_variant_get (_ret,\n                 \"(u)\",\n                 out_distance);"));
        assert!(body.contains("  g_dbus_method_invocation_return_value (invocation,\n    g_variant_new (\"(u)\",\n                   distance));"));
        assert!(body.contains("ComAcmeCoyote *object G_GNUC_UNUSED,"));
        assert!(body.contains("_com_acme_coyote_method_info_attack_IN_ARG_target"));
    }

    #[test]
    fn test_method_wrappers_with_new_policy() {
        let policy = VersionPolicy::resolve(Some("2.64"), None).expect("policy");
        let xml = r#"<node><interface name="FDPassing">
            <method name="NoAnnotation">
              <arg name="greeting" direction="in" type="h"/>
            </method>
          </interface></node>"#;
        let body = BodyGenerator::new("fd.c").generate(&sorted(xml), &policy);
        assert!(body.contains("  g_dbus_proxy_call_with_unix_fd_list (G_DBUS_PROXY (proxy),"));
        assert!(body.contains("    call_flags,\n    timeout_msec,\n    fd_list,\n"));
        assert!(body.contains("  \"handle-no-annotation\",\n  TRUE\n};"));
        assert!(body.contains("g_dbus_method_invocation_return_value_with_unix_fd_list"));
        assert!(body.contains("3, G_TYPE_DBUS_METHOD_INVOCATION, G_TYPE_UNIX_FD_LIST, G_TYPE_INT);"));
    }

    #[test]
    fn test_gtk_doc() {
        let doc = gtk_doc("foo_get_bar", "Gets bar.", None, Some("2.64"), true);
        assert_eq!(
            doc,
            "/**\n * foo_get_bar:\n *\n * Gets bar.\n *\n * Since: 2.64\n *\n * Deprecated: The D-Bus member has been deprecated.\n */\n"
        );
    }
}
