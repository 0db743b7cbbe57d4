//! C header generation.

use super::proxy::ProxyEmitter;
use super::skeleton::SkeletonEmitter;
use super::{MethodFunctions, TypeMacros, arg_kind, deprecation, include_guard, param_list, property_kind};
use crate::generator::{Artifact, Emit};
use crate::templates::TOP_COMMENT;
use crate::version::VersionPolicy;
use dbusgen_schema::SortedIr;
use dbusgen_schema::ir::InterfaceInfo;

/// Generator for the declarations of every interface.
pub struct HeaderGenerator {
    output_name: String,
}

impl HeaderGenerator {
    /// Creates a header generator for a file named `output_name`.
    #[must_use]
    pub fn new(output_name: impl Into<String>) -> Self {
        Self {
            output_name: output_name.into(),
        }
    }

    /// Generates the complete header.
    #[must_use]
    pub fn generate(&self, ir: &SortedIr, policy: &VersionPolicy) -> String {
        let mut output = String::new();
        let guard = include_guard(&self.output_name);

        output.push_str(TOP_COMMENT);
        output.push_str("\n\n");
        output.push_str(&format!("#ifndef {guard}\n"));
        output.push_str(&format!("#define {guard}\n\n"));
        output.push_str("#include <gio/gio.h>\n\n");
        output.push_str("G_BEGIN_DECLS\n\n");

        for iface in ir.interfaces() {
            output.push_str(&self.generate_interface(iface, policy));
            output.push_str(&ProxyEmitter::new(iface).declarations());
            output.push_str(&SkeletonEmitter::new(iface).declarations());
        }

        output.push_str("\nG_END_DECLS\n\n");
        output.push_str(&format!("#endif /* {guard} */\n"));

        output
    }

    /// Generates the interface type, its vtable and the accessor prototypes.
    fn generate_interface(&self, iface: &InterfaceInfo, policy: &VersionPolicy) -> String {
        let mut output = String::new();
        let m = TypeMacros::interface(&iface.ext);
        let camel = &iface.ext.camel_name;
        let lower = &iface.ext.name_lower;

        output.push_str("\n/* ------------------------------------------------------------------------ */\n");
        output.push_str(&format!("/* Declarations for {} */\n\n", iface.name));

        output.push_str(&format!("#define {} ({lower}_get_type ())\n", m.type_id));
        output.push_str(&format!(
            "#define {}(o) (G_TYPE_CHECK_INSTANCE_CAST ((o), {}, {camel}))\n",
            m.cast, m.type_id
        ));
        output.push_str(&format!(
            "#define {}(o) (G_TYPE_CHECK_INSTANCE_TYPE ((o), {}))\n",
            m.is, m.type_id
        ));
        output.push_str(&format!(
            "#define {}_GET_IFACE(o) (G_TYPE_INSTANCE_GET_INTERFACE ((o), {}, {camel}Iface))\n\n",
            m.cast, m.type_id
        ));

        output.push_str(&format!("struct _{camel};\n"));
        output.push_str(&format!("typedef struct _{camel} {camel};\n"));
        output.push_str(&format!("typedef struct _{camel}Iface {camel}Iface;\n\n"));

        output.push_str(&self.generate_vtable(iface, policy));

        output.push_str("#if GLIB_CHECK_VERSION(2, 44, 0)\n");
        output.push_str(&format!("G_DEFINE_AUTOPTR_CLEANUP_FUNC ({camel}, g_object_unref)\n"));
        output.push_str("#endif\n\n");

        output.push_str(&format!("GType {lower}_get_type (void) G_GNUC_CONST;\n\n"));
        output.push_str(&format!("GDBusInterfaceInfo *{lower}_interface_info (void);\n"));
        output.push_str(&format!(
            "guint {lower}_override_properties (GObjectClass *klass, guint property_id_begin);\n\n\n"
        ));

        if !iface.methods.is_empty() {
            output.push_str("/* D-Bus method call completion functions: */\n");
            for method in &iface.methods {
                let f = MethodFunctions::new(iface, method, policy);
                output.push_str(&format!(
                    "{}void {lower}_complete_{} {};\n\n",
                    deprecation(iface, method.ext.deprecated),
                    f.name(),
                    param_list(&f.complete_params())
                ));
            }
            output.push('\n');
        }

        if !iface.signals.is_empty() {
            output.push_str("/* D-Bus signal emissions functions: */\n");
            for signal in &iface.signals {
                let mut params = vec![format!("{camel} *object")];
                params.extend(
                    signal
                        .args
                        .iter()
                        .map(|arg| format!("{}arg_{}", arg_kind(arg).ctype_in(), arg.name)),
                );
                output.push_str(&format!(
                    "{}void {lower}_emit_{} {};\n\n",
                    deprecation(iface, signal.ext.deprecated),
                    signal.ext.names.name_lower,
                    param_list(&params)
                ));
            }
            output.push('\n');
        }

        if !iface.methods.is_empty() {
            output.push_str("/* D-Bus method calls: */\n");
            for method in &iface.methods {
                let f = MethodFunctions::new(iface, method, policy);
                let dep = deprecation(iface, method.ext.deprecated);
                output.push_str(&format!(
                    "{dep}void {lower}_call_{} {};\n\n",
                    f.name(),
                    param_list(&f.call_params())
                ));
                output.push_str(&format!(
                    "{dep}gboolean {lower}_call_{}_finish {};\n\n",
                    f.name(),
                    param_list(&f.finish_params())
                ));
                output.push_str(&format!(
                    "{dep}gboolean {lower}_call_{}_sync {};\n\n",
                    f.name(),
                    param_list(&f.sync_params())
                ));
            }
            output.push('\n');
        }

        if !iface.properties.is_empty() {
            output.push_str("/* D-Bus property accessors: */\n");
            for property in &iface.properties {
                let kind = property_kind(property);
                let name = &property.ext.names.name_lower;
                let dep = deprecation(iface, property.ext.deprecated);
                output.push_str(&format!(
                    "{dep}{}{lower}_get_{name} ({camel} *object);\n",
                    kind.ctype_in()
                ));
                if let Some(dup) = kind.ctype_dup() {
                    output.push_str(&format!("{dep}{dup}{lower}_dup_{name} ({camel} *object);\n"));
                }
                output.push_str(&format!(
                    "{dep}void {lower}_set_{name} ({camel} *object, {}value);\n\n",
                    kind.ctype_in()
                ));
            }
            output.push('\n');
        }

        output
    }

    /// Generates the `*Iface` class structure.
    fn generate_vtable(&self, iface: &InterfaceInfo, policy: &VersionPolicy) -> String {
        let mut output = String::new();
        let camel = &iface.ext.camel_name;

        output.push_str(&format!("struct _{camel}Iface\n"));
        output.push_str("{\n");
        output.push_str("  GTypeInterface parent_iface;\n\n");

        for method in &iface.methods {
            let f = MethodFunctions::new(iface, method, policy);
            output.push_str(&format!(
                "  gboolean (*handle_{}) {};\n\n",
                f.name(),
                param_list(&f.handler_params())
            ));
        }

        for property in &iface.properties {
            output.push_str(&format!(
                "  {} (*get_{}) ({camel} *object);\n\n",
                property_kind(property).ctype_in().trim_end(),
                property.ext.names.name_lower
            ));
        }

        for signal in &iface.signals {
            let mut params = vec![format!("{camel} *object")];
            params.extend(
                signal
                    .args
                    .iter()
                    .map(|arg| format!("{}arg_{}", arg_kind(arg).ctype_in(), arg.name)),
            );
            output.push_str(&format!(
                "  void (*{}) {};\n\n",
                signal.ext.names.name_lower,
                param_list(&params)
            ));
        }

        output.push_str("};\n\n");
        output
    }
}

impl Emit for HeaderGenerator {
    fn emit(&self, ir: &SortedIr, policy: &VersionPolicy) -> Vec<Artifact> {
        vec![Artifact::new(self.output_name.clone(), self.generate(ir, policy))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbusgen_schema::{InterfaceIr, IrOptions, parse_document};

    fn sorted(xml: &str) -> SortedIr {
        let node = parse_document(xml).expect("parse");
        SortedIr::from_ir(InterfaceIr::build(&[node], &IrOptions::default()).expect("ir"))
    }

    #[test]
    fn test_empty_header() {
        let header = HeaderGenerator::new("stdout").generate(&sorted(""), &VersionPolicy::default());
        let expected = format!(
            "{TOP_COMMENT}\n\n#ifndef __STDOUT__\n#define __STDOUT__\n\n#include <gio/gio.h>\n\nG_BEGIN_DECLS\n\n\nG_END_DECLS\n\n#endif /* __STDOUT__ */"
        );
        assert_eq!(header.trim(), expected);
    }

    #[test]
    fn test_interface_declarations() {
        let ir = sorted(
            r#"<node>
                 <interface name="com.acme.Coyote">
                   <method name="Run">
                     <arg name="speed" direction="in" type="d"/>
                     <arg name="distance" direction="out" type="u"/>
                   </method>
                   <signal name="Surprised"/>
                   <property name="Mood" type="s" access="read"/>
                 </interface>
               </node>"#,
        );
        let header = HeaderGenerator::new("coyote.h").generate(&ir, &VersionPolicy::default());

        assert!(header.contains("#ifndef __COYOTE_H__"));
        assert!(header.contains("#define TYPE_COM_ACME_COYOTE (com_acme_coyote_get_type ())"));
        assert!(header.contains("struct _ComAcmeCoyoteIface\n{\n  GTypeInterface parent_iface;"));
        assert!(header.contains(
            "  gboolean (*handle_run) (\n    ComAcmeCoyote *object,\n    GDBusMethodInvocation *invocation,\n    gdouble arg_speed);"
        ));
        assert!(header.contains("  const gchar * (*get_mood) (ComAcmeCoyote *object);"));
        assert!(header.contains("  void (*surprised) (\n    ComAcmeCoyote *object);"));
        assert!(header.contains(
            "void com_acme_coyote_complete_run (\n    ComAcmeCoyote *object,\n    GDBusMethodInvocation *invocation,\n    guint distance);"
        ));
        assert!(header.contains("gboolean com_acme_coyote_call_run_sync (\n    ComAcmeCoyote *proxy,\n    gdouble arg_speed,\n    guint *out_distance,"));
        assert!(header.contains("const gchar *com_acme_coyote_get_mood (ComAcmeCoyote *object);"));
        assert!(header.contains("gchar *com_acme_coyote_dup_mood (ComAcmeCoyote *object);"));
        assert!(header.contains("void com_acme_coyote_set_mood (ComAcmeCoyote *object, const gchar *value);"));
        assert!(header.contains("void com_acme_coyote_emit_surprised (\n    ComAcmeCoyote *object);"));
    }

    #[test]
    fn test_deprecated_members() {
        let ir = sorted(
            r#"<node>
                 <interface name="com.acme.Coyote">
                   <method name="Run">
                     <annotation name="org.freedesktop.DBus.Deprecated" value="true"/>
                   </method>
                   <method name="Sleep"/>
                 </interface>
               </node>"#,
        );
        let header = HeaderGenerator::new("coyote.h").generate(&ir, &VersionPolicy::default());
        assert!(header.contains("G_GNUC_DEPRECATED void com_acme_coyote_call_run ("));
        assert!(header.contains("\nvoid com_acme_coyote_call_sleep ("));
    }

    #[test]
    fn test_emit_names_artifact() {
        let artifacts = HeaderGenerator::new("out.h").emit(&sorted(""), &VersionPolicy::default());
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "out.h");
    }
}
