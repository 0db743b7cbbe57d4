//! Client-side proxy class.

use super::{TypeMacros, deprecation, param_list, property_kind};
use super::types::CKind;
use dbusgen_schema::ir::InterfaceInfo;

const NEW_PARAMS: [&str; 7] = [
    "GDBusConnection     *connection",
    "GDBusProxyFlags      flags",
    "const gchar         *name",
    "const gchar         *object_path",
    "GCancellable        *cancellable",
    "GAsyncReadyCallback  callback",
    "gpointer             user_data",
];

const NEW_SYNC_PARAMS: [&str; 6] = [
    "GDBusConnection     *connection",
    "GDBusProxyFlags      flags",
    "const gchar         *name",
    "const gchar         *object_path",
    "GCancellable        *cancellable",
    "GError             **error",
];

const NEW_FOR_BUS_PARAMS: [&str; 7] = [
    "GBusType             bus_type",
    "GDBusProxyFlags      flags",
    "const gchar         *name",
    "const gchar         *object_path",
    "GCancellable        *cancellable",
    "GAsyncReadyCallback  callback",
    "gpointer             user_data",
];

const NEW_FOR_BUS_SYNC_PARAMS: [&str; 6] = [
    "GBusType             bus_type",
    "GDBusProxyFlags      flags",
    "const gchar         *name",
    "const gchar         *object_path",
    "GCancellable        *cancellable",
    "GError             **error",
];

const NEW_FINISH_PARAMS: [&str; 2] = ["GAsyncResult        *res", "GError             **error"];

fn params(list: &[&str]) -> String {
    let owned: Vec<String> = list.iter().map(|p| (*p).to_string()).collect();
    param_list(&owned)
}

/// Emits declarations and definitions of the proxy class of an interface.
pub(crate) struct ProxyEmitter<'a> {
    iface: &'a InterfaceInfo,
    macros: TypeMacros,
    iface_macros: TypeMacros,
}

impl<'a> ProxyEmitter<'a> {
    /// Creates a proxy emitter.
    pub fn new(iface: &'a InterfaceInfo) -> Self {
        Self {
            iface,
            macros: TypeMacros::proxy(&iface.ext),
            iface_macros: TypeMacros::interface(&iface.ext),
        }
    }

    /// Generates the header declarations.
    pub fn declarations(&self) -> String {
        let mut output = String::new();
        let m = &self.macros;
        let camel = &self.iface.ext.camel_name;
        let dep = deprecation(self.iface, false);

        output.push_str("/* ---- */\n\n");
        output.push_str(&format!(
            "#define {} ({}_get_type ())\n",
            m.type_id, m.lower
        ));
        output.push_str(&format!(
            "#define {}(o) (G_TYPE_CHECK_INSTANCE_CAST ((o), {}, {}))\n",
            m.cast, m.type_id, m.camel
        ));
        output.push_str(&format!(
            "#define {}_CLASS(k) (G_TYPE_CHECK_CLASS_CAST ((k), {}, {}Class))\n",
            m.cast, m.type_id, m.camel
        ));
        output.push_str(&format!(
            "#define {}_GET_CLASS(o) (G_TYPE_INSTANCE_GET_CLASS ((o), {}, {}Class))\n",
            m.cast, m.type_id, m.camel
        ));
        output.push_str(&format!(
            "#define {}(o) (G_TYPE_CHECK_INSTANCE_TYPE ((o), {}))\n",
            m.is, m.type_id
        ));
        output.push_str(&format!(
            "#define {}_CLASS(k) (G_TYPE_CHECK_CLASS_TYPE ((k), {}))\n\n",
            m.is, m.type_id
        ));

        output.push_str(&format!("typedef struct _{0} {0};\n", m.camel));
        output.push_str(&format!("typedef struct _{0}Class {0}Class;\n", m.camel));
        output.push_str(&format!("typedef struct _{0}Private {0}Private;\n\n", m.camel));

        output.push_str(&format!("struct _{}\n", m.camel));
        output.push_str("{\n");
        output.push_str("  /*< private >*/\n");
        output.push_str("  GDBusProxy parent_instance;\n");
        output.push_str(&format!("  {}Private *priv;\n", m.camel));
        output.push_str("};\n\n");

        output.push_str(&format!("struct _{}Class\n", m.camel));
        output.push_str("{\n");
        output.push_str("  GDBusProxyClass parent_class;\n");
        output.push_str("};\n\n");

        output.push_str(&format!("GType {}_get_type (void) G_GNUC_CONST;\n\n", m.lower));

        output.push_str("#if GLIB_CHECK_VERSION(2, 44, 0)\n");
        output.push_str(&format!(
            "G_DEFINE_AUTOPTR_CLEANUP_FUNC ({}, g_object_unref)\n",
            m.camel
        ));
        output.push_str("#endif\n\n");

        output.push_str(&format!("{dep}void {}_new {};\n", m.lower, params(&NEW_PARAMS)));
        output.push_str(&format!(
            "{dep}{camel} *{}_new_finish {};\n",
            m.lower,
            params(&NEW_FINISH_PARAMS)
        ));
        output.push_str(&format!(
            "{dep}{camel} *{}_new_sync {};\n\n",
            m.lower,
            params(&NEW_SYNC_PARAMS)
        ));
        output.push_str(&format!(
            "{dep}void {}_new_for_bus {};\n",
            m.lower,
            params(&NEW_FOR_BUS_PARAMS)
        ));
        output.push_str(&format!(
            "{dep}{camel} *{}_new_for_bus_finish {};\n",
            m.lower,
            params(&NEW_FINISH_PARAMS)
        ));
        output.push_str(&format!(
            "{dep}{camel} *{}_new_for_bus_sync {};\n\n\n",
            m.lower,
            params(&NEW_FOR_BUS_SYNC_PARAMS)
        ));

        output
    }

    /// Generates the body definitions.
    pub fn definitions(&self) -> String {
        let mut output = String::new();
        let m = &self.macros;

        output.push_str("/* ------------------------------------------------------------------------ */\n\n");
        output.push_str(&format!("struct _{}Private\n", m.camel));
        output.push_str("{\n");
        output.push_str("  GData *qdata;\n");
        output.push_str("};\n\n");

        output.push_str(&format!(
            "static void {}_iface_init ({}Iface *iface);\n\n",
            m.lower, self.iface.ext.camel_name
        ));
        output.push_str(&format!(
            "G_DEFINE_TYPE_WITH_CODE ({}, {}, G_TYPE_DBUS_PROXY,\n",
            m.camel, m.lower
        ));
        output.push_str(&format!("                         G_ADD_PRIVATE ({})\n", m.camel));
        output.push_str(&format!(
            "                         G_IMPLEMENT_INTERFACE ({}, {}_iface_init))\n\n",
            self.iface_macros.type_id, m.lower
        ));

        output.push_str("static void\n");
        output.push_str(&format!("{}_finalize (GObject *object)\n", m.lower));
        output.push_str("{\n");
        output.push_str(&format!("  {} *proxy = {} (object);\n", m.camel, m.cast));
        output.push_str("  g_datalist_clear (&proxy->priv->qdata);\n");
        output.push_str(&format!(
            "  G_OBJECT_CLASS ({}_parent_class)->finalize (object);\n",
            m.lower
        ));
        output.push_str("}\n\n");

        if !self.iface.properties.is_empty() {
            output.push_str(&self.generate_property_vfuncs());
        }
        output.push_str(&self.generate_g_signal());
        output.push_str(&self.generate_g_properties_changed());

        for property in &self.iface.properties {
            output.push_str(&self.generate_property_getter(property));
        }

        output.push_str(&self.generate_class_init());
        output.push_str(&self.generate_constructors());

        output
    }

    fn property_info(&self) -> String {
        format!(
            "  g_assert (prop_id != 0 && prop_id - 1 < {});\n  info = (const _ExtendedGDBusPropertyInfo *) _{}_property_info_pointers[prop_id - 1];\n",
            self.iface.properties.len(),
            self.iface.ext.name_lower
        )
    }

    /// Generates `get_property`/`set_property` backed by the property cache.
    fn generate_property_vfuncs(&self) -> String {
        let mut output = String::new();
        let lower = &self.macros.lower;

        output.push_str("static void\n");
        output.push_str(&format!("{lower}_get_property (GObject      *object,\n"));
        output.push_str("  guint         prop_id,\n");
        output.push_str("  GValue       *value,\n");
        output.push_str("  GParamSpec   *pspec G_GNUC_UNUSED)\n");
        output.push_str("{\n");
        output.push_str("  const _ExtendedGDBusPropertyInfo *info;\n");
        output.push_str("  GVariant *variant;\n");
        output.push_str(&self.property_info());
        output.push_str("  variant = g_dbus_proxy_get_cached_property (G_DBUS_PROXY (object), info->parent_struct.name);\n");
        output.push_str("  if (info->use_gvariant)\n");
        output.push_str("    {\n");
        output.push_str("      g_value_set_variant (value, variant);\n");
        output.push_str("    }\n");
        output.push_str("  else\n");
        output.push_str("    {\n");
        output.push_str("      if (variant != NULL)\n");
        output.push_str("        g_dbus_gvariant_to_gvalue (variant, value);\n");
        output.push_str("    }\n");
        output.push_str("  if (variant != NULL)\n");
        output.push_str("    g_variant_unref (variant);\n");
        output.push_str("}\n\n");

        output.push_str("static void\n");
        output.push_str(&format!("{lower}_set_property_cb (GDBusProxy *proxy,\n"));
        output.push_str("  GAsyncResult *res,\n");
        output.push_str("  gpointer      user_data)\n");
        output.push_str("{\n");
        output.push_str("  const _ExtendedGDBusPropertyInfo *info = user_data;\n");
        output.push_str("  GError *error;\n");
        output.push_str("  GVariant *_ret;\n");
        output.push_str("  error = NULL;\n");
        output.push_str("  _ret = g_dbus_proxy_call_finish (proxy, res, &error);\n");
        output.push_str("  if (!_ret)\n");
        output.push_str("    {\n");
        output.push_str(&format!(
            "      g_warning (\"Error setting property '%s' on interface {}: %s (%s, %d)\",\n",
            self.iface.name
        ));
        output.push_str("                 info->parent_struct.name,\n");
        output.push_str("                 error->message, g_quark_to_string (error->domain), error->code);\n");
        output.push_str("      g_error_free (error);\n");
        output.push_str("    }\n");
        output.push_str("  else\n");
        output.push_str("    {\n");
        output.push_str("      g_variant_unref (_ret);\n");
        output.push_str("    }\n");
        output.push_str("}\n\n");

        output.push_str("static void\n");
        output.push_str(&format!("{lower}_set_property (GObject      *object,\n"));
        output.push_str("  guint         prop_id,\n");
        output.push_str("  const GValue *value,\n");
        output.push_str("  GParamSpec   *pspec G_GNUC_UNUSED)\n");
        output.push_str("{\n");
        output.push_str("  const _ExtendedGDBusPropertyInfo *info;\n");
        output.push_str("  GVariant *variant;\n");
        output.push_str(&self.property_info());
        output.push_str("  variant = g_dbus_gvalue_to_gvariant (value, G_VARIANT_TYPE (info->parent_struct.signature));\n");
        output.push_str("  g_dbus_proxy_call (G_DBUS_PROXY (object),\n");
        output.push_str("    \"org.freedesktop.DBus.Properties.Set\",\n");
        output.push_str(&format!(
            "    g_variant_new (\"(ssv)\", \"{}\", info->parent_struct.name, variant),\n",
            self.iface.name
        ));
        output.push_str("    G_DBUS_CALL_FLAGS_NONE,\n");
        output.push_str("    -1,\n");
        output.push_str(&format!(
            "    NULL, (GAsyncReadyCallback) {lower}_set_property_cb, (GDBusPropertyInfo *) &info->parent_struct);\n"
        ));
        output.push_str("  g_variant_unref (variant);\n");
        output.push_str("}\n\n");

        output
    }

    /// Generates the handler turning received signals into GObject signals.
    fn generate_g_signal(&self) -> String {
        let mut output = String::new();
        let type_id = &self.iface_macros.type_id;

        output.push_str("static void\n");
        output.push_str(&format!("{}_g_signal (GDBusProxy *proxy,\n", self.macros.lower));
        output.push_str("  const gchar *sender_name G_GNUC_UNUSED,\n");
        output.push_str("  const gchar *signal_name,\n");
        output.push_str("  GVariant *parameters)\n");
        output.push_str("{\n");
        output.push_str("  _ExtendedGDBusSignalInfo *info;\n");
        output.push_str("  GVariantIter iter;\n");
        output.push_str("  GVariant *child;\n");
        output.push_str("  GValue *paramv;\n");
        output.push_str("  gsize num_params;\n");
        output.push_str("  gsize n;\n");
        output.push_str("  guint signal_id;\n");
        output.push_str(&format!(
            "  info = (_ExtendedGDBusSignalInfo *) g_dbus_interface_info_lookup_signal ((GDBusInterfaceInfo *) &_{}_interface_info.parent_struct, signal_name);\n",
            self.iface.ext.name_lower
        ));
        output.push_str("  if (info == NULL)\n");
        output.push_str("    return;\n");
        output.push_str("  num_params = g_variant_n_children (parameters);\n");
        output.push_str("  paramv = g_new0 (GValue, num_params + 1);\n");
        output.push_str(&format!("  g_value_init (&paramv[0], {type_id});\n"));
        output.push_str("  g_value_set_object (&paramv[0], proxy);\n");
        output.push_str("  g_variant_iter_init (&iter, parameters);\n");
        output.push_str("  n = 1;\n");
        output.push_str("  while ((child = g_variant_iter_next_value (&iter)) != NULL)\n");
        output.push_str("    {\n");
        output.push_str("      _ExtendedGDBusArgInfo *arg_info = (_ExtendedGDBusArgInfo *) info->parent_struct.args[n - 1];\n");
        output.push_str("      if (arg_info->use_gvariant)\n");
        output.push_str("        {\n");
        output.push_str("          g_value_init (&paramv[n], G_TYPE_VARIANT);\n");
        output.push_str("          g_value_set_variant (&paramv[n], child);\n");
        output.push_str("          n++;\n");
        output.push_str("        }\n");
        output.push_str("      else\n");
        output.push_str("        g_dbus_gvariant_to_gvalue (child, &paramv[n++]);\n");
        output.push_str("      g_variant_unref (child);\n");
        output.push_str("    }\n");
        output.push_str(&format!(
            "  signal_id = g_signal_lookup (info->signal_name, {type_id});\n"
        ));
        output.push_str("  g_signal_emitv (paramv, signal_id, 0, NULL);\n");
        output.push_str("  for (n = 0; n < num_params + 1; n++)\n");
        output.push_str("    g_value_unset (&paramv[n]);\n");
        output.push_str("  g_free (paramv);\n");
        output.push_str("}\n\n");

        output
    }

    /// Generates the handler dropping cached values and notifying changes.
    fn generate_g_properties_changed(&self) -> String {
        let mut output = String::new();
        let m = &self.macros;
        let lookup = format!(
            "(_ExtendedGDBusPropertyInfo *) g_dbus_interface_info_lookup_property ((GDBusInterfaceInfo *) &_{}_interface_info.parent_struct",
            self.iface.ext.name_lower
        );

        output.push_str("static void\n");
        output.push_str(&format!("{}_g_properties_changed (GDBusProxy *_proxy,\n", m.lower));
        output.push_str("  GVariant *changed_properties,\n");
        output.push_str("  const gchar *const *invalidated_properties)\n");
        output.push_str("{\n");
        output.push_str(&format!("  {} *proxy = {} (_proxy);\n", m.camel, m.cast));
        output.push_str("  guint n;\n");
        output.push_str("  const gchar *key;\n");
        output.push_str("  GVariantIter *iter;\n");
        output.push_str("  _ExtendedGDBusPropertyInfo *info;\n");
        output.push_str("  g_variant_get (changed_properties, \"a{sv}\", &iter);\n");
        output.push_str("  while (g_variant_iter_next (iter, \"{&sv}\", &key, NULL))\n");
        output.push_str("    {\n");
        output.push_str(&format!("      info = {lookup}, key);\n"));
        output.push_str("      g_datalist_remove_data (&proxy->priv->qdata, key);\n");
        output.push_str("      if (info != NULL)\n");
        output.push_str("        g_object_notify (G_OBJECT (proxy), info->hyphen_name);\n");
        output.push_str("    }\n");
        output.push_str("  g_variant_iter_free (iter);\n");
        output.push_str("  for (n = 0; invalidated_properties[n] != NULL; n++)\n");
        output.push_str("    {\n");
        output.push_str(&format!("      info = {lookup}, invalidated_properties[n]);\n"));
        output.push_str("      g_datalist_remove_data (&proxy->priv->qdata, invalidated_properties[n]);\n");
        output.push_str("      if (info != NULL)\n");
        output.push_str("        g_object_notify (G_OBJECT (proxy), info->hyphen_name);\n");
        output.push_str("    }\n");
        output.push_str("}\n\n");

        output
    }

    /// Generates the vtable getter reading a property from the cache.
    fn generate_property_getter(&self, property: &dbusgen_schema::ir::PropertyInfo) -> String {
        let mut output = String::new();
        let m = &self.macros;
        let kind = property_kind(property);
        let name = &property.ext.names.name_lower;

        output.push_str(&format!("static {}\n", kind.ctype_in()));
        output.push_str(&format!(
            "{}_get_{name} ({} *object)\n",
            m.lower, self.iface.ext.camel_name
        ));
        output.push_str("{\n");
        output.push_str(&format!("  {} *proxy = {} (object);\n", m.camel, m.cast));
        output.push_str("  GVariant *variant;\n");
        output.push_str(&format!("  {}value = {};\n", kind.ctype_in(), kind.default_value()));

        if kind.is_strv() {
            output.push_str(&format!(
                "  value = g_datalist_get_data (&proxy->priv->qdata, \"{}\");\n",
                property.name
            ));
            output.push_str("  if (value != NULL)\n");
            output.push_str("    return value;\n");
        }

        output.push_str(&format!(
            "  variant = g_dbus_proxy_get_cached_property (G_DBUS_PROXY (proxy), \"{}\");\n",
            property.name
        ));

        match kind {
            CKind::Variant => {
                output.push_str("  value = variant;\n");
                output.push_str("  if (variant != NULL)\n");
                output.push_str("    g_variant_unref (variant);\n");
            }
            _ if kind.is_strv() => {
                output.push_str("  if (variant != NULL)\n");
                output.push_str("    {\n");
                output.push_str(&format!("      value = {};\n", kind.variant_get("variant")));
                output.push_str(&format!(
                    "      g_datalist_set_data_full (&proxy->priv->qdata, \"{}\", (gpointer) value, g_free);\n",
                    property.name
                ));
                output.push_str("      g_variant_unref (variant);\n");
                output.push_str("    }\n");
            }
            _ => {
                output.push_str("  if (variant != NULL)\n");
                output.push_str("    {\n");
                output.push_str(&format!("      value = {};\n", kind.variant_get("variant")));
                output.push_str("      g_variant_unref (variant);\n");
                output.push_str("    }\n");
            }
        }

        output.push_str("  return value;\n");
        output.push_str("}\n\n");

        output
    }

    fn generate_class_init(&self) -> String {
        let mut output = String::new();
        let m = &self.macros;
        let has_properties = !self.iface.properties.is_empty();

        output.push_str("static void\n");
        output.push_str(&format!("{}_init ({} *proxy)\n", m.lower, m.camel));
        output.push_str("{\n");
        output.push_str(&format!(
            "  proxy->priv = {}_get_instance_private (proxy);\n",
            m.lower
        ));
        output.push_str(&format!(
            "  g_dbus_proxy_set_interface_info (G_DBUS_PROXY (proxy), {}_interface_info ());\n",
            self.iface.ext.name_lower
        ));
        output.push_str("}\n\n");

        output.push_str("static void\n");
        output.push_str(&format!("{}_class_init ({}Class *klass)\n", m.lower, m.camel));
        output.push_str("{\n");
        output.push_str("  GObjectClass *gobject_class;\n");
        output.push_str("  GDBusProxyClass *proxy_class;\n\n");
        output.push_str("  gobject_class = G_OBJECT_CLASS (klass);\n");
        output.push_str(&format!("  gobject_class->finalize     = {}_finalize;\n", m.lower));
        if has_properties {
            output.push_str(&format!("  gobject_class->get_property = {}_get_property;\n", m.lower));
            output.push_str(&format!("  gobject_class->set_property = {}_set_property;\n", m.lower));
        }
        output.push('\n');
        output.push_str("  proxy_class = G_DBUS_PROXY_CLASS (klass);\n");
        output.push_str(&format!("  proxy_class->g_signal = {}_g_signal;\n", m.lower));
        output.push_str(&format!(
            "  proxy_class->g_properties_changed = {}_g_properties_changed;\n",
            m.lower
        ));
        if has_properties {
            output.push('\n');
            output.push_str(&format!(
                "  {}_override_properties (gobject_class, 1);\n",
                self.iface.ext.name_lower
            ));
        }
        output.push_str("}\n\n");

        output.push_str("static void\n");
        if has_properties {
            output.push_str(&format!(
                "{}_iface_init ({}Iface *iface)\n",
                m.lower, self.iface.ext.camel_name
            ));
        } else {
            output.push_str(&format!(
                "{}_iface_init ({}Iface *iface G_GNUC_UNUSED)\n",
                m.lower, self.iface.ext.camel_name
            ));
        }
        output.push_str("{\n");
        for property in &self.iface.properties {
            let name = &property.ext.names.name_lower;
            output.push_str(&format!("  iface->get_{name} = {}_get_{name};\n", m.lower));
        }
        output.push_str("}\n\n");

        output
    }

    fn generate_constructors(&self) -> String {
        let mut output = String::new();
        let m = &self.macros;
        let camel = &self.iface.ext.camel_name;
        let name = &self.iface.name;

        for (suffix, bus) in [("new", false), ("new_for_bus", true)] {
            let (async_params, sync_params) = if bus {
                (&NEW_FOR_BUS_PARAMS, &NEW_FOR_BUS_SYNC_PARAMS)
            } else {
                (&NEW_PARAMS, &NEW_SYNC_PARAMS)
            };
            let target = if bus {
                "\"g-bus-type\", bus_type"
            } else {
                "\"g-connection\", connection"
            };

            output.push_str("void\n");
            output.push_str(&format!("{}_{suffix} {}\n", m.lower, params(async_params)));
            output.push_str("{\n");
            output.push_str(&format!(
                "  g_async_initable_new_async ({}, G_PRIORITY_DEFAULT, cancellable, callback, user_data, \"g-flags\", flags, \"g-name\", name, {target}, \"g-object-path\", object_path, \"g-interface-name\", \"{name}\", NULL);\n",
                m.type_id
            ));
            output.push_str("}\n\n");

            output.push_str(&format!("{camel} *\n"));
            output.push_str(&format!(
                "{}_{suffix}_finish {}\n",
                m.lower,
                params(&NEW_FINISH_PARAMS)
            ));
            output.push_str("{\n");
            output.push_str("  GObject *ret;\n");
            output.push_str("  GObject *source_object;\n");
            output.push_str("  source_object = g_async_result_get_source_object (res);\n");
            output.push_str("  ret = g_async_initable_new_finish (G_ASYNC_INITABLE (source_object), res, error);\n");
            output.push_str("  g_object_unref (source_object);\n");
            output.push_str("  if (ret != NULL)\n");
            output.push_str(&format!("    return {} (ret);\n", self.iface_macros.cast));
            output.push_str("  else\n");
            output.push_str("    return NULL;\n");
            output.push_str("}\n\n");

            output.push_str(&format!("{camel} *\n"));
            output.push_str(&format!("{}_{suffix}_sync {}\n", m.lower, params(sync_params)));
            output.push_str("{\n");
            output.push_str("  GInitable *ret;\n");
            output.push_str(&format!(
                "  ret = g_initable_new ({}, cancellable, error, \"g-flags\", flags, \"g-name\", name, {target}, \"g-object-path\", object_path, \"g-interface-name\", \"{name}\", NULL);\n",
                m.type_id
            ));
            output.push_str("  if (ret != NULL)\n");
            output.push_str(&format!("    return {} (ret);\n", self.iface_macros.cast));
            output.push_str("  else\n");
            output.push_str("    return NULL;\n");
            output.push_str("}\n\n");
        }

        output.push('\n');
        output
    }
}
