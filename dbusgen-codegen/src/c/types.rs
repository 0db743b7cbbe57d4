//! Mapping of D-Bus type signatures to GLib C types.

/// C representation chosen for a value of a given signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CKind {
    /// `b`
    Boolean,
    /// `y`
    Byte,
    /// `n`
    Int16,
    /// `q`
    Uint16,
    /// `i`
    Int32,
    /// `u`
    Uint32,
    /// `x`
    Int64,
    /// `t`
    Uint64,
    /// `d`
    Double,
    /// `h`
    Handle,
    /// `s`
    String,
    /// `o`
    ObjectPath,
    /// `g`
    Signature,
    /// `ay`
    Bytestring,
    /// `as`
    Strv,
    /// `ao`
    Objv,
    /// `aay`
    BytestringArray,
    /// `ag`
    SignatureArray,
    /// Anything else, or a value forced to stay a `GVariant`.
    Variant,
}

impl CKind {
    /// Classifies a signature.
    #[must_use]
    pub fn classify(signature: &str, use_gvariant: bool) -> Self {
        if use_gvariant {
            return Self::Variant;
        }
        match signature {
            "b" => Self::Boolean,
            "y" => Self::Byte,
            "n" => Self::Int16,
            "q" => Self::Uint16,
            "i" => Self::Int32,
            "u" => Self::Uint32,
            "x" => Self::Int64,
            "t" => Self::Uint64,
            "d" => Self::Double,
            "h" => Self::Handle,
            "s" => Self::String,
            "o" => Self::ObjectPath,
            "g" => Self::Signature,
            "ay" => Self::Bytestring,
            "as" => Self::Strv,
            "ao" => Self::Objv,
            "aay" => Self::BytestringArray,
            "ag" => Self::SignatureArray,
            _ => Self::Variant,
        }
    }

    /// Returns true for the string vector kinds.
    #[must_use]
    pub const fn is_strv(&self) -> bool {
        matches!(
            self,
            Self::Strv | Self::Objv | Self::BytestringArray | Self::SignatureArray
        )
    }

    /// C type of an input parameter, including the trailing space or `*`.
    #[must_use]
    pub const fn ctype_in(&self) -> &'static str {
        match self {
            Self::Boolean => "gboolean ",
            Self::Byte => "guchar ",
            Self::Int16 => "gint16 ",
            Self::Uint16 => "guint16 ",
            Self::Int32 | Self::Handle => "gint ",
            Self::Uint32 => "guint ",
            Self::Int64 => "gint64 ",
            Self::Uint64 => "guint64 ",
            Self::Double => "gdouble ",
            Self::String | Self::ObjectPath | Self::Signature | Self::Bytestring => {
                "const gchar *"
            }
            Self::Strv | Self::Objv | Self::BytestringArray | Self::SignatureArray => {
                "const gchar *const *"
            }
            Self::Variant => "GVariant *",
        }
    }

    /// C type of an output parameter.
    #[must_use]
    pub const fn ctype_out(&self) -> &'static str {
        match self {
            Self::Boolean => "gboolean *",
            Self::Byte => "guchar *",
            Self::Int16 => "gint16 *",
            Self::Uint16 => "guint16 *",
            Self::Int32 | Self::Handle => "gint *",
            Self::Uint32 => "guint *",
            Self::Int64 => "gint64 *",
            Self::Uint64 => "guint64 *",
            Self::Double => "gdouble *",
            Self::String | Self::ObjectPath | Self::Signature | Self::Bytestring => "gchar **",
            Self::Strv | Self::Objv | Self::BytestringArray | Self::SignatureArray => {
                "gchar ***"
            }
            Self::Variant => "GVariant **",
        }
    }

    /// C type of an owned copy, for kinds that have a `dup` accessor.
    #[must_use]
    pub const fn ctype_dup(&self) -> Option<&'static str> {
        match self {
            Self::String | Self::ObjectPath | Self::Signature | Self::Bytestring => {
                Some("gchar *")
            }
            Self::Strv | Self::Objv | Self::BytestringArray | Self::SignatureArray => {
                Some("gchar **")
            }
            Self::Variant => Some("GVariant *"),
            _ => None,
        }
    }

    /// `GType` of the value.
    #[must_use]
    pub const fn gtype(&self) -> &'static str {
        match self {
            Self::Boolean => "G_TYPE_BOOLEAN",
            Self::Byte => "G_TYPE_UCHAR",
            Self::Int16 | Self::Int32 | Self::Handle => "G_TYPE_INT",
            Self::Uint16 | Self::Uint32 => "G_TYPE_UINT",
            Self::Int64 => "G_TYPE_INT64",
            Self::Uint64 => "G_TYPE_UINT64",
            Self::Double => "G_TYPE_DOUBLE",
            Self::String | Self::ObjectPath | Self::Signature | Self::Bytestring => "G_TYPE_STRING",
            Self::Strv | Self::Objv | Self::BytestringArray | Self::SignatureArray => "G_TYPE_STRV",
            Self::Variant => "G_TYPE_VARIANT",
        }
    }

    /// Suffix of the `g_value_get_*` / `g_value_set_*` accessors.
    #[must_use]
    pub const fn gvalue_suffix(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "uchar",
            Self::Int16 | Self::Int32 | Self::Handle => "int",
            Self::Uint16 | Self::Uint32 => "uint",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Double => "double",
            Self::String | Self::ObjectPath | Self::Signature | Self::Bytestring => "string",
            Self::Strv | Self::Objv | Self::BytestringArray | Self::SignatureArray => "boxed",
            Self::Variant => "variant",
        }
    }

    /// `GVariant` format string for building or destructuring the value.
    #[must_use]
    pub fn format(&self, signature: &str) -> String {
        match self {
            Self::Bytestring
            | Self::Strv
            | Self::Objv
            | Self::BytestringArray
            | Self::SignatureArray => format!("^{signature}"),
            Self::Variant => format!("@{signature}"),
            _ => signature.to_string(),
        }
    }

    /// Expression reading the value out of the `GVariant` expression `variant`.
    #[must_use]
    pub fn variant_get(&self, variant: &str) -> String {
        match self {
            Self::Boolean => format!("g_variant_get_boolean ({variant})"),
            Self::Byte => format!("g_variant_get_byte ({variant})"),
            Self::Int16 => format!("g_variant_get_int16 ({variant})"),
            Self::Uint16 => format!("g_variant_get_uint16 ({variant})"),
            Self::Int32 => format!("g_variant_get_int32 ({variant})"),
            Self::Handle => format!("g_variant_get_handle ({variant})"),
            Self::Uint32 => format!("g_variant_get_uint32 ({variant})"),
            Self::Int64 => format!("g_variant_get_int64 ({variant})"),
            Self::Uint64 => format!("g_variant_get_uint64 ({variant})"),
            Self::Double => format!("g_variant_get_double ({variant})"),
            Self::String | Self::ObjectPath | Self::Signature => {
                format!("g_variant_get_string ({variant}, NULL)")
            }
            Self::Bytestring => format!("g_variant_get_bytestring ({variant})"),
            Self::Strv | Self::SignatureArray => format!("g_variant_get_strv ({variant}, NULL)"),
            Self::Objv => format!("g_variant_get_objv ({variant}, NULL)"),
            Self::BytestringArray => format!("g_variant_get_bytestring_array ({variant}, NULL)"),
            Self::Variant => variant.to_string(),
        }
    }

    /// Zero value used before a cached value is available.
    #[must_use]
    pub const fn default_value(&self) -> &'static str {
        match self {
            Self::Boolean => "FALSE",
            Self::Double => "0.0",
            Self::Byte
            | Self::Int16
            | Self::Uint16
            | Self::Int32
            | Self::Uint32
            | Self::Int64
            | Self::Uint64
            | Self::Handle => "0",
            _ => "NULL",
        }
    }

    /// `GParamSpec` constructor call for a property of this kind.
    #[must_use]
    pub fn param_spec(&self, name: &str, nick: &str, signature: &str, flags: &str) -> String {
        let (func, args) = match self {
            Self::Boolean => ("g_param_spec_boolean", "FALSE".to_string()),
            Self::Byte => ("g_param_spec_uchar", "0, 255, 0".to_string()),
            Self::Int16 | Self::Int32 | Self::Handle => {
                ("g_param_spec_int", "G_MININT32, G_MAXINT32, 0".to_string())
            }
            Self::Uint16 | Self::Uint32 => ("g_param_spec_uint", "0, G_MAXUINT32, 0".to_string()),
            Self::Int64 => ("g_param_spec_int64", "G_MININT64, G_MAXINT64, 0".to_string()),
            Self::Uint64 => ("g_param_spec_uint64", "0, G_MAXUINT64, 0".to_string()),
            Self::Double => (
                "g_param_spec_double",
                "-G_MAXDOUBLE, G_MAXDOUBLE, 0.0".to_string(),
            ),
            Self::String | Self::ObjectPath | Self::Signature | Self::Bytestring => {
                ("g_param_spec_string", "NULL".to_string())
            }
            Self::Strv | Self::Objv | Self::BytestringArray | Self::SignatureArray => {
                ("g_param_spec_boxed", "G_TYPE_STRV".to_string())
            }
            Self::Variant => (
                "g_param_spec_variant",
                format!("G_VARIANT_TYPE (\"{signature}\"), NULL"),
            ),
        };
        format!("{func} (\"{name}\", \"{nick}\", \"{nick}\", {args}, {flags})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_basic() {
        assert_eq!(CKind::classify("b", false), CKind::Boolean);
        assert_eq!(CKind::classify("h", false), CKind::Handle);
        assert_eq!(CKind::classify("aay", false), CKind::BytestringArray);
        assert_eq!(CKind::classify("a{sv}", false), CKind::Variant);
        assert_eq!(CKind::classify("s", true), CKind::Variant);
    }

    #[test]
    fn test_ctypes() {
        assert_eq!(CKind::String.ctype_in(), "const gchar *");
        assert_eq!(CKind::String.ctype_out(), "gchar **");
        assert_eq!(CKind::Strv.ctype_in(), "const gchar *const *");
        assert_eq!(CKind::Strv.ctype_dup(), Some("gchar **"));
        assert_eq!(CKind::Int32.ctype_dup(), None);
        assert_eq!(CKind::Handle.gtype(), "G_TYPE_INT");
        assert_eq!(CKind::Double.default_value(), "0.0");
        assert_eq!(CKind::Objv.default_value(), "NULL");
    }

    #[test]
    fn test_format() {
        assert_eq!(CKind::String.format("s"), "s");
        assert_eq!(CKind::Bytestring.format("ay"), "^ay");
        assert_eq!(CKind::Objv.format("ao"), "^ao");
        assert_eq!(CKind::Variant.format("a{sv}"), "@a{sv}");
    }

    #[test]
    fn test_param_spec() {
        assert_eq!(
            CKind::Boolean.param_spec("awake", "Awake", "b", "G_PARAM_READWRITE"),
            "g_param_spec_boolean (\"awake\", \"Awake\", \"Awake\", FALSE, G_PARAM_READWRITE)"
        );
        assert_eq!(
            CKind::Variant.param_spec("extra", "Extra", "a{sv}", "G_PARAM_READWRITE"),
            "g_param_spec_variant (\"extra\", \"Extra\", \"Extra\", G_VARIANT_TYPE (\"a{sv}\"), NULL, G_PARAM_READWRITE)"
        );
    }

    #[test]
    fn test_variant_get() {
        assert_eq!(CKind::Uint64.variant_get("v"), "g_variant_get_uint64 (v)");
        assert_eq!(CKind::String.variant_get("v"), "g_variant_get_string (v, NULL)");
        assert_eq!(CKind::Variant.variant_get("v"), "v");
    }
}
