//! Properties of complete generator runs.

use dbusgen_codegen::templates::{
    CONFIG_H_INCLUDE, HEADER_INCLUDES, TOP_COMMENT, TYPEDEFS_AND_HELPERS,
};
use dbusgen_codegen::{ErrorKind, Generator, GeneratorOptions, OutputMode};

const FD_PASSING: &str = r#"
    <node>
      <interface name="FDPassing">
        <method name="HelloFD">
          <annotation name="org.gtk.GDBus.C.UnixFD" value="1"/>
          <arg name="greeting" direction="in" type="s"/>
          <arg name="response" direction="out" type="s"/>
        </method>
        <method name="NoAnnotation">
          <arg name="greeting" direction="in" type="h"/>
          <arg name="greeting_locale" direction="in" type="s"/>
          <arg name="response" direction="out" type="h"/>
          <arg name="response_locale" direction="out" type="s"/>
        </method>
        <method name="NoAnnotationNested">
          <arg name="files" type="a{sh}" direction="in"/>
        </method>
      </interface>
    </node>"#;

const USEFUL: &str = r#"
    <node>
      <interface name="org.project.UsefulInterface">
        <method name="UsefulMethod"/>
      </interface>
    </node>"#;

const FROBNICATOR: &str = r#"
    <node>
      <interface name="org.project.Bar.Frobnicator">
        <method name="RandomMethod"/>
      </interface>
    </node>"#;

const COYOTE: &str = r#"
    <node>
      <interface name="com.acme.Coyote">
        <method name="Run">
          <arg name="speed" direction="in" type="d"/>
        </method>
        <signal name="Surprised"/>
        <property name="Mood" type="s" access="read"/>
      </interface>
    </node>"#;

fn options(header: bool, min: Option<&str>, max: Option<&str>) -> GeneratorOptions {
    let mode = OutputMode::from_requests(header, !header, None, None, Some("stdout")).unwrap();
    let mut options = GeneratorOptions::new(mode);
    options.min_required = min.map(str::to_string);
    options.max_allowed = max.map(str::to_string);
    options
}

fn run(options: GeneratorOptions, documents: &[&str]) -> String {
    let mut artifacts = Generator::new(options).generate(documents).unwrap();
    assert_eq!(artifacts.len(), 1);
    artifacts.remove(0).contents
}

fn header(documents: &[&str], min: Option<&str>) -> String {
    run(options(true, min, None), documents)
}

#[test]
fn test_empty_header() {
    let text = header(&[""], None);
    let expected = format!(
        "{TOP_COMMENT}\n\n#ifndef __STDOUT__\n#define __STDOUT__\n\n#include <gio/gio.h>\n\nG_BEGIN_DECLS\n\n\nG_END_DECLS\n\n#endif /* __STDOUT__ */"
    );
    assert_eq!(text.trim(), expected);
}

#[test]
fn test_empty_body() {
    let text = run(options(false, None, None), &[""]);
    let expected = format!(
        "{TOP_COMMENT}\n\n{CONFIG_H_INCLUDE}\n\n#include \"stdout.h\"\n\n{HEADER_INCLUDES}\n\n{TYPEDEFS_AND_HELPERS}"
    );
    assert_eq!(text.trim(), expected);
}

#[test]
fn test_input_order_independence() {
    for header_mode in [true, false] {
        let forward = run(options(header_mode, None, None), &[COYOTE, FROBNICATOR]);
        let backward = run(options(header_mode, None, None), &[FROBNICATOR, COYOTE]);
        assert_eq!(forward, backward);
    }
}

#[test]
fn test_declaration_order_independence() {
    let ab = r#"<node>
        <interface name="b.Two"><method name="Y"/><method name="X"/></interface>
        <interface name="a.One"/>
      </node>"#;
    let ba = r#"<node>
        <interface name="a.One"/>
        <interface name="b.Two"><method name="X"/><method name="Y"/></interface>
      </node>"#;
    assert_eq!(header(&[ab], None), header(&[ba], None));
}

#[test]
fn test_duplicate_declarations_order_independence() {
    let plain = r#"<node><interface name="org.example.A"><method name="Run"/></interface></node>"#;
    let documented = r#"<node>
          <interface name="org.example.A">
            <!-- Run: Runs.
                 @since 1.2
            -->
            <method name="Run"/>
          </interface>
        </node>"#;

    for header_mode in [true, false] {
        let forward = run(options(header_mode, None, None), &[plain, documented]);
        let backward = run(options(header_mode, None, None), &[documented, plain]);
        assert_eq!(forward, backward);
    }
    let body = run(options(false, None, None), &[plain, documented]);
    assert!(body.contains(" * Since: 1.2\n"));
}

#[test]
fn test_invalid_member_name_rejected() {
    let xml = r#"<node><interface name="org.example.A"><method name="Get&amp;Set"/></interface></node>"#;
    let docbook = GeneratorOptions::new(OutputMode::Docbook {
        prefix: "test".to_string(),
    });
    let err = Generator::new(docbook).generate(&[xml]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaViolation);
}

#[test]
fn test_single_boilerplate_block() {
    let text = run(options(false, None, None), &[COYOTE, FROBNICATOR, USEFUL]);
    assert_eq!(text.matches(TYPEDEFS_AND_HELPERS).count(), 1);
}

#[test]
fn test_call_flags_and_timeout_gating() {
    for (min, expected) in [(None, 0), (Some("2.32"), 0), (Some("2.64"), 2)] {
        let text = header(&[USEFUL], min);
        assert_eq!(text.matches("GDBusCallFlags call_flags,").count(), expected, "{min:?}");
        assert_eq!(text.matches("gint timeout_msec,").count(), expected, "{min:?}");
    }
}

#[test]
fn test_unix_fd_list_gating() {
    for (min, expected) in [(None, 6), (Some("2.32"), 6), (Some("2.64"), 18)] {
        let text = header(&[FD_PASSING], min);
        assert_eq!(text.matches("GUnixFDList").count(), expected, "{min:?}");
    }
}

#[test]
fn test_accepted_versions() {
    let cases = [
        (Some("3"), Some("3.2")),
        (Some("2.46.2"), None),
        (None, Some("3")),
        (None, Some("2.46.2")),
        (Some("2.64"), Some("2.63")),
    ];
    for (min, max) in cases {
        let text = run(options(true, min, max), &[""]);
        assert!(!text.trim().is_empty(), "{min:?} {max:?}");
    }
}

#[test]
fn test_rejected_versions() {
    let cases = [
        (Some("hello mum"), None, ErrorKind::VersionFormat),
        (Some("2.6"), None, ErrorKind::VersionRange),
        (None, Some("2.6"), ErrorKind::VersionRange),
        (Some("2.64"), Some("2.62"), ErrorKind::VersionRange),
    ];
    for (min, max, kind) in cases {
        let err = Generator::new(options(false, min, max))
            .generate(&[""])
            .unwrap_err();
        assert_eq!(err.kind(), kind, "{min:?} {max:?}");
    }
}

#[test]
fn test_documentation_naming() {
    let docbook = GeneratorOptions::new(OutputMode::Docbook {
        prefix: "test".to_string(),
    });
    let artifacts = Generator::new(docbook).generate(&[FROBNICATOR]).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].name, "test-org.project.Bar.Frobnicator.xml");
    assert!(!artifacts[0].contents.is_empty());

    let rst = GeneratorOptions::new(OutputMode::Rst {
        prefix: "test".to_string(),
    });
    let artifacts = Generator::new(rst).generate(&[FROBNICATOR]).unwrap();
    assert_eq!(artifacts[0].name, "test-org.project.Bar.Frobnicator.rst");
    assert!(!artifacts[0].contents.is_empty());
}

#[test]
fn test_invalid_documents_fail() {
    let cases = [
        ("<node><interface name=\"a.B\"></node>", ErrorKind::XmlSyntax),
        ("<interface name=\"a.B\"/>", ErrorKind::SchemaViolation),
        (
            r#"<node><interface name="a.B"><method name="M"><arg type="a{vs}"/></method></interface></node>"#,
            ErrorKind::TypeSignature,
        ),
    ];
    for (xml, kind) in cases {
        let err = Generator::new(options(true, None, None))
            .generate(&[xml])
            .unwrap_err();
        assert_eq!(err.kind(), kind, "{xml}");
    }
}

#[test]
fn test_conflicting_duplicate_interfaces() {
    let other = r#"<node><interface name="com.acme.Coyote"><method name="Sleep"/></interface></node>"#;
    let err = Generator::new(options(true, None, None))
        .generate(&[COYOTE, other])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaViolation);

    let text = header(&[COYOTE, COYOTE], None);
    assert_eq!(text.matches("com_acme_coyote_get_type (void)").count(), 1);
}

#[test]
fn test_naming_options() {
    let mut options = options(true, None, None);
    options.interface_prefix = Some("com.acme.".to_string());
    options.c_namespace = Some("Looney".to_string());
    let text = run(options, &[COYOTE]);
    assert!(text.contains("LooneyCoyote"), "{text}");
    assert!(text.contains("looney_coyote_call_run"));
}
