use pretty_assertions::assert_eq;
use xml_terminology::{
    IndexedPointer, Pointer, PointerSegment, SettingKey, SettingValue, TermBuilder, TermNode,
    Terminology, TerminologyBuilder, TerminologyError,
};

#[ctor::ctor]
fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const XMLNS: &str = "http://hydra-collab.stanford.edu/schemas/rightsMetadata/v1";

fn rights_metadata() -> TerminologyBuilder {
    TerminologyBuilder::new()
        .term("rightsMetadata", |t| {
            t.root(true)
                .setting("xmlns", XMLNS)
                .setting("schema", "rightsMetadata.xsd")
                .with_child("access", |a| {
                    a.with_child("human_readable", |h| h.path("human"))
                        .with_child("machine", |m| {
                            m.with_child("group", |g| g.index_as(["facetable"]))
                                .with_child("person", |p| p.index_as(["facetable"]))
                        })
                })
                .with_child("edit_access", |e| {
                    e.variant_of("access").attributes([("type", "edit")])
                })
        })
        .term("access", |t| {
            t.with_child("machine", |m| m.with_child("person", |p| p))
        })
        .term("edit_access", |t| {
            t.refers_to(["rightsMetadata", "access"])
                .attributes([("type", "personal")])
        })
        .term("editor", |t| t.proxy(["edit_access", "machine", "person"]))
}

fn build() -> Terminology {
    rights_metadata().build().unwrap()
}

#[test]
fn test_absolute_paths_follow_nesting() {
    let terminology = build();
    assert_eq!(
        Some("//oxns:access/oxns:machine/oxns:person"),
        terminology.xpath_for(&Pointer::from(["access", "machine", "person"]))
    );
    assert_eq!(
        Some("//oxns:rightsMetadata/oxns:access/oxns:machine/oxns:person"),
        terminology.xpath_for(&Pointer::from([
            "rightsMetadata",
            "access",
            "machine",
            "person"
        ]))
    );
    assert_eq!(
        Some("//oxns:rightsMetadata/oxns:access/oxns:human"),
        terminology.xpath_for(&Pointer::from(["rightsMetadata", "access", "human_readable"]))
    );
}

#[test]
fn test_constrained_path_carries_predicates() {
    let terminology = build();
    let edit_access = terminology
        .retrieve_term(&Pointer::from("edit_access"))
        .unwrap();

    assert_eq!("//oxns:access", edit_access.xpath_absolute());
    assert_eq!(
        r#"//oxns:access[@type="personal"]"#,
        edit_access.xpath_constrained()
    );
    assert_eq!("oxns:access", edit_access.xpath_relative());

    let person = terminology
        .retrieve_term(&Pointer::from(["edit_access", "machine", "person"]))
        .unwrap();
    assert_eq!(
        r#"//oxns:access[@type="personal"]/oxns:machine/oxns:person"#,
        person.xpath_constrained()
    );
    assert_eq!(1, person.index_as().len());
}

#[test]
fn test_variant_does_not_merge() {
    let terminology = build();
    let variant = terminology
        .retrieve_term(&Pointer::from(["rightsMetadata", "edit_access"]))
        .unwrap();

    assert_eq!(Some(&Pointer::from("access")), variant.variant_of());
    assert_eq!(0, variant.child_ids().count());
    assert_eq!(
        r#"//oxns:rightsMetadata/oxns:edit_access[@type="edit"]"#,
        variant.xpath_constrained()
    );
}

#[test]
fn test_retrieve_term_from_root() {
    let terminology = build();
    let root = terminology
        .retrieve_term(&Pointer::from("rightsMetadata"))
        .unwrap();

    let person = terminology
        .retrieve_from(root.id(), &Pointer::from(["access", "machine", "person"]))
        .unwrap();
    assert_eq!("person", person.name().as_str());
    assert_eq!(
        Some("machine"),
        terminology.parent(person.id()).map(|p| p.name().as_str())
    );

    assert!(terminology
        .retrieve_from(root.id(), &Pointer::from(["access", "nonexistent"]))
        .is_none());
    assert!(!terminology.has_term(&Pointer::from(["access", "nonexistent", "person"])));
}

#[test]
fn test_root_term_settings() {
    let terminology = build();
    let roots: Vec<_> = terminology
        .root_terms()
        .map(|t| t.name().as_str())
        .collect();
    assert_eq!(vec!["rightsMetadata"], roots);
    assert_eq!(Some(XMLNS), terminology.xmlns());
    assert_eq!(Some("rightsMetadata.xsd"), terminology.schema());
}

#[test]
fn test_proxy_forwards_to_target() {
    let terminology = build();
    let editor = terminology.retrieve_term(&Pointer::from("editor")).unwrap();
    assert_eq!("person", editor.name().as_str());
    assert_eq!(
        "//oxns:access/oxns:machine/oxns:person",
        editor.xpath_absolute()
    );

    let node = terminology
        .roots()
        .find(|node| node.name().as_str() == "editor")
        .unwrap();
    match node {
        TermNode::Proxy(proxy) => {
            assert_eq!(
                &Pointer::from(["edit_access", "machine", "person"]),
                proxy.proxy_pointer()
            )
        }
        TermNode::Term(_) => panic!("editor should be a proxy"),
    }
}

#[test]
fn test_xpath_with_indexes() {
    let terminology = build();
    let pointer = IndexedPointer::new([
        PointerSegment::indexed("edit_access", 0),
        PointerSegment::new("machine"),
        PointerSegment::indexed("person", 2),
    ]);
    assert_eq!(
        Some(r#"//oxns:access[@type="personal"][1]/oxns:machine/oxns:person[3]"#.to_string()),
        terminology.xpath_with_indexes(&pointer)
    );
}

#[test]
fn test_graft_under_referenced_term() {
    let registry = rights_metadata();
    let mut terminology = registry.build().unwrap();

    let id = terminology
        .graft(
            &Pointer::from(["edit_access", "machine"]),
            TermBuilder::new("group").attributes([("authority", "local")]),
            Some(&registry),
        )
        .unwrap();

    let group = terminology.term(id).unwrap();
    assert_eq!("//oxns:access/oxns:machine/oxns:group", group.xpath_absolute());
    assert_eq!(
        r#"//oxns:access[@type="personal"]/oxns:machine/oxns:group[@authority="local"]"#,
        group.xpath_constrained()
    );
}

#[test]
fn test_circular_reference_aborts_build() {
    let err = rights_metadata()
        .term("a", |t| t.refers_to("b"))
        .term("b", |t| t.refers_to("a"))
        .build()
        .unwrap_err();
    assert_eq!(
        TerminologyError::CircularReference {
            trail: vec!["a".into(), "b".into(), "a".into()]
        },
        err
    );
    assert_eq!(
        "Circular reference in terminology: :a => :b => :a",
        err.to_string()
    );
}

#[test]
fn test_bad_pointer_aborts_build() {
    let err = rights_metadata()
        .term("copyright", |t| t.refers_to(["rightsMetadata", "copyright"]))
        .build()
        .unwrap_err();
    assert_eq!(
        TerminologyError::BadPointer {
            name: "copyright".into(),
            pointer: Pointer::from(["rightsMetadata", "copyright"]),
        },
        err
    );
}

#[test]
fn test_extension_settings_reach_term() {
    let terminology = TerminologyBuilder::new()
        .term("use", |t| {
            t.setting("label", "Use statement")
                .setting("display", SettingValue::map([("order", "2")]))
                .with_child("human", |h| h.path("human").required(true))
        })
        .term("license", |t| t.refers_to("use").setting("label", "License"))
        .build()
        .unwrap();

    let license = terminology.retrieve_term(&Pointer::from("license")).unwrap();
    assert_eq!(
        Some(&SettingValue::from("License")),
        license.extension("label")
    );
    assert_eq!(
        Some(&SettingValue::map([("order", "2")])),
        license.extensions().get(&SettingKey::from("display"))
    );
    assert!(terminology
        .retrieve_from(license.id(), &Pointer::from("human"))
        .unwrap()
        .required());
}

#[test]
fn test_built_terminology_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Terminology>();

    let terminology = build();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                assert!(terminology.has_term(&Pointer::from(["access", "machine", "person"])));
            });
        }
    });
}

#[cfg(feature = "dot")]
#[test]
fn test_render_to_file() {
    let path = std::env::temp_dir().join("rights_metadata_terminology.dot");
    build()
        .render_to(&path, xml_terminology::RenderSettings::default())
        .unwrap();

    let dot = std::fs::read_to_string(&path).unwrap();
    assert!(dot.contains(r#"label="rights_metadata_terminology";"#));
    assert!(dot.contains(r#"[label="editor"][shape="box"][style="dashed"]"#));
    let _ = std::fs::remove_file(&path);
}
