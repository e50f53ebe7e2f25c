use rstest::rstest;
use url::Url;
use xqe_xquery::{DocumentBuilder, NodeKind, QName, XdmAtomicValue};

#[rstest]
fn xml_base_resolves_against_the_document_uri() {
    let mut b = DocumentBuilder::new().with_uri("http://example.com/docs/a.xml");
    b.start_element(QName::local("outer"))
        .base("sub/")
        .start_element(QName::local("inner"))
        .base("b.xml")
        .text("t")
        .end_element()
        .end_element();
    let doc = b.build();
    let outer = doc.root().children()[0].clone();
    let inner = outer.children()[0].clone();
    let text = inner.children()[0].clone();

    let resolved = |n: &xqe_xquery::NodeHandle| n.base_uri(None).unwrap().map(|u| u.to_string());
    assert_eq!(resolved(&doc.root()).as_deref(), Some("http://example.com/docs/a.xml"));
    assert_eq!(resolved(&outer).as_deref(), Some("http://example.com/docs/sub/"));
    assert_eq!(resolved(&inner).as_deref(), Some("http://example.com/docs/sub/b.xml"));
    assert_eq!(resolved(&text), resolved(&inner));
}

#[rstest]
fn static_base_uri_is_the_fallback() {
    let mut b = DocumentBuilder::new();
    b.start_element(QName::local("e")).base("x/").end_element();
    let doc = b.build();
    let e = doc.root().children()[0].clone();
    let base = Url::parse("http://static.example/base/").unwrap();
    assert_eq!(
        e.base_uri(Some(&base)).unwrap().map(|u| u.to_string()).as_deref(),
        Some("http://static.example/base/x/")
    );
    assert_eq!(doc.root().base_uri(None).unwrap(), None);
}

#[rstest]
fn relative_base_without_anchor_is_an_error() {
    let mut b = DocumentBuilder::new();
    b.start_element(QName::local("e")).base("relative/").end_element();
    let doc = b.build();
    let e = doc.root().children()[0].clone();
    let err = e.base_uri(None).unwrap_err();
    assert_eq!(err.format_code(), "err:FORG0002");
    assert!(std::error::Error::source(&err).is_some());
}

#[rstest]
fn resolution_stops_at_the_first_absolute_base() {
    let mut b = DocumentBuilder::new().with_uri("http://example.com/a.xml");
    b.start_element(QName::local("outer"))
        .base("http://[broken")
        .start_element(QName::local("inner"))
        .base("http://other.example/root/")
        .start_element(QName::local("leaf"))
        .base("leaf/")
        .end_element()
        .end_element()
        .end_element();
    let doc = b.build();
    let outer = doc.root().children()[0].clone();
    let inner = outer.children()[0].clone();
    let leaf = inner.children()[0].clone();

    assert_eq!(
        leaf.base_uri(None).unwrap().map(|u| u.to_string()).as_deref(),
        Some("http://other.example/root/leaf/")
    );
    assert_eq!(
        inner.base_uri(None).unwrap().map(|u| u.to_string()).as_deref(),
        Some("http://other.example/root/")
    );
    assert_eq!(outer.base_uri(None).unwrap_err().format_code(), "err:FORG0002");
}

#[rstest]
fn typed_values_by_node_kind() {
    let mut b = DocumentBuilder::new();
    b.start_element(QName::local("e"))
        .attribute(QName::local("a"), "1")
        .comment("note")
        .processing_instruction("pi", "data")
        .text("42")
        .end_element();
    let doc = b.build();
    let e = doc.root().children()[0].clone();
    let kinds: Vec<NodeKind> = e.children().iter().map(|n| n.kind()).collect();
    assert_eq!(kinds, [NodeKind::Comment, NodeKind::ProcessingInstruction, NodeKind::Text]);

    assert_eq!(e.typed_value(), XdmAtomicValue::UntypedAtomic("42".into()));
    let attr = e.attribute(&QName::local("a")).unwrap();
    assert_eq!(attr.kind(), NodeKind::Attribute);
    assert_eq!(attr.typed_value(), XdmAtomicValue::UntypedAtomic("1".into()));
    assert_eq!(attr.parent().as_ref(), Some(&e));
    assert_eq!(e.children()[0].typed_value(), XdmAtomicValue::String("note".into()));
    assert_eq!(e.children()[1].name().map(ToString::to_string).as_deref(), Some("pi"));
}

#[rstest]
fn node_identity_is_per_document() {
    let build = || {
        let mut b = DocumentBuilder::new();
        b.start_element(QName::local("e")).end_element();
        b.build()
    };
    let (d1, d2) = (build(), build());
    assert_eq!(d1.root(), d1.root());
    assert_ne!(d1.root(), d2.root());
    assert_eq!(d1.len(), 2);
}

#[rstest]
fn builder_closes_open_elements() {
    let mut b = DocumentBuilder::new();
    b.start_element(QName::local("a")).start_element(QName::local("b")).text("x");
    let doc = b.build();
    let a = doc.root().children()[0].clone();
    assert_eq!(a.children().len(), 1);
    assert_eq!(doc.root().string_value(), "x");
}
