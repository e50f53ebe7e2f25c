use std::sync::Arc;

use rstest::{fixture, rstest};
use xqe_xquery::{
    AtomicType, CmpG, CmpV, DocumentBuilder, ErrorKind, Expr, InputInfo, OpG, OpV, Occurrence,
    QName, QueryContext, QueryContextBuilder, SeqType, StaticContext, StaticContextBuilder, Var,
    VarId, XdmAtomicValue as V, XdmItem,
};

#[fixture]
fn sc() -> Arc<StaticContext> {
    Arc::new(StaticContext::default())
}

fn int(i: i128) -> Expr {
    V::Integer(i).into()
}

fn string(s: &str) -> Expr {
    V::String(s.to_string()).into()
}

fn seq(items: &[i128]) -> Expr {
    Expr::Literal(items.iter().map(|i| V::Integer(*i).into()).collect())
}

fn value_cmp(sc: &Arc<StaticContext>, left: Expr, op: OpV, right: Expr) -> CmpV {
    CmpV::new(left, right, op, None, sc.clone(), None)
}

#[rstest]
fn equal_integers(sc: Arc<StaticContext>) {
    let c = value_cmp(&sc, int(1), OpV::Eq, int(1));
    assert_eq!(c.evaluate(&QueryContext::default()).unwrap(), Some(true));
    let as_expr: Expr = c.into();
    assert_eq!(
        as_expr.evaluate(&QueryContext::default()).unwrap(),
        vec![XdmItem::Atomic(V::Boolean(true))]
    );
}

#[rstest]
fn empty_operand_yields_empty_for_every_operator(sc: Arc<StaticContext>) {
    let qc = QueryContext::default();
    for op in OpV::ALL {
        assert_eq!(value_cmp(&sc, int(1), op, Expr::empty()).evaluate(&qc).unwrap(), None);
        assert_eq!(value_cmp(&sc, Expr::empty(), op, int(1)).evaluate(&qc).unwrap(), None);
        let e: Expr = value_cmp(&sc, int(1), op, Expr::empty()).into();
        assert!(e.evaluate(&qc).unwrap().is_empty());
    }
}

#[rstest]
fn empty_left_operand_skips_the_right_one(sc: Arc<StaticContext>) {
    let c = value_cmp(&sc, Expr::empty(), OpV::Eq, seq(&[1, 2]));
    assert_eq!(c.evaluate(&QueryContext::default()).unwrap(), None);
}

#[rstest]
fn sequence_operand_is_too_long(sc: Arc<StaticContext>) {
    let c = value_cmp(&sc, seq(&[1, 2]), OpV::Eq, int(1));
    let err = c.evaluate(&QueryContext::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::SequenceTooLong);
    assert_eq!(err.format_code(), "err:XPTY0004");
}

#[rstest]
fn errors_carry_the_location_of_the_comparison(sc: Arc<StaticContext>) {
    let info = InputInfo::new(3, 14).with_path("query.xq");
    let c = CmpV::new(int(1), string("1"), OpV::Eq, None, sc, Some(info.clone()));
    let err = c.evaluate(&QueryContext::default()).unwrap_err();
    assert_eq!(err.info, Some(info));
    assert!(err.to_string().contains("query.xq:3:14"), "{err}");
}

#[rstest]
fn element_operands_atomize_to_untyped(sc: Arc<StaticContext>) {
    let mut b = DocumentBuilder::new();
    b.start_element(QName::local("price"))
        .attribute(QName::local("currency"), "EUR")
        .text("4")
        .text("2")
        .end_element();
    let doc = b.build();
    let price = doc.root().children()[0].clone();
    let currency = price.attribute(&QName::local("currency")).unwrap();

    let node = |n: &xqe_xquery::NodeHandle| Expr::Literal(vec![XdmItem::Node(n.clone())]);
    let qc = QueryContext::default();
    assert_eq!(value_cmp(&sc, node(&price), OpV::Eq, int(42)).evaluate(&qc).unwrap(), Some(true));
    assert_eq!(
        value_cmp(&sc, node(&currency), OpV::Eq, string("EUR")).evaluate(&qc).unwrap(),
        Some(true)
    );
    assert_eq!(
        value_cmp(&sc, node(&price), OpV::Gt, node(&currency)).evaluate(&qc).unwrap(),
        Some(false)
    );
}

#[rstest]
fn arrays_flatten_before_the_cardinality_check(sc: Arc<StaticContext>) {
    let one = Expr::Literal(vec![XdmItem::Array(Arc::new(vec![vec![V::Integer(5).into()]]))]);
    let two = Expr::Literal(vec![XdmItem::Array(Arc::new(vec![
        vec![V::Integer(5).into()],
        vec![V::Integer(6).into()],
    ]))]);
    let qc = QueryContext::default();
    assert_eq!(value_cmp(&sc, one, OpV::Le, int(5)).evaluate(&qc).unwrap(), Some(true));
    let err = value_cmp(&sc, two, OpV::Le, int(5)).evaluate(&qc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::SequenceTooLong);
}

#[rstest]
fn variables_are_read_from_the_query_context(sc: Arc<StaticContext>) {
    let x = Var::new(VarId(0), "x", SeqType::atomic(AtomicType::Integer, Occurrence::One));
    let qc = QueryContextBuilder::new()
        .with_variable(&x, vec![XdmItem::Atomic(V::Integer(7))])
        .build()
        .unwrap();
    let c = value_cmp(&sc, Expr::VarRef(x.clone()), OpV::Gt, int(5));
    assert_eq!(c.evaluate(&qc).unwrap(), Some(true));

    let err = c.evaluate(&QueryContext::default()).unwrap_err();
    assert_eq!(err.format_code(), "err:XPST0008");
}

#[rstest]
fn binding_a_value_of_the_wrong_type_fails() {
    let x = Var::new(VarId(0), "x", SeqType::atomic(AtomicType::Integer, Occurrence::One));
    let err = QueryContextBuilder::new()
        .with_variable(&x, vec![XdmItem::Atomic(V::String("7".into()))])
        .build()
        .unwrap_err();
    assert_eq!(err.format_code(), "err:XPTY0004");
}

#[rstest]
fn cancelled_context_stops_sequence_evaluation(sc: Arc<StaticContext>) {
    let qc = QueryContext::default();
    let handle = qc.cancel_handle();
    handle.store(true, std::sync::atomic::Ordering::Relaxed);
    let c = value_cmp(&sc, Expr::List(vec![int(1)]), OpV::Eq, int(1));
    let err = c.evaluate(&qc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cancelled);
    assert_eq!(err.format_code(), "xqe:XQE00001");
}

#[rstest]
fn explicit_collation_overrides_the_default(sc: Arc<StaticContext>) {
    let ci = sc.collation(Some(xqe_xquery::consts::SIMPLE_CASE_URI)).unwrap();
    let qc = QueryContext::default();
    let plain = value_cmp(&sc, string("ABC"), OpV::Eq, string("abc"));
    assert_eq!(plain.evaluate(&qc).unwrap(), Some(false));
    let folded = CmpV::new(string("ABC"), string("abc"), OpV::Eq, Some(ci), sc, None);
    assert_eq!(folded.evaluate(&qc).unwrap(), Some(true));
}

#[rstest]
fn default_collation_comes_from_the_static_context() {
    let sc = Arc::new(
        StaticContextBuilder::new()
            .with_default_collation(xqe_xquery::consts::SIMPLE_CASE_ACCENT_URI)
            .build()
            .unwrap(),
    );
    let c = value_cmp(&sc, string("Élan"), OpV::Eq, string("elan"));
    assert_eq!(c.evaluate(&QueryContext::default()).unwrap(), Some(true));
}

#[rstest]
#[case(&[1, 2], OpG::Eq, &[2], true)]
#[case(&[1, 2], OpG::Eq, &[3], false)]
#[case(&[], OpG::Ne, &[1], false)]
#[case(&[1], OpG::Ne, &[], false)]
#[case(&[1, 1], OpG::Ne, &[1, 2], true)]
#[case(&[5, 9], OpG::Lt, &[6], true)]
fn general_comparison_is_existential(
    sc: Arc<StaticContext>,
    #[case] left: &[i128],
    #[case] op: OpG,
    #[case] right: &[i128],
    #[case] expected: bool,
) {
    let c = CmpG::new(seq(left), seq(right), op, None, sc, None);
    assert_eq!(c.evaluate(&QueryContext::default()).unwrap(), expected);
}

#[rstest]
fn effective_boolean_value_of_an_empty_comparison_is_false(sc: Arc<StaticContext>) {
    let qc = QueryContext::default();
    let e: Expr = value_cmp(&sc, int(1), OpV::Eq, Expr::empty()).into();
    assert!(!e.ebv(&qc).unwrap());
    assert_eq!(
        Expr::not(e).evaluate(&qc).unwrap(),
        vec![XdmItem::Atomic(V::Boolean(true))]
    );
}

#[rstest]
fn conditional_selects_a_branch_by_comparison(sc: Arc<StaticContext>) {
    let cond: Expr = value_cmp(&sc, int(2), OpV::Gt, int(1)).into();
    let e = Expr::if_then_else(cond, string("yes"), string("no"));
    assert_eq!(
        e.evaluate(&QueryContext::default()).unwrap(),
        vec![XdmItem::Atomic(V::String("yes".into()))]
    );
}
