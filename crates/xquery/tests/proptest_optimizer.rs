use std::mem::{Discriminant, discriminant};
use std::sync::Arc;

use proptest::prelude::*;
use xqe_xquery::{
    AtomicType, CmpG, CmpV, CompileContext, DocumentBuilder, ErrorKind, Expr, ItemType, OpG, OpV,
    Occurrence, QName, QueryContext, SeqType, StaticContext, Var, VarId, XdmAtomicValue as V,
    XdmItem,
};

fn vars() -> Vec<Var> {
    let one = |t| SeqType::atomic(t, Occurrence::One);
    vec![
        Var::new(VarId(0), "x", one(AtomicType::Integer)),
        Var::new(VarId(1), "d", one(AtomicType::Double)),
        Var::new(VarId(2), "b", one(AtomicType::Boolean)),
        Var::new(VarId(3), "n", SeqType::new(ItemType::Node, Occurrence::One)),
        Var::new(VarId(4), "o", SeqType::atomic(AtomicType::Integer, Occurrence::ZeroOrOne)),
        Var::new(VarId(5), "s", one(AtomicType::String)),
    ]
}

fn leaf() -> impl Strategy<Value = Expr> {
    prop_oneof![
        (-3i128..3).prop_map(|i| Expr::from(V::Integer(i))),
        Just(Expr::empty()),
        Just(Expr::Literal(vec![V::Integer(1).into(), V::Integer(2).into()])),
        prop::sample::select(vec!["a", "1", "B"]).prop_map(|s| Expr::from(V::String(s.into()))),
        any::<bool>().prop_map(Expr::boolean),
        Just(Expr::from(V::Double(f64::NAN))),
        prop::sample::select(vars()).prop_map(Expr::VarRef),
    ]
}

fn expr() -> impl Strategy<Value = Expr> {
    let sc = Arc::new(StaticContext::default());
    leaf().prop_recursive(3, 24, 3, move |inner| {
        let (sc_v, sc_g) = (sc.clone(), sc.clone());
        prop_oneof![
            (inner.clone(), inner.clone(), prop::sample::select(OpV::ALL.to_vec())).prop_map(
                move |(l, r, op)| Expr::from(CmpV::new(l, r, op, None, sc_v.clone(), None))
            ),
            (inner.clone(), inner.clone(), prop::sample::select(OpV::ALL.to_vec())).prop_map(
                move |(l, r, op)| Expr::from(CmpG::new(l, r, OpG::from(op), None, sc_g.clone(), None))
            ),
            inner.clone().prop_map(Expr::not),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, t, e)| Expr::if_then_else(c, t, e)),
            prop::collection::vec(inner, 0..3).prop_map(Expr::List),
        ]
    })
}

fn bindings() -> impl Strategy<Value = QueryContext> {
    (
        -3i128..3,
        prop::sample::select(vec![f64::NAN, -1.0, 0.0, 2.5]),
        any::<bool>(),
        prop::sample::select(vec!["1", "abc", "2.5", ""]),
        prop::option::of(-3i128..3),
        prop::sample::select(vec!["a", "1", "B"]),
    )
        .prop_map(|(x, d, b, text, o, s)| {
            let mut doc = DocumentBuilder::new();
            doc.start_element(QName::local("e")).text(text).end_element();
            let node = doc.build().root().children()[0].clone();
            let values: Vec<Vec<XdmItem>> = vec![
                vec![V::Integer(x).into()],
                vec![V::Double(d).into()],
                vec![V::Boolean(b).into()],
                vec![XdmItem::Node(node)],
                o.map(|i| vec![V::Integer(i).into()]).unwrap_or_default(),
                vec![V::String(s.into()).into()],
            ];
            let mut qc = QueryContext::default();
            for (var, value) in vars().iter().zip(values) {
                qc.bind(var, value).unwrap();
            }
            qc
        })
}

fn outcome(e: &Expr, qc: &QueryContext) -> Result<Vec<String>, Discriminant<ErrorKind>> {
    e.evaluate(qc)
        .map(|seq| seq.iter().map(ToString::to_string).collect())
        .map_err(|err| discriminant(&err.kind))
}

fn optimize(e: Expr) -> Expr {
    let mut cc = CompileContext::new(Arc::new(StaticContext::default()));
    e.optimize(&mut cc).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn prop_optimizer_preserves_results(e in expr(), qc in bindings()) {
        let optimized = optimize(e.clone());
        prop_assert_eq!(outcome(&e, &qc), outcome(&optimized, &qc), "{} => {}", e, optimized);
    }

    #[test]
    fn prop_optimizer_is_idempotent(e in expr()) {
        let once = optimize(e);
        let twice = optimize(once.clone());
        prop_assert_eq!(&once, &twice, "{} => {}", once, twice);
    }
}
