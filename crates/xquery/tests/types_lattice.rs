use std::sync::Arc;

use rstest::rstest;
use xqe_xquery::{AtomicType, ItemType, Occurrence, SeqType, XdmAtomicValue as V, XdmItem};

#[rstest]
#[case(AtomicType::Integer, AtomicType::Decimal, true)]
#[case(AtomicType::Integer, AtomicType::Numeric, true)]
#[case(AtomicType::Decimal, AtomicType::Integer, false)]
#[case(AtomicType::DayTimeDuration, AtomicType::Duration, true)]
#[case(AtomicType::String, AtomicType::AnyAtomicType, true)]
#[case(AtomicType::AnyUri, AtomicType::String, false)]
fn derivation(#[case] t: AtomicType, #[case] of: AtomicType, #[case] expected: bool) {
    assert_eq!(t.instance_of(of), expected);
}

#[rstest]
#[case(AtomicType::Integer, AtomicType::Double, AtomicType::Numeric)]
#[case(AtomicType::Integer, AtomicType::Decimal, AtomicType::Decimal)]
#[case(AtomicType::YearMonthDuration, AtomicType::DayTimeDuration, AtomicType::Duration)]
#[case(AtomicType::String, AtomicType::Integer, AtomicType::AnyAtomicType)]
fn common_supertype(#[case] a: AtomicType, #[case] b: AtomicType, #[case] expected: AtomicType) {
    assert_eq!(a.common_supertype(b), expected);
    assert_eq!(b.common_supertype(a), expected);
}

#[rstest]
fn names_resolve_back_to_types() {
    for t in AtomicType::ALL {
        assert_eq!(AtomicType::from_name(t.name()), Some(t));
    }
    assert_eq!(AtomicType::from_name("integer"), Some(AtomicType::Integer));
    assert_eq!(AtomicType::from_name("xs:int"), None);
}

#[rstest]
#[case(Occurrence::One, Occurrence::One, Occurrence::OneOrMore)]
#[case(Occurrence::Zero, Occurrence::One, Occurrence::One)]
#[case(Occurrence::ZeroOrOne, Occurrence::Zero, Occurrence::ZeroOrOne)]
#[case(Occurrence::ZeroOrOne, Occurrence::One, Occurrence::OneOrMore)]
#[case(Occurrence::ZeroOrMore, Occurrence::One, Occurrence::OneOrMore)]
fn occurrence_of_concatenation(#[case] a: Occurrence, #[case] b: Occurrence, #[case] expected: Occurrence) {
    assert_eq!(a.concat(b), expected);
}

#[rstest]
#[case(Occurrence::One, Occurrence::Zero, Occurrence::ZeroOrOne)]
#[case(Occurrence::One, Occurrence::OneOrMore, Occurrence::OneOrMore)]
#[case(Occurrence::Zero, Occurrence::ZeroOrMore, Occurrence::ZeroOrMore)]
fn occurrence_of_alternatives(#[case] a: Occurrence, #[case] b: Occurrence, #[case] expected: Occurrence) {
    assert_eq!(a.union(b), expected);
}

#[rstest]
fn single_item_without_arrays() {
    assert!(SeqType::atomic(AtomicType::Integer, Occurrence::One).one_no_array());
    assert!(SeqType::new(ItemType::Node, Occurrence::One).one_no_array());
    assert!(!SeqType::new(ItemType::Array, Occurrence::One).one_no_array());
    assert!(!SeqType::new(ItemType::Item, Occurrence::One).one_no_array());
    assert!(!SeqType::atomic(AtomicType::Integer, Occurrence::ZeroOrOne).one_no_array());
}

#[rstest]
fn static_type_of_values() {
    assert_eq!(SeqType::of_value(&vec![]), SeqType::EMPTY);
    let mixed: Vec<XdmItem> = vec![V::Integer(1).into(), V::Double(2.0).into()];
    assert_eq!(
        SeqType::of_value(&mixed),
        SeqType::atomic(AtomicType::Numeric, Occurrence::OneOrMore)
    );
    let array = vec![XdmItem::Array(Arc::new(vec![]))];
    assert_eq!(SeqType::of_value(&array), SeqType::new(ItemType::Array, Occurrence::One));
}

#[rstest]
fn matching_honours_derivation_and_cardinality() {
    let decimals = SeqType::atomic(AtomicType::Decimal, Occurrence::ZeroOrMore);
    assert!(decimals.matches(&vec![V::Integer(1).into(), V::Integer(2).into()]));
    assert!(decimals.matches(&vec![]));
    assert!(!decimals.matches(&vec![V::Double(1.0).into()]));
    let one = SeqType::atomic(AtomicType::Integer, Occurrence::One);
    assert!(!one.matches(&vec![]));
}

#[rstest]
#[case(SeqType::EMPTY, "empty-sequence()")]
#[case(SeqType::ITEM_ZM, "item()*")]
#[case(SeqType::BOOLEAN_ZO, "xs:boolean?")]
#[case(SeqType::new(ItemType::Node, Occurrence::OneOrMore), "node()+")]
fn display(#[case] st: SeqType, #[case] expected: &str) {
    assert_eq!(st.to_string(), expected);
}

#[rstest]
fn node_items_atomize_to_untyped() {
    assert_eq!(ItemType::Node.atomized(), Some(AtomicType::UntypedAtomic));
    assert_eq!(ItemType::Array.atomized(), None);
    assert_eq!(
        ItemType::Atomic(AtomicType::Integer).union(ItemType::Atomic(AtomicType::Float)),
        ItemType::Atomic(AtomicType::Numeric)
    );
    assert_eq!(ItemType::Node.union(ItemType::Atomic(AtomicType::String)), ItemType::Item);
}
