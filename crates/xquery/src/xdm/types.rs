//! Static type lattice used by the comparison optimizer.
//!
//! [`AtomicType`] forms a tree rooted at `xs:anyAtomicType`. [`SeqType`] pairs an
//! [`ItemType`] with an [`Occurrence`]; it is what every expression reports as its
//! static type.

use core::fmt;

use super::{XdmAtomicValue, XdmItem, XdmSequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomicType {
    AnyAtomicType,
    UntypedAtomic,
    String,
    AnyUri,
    Boolean,
    Numeric,
    Decimal,
    Integer,
    Float,
    Double,
    Duration,
    YearMonthDuration,
    DayTimeDuration,
    DateTime,
    Date,
    Time,
    QName,
    Notation,
    Base64Binary,
    HexBinary,
}

impl AtomicType {
    pub const ALL: [AtomicType; 20] = [
        AtomicType::AnyAtomicType,
        AtomicType::UntypedAtomic,
        AtomicType::String,
        AtomicType::AnyUri,
        AtomicType::Boolean,
        AtomicType::Numeric,
        AtomicType::Decimal,
        AtomicType::Integer,
        AtomicType::Float,
        AtomicType::Double,
        AtomicType::Duration,
        AtomicType::YearMonthDuration,
        AtomicType::DayTimeDuration,
        AtomicType::DateTime,
        AtomicType::Date,
        AtomicType::Time,
        AtomicType::QName,
        AtomicType::Notation,
        AtomicType::Base64Binary,
        AtomicType::HexBinary,
    ];

    /// Direct supertype; `None` only for `xs:anyAtomicType`.
    pub fn parent(self) -> Option<AtomicType> {
        use AtomicType::*;
        match self {
            AnyAtomicType => None,
            Decimal | Float | Double => Some(Numeric),
            Integer => Some(Decimal),
            YearMonthDuration | DayTimeDuration => Some(Duration),
            _ => Some(AnyAtomicType),
        }
    }

    /// `true` if `self` is `other` or derived from it.
    pub fn instance_of(self, other: AtomicType) -> bool {
        let mut cur = Some(self);
        while let Some(t) = cur {
            if t == other {
                return true;
            }
            cur = t.parent();
        }
        false
    }

    pub fn is_numeric(self) -> bool {
        self.instance_of(AtomicType::Numeric)
    }

    pub fn is_string_or_untyped(self) -> bool {
        matches!(self, AtomicType::String | AtomicType::AnyUri | AtomicType::UntypedAtomic)
    }

    pub fn is_duration(self) -> bool {
        self.instance_of(AtomicType::Duration)
    }

    /// A total order exists on the values of this type.
    pub fn is_sortable(self) -> bool {
        !matches!(
            self,
            AtomicType::AnyAtomicType
                | AtomicType::Duration
                | AtomicType::QName
                | AtomicType::Notation
                | AtomicType::Base64Binary
                | AtomicType::HexBinary
        )
    }

    pub fn is_any_atomic(self) -> bool {
        self == AtomicType::AnyAtomicType
    }

    pub fn is_binary(self) -> bool {
        matches!(self, AtomicType::Base64Binary | AtomicType::HexBinary)
    }

    /// Least common ancestor of both types in the lattice.
    pub fn common_supertype(self, other: AtomicType) -> AtomicType {
        let mut cur = Some(self);
        while let Some(t) = cur {
            if other.instance_of(t) {
                return t;
            }
            cur = t.parent();
        }
        AtomicType::AnyAtomicType
    }

    pub fn name(self) -> &'static str {
        use AtomicType::*;
        match self {
            AnyAtomicType => "xs:anyAtomicType",
            UntypedAtomic => "xs:untypedAtomic",
            String => "xs:string",
            AnyUri => "xs:anyURI",
            Boolean => "xs:boolean",
            Numeric => "xs:numeric",
            Decimal => "xs:decimal",
            Integer => "xs:integer",
            Float => "xs:float",
            Double => "xs:double",
            Duration => "xs:duration",
            YearMonthDuration => "xs:yearMonthDuration",
            DayTimeDuration => "xs:dayTimeDuration",
            DateTime => "xs:dateTime",
            Date => "xs:date",
            Time => "xs:time",
            QName => "xs:QName",
            Notation => "xs:NOTATION",
            Base64Binary => "xs:base64Binary",
            HexBinary => "xs:hexBinary",
        }
    }

    /// Resolve a type by its `xs:`-prefixed (or bare local) name.
    pub fn from_name(name: &str) -> Option<AtomicType> {
        let local = name.strip_prefix("xs:").unwrap_or(name);
        Self::ALL
            .iter()
            .copied()
            .find(|t| &t.name()[3..] == local)
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// `item()`: nothing is known about the item.
    Item,
    Node,
    Atomic(AtomicType),
    Array,
}

impl ItemType {
    /// Static type of the atomized value, if atomization yields a single atomic
    /// per item. Arrays and `item()` may atomize to several items.
    pub fn atomized(self) -> Option<AtomicType> {
        match self {
            ItemType::Atomic(t) => Some(t),
            ItemType::Node => Some(AtomicType::UntypedAtomic),
            ItemType::Item | ItemType::Array => None,
        }
    }

    pub fn union(self, other: ItemType) -> ItemType {
        match (self, other) {
            (a, b) if a == b => a,
            (ItemType::Atomic(a), ItemType::Atomic(b)) => ItemType::Atomic(a.common_supertype(b)),
            _ => ItemType::Item,
        }
    }

    pub fn of_item(item: &XdmItem) -> ItemType {
        match item {
            XdmItem::Atomic(a) => ItemType::Atomic(a.atomic_type()),
            XdmItem::Node(_) => ItemType::Node,
            XdmItem::Array(_) => ItemType::Array,
        }
    }

    pub fn matches(self, item: &XdmItem) -> bool {
        match (self, item) {
            (ItemType::Item, _) => true,
            (ItemType::Node, XdmItem::Node(_)) | (ItemType::Array, XdmItem::Array(_)) => true,
            (ItemType::Atomic(t), XdmItem::Atomic(a)) => a.atomic_type().instance_of(t),
            _ => false,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Item => f.write_str("item()"),
            ItemType::Node => f.write_str("node()"),
            ItemType::Atomic(t) => f.write_str(t.name()),
            ItemType::Array => f.write_str("array(*)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occurrence {
    Zero,
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Occurrence {
    pub fn min(self) -> usize {
        match self {
            Occurrence::One | Occurrence::OneOrMore => 1,
            _ => 0,
        }
    }

    /// Upper bound; `None` means unbounded.
    pub fn max(self) -> Option<usize> {
        match self {
            Occurrence::Zero => Some(0),
            Occurrence::One | Occurrence::ZeroOrOne => Some(1),
            Occurrence::ZeroOrMore | Occurrence::OneOrMore => None,
        }
    }

    pub fn from_bounds(min: usize, max: Option<usize>) -> Occurrence {
        match (min, max) {
            (_, Some(0)) => Occurrence::Zero,
            (0, Some(1)) => Occurrence::ZeroOrOne,
            (_, Some(1)) => Occurrence::One,
            (0, _) => Occurrence::ZeroOrMore,
            _ => Occurrence::OneOrMore,
        }
    }

    /// Occurrence of the concatenation of two sequences.
    pub fn concat(self, other: Occurrence) -> Occurrence {
        let max = match (self.max(), other.max()) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };
        Occurrence::from_bounds(self.min() + other.min(), max)
    }

    /// Occurrence of a value that is either one or the other.
    pub fn union(self, other: Occurrence) -> Occurrence {
        let max = match (self.max(), other.max()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        Occurrence::from_bounds(self.min().min(other.min()), max)
    }

    pub fn allows(self, count: usize) -> bool {
        count >= self.min() && self.max().is_none_or(|m| count <= m)
    }

    fn indicator(self) -> &'static str {
        match self {
            Occurrence::Zero | Occurrence::One => "",
            Occurrence::ZeroOrOne => "?",
            Occurrence::ZeroOrMore => "*",
            Occurrence::OneOrMore => "+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeqType {
    pub item: ItemType,
    pub occ: Occurrence,
}

impl SeqType {
    pub const EMPTY: SeqType = SeqType { item: ItemType::Item, occ: Occurrence::Zero };
    pub const ITEM_ZM: SeqType = SeqType { item: ItemType::Item, occ: Occurrence::ZeroOrMore };
    pub const BOOLEAN_ONE: SeqType = SeqType::atomic(AtomicType::Boolean, Occurrence::One);
    pub const BOOLEAN_ZO: SeqType = SeqType::atomic(AtomicType::Boolean, Occurrence::ZeroOrOne);

    pub const fn new(item: ItemType, occ: Occurrence) -> Self {
        Self { item, occ }
    }

    pub const fn atomic(t: AtomicType, occ: Occurrence) -> Self {
        Self { item: ItemType::Atomic(t), occ }
    }

    pub fn zero(&self) -> bool {
        self.occ == Occurrence::Zero
    }

    pub fn one(&self) -> bool {
        self.occ == Occurrence::One
    }

    pub fn zero_or_one(&self) -> bool {
        self.occ.max().is_some_and(|m| m <= 1)
    }

    /// Exactly one item that is known to atomize to a single atomic value.
    pub fn one_no_array(&self) -> bool {
        self.one() && matches!(self.item, ItemType::Node | ItemType::Atomic(_))
    }

    /// Exact static type of a sequence value.
    pub fn of_value(seq: &XdmSequence) -> SeqType {
        let mut iter = seq.iter();
        let Some(first) = iter.next() else {
            return SeqType::EMPTY;
        };
        let item = iter.fold(ItemType::of_item(first), |acc, it| acc.union(ItemType::of_item(it)));
        SeqType::new(item, Occurrence::from_bounds(seq.len(), Some(seq.len())))
    }

    pub fn matches(&self, seq: &XdmSequence) -> bool {
        self.occ.allows(seq.len()) && seq.iter().all(|it| self.item.matches(it))
    }

    pub fn union(self, other: SeqType) -> SeqType {
        if self.zero() {
            return SeqType::new(other.item, other.occ.union(Occurrence::Zero));
        }
        if other.zero() {
            return SeqType::new(self.item, self.occ.union(Occurrence::Zero));
        }
        SeqType::new(self.item.union(other.item), self.occ.union(other.occ))
    }

    pub fn concat(self, other: SeqType) -> SeqType {
        let item = match (self.zero(), other.zero()) {
            (true, _) => other.item,
            (_, true) => self.item,
            _ => self.item.union(other.item),
        };
        SeqType::new(item, self.occ.concat(other.occ))
    }
}

impl fmt::Display for SeqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.zero() {
            return f.write_str("empty-sequence()");
        }
        write!(f, "{}{}", self.item, self.occ.indicator())
    }
}

// Keeps the typed-value helper close to the lattice it reports into.
impl XdmAtomicValue {
    pub fn atomic_type(&self) -> AtomicType {
        use XdmAtomicValue as V;
        match self {
            V::Boolean(_) => AtomicType::Boolean,
            V::String(_) => AtomicType::String,
            V::UntypedAtomic(_) => AtomicType::UntypedAtomic,
            V::AnyUri(_) => AtomicType::AnyUri,
            V::Integer(_) => AtomicType::Integer,
            V::Decimal(_) => AtomicType::Decimal,
            V::Float(_) => AtomicType::Float,
            V::Double(_) => AtomicType::Double,
            V::Duration { .. } => AtomicType::Duration,
            V::YearMonthDuration(_) => AtomicType::YearMonthDuration,
            V::DayTimeDuration(_) => AtomicType::DayTimeDuration,
            V::DateTime { .. } => AtomicType::DateTime,
            V::Date { .. } => AtomicType::Date,
            V::Time { .. } => AtomicType::Time,
            V::QName { .. } => AtomicType::QName,
            V::Notation(_) => AtomicType::Notation,
            V::Base64Binary(_) => AtomicType::Base64Binary,
            V::HexBinary(_) => AtomicType::HexBinary,
        }
    }
}
