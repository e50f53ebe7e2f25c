use smallvec::SmallVec;

use crate::engine::runtime::{Error, QueryContext};
use crate::expr::Expr;
use crate::xdm::{XdmAtomicValue, XdmItem};

/// Atomized values; comparisons mostly see one or two.
pub type Atoms = SmallVec<[XdmAtomicValue; 2]>;

fn push_atoms(item: &XdmItem, out: &mut Atoms) {
    match item {
        XdmItem::Atomic(a) => out.push(a.clone()),
        XdmItem::Node(n) => out.push(n.typed_value()),
        XdmItem::Array(members) => {
            for it in members.iter().flatten() {
                push_atoms(it, out);
            }
        }
    }
}

pub fn atomize<'a>(items: impl IntoIterator<Item = &'a XdmItem>) -> Atoms {
    let mut out = Atoms::new();
    for it in items {
        push_atoms(it, &mut out);
    }
    out
}

/// Evaluate `expr` and atomize it to at most one value.
///
/// An empty result yields `None`; more than one atomic value is a
/// `SequenceTooLong` error.
pub fn atomic_item(expr: &Expr, qc: &QueryContext) -> Result<Option<XdmAtomicValue>, Error> {
    let seq = expr.evaluate(qc)?;
    let mut atoms = atomize(&seq);
    match atoms.len() {
        0 => Ok(None),
        1 => Ok(atoms.pop()),
        n => Err(Error::sequence_too_long(n)),
    }
}
