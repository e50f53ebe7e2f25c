use core::fmt;
use std::sync::Arc;

use crate::compiler::{CompileContext, VarMap};
use crate::engine::atomize::atomic_item;
use crate::engine::collation::Collation;
use crate::engine::compare::compare_atomic;
use crate::engine::runtime::{Error, InputInfo, QueryContext, StaticContext};
use crate::xdm::XdmAtomicValue;
use crate::xdm::XdmItem;
use crate::xdm::types::{AtomicType, SeqType};

use super::{CmpG, Expr, OpV, fmt_binary, literal_of};

/// Value comparison (`eq`, `ne`, `lt`, `le`, `gt`, `ge`).
///
/// Evaluates to `true`, `false`, or the empty sequence when either operand is
/// empty. Both operands must atomize to at most one value.
#[derive(Clone)]
pub struct CmpV {
    pub left: Expr,
    pub right: Expr,
    pub op: OpV,
    /// `None` selects the default collation of `sc`.
    pub collation: Option<Arc<dyn Collation>>,
    pub sc: Arc<StaticContext>,
    pub info: Option<InputInfo>,
    pub seq_type: SeqType,
}

impl CmpV {
    pub fn new(
        left: Expr,
        right: Expr,
        op: OpV,
        collation: Option<Arc<dyn Collation>>,
        sc: Arc<StaticContext>,
        info: Option<InputInfo>,
    ) -> Self {
        Self {
            left,
            right,
            op,
            collation,
            sc,
            info,
            seq_type: SeqType::BOOLEAN_ZO,
        }
    }

    pub fn collation(&self) -> &dyn Collation {
        self.collation
            .as_deref()
            .unwrap_or(self.sc.default_collation.as_ref())
    }

    pub fn evaluate(&self, qc: &QueryContext) -> Result<Option<bool>, Error> {
        let info = self.info.as_ref();
        let Some(a) = atomic_item(&self.left, qc).map_err(|e| e.with_info(info))? else {
            return Ok(None);
        };
        let Some(b) = atomic_item(&self.right, qc).map_err(|e| e.with_info(info))? else {
            return Ok(None);
        };
        compare_atomic(self.op, &a, &b, self.collation(), &self.sc)
            .map(Some)
            .map_err(|e| e.with_info(info))
    }

    /// Literal with a single atomic value on the left and anything but a literal
    /// on the right. Evaluating such a literal never fails, so exchanging the
    /// operands keeps the order of errors.
    fn should_swap(&self) -> bool {
        matches!(&self.left, Expr::Literal(seq) if matches!(seq.as_slice(), [XdmItem::Atomic(_)]))
            && !self.right.is_value()
    }

    pub fn optimize(mut self, cc: &mut CompileContext) -> Result<Expr, Error> {
        self.left = self.left.optimize(cc)?;
        self.right = self.right.optimize(cc)?;

        if self.should_swap() {
            let before = self.to_string();
            core::mem::swap(&mut self.left, &mut self.right);
            self.op = self.op.swap();
            cc.info(format!("swap operands: {before} -> {self}"));
        }

        let (lt, rt) = (self.left.seq_type(), self.right.seq_type());
        // the left operand is atomized first; an empty right operand is only
        // reached when the left one cannot fail
        if (lt.zero() && self.left.is_infallible())
            || (rt.zero() && self.right.is_infallible() && self.left.atomizes_safely())
        {
            return Ok(cc.replace_with("empty operand", &self, Expr::empty()));
        }

        if self.left.is_value() && self.right.is_value() {
            match self.evaluate(&cc.qc) {
                Ok(result) => {
                    return Ok(cc.replace_with("pre-evaluate", &self, literal_of(result)));
                }
                Err(error) => {
                    tracing::debug!(%error, expr = %self, "comparison left for evaluation time");
                }
            }
        }

        if lt.one_no_array() && rt.one_no_array() {
            self.seq_type = SeqType::BOOLEAN_ONE;
            if let (Some(t1), Some(t2)) = (lt.item.atomized(), rt.item.atomized())
                && narrows_to_general(t1, t2, self.op)
            {
                let cmp = CmpG::new(
                    self.left.clone(),
                    self.right.clone(),
                    self.op.into(),
                    self.collation.clone(),
                    self.sc.clone(),
                    self.info.clone(),
                );
                return Ok(cc.replace_with("singleton comparison", &self, cmp.into()));
            }
        }
        Ok(self.into())
    }

    /// `x eq true()` and `x ne false()` become `x` for a boolean `x`.
    pub fn optimize_ebv(self, cc: &mut CompileContext) -> Result<Expr, Error> {
        if boolean_identity(&self.left, self.op, &self.right) {
            let left = self.left.clone();
            return Ok(cc.replace_with("simplify boolean comparison", &self, left));
        }
        Ok(self.into())
    }

    /// Negated comparison, when both operands are singletons and negation is
    /// exact. Ordering operators are only inverted if no operand can be NaN.
    pub fn invert(&self, cc: &mut CompileContext) -> Result<Expr, Error> {
        if !inverts_exactly(&self.left, &self.right, self.op) {
            return Ok(self.clone().into());
        }
        let mut inverted = self.clone();
        inverted.op = self.op.invert();
        inverted.seq_type = SeqType::BOOLEAN_ONE;
        cc.info(format!("invert: not({self}) -> {inverted}"));
        inverted.optimize(cc)
    }

    pub fn copy(&self, vm: &VarMap) -> CmpV {
        CmpV {
            left: self.left.copy(vm),
            right: self.right.copy(vm),
            op: self.op,
            collation: self.collation.clone(),
            sc: self.sc.clone(),
            info: self.info.clone(),
            seq_type: self.seq_type,
        }
    }

    pub fn description(&self) -> String {
        format!("'{}' comparison", self.op)
    }
}

/// Condition under which a singleton value comparison may run as a general
/// comparison. `xs:anyAtomicType` says nothing about the runtime type and is
/// excluded.
pub(crate) fn narrows_to_general(t1: AtomicType, t2: AtomicType, op: OpV) -> bool {
    (t1 == t2 && !t1.is_any_atomic() && (t1.is_sortable() || op.is_equality()))
        || (t1.is_string_or_untyped() && t2.is_string_or_untyped())
        || (t1.is_numeric() && t2.is_numeric())
        || (t1.is_duration() && t2.is_duration())
}

pub(crate) fn boolean_identity(left: &Expr, op: OpV, right: &Expr) -> bool {
    let expected = match op {
        OpV::Eq => true,
        OpV::Ne => false,
        _ => return false,
    };
    left.seq_type() == SeqType::BOOLEAN_ONE
        && matches!(right, Expr::Literal(seq)
            if matches!(seq.as_slice(), [XdmItem::Atomic(XdmAtomicValue::Boolean(b))] if *b == expected))
}

/// Negating the comparison equals comparing with the inverted operator: both
/// operands are singletons, and for ordering operators neither can be NaN.
pub(crate) fn inverts_exactly(left: &Expr, right: &Expr, op: OpV) -> bool {
    let (lt, rt) = (left.seq_type(), right.seq_type());
    lt.one_no_array() && rt.one_no_array() && (op.is_equality() || !(may_be_nan(lt) || may_be_nan(rt)))
}

fn may_be_nan(st: SeqType) -> bool {
    match st.item.atomized() {
        Some(t) => matches!(
            t,
            AtomicType::Double
                | AtomicType::Float
                | AtomicType::Numeric
                | AtomicType::AnyAtomicType
                | AtomicType::UntypedAtomic
        ),
        None => true,
    }
}

impl PartialEq for CmpV {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op
            && self.left == other.left
            && self.right == other.right
            && self.collation.as_ref().map(|c| c.uri()) == other.collation.as_ref().map(|c| c.uri())
            && self.seq_type == other.seq_type
    }
}

impl fmt::Debug for CmpV {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmpV")
            .field("op", &self.op)
            .field("left", &self.left)
            .field("right", &self.right)
            .field("collation", &self.collation.as_ref().map(|c| c.uri().to_string()))
            .field("seq_type", &self.seq_type)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CmpV {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_binary(f, &self.left, &self.op, &self.right)
    }
}
