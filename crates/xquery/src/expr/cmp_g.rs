use core::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::compiler::{CompileContext, VarMap};
use crate::engine::atomize::atomize;
use crate::engine::collation::Collation;
use crate::engine::compare::compare_atomic;
use crate::engine::runtime::{Error, InputInfo, QueryContext, StaticContext};
use crate::xdm::XdmItem;

use super::cmp_v::{boolean_identity, inverts_exactly};
use super::{Expr, OpG, fmt_binary};

/// General comparison: true if some pair of atomized operand values satisfies
/// the corresponding value comparison. Empty operands yield `false`.
#[derive(Clone)]
pub struct CmpG {
    pub left: Expr,
    pub right: Expr,
    pub op: OpG,
    pub collation: Option<Arc<dyn Collation>>,
    pub sc: Arc<StaticContext>,
    pub info: Option<InputInfo>,
}

impl CmpG {
    pub fn new(
        left: Expr,
        right: Expr,
        op: OpG,
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
        }
    }

    pub fn collation(&self) -> &dyn Collation {
        self.collation
            .as_deref()
            .unwrap_or(self.sc.default_collation.as_ref())
    }

    pub fn evaluate(&self, qc: &QueryContext) -> Result<bool, Error> {
        let info = self.info.as_ref();
        let left = atomize(&self.left.evaluate(qc).map_err(|e| e.with_info(info))?);
        if left.is_empty() {
            return Ok(false);
        }
        let right = atomize(&self.right.evaluate(qc).map_err(|e| e.with_info(info))?);
        let op = self.op.op_v();
        for (a, b) in left.iter().cartesian_product(right.iter()) {
            if compare_atomic(op, a, b, self.collation(), &self.sc).map_err(|e| e.with_info(info))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn optimize(mut self, cc: &mut CompileContext) -> Result<Expr, Error> {
        self.left = self.left.optimize(cc)?;
        self.right = self.right.optimize(cc)?;

        if matches!(&self.left, Expr::Literal(seq) if matches!(seq.as_slice(), [XdmItem::Atomic(_)]))
            && !self.right.is_value()
        {
            let before = self.to_string();
            core::mem::swap(&mut self.left, &mut self.right);
            self.op = self.op.swap();
            cc.info(format!("swap operands: {before} -> {self}"));
        }

        let (lt, rt) = (self.left.seq_type(), self.right.seq_type());
        // atomizing a whole sequence cannot fail
        if self.left.is_infallible() && (lt.zero() || (rt.zero() && self.right.is_infallible())) {
            return Ok(cc.replace_with("empty operand", &self, Expr::boolean(false)));
        }

        if self.left.is_value() && self.right.is_value() {
            match self.evaluate(&cc.qc) {
                Ok(b) => return Ok(cc.replace_with("pre-evaluate", &self, Expr::boolean(b))),
                Err(error) => {
                    tracing::debug!(%error, expr = %self, "comparison left for evaluation time");
                }
            }
        }
        Ok(self.into())
    }

    pub fn optimize_ebv(self, cc: &mut CompileContext) -> Result<Expr, Error> {
        let op = self.op.op_v();
        if matches!(self.op, OpG::Eq | OpG::Ne) && boolean_identity(&self.left, op, &self.right) {
            let left = self.left.clone();
            return Ok(cc.replace_with("simplify boolean comparison", &self, left));
        }
        Ok(self.into())
    }

    /// Negated comparison for singleton operands; same conditions as
    /// [`CmpV::invert`](super::CmpV::invert).
    pub fn invert(&self, cc: &mut CompileContext) -> Result<Expr, Error> {
        if !inverts_exactly(&self.left, &self.right, self.op.op_v()) {
            return Ok(self.clone().into());
        }
        let mut inverted = self.clone();
        inverted.op = OpG::from(self.op.op_v().invert());
        cc.info(format!("invert: not({self}) -> {inverted}"));
        inverted.optimize(cc)
    }

    pub fn copy(&self, vm: &VarMap) -> CmpG {
        CmpG {
            left: self.left.copy(vm),
            right: self.right.copy(vm),
            op: self.op,
            collation: self.collation.clone(),
            sc: self.sc.clone(),
            info: self.info.clone(),
        }
    }

    pub fn description(&self) -> String {
        format!("'{}' comparison", self.op)
    }
}

impl PartialEq for CmpG {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op
            && self.left == other.left
            && self.right == other.right
            && self.collation.as_ref().map(|c| c.uri()) == other.collation.as_ref().map(|c| c.uri())
    }
}

impl fmt::Debug for CmpG {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmpG")
            .field("op", &self.op)
            .field("left", &self.left)
            .field("right", &self.right)
            .field("collation", &self.collation.as_ref().map(|c| c.uri().to_string()))
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CmpG {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_binary(f, &self.left, &self.op, &self.right)
    }
}
