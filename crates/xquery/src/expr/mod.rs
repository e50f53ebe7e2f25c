//! Expression tree around the comparison nodes.
//!
//! Besides [`CmpV`] and [`CmpG`] the tree knows only the shapes needed to host
//! comparisons: literals, variable references, sequence constructors, `not(...)`
//! and conditionals. Every node reports a static type, evaluates against a
//! [`QueryContext`], optimizes into a new tree and copies through a [`VarMap`].

use core::fmt;

use crate::compiler::{CompileContext, VarMap};
use crate::engine::runtime::{Error, ErrorCode, QueryContext};
use crate::xdm::lexical;
use crate::xdm::types::{ItemType, SeqType};
use crate::xdm::{XdmAtomicValue, XdmItem, XdmSequence};

mod cmp_g;
mod cmp_v;
mod op;
pub mod plan;
mod var;

pub use cmp_g::CmpG;
pub use cmp_v::CmpV;
pub use op::{OpG, OpV};
pub use var::{Var, VarId};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(XdmSequence),
    VarRef(Var),
    /// Sequence constructor `(a, b, ...)`.
    List(Vec<Expr>),
    CmpV(Box<CmpV>),
    CmpG(Box<CmpG>),
    Not(Box<Expr>),
    If(Box<IfExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfExpr {
    pub cond: Expr,
    pub then: Expr,
    pub otherwise: Expr,
}

impl From<CmpV> for Expr {
    fn from(c: CmpV) -> Self {
        Expr::CmpV(Box::new(c))
    }
}

impl From<CmpG> for Expr {
    fn from(c: CmpG) -> Self {
        Expr::CmpG(Box::new(c))
    }
}

impl From<XdmAtomicValue> for Expr {
    fn from(a: XdmAtomicValue) -> Self {
        Expr::Literal(vec![XdmItem::Atomic(a)])
    }
}

impl Expr {
    pub fn empty() -> Expr {
        Expr::Literal(Vec::new())
    }

    pub fn boolean(b: bool) -> Expr {
        XdmAtomicValue::Boolean(b).into()
    }

    pub fn not(e: Expr) -> Expr {
        Expr::Not(Box::new(e))
    }

    pub fn if_then_else(cond: Expr, then: Expr, otherwise: Expr) -> Expr {
        Expr::If(Box::new(IfExpr {
            cond,
            then,
            otherwise,
        }))
    }

    pub fn seq_type(&self) -> SeqType {
        match self {
            Expr::Literal(seq) => SeqType::of_value(seq),
            Expr::VarRef(v) => v.seq_type,
            Expr::List(items) => items
                .iter()
                .fold(SeqType::EMPTY, |acc, e| acc.concat(e.seq_type())),
            Expr::CmpV(c) => c.seq_type,
            Expr::CmpG(_) | Expr::Not(_) => SeqType::BOOLEAN_ONE,
            Expr::If(i) => i.then.seq_type().union(i.otherwise.seq_type()),
        }
    }

    /// The expression is a compile-time value.
    pub fn is_value(&self) -> bool {
        matches!(self, Expr::Literal(_))
    }

    /// Evaluation cannot raise an error. Only literals qualify: a variable may
    /// be unbound and a sequence constructor observes cancellation.
    pub fn is_infallible(&self) -> bool {
        self.is_value()
    }

    /// Atomizing the result cannot fail and yields at most one value.
    pub fn atomizes_safely(&self) -> bool {
        let st = self.seq_type();
        self.is_infallible()
            && st.zero_or_one()
            && (st.zero() || matches!(st.item, ItemType::Node | ItemType::Atomic(_)))
    }

    pub fn evaluate(&self, qc: &QueryContext) -> Result<XdmSequence, Error> {
        match self {
            Expr::Literal(seq) => Ok(seq.clone()),
            Expr::VarRef(v) => qc.variable(v).cloned(),
            Expr::List(items) => {
                let mut out = XdmSequence::new();
                for e in items {
                    qc.check_stop()?;
                    out.extend(e.evaluate(qc)?);
                }
                Ok(out)
            }
            Expr::CmpV(c) => Ok(c
                .evaluate(qc)?
                .map(|b| vec![XdmItem::Atomic(XdmAtomicValue::Boolean(b))])
                .unwrap_or_default()),
            Expr::CmpG(c) => Ok(vec![XdmAtomicValue::Boolean(c.evaluate(qc)?).into()]),
            Expr::Not(e) => Ok(vec![XdmAtomicValue::Boolean(!e.ebv(qc)?).into()]),
            Expr::If(i) => {
                if i.cond.ebv(qc)? {
                    i.then.evaluate(qc)
                } else {
                    i.otherwise.evaluate(qc)
                }
            }
        }
    }

    /// Effective boolean value of the result.
    pub fn ebv(&self, qc: &QueryContext) -> Result<bool, Error> {
        match self {
            Expr::CmpV(c) => Ok(c.evaluate(qc)?.unwrap_or(false)),
            Expr::CmpG(c) => c.evaluate(qc),
            _ => ebv_of(&self.evaluate(qc)?),
        }
    }

    pub fn optimize(self, cc: &mut CompileContext) -> Result<Expr, Error> {
        match self {
            Expr::Literal(_) | Expr::VarRef(_) => Ok(self),
            Expr::List(items) => optimize_list(items, cc),
            Expr::CmpV(c) => c.optimize(cc),
            Expr::CmpG(c) => c.optimize(cc),
            Expr::Not(e) => optimize_not(*e, cc),
            Expr::If(i) => optimize_if(*i, cc),
        }
    }

    /// Rewrites that are only valid where the effective boolean value of the
    /// expression is consumed.
    pub fn optimize_ebv(self, cc: &mut CompileContext) -> Result<Expr, Error> {
        match self {
            Expr::CmpV(c) => c.optimize_ebv(cc),
            Expr::CmpG(c) => c.optimize_ebv(cc),
            other => Ok(other),
        }
    }

    /// Deep copy with variable references replaced through `vm`.
    pub fn copy(&self, vm: &VarMap) -> Expr {
        match self {
            Expr::Literal(seq) => Expr::Literal(seq.clone()),
            Expr::VarRef(v) => Expr::VarRef(vm.get(&v.id).cloned().unwrap_or_else(|| v.clone())),
            Expr::List(items) => Expr::List(items.iter().map(|e| e.copy(vm)).collect()),
            Expr::CmpV(c) => Expr::CmpV(Box::new(c.copy(vm))),
            Expr::CmpG(c) => Expr::CmpG(Box::new(c.copy(vm))),
            Expr::Not(e) => Expr::not(e.copy(vm)),
            Expr::If(i) => Expr::if_then_else(i.cond.copy(vm), i.then.copy(vm), i.otherwise.copy(vm)),
        }
    }

    /// Short description used in diagnostics.
    pub fn description(&self) -> String {
        match self {
            Expr::Literal(_) => "literal".to_string(),
            Expr::VarRef(v) => format!("variable {v}"),
            Expr::List(_) => "sequence".to_string(),
            Expr::CmpV(c) => c.description(),
            Expr::CmpG(c) => c.description(),
            Expr::Not(_) => "not".to_string(),
            Expr::If(_) => "conditional".to_string(),
        }
    }
}

pub(crate) fn ebv_of(seq: &XdmSequence) -> Result<bool, Error> {
    let ebv_error = || {
        Error::from_code(
            ErrorCode::FORG0006,
            format!("effective boolean value not defined for {}", SeqType::of_value(seq)),
        )
    };
    match seq.as_slice() {
        [] => Ok(false),
        [XdmItem::Node(_), ..] => Ok(true),
        [XdmItem::Atomic(a)] => match a {
            XdmAtomicValue::Boolean(b) => Ok(*b),
            XdmAtomicValue::String(s) | XdmAtomicValue::UntypedAtomic(s) | XdmAtomicValue::AnyUri(s) => {
                Ok(!s.is_empty())
            }
            XdmAtomicValue::Integer(i) => Ok(*i != 0),
            XdmAtomicValue::Decimal(d) => Ok(!d.is_zero()),
            XdmAtomicValue::Float(f) => Ok(*f != 0.0 && !f.is_nan()),
            XdmAtomicValue::Double(d) => Ok(*d != 0.0 && !d.is_nan()),
            _ => Err(ebv_error()),
        },
        _ => Err(ebv_error()),
    }
}

fn optimize_list(items: Vec<Expr>, cc: &mut CompileContext) -> Result<Expr, Error> {
    let mut out = Vec::with_capacity(items.len());
    for e in items {
        match e.optimize(cc)? {
            // nested sequences flatten
            Expr::List(inner) => out.extend(inner),
            Expr::Literal(seq) if seq.is_empty() => {}
            other => out.push(other),
        }
    }
    if out.iter().all(Expr::is_value) {
        let merged: XdmSequence = out
            .iter()
            .flat_map(|e| match e {
                Expr::Literal(seq) => seq.clone(),
                _ => XdmSequence::new(),
            })
            .collect();
        if out.len() <= 1 {
            return Ok(Expr::Literal(merged));
        }
        return Ok(cc.replace_with("pre-evaluate sequence", &Expr::List(out), Expr::Literal(merged)));
    }
    if out.len() == 1 {
        return Ok(out.remove(0));
    }
    Ok(Expr::List(out))
}

fn optimize_not(operand: Expr, cc: &mut CompileContext) -> Result<Expr, Error> {
    let operand = operand.optimize(cc)?.optimize_ebv(cc)?;
    match operand {
        Expr::Literal(ref seq) => match ebv_of(seq) {
            Ok(b) => {
                let before = Expr::not(operand.clone());
                Ok(cc.replace_with("pre-evaluate not", &before, Expr::boolean(!b)))
            }
            // leave the error to evaluation time
            Err(_) => Ok(Expr::not(operand)),
        },
        Expr::CmpV(c) => {
            let inverted = c.invert(cc)?;
            match inverted {
                Expr::CmpV(ref i) if i.op == c.op => Ok(Expr::not(inverted)),
                other => Ok(other),
            }
        }
        Expr::CmpG(c) => {
            let inverted = c.invert(cc)?;
            match inverted {
                Expr::CmpG(ref i) if i.op == c.op => Ok(Expr::not(inverted)),
                other => Ok(other),
            }
        }
        other => Ok(Expr::not(other)),
    }
}

fn optimize_if(i: IfExpr, cc: &mut CompileContext) -> Result<Expr, Error> {
    let cond = i.cond.optimize(cc)?.optimize_ebv(cc)?;
    let then = i.then.optimize(cc)?;
    let otherwise = i.otherwise.optimize(cc)?;
    if let Expr::Literal(seq) = &cond
        && let Ok(b) = ebv_of(seq)
    {
        let before = Expr::if_then_else(cond.clone(), then.clone(), otherwise.clone());
        let branch = if b { then } else { otherwise };
        return Ok(cc.replace_with("pre-evaluate condition", &before, branch));
    }
    Ok(Expr::if_then_else(cond, then, otherwise))
}

fn fmt_operand(e: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match e {
        Expr::CmpV(_) | Expr::CmpG(_) | Expr::If(_) => write!(f, "({e})"),
        _ => write!(f, "{e}"),
    }
}

pub(crate) fn fmt_binary(
    f: &mut fmt::Formatter<'_>,
    left: &Expr,
    op: &dyn fmt::Display,
    right: &Expr,
) -> fmt::Result {
    fmt_operand(left, f)?;
    write!(f, " {op} ")?;
    fmt_operand(right, f)
}

fn fmt_atomic(a: &XdmAtomicValue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use XdmAtomicValue as V;
    match a {
        V::Boolean(b) => write!(f, "{b}()"),
        V::String(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
        V::Integer(i) => write!(f, "{i}"),
        V::Decimal(d) => {
            let s = d.normalize().to_string();
            if s.contains('.') { f.write_str(&s) } else { write!(f, "{s}.0") }
        }
        V::Double(d) if d.is_finite() => {
            let s = lexical::format_double(*d);
            if s.contains('E') { f.write_str(&s) } else { write!(f, "{s}e0") }
        }
        other => write!(f, "{}(\"{}\")", other.atomic_type(), other.to_string().replace('"', "\"\"")),
    }
}

fn fmt_item(item: &XdmItem, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match item {
        XdmItem::Atomic(a) => fmt_atomic(a, f),
        other => write!(f, "{other}"),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(seq) => match seq.as_slice() {
                [] => f.write_str("()"),
                [one] => fmt_item(one, f),
                items => {
                    f.write_str("(")?;
                    for (i, it) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        fmt_item(it, f)?;
                    }
                    f.write_str(")")
                }
            },
            Expr::VarRef(v) => write!(f, "{v}"),
            Expr::List(items) => {
                f.write_str("(")?;
                for (i, e) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{e}")?;
                }
                f.write_str(")")
            }
            Expr::CmpV(c) => write!(f, "{c}"),
            Expr::CmpG(c) => write!(f, "{c}"),
            Expr::Not(e) => write!(f, "not({e})"),
            Expr::If(i) => write!(f, "if ({}) then {} else {}", i.cond, i.then, i.otherwise),
        }
    }
}

/// Literal holding the result of a three-valued comparison.
pub(crate) fn literal_of(result: Option<bool>) -> Expr {
    match result {
        Some(b) => Expr::boolean(b),
        None => Expr::empty(),
    }
}

// Expressions are shared between threads after optimization.
const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Expr>();
};
