//! Compilation state threaded through `optimize`.

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::runtime::{QueryContext, StaticContext};
use crate::expr::{Expr, Var, VarId};
use crate::xdm::types::SeqType;

/// Replacement variables used when copying an expression tree.
pub type VarMap = HashMap<VarId, Var>;

pub struct CompileContext {
    pub sc: Arc<StaticContext>,
    /// Empty query context used for constant folding.
    pub qc: QueryContext,
    infos: Vec<String>,
    next_var: u32,
}

impl CompileContext {
    pub fn new(sc: Arc<StaticContext>) -> Self {
        Self {
            sc,
            qc: QueryContext::default(),
            infos: Vec::new(),
            next_var: 0,
        }
    }

    /// Declare a variable with a fresh id.
    pub fn new_var(&mut self, name: impl Into<String>, seq_type: SeqType) -> Var {
        let id = VarId(self.next_var);
        self.next_var += 1;
        Var::new(id, name, seq_type)
    }

    /// Record an optimization step.
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(rewrite = %message, "optimizer");
        self.infos.push(message);
    }

    /// Record that `before` was rewritten to `after` and return `after`.
    pub fn replace_with(&mut self, reason: &str, before: &impl fmt::Display, after: Expr) -> Expr {
        self.info(format!("{reason}: {before} -> {after}"));
        after
    }

    pub fn infos(&self) -> &[String] {
        &self.infos
    }
}

impl fmt::Debug for CompileContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileContext")
            .field("sc", &self.sc)
            .field("infos", &self.infos)
            .finish_non_exhaustive()
    }
}
