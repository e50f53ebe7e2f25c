use core::fmt;

use crate::xdm::types::SeqType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

/// Declared variable. Bound values are checked against `seq_type`, which lets
/// the optimizer rely on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub id: VarId,
    pub name: String,
    pub seq_type: SeqType,
}

impl Var {
    pub fn new(id: VarId, name: impl Into<String>, seq_type: SeqType) -> Self {
        Self {
            id,
            name: name.into(),
            seq_type,
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.name)
    }
}
