use core::cmp::Ordering;
use core::fmt;

/// Value comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpV {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

// Indexed by `OpV as usize`.
const SWAP: [OpV; 6] = [OpV::Gt, OpV::Ge, OpV::Lt, OpV::Le, OpV::Eq, OpV::Ne];
const INVERT: [OpV; 6] = [OpV::Ge, OpV::Gt, OpV::Le, OpV::Lt, OpV::Ne, OpV::Eq];
const NAMES: [&str; 6] = ["lt", "le", "gt", "ge", "eq", "ne"];

impl OpV {
    pub const ALL: [OpV; 6] = [OpV::Lt, OpV::Le, OpV::Gt, OpV::Ge, OpV::Eq, OpV::Ne];

    pub fn name(self) -> &'static str {
        NAMES[self as usize]
    }

    pub fn from_name(name: &str) -> Option<OpV> {
        NAMES.iter().position(|n| *n == name).map(|i| Self::ALL[i])
    }

    /// Operator that yields the same result with the operands exchanged.
    pub fn swap(self) -> OpV {
        SWAP[self as usize]
    }

    /// Logical complement on comparable, non-NaN inputs.
    pub fn invert(self) -> OpV {
        INVERT[self as usize]
    }

    pub fn is_equality(self) -> bool {
        matches!(self, OpV::Eq | OpV::Ne)
    }

    /// Apply the operator to a total ordering of the operands.
    pub fn test(self, ord: Ordering) -> bool {
        match self {
            OpV::Lt => ord.is_lt(),
            OpV::Le => ord.is_le(),
            OpV::Gt => ord.is_gt(),
            OpV::Ge => ord.is_ge(),
            OpV::Eq => ord.is_eq(),
            OpV::Ne => ord.is_ne(),
        }
    }

    /// Apply the operator to a partial ordering; unordered operands (NaN) only
    /// satisfy `ne`.
    pub fn test_partial(self, ord: Option<Ordering>) -> bool {
        match ord {
            Some(o) => self.test(o),
            None => self == OpV::Ne,
        }
    }

    /// Apply `eq`/`ne` to an equality outcome. Ordering operators never hold.
    pub fn test_equal(self, equal: bool) -> bool {
        match self {
            OpV::Eq => equal,
            OpV::Ne => !equal,
            _ => false,
        }
    }
}

impl fmt::Display for OpV {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// General comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpG {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl OpG {
    pub fn symbol(self) -> &'static str {
        match self {
            OpG::Eq => "=",
            OpG::Ne => "!=",
            OpG::Lt => "<",
            OpG::Le => "<=",
            OpG::Gt => ">",
            OpG::Ge => ">=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<OpG> {
        [OpG::Eq, OpG::Ne, OpG::Lt, OpG::Le, OpG::Gt, OpG::Ge]
            .into_iter()
            .find(|op| op.symbol() == symbol)
    }

    /// Value comparison applied to each pair of items.
    pub fn op_v(self) -> OpV {
        match self {
            OpG::Eq => OpV::Eq,
            OpG::Ne => OpV::Ne,
            OpG::Lt => OpV::Lt,
            OpG::Le => OpV::Le,
            OpG::Gt => OpV::Gt,
            OpG::Ge => OpV::Ge,
        }
    }

    pub fn swap(self) -> OpG {
        OpG::from(self.op_v().swap())
    }
}

impl From<OpV> for OpG {
    fn from(op: OpV) -> Self {
        match op {
            OpV::Lt => OpG::Lt,
            OpV::Le => OpG::Le,
            OpV::Gt => OpG::Gt,
            OpV::Ge => OpG::Ge,
            OpV::Eq => OpG::Eq,
            OpV::Ne => OpG::Ne,
        }
    }
}

impl fmt::Display for OpG {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
