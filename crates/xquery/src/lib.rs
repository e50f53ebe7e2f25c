pub mod compiler;
pub mod consts;
pub mod engine;
pub mod expr;
pub mod model;
pub mod xdm;

pub use compiler::{CompileContext, VarMap};
pub use engine::collation::{Collation, CollationRegistry, CodepointCollation};
pub use engine::runtime::{
    Error, ErrorCode, ErrorKind, InputInfo, QueryContext, QueryContextBuilder, StaticContext,
    StaticContextBuilder,
};
pub use expr::{CmpG, CmpV, Expr, OpG, OpV, Var, VarId};
pub use model::{Document, DocumentBuilder, NodeHandle, NodeKind, QName};
pub use xdm::types::{AtomicType, ItemType, Occurrence, SeqType};
pub use xdm::{ExpandedName, XdmAtomicValue, XdmItem, XdmSequence};
