//! JSON description of a query: declared variables plus an expression tree.

use anyhow::{Context, anyhow, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use xqe_xquery::xdm::lexical::cast_from_string;
use xqe_xquery::{
    AtomicType, CmpG, CmpV, Collation, CompileContext, DocumentBuilder, Expr, ItemType, OpG, OpV,
    Occurrence, QName, QueryContext, QueryContextBuilder, SeqType, Var, XdmItem, XdmSequence,
};

use crate::util::CliResult;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QueryFile {
    #[serde(default)]
    pub variables: Vec<VariableSpec>,
    pub expr: ExprSpec,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VariableSpec {
    pub name: String,
    #[serde(rename = "type", default = "default_item_type")]
    pub item_type: String,
    #[serde(default)]
    pub occurrence: OccurrenceSpec,
    #[serde(default)]
    pub value: Vec<ItemSpec>,
}

fn default_item_type() -> String {
    "item()".to_owned()
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceSpec {
    Zero,
    #[default]
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl From<OccurrenceSpec> for Occurrence {
    fn from(spec: OccurrenceSpec) -> Self {
        match spec {
            OccurrenceSpec::Zero => Occurrence::Zero,
            OccurrenceSpec::One => Occurrence::One,
            OccurrenceSpec::ZeroOrOne => Occurrence::ZeroOrOne,
            OccurrenceSpec::ZeroOrMore => Occurrence::ZeroOrMore,
            OccurrenceSpec::OneOrMore => Occurrence::OneOrMore,
        }
    }
}

/// One item of a literal or variable value. `type` is an `xs:` type name, or
/// `node` for an element whose text content is `value`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ItemSpec {
    #[serde(rename = "type")]
    pub item_type: String,
    pub value: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ExprSpec {
    Literal {
        #[serde(default)]
        items: Vec<ItemSpec>,
    },
    Var {
        name: String,
    },
    List {
        items: Vec<ExprSpec>,
    },
    CmpV {
        op: String,
        left: Box<ExprSpec>,
        right: Box<ExprSpec>,
        #[serde(default)]
        collation: Option<String>,
    },
    CmpG {
        op: String,
        left: Box<ExprSpec>,
        right: Box<ExprSpec>,
        #[serde(default)]
        collation: Option<String>,
    },
    Not {
        operand: Box<ExprSpec>,
    },
    If {
        cond: Box<ExprSpec>,
        then: Box<ExprSpec>,
        #[serde(rename = "else")]
        otherwise: Box<ExprSpec>,
    },
}

/// Expression tree and bound variables, ready to optimize and evaluate.
#[derive(Debug)]
pub struct LoadedQuery {
    pub expr: Expr,
    pub context: QueryContext,
}

pub fn parse(source: &str) -> CliResult<QueryFile> {
    serde_json::from_str(source).context("invalid query description")
}

pub fn load(file: QueryFile, cc: &mut CompileContext) -> CliResult<LoadedQuery> {
    let mut vars = HashMap::new();
    let mut context = QueryContextBuilder::new();
    for spec in file.variables {
        let seq_type = SeqType::new(parse_item_type(&spec.item_type)?, spec.occurrence.into());
        let var = cc.new_var(spec.name.clone(), seq_type);
        let value = items(&spec.value)?;
        context = context.with_variable(&var, value);
        if vars.insert(spec.name.clone(), var).is_some() {
            bail!("variable ${} is declared twice", spec.name);
        }
    }
    let context = context.build()?;
    let expr = build_expr(file.expr, &vars, cc)?;
    Ok(LoadedQuery { expr, context })
}

fn parse_item_type(name: &str) -> CliResult<ItemType> {
    match name {
        "item()" => Ok(ItemType::Item),
        "node()" => Ok(ItemType::Node),
        "array(*)" => Ok(ItemType::Array),
        other => AtomicType::from_name(other)
            .map(ItemType::Atomic)
            .ok_or_else(|| anyhow!("unknown item type: {other}")),
    }
}

fn items(specs: &[ItemSpec]) -> CliResult<XdmSequence> {
    specs.iter().map(item).collect()
}

fn item(spec: &ItemSpec) -> CliResult<XdmItem> {
    if spec.item_type == "node" {
        let mut doc = DocumentBuilder::new();
        doc.start_element(QName::local("node")).text(spec.value.clone()).end_element();
        let root = doc.build().root();
        let element = root.children().into_iter().next().context("element was not built")?;
        return Ok(XdmItem::Node(element));
    }
    let t = AtomicType::from_name(&spec.item_type)
        .ok_or_else(|| anyhow!("unknown atomic type: {}", spec.item_type))?;
    Ok(XdmItem::Atomic(cast_from_string(&spec.value, t)?))
}

fn collation(uri: Option<&str>, cc: &CompileContext) -> CliResult<Option<Arc<dyn Collation>>> {
    uri.map(|u| cc.sc.collation(Some(u))).transpose().map_err(Into::into)
}

fn build_expr(spec: ExprSpec, vars: &HashMap<String, Var>, cc: &CompileContext) -> CliResult<Expr> {
    let sub = |e: Box<ExprSpec>| build_expr(*e, vars, cc);
    Ok(match spec {
        ExprSpec::Literal { items: specs } => Expr::Literal(items(&specs)?),
        ExprSpec::Var { name } => {
            let var = vars.get(&name).ok_or_else(|| anyhow!("undeclared variable ${name}"))?;
            Expr::VarRef(var.clone())
        }
        ExprSpec::List { items } => {
            Expr::List(items.into_iter().map(|e| build_expr(e, vars, cc)).collect::<CliResult<_>>()?)
        }
        ExprSpec::CmpV { op, left, right, collation: uri } => {
            let op = OpV::from_name(&op).ok_or_else(|| anyhow!("unknown value comparison: {op}"))?;
            let coll = collation(uri.as_deref(), cc)?;
            CmpV::new(sub(left)?, sub(right)?, op, coll, cc.sc.clone(), None).into()
        }
        ExprSpec::CmpG { op, left, right, collation: uri } => {
            let op =
                OpG::from_symbol(&op).ok_or_else(|| anyhow!("unknown general comparison: {op}"))?;
            let coll = collation(uri.as_deref(), cc)?;
            CmpG::new(sub(left)?, sub(right)?, op, coll, cc.sc.clone(), None).into()
        }
        ExprSpec::Not { operand } => Expr::not(sub(operand)?),
        ExprSpec::If { cond, then, otherwise } => {
            Expr::if_then_else(sub(cond)?, sub(then)?, sub(otherwise)?)
        }
    })
}
