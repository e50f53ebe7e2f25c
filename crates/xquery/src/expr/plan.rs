//! Query plan serialization as indented XML.

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::engine::runtime::{Error, ErrorCode};
use crate::xdm::types::SeqType;
use crate::xdm::{XdmItem, XdmSequence};

use super::Expr;

type PlanWriter = Writer<Vec<u8>>;

fn xml_error(e: impl core::fmt::Display) -> Error {
    Error::from_code(ErrorCode::Unknown, format!("plan serialization failed: {e}"))
}

fn open(w: &mut PlanWriter, start: BytesStart<'_>) -> Result<(), Error> {
    w.write_event(Event::Start(start)).map_err(xml_error)
}

fn close(w: &mut PlanWriter, name: &str) -> Result<(), Error> {
    w.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)
}

fn empty(w: &mut PlanWriter, start: BytesStart<'_>) -> Result<(), Error> {
    w.write_event(Event::Empty(start)).map_err(xml_error)
}

fn typed(name: &str, st: SeqType) -> BytesStart<'_> {
    let mut start = BytesStart::new(name);
    start.push_attribute(("type", st.to_string().as_str()));
    start
}

fn write_literal(w: &mut PlanWriter, seq: &XdmSequence) -> Result<(), Error> {
    if seq.is_empty() {
        return empty(w, BytesStart::new("Empty"));
    }
    let start = typed("Literal", SeqType::of_value(seq));
    open(w, start)?;
    let text = seq
        .iter()
        .map(XdmItem::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    w.write_event(Event::Text(BytesText::new(&text)))
        .map_err(xml_error)?;
    close(w, "Literal")
}

fn write_expr(w: &mut PlanWriter, expr: &Expr) -> Result<(), Error> {
    match expr {
        Expr::Literal(seq) => write_literal(w, seq),
        Expr::VarRef(v) => {
            let mut start = typed("VarRef", v.seq_type);
            start.push_attribute(("name", v.to_string().as_str()));
            empty(w, start)
        }
        Expr::List(items) => {
            open(w, typed("List", expr.seq_type()))?;
            for e in items {
                write_expr(w, e)?;
            }
            close(w, "List")
        }
        Expr::CmpV(c) => {
            let mut start = typed("CmpV", c.seq_type);
            start.push_attribute(("op", c.op.name()));
            if let Some(coll) = &c.collation {
                start.push_attribute(("collation", coll.uri()));
            }
            open(w, start)?;
            write_expr(w, &c.left)?;
            write_expr(w, &c.right)?;
            close(w, "CmpV")
        }
        Expr::CmpG(c) => {
            let mut start = typed("CmpG", SeqType::BOOLEAN_ONE);
            start.push_attribute(("op", c.op.symbol()));
            if let Some(coll) = &c.collation {
                start.push_attribute(("collation", coll.uri()));
            }
            open(w, start)?;
            write_expr(w, &c.left)?;
            write_expr(w, &c.right)?;
            close(w, "CmpG")
        }
        Expr::Not(e) => {
            open(w, typed("Not", SeqType::BOOLEAN_ONE))?;
            write_expr(w, e)?;
            close(w, "Not")
        }
        Expr::If(i) => {
            open(w, typed("If", expr.seq_type()))?;
            write_expr(w, &i.cond)?;
            write_expr(w, &i.then)?;
            write_expr(w, &i.otherwise)?;
            close(w, "If")
        }
    }
}

impl Expr {
    /// Plan of the expression tree, one element per node.
    pub fn plan(&self) -> Result<String, Error> {
        let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
        write_expr(&mut w, self)?;
        String::from_utf8(w.into_inner()).map_err(xml_error)
    }
}
