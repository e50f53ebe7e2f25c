use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use std::fmt::Write;
use xqe_xquery::{XdmItem, XdmSequence};

use crate::util::{CliResult, yes_no};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ItemSummary {
    #[serde(rename = "type")]
    pub item_type: String,
    pub value: String,
}

impl ItemSummary {
    fn from_item(item: &XdmItem) -> Self {
        match item {
            XdmItem::Atomic(a) => Self { item_type: a.atomic_type().to_string(), value: a.to_string() },
            XdmItem::Node(n) => Self { item_type: "node()".to_owned(), value: n.string_value() },
            XdmItem::Array(_) => Self { item_type: "array(*)".to_owned(), value: item.to_string() },
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub expression: String,
    pub optimized: Option<String>,
    pub rewrites: Vec<String>,
    pub plan: Option<String>,
    pub result: Vec<ItemSummary>,
}

impl RunSummary {
    pub fn new(
        expression: String,
        optimized: Option<String>,
        rewrites: Vec<String>,
        plan: Option<String>,
        result: &XdmSequence,
    ) -> Self {
        Self {
            expression,
            optimized,
            rewrites,
            plan,
            result: result.iter().map(ItemSummary::from_item).collect(),
        }
    }
}

fn label(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.bold().to_string()).to_string()
}

fn colorize_expression(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.fg_rgb::<79, 166, 255>().to_string()).to_string()
}

fn colorize_value(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.fg_rgb::<136, 192, 74>().to_string()).to_string()
}

fn colorize_type(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.dimmed().to_string()).to_string()
}

pub fn render_text(summary: &RunSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{} {}", label("query:"), colorize_expression(&summary.expression));
    let _ = writeln!(output, "{} {}", label("optimized:"), yes_no(summary.optimized.is_some()));
    if let Some(optimized) = &summary.optimized {
        let _ = writeln!(output, "{} {}", label("rewritten:"), colorize_expression(optimized));
        for rewrite in &summary.rewrites {
            let _ = writeln!(output, "    {rewrite}");
        }
    }
    if let Some(plan) = &summary.plan {
        let _ = writeln!(output, "{}", label("plan:"));
        for line in plan.lines() {
            let _ = writeln!(output, "    {line}");
        }
    }
    let _ = writeln!(output, "{}", label("result:"));
    if summary.result.is_empty() {
        let _ = writeln!(output, "    {}", colorize_type("()"));
    }
    for item in &summary.result {
        let _ = writeln!(
            output,
            "    {} {}",
            colorize_value(&item.value),
            colorize_type(&format!("({})", item.item_type))
        );
    }
    output.trim_end().to_owned()
}

pub fn render_json(summary: &RunSummary) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
