//! `xqe`: load a JSON query description, optimize it and print the plan and the
//! result.

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xqe_xquery::{CompileContext, StaticContext, StaticContextBuilder};

pub mod input;
mod render;
pub mod util;

use crate::render::{RunSummary, render_json, render_text};
use crate::util::{CliResult, read_source};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "xqe", version, about = "Optimize and evaluate XQuery comparison expressions")]
pub struct Cli {
    /// Query description in JSON; `-` reads standard input.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,
    /// Evaluate the expression as written.
    #[arg(long)]
    pub no_optimize: bool,
    /// Print the query plan of the evaluated expression.
    #[arg(long)]
    pub plan: bool,
    /// Implicit timezone offset in minutes. Defaults to the local timezone.
    #[arg(long, allow_negative_numbers = true)]
    pub timezone: Option<i32>,
    /// Default collation URI.
    #[arg(long)]
    pub collation: Option<String>,
    /// Static base URI.
    #[arg(long = "base-uri")]
    pub base_uri: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Increase log output; repeat for more detail. `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

pub fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let source = read_source(&cli.input)?;
    let output = execute(&cli, &source)?;
    println!("{output}");
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn static_context(cli: &Cli) -> CliResult<StaticContext> {
    let mut builder = StaticContextBuilder::new();
    builder = match cli.timezone {
        Some(minutes) => builder.with_timezone(minutes),
        None => builder.with_local_timezone(),
    };
    if let Some(uri) = &cli.collation {
        builder = builder.with_default_collation(uri);
    }
    if let Some(uri) = &cli.base_uri {
        builder = builder.with_base_uri(uri);
    }
    builder.build().context("invalid static context")
}

/// Run the query described by `source` and render the outcome.
pub fn execute(cli: &Cli, source: &str) -> CliResult<String> {
    let sc = Arc::new(static_context(cli)?);
    tracing::debug!(?sc, "static context");
    let mut cc = CompileContext::new(sc);
    let loaded = input::load(input::parse(source)?, &mut cc)?;
    let expression = loaded.expr.to_string();

    let (expr, optimized) = if cli.no_optimize {
        (loaded.expr, None)
    } else {
        let expr = loaded.expr.optimize(&mut cc).context("optimization failed")?;
        tracing::info!(rewrites = cc.infos().len(), result = %expr, "optimized");
        let text = expr.to_string();
        (expr, Some(text))
    };
    let plan = if cli.plan { Some(expr.plan()?) } else { None };
    let result = expr.evaluate(&loaded.context).context("evaluation failed")?;

    let summary = RunSummary::new(expression, optimized, cc.infos().to_vec(), plan, &result);
    match cli.format {
        OutputFormat::Text => Ok(render_text(&summary)),
        OutputFormat::Json => render_json(&summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SWAPPED: &str = r#"{
        "variables": [{"name": "x", "type": "xs:integer", "value": [{"type": "xs:integer", "value": "1"}]}],
        "expr": {
            "kind": "cmp_v", "op": "eq",
            "left": {"kind": "literal", "items": [{"type": "xs:integer", "value": "1"}]},
            "right": {"kind": "var", "name": "x"}
        }
    }"#;

    fn cli(args: &[&str]) -> Cli {
        let mut all = vec!["xqe", "-"];
        all.extend_from_slice(args);
        Cli::parse_from(all)
    }

    fn json(args: &[&str], source: &str) -> serde_json::Value {
        let mut all = vec!["--format", "json", "--timezone", "0"];
        all.extend_from_slice(args);
        serde_json::from_str(&execute(&cli(&all), source).unwrap()).unwrap()
    }

    #[rstest]
    fn optimizes_before_evaluating() {
        let out = json(&["--plan"], SWAPPED);
        assert_eq!(out["expression"], "1 eq $x");
        assert_eq!(out["optimized"], "$x = 1");
        assert!(out["plan"].as_str().unwrap().starts_with("<CmpG"));
        assert_eq!(out["result"][0]["value"], "true");
        assert!(!out["rewrites"].as_array().unwrap().is_empty());
    }

    #[rstest]
    fn no_optimize_keeps_the_tree() {
        let out = json(&["--no-optimize", "--plan"], SWAPPED);
        assert!(out["optimized"].is_null());
        assert!(out["plan"].as_str().unwrap().starts_with("<CmpV"));
        assert_eq!(out["result"][0]["value"], "true");
    }

    #[rstest]
    fn default_collation_flag_applies() {
        let source = r#"{"expr": {
            "kind": "cmp_v", "op": "eq",
            "left": {"kind": "literal", "items": [{"type": "xs:string", "value": "ABC"}]},
            "right": {"kind": "literal", "items": [{"type": "xs:string", "value": "abc"}]}
        }}"#;
        assert_eq!(json(&[], source)["result"][0]["value"], "false");
        let folded = json(&["--collation", "urn:xqe:collation:simple-case"], source);
        assert_eq!(folded["result"][0]["value"], "true");
    }

    #[rstest]
    fn evaluation_errors_are_reported() {
        let source = r#"{"expr": {
            "kind": "cmp_v", "op": "eq",
            "left": {"kind": "literal", "items": [{"type": "xs:integer", "value": "1"}, {"type": "xs:integer", "value": "2"}]},
            "right": {"kind": "literal", "items": [{"type": "xs:integer", "value": "1"}]}
        }}"#;
        let err = execute(&cli(&[]), source).unwrap_err();
        assert!(format!("{err:#}").contains("XPTY0004"), "{err:#}");
    }

    #[rstest]
    #[case(&["--timezone", "900"])]
    #[case(&["--timezone", "-2147483648"])]
    #[case(&["--collation", "urn:unknown"])]
    #[case(&["--base-uri", "not a uri"])]
    fn invalid_settings_are_rejected(#[case] args: &[&str]) {
        assert!(execute(&cli(args), SWAPPED).is_err());
    }

    #[rstest]
    fn negative_timezones_parse() {
        let parsed = Cli::parse_from(["xqe", "q.json", "--timezone", "-300", "-vv"]);
        assert_eq!(parsed.timezone, Some(-300));
        assert_eq!(parsed.verbose, 2);
        assert_eq!(parsed.format, OutputFormat::Text);
    }
}
