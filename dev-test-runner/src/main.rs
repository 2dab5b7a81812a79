//! Runs the JSON case files under `cases/` against the library.
//!
//! usage: dev-test-runner [GLOB] [--filter REGEX]
use std::path::Path;
use std::process::ExitCode;
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use kv_shapes::path_de::from_slice_with_path;
use kv_shapes::{registry, TypeExpr, TypeValidator};

const DEFAULT_GLOB: &str = "cases/*.json";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseFile {
    name: String,
    #[serde(rename = "type")]
    ty: TypeExpr,
    cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    value: Value,
    valid: bool,
    #[serde(default)]
    note: Option<String>,
}

/// run the JSON case files against the shape validators
#[derive(Parser, Debug)]
struct Args {
    /// glob pattern selecting case files
    #[arg(default_value = DEFAULT_GLOB)]
    pattern: String,

    /// only run case files whose name matches this regex
    #[arg(long)]
    filter: Option<Regex>,
}

fn load_case_file(path: &Path) -> Result<CaseFile> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read case file ({})", path.display()))?;
    from_slice_with_path(&bytes)
        .with_context(|| format!("failed to parse case file ({})", path.display()))
}

fn run(args: &Args) -> Result<(usize, usize)> {
    let reg = registry::global().context("failed to build the type registry")?;
    let paths = glob::glob(&args.pattern)
        .with_context(|| format!("invalid glob pattern ({})", args.pattern))?;
    let (mut passed, mut failed) = (0, 0);
    for path in paths {
        let path = path.context("failed to read a glob match")?;
        let file = load_case_file(&path)?;
        if let Some(rx) = &args.filter {
            if !rx.is_match(&file.name) {
                continue;
            }
        }
        let validator = file.ty.resolve(reg)
            .with_context(|| format!("failed to resolve type {} ({})", file.ty, file.name))?;
        println!("{} {} ({})", "——".dimmed(), file.name.bold(), validator.name());
        for case in &file.cases {
            let got = validator.check(&case.value);
            let label = case.note.as_deref().unwrap_or("");
            if got == case.valid {
                passed += 1;
                println!("  {} {} {label}", "✅".green(), case.value);
            } else {
                failed += 1;
                let detail = validator.explain(&case.value).err().map(|m| m.to_string()).unwrap_or_default();
                println!(
                    "  {} {} expected valid={} got valid={got} {label} {detail}",
                    "❌".red(),
                    case.value,
                    case.valid,
                );
            }
        }
    }
    Ok((passed, failed))
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok((passed, 0)) => {
            println!("{}", format!("{passed} cases passed").green().bold());
            ExitCode::SUCCESS
        }
        Ok((passed, failed)) => {
            println!("{}", format!("{failed} failed, {passed} passed").red().bold());
            ExitCode::from(1)
        }
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}
