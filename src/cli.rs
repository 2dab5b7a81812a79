//! Minimal CLI: types | check | schema
use std::path::PathBuf;
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use kv_shapes::attr::Schema;
use kv_shapes::{registry, TypeExpr, TypeValidator};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate key/value lists (pairs, flat maps, ordered pair lists) inside JSON documents
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// list the shape and base type names
    Types(TypesOut),
    /// check every document against a single type
    Check(CheckOut),
    /// construct a record from every document using a schema declaration
    Schema(SchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/headers)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is checked separately
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct TypesOut {
    /// print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// type to check against: a bare name (`Str`, `FlatMap`) or a JSON
    /// expression (`{"shape": "FlatMap", "of": "Int"}`)
    #[arg(long = "type", short = 't')]
    ty: String,

    /// only print failing documents
    #[arg(long, short)]
    quiet: bool,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// schema declaration file (JSON)
    #[arg(long, short)]
    schema: PathBuf,

    /// only print failing documents
    #[arg(long, short)]
    quiet: bool,
}

/// One candidate value and where it came from.
#[derive(Debug)]
struct Document {
    source: String,
    value: Value,
}

struct Outcome {
    source: String,
    result: Result<(), String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut docs = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            let parsed = if self.ndjson {
                source.lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(i, line)| {
                        serde_json::from_str::<Value>(line)
                            .map(|v| (format!("{source_path_str}:{}", i + 1), v))
                            .with_context(|| format!("failed to parse NDJSON line {} ({source_path_str})", i + 1))
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                let v = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                vec![(source_path_str.clone(), v)]
            };
            tracing::info!(path = %source_path_str, documents = parsed.len(), "loaded input");
            for (label, value) in parsed {
                self.select(label, value, &mut docs)?;
            }
        }
        Ok(docs)
    }

    fn select(&self, label: String, value: Value, out: &mut Vec<Document>) -> Result<()> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(ptr) => value.pointer(ptr)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {ptr} matched nothing in {label}"))?,
        };
        match self.jq_expr.as_deref() {
            None => out.push(Document { source: label, value }),
            Some(jq_expr) => {
                let selected = crate::jq_exec::select_documents(jq_expr, &value)
                    .with_context(|| format!("failed to apply jq expression to {label}"))?;
                for (i, value) in selected.into_iter().enumerate() {
                    out.push(Document { source: format!("{label}#{i}"), value });
                }
            }
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// `Ok(false)` when at least one document failed validation.
    pub fn run(&self) -> Result<bool> {
        let registry = registry::global()?;
        match &self.cmd {
            Command::Types(target) => {
                let bases = registry.base_names();
                let shapes = registry::type_storage();
                if target.json {
                    let out = serde_json::json!({ "shapes": shapes, "bases": bases });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                } else {
                    println!("{}", "shapes".bold());
                    for (short, canonical) in &shapes {
                        println!("  {short} → {canonical}");
                    }
                    println!("{}", "bases".bold());
                    for name in bases {
                        println!("  {name}");
                    }
                }
                Ok(true)
            }
            Command::Check(target) => {
                let expr = TypeExpr::parse_arg(&target.ty)
                    .with_context(|| format!("invalid type expression `{}`", target.ty))?;
                let validator = expr.resolve(registry)?;
                tracing::debug!(ty = %validator.name(), "resolved type");

                let docs = target.input_settings.load_documents()?;
                let outcomes = docs.par_iter()
                    .map(|doc| Outcome {
                        source: doc.source.clone(),
                        result: validator.explain(&doc.value).map_err(|m| m.to_string()),
                    })
                    .collect::<Vec<_>>();
                Ok(report(&validator.name(), &outcomes, target.quiet))
            }
            Command::Schema(target) => {
                let bytes = std::fs::read(&target.schema)
                    .with_context(|| format!("failed to read schema file ({})", target.schema.display()))?;
                let schema = Schema::load(&bytes, registry)
                    .with_context(|| format!("invalid schema file ({})", target.schema.display()))?;

                let docs = target.input_settings.load_documents()?;
                let outcomes = docs.par_iter()
                    .map(|doc| Outcome {
                        source: doc.source.clone(),
                        result: schema.construct_value(&doc.value).map(|_| ()).map_err(|e| e.to_string()),
                    })
                    .collect::<Vec<_>>();
                Ok(report(&target.schema.display().to_string(), &outcomes, target.quiet))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report(against: &str, outcomes: &[Outcome], quiet: bool) -> bool {
    let mut failed = 0usize;
    for outcome in outcomes {
        match &outcome.result {
            Ok(()) if quiet => {}
            Ok(()) => println!("{} {}", "✅ ok  ".green(), outcome.source),
            Err(reason) => {
                failed += 1;
                println!("{} {}: {reason}", "❌ fail".red(), outcome.source);
            }
        }
    }
    let summary = format!("{} of {} documents passed {against}", outcomes.len() - failed, outcomes.len());
    if failed == 0 {
        eprintln!("{}", summary.green().bold());
    } else {
        eprintln!("{}", summary.red().bold());
    }
    failed == 0
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
