use super::resolve;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use formwork_editor::{collect_submission, tree, visible_ids, Document, ValueMap};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Form file to preview
    pub input: PathBuf,

    /// JSON object of field values keyed by field id
    #[arg(short, long)]
    pub values: Option<PathBuf>,

    /// Single value as id=value; the value is read as JSON, else as a string
    #[arg(short, long = "set", value_name = "ID=VALUE")]
    pub set: Vec<String>,
}

pub fn preview(args: PreviewArgs, cwd: &Path) -> Result<()> {
    let document = Document::load(resolve(cwd, &args.input))?;

    let mut values = match &args.values {
        Some(path) => read_values(&resolve(cwd, path))?,
        None => ValueMap::new(),
    };
    for assignment in &args.set {
        let (id, value) = parse_assignment(assignment)?;
        values.insert(id, value);
    }

    println!("👁  {} {}", "Preview".green().bold(), document.metadata().title);
    println!();

    let fields = document.fields();
    let visible = visible_ids(fields, &values);
    for id in &visible {
        let Some(node) = tree::find(fields, id) else {
            continue;
        };
        let depth = ancestor_count(fields, id);
        let value = values
            .get(id)
            .map(|v| format!(" = {}", v))
            .unwrap_or_default();
        println!(
            "{}{} \"{}\"{}",
            "  ".repeat(depth + 1),
            node.kind.as_str().cyan(),
            node.label(),
            value.dimmed()
        );
    }

    let hidden = tree::node_count(fields) - visible.len();
    if hidden > 0 {
        println!();
        println!("   {} hidden field(s)", hidden.to_string().yellow());
    }

    println!();
    println!("Submission:");
    println!("{}", serde_json::to_string_pretty(&collect_submission(fields, &values))?);

    Ok(())
}

fn read_values(path: &Path) -> Result<ValueMap> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Cannot read values file {}", path.display()))?;
    match serde_json::from_str::<Value>(&source)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(anyhow!("Values file must contain a JSON object")),
    }
}

fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let (id, raw) = assignment
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected ID=VALUE, got {}", assignment))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((id.to_string(), value))
}

fn ancestor_count(fields: &formwork_schema::Forest, id: &str) -> usize {
    let mut depth = 0;
    let mut current = tree::parent_of(fields, id);
    while let Some(parent) = current {
        depth += 1;
        current = tree::parent_of(fields, &parent.id);
    }
    depth
}
