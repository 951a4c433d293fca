use super::resolve;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use formwork_editor::{dangling_rules, DanglingRule, Document};
use formwork_schema::visitor::walk_node;
use formwork_schema::{FieldKind, FieldNode, Visitor};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Form file to inspect
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// One printed row of the tree
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TreeRow {
    id: String,
    kind: FieldKind,
    label: String,
    depth: usize,
    required: bool,
    conditional: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    id: String,
    title: String,
    node_count: usize,
    section_count: usize,
    dangling_rules: Vec<DanglingRule>,
    rows: Vec<TreeRow>,
}

#[derive(Default)]
struct TreeRows {
    rows: Vec<TreeRow>,
}

impl Visitor for TreeRows {
    fn visit_node(&mut self, node: &FieldNode, depth: usize) {
        self.rows.push(TreeRow {
            id: node.id.clone(),
            kind: node.kind,
            label: node.label().to_string(),
            depth,
            required: node.attributes.required,
            conditional: node.attributes.rule.as_ref().is_some_and(|rule| rule.is_active()),
        });
        walk_node(self, node, depth);
    }
}

pub fn inspect(args: InspectArgs, cwd: &Path) -> Result<()> {
    let path = resolve(cwd, &args.input);
    let summary = summarize(&path)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "text" => print_summary(&summary),
        other => return Err(anyhow!("Unknown format: {}. Use: text or json", other)),
    }

    Ok(())
}

fn summarize(path: &Path) -> Result<Summary> {
    let document = Document::load(path)?;

    let mut tree = TreeRows::default();
    tree.visit_forest(document.fields());

    let section_count = tree.rows.iter().filter(|row| row.kind.is_container()).count();

    Ok(Summary {
        id: document.metadata().id.clone(),
        title: document.metadata().title.clone(),
        node_count: tree.rows.len(),
        section_count,
        dangling_rules: dangling_rules(document.fields()),
        rows: tree.rows,
    })
}

fn print_summary(summary: &Summary) {
    println!("📋 {} ({})", summary.title.bold(), summary.id.dimmed());
    println!();

    for row in &summary.rows {
        let indent = "  ".repeat(row.depth + 1);
        let marker = if row.kind.is_container() { "▸" } else { "•" };
        let mut line = format!("{}{} {} \"{}\"", indent, marker, row.kind.as_str().cyan(), row.label);
        if row.required {
            line.push_str(&format!(" {}", "*".red()));
        }
        if row.conditional {
            line.push_str(&format!(" {}", "(conditional)".yellow()));
        }
        println!("{} {}", line, row.id.dimmed());
    }

    println!();
    println!("   Nodes: {}", summary.node_count);
    println!("   Sections: {}", summary.section_count);

    if summary.dangling_rules.is_empty() {
        println!("   {} No dangling rules", "✓".green());
    } else {
        for dangling in &summary.dangling_rules {
            println!(
                "   {} {} depends on missing field {}",
                "⚠️".yellow(),
                dangling.node_id,
                dangling.trigger_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_and_dangling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.form.json");
        std::fs::write(
            &path,
            r#"{
                "metadata": { "id": "f", "title": "F" },
                "fields": [
                    { "id": "s", "kind": "section", "attributes": { "label": "Group" }, "children": [
                        { "id": "a", "kind": "text", "attributes": { "label": "A", "required": true } }
                    ] },
                    { "id": "b", "kind": "text", "attributes": {
                        "label": "B",
                        "rule": { "triggerId": "gone", "expectedValue": "x" }
                    } }
                ]
            }"#,
        )
        .unwrap();

        let summary = summarize(&path).unwrap();
        assert_eq!(summary.node_count, 3);
        assert_eq!(summary.section_count, 1);
        assert_eq!(summary.rows[1].depth, 1);
        assert!(summary.rows[1].required);
        assert!(summary.rows[2].conditional);
        assert_eq!(summary.dangling_rules.len(), 1);
    }
}
