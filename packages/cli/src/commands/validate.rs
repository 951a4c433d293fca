use super::resolve;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use formwork_editor::{dangling_rules, Document};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const FORM_SUFFIX: &str = ".form.json";

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Form file, or directory searched for *.form.json files
    #[arg(default_value = ".")]
    pub input: PathBuf,

    /// Treat dangling visibility rules as errors
    #[arg(long)]
    pub strict: bool,
}

/// Outcome of checking a single file
#[derive(Debug, PartialEq)]
enum FileStatus {
    Valid { warnings: usize },
    Invalid(String),
}

pub fn validate(args: ValidateArgs, cwd: &Path) -> Result<()> {
    let input = resolve(cwd, &args.input);

    let files = if input.is_file() {
        vec![input.clone()]
    } else if input.is_dir() {
        find_form_files(&input)
    } else {
        return Err(anyhow!("Input path does not exist: {}", input.display()));
    };

    if files.is_empty() {
        println!("{}", "⚠️  No form files found".yellow());
        return Ok(());
    }

    println!("🔍 Validating {} file(s)", files.len());

    let mut failures = 0;
    for file in &files {
        let relative = file.strip_prefix(&input).unwrap_or(file);
        let shown = if relative.as_os_str().is_empty() { file.as_path() } else { relative };

        match check_file(file, args.strict) {
            FileStatus::Valid { warnings: 0 } => println!("  {} {}", "✓".green(), shown.display()),
            FileStatus::Valid { warnings } => println!(
                "  {} {} ({} dangling rule(s))",
                "✓".yellow(),
                shown.display(),
                warnings
            ),
            FileStatus::Invalid(reason) => {
                failures += 1;
                eprintln!("  {} {} - {}", "✗".red(), shown.display(), reason);
            }
        }
    }

    println!();
    if failures > 0 {
        return Err(anyhow!("{} of {} file(s) failed validation", failures, files.len()));
    }
    println!("{}", "✅ All forms valid".green().bold());
    Ok(())
}

fn check_file(path: &Path, strict: bool) -> FileStatus {
    debug!(path = %path.display(), strict, "Checking form");
    let document = match Document::load(path) {
        Ok(document) => document,
        Err(err) => return FileStatus::Invalid(err.to_string()),
    };

    let dangling = dangling_rules(document.fields());
    if strict && !dangling.is_empty() {
        let ids: Vec<&str> = dangling.iter().map(|d| d.node_id.as_str()).collect();
        return FileStatus::Invalid(format!("dangling rules on {}", ids.join(", ")));
    }

    FileStatus::Valid {
        warnings: dangling.len(),
    }
}

fn find_form_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(FORM_SUFFIX))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID: &str = r#"{ "metadata": { "id": "a", "title": "A" }, "fields": [] }"#;
    const DUPLICATE_IDS: &str = r#"{
        "metadata": { "id": "b", "title": "B" },
        "fields": [
            { "id": "x", "kind": "text", "attributes": { "label": "One" } },
            { "id": "x", "kind": "text", "attributes": { "label": "Two" } }
        ]
    }"#;
    const DANGLING: &str = r#"{
        "metadata": { "id": "c", "title": "C" },
        "fields": [
            { "id": "y", "kind": "text", "attributes": {
                "label": "Y", "rule": { "triggerId": "nope", "expectedValue": true }
            } }
        ]
    }"#;

    #[test]
    fn test_find_only_form_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.form.json"), VALID).unwrap();
        fs::write(dir.path().join("nested/b.form.json"), VALID).unwrap();
        fs::write(dir.path().join("formwork.config.json"), "{}").unwrap();

        let files = find_form_files(dir.path());
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_check_file_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let valid = dir.path().join("a.form.json");
        let broken = dir.path().join("b.form.json");
        let dangling = dir.path().join("c.form.json");
        fs::write(&valid, VALID).unwrap();
        fs::write(&broken, DUPLICATE_IDS).unwrap();
        fs::write(&dangling, DANGLING).unwrap();

        assert_eq!(check_file(&valid, false), FileStatus::Valid { warnings: 0 });
        assert!(matches!(check_file(&broken, false), FileStatus::Invalid(_)));
        assert_eq!(check_file(&dangling, false), FileStatus::Valid { warnings: 1 });
        assert!(matches!(check_file(&dangling, true), FileStatus::Invalid(_)));
    }

    #[test]
    fn test_validate_directory_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.form.json"), DUPLICATE_IDS).unwrap();

        let args = ValidateArgs {
            input: dir.path().to_path_buf(),
            strict: false,
        };
        assert!(validate(args, dir.path()).is_err());
    }
}
