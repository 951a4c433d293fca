use anyhow::Result;
use clap::Args;
use colored::Colorize;
use formwork_editor::{EditSession, EditorConfig, DEFAULT_CONFIG_NAME};
use formwork_schema::{Attribute, ConditionalRule, FieldKind, FormDocument, FormMetadata};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Name of the starter form
    #[arg(short, long, default_value = "contact")]
    pub name: String,

    /// Force overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Formwork project...".bright_blue().bold());

    let config = EditorConfig::default();
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let form_name = format!("{}.form.json", args.name);
    let form_path = cwd.join(&form_name);
    if !form_path.exists() || args.force {
        let document = starter_form(&args.name, &config)?;
        fs::write(&form_path, document.to_json()?)?;
        println!("  {} Created {}", "✓".green(), form_name);
    }

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: formwork inspect {}", form_name);
    println!("  2. Run: formwork preview {}", form_name);

    Ok(())
}

/// A small form with one section and one conditional field
fn starter_form(name: &str, config: &EditorConfig) -> Result<FormDocument> {
    let mut session = EditSession::new("init", Default::default(), config.clone())?;

    session.add_field(FieldKind::Section, "Contact")?;
    let full_name = session.add_leaf(FieldKind::Text, "Full name")?;
    session.update_attribute(&full_name, Attribute::Required(true))?;
    session.add_leaf(FieldKind::Email, "Email")?;

    session.clear_selection();
    let subscribe = session.add_leaf(FieldKind::Toggle, "Subscribe to updates")?;
    let frequency = session.add_leaf(FieldKind::Radio, "How often?")?;
    session.update_attribute(
        &frequency,
        Attribute::Rule(Some(ConditionalRule::new(subscribe, true))),
    )?;
    session.commit_pending();

    let metadata = FormMetadata {
        id: name.to_string(),
        title: title_case(name),
        description: String::new(),
    };
    Ok(FormDocument::new(metadata, session.forest().clone()))
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
