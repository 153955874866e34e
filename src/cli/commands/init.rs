//! Init command implementation
//!
//! Handles `codesight init`: create `.codesight/` with a default config file
//! and editable prompt templates.

use anyhow::{Context, Result};
use camino::Utf8Path;
use codesight_config::{Config, DEFAULT_CONFIG_TOML};
use codesight_selectors::read_gitignore;
use codesight_templates::{project_prompts_dir, write_default_templates};
use codesight_utils::atomic_write::write_file_atomic;
use codesight_utils::paths::{PROJECT_DIR_NAME, ensure_dir_all, project_dir};
use std::fs::OpenOptions;
use std::io::Write;

use super::common::resolve_project_root;

const GITIGNORE_ENTRY: &str = "# CodeSight generated files\n.codesight/\n";

/// Execute the init command
pub fn execute_init_command(dir: Option<&Utf8Path>, add_gitignore: bool) -> Result<()> {
    let root = resolve_project_root(dir)?;
    println!("Initializing CodeSight in {root}...");

    let state_dir = project_dir(&root);
    ensure_dir_all(&state_dir)
        .with_context(|| format!("Failed to create project directory: {state_dir}"))?;

    let config_path = Config::project_config_path(&root);
    if config_path.exists() {
        println!("  Config already exists: {config_path}");
    } else {
        write_file_atomic(&config_path, DEFAULT_CONFIG_TOML)
            .with_context(|| format!("Failed to write config file: {config_path}"))?;
        println!("  Created project config at {config_path}");
    }

    for template in write_default_templates(&project_prompts_dir(&root))? {
        println!("  Created prompt template {template}");
    }

    if root.join(".git").exists() && !gitignore_covers_project_dir(&root)? {
        if add_gitignore {
            append_gitignore_entry(&root)?;
            println!("  Added .codesight/ to .gitignore");
        } else {
            println!("\n⚠ WARNING: .codesight/ is not excluded in your .gitignore file!");
            println!("  To avoid committing CodeSight files, add this line to .gitignore:");
            println!("  .codesight/");
            println!("  or run 'codesight init --add-gitignore'.");
        }
    }

    println!("\nRun 'codesight collect' to build a snapshot of this project.");
    Ok(())
}

/// True when a `.gitignore` line ignores the whole `.codesight/` directory
fn gitignore_covers_project_dir(root: &Utf8Path) -> Result<bool> {
    let lines = read_gitignore(root)?;
    Ok(lines.iter().any(|line| {
        let entry = line.trim().trim_start_matches('/').trim_end_matches('/');
        entry == PROJECT_DIR_NAME
    }))
}

fn append_gitignore_entry(root: &Utf8Path) -> Result<()> {
    let path = root.join(".gitignore");
    let existing = std::fs::read_to_string(&path).unwrap_or_default();

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {path}"))?;

    let separator = match existing.as_str() {
        "" => "",
        text if text.ends_with('\n') => "\n",
        _ => "\n\n",
    };
    write!(file, "{separator}{GITIGNORE_ENTRY}").with_context(|| format!("Failed to update {path}"))?;
    Ok(())
}
