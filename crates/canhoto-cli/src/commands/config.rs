//! Config command - inspect and edit the configuration file.
//!
//! Every subcommand works on the file named by the global `--config` flag, or
//! on `<config_dir>/canhoto/config.json` when the flag is absent.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use canhoto_core::models::config::CanhotoConfig;

use super::default_config_path;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as JSON
    Show,

    /// Write a configuration file with default values
    Init(InitArgs),

    /// Print one value by dotted key (e.g., "report.bar_width")
    Get { key: String },

    /// Change one existing value by dotted key
    Set {
        key: String,
        /// JSON literal, or plain text taken as a string
        value: String,
    },

    /// Print which configuration file is used
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Where to write the file (default: the active configuration file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace an existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let target = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => show_config(&target),
        ConfigCommand::Init(init_args) => init_config(&target, init_args),
        ConfigCommand::Get { key } => get_config(&target, &key),
        ConfigCommand::Set { key, value } => set_config(&target, &key, &value),
        ConfigCommand::Path => show_path(&target),
    }
}

fn read_config(path: &Path) -> anyhow::Result<CanhotoConfig> {
    if path.exists() {
        Ok(CanhotoConfig::from_file(path)?)
    } else {
        Ok(CanhotoConfig::default())
    }
}

fn write_config(path: &Path, config: &CanhotoConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    config.save(path)?;
    Ok(())
}

fn show_config(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        eprintln!(
            "{} {} does not exist, showing defaults.",
            style("ℹ").blue(),
            path.display()
        );
    }

    println!("{}", serde_json::to_string_pretty(&read_config(path)?)?);
    Ok(())
}

fn init_config(target: &Path, args: InitArgs) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| target.to_path_buf());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    write_config(&output_path, &CanhotoConfig::default())?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );
    Ok(())
}

fn get_config(path: &Path, key: &str) -> anyhow::Result<()> {
    let json = serde_json::to_value(read_config(path)?)?;
    let value = lookup_key(&json, key)
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;

    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn set_config(path: &Path, key: &str, raw: &str) -> anyhow::Result<()> {
    let value: Value =
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

    let mut json = serde_json::to_value(read_config(path)?)?;
    replace_key(&mut json, key, value.clone())?;

    // Back through the typed config so wrong types and ranges are rejected
    let config: CanhotoConfig = serde_json::from_value(json)?;
    config.validate()?;
    write_config(path, &config)?;

    println!(
        "{} Set {} = {} in {}",
        style("✓").green(),
        key,
        value,
        path.display()
    );
    Ok(())
}

fn show_path(path: &Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'canhoto config init' to create it.");
    }
    Ok(())
}

/// Value at a dotted key such as `lookup.timeout_secs`.
fn lookup_key<'a>(json: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(json, |node, part| node.get(part))
}

/// Overwrite the value at a dotted key. The key must already exist.
fn replace_key(json: &mut Value, key: &str, value: Value) -> anyhow::Result<()> {
    let (parent, last) = match key.rsplit_once('.') {
        Some((parent, last)) => (Some(parent), last),
        None => (None, key),
    };

    let mut node = json;
    if let Some(parent) = parent {
        for part in parent.split('.') {
            node = node
                .get_mut(part)
                .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
        }
    }

    let Some(slot) = node.as_object_mut().and_then(|obj| obj.get_mut(last)) else {
        anyhow::bail!("Configuration key not found: {}", key);
    };
    *slot = value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_key_follows_dots() {
        let json = json!({"report": {"bar_width": 50}});
        assert_eq!(lookup_key(&json, "report.bar_width"), Some(&json!(50)));
        assert_eq!(lookup_key(&json, "report.nope"), None);
        assert_eq!(lookup_key(&json, "report.bar_width.deeper"), None);
    }

    #[test]
    fn test_replace_key_requires_existing_key() {
        let mut json = json!({"report": {"bar_width": 50}});

        replace_key(&mut json, "report.bar_width", json!(40)).unwrap();
        assert_eq!(json["report"]["bar_width"], json!(40));

        assert!(replace_key(&mut json, "report.nope", json!(1)).is_err());
        assert!(replace_key(&mut json, "missing.bar_width", json!(1)).is_err());
        assert!(replace_key(&mut json, "report.bar_width.x", json!(1)).is_err());
    }

    #[test]
    fn test_set_writes_to_given_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("custom.json");

        set_config(&path, "report.bar_width", "40").unwrap();

        let saved = CanhotoConfig::from_file(&path).unwrap();
        assert_eq!(saved.report.bar_width, 40);
        assert!(set_config(&path, "report.bar_width", "0").is_err());
        assert_eq!(CanhotoConfig::from_file(&path).unwrap().report.bar_width, 40);
    }
}
