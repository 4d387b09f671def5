//! Handlers for `ragify config {path,show,get,init}`.

use std::path::PathBuf;

use ragify_core::{Error, Result};

use crate::cli::ConfigAction;
use crate::config::RagifyConfig;

/// Handle a config subcommand.
///
/// Takes the raw `--config` path rather than a loaded config because `path`
/// and `init` must work before any config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Show => {
            let config = RagifyConfig::load(config_path)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        ConfigAction::Get { key } => {
            let config = RagifyConfig::load(config_path)?;
            println!("{}", lookup(&config, &key)?);
            Ok(())
        }
        ConfigAction::Init { file, force } => {
            let path = cmd_config_init(file.as_deref(), force)?;
            println!("Config file created at {}", path.display());
            Ok(())
        }
    }
}

fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    let path = RagifyConfig::resolve_config_path(config_path).ok_or_else(|| {
        Error::config("Could not determine config directory for this platform")
    })?;

    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist; run `ragify config init` to create it)");
    }
    Ok(())
}

/// Render the value at a dotted key (`search.default_limit`).
fn lookup(config: &RagifyConfig, key: &str) -> Result<String> {
    let root = toml::Value::try_from(config).map_err(|e| Error::config(e.to_string()))?;

    let value = key
        .split('.')
        .try_fold(&root, |node, part| node.as_table()?.get(part))
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))?;

    Ok(match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Table(_) => {
            toml::to_string_pretty(value).map_err(|e| Error::config(e.to_string()))?
        }
        other => other.to_string(),
    })
}

/// Write the default configuration to `file` or the XDG path.
fn cmd_config_init(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => RagifyConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    ragify_core::ensure_parent_dir(&path)?;
    let toml_str = RagifyConfig::default().to_toml_string()?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(path)
}
