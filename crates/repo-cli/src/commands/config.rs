//! Document-level settings display and editing

use colored::Colorize;
use repo_meta::{ArchiveKey, Configuration, SettingKey};
use serde_json::Value;

use crate::context::AppContext;
use crate::error::{CliError, Result};

/// Display the document settings, repositories excluded
pub fn run_config_show(ctx: &AppContext, json: bool) -> Result<i32> {
    let config = ctx.store.load()?;
    let mut document = serde_json::to_value(&config)?;
    if let Value::Object(map) = &mut document {
        map.remove("repositories");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(0);
    }

    println!("{}", "Repository Configuration".bold());
    println!();
    for key in SettingKey::all() {
        println!("  {:<34} {}", format!("{key}:").dimmed(), display_value(&config, &document, key));
    }
    Ok(0)
}

/// Run the config set command
pub fn run_config_set(ctx: &AppContext, key: &str, value: &str) -> Result<i32> {
    let key = parse_key(key)?;
    ctx.store
        .transaction(|config| Ok(config.set(key, value)?))?;

    println!("{} {} = {}", "Set".green().bold(), key.to_string().cyan(), value);
    Ok(0)
}

/// Run the config unset command
pub fn run_config_unset(ctx: &AppContext, key: &str, package: Option<&str>) -> Result<i32> {
    let key = parse_key(key)?;
    let changed = ctx
        .store
        .transaction(|config| Ok(config.unset(key, package)?))?;

    let target = match package {
        Some(package) => format!("{key} {package}"),
        None => key.to_string(),
    };
    if changed {
        println!("{} {}", "Reset".green().bold(), target.cyan());
    } else {
        println!("{} {} already at its default", "Unchanged".dimmed(), target.cyan());
    }
    Ok(0)
}

fn parse_key(key: &str) -> Result<SettingKey> {
    key.parse().map_err(|e: repo_meta::Error| {
        CliError::user(format!(
            "{e}. Known settings: {}",
            SettingKey::all()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })
}

fn display_value(config: &Configuration, document: &Value, key: SettingKey) -> String {
    let value = match key {
        // an empty format is written as the default
        SettingKey::Archive(ArchiveKey::Format) => {
            return config.archive.effective_format().to_string();
        }
        SettingKey::Archive(field) => document.pointer(&format!("/archive/{}", field.as_str())),
        other => document.get(other.to_string()),
    };

    match value {
        None | Some(Value::Null) => "(unset)".dimmed().to_string(),
        Some(Value::String(s)) if s.is_empty() => "(empty)".dimmed().to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(package, value)| match value {
                Value::String(s) => format!("{package}={s}"),
                _ => package.clone(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}
