use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Subcommand;
use studyclock_core::storage::{export_csv, import_csv};
use studyclock_core::{Config, ConfigFile, ValuationStore};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "preferences.auto_start", "valuation.target_seconds.CT")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value; blank stores 0 for numeric settings
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Write the valuation tables as CSV ("-" for stdout)
    Export { file: PathBuf },
    /// Replace the valuation tables from a CSV file
    Import { file: PathBuf },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset { yes } => {
            if !yes {
                print!("Reset all settings to defaults? [y/N] ");
                std::io::stdout().flush()?;
                if !confirmed(&mut std::io::stdin().lock())? {
                    println!("cancelled");
                    return Ok(());
                }
            }
            Config::default().save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Export { file } => {
            let config = Config::load()?;
            let text = export_csv(&config.valuation);
            if file.as_os_str() == "-" {
                print!("{text}");
            } else {
                std::fs::write(&file, text)?;
                println!("exported to {}", file.display());
            }
        }
        ConfigAction::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let report = import_csv(&text);
            ConfigFile::default_location()?.save_valuation(&report.valuation)?;
            println!(
                "imported {} settings ({} skipped)",
                report.applied, report.skipped
            );
        }
    }
    Ok(())
}

/// Read one answer line; only `y`/`yes` confirm.
fn confirmed(input: &mut impl BufRead) -> std::io::Result<bool> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_requires_yes() {
        assert!(confirmed(&mut "y\n".as_bytes()).unwrap());
        assert!(confirmed(&mut "YES\n".as_bytes()).unwrap());
        assert!(!confirmed(&mut "\n".as_bytes()).unwrap());
        assert!(!confirmed(&mut "nope\n".as_bytes()).unwrap());
        assert!(!confirmed(&mut "".as_bytes()).unwrap());
    }
}
