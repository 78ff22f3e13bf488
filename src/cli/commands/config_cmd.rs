//! Configuration management commands.

use console::style;

use crate::config::{Config, CONFIG_NAME};

/// Print the effective configuration (file + environment) as TOML.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    let source = config
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());
    eprintln!("{} Source: {}", style("→").dim(), source);

    print!("{}", config.to_toml()?);
    Ok(())
}

/// Show which config file is in effect and what `prefer` discovers.
pub async fn cmd_config_path(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => println!("  {} {}", style("✓ in use").green(), path.display()),
        None => println!("  {} built-in defaults", style("- no file").dim()),
    }

    let discovered = Config::discover().await;
    match discovered {
        Some(ref path) if config.source_path.as_ref() != Some(path) => {
            println!("  {} {}", style("○ discovered").yellow(), path.display())
        }
        Some(_) => {}
        None => println!(
            "  {} no {}.* file in the standard locations",
            style("- discovered").dim(),
            CONFIG_NAME
        ),
    }
    Ok(())
}
