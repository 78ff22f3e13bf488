//! External tool availability check.

use console::style;

use crate::config::Config;
use crate::ocr::{OcrBackend, TesseractBackend};

/// Report whether Chrome, tesseract and pdftoppm can be found.
pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Tool Status").bold());
    println!("{}", "-".repeat(50));

    let mut all_found = true;

    println!("\n{}", style("Browser:").cyan());
    if let Some(ref url) = config.browser.remote_url {
        println!("  {:<15} {} {}", "Chrome", style("→ remote").green(), url);
    } else {
        match find_chrome(config) {
            Ok(path) => println!(
                "  {:<15} {} {}",
                "Chrome",
                style("✓ found").green(),
                style(path).dim()
            ),
            Err(hint) => {
                all_found = false;
                println!("  {:<15} {}", "Chrome", style("✗ not found").red());
                for line in hint.lines() {
                    println!("                  {}", style(line).dim());
                }
            }
        }
    }

    println!("\n{}", style("OCR Tools:").cyan());
    let tesseract = TesseractBackend::with_config(config.ocr.clone());
    for (tool, available) in tesseract.check_tools() {
        let status = if available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }
    if !tesseract.is_available() {
        println!(
            "                  {}",
            style(tesseract.availability_hint()).dim()
        );
    }
    println!(
        "  {:<15} {}",
        "Languages",
        style(&config.ocr.language).dim()
    );

    println!();
    if all_found {
        println!("{} All required tools are available", style("✓").green());
    } else {
        println!(
            "{} Some tools are missing; see the hints above",
            style("!").yellow()
        );
    }

    Ok(())
}

#[cfg(feature = "browser")]
fn find_chrome(config: &Config) -> Result<String, String> {
    crate::browser::ChromeSession::find_chrome(&config.browser)
        .map(|p| p.display().to_string())
        .map_err(|e| e.to_string())
}

#[cfg(not(feature = "browser"))]
fn find_chrome(_config: &Config) -> Result<String, String> {
    Err("not compiled (enable the browser feature)".to_string())
}
