//! Diagnostics command.

use anyhow::Result;
use colored::Colorize;
use tdv_core::{Config, compose, prereq};

pub async fn execute(config: &Config) -> Result<()> {
    println!("{}", "tdv Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let root = std::env::current_dir()?;
    let mut issues: Vec<String> = Vec::new();

    // Required toolchain
    for tool in prereq::REQUIRED_TOOLS {
        print!("  {tool}: ");
        match which::which(tool) {
            Ok(_) => println!("{}", "✓ installed".green()),
            Err(_) => {
                println!("{}", "✗ not found".red());
                issues.push(format!("{tool} is not installed"));
            }
        }
    }

    // Compose tool (soft dependency)
    print!("  compose tool: ");
    match compose::compose_program() {
        Some(parts) => println!("{} ({})", "✓ available".green(), parts.join(" ")),
        None => println!(
            "{}",
            "○ not found (dependency services will need manual startup)".yellow()
        ),
    }

    // Config file
    print!("  Config file (tdv.toml): ");
    if root.join("tdv.toml").exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Project files
    print!("  Manifest ({}): ", config.paths.requirements);
    if root.join(&config.paths.requirements).exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "✗ not found".red());
        issues.push(format!("{} is missing", config.paths.requirements));
    }

    print!("  Env template ({}): ", config.paths.env_template);
    if root.join(&config.paths.env_template).exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "✗ not found".red());
        issues.push(format!("{} is missing", config.paths.env_template));
    }

    print!("  Compose file ({}): ", config.services.compose_file);
    if root.join(&config.services.compose_file).exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ not found".yellow());
    }

    // Summary
    println!();
    if issues.is_empty() {
        println!("{}", "✓ All checks passed".green().bold());
    } else {
        println!("{}", format!("✗ {} issue(s) found:", issues.len()).red().bold());
        for issue in &issues {
            println!("  • {issue}");
        }
    }

    Ok(())
}
