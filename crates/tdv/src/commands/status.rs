//! Status command: live checks against the running stack.

use anyhow::{Result, bail};
use colored::Colorize;
use std::time::Duration;
use tdv_core::state::RuntimeState;
use tdv_core::{Config, compose, process};

pub async fn execute(config: &Config) -> Result<()> {
    println!("{}", "Sentient Trader Status".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let root = std::env::current_dir()?;
    let mut issues: Vec<String> = Vec::new();

    // Local provisioning artifacts
    print!("  Virtualenv: ");
    if root.join(&config.paths.venv_dir).exists() {
        println!("{}", "✓ present".green());
    } else {
        println!("{}", "○ not provisioned".yellow());
        issues.push("virtualenv missing - run `tdv start`".to_string());
    }

    print!("  Env file: ");
    if root.join(&config.paths.env_file).exists() {
        println!("{}", "✓ present".green());
    } else {
        println!("{}", "○ not seeded".yellow());
        issues.push(format!("{} missing - run `tdv start`", config.paths.env_file));
    }

    // Tracked processes from the last start
    if let Some(state) = RuntimeState::load(&config.state_dir(&root))? {
        for (name, pid) in [
            ("Backend process", state.backend_pid),
            ("Frontend process", state.frontend_pid),
        ] {
            if let Some(pid) = pid {
                print!("  {name} (pid {pid}): ");
                if process::process_alive(pid) {
                    println!("{}", "✓ alive".green());
                } else {
                    println!("{}", "✗ not running".red());
                    issues.push(format!("{name} recorded but not running"));
                }
            }
        }
    }

    // Dependency services
    print!("  Dependency services: ");
    match compose::services_running(&root, config) {
        Some(true) => println!("{}", "✓ compose stack up".green()),
        Some(false) => {
            println!("{}", "✗ compose stack not running".red());
            issues.push("dependency services are down".to_string());
        }
        None => println!("{}", "○ no compose tool (manual services assumed)".yellow()),
    }

    // HTTP probes
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    for (name, url) in [
        ("Backend", config.backend_health_url()),
        ("Frontend", config.frontend_health_url()),
    ] {
        print!("  {name} ({url}): ");
        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                println!("{}", "✓ healthy".green());
            }
            Ok(response) => {
                println!("{}", format!("✗ status {}", response.status()).red());
                issues.push(format!("{name} unhealthy"));
            }
            Err(_) => {
                println!("{}", "✗ unreachable".red());
                issues.push(format!("{name} unreachable"));
            }
        }
    }

    // Summary
    println!();
    if issues.is_empty() {
        println!("{}", "✓ All checks passed".green().bold());
        println!();
        println!("  Frontend:  {}", config.frontend_url());
        println!("  Backend:   {}", config.backend_url());
        println!("  API docs:  {}/docs", config.backend_url());
        for (name, endpoint) in compose::expected_endpoints(config) {
            println!("  {:<9} {}", format!("{name}:"), endpoint);
        }
        Ok(())
    } else {
        println!("{}", format!("✗ {} issue(s) found:", issues.len()).red().bold());
        for issue in &issues {
            println!("  • {issue}");
        }
        bail!("{} check(s) failed", issues.len());
    }
}
