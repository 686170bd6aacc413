//! Tarifario CLI
//!
//! Command-line interface for Tarifario operations:
//! - Browse the tariff list
//! - Propose new prices (inline or from CSV)
//! - Preview price formatting
//! - Check server status

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tarifario::config::generate_default_config;
use tarifario::form::{format_for_display, strip_non_digits, NumberLocale};

#[derive(Parser)]
#[command(name = "tarifario")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dental clinic price list and price update tool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8080", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the tariff list
    Catalog,

    /// Propose new prices and submit them as one update
    Propose {
        /// Edits in CODE=AMOUNT format (e.g. D0120=25000)
        edits: Vec<String>,
        /// CSV file with `codigo,monto` rows
        #[arg(long)]
        file: Option<PathBuf>,
        /// Show the change-set without submitting
        #[arg(long)]
        dry_run: bool,
    },

    /// Format a raw amount the way the form displays it
    Format {
        /// Raw input (non-digits are dropped)
        raw: String,
        /// Number locale (es-CR, en-US)
        #[arg(short, long, default_value = "es-CR")]
        locale: String,
    },

    /// Show system status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let api = format!("{}/api/v1", cli.api_url.trim_end_matches('/'));

    match cli.command {
        Commands::Catalog => {
            let response = client.get(format!("{}/catalog", api)).send().await?;

            if !response.status().is_success() {
                eprintln!("Failed to fetch catalog: {}", response.status());
                std::process::exit(1);
            }

            let catalog: serde_json::Value = response.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
                return Ok(());
            }

            let empty = Vec::new();
            for section in catalog["sections"].as_array().unwrap_or(&empty) {
                println!();
                println!("{}", section["title"].as_str().unwrap_or("-").to_uppercase());
                println!("{:<8} {:<45} {:>14}", "Código", "Servicio", "Monto (₡)");
                println!("{}", "-".repeat(69));

                for item in section["items"].as_array().unwrap_or(&empty) {
                    println!(
                        "{:<8} {:<45} {:>14}",
                        item["code"].as_str().unwrap_or("-"),
                        truncate(item["name"].as_str().unwrap_or("-"), 45),
                        item["base_price_display"].as_str().unwrap_or("-")
                    );
                }
            }
            println!();
            println!("{} items", catalog["item_count"].as_u64().unwrap_or(0));
        }

        Commands::Propose {
            edits,
            file,
            dry_run,
        } => {
            let mut pairs = Vec::new();

            if let Some(path) = file {
                if !path.exists() {
                    eprintln!("File not found: {:?}", path);
                    std::process::exit(1);
                }
                pairs.extend(read_edits_csv(&path)?);
            }

            for edit in &edits {
                match edit.split_once('=') {
                    Some((code, amount)) => {
                        pairs.push((code.trim().to_string(), amount.trim().to_string()))
                    }
                    None => {
                        eprintln!("Invalid edit (expected CODE=AMOUNT): {}", edit);
                        std::process::exit(1);
                    }
                }
            }

            if pairs.is_empty() {
                eprintln!("Nothing to propose. Pass CODE=AMOUNT edits or --file.");
                std::process::exit(1);
            }

            let session: serde_json::Value = client
                .post(format!("{}/sessions", api))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            let session_id = session["session_id"].as_str().unwrap_or_default().to_string();
            let session_url = format!("{}/sessions/{}", api, session_id);

            for (code, amount) in &pairs {
                let response = client
                    .put(edit_url(&session_url, code))
                    .json(&serde_json::json!({ "raw": amount }))
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let text = response.text().await.unwrap_or_default();
                    eprintln!("Rejected edit for {}: {}", code, text);
                    close_session(&client, &session_url).await;
                    std::process::exit(1);
                }
            }

            if dry_run {
                let changes: serde_json::Value = client
                    .get(format!("{}/changes", session_url))
                    .send()
                    .await?
                    .json()
                    .await?;
                close_session(&client, &session_url).await;

                if cli.format == "json" {
                    println!("{}", serde_json::to_string_pretty(&changes)?);
                } else {
                    print_updates(&changes["updates"]);
                    println!();
                    println!("Dry run: {} change(s) not submitted", changes["count"]);
                }
                return Ok(());
            }

            let response = client
                .post(format!("{}/submit", session_url))
                .send()
                .await?;
            let status = response.status();
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            close_session(&client, &session_url).await;

            if !status.is_success() {
                let message = body["error"]["message"].as_str().unwrap_or("unknown error");
                eprintln!("Submission failed ({}): {}", status, message);
                std::process::exit(1);
            }

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print_updates(&body["updates"]);
                println!();
                println!("{}", body["message"].as_str().unwrap_or("Submitted"));
                println!("Record: {}", body["id"].as_str().unwrap_or("-"));
            }
        }

        Commands::Format { raw, locale } => {
            let Some(locale) = NumberLocale::from_tag(&locale) else {
                eprintln!("Unknown locale: {} (expected es-CR or en-US)", locale);
                std::process::exit(1);
            };

            let digits = strip_non_digits(&raw);
            let display = format_for_display(&raw, locale);

            if cli.format == "json" {
                let out = serde_json::json!({ "digits": digits, "display": display });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}", display);
            }
        }

        Commands::Status => {
            let response = client.get(format!("{}/health", cli.api_url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;
                    println!("Tarifario v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!(
                        "API Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!("Store: {}", health["store"].as_str().unwrap_or("unknown"));
                    println!(
                        "Catalog items: {}",
                        health["catalog_items"].as_u64().unwrap_or(0)
                    );
                    println!("Open sessions: {}", health["sessions"].as_u64().unwrap_or(0));

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Tarifario API at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the Tarifario server is running:");
                    eprintln!("  cargo run --bin tarifario");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            if let Some(path) = output {
                std::fs::write(&path, &config)?;
                println!("Config written to {:?}", path);
            } else {
                println!("{}", config);
            }
        }
    }

    Ok(())
}

/// Read `codigo,monto` rows; the header row is required
fn read_edits_csv(path: &Path) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut pairs = Vec::new();

    for record in reader.records() {
        let record = record?;
        match (record.get(0), record.get(1)) {
            (Some(code), Some(amount)) if !code.trim().is_empty() => {
                pairs.push((code.trim().to_string(), amount.trim().to_string()));
            }
            _ => continue,
        }
    }

    Ok(pairs)
}

/// Item codes are user input; keep them inside one path segment
fn edit_url(session_url: &str, code: &str) -> String {
    format!("{}/edits/{}", session_url, urlencoding::encode(code))
}

async fn close_session(client: &reqwest::Client, session_url: &str) {
    if let Err(e) = client.delete(session_url).send().await {
        eprintln!("Warning: could not close session: {}", e);
    }
}

fn print_updates(updates: &serde_json::Value) {
    let empty = Vec::new();
    let updates = updates.as_array().unwrap_or(&empty);

    println!("{:<8} {:<45} {:>14}", "Código", "Servicio", "Nuevo monto");
    println!("{}", "-".repeat(69));
    for update in updates {
        println!(
            "{:<8} {:<45} {:>14}",
            update["codigo"].as_str().unwrap_or("-"),
            truncate(update["servicio"].as_str().unwrap_or("-"), 45),
            update["monto_nuevo"].as_u64().unwrap_or(0)
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{}…", cut)
    }
}

fn format_duration(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
