use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use quire_server::{QuireServer, ServerConfig};
use quire_store::{IntegrityIssue, OpenStatus, PublicationRecord, PublicationStore};
use serde_json::json;
use tracing::debug;

use crate::cli::*;

/// Environment variable consulted when the config file has no token.
const TOKEN_ENV: &str = "QUIRE_API_TOKEN";

pub async fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Check(args) => {
            let clean = cmd_check(&args.data_dir, cli.format)?;
            Ok(if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::List(args) => {
            cmd_list(&args.data_dir, cli.format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if config.api_token.is_none() {
        config.api_token = std::env::var(TOKEN_ENV).ok();
    }

    let server = QuireServer::new(config).context("starting server")?;
    println!(
        "{} Quire on {} (data: {})",
        "✓".green().bold(),
        server.config().bind_addr.to_string().bold(),
        server.config().data_dir.display()
    );
    server.serve().await?;
    Ok(ExitCode::SUCCESS)
}

/// Opening the store initializes a missing index and rebuilds a corrupt one,
/// exactly as the server does on startup.
fn open_store(data_dir: &Path) -> anyhow::Result<PublicationStore> {
    debug!(data_dir = %data_dir.display(), "opening store");
    let store = PublicationStore::open(data_dir, Default::default())
        .with_context(|| format!("opening store at {}", data_dir.display()))?;
    if let OpenStatus::Recovered(report) = store.open_status() {
        eprintln!(
            "{} index was unreadable ({}); rebuilt {} publication(s)",
            "!".yellow().bold(),
            report.reason,
            report.recovered
        );
    }
    Ok(store)
}

/// Returns whether the store is consistent.
fn cmd_check(data_dir: &Path, format: OutputFormat) -> anyhow::Result<bool> {
    let store = open_store(data_dir)?;
    let report = store.check_integrity()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            for issue in &report.issues {
                println!("  {} {}", "✗".red(), describe(issue));
            }
            if report.is_clean() {
                println!(
                    "{} {} publication(s), no issues.",
                    "✓".green().bold(),
                    report.checked
                );
            } else {
                println!(
                    "{} {} issue(s) across {} publication(s).",
                    "✗".red().bold(),
                    report.issues.len(),
                    report.checked
                );
            }
        }
    }

    Ok(report.is_clean())
}

fn describe(issue: &IntegrityIssue) -> String {
    match issue {
        IntegrityIssue::MissingImage { id, name } => format!("{id}: image {name} listed but missing"),
        IntegrityIssue::OrphanedImage { id, name } => format!("{id}: image {name} on disk but not listed"),
        IntegrityIssue::MissingContent { id } => format!("{id}: content missing"),
        IntegrityIssue::UnindexedDirectory { id } => format!("{id}: directory not in index"),
    }
}

fn cmd_list(data_dir: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let records = store.list()?;

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = records.iter().map(summary).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No publications.");
            }
            for r in &records {
                let lock = if r.is_protected() { "🔒" } else { "  " };
                println!(
                    "{} {} {}  {}  {} image(s)  {}",
                    r.id.short_hex().yellow(),
                    lock,
                    r.filename.bold(),
                    r.title.as_deref().unwrap_or("-").cyan(),
                    r.images.len(),
                    r.updated_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
                );
            }
        }
    }
    Ok(())
}

fn summary(r: &PublicationRecord) -> serde_json::Value {
    json!({
        "id": r.id,
        "filename": r.filename,
        "title": r.title,
        "protected": r.is_protected(),
        "images": r.images.len(),
        "updated_at": r.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_store::PublishRequest;
    use tempfile::tempdir;

    #[test]
    fn check_clean_store_succeeds() {
        let dir = tempdir().unwrap();
        open_store(dir.path())
            .unwrap()
            .publish(PublishRequest::new("a.md", "x"))
            .unwrap();
        assert!(cmd_check(dir.path(), OutputFormat::Json).unwrap());
    }

    #[test]
    fn check_reports_missing_content() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).unwrap();
        let id = store.publish(PublishRequest::new("a.md", "x")).unwrap().id;
        std::fs::remove_file(
            dir.path()
                .join(quire_store::PUBLICATIONS_DIR)
                .join(id.to_hex())
                .join("content.md"),
        )
        .unwrap();
        assert!(!cmd_check(dir.path(), OutputFormat::Text).unwrap());
    }

    #[test]
    fn summary_omits_hash() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).unwrap();
        store
            .publish(PublishRequest::new("a.md", "x").with_password_hash("h"))
            .unwrap();
        let rec = &store.list().unwrap()[0];
        let v = summary(rec);
        assert_eq!(v["protected"], true);
        assert!(v.get("password_hash").is_none());
    }
}
