#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI printing a per-folder message count and size summary

use anyhow::Context;
use clap::Parser;
use imap_folder_summary::{Security, SortKey, SummaryClient, SummaryConfig, render};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imap-folder-summary")]
#[command(about = "Display a summary of all folders in an IMAP account")]
struct Args {
    /// The IMAP hostname
    hostname: String,

    /// The IMAP port number (eg 993)
    port: u16,

    /// The username (will prompt if not provided)
    #[arg(long, env = "IMAP_USERNAME")]
    username: Option<String>,

    /// The password (will prompt if not provided)
    #[arg(long, env = "IMAP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Connect without TLS
    #[arg(long, conflicts_with = "starttls")]
    no_tls: bool,

    /// Connect in plaintext and upgrade with STARTTLS
    #[arg(long)]
    starttls: bool,

    /// Accept invalid or self-signed server certificates
    #[arg(long)]
    insecure: bool,

    /// Sort key: name, num_msgs or size
    #[arg(long, default_value_t = SortKey::Name)]
    sort: SortKey,

    /// Reverse the sort order
    #[arg(long)]
    sort_reverse: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    const fn security(&self) -> Security {
        if self.no_tls {
            Security::Plain
        } else if self.starttls {
            Security::StartTls
        } else {
            Security::Tls
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let username = match args.username.clone() {
        Some(username) => username,
        None => prompt_username()?,
    };
    let password = match args.password.clone() {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("failed to read password")?,
    };

    let config = SummaryConfig {
        host: args.hostname.clone(),
        port: args.port,
        username,
        password,
        security: args.security(),
        accept_invalid_certs: args.insecure,
    };

    let summary = SummaryClient::new(config).summarize().await?;
    let records = summary.sorted(args.sort, args.sort_reverse);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", render(&records));
    }

    Ok(())
}

fn prompt_username() -> anyhow::Result<String> {
    eprint!("Username: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read username")?;
    Ok(line.trim().to_string())
}
