// ============================
// crates/cli/src/main.rs
// ============================
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use towernotes_cli::{CliAuth, HttpAuthApi, DEFAULT_SERVER_URL};
use towernotes_common::CredentialFile;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tower", version, about = "towernotes command-line client")]
struct Cli {
    /// Base URL of the auth server
    #[arg(long, global = true, default_value = DEFAULT_SERVER_URL)]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account and log in
    Register {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in to an existing account
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Revoke the stored session and forget it locally
    Logout,
    /// Show who is logged in
    Status,
}

fn read_password(given: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("reading password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let file = CredentialFile::default_location()?;
    let auth = CliAuth::new(HttpAuthApi::new(&cli.server)?, file);

    match cli.command {
        Command::Register { username, password } => {
            let password = read_password(password)?;
            auth.register(&username, &password).await?;
            println!("Registered and logged in as {username}");
        },
        Command::Login { username, password } => {
            let password = read_password(password)?;
            auth.login(&username, &password).await?;
            println!("Logged in as {username}");
        },
        Command::Logout => match auth.logout().await? {
            Some(username) => println!("Logged out {username}"),
            None => println!("Not logged in"),
        },
        Command::Status => match auth.status() {
            Some((stored, true)) => println!("Logged in as {}", stored.username),
            Some((stored, false)) => {
                println!("Logged in as {} (access token expired)", stored.username)
            },
            None => println!("Not logged in"),
        },
    }
    Ok(())
}
