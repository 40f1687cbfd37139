//! CLI tool for signing webhook payloads
//!
//! Produces the `X-Hub-Signature` value GitHub would send for a payload, so a
//! delivery can be replayed against the listener by hand.

use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;

use github_notify::webhooks::signature;

#[derive(Parser)]
#[command(name = "sign-webhook")]
#[command(about = "Sign or verify a GitHub webhook payload")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the X-Hub-Signature header for a payload
    Sign {
        /// Shared webhook secret
        #[arg(short, long, env = "GITHUB_WEBHOOK_SECRET")]
        secret: String,

        /// Payload file (raw request body)
        #[arg(short, long)]
        file: String,
    },
    /// Check a payload against a signature header
    Verify {
        /// Shared webhook secret
        #[arg(short, long, env = "GITHUB_WEBHOOK_SECRET")]
        secret: String,

        /// Payload file (raw request body)
        #[arg(short, long)]
        file: String,

        /// Header value, e.g. sha1=...
        #[arg(long)]
        signature: String,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sign { secret, file } => {
            let body = fs::read(&file)?;
            println!("{}", signature::sign(&secret, &body));
        }
        Commands::Verify {
            secret,
            file,
            signature: header,
        } => {
            let body = fs::read(&file)?;
            if secret.is_empty() {
                println!("No secret given; the listener would skip verification");
                return Ok(ExitCode::SUCCESS);
            }
            match signature::verify(&secret, &body, Some(&header)) {
                Ok(()) => println!("Signature valid"),
                Err(e) => {
                    println!("Signature invalid: {}", e);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
