//! `crypt` — command-line front end for the codec.
//!
//! Startup sequence:
//! 1. Parse arguments.
//! 2. Load and validate [`Settings`] from `CRYPT_*` environment variables.
//! 3. Initialise structured logging on stderr.
//! 4. Run the command, printing only its result on stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crypt::config::{env_source, Settings};
use crypt::{telemetry, CipherCodec, IvPolicy};

#[derive(Parser)]
#[command(author, version, about = "Encrypt and decrypt strings with the application key")]
struct Args {
    #[command(subcommand)]
    command: CommandKind,
}

#[derive(Subcommand)]
enum CommandKind {
    /// Print a fresh base64-encoded 32-byte key for the key variable.
    KeyGenerate,
    /// Encrypt TEXT (empty when omitted) and print the blob.
    Encrypt {
        text: Option<String>,
        /// Derive the IV from this anchor instead of generating a random one.
        #[arg(long, conflicts_with = "deterministic")]
        anchor: Option<String>,
        /// Derive the IV from TEXT itself.
        #[arg(long)]
        deterministic: bool,
    },
    /// Decrypt BLOB and print the plaintext.
    Decrypt {
        blob: String,
        /// Anchor the blob was encrypted with, if any.
        #[arg(long)]
        anchor: Option<String>,
    },
}

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Arguments
    // -----------------------------------------------------------------------
    let args = Args::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let settings = Settings::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&settings.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "crypt starting");

    // -----------------------------------------------------------------------
    // 4. Command
    // -----------------------------------------------------------------------
    match args.command {
        CommandKind::KeyGenerate => println!("{}", crypt::generate_key()),
        CommandKind::Encrypt {
            text,
            anchor,
            deterministic,
        } => {
            let policy = match (anchor, deterministic) {
                (Some(anchor), _) => IvPolicy::deterministic(anchor),
                (None, true) => IvPolicy::deterministic(text.clone().unwrap_or_default()),
                (None, false) => IvPolicy::Random,
            };
            let blob = codec(&settings)?.encrypt(text.as_deref(), &policy)?;
            println!("{blob}");
        }
        CommandKind::Decrypt { blob, anchor } => {
            let policy = anchor.map_or(IvPolicy::Random, IvPolicy::DeterministicFromAnchor);
            let plaintext = codec(&settings)?
                .decrypt(Some(blob.as_str()), &policy)?
                .context("blob did not decrypt to a value (wrong key or anchor?)")?;
            println!("{plaintext}");
        }
    }

    Ok(())
}

/// Build a codec over the environment and resolve its key up front.
fn codec(settings: &Settings) -> Result<CipherCodec> {
    let codec = CipherCodec::with_key_name(env_source()?, settings.key_name.as_str());
    codec.resolve_key()?;
    Ok(codec)
}
