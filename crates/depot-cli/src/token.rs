//! # Token Subcommand
//!
//! Loads the token file, applies one change and saves it back atomically.
//! Secrets are printed once, at `add` and `rotate`; only their salted hashes
//! reach the file.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use depot_auth::TokenStore;

/// Arguments for the `depot token` subcommand.
#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands.
#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Issue a new token and print its secret.
    Add {
        /// Unique token name, used as the user part of credentials.
        alias: String,
        /// Repository subtree the token may deploy under (e.g. "/com/example", or "/" for all).
        #[arg(long, value_name = "PREFIX")]
        path: String,
    },

    /// List tokens without their secrets.
    List,

    /// Replace a token's secret and print the new one.
    Rotate { alias: String },

    /// Deactivate a token without deleting it.
    Disable { alias: String },

    /// Reactivate a disabled token.
    Enable { alias: String },

    /// Delete a token.
    Remove { alias: String },
}

/// Execute the token subcommand, writing results to stdout.
pub fn run_token(args: &TokenArgs, tokens_file: &Path) -> Result<u8> {
    let stdout = std::io::stdout();
    run_token_to(args, tokens_file, &mut stdout.lock())
}

/// Execute the token subcommand, writing results to `out`.
pub fn run_token_to(args: &TokenArgs, tokens_file: &Path, out: &mut impl Write) -> Result<u8> {
    let mut store = TokenStore::load_or_default(tokens_file)
        .with_context(|| format!("failed to load tokens from {}", tokens_file.display()))?;

    match &args.command {
        TokenCommand::List => {
            if store.is_empty() {
                writeln!(out, "no tokens in {}", tokens_file.display())?;
            }
            for token in store.tokens() {
                writeln!(
                    out,
                    "{:<24} {:<32} {:<8} {}",
                    token.alias,
                    token.path,
                    if token.enabled { "enabled" } else { "disabled" },
                    token.issued_at.format("%Y-%m-%dT%H:%M:%SZ"),
                )?;
            }
            return Ok(0);
        }
        TokenCommand::Add { alias, path } => {
            let secret = store
                .create(alias, path)
                .with_context(|| format!("cannot add token {alias}"))?;
            let prefix = store.get(alias).map(|t| t.path.to_string()).unwrap_or_default();
            writeln!(out, "OK: added token {alias} for {prefix}")?;
            writeln!(out, "secret: {secret}")?;
        }
        TokenCommand::Rotate { alias } => {
            let secret = store
                .rotate(alias)
                .with_context(|| format!("cannot rotate token {alias}"))?;
            writeln!(out, "OK: rotated token {alias}")?;
            writeln!(out, "secret: {secret}")?;
        }
        TokenCommand::Disable { alias } => {
            store
                .set_enabled(alias, false)
                .with_context(|| format!("cannot disable token {alias}"))?;
            writeln!(out, "OK: disabled token {alias}")?;
        }
        TokenCommand::Enable { alias } => {
            store
                .set_enabled(alias, true)
                .with_context(|| format!("cannot enable token {alias}"))?;
            writeln!(out, "OK: enabled token {alias}")?;
        }
        TokenCommand::Remove { alias } => {
            store
                .remove(alias)
                .with_context(|| format!("cannot remove token {alias}"))?;
            writeln!(out, "OK: removed token {alias}")?;
        }
    }

    store
        .save(tokens_file)
        .with_context(|| format!("failed to save tokens to {}", tokens_file.display()))?;
    tracing::info!(file = %tokens_file.display(), tokens = store.len(), "token file updated");
    Ok(0)
}
