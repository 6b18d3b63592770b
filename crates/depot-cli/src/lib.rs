//! # depot-cli: Administrative CLI for depot
//!
//! Provides the `depot` command-line interface. Every command edits the token
//! file offline; a running server picks the changes up on restart.
//!
//! ## Subcommands
//!
//! ```bash
//! depot token add ci --path /com/example
//! depot token list
//! depot token rotate ci
//! depot token disable ci
//! depot token enable ci
//! depot token remove ci
//! ```

pub mod token;
