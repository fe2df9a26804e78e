//! # digicred-cli
//!
//! Command-line interface for the DigiCred gateway.
//!
//! ## Commands
//!
//! - `digicred start`: bring up the configured agents and serve the REST API
//! - `digicred config`: show the effective configuration
//! - `digicred doctor`: audit the configuration
//! - `digicred init`: write a starter `digicred.toml`
//! - `digicred qr`: print a QR code in the terminal
//! - `digicred cursor`: inspect or mint pagination cursors

pub mod commands;

pub use commands::Cli;
