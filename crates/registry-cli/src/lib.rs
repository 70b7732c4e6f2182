//! # registry-cli
//!
//! Command-line tooling for the network discovery registry.
//!
//! ## Features
//!
//! - **Proof of work**: solve a registration challenge locally
//! - **Keys**: generate Ed25519 or P-256 key pairs for a network
//! - **Signing**: print the canonical form of a payload, sign it, verify it
//! - **Configuration**: show the effective registry configuration

pub mod cli;
pub mod config;

pub use cli::run;
