//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use registry_srv::identity::KeyAlgorithm;

/// Client and operator tooling for the network discovery registry
///
/// Solve registration challenges, manage network keys, and sign
/// modification payloads.
#[derive(Parser, Debug)]
#[command(name = "registry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(short, long, env = "DR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve a proof-of-work challenge
    Solve(SolveArgs),

    /// Generate a network key pair
    Keygen(KeygenArgs),

    /// Print the canonical serialization of a JSON payload
    Canonical(CanonicalArgs),

    /// Sign a JSON payload with a network private key
    Sign(SignArgs),

    /// Verify a payload signature against a public key
    Verify(VerifyArgs),

    /// Show the effective registry configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Puzzle from the challenge token
    #[arg(short, long)]
    pub puzzle: String,

    /// Required leading zero bits
    #[arg(short, long)]
    pub difficulty: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Ed25519,
    P256,
}

impl From<Algorithm> for KeyAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Ed25519 => Self::Ed25519,
            Algorithm::P256 => Self::EcdsaP256,
        }
    }
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Signature algorithm
    #[arg(short, long, value_enum, default_value_t = Algorithm::Ed25519)]
    pub algorithm: Algorithm,

    /// Write network.key and network.pub into this directory instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Overwrite existing key files
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CanonicalArgs {
    /// JSON payload file ("-" for stdin)
    pub payload: PathBuf,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// PKCS#8 PEM private key
    #[arg(short, long)]
    pub key: PathBuf,

    /// JSON payload file ("-" for stdin)
    pub payload: PathBuf,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// SPKI PEM public key
    #[arg(short = 'k', long)]
    pub public_key: PathBuf,

    /// Hex signature
    #[arg(short, long)]
    pub signature: String,

    /// JSON payload file ("-" for stdin)
    pub payload: PathBuf,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print only the config file path
    #[arg(long)]
    pub show_path: bool,
}
