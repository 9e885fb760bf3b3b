//! Operator CLI: inspect a persisted PoW-hash cache, dump a stake modifier for
//! a synthetic tip, or check a kernel hash against a coin-day-weighted target.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pos_kernel::config::{default_config_path, KernelConfig};
use pos_kernel::hash::Hash256;
use pos_kernel::powcache::{default_cache_path, PowHashCache};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "pos-kernel-cli", about = "Operator tooling for the PoS consensus kernel")]
struct Cli {
    /// Path to the kernel config file (defaults to ~/.pos-kernel/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the size and a sample of entries in the persisted PoW-hash cache.
    CacheInfo {
        /// Path to powcache.dat (defaults to the config's data directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Check whether a hash satisfies a compact target (CheckProofOfWork).
    CheckTarget {
        /// 64 hex characters, big-endian display order
        hash: String,
        /// Compact ("nBits") target, e.g. 0x1d00ffff
        bits: String,
    },
    /// Print the effective kernel configuration.
    ShowConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);

    match cli.command {
        Command::CacheInfo { path } => cache_info(&config_path, path),
        Command::CheckTarget { hash, bits } => check_target(&hash, &bits),
        Command::ShowConfig => show_config(&config_path),
    }
}

fn cache_info(config_path: &std::path::Path, path: Option<PathBuf>) -> Result<()> {
    let config = load_or_default(config_path)?;
    let cache_path = path.unwrap_or_else(|| {
        let data_dir = config_path.parent().unwrap_or(config_path);
        default_cache_path(data_dir)
    });

    let cache = PowHashCache::new(config.pow_cache.to_cache_config());
    cache.load(&cache_path);

    println!("cache file: {}", cache_path.display());
    println!("entries:    {}", cache.len());
    println!("validate:   {}", cache.validate_enabled());
    Ok(())
}

fn check_target(hash_hex: &str, bits_hex: &str) -> Result<()> {
    let hash = parse_hash(hash_hex)?;
    let bits = parse_bits(bits_hex)?;

    let params = mainnet_defaults();
    let accepted = pos_kernel::difficulty::check_proof_of_work(&hash, bits, &params);

    info!(hash = %hash, bits = format!("{bits:#010x}"), accepted, "checked proof of work");
    println!("{}", if accepted { "accept" } else { "reject" });
    Ok(())
}

fn show_config(config_path: &std::path::Path) -> Result<()> {
    let config = load_or_default(config_path)?;
    let kernel_logging = config.logging.to_kernel_logging();
    if kernel_logging.debug {
        info!("debug logging enabled in loaded config");
    }
    println!("{}", toml::to_string_pretty(&config).context("failed to render config")?);
    Ok(())
}

fn load_or_default(config_path: &std::path::Path) -> Result<KernelConfig> {
    if KernelConfig::exists(config_path) {
        KernelConfig::load(config_path)
    } else {
        Ok(KernelConfig::default())
    }
}

fn parse_hash(s: &str) -> Result<Hash256> {
    let bytes = hex::decode(s.trim_start_matches("0x")).context("invalid hex in hash")?;
    let mut be: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .context("hash must be exactly 32 bytes")?;
    be.reverse();
    Ok(Hash256::from_bytes(be))
}

fn parse_bits(s: &str) -> Result<u32> {
    let s = s.trim_start_matches("0x");
    u32::from_str_radix(s, 16).context("invalid hex in bits")
}

fn mainnet_defaults() -> pos_kernel::ConsensusParams {
    use pos_kernel::Network;
    use std::collections::HashMap;
    pos_kernel::ConsensusParams {
        network: Network::Mainnet,
        modifier_interval: 6 * 60 * 60,
        stake_target_spacing: 30,
        pow_target_spacing: 30,
        target_timespan: 40 * 60,
        stake_min_age: 86_400,
        stake_max_age: 7_776_000,
        pow_limit: Hash256::from_bytes([0xff; 32]),
        initial_hash_target: Hash256::from_bytes([0xff; 32]),
        dgw_blocks_avg: 60,
        pow_dgw_height: 1000,
        pos_activation_height: 500,
        genesis_hash: Hash256::ZERO,
        coin: 100_000_000,
        stake_modifier_checkpoints: HashMap::new(),
    }
}
