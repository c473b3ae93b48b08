//! Q-SAFE CLI - operator tooling for allowlist artifacts

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use qsafe_allowlist::artifact;
use qsafe_core::{AllowlistSource, CfiGuard, CheckpointOutcome, GuardConfig, ViolationPolicy};
use qsafe_monitor::mix::prefix_hashes;

#[derive(Parser)]
#[command(name = "qsafe")]
#[command(about = "Q-SAFE - Runtime Control-Flow Integrity Monitor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Validate an allowlist artifact and summarize its contents
    Inspect {
        /// Path to the allowlist artifact
        artifact: PathBuf,
    },
    /// Print the prefix hashes a generator must bless for a trace
    Hash {
        /// Checkpoint ids of the legitimate trace, in call order
        #[arg(value_parser = parse_checkpoint_id, required = true)]
        trace: Vec<u64>,
    },
    /// Replay a checkpoint trace against an allowlist artifact
    Replay {
        /// Path to the allowlist artifact
        #[arg(short, long)]
        allowlist: PathBuf,
        /// Checkpoint ids to replay, in call order
        #[arg(value_parser = parse_checkpoint_id, required = true)]
        trace: Vec<u64>,
    },
}

/// Accepts decimal or 0x-prefixed hex checkpoint ids.
fn parse_checkpoint_id(raw: &str) -> Result<u64, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| format!("invalid checkpoint id '{raw}': {e}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    match cli.command {
        Commands::Inspect { artifact } => inspect(&artifact),
        Commands::Hash { trace } => {
            hash(&trace);
            Ok(())
        }
        Commands::Replay { allowlist, trace } => replay(&allowlist, &trace),
    }
}

fn inspect(path: &PathBuf) -> anyhow::Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let hashes = artifact::decode(&bytes)
        .with_context(|| format!("decoding {}", path.display()))?;

    println!("{}: valid artifact, {} context hashes", path.display(), hashes.len());
    for hash in &hashes {
        println!("  {hash:#018x}");
    }
    Ok(())
}

fn hash(trace: &[u64]) {
    for (prefix_len, hash) in prefix_hashes(trace).iter().enumerate() {
        println!("{:#018x}  <- {:x?}", hash, &trace[..=prefix_len]);
    }
}

fn replay(allowlist: &PathBuf, trace: &[u64]) -> anyhow::Result<()> {
    let config = GuardConfig {
        allowlist: AllowlistSource::File(allowlist.clone()),
        violation_policy: ViolationPolicy::Report,
        audit_logging: false,
    };
    let guard = CfiGuard::initialize(config)
        .with_context(|| format!("loading {}", allowlist.display()))?;

    let mut ctx = guard.context();
    for &id in trace {
        match ctx.checkpoint(id) {
            CheckpointOutcome::Pass { context } => {
                println!("[+] checkpoint {id:#x} accepted (context {context:#x})");
            }
            outcome => {
                println!("[!] {outcome}");
                anyhow::bail!("trace violates the allowlist");
            }
        }
    }

    println!("[+] trace replayed cleanly ({} checkpoints)", trace.len());
    Ok(())
}
