mod display;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{clock, Block, Chain, ChainConfig, ChainStore, Miner, MinerConfig};
use ledger_storage::sled_store::SledStore;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger")]
#[command(about = "Local append-only ledger with Merkle-bound blocks and range proof-of-work")]
struct Cli {
    /// Data directory for sled
    #[arg(long, global = true, default_value = "./data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a chain with a genesis block
    Init {
        /// Genesis transaction (repeatable)
        #[arg(long = "tx")]
        txs: Vec<String>,
        /// JSON chain config (transactions_per_block, min_hash, max_hash)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Replace an existing chain
        #[arg(long)]
        force: bool,
    },
    /// Mine a nonce for a batch and append the block
    Mine {
        /// Transaction (repeatable)
        #[arg(long = "tx", required = true)]
        txs: Vec<String>,
        /// Give up after this many attempts
        #[arg(long)]
        max_attempts: Option<u64>,
        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Search nonces on all cores
        #[arg(long)]
        parallel: bool,
    },
    /// Print every block
    Show {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Verify chain integrity
    Verify {
        /// Also recompute each block's hash
        #[arg(long)]
        strict: bool,
    },
    /// Overwrite one transaction of a stored block without fixing its merkle root
    Tamper {
        #[arg(long)]
        block: usize,
        #[arg(long)]
        index: usize,
        #[arg(long)]
        value: String,
    },
    /// Run the in-memory walkthrough: genesis, one mined block, tamper, verify
    Demo {
        #[arg(long, default_value = "0000")]
        min_hash: String,
        #[arg(long, default_value = "ffff")]
        max_hash: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Init { txs, config, force } => init(&cli.data_dir, txs, config, force),
        Command::Mine {
            txs,
            max_attempts,
            timeout_ms,
            parallel,
        } => mine(
            &cli.data_dir,
            txs,
            MinerConfig {
                max_attempts,
                timeout_ms,
            },
            parallel,
        ),
        Command::Show { json } => show(&cli.data_dir, json),
        Command::Verify { strict } => verify(&cli.data_dir, strict),
        Command::Tamper {
            block,
            index,
            value,
        } => tamper(&cli.data_dir, block, index, value),
        Command::Demo { min_hash, max_hash } => demo(min_hash, max_hash),
    }
}

fn open_chain(data_dir: &Path) -> Result<(SledStore, Chain)> {
    let store = SledStore::open(data_dir)?;
    let chain = Chain::load(&store)?;
    if chain.is_empty() {
        bail!("no chain in {}; run `ledger init` first", data_dir.display());
    }
    Ok((store, chain))
}

fn init(data_dir: &Path, txs: Vec<String>, config: Option<PathBuf>, force: bool) -> Result<()> {
    let config = match config {
        Some(path) => ChainConfig::from_json_file(path)?,
        None => ChainConfig::default(),
    };
    let store = SledStore::open(data_dir)?;
    if store.block_count()? > 0 {
        if !force {
            bail!("{} already holds a chain; pass --force to replace it", data_dir.display());
        }
        store.clear()?;
    }

    let mut chain = Chain::with_config(config);
    let genesis = Block::new(&chain, txs, 0, "", clock::now())?;
    println!("genesis: {}", genesis.current_hash);
    chain.append(genesis);
    chain.save(&store)?;
    store.close()
}

fn mine(data_dir: &Path, txs: Vec<String>, config: MinerConfig, parallel: bool) -> Result<()> {
    let (store, mut chain) = open_chain(data_dir)?;
    let per_block = chain.config().transactions_per_block;
    if txs.len() > per_block {
        warn!(txs = txs.len(), per_block, "batch is larger than transactions_per_block");
    }

    let miner = Miner::new(config);
    let proof = if parallel {
        miner.search_parallel(&chain, &txs)
    } else {
        miner.search(&chain, &txs)
    }
    .context("mining failed")?;

    let tip = chain.tip().map(|b| b.current_hash.clone()).unwrap_or_default();
    let block = Block::new(&chain, txs, proof.nonce, tip, proof.timestamp)?;
    println!(
        "mined block {} nonce={} attempts={} hash={}",
        chain.len(),
        proof.nonce,
        proof.attempts,
        block.current_hash
    );
    let index = chain.len() as u64;
    store.put_block(index, &block)?;
    chain.append(block);
    store.close()
}

fn show(data_dir: &Path, json: bool) -> Result<()> {
    let (_store, chain) = open_chain(data_dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&chain.view())?);
    } else {
        print!("{}", display::render_chain(&chain));
    }
    Ok(())
}

fn verify(data_dir: &Path, strict: bool) -> Result<()> {
    let (_store, chain) = open_chain(data_dir)?;
    let result = if strict {
        chain.check_strict()
    } else {
        chain.check()
    };
    println!("{}", display::render_verdict(&result));
    result.context("verification failed")
}

fn tamper(data_dir: &Path, block: usize, index: usize, value: String) -> Result<()> {
    let (store, mut chain) = open_chain(data_dir)?;
    let target = chain
        .block_mut(block)
        .with_context(|| format!("no block {block}"))?;
    if index >= target.tx_count() {
        bail!("block {block} has {} transaction(s), no index {index}", target.tx_count());
    }
    target.change_transaction(index, value);
    info!(block, index, hash = %target.current_hash, "transaction overwritten");
    store.put_block(block as u64, target)?;
    store.close()
}

fn demo(min_hash: String, max_hash: String) -> Result<()> {
    let mut chain = Chain::new();
    chain.set_hash_range(min_hash, max_hash);

    let genesis = Block::new(&chain, vec!["A".into(), "B".into()], 0, "", clock::now())?;
    chain.append(genesis);

    let (block, proof) = Miner::default().mine_block(&chain, vec!["C".into()])?;
    info!(nonce = proof.nonce, attempts = proof.attempts, "mined demo block");
    chain.append(block);

    print!("{}", display::render_chain(&chain));
    println!("{}", display::render_verdict(&chain.check()));

    if let Some(block) = chain.block_mut(1) {
        block.change_transaction(0, "C (tampered)");
    }
    println!("\nAfter changing block 1's transaction:");
    println!("{}", display::render_verdict(&chain.check()));
    Ok(())
}
