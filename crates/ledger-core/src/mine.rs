use crate::block::Block;
use crate::chain::{Chain, ChainConfig};
use crate::clock::{Clock, SystemClock, Timestamp};
use crate::error::{LedgerError, Result};
use crate::pow::{candidate_digest, in_range};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Stop conditions for the nonce search. Both default to unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    pub max_attempts: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl MinerConfig {
    fn deadline(&self) -> Option<Instant> {
        self.timeout_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms))
    }
}

/// Shared flag that stops a running search at its next attempt.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The accepted nonce together with what is needed to re-check it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub nonce: i64,
    pub digest: String,
    /// Timestamp sampled for the winning attempt.
    pub timestamp: Timestamp,
    pub attempts: u64,
}

impl Proof {
    /// Recompute the candidate digest against the chain's current tip and
    /// check it still lands in the chain's hash range.
    pub fn verify<S: AsRef<str>>(&self, chain: &Chain, transactions: &[S]) -> bool {
        let Some(tip) = chain.tip() else {
            return false;
        };
        let digest = candidate_digest(transactions, self.nonce, &tip.current_hash, self.timestamp);
        digest == self.digest && chain.config().accepts(&digest)
    }
}

/// Brute-force proof-of-work search over nonces `0, 1, 2, ...`.
///
/// Each attempt samples a fresh timestamp from the miner's clock, so with the
/// default [`SystemClock`] two searches over the same inputs may settle on
/// different nonces.
pub struct Miner<C: Clock = SystemClock> {
    config: MinerConfig,
    clock: C,
    cancel: Option<CancelToken>,
}

impl Default for Miner<SystemClock> {
    fn default() -> Self {
        Self::new(MinerConfig::default())
    }
}

impl Miner<SystemClock> {
    pub fn new(config: MinerConfig) -> Self {
        Self {
            config,
            clock: SystemClock,
            cancel: None,
        }
    }
}

impl<C: Clock> Miner<C> {
    pub fn with_clock<D: Clock>(self, clock: D) -> Miner<D> {
        Miner {
            config: self.config,
            clock,
            cancel: self.cancel,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Search sequentially for the first nonce whose candidate digest lies in
    /// the chain's `[min_hash, max_hash]` range.
    pub fn search<S: AsRef<str>>(&self, chain: &Chain, transactions: &[S]) -> Result<Proof> {
        let tip_hash = preconditions(chain)?;
        self.search_from(chain.config(), tip_hash, transactions)
    }

    fn search_from<S: AsRef<str>>(
        &self,
        config: &ChainConfig,
        tip_hash: &str,
        transactions: &[S],
    ) -> Result<Proof> {
        let deadline = self.config.deadline();
        let mut attempts = 0u64;

        for nonce in 0..=i64::MAX {
            if self.cancelled() {
                return Err(LedgerError::MiningCancelled);
            }
            if self.config.max_attempts.is_some_and(|cap| attempts >= cap) {
                return Err(LedgerError::AttemptsExhausted { attempts });
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(LedgerError::MiningTimedOut { attempts });
            }

            let timestamp = self.clock.now();
            let digest = candidate_digest(transactions, nonce, tip_hash, timestamp);
            attempts += 1;

            if in_range(&digest, &config.min_hash, &config.max_hash) {
                info!(nonce, attempts, %digest, "mined nonce");
                return Ok(Proof {
                    nonce,
                    digest,
                    timestamp,
                    attempts,
                });
            }
        }

        Err(LedgerError::AttemptsExhausted { attempts })
    }

    /// Search nonces across the rayon thread pool. Any accepted nonce may be
    /// returned, not necessarily the smallest.
    pub fn search_parallel<S: AsRef<str> + Sync>(
        &self,
        chain: &Chain,
        transactions: &[S],
    ) -> Result<Proof> {
        let tip_hash = preconditions(chain)?;
        let config = chain.config();
        let deadline = self.config.deadline();
        let limit = self
            .config
            .max_attempts
            .map_or(i64::MAX, |cap| cap.min(i64::MAX as u64) as i64);
        let checked = AtomicU64::new(0);

        let outcome = (0..limit).into_par_iter().find_map_any(|nonce| {
            if self.cancelled() {
                return Some(Err(LedgerError::MiningCancelled));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Some(Err(LedgerError::MiningTimedOut {
                    attempts: checked.load(Ordering::Relaxed),
                }));
            }

            let timestamp = self.clock.now();
            let digest = candidate_digest(transactions, nonce, tip_hash, timestamp);
            checked.fetch_add(1, Ordering::Relaxed);

            in_range(&digest, &config.min_hash, &config.max_hash).then(|| {
                Ok(Proof {
                    nonce,
                    digest,
                    timestamp,
                    attempts: 0,
                })
            })
        });

        let attempts = checked.load(Ordering::Relaxed);
        match outcome {
            Some(Ok(mut proof)) => {
                proof.attempts = attempts;
                info!(nonce = proof.nonce, attempts, digest = %proof.digest, "mined nonce in parallel");
                Ok(proof)
            }
            Some(Err(e)) => Err(e),
            None => Err(LedgerError::AttemptsExhausted { attempts }),
        }
    }

    /// Mine a nonce for `transactions` and seal the block that extends the
    /// chain's tip, stamped with the winning attempt's timestamp. The block is
    /// not appended.
    pub fn mine_block(&self, chain: &Chain, transactions: Vec<String>) -> Result<(Block, Proof)> {
        let tip_hash = preconditions(chain)?;
        let proof = self.search_from(chain.config(), tip_hash, &transactions)?;
        let previous_hash = tip_hash.to_string();
        let block = Block::new(chain, transactions, proof.nonce, previous_hash, proof.timestamp)?;
        debug!(hash = %block.current_hash, "built mined block");
        Ok((block, proof))
    }
}

fn preconditions(chain: &Chain) -> Result<&str> {
    let tip = chain.tip().ok_or(LedgerError::EmptyChain)?;
    let config = chain.config();
    if !config.hash_range_is_valid() {
        return Err(LedgerError::InvalidHashRange {
            min: config.min_hash.clone(),
            max: config.max_hash.clone(),
        });
    }
    Ok(&tip.current_hash)
}

/// Mine with live time and no stop conditions, returning only the nonce.
pub fn mine<S: AsRef<str>>(chain: &Chain, transactions: &[S]) -> Result<i64> {
    Miner::default().search(chain, transactions).map(|p| p.nonce)
}
