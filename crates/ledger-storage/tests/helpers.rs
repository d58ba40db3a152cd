#![allow(dead_code)]

use std::fs;

use ledger_core::{Block, Chain, ChainStore};
use ledger_storage::sled_store::SledStore;
use tempfile::{tempdir, TempDir};

pub fn create_temp_store() -> (TempDir, SledStore) {
    // Create a temporary directory for the sled database
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().to_path_buf();
    (
        temp_dir,
        SledStore::open(&db_path).expect("Failed to open SledStore"),
    )
}

pub fn teardown_store(temp_dir: TempDir, store: SledStore) {
    let db_path = temp_dir.path().to_path_buf();
    store.clear().expect("Failed to clear the store");
    drop(store);
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&db_path);
    assert!(!db_path.exists(), "Database directory should be removed");
}

/// Genesis ["A","B"] followed by `extra` linked blocks, one transaction each.
pub fn linked_chain(extra: usize) -> Chain {
    let mut chain = Chain::new();
    chain.append(Block::genesis(vec!["A".into(), "B".into()], 1_000));
    for i in 0..extra {
        let tip = chain.tip().unwrap().current_hash.clone();
        let block = Block::new(
            &chain,
            vec![format!("tx-{i}")],
            i as i64 + 1,
            tip,
            1_000 + (i as u64 + 1) * 10,
        )
        .unwrap();
        chain.append(block);
    }
    chain
}
