use ledger_core::{BlockView, Chain, Violation};
use std::fmt::Write;

pub fn render_block(view: &BlockView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Block {}:", view.index);
    let _ = writeln!(out, "  Transactions:  {}", view.transactions.join(", "));
    let _ = writeln!(out, "  Nonce:         {}", view.nonce);
    let _ = writeln!(out, "  Previous Hash: {}", view.previous_hash);
    let _ = writeln!(out, "  Merkle Root:   {}", view.merkle_root);
    let _ = writeln!(out, "  Current Hash:  {}", view.current_hash);
    let _ = writeln!(out, "  Timestamp:     {}", view.timestamp);
    out
}

pub fn render_chain(chain: &Chain) -> String {
    let config = chain.config();
    let mut out = format!(
        "Chain: {} block(s), {} tx/block, hash range [{}, {}]\n\n",
        chain.len(),
        config.transactions_per_block,
        config.min_hash,
        config.max_hash
    );
    for view in chain.iter() {
        out.push_str(&render_block(&view));
        out.push('\n');
    }
    out
}

pub fn render_verdict(result: &Result<(), Violation>) -> String {
    match result {
        Ok(()) => "Blockchain is valid.".to_string(),
        Err(violation) => format!("Blockchain is not valid: {violation}"),
    }
}
