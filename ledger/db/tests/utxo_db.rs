// Copyright (c) 2021-2024 The Chroma Foundation

//! End-to-end ledger scenarios: genesis, faucet, transfers, consolidation,
//! minting, and the rejection paths.

use chr_account_keys::Address;
use chr_crypto_hashes::hash32;
use chr_crypto_keys::Ed25519Pair;
use chr_ledger_db::{key_pair_from_seed, LedgerError, UtxoDb};
use chr_transaction_builder::Builder;
use chr_transaction_core::validation::are_conflicting;
use chr_transaction_core::{
    Input, Inputs, Output, Outputs, Signature, Transaction, TransactionEssence, UnlockBlock,
    UnlockBlocks,
};
use chr_transaction_types::constants::{REQUEST_FUNDS_AMOUNT, SUPPLY};
use chr_transaction_types::{Color, ColoredBalances, PledgeId};

fn user(index: u64) -> (Ed25519Pair, Address) {
    let pair = key_pair_from_seed(index);
    let address = Address::from_public_key(&pair.public());
    (pair, address)
}

/// Hand-assembles a signed transaction outside the builder, for the
/// rejection tests that need non-canonical content.
fn manual_tx(
    sources: &[Output],
    outputs: Vec<Output>,
    signer: &Ed25519Pair,
) -> Transaction {
    let inputs = Inputs::new(
        sources
            .iter()
            .map(|output| Input::utxo(output.id().expect("source output has an id")))
            .collect(),
    );
    let input_count = inputs.len();
    let essence = TransactionEssence::new(
        0,
        1_700_000_000_000_000_000,
        PledgeId::default(),
        PledgeId::default(),
        inputs,
        Outputs::new(outputs),
    );
    let signature = Signature::ed25519(signer.public(), signer.sign(&essence.to_bytes()));
    let mut candidates = vec![UnlockBlock::Signature(signature)];
    candidates.extend((1..input_count).map(|_| UnlockBlock::Reference(0)));
    Transaction::new(essence, UnlockBlocks::new(candidates).unwrap()).unwrap()
}

#[test]
fn genesis_integrity() {
    let db = UtxoDb::new();

    assert_eq!(db.balance_iota(db.genesis_address()), SUPPLY);
    assert!(db.is_confirmed(db.genesis_tx_id()));

    let genesis_tx = db.get_transaction(db.genesis_tx_id()).unwrap();
    assert_eq!(genesis_tx.id(), db.genesis_tx_id());
    assert_eq!(genesis_tx.essence().outputs().len(), 1);

    db.check_ledger_balance().unwrap();
}

#[test]
fn faucet_splits_genesis_and_rejects_replay() {
    let db = UtxoDb::new();
    let (_, addr_a) = user(2);

    let tx = db.request_funds(addr_a).unwrap();
    assert_eq!(db.balance_iota(&addr_a), REQUEST_FUNDS_AMOUNT);
    assert_eq!(
        db.balance_iota(db.genesis_address()),
        SUPPLY - REQUEST_FUNDS_AMOUNT
    );
    db.check_ledger_balance().unwrap();

    // Re-submitting the identical transaction is a duplicate, not a spend.
    assert_eq!(
        db.add_transaction(&tx),
        Err(LedgerError::DuplicateTransaction(*tx.id()))
    );
    db.check_ledger_balance().unwrap();
}

#[test]
fn simple_transfer() {
    let db = UtxoDb::new();
    let (key_a, addr_a) = user(1);
    let (_, addr_b) = user(2);
    db.request_funds(addr_a).unwrap();

    let mut builder = Builder::new(db.get_address_outputs(&addr_a)).unwrap();
    builder.add_iota_output(addr_b, 42).unwrap();
    let tx = builder.build_with_ed25519(&key_a).unwrap();
    db.add_transaction(&tx).unwrap();

    assert_eq!(db.balance_iota(&addr_a), 1295);
    assert_eq!(db.balance_iota(&addr_b), 42);
    db.check_ledger_balance().unwrap();
}

#[test]
fn many_output_consolidation() {
    let db = UtxoDb::new();
    let (key_a, addr_a) = user(1);
    let (key_b, addr_b) = user(2);
    db.request_funds(addr_a).unwrap();

    for _ in 0..42 {
        let outputs = db.get_address_outputs(&addr_a);
        assert_eq!(outputs.len(), 1);
        let mut builder = Builder::new(outputs).unwrap();
        builder.add_iota_output(addr_b, 1).unwrap();
        let tx = builder.build_with_ed25519(&key_a).unwrap();
        db.add_transaction(&tx).unwrap();
    }
    assert_eq!(db.balance_iota(&addr_a), REQUEST_FUNDS_AMOUNT - 42);
    assert_eq!(db.balance_iota(&addr_b), 42);

    // One transaction consuming all 42 of B's outputs: a single signature
    // authorizes every input, the rest are backward references.
    let outputs = db.get_address_outputs(&addr_b);
    assert_eq!(outputs.len(), 42);
    let mut builder = Builder::new(outputs).unwrap().with_compression(true);
    builder.add_iota_output(addr_a, 21).unwrap();
    let tx = builder.build_with_ed25519(&key_b).unwrap();

    assert_eq!(tx.unlock_blocks().len(), 42);
    let signatures = tx
        .unlock_blocks()
        .iter()
        .filter(|block| block.is_signature())
        .count();
    assert_eq!(signatures, 1);
    assert!(tx
        .unlock_blocks()
        .iter()
        .filter(|block| !block.is_signature())
        .all(|block| matches!(block, UnlockBlock::Reference(0))));

    db.add_transaction(&tx).unwrap();
    assert_eq!(db.balance_iota(&addr_a), REQUEST_FUNDS_AMOUNT - 42 + 21);
    assert_eq!(db.balance_iota(&addr_b), 21);
    assert_eq!(db.get_address_outputs(&addr_b).len(), 1);
    db.check_ledger_balance().unwrap();
}

#[test]
fn minting_derives_a_fresh_color_and_inflation_is_rejected() {
    let db = UtxoDb::new();
    let (key_a, addr_a) = user(1);
    let (key_b, addr_b) = user(2);
    db.request_funds(addr_a).unwrap();

    // A mints 100 tokens of a new color to B, keeping 1237 IOTA as change.
    let mut builder = Builder::new(db.get_address_outputs(&addr_a)).unwrap();
    builder
        .add_iota_output_with_mint(addr_b, 100, 100)
        .unwrap();
    let tx = builder.build_with_ed25519(&key_a).unwrap();
    db.add_transaction(&tx).unwrap();

    assert_eq!(db.balance_iota(&addr_a), 1237);
    assert_eq!(db.balance_iota(&addr_b), 0);

    let minted_outputs = db.get_address_outputs(&addr_b);
    assert_eq!(minted_outputs.len(), 1);
    let minted = &minted_outputs[0];
    let color = Color::new(hash32(&minted.id().unwrap().array()));
    assert!(!minted.balances().contains_mint());
    assert_eq!(minted.balances().get(&color), 100);
    assert_eq!(minted.balances().total(), 100);
    db.check_ledger_balance().unwrap();

    // Fund B with IOTA so an inflating transaction can balance its grand
    // totals, then try to turn 100 colored tokens into 101.
    db.request_funds(addr_b).unwrap();
    let sources = db.get_address_outputs(&addr_b);
    assert_eq!(sources.len(), 2);
    let total = sources
        .iter()
        .map(|output| output.balances().total())
        .sum::<u128>() as u64;

    let inflated: ColoredBalances = [(color, 101u64), (Color::IOTA, total - 101)]
        .into_iter()
        .collect();
    let attempt = manual_tx(
        &sources,
        vec![Output::sig_locked_colored(inflated, addr_b)],
        &key_b,
    );
    assert_eq!(
        db.add_transaction(&attempt),
        Err(LedgerError::ColorInflated(color))
    );

    // Moving the color at par is fine.
    let par: ColoredBalances = [(color, 100u64), (Color::IOTA, total - 100)]
        .into_iter()
        .collect();
    let ok = manual_tx(
        &sources,
        vec![Output::sig_locked_colored(par, addr_a)],
        &key_b,
    );
    db.add_transaction(&ok).unwrap();
    db.check_ledger_balance().unwrap();
}

#[test]
fn double_spend_is_rejected() {
    let db = UtxoDb::new();
    let (key_a, addr_a) = user(1);
    let (_, addr_b) = user(2);
    let (_, addr_c) = user(3);
    db.request_funds(addr_a).unwrap();

    let sources = db.get_address_outputs(&addr_a);
    let spent_id = sources[0].id().unwrap();

    let tx1 = {
        let mut builder = Builder::new(sources.clone()).unwrap();
        builder.add_iota_output(addr_b, 10).unwrap();
        builder.build_with_ed25519(&key_a).unwrap()
    };
    let tx2 = {
        let mut builder = Builder::new(sources).unwrap();
        builder.add_iota_output(addr_c, 10).unwrap();
        builder.build_with_ed25519(&key_a).unwrap()
    };
    assert!(are_conflicting(&tx1, &tx2));

    db.add_transaction(&tx1).unwrap();
    assert_eq!(
        db.add_transaction(&tx2),
        Err(LedgerError::UnknownOrSpentInput(spent_id))
    );
    assert_eq!(db.balance_iota(&addr_b), 10);
    assert_eq!(db.balance_iota(&addr_c), 0);
    db.check_ledger_balance().unwrap();
}

#[test]
fn unbalanced_totals_are_rejected() {
    let db = UtxoDb::new();
    let (key_a, addr_a) = user(1);
    let (_, addr_b) = user(2);
    db.request_funds(addr_a).unwrap();

    let sources = db.get_address_outputs(&addr_a);
    let attempt = manual_tx(
        &sources,
        vec![Output::sig_locked_single(1000, addr_b)],
        &key_a,
    );
    assert_eq!(
        db.add_transaction(&attempt),
        Err(LedgerError::UnbalancedTotals {
            inputs: REQUEST_FUNDS_AMOUNT as u128,
            outputs: 1000
        })
    );
    assert_eq!(db.balance_iota(&addr_a), REQUEST_FUNDS_AMOUNT);
    db.check_ledger_balance().unwrap();
}

#[test]
fn foreign_signature_is_rejected() {
    let db = UtxoDb::new();
    let (_, addr_a) = user(1);
    let (key_mallory, _) = user(66);
    let (_, addr_b) = user(2);
    db.request_funds(addr_a).unwrap();

    let sources = db.get_address_outputs(&addr_a);
    let attempt = manual_tx(
        &sources,
        vec![Output::sig_locked_single(REQUEST_FUNDS_AMOUNT, addr_b)],
        &key_mallory,
    );
    assert_eq!(
        db.add_transaction(&attempt),
        Err(LedgerError::InvalidSignature { index: 0 })
    );
    assert_eq!(db.balance_iota(&addr_a), REQUEST_FUNDS_AMOUNT);
    assert_eq!(db.balance_iota(&addr_b), 0);
    db.check_ledger_balance().unwrap();
}

#[test]
fn validate_without_commit_leaves_state_unchanged() {
    let db = UtxoDb::new();
    let (key_a, addr_a) = user(1);
    let (_, addr_b) = user(2);
    db.request_funds(addr_a).unwrap();

    let mut builder = Builder::new(db.get_address_outputs(&addr_a)).unwrap();
    builder.add_iota_output(addr_b, 7).unwrap();
    let tx = builder.build_with_ed25519(&key_a).unwrap();

    db.validate_transaction(&tx).unwrap();
    assert!(!db.is_confirmed(tx.id()));
    assert_eq!(db.balance_iota(&addr_b), 0);

    db.add_transaction(&tx).unwrap();
    assert!(db.is_confirmed(tx.id()));
    assert_eq!(db.balance_iota(&addr_b), 7);
}

#[test]
fn conservation_holds_across_a_busy_session() {
    let db = UtxoDb::new();
    let mut addresses = Vec::new();
    for index in 10..15 {
        let (_, address) = user(index);
        db.request_funds(address).unwrap();
        db.check_ledger_balance().unwrap();
        addresses.push(address);
    }

    // Shuffle value between the funded users, checking the supply after
    // every commit.
    for step in 0..5u64 {
        let from = step as usize % addresses.len();
        let to = (from + 1) % addresses.len();
        let (key_from, addr_from) = user(10 + from as u64);
        assert_eq!(addresses[from], addr_from);

        let mut builder = Builder::new(db.get_address_outputs(&addr_from)).unwrap();
        builder.add_iota_output(addresses[to], 100 + step).unwrap();
        let tx = builder.build_with_ed25519(&key_from).unwrap();
        db.add_transaction(&tx).unwrap();
        db.check_ledger_balance().unwrap();
    }

    let users_total: u64 = addresses
        .iter()
        .map(|address| db.balance_iota(address))
        .sum();
    assert_eq!(
        users_total + db.balance_iota(db.genesis_address()),
        SUPPLY
    );
}
