// Copyright (c) 2021-2024 The Chroma Foundation

//! The UTXO database: validation, atomic commit, and queries.

use crate::{key_pair_from_seed, LedgerError, MemoryOutputStore, OutputStore};
use chr_account_keys::Address;
use chr_crypto_keys::Ed25519Pair;
use chr_transaction_core::validation::verify_unlock_blocks;
use chr_transaction_core::{
    Input, Inputs, Output, Outputs, Signature, Transaction, TransactionEssence, UnlockBlock,
    UnlockBlocks,
};
use chr_transaction_types::constants::{
    ESSENCE_VERSION, GENESIS_KEY_INDEX, REQUEST_FUNDS_AMOUNT, SUPPLY,
};
use chr_transaction_types::{Color, OutputID, PledgeId, TransactionID};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

struct Inner<S> {
    transactions: HashMap<TransactionID, Transaction>,
    utxo: S,
}

/// A single ledger instance: the live output set plus every committed
/// transaction, guarded by one reader-writer lock.
///
/// `add_transaction` is atomic: validation and commit run inside the same
/// write-locked section, so an input cannot be spent between being checked
/// and being deleted, and a rejected transaction leaves no trace. All other
/// methods take the read lock and see a consistent snapshot.
pub struct UtxoDb<S: OutputStore = MemoryOutputStore> {
    inner: RwLock<Inner<S>>,
    genesis_key_pair: Ed25519Pair,
    genesis_address: Address,
    genesis_tx_id: TransactionID,
    supply: u64,
}

impl UtxoDb<MemoryOutputStore> {
    /// Creates a ledger backed by the in-memory reference store, seeded with
    /// the genesis transaction holding the whole supply.
    pub fn new() -> Self {
        Self::new_with_store(MemoryOutputStore::new())
    }
}

impl Default for UtxoDb<MemoryOutputStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: OutputStore> UtxoDb<S> {
    /// Creates a ledger backed by `store`, which must start empty.
    pub fn new_with_store(store: S) -> Self {
        debug_assert!(store.is_empty(), "output store must start empty");

        let genesis_key_pair = key_pair_from_seed(GENESIS_KEY_INDEX);
        let genesis_address = Address::from_public_key(&genesis_key_pair.public());

        // The genesis transaction consumes a zero output id that never
        // existed; it is inserted directly, not through validation.
        let inputs = Inputs::new(vec![Input::utxo(OutputID::default())]);
        let outputs = Outputs::new(vec![Output::sig_locked_single(SUPPLY, genesis_address)]);
        let essence = TransactionEssence::new(
            ESSENCE_VERSION,
            now_nanos(),
            PledgeId::default(),
            PledgeId::default(),
            inputs,
            outputs,
        );
        let genesis_tx = sign_essence(essence, &genesis_key_pair, 1)
            .expect("genesis transaction construction is infallible");
        let genesis_tx_id = *genesis_tx.id();

        let mut inner = Inner {
            transactions: HashMap::new(),
            utxo: store,
        };
        for (index, output) in genesis_tx.essence().outputs().iter().enumerate() {
            let id = OutputID::new(genesis_tx_id, index as u16);
            inner.utxo.insert(id, output.clone());
        }
        inner.transactions.insert(genesis_tx_id, genesis_tx);

        debug!(genesis = %genesis_tx_id, supply = SUPPLY, "ledger initialized");
        Self {
            inner: RwLock::new(inner),
            genesis_key_pair,
            genesis_address,
            genesis_tx_id,
            supply: SUPPLY,
        }
    }

    /// The fixed total supply.
    pub fn supply(&self) -> u64 {
        self.supply
    }

    /// The id of the synthetic genesis transaction.
    pub fn genesis_tx_id(&self) -> &TransactionID {
        &self.genesis_tx_id
    }

    /// The address initially holding the whole supply.
    pub fn genesis_address(&self) -> &Address {
        &self.genesis_address
    }

    /// The key pair controlling the genesis address.
    pub fn genesis_key_pair(&self) -> &Ed25519Pair {
        &self.genesis_key_pair
    }

    /// Validates `tx` against the current ledger state without committing.
    ///
    /// Checks everything [`UtxoDb::add_transaction`] checks except the
    /// duplicate-id rejection.
    pub fn validate_transaction(&self, tx: &Transaction) -> Result<(), LedgerError> {
        let inner = self.inner.read().expect("ledger lock poisoned");
        let consumed = collect_consumed(&inner.utxo, tx)?;
        check_balances(tx, &consumed)?;
        verify_unlock_blocks(tx, &consumed)?;
        Ok(())
    }

    /// Validates and commits `tx` atomically.
    ///
    /// On any validation error the ledger is unchanged. An
    /// [`LedgerError::InternalInvariantViolated`] return means the ledger
    /// itself is broken and must not be used further.
    pub fn add_transaction(&self, tx: &Transaction) -> Result<(), LedgerError> {
        let result = self.add_transaction_inner(tx);
        match &result {
            Ok(()) => debug!(id = %tx.id(), "transaction committed"),
            Err(err) => debug!(id = %tx.id(), %err, "transaction rejected"),
        }
        result
    }

    fn add_transaction_inner(&self, tx: &Transaction) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().expect("ledger lock poisoned");

        if inner.transactions.contains_key(tx.id()) {
            return Err(LedgerError::DuplicateTransaction(*tx.id()));
        }

        let consumed = collect_consumed(&inner.utxo, tx)?;
        check_balances(tx, &consumed)?;
        verify_unlock_blocks(tx, &consumed)?;

        // Past this point nothing can fail for caller reasons; the checks
        // below guard ledger invariants only.
        for input in tx.essence().inputs() {
            inner.utxo.remove(input.output_id());
        }
        for (index, output) in tx.essence().outputs().iter().enumerate() {
            let id = OutputID::new(*tx.id(), index as u16);
            if output.id() != Some(id) {
                return Err(LedgerError::InternalInvariantViolated(format!(
                    "output {index} carries id {:?}, expected {id}",
                    output.id()
                )));
            }
            let mut committed = output.clone();
            committed.update_minting_color();
            inner.utxo.insert(id, committed);
        }
        inner.transactions.insert(*tx.id(), tx.clone());

        check_ledger_balance(&inner, self.supply)
    }

    /// The faucet: sends [`REQUEST_FUNDS_AMOUNT`] from genesis to `target`,
    /// returning the committed transaction.
    pub fn request_funds(&self, target: Address) -> Result<Transaction, LedgerError> {
        let sources = self.get_address_outputs(&self.genesis_address);
        let [source] = sources.as_slice() else {
            return Err(LedgerError::FaucetExhausted);
        };
        let balance = source.balances().get(&Color::IOTA);
        if balance < REQUEST_FUNDS_AMOUNT {
            return Err(LedgerError::FaucetExhausted);
        }
        let source_id = source
            .id()
            .ok_or_else(|| LedgerError::InternalInvariantViolated("unindexed output".into()))?;

        let inputs = Inputs::new(vec![Input::utxo(source_id)]);
        let mut outputs = vec![Output::sig_locked_single(REQUEST_FUNDS_AMOUNT, target)];
        if balance > REQUEST_FUNDS_AMOUNT {
            outputs.push(Output::sig_locked_single(
                balance - REQUEST_FUNDS_AMOUNT,
                self.genesis_address,
            ));
        }
        let outputs = Outputs::new(outputs);
        let essence = TransactionEssence::new(
            ESSENCE_VERSION,
            now_nanos(),
            PledgeId::default(),
            PledgeId::default(),
            inputs,
            outputs,
        );
        let tx = sign_essence(essence, &self.genesis_key_pair, 1)
            .map_err(|err| LedgerError::InternalInvariantViolated(err))?;

        self.add_transaction(&tx)?;
        Ok(tx)
    }

    /// The committed transaction with the given id.
    pub fn get_transaction(&self, id: &TransactionID) -> Option<Transaction> {
        let inner = self.inner.read().expect("ledger lock poisoned");
        inner.transactions.get(id).cloned()
    }

    /// True iff a transaction with the given id has been committed.
    pub fn is_confirmed(&self, id: &TransactionID) -> bool {
        let inner = self.inner.read().expect("ledger lock poisoned");
        inner.transactions.contains_key(id)
    }

    /// The live outputs locked to `address`, sorted by output id.
    pub fn get_address_outputs(&self, address: &Address) -> Vec<Output> {
        let inner = self.inner.read().expect("ledger lock poisoned");
        let mut outputs: Vec<(OutputID, Output)> = Vec::new();
        inner.utxo.for_each(&mut |id, output| {
            if output.address() == address {
                outputs.push((*id, output.clone()));
            }
        });
        outputs.sort_by_key(|(id, _)| *id);
        outputs.into_iter().map(|(_, output)| output).collect()
    }

    /// The total IOTA held by `address` across its live outputs.
    pub fn balance_iota(&self, address: &Address) -> u64 {
        self.get_address_outputs(address)
            .iter()
            .map(|output| output.balances().get(&Color::IOTA))
            .sum()
    }

    /// Re-runs the supply invariant over the whole live output set.
    pub fn check_ledger_balance(&self) -> Result<(), LedgerError> {
        let inner = self.inner.read().expect("ledger lock poisoned");
        check_ledger_balance(&inner, self.supply)
    }
}

/// Signs `essence` and assembles a transaction whose unlock blocks are one
/// signature plus `input_count - 1` backward references.
fn sign_essence(
    essence: TransactionEssence,
    key_pair: &Ed25519Pair,
    input_count: usize,
) -> Result<Transaction, String> {
    let signature = Signature::ed25519(key_pair.public(), key_pair.sign(&essence.to_bytes()));
    let mut candidates = vec![UnlockBlock::Signature(signature)];
    candidates.extend((1..input_count).map(|_| UnlockBlock::Reference(0)));
    let unlock_blocks = UnlockBlocks::new(candidates).map_err(|err| err.to_string())?;
    Transaction::new(essence, unlock_blocks).map_err(|err| err.to_string())
}

/// Resolves every input of `tx` to its live output, in input order, failing
/// on unknown, spent, or repeated references.
fn collect_consumed<S: OutputStore>(utxo: &S, tx: &Transaction) -> Result<Vec<Output>, LedgerError> {
    let mut seen: HashSet<OutputID> = HashSet::new();
    let mut consumed = Vec::with_capacity(tx.essence().inputs().len());
    for input in tx.essence().inputs() {
        let id = *input.output_id();
        if !seen.insert(id) {
            return Err(LedgerError::DuplicateInput(id));
        }
        let output = utxo
            .get(&id)
            .ok_or(LedgerError::UnknownOrSpentInput(id))?;
        consumed.push(output);
    }
    Ok(consumed)
}

/// The conservation rules: no mint sentinel among inputs, no valueless
/// outputs, equal grand totals, and no non-native color inflated.
fn check_balances(tx: &Transaction, consumed: &[Output]) -> Result<(), LedgerError> {
    let mut input_balances: BTreeMap<Color, u128> = BTreeMap::new();
    let mut input_total: u128 = 0;
    for output in consumed {
        for (color, amount) in output.balances().iter() {
            if color.is_mint() {
                return Err(LedgerError::MintColorInInput);
            }
            *input_balances.entry(*color).or_insert(0) += *amount as u128;
            input_total += *amount as u128;
        }
    }

    let mut output_balances: BTreeMap<Color, u128> = BTreeMap::new();
    let mut output_total: u128 = 0;
    for (index, output) in tx.essence().outputs().iter().enumerate() {
        let balances = output.balances();
        if balances.is_empty() {
            return Err(LedgerError::EmptyOutput(index as u16));
        }
        for (color, amount) in balances.iter() {
            *output_balances.entry(*color).or_insert(0) += *amount as u128;
            output_total += *amount as u128;
        }
    }

    if input_total != output_total {
        return Err(LedgerError::UnbalancedTotals {
            inputs: input_total,
            outputs: output_total,
        });
    }

    // A color may shrink (burning it back into IOTA), never grow; only
    // minting introduces new colored supply, via the sentinel.
    for (color, output_amount) in &output_balances {
        if color.is_iota() || color.is_mint() {
            continue;
        }
        let input_amount = input_balances.get(color).copied().unwrap_or(0);
        if *output_amount > input_amount {
            return Err(LedgerError::ColorInflated(*color));
        }
    }

    Ok(())
}

/// The supply invariant: live outputs sum to the fixed supply and none
/// carries the mint sentinel.
fn check_ledger_balance<S: OutputStore>(inner: &Inner<S>, supply: u64) -> Result<(), LedgerError> {
    let mut total: u128 = 0;
    let mut mint_leak: Option<OutputID> = None;
    inner.utxo.for_each(&mut |id, output| {
        let balances = output.balances();
        if balances.contains_mint() {
            mint_leak.get_or_insert(*id);
        }
        total += balances.total();
    });

    if let Some(id) = mint_leak {
        return Err(LedgerError::InternalInvariantViolated(format!(
            "live output {id} carries the mint sentinel"
        )));
    }
    if total != supply as u128 {
        return Err(LedgerError::InternalInvariantViolated(format!(
            "live outputs sum to {total}, supply is {supply}"
        )));
    }
    trace!(outputs = inner.utxo.len(), total, "ledger balance checked");
    Ok(())
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as i64)
        .unwrap_or(0)
}
