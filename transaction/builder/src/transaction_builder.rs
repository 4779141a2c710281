// Copyright (c) 2021-2024 The Chroma Foundation

//! The transaction builder.

use crate::consumable::{
    consumable_balance, consume_colored_tokens, consume_iota, make_utxo_inputs, select_consumed,
    ConsumableOutput,
};
use crate::BuilderError;
use chr_account_keys::Address;
use chr_crypto_keys::Ed25519Pair;
use chr_transaction_core::{
    Inputs, Output, Outputs, Signature, Transaction, TransactionEssence, UnlockBlock, UnlockBlocks,
};
use chr_transaction_types::{constants::ESSENCE_VERSION, Color, ColoredBalances, PledgeId};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Builds a signed value transaction out of the unspent outputs of one
/// address.
///
/// All source outputs must belong to the same sender; whatever the recorded
/// transfers do not consume is returned to that sender as an automatic
/// change output when the essence is assembled.
#[derive(Clone, Debug)]
pub struct Builder {
    version: u8,
    timestamp: i64,
    access_pledge_id: PledgeId,
    consensus_pledge_id: PledgeId,
    /// When true, untouched source outputs are included as inputs too, so
    /// the transaction consolidates the sender's whole output set.
    compress: bool,
    sender_address: Address,
    consumables: Vec<ConsumableOutput>,
    outputs: Vec<Output>,
}

impl Builder {
    /// Creates a builder over the given source outputs.
    ///
    /// The outputs must all belong to one address (the sender) and carry
    /// assigned ids. Defaults: essence version [`ESSENCE_VERSION`], the
    /// current wall-clock timestamp, zero pledge tags, and no compression
    /// (only touched outputs become inputs).
    pub fn new(outputs: Vec<Output>) -> Result<Self, BuilderError> {
        let sender_address = take_sender_address(&outputs)?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as i64)
            .unwrap_or(0);
        Ok(Self {
            version: ESSENCE_VERSION,
            timestamp,
            access_pledge_id: PledgeId::default(),
            consensus_pledge_id: PledgeId::default(),
            compress: false,
            sender_address,
            consumables: outputs.into_iter().map(ConsumableOutput::new).collect(),
            outputs: Vec::new(),
        })
    }

    /// Overrides the essence version byte.
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Overrides the essence timestamp (nanoseconds since the Unix epoch).
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the access-pledge tag.
    pub fn with_access_pledge(mut self, id: PledgeId) -> Self {
        self.access_pledge_id = id;
        self
    }

    /// Sets the consensus-pledge tag.
    pub fn with_consensus_pledge(mut self, id: PledgeId) -> Self {
        self.consensus_pledge_id = id;
        self
    }

    /// Chooses whether untouched source outputs are included as inputs.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// The address funding this transaction.
    pub fn sender_address(&self) -> &Address {
        &self.sender_address
    }

    /// The still-spendable amount of `color` across the source outputs.
    pub fn consumable_balance(&self, color: &Color) -> u64 {
        consumable_balance(color, &self.consumables)
    }

    /// Records a transfer of `amount` IOTA to `target`.
    ///
    /// Returns the index of the recorded output.
    pub fn add_iota_output(&mut self, target: Address, amount: u64) -> Result<usize, BuilderError> {
        self.add_iota_output_with_mint(target, amount, 0)
    }

    /// Records a transfer of `amount` IOTA to `target`, re-tagging `mint` of
    /// it as newly minted tokens.
    ///
    /// The minted portion is labeled [`Color::MINT`]; the ledger replaces the
    /// label with the output-id-derived color on commit.
    pub fn add_iota_output_with_mint(
        &mut self,
        target: Address,
        amount: u64,
        mint: u64,
    ) -> Result<usize, BuilderError> {
        if amount == 0 {
            return Err(BuilderError::ZeroAmount);
        }
        if mint > amount {
            return Err(BuilderError::MintExceedsAmount {
                minted: mint,
                available: amount,
            });
        }

        consume_iota(amount, &mut self.consumables)?;

        let output = if mint > 0 {
            let mut balances = BTreeMap::new();
            balances.insert(Color::MINT, mint);
            if amount > mint {
                balances.insert(Color::IOTA, amount - mint);
            }
            Output::sig_locked_colored(ColoredBalances::from_map(balances)?, target)
        } else {
            Output::sig_locked_single(amount, target)
        };
        self.outputs.push(output);
        Ok(self.outputs.len() - 1)
    }

    /// Records a transfer of the given per-color amounts to `target`.
    pub fn add_colored_output(
        &mut self,
        target: Address,
        amounts: ColoredBalances,
    ) -> Result<usize, BuilderError> {
        self.add_colored_output_with_mint(target, amounts, 0)
    }

    /// Records a colored transfer, re-tagging `mint` of its IOTA portion as
    /// newly minted tokens.
    ///
    /// On failure no source output is modified: every color's availability is
    /// checked before the first deduction.
    pub fn add_colored_output_with_mint(
        &mut self,
        target: Address,
        amounts: ColoredBalances,
        mint: u64,
    ) -> Result<usize, BuilderError> {
        if amounts.is_empty() {
            return Err(BuilderError::EmptyBalances);
        }
        if mint > amounts.get(&Color::IOTA) {
            return Err(BuilderError::MintExceedsAmount {
                minted: mint,
                available: amounts.get(&Color::IOTA),
            });
        }

        // Colors are disjoint pools, so checking each before consuming any
        // makes the whole operation atomic.
        for (color, amount) in amounts.iter() {
            let available = consumable_balance(color, &self.consumables);
            if available < *amount {
                return Err(BuilderError::InsufficientBalance {
                    color: *color,
                    needed: *amount,
                    available,
                });
            }
        }
        let mut consumed = BTreeMap::new();
        for (color, amount) in amounts.iter() {
            consume_colored_tokens(&mut consumed, *color, *amount, &mut self.consumables)?;
        }

        let mut balances: BTreeMap<Color, u64> =
            amounts.iter().map(|(color, amount)| (*color, *amount)).collect();
        if mint > 0 {
            let iota = balances.remove(&Color::IOTA).unwrap_or(0);
            if iota > mint {
                balances.insert(Color::IOTA, iota - mint);
            }
            *balances.entry(Color::MINT).or_insert(0) += mint;
        }
        let output = Output::sig_locked_colored(ColoredBalances::from_map(balances)?, target);
        self.outputs.push(output);
        Ok(self.outputs.len() - 1)
    }

    /// Fully drains the source outputs named by `input_indices` into one
    /// output addressed to `target`.
    ///
    /// Each index must name an untouched source output. The result is a
    /// single-color output iff the drained total is plain IOTA.
    pub fn transfer_all_from_inputs(
        &mut self,
        target: Address,
        input_indices: &[usize],
    ) -> Result<usize, BuilderError> {
        for &index in input_indices {
            match self.consumables.get(index) {
                None => return Err(BuilderError::BadIndex(index)),
                Some(consumable) if consumable.was_consumed() => {
                    return Err(BuilderError::AlreadyConsumed(index))
                }
                Some(_) => {}
            }
        }

        let mut drained = BTreeMap::new();
        for &index in input_indices {
            self.consumables[index].consume_all_remaining(&mut drained);
        }

        let output = output_for_balances(drained, target)?;
        self.outputs.push(output);
        Ok(self.outputs.len() - 1)
    }

    /// Assembles the canonical essence: computes the change output, includes
    /// the input pool (touched outputs, or all of them under compression),
    /// and sorts inputs and outputs into canonical order.
    pub fn build_essence(mut self) -> Result<TransactionEssence, BuilderError> {
        let pool: Vec<usize> = if self.compress {
            (0..self.consumables.len()).collect()
        } else {
            select_consumed(&self.consumables)
        };

        let mut change = BTreeMap::new();
        for &index in &pool {
            self.consumables[index].consume_all_remaining(&mut change);
        }
        if !change.is_empty() {
            let change_output = output_for_balances(change, self.sender_address)?;
            self.outputs.push(change_output);
        }

        let pool_consumables: Vec<ConsumableOutput> = pool
            .iter()
            .map(|&index| self.consumables[index].clone())
            .collect();
        let inputs = Inputs::new(make_utxo_inputs(&pool_consumables)?);
        let outputs = Outputs::new(self.outputs);

        Ok(TransactionEssence::new(
            self.version,
            self.timestamp,
            self.access_pledge_id,
            self.consensus_pledge_id,
            inputs,
            outputs,
        ))
    }

    /// Assembles the essence, signs it with `key_pair`, and emits the final
    /// transaction with compacted unlock blocks: one signature plus a
    /// backward reference per further input.
    ///
    /// The key pair must control the sender address.
    pub fn build_with_ed25519(self, key_pair: &Ed25519Pair) -> Result<Transaction, BuilderError> {
        let sender_address = self.sender_address;
        let essence = self.build_essence()?;
        let essence_bytes = essence.to_bytes();

        let signature = Signature::ed25519(key_pair.public(), key_pair.sign(&essence_bytes));
        if !signature.address_signature_valid(&sender_address, &essence_bytes) {
            return Err(BuilderError::KeyAddressMismatch);
        }

        let input_count = essence.inputs().len();
        let mut candidates = vec![UnlockBlock::Signature(signature)];
        candidates.extend((1..input_count).map(|_| UnlockBlock::Reference(0)));
        let unlock_blocks = UnlockBlocks::new(candidates)?;

        Ok(Transaction::new(essence, unlock_blocks)?)
    }
}

fn take_sender_address(outputs: &[Output]) -> Result<Address, BuilderError> {
    let mut sender: Option<Address> = None;
    for output in outputs {
        match sender {
            None => sender = Some(*output.address()),
            Some(seen) if seen != *output.address() => {
                return Err(BuilderError::MixedSenderAddresses)
            }
            Some(_) => {}
        }
    }
    sender.ok_or(BuilderError::NoInputs)
}

/// A single-color output iff the balances are plain IOTA, colored otherwise.
fn output_for_balances(
    balances: BTreeMap<Color, u64>,
    target: Address,
) -> Result<Output, BuilderError> {
    if balances.len() == 1 {
        if let Some(&amount) = balances.get(&Color::IOTA) {
            return Ok(Output::sig_locked_single(amount, target));
        }
    }
    Ok(Output::sig_locked_colored(
        ColoredBalances::from_map(balances)?,
        target,
    ))
}
