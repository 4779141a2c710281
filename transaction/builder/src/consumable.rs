// Copyright (c) 2021-2024 The Chroma Foundation

//! A mutable working view over outputs being spent.

use crate::BuilderError;
use chr_transaction_core::{Input, Output};
use chr_transaction_types::Color;
use std::collections::BTreeMap;

/// One output plus two per-color counters: what is still spendable and what
/// has been tentatively consumed so far.
///
/// The counters always partition the output's original balances, so the
/// inputs and the change of a transaction under construction can be derived
/// from the same working set.
#[derive(Clone, Debug)]
pub struct ConsumableOutput {
    output: Output,
    remain: BTreeMap<Color, u64>,
    consumed: BTreeMap<Color, u64>,
}

impl ConsumableOutput {
    /// Wraps an output, making its full balances available for consumption.
    pub fn new(output: Output) -> Self {
        let remain = output
            .balances()
            .iter()
            .map(|(color, amount)| (*color, *amount))
            .collect();
        Self {
            output,
            remain,
            consumed: BTreeMap::new(),
        }
    }

    /// The wrapped output.
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// The still-spendable amount of `color`.
    pub fn consumable_balance(&self, color: &Color) -> u64 {
        self.remain.get(color).copied().unwrap_or(0)
    }

    /// True once any amount has been consumed from this output.
    pub fn was_consumed(&self) -> bool {
        !self.consumed.is_empty()
    }

    fn consume(&mut self, color: Color, amount: u64) {
        let remain = self.remain.entry(color).or_insert(0);
        debug_assert!(*remain >= amount);
        *remain -= amount;
        if *remain == 0 {
            self.remain.remove(&color);
        }
        *self.consumed.entry(color).or_insert(0) += amount;
    }

    pub(crate) fn consume_all_remaining(&mut self, add_to: &mut BTreeMap<Color, u64>) {
        for (color, amount) in core::mem::take(&mut self.remain) {
            *self.consumed.entry(color).or_insert(0) += amount;
            *add_to.entry(color).or_insert(0) += amount;
        }
    }
}

/// The total still-spendable amount of `color` across `consumables`.
pub fn consumable_balance(color: &Color, consumables: &[ConsumableOutput]) -> u64 {
    consumables
        .iter()
        .map(|consumable| consumable.consumable_balance(color))
        .sum()
}

/// Consumes `amount` of `color` sequentially from `consumables`, mirroring
/// the deducted amounts into each output's consumed counters and adding the
/// total into `add_to`.
///
/// Fails without touching any consumable when the available total is short:
/// availability is checked before the first mutation.
pub fn consume_colored_tokens(
    add_to: &mut BTreeMap<Color, u64>,
    color: Color,
    amount: u64,
    consumables: &mut [ConsumableOutput],
) -> Result<(), BuilderError> {
    let available = consumable_balance(&color, consumables);
    if available < amount {
        return Err(BuilderError::InsufficientBalance {
            color,
            needed: amount,
            available,
        });
    }

    let mut remaining = amount;
    for consumable in consumables.iter_mut() {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(consumable.consumable_balance(&color));
        if take == 0 {
            continue;
        }
        consumable.consume(color, take);
        remaining -= take;
    }
    debug_assert_eq!(remaining, 0);

    *add_to.entry(color).or_insert(0) += amount;
    Ok(())
}

/// [`consume_colored_tokens`] specialized to the native color, discarding the
/// accumulator.
pub fn consume_iota(amount: u64, consumables: &mut [ConsumableOutput]) -> Result<(), BuilderError> {
    let mut add_to = BTreeMap::new();
    consume_colored_tokens(&mut add_to, Color::IOTA, amount, consumables)
}

/// Moves everything still spendable in `consumables` into their consumed
/// counters, accumulating the per-color totals into `add_to`.
pub fn consume_remaining(
    add_to: &mut BTreeMap<Color, u64>,
    consumables: &mut [ConsumableOutput],
) {
    for consumable in consumables.iter_mut() {
        consumable.consume_all_remaining(add_to);
    }
}

/// Indices of the consumables that have been touched.
pub fn select_consumed(consumables: &[ConsumableOutput]) -> Vec<usize> {
    consumables
        .iter()
        .enumerate()
        .filter(|(_, consumable)| consumable.was_consumed())
        .map(|(index, _)| index)
        .collect()
}

/// One UTXO input per consumable, referencing its output's id, in the given
/// order. Canonical sorting happens when the inputs enter an essence.
pub fn make_utxo_inputs(consumables: &[ConsumableOutput]) -> Result<Vec<Input>, BuilderError> {
    consumables
        .iter()
        .map(|consumable| {
            consumable
                .output
                .id()
                .map(Input::utxo)
                .ok_or(BuilderError::MissingOutputId)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chr_account_keys::Address;
    use chr_crypto_keys::Ed25519Pair;
    use chr_transaction_types::{OutputID, TransactionID};

    fn address(tag: u8) -> Address {
        let pair = Ed25519Pair::from_secret_bytes(&[tag; 32]);
        Address::from_public_key(&pair.public())
    }

    fn single(amount: u64, index: u16) -> ConsumableOutput {
        let id = OutputID::new(TransactionID::new([1; 32]), index);
        ConsumableOutput::new(Output::sig_locked_single(amount, address(1)).with_id(id))
    }

    #[test]
    fn consume_spans_multiple_outputs() {
        let mut consumables = vec![single(10, 0), single(10, 1), single(10, 2)];
        let mut acc = BTreeMap::new();
        consume_colored_tokens(&mut acc, Color::IOTA, 25, &mut consumables).unwrap();

        assert_eq!(acc.get(&Color::IOTA), Some(&25));
        assert_eq!(consumables[0].consumable_balance(&Color::IOTA), 0);
        assert_eq!(consumables[1].consumable_balance(&Color::IOTA), 0);
        assert_eq!(consumables[2].consumable_balance(&Color::IOTA), 5);
        assert!(consumables.iter().all(ConsumableOutput::was_consumed));
    }

    #[test]
    fn failed_consume_leaves_consumables_untouched() {
        let mut consumables = vec![single(10, 0), single(10, 1)];
        let mut acc = BTreeMap::new();
        let err = consume_colored_tokens(&mut acc, Color::IOTA, 21, &mut consumables);

        assert_eq!(
            err,
            Err(BuilderError::InsufficientBalance {
                color: Color::IOTA,
                needed: 21,
                available: 20
            })
        );
        assert!(acc.is_empty());
        assert!(consumables.iter().all(|c| !c.was_consumed()));
        assert_eq!(consumable_balance(&Color::IOTA, &consumables), 20);
    }

    #[test]
    fn consumed_mirrors_deducted_amounts() {
        let mut consumables = vec![single(10, 0)];
        consume_iota(7, &mut consumables).unwrap();
        assert_eq!(consumables[0].consumable_balance(&Color::IOTA), 3);
        assert_eq!(consumables[0].consumed.get(&Color::IOTA), Some(&7));
    }

    #[test]
    fn consume_remaining_drains_everything() {
        let mut consumables = vec![single(10, 0), single(5, 1)];
        consume_iota(4, &mut consumables).unwrap();

        let mut acc = BTreeMap::new();
        consume_remaining(&mut acc, &mut consumables);
        assert_eq!(acc.get(&Color::IOTA), Some(&11));
        assert_eq!(consumable_balance(&Color::IOTA, &consumables), 0);
        assert_eq!(consumables[0].consumed.get(&Color::IOTA), Some(&10));
        assert_eq!(consumables[1].consumed.get(&Color::IOTA), Some(&5));
    }

    #[test]
    fn select_consumed_reports_touched_indices() {
        let mut consumables = vec![single(10, 0), single(10, 1), single(10, 2)];
        consume_iota(12, &mut consumables).unwrap();
        assert_eq!(select_consumed(&consumables), vec![0, 1]);
    }

    #[test]
    fn make_utxo_inputs_preserves_order_and_ids() {
        let consumables = vec![single(1, 5), single(1, 3)];
        let inputs = make_utxo_inputs(&consumables).unwrap();
        assert_eq!(inputs[0].output_id().index(), 5);
        assert_eq!(inputs[1].output_id().index(), 3);
    }

    #[test]
    fn make_utxo_inputs_requires_ids() {
        let consumables = vec![ConsumableOutput::new(Output::sig_locked_single(
            1,
            address(1),
        ))];
        assert_eq!(
            make_utxo_inputs(&consumables),
            Err(BuilderError::MissingOutputId)
        );
    }
}
