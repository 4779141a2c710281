// Copyright (c) 2021-2024 The Chroma Foundation

//! Property tests for the wire format: decoding inverts encoding, and
//! canonical forms are permutation-invariant.

use chr_account_keys::Address;
use chr_crypto_keys::Ed25519Pair;
use chr_transaction_core::{
    Input, Inputs, Output, Outputs, Signature, Transaction, TransactionEssence, UnlockBlock,
    UnlockBlocks,
};
use chr_transaction_types::{Color, ColoredBalances, OutputID, PledgeId, TransactionID};
use chr_util_marshal::{Demarshaler, Marshaler};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 32]>().prop_map(|digest| {
        let mut bytes = [0u8; 33];
        bytes[1..].copy_from_slice(&digest);
        Address::read_from(&mut Demarshaler::new(&bytes)).unwrap()
    })
}

fn arb_color() -> impl Strategy<Value = Color> {
    any::<[u8; 32]>().prop_map(Color::new)
}

fn arb_balances() -> impl Strategy<Value = ColoredBalances> {
    btree_map(arb_color(), 1u64..1_000_000_000, 1..4)
        .prop_map(|map| ColoredBalances::from_map(map).unwrap())
}

fn arb_output() -> impl Strategy<Value = Output> {
    prop_oneof![
        (1u64..1_000_000_000, arb_address())
            .prop_map(|(amount, address)| Output::sig_locked_single(amount, address)),
        (arb_balances(), arb_address())
            .prop_map(|(balances, address)| Output::sig_locked_colored(balances, address)),
    ]
}

fn arb_output_id() -> impl Strategy<Value = OutputID> {
    (any::<[u8; 32]>(), any::<u16>())
        .prop_map(|(id, index)| OutputID::new(TransactionID::new(id), index))
}

proptest! {
    #[test]
    fn output_round_trip(output in arb_output()) {
        let bytes = output.to_bytes();
        let recovered = Output::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&output, &recovered);
        prop_assert_eq!(recovered.to_bytes(), bytes);
    }

    #[test]
    fn outputs_canonical_form_is_permutation_invariant(
        outputs in vec(arb_output(), 1..6).prop_flat_map(|v| {
            let shuffled = Just(v.clone()).prop_shuffle();
            (Just(v), shuffled)
        })
    ) {
        let (original, shuffled) = outputs;
        let mut ma = Marshaler::new();
        let mut mb = Marshaler::new();
        Outputs::new(original).write_to(&mut ma);
        Outputs::new(shuffled).write_to(&mut mb);
        prop_assert_eq!(ma.finish(), mb.finish());
    }

    #[test]
    fn inputs_canonical_form_is_permutation_invariant(
        ids in vec(arb_output_id(), 1..8).prop_flat_map(|v| {
            let shuffled = Just(v.clone()).prop_shuffle();
            (Just(v), shuffled)
        })
    ) {
        let (original, shuffled) = ids;
        let to_inputs =
            |ids: Vec<OutputID>| Inputs::new(ids.into_iter().map(Input::utxo).collect());
        let mut ma = Marshaler::new();
        let mut mb = Marshaler::new();
        to_inputs(original).write_to(&mut ma);
        to_inputs(shuffled).write_to(&mut mb);
        prop_assert_eq!(ma.finish(), mb.finish());
    }

    #[test]
    fn transaction_round_trip(
        secret in any::<[u8; 32]>(),
        input_ids in vec(arb_output_id(), 1..5),
        outputs in vec(arb_output(), 1..4),
        timestamp in any::<i64>(),
    ) {
        let pair = Ed25519Pair::from_secret_bytes(&secret);
        let input_count = input_ids.len();
        let essence = TransactionEssence::new(
            0,
            timestamp,
            PledgeId::default(),
            PledgeId::default(),
            Inputs::new(input_ids.into_iter().map(Input::utxo).collect()),
            Outputs::new(outputs),
        );
        let signature = Signature::ed25519(pair.public(), pair.sign(&essence.to_bytes()));
        let mut candidates = vec![UnlockBlock::Signature(signature)];
        candidates.extend((1..input_count).map(|_| UnlockBlock::Reference(0)));
        let tx = Transaction::new(essence, UnlockBlocks::new(candidates).unwrap()).unwrap();

        let bytes = tx.to_bytes();
        let recovered = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&tx, &recovered);
        prop_assert_eq!(recovered.to_bytes(), bytes);
        prop_assert_eq!(tx.id(), recovered.id());
    }

    #[test]
    fn repeated_signature_candidates_compact_to_one_signature(
        secret in any::<[u8; 32]>(),
        count in 1usize..40,
    ) {
        let pair = Ed25519Pair::from_secret_bytes(&secret);
        let block =
            UnlockBlock::Signature(Signature::ed25519(pair.public(), pair.sign(b"essence")));
        let blocks = UnlockBlocks::new(std::iter::repeat(block).take(count).collect()).unwrap();

        let signatures = blocks.iter().filter(|b| b.is_signature()).count();
        prop_assert_eq!(signatures, 1);
        prop_assert!(blocks
            .iter()
            .skip(1)
            .all(|b| matches!(b, UnlockBlock::Reference(0))));

        // Idempotence: compacting the compacted sequence changes nothing.
        let again = UnlockBlocks::new(blocks.iter().copied().collect()).unwrap();
        prop_assert_eq!(again.to_bytes(), blocks.to_bytes());
    }
}
