// Copyright (c) 2021-2024 The Chroma Foundation

//! Per-color balance maps.

use crate::Color;
use alloc::collections::BTreeMap;
use chr_util_marshal::{Demarshaler, Error as MarshalError, Marshaler};
use core::fmt;
use displaydoc::Display;

/// An error constructing a balance map.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum BalanceError {
    /// balance maps must not carry zero-valued entries
    ZeroAmount,
}

/// A mapping from color to a positive amount of tokens of that color.
///
/// Zero-valued entries are forbidden, so emptiness means "no tokens" and
/// every entry is meaningful. The map iterates and encodes in ascending color
/// order, which makes the byte form canonical: two maps with the same content
/// always encode identically.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColoredBalances {
    balances: BTreeMap<Color, u64>,
}

impl ColoredBalances {
    /// An empty balance map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a balance map from color/amount pairs, rejecting zero amounts.
    pub fn from_map(balances: BTreeMap<Color, u64>) -> Result<Self, BalanceError> {
        if balances.values().any(|amount| *amount == 0) {
            return Err(BalanceError::ZeroAmount);
        }
        Ok(Self { balances })
    }

    /// A map holding `amount` of the native color; empty when `amount` is 0.
    pub fn from_iota(amount: u64) -> Self {
        let mut balances = BTreeMap::new();
        if amount > 0 {
            balances.insert(Color::IOTA, amount);
        }
        Self { balances }
    }

    /// The amount of `color` in the map, 0 if absent.
    pub fn get(&self, color: &Color) -> u64 {
        self.balances.get(color).copied().unwrap_or(0)
    }

    /// Number of distinct colors.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// True when the map holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// True when any entry carries the mint sentinel.
    pub fn contains_mint(&self) -> bool {
        self.balances.contains_key(&Color::MINT)
    }

    /// Iterates entries in ascending color order.
    pub fn iter(&self) -> impl Iterator<Item = (&Color, &u64)> {
        self.balances.iter()
    }

    /// The total across all colors.
    ///
    /// Returned as `u128`: a hostile encoding can carry amounts whose sum
    /// exceeds `u64`, and balance comparisons must not wrap.
    pub fn total(&self) -> u128 {
        self.balances.values().map(|amount| *amount as u128).sum()
    }

    /// Writes the canonical form: entry count (`u32` BE), then each entry as
    /// color bytes followed by the amount (`u64` BE), ascending by color.
    pub fn write_to(&self, marshaler: &mut Marshaler) {
        marshaler.write_u32(self.balances.len() as u32);
        for (color, amount) in &self.balances {
            color.write_to(marshaler);
            marshaler.write_u64(*amount);
        }
    }

    /// Reads a balance map, enforcing canonical form: strictly ascending
    /// colors and no zero amounts.
    pub fn read_from(demarshaler: &mut Demarshaler) -> chr_util_marshal::Result<Self> {
        let count = demarshaler.read_u32()?;
        let mut balances = BTreeMap::new();
        let mut previous: Option<Color> = None;
        for _ in 0..count {
            let color = Color::read_from(demarshaler)?;
            let amount = demarshaler.read_u64()?;
            if amount == 0 {
                return Err(MarshalError::NonCanonical("zero-valued balance entry"));
            }
            if let Some(prev) = previous {
                if color <= prev {
                    return Err(MarshalError::NonCanonical("balance colors not ascending"));
                }
            }
            previous = Some(color);
            balances.insert(color, amount);
        }
        Ok(Self { balances })
    }
}

impl fmt::Display for ColoredBalances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (color, amount)) in self.balances.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{color}: {amount}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(Color, u64)> for ColoredBalances {
    /// Collects entries, summing amounts of repeated colors and dropping
    /// zero-valued ones.
    fn from_iter<I: IntoIterator<Item = (Color, u64)>>(iter: I) -> Self {
        let mut balances = BTreeMap::new();
        for (color, amount) in iter {
            if amount > 0 {
                *balances.entry(color).or_insert(0) += amount;
            }
        }
        Self { balances }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::COLOR_LENGTH;
    use alloc::vec::Vec;

    fn color(tag: u8) -> Color {
        Color::new([tag; COLOR_LENGTH])
    }

    #[test]
    fn zero_amounts_are_rejected() {
        let mut map = BTreeMap::new();
        map.insert(Color::IOTA, 0u64);
        assert_eq!(
            ColoredBalances::from_map(map),
            Err(BalanceError::ZeroAmount)
        );
    }

    #[test]
    fn iteration_is_ascending_by_color() {
        let balances: ColoredBalances =
            [(color(9), 1u64), (Color::IOTA, 2), (color(4), 3)]
                .into_iter()
                .collect();
        let colors: Vec<Color> = balances.iter().map(|(c, _)| *c).collect();
        assert_eq!(colors, alloc::vec![Color::IOTA, color(4), color(9)]);
    }

    #[test]
    fn canonical_bytes_are_permutation_invariant() {
        let a: ColoredBalances = [(color(1), 10u64), (color(2), 20)].into_iter().collect();
        let b: ColoredBalances = [(color(2), 20u64), (color(1), 10)].into_iter().collect();
        let mut ma = Marshaler::new();
        let mut mb = Marshaler::new();
        a.write_to(&mut ma);
        b.write_to(&mut mb);
        assert_eq!(ma.finish(), mb.finish());
    }

    #[test]
    fn wire_round_trip() {
        let balances: ColoredBalances =
            [(Color::IOTA, 100u64), (color(7), 31)].into_iter().collect();
        let mut m = Marshaler::new();
        balances.write_to(&mut m);
        let bytes = m.finish();
        assert_eq!(bytes.len(), 4 + 2 * (COLOR_LENGTH + 8));

        let mut d = Demarshaler::new(&bytes);
        assert_eq!(ColoredBalances::read_from(&mut d).unwrap(), balances);
        d.expect_done().unwrap();
    }

    #[test]
    fn decode_rejects_unsorted_entries() {
        let mut m = Marshaler::new();
        m.write_u32(2);
        color(5).write_to(&mut m);
        m.write_u64(1);
        color(3).write_to(&mut m);
        m.write_u64(1);
        let bytes = m.finish();
        let mut d = Demarshaler::new(&bytes);
        assert_eq!(
            ColoredBalances::read_from(&mut d),
            Err(MarshalError::NonCanonical("balance colors not ascending"))
        );
    }

    #[test]
    fn decode_rejects_zero_amounts() {
        let mut m = Marshaler::new();
        m.write_u32(1);
        color(3).write_to(&mut m);
        m.write_u64(0);
        let bytes = m.finish();
        let mut d = Demarshaler::new(&bytes);
        assert_eq!(
            ColoredBalances::read_from(&mut d),
            Err(MarshalError::NonCanonical("zero-valued balance entry"))
        );
    }

    #[test]
    fn total_does_not_wrap() {
        let balances: ColoredBalances =
            [(color(1), u64::MAX), (color(2), u64::MAX)].into_iter().collect();
        assert_eq!(balances.total(), 2 * (u64::MAX as u128));
    }
}
