//! # Bit Mutator
//!
//! Flips single bits inside the entropy-coded scan without breaking the
//! byte-stuffing rules: zero bytes are left alone (they may be stuffing
//! after a literal `0xFF`) and any byte that becomes `0xFF` gets a zero
//! written right after it.

use super::jpeg::EntropyRegion;
use rand::Rng;

/// Toggle bit `bit_index` of `buffer`, counting bits from byte 0.
///
/// A no-op when the target byte is `0x00` or lies past the end.
pub fn toggle_bit(buffer: &mut [u8], bit_index: usize) {
    let byte = bit_index / 8;
    let bit = bit_index % 8;

    let Some(value) = buffer.get_mut(byte) else {
        return;
    };
    if *value == 0x00 {
        return;
    }

    *value ^= 1 << bit;
    if *value == 0xFF {
        if let Some(next) = buffer.get_mut(byte + 1) {
            *next = 0x00;
        }
    }
}

/// Toggle one uniformly drawn bit of `region`, returning its index
pub fn random_toggle<R: Rng + ?Sized>(
    buffer: &mut [u8],
    region: EntropyRegion,
    rng: &mut R,
) -> usize {
    let bit_index = rng.random_range(region.bits());
    toggle_bit(buffer, bit_index);
    bit_index
}

/// Apply `iterations` random toggles to `buffer`
pub fn glitch<R: Rng + ?Sized>(
    buffer: &mut [u8],
    region: EntropyRegion,
    iterations: usize,
    rng: &mut R,
) {
    for _ in 0..iterations {
        random_toggle(buffer, region, rng);
    }
}
