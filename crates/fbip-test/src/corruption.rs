//! Packet corruption for isolation testing
//!
//! Damages encoded packets the way a bad link or a hostile peer would:
//! - Bit flips
//! - Truncation
//! - Header tampering
//! - Random garbage

use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Kind of damage applied to a packet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corruption {
    /// One bit flipped anywhere in the packet
    BitFlip,
    /// Packet cut short
    Truncate,
    /// Version, type or flags byte overwritten
    Header,
    /// Replaced by random bytes of similar length
    Garbage,
}

impl Corruption {
    pub const ALL: [Corruption; 4] = [
        Corruption::BitFlip,
        Corruption::Truncate,
        Corruption::Header,
        Corruption::Garbage,
    ];
}

/// Relative weight of each corruption kind
#[derive(Clone, Debug)]
pub struct CorruptionConfig {
    pub bit_flip: u32,
    pub truncate: u32,
    pub header: u32,
    pub garbage: u32,
}

impl Default for CorruptionConfig {
    fn default() -> Self {
        CorruptionConfig {
            bit_flip: 4,
            truncate: 2,
            header: 2,
            garbage: 1,
        }
    }
}

impl CorruptionConfig {
    /// Only flip bits
    pub fn bit_flips() -> Self {
        CorruptionConfig {
            bit_flip: 1,
            truncate: 0,
            header: 0,
            garbage: 0,
        }
    }
}

/// Seeded packet corrupter
pub struct Corrupter {
    rng: StdRng,
    kinds: WeightedIndex<u32>,
    applied: [u64; 4],
}

impl Corrupter {
    /// Fails if every weight is zero
    pub fn new(config: CorruptionConfig, seed: u64) -> Result<Self, WeightedError> {
        let weights = [config.bit_flip, config.truncate, config.header, config.garbage];
        Ok(Corrupter {
            rng: StdRng::seed_from_u64(seed),
            kinds: WeightedIndex::new(weights)?,
            applied: [0; 4],
        })
    }

    /// Damage a copy of `packet` with a randomly chosen corruption
    pub fn corrupt(&mut self, packet: &[u8]) -> (Corruption, Vec<u8>) {
        let index = self.kinds.sample(&mut self.rng);
        let kind = Corruption::ALL[index];
        self.applied[index] += 1;
        (kind, self.apply(kind, packet))
    }

    /// Damage a copy of `packet` with the given corruption
    pub fn apply(&mut self, kind: Corruption, packet: &[u8]) -> Vec<u8> {
        let mut bytes = packet.to_vec();
        match kind {
            Corruption::BitFlip => {
                if !bytes.is_empty() {
                    let pos = self.rng.gen_range(0..bytes.len());
                    bytes[pos] ^= 1 << self.rng.gen_range(0..8);
                }
            }
            Corruption::Truncate => {
                let keep = self.rng.gen_range(0..bytes.len().max(1));
                bytes.truncate(keep);
            }
            Corruption::Header => {
                // version (4..6), packet type (6), flags (7)
                if bytes.len() > 7 {
                    let pos = self.rng.gen_range(4..8);
                    let mut value = self.rng.gen::<u8>();
                    if value == bytes[pos] {
                        value = value.wrapping_add(0x41);
                    }
                    bytes[pos] = value;
                }
            }
            Corruption::Garbage => {
                let len = self.rng.gen_range(0..=packet.len().max(16));
                bytes = (0..len).map(|_| self.rng.gen()).collect();
            }
        }
        bytes
    }

    /// Corruptions applied so far, by kind
    pub fn applied(&self, kind: Corruption) -> u64 {
        self.applied[kind as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKET: &[u8] = b"FBIP\x02\x00\x00\x00\x00\x00\x00\x03\x00\x00\x00\x00abc";

    #[test]
    fn test_same_seed_same_damage() {
        let mut a = Corrupter::new(CorruptionConfig::default(), 7).unwrap();
        let mut b = Corrupter::new(CorruptionConfig::default(), 7).unwrap();
        for _ in 0..50 {
            assert_eq!(a.corrupt(PACKET), b.corrupt(PACKET));
        }
    }

    #[test]
    fn test_bit_flip_changes_one_bit() {
        let mut corrupter = Corrupter::new(CorruptionConfig::bit_flips(), 1).unwrap();
        for _ in 0..20 {
            let (kind, bytes) = corrupter.corrupt(PACKET);
            assert_eq!(kind, Corruption::BitFlip);
            let diff: u32 = bytes
                .iter()
                .zip(PACKET)
                .map(|(a, b)| (a ^ b).count_ones())
                .sum();
            assert_eq!(diff, 1);
        }
        assert_eq!(corrupter.applied(Corruption::BitFlip), 20);
    }

    #[test]
    fn test_zero_weights_rejected() {
        let config = CorruptionConfig {
            bit_flip: 0,
            ..CorruptionConfig::bit_flips()
        };
        assert!(Corrupter::new(config, 0).is_err());
    }

    #[test]
    fn test_truncate_and_header() {
        let mut corrupter = Corrupter::new(CorruptionConfig::default(), 3).unwrap();
        assert!(corrupter.apply(Corruption::Truncate, PACKET).len() < PACKET.len());

        let damaged = corrupter.apply(Corruption::Header, PACKET);
        assert_eq!(&damaged[..4], b"FBIP");
        assert_ne!(&damaged[4..8], &PACKET[4..8]);
    }
}
