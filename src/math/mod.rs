//! Hashing and random-number utilities

pub mod hash;
pub mod random;

pub use hash::{hash3_mod, murmur3};
pub use random::{round_random, RandomSource};
