//! Cryptography module - SHA-256 hashing, ECDSA signatures, address digests

mod ecdsa;
mod hash;

pub use ecdsa::*;
pub use hash::*;
