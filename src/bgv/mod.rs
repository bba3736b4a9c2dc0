//! Toy leveled BGV over an RNS ciphertext modulus.
//!
//! Packs `N` integers modulo `t` per ciphertext, supports relinearized
//! products and row rotations through Galois key switching, and tracks a
//! worst-case noise estimate per ciphertext. Parameters are sized for a
//! fixed multiplicative depth; there is no modulus switching.

pub mod backend;
pub mod ciphertext;
pub mod context;
pub mod encoder;
pub mod errors;
pub mod evaluator;
pub mod keys;
pub mod noise;
pub mod params;
pub mod poly;
pub mod rns;

pub use backend::BgvBackend;
pub use ciphertext::{Ciphertext, Plaintext};
pub use context::BgvContext;
pub use encoder::{SlotEncoder, rotation_galois_element};
pub use errors::{BgvError, BgvResult, RnsError, RnsResult};
pub use keys::{KeySwitchKey, PublicKey, RelinearizationKey, RotationKeys, SecretKey};
pub use noise::NoiseModel;
pub use params::{BgvParams, BgvParamsBuilder, SecurityLevel};
pub use poly::RnsPoly;
pub use rns::{NttTable, RnsBasis};
