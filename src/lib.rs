//! Fixed-point circuits over a toy leveled BGV scheme.
//!
//! Real numbers are carried as scaled integers modulo a plaintext modulus
//! ([`codec`]), circuits validate their scale and magnitude growth ahead of
//! time ([`circuit`]), and run on any [`backend::HomomorphicBackend`]:
//! the cleartext [`backend::SlotSimulator`] or real ciphertexts from
//! [`bgv::BgvBackend`].

pub mod backend;
pub mod bgv;
pub mod circuit;
pub mod codec;
pub mod error;
pub mod math;
pub mod timing;

pub use error::{Error, Result};
