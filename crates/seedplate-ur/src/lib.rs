//! Uniform Resource (UR) text codec with fountain-coded fragments.
//!
//! This crate implements the subset of BCR-2020-005 the plate backup flow
//! relies on: minimal-style bytewords, the deterministic fountain part
//! chooser, the reverse search from a part-index set to the sequence number
//! that designates it, and a streaming multi-part decoder.
//!
//! The part chooser is bit-exact with the reference specification, so
//! fragments emitted here are accepted by third-party UR decoders. The
//! decoder on the other hand is deliberately stronger than the reference:
//! it solves the received parts as a GF(2) linear system, which the
//! engineered share assignments require (a plain peeling decoder cannot
//! always untangle them).
//!
//! # Encode one fragment of a payload
//! ```
//! let payload = vec![0xAB; 128];
//! let fragment = seedplate_ur::ur::encode("bytes", &payload, 1, 2).unwrap();
//! assert!(fragment.starts_with("ur:bytes/1-2/"));
//! ```

#![forbid(unsafe_code)]

pub mod bytewords;
mod error;
pub mod fountain;
mod sampler;
pub mod ur;
mod xoshiro;

pub use error::{BytewordsError, NoEncoding, UrError};
pub use ur::Decoder;
