//! Share assignment and fragment encoding for metal seed-backup plates.
//!
//! A multisig output descriptor is backed up as N metal plates, one per
//! co-signer. Each plate carries a handful of fountain-coded UR fragments
//! of the encoded descriptor, assigned so that **any M plates together
//! recover the full descriptor**, where (M, N) is the wallet's signing
//! threshold. The fragments ride the standard UR multi-part format, so any
//! BCR-2020-005 decoder can perform the recovery.
//!
//! The crate has three jobs:
//!
//! - [`plan_fragments`] picks the share-assignment scheme for (M, N) and
//!   emits the uppercase UR fragment strings for one plate.
//! - [`is_recoverable`] mechanically proves a plan by simulating every
//!   M-of-N reconstruction before anything is stamped into metal.
//! - [`bound_title`] and the plate geometry ([`PlateSize`], [`safe_area`])
//!   bound what fits on the physical plates; an overflowing descriptor
//!   surfaces as [`BackupError::DescriptorTooLarge`].
//!
//! Everything is pure: no I/O, no shared state, reproducible outputs.

#![forbid(unsafe_code)]

mod error;
mod plan;
mod plate;
mod title;
mod verify;

pub use error::{BackupError, PlanError};
pub use plan::{plan_fragments, Scheme};
pub use plate::{ensure_fits, safe_area, PlateSize, Point, Rect, INNER_MARGIN, OUTER_MARGIN};
pub use title::{bound_title, GlyphFace, MAX_TITLE_LEN};
pub use verify::{is_recoverable, MAX_PLATES};
