//! Deterministic simulation harness for livecast testing.
//!
//! An in-process [`SimStore`] models the shared single-slot store with
//! injectable faults, and [`SimViewer`] drives one controller against it
//! step by step, with no clock and no tasks. Several viewers sharing one
//! store reproduce takeover and handoff races deterministically.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties against a
//! [`SystemSnapshot`] of all viewers plus the store's slot. Use
//! [`InvariantRegistry::standard()`] for the cross-viewer guarantees.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_store;
pub mod sim_viewer;

pub use invariants::{
    BroadcastHasEmbed, Invariant, InvariantRegistry, InvariantResult, LikeMonotonicity,
    OwnerHoldsSlot, SingleOwner, SystemSnapshot, ViewerSnapshot, Violation,
};
pub use sim_store::{Faults, SimStore};
pub use sim_viewer::{SimViewer, round, settle};
