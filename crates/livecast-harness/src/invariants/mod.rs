//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must hold across every viewer sharing one
//! slot, whatever order their polls and writes land in.
//!
//! # Architecture
//!
//! Observable state from each [`crate::SimViewer`] plus the store's slot is
//! captured into a [`SystemSnapshot`], then every registered [`Invariant`]
//! runs against it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = SystemSnapshot::capture(&viewers, &store);
//! registry.assert_all(&snapshot, "after settle");
//! ```

mod checks;
mod snapshot;

pub use checks::{BroadcastHasEmbed, LikeMonotonicity, OwnerHoldsSlot, SingleOwner};
pub use snapshot::{SystemSnapshot, ViewerSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against system state.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the current state.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Invariants that hold at every step, even mid-race.
    ///
    /// Includes:
    /// - [`BroadcastHasEmbed`]: broadcasting implies an embed derived from the URL
    /// - [`LikeMonotonicity`]: the like flag never turns off
    pub fn always() -> Self {
        let mut registry = Self::new();
        registry.add(BroadcastHasEmbed);
        registry.add(LikeMonotonicity);
        registry
    }

    /// All invariants, for checking once viewers have settled.
    ///
    /// Adds to [`InvariantRegistry::always`]:
    /// - [`SingleOwner`]: at most one viewer broadcasts as owner
    /// - [`OwnerHoldsSlot`]: a broadcasting owner is the live streamer
    pub fn standard() -> Self {
        let mut registry = Self::always();
        registry.add(SingleOwner);
        registry.add(OwnerHoldsSlot);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    ///
    /// # Panics
    ///
    /// If any invariant is violated.
    #[allow(clippy::panic, reason = "test assertion helper")]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
