//! Shared eye position state.
//!
//! Written by the tracker thread, read by the render thread. The pair is
//! always replaced and copied as a whole, so a reader can never observe
//! coordinates from two different packets.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::{Eye, EyePosition};

/// Both eye positions as published together by one packet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyePair {
    /// Left eye position.
    pub left: EyePosition,
    /// Right eye position.
    pub right: EyePosition,
    /// Publish counter. Zero means the startup defaults are still in place.
    pub sequence: u64,
}

impl EyePair {
    /// Create a pair with sequence zero.
    #[must_use]
    pub const fn new(left: EyePosition, right: EyePosition) -> Self {
        Self {
            left,
            right,
            sequence: 0,
        }
    }

    /// Position of the given eye.
    #[must_use]
    pub const fn get(&self, eye: Eye) -> EyePosition {
        match eye {
            Eye::Left => self.left,
            Eye::Right => self.right,
        }
    }

    /// Point halfway between the eyes.
    #[must_use]
    pub fn midpoint(&self) -> EyePosition {
        EyePosition::new(
            (self.left.x + self.right.x) / 2.0,
            (self.left.y + self.right.y) / 2.0,
            (self.left.z + self.right.z) / 2.0,
        )
    }

    /// Half the vector from the left eye to the right eye.
    #[must_use]
    pub fn separation(&self) -> EyePosition {
        EyePosition::new(
            (self.right.x - self.left.x) / 2.0,
            (self.right.y - self.left.y) / 2.0,
            (self.right.z - self.left.z) / 2.0,
        )
    }

    /// Whether any packet has been published yet.
    #[must_use]
    pub const fn is_tracked(&self) -> bool {
        self.sequence > 0
    }
}

impl Default for EyePair {
    fn default() -> Self {
        Self::new(EyePosition::DEFAULT_LEFT, EyePosition::DEFAULT_RIGHT)
    }
}

/// Latest-wins cell holding the current [`EyePair`].
///
/// Cloning is cheap and yields a handle to the same cell.
///
/// # Example
///
/// ```
/// use parallax_core::{Eye, EyePosition, EyeState};
///
/// let state = EyeState::new();
/// let writer = state.clone();
///
/// writer.publish(EyePosition::new(3.0, 0.0, 150.0), EyePosition::new(-3.0, 0.0, 150.0));
///
/// let snapshot = state.snapshot();
/// assert_eq!(snapshot.sequence, 1);
/// assert_eq!(snapshot.get(Eye::Left).z, 150.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EyeState {
    inner: Arc<RwLock<EyePair>>,
}

impl EyeState {
    /// Create a cell holding the startup default positions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cell holding the given initial pair.
    #[must_use]
    pub fn with_initial(pair: EyePair) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pair)),
        }
    }

    /// Copy out the current pair.
    ///
    /// A poisoned lock still holds a complete pair, so it is read through.
    #[must_use]
    pub fn snapshot(&self) -> EyePair {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current position of one eye.
    #[must_use]
    pub fn eye(&self, eye: Eye) -> EyePosition {
        self.snapshot().get(eye)
    }

    /// Replace both positions at once and return the new sequence number.
    pub fn publish(&self, left: EyePosition, right: EyePosition) -> u64 {
        let mut pair = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        pair.left = left;
        pair.right = right;
        pair.sequence = pair.sequence.wrapping_add(1);
        pair.sequence
    }

    /// Sequence number of the current pair.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.snapshot().sequence
    }
}
