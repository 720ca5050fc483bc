//! Bridge lifecycle
//!
//! ```text
//! Uninitialized ──initialize──▶ Initialized ──begin──▶ Ready
//!       ▲                            │                   │
//!       └────────────teardown────────┴───────────────────┘
//! ```
//!
//! Buffers exist from `Initialized` on. Bus traffic and staging need `Ready`.

use crate::error::BridgeError;

/// Bridge lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeState {
    /// No buffers allocated, peripheral untouched
    #[default]
    Uninitialized,
    /// Buffers allocated and peripheral configured
    Initialized,
    /// Peripheral started; transfers allowed
    Ready,
}

/// Lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lifecycle {
    Initialize,
    Begin,
    Teardown,
}

impl BridgeState {
    /// Check if transfer buffers are allocated
    pub fn has_buffers(&self) -> bool {
        matches!(self, BridgeState::Initialized | BridgeState::Ready)
    }

    /// Check if bus transfers are allowed
    pub fn is_ready(&self) -> bool {
        matches!(self, BridgeState::Ready)
    }

    /// Fail with [`BridgeError::NotReady`] unless transfers are allowed
    pub fn require_ready(&self) -> Result<(), BridgeError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(BridgeError::NotReady)
        }
    }

    /// Process a lifecycle event and return the next state
    ///
    /// Rejected transitions leave the caller's state untouched, since the
    /// caller only stores the result on success.
    pub fn transition(self, event: Lifecycle) -> Result<Self, BridgeError> {
        use BridgeState::*;
        use Lifecycle::*;

        match (self, event) {
            (Uninitialized, Initialize) => Ok(Initialized),
            (Initialized | Ready, Initialize) => Err(BridgeError::AlreadyInitialized),

            (Initialized, Begin) => Ok(Ready),
            (Ready, Begin) => Ok(Ready),
            (Uninitialized, Begin) => Err(BridgeError::NotReady),

            (_, Teardown) => Ok(Uninitialized),
        }
    }
}
