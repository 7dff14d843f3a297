//! Confirmation tracking
//!
//! A move only becomes a signal after it has been observed repeatedly in the
//! same direction within one period window.

mod manager;
mod types;

pub use manager::ConfirmationManager;
pub use types::{
    ConfirmationConfig, ConfirmationCounter, ConfirmationOutcome, ConfirmationProgress,
};
