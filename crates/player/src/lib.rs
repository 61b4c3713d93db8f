//! In-page player core for the game library.
//!
//! Three components around one owned session: the binding store persists the
//! logical-control layout, the input router turns raw key and gamepad input
//! into logical button transitions, and the session controller drives the
//! opaque emulation runtime through its lifecycle. The embedding page wires
//! them together and feeds events in; see `examples/headless.rs`.

pub mod bindings;
pub mod controller;
pub mod router;
pub mod state_store;
pub mod store;

pub use bindings::{BindingSet, KeyBinding, LogicalControl};
pub use controller::{SessionController, SessionState};
pub use router::{ButtonSink, GamepadSnapshot, InputRouter, KeyDispatch};
pub use state_store::SaveStateStore;
pub use store::BindingStore;

/// Player-side failures. All of these are caught at the command boundary
/// and turned into user-visible status text; none terminate the page.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Rebind target outside the closed control set. Rejected, no mutation.
    #[error("unknown control: {0}")]
    InvalidControlName(String),

    /// Command issued outside a valid session state.
    #[error("session is not ready to {command}")]
    SessionNotReady { command: &'static str },

    /// Load attempted with an empty save-state slot.
    #[error("no saved state to load")]
    NoSavedState,

    /// The runtime reported an error while starting; a manual reset retries.
    #[error("emulator failed to start: {0}")]
    RuntimeLaunchFailed(String),

    /// A live runtime command failed.
    #[error("emulator error: {0}")]
    RuntimeCommand(String),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
