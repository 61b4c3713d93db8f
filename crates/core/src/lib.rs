//! Core seams for the game-library player.
//!
//! Defines the collaborator interfaces the session layer is written against:
//! the opaque emulation runtime (consumed here, implemented by the embedding
//! page) and the page-side presenter, plus the types that cross those seams.

pub mod aspect;

pub mod types {
    use serde::{Deserialize, Serialize};

    /// Opaque reference to a playable ROM: a URL or path the runtime
    /// understands. Never inspected by the player itself.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RomRef(pub String);

    impl RomRef {
        pub fn new(source: impl Into<String>) -> Self {
            Self(source.into())
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    /// Opaque save-state payload produced and consumed by the runtime.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct StateBlob(pub Vec<u8>);

    impl StateBlob {
        pub fn as_bytes(&self) -> &[u8] {
            &self.0
        }

        pub fn len(&self) -> usize {
            self.0.len()
        }

        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }
    }

    /// One keymap row as the runtime consumes it: a logical control name,
    /// the physical key bound to it, and the controller coordinates the
    /// runtime should report presses under.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct KeymapEntry {
        pub control: String,
        pub physical_key: String,
        pub port: u32,
        pub index: u32,
        pub button_id: u32,
    }

    pub type KeymapTable = Vec<KeymapEntry>;
}

/// Lifecycle notifications delivered asynchronously by the runtime.
///
/// Every event is reported together with the generation of the launch it
/// belongs to, so a controller can drop notifications from an abandoned
/// loading attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// The core finished loading and is producing frames.
    Started,
    Paused,
    Resumed,
    /// Shutdown acknowledgment for a prior `exit` request.
    Exited,
    /// The runtime failed; the message is surfaced to the user as-is.
    Errored(String),
}

/// Everything the runtime needs to bring a session up.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub rom: types::RomRef,
    /// Core identifier the runtime selects its system module by (e.g. "nes").
    pub core: String,
    /// Identifier of the video surface the runtime renders into.
    pub video_target: String,
    pub audio: bool,
    pub keymap: types::KeymapTable,
    /// Echoed back in every [`RuntimeEvent`] for this launch.
    pub generation: u64,
}

/// Handle to a launched runtime session.
///
/// Commands are issued directly; lifecycle transitions that take time (exit
/// in particular) complete through a later [`RuntimeEvent`] rather than a
/// return value.
pub trait RuntimeHandle {
    type Error: std::error::Error + Send + Sync + 'static;

    fn pause(&mut self) -> Result<(), Self::Error>;
    fn resume(&mut self) -> Result<(), Self::Error>;

    /// Request shutdown. The runtime acknowledges completion with
    /// [`RuntimeEvent::Exited`].
    fn exit(&mut self) -> Result<(), Self::Error>;

    fn save_state(&mut self) -> Result<types::StateBlob, Self::Error>;
    fn load_state(&mut self, blob: &types::StateBlob) -> Result<(), Self::Error>;

    /// Report a logical button transition on a controller port.
    fn set_button(&mut self, port: u32, index: u32, button_id: u32, pressed: bool);

    fn set_keymap(&mut self, keymap: &types::KeymapTable) -> Result<(), Self::Error>;
}

/// The opaque emulation runtime. One launch yields one handle; the handle
/// is dropped when the session terminates or fails.
pub trait EmulatorRuntime {
    type Handle: RuntimeHandle;
    type Error: std::error::Error + Send + Sync + 'static;

    fn launch(&mut self, config: LaunchConfig) -> Result<Self::Handle, Self::Error>;
}

/// Page-side surface the session reports to.
///
/// Purely reactive: implementations render status and must not call back
/// into the session.
pub trait Presenter {
    /// One-line status text (state changes, command failures).
    fn status(&mut self, message: &str);

    /// Show the loading overlay with a message and sub-message.
    fn show_loading(&mut self, message: &str, detail: &str);

    fn hide_loading(&mut self);

    /// Gamepad-connected indicator text.
    fn gamepad_indicator(&mut self, text: &str);

    /// Resize the video surface.
    fn set_canvas_size(&mut self, width: u32, height: u32);
}

/// Presenter that drops every notification. Useful for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn status(&mut self, _message: &str) {}
    fn show_loading(&mut self, _message: &str, _detail: &str) {}
    fn hide_loading(&mut self) {}
    fn gamepad_indicator(&mut self, _text: &str) {}
    fn set_canvas_size(&mut self, _width: u32, _height: u32) {}
}
