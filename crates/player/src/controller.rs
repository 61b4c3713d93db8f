//! Emulator session lifecycle.
//!
//! One [`SessionController`] owns the single live session: it launches the
//! opaque runtime, mediates user commands (pause, resume, reset, save/load
//! state, keymap updates), and reports every outcome to the presenter.
//! Nothing else touches the runtime handle.
//!
//! Lifecycle completions arrive as [`RuntimeEvent`]s stamped with the
//! generation of the launch they belong to; events from an abandoned loading
//! attempt are dropped. A reset waits for the runtime's shutdown
//! acknowledgment before relaunching, so two runtime instances never overlap.

use log::{debug, error, info, warn};

use shelf_core::types::{KeymapTable, RomRef, StateBlob};
use shelf_core::{EmulatorRuntime, LaunchConfig, Presenter, RuntimeEvent, RuntimeHandle};

use crate::bindings::BindingSet;
use crate::router::ButtonSink;
use crate::state_store::SaveStateStore;
use crate::PlayerError;

/// Where the session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Running,
    Paused,
    Terminated,
    Failed,
}

/// Launch parameters kept around so `reset` can restart the same game.
#[derive(Debug, Clone)]
struct PendingLaunch {
    rom: RomRef,
    core: String,
}

pub struct SessionController<R: EmulatorRuntime, P: Presenter> {
    runtime: R,
    presenter: P,
    video_target: String,
    audio: bool,

    state: SessionState,
    /// Bumped on every launch; events carrying an older value are stale.
    generation: u64,
    handle: Option<R::Handle>,
    launch: Option<PendingLaunch>,
    keymap: KeymapTable,
    /// The single save-state slot. Overwritten on every save.
    saved_state: Option<StateBlob>,
    /// Set between an `exit` request and its `Exited` acknowledgment.
    shutdown_pending: bool,
    restart_after_exit: bool,
    state_store: Option<SaveStateStore>,
}

impl<R: EmulatorRuntime, P: Presenter> SessionController<R, P> {
    pub fn new(runtime: R, presenter: P, video_target: impl Into<String>, audio: bool) -> Self {
        Self {
            runtime,
            presenter,
            video_target: video_target.into(),
            audio,
            state: SessionState::Uninitialized,
            generation: 0,
            handle: None,
            launch: None,
            keymap: Vec::new(),
            saved_state: None,
            shutdown_pending: false,
            restart_after_exit: false,
            state_store: None,
        }
    }

    /// Attach durable save-state storage; the slot is seeded from it at
    /// start and written through on every save.
    pub fn with_state_store(mut self, store: SaveStateStore) -> Self {
        self.state_store = Some(store);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn saved_state(&self) -> Option<&StateBlob> {
        self.saved_state.as_ref()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Report a rejected command and hand the error back to the caller.
    /// Failures never escape as panics; the user-visible remedy is always a
    /// manual action.
    fn reject(&mut self, err: PlayerError) -> PlayerError {
        warn!("{}", err);
        self.presenter.status(&err.to_string());
        err
    }

    /// Move to Failed, releasing the runtime handle.
    fn fail(&mut self, err: &PlayerError) {
        error!("session failed: {}", err);
        self.handle = None;
        self.shutdown_pending = false;
        self.restart_after_exit = false;
        self.state = SessionState::Failed;
        self.presenter.hide_loading();
        self.presenter.status(&err.to_string());
    }

    /// Begin a fresh session for `rom` on the named core, launching the
    /// runtime with the given keymap. Valid from Uninitialized, Terminated,
    /// or Failed; a manual reset retries a failed launch.
    pub fn start(
        &mut self,
        rom: RomRef,
        core: impl Into<String>,
        bindings: &BindingSet,
    ) -> Result<(), PlayerError> {
        match self.state {
            SessionState::Uninitialized | SessionState::Terminated | SessionState::Failed => {}
            _ => return Err(self.reject(PlayerError::SessionNotReady { command: "start" })),
        }
        if self.shutdown_pending {
            return Err(self.reject(PlayerError::SessionNotReady { command: "start" }));
        }
        self.keymap = bindings.to_keymap();
        self.launch = Some(PendingLaunch {
            rom,
            core: core.into(),
        });
        // A new game means a new slot.
        self.saved_state = None;
        self.begin_loading()
    }

    fn begin_loading(&mut self) -> Result<(), PlayerError> {
        let Some(launch) = self.launch.clone() else {
            return Err(self.reject(PlayerError::SessionNotReady { command: "start" }));
        };
        self.generation += 1;
        self.state = SessionState::Loading;
        info!(
            "launching {} on core {} (generation {})",
            launch.rom.as_str(),
            launch.core,
            self.generation
        );
        self.presenter
            .show_loading("Starting emulator", launch.rom.as_str());

        if self.saved_state.is_none() {
            if let Some(store) = &self.state_store {
                self.saved_state = store.load(&launch.rom);
            }
        }

        let config = LaunchConfig {
            rom: launch.rom,
            core: launch.core,
            video_target: self.video_target.clone(),
            audio: self.audio,
            keymap: self.keymap.clone(),
            generation: self.generation,
        };
        match self.runtime.launch(config) {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                let err = PlayerError::RuntimeLaunchFailed(e.to_string());
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Feed a lifecycle notification from the runtime. `generation` is the
    /// value the runtime was launched with.
    pub fn handle_runtime_event(&mut self, generation: u64, event: RuntimeEvent) {
        if self.shutdown_pending {
            // Only the shutdown acknowledgment matters while the old core
            // winds down; anything else is a race from the dying session.
            if generation == self.generation && event == RuntimeEvent::Exited {
                self.finish_shutdown();
            } else {
                debug!("dropping {:?} during pending shutdown", event);
            }
            return;
        }
        if generation != self.generation {
            debug!(
                "dropping stale {:?} (generation {} != {})",
                event, generation, self.generation
            );
            return;
        }
        match event {
            RuntimeEvent::Started => {
                if self.state == SessionState::Loading {
                    self.state = SessionState::Running;
                    self.presenter.hide_loading();
                    self.presenter.status("Running");
                    info!("session running (generation {})", self.generation);
                } else {
                    debug!("ignoring Started in state {:?}", self.state);
                }
            }
            RuntimeEvent::Paused => {
                if self.state == SessionState::Running {
                    self.state = SessionState::Paused;
                    self.presenter.status("Paused");
                }
            }
            RuntimeEvent::Resumed => {
                if self.state == SessionState::Paused {
                    self.state = SessionState::Running;
                    self.presenter.status("Running");
                }
            }
            RuntimeEvent::Exited => {
                // Unsolicited exit; the session is simply over.
                self.handle = None;
                self.state = SessionState::Terminated;
                self.presenter.status("Stopped");
            }
            RuntimeEvent::Errored(message) => {
                let err = if self.state == SessionState::Loading {
                    PlayerError::RuntimeLaunchFailed(message)
                } else {
                    PlayerError::RuntimeCommand(message)
                };
                self.fail(&err);
            }
        }
    }

    fn finish_shutdown(&mut self) {
        self.shutdown_pending = false;
        self.handle = None;
        self.state = SessionState::Terminated;
        if self.restart_after_exit {
            self.restart_after_exit = false;
            // Failure is already reported through fail().
            let _ = self.begin_loading();
        } else {
            self.presenter.status("Stopped");
        }
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        if self.state != SessionState::Running || self.shutdown_pending {
            return Err(self.reject(PlayerError::SessionNotReady { command: "pause" }));
        }
        let Some(handle) = self.handle.as_mut() else {
            return Err(self.reject(PlayerError::SessionNotReady { command: "pause" }));
        };
        if let Err(e) = handle.pause() {
            let err = PlayerError::RuntimeCommand(e.to_string());
            return Err(self.reject(err));
        }
        self.state = SessionState::Paused;
        self.presenter.status("Paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PlayerError> {
        if self.state != SessionState::Paused || self.shutdown_pending {
            return Err(self.reject(PlayerError::SessionNotReady { command: "resume" }));
        }
        let Some(handle) = self.handle.as_mut() else {
            return Err(self.reject(PlayerError::SessionNotReady { command: "resume" }));
        };
        if let Err(e) = handle.resume() {
            let err = PlayerError::RuntimeCommand(e.to_string());
            return Err(self.reject(err));
        }
        self.state = SessionState::Running;
        self.presenter.status("Running");
        Ok(())
    }

    /// Shut the current session down and start a fresh one for the same
    /// game. From Loading this abandons the attempt and restarts; from
    /// Terminated or Failed it relaunches directly. While a shutdown is
    /// already pending the command is rejected, never raced.
    pub fn reset(&mut self) -> Result<(), PlayerError> {
        if self.shutdown_pending {
            return Err(self.reject(PlayerError::SessionNotReady { command: "reset" }));
        }
        match self.state {
            SessionState::Running | SessionState::Paused | SessionState::Loading => {
                let Some(handle) = self.handle.as_mut() else {
                    return Err(self.reject(PlayerError::SessionNotReady { command: "reset" }));
                };
                info!("resetting session (generation {})", self.generation);
                if let Err(e) = handle.exit() {
                    let err = PlayerError::RuntimeCommand(e.to_string());
                    self.fail(&err);
                    return Err(err);
                }
                self.shutdown_pending = true;
                self.restart_after_exit = true;
                self.state = SessionState::Terminated;
                self.presenter.show_loading("Restarting", "");
                Ok(())
            }
            SessionState::Terminated | SessionState::Failed if self.launch.is_some() => {
                self.begin_loading()
            }
            _ => Err(self.reject(PlayerError::SessionNotReady { command: "reset" })),
        }
    }

    /// Snapshot the runtime into the single save-state slot, overwriting any
    /// previous value, and write it through to durable storage if attached.
    pub fn save_state(&mut self) -> Result<StateBlob, PlayerError> {
        if !matches!(self.state, SessionState::Running | SessionState::Paused)
            || self.shutdown_pending
        {
            return Err(self.reject(PlayerError::SessionNotReady {
                command: "save state",
            }));
        }
        let Some(handle) = self.handle.as_mut() else {
            return Err(self.reject(PlayerError::SessionNotReady {
                command: "save state",
            }));
        };
        let blob = match handle.save_state() {
            Ok(blob) => blob,
            Err(e) => {
                let err = PlayerError::RuntimeCommand(e.to_string());
                return Err(self.reject(err));
            }
        };
        self.saved_state = Some(blob.clone());
        if let (Some(store), Some(launch)) = (&self.state_store, &self.launch) {
            if let Err(e) = store.save(&launch.rom, &blob) {
                warn!("could not persist save state: {}", e);
            }
        }
        self.presenter.status("State saved");
        Ok(blob)
    }

    /// Restore the slot into the runtime. Loading a state always resumes
    /// play: a Paused session comes back Running.
    pub fn load_state(&mut self) -> Result<(), PlayerError> {
        if !matches!(self.state, SessionState::Running | SessionState::Paused)
            || self.shutdown_pending
        {
            return Err(self.reject(PlayerError::SessionNotReady {
                command: "load state",
            }));
        }
        let Some(blob) = self.saved_state.clone() else {
            return Err(self.reject(PlayerError::NoSavedState));
        };
        let Some(handle) = self.handle.as_mut() else {
            return Err(self.reject(PlayerError::SessionNotReady {
                command: "load state",
            }));
        };
        if let Err(e) = handle.load_state(&blob) {
            let err = PlayerError::RuntimeCommand(e.to_string());
            return Err(self.reject(err));
        }
        if self.state == SessionState::Paused {
            let Some(handle) = self.handle.as_mut() else {
                return Err(self.reject(PlayerError::SessionNotReady {
                    command: "load state",
                }));
            };
            if let Err(e) = handle.resume() {
                let err = PlayerError::RuntimeCommand(e.to_string());
                return Err(self.reject(err));
            }
            self.state = SessionState::Running;
        }
        self.presenter.status("State loaded");
        Ok(())
    }

    /// Push updated bindings to the runtime. Recorded for the next launch in
    /// any state; forwarded immediately while a session is live, without
    /// interrupting it.
    pub fn set_keymap(&mut self, bindings: &BindingSet) -> Result<(), PlayerError> {
        self.keymap = bindings.to_keymap();
        if self.shutdown_pending {
            return Ok(());
        }
        if matches!(self.state, SessionState::Running | SessionState::Paused) {
            if let Some(handle) = self.handle.as_mut() {
                if let Err(e) = handle.set_keymap(&self.keymap) {
                    let err = PlayerError::RuntimeCommand(e.to_string());
                    return Err(self.reject(err));
                }
            }
        }
        Ok(())
    }
}

impl<R: EmulatorRuntime, P: Presenter> ButtonSink for SessionController<R, P> {
    /// Gameplay dispatch gate: transitions are forwarded only while Running.
    /// Anything else is dropped silently.
    fn set_button(&mut self, port: u32, index: u32, button_id: u32, pressed: bool) {
        if self.state != SessionState::Running || self.shutdown_pending {
            return;
        }
        if let Some(handle) = self.handle.as_mut() {
            handle.set_button(port, index, button_id, pressed);
        }
    }
}
