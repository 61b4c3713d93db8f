//! Raw input to logical button transitions.
//!
//! Keyboard events resolve through the binding set's reverse index and are
//! forwarded to the active session as `set_button` transitions. Gamepads are
//! polled once per animation frame while the session is running; polling is
//! edge-detected so every state change dispatches exactly once.
//!
//! While capture mode is armed (the user is rebinding a control) raw key
//! events are diverted away from gameplay; the first key-down is consumed
//! for the rebind and capture clears automatically.

use log::{debug, info};
use std::collections::HashMap;

use shelf_core::Presenter;

use crate::bindings::{BindingSet, LogicalControl};

/// Analog stick displacement below this is ignored.
pub const AXIS_DEADZONE: f32 = 0.5;

/// Where logical button transitions go. The session controller implements
/// this, gating on its own state; a dropped transition is not an error.
pub trait ButtonSink {
    fn set_button(&mut self, port: u32, index: u32, button_id: u32, pressed: bool);
}

/// Outcome of routing one raw key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDispatch {
    /// Consumed by capture mode: rebind `control` to `physical_key`.
    /// The caller applies the rebind and persists it.
    Captured {
        control: LogicalControl,
        physical_key: String,
    },
    /// Resolved and forwarded to the sink.
    Dispatched(LogicalControl),
    /// No binding for this key, or a diverted event while capturing.
    Ignored,
}

/// One frame's worth of gamepad state, as sampled by the embedder from the
/// platform gamepad API (standard button mapping assumed).
#[derive(Debug, Clone, Default)]
pub struct GamepadSnapshot {
    /// Digital buttons indexed by standard-mapping button ID.
    pub buttons: Vec<bool>,
    /// Left stick, -1.0..=1.0 per axis; negative y is up.
    pub axis_x: f32,
    pub axis_y: f32,
}

impl GamepadSnapshot {
    fn button(&self, id: u32) -> bool {
        self.buttons.get(id as usize).copied().unwrap_or(false)
    }

    /// Analog assertion for a direction, beyond the deadzone.
    fn axis_direction(&self, control: LogicalControl) -> bool {
        match control {
            LogicalControl::Up => self.axis_y < -AXIS_DEADZONE,
            LogicalControl::Down => self.axis_y > AXIS_DEADZONE,
            LogicalControl::Left => self.axis_x < -AXIS_DEADZONE,
            LogicalControl::Right => self.axis_x > AXIS_DEADZONE,
            _ => false,
        }
    }
}

/// Translates raw device events into logical transitions on a [`ButtonSink`].
#[derive(Default)]
pub struct InputRouter {
    capture: Option<LogicalControl>,
    /// Last observed gamepad assertion per control, for edge detection.
    pad_held: HashMap<LogicalControl, bool>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm capture mode: the next key-down rebinds `control` instead of
    /// reaching gameplay. Independent of session state.
    pub fn begin_capture(&mut self, control: LogicalControl) {
        info!("capturing next key for {}", control.name());
        self.capture = Some(control);
    }

    pub fn cancel_capture(&mut self) {
        self.capture = None;
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Route a raw key-down event.
    pub fn key_down(
        &mut self,
        physical_key: &str,
        bindings: &BindingSet,
        sink: &mut dyn ButtonSink,
    ) -> KeyDispatch {
        if let Some(control) = self.capture.take() {
            // One-shot: capture clears before anything else can run.
            return KeyDispatch::Captured {
                control,
                physical_key: physical_key.to_string(),
            };
        }
        match bindings.resolve(physical_key) {
            Some(binding) => {
                sink.set_button(binding.port, binding.index, binding.button_id, true);
                KeyDispatch::Dispatched(binding.control)
            }
            None => KeyDispatch::Ignored,
        }
    }

    /// Route a raw key-up event. Diverted (not dispatched) while capture
    /// mode is armed, but does not satisfy the capture.
    pub fn key_up(
        &mut self,
        physical_key: &str,
        bindings: &BindingSet,
        sink: &mut dyn ButtonSink,
    ) -> KeyDispatch {
        if self.capture.is_some() {
            return KeyDispatch::Ignored;
        }
        match bindings.resolve(physical_key) {
            Some(binding) => {
                sink.set_button(binding.port, binding.index, binding.button_id, false);
                KeyDispatch::Dispatched(binding.control)
            }
            None => KeyDispatch::Ignored,
        }
    }

    /// Per-frame gamepad poll. Digital buttons and analog directions are
    /// OR-combined per control; only transitions since the previous poll are
    /// dispatched. The caller runs this once per animation frame while the
    /// session is running.
    pub fn poll_gamepad(
        &mut self,
        pad: &GamepadSnapshot,
        bindings: &BindingSet,
        sink: &mut dyn ButtonSink,
    ) {
        for control in LogicalControl::ALL {
            let binding = bindings.get(control);
            let pressed = pad.button(binding.button_id) || pad.axis_direction(control);
            let was = self.pad_held.insert(control, pressed).unwrap_or(false);
            if pressed != was {
                sink.set_button(binding.port, binding.index, binding.button_id, pressed);
            }
        }
    }

    /// A gamepad appeared; surface it on the indicator.
    pub fn gamepad_connected(&mut self, name: &str, presenter: &mut dyn Presenter) {
        info!("gamepad connected: {}", name);
        presenter.gamepad_indicator(&format!("Gamepad: {}", name));
    }

    /// The gamepad went away: release anything it held and clear the
    /// indicator.
    pub fn gamepad_disconnected(
        &mut self,
        bindings: &BindingSet,
        sink: &mut dyn ButtonSink,
        presenter: &mut dyn Presenter,
    ) {
        for (control, held) in self.pad_held.drain() {
            if held {
                let binding = bindings.get(control);
                debug!("releasing {} on gamepad disconnect", control.name());
                sink.set_button(binding.port, binding.index, binding.button_id, false);
            }
        }
        presenter.gamepad_indicator("No gamepad");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<(u32, u32, u32, bool)>,
    }

    impl ButtonSink for RecordingSink {
        fn set_button(&mut self, port: u32, index: u32, button_id: u32, pressed: bool) {
            self.calls.push((port, index, button_id, pressed));
        }
    }

    #[test]
    fn bound_key_dispatches_press_and_release() {
        let bindings = BindingSet::defaults();
        let mut router = InputRouter::new();
        let mut sink = RecordingSink::default();

        let down = router.key_down("x", &bindings, &mut sink);
        assert_eq!(down, KeyDispatch::Dispatched(LogicalControl::A));
        let up = router.key_up("x", &bindings, &mut sink);
        assert_eq!(up, KeyDispatch::Dispatched(LogicalControl::A));

        let a_id = LogicalControl::A.button_id();
        assert_eq!(sink.calls, vec![(0, 0, a_id, true), (0, 0, a_id, false)]);
    }

    #[test]
    fn unbound_key_produces_zero_calls() {
        let bindings = BindingSet::defaults();
        let mut router = InputRouter::new();
        let mut sink = RecordingSink::default();

        assert_eq!(router.key_down("F9", &bindings, &mut sink), KeyDispatch::Ignored);
        assert_eq!(router.key_up("F9", &bindings, &mut sink), KeyDispatch::Ignored);
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn capture_consumes_exactly_one_key_down() {
        let bindings = BindingSet::defaults();
        let mut router = InputRouter::new();
        let mut sink = RecordingSink::default();

        router.begin_capture(LogicalControl::B);
        assert!(router.is_capturing());

        let first = router.key_down("k", &bindings, &mut sink);
        assert_eq!(
            first,
            KeyDispatch::Captured {
                control: LogicalControl::B,
                physical_key: "k".to_string(),
            }
        );
        assert!(!router.is_capturing());
        assert!(sink.calls.is_empty());

        // The next event routes normally again ("k" is still unbound here
        // because the caller has not applied the rebind).
        assert_eq!(router.key_down("k", &bindings, &mut sink), KeyDispatch::Ignored);
    }

    #[test]
    fn key_up_is_diverted_while_capturing() {
        let bindings = BindingSet::defaults();
        let mut router = InputRouter::new();
        let mut sink = RecordingSink::default();

        router.begin_capture(LogicalControl::B);
        // Releasing a bound key must not reach gameplay nor satisfy capture.
        assert_eq!(router.key_up("x", &bindings, &mut sink), KeyDispatch::Ignored);
        assert!(router.is_capturing());
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn gamepad_poll_is_edge_detected() {
        let bindings = BindingSet::defaults();
        let mut router = InputRouter::new();
        let mut sink = RecordingSink::default();

        let a_id = LogicalControl::A.button_id() as usize;
        let mut pad = GamepadSnapshot::default();
        pad.buttons = vec![false; 16];
        pad.buttons[a_id] = true;

        router.poll_gamepad(&pad, &bindings, &mut sink);
        // Held across frames: no repeat dispatch.
        router.poll_gamepad(&pad, &bindings, &mut sink);
        pad.buttons[a_id] = false;
        router.poll_gamepad(&pad, &bindings, &mut sink);

        let a = LogicalControl::A.button_id();
        assert_eq!(sink.calls, vec![(0, 0, a, true), (0, 0, a, false)]);
    }

    #[test]
    fn analog_and_digital_sources_or_combine() {
        let bindings = BindingSet::defaults();
        let mut router = InputRouter::new();
        let mut sink = RecordingSink::default();

        // Analog left beyond the deadzone asserts Left.
        let mut pad = GamepadSnapshot {
            buttons: vec![false; 16],
            axis_x: -0.8,
            axis_y: 0.0,
        };
        router.poll_gamepad(&pad, &bindings, &mut sink);
        let left = LogicalControl::Left.button_id();
        assert_eq!(sink.calls, vec![(0, 0, left, true)]);

        // Stick returns to center but the D-pad takes over: still held,
        // so no transition is dispatched.
        pad.axis_x = 0.0;
        pad.buttons[left as usize] = true;
        router.poll_gamepad(&pad, &bindings, &mut sink);
        assert_eq!(sink.calls.len(), 1);

        // Both sources released: one release transition.
        pad.buttons[left as usize] = false;
        router.poll_gamepad(&pad, &bindings, &mut sink);
        assert_eq!(sink.calls, vec![(0, 0, left, true), (0, 0, left, false)]);
    }

    #[test]
    fn deadzone_filters_small_displacement() {
        let bindings = BindingSet::defaults();
        let mut router = InputRouter::new();
        let mut sink = RecordingSink::default();

        let pad = GamepadSnapshot {
            buttons: Vec::new(),
            axis_x: 0.3,
            axis_y: -0.49,
        };
        router.poll_gamepad(&pad, &bindings, &mut sink);
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn disconnect_releases_held_controls() {
        let bindings = BindingSet::defaults();
        let mut router = InputRouter::new();
        let mut sink = RecordingSink::default();
        let mut presenter = shelf_core::NullPresenter;

        let pad = GamepadSnapshot {
            buttons: vec![false; 16],
            axis_y: -1.0,
            axis_x: 0.0,
        };
        router.poll_gamepad(&pad, &bindings, &mut sink);
        router.gamepad_disconnected(&bindings, &mut sink, &mut presenter);

        let up = LogicalControl::Up.button_id();
        assert_eq!(sink.calls, vec![(0, 0, up, true), (0, 0, up, false)]);
    }
}
