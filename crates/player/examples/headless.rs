//! Drives a full player session against a stub runtime, printing every
//! command the runtime receives. Mirrors how the embedding page wires the
//! pieces together.

use shelf_core::types::{KeymapTable, RomRef, StateBlob};
use shelf_core::{EmulatorRuntime, LaunchConfig, NullPresenter, RuntimeEvent, RuntimeHandle};
use shelf_player::{BindingStore, InputRouter, LogicalControl, SessionController};

#[derive(Debug, thiserror::Error)]
#[error("stub runtime error")]
struct StubError;

struct StubHandle;

impl RuntimeHandle for StubHandle {
    type Error = StubError;

    fn pause(&mut self) -> Result<(), StubError> {
        println!("runtime: pause");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), StubError> {
        println!("runtime: resume");
        Ok(())
    }

    fn exit(&mut self) -> Result<(), StubError> {
        println!("runtime: exit requested");
        Ok(())
    }

    fn save_state(&mut self) -> Result<StateBlob, StubError> {
        println!("runtime: save state");
        Ok(StateBlob(vec![0x42; 16]))
    }

    fn load_state(&mut self, blob: &StateBlob) -> Result<(), StubError> {
        println!("runtime: load state ({} bytes)", blob.len());
        Ok(())
    }

    fn set_button(&mut self, port: u32, index: u32, button_id: u32, pressed: bool) {
        println!(
            "runtime: setButton(port={}, index={}, id={}, pressed={})",
            port, index, button_id, pressed
        );
    }

    fn set_keymap(&mut self, keymap: &KeymapTable) -> Result<(), StubError> {
        println!("runtime: setKeymap ({} entries)", keymap.len());
        Ok(())
    }
}

struct StubRuntime;

impl EmulatorRuntime for StubRuntime {
    type Handle = StubHandle;
    type Error = StubError;

    fn launch(&mut self, config: LaunchConfig) -> Result<StubHandle, StubError> {
        println!(
            "runtime: launch {} on core {} (generation {})",
            config.rom.as_str(),
            config.core,
            config.generation
        );
        Ok(StubHandle)
    }
}

fn main() {
    env_logger::init();

    let store = BindingStore::new(std::env::temp_dir().join("headless-keybindings.json"));
    let mut bindings = store.load();
    let mut router = InputRouter::new();
    let mut controller = SessionController::new(StubRuntime, NullPresenter, "game-canvas", true);

    controller
        .start(RomRef::new("demo.nes"), "nes", &bindings)
        .expect("launch");
    let generation = controller.generation();
    controller.handle_runtime_event(generation, RuntimeEvent::Started);

    // A press and release of the default A button key.
    router.key_down("x", &bindings, &mut controller);
    router.key_up("x", &bindings, &mut controller);

    // Rebind Start to "p" through capture mode, then play it.
    router.begin_capture(LogicalControl::Start);
    if let shelf_player::KeyDispatch::Captured {
        control,
        physical_key,
    } = router.key_down("p", &bindings, &mut controller)
    {
        bindings.rebind(control, physical_key.as_str());
        store.save(&bindings).expect("persist bindings");
        controller.set_keymap(&bindings).expect("push keymap");
    }
    router.key_down("p", &bindings, &mut controller);
    router.key_up("p", &bindings, &mut controller);

    controller.save_state().expect("save state");
    controller.pause().expect("pause");
    controller.load_state().expect("load state resumes");

    controller.reset().expect("reset");
    let generation = controller.generation();
    controller.handle_runtime_event(generation, RuntimeEvent::Exited);
    let generation = controller.generation();
    controller.handle_runtime_event(generation, RuntimeEvent::Started);
    println!("session state after reset: {:?}", controller.state());
}
