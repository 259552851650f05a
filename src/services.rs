use std::sync::Arc;

use anyhow::Result;

use crate::{
    clipboard::ClipboardService,
    model::{Chord, FocusTarget, WindowHandle},
};

pub const WM_COMMAND: u32 = 0x0111;
pub const WM_PASTE: u32 = 0x0302;
/// Menu command id of "Paste" in the legacy console system menu.
pub const CONSOLE_PASTE_COMMAND: usize = 0xFFF1;

pub trait FocusService: Send {
    fn current_focus_target(&self) -> Result<FocusTarget>;
    fn set_focus(&self, target: &FocusTarget) -> Result<()>;
}

pub trait KeyboardSynth: Send {
    fn send_chord(&self, chord: Chord) -> Result<()>;
}

pub trait WindowMessenger: Send {
    /// Deliver a message to `handle`, giving up instead of hanging if the
    /// owning window stops responding.
    fn cancellable_send(
        &self,
        handle: WindowHandle,
        message: u32,
        wparam: usize,
        lparam: isize,
    ) -> Result<()>;
}

pub trait EventPump: Send {
    /// Dispatch whatever is queued right now, once. Must not wait for more.
    fn process_pending_events(&self);
}

#[derive(Default)]
pub struct NoopEventPump;

impl EventPump for NoopEventPump {
    fn process_pending_events(&self) {}
}

/// Everything the paste engine needs from the desktop it runs on.
pub struct HostServices {
    pub clipboard: Arc<dyn ClipboardService>,
    pub focus: Box<dyn FocusService>,
    pub keyboard: Box<dyn KeyboardSynth>,
    pub messenger: Box<dyn WindowMessenger>,
    pub events: Box<dyn EventPump>,
}
