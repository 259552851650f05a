use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteState {
    Idle,
    CapturingClipboard,
    Injecting,
    RestoringClipboard,
}

impl PasteState {
    pub fn label(&self) -> &'static str {
        match self {
            PasteState::Idle => "Idle",
            PasteState::CapturingClipboard => "Capturing clipboard",
            PasteState::Injecting => "Injecting",
            PasteState::RestoringClipboard => "Restoring clipboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub lines: Vec<String>,
}

/// Raw native window handle as reported by the focus service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Whatever holds input focus at the instant injection begins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusTarget {
    pub window_class_name: Option<String>,
    pub window_handle: Option<WindowHandle>,
}

impl FocusTarget {
    pub fn new(window_class_name: Option<&str>, window_handle: Option<WindowHandle>) -> Self {
        Self {
            window_class_name: window_class_name.map(str::to_string),
            window_handle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetClass {
    Console,
    RichText,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chord {
    /// `control+v`
    Paste,
    /// `shift+insert`
    AlternatePaste,
}

impl Chord {
    pub fn name(&self) -> &'static str {
        match self {
            Chord::Paste => "control+v",
            Chord::AlternatePaste => "shift+insert",
        }
    }
}

/// One way of getting the clipboard contents into the focused control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStep {
    ConsolePasteCommand,
    PasteMessage,
    KeyChord(Chord),
    FocusThenChord,
}

impl DeliveryStep {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryStep::ConsolePasteCommand => "console paste command",
            DeliveryStep::PasteMessage => "paste message",
            DeliveryStep::KeyChord(Chord::Paste) => "control+v",
            DeliveryStep::KeyChord(Chord::AlternatePaste) => "shift+insert",
            DeliveryStep::FocusThenChord => "focus then control+v",
        }
    }
}
