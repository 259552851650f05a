//! Recording stand-ins for the host collaborators, shared by unit tests.

use std::sync::Arc;

use anyhow::{bail, Result};
use parking_lot::Mutex;

use crate::{
    clipboard::ClipboardService,
    model::{Chord, FocusTarget, WindowHandle},
    services::{EventPump, FocusService, KeyboardSynth, WindowMessenger},
};

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

pub struct FakeClipboard {
    journal: Journal,
    contents: Mutex<Option<String>>,
    fail_read: bool,
    fail_write: bool,
}

impl FakeClipboard {
    pub fn new(journal: &Journal, contents: &str) -> Self {
        Self {
            journal: journal.clone(),
            contents: Mutex::new(Some(contents.to_string())),
            fail_read: false,
            fail_write: false,
        }
    }

    pub fn unreadable(mut self) -> Self {
        self.fail_read = true;
        self
    }

    pub fn unwritable(mut self) -> Self {
        self.fail_write = true;
        self
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl ClipboardService for FakeClipboard {
    fn read_text(&self) -> Result<String> {
        if self.fail_read {
            self.journal.record("read failed");
            bail!("clipboard is locked");
        }
        self.journal.record("read");
        Ok(self.contents.lock().clone().unwrap_or_default())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        if self.fail_write {
            self.journal.record("write failed");
            bail!("clipboard is locked");
        }
        self.journal.record(format!("write {text:?}"));
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}

pub struct FakeKeyboard {
    journal: Journal,
    failures: Mutex<Vec<Chord>>,
    always_fail: bool,
}

impl FakeKeyboard {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            failures: Mutex::new(Vec::new()),
            always_fail: false,
        }
    }

    /// Each listed chord fails once, in any order.
    pub fn failing(self, chords: &[Chord]) -> Self {
        *self.failures.lock() = chords.to_vec();
        self
    }

    pub fn failing_always(mut self) -> Self {
        self.always_fail = true;
        self
    }
}

impl KeyboardSynth for FakeKeyboard {
    fn send_chord(&self, chord: Chord) -> Result<()> {
        let fail = self.always_fail || {
            let mut failures = self.failures.lock();
            match failures.iter().position(|c| *c == chord) {
                Some(index) => {
                    failures.remove(index);
                    true
                }
                None => false,
            }
        };
        if fail {
            self.journal.record(format!("chord {} failed", chord.name()));
            bail!("input was blocked");
        }
        self.journal.record(format!("chord {}", chord.name()));
        Ok(())
    }
}

pub struct FakeMessenger {
    journal: Journal,
    fail: bool,
}

impl FakeMessenger {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl WindowMessenger for FakeMessenger {
    fn cancellable_send(
        &self,
        handle: WindowHandle,
        message: u32,
        wparam: usize,
        lparam: isize,
    ) -> Result<()> {
        let entry = format!("send {:#x} {message:#x} {wparam:#x} {lparam}", handle.0);
        if self.fail {
            self.journal.record(format!("{entry} failed"));
            bail!("window stopped responding");
        }
        self.journal.record(entry);
        Ok(())
    }
}

pub struct FakeFocus {
    journal: Journal,
    target: FocusTarget,
}

impl FakeFocus {
    pub fn new(journal: &Journal, target: FocusTarget) -> Self {
        Self {
            journal: journal.clone(),
            target,
        }
    }
}

impl FocusService for FakeFocus {
    fn current_focus_target(&self) -> Result<FocusTarget> {
        Ok(self.target.clone())
    }

    fn set_focus(&self, _target: &FocusTarget) -> Result<()> {
        self.journal.record("set focus");
        Ok(())
    }
}

pub struct FakePump {
    journal: Journal,
}

impl FakePump {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }
}

impl EventPump for FakePump {
    fn process_pending_events(&self) {
        self.journal.record("pump");
    }
}
