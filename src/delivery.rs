use std::{thread, time::Duration};

use anyhow::{anyhow, Result};

use crate::{
    model::{Chord, DeliveryStep, FocusTarget, TargetClass},
    services::{
        FocusService, KeyboardSynth, WindowMessenger, CONSOLE_PASTE_COMMAND, WM_COMMAND, WM_PASTE,
    },
};

pub const CONSOLE_WINDOW_CLASS: &str = "ConsoleWindowClass";

/// Decide how a focused control should receive a paste.
///
/// Only the window class name and the presence of a native handle matter.
/// Console and rich-text controls are reached by messaging their window, so
/// without a handle they are treated as general targets.
pub fn classify(window_class_name: Option<&str>, has_handle: bool) -> TargetClass {
    match window_class_name {
        Some(_) if !has_handle => TargetClass::General,
        Some(CONSOLE_WINDOW_CLASS) => TargetClass::Console,
        Some(name) if name.contains("Rich") && name.contains("Text") => TargetClass::RichText,
        _ => TargetClass::General,
    }
}

pub fn classify_target(target: &FocusTarget) -> TargetClass {
    classify(
        target.window_class_name.as_deref(),
        target.window_handle.is_some(),
    )
}

/// Ordered delivery steps for a target; the first one that succeeds wins.
pub fn plan(class: TargetClass, has_handle: bool) -> Vec<DeliveryStep> {
    match class {
        TargetClass::Console => vec![DeliveryStep::ConsolePasteCommand],
        TargetClass::RichText => vec![DeliveryStep::PasteMessage],
        TargetClass::General => {
            let mut steps = vec![
                DeliveryStep::KeyChord(Chord::Paste),
                DeliveryStep::KeyChord(Chord::AlternatePaste),
            ];
            // With a handle the paste message is the last resort; without
            // one, focus the control and retry the standard chord.
            steps.push(if has_handle {
                DeliveryStep::PasteMessage
            } else {
                DeliveryStep::FocusThenChord
            });
            steps
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome {
    pub attempts: Vec<DeliveryStep>,
    pub delivered_by: Option<DeliveryStep>,
}

pub struct Delivery<'a> {
    pub keyboard: &'a dyn KeyboardSynth,
    pub messenger: &'a dyn WindowMessenger,
    pub focus: &'a dyn FocusService,
    pub focus_settle: Duration,
}

impl Delivery<'_> {
    pub fn attempt(&self, step: DeliveryStep, target: &FocusTarget) -> Result<()> {
        match step {
            DeliveryStep::ConsolePasteCommand => {
                let handle = target
                    .window_handle
                    .ok_or_else(|| anyhow!("console target has no window handle"))?;
                self.messenger
                    .cancellable_send(handle, WM_COMMAND, CONSOLE_PASTE_COMMAND, 0)
            }
            DeliveryStep::PasteMessage => {
                let handle = target
                    .window_handle
                    .ok_or_else(|| anyhow!("target has no window handle"))?;
                self.messenger.cancellable_send(handle, WM_PASTE, 0, 0)
            }
            DeliveryStep::KeyChord(chord) => self.keyboard.send_chord(chord),
            DeliveryStep::FocusThenChord => {
                self.focus.set_focus(target)?;
                thread::sleep(self.focus_settle);
                self.keyboard.send_chord(Chord::Paste)
            }
        }
    }

    /// Walk `steps` in order, stopping at the first success.
    pub fn run(&self, steps: &[DeliveryStep], target: &FocusTarget) -> ChainOutcome {
        let mut attempts = Vec::with_capacity(steps.len());
        for &step in steps {
            attempts.push(step);
            match self.attempt(step, target) {
                Ok(()) => {
                    return ChainOutcome {
                        attempts,
                        delivered_by: Some(step),
                    }
                }
                Err(err) => log::debug!("{} failed: {err:#}", step.label()),
            }
        }
        ChainOutcome {
            attempts,
            delivered_by: None,
        }
    }
}
