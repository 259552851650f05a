use std::{ffi::c_void, mem::size_of, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use windows::Win32::{
    Foundation::{GetLastError, HWND, LPARAM, WPARAM},
    System::Threading::{AttachThreadInput, GetCurrentThreadId},
    UI::{
        Input::KeyboardAndMouse::SetFocus,
        WindowsAndMessaging::{
            DispatchMessageW, GetClassNameW, GetForegroundWindow, GetGUIThreadInfo,
            GetWindowThreadProcessId, PeekMessageW, SendMessageTimeoutW, TranslateMessage,
            GUITHREADINFO, MSG, PM_REMOVE, SMTO_ABORTIFHUNG, SMTO_BLOCK,
        },
    },
};

use crate::{
    model::{Chord, FocusTarget, WindowHandle},
    services::{EventPump, FocusService, KeyboardSynth, WindowMessenger},
};

// Upper bound on messages dispatched by one flush.
const MAX_PUMPED_MESSAGES: usize = 256;

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

fn class_name(window: HWND) -> Option<String> {
    let mut buffer = [0u16; 256];
    let len = unsafe { GetClassNameW(window, &mut buffer) };
    if len <= 0 {
        return None;
    }
    Some(String::from_utf16_lossy(&buffer[..len as usize]))
}

/// Focused control of the foreground thread, falling back to the foreground
/// window itself when the thread reports no focus.
#[derive(Default)]
pub struct Win32Focus;

impl FocusService for Win32Focus {
    fn current_focus_target(&self) -> Result<FocusTarget> {
        let foreground = unsafe { GetForegroundWindow() };
        if foreground.0.is_null() {
            return Ok(FocusTarget::default());
        }

        let thread = unsafe { GetWindowThreadProcessId(foreground, None) };
        let mut info = GUITHREADINFO {
            cbSize: size_of::<GUITHREADINFO>() as u32,
            ..Default::default()
        };
        let focused = match unsafe { GetGUIThreadInfo(thread, &mut info) } {
            Ok(()) if !info.hwndFocus.0.is_null() => info.hwndFocus,
            _ => foreground,
        };

        Ok(FocusTarget {
            window_class_name: class_name(focused),
            window_handle: Some(WindowHandle(focused.0 as isize)),
        })
    }

    fn set_focus(&self, target: &FocusTarget) -> Result<()> {
        let handle = target
            .window_handle
            .ok_or_else(|| anyhow!("focus target has no window handle"))?;
        let window = hwnd(handle);

        // SetFocus only works on windows of the calling thread's input queue.
        let ours = unsafe { GetCurrentThreadId() };
        let theirs = unsafe { GetWindowThreadProcessId(window, None) };
        let attached = theirs != 0 && theirs != ours && unsafe { AttachThreadInput(ours, theirs, true) }.as_bool();

        let result = unsafe { SetFocus(window) };

        if attached {
            let _ = unsafe { AttachThreadInput(ours, theirs, false) };
        }
        result.map(|_| ()).context("SetFocus failed")
    }
}

#[derive(Default)]
pub struct EnigoKeyboard;

impl KeyboardSynth for EnigoKeyboard {
    fn send_chord(&self, chord: Chord) -> Result<()> {
        let mut enigo =
            Enigo::new(&Settings::default()).map_err(|e| anyhow!("failed to init enigo: {e}"))?;
        let (modifier, key) = match chord {
            Chord::Paste => (Key::Control, Key::Unicode('v')),
            Chord::AlternatePaste => (Key::Shift, Key::Insert),
        };

        enigo.key(modifier, Direction::Press)?;
        let clicked = enigo.key(key, Direction::Click);
        // Release the modifier even if the key itself failed.
        let released = enigo.key(modifier, Direction::Release);
        clicked?;
        released?;
        Ok(())
    }
}

pub struct Win32Messenger {
    timeout: Duration,
}

impl Default for Win32Messenger {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
        }
    }
}

impl WindowMessenger for Win32Messenger {
    fn cancellable_send(
        &self,
        handle: WindowHandle,
        message: u32,
        wparam: usize,
        lparam: isize,
    ) -> Result<()> {
        let mut reply = 0usize;
        let sent = unsafe {
            SendMessageTimeoutW(
                hwnd(handle),
                message,
                WPARAM(wparam),
                LPARAM(lparam),
                SMTO_ABORTIFHUNG | SMTO_BLOCK,
                self.timeout.as_millis() as u32,
                Some(&mut reply),
            )
        };
        if sent.0 == 0 {
            let code = unsafe { GetLastError() };
            bail!(
                "message {message:#x} to window {:#x} was not delivered ({code:?})",
                handle.0
            );
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct Win32EventPump;

impl EventPump for Win32EventPump {
    fn process_pending_events(&self) {
        let mut msg = MSG::default();
        for _ in 0..MAX_PUMPED_MESSAGES {
            let got = unsafe { PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE) };
            if !got.as_bool() {
                break;
            }
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}
