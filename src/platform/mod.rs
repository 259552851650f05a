use anyhow::Result;

use crate::services::HostServices;

#[cfg(windows)]
mod win32;

#[cfg(windows)]
pub use win32::{EnigoKeyboard, Win32EventPump, Win32Focus, Win32Messenger};

/// Collaborators backed by the running desktop.
pub fn host_services() -> Result<HostServices> {
    #[cfg(windows)]
    {
        use std::sync::Arc;

        use crate::clipboard::SystemClipboard;

        Ok(HostServices {
            clipboard: Arc::new(SystemClipboard),
            focus: Box::new(Win32Focus),
            keyboard: Box::new(EnigoKeyboard),
            messenger: Box::new(Win32Messenger::default()),
            events: Box::new(Win32EventPump),
        })
    }

    #[cfg(not(windows))]
    {
        anyhow::bail!("pasting into the focused control is only supported on Windows")
    }
}
