use anyhow::{Context, Result};

/// Text-only view of the system clipboard.
pub trait ClipboardService: Send + Sync {
    fn read_text(&self) -> Result<String>;
    fn write_text(&self, text: &str) -> Result<()>;
}

/// System clipboard through `arboard`. A fresh handle is opened per call so the
/// clipboard is never held open between a paste and its deferred restoration.
#[derive(Default)]
pub struct SystemClipboard;

impl ClipboardService for SystemClipboard {
    fn read_text(&self) -> Result<String> {
        let mut ctx = arboard::Clipboard::new().context("clipboard init failed")?;
        ctx.get_text().context("clipboard read failed")
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut ctx = arboard::Clipboard::new().context("clipboard init failed")?;
        ctx.set_text(text.to_string())
            .context("clipboard set failed")?;
        Ok(())
    }
}
