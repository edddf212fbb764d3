use anyhow::{anyhow, Result};

/// Write-only sink for the last extracted command
pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard. Opened on first use, so sessions without a display
/// only fail when `cp` is actually used.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            let opened =
                arboard::Clipboard::new().map_err(|e| anyhow!("clipboard unavailable: {}", e))?;
            self.inner = Some(opened);
        }

        self.inner
            .as_mut()
            .ok_or_else(|| anyhow!("clipboard unavailable"))?
            .set_text(text.to_string())
            .map_err(|e| anyhow!("could not write to clipboard: {}", e))
    }
}
