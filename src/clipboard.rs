//! Copying the translated command to the system clipboard.

use anyhow::Result;

/// Trait for a clipboard destination, so runs can be tested without a
/// display server.
pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard via `arboard`.
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new()?;

        #[cfg(target_os = "linux")]
        {
            use arboard::SetExtLinux;
            // X11 and Wayland selections vanish with their owner, and `xaw`
            // exits right after copying. Block until a clipboard manager or
            // another client has taken the contents.
            clipboard.set().wait().text(text)?;
        }

        #[cfg(not(target_os = "linux"))]
        clipboard.set_text(text)?;

        Ok(())
    }
}
