use crossterm::{
    cursor::{MoveTo, Show},
    execute,
    terminal::{Clear, ClearType},
    tty::IsTty,
};
use std::io::{self, Write};
use std::sync::Once;

static PANIC_HOOK_INSTALLED: Once = Once::new();

pub fn install_panic_hook_once() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = restore();
            original_hook(panic_info);
        }));
    });
}

/// Redraws streaming diff frames in place on a terminal, or appends them
/// when stdout is redirected.
pub struct FramePrinter<W: Write> {
    out: W,
    interactive: bool,
    frames: usize,
}

impl FramePrinter<io::Stdout> {
    pub fn stdout() -> Self {
        let out = io::stdout();
        let interactive = out.is_tty();
        if interactive {
            install_panic_hook_once();
        }
        Self::new(out, interactive)
    }
}

impl<W: Write> FramePrinter<W> {
    pub fn new(out: W, interactive: bool) -> Self {
        Self {
            out,
            interactive,
            frames: 0,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Replace whatever the previous frame drew with `frame`.
    pub fn show(&mut self, frame: &str) -> io::Result<()> {
        if self.interactive {
            execute!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;
        self.frames += 1;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn restore() -> anyhow::Result<()> {
    let _ = execute!(io::stdout(), Show);
    Ok(())
}
