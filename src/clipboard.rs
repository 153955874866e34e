//! Copying the snapshot to the system clipboard
//!
//! There is no clipboard library in the dependency tree; the platform's own
//! command-line tool is located with `which` and fed through stdin.

use anyhow::{Context, Result, anyhow, bail};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Somewhere a finished snapshot can be handed to the user
pub trait ClipboardSink {
    fn copy(&self, text: &str) -> Result<()>;
}

/// Clipboard tools in preference order, with their arguments
const CANDIDATES: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip", &[]),
];

/// The first clipboard tool found on `PATH`
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    program: PathBuf,
    args: &'static [&'static str],
}

impl SystemClipboard {
    /// `None` when no supported tool is installed
    #[must_use]
    pub fn detect() -> Option<Self> {
        CANDIDATES.iter().find_map(|(name, args)| {
            which::which(name).ok().map(|program| {
                debug!("Using clipboard tool {}", program.display());
                Self {
                    program,
                    args: *args,
                }
            })
        })
    }
}

impl ClipboardSink for SystemClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program.display()))?;

        let written = match child.stdin.take() {
            Some(mut stdin) => stdin
                .write_all(text.as_bytes())
                .context("Failed to write to clipboard tool"),
            None => Err(anyhow!("Clipboard tool stdin unavailable")),
        };
        if let Err(e) = written {
            // Reap the child before reporting.
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }

        let status = child.wait().context("Clipboard tool did not finish")?;
        if !status.success() {
            bail!("{} exited with {status}", self.program.display());
        }
        Ok(())
    }
}
