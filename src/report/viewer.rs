//! Opening a written report with the desktop's default handler.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Something that can display a report file.
#[async_trait]
pub trait Viewer: Send + Sync {
    async fn open(&self, path: &Path) -> io::Result<()>;
}

/// Hands the file to `open` (macOS), `start` (Windows) or `xdg-open`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemViewer;

impl SystemViewer {
    fn command(path: &Path) -> Command {
        let mut command = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(windows) {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", ""]);
            command
        } else {
            Command::new("xdg-open")
        };
        command
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

#[async_trait]
impl Viewer for SystemViewer {
    async fn open(&self, path: &Path) -> io::Result<()> {
        let status = Self::command(path).status().await?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("viewer exited with {}", status)))
        }
    }
}
