//! Incremental, non-blocking loading of command output.
//!
//! Each loading view owns a [`Loader`]. A reader thread pulls lines from the
//! stream and hands them over a channel; the UI thread drains a bounded batch
//! per tick, so a slow command never stalls input handling and every view
//! gets serviced. Dropping the loader kills the command and disconnects the
//! channel, after which nothing more from that stream reaches the view.

use crate::git::{Stream, TemplateError};
use std::io::{self, BufRead, BufReader, Read};
use std::process::Child;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Read error: {0}")]
    Read(#[from] io::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("Nothing to load for the {0} view")]
    NoSource(&'static str),
}

enum LoadEvent {
    Line(String),
    Eof,
    Error(io::Error),
}

/// Outcome of draining a loader
#[derive(Debug)]
pub enum LoadStatus {
    /// More lines may follow
    Pending,
    /// End of stream reached
    Done,
    /// The stream failed; lines read before the failure were delivered
    Failed(io::Error),
}

#[derive(Debug)]
pub struct LoadBatch {
    pub lines: Vec<String>,
    pub status: LoadStatus,
}

pub struct Loader {
    rx: Receiver<LoadEvent>,
    child: Option<Child>,
    started: Instant,
}

impl Loader {
    /// Start pumping `stream` on a reader thread.
    pub fn start(stream: Stream) -> Self {
        let (tx, rx) = mpsc::channel();
        let Stream { reader, child } = stream;
        thread::spawn(move || read_lines(reader, tx));
        Loader {
            rx,
            child,
            started: Instant::now(),
        }
    }

    /// Take at most `max_lines` ready lines without blocking.
    pub fn poll(&mut self, max_lines: usize) -> LoadBatch {
        let mut lines = Vec::new();
        while lines.len() < max_lines {
            match self.rx.try_recv() {
                Ok(LoadEvent::Line(line)) => lines.push(line),
                Ok(LoadEvent::Eof) | Err(TryRecvError::Disconnected) => {
                    self.reap();
                    return LoadBatch { lines, status: LoadStatus::Done };
                }
                Ok(LoadEvent::Error(err)) => {
                    return LoadBatch { lines, status: LoadStatus::Failed(err) };
                }
                Err(TryRecvError::Empty) => break,
            }
        }
        LoadBatch { lines, status: LoadStatus::Pending }
    }

    /// Time since the command was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn reap(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.wait();
        }
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                tracing::debug!(target: "loader", pid = child.id(), "terminating_command");
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("pid", &self.child.as_ref().map(|c| c.id()))
            .field("elapsed", &self.elapsed())
            .finish()
    }
}

/// Reader thread body: forward lines until EOF, an error, or the receiver
/// going away.
fn read_lines(reader: Box<dyn Read + Send>, tx: Sender<LoadEvent>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                let _ = tx.send(LoadEvent::Eof);
                return;
            }
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();
                if tx.send(LoadEvent::Line(line)).is_err() {
                    return;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                let _ = tx.send(LoadEvent::Error(err));
                return;
            }
        }
    }
}
