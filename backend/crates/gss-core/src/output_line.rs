use crate::Notifier;

use std::fmt;

use tokio::sync::mpsc;

const OUTPUT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// One line the managed server wrote to stdout or stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub line: String,
}

/// Spawn the task that turns game server output into Debug notifications.
///
/// Advisory only: nothing here feeds back into the supervisor's decisions.
pub fn spawn_output_forwarder(notifier: Notifier) -> mpsc::Sender<OutputLine> {
    let (tx, mut rx) = mpsc::channel::<OutputLine>(OUTPUT_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        while let Some(output) = rx.recv().await {
            notifier.debug(format!("[{}] {}", output.stream, output.line));
        }
    });

    tx
}
