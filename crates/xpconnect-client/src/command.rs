//! Simulator commands and repeat-send loops

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::{ClientError, Result};
use crate::transport::DatagramSink;

/// A simulator command, e.g. `sim/operation/pause_toggle`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    description: Option<String>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ClientError::InvalidArgument(
                "command name is empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&str> for Command {
    fn from(name: &str) -> Self {
        Command::new(name)
    }
}

/// Cancellation handle for a running repeat-send loop
///
/// Each handle owns its own cancellation signal, so loops never affect one
/// another. A loop also ends when the connector that started it stops, and
/// when its handle is dropped.
pub struct CommandHandle {
    command: Command,
    cancel: watch::Sender<bool>,
    task: JoinHandle<Result<u64>>,
}

impl CommandHandle {
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Signal the loop to stop without waiting for it
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait; returns how many datagrams were sent
    pub async fn stop(self) -> Result<u64> {
        self.cancel.send_replace(true);
        self.task
            .await
            .map_err(|e| ClientError::Task(e.to_string()))?
    }
}

/// Spawn a loop sending `datagram` until the handle or `engine` cancels it
///
/// `engine` is the connector's shutdown signal; a closed channel counts as
/// shutdown.
pub(crate) fn spawn_repeat(
    command: Command,
    datagram: Bytes,
    sink: Arc<dyn DatagramSink>,
    interval: Duration,
    engine: watch::Receiver<bool>,
) -> CommandHandle {
    let (cancel, cancelled) = watch::channel(false);
    let name = command.name().to_string();
    let task = tokio::spawn(async move {
        let result = repeat(datagram, sink, interval, cancelled, engine).await;
        match &result {
            Ok(sent) => debug!("command {} stopped after {} sends", name, sent),
            Err(e) => error!("command {} loop failed: {}", name, e),
        }
        result
    });

    CommandHandle {
        command,
        cancel,
        task,
    }
}

// Err from has_changed means the sending side is gone
fn signalled(rx: &watch::Receiver<bool>) -> bool {
    rx.has_changed().is_err() || *rx.borrow()
}

async fn repeat(
    datagram: Bytes,
    sink: Arc<dyn DatagramSink>,
    interval: Duration,
    mut cancelled: watch::Receiver<bool>,
    mut engine: watch::Receiver<bool>,
) -> Result<u64> {
    let mut sent = 0u64;

    while !signalled(&cancelled) && !signalled(&engine) {
        sink.send(datagram.clone()).await?;
        sent += 1;

        if interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::select! {
                changed = cancelled.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = engine.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    Ok(sent)
}
