//! Progress sinks
//!
//! [`verity_core::ProgressSink`] implementations that need a runtime:
//! forwarding into a channel, logging, and fanning out to several sinks.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use verity_core::{ProgressSink, ProgressUpdate};

/// Forwards updates into an unbounded channel; a closed receiver is ignored
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressUpdate>) -> Self {
        Self { tx }
    }

    /// A sink and the receiver it feeds
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, update: ProgressUpdate) {
        let _ = self.tx.send(update);
    }
}

/// Logs each update at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, update: ProgressUpdate) {
        info!(session = ?update.session_id, "{}", update.describe());
    }
}

/// Sends every update to each inner sink, in order
#[derive(Clone, Default)]
pub struct Tee {
    sinks: Vec<Arc<dyn ProgressSink>>,
}

impl Tee {
    pub fn new(sinks: Vec<Arc<dyn ProgressSink>>) -> Self {
        Self { sinks }
    }
}

impl ProgressSink for Tee {
    fn emit(&self, update: ProgressUpdate) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.emit(update.clone());
            }
            last.emit(update);
        }
    }
}
