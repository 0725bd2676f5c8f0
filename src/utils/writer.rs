use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, Stdout};

#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use tokio::sync::Mutex as TokioMutex;

/// Line-oriented sink for outgoing JSON-RPC messages.
#[async_trait]
pub trait MessageWriter: Send + Sync {
    /// Writes one message followed by a newline and flushes.
    async fn write_message(&mut self, message: &str) -> Result<()>;
}

pub struct StdoutWriter {
    stdout: Stdout,
}

impl StdoutWriter {
    pub fn new(stdout: Stdout) -> Self {
        Self { stdout }
    }
}

#[async_trait]
impl MessageWriter for StdoutWriter {
    async fn write_message(&mut self, message: &str) -> Result<()> {
        self.stdout.write_all(message.as_bytes()).await?;
        self.stdout.write_all(b"\n").await?;
        self.stdout.flush().await?;
        Ok(())
    }
}

/// Collects messages in memory so tests can inspect them.
#[cfg(test)]
pub struct MockWriter {
    pub messages: Arc<TokioMutex<Vec<String>>>,
}

#[cfg(test)]
impl MockWriter {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(TokioMutex::new(Vec::new())),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl MessageWriter for MockWriter {
    async fn write_message(&mut self, message: &str) -> Result<()> {
        self.messages.lock().await.push(message.to_string());
        Ok(())
    }
}
