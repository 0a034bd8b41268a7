use crate::core::{AppMessage, DeviceBridge, SendReceipt, Trigger};
use crate::utils::error::SendError;
use chrono::Utc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};

/// Writes each outbound message as one JSON line to the host's channel to the watch.
pub struct JsonLinesBridge<W: AsyncWrite + Unpin + Send> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesBridge<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesBridge<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> DeviceBridge for JsonLinesBridge<W> {
    async fn send_app_message(&self, message: &AppMessage) -> Result<SendReceipt, SendError> {
        let mut line =
            serde_json::to_string(message).map_err(|e| SendError::Rejected(e.to_string()))?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        let written = match writer.write_all(line.as_bytes()).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => Ok(SendReceipt {
                delivered_at: Utc::now(),
                bytes: line.len(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Err(SendError::Disconnected),
            Err(e) => Err(SendError::Io(e)),
        }
    }
}

/// Reads inbound device messages, one JSON line each, as relay triggers.
pub struct JsonLinesInbox<R: AsyncBufRead + Unpin> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> JsonLinesInbox<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Next app-message trigger, or `None` once the input is exhausted.
    /// Payloads that are not JSON are kept as plain strings; invalid UTF-8
    /// is replaced rather than rejected.
    pub async fn next_trigger(&mut self) -> std::io::Result<Option<Trigger>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            let text = String::from_utf8_lossy(&self.buf);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }
            let payload = serde_json::from_str(line)
                .unwrap_or_else(|_| serde_json::Value::String(line.to_string()));
            return Ok(Some(Trigger::AppMessage(payload)));
        }
    }

    /// Forwards triggers until the input ends or the receiver is gone.
    pub async fn forward(mut self, tx: mpsc::Sender<Trigger>) -> std::io::Result<usize> {
        let mut forwarded = 0;
        while let Some(trigger) = self.next_trigger().await? {
            if tx.send(trigger).await.is_err() {
                break;
            }
            forwarded += 1;
        }
        Ok(forwarded)
    }
}

impl JsonLinesInbox<tokio::io::BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::BufReader::new(tokio::io::stdin()))
    }
}

/// Sends an app-message trigger once per `period`, the way the watch asks for
/// a fresh poem on its own. The first tick is skipped since the ready trigger
/// already starts a cycle. Returns the number of triggers sent once the
/// receiver is gone.
pub async fn schedule_refresh(period: Duration, tx: mpsc::Sender<Trigger>) -> usize {
    let mut interval = tokio::time::interval(period);
    interval.tick().await;

    let mut sent = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tx.closed() => break,
        }
        tracing::debug!("Scheduled poem refresh");
        if tx
            .send(Trigger::AppMessage(serde_json::Value::Null))
            .await
            .is_err()
        {
            break;
        }
        sent += 1;
    }
    sent
}
