use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, watch};

use crate::config::EventsOutConfig;

fn audit_preview(s: &str) -> String {
    const MAX: usize = 120;
    if s.len() <= MAX {
        return s.to_string();
    }
    let end = s
        .char_indices()
        .take_while(|(i, _)| *i < MAX)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let mut out = s[..end].to_string();
    out.push('…');
    out
}

#[derive(Clone)]
pub struct EventsOutTx {
    tx: mpsc::Sender<String>,
    dropped: Arc<AtomicU64>,
    drained: watch::Receiver<bool>,
}

impl EventsOutTx {
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Non-blocking send used from synchronous call sites (audit, history).
    pub fn try_send_line(&self, line: String) {
        if self.tx.try_send(line).is_err() {
            let count = self.dropped.fetch_add(1, Ordering::Relaxed);
            // Log every 100 dropped events to avoid log spam
            if count % 100 == 0 {
                tracing::warn!(
                    target: "sshprobe.events_out",
                    dropped_total = count,
                    "events_out channel full or closed, messages are being dropped"
                );
            }
        }
    }

    /// Drops this handle and waits up to `timeout` for the writer to flush.
    /// Every other clone must already be gone, otherwise this just times out.
    pub async fn finish(self, timeout: Duration) -> bool {
        let EventsOutTx {
            tx, mut drained, ..
        } = self;
        drop(tx);
        let finished = matches!(
            tokio::time::timeout(timeout, drained.wait_for(|done| *done)).await,
            Ok(Ok(_))
        );
        finished
    }

    pub async fn send_line(&self, line: String, drop_when_full: bool) {
        if drop_when_full {
            self.try_send_line(line);
        } else if self.tx.send(line).await.is_err() {
            tracing::debug!(
                target: "sshprobe.events_out",
                "events_out writer closed, send failed"
            );
        }
    }
}

pub async fn start_events_out(cfg: &EventsOutConfig) -> Result<Option<EventsOutTx>, String> {
    if !cfg.enabled {
        tracing::debug!(
            target: "sshprobe.events_out",
            "events_out is disabled in config (enabled=false)"
        );
        return Ok(None);
    }
    if cfg.path.trim().is_empty() {
        tracing::warn!(
            target: "sshprobe.events_out",
            "events_out path is empty in config, no events will be written"
        );
        return Ok(None);
    }

    let mut writer: Box<dyn tokio::io::AsyncWrite + Unpin + Send> = if cfg.path == "stdout:" {
        Box::new(tokio::io::stdout())
    } else {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cfg.path)
            .await
            .map_err(|e| format!("failed to open events_out file {}: {}", cfg.path, e))?;
        Box::new(file)
    };

    tracing::info!(
        target: "sshprobe.events_out",
        path = %cfg.path,
        channel_capacity = cfg.channel_capacity,
        drop_when_full = cfg.drop_when_full,
        "events_out writer started"
    );

    let (tx, mut rx) = mpsc::channel::<String>(cfg.channel_capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    let to_stdout = cfg.path == "stdout:";
    let (drained_tx, drained) = watch::channel(false);

    tokio::spawn(async move {
        let mut write_count = 0usize;
        while let Some(mut line) = rx.recv().await {
            if !line.ends_with('\n') {
                line.push('\n');
            }
            if write_count < 5 {
                tracing::debug!(
                    target: "sshprobe.events_out",
                    count = write_count,
                    bytes = line.len(),
                    preview = %audit_preview(line.trim_end()),
                    "writing line to events_out"
                );
            }
            if writer.write_all(line.as_bytes()).await.is_err() {
                tracing::error!(
                    target: "sshprobe.events_out",
                    "failed to write to events_out, writer task exiting"
                );
                return;
            }
            write_count += 1;
            // Every 10 writes or for stdout, flush immediately
            if (write_count % 10 == 0 || to_stdout) && writer.flush().await.is_err() {
                tracing::error!(
                    target: "sshprobe.events_out",
                    "failed to flush events_out"
                );
                return;
            }
        }

        let _ = writer.flush().await;
        let _ = drained_tx.send(true);
    });

    Ok(Some(EventsOutTx {
        tx,
        dropped,
        drained,
    }))
}
