pub mod writer;

use serde::Serialize;

pub use crate::config::EventsOutConfig;
pub use writer::{start_events_out, EventsOutTx};

/// One JSONL line on the event sink.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeEvent<'a, T: Serialize> {
    pub v: u8,
    #[serde(rename = "type")]
    pub event_type: &'a str,
    pub ts: String,
    pub data: &'a T,
}

/// Serializes and queues an event without awaiting. Drops on a full channel.
pub fn emit_event<T: Serialize>(tx: Option<&EventsOutTx>, event_type: &str, data: &T) {
    let Some(tx) = tx else {
        return;
    };
    let ev = ProbeEvent {
        v: 1,
        event_type,
        ts: chrono::Utc::now().to_rfc3339(),
        data,
    };
    match serde_json::to_string(&ev) {
        Ok(line) => tx.try_send_line(line),
        Err(e) => tracing::debug!(
            target: "sshprobe.events_out",
            error = %e,
            "failed to serialize event"
        ),
    }
}
