use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::core::time::{format_primitive, primitive_now_utc};

const ERROR_RING_CAPACITY: usize = 10;
const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ErrorNotice {
    pub(crate) message: String,
    pub(crate) at: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StatsSnapshot {
    pub(crate) uptime_seconds: u64,
    pub(crate) started_students: i64,
    pub(crate) ledger_rows: i64,
    pub(crate) db_pool_size: u32,
    pub(crate) db_idle_connections: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum AdminEvent {
    Error(ErrorNotice),
    Stats(StatsSnapshot),
}

/// Fan-out point for admin observers: keeps the last few error notices for
/// the overview page and pushes live events to long-poll subscribers.
#[derive(Clone)]
pub(crate) struct EventHub {
    inner: Arc<EventHubInner>,
}

struct EventHubInner {
    recent_errors: Mutex<VecDeque<ErrorNotice>>,
    sender: broadcast::Sender<AdminEvent>,
}

impl EventHub {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(EventHubInner {
                recent_errors: Mutex::new(VecDeque::with_capacity(ERROR_RING_CAPACITY)),
                sender,
            }),
        }
    }

    pub(crate) fn record_error(&self, message: impl Into<String>) {
        let notice =
            ErrorNotice { message: message.into(), at: format_primitive(primitive_now_utc()) };

        if let Ok(mut ring) = self.inner.recent_errors.lock() {
            if ring.len() == ERROR_RING_CAPACITY {
                ring.pop_front();
            }
            ring.push_back(notice.clone());
        }

        // No receivers is fine; the overview page still shows the ring.
        let _ = self.inner.sender.send(AdminEvent::Error(notice));
    }

    pub(crate) fn recent_errors(&self) -> Vec<ErrorNotice> {
        self.inner
            .recent_errors
            .lock()
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn clear_errors(&self) {
        if let Ok(mut ring) = self.inner.recent_errors.lock() {
            ring.clear();
        }
    }

    pub(crate) fn publish_stats(&self, snapshot: StatsSnapshot) {
        let _ = self.inner.sender.send(AdminEvent::Stats(snapshot));
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<AdminEvent> {
        self.inner.sender.subscribe()
    }
}
