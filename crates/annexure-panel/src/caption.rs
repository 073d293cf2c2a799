//! Debounced caption persistence.
//!
//! One pending slot per asset. A keystroke replaces the slot's value and
//! restarts its timer; when the timer fires, only the latest value is handed
//! to the [`CaptionSink`]. `flush` cancels every timer, waits for writes
//! that timers already started, and persists all pending values at once.
//!
//! ```text
//!   "a"   ─┐
//!   "ab"  ─┼─ within delay ─▶ slot = Scheduled("abc", timer)
//!   "abc" ─┘
//!                 delay elapses ─▶ sink.persist_caption(id, "abc")
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};

use annexure_types::AssetId;

use crate::error::PanelError;

/// Receives coalesced caption values.
#[async_trait]
pub trait CaptionSink: Send + Sync + 'static {
    async fn persist_caption(&self, id: AssetId, caption: String) -> Result<(), PanelError>;
}

/// Aborts the timer task when dropped, unless disarmed.
#[derive(Debug)]
struct TimerHandle(Option<AbortHandle>);

impl TimerHandle {
    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}

#[derive(Debug)]
struct PendingCaption {
    value: String,
    generation: u64,
    timer: TimerHandle,
}

type PendingMap = Arc<Mutex<HashMap<AssetId, PendingCaption>>>;

/// Outcome of a [`CaptionCoalescer::flush`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub persisted: usize,
    pub failed: usize,
}

impl FlushReport {
    pub fn merge(&mut self, other: FlushReport) {
        self.persisted += other.persisted;
        self.failed += other.failed;
    }
}

/// What a timer task did once its delay elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fired {
    Superseded,
    Persisted,
    Failed,
}

#[derive(Debug)]
pub struct CaptionCoalescer {
    delay: Duration,
    pending: PendingMap,
    generation: AtomicU64,
    /// Timer tasks not yet reaped; a fired one may still be writing.
    timers: Mutex<Vec<JoinHandle<Fired>>>,
}

impl CaptionCoalescer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
            timers: Mutex::new(Vec::new()),
        }
    }

    /// Record a keystroke's value and (re)start the asset's timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<S: CaptionSink>(&self, sink: Weak<S>, id: AssetId, value: String) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.delay;

        // The slot goes in before the timer can look for it.
        let mut pending = self.pending.lock();
        let slots = Arc::clone(&self.pending);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(value) = take_if_current(&slots, id, generation) else {
                return Fired::Superseded;
            };
            let Some(sink) = sink.upgrade() else {
                return Fired::Superseded;
            };
            match sink.persist_caption(id, value).await {
                Ok(()) => Fired::Persisted,
                Err(e) => {
                    tracing::warn!(%id, "caption update failed: {e}");
                    Fired::Failed
                }
            }
        });
        let slot = PendingCaption {
            value,
            generation,
            timer: TimerHandle(Some(task.abort_handle())),
        };
        // Replacing the previous slot drops its timer, which aborts it.
        let previous = pending.insert(id, slot);
        drop(pending);
        drop(previous);

        let mut timers = self.timers.lock();
        timers.retain(|t| !t.is_finished());
        timers.push(task);
    }

    /// The value waiting to be persisted for `id`, if any.
    pub fn pending(&self, id: AssetId) -> Option<String> {
        self.pending.lock().get(&id).map(|p| p.value.clone())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Drop a pending value without persisting it.
    pub fn cancel(&self, id: AssetId) -> Option<String> {
        self.pending.lock().remove(&id).map(|p| p.value.clone())
    }

    /// Cancel all timers and persist every pending value now.
    ///
    /// Writes already started by a fired timer are awaited first, so that
    /// everything typed so far is stored when this returns. Writes run
    /// concurrently; individual failures are counted, not raised.
    pub async fn flush<S: CaptionSink>(&self, sink: &S) -> FlushReport {
        let drained: Vec<(AssetId, String)> = {
            let mut pending = self.pending.lock();
            pending.drain().map(|(id, p)| (id, p.value.clone())).collect()
        };
        let timers = std::mem::take(&mut *self.timers.lock());

        let mut report = FlushReport::default();
        for fired in join_all(timers).await {
            match fired {
                Ok(Fired::Persisted) => report.persisted += 1,
                Ok(Fired::Failed) => report.failed += 1,
                // Aborted timers end with a cancelled JoinError.
                Ok(Fired::Superseded) | Err(_) => {}
            }
        }

        let results = join_all(
            drained
                .into_iter()
                .map(|(id, value)| sink.persist_caption(id, value)),
        )
        .await;
        for result in results {
            match result {
                Ok(()) => report.persisted += 1,
                Err(_) => report.failed += 1,
            }
        }
        report
    }
}

/// Take the slot's value if it still belongs to `generation`.
fn take_if_current(pending: &PendingMap, id: AssetId, generation: u64) -> Option<String> {
    let mut pending = pending.lock();
    if pending.get(&id).map(|p| p.generation) != Some(generation) {
        return None;
    }
    let mut slot = pending.remove(&id)?;
    // This task is the timer; aborting it would cancel the write below.
    slot.timer.disarm();
    Some(std::mem::take(&mut slot.value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(AssetId, String)>>,
        fail_for: Option<AssetId>,
        latency: Duration,
    }

    #[async_trait]
    impl CaptionSink for RecordingSink {
        async fn persist_caption(&self, id: AssetId, caption: String) -> Result<(), PanelError> {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.writes.lock().push((id, caption));
            if self.fail_for == Some(id) {
                return Err(PanelError::UnknownAsset(id));
            }
            Ok(())
        }
    }

    const DELAY: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_coalesce_into_one_write() {
        let sink = Arc::new(RecordingSink::default());
        let coalescer = CaptionCoalescer::new(DELAY);
        let id = AssetId::new(1);

        for text in ["a", "ab", "abc"] {
            coalescer.schedule(Arc::downgrade(&sink), id, text.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(coalescer.pending(id).as_deref(), Some("abc"));
        assert!(sink.writes.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*sink.writes.lock(), vec![(id, "abc".to_string())]);
        assert_eq!(coalescer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_assets_have_independent_timers() {
        let sink = Arc::new(RecordingSink::default());
        let coalescer = CaptionCoalescer::new(DELAY);

        coalescer.schedule(Arc::downgrade(&sink), AssetId::new(1), "one".into());
        tokio::time::sleep(Duration::from_millis(300)).await;
        coalescer.schedule(Arc::downgrade(&sink), AssetId::new(2), "two".into());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(*sink.writes.lock(), vec![(AssetId::new(1), "one".to_string())]);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(sink.writes.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_persists_immediately_and_cancels_timers() {
        let sink = Arc::new(RecordingSink::default());
        let coalescer = CaptionCoalescer::new(DELAY);
        coalescer.schedule(Arc::downgrade(&sink), AssetId::new(1), "x".into());
        coalescer.schedule(Arc::downgrade(&sink), AssetId::new(2), "y".into());

        let report = coalescer.flush(sink.as_ref()).await;
        assert_eq!(report, FlushReport { persisted: 2, failed: 0 });

        // Cancelled timers must not write again.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(sink.writes.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_tolerates_individual_failures() {
        let sink = Arc::new(RecordingSink { fail_for: Some(AssetId::new(2)), ..Default::default() });
        let coalescer = CaptionCoalescer::new(DELAY);
        for raw in 1..=3 {
            coalescer.schedule(Arc::downgrade(&sink), AssetId::new(raw), format!("c{raw}"));
        }
        let report = coalescer.flush(sink.as_ref()).await;
        assert_eq!(report, FlushReport { persisted: 2, failed: 1 });
        assert_eq!(sink.writes.lock().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_value() {
        let sink = Arc::new(RecordingSink::default());
        let coalescer = CaptionCoalescer::new(DELAY);
        coalescer.schedule(Arc::downgrade(&sink), AssetId::new(1), "gone".into());
        assert_eq!(coalescer.cancel(AssetId::new(1)).as_deref(), Some("gone"));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(sink.writes.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_waits_for_write_already_in_flight() {
        let sink = Arc::new(RecordingSink {
            latency: Duration::from_millis(300),
            ..Default::default()
        });
        let coalescer = CaptionCoalescer::new(DELAY);
        coalescer.schedule(Arc::downgrade(&sink), AssetId::new(1), "front".into());

        // Timer fired at 500ms; the write lands at 800ms.
        tokio::time::sleep(Duration::from_millis(550)).await;
        assert_eq!(coalescer.pending_count(), 0);
        assert!(sink.writes.lock().is_empty());

        let report = coalescer.flush(sink.as_ref()).await;
        assert_eq!(report, FlushReport { persisted: 1, failed: 0 });
        assert_eq!(*sink.writes.lock(), vec![(AssetId::new(1), "front".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_value_lands_after_in_flight_one() {
        let sink = Arc::new(RecordingSink {
            latency: Duration::from_millis(300),
            ..Default::default()
        });
        let coalescer = CaptionCoalescer::new(DELAY);
        let id = AssetId::new(1);
        coalescer.schedule(Arc::downgrade(&sink), id, "old".into());
        tokio::time::sleep(Duration::from_millis(550)).await;
        coalescer.schedule(Arc::downgrade(&sink), id, "new".into());

        let report = coalescer.flush(sink.as_ref()).await;
        assert_eq!(report.persisted, 2);
        let writes = sink.writes.lock();
        assert_eq!(writes.last(), Some(&(id, "new".to_string())));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_zero_delay_timer_still_persists() {
        let sink = Arc::new(RecordingSink::default());
        let coalescer = CaptionCoalescer::new(Duration::ZERO);
        for raw in 1..=20 {
            coalescer.schedule(Arc::downgrade(&sink), AssetId::new(raw), format!("c{raw}"));
        }

        let all_written = async {
            while sink.writes.lock().len() < 20 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), all_written)
            .await
            .expect("every zero-delay timer should write");
        assert_eq!(coalescer.pending_count(), 0);
    }
}
