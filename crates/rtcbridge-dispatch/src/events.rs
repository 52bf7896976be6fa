// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Relay of asynchronous native events to the event-channel subscriber.
//
// The engine emits from its own callback threads. Events are never handed to
// the subscriber from there: each one is queued onto a single delivery task
// running on the designated runtime, which forwards them in arrival order.
// There is at most one subscriber; anything still queued for a replaced or
// cancelled subscription is dropped.

use std::sync::{Arc, Mutex, PoisonError};

use rtcbridge_core::error::Result;
use rtcbridge_core::types::EngineEvent;
use rtcbridge_native::{NativeEndpoint, NativeEventHandler};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

/// Consumer of relayed events (the event channel's sink).
pub trait EventSink: Send + Sync {
    fn success(&self, event: EngineEvent);
}

struct Subscription {
    id: Uuid,
    sink: Arc<dyn EventSink>,
}

type ActiveSlot = Arc<Mutex<Option<Subscription>>>;

fn sink_for(active: &ActiveSlot, id: Uuid) -> Option<Arc<dyn EventSink>> {
    let guard = active.lock().unwrap_or_else(PoisonError::into_inner);
    guard
        .as_ref()
        .filter(|sub| sub.id == id)
        .map(|sub| Arc::clone(&sub.sink))
}

/// Native-side handler: converts and enqueues, nothing else.
struct QueueingHandler {
    subscription: Uuid,
    queue: mpsc::UnboundedSender<EngineEvent>,
}

impl NativeEventHandler for QueueingHandler {
    fn on_event(&self, event: &str, data: Option<&str>, buffer: Option<&[u8]>) {
        let mut record = EngineEvent::new(event, data.map(str::to_owned));
        if let Some(buffer) = buffer {
            record = record.with_buffer(buffer.to_vec());
        }
        if self.queue.send(record).is_err() {
            trace!(subscription = %self.subscription, event, "delivery task gone; event dropped");
        }
    }
}

/// Owns the single event subscription of a plugin attachment.
pub struct EventRelay {
    endpoint: Arc<dyn NativeEndpoint>,
    delivery: Handle,
    active: ActiveSlot,
}

impl EventRelay {
    /// `delivery` is the runtime every event is forwarded on.
    pub fn new(endpoint: Arc<dyn NativeEndpoint>, delivery: Handle) -> Self {
        Self {
            endpoint,
            delivery,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Start relaying events to `sink`, replacing any previous subscriber.
    #[instrument(skip_all)]
    pub fn listen(&self, sink: Arc<dyn EventSink>) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let (queue, mut pending) = mpsc::unbounded_channel::<EngineEvent>();

        let replaced = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Subscription { id, sink });
        if let Some(previous) = &replaced {
            debug!(previous = %previous.id, "replacing event subscriber");
        }

        let active = Arc::clone(&self.active);
        self.delivery.spawn(async move {
            while let Some(event) = pending.recv().await {
                match sink_for(&active, id) {
                    Some(sink) => sink.success(event),
                    None => trace!(subscription = %id, event = %event.method_name, "subscriber gone; event dropped"),
                }
            }
            debug!(subscription = %id, "delivery task finished");
        });

        let handler = Arc::new(QueueingHandler {
            subscription: id,
            queue,
        });
        if let Err(e) = self.endpoint.set_event_handler(Some(handler)) {
            // The previous handler is still installed; give its events back
            // to the previous subscriber.
            self.restore(id, replaced);
            return Err(e);
        }

        info!(subscription = %id, "event subscriber attached");
        Ok(id)
    }

    /// Stop relaying. Events already queued are dropped.
    #[instrument(skip_all)]
    pub fn cancel(&self) -> Result<()> {
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.endpoint.set_event_handler(None)?;
        match previous {
            Some(sub) => info!(subscription = %sub.id, "event subscriber detached"),
            None => debug!("cancel without subscriber"),
        }
        Ok(())
    }

    pub fn is_listening(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Put `previous` back if subscription `id` is still the active one.
    fn restore(&self, id: Uuid, previous: Option<Subscription>) {
        let mut guard = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.as_ref().is_some_and(|sub| sub.id == id) {
            *guard = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rtcbridge_core::config::ProtocolConfig;
    use rtcbridge_native::recording::RecordingEndpoint;
    use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
    use tokio::time::timeout;

    /// Sink that forwards into a channel and remembers the delivering thread.
    struct ChannelSink {
        tx: UnboundedSender<(EngineEvent, std::thread::ThreadId)>,
    }

    impl EventSink for ChannelSink {
        fn success(&self, event: EngineEvent) {
            let _ = self.tx.send((event, std::thread::current().id()));
        }
    }

    fn sink() -> (
        Arc<ChannelSink>,
        UnboundedReceiver<(EngineEvent, std::thread::ThreadId)>,
    ) {
        let (tx, rx) = unbounded_channel();
        (Arc::new(ChannelSink { tx }), rx)
    }

    fn relay() -> (Arc<RecordingEndpoint>, EventRelay) {
        let endpoint = Arc::new(RecordingEndpoint::new(ProtocolConfig::default()));
        let relay = EventRelay::new(endpoint.clone(), Handle::current());
        (endpoint, relay)
    }

    async fn next(
        rx: &mut UnboundedReceiver<(EngineEvent, std::thread::ThreadId)>,
    ) -> (EngineEvent, std::thread::ThreadId) {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("sink channel closed")
    }

    #[tokio::test]
    async fn events_from_native_thread_are_delivered_on_runtime() {
        let (endpoint, relay) = relay();
        let (sink, mut rx) = sink();
        relay.listen(sink).unwrap();
        assert!(endpoint.has_event_handler());

        let emitter = endpoint.clone();
        let native_thread = std::thread::spawn(move || {
            assert!(emitter.emit("onUserJoined", Some(r#"{"uid":9}"#), None));
            std::thread::current().id()
        })
        .join()
        .unwrap();

        let (event, delivered_on) = next(&mut rx).await;
        assert_eq!(event, EngineEvent::new("onUserJoined", Some(r#"{"uid":9}"#.into())));
        assert_ne!(delivered_on, native_thread);
    }

    #[tokio::test]
    async fn buffer_is_carried() {
        let (endpoint, relay) = relay();
        let (sink, mut rx) = sink();
        relay.listen(sink).unwrap();

        endpoint.emit("onStreamMessage", None, Some(&[1, 2, 3]));
        let (event, _) = next(&mut rx).await;
        assert_eq!(event.buffer, Some(vec![1, 2, 3]));
        assert_eq!(event.data, None);
    }

    #[tokio::test]
    async fn order_is_preserved() {
        let (endpoint, relay) = relay();
        let (sink, mut rx) = sink();
        relay.listen(sink).unwrap();

        let emitter = endpoint.clone();
        std::thread::spawn(move || {
            for i in 0..50 {
                emitter.emit("tick", Some(&i.to_string()), None);
            }
        })
        .join()
        .unwrap();

        for i in 0..50 {
            let (event, _) = next(&mut rx).await;
            assert_eq!(event.data, Some(i.to_string()));
        }
    }

    #[tokio::test]
    async fn cancelled_subscriber_receives_nothing() {
        let (endpoint, relay) = relay();
        let (sink, mut rx) = sink();
        relay.listen(sink).unwrap();
        relay.cancel().unwrap();

        assert!(!relay.is_listening());
        assert!(!endpoint.has_event_handler());
        assert!(!endpoint.emit("onUserOffline", Some("{}"), None));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn in_flight_event_after_cancel_is_swallowed() {
        let (endpoint, relay) = relay();
        let (sink, mut rx) = sink();
        relay.listen(sink).unwrap();

        // The engine still holds the old handler when the event fires.
        let stale = endpoint.event_handler().unwrap();
        relay.cancel().unwrap();
        stale.on_event("onRtcStats", Some("{}"), None);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn new_listen_replaces_previous_subscriber() {
        let (endpoint, relay) = relay();
        let (first, mut first_rx) = sink();
        let (second, mut second_rx) = sink();

        relay.listen(first).unwrap();
        endpoint.emit("a", None, None);
        assert_eq!(next(&mut first_rx).await.0.method_name, "a");

        let stale = endpoint.event_handler().unwrap();
        relay.listen(second).unwrap();
        stale.on_event("stale", None, None);
        endpoint.emit("b", None, None);

        assert_eq!(next(&mut second_rx).await.0.method_name, "b");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(first_rx.try_recv().is_err());
        assert!(second_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_install_keeps_previous_subscriber() {
        let (endpoint, relay) = relay();
        let (first, mut first_rx) = sink();
        let (second, mut second_rx) = sink();

        relay.listen(first).unwrap();
        endpoint.fail_handler_install("engine refused handler");
        assert!(relay.listen(second).is_err());
        assert!(relay.is_listening());

        endpoint.emit("afterFailure", None, None);
        assert_eq!(next(&mut first_rx).await.0.method_name, "afterFailure");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(second_rx.try_recv().is_err());

        relay.cancel().unwrap();
        assert!(!relay.is_listening());
    }
}
