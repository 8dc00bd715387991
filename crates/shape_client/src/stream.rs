use std::sync::{Arc, Mutex, MutexGuard};

use shape_common::messages::OFFSET_HEADER;
use shape_common::{
    Offset, Schema, ShapeHandle, ShapeLog, ShapeMessage, ShapeParams, ShapeRequest, ShapeSnapshot,
};

use crate::error::ShapeError;
use crate::transport::{ShapeResponse, fetch_shape};

/// Lifecycle of a [`ShapeStream`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamStatus {
    /// Created, no request issued yet.
    #[default]
    Idle,
    /// Reading the existing log; no snapshot published for the current handle.
    Syncing,
    /// Caught up and long-polling for changes.
    Live,
    /// Stopped after an error. Published snapshots stay valid.
    Failed,
    /// Stopped because nobody listens any more.
    Closed,
}

impl StreamStatus {
    pub fn is_stopped(self) -> bool {
        matches!(self, StreamStatus::Failed | StreamStatus::Closed)
    }
}

/// Notification delivered to stream listeners.
#[derive(Clone, Debug)]
pub enum StreamEvent {
    Snapshot(Arc<ShapeSnapshot>),
    Status(StreamStatus),
    Error(ShapeError),
}

/// Callback registered with [`ShapeStream::subscribe`].
pub type Listener = Arc<dyn Fn(&StreamEvent) + Send + Sync>;

/// Identifies a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    fn add(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    fn snapshot(&self) -> Vec<Listener> {
        self.entries.iter().map(|(_, listener)| listener.clone()).collect()
    }
}

#[derive(Default)]
struct StreamState {
    log: ShapeLog,
    request: ShapeRequest,
    status: StreamStatus,
    snapshot: Option<Arc<ShapeSnapshot>>,
    last_error: Option<ShapeError>,
    listeners: Listeners,
}

/// One followed shape.
///
/// The stream owns the materialized log and a set of listeners. [`run`]
/// polls the endpoint until the stream is closed or fails; every time the
/// log reaches `up-to-date`, a fresh [`ShapeSnapshot`] replaces the previous
/// one and is pushed to all listeners.
///
/// [`run`]: ShapeStream::run
pub struct ShapeStream {
    url: String,
    params: ShapeParams,
    client: reqwest::Client,
    state: Mutex<StreamState>,
}

impl ShapeStream {
    pub fn new(client: reqwest::Client, url: impl Into<String>, params: ShapeParams) -> Self {
        Self {
            url: url.into(),
            params,
            client,
            state: Mutex::new(StreamState::default()),
        }
    }

    pub fn params(&self) -> &ShapeParams {
        &self.params
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn lock(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> StreamStatus {
        self.lock().status
    }

    pub fn snapshot(&self) -> Option<Arc<ShapeSnapshot>> {
        self.lock().snapshot.clone()
    }

    pub fn last_error(&self) -> Option<ShapeError> {
        self.lock().last_error.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.entries.len()
    }

    pub fn is_closed(&self) -> bool {
        self.status() == StreamStatus::Closed
    }

    /// Register a listener.
    ///
    /// The listener is immediately told the current status, and receives the
    /// current snapshot and error if there are any.
    pub fn subscribe(&self, listener: Listener) -> ListenerId {
        let (id, status, snapshot, last_error) = {
            let mut state = self.lock();
            let id = state.listeners.add(listener.clone());
            (id, state.status, state.snapshot.clone(), state.last_error.clone())
        };

        listener(&StreamEvent::Status(status));
        if let Some(snapshot) = snapshot {
            listener(&StreamEvent::Snapshot(snapshot));
        }
        if let Some(error) = last_error {
            listener(&StreamEvent::Error(error));
        }

        id
    }

    /// Deregister a listener. Returns whether it was registered.
    ///
    /// Removing the last listener closes the stream.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let (removed, now_empty) = {
            let mut state = self.lock();
            let removed = state.listeners.remove(id);
            (removed, state.listeners.entries.is_empty())
        };

        if removed && now_empty {
            self.close();
        }
        removed
    }

    /// Stop polling and drop all listeners.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.status != StreamStatus::Closed {
            state.status = StreamStatus::Closed;
            state.listeners = Listeners::default();
        }
    }

    fn emit(&self, event: StreamEvent) {
        let listeners = self.lock().listeners.snapshot();
        for listener in listeners {
            listener(&event);
        }
    }

    fn set_status(&self, status: StreamStatus) {
        let changed = {
            let mut state = self.lock();
            if state.status == StreamStatus::Closed || state.status == status {
                false
            } else {
                state.status = status;
                true
            }
        };

        if changed {
            self.emit(StreamEvent::Status(status));
        }
    }

    pub(crate) fn fail(&self, error: ShapeError) {
        #[cfg(target_arch = "wasm32")]
        leptos::logging::warn!("[shape] {} stream stopped: {}", self.params.table, error);

        self.lock().last_error = Some(error.clone());
        self.set_status(StreamStatus::Failed);
        self.emit(StreamEvent::Error(error));
    }

    /// Poll the endpoint until the stream is closed or a request fails.
    ///
    /// Failures are not retried: the error is recorded, listeners are told,
    /// and the loop ends.
    pub async fn run(self: Arc<Self>) {
        self.set_status(StreamStatus::Syncing);

        loop {
            if self.status().is_stopped() {
                break;
            }

            let request = self.lock().request.clone();
            let result = fetch_shape(&self.client, &self.url, &self.params, &request).await;

            // Closed while the request was in flight.
            if self.status().is_stopped() {
                break;
            }

            if let Err(error) = result.and_then(|response| self.apply_response(response)) {
                self.fail(error);
                break;
            }
        }

        #[cfg(target_arch = "wasm32")]
        leptos::logging::log!("[shape] {} stream loop ended ({:?})", self.params.table, self.status());
    }

    /// Fold one response into the stream state and notify listeners.
    pub fn apply_response(&self, response: ShapeResponse) -> Result<(), ShapeError> {
        match response.status {
            200 => self.apply_log(response),
            // Live request timed out without changes.
            204 => {
                let mut state = self.lock();
                if let Some(cursor) = response.cursor {
                    state.request.cursor = Some(cursor);
                }
                Ok(())
            }
            409 => {
                self.restart(response.handle.map(ShapeHandle::new));
                Ok(())
            }
            status => Err(ShapeError::Http { status }),
        }
    }

    fn restart(&self, handle: Option<ShapeHandle>) {
        {
            let mut state = self.lock();
            state.log.reset();
            state.request.restart(handle);
        }
        self.set_status(StreamStatus::Syncing);
    }

    fn apply_log(&self, response: ShapeResponse) -> Result<(), ShapeError> {
        let messages = ShapeMessage::parse_batch(&response.body)?;
        let schema = match &response.schema {
            Some(raw) => Some(Schema::from_header(raw)?),
            None => None,
        };

        let outcome = {
            let mut state = self.lock();

            if let Some(schema) = schema {
                if state.log.schema().is_empty() {
                    state.log.set_schema(schema);
                }
            }

            let applied = state.log.apply(messages);
            if applied.must_refetch {
                LogOutcome::Refetch
            } else {
                let offset = response.offset.ok_or_else(|| ShapeError::MalformedHeader {
                    header: OFFSET_HEADER,
                    message: "missing from a 200 response".to_string(),
                })?;
                state.request.offset = Offset::new(offset);
                if let Some(handle) = response.handle {
                    state.request.handle = Some(ShapeHandle::new(handle));
                }
                if let Some(cursor) = response.cursor {
                    state.request.cursor = Some(cursor);
                }

                if applied.up_to_date || response.up_to_date {
                    state.request.live = true;
                    let snapshot = Arc::new(
                        state
                            .log
                            .snapshot(state.request.handle.clone(), state.request.offset.clone()),
                    );
                    state.snapshot = Some(snapshot.clone());
                    LogOutcome::Published(snapshot)
                } else {
                    LogOutcome::Pending
                }
            }
        };

        match outcome {
            LogOutcome::Published(snapshot) => {
                self.set_status(StreamStatus::Live);
                self.emit(StreamEvent::Snapshot(snapshot));
            }
            LogOutcome::Refetch => self.restart(None),
            LogOutcome::Pending => {}
        }
        Ok(())
    }
}

enum LogOutcome {
    Published(Arc<ShapeSnapshot>),
    Pending,
    Refetch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stream() -> ShapeStream {
        ShapeStream::new(
            reqwest::Client::new(),
            "http://localhost:3000/v1/shape",
            ShapeParams::table("todos"),
        )
    }

    fn recorder() -> (Listener, Arc<Mutex<Vec<StreamEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let listener: Listener = Arc::new(move |event: &StreamEvent| {
            sink.lock().unwrap().push(event.clone());
        });
        (listener, events)
    }

    fn snapshots(events: &Arc<Mutex<Vec<StreamEvent>>>) -> Vec<Arc<ShapeSnapshot>> {
        events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                StreamEvent::Snapshot(snapshot) => Some(snapshot.clone()),
                _ => None,
            })
            .collect()
    }

    fn ok(body: &str, offset: &str) -> ShapeResponse {
        ShapeResponse {
            status: 200,
            handle: Some("h-1".into()),
            offset: Some(offset.into()),
            schema: Some(
                r#"{"id":{"type":"int4","pk_index":0},"task":{"type":"text"},"completed":{"type":"bool"}}"#
                    .into(),
            ),
            cursor: None,
            up_to_date: false,
            body: body.into(),
        }
    }

    const INITIAL: &str = r#"[
        {"key":"1","value":{"id":"1","task":"Buy milk","completed":"f"},"headers":{"operation":"insert"}},
        {"headers":{"control":"up-to-date"}}
    ]"#;

    #[test]
    fn subscribe_reports_current_status() {
        let stream = stream();
        let (listener, events) = recorder();
        let id = stream.subscribe(listener);

        assert_eq!(stream.listener_count(), 1);
        assert!(matches!(
            events.lock().unwrap()[0],
            StreamEvent::Status(StreamStatus::Idle)
        ));
        assert!(stream.unsubscribe(id));
    }

    #[test]
    fn publishes_snapshot_at_up_to_date() {
        let stream = stream();
        let (listener, events) = recorder();
        stream.subscribe(listener);

        stream
            .apply_response(ok(
                r#"[{"key":"1","value":{"id":"1","task":"Buy milk","completed":"f"},"headers":{"operation":"insert"}}]"#,
                "0_1",
            ))
            .unwrap();
        assert!(snapshots(&events).is_empty());
        assert!(stream.snapshot().is_none());

        stream
            .apply_response(ok(r#"[{"headers":{"control":"up-to-date"}}]"#, "0_2"))
            .unwrap();

        let published = snapshots(&events);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].rows[0]["id"], json!(1));
        assert_eq!(published[0].rows[0]["completed"], json!(false));
        assert_eq!(stream.status(), StreamStatus::Live);

        let request = stream.lock().request.clone();
        assert!(request.live);
        assert_eq!(request.offset.as_str(), "0_2");
        assert_eq!(request.handle, Some(ShapeHandle::new("h-1")));
    }

    #[test]
    fn update_replaces_snapshot_without_duplicates() {
        let stream = stream();
        let (listener, events) = recorder();
        stream.subscribe(listener);

        stream.apply_response(ok(INITIAL, "0_1")).unwrap();
        stream
            .apply_response(ok(
                r#"[
                    {"key":"1","value":{"id":"1","completed":"t"},"headers":{"operation":"update"}},
                    {"headers":{"control":"up-to-date"}}
                ]"#,
                "0_2",
            ))
            .unwrap();

        let published = snapshots(&events);
        assert_eq!(published.len(), 2);
        assert_eq!(published[1].len(), 1);
        assert_eq!(published[1].rows[0]["completed"], json!(true));
        assert_eq!(published[1].rows[0]["task"], json!("Buy milk"));
    }

    #[test]
    fn late_subscriber_gets_current_snapshot() {
        let stream = stream();
        stream.apply_response(ok(INITIAL, "0_1")).unwrap();

        let (listener, events) = recorder();
        stream.subscribe(listener);
        assert_eq!(snapshots(&events).len(), 1);
    }

    #[test]
    fn conflict_restarts_from_beginning() {
        let stream = stream();
        stream.apply_response(ok(INITIAL, "0_1")).unwrap();

        stream
            .apply_response(ShapeResponse {
                status: 409,
                handle: Some("h-2".into()),
                body: r#"[{"headers":{"control":"must-refetch"}}]"#.into(),
                ..ShapeResponse::default()
            })
            .unwrap();

        let request = stream.lock().request.clone();
        assert!(request.offset.is_before_all());
        assert!(!request.live);
        assert_eq!(request.handle, Some(ShapeHandle::new("h-2")));
        assert!(stream.lock().log.is_empty());
        assert_eq!(stream.status(), StreamStatus::Syncing);
        // The last published snapshot stays until the next up-to-date.
        assert!(stream.snapshot().is_some());
    }

    #[test]
    fn timed_out_live_poll_keeps_position() {
        let stream = stream();
        stream.apply_response(ok(INITIAL, "0_1")).unwrap();
        stream
            .apply_response(ShapeResponse {
                status: 204,
                cursor: Some("77".into()),
                ..ShapeResponse::default()
            })
            .unwrap();

        let request = stream.lock().request.clone();
        assert_eq!(request.offset.as_str(), "0_1");
        assert_eq!(request.cursor.as_deref(), Some("77"));
    }

    #[test]
    fn server_error_is_reported() {
        let stream = stream();
        let result = stream.apply_response(ShapeResponse {
            status: 500,
            ..ShapeResponse::default()
        });
        assert_eq!(result, Err(ShapeError::Http { status: 500 }));
    }

    #[test]
    fn malformed_body_and_missing_offset_are_errors() {
        let stream = stream();
        assert!(matches!(
            stream.apply_response(ok("{not json", "0_1")),
            Err(ShapeError::MalformedBody { .. })
        ));

        let mut response = ok(INITIAL, "0_1");
        response.offset = None;
        assert!(matches!(
            stream.apply_response(response),
            Err(ShapeError::MalformedHeader { header: "electric-offset", .. })
        ));
    }

    #[test]
    fn fail_keeps_snapshot_and_notifies() {
        let stream = stream();
        stream.apply_response(ok(INITIAL, "0_1")).unwrap();

        let (listener, events) = recorder();
        stream.subscribe(listener);
        stream.fail(ShapeError::Http { status: 500 });

        assert_eq!(stream.status(), StreamStatus::Failed);
        assert_eq!(stream.last_error(), Some(ShapeError::Http { status: 500 }));
        assert!(stream.snapshot().is_some());
        assert!(events
            .lock()
            .unwrap()
            .iter()
            .any(|event| matches!(event, StreamEvent::Error(ShapeError::Http { status: 500 }))));
    }

    #[test]
    fn last_unsubscribe_closes_stream() {
        let stream = stream();
        let (first, _) = recorder();
        let (second, second_events) = recorder();
        let a = stream.subscribe(first);
        let b = stream.subscribe(second);

        assert!(stream.unsubscribe(a));
        assert!(!stream.is_closed());
        assert!(!stream.unsubscribe(a));

        assert!(stream.unsubscribe(b));
        assert!(stream.is_closed());

        // Closed streams deliver nothing further.
        let before = second_events.lock().unwrap().len();
        stream.apply_response(ok(INITIAL, "0_9")).unwrap();
        assert_eq!(second_events.lock().unwrap().len(), before);
    }
}
