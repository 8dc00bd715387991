use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use leptos::prelude::*;
use shape_common::ShapeParams;

use crate::error::ShapeError;
use crate::stream::{ListenerId, ShapeStream, StreamEvent, StreamStatus};
use crate::traits::ShapeRow;

/// Reactive view of one shape, as returned by `use_shape`.
pub struct UseShapeReturn<T: Send + Sync + 'static> {
    /// Latest decoded snapshot; `None` until the first `up-to-date`.
    pub data: Signal<Option<Vec<T>>>,
    /// True until the first snapshot arrives, unless the stream stopped.
    pub is_loading: Signal<bool>,
    /// Last stream or decode error.
    pub error: Signal<Option<ShapeError>>,
    /// Stream lifecycle.
    pub status: Signal<StreamStatus>,
}

impl<T: Send + Sync + 'static> Clone for UseShapeReturn<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Send + Sync + 'static> Copy for UseShapeReturn<T> {}

/// Context providing access to the shape client.
///
/// This context is provided by `ShapeProvider` and consumed by hooks like
/// `use_shape`. It owns one [`ShapeStream`] per distinct shape definition,
/// so components asking for the same shape share a single poll loop.
#[derive(Clone)]
pub struct ShapeContext {
    /// Shape endpoint, e.g. `http://localhost:3000/v1/shape`
    url: Arc<str>,
    client: reqwest::Client,
    /// Live streams keyed by `ShapeParams::cache_key`
    streams: Arc<Mutex<HashMap<String, Arc<ShapeStream>>>>,
}

impl ShapeContext {
    /// Create a new ShapeContext.
    ///
    /// This is typically called by `ShapeProvider`, not by user code.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Arc::from(url.into()),
            client: reqwest::Client::new(),
            streams: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn streams(&self) -> MutexGuard<'_, HashMap<String, Arc<ShapeStream>>> {
        self.streams.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of shapes currently followed.
    pub fn stream_count(&self) -> usize {
        self.streams().len()
    }

    /// Get the stream for `params`, creating it if needed.
    ///
    /// Returns the stream and whether it was just created. A new stream is
    /// not started; see [`ShapeContext::stream`].
    fn get_or_create(&self, params: &ShapeParams) -> (Arc<ShapeStream>, bool) {
        let key = params.cache_key();
        let mut streams = self.streams();

        if let Some(stream) = streams.get(&key) {
            if !stream.is_closed() {
                return (stream.clone(), false);
            }
        }

        let stream = Arc::new(ShapeStream::new(
            self.client.clone(),
            self.url.to_string(),
            params.clone(),
        ));
        streams.insert(key, stream.clone());
        (stream, true)
    }

    /// Get the running stream for `params`, starting its poll loop on first use.
    pub fn stream(&self, params: &ShapeParams) -> Arc<ShapeStream> {
        let (stream, created) = self.get_or_create(params);

        if created {
            #[cfg(target_arch = "wasm32")]
            leptos::logging::log!(
                "[ShapeContext] starting stream for '{}' at {}",
                params.cache_key(),
                self.url
            );

            leptos::task::spawn_local(stream.clone().run());
        }

        stream
    }

    /// Subscribe to a shape and decode its snapshots into `T`.
    ///
    /// A listener is registered with the shared stream now and deregistered
    /// when the calling reactive owner is cleaned up (component unmount).
    /// Each snapshot replaces `data` as a whole. If any row of a snapshot
    /// fails to decode, `data` becomes an empty list and `error` holds the
    /// decode error.
    pub fn subscribe_shape<T: ShapeRow>(&self, params: ShapeParams) -> UseShapeReturn<T> {
        let stream = self.stream(&params);

        let data = RwSignal::new(None::<Vec<T>>);
        let error = RwSignal::new(None::<ShapeError>);
        let status = RwSignal::new(stream.status());

        let listener_id = stream.subscribe(Arc::new(move |event: &StreamEvent| match event {
            StreamEvent::Snapshot(snapshot) => match T::decode_snapshot(&snapshot.rows) {
                Ok(rows) => {
                    data.try_set(Some(rows));
                    error.try_update(|err| {
                        if matches!(err, Some(ShapeError::Decode { .. })) {
                            *err = None;
                        }
                    });
                }
                Err(decode_error) => {
                    #[cfg(target_arch = "wasm32")]
                    leptos::logging::warn!(
                        "[ShapeContext] discarding snapshot of {} rows: {}",
                        snapshot.len(),
                        decode_error
                    );

                    data.try_set(Some(Vec::new()));
                    error.try_set(Some(decode_error));
                }
            },
            StreamEvent::Status(new_status) => {
                status.try_set(*new_status);
            }
            StreamEvent::Error(stream_error) => {
                error.try_set(Some(stream_error.clone()));
            }
        }));

        let ctx = self.clone();
        let key = params.cache_key();
        on_cleanup(move || ctx.release(&key, &stream, listener_id));

        let is_loading = Signal::derive(move || {
            data.with(Option::is_none) && !status.get().is_stopped()
        });

        UseShapeReturn {
            data: data.into(),
            is_loading,
            error: error.into(),
            status: status.into(),
        }
    }

    fn release(&self, key: &str, stream: &Arc<ShapeStream>, listener_id: ListenerId) {
        stream.unsubscribe(listener_id);

        if stream.is_closed() {
            let mut streams = self.streams();
            // A newer stream may already sit under this key.
            if streams.get(key).is_some_and(|current| Arc::ptr_eq(current, stream)) {
                streams.remove(key);
            }

            #[cfg(target_arch = "wasm32")]
            leptos::logging::log!("[ShapeContext] stream for '{}' closed", key);
        }
    }

    /// Close every stream. Called when the provider unmounts.
    pub fn close_all(&self) {
        let streams: Vec<_> = self.streams().drain().map(|(_, stream)| stream).collect();
        for stream in streams {
            stream.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ShapeResponse;
    use serde::Deserialize;

    #[derive(Deserialize, Clone, Debug, PartialEq)]
    struct Item {
        id: i64,
    }

    fn up_to_date(value: &str, offset: &str) -> ShapeResponse {
        ShapeResponse {
            status: 200,
            handle: Some("h-1".into()),
            offset: Some(offset.into()),
            schema: Some(r#"{"id":{"type":"int4","pk_index":0}}"#.into()),
            body: format!(
                r#"[
                    {{"key":"1","value":{{"id":"{value}"}},"headers":{{"operation":"update"}}}},
                    {{"headers":{{"control":"up-to-date"}}}}
                ]"#
            ),
            ..ShapeResponse::default()
        }
    }

    #[test]
    fn same_definition_shares_a_stream() {
        let ctx = ShapeContext::new("http://localhost:3000/v1/shape");
        let (a, created_a) = ctx.get_or_create(&ShapeParams::table("todos"));
        let (b, created_b) = ctx.get_or_create(&ShapeParams::table("todos"));
        let (c, created_c) =
            ctx.get_or_create(&ShapeParams::table("todos").with_where("completed = true"));

        assert!(created_a);
        assert!(!created_b);
        assert!(created_c);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(ctx.stream_count(), 2);
        assert_eq!(a.url(), "http://localhost:3000/v1/shape");
    }

    #[test]
    fn closed_stream_is_replaced() {
        let ctx = ShapeContext::new("http://localhost:3000/v1/shape");
        let (first, _) = ctx.get_or_create(&ShapeParams::table("todos"));
        first.close();

        let (second, created) = ctx.get_or_create(&ShapeParams::table("todos"));
        assert!(created);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn release_drops_closed_stream() {
        let ctx = ShapeContext::new("http://localhost:3000/v1/shape");
        let params = ShapeParams::table("todos");
        let (stream, _) = ctx.get_or_create(&params);
        let id = stream.subscribe(Arc::new(|_: &StreamEvent| {}));

        ctx.release(&params.cache_key(), &stream, id);
        assert!(stream.is_closed());
        assert_eq!(ctx.stream_count(), 0);
    }

    #[test]
    fn close_all_stops_everything() {
        let ctx = ShapeContext::new("http://localhost:3000/v1/shape");
        let (a, _) = ctx.get_or_create(&ShapeParams::table("todos"));
        let (b, _) = ctx.get_or_create(&ShapeParams::table("projects"));

        ctx.close_all();
        assert!(a.is_closed());
        assert!(b.is_closed());
        assert_eq!(ctx.stream_count(), 0);
    }

    #[test]
    fn listener_decodes_snapshots_and_tracks_decode_errors() {
        let owner = Owner::new();
        owner.with(|| {
            let ctx = ShapeContext::new("http://localhost:3000/v1/shape");
            let params = ShapeParams::table("items");
            // Registered up front so subscribe_shape finds it and spawns nothing.
            let (stream, created) = ctx.get_or_create(&params);
            assert!(created);

            let items = ctx.subscribe_shape::<Item>(params);
            assert_eq!(stream.listener_count(), 1);
            assert_eq!(items.data.get_untracked(), None);
            assert!(items.is_loading.get_untracked());
            assert_eq!(items.status.get_untracked(), StreamStatus::Idle);

            stream.apply_response(up_to_date("1", "0_1")).unwrap();
            assert_eq!(items.data.get_untracked(), Some(vec![Item { id: 1 }]));
            assert_eq!(items.error.get_untracked(), None);
            assert!(!items.is_loading.get_untracked());
            assert_eq!(items.status.get_untracked(), StreamStatus::Live);

            // Unparseable int4 text stays a string and no longer decodes as i64.
            stream.apply_response(up_to_date("abc", "0_2")).unwrap();
            assert_eq!(items.data.get_untracked(), Some(Vec::new()));
            assert!(matches!(
                items.error.get_untracked(),
                Some(ShapeError::Decode { type_name: "Item", .. })
            ));

            stream.apply_response(up_to_date("1", "0_3")).unwrap();
            assert_eq!(items.data.get_untracked(), Some(vec![Item { id: 1 }]));
            assert_eq!(items.error.get_untracked(), None);
        });
    }

    #[test]
    fn stream_failure_sets_error_and_stops_loading() {
        let owner = Owner::new();
        owner.with(|| {
            let ctx = ShapeContext::new("http://localhost:3000/v1/shape");
            let params = ShapeParams::table("items");
            let (stream, _) = ctx.get_or_create(&params);
            let items = ctx.subscribe_shape::<Item>(params);

            stream.fail(ShapeError::Http { status: 500 });

            assert_eq!(items.status.get_untracked(), StreamStatus::Failed);
            assert_eq!(items.error.get_untracked(), Some(ShapeError::Http { status: 500 }));
            assert_eq!(items.data.get_untracked(), None);
            assert!(!items.is_loading.get_untracked());
        });
    }
}
