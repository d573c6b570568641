//! Scripted transport for deterministic lifecycle tests.
//!
//! Latency and chunk pacing use `tokio::time::sleep`, so tests running with
//! `start_paused = true` observe exact virtual timings.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use safe_fetch::fetch::transport::{
    BodyStream, Transport, TransportError, TransportRequest, TransportResponse,
};

#[derive(Debug, Clone)]
enum Reply {
    Fail(String),
    Respond {
        status: u16,
        headers: Vec<(String, String)>,
        content_length: Option<u64>,
        chunks: Vec<Bytes>,
        break_after: Option<usize>,
    },
}

#[derive(Debug, Default)]
struct Counters {
    abandoned: AtomicUsize,
    chunks_served: AtomicUsize,
}

/// Counts transfers dropped before they finished.
struct AbandonGuard {
    counters: Arc<Counters>,
    armed: bool,
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if self.armed {
            self.counters.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// A [`Transport`] that replays one scripted reply for every request.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    reply: Reply,
    latency: Duration,
    chunk_interval: Duration,
    requests: Arc<Mutex<Vec<TransportRequest>>>,
    counters: Arc<Counters>,
}

impl ScriptedTransport {
    /// Responds with `status` and `body` in a single chunk.
    pub fn respond(status: u16, body: impl Into<Bytes>) -> Self {
        Self::chunked(status, vec![body.into()])
    }

    /// Responds with `status` and the given body chunks. The declared
    /// content length is the sum of the chunk sizes.
    pub fn chunked(status: u16, chunks: Vec<Bytes>) -> Self {
        let total = chunks.iter().map(|chunk| chunk.len() as u64).sum();
        Self::with_reply(Reply::Respond {
            status,
            headers: Vec::new(),
            content_length: Some(total),
            chunks,
            break_after: None,
        })
    }

    /// Fails before any status line with `message`.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fail(message.into()))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            latency: Duration::ZERO,
            chunk_interval: Duration::ZERO,
            requests: Arc::new(Mutex::new(Vec::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Delays the status line by `latency`.
    pub fn after(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Waits `interval` before each body chunk.
    pub fn chunk_interval(mut self, interval: Duration) -> Self {
        self.chunk_interval = interval;
        self
    }

    /// Drops the declared content length.
    pub fn without_content_length(mut self) -> Self {
        if let Reply::Respond { content_length, .. } = &mut self.reply {
            *content_length = None;
        }
        self
    }

    /// Breaks the body stream after `chunks` chunks have been served.
    pub fn break_after(mut self, chunks: usize) -> Self {
        if let Reply::Respond { break_after, .. } = &mut self.reply {
            *break_after = Some(chunks);
        }
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let Reply::Respond { headers, .. } = &mut self.reply {
            headers.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Number of sends or body streams dropped before they finished.
    pub fn abandoned(&self) -> usize {
        self.counters.abandoned.load(Ordering::SeqCst)
    }

    /// Number of body chunks handed to the client.
    pub fn chunks_served(&self) -> usize {
        self.counters.chunks_served.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        self.requests.lock().expect("requests lock").push(request);
        let mut guard = AbandonGuard {
            counters: Arc::clone(&self.counters),
            armed: true,
        };
        tokio::time::sleep(self.latency).await;
        guard.armed = false;

        match &self.reply {
            Reply::Fail(message) => Err(TransportError::Request(message.clone())),
            Reply::Respond {
                status,
                headers,
                content_length,
                chunks,
                break_after,
            } => Ok(TransportResponse {
                status: *status,
                headers: headers.clone(),
                content_length: *content_length,
                body: body_stream(
                    chunks.clone(),
                    *break_after,
                    self.chunk_interval,
                    Arc::clone(&self.counters),
                ),
            }),
        }
    }
}

fn body_stream(
    chunks: Vec<Bytes>,
    break_after: Option<usize>,
    interval: Duration,
    counters: Arc<Counters>,
) -> BodyStream {
    let mut items: Vec<Result<Bytes, TransportError>> = chunks.into_iter().map(Ok).collect();
    if let Some(served) = break_after {
        items.truncate(served);
        items.push(Err(TransportError::Body(
            "connection reset by peer".to_string(),
        )));
    }
    let guard = AbandonGuard {
        counters: Arc::clone(&counters),
        armed: true,
    };

    stream::unfold(
        (items.into_iter(), guard, counters),
        move |(mut items, mut guard, counters)| async move {
            let Some(item) = items.next() else {
                guard.armed = false;
                return None;
            };
            tokio::time::sleep(interval).await;
            if item.is_ok() {
                counters.chunks_served.fetch_add(1, Ordering::SeqCst);
            }
            Some((item, (items, guard, counters)))
        },
    )
    .boxed()
}
