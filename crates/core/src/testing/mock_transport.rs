//! Scripted HTTP transport for testing.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::provider::{HttpReply, HttpRequest, HttpTransport, ProviderError};

/// A recorded request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// The request that was sent.
    pub request: HttpRequest,
    /// When it was sent (tokio clock, so paused-time tests see virtual time).
    pub at: Instant,
}

type Scripted = Result<HttpReply, ProviderError>;

struct Route {
    fragment: String,
    queue: Vec<Scripted>,
    repeating: Option<Scripted>,
    delay: Duration,
}

#[derive(Default)]
struct State {
    routes: Vec<Route>,
    default: Option<Scripted>,
    recorded: Vec<RecordedRequest>,
}

/// Mock implementation of [`HttpTransport`].
///
/// Replies are matched by URL fragment: the first route whose fragment the
/// request URL contains answers with its next queued reply, then with its
/// repeating reply once the queue is drained. Requests that match nothing
/// get the default reply, or a transient error when no default is set.
///
/// # Example
///
/// ```rust,ignore
/// let transport = MockTransport::new();
/// transport.push("/chat/completions", HttpReply::new(503, "busy"));
/// transport.push("/chat/completions", HttpReply::new(200, body));
///
/// // ... exercise a client ...
///
/// assert_eq!(transport.request_count(), 2);
/// ```
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<State>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("requests", &self.request_count())
            .finish()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_route<F: FnOnce(&mut Route)>(&self, fragment: &str, f: F) {
        let mut state = self.state.lock().unwrap();
        if let Some(route) = state.routes.iter_mut().find(|r| r.fragment == fragment) {
            f(route);
            return;
        }
        let mut route = Route {
            fragment: fragment.to_string(),
            queue: Vec::new(),
            repeating: None,
            delay: Duration::ZERO,
        };
        f(&mut route);
        state.routes.push(route);
    }

    /// Queue a one-shot reply for URLs containing `fragment`.
    pub fn push(&self, fragment: &str, reply: HttpReply) {
        self.with_route(fragment, |r| r.queue.push(Ok(reply)));
    }

    /// Queue a one-shot transport error for URLs containing `fragment`.
    pub fn push_error(&self, fragment: &str, error: ProviderError) {
        self.with_route(fragment, |r| r.queue.push(Err(error)));
    }

    /// Reply used for `fragment` whenever its queue is empty.
    pub fn set_repeating(&self, fragment: &str, reply: HttpReply) {
        self.with_route(fragment, |r| r.repeating = Some(Ok(reply)));
    }

    /// Error used for `fragment` whenever its queue is empty.
    pub fn set_repeating_error(&self, fragment: &str, error: ProviderError) {
        self.with_route(fragment, |r| r.repeating = Some(Err(error)));
    }

    /// Simulated latency for `fragment`.
    pub fn set_delay(&self, fragment: &str, delay: Duration) {
        self.with_route(fragment, |r| r.delay = delay);
    }

    /// Reply for any request no route answers.
    pub fn push_default(&self, reply: HttpReply) {
        self.state.lock().unwrap().default = Some(Ok(reply));
    }

    /// All recorded requests in send order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().recorded.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().recorded.len()
    }

    /// Number of requests whose URL contains `fragment`.
    pub fn count_matching(&self, fragment: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .recorded
            .iter()
            .filter(|r| r.request.url.contains(fragment))
            .count()
    }

    /// Send times of all recorded requests.
    pub fn request_times(&self) -> Vec<Instant> {
        self.state
            .lock()
            .unwrap()
            .recorded
            .iter()
            .map(|r| r.at)
            .collect()
    }

    fn next_reply(&self, request: &HttpRequest) -> (Scripted, Duration) {
        let mut state = self.state.lock().unwrap();
        state.recorded.push(RecordedRequest {
            request: request.clone(),
            at: Instant::now(),
        });

        for route in state.routes.iter_mut() {
            if !request.url.contains(&route.fragment) {
                continue;
            }
            if !route.queue.is_empty() {
                return (route.queue.remove(0), route.delay);
            }
            if let Some(reply) = &route.repeating {
                return (reply.clone(), route.delay);
            }
        }

        let reply = state.default.clone().unwrap_or_else(|| {
            Err(ProviderError::Transient(format!(
                "no scripted reply for {}",
                request.url
            )))
        });
        (reply, Duration::ZERO)
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpReply, ProviderError> {
        let (reply, delay) = self.next_reply(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}
