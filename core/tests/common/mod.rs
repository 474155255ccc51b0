//! Shared fixtures for the facade tests: a scripted transport and a
//! `tracing` layer that records emitted events.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use daybook_core::{
    ApiClient, ApiVersion, DaybookApi, HttpMethod, HttpRequest, HttpResponse, MemoryStore,
    Transport, TransportError,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

pub const BASE_URL: &str = "http://localhost:8000";

enum Outcome {
    Respond { status: u16, body: String },
    Fail(TransportError),
}

struct Route {
    method: HttpMethod,
    path: String,
    delay: Duration,
    outcome: Outcome,
}

/// Transport answering from a fixed table keyed by method and full URL.
/// Unknown requests get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Vec<Route>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, method: HttpMethod, path: &str, status: u16, body: &str) -> Self {
        self.respond_after(method, path, status, body, Duration::ZERO)
    }

    pub fn respond_after(
        mut self,
        method: HttpMethod,
        path: &str,
        status: u16,
        body: &str,
        delay: Duration,
    ) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            delay,
            outcome: Outcome::Respond {
                status,
                body: body.to_string(),
            },
        });
        self
    }

    pub fn fail(mut self, method: HttpMethod, path: &str, err: TransportError) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            delay: Duration::ZERO,
            outcome: Outcome::Fail(err),
        });
        self
    }

    pub fn seen(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        let Some(route) = self
            .routes
            .iter()
            .find(|r| r.method == request.method && r.path == request.path)
        else {
            return Ok(HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: format!(r#"{{"detail":"no route for {}"}}"#, request.path),
            });
        };
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }
        match &route.outcome {
            Outcome::Respond { status, body } => Ok(HttpResponse {
                status: *status,
                headers: Vec::new(),
                body: body.clone(),
            }),
            Outcome::Fail(err) => Err(err.clone()),
        }
    }
}

pub fn url(path: &str) -> String {
    format!("{BASE_URL}{path}")
}

pub fn facade(transport: Arc<ScriptedTransport>) -> DaybookApi {
    facade_with(BASE_URL, ApiVersion::V2, transport, MemoryStore::new())
}

pub fn facade_with(
    base_url: &str,
    version: ApiVersion,
    transport: Arc<ScriptedTransport>,
    store: MemoryStore,
) -> DaybookApi {
    DaybookApi::new(
        ApiClient::with_version(base_url, version),
        transport,
        Arc::new(store),
    )
}

// ---------------------------------------------------------------------------
// Event capture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Default)]
struct FieldVisitor(BTreeMap<String, String>);

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<CapturedEvent>>>);

impl EventLog {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level == Level::ERROR)
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for EventLog {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.0.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            fields: visitor.0,
        });
    }
}

/// Install a capturing subscriber for the current thread. Pair with a
/// current-thread tokio runtime so every poll lands on this thread.
pub fn capture_events() -> (EventLog, tracing::subscriber::DefaultGuard) {
    let log = EventLog::default();
    let subscriber = tracing_subscriber::registry().with(log.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (log, guard)
}
