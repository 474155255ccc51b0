//! Async API client for the daybook backend.
//!
//! # Overview
//! Wraps the backend's REST surface (weather, news, thoughts, suggestions,
//! daily records, AI summaries, users) behind `DaybookApi`, one method per
//! endpoint. Every call goes through a single shared transport and a single
//! response interceptor, so configuration and error handling are uniform.
//!
//! # Design
//! - `ApiClient` shapes requests and unwraps responses with no I/O
//!   (`build_*` / `parse_body`), so each endpoint can be checked as data.
//! - `Transport` is the only I/O seam; `ReqwestTransport` is the real one.
//! - `DaybookApi` composes the two and logs each failure once before
//!   returning it unchanged.
//! - The endpoint surface is versioned (`ApiVersion`): v2 only adds
//!   endpoints, so one client covers both deployments.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod transport;
pub mod types;

pub use api::DaybookApi;
pub use client::{encode_component, ApiClient};
pub use config::{ApiVersion, ClientConfig};
pub use error::{ApiError, ConfigError, StoreError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use identity::{
    FileStore, KeyValueStore, MemoryStore, UserIdentity, DEFAULT_USER_ID, USER_ID_KEY,
};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    DailyRecordCreate, DailyRecordUpdate, Pagination, UserCreate, UserId, DEFAULT_NEWS_LIMIT,
};
