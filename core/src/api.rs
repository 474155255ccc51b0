//! `DaybookApi`: the facade every caller goes through.
//!
//! # Design
//! One `ApiClient` (request shaping), one `Transport` (I/O) and one
//! `KeyValueStore` (local identity) are injected at construction and shared
//! by every wrapper. Each wrapper is a single request/response exchange:
//! build, execute, unwrap. Failures of any kind are logged once through
//! `tracing` and returned unchanged; nothing is retried or swallowed.
//!
//! The facade is cheap to clone and holds no mutable state, so independent
//! calls may run concurrently on the same instance.

use std::sync::Arc;

use serde_json::Value;

use crate::client::ApiClient;
use crate::config::{ApiVersion, ClientConfig};
use crate::error::{ApiError, StoreError};
use crate::http::{HttpRequest, HttpResponse};
use crate::identity::{self, FileStore, KeyValueStore, UserIdentity};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    DailyRecordCreate, DailyRecordUpdate, Pagination, UserCreate, UserId, DEFAULT_NEWS_LIMIT,
};

const GENERIC_DIAGNOSTIC: &str = "API error";

/// How much of a successful response the caller gets back.
#[derive(Debug, Clone, Copy)]
enum Unwrap {
    Body,
    /// The body's `data` field.
    NestedData,
}

#[derive(Clone)]
pub struct DaybookApi {
    client: ApiClient,
    transport: Arc<dyn Transport>,
    store: Arc<dyn KeyValueStore>,
}

impl DaybookApi {
    pub fn new(
        client: ApiClient,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            client,
            transport,
            store,
        }
    }

    /// Build the production facade: a `reqwest` transport with the configured
    /// timeout and a file-backed store. The configuration is validated first,
    /// so a zero timeout or a non-HTTP base address is rejected here.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let transport = ReqwestTransport::from_config(config)?;
        let storage = config
            .storage_path
            .clone()
            .unwrap_or_else(FileStore::default_path);
        tracing::debug!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            api_version = %config.api_version,
            "building daybook API client"
        );
        Ok(Self::new(
            ApiClient::with_version(&config.base_url, config.api_version),
            Arc::new(transport),
            Arc::new(FileStore::new(storage)),
        ))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // --- v1: weather / news -------------------------------------------------

    pub async fn get_weather(&self, city: &str) -> Result<Value, ApiError> {
        self.call("get_weather", ApiVersion::V1, GENERIC_DIAGNOSTIC, Unwrap::Body, |c| {
            Ok(c.build_get_weather(city))
        })
        .await
    }

    /// Latest news from `source`, `DEFAULT_NEWS_LIMIT` items.
    pub async fn get_news(&self, source: &str) -> Result<Value, ApiError> {
        self.get_news_with_limit(source, DEFAULT_NEWS_LIMIT).await
    }

    pub async fn get_news_with_limit(&self, source: &str, limit: u32) -> Result<Value, ApiError> {
        self.call("get_news", ApiVersion::V1, GENERIC_DIAGNOSTIC, Unwrap::Body, |c| {
            Ok(c.build_get_news(source, limit))
        })
        .await
    }

    // --- v1: thoughts / suggestions -----------------------------------------

    pub async fn save_thought(&self, thought: &Value) -> Result<Value, ApiError> {
        self.call("save_thought", ApiVersion::V1, GENERIC_DIAGNOSTIC, Unwrap::Body, |c| {
            c.build_save_thought(thought)
        })
        .await
    }

    pub async fn get_thoughts(&self, date: &str) -> Result<Value, ApiError> {
        self.call("get_thoughts", ApiVersion::V1, GENERIC_DIAGNOSTIC, Unwrap::Body, |c| {
            Ok(c.build_get_thoughts(date))
        })
        .await
    }

    pub async fn get_daily_suggestions(&self) -> Result<Value, ApiError> {
        self.call(
            "get_daily_suggestions",
            ApiVersion::V1,
            GENERIC_DIAGNOSTIC,
            Unwrap::Body,
            |c| Ok(c.build_get_daily_suggestions()),
        )
        .await
    }

    pub async fn generate_suggestions(&self, thought: &Value) -> Result<Value, ApiError> {
        self.call(
            "generate_suggestions",
            ApiVersion::V1,
            GENERIC_DIAGNOSTIC,
            Unwrap::Body,
            |c| c.build_generate_suggestions(thought),
        )
        .await
    }

    // --- v2: daily records --------------------------------------------------

    pub async fn create_daily_record(
        &self,
        user_id: &UserId,
        record: &DailyRecordCreate,
    ) -> Result<Value, ApiError> {
        self.create_daily_record_on(user_id, record, None).await
    }

    /// Create a record for `record_date` instead of the backend's today.
    pub async fn create_daily_record_on(
        &self,
        user_id: &UserId,
        record: &DailyRecordCreate,
        record_date: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.call(
            "create_daily_record",
            ApiVersion::V2,
            "failed to create daily record",
            Unwrap::Body,
            |c| c.build_create_daily_record_on(user_id, record, record_date),
        )
        .await
    }

    /// `{date, record, has_record}` for the backend's current date.
    pub async fn get_today_record(&self, user_id: &UserId) -> Result<Value, ApiError> {
        self.call(
            "get_today_record",
            ApiVersion::V2,
            GENERIC_DIAGNOSTIC,
            Unwrap::Body,
            |c| Ok(c.build_get_today_record(user_id)),
        )
        .await
    }

    pub async fn get_daily_record(
        &self,
        user_id: &UserId,
        record_date: &str,
    ) -> Result<Value, ApiError> {
        self.call(
            "get_daily_record",
            ApiVersion::V2,
            GENERIC_DIAGNOSTIC,
            Unwrap::Body,
            |c| Ok(c.build_get_daily_record(user_id, record_date)),
        )
        .await
    }

    pub async fn list_user_records(
        &self,
        user_id: &UserId,
        page: Pagination,
    ) -> Result<Value, ApiError> {
        self.call(
            "list_user_records",
            ApiVersion::V2,
            GENERIC_DIAGNOSTIC,
            Unwrap::Body,
            |c| Ok(c.build_list_user_records(user_id, page)),
        )
        .await
    }

    pub async fn update_daily_record(
        &self,
        user_id: &UserId,
        record_date: &str,
        update: &DailyRecordUpdate,
    ) -> Result<Value, ApiError> {
        self.call(
            "update_daily_record",
            ApiVersion::V2,
            GENERIC_DIAGNOSTIC,
            Unwrap::Body,
            |c| c.build_update_daily_record(user_id, record_date, update),
        )
        .await
    }

    pub async fn delete_daily_record(
        &self,
        user_id: &UserId,
        record_date: &str,
    ) -> Result<Value, ApiError> {
        self.call(
            "delete_daily_record",
            ApiVersion::V2,
            GENERIC_DIAGNOSTIC,
            Unwrap::Body,
            |c| Ok(c.build_delete_daily_record(user_id, record_date)),
        )
        .await
    }

    // --- v2: summaries ------------------------------------------------------

    pub async fn get_today_info(&self, user_id: &UserId) -> Result<Value, ApiError> {
        self.call(
            "get_today_info",
            ApiVersion::V2,
            "failed to fetch today's summary",
            Unwrap::Body,
            |c| Ok(c.build_get_today_info(user_id)),
        )
        .await
    }

    /// Ask the backend to rebuild the AI summary for one record. Returns the
    /// response's `data` field rather than the whole body.
    pub async fn regenerate_ai_summary(
        &self,
        user_id: &UserId,
        record_date: &str,
    ) -> Result<Value, ApiError> {
        self.call(
            "regenerate_ai_summary",
            ApiVersion::V2,
            "failed to regenerate AI summary",
            Unwrap::NestedData,
            |c| Ok(c.build_regenerate_ai_summary(user_id, record_date)),
        )
        .await
    }

    pub async fn get_ai_summary(
        &self,
        user_id: &UserId,
        summary_date: &str,
    ) -> Result<Value, ApiError> {
        self.call(
            "get_ai_summary",
            ApiVersion::V2,
            GENERIC_DIAGNOSTIC,
            Unwrap::Body,
            |c| Ok(c.build_get_ai_summary(user_id, summary_date)),
        )
        .await
    }

    pub async fn list_user_summaries(
        &self,
        user_id: &UserId,
        page: Pagination,
    ) -> Result<Value, ApiError> {
        self.call(
            "list_user_summaries",
            ApiVersion::V2,
            GENERIC_DIAGNOSTIC,
            Unwrap::Body,
            |c| Ok(c.build_list_user_summaries(user_id, page)),
        )
        .await
    }

    // --- v2: users ----------------------------------------------------------

    pub async fn create_user(&self, user: &UserCreate) -> Result<Value, ApiError> {
        self.call("create_user", ApiVersion::V2, GENERIC_DIAGNOSTIC, Unwrap::Body, |c| {
            c.build_create_user(user)
        })
        .await
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<Value, ApiError> {
        self.call("get_user", ApiVersion::V2, GENERIC_DIAGNOSTIC, Unwrap::Body, |c| {
            Ok(c.build_get_user(user_id))
        })
        .await
    }

    // --- local identity -----------------------------------------------------

    /// The stored user id, or `UserIdentity::Default` before one is set.
    pub fn current_user_id(&self) -> UserIdentity {
        identity::current_user_id(self.store.as_ref())
    }

    pub fn set_current_user_id(&self, id: &UserId) -> Result<(), StoreError> {
        identity::set_current_user_id(self.store.as_ref(), id)
    }

    pub fn clear_current_user_id(&self) -> Result<(), StoreError> {
        identity::clear_current_user_id(self.store.as_ref())
    }

    // --- plumbing -----------------------------------------------------------

    /// Run one exchange and log its failure, if any, exactly once.
    async fn call<B>(
        &self,
        operation: &'static str,
        required: ApiVersion,
        diagnostic: &'static str,
        unwrap: Unwrap,
        build: B,
    ) -> Result<Value, ApiError>
    where
        B: FnOnce(&ApiClient) -> Result<HttpRequest, ApiError>,
    {
        let outcome = self.exchange(operation, required, unwrap, build).await;
        if let Err(err) = &outcome {
            tracing::error!(operation = operation, status = ?err.status(), error = %err, "{diagnostic}");
        }
        outcome
    }

    async fn exchange<B>(
        &self,
        operation: &'static str,
        required: ApiVersion,
        unwrap: Unwrap,
        build: B,
    ) -> Result<Value, ApiError>
    where
        B: FnOnce(&ApiClient) -> Result<HttpRequest, ApiError>,
    {
        self.client.require(operation, required)?;
        let request = build(&self.client)?;
        tracing::debug!(operation = operation, method = %request.method, path = %request.path, "sending request");

        let response: HttpResponse = self.transport.execute(request).await?;
        tracing::debug!(operation = operation, status = response.status, "received response");

        match unwrap {
            Unwrap::Body => self.client.parse_body(response),
            Unwrap::NestedData => self.client.parse_nested_data(response),
        }
    }
}

impl std::fmt::Debug for DaybookApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaybookApi")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
