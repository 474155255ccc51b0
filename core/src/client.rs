//! Stateless request builder and response unwrapper for the daybook API.
//!
//! # Design
//! `ApiClient` holds only the base address and the endpoint surface it was
//! configured for. Each endpoint has a `build_*` method producing an
//! `HttpRequest`; every response goes through the same `parse_body` step,
//! which is the response interceptor: 2xx bodies come back as JSON, anything
//! else becomes `ApiError::HttpError`. No method here performs I/O.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::Value;

use crate::config::ApiVersion;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{DailyRecordCreate, DailyRecordUpdate, Pagination, UserCreate, UserId};

/// Characters left unescaped by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode one path segment or query value.
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

/// Synchronous, stateless client for the daybook API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    version: ApiVersion,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_version(base_url, ApiVersion::V2)
    }

    pub fn with_version(base_url: &str, version: ApiVersion) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            version,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// Fail with `Unsupported` unless the configured surface includes
    /// `required`.
    pub fn require(&self, operation: &'static str, required: ApiVersion) -> Result<(), ApiError> {
        if self.version >= required {
            return Ok(());
        }
        Err(ApiError::Unsupported {
            operation,
            required,
            configured: self.version,
        })
    }

    // --- weather / news -----------------------------------------------------

    pub fn build_get_weather(&self, city: &str) -> HttpRequest {
        self.get(format!("/weather/{}", encode_component(city)), &[])
    }

    pub fn build_get_news(&self, source: &str, limit: u32) -> HttpRequest {
        self.get(
            format!("/news/{}", encode_component(source)),
            &[("limit", limit.to_string())],
        )
    }

    // --- thoughts / suggestions ---------------------------------------------

    pub fn build_save_thought(&self, thought: &Value) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Post, "/save-thought".to_string(), &[], thought)
    }

    pub fn build_get_thoughts(&self, date: &str) -> HttpRequest {
        self.get("/thoughts".to_string(), &[("date", date.to_string())])
    }

    pub fn build_get_daily_suggestions(&self) -> HttpRequest {
        self.get("/suggestions/daily".to_string(), &[])
    }

    pub fn build_generate_suggestions(&self, thought: &Value) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Post, "/suggestions/generate".to_string(), &[], thought)
    }

    // --- daily records ------------------------------------------------------

    /// Create a record for the backend's current date.
    pub fn build_create_daily_record(
        &self,
        user_id: &UserId,
        record: &DailyRecordCreate,
    ) -> Result<HttpRequest, ApiError> {
        self.build_create_daily_record_on(user_id, record, None)
    }

    /// Create a record for `record_date`, or for the backend's current date
    /// when `None`.
    pub fn build_create_daily_record_on(
        &self,
        user_id: &UserId,
        record: &DailyRecordCreate,
        record_date: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let query: Vec<(&str, String)> = record_date
            .map(|date| ("record_date", date.to_string()))
            .into_iter()
            .collect();
        self.json(HttpMethod::Post, records_path(user_id), &query, record)
    }

    /// Today's record, if one was written.
    pub fn build_get_today_record(&self, user_id: &UserId) -> HttpRequest {
        self.get(
            format!("/record/users/{}/today", encode_component(user_id.as_str())),
            &[],
        )
    }

    pub fn build_get_daily_record(&self, user_id: &UserId, record_date: &str) -> HttpRequest {
        self.get(record_path(user_id, record_date), &[])
    }

    pub fn build_list_user_records(&self, user_id: &UserId, page: Pagination) -> HttpRequest {
        self.get(records_path(user_id), &page_query(page))
    }

    pub fn build_update_daily_record(
        &self,
        user_id: &UserId,
        record_date: &str,
        update: &DailyRecordUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Put, record_path(user_id, record_date), &[], update)
    }

    pub fn build_delete_daily_record(&self, user_id: &UserId, record_date: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, record_path(user_id, record_date), &[])
    }

    // --- summaries ----------------------------------------------------------

    pub fn build_get_today_info(&self, user_id: &UserId) -> HttpRequest {
        self.get(
            format!("/summary/users/{}/today", encode_component(user_id.as_str())),
            &[],
        )
    }

    /// The backend takes no parameters here; an empty JSON object is sent.
    pub fn build_regenerate_ai_summary(&self, user_id: &UserId, record_date: &str) -> HttpRequest {
        let path = format!(
            "/summary/users/{}/records/{}/regenerate-summary",
            encode_component(user_id.as_str()),
            encode_component(record_date)
        );
        let mut req = self.request(HttpMethod::Post, path, &[]);
        req.headers = json_headers();
        req.body = Some("{}".to_string());
        req
    }

    pub fn build_get_ai_summary(&self, user_id: &UserId, summary_date: &str) -> HttpRequest {
        let path = format!(
            "/summary/users/{}/summaries/{}",
            encode_component(user_id.as_str()),
            encode_component(summary_date)
        );
        self.get(path, &[])
    }

    pub fn build_list_user_summaries(&self, user_id: &UserId, page: Pagination) -> HttpRequest {
        let path = format!(
            "/summary/users/{}/summaries/",
            encode_component(user_id.as_str())
        );
        self.get(path, &page_query(page))
    }

    // --- users --------------------------------------------------------------

    pub fn build_create_user(&self, user: &UserCreate) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Post, "/user/users/".to_string(), &[], user)
    }

    pub fn build_get_user(&self, user_id: &UserId) -> HttpRequest {
        self.get(
            format!("/user/users/{}", encode_component(user_id.as_str())),
            &[],
        )
    }

    // --- response interceptor -----------------------------------------------

    /// Unwrap a response to its JSON body. An empty 2xx body yields `null`.
    pub fn parse_body(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Unwrap a response and then its `data` field, `null` when the body has
    /// none.
    pub fn parse_nested_data(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let body = self.parse_body(response)?;
        Ok(match body {
            Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
            _ => Value::Null,
        })
    }

    // --- helpers ------------------------------------------------------------

    fn url(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut url = format!("{}{path}", self.base_url);
        for (i, (key, value)) in query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&encode_component(value));
        }
        url
    }

    fn request(&self, method: HttpMethod, path: String, query: &[(&str, String)]) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(&path, query),
            headers: Vec::new(),
            body: None,
        }
    }

    fn get(&self, path: String, query: &[(&str, String)]) -> HttpRequest {
        self.request(HttpMethod::Get, path, query)
    }

    fn json<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: String,
        query: &[(&str, String)],
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: self.url(&path, query),
            headers: json_headers(),
            body: Some(body),
        })
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn records_path(user_id: &UserId) -> String {
    format!("/record/users/{}/records/", encode_component(user_id.as_str()))
}

fn record_path(user_id: &UserId, record_date: &str) -> String {
    format!(
        "/record/users/{}/records/{}",
        encode_component(user_id.as_str()),
        encode_component(record_date)
    )
}

fn page_query(page: Pagination) -> [(&'static str, String); 2] {
    [("skip", page.skip.to_string()), ("limit", page.limit.to_string())]
}

/// Map non-2xx status codes to `ApiError::HttpError`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use percent_encoding::percent_decode_str;
    use serde_json::json;

    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:8000")
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_get_weather_encodes_city() {
        let req = client().build_get_weather("São Paulo/Centro?x=1&y");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.path,
            "http://localhost:8000/weather/S%C3%A3o%20Paulo%2FCentro%3Fx%3D1%26y"
        );
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn weather_segment_round_trips_for_reserved_characters() {
        let cities = [
            "Paris",
            "New York",
            "a/b",
            "100% humid",
            "q?=&#",
            "北京",
            "O'Hare (ORD)",
            "+plus+",
            "semi;colon,comma:colon@at",
        ];
        let c = client();
        for city in cities {
            let req = c.build_get_weather(city);
            let segment = req.path.strip_prefix("http://localhost:8000/weather/").unwrap();
            assert!(!segment.contains('/'), "{city}: unescaped slash");
            assert!(!segment.contains('?'), "{city}: unescaped question mark");
            let decoded = percent_decode_str(segment).decode_utf8().unwrap();
            assert_eq!(decoded, city);
        }
    }

    #[test]
    fn unreserved_marks_are_left_alone() {
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)"), "a-b_c.d!e~f*g'h(i)");
    }

    #[test]
    fn build_get_news_sets_limit() {
        let req = client().build_get_news("bbc", 3);
        assert_eq!(req.path, "http://localhost:8000/news/bbc?limit=3");
    }

    #[test]
    fn build_save_thought_posts_json() {
        let thought = json!({"content": "ship it", "date": "2024-05-01"});
        let req = client().build_save_thought(&thought).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8000/save-thought");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, thought);
    }

    #[test]
    fn build_get_thoughts_encodes_date_query() {
        let req = client().build_get_thoughts("2024-05-01");
        assert_eq!(req.path, "http://localhost:8000/thoughts?date=2024-05-01");
        let req = client().build_get_thoughts("May 1");
        assert_eq!(req.path, "http://localhost:8000/thoughts?date=May%201");
    }

    #[test]
    fn build_suggestion_requests() {
        let req = client().build_get_daily_suggestions();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8000/suggestions/daily");

        let req = client().build_generate_suggestions(&json!({"content": "tired"})).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8000/suggestions/generate");
    }

    #[test]
    fn build_create_daily_record_keeps_trailing_slash() {
        let record = DailyRecordCreate::new("gym, then reading");
        let req = client()
            .build_create_daily_record(&UserId::from(7), &record)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8000/record/users/7/records/");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["content"], "gym, then reading");
    }

    #[test]
    fn build_create_daily_record_on_backdates_via_query() {
        let record = DailyRecordCreate::new("late entry");
        let c = client();
        let req = c
            .build_create_daily_record_on(&UserId::from(7), &record, Some("2024-04-30"))
            .unwrap();
        assert_eq!(
            req.path,
            "http://localhost:8000/record/users/7/records/?record_date=2024-04-30"
        );
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["content"], "late entry");

        let undated = c
            .build_create_daily_record_on(&UserId::from(7), &record, None)
            .unwrap();
        assert_eq!(undated, c.build_create_daily_record(&UserId::from(7), &record).unwrap());
    }

    #[test]
    fn build_get_today_record_path() {
        let req = client().build_get_today_record(&UserId::from(5));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8000/record/users/5/today");
    }

    #[test]
    fn build_regenerate_ai_summary_sends_empty_object() {
        let req = client().build_regenerate_ai_summary(&UserId::from(1), "2024-05-01");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.path,
            "http://localhost:8000/summary/users/1/records/2024-05-01/regenerate-summary"
        );
        assert_eq!(req.body.as_deref(), Some("{}"));
    }

    #[test]
    fn build_listing_requests_carry_pagination() {
        let page = Pagination { skip: 10, limit: 5 };
        let req = client().build_list_user_records(&UserId::from(3), page);
        assert_eq!(
            req.path,
            "http://localhost:8000/record/users/3/records/?skip=10&limit=5"
        );
        let req = client().build_list_user_summaries(&UserId::from(3), Pagination::default());
        assert_eq!(
            req.path,
            "http://localhost:8000/summary/users/3/summaries/?skip=0&limit=30"
        );
    }

    #[test]
    fn build_record_item_requests() {
        let id = UserId::from(2);
        let c = client();
        assert_eq!(
            c.build_get_daily_record(&id, "2024-05-01").path,
            "http://localhost:8000/record/users/2/records/2024-05-01"
        );
        let req = c.build_delete_daily_record(&id, "2024-05-01");
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());

        let update = DailyRecordUpdate {
            content: Some("edited".to_string()),
            ..DailyRecordUpdate::default()
        };
        let req = c.build_update_daily_record(&id, "2024-05-01", &update).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.body.as_deref(), Some(r#"{"content":"edited"}"#));
    }

    #[test]
    fn build_user_requests() {
        let user = UserCreate {
            username: "mei".to_string(),
            email: None,
        };
        let req = client().build_create_user(&user).unwrap();
        assert_eq!(req.path, "http://localhost:8000/user/users/");
        assert_eq!(req.body.as_deref(), Some(r#"{"username":"mei"}"#));
        assert_eq!(
            client().build_get_user(&UserId::from(9)).path,
            "http://localhost:8000/user/users/9"
        );
    }

    #[test]
    fn parse_body_returns_only_the_body() {
        let body = client().parse_body(ok(r#"{"city":"Paris","temp":21}"#)).unwrap();
        assert_eq!(body, json!({"city": "Paris", "temp": 21}));
    }

    #[test]
    fn parse_body_empty_is_null() {
        assert_eq!(client().parse_body(ok("")).unwrap(), Value::Null);
    }

    #[test]
    fn parse_body_non_success() {
        let response = HttpResponse {
            status: 503,
            headers: Vec::new(),
            body: "upstream down".to_string(),
        };
        let err = client().parse_body(response).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 503, .. }));
    }

    #[test]
    fn parse_body_bad_json() {
        let err = client().parse_body(ok("not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_nested_data_returns_inner_field() {
        let data = client()
            .parse_nested_data(ok(r#"{"message":"queued","data":{"mood_analysis":"calm"}}"#))
            .unwrap();
        assert_eq!(data, json!({"mood_analysis": "calm"}));
        let missing = client().parse_nested_data(ok(r#"{"message":"queued"}"#)).unwrap();
        assert_eq!(missing, Value::Null);
    }

    #[test]
    fn require_rejects_newer_surface() {
        let c = ApiClient::with_version("http://localhost:8000", ApiVersion::V1);
        assert!(c.require("get_weather", ApiVersion::V1).is_ok());
        let err = c.require("get_today_info", ApiVersion::V2).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Unsupported {
                operation: "get_today_info",
                required: ApiVersion::V2,
                configured: ApiVersion::V1,
            }
        ));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ApiClient::new("http://localhost:8000/");
        let req = client.build_get_daily_suggestions();
        assert_eq!(req.path, "http://localhost:8000/suggestions/daily");
    }
}
