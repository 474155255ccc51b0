use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn reject(status: StatusCode, detail: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": detail })))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: Option<String>,
    pub created_at: String,
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyRecord {
    pub id: u64,
    pub user_id: u64,
    pub record_date: String,
    pub content: String,
    pub mood_score: Option<i32>,
    pub reflections: Option<String>,
    pub work_activities: Vec<String>,
    pub personal_activities: Vec<String>,
    pub learning_activities: Vec<String>,
    pub health_activities: Vec<String>,
    pub goals_achieved: Vec<String>,
    pub challenges_faced: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct DailyRecordCreate {
    pub content: String,
    pub mood_score: Option<i32>,
    #[serde(default)]
    pub work_activities: Vec<String>,
    #[serde(default)]
    pub personal_activities: Vec<String>,
    #[serde(default)]
    pub learning_activities: Vec<String>,
    #[serde(default)]
    pub health_activities: Vec<String>,
    #[serde(default)]
    pub goals_achieved: Vec<String>,
    #[serde(default)]
    pub challenges_faced: Vec<String>,
    pub reflections: Option<String>,
}

#[derive(Deserialize)]
pub struct DailyRecordUpdate {
    pub content: Option<String>,
    pub mood_score: Option<i32>,
    pub work_activities: Option<Vec<String>>,
    pub personal_activities: Option<Vec<String>>,
    pub learning_activities: Option<Vec<String>>,
    pub health_activities: Option<Vec<String>>,
    pub goals_achieved: Option<Vec<String>>,
    pub challenges_faced: Option<Vec<String>>,
    pub reflections: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiSummary {
    pub id: u64,
    pub user_id: u64,
    pub summary_date: String,
    pub achievements_summary: String,
    pub productivity_analysis: String,
    pub mood_analysis: String,
    pub tomorrow_suggestions: Vec<String>,
    pub priority_tasks: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub model_version: String,
    pub confidence_score: f64,
    pub created_at: String,
}

#[derive(Default)]
pub struct Db {
    thoughts: Vec<Value>,
    users: BTreeMap<u64, User>,
    records: BTreeMap<(u64, String), DailyRecord>,
    summaries: BTreeMap<(u64, String), AiSummary>,
    next_user_id: u64,
    next_record_id: u64,
    next_summary_id: u64,
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<RwLock<Db>>,
    /// Fixed "today" for deterministic tests; `None` uses the local date.
    today: Option<String>,
}

impl AppState {
    fn today(&self) -> String {
        self.today
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string())
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn app() -> Router {
    build(None)
}

/// Router whose notion of "today" is pinned to `today`.
pub fn app_on(today: &str) -> Router {
    build(Some(today.to_string()))
}

fn build(today: Option<String>) -> Router {
    let mut db = Db::default();
    db.next_user_id = 2;
    db.users.insert(
        1,
        User {
            id: 1,
            username: "demo".to_string(),
            email: None,
            created_at: now(),
            is_active: true,
        },
    );
    let state = AppState {
        db: Arc::new(RwLock::new(db)),
        today,
    };

    Router::new()
        .route("/", get(root))
        .route("/weather/{city}", get(get_weather))
        .route("/news/{source}", get(get_news))
        .route("/save-thought", post(save_thought))
        .route("/thoughts", get(get_thoughts))
        .route("/suggestions/daily", get(daily_suggestions))
        .route("/suggestions/generate", post(generate_suggestions))
        .route(
            "/record/users/{user_id}/records/",
            get(list_records).post(create_record),
        )
        .route(
            "/record/users/{user_id}/records/{record_date}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route("/record/users/{user_id}/today", get(today_record))
        .route("/summary/users/{user_id}/today", get(today_info))
        .route(
            "/summary/users/{user_id}/records/{record_date}/regenerate-summary",
            post(regenerate_summary),
        )
        .route("/summary/users/{user_id}/summaries/", get(list_summaries))
        .route(
            "/summary/users/{user_id}/summaries/{summary_date}",
            get(get_summary),
        )
        .route("/user/users/", post(create_user))
        .route("/user/users/{user_id}", get(get_user))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

// --- weather / news ---------------------------------------------------------

const WEATHER_DESCRIPTIONS: [&str; 4] = ["clear", "cloudy", "rain", "windy"];

async fn get_weather(Path(city): Path<String>) -> Json<Value> {
    let seed: u32 = city.bytes().map(u32::from).sum();
    let description = WEATHER_DESCRIPTIONS[(seed % 4) as usize];
    Json(json!({
        "city": city,
        "temperature": (seed % 35) as i64 - 5,
        "humidity": seed % 100,
        "description": description,
    }))
}

#[derive(Deserialize)]
struct NewsQuery {
    #[serde(default = "default_news_limit")]
    limit: u32,
}

fn default_news_limit() -> u32 {
    10
}

async fn get_news(Path(source): Path<String>, Query(query): Query<NewsQuery>) -> Json<Value> {
    let items: Vec<Value> = (1..=query.limit)
        .map(|i| {
            json!({
                "title": format!("{source} headline {i}"),
                "url": format!("https://news.example/{source}/{i}"),
            })
        })
        .collect();
    Json(json!({ "source": source, "items": items }))
}

// --- thoughts / suggestions -------------------------------------------------

async fn save_thought(State(state): State<AppState>, Json(mut thought): Json<Value>) -> ApiResult {
    let today = state.today();
    let Some(fields) = thought.as_object_mut() else {
        return Err(reject(StatusCode::UNPROCESSABLE_ENTITY, "thought must be an object"));
    };
    fields.insert("id".to_string(), json!(Uuid::new_v4()));
    fields.entry("date").or_insert_with(|| json!(today));
    state.db.write().await.thoughts.push(thought.clone());
    Ok(Json(thought))
}

#[derive(Deserialize)]
struct ThoughtQuery {
    date: String,
}

async fn get_thoughts(
    State(state): State<AppState>,
    Query(query): Query<ThoughtQuery>,
) -> Json<Value> {
    let db = state.db.read().await;
    let matching: Vec<Value> = db
        .thoughts
        .iter()
        .filter(|t| t["date"] == query.date.as_str())
        .cloned()
        .collect();
    Json(Value::Array(matching))
}

async fn daily_suggestions(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "date": state.today(),
        "suggestions": [
            "Start with the hardest task",
            "Take a short walk after lunch",
            "Write down one thing you learned",
        ],
    }))
}

async fn generate_suggestions(Json(thought): Json<Value>) -> Json<Value> {
    let content = thought["content"].as_str().unwrap_or_default();
    Json(json!({
        "suggestions": [
            format!("Reflect on: {content}"),
            "Break it into smaller steps".to_string(),
        ],
    }))
}

// --- records ----------------------------------------------------------------

#[derive(Deserialize)]
struct CreateRecordQuery {
    record_date: Option<String>,
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_page_limit")]
    limit: usize,
}

fn default_page_limit() -> usize {
    30
}

fn summarize(db: &mut Db, record: &DailyRecord) -> AiSummary {
    db.next_summary_id += 1;
    let activities = record.work_activities.len()
        + record.personal_activities.len()
        + record.learning_activities.len()
        + record.health_activities.len();
    let mood = match record.mood_score {
        Some(score) if score >= 7 => "positive",
        Some(score) if score <= 3 => "low",
        Some(_) => "steady",
        None => "unknown",
    };
    let summary = AiSummary {
        id: db.next_summary_id,
        user_id: record.user_id,
        summary_date: record.record_date.clone(),
        achievements_summary: format!(
            "{activities} activities logged, {} goals achieved",
            record.goals_achieved.len()
        ),
        productivity_analysis: format!("{} work items", record.work_activities.len()),
        mood_analysis: format!("mood {mood}"),
        tomorrow_suggestions: record
            .challenges_faced
            .iter()
            .map(|c| format!("Plan around: {c}"))
            .collect(),
        priority_tasks: record.goals_achieved.iter().take(3).cloned().collect(),
        improvement_suggestions: vec!["Keep a consistent bedtime".to_string()],
        model_version: "mock-1".to_string(),
        confidence_score: 0.5,
        created_at: now(),
    };
    db.summaries
        .insert((record.user_id, record.record_date.clone()), summary.clone());
    summary
}

async fn create_record(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
    Query(query): Query<CreateRecordQuery>,
    Json(input): Json<DailyRecordCreate>,
) -> ApiResult {
    let record_date = query.record_date.unwrap_or_else(|| state.today());
    let mut db = state.db.write().await;
    if !db.users.contains_key(&user_id) {
        return Err(reject(StatusCode::NOT_FOUND, "user not found"));
    }
    let key = (user_id, record_date.clone());
    if db.records.contains_key(&key) {
        return Err(reject(StatusCode::BAD_REQUEST, "record already exists for this date"));
    }
    db.next_record_id += 1;
    let created_at = now();
    let record = DailyRecord {
        id: db.next_record_id,
        user_id,
        record_date,
        content: input.content,
        mood_score: input.mood_score,
        reflections: input.reflections,
        work_activities: input.work_activities,
        personal_activities: input.personal_activities,
        learning_activities: input.learning_activities,
        health_activities: input.health_activities,
        goals_achieved: input.goals_achieved,
        challenges_faced: input.challenges_faced,
        created_at: created_at.clone(),
        updated_at: created_at,
    };
    db.records.insert(key, record.clone());
    summarize(&mut db, &record);
    Ok(Json(json!({
        "id": record.id,
        "user_id": record.user_id,
        "record_date": record.record_date,
        "content": record.content,
        "mood_score": record.mood_score,
        "created_at": record.created_at,
        "message": "record created, AI analysis is being generated",
    })))
}

async fn get_record(
    State(state): State<AppState>,
    Path((user_id, record_date)): Path<(u64, String)>,
) -> ApiResult {
    let db = state.db.read().await;
    db.records
        .get(&(user_id, record_date))
        .map(|r| Json(json!(r)))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "record not found"))
}

async fn list_records(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
    Query(page): Query<PageQuery>,
) -> Json<Value> {
    let db = state.db.read().await;
    let records: Vec<Value> = db
        .records
        .values()
        .filter(|r| r.user_id == user_id)
        .rev()
        .skip(page.skip)
        .take(page.limit)
        .map(|r| {
            let content = if r.content.chars().count() > 100 {
                format!("{}...", r.content.chars().take(100).collect::<String>())
            } else {
                r.content.clone()
            };
            json!({
                "id": r.id,
                "record_date": r.record_date,
                "content": content,
                "mood_score": r.mood_score,
                "created_at": r.created_at,
            })
        })
        .collect();
    Json(json!({ "total": records.len(), "records": records }))
}

async fn update_record(
    State(state): State<AppState>,
    Path((user_id, record_date)): Path<(u64, String)>,
    Json(input): Json<DailyRecordUpdate>,
) -> ApiResult {
    let mut db = state.db.write().await;
    let record = db
        .records
        .get_mut(&(user_id, record_date))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "record not found"))?;
    if let Some(content) = input.content {
        record.content = content;
    }
    if let Some(score) = input.mood_score {
        record.mood_score = Some(score);
    }
    if let Some(reflections) = input.reflections {
        record.reflections = Some(reflections);
    }
    for (target, value) in [
        (&mut record.work_activities, input.work_activities),
        (&mut record.personal_activities, input.personal_activities),
        (&mut record.learning_activities, input.learning_activities),
        (&mut record.health_activities, input.health_activities),
        (&mut record.goals_achieved, input.goals_achieved),
        (&mut record.challenges_faced, input.challenges_faced),
    ] {
        if let Some(value) = value {
            *target = value;
        }
    }
    record.updated_at = now();
    let record = record.clone();
    summarize(&mut db, &record);
    Ok(Json(json!({
        "id": record.id,
        "record_date": record.record_date,
        "updated_at": record.updated_at,
        "message": "record updated, AI analysis is being regenerated",
    })))
}

async fn delete_record(
    State(state): State<AppState>,
    Path((user_id, record_date)): Path<(u64, String)>,
) -> ApiResult {
    let mut db = state.db.write().await;
    let key = (user_id, record_date);
    db.records
        .remove(&key)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "record not found"))?;
    db.summaries.remove(&key);
    Ok(Json(json!({ "message": "record deleted" })))
}

async fn today_record(State(state): State<AppState>, Path(user_id): Path<u64>) -> Json<Value> {
    let today = state.today();
    let db = state.db.read().await;
    let record = db.records.get(&(user_id, today.clone())).map(|r| {
        json!({
            "id": r.id,
            "content": r.content,
            "mood_score": r.mood_score,
            "work_activities": r.work_activities,
            "personal_activities": r.personal_activities,
            "learning_activities": r.learning_activities,
            "health_activities": r.health_activities,
            "created_at": r.created_at,
        })
    });
    Json(json!({
        "date": today,
        "has_record": record.is_some(),
        "record": record,
    }))
}

// --- summaries --------------------------------------------------------------

async fn today_info(State(state): State<AppState>, Path(user_id): Path<u64>) -> Json<Value> {
    let today = state.today();
    let db = state.db.read().await;
    let summary = db.summaries.get(&(user_id, today.clone())).map(|s| {
        json!({
            "achievements_summary": s.achievements_summary,
            "tomorrow_suggestions": s.tomorrow_suggestions,
            "priority_tasks": s.priority_tasks,
            "created_at": s.created_at,
        })
    });
    Json(json!({
        "date": today,
        "has_summary": summary.is_some(),
        "ai_summary": summary,
    }))
}

async fn regenerate_summary(
    State(state): State<AppState>,
    Path((user_id, record_date)): Path<(u64, String)>,
) -> ApiResult {
    let mut db = state.db.write().await;
    let record = db
        .records
        .get(&(user_id, record_date))
        .cloned()
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "record not found"))?;
    let summary = summarize(&mut db, &record);
    Ok(Json(json!({
        "message": "AI summary regenerated",
        "data": summary,
    })))
}

async fn get_summary(
    State(state): State<AppState>,
    Path((user_id, summary_date)): Path<(u64, String)>,
) -> ApiResult {
    let db = state.db.read().await;
    db.summaries
        .get(&(user_id, summary_date))
        .map(|s| Json(json!(s)))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "AI summary not found"))
}

async fn list_summaries(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
    Query(page): Query<PageQuery>,
) -> Json<Value> {
    let db = state.db.read().await;
    let summaries: Vec<Value> = db
        .summaries
        .values()
        .filter(|s| s.user_id == user_id)
        .rev()
        .skip(page.skip)
        .take(page.limit)
        .map(|s| {
            json!({
                "id": s.id,
                "summary_date": s.summary_date,
                "achievements_summary": s.achievements_summary,
                "tomorrow_suggestions": s.tomorrow_suggestions,
                "created_at": s.created_at,
            })
        })
        .collect();
    Json(json!({ "total": summaries.len(), "summaries": summaries }))
}

// --- users ------------------------------------------------------------------

async fn create_user(State(state): State<AppState>, Json(input): Json<UserCreate>) -> ApiResult {
    let mut db = state.db.write().await;
    if db.users.values().any(|u| u.username == input.username) {
        return Err(reject(StatusCode::BAD_REQUEST, "username already exists"));
    }
    let user = User {
        id: db.next_user_id,
        username: input.username,
        email: input.email,
        created_at: now(),
        is_active: true,
    };
    db.next_user_id += 1;
    db.users.insert(user.id, user.clone());
    Ok(Json(json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "created_at": user.created_at,
        "message": "user created",
    })))
}

async fn get_user(State(state): State<AppState>, Path(user_id): Path<u64>) -> ApiResult {
    let db = state.db.read().await;
    db.users
        .get(&user_id)
        .map(|u| Json(json!(u)))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "user not found"))
}
