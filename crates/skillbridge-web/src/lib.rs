//! Axum JSON API over the career store and sync orchestrator.

use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillbridge_core::{
    ApplicationStatus, Course, CourseModule, DifficultyLevel, JobListing, Lesson,
};
use skillbridge_storage::CareerStore;
use skillbridge_sync::{SyncOrchestrator, SyncSummary};
use tokio::net::TcpListener;
use tracing::warn;
use uuid::Uuid;

pub const CRATE_NAME: &str = "skillbridge-web";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CareerStore>,
    pub orchestrator: Arc<SyncOrchestrator>,
}

impl AppState {
    pub fn new(store: Arc<CareerStore>, orchestrator: Arc<SyncOrchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewView {
    pub jobs: usize,
    pub courses: usize,
    pub alerts: usize,
    pub companies: usize,
    pub skills: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub id: Uuid,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub is_remote: bool,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub required_skills: Vec<String>,
    pub experience_required_years: u32,
    pub apply_url: Option<String>,
    pub status: ApplicationStatus,
    pub posted_at: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub difficulty_level: DifficultyLevel,
    pub duration_weeks: u32,
    pub instructor_name: String,
    pub thumbnail_url: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub order: u32,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetailView {
    #[serde(flatten)]
    pub course: CourseView,
    pub modules: Vec<ModuleView>,
}

#[derive(Debug, Deserialize, Default)]
struct JobsQuery {
    refresh: Option<bool>,
    keyword: Option<String>,
    remote: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct CoursesQuery {
    refresh: Option<bool>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(overview_handler))
        .route("/jobs", get(jobs_handler))
        .route("/jobs/{id}", get(job_detail_handler))
        .route("/courses", get(courses_handler))
        .route("/courses/{id}", get(course_detail_handler))
        .route("/sync/jobs", post(sync_jobs_handler))
        .route("/sync/courses", post(sync_courses_handler))
        .with_state(Arc::new(state))
}

pub async fn serve_from_env(state: AppState) -> anyhow::Result<()> {
    let port: u16 = std::env::var("SKILLBRIDGE_WEB_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000);
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn job_view(store: &CareerStore, job: JobListing) -> JobView {
    JobView {
        id: job.id,
        title: job.title,
        company: store.lookup_name(job.company_id).await,
        location: store.lookup_name(job.location_id).await,
        employment_type: store.lookup_name(job.employment_type_id).await,
        is_remote: job.is_remote,
        salary_min: job.salary_min,
        salary_max: job.salary_max,
        required_skills: store.lookup_names(&job.required_skill_ids).await,
        experience_required_years: job.experience_required_years,
        apply_url: job.apply_url,
        status: job.status,
        posted_at: job.posted_at,
        description: job.description,
    }
}

async fn course_view(store: &CareerStore, course: Course) -> CourseView {
    CourseView {
        id: course.id,
        title: course.title,
        description: course.description,
        category: store.lookup_name(course.category_id).await,
        difficulty_level: course.difficulty_level,
        duration_weeks: course.duration_weeks,
        instructor_name: course.instructor_name,
        thumbnail_url: course.thumbnail_url,
        is_active: course.is_active,
    }
}

async fn overview_handler(State(state): State<Arc<AppState>>) -> Json<OverviewView> {
    let counts = state.store.counts().await;
    Json(OverviewView {
        jobs: counts.jobs,
        courses: counts.courses,
        alerts: counts.alerts,
        companies: counts.companies,
        skills: counts.skills,
    })
}

async fn jobs_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JobsQuery>,
) -> Json<Vec<JobView>> {
    // Best-effort inline refresh; a failing source must not break the read.
    if query.refresh.unwrap_or(false) {
        let summary = state.orchestrator.run_job_sync().await;
        if summary.total_synced == 0 {
            warn!(run_id = %summary.run_id, "inline job refresh synced nothing");
        }
    }

    let keyword = query.keyword.as_deref().map(str::to_lowercase);
    let mut views = Vec::new();
    for job in state.store.active_jobs(Utc::now()).await {
        if let Some(keyword) = &keyword {
            let haystack = format!("{} {}", job.title, job.description).to_lowercase();
            if !haystack.contains(keyword) {
                continue;
            }
        }
        if let Some(remote) = query.remote {
            if job.is_remote != remote {
                continue;
            }
        }
        views.push(job_view(&state.store, job).await);
    }
    Json(views)
}

async fn job_detail_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<Uuid>,
) -> Response {
    match state.store.job(id).await {
        Some(job) => Json(job_view(&state.store, job).await).into_response(),
        None => not_found("job not found"),
    }
}

async fn courses_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CoursesQuery>,
) -> Json<Vec<CourseView>> {
    if query.refresh.unwrap_or(false) {
        let summary = state.orchestrator.run_course_sync().await;
        if summary.total_synced == 0 {
            warn!(run_id = %summary.run_id, "inline course refresh synced nothing");
        }
    }

    let mut views = Vec::new();
    for course in state.store.courses().await {
        views.push(course_view(&state.store, course).await);
    }
    Json(views)
}

async fn course_detail_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<Uuid>,
) -> Response {
    let Some(course) = state.store.course(id).await else {
        return not_found("course not found");
    };

    let mut modules = Vec::new();
    for module in state.store.modules_for_course(course.id).await {
        let lessons = state.store.lessons_for_module(module.id).await;
        modules.push(module_view(module, lessons));
    }

    Json(CourseDetailView {
        course: course_view(&state.store, course).await,
        modules,
    })
    .into_response()
}

fn module_view(module: CourseModule, lessons: Vec<Lesson>) -> ModuleView {
    ModuleView {
        id: module.id,
        title: module.title,
        description: module.description,
        order: module.order,
        lessons,
    }
}

async fn sync_jobs_handler(State(state): State<Arc<AppState>>) -> Json<SyncSummary> {
    Json(state.orchestrator.run_job_sync().await)
}

async fn sync_courses_handler(State(state): State<Arc<AppState>>) -> Json<SyncSummary> {
    Json(state.orchestrator.run_course_sync().await)
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use skillbridge_sync::{SourceRegistry, SyncConfig};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn mock_state() -> AppState {
        let store = Arc::new(CareerStore::new());
        let config = SyncConfig {
            use_live_job_sources: false,
            use_live_course_sources: false,
            job_sync_interval_hours: 6,
            course_sync_interval_hours: 12,
            scheduler_enabled: false,
            http_timeout_secs: 8,
            user_agent: "skillbridge-test/0".to_string(),
            workspace_root: PathBuf::from("."),
            credentials: HashMap::new(),
        };
        let orchestrator = Arc::new(
            SyncOrchestrator::new(&config, &SourceRegistry::default(), store.clone()).unwrap(),
        );
        AppState::new(store, orchestrator)
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post_req(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn overview_reports_store_counts() {
        let app = app(mock_state());
        let resp = app.oneshot(get("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["jobs"], 0);
        assert_eq!(json["courses"], 0);
    }

    #[tokio::test]
    async fn sync_then_list_jobs_resolves_lookup_names() {
        let app = app(mock_state());

        let sync = app.clone().oneshot(post_req("/sync/jobs")).await.unwrap();
        assert_eq!(sync.status(), StatusCode::OK);

        let resp = app.oneshot(get("/jobs")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let jobs = json.as_array().unwrap();
        assert_eq!(jobs.len(), 5);
        let senior = jobs
            .iter()
            .find(|j| j["title"] == "Senior Python Developer")
            .unwrap();
        assert_eq!(senior["company"], "Tech Innovations");
        assert_eq!(senior["location"], "San Francisco, CA");
    }

    #[tokio::test]
    async fn refresh_flag_populates_empty_store() {
        let app = app(mock_state());
        let resp = app.oneshot(get("/jobs?refresh=true")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn keyword_and_remote_filters_narrow_the_list() {
        let app = app(mock_state());
        app.clone().oneshot(post_req("/sync/jobs")).await.unwrap();

        let resp = app
            .clone()
            .oneshot(get("/jobs?keyword=python"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert!(json.as_array().unwrap().len() >= 1);
        assert!(json
            .as_array()
            .unwrap()
            .iter()
            .all(|j| format!("{} {}", j["title"], j["description"])
                .to_lowercase()
                .contains("python")));

        let resp = app.oneshot(get("/jobs?remote=true")).await.unwrap();
        let json = body_json(resp).await;
        let remote = json.as_array().unwrap();
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0]["title"], "DevOps Engineer (Remote)");
    }

    #[tokio::test]
    async fn unknown_job_id_is_404() {
        let app = app(mock_state());
        let resp = app
            .oneshot(get(&format!("/jobs/{}", Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn course_detail_embeds_seeded_modules() {
        let state = mock_state();
        let store = state.store.clone();
        let app = app(state);

        app.clone().oneshot(post_req("/sync/courses")).await.unwrap();
        let course = store
            .courses()
            .await
            .into_iter()
            .find(|c| c.title == "Python for Data Science")
            .unwrap();

        let resp = app
            .oneshot(get(&format!("/courses/{}", course.id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["title"], "Python for Data Science");
        let modules = json["modules"].as_array().unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0]["title"], "Introduction");
        assert_eq!(modules[0]["lessons"].as_array().unwrap().len(), 1);
        assert_eq!(modules[0]["lessons"][0]["title"], "Getting Started");
    }
}
