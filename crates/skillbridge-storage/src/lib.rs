//! Constraint-enforcing in-memory persistence engine + HTTP fetch utilities.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::Value as JsonValue;
use skillbridge_core::{
    AlertCriteria, ContentType, Course, CourseDraft, CourseModule, CurriculumWeek, JobDraft,
    JobListing, Lesson, LookupEntity,
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info_span;
use uuid::Uuid;

pub const CRATE_NAME: &str = "skillbridge-storage";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("course {0} not found")]
    CourseNotFound(Uuid),
    #[error("alert {0} not found")]
    AlertNotFound(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Company,
    Location,
    EmploymentType,
    Skill,
    CourseCategory,
}

#[derive(Debug, Default)]
struct StoreInner {
    companies: HashMap<String, LookupEntity>,
    locations: HashMap<String, LookupEntity>,
    employment_types: HashMap<String, LookupEntity>,
    skills: HashMap<String, LookupEntity>,
    course_categories: HashMap<String, LookupEntity>,
    lookup_names: HashMap<Uuid, String>,
    jobs: HashMap<JobKey, JobListing>,
    courses: HashMap<String, Course>,
    modules: Vec<CourseModule>,
    lessons: Vec<Lesson>,
    alerts: HashMap<Uuid, AlertCriteria>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct JobKey {
    title: String,
    company_id: Uuid,
}

/// Shared entity tables behind one writer lock. Natural-key upserts and
/// name-keyed get-or-create are atomic because every mutation takes the
/// write lock for its whole critical section; overlapping sync runs cannot
/// duplicate a listing or a lookup row.
#[derive(Debug, Default)]
pub struct CareerStore {
    inner: RwLock<StoreInner>,
}

impl CareerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-name get-or-create. Names are NOT normalized: "ACME" and "acme"
    /// are distinct rows, matching the observed upstream behavior.
    pub async fn get_or_create(&self, kind: LookupKind, name: &str) -> LookupEntity {
        let mut inner = self.inner.write().await;
        let map = match kind {
            LookupKind::Company => &mut inner.companies,
            LookupKind::Location => &mut inner.locations,
            LookupKind::EmploymentType => &mut inner.employment_types,
            LookupKind::Skill => &mut inner.skills,
            LookupKind::CourseCategory => &mut inner.course_categories,
        };
        if let Some(existing) = map.get(name) {
            return existing.clone();
        }
        let entity = LookupEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        map.insert(name.to_string(), entity.clone());
        inner.lookup_names.insert(entity.id, entity.name.clone());
        entity
    }

    pub async fn lookup_name(&self, id: Uuid) -> Option<String> {
        self.inner.read().await.lookup_names.get(&id).cloned()
    }

    pub async fn lookup_names(&self, ids: &[Uuid]) -> Vec<String> {
        let inner = self.inner.read().await;
        ids.iter()
            .filter_map(|id| inner.lookup_names.get(id).cloned())
            .collect()
    }

    /// Atomic create-or-update keyed by (title, company). Last write wins on
    /// every mapped field; id and created_at survive updates.
    pub async fn upsert_job(&self, draft: JobDraft, now: DateTime<Utc>) -> (JobListing, bool) {
        let mut inner = self.inner.write().await;
        let key = JobKey {
            title: draft.title.clone(),
            company_id: draft.company_id,
        };
        match inner.jobs.get_mut(&key) {
            Some(existing) => {
                existing.description = draft.description;
                existing.requirements = draft.requirements;
                existing.responsibilities = draft.responsibilities;
                existing.location_id = draft.location_id;
                existing.employment_type_id = draft.employment_type_id;
                existing.is_remote = draft.is_remote;
                existing.salary_min = draft.salary_min;
                existing.salary_max = draft.salary_max;
                existing.required_skill_ids = draft.required_skill_ids;
                existing.experience_required_years = draft.experience_required_years;
                existing.apply_url = draft.apply_url;
                existing.status = draft.status;
                existing.posted_at = draft.posted_at;
                existing.closes_at = draft.closes_at;
                existing.updated_at = now;
                (existing.clone(), false)
            }
            None => {
                let listing = JobListing {
                    id: Uuid::new_v4(),
                    title: draft.title,
                    company_id: draft.company_id,
                    description: draft.description,
                    requirements: draft.requirements,
                    responsibilities: draft.responsibilities,
                    location_id: draft.location_id,
                    employment_type_id: draft.employment_type_id,
                    is_remote: draft.is_remote,
                    salary_min: draft.salary_min,
                    salary_max: draft.salary_max,
                    required_skill_ids: draft.required_skill_ids,
                    experience_required_years: draft.experience_required_years,
                    apply_url: draft.apply_url,
                    status: draft.status,
                    posted_at: draft.posted_at,
                    closes_at: draft.closes_at,
                    created_at: now,
                    updated_at: now,
                };
                inner.jobs.insert(key, listing.clone());
                (listing, true)
            }
        }
    }

    /// Atomic create-or-update keyed by title alone. Two distinct postings
    /// with identical titles collide by design of the chosen key.
    pub async fn upsert_course(&self, draft: &CourseDraft, now: DateTime<Utc>) -> (Course, bool) {
        let mut inner = self.inner.write().await;
        match inner.courses.get_mut(&draft.title) {
            Some(existing) => {
                existing.description = draft.description.clone();
                existing.category_id = draft.category_id;
                existing.difficulty_level = draft.difficulty_level;
                existing.duration_weeks = draft.duration_weeks;
                existing.instructor_name = draft.instructor_name.clone();
                existing.thumbnail_url = draft.thumbnail_url.clone();
                existing.is_active = draft.is_active;
                existing.updated_at = now;
                (existing.clone(), false)
            }
            None => {
                let course = Course {
                    id: Uuid::new_v4(),
                    title: draft.title.clone(),
                    description: draft.description.clone(),
                    category_id: draft.category_id,
                    difficulty_level: draft.difficulty_level,
                    duration_weeks: draft.duration_weeks,
                    instructor_name: draft.instructor_name.clone(),
                    thumbnail_url: draft.thumbnail_url.clone(),
                    is_active: draft.is_active,
                    created_at: now,
                    updated_at: now,
                };
                inner.courses.insert(course.title.clone(), course.clone());
                (course, true)
            }
        }
    }

    /// Seeds the default "Introduction" module and "Getting Started" lesson,
    /// then expands any structured curriculum weeks. The caller gates this on
    /// the upsert's `created` flag; children are never reconciled on re-sync.
    pub async fn seed_course_children(
        &self,
        course_id: Uuid,
        curriculum: &[CurriculumWeek],
    ) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.courses.values().any(|c| c.id == course_id) {
            return Err(StoreError::CourseNotFound(course_id));
        }

        let mut created = 0usize;
        let intro = CourseModule {
            id: Uuid::new_v4(),
            course_id,
            title: "Introduction".to_string(),
            description: Some("Introduction to the course".to_string()),
            order: 1,
        };
        inner.lessons.push(Lesson {
            id: Uuid::new_v4(),
            module_id: intro.id,
            title: "Getting Started".to_string(),
            content_type: ContentType::Video,
            content: "Introduction to the course concepts".to_string(),
            video_url: None,
            order: 1,
            estimated_time_minutes: 15,
        });
        inner.modules.push(intro);
        created += 2;

        for (offset, week) in curriculum.iter().enumerate() {
            let order = offset as u32 + 2;
            let module = CourseModule {
                id: Uuid::new_v4(),
                course_id,
                title: format!(
                    "Week {}: {}",
                    offset + 1,
                    week.title.as_deref().unwrap_or("Course Content")
                ),
                description: week.description.clone(),
                order,
            };
            for (idx, lesson) in week.lessons.iter().enumerate() {
                let lesson_order = idx as u32 + 1;
                inner.lessons.push(Lesson {
                    id: Uuid::new_v4(),
                    module_id: module.id,
                    title: lesson
                        .title
                        .clone()
                        .unwrap_or_else(|| format!("Lesson {lesson_order}")),
                    content_type: ContentType::Video,
                    content: lesson.description.clone().unwrap_or_default(),
                    video_url: None,
                    order: lesson_order,
                    estimated_time_minutes: 30,
                });
                created += 1;
            }
            inner.modules.push(module);
            created += 1;
        }
        Ok(created)
    }

    pub async fn jobs(&self) -> Vec<JobListing> {
        let mut out: Vec<_> = self.inner.read().await.jobs.values().cloned().collect();
        out.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        out
    }

    pub async fn active_jobs(&self, now: DateTime<Utc>) -> Vec<JobListing> {
        let mut out: Vec<_> = self
            .inner
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.is_active(now))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        out
    }

    pub async fn job(&self, id: Uuid) -> Option<JobListing> {
        self.inner
            .read()
            .await
            .jobs
            .values()
            .find(|j| j.id == id)
            .cloned()
    }

    pub async fn courses(&self) -> Vec<Course> {
        let mut out: Vec<_> = self.inner.read().await.courses.values().cloned().collect();
        out.sort_by(|a, b| a.title.cmp(&b.title));
        out
    }

    pub async fn course(&self, id: Uuid) -> Option<Course> {
        self.inner
            .read()
            .await
            .courses
            .values()
            .find(|c| c.id == id)
            .cloned()
    }

    pub async fn modules_for_course(&self, course_id: Uuid) -> Vec<CourseModule> {
        let mut out: Vec<_> = self
            .inner
            .read()
            .await
            .modules
            .iter()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect();
        out.sort_by_key(|m| m.order);
        out
    }

    pub async fn lessons_for_module(&self, module_id: Uuid) -> Vec<Lesson> {
        let mut out: Vec<_> = self
            .inner
            .read()
            .await
            .lessons
            .iter()
            .filter(|l| l.module_id == module_id)
            .cloned()
            .collect();
        out.sort_by_key(|l| l.order);
        out
    }

    pub async fn insert_alert(&self, alert: AlertCriteria) {
        self.inner.write().await.alerts.insert(alert.id, alert);
    }

    pub async fn alerts(&self) -> Vec<AlertCriteria> {
        let mut out: Vec<_> = self.inner.read().await.alerts.values().cloned().collect();
        out.sort_by_key(|a| a.created_at);
        out
    }

    pub async fn alert(&self, id: Uuid) -> Option<AlertCriteria> {
        self.inner.read().await.alerts.get(&id).cloned()
    }

    /// Monotonic update of an alert's last-notified timestamp: a stamp older
    /// than the current one is ignored, so concurrent matcher passes can only
    /// move the timestamp forward.
    pub async fn mark_alert_notified(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let alert = inner.alerts.get_mut(&id).ok_or(StoreError::AlertNotFound(id))?;
        if alert.last_notified_at.map_or(true, |prev| now > prev) {
            alert.last_notified_at = Some(now);
        }
        Ok(())
    }

    pub async fn counts(&self) -> StoreCounts {
        let inner = self.inner.read().await;
        StoreCounts {
            jobs: inner.jobs.len(),
            courses: inner.courses.len(),
            alerts: inner.alerts.len(),
            companies: inner.companies.len(),
            skills: inner.skills.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub jobs: usize,
    pub courses: usize,
    pub alerts: usize,
    pub companies: usize,
    pub skills: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retryable,
    NonRetryable,
}

pub fn classify_status(status: StatusCode) -> RetryDisposition {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

pub fn classify_reqwest_error(err: &reqwest::Error) -> RetryDisposition {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt_index: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt_index as u32).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor);
        delay.min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub backoff: BackoffPolicy,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            // Outbound fetches are bounded; a stuck source must not stall a
            // sync tick for longer than this.
            timeout: Duration::from_secs(8),
            user_agent: None,
            backoff: BackoffPolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed after retries: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

/// Thin reqwest wrapper: one GET per call, source-specific query/headers,
/// bounded timeout, retry on retryable dispositions with capped backoff.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    backoff: BackoffPolicy,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder.build().context("building reqwest client")?;
        Ok(Self {
            client,
            backoff: config.backoff,
        })
    }

    pub async fn get_json(
        &self,
        source_id: &str,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&'static str, String)],
    ) -> Result<JsonValue, FetchError> {
        let span = info_span!("http_fetch", source_id, url);
        let _guard = span.enter();

        let mut last_request_error: Option<reqwest::Error> = None;

        for attempt in 0..=self.backoff.max_retries {
            let mut request = self.client.get(url).query(query);
            for (name, value) in headers {
                request = request.header(*name, value);
            }

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let final_url = resp.url().to_string();
                    if status.is_success() {
                        return Ok(resp.json::<JsonValue>().await?);
                    }
                    if classify_status(status) == RetryDisposition::Retryable
                        && attempt < self.backoff.max_retries
                    {
                        tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                        continue;
                    }
                    return Err(FetchError::HttpStatus {
                        status: status.as_u16(),
                        url: final_url,
                    });
                }
                Err(err) => {
                    if classify_reqwest_error(&err) == RetryDisposition::Retryable
                        && attempt < self.backoff.max_retries
                    {
                        last_request_error = Some(err);
                        tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                        continue;
                    }
                    return Err(FetchError::Request(err));
                }
            }
        }

        Err(FetchError::Request(
            last_request_error.expect("retry loop captures a request error"),
        ))
    }
}
