//! Sync orchestration: scheduled source pulls, upserts, and alert matching.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use skillbridge_core::{AlertCriteria, JobListing};
use skillbridge_sources::{
    course_source_for, job_source_for, map_course, map_job, CourseSource, FetchParams, JobSource,
    SourceCredentials, SourcesConfig,
};
use skillbridge_storage::{CareerStore, HttpClientConfig, HttpFetcher};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};
use uuid::Uuid;

pub const CRATE_NAME: &str = "skillbridge-sync";

/// Matched jobs older than this never appear in an alert digest.
pub const ALERT_LOOKBACK_DAYS: i64 = 7;

fn default_job_sources() -> Vec<String> {
    vec![
        "indeed".to_string(),
        "linkedin".to_string(),
        "workday".to_string(),
    ]
}

fn default_course_sources() -> Vec<String> {
    vec!["udemy".to_string(), "coursera".to_string()]
}

/// Which sources each sync pass iterates, in order. Loaded from an optional
/// `sources.yaml` at the workspace root; absent file means the built-in set.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRegistry {
    #[serde(default = "default_job_sources")]
    pub job_sources: Vec<String>,
    #[serde(default = "default_course_sources")]
    pub course_sources: Vec<String>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self {
            job_sources: default_job_sources(),
            course_sources: default_course_sources(),
        }
    }
}

impl SourceRegistry {
    pub fn from_workspace_root(root: &Path) -> Result<Self> {
        let path = root.join("sources.yaml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub use_live_job_sources: bool,
    pub use_live_course_sources: bool,
    pub job_sync_interval_hours: u32,
    pub course_sync_interval_hours: u32,
    pub scheduler_enabled: bool,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub workspace_root: PathBuf,
    pub credentials: HashMap<String, SourceCredentials>,
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(false)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let mut credentials = HashMap::new();
        credentials.insert(
            "indeed".to_string(),
            SourceCredentials {
                api_key: std::env::var("INDEED_PUBLISHER_ID").ok(),
                ..SourceCredentials::default()
            },
        );
        credentials.insert(
            "linkedin".to_string(),
            SourceCredentials {
                api_key: std::env::var("LINKEDIN_API_KEY").ok(),
                ..SourceCredentials::default()
            },
        );
        credentials.insert(
            "workday".to_string(),
            SourceCredentials {
                api_key: std::env::var("WORKDAY_API_KEY").ok(),
                tenant_id: std::env::var("WORKDAY_TENANT_ID").ok(),
                ..SourceCredentials::default()
            },
        );
        credentials.insert(
            "udemy".to_string(),
            SourceCredentials {
                api_key: std::env::var("UDEMY_CLIENT_ID").ok(),
                api_secret: std::env::var("UDEMY_CLIENT_SECRET").ok(),
                ..SourceCredentials::default()
            },
        );
        credentials.insert(
            "coursera".to_string(),
            SourceCredentials {
                api_key: std::env::var("COURSERA_API_KEY").ok(),
                ..SourceCredentials::default()
            },
        );

        Self {
            use_live_job_sources: env_flag("SKILLBRIDGE_USE_LIVE_JOB_SOURCES"),
            use_live_course_sources: env_flag("SKILLBRIDGE_USE_LIVE_COURSE_SOURCES"),
            job_sync_interval_hours: env_parse("SKILLBRIDGE_JOB_SYNC_HOURS", 6),
            course_sync_interval_hours: env_parse("SKILLBRIDGE_COURSE_SYNC_HOURS", 12),
            scheduler_enabled: env_flag("SKILLBRIDGE_SCHEDULER_ENABLED"),
            http_timeout_secs: env_parse("SKILLBRIDGE_HTTP_TIMEOUT_SECS", 8),
            user_agent: std::env::var("SKILLBRIDGE_USER_AGENT")
                .unwrap_or_else(|_| "skillbridge-sync/0.1".to_string()),
            workspace_root: PathBuf::from("."),
            credentials,
        }
    }

    pub fn sources_config(&self) -> SourcesConfig {
        SourcesConfig {
            use_live_job_sources: self.use_live_job_sources,
            use_live_course_sources: self.use_live_course_sources,
            credentials: self.credentials.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Jobs,
    Courses,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source_id: String,
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub seeded_children: usize,
}

impl SourceOutcome {
    fn new(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            fetched: 0,
            created: 0,
            updated: 0,
            skipped: 0,
            seeded_children: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub run_id: Uuid,
    pub kind: SyncKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceOutcome>,
    pub total_synced: usize,
}

/// Drives one sync pass per call. Source clients are resolved once at
/// construction from injected configuration; a run never consults env state.
pub struct SyncOrchestrator {
    store: Arc<CareerStore>,
    http: HttpFetcher,
    job_sources: Vec<Box<dyn JobSource>>,
    course_sources: Vec<Box<dyn CourseSource>>,
}

impl SyncOrchestrator {
    pub fn new(
        config: &SyncConfig,
        registry: &SourceRegistry,
        store: Arc<CareerStore>,
    ) -> Result<Self> {
        let http = HttpFetcher::new(HttpClientConfig {
            timeout: StdDuration::from_secs(config.http_timeout_secs),
            user_agent: Some(config.user_agent.clone()),
            ..Default::default()
        })?;
        let sources_config = config.sources_config();

        let mut job_sources = Vec::new();
        for source_id in &registry.job_sources {
            match job_source_for(source_id, &sources_config) {
                Some(source) => job_sources.push(source),
                None => warn!(source_id = source_id.as_str(), "no job source client registered; skipping"),
            }
        }
        let mut course_sources = Vec::new();
        for source_id in &registry.course_sources {
            match course_source_for(source_id, &sources_config) {
                Some(source) => course_sources.push(source),
                None => warn!(source_id = source_id.as_str(), "no course source client registered; skipping"),
            }
        }

        Ok(Self {
            store,
            http,
            job_sources,
            course_sources,
        })
    }

    pub fn from_env(store: Arc<CareerStore>) -> Result<Self> {
        let config = SyncConfig::from_env();
        let registry = SourceRegistry::from_workspace_root(&config.workspace_root)?;
        Self::new(&config, &registry, store)
    }

    pub fn store(&self) -> &Arc<CareerStore> {
        &self.store
    }

    /// One pass over every configured job source. A record that fails to map
    /// is skipped; a source that fails to fetch contributes zero records.
    /// Neither aborts the pass.
    pub async fn run_job_sync(&self) -> SyncSummary {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let params = FetchParams::default();
        let mut sources = Vec::with_capacity(self.job_sources.len());
        let mut total_synced = 0usize;

        for source in &self.job_sources {
            let mut outcome = SourceOutcome::new(source.source_id());
            let records = source.fetch(&self.http, &params).await;
            outcome.fetched = records.len();

            for raw in &records {
                let now = Utc::now();
                match map_job(&self.store, source.payload_shape(), raw, now).await {
                    Ok(draft) => {
                        let (_, created) = self.store.upsert_job(draft, now).await;
                        if created {
                            outcome.created += 1;
                        } else {
                            outcome.updated += 1;
                        }
                        total_synced += 1;
                    }
                    Err(err) => {
                        warn!(source_id = source.source_id(), error = %err, "skipping unmappable job record");
                        outcome.skipped += 1;
                    }
                }
            }

            info!(
                run_id = %run_id,
                source_id = source.source_id(),
                fetched = outcome.fetched,
                created = outcome.created,
                updated = outcome.updated,
                skipped = outcome.skipped,
                "job source synced"
            );
            sources.push(outcome);
        }

        SyncSummary {
            run_id,
            kind: SyncKind::Jobs,
            started_at,
            finished_at: Utc::now(),
            sources,
            total_synced,
        }
    }

    /// One pass over every configured course source. Child modules/lessons
    /// are seeded only when the upsert reports first creation.
    pub async fn run_course_sync(&self) -> SyncSummary {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let params = FetchParams::default();
        let mut sources = Vec::with_capacity(self.course_sources.len());
        let mut total_synced = 0usize;

        for source in &self.course_sources {
            let mut outcome = SourceOutcome::new(source.source_id());
            let records = source.fetch(&self.http, &params).await;
            outcome.fetched = records.len();

            for raw in &records {
                let now = Utc::now();
                match map_course(&self.store, source.payload_shape(), raw).await {
                    Ok(draft) => {
                        let (course, created) = self.store.upsert_course(&draft, now).await;
                        if created {
                            outcome.created += 1;
                            match self
                                .store
                                .seed_course_children(course.id, &draft.curriculum)
                                .await
                            {
                                Ok(seeded) => outcome.seeded_children += seeded,
                                Err(err) => {
                                    warn!(source_id = source.source_id(), course_id = %course.id, error = %err, "seeding course children failed")
                                }
                            }
                        } else {
                            outcome.updated += 1;
                        }
                        total_synced += 1;
                    }
                    Err(err) => {
                        warn!(source_id = source.source_id(), error = %err, "skipping unmappable course record");
                        outcome.skipped += 1;
                    }
                }
            }

            info!(
                run_id = %run_id,
                source_id = source.source_id(),
                fetched = outcome.fetched,
                created = outcome.created,
                updated = outcome.updated,
                seeded_children = outcome.seeded_children,
                "course source synced"
            );
            sources.push(outcome);
        }

        SyncSummary {
            run_id,
            kind: SyncKind::Courses,
            started_at,
            finished_at: Utc::now(),
            sources,
            total_synced,
        }
    }
}

/// An alert is due when active and outside its frequency cooldown. A
/// never-notified alert is always due.
pub fn alert_due(alert: &AlertCriteria, now: DateTime<Utc>) -> bool {
    if !alert.is_active {
        return false;
    }
    match alert.last_notified_at {
        None => true,
        Some(last) => now - last >= Duration::days(alert.frequency.cooldown_days()),
    }
}

fn keyword_tokens_match(keywords: &str, job: &JobListing) -> bool {
    let haystack = format!("{} {}", job.title, job.description).to_lowercase();
    let mut tokens = keywords.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return true;
    }
    tokens.any(|token| haystack.contains(&token.to_lowercase()))
}

fn job_matches(alert: &AlertCriteria, job: &JobListing) -> bool {
    if let Some(keywords) = &alert.keywords {
        if !keyword_tokens_match(keywords, job) {
            return false;
        }
    }
    if !alert.location_ids.is_empty() && !alert.location_ids.contains(&job.location_id) {
        return false;
    }
    if !alert.skill_ids.is_empty()
        && !alert
            .skill_ids
            .iter()
            .any(|skill| job.required_skill_ids.contains(skill))
    {
        return false;
    }
    if let Some(wants_remote) = alert.is_remote {
        if job.is_remote != wants_remote {
            return false;
        }
    }
    job.experience_required_years >= alert.experience_min
        && job.experience_required_years <= alert.experience_max
}

/// Conjunction of the alert's configured predicates over active jobs posted
/// within the lookback window. An alert with no predicates matches every
/// recent active job.
pub async fn matching_jobs(
    store: &CareerStore,
    alert: &AlertCriteria,
    now: DateTime<Utc>,
) -> Vec<JobListing> {
    let cutoff = now - Duration::days(ALERT_LOOKBACK_DAYS);
    store
        .active_jobs(now)
        .await
        .into_iter()
        .filter(|job| job.posted_at >= cutoff)
        .filter(|job| job_matches(alert, job))
        .collect()
}

/// One matcher pass over all alerts. Delivery is a structured log line; the
/// notified timestamp only advances when at least one job matched. A failure
/// on one alert never blocks the rest.
pub async fn process_alerts(store: &CareerStore, now: DateTime<Utc>) -> usize {
    let mut notified = 0usize;
    for alert in store.alerts().await {
        if !alert_due(&alert, now) {
            continue;
        }
        let matches = matching_jobs(store, &alert, now).await;
        if matches.is_empty() {
            continue;
        }
        info!(
            alert_id = %alert.id,
            owner_id = %alert.owner_id,
            title = alert.title.as_str(),
            matches = matches.len(),
            "delivering job alert digest"
        );
        match store.mark_alert_notified(alert.id, now).await {
            Ok(()) => notified += 1,
            Err(err) => warn!(alert_id = %alert.id, error = %err, "recording alert delivery failed"),
        }
    }
    notified
}

/// Interval-hours to six-field cron. Hours are clamped to 1..=23 so the
/// `*/n` step stays within a single day.
pub fn cron_for_interval_hours(hours: u32) -> String {
    let hours = hours.clamp(1, 23);
    format!("0 0 */{hours} * * *")
}

/// Builds the background scheduler when enabled: one job per sync domain at
/// its configured interval, plus an hourly alert-matcher pass. The returned
/// scheduler is not yet started.
pub async fn maybe_build_scheduler(
    config: &SyncConfig,
    orchestrator: Arc<SyncOrchestrator>,
) -> Result<Option<JobScheduler>> {
    if !config.scheduler_enabled {
        return Ok(None);
    }

    let sched = JobScheduler::new().await.context("creating scheduler")?;

    let job_cron = cron_for_interval_hours(config.job_sync_interval_hours);
    let orch = orchestrator.clone();
    let job_sync = Job::new_async(job_cron.as_str(), move |_uuid, _lock| {
        let orch = orch.clone();
        Box::pin(async move {
            let summary = orch.run_job_sync().await;
            info!(run_id = %summary.run_id, total_synced = summary.total_synced, "scheduled job sync finished");
        })
    })
    .with_context(|| format!("creating job sync schedule for cron {job_cron}"))?;
    sched.add(job_sync).await.context("adding job sync schedule")?;

    let course_cron = cron_for_interval_hours(config.course_sync_interval_hours);
    let orch = orchestrator.clone();
    let course_sync = Job::new_async(course_cron.as_str(), move |_uuid, _lock| {
        let orch = orch.clone();
        Box::pin(async move {
            let summary = orch.run_course_sync().await;
            info!(run_id = %summary.run_id, total_synced = summary.total_synced, "scheduled course sync finished");
        })
    })
    .with_context(|| format!("creating course sync schedule for cron {course_cron}"))?;
    sched
        .add(course_sync)
        .await
        .context("adding course sync schedule")?;

    let orch = orchestrator.clone();
    let alerts = Job::new_async("0 0 * * * *", move |_uuid, _lock| {
        let orch = orch.clone();
        Box::pin(async move {
            let notified = process_alerts(orch.store(), Utc::now()).await;
            info!(notified, "scheduled alert pass finished");
        })
    })
    .context("creating alert schedule")?;
    sched.add(alerts).await.context("adding alert schedule")?;

    Ok(Some(sched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use skillbridge_core::{AlertFrequency, ApplicationStatus, JobDraft};
    use skillbridge_storage::LookupKind;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).single().unwrap()
    }

    fn test_config() -> SyncConfig {
        SyncConfig {
            use_live_job_sources: false,
            use_live_course_sources: false,
            job_sync_interval_hours: 6,
            course_sync_interval_hours: 12,
            scheduler_enabled: false,
            http_timeout_secs: 8,
            user_agent: "skillbridge-test/0".to_string(),
            workspace_root: PathBuf::from("."),
            credentials: HashMap::new(),
        }
    }

    fn orchestrator(store: Arc<CareerStore>) -> SyncOrchestrator {
        SyncOrchestrator::new(&test_config(), &SourceRegistry::default(), store).unwrap()
    }

    async fn seed_job(
        store: &CareerStore,
        title: &str,
        description: &str,
        skill_names: &[&str],
        is_remote: bool,
        posted_at: DateTime<Utc>,
    ) -> JobListing {
        let company = store.get_or_create(LookupKind::Company, "Tech Innovations").await;
        let location = store.get_or_create(LookupKind::Location, "San Francisco, CA").await;
        let employment = store.get_or_create(LookupKind::EmploymentType, "Full-time").await;
        let mut skills = Vec::new();
        for name in skill_names {
            skills.push(store.get_or_create(LookupKind::Skill, name).await.id);
        }
        let (listing, _) = store
            .upsert_job(
                JobDraft {
                    title: title.to_string(),
                    company_id: company.id,
                    description: description.to_string(),
                    requirements: String::new(),
                    responsibilities: String::new(),
                    location_id: location.id,
                    employment_type_id: employment.id,
                    is_remote,
                    salary_min: None,
                    salary_max: None,
                    required_skill_ids: skills,
                    experience_required_years: 0,
                    apply_url: None,
                    status: ApplicationStatus::Open,
                    posted_at,
                    closes_at: None,
                },
                posted_at,
            )
            .await;
        listing
    }

    #[tokio::test]
    async fn mock_job_sync_lands_five_listings_and_is_idempotent() {
        let store = Arc::new(CareerStore::new());
        let orch = orchestrator(store.clone());

        let first = orch.run_job_sync().await;
        // Three registered sources all serve the same mock batch; the
        // natural key collapses them to one listing each.
        assert_eq!(first.sources.len(), 3);
        assert_eq!(first.sources[0].created, 5);
        assert_eq!(store.jobs().await.len(), 5);

        let second = orch.run_job_sync().await;
        assert!(second.sources.iter().all(|s| s.created == 0));
        assert_eq!(store.jobs().await.len(), 5);
    }

    #[tokio::test]
    async fn mock_course_sync_seeds_children_only_on_first_run() {
        let store = Arc::new(CareerStore::new());
        let orch = orchestrator(store.clone());

        let first = orch.run_course_sync().await;
        assert_eq!(store.courses().await.len(), 5);
        assert!(first.sources[0].seeded_children > 0);

        let course = store
            .courses()
            .await
            .into_iter()
            .find(|c| c.title == "Python for Data Science")
            .unwrap();
        let modules = store.modules_for_course(course.id).await;
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].title, "Introduction");

        let second = orch.run_course_sync().await;
        assert!(second.sources.iter().all(|s| s.seeded_children == 0));
        assert_eq!(store.modules_for_course(course.id).await.len(), 1);
    }

    #[test]
    fn weekly_alert_cooldown_is_seven_exact_days() {
        let mut alert = AlertCriteria::new(Uuid::new_v4(), "python", ts(1));
        alert.frequency = AlertFrequency::Weekly;

        assert!(alert_due(&alert, ts(1)));

        alert.last_notified_at = Some(ts(10));
        assert!(!alert_due(&alert, ts(13)));
        assert!(alert_due(&alert, ts(18)));

        alert.is_active = false;
        assert!(!alert_due(&alert, ts(25)));
    }

    #[tokio::test]
    async fn empty_criteria_match_all_recent_active_jobs() {
        let store = CareerStore::new();
        seed_job(&store, "Backend Engineer", "APIs", &[], false, ts(9)).await;
        seed_job(&store, "Old Posting", "stale", &[], false, ts(1)).await;

        let alert = AlertCriteria::new(Uuid::new_v4(), "everything", ts(1));
        let matches = matching_jobs(&store, &alert, ts(10)).await;

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title, "Backend Engineer");
    }

    #[tokio::test]
    async fn keyword_tokens_are_or_combined() {
        let store = CareerStore::new();
        seed_job(&store, "Senior Python Developer", "backend", &[], false, ts(9)).await;
        seed_job(&store, "DevOps Engineer", "pipelines", &[], true, ts(9)).await;
        seed_job(&store, "Graphic Designer", "branding", &[], false, ts(9)).await;

        let mut alert = AlertCriteria::new(Uuid::new_v4(), "infra", ts(1));
        alert.keywords = Some("python devops".to_string());

        let matches = matching_jobs(&store, &alert, ts(10)).await;
        let titles: Vec<_> = matches.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"Senior Python Developer"));
        assert!(titles.contains(&"DevOps Engineer"));
    }

    #[tokio::test]
    async fn skills_only_criteria_ignore_location_and_keywords() {
        let store = CareerStore::new();
        seed_job(&store, "Quant Analyst", "pricing models", &["Python"], false, ts(9)).await;
        seed_job(&store, "Python Evangelist", "talks", &["Python"], true, ts(9)).await;
        seed_job(&store, "Accountant", "ledgers", &[], false, ts(9)).await;

        let python = store.get_or_create(LookupKind::Skill, "Python").await;
        let mut alert = AlertCriteria::new(Uuid::new_v4(), "python anywhere", ts(1));
        alert.skill_ids = vec![python.id];

        let matches = matching_jobs(&store, &alert, ts(10)).await;
        assert_eq!(matches.len(), 2);
        assert!(matches
            .iter()
            .all(|job| job.required_skill_ids.contains(&python.id)));
    }

    #[tokio::test]
    async fn skill_and_remote_predicates_are_conjoined() {
        let store = CareerStore::new();
        seed_job(&store, "Remote Python", "remote", &["Python"], true, ts(9)).await;
        seed_job(&store, "Onsite Python", "office", &["Python"], false, ts(9)).await;
        seed_job(&store, "Remote Frontend", "remote", &["React"], true, ts(9)).await;

        let python = store.get_or_create(LookupKind::Skill, "Python").await;
        let mut alert = AlertCriteria::new(Uuid::new_v4(), "remote python", ts(1));
        alert.skill_ids = vec![python.id];
        alert.is_remote = Some(true);

        let matches = matching_jobs(&store, &alert, ts(10)).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title, "Remote Python");
    }

    #[tokio::test]
    async fn alert_pass_notifies_due_alerts_with_matches_only() {
        let store = CareerStore::new();
        seed_job(&store, "Python Developer", "backend", &[], false, ts(9)).await;

        let due = AlertCriteria::new(Uuid::new_v4(), "python", ts(1));
        let due_id = due.id;
        let mut not_due = AlertCriteria::new(Uuid::new_v4(), "python again", ts(1));
        not_due.last_notified_at = Some(ts(9));
        let mut no_match = AlertCriteria::new(Uuid::new_v4(), "cobol", ts(1));
        no_match.keywords = Some("cobol".to_string());
        store.insert_alert(due).await;
        store.insert_alert(not_due.clone()).await;
        store.insert_alert(no_match.clone()).await;

        let notified = process_alerts(&store, ts(10)).await;

        assert_eq!(notified, 1);
        assert_eq!(
            store.alert(due_id).await.unwrap().last_notified_at,
            Some(ts(10))
        );
        assert_eq!(
            store.alert(not_due.id).await.unwrap().last_notified_at,
            Some(ts(9))
        );
        assert_eq!(store.alert(no_match.id).await.unwrap().last_notified_at, None);
    }

    #[test]
    fn interval_hours_become_clamped_cron_steps() {
        assert_eq!(cron_for_interval_hours(6), "0 0 */6 * * *");
        assert_eq!(cron_for_interval_hours(0), "0 0 */1 * * *");
        assert_eq!(cron_for_interval_hours(48), "0 0 */23 * * *");
    }
}
