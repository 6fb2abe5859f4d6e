//! Source client contracts, live/mock clients, and the field mapper.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use skillbridge_core::{
    ApplicationStatus, CourseDraft, CurriculumLesson, CurriculumWeek, DifficultyLevel, JobDraft,
    DEFAULT_EMPLOYMENT_TYPE, UNCATEGORIZED, UNKNOWN_COMPANY, UNKNOWN_COURSE, UNKNOWN_INSTRUCTOR,
    UNKNOWN_LOCATION, UNKNOWN_TITLE,
};
use skillbridge_storage::{CareerStore, HttpFetcher, LookupKind};
use thiserror::Error;
use tracing::error;

pub const CRATE_NAME: &str = "skillbridge-sources";

/// Closed vocabulary for the skill-tag heuristic. Substring matching against
/// this list misses anything not listed and can false-positive on substrings
/// ("java" inside "javascript", "sql" inside "postgresql"); that is the
/// intended crude allow-list, not general extraction.
pub const SKILL_VOCABULARY: &[&str] = &[
    "python",
    "javascript",
    "react",
    "django",
    "sql",
    "java",
    "aws",
    "docker",
];

#[derive(Debug, Error)]
pub enum MapError {
    #[error("record is not a JSON object")]
    NotAnObject,
}

/// Wire shape of a source's records; the mapper dispatches on this instead of
/// comparing source-name strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPayloadShape {
    Indeed,
    LinkedIn,
    Workday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoursePayloadShape {
    Udemy,
    Coursera,
}

#[derive(Debug, Clone, Default)]
pub struct FetchParams {
    pub query: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceCredentials {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub tenant_id: Option<String>,
}

/// Injected configuration for the client factory; no hidden global state.
#[derive(Debug, Clone, Default)]
pub struct SourcesConfig {
    pub use_live_job_sources: bool,
    pub use_live_course_sources: bool,
    pub credentials: HashMap<String, SourceCredentials>,
}

impl SourcesConfig {
    fn credential(&self, source_id: &str) -> SourceCredentials {
        self.credentials.get(source_id).cloned().unwrap_or_default()
    }
}

/// One outbound request per call, first page only. Transport failures are
/// logged and yield an empty batch; nothing escapes this boundary, so callers
/// cannot tell "no new records" from "source unreachable" (accepted
/// trade-off).
#[async_trait]
pub trait JobSource: Send + Sync {
    fn source_id(&self) -> &'static str;
    fn payload_shape(&self) -> JobPayloadShape;
    async fn fetch(&self, http: &HttpFetcher, params: &FetchParams) -> Vec<JsonValue>;
}

#[async_trait]
pub trait CourseSource: Send + Sync {
    fn source_id(&self) -> &'static str;
    fn payload_shape(&self) -> CoursePayloadShape;
    async fn fetch(&self, http: &HttpFetcher, params: &FetchParams) -> Vec<JsonValue>;
}

fn records_under(body: &JsonValue, key: &str) -> Vec<JsonValue> {
    body.get(key)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

struct IndeedSource {
    publisher_id: String,
}

#[async_trait]
impl JobSource for IndeedSource {
    fn source_id(&self) -> &'static str {
        "indeed"
    }

    fn payload_shape(&self) -> JobPayloadShape {
        JobPayloadShape::Indeed
    }

    async fn fetch(&self, http: &HttpFetcher, params: &FetchParams) -> Vec<JsonValue> {
        let mut query = vec![
            ("publisher", self.publisher_id.clone()),
            ("format", "json".to_string()),
            ("v", "2".to_string()),
            ("limit", "25".to_string()),
            ("fromage", "14".to_string()),
            ("highlight", "0".to_string()),
        ];
        if let Some(q) = &params.query {
            query.push(("q", q.clone()));
        }
        if let Some(l) = &params.location {
            query.push(("l", l.clone()));
        }
        match http
            .get_json(self.source_id(), "https://api.indeed.com/ads/apisearch", &query, &[])
            .await
        {
            Ok(body) => records_under(&body, "results"),
            Err(err) => {
                error!(source_id = self.source_id(), error = %err, "job source fetch failed");
                Vec::new()
            }
        }
    }
}

struct LinkedInSource {
    api_key: String,
}

#[async_trait]
impl JobSource for LinkedInSource {
    fn source_id(&self) -> &'static str {
        "linkedin"
    }

    fn payload_shape(&self) -> JobPayloadShape {
        JobPayloadShape::LinkedIn
    }

    async fn fetch(&self, http: &HttpFetcher, params: &FetchParams) -> Vec<JsonValue> {
        let mut query = vec![("count", "25".to_string()), ("start", "0".to_string())];
        if let Some(q) = &params.query {
            query.push(("keywords", q.clone()));
        }
        let headers = [
            ("authorization", format!("Bearer {}", self.api_key)),
            ("accept", "application/json".to_string()),
        ];
        match http
            .get_json(
                self.source_id(),
                "https://api.linkedin.com/v2/jobSearch",
                &query,
                &headers,
            )
            .await
        {
            Ok(body) => records_under(&body, "elements"),
            Err(err) => {
                error!(source_id = self.source_id(), error = %err, "job source fetch failed");
                Vec::new()
            }
        }
    }
}

struct WorkdaySource {
    api_key: String,
    tenant_id: String,
}

#[async_trait]
impl JobSource for WorkdaySource {
    fn source_id(&self) -> &'static str {
        "workday"
    }

    fn payload_shape(&self) -> JobPayloadShape {
        JobPayloadShape::Workday
    }

    async fn fetch(&self, http: &HttpFetcher, _params: &FetchParams) -> Vec<JsonValue> {
        let url = format!(
            "https://api.workday.com/tenants/{}/job-postings/v1",
            self.tenant_id
        );
        let query = vec![
            ("limit", "25".to_string()),
            ("offset", "0".to_string()),
            ("active", "true".to_string()),
        ];
        let headers = [
            ("authorization", format!("Bearer {}", self.api_key)),
            ("accept", "application/json".to_string()),
        ];
        match http.get_json(self.source_id(), &url, &query, &headers).await {
            Ok(body) => records_under(&body, "data"),
            Err(err) => {
                error!(source_id = self.source_id(), error = %err, "job source fetch failed");
                Vec::new()
            }
        }
    }
}

struct UdemySource {
    client_id: String,
    client_secret: String,
}

#[async_trait]
impl CourseSource for UdemySource {
    fn source_id(&self) -> &'static str {
        "udemy"
    }

    fn payload_shape(&self) -> CoursePayloadShape {
        CoursePayloadShape::Udemy
    }

    async fn fetch(&self, http: &HttpFetcher, params: &FetchParams) -> Vec<JsonValue> {
        let mut query = vec![
            ("page", "1".to_string()),
            ("page_size", "20".to_string()),
            (
                "fields[course]",
                "title,headline,description,url,image_480x270,price,instructional_level,visible_instructors"
                    .to_string(),
            ),
        ];
        if let Some(q) = &params.query {
            query.push(("search", q.clone()));
        }
        let headers = [
            (
                "authorization",
                format!("Basic {}:{}", self.client_id, self.client_secret),
            ),
            ("accept", "application/json, text/plain, */*".to_string()),
        ];
        match http
            .get_json(
                self.source_id(),
                "https://www.udemy.com/api-2.0/courses/",
                &query,
                &headers,
            )
            .await
        {
            Ok(body) => records_under(&body, "results"),
            Err(err) => {
                error!(source_id = self.source_id(), error = %err, "course source fetch failed");
                Vec::new()
            }
        }
    }
}

struct CourseraSource {
    api_key: String,
}

#[async_trait]
impl CourseSource for CourseraSource {
    fn source_id(&self) -> &'static str {
        "coursera"
    }

    fn payload_shape(&self) -> CoursePayloadShape {
        CoursePayloadShape::Coursera
    }

    async fn fetch(&self, http: &HttpFetcher, params: &FetchParams) -> Vec<JsonValue> {
        let mut query = vec![
            (
                "fields",
                "name,slug,description,photoUrl,instructorIds,partnerIds,specializations,primaryLanguages,s12nIds,domainTypes"
                    .to_string(),
            ),
            ("includes", "instructorIds,partnerIds,s12nIds,domainTypes".to_string()),
            ("limit", "20".to_string()),
            ("start", "0".to_string()),
        ];
        if let Some(q) = &params.query {
            query.push(("q", q.clone()));
        }
        let headers = [
            ("authorization", format!("Bearer {}", self.api_key)),
            ("accept", "application/json".to_string()),
        ];
        match http
            .get_json(
                self.source_id(),
                "https://api.coursera.org/api/courses.v1",
                &query,
                &headers,
            )
            .await
        {
            Ok(body) => records_under(&body, "elements"),
            Err(err) => {
                error!(source_id = self.source_id(), error = %err, "course source fetch failed");
                Vec::new()
            }
        }
    }
}

/// Fixed in-memory record set in the indeed wire shape; substituted for every
/// job source whenever live sources are disabled, so the pipeline runs
/// without external credentials.
pub struct MockJobSource;

#[async_trait]
impl JobSource for MockJobSource {
    fn source_id(&self) -> &'static str {
        "mock-jobs"
    }

    fn payload_shape(&self) -> JobPayloadShape {
        JobPayloadShape::Indeed
    }

    async fn fetch(&self, _http: &HttpFetcher, _params: &FetchParams) -> Vec<JsonValue> {
        mock_job_records()
    }
}

pub struct MockCourseSource;

#[async_trait]
impl CourseSource for MockCourseSource {
    fn source_id(&self) -> &'static str {
        "mock-courses"
    }

    fn payload_shape(&self) -> CoursePayloadShape {
        CoursePayloadShape::Udemy
    }

    async fn fetch(&self, _http: &HttpFetcher, _params: &FetchParams) -> Vec<JsonValue> {
        mock_course_records()
    }
}

pub fn mock_job_records() -> Vec<JsonValue> {
    vec![
        json!({
            "jobtitle": "Senior Python Developer",
            "company": "Tech Innovations",
            "city": "San Francisco",
            "state": "CA",
            "snippet": "Experienced Python developer needed for backend development. Skills: Python, Django, PostgreSQL, AWS, Docker. 5+ years experience required.",
            "url": "https://example.com/jobs/1",
            "formattedRelativeTime": "1 day ago",
            "salary": "$120,000 - $150,000"
        }),
        json!({
            "jobtitle": "Frontend React Developer",
            "company": "UX Solutions",
            "city": "New York",
            "state": "NY",
            "snippet": "Building modern user interfaces with React. Skills: JavaScript, React, HTML5, CSS3, TypeScript. 3+ years experience with React.",
            "url": "https://example.com/jobs/2",
            "formattedRelativeTime": "2 days ago",
            "salary": "$100,000 - $130,000"
        }),
        json!({
            "jobtitle": "DevOps Engineer (Remote)",
            "company": "Cloud Systems Inc",
            "city": "Remote",
            "state": "US",
            "snippet": "Managing cloud infrastructure and CI/CD pipelines. Skills: AWS, Kubernetes, Terraform, Docker, Jenkins. Remote position available.",
            "url": "https://example.com/jobs/3",
            "formattedRelativeTime": "5 days ago",
            "salary": "$110,000 - $140,000"
        }),
        json!({
            "jobtitle": "Full Stack Developer",
            "company": "Startup Hub",
            "city": "Austin",
            "state": "TX",
            "snippet": "Building features across the entire stack. Skills: JavaScript, Node.js, React, MongoDB, Express. Fast-paced startup environment.",
            "url": "https://example.com/jobs/4",
            "formattedRelativeTime": "3 days ago",
            "salary": "$90,000 - $120,000"
        }),
        json!({
            "jobtitle": "Machine Learning Engineer",
            "company": "AI Research Lab",
            "city": "Seattle",
            "state": "WA",
            "snippet": "Developing machine learning models for production. Skills: Python, TensorFlow, PyTorch, scikit-learn, NLP. PhD or equivalent experience preferred.",
            "url": "https://example.com/jobs/5",
            "formattedRelativeTime": "1 day ago",
            "salary": "$130,000 - $160,000"
        }),
    ]
}

pub fn mock_course_records() -> Vec<JsonValue> {
    vec![
        json!({
            "title": "Python for Data Science",
            "description": "Learn Python programming for data analysis and visualization. Covers NumPy, Pandas, Matplotlib, and more.",
            "primary_category": {"title": "Data Science"},
            "instructional_level": "beginner level",
            "visible_instructors": [{"title": "Dr. Sarah Johnson"}],
            "content_length_video_in_seconds": 36000,
            "image_480x270": "https://example.com/course1.jpg"
        }),
        json!({
            "title": "Advanced Web Development with React",
            "description": "Master React and Redux for building modern web applications. Includes hooks, context API, and server-side rendering.",
            "primary_category": {"title": "Web Development"},
            "instructional_level": "intermediate level",
            "visible_instructors": [{"title": "Michael Chen"}],
            "content_length_video_in_seconds": 54000,
            "image_480x270": "https://example.com/course2.jpg"
        }),
        json!({
            "title": "Machine Learning Fundamentals",
            "description": "Introduction to machine learning algorithms and techniques. Covers supervised and unsupervised learning with practical examples.",
            "primary_category": {"title": "Machine Learning"},
            "instructional_level": "beginner level",
            "visible_instructors": [{"title": "Prof. Alex Williams"}],
            "content_length_video_in_seconds": 43200,
            "image_480x270": "https://example.com/course3.jpg"
        }),
        json!({
            "title": "Cloud Architecture on AWS",
            "description": "Design and implement scalable cloud solutions using Amazon Web Services. Covers EC2, S3, Lambda, and more.",
            "primary_category": {"title": "Cloud Computing"},
            "instructional_level": "intermediate level",
            "visible_instructors": [{"title": "James Wilson"}],
            "content_length_video_in_seconds": 64800,
            "image_480x270": "https://example.com/course4.jpg"
        }),
        json!({
            "title": "iOS App Development with Swift",
            "description": "Build iOS applications from scratch using Swift. Learn UI design, Core Data, networking, and App Store submission.",
            "primary_category": {"title": "Mobile Development"},
            "instructional_level": "beginner level",
            "visible_instructors": [{"title": "Emma Rodriguez"}],
            "content_length_video_in_seconds": 50400,
            "image_480x270": "https://example.com/course5.jpg"
        }),
    ]
}

pub fn job_source_for(source_id: &str, config: &SourcesConfig) -> Option<Box<dyn JobSource>> {
    if !config.use_live_job_sources {
        return Some(Box::new(MockJobSource));
    }
    let creds = config.credential(source_id);
    match source_id {
        "indeed" => Some(Box::new(IndeedSource {
            publisher_id: creds.api_key.unwrap_or_default(),
        })),
        "linkedin" => Some(Box::new(LinkedInSource {
            api_key: creds.api_key.unwrap_or_default(),
        })),
        "workday" => Some(Box::new(WorkdaySource {
            api_key: creds.api_key.unwrap_or_default(),
            tenant_id: creds.tenant_id.unwrap_or_default(),
        })),
        _ => None,
    }
}

pub fn course_source_for(source_id: &str, config: &SourcesConfig) -> Option<Box<dyn CourseSource>> {
    if !config.use_live_course_sources {
        return Some(Box::new(MockCourseSource));
    }
    let creds = config.credential(source_id);
    match source_id {
        "udemy" => Some(Box::new(UdemySource {
            client_id: creds.api_key.unwrap_or_default(),
            client_secret: creds.api_secret.unwrap_or_default(),
        })),
        "coursera" => Some(Box::new(CourseraSource {
            api_key: creds.api_key.unwrap_or_default(),
        })),
        _ => None,
    }
}

fn json_str<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a str> {
    let mut cur = value;
    for segment in path {
        cur = cur.get(*segment)?;
    }
    cur.as_str()
}

fn json_f64(value: &JsonValue, path: &[&str]) -> Option<f64> {
    let mut cur = value;
    for segment in path {
        cur = cur.get(*segment)?;
    }
    cur.as_f64()
}

fn json_string_vec(value: &JsonValue, path: &[&str]) -> Option<Vec<String>> {
    let mut cur = value;
    for segment in path {
        cur = cur.get(*segment)?;
    }
    let vals = cur
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(ToString::to_string))
        .collect::<Vec<_>>();
    if vals.is_empty() {
        None
    } else {
        Some(vals)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Closed-vocabulary skill extraction over title + description text.
pub fn extract_skill_names(text: &str) -> Vec<String> {
    let haystack = text.to_lowercase();
    SKILL_VOCABULARY
        .iter()
        .filter(|keyword| haystack.contains(**keyword))
        .map(|keyword| capitalize(keyword))
        .collect()
}

/// Case-insensitive "remote" substring heuristic; not authoritative.
pub fn looks_remote(title: &str, description: &str) -> bool {
    title.to_lowercase().contains("remote") || description.to_lowercase().contains("remote")
}

/// Parses "$120,000 - $150,000"-style text. Anything unparseable yields no
/// bounds rather than an error.
pub fn parse_salary_range(text: &str) -> (Option<f64>, Option<f64>) {
    if !text.contains('-') {
        return (None, None);
    }
    let cleaned = text.replace(['$', ','], "");
    let mut parts = cleaned.splitn(2, '-');
    let min = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
    let max = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
    match (min, max) {
        (Some(min), Some(max)) => (Some(min), Some(max)),
        _ => (None, None),
    }
}

/// "N days ago" -> now - N days; anything else counts as zero days old.
pub fn posted_at_from_relative(text: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let days = text
        .and_then(|t| t.split_whitespace().next())
        .and_then(|t| t.parse::<i64>().ok())
        .unwrap_or(0);
    now - Duration::days(days)
}

fn posted_at_from_iso(text: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(text) = text else { return now };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return parsed.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return naive.and_utc();
    }
    now
}

/// Fixed ratio of 5 study-hours per week, clamped to at least one week.
pub fn duration_weeks_from_content_seconds(seconds: f64) -> u32 {
    let weeks = (seconds / (5.0 * 3600.0)).round() as i64;
    weeks.max(1) as u32
}

/// Parses "4-6 hours/week"-style workload text; averages the range, divides
/// by the same 5-hour ratio, falls back to 4 weeks when unparseable.
pub fn duration_weeks_from_workload(text: &str) -> u32 {
    let parsed = text.split_whitespace().next().and_then(|range| {
        let bounds = range
            .split('-')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        if bounds.is_empty() {
            return None;
        }
        let avg = bounds.iter().sum::<f64>() / bounds.len() as f64;
        Some(((avg / 5.0) as i64).max(1) as u32)
    });
    parsed.unwrap_or(4)
}

struct RawJobFields {
    title: String,
    company: String,
    location: String,
    employment_type: String,
    description: String,
    requirements: String,
    responsibilities: String,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    apply_url: Option<String>,
    posted_at: DateTime<Utc>,
    explicit_skills: Option<Vec<String>>,
}

fn composed_location(city: Option<&str>, region: Option<&str>) -> String {
    let composed = format!(
        "{}, {}",
        city.unwrap_or_default().trim(),
        region.unwrap_or_default().trim()
    );
    if composed.trim_matches([',', ' ']).is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        composed
    }
}

fn extract_job_fields(shape: JobPayloadShape, raw: &JsonValue, now: DateTime<Utc>) -> RawJobFields {
    match shape {
        JobPayloadShape::Indeed => {
            let snippet = non_blank(json_str(raw, &["snippet"])).unwrap_or_default();
            let (salary_min, salary_max) = json_str(raw, &["salary"])
                .map(parse_salary_range)
                .unwrap_or((None, None));
            RawJobFields {
                title: non_blank(json_str(raw, &["jobtitle"]))
                    .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
                company: non_blank(json_str(raw, &["company"]))
                    .unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
                location: composed_location(json_str(raw, &["city"]), json_str(raw, &["state"])),
                employment_type: DEFAULT_EMPLOYMENT_TYPE.to_string(),
                description: snippet.clone(),
                requirements: snippet,
                responsibilities: String::new(),
                salary_min,
                salary_max,
                apply_url: non_blank(json_str(raw, &["url"])),
                posted_at: posted_at_from_relative(json_str(raw, &["formattedRelativeTime"]), now),
                explicit_skills: None,
            }
        }
        JobPayloadShape::LinkedIn => {
            let description = non_blank(json_str(raw, &["description"])).unwrap_or_default();
            RawJobFields {
                title: non_blank(json_str(raw, &["title"]))
                    .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
                company: non_blank(json_str(raw, &["companyDetails", "name"]))
                    .unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
                location: non_blank(json_str(raw, &["locationName"]))
                    .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
                employment_type: non_blank(json_str(raw, &["employmentStatus", "name"]))
                    .unwrap_or_else(|| DEFAULT_EMPLOYMENT_TYPE.to_string()),
                description: description.clone(),
                requirements: description.clone(),
                responsibilities: description,
                salary_min: None,
                salary_max: None,
                apply_url: non_blank(json_str(raw, &["applyUrl"])),
                posted_at: posted_at_from_iso(json_str(raw, &["postingDate"]), now),
                explicit_skills: None,
            }
        }
        JobPayloadShape::Workday => RawJobFields {
            title: non_blank(json_str(raw, &["title"]))
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            company: non_blank(json_str(raw, &["company", "name"]))
                .unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
            location: composed_location(
                json_str(raw, &["location", "city"]),
                json_str(raw, &["location", "country"]),
            ),
            employment_type: non_blank(json_str(raw, &["employmentType"]))
                .unwrap_or_else(|| DEFAULT_EMPLOYMENT_TYPE.to_string()),
            description: non_blank(json_str(raw, &["description"])).unwrap_or_default(),
            requirements: non_blank(json_str(raw, &["qualifications"])).unwrap_or_default(),
            responsibilities: non_blank(json_str(raw, &["responsibilities"])).unwrap_or_default(),
            salary_min: json_f64(raw, &["compensation", "min"]),
            salary_max: json_f64(raw, &["compensation", "max"]),
            apply_url: non_blank(json_str(raw, &["applyUrl"])),
            posted_at: posted_at_from_iso(json_str(raw, &["postDate"]), now),
            explicit_skills: json_string_vec(raw, &["skills"]),
        },
    }
}

/// Converts one raw job record into a draft, resolving (and creating on
/// first sight) the company/location/employment-type/skill lookup rows.
pub async fn map_job(
    store: &CareerStore,
    shape: JobPayloadShape,
    raw: &JsonValue,
    now: DateTime<Utc>,
) -> Result<JobDraft, MapError> {
    if !raw.is_object() {
        return Err(MapError::NotAnObject);
    }
    let fields = extract_job_fields(shape, raw, now);

    let company = store.get_or_create(LookupKind::Company, &fields.company).await;
    let location = store.get_or_create(LookupKind::Location, &fields.location).await;
    let employment_type = store
        .get_or_create(LookupKind::EmploymentType, &fields.employment_type)
        .await;

    let skill_names = match &fields.explicit_skills {
        Some(names) => names.clone(),
        None => extract_skill_names(&format!("{} {}", fields.title, fields.description)),
    };
    let mut required_skill_ids = Vec::with_capacity(skill_names.len());
    for name in &skill_names {
        required_skill_ids.push(store.get_or_create(LookupKind::Skill, name).await.id);
    }

    let is_remote = looks_remote(&fields.title, &fields.description);

    Ok(JobDraft {
        title: fields.title,
        company_id: company.id,
        description: fields.description,
        requirements: fields.requirements,
        responsibilities: fields.responsibilities,
        location_id: location.id,
        employment_type_id: employment_type.id,
        is_remote,
        salary_min: fields.salary_min,
        salary_max: fields.salary_max,
        required_skill_ids,
        experience_required_years: 0,
        apply_url: fields.apply_url,
        status: ApplicationStatus::Open,
        posted_at: fields.posted_at,
        closes_at: None,
    })
}

fn curriculum_from(raw: &JsonValue, key: &str) -> Vec<CurriculumWeek> {
    let Some(weeks) = raw.get(key).and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    weeks
        .iter()
        .map(|week| CurriculumWeek {
            title: non_blank(json_str(week, &["title"])),
            description: non_blank(json_str(week, &["description"])),
            lessons: week
                .get("lessons")
                .and_then(|v| v.as_array())
                .map(|lessons| {
                    lessons
                        .iter()
                        .map(|lesson| CurriculumLesson {
                            title: non_blank(json_str(lesson, &["title"])),
                            description: non_blank(json_str(lesson, &["description"])),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

/// Converts one raw course record into a draft, resolving the category row
/// and carrying any structured curriculum for first-creation child seeding.
pub async fn map_course(
    store: &CareerStore,
    shape: CoursePayloadShape,
    raw: &JsonValue,
) -> Result<CourseDraft, MapError> {
    if !raw.is_object() {
        return Err(MapError::NotAnObject);
    }
    let draft = match shape {
        CoursePayloadShape::Udemy => {
            let category_name = non_blank(json_str(raw, &["primary_category", "title"]))
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            let category = store
                .get_or_create(LookupKind::CourseCategory, &category_name)
                .await;
            let instructor_name = raw
                .get("visible_instructors")
                .and_then(|v| v.as_array())
                .and_then(|instructors| instructors.first())
                .and_then(|first| non_blank(json_str(first, &["title"])))
                .unwrap_or_else(|| UNKNOWN_INSTRUCTOR.to_string());
            let content_seconds =
                json_f64(raw, &["content_length_video_in_seconds"]).unwrap_or(0.0);
            CourseDraft {
                title: non_blank(json_str(raw, &["title"]))
                    .unwrap_or_else(|| UNKNOWN_COURSE.to_string()),
                description: non_blank(json_str(raw, &["description"])).unwrap_or_default(),
                category_id: category.id,
                difficulty_level: DifficultyLevel::from_source_label(
                    json_str(raw, &["instructional_level"]).unwrap_or_default(),
                ),
                duration_weeks: duration_weeks_from_content_seconds(content_seconds),
                instructor_name,
                thumbnail_url: non_blank(json_str(raw, &["image_480x270"])),
                is_active: true,
                curriculum: curriculum_from(raw, "curriculum"),
            }
        }
        CoursePayloadShape::Coursera => {
            let category_name = raw
                .get("domainTypes")
                .and_then(|v| v.as_array())
                .and_then(|domains| domains.first())
                .and_then(|first| non_blank(json_str(first, &["subdomainId"])))
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            let category = store
                .get_or_create(LookupKind::CourseCategory, &category_name)
                .await;
            let instructor_name = raw
                .get("instructors")
                .and_then(|v| v.as_array())
                .map(|instructors| {
                    instructors
                        .iter()
                        .filter_map(|inst| non_blank(json_str(inst, &["fullName"])))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .filter(|joined| !joined.is_empty())
                .unwrap_or_else(|| "Coursera Instructor".to_string());
            CourseDraft {
                title: non_blank(json_str(raw, &["name"]))
                    .unwrap_or_else(|| UNKNOWN_COURSE.to_string()),
                description: non_blank(json_str(raw, &["description"])).unwrap_or_default(),
                category_id: category.id,
                difficulty_level: DifficultyLevel::from_source_label(
                    json_str(raw, &["difficulty"]).unwrap_or_default(),
                ),
                duration_weeks: json_str(raw, &["estimatedWorkload"])
                    .map(duration_weeks_from_workload)
                    .unwrap_or(4),
                instructor_name,
                thumbnail_url: non_blank(json_str(raw, &["photoUrl"])),
                is_active: true,
                curriculum: curriculum_from(raw, "weeks"),
            }
        }
    };
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).single().unwrap()
    }

    #[tokio::test]
    async fn maps_indeed_record_with_vocabulary_skills_and_no_remote_flag() {
        let store = CareerStore::new();
        let raw = json!({
            "jobtitle": "Senior Python Developer",
            "company": "Tech Innovations",
            "city": "San Francisco",
            "state": "CA",
            "snippet": "Backend work. Skills: Python, Django, AWS, Docker.",
            "url": "https://example.com/jobs/1",
            "formattedRelativeTime": "1 day ago",
            "salary": "$120,000 - $150,000"
        });

        let draft = map_job(&store, JobPayloadShape::Indeed, &raw, now())
            .await
            .unwrap();

        assert_eq!(draft.title, "Senior Python Developer");
        assert!(!draft.is_remote);
        assert_eq!(draft.salary_min, Some(120_000.0));
        assert_eq!(draft.salary_max, Some(150_000.0));
        assert_eq!(draft.posted_at, now() - Duration::days(1));
        let skills = store.lookup_names(&draft.required_skill_ids).await;
        assert_eq!(skills, vec!["Python", "Django", "Aws", "Docker"]);
    }

    #[tokio::test]
    async fn blank_names_map_to_sentinels() {
        let store = CareerStore::new();
        let raw = json!({
            "jobtitle": "  ",
            "company": "",
            "snippet": "Anything"
        });

        let draft = map_job(&store, JobPayloadShape::Indeed, &raw, now())
            .await
            .unwrap();

        assert_eq!(draft.title, UNKNOWN_TITLE);
        assert_eq!(store.lookup_name(draft.company_id).await.as_deref(), Some(UNKNOWN_COMPANY));
        assert_eq!(
            store.lookup_name(draft.location_id).await.as_deref(),
            Some(UNKNOWN_LOCATION)
        );
        assert_eq!(
            store.lookup_name(draft.employment_type_id).await.as_deref(),
            Some(DEFAULT_EMPLOYMENT_TYPE)
        );
    }

    #[tokio::test]
    async fn workday_records_take_structured_skills_verbatim() {
        let store = CareerStore::new();
        let raw = json!({
            "title": "Platform Engineer",
            "company": {"name": "Workday Shop"},
            "location": {"city": "Dublin", "country": "IE"},
            "description": "Remote-friendly platform team",
            "qualifications": "Kubernetes experience",
            "responsibilities": "Run the platform",
            "compensation": {"min": 90000.0, "max": 120000.0},
            "employmentType": "Contract",
            "skills": ["Kubernetes", "Terraform"],
            "postDate": "2026-03-08T09:00:00"
        });

        let draft = map_job(&store, JobPayloadShape::Workday, &raw, now())
            .await
            .unwrap();

        let skills = store.lookup_names(&draft.required_skill_ids).await;
        assert_eq!(skills, vec!["Kubernetes", "Terraform"]);
        assert!(draft.is_remote);
        assert_eq!(
            store.lookup_name(draft.employment_type_id).await.as_deref(),
            Some("Contract")
        );
        assert_eq!(
            draft.posted_at,
            Utc.with_ymd_and_hms(2026, 3, 8, 9, 0, 0).single().unwrap()
        );
    }

    #[test]
    fn remote_heuristic_is_substring_based() {
        assert!(looks_remote("DevOps Engineer (Remote)", ""));
        assert!(looks_remote("Engineer", "Fully remote team"));
        assert!(!looks_remote("Office Manager", "On-site in Austin"));
    }

    #[test]
    fn salary_parsing_handles_dollars_and_garbage() {
        assert_eq!(
            parse_salary_range("$120,000 - $150,000"),
            (Some(120_000.0), Some(150_000.0))
        );
        assert_eq!(parse_salary_range("competitive"), (None, None));
        assert_eq!(parse_salary_range("$90k - call us"), (None, None));
    }

    #[test]
    fn duration_ratio_clamps_to_one_week() {
        assert_eq!(duration_weeks_from_content_seconds(36_000.0), 2);
        assert_eq!(duration_weeks_from_content_seconds(1_000.0), 1);
        assert_eq!(duration_weeks_from_content_seconds(0.0), 1);
        assert_eq!(duration_weeks_from_workload("4-6 hours/week"), 1);
        assert_eq!(duration_weeks_from_workload("30-40 hours/week"), 7);
        assert_eq!(duration_weeks_from_workload("a few hours"), 4);
    }

    #[tokio::test]
    async fn maps_udemy_course_with_defaults() {
        let store = CareerStore::new();
        let raw = &mock_course_records()[0];

        let draft = map_course(&store, CoursePayloadShape::Udemy, raw).await.unwrap();

        assert_eq!(draft.title, "Python for Data Science");
        assert_eq!(draft.difficulty_level, DifficultyLevel::Beginner);
        assert_eq!(draft.duration_weeks, 2);
        assert_eq!(draft.instructor_name, "Dr. Sarah Johnson");
        assert_eq!(
            store.lookup_name(draft.category_id).await.as_deref(),
            Some("Data Science")
        );
        assert!(draft.curriculum.is_empty());
    }

    #[tokio::test]
    async fn coursera_weeks_become_structured_curriculum() {
        let store = CareerStore::new();
        let raw = json!({
            "name": "Applied Statistics",
            "description": "Statistics in practice",
            "difficulty": "intermediate",
            "estimatedWorkload": "4-6 hours/week",
            "domainTypes": [{"subdomainId": "data-analysis"}],
            "instructors": [{"fullName": "Ada Lovelace"}, {"fullName": "Alan Turing"}],
            "weeks": [
                {"title": "Sampling", "description": "Week one", "lessons": [{"title": "Populations"}]},
                {"title": "Inference", "lessons": []}
            ]
        });

        let draft = map_course(&store, CoursePayloadShape::Coursera, &raw)
            .await
            .unwrap();

        assert_eq!(draft.difficulty_level, DifficultyLevel::Intermediate);
        assert_eq!(draft.instructor_name, "Ada Lovelace, Alan Turing");
        assert_eq!(draft.curriculum.len(), 2);
        assert_eq!(draft.curriculum[0].title.as_deref(), Some("Sampling"));
        assert_eq!(draft.curriculum[0].lessons.len(), 1);
    }

    #[test]
    fn factory_substitutes_mock_when_live_sources_disabled() {
        let config = SourcesConfig::default();
        let source = job_source_for("indeed", &config).unwrap();
        assert_eq!(source.source_id(), "mock-jobs");

        let live = SourcesConfig {
            use_live_job_sources: true,
            ..SourcesConfig::default()
        };
        assert_eq!(job_source_for("indeed", &live).unwrap().source_id(), "indeed");
        assert!(job_source_for("craigslist", &live).is_none());

        assert_eq!(
            course_source_for("udemy", &config).unwrap().source_id(),
            "mock-courses"
        );
    }

    #[test]
    fn mock_record_sets_are_fixed() {
        assert_eq!(mock_job_records().len(), 5);
        assert_eq!(mock_course_records().len(), 5);
    }
}
