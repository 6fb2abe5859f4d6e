//! Core domain model for the SkillBridge career platform sync engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CRATE_NAME: &str = "skillbridge-core";

/// Sentinel names used when a source payload omits or blanks a lookup field.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const UNKNOWN_LOCATION: &str = "Unknown Location";
pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_COURSE: &str = "Unknown Course";
pub const UNKNOWN_INSTRUCTOR: &str = "Unknown Instructor";
pub const UNCATEGORIZED: &str = "Uncategorized";
pub const DEFAULT_EMPLOYMENT_TYPE: &str = "Full-time";

/// Name-keyed singleton shared by many records (company, location, skill, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntity {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    /// Maps a source-specific free-text level label onto the fixed three-level
    /// enum. Unmapped labels fall back to `Beginner` rather than failing.
    pub fn from_source_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "all levels" | "beginner level" | "beginner" => Self::Beginner,
            "intermediate level" | "intermediate" => Self::Intermediate,
            "expert level" | "advanced" => Self::Advanced,
            _ => Self::Beginner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Text,
    Quiz,
    Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFrequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl AlertFrequency {
    /// Exact day counts, not calendar-month-aware.
    pub fn cooldown_days(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Biweekly => 14,
            Self::Monthly => 30,
        }
    }
}

/// Persisted job posting. Natural key: (title, company_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub id: Uuid,
    pub title: String,
    pub company_id: Uuid,
    pub description: String,
    pub requirements: String,
    pub responsibilities: String,
    pub location_id: Uuid,
    pub employment_type_id: Uuid,
    pub is_remote: bool,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub required_skill_ids: Vec<Uuid>,
    pub experience_required_years: u32,
    pub apply_url: Option<String>,
    pub status: ApplicationStatus,
    pub posted_at: DateTime<Utc>,
    pub closes_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobListing {
    /// Open and not past its deadline. The open -> closed transition is
    /// one-way and externally driven; the sync pipeline never reopens.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if self.status == ApplicationStatus::Closed {
            return false;
        }
        match self.closes_at {
            Some(closes_at) => closes_at >= now,
            None => true,
        }
    }
}

/// Mapper output for a job record, ready for the upsert writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub company_id: Uuid,
    pub description: String,
    pub requirements: String,
    pub responsibilities: String,
    pub location_id: Uuid,
    pub employment_type_id: Uuid,
    pub is_remote: bool,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub required_skill_ids: Vec<Uuid>,
    pub experience_required_years: u32,
    pub apply_url: Option<String>,
    pub status: ApplicationStatus,
    pub posted_at: DateTime<Utc>,
    pub closes_at: Option<DateTime<Utc>>,
}

/// Persisted course. Natural key: (title).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub difficulty_level: DifficultyLevel,
    pub duration_weeks: u32,
    pub instructor_name: String,
    pub thumbnail_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Structured curriculum carried on a course draft; expanded into child
/// modules/lessons only on first creation of the course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumWeek {
    pub title: Option<String>,
    pub description: Option<String>,
    pub lessons: Vec<CurriculumLesson>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumLesson {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub difficulty_level: DifficultyLevel,
    pub duration_weeks: u32,
    pub instructor_name: String,
    pub thumbnail_url: Option<String>,
    pub is_active: bool,
    pub curriculum: Vec<CurriculumWeek>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub content_type: ContentType,
    pub content: String,
    pub video_url: Option<String>,
    pub order: u32,
    pub estimated_time_minutes: u32,
}

/// Saved-search criteria owned by one subscriber. The alert matcher is the
/// sole mutator of `last_notified_at`, which is monotonically non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCriteria {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub keywords: Option<String>,
    pub location_ids: Vec<Uuid>,
    pub skill_ids: Vec<Uuid>,
    pub experience_min: u32,
    pub experience_max: u32,
    pub is_remote: Option<bool>,
    pub frequency: AlertFrequency,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl AlertCriteria {
    pub fn new(owner_id: Uuid, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            keywords: None,
            location_ids: Vec::new(),
            skill_ids: Vec::new(),
            experience_min: 0,
            experience_max: 99,
            is_remote: None,
            frequency: AlertFrequency::Weekly,
            is_active: true,
            created_at: now,
            last_notified_at: None,
        }
    }
}
