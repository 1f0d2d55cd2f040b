//! Portfolio records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A portfolio project.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub project_type: String,
    /// planned | active | completed
    pub status: String,
    pub completion_percentage: f64,
    pub description: String,
    pub tech_stack: String,
    /// 1-10
    pub priority: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tracked skill.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// 1-10
    pub proficiency: i64,
    pub practice_hours: f64,
    pub last_practiced: DateTime<Utc>,
    pub is_relevant: bool,
    pub notes: String,
}
