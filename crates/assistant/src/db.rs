//! `SQLite` persistence for portfolio records.
//!
//! The schema is created on startup; the assistant is a single-file
//! database with two tables and no migration history worth keeping.

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::models::{Project, Skill};

/// Create the pool and ensure the schema exists.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database cannot be opened or the schema
/// statements fail.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS projects (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            name                  TEXT NOT NULL UNIQUE,
            project_type          TEXT NOT NULL,
            status                TEXT NOT NULL DEFAULT 'planned',
            completion_percentage REAL NOT NULL DEFAULT 0,
            description           TEXT NOT NULL DEFAULT '',
            tech_stack            TEXT NOT NULL DEFAULT '',
            priority              INTEGER NOT NULL DEFAULT 5,
            created_at            TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at            TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS skills (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            name           TEXT NOT NULL UNIQUE,
            category       TEXT NOT NULL,
            proficiency    INTEGER NOT NULL DEFAULT 1,
            practice_hours REAL NOT NULL DEFAULT 0,
            last_practiced TEXT NOT NULL DEFAULT (datetime('now')),
            is_relevant    INTEGER NOT NULL DEFAULT 0,
            notes          TEXT NOT NULL DEFAULT ''
        )",
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}

const PROJECT_COLUMNS: &str = "id, name, project_type, status, completion_percentage, \
                               description, tech_stack, priority, created_at, updated_at";

const SKILL_COLUMNS: &str = "id, name, category, proficiency, practice_hours, last_practiced, \
                             is_relevant, notes";

/// Repository for portfolio records.
pub struct PortfolioRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PortfolioRepository<'a> {
    /// Create a new portfolio repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a project by name.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    pub async fn get_project(&self, name: &str) -> Result<Option<Project>, sqlx::Error> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE name = ?");
        sqlx::query_as::<_, Project>(&sql)
            .bind(name)
            .fetch_optional(self.pool)
            .await
    }

    /// Insert a new project.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the insert fails (including unique
    /// violations, which the executor pre-checks).
    pub async fn insert_project(
        &self,
        name: &str,
        project_type: &str,
        description: &str,
        priority: i64,
    ) -> Result<Project, sqlx::Error> {
        let sql = format!(
            "INSERT INTO projects (name, project_type, description, priority)
             VALUES (?, ?, ?, ?)
             RETURNING {PROJECT_COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(name)
            .bind(project_type)
            .bind(description)
            .bind(priority)
            .fetch_one(self.pool)
            .await
    }

    /// Update a project's completion percentage and (optionally) status.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the update fails.
    pub async fn update_project_progress(
        &self,
        name: &str,
        completion_percentage: f64,
        status: Option<&str>,
    ) -> Result<Option<Project>, sqlx::Error> {
        let sql = format!(
            "UPDATE projects
             SET completion_percentage = ?,
                 status = COALESCE(?, status),
                 updated_at = datetime('now')
             WHERE name = ?
             RETURNING {PROJECT_COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(completion_percentage)
            .bind(status)
            .bind(name)
            .fetch_optional(self.pool)
            .await
    }

    /// All projects, highest priority first.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    pub async fn list_projects(&self) -> Result<Vec<Project>, sqlx::Error> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY priority DESC, name");
        sqlx::query_as::<_, Project>(&sql).fetch_all(self.pool).await
    }

    /// Get a skill by name.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    pub async fn get_skill(&self, name: &str) -> Result<Option<Skill>, sqlx::Error> {
        let sql = format!("SELECT {SKILL_COLUMNS} FROM skills WHERE name = ?");
        sqlx::query_as::<_, Skill>(&sql)
            .bind(name)
            .fetch_optional(self.pool)
            .await
    }

    /// Insert or update a skill (upsert by name); updating refreshes
    /// proficiency and the last-practiced stamp.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the upsert fails.
    pub async fn upsert_skill(
        &self,
        name: &str,
        category: &str,
        proficiency: i64,
        is_relevant: bool,
        notes: &str,
    ) -> Result<Skill, sqlx::Error> {
        let sql = format!(
            "INSERT INTO skills (name, category, proficiency, is_relevant, notes)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (name)
             DO UPDATE SET proficiency = excluded.proficiency,
                           last_practiced = datetime('now')
             RETURNING {SKILL_COLUMNS}"
        );
        sqlx::query_as::<_, Skill>(&sql)
            .bind(name)
            .bind(category)
            .bind(proficiency)
            .bind(is_relevant)
            .bind(notes)
            .fetch_one(self.pool)
            .await
    }

    /// All skills, highest proficiency first.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    pub async fn list_skills(&self) -> Result<Vec<Skill>, sqlx::Error> {
        let sql = format!("SELECT {SKILL_COLUMNS} FROM skills ORDER BY proficiency DESC, name");
        sqlx::query_as::<_, Skill>(&sql).fetch_all(self.pool).await
    }
}
