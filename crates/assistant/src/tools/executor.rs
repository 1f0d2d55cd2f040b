//! Tool executor implementations.
//!
//! Each tool reads its arguments from a JSON input object and returns a
//! formatted text block for direct display.

use sqlx::SqlitePool;

use crate::db::PortfolioRepository;
use crate::error::ToolError;
use crate::models::{Project, Skill};

/// Width of the progress bar and star scale.
const SCALE: usize = 10;

/// Executor for portfolio tools.
pub struct ToolExecutor<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ToolExecutor<'a> {
    /// Create a new executor.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Execute a tool by name.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::UnknownTool` for unknown names, input and
    /// domain errors from the individual tools otherwise.
    pub async fn execute(
        &self,
        name: &str,
        input: &serde_json::Value,
    ) -> Result<String, ToolError> {
        match name {
            "create_project" => self.create_project(input).await,
            "update_project_progress" => self.update_project_progress(input).await,
            "track_skill" => self.track_skill(input).await,
            "portfolio_status" => self.portfolio_status().await,
            other => Err(ToolError::UnknownTool(other.to_owned())),
        }
    }

    async fn create_project(&self, input: &serde_json::Value) -> Result<String, ToolError> {
        let name = require_str(input, "name")?;
        let project_type = require_str(input, "project_type")?;
        let description = require_str(input, "description")?;
        let priority = input["priority"].as_i64().unwrap_or(5).clamp(1, 10);

        let repo = PortfolioRepository::new(self.pool);
        if repo.get_project(name).await?.is_some() {
            return Err(ToolError::Conflict(format!("project '{name}' already exists")));
        }

        let project = repo
            .insert_project(name, project_type, description, priority)
            .await?;
        tracing::info!(project = %project.name, "project created");

        Ok(format!(
            "Project '{}' created.\n  Type: {}\n  Priority: {}/10\n  Description: {}",
            project.name, project.project_type, project.priority, project.description
        ))
    }

    async fn update_project_progress(
        &self,
        input: &serde_json::Value,
    ) -> Result<String, ToolError> {
        let name = require_str(input, "project_name")?;
        let percentage = input["completion_percentage"]
            .as_f64()
            .ok_or_else(|| ToolError::InvalidInput("completion_percentage is required".into()))?
            .clamp(0.0, 100.0);
        let status = input["status"].as_str();
        if let Some(s) = status
            && !matches!(s, "planned" | "active" | "completed")
        {
            return Err(ToolError::InvalidInput(format!("unknown status '{s}'")));
        }

        let repo = PortfolioRepository::new(self.pool);
        let before = repo
            .get_project(name)
            .await?
            .ok_or_else(|| ToolError::NotFound(format!("project '{name}' not found")))?;

        let project = repo
            .update_project_progress(name, percentage, status)
            .await?
            .ok_or_else(|| ToolError::NotFound(format!("project '{name}' not found")))?;

        let delta = project.completion_percentage - before.completion_percentage;
        let mut out = format!(
            "Project '{}' updated.\n  Progress: [{}] {:.0}%\n  Change: {:+.0}%",
            project.name,
            progress_bar(project.completion_percentage),
            project.completion_percentage,
            delta
        );
        if status.is_some() {
            out.push_str(&format!("\n  Status: {}", project.status));
        }
        Ok(out)
    }

    async fn track_skill(&self, input: &serde_json::Value) -> Result<String, ToolError> {
        let name = require_str(input, "skill_name")?;
        let category = require_str(input, "category")?;
        let proficiency = input["proficiency"]
            .as_i64()
            .ok_or_else(|| ToolError::InvalidInput("proficiency is required".into()))?
            .clamp(1, 10);
        let relevant = input["relevant"].as_bool().unwrap_or(false);
        let notes = input["notes"].as_str().unwrap_or("");

        let repo = PortfolioRepository::new(self.pool);
        let previous = repo.get_skill(name).await?.map(|s| s.proficiency);
        let skill = repo
            .upsert_skill(name, category, proficiency, relevant, notes)
            .await?;

        let improvement = previous.map_or(skill.proficiency, |p| skill.proficiency - p);
        let mut out = format!(
            "Skill '{}' recorded.\n  Level: {} ({}/10)\n  Category: {}",
            skill.name,
            star_scale(skill.proficiency),
            skill.proficiency,
            skill.category
        );
        if improvement > 0 {
            out.push_str(&format!("\n  Improvement: +{improvement}"));
        }
        if skill.is_relevant {
            out.push_str("\n  Marked relevant");
        }
        Ok(out)
    }

    async fn portfolio_status(&self) -> Result<String, ToolError> {
        let repo = PortfolioRepository::new(self.pool);
        let projects = repo.list_projects().await?;
        let skills = repo.list_skills().await?;

        let mut out = String::from("PORTFOLIO DASHBOARD\n");
        out.push_str(&"=".repeat(50));
        out.push_str("\n\nPROJECTS:\n");

        for project in &projects {
            out.push_str(&format!(
                "{} {}\n   [{}] {:.0}% | priority {}/10\n",
                status_marker(&project.status),
                project.name,
                progress_bar(project.completion_percentage),
                project.completion_percentage,
                project.priority
            ));
        }

        if !skills.is_empty() {
            out.push_str("\nTOP SKILLS:\n");
            for skill in skills.iter().take(5) {
                let relevant = if skill.is_relevant { " *" } else { "" };
                out.push_str(&format!(
                    "- {}: {} ({}/10){relevant}\n",
                    skill.name,
                    star_scale(skill.proficiency),
                    skill.proficiency
                ));
            }
        }

        let completed = projects.iter().filter(|p| p.status == "completed").count();
        let total_practice: f64 = skills.iter().map(|s| s.practice_hours).sum();
        let relevant = skills.iter().filter(|s| s.is_relevant).count();

        out.push_str(&format!(
            "\nSTATISTICS:\n- Projects completed: {completed}/{}\n- Practice hours: {total_practice:.1}\n- Relevant skills: {relevant}/{}\n",
            projects.len(),
            skills.len()
        ));

        Ok(out)
    }
}

fn require_str<'v>(input: &'v serde_json::Value, field: &str) -> Result<&'v str, ToolError> {
    input[field]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidInput(format!("{field} is required")))
}

/// A ten-cell progress bar, e.g. `▓▓▓▓▓▓▓░░░` for 70%.
fn progress_bar(percentage: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = ((percentage / 100.0 * SCALE as f64).round() as usize).min(SCALE);
    format!("{}{}", "▓".repeat(filled), "░".repeat(SCALE - filled))
}

/// A ten-star proficiency scale, e.g. `★★★★★★★☆☆☆` for 7/10.
fn star_scale(proficiency: i64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = (proficiency.clamp(0, 10)) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(SCALE - filled))
}

fn status_marker(status: &str) -> &'static str {
    match status {
        "active" => ">",
        "completed" => "+",
        _ => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0.0), "░░░░░░░░░░");
        assert_eq!(progress_bar(70.0), "▓▓▓▓▓▓▓░░░");
        assert_eq!(progress_bar(100.0), "▓▓▓▓▓▓▓▓▓▓");
        // Values beyond the scale clamp instead of panicking.
        assert_eq!(progress_bar(250.0), "▓▓▓▓▓▓▓▓▓▓");
    }

    #[test]
    fn star_scale_matches_proficiency() {
        assert_eq!(star_scale(7), "★★★★★★★☆☆☆");
        assert_eq!(star_scale(10), "★★★★★★★★★★");
        assert_eq!(star_scale(0), "☆☆☆☆☆☆☆☆☆☆");
    }

    #[test]
    fn require_str_rejects_blank_fields() {
        let input = serde_json::json!({ "name": "  " });
        assert!(require_str(&input, "name").is_err());
        assert!(require_str(&input, "missing").is_err());

        let ok = serde_json::json!({ "name": "Groenmarkt" });
        assert_eq!(require_str(&ok, "name").unwrap(), "Groenmarkt");
    }

    async fn memory_pool() -> SqlitePool {
        crate::db::create_pool("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn create_then_duplicate_project() {
        let pool = memory_pool().await;
        let executor = ToolExecutor::new(&pool);
        let input = serde_json::json!({
            "name": "webshop-api",
            "project_type": "api",
            "description": "Webshop backend",
            "priority": 8,
        });

        let text = executor.execute("create_project", &input).await.unwrap();
        assert!(text.contains("'webshop-api' created"));
        assert!(text.contains("Priority: 8/10"));

        let dup = executor.execute("create_project", &input).await;
        assert!(matches!(dup, Err(ToolError::Conflict(_))));
    }

    #[tokio::test]
    async fn progress_update_reports_the_delta() {
        let pool = memory_pool().await;
        let executor = ToolExecutor::new(&pool);
        executor
            .execute(
                "create_project",
                &serde_json::json!({
                    "name": "scraper",
                    "project_type": "scraper",
                    "description": "x",
                }),
            )
            .await
            .unwrap();

        let text = executor
            .execute(
                "update_project_progress",
                &serde_json::json!({
                    "project_name": "scraper",
                    "completion_percentage": 40.0,
                    "status": "active",
                }),
            )
            .await
            .unwrap();
        assert!(text.contains("[▓▓▓▓░░░░░░] 40%"));
        assert!(text.contains("Change: +40%"));
        assert!(text.contains("Status: active"));
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let pool = memory_pool().await;
        let executor = ToolExecutor::new(&pool);
        let result = executor
            .execute(
                "update_project_progress",
                &serde_json::json!({ "project_name": "nope", "completion_percentage": 10.0 }),
            )
            .await;
        assert!(matches!(result, Err(ToolError::NotFound(_))));
    }

    #[tokio::test]
    async fn skill_upsert_reports_improvement() {
        let pool = memory_pool().await;
        let executor = ToolExecutor::new(&pool);

        let first = executor
            .execute(
                "track_skill",
                &serde_json::json!({
                    "skill_name": "Rust",
                    "category": "languages",
                    "proficiency": 5,
                    "relevant": true,
                }),
            )
            .await
            .unwrap();
        assert!(first.contains("★★★★★☆☆☆☆☆ (5/10)"));
        assert!(first.contains("Marked relevant"));

        let second = executor
            .execute(
                "track_skill",
                &serde_json::json!({
                    "skill_name": "Rust",
                    "category": "languages",
                    "proficiency": 7,
                }),
            )
            .await
            .unwrap();
        assert!(second.contains("(7/10)"));
        assert!(second.contains("Improvement: +2"));
    }

    #[tokio::test]
    async fn dashboard_summarizes_everything() {
        let pool = memory_pool().await;
        let executor = ToolExecutor::new(&pool);
        executor
            .execute(
                "create_project",
                &serde_json::json!({
                    "name": "webshop-api",
                    "project_type": "api",
                    "description": "x",
                    "priority": 9,
                }),
            )
            .await
            .unwrap();
        executor
            .execute(
                "update_project_progress",
                &serde_json::json!({
                    "project_name": "webshop-api",
                    "completion_percentage": 100.0,
                    "status": "completed",
                }),
            )
            .await
            .unwrap();
        executor
            .execute(
                "track_skill",
                &serde_json::json!({
                    "skill_name": "Rust",
                    "category": "languages",
                    "proficiency": 7,
                }),
            )
            .await
            .unwrap();

        let text = executor
            .execute("portfolio_status", &serde_json::json!({}))
            .await
            .unwrap();
        assert!(text.contains("PORTFOLIO DASHBOARD"));
        assert!(text.contains("+ webshop-api"));
        assert!(text.contains("Projects completed: 1/1"));
        assert!(text.contains("Rust: ★★★★★★★☆☆☆ (7/10)"));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let pool = memory_pool().await;
        let executor = ToolExecutor::new(&pool);
        let result = executor.execute("drop_database", &serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::UnknownTool(_))));
    }
}
