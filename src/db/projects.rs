//! Projects: user-defined groupings of repositories

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{repository_id, Store};
use crate::error::{Error, Result};
use crate::sync::Deletion;
use crate::types::Project;

impl Store {
    pub fn create_project(&self, name: &str, description: Option<&str>) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument("project name must not be empty".to_string()));
        }
        let now = self.now();
        self.write(|conn| {
            if project_id(conn, name)?.is_some() {
                return Err(Error::InvalidArgument(format!("project {} already exists", name)));
            }
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO projects (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, name, description, now],
            )?;
            Ok(Project {
                id,
                name: name.to_string(),
                description: description.map(str::to_string),
                created_at: now,
                repositories: Vec::new(),
            })
        })
    }

    /// All projects with their member repositories, by name
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.read(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, description, created_at FROM projects ORDER BY name")?;
            let rows = stmt.query_map([], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                    repositories: Vec::new(),
                })
            })?;

            let mut members = conn.prepare(
                r#"
                SELECT r.full_name
                FROM project_repositories pr
                JOIN repositories r ON r.id = pr.repository_id
                WHERE pr.project_id = ?1
                ORDER BY r.full_name
                "#,
            )?;
            let mut projects = Vec::new();
            for row in rows {
                let mut project = row?;
                let names = members.query_map(params![project.id], |row| row.get(0))?;
                for name in names {
                    project.repositories.push(name?);
                }
                projects.push(project);
            }
            Ok(projects)
        })
    }

    /// Add a repository to a project; adding twice is a no-op
    pub fn add_repository_to_project(&self, project: &str, full_name: &str) -> Result<()> {
        self.write(|conn| {
            let (project_id, repo_id) = membership_ids(conn, project, full_name)?;
            conn.execute(
                "INSERT OR IGNORE INTO project_repositories (project_id, repository_id) VALUES (?1, ?2)",
                params![project_id, repo_id],
            )?;
            Ok(())
        })
    }

    /// Remove a repository from a project; returns false if it was not a member
    pub fn remove_repository_from_project(&self, project: &str, full_name: &str) -> Result<bool> {
        let now = self.now();
        self.write(|conn| {
            let (project_id, repo_id) = membership_ids(conn, project, full_name)?;
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM project_repositories WHERE project_id = ?1 AND repository_id = ?2",
                params![project_id, repo_id],
            )?;
            if removed > 0 {
                Deletion::ProjectRepository {
                    project: project.to_string(),
                    repository: full_name.to_string(),
                }
                .record(&tx, now)?;
            }
            tx.commit()?;
            Ok(removed > 0)
        })
    }

    /// Delete a project; member repositories are untouched
    pub fn delete_project(&self, name: &str) -> Result<bool> {
        let now = self.now();
        self.write(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM projects WHERE name = ?1", params![name])?;
            if removed > 0 {
                Deletion::Project {
                    name: name.to_string(),
                }
                .record(&tx, now)?;
            }
            tx.commit()?;
            Ok(removed > 0)
        })
    }
}

fn project_id(conn: &Connection, name: &str) -> Result<Option<String>> {
    let id = conn
        .query_row("SELECT id FROM projects WHERE name = ?1", params![name], |row| row.get(0))
        .optional()?;
    Ok(id)
}

fn membership_ids(conn: &Connection, project: &str, full_name: &str) -> Result<(String, String)> {
    let project_id =
        project_id(conn, project)?.ok_or_else(|| Error::InvalidArgument(format!("unknown project {}", project)))?;
    let repo_id = repository_id(conn, full_name)?.ok_or_else(|| Error::RepositoryNotFound(full_name.to_string()))?;
    Ok((project_id, repo_id))
}
