//! VR project entity and the project collaborators the pipeline consumes.
//!
//! The real system keeps projects in a relational store behind a web
//! layer; the pipeline only needs two capabilities from it, expressed
//! here as traits: look a project up before accepting work, and attach
//! the generated panorama to it afterwards. `InMemoryProjectStore` is
//! the in-process implementation used by the CLI and the tests.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Unique identifier for a VR project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Publication state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    Published,
}

/// A VR project that panoramas are generated for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub status: ProjectStatus,
    /// Viewer scene description, set once a panorama has been attached.
    pub scene_data: Option<serde_json::Value>,
}

impl Project {
    pub fn new(id: ProjectId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            status: ProjectStatus::Draft,
            scene_data: None,
        }
    }
}

/// Resolve a project reference before accepting work for it.
pub trait ProjectLookup: Send + Sync {
    /// Find a project by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] if no such project exists.
    fn find(&self, id: ProjectId) -> Result<Project>;
}

/// Attach a generated panorama to its project.
pub trait ProjectUpdater: Send + Sync {
    /// Record `result_url` as the project's panorama scene and publish it.
    fn attach_result(&self, id: ProjectId, result_url: &str) -> Result<()>;
}

/// In-process project store.
pub struct InMemoryProjectStore {
    projects: RwLock<HashMap<ProjectId, Project>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, project: Project) {
        self.projects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(project.id, project);
    }
}

impl Default for InMemoryProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectLookup for InMemoryProjectStore {
    fn find(&self, id: ProjectId) -> Result<Project> {
        self.projects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
            .ok_or(Error::ProjectNotFound { id })
    }
}

impl ProjectUpdater for InMemoryProjectStore {
    fn attach_result(&self, id: ProjectId, result_url: &str) -> Result<()> {
        let mut projects = self.projects.write().unwrap_or_else(|e| e.into_inner());
        let project = projects.get_mut(&id).ok_or(Error::ProjectNotFound { id })?;
        project.scene_data = Some(serde_json::json!({
            "type": "panorama",
            "url": result_url,
            "generatedAt": Utc::now().to_rfc3339(),
        }));
        project.status = ProjectStatus::Published;
        Ok(())
    }
}
