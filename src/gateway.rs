//! Task persistence over the REST API.
//!
//! The gateway keeps no cache: every call is one round-trip and every error
//! is handed back to the caller untouched.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::kanban_board::{GroupedTasks, UnrecognizedStatus};
use crate::task::{Bucket, NewTask, Task, TaskPatch};

#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// All tasks of the signed-in user, optionally only one status.
    async fn list(&self, status: Option<Bucket>) -> Result<Vec<Task>, ApiError>;

    async fn get(&self, id: &str) -> Result<Task, ApiError>;

    async fn create(&self, input: NewTask) -> Result<Task, ApiError>;

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, ApiError>;

    async fn remove(&self, id: &str) -> Result<(), ApiError>;

    /// Fetches the unfiltered list and partitions it for the board. Tasks
    /// with an unknown status are left out.
    async fn group_by_status(&self) -> Result<GroupedTasks, ApiError> {
        self.group_by_status_with(UnrecognizedStatus::Exclude).await
    }

    async fn group_by_status_with(
        &self,
        policy: UnrecognizedStatus,
    ) -> Result<GroupedTasks, ApiError> {
        let tasks = self.list(None).await?;
        let grouped = GroupedTasks::from_tasks(tasks, policy);
        debug!(
            tasks = grouped.len(),
            excluded = grouped.excluded(),
            "grouped tasks by status"
        );
        Ok(grouped)
    }
}

pub struct HttpTaskGateway {
    api: ApiClient,
}

impl HttpTaskGateway {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TaskGateway for HttpTaskGateway {
    async fn list(&self, status: Option<Bucket>) -> Result<Vec<Task>, ApiError> {
        match status {
            Some(status) => {
                self.api
                    .get_with_query("tasks", &[("status", status.as_str())])
                    .await
            }
            None => self.api.get("tasks").await,
        }
    }

    async fn get(&self, id: &str) -> Result<Task, ApiError> {
        self.api.get(&format!("tasks/{id}")).await
    }

    async fn create(&self, input: NewTask) -> Result<Task, ApiError> {
        let input = input.validated()?;
        let task: Task = self.api.post("tasks", &input).await?;
        info!(task_id = %task.id, status = %task.status, "created task");
        Ok(task)
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, ApiError> {
        let patch = patch.validated()?;
        let task: Task = self.api.put(&format!("tasks/{id}"), &patch).await?;
        info!(task_id = %task.id, status = %task.status, "updated task");
        Ok(task)
    }

    async fn remove(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("tasks/{id}")).await?;
        info!(task_id = %id, "deleted task");
        Ok(())
    }
}
