//! Optimistic drag-and-drop over the grouped board.
//!
//! Hover events only reshuffle the local [`GroupedTasks`]. A drop sends one
//! status update and then always refetches, so whatever the server holds
//! replaces the optimistic state. A cancelled or targetless drop restores
//! the snapshot taken when the gesture started, without touching the server.

use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::gateway::TaskGateway;
use crate::kanban_board::{GroupedTasks, UnrecognizedStatus};
use crate::task::{Bucket, TaskPatch};

/// Where a pointer is hovering or dropping. Ids share one namespace with
/// bucket names; see [`DropTarget::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Task(String),
    Bucket(Bucket),
}

impl DropTarget {
    /// Task ids win over bucket names. A server id equal to "pending" would
    /// make that column unreachable as a drop target while the task is
    /// listed; this is logged, not prevented.
    pub fn resolve(tasks: &GroupedTasks, id: &str) -> Option<DropTarget> {
        let bucket = id.parse::<Bucket>().ok();
        if tasks.locate(id).is_some() {
            if bucket.is_some() {
                warn!(id, "drop target id matches both a task and a bucket, using the task");
            }
            return Some(DropTarget::Task(id.to_string()));
        }
        bucket.map(DropTarget::Bucket)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    Idle,
    Dragging {
        task_id: String,
        origin: Bucket,
        snapshot: GroupedTasks,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// No gesture was in progress.
    Ignored,
    /// Dropped nowhere useful; the pre-gesture board was restored.
    Reverted,
    /// The server accepted the new status.
    Persisted { task_id: String, status: Bucket },
    /// The server refused the update; the resync puts the task back.
    Rejected {
        task_id: String,
        status: Bucket,
        error: ApiError,
    },
}

pub struct DragController<G> {
    gateway: G,
    tasks: GroupedTasks,
    gesture: Gesture,
    policy: UnrecognizedStatus,
    load_error: Option<ApiError>,
}

impl<G: TaskGateway> DragController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            tasks: GroupedTasks::new(),
            gesture: Gesture::Idle,
            policy: UnrecognizedStatus::default(),
            load_error: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: UnrecognizedStatus) -> Self {
        self.policy = policy;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn tasks(&self) -> &GroupedTasks {
        &self.tasks
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn dragged_task_id(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::Dragging { task_id, .. } => Some(task_id),
            Gesture::Idle => None,
        }
    }

    /// The error from the last failed reload, cleared by the next good one.
    pub fn load_error(&self) -> Option<&ApiError> {
        self.load_error.as_ref()
    }

    /// Refetches and replaces the board wholesale. An active gesture is
    /// abandoned; if the fetch fails its pre-gesture board is put back.
    pub async fn reload(&mut self) -> Result<(), ApiError> {
        let abandoned = std::mem::replace(&mut self.gesture, Gesture::Idle);
        if matches!(abandoned, Gesture::Dragging { .. }) {
            debug!("reload during drag, dropping gesture");
        }
        match self.gateway.group_by_status_with(self.policy).await {
            Ok(tasks) => {
                self.tasks = tasks;
                self.load_error = None;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load tasks");
                if let Gesture::Dragging { snapshot, .. } = abandoned {
                    self.tasks = snapshot;
                }
                self.load_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Begins a gesture on `task_id`. Refused while another gesture is active
    /// or when the id is not on the board.
    pub fn start(&mut self, task_id: &str) -> bool {
        if self.is_dragging() {
            debug!(task_id, "drag already in progress");
            return false;
        }
        let Some((origin, _)) = self.tasks.locate(task_id) else {
            debug!(task_id, "drag start on unknown task");
            return false;
        };
        debug!(task_id, %origin, "drag started");
        self.gesture = Gesture::Dragging {
            task_id: task_id.to_string(),
            origin,
            snapshot: self.tasks.clone(),
        };
        true
    }

    /// Applies a hover optimistically. Returns whether the board changed.
    pub fn hover(&mut self, over_id: &str) -> bool {
        let Some(task_id) = self.dragged_task_id().map(str::to_string) else {
            return false;
        };
        let Some(target) = DropTarget::resolve(&self.tasks, over_id) else {
            return false;
        };
        self.apply(&task_id, &target, true)
    }

    /// Ends the gesture. `None` means the pointer was released over nothing.
    pub async fn end(&mut self, over_id: Option<&str>) -> DropOutcome {
        let Gesture::Dragging {
            task_id,
            origin,
            snapshot,
        } = std::mem::replace(&mut self.gesture, Gesture::Idle)
        else {
            return DropOutcome::Ignored;
        };

        let target = over_id.and_then(|id| DropTarget::resolve(&self.tasks, id));
        let Some(target) = target else {
            debug!(task_id, ?over_id, "drop without a valid target, reverting");
            self.tasks = snapshot;
            return DropOutcome::Reverted;
        };

        // A drop that was not preceded by a hover onto another column still
        // has to land there.
        self.apply(&task_id, &target, false);

        let Some((status, _)) = self.tasks.locate(&task_id) else {
            self.tasks = snapshot;
            return DropOutcome::Reverted;
        };

        info!(task_id, from = %origin, to = %status, "persisting dropped task");
        let result = self
            .gateway
            .update(&task_id, TaskPatch::status(status))
            .await;

        let resync = self.reload().await;

        match result {
            Ok(_) => DropOutcome::Persisted { task_id, status },
            Err(error) => {
                warn!(task_id, error = %error, "status update rejected");
                if resync.is_err() {
                    self.tasks = snapshot;
                }
                DropOutcome::Rejected {
                    task_id,
                    status,
                    error,
                }
            }
        }
    }

    /// Abandons the gesture and restores the pre-gesture board.
    pub fn cancel(&mut self) -> bool {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Dragging { snapshot, .. } => {
                self.tasks = snapshot;
                true
            }
            Gesture::Idle => false,
        }
    }

    fn apply(&mut self, task_id: &str, target: &DropTarget, reorder: bool) -> bool {
        let Some((current, _)) = self.tasks.locate(task_id) else {
            return false;
        };
        match target {
            DropTarget::Task(over) if over == task_id => false,
            DropTarget::Task(over) => {
                let Some((bucket, index)) = self.tasks.locate(over) else {
                    return false;
                };
                if bucket == current && !reorder {
                    return false;
                }
                self.tasks.move_task(task_id, bucket, index)
            }
            DropTarget::Bucket(bucket) if *bucket == current => false,
            DropTarget::Bucket(bucket) => {
                let end = self.tasks.bucket(*bucket).len();
                self.tasks.move_task(task_id, *bucket, end)
            }
        }
    }
}
