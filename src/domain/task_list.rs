//! Single-user task list kept entirely in memory.
//!
//! The caller owns a [TaskList] and passes it by `&mut` reference into each operation; there is
//! no hidden global and no interior synchronization.

use crate::domain::{Outcome, StatusChange, TextError, TextRule};
use thiserror::Error;

/// Rule every task description must satisfy
pub const TASK_DESCRIPTION: TextRule = TextRule::new("Task description", 500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: u32,
    pub description: String,
    pub is_complete: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskListError {
    #[error(transparent)]
    Invalid(#[from] TextError),
    #[error("Task with ID {0} not found")]
    NotFound(u32),
    #[error("No task IDs left to assign")]
    IdsExhausted,
}

/// Ordered collection of tasks. Ids are handed out sequentially and never reused, even after
/// the task holding the highest id is deleted.
#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
    highest_issued_id: u32,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next added task will receive, or [None] once every id has been issued
    pub fn next_id(&self) -> Option<u32> {
        self.highest_issued_id.checked_add(1)
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get_by_id(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn add(&mut self, description: &str) -> Result<Outcome<Task>, TaskListError> {
        let description = TASK_DESCRIPTION.apply(description)?;

        let id = self.next_id().ok_or(TaskListError::IdsExhausted)?;
        let task = Task {
            id,
            description,
            is_complete: false,
        };
        self.highest_issued_id = id;
        self.tasks.push(task.clone());

        let message = format!("Task added with ID {id}: \"{}\"", task.description);
        Ok(Outcome::new(task, message))
    }

    /// Replaces a task's description. A missing task is reported before invalid text.
    pub fn update(&mut self, id: u32, new_description: &str) -> Result<Outcome<Task>, TaskListError> {
        let index = self.index_of(id)?;
        let description = TASK_DESCRIPTION.apply(new_description)?;

        let task = &mut self.tasks[index];
        task.description = description;

        let message = format!("Task {id} updated to \"{}\"", task.description);
        Ok(Outcome::new(task.clone(), message))
    }

    pub fn delete(&mut self, id: u32) -> Result<Outcome<Task>, TaskListError> {
        let index = self.index_of(id)?;
        let removed = self.tasks.remove(index);

        Ok(Outcome::new(removed, format!("Task {id} deleted")))
    }

    /// Moves a task into the requested completion state. Asking for the state the task is
    /// already in succeeds without changing anything.
    pub fn set_complete(
        &mut self,
        id: u32,
        complete: bool,
    ) -> Result<Outcome<StatusChange>, TaskListError> {
        let index = self.index_of(id)?;
        let state_name = if complete { "complete" } else { "incomplete" };

        let task = &mut self.tasks[index];
        if task.is_complete == complete {
            return Ok(Outcome::new(
                StatusChange::AlreadySet,
                format!("Info: Task {id} is already marked {state_name}"),
            ));
        }

        task.is_complete = complete;
        Ok(Outcome::new(
            StatusChange::Changed,
            format!("Task {id} marked as {state_name}"),
        ))
    }

    pub fn mark_complete(&mut self, id: u32) -> Result<Outcome<StatusChange>, TaskListError> {
        self.set_complete(id, true)
    }

    pub fn mark_incomplete(&mut self, id: u32) -> Result<Outcome<StatusChange>, TaskListError> {
        self.set_complete(id, false)
    }

    fn index_of(&self, id: u32) -> Result<usize, TaskListError> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(TaskListError::NotFound(id))
    }
}
