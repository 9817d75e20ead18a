use crate::domain;
use crate::domain::todo::driven_ports::{TodoReader, TodoWriter};
use crate::domain::todo::driving_ports::TodoError;
use crate::domain::user::Session;
use crate::domain::{Outcome, StatusChange, TextError, TextRule};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};

pub const TODO_TITLE: TextRule = TextRule::new("Title", 500);
pub const TODO_DESCRIPTION: TextRule = TextRule::new("Description", 2000);

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Todo {
    pub id: i32,
    pub owner_user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateTodo {
    pub title: String,
    pub description: Option<String>,
}

/// Title and description that passed validation, trimmed and ready to store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoContent {
    pub title: String,
    pub description: Option<String>,
}

impl TodoContent {
    pub fn validate(title: &str, description: Option<&str>) -> Result<Self, TextError> {
        Ok(TodoContent {
            title: TODO_TITLE.apply(title)?,
            description: TODO_DESCRIPTION.apply_optional(description)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl TodoStats {
    pub fn tally(todos: &[Todo]) -> Self {
        let completed = todos.iter().filter(|todo| todo.completed).count();
        TodoStats {
            total: todos.len(),
            completed,
            pending: todos.len() - completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListing {
    pub todos: Vec<Todo>,
    pub stats: TodoStats,
}

pub mod driven_ports {
    use super::*;

    pub trait TodoReader {
        /// A user's todos, newest first
        async fn todos_for_user(
            &self,
            user_id: i32,
            include_completed: bool,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Todo>, anyhow::Error>;

        async fn user_todo_by_id(
            &self,
            user_id: i32,
            todo_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Todo>, anyhow::Error>;
    }

    /// Every write is scoped to the owning user. Methods report "no such todo for this user" as
    /// [None] or `false` rather than as an error.
    pub trait TodoWriter {
        async fn create_todo_for_user(
            &self,
            user_id: i32,
            content: &TodoContent,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Todo, anyhow::Error>;

        async fn update_todo(
            &self,
            user_id: i32,
            todo_id: i32,
            content: &TodoContent,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Todo>, anyhow::Error>;

        async fn set_completed(
            &self,
            user_id: i32,
            todo_id: i32,
            completed: bool,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;

        /// Flips the completion flag, returning the new value
        async fn toggle_completed(
            &self,
            user_id: i32,
            todo_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<bool>, anyhow::Error>;

        async fn delete_todo(
            &self,
            user_id: i32,
            todo_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::domain;
    use crate::domain::TextError;
    use thiserror::Error;
    use tracing::error;

    #[derive(Debug, Error)]
    pub enum TodoError {
        #[error(transparent)]
        Invalid(#[from] TextError),
        /// Covers todos owned by someone else so other users' ids can't be probed
        #[error("Todo not found or access denied")]
        NotFound,
        #[error("The specified user did not exist.")]
        UserDoesNotExist,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    impl From<domain::user::UserExistsErr> for TodoError {
        fn from(value: domain::user::UserExistsErr) -> Self {
            match value {
                domain::user::UserExistsErr::UserDoesNotExist(user_id) => {
                    error!("User {} didn't exist when creating a todo.", user_id);
                    TodoError::UserDoesNotExist
                }
                domain::user::UserExistsErr::PortError(err) => {
                    TodoError::from(err.context("verifying todo owner"))
                }
            }
        }
    }


    pub trait TodoPort {
        async fn todos_for_user(
            &self,
            session: &Session,
            show_completed: bool,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_read: &impl driven_ports::TodoReader,
        ) -> Result<TodoListing, TodoError>;
        async fn user_todo_by_id(
            &self,
            session: &Session,
            todo_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_read: &impl driven_ports::TodoReader,
        ) -> Result<Option<Todo>, TodoError>;
        async fn create_todo(
            &self,
            session: &Session,
            todo: &NewTodo,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl domain::user::driven_ports::DetectUser,
            todo_write: &impl driven_ports::TodoWriter,
        ) -> Result<Outcome<Todo>, TodoError>;
        async fn update_todo(
            &self,
            session: &Session,
            todo_id: i32,
            update: &UpdateTodo,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_read: &impl driven_ports::TodoReader,
            todo_write: &impl driven_ports::TodoWriter,
        ) -> Result<Outcome<Todo>, TodoError>;
        async fn set_todo_completion(
            &self,
            session: &Session,
            todo_id: i32,
            completed: bool,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_read: &impl driven_ports::TodoReader,
            todo_write: &impl driven_ports::TodoWriter,
        ) -> Result<Outcome<StatusChange>, TodoError>;
        async fn toggle_todo(
            &self,
            session: &Session,
            todo_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_write: &impl driven_ports::TodoWriter,
        ) -> Result<Outcome<bool>, TodoError>;
        async fn delete_todo(
            &self,
            session: &Session,
            todo_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            todo_write: &impl driven_ports::TodoWriter,
        ) -> Result<Outcome<()>, TodoError>;
    }
}

fn completion_message(completed: bool) -> &'static str {
    if completed {
        "Todo marked as completed"
    } else {
        "Todo marked as uncompleted"
    }
}

pub struct TodoService {}

impl driving_ports::TodoPort for TodoService {
    async fn todos_for_user(
        &self,
        session: &Session,
        show_completed: bool,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_read: &impl TodoReader,
    ) -> Result<TodoListing, TodoError> {
        let todos = todo_read
            .todos_for_user(session.user_id, show_completed, &mut *ext_cxn)
            .await
            .context("listing todos")?;
        let stats = TodoStats::tally(&todos);

        Ok(TodoListing { todos, stats })
    }

    async fn user_todo_by_id(
        &self,
        session: &Session,
        todo_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_read: &impl TodoReader,
    ) -> Result<Option<Todo>, TodoError> {
        let todo = todo_read
            .user_todo_by_id(session.user_id, todo_id, &mut *ext_cxn)
            .await
            .context("fetching a todo")?;

        Ok(todo)
    }

    async fn create_todo(
        &self,
        session: &Session,
        todo: &NewTodo,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl domain::user::driven_ports::DetectUser,
        todo_write: &impl TodoWriter,
    ) -> Result<Outcome<Todo>, TodoError> {
        let content = TodoContent::validate(&todo.title, todo.description.as_deref())?;
        domain::user::verify_user_exists(session.user_id, &mut *ext_cxn, u_detect).await?;

        let created = todo_write
            .create_todo_for_user(session.user_id, &content, &mut *ext_cxn)
            .await
            .context("creating a todo")?;

        Ok(Outcome::new(created, "Todo created successfully!"))
    }

    async fn update_todo(
        &self,
        session: &Session,
        todo_id: i32,
        update: &UpdateTodo,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_read: &impl TodoReader,
        todo_write: &impl TodoWriter,
    ) -> Result<Outcome<Todo>, TodoError> {
        todo_read
            .user_todo_by_id(session.user_id, todo_id, &mut *ext_cxn)
            .await
            .context("looking up a todo to update")?
            .ok_or(TodoError::NotFound)?;
        let content = TodoContent::validate(&update.title, update.description.as_deref())?;

        let updated = todo_write
            .update_todo(session.user_id, todo_id, &content, &mut *ext_cxn)
            .await
            .context("updating a todo")?
            .ok_or(TodoError::NotFound)?;

        Ok(Outcome::new(updated, "Todo updated successfully!"))
    }

    async fn set_todo_completion(
        &self,
        session: &Session,
        todo_id: i32,
        completed: bool,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_read: &impl TodoReader,
        todo_write: &impl TodoWriter,
    ) -> Result<Outcome<StatusChange>, TodoError> {
        let current = todo_read
            .user_todo_by_id(session.user_id, todo_id, &mut *ext_cxn)
            .await
            .context("looking up a todo to change its status")?
            .ok_or(TodoError::NotFound)?;

        if current.completed == completed {
            let state_name = if completed { "complete" } else { "incomplete" };
            return Ok(Outcome::new(
                StatusChange::AlreadySet,
                format!("Info: Todo {todo_id} is already marked {state_name}"),
            ));
        }

        let changed = todo_write
            .set_completed(session.user_id, todo_id, completed, &mut *ext_cxn)
            .await
            .context("changing a todo's status")?;
        if !changed {
            return Err(TodoError::NotFound);
        }

        Ok(Outcome::new(
            StatusChange::Changed,
            completion_message(completed),
        ))
    }

    async fn toggle_todo(
        &self,
        session: &Session,
        todo_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_write: &impl TodoWriter,
    ) -> Result<Outcome<bool>, TodoError> {
        let now_completed = todo_write
            .toggle_completed(session.user_id, todo_id, &mut *ext_cxn)
            .await
            .context("toggling a todo")?
            .ok_or(TodoError::NotFound)?;

        Ok(Outcome::new(now_completed, completion_message(now_completed)))
    }

    async fn delete_todo(
        &self,
        session: &Session,
        todo_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        todo_write: &impl TodoWriter,
    ) -> Result<Outcome<()>, TodoError> {
        let deleted = todo_write
            .delete_todo(session.user_id, todo_id, &mut *ext_cxn)
            .await
            .context("deleting a todo")?;
        if !deleted {
            return Err(TodoError::NotFound);
        }

        Ok(Outcome::new((), "Todo deleted successfully!"))
    }
}
