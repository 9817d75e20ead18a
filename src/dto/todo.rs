use crate::domain;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// DTO for creating a new todo via the API
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTodo {
    #[validate(length(min = 1, max = 500))]
    #[schema(example = "Buy milk")]
    pub title: String,
    #[validate(length(max = 2000))]
    #[schema(example = "Two litres, semi-skimmed")]
    pub description: Option<String>,
}

impl From<NewTodo> for domain::todo::NewTodo {
    fn from(value: NewTodo) -> Self {
        domain::todo::NewTodo {
            title: value.title,
            description: value.description,
        }
    }
}

/// DTO for replacing a todo's title and description via the API. The text is checked by the
/// domain only after the todo is found, so a missing todo is reported ahead of bad input.
#[derive(Debug, Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTodo {
    #[schema(example = "Buy oat milk", max_length = 500)]
    pub title: String,
    #[schema(max_length = 2000)]
    pub description: Option<String>,
}

impl From<UpdateTodo> for domain::todo::UpdateTodo {
    fn from(value: UpdateTodo) -> Self {
        domain::todo::UpdateTodo {
            title: value.title,
            description: value.description,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct SetCompletion {
    pub completed: bool,
}

fn show_completed_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTodosQuery {
    /// Include completed todos in the listing. Defaults to true.
    #[serde(default = "show_completed_by_default")]
    pub show_completed: bool,
}

/// DTO for a todo returned on the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq, Eq))]
pub struct TodoItem {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = "Buy milk")]
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    /// RFC 3339 timestamp
    #[schema(example = "2024-10-16T09:30:00+00:00")]
    pub created_at: String,
    /// RFC 3339 timestamp
    #[schema(example = "2024-10-16T09:30:00+00:00")]
    pub updated_at: String,
}

impl From<domain::todo::Todo> for TodoItem {
    fn from(value: domain::todo::Todo) -> Self {
        TodoItem {
            id: value.id,
            title: value.title,
            description: value.description,
            completed: value.completed,
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq, Eq))]
pub struct TodoStats {
    #[schema(example = 3)]
    pub total: usize,
    #[schema(example = 1)]
    pub completed: usize,
    #[schema(example = 2)]
    pub pending: usize,
}

impl From<domain::todo::TodoStats> for TodoStats {
    fn from(value: domain::todo::TodoStats) -> Self {
        TodoStats {
            total: value.total,
            completed: value.completed,
            pending: value.pending,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct TodoListing {
    pub todos: Vec<TodoItem>,
    pub stats: TodoStats,
}

impl From<domain::todo::TodoListing> for TodoListing {
    fn from(value: domain::todo::TodoListing) -> Self {
        TodoListing {
            todos: value.todos.into_iter().map(TodoItem::from).collect(),
            stats: value.stats.into(),
        }
    }
}

/// DTO returned after a todo is created or updated
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct TodoConfirmation {
    #[schema(example = "Todo created successfully!")]
    pub message: String,
    pub todo: TodoItem,
}

impl From<domain::Outcome<domain::todo::Todo>> for TodoConfirmation {
    fn from(value: domain::Outcome<domain::todo::Todo>) -> Self {
        TodoConfirmation {
            message: value.message,
            todo: value.value.into(),
        }
    }
}

/// DTO describing a todo's completion state after a status change request
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq, Eq))]
pub struct CompletionConfirmation {
    #[schema(example = "Todo marked as completed")]
    pub message: String,
    pub completed: bool,
    /// False when the todo was already in the requested state
    pub changed: bool,
}

#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct MessageResponse {
    #[schema(example = "Todo deleted successfully!")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::test_util::todo_fixture;
    use chrono::DateTime;

    #[test]
    fn blank_title_fails_validation() {
        let new_todo = NewTodo {
            title: String::new(),
            description: None,
        };
        let validation_errors = new_todo.validate().unwrap_err();
        assert!(validation_errors.field_errors().contains_key("title"));
    }

    #[test]
    fn long_description_fails_validation() {
        let new_todo = NewTodo {
            title: "Fine".to_owned(),
            description: Some("d".repeat(2001)),
        };
        let validation_errors = new_todo.validate().unwrap_err();
        assert!(validation_errors.field_errors().contains_key("description"));
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let todo = todo_fixture(4, 1, "Buy milk");
        let created_at = todo.created_at;
        let item = TodoItem::from(todo);

        let parsed = DateTime::parse_from_rfc3339(&item.created_at).expect("should be RFC 3339");
        assert_eq!(created_at, parsed);
    }

    #[test]
    fn listing_query_shows_completed_by_default() {
        let query: ListTodosQuery = serde_json::from_str("{}").expect("empty query should parse");
        assert!(query.show_completed);
    }
}
