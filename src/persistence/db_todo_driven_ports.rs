use crate::domain;
use crate::domain::todo::{Todo, TodoContent};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, query_scalar};

const TODO_COLUMNS: &str =
    "ti.id, ti.user_id, ti.title, ti.description, ti.completed, ti.created_at, ti.updated_at";

pub struct DbTodoReader;

#[derive(sqlx::FromRow)]
struct TodoItemRow {
    id: i32,
    user_id: i32,
    title: String,
    description: Option<String>,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TodoItemRow> for domain::todo::Todo {
    fn from(value: TodoItemRow) -> Self {
        Todo {
            id: value.id,
            owner_user_id: value.user_id,
            title: value.title,
            description: value.description,
            completed: value.completed,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl domain::todo::driven_ports::TodoReader for DbTodoReader {
    async fn todos_for_user(
        &self,
        user_id: i32,
        include_completed: bool,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Todo>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let sql = format!(
            "SELECT {TODO_COLUMNS} FROM todo_item ti \
             WHERE ti.user_id = $1 AND ($2 OR NOT ti.completed) \
             ORDER BY ti.created_at DESC, ti.id DESC"
        );
        let todo_items: Vec<Todo> = query_as::<_, TodoItemRow>(&sql)
            .bind(user_id)
            .bind(include_completed)
            .fetch_all(cxn.borrow_connection())
            .await
            .context("trying to fetch todo items for a user")?
            .into_iter()
            .map(domain::todo::Todo::from)
            .collect();

        Ok(todo_items)
    }

    async fn user_todo_by_id(
        &self,
        user_id: i32,
        todo_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Todo>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let sql =
            format!("SELECT {TODO_COLUMNS} FROM todo_item ti WHERE ti.user_id = $1 AND ti.id = $2");
        let todo_item: Option<Todo> = query_as::<_, TodoItemRow>(&sql)
            .bind(user_id)
            .bind(todo_id)
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("trying to fetch a todo item by ID")?
            .map(domain::todo::Todo::from);

        Ok(todo_item)
    }
}

pub struct DbTodoWriter;

const RETURNED_COLUMNS: &str =
    "RETURNING id, user_id, title, description, completed, created_at, updated_at";

impl domain::todo::driven_ports::TodoWriter for DbTodoWriter {
    async fn create_todo_for_user(
        &self,
        user_id: i32,
        content: &TodoContent,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Todo, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let sql = format!(
            "INSERT INTO todo_item(user_id, title, description) VALUES ($1, $2, $3) {RETURNED_COLUMNS}"
        );
        let created = query_as::<_, TodoItemRow>(&sql)
            .bind(user_id)
            .bind(&content.title)
            .bind(&content.description)
            .fetch_one(cxn.borrow_connection())
            .await
            .context("trying to insert a new todo item")?;

        Ok(created.into())
    }

    async fn update_todo(
        &self,
        user_id: i32,
        todo_id: i32,
        content: &TodoContent,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Todo>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let sql = format!(
            "UPDATE todo_item SET title = $3, description = $4, updated_at = now() \
             WHERE user_id = $1 AND id = $2 {RETURNED_COLUMNS}"
        );
        let updated = query_as::<_, TodoItemRow>(&sql)
            .bind(user_id)
            .bind(todo_id)
            .bind(&content.title)
            .bind(&content.description)
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("trying to update a todo item")?;

        Ok(updated.map(Todo::from))
    }

    async fn set_completed(
        &self,
        user_id: i32,
        todo_id: i32,
        completed: bool,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let result = query(
            "UPDATE todo_item SET completed = $3, updated_at = now() WHERE user_id = $1 AND id = $2",
        )
        .bind(user_id)
        .bind(todo_id)
        .bind(completed)
        .execute(cxn.borrow_connection())
        .await
        .context("trying to set a todo item's completion")?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_completed(
        &self,
        user_id: i32,
        todo_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<bool>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let now_completed = query_scalar::<_, bool>(
            "UPDATE todo_item SET completed = NOT completed, updated_at = now() \
             WHERE user_id = $1 AND id = $2 RETURNING completed",
        )
        .bind(user_id)
        .bind(todo_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to toggle a todo item")?;

        Ok(now_completed)
    }

    async fn delete_todo(
        &self,
        user_id: i32,
        todo_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let result = query("DELETE FROM todo_item WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(todo_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to delete a todo item")?;

        Ok(result.rows_affected() > 0)
    }
}
