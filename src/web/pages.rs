use axum::Form;
use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use minijinja::context;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, TaskError};
use crate::model::{NAME_MAX_CHARS, TaskInput};
use crate::store::tasks::Direction;
use crate::web::AppState;
use crate::web::templates;

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskForm {
    pub name: String,
    pub cost: String,
    pub due_date: String,
}

/// Redirect to `path`, attaching `notice` for the next render.
///
/// Every page mutation ends in a redirect; failures ride along as the notice.
pub fn redirect_with_notice(path: &str, notice: &str) -> Redirect {
    Redirect::to(&format!("{path}?notice={}", urlencoding::encode(notice)))
}

/// What the user sees for a failed action. Storage details stay in the log.
pub fn notice_for(err: &TaskError) -> String {
    if err.is_client_error() {
        capitalize(&err.to_string())
    } else {
        warn!(error = %err, code = err.code(), "page action failed");
        "Something went wrong; the change was not saved.".to_string()
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A post with missing or garbled fields is reported like any other bad input.
fn parse_form(form: std::result::Result<Form<TaskForm>, FormRejection>) -> Result<TaskInput> {
    let Form(form) = form.map_err(|e| TaskError::Validation(e.body_text()))?;
    TaskInput::parse(&form.name, &form.cost, &form.due_date)
}

fn render(state: &AppState, name: &str, ctx: minijinja::Value) -> Response {
    match templates::render(state.templates(), name, ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!(error = %e, template = name, "render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "template error").into_response()
        }
    }
}

pub async fn index(State(state): State<AppState>, Query(query): Query<NoticeQuery>) -> Response {
    match state.with_store(|store| store.list()).await {
        Ok(listing) => render(
            &state,
            "index.html",
            context! {
                tasks => listing.tasks,
                total => listing.total,
                notice => query.notice,
            },
        ),
        Err(e) => render(
            &state,
            "index.html",
            context! {
                tasks => Vec::<minijinja::Value>::new(),
                total => "0.00",
                notice => notice_for(&e),
            },
        ),
    }
}

pub async fn new_form(State(state): State<AppState>, Query(query): Query<NoticeQuery>) -> Response {
    render(
        &state,
        "form.html",
        context! {
            heading => "New task",
            action => "/tasks",
            name_max => NAME_MAX_CHARS,
            notice => query.notice,
        },
    )
}

pub async fn create(
    State(state): State<AppState>,
    form: std::result::Result<Form<TaskForm>, FormRejection>,
) -> Redirect {
    let result: Result<_> = async {
        let input = parse_form(form)?;
        state.with_store(move |store| store.create(&input)).await
    }
    .await;

    match result {
        Ok(_) => Redirect::to("/"),
        Err(e @ (TaskError::DuplicateName(_) | TaskError::Validation(_))) => {
            redirect_with_notice("/tasks/new", &notice_for(&e))
        }
        Err(e) => redirect_with_notice("/", &notice_for(&e)),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    match state.with_store(move |store| store.get(id)).await {
        Ok(task) => render(
            &state,
            "form.html",
            context! {
                heading => "Edit task",
                action => format!("/tasks/{id}"),
                name_max => NAME_MAX_CHARS,
                name => task.name,
                cost => task.cost,
                due_date => task.due_date,
                notice => query.notice,
            },
        ),
        Err(e) => redirect_with_notice("/", &notice_for(&e)).into_response(),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    form: std::result::Result<Form<TaskForm>, FormRejection>,
) -> Redirect {
    let result: Result<_> = async {
        let input = parse_form(form)?;
        state.with_store(move |store| store.update(id, &input)).await
    }
    .await;

    match result {
        Ok(_) => Redirect::to("/"),
        Err(e @ (TaskError::DuplicateName(_) | TaskError::Validation(_))) => {
            redirect_with_notice(&format!("/tasks/{id}/edit"), &notice_for(&e))
        }
        Err(e) => redirect_with_notice("/", &notice_for(&e)),
    }
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Redirect {
    match state.with_store(move |store| store.delete(id)).await {
        Ok(_) => Redirect::to("/"),
        Err(e) => redirect_with_notice("/", &notice_for(&e)),
    }
}

pub async fn move_up(State(state): State<AppState>, Path(id): Path<i64>) -> Redirect {
    move_task(state, id, Direction::Up).await
}

pub async fn move_down(State(state): State<AppState>, Path(id): Path<i64>) -> Redirect {
    move_task(state, id, Direction::Down).await
}

async fn move_task(state: AppState, id: i64, direction: Direction) -> Redirect {
    match state
        .with_store(move |store| store.move_task(id, direction))
        .await
    {
        Ok(_) => Redirect::to("/"),
        Err(e) => redirect_with_notice("/", &notice_for(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_shown_verbatim() {
        let notice = notice_for(&TaskError::DuplicateName("X".into()));
        assert_eq!(notice, "A task named 'X' already exists");
    }

    #[test]
    fn storage_errors_are_generic() {
        let notice = notice_for(&TaskError::Db(rusqlite::Error::QueryReturnedNoRows));
        assert!(!notice.contains("storage"));
        assert!(notice.contains("not saved"));
    }
}
