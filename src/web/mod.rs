pub mod api;
pub mod pages;
pub mod templates;

use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::routing::{get, post};
use minijinja::Environment;
use tower_http::trace::TraceLayer;

use crate::error::{Result, TaskError};
use crate::store::tasks::TaskStore;

/// Shared handler state. The store sits behind a mutex; each request holds
/// it for exactly one store operation.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<TaskStore>>,
    templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(store: TaskStore) -> Result<Self> {
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            templates: Arc::new(templates::environment()?),
        })
    }

    /// Run one store operation on the blocking pool.
    pub async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&TaskStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            // Every write is transactional, so a panicked holder leaves nothing half-done.
            let guard = store.lock().unwrap_or_else(PoisonError::into_inner);
            op(&guard)
        })
        .await
        .map_err(|e| TaskError::Io(std::io::Error::other(e)))?
    }

    pub fn templates(&self) -> &Environment<'static> {
        &self.templates
    }
}

/// Server-rendered pages plus a JSON API under `/api`, all over one store.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/tasks", post(pages::create))
        .route("/tasks/new", get(pages::new_form))
        .route("/tasks/:id", post(pages::update))
        .route("/tasks/:id/edit", get(pages::edit_form))
        .route("/tasks/:id/delete", post(pages::delete))
        .route("/tasks/:id/move-up", post(pages::move_up))
        .route("/tasks/:id/move-down", post(pages::move_down))
        .route("/health", get(api::health))
        .route("/api/tasks", get(api::list).post(api::create))
        .route(
            "/api/tasks/:id",
            get(api::show).put(api::update).delete(api::delete),
        )
        .route("/api/tasks/:id/move-up", post(api::move_up))
        .route("/api/tasks/:id/move-down", post(api::move_down))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
