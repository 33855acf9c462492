use crate::configuration::UiSettings;
use axum::{http::StatusCode, Router};
use std::path::{Component, Path};
use tower_http::services::{ServeDir, ServeFile};

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "File not found")
}

// a bare file name, so it can neither escape legacy_dir nor clash with route syntax
fn is_servable_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
        && !name.starts_with(':')
        && !name.starts_with('*')
}

// each legacy file at /<name>, whichever ui is active
fn legacy_files(settings: &UiSettings) -> Router {
    let mut router = Router::new();
    for name in &settings.legacy_files {
        if !is_servable_name(name) {
            tracing::warn!("ignoring legacy file {:?}, it is not a plain file name", name);
            continue;
        }
        router = router.route_service(
            &format!("/{}", name),
            ServeFile::new(settings.legacy_dir.join(name)),
        );
    }
    router
}

pub fn routes(settings: &UiSettings) -> Router {
    let router = legacy_files(settings);

    if settings.use_new_ui {
        tracing::info!("serving ui from {}", settings.dist_dir.display());
        return router.fallback_service(ServeDir::new(&settings.dist_dir));
    }

    tracing::info!("serving legacy ui from {}", settings.legacy_dir.display());
    router
        .route_service("/", ServeFile::new(settings.legacy_dir.join("index.html")))
        .fallback(not_found)
}
