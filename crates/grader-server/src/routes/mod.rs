// Export route modules
pub mod grade;
pub mod health;
pub mod question;
pub mod ui;

use crate::configuration::UiSettings;
use crate::state::AppState;
use axum::Router;

// Function to configure all routes
pub fn configure(state: AppState, ui_settings: &UiSettings) -> Router {
    Router::new()
        .merge(grade::routes(state))
        .merge(health::routes())
        .merge(question::routes())
        .merge(ui::routes(ui_settings))
}
