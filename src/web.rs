use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::error::{IntakeError, SessionError, NO_IMAGE_MESSAGE, TOO_LARGE_MESSAGE};
use crate::handlers::AnalysisSession;
use crate::services::{FoodAnalyzer, ImageIntake, SelectedFile};
use crate::ui::{HtmlShell, UiShell};

/// Room for multipart boundaries and headers on top of the image limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;
const IMAGE_FIELD: &str = "image";

pub struct AppState {
    pub analyzer: Arc<dyn FoodAnalyzer>,
    pub intake: ImageIntake,
}

pub fn create_router(analyzer: Arc<dyn FoodAnalyzer>, intake: ImageIntake, static_dir: &str) -> Router {
    let body_limit = match intake.max_bytes() {
        Some(limit) => DefaultBodyLimit::max(limit + MULTIPART_OVERHEAD),
        None => DefaultBodyLimit::disable(),
    };

    let state = Arc::new(AppState { analyzer, intake });

    Router::new()
        .route("/", get(index_page))
        .route("/api/analyze", post(analyze_handler))
        .route("/health", get(health_check))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(body_limit)
        .with_state(state)
}

async fn index_page() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn health_check() -> &'static str {
    "OK"
}

/// Runs one page session for the uploaded image and answers with the
/// rendered result fragment.
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let ui = Arc::new(HtmlShell::new());

    let file = match read_image_field(&mut multipart).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            log::warn!("⚠️ Analyze request without '{}' field", IMAGE_FIELD);
            ui.show_error(NO_IMAGE_MESSAGE);
            return (StatusCode::BAD_REQUEST, Html(ui.render()));
        }
        Err(e) => {
            log::error!("❌ Failed to read upload: {}", e);
            let status = e.status();
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                TOO_LARGE_MESSAGE
            } else {
                NO_IMAGE_MESSAGE
            };
            ui.show_error(message);
            return (status, Html(ui.render()));
        }
    };

    log::info!("📨 Upload received: {} ({}, {} bytes)", file.name, file.content_type, file.bytes.len());

    let session = AnalysisSession::new(state.analyzer.clone(), ui.clone(), state.intake);
    let status = match session.select_file(&file) {
        Ok(()) => match session.analyze().await {
            Ok(_) => StatusCode::OK,
            Err(e) => status_for(&e),
        },
        Err(e) => status_for(&e),
    };

    (status, Html(ui.render()))
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Option<SelectedFile>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;

        return Ok(Some(SelectedFile::new(name, content_type, bytes.to_vec())));
    }

    Ok(None)
}

fn status_for(err: &SessionError) -> StatusCode {
    match err {
        SessionError::Intake(IntakeError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        SessionError::Intake(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        SessionError::NoImage => StatusCode::BAD_REQUEST,
        SessionError::Busy => StatusCode::CONFLICT,
        SessionError::Analysis(_) => StatusCode::BAD_GATEWAY,
    }
}
