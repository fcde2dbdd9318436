use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::controller::{Controller, Status};
use crate::duration::Interval;
use crate::error::NudgeError;
use crate::reminder::Reminder;

pub struct AppState {
    pub controller: Controller,
    pub min_interval_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
struct StartForm {
    #[serde(default)]
    task: String,
    #[serde(default)]
    interval: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/start", post(start))
        .route("/stop", post(stop))
        .route("/api/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the web UI on `bind` until Ctrl+C, then stops any active reminder.
pub async fn serve(state: Arc<AppState>, bind: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    println!("nudge web UI running at http://{}", listener.local_addr()?);

    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    state.controller.stop().await;
    info!("web UI shut down");
    Ok(())
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(&state.controller.status().await, state.min_interval_secs))
}

async fn start(State(state): State<Arc<AppState>>, Form(form): Form<StartForm>) -> Response {
    // negative numbers are valid input and clamp like any short interval
    let secs = match form.interval.trim().parse::<i64>() {
        Ok(secs) => u64::try_from(secs).unwrap_or(0),
        Err(_) => {
            return (StatusCode::BAD_REQUEST, "Invalid interval. Must be a number.").into_response();
        }
    };
    let reminder = match Reminder::clamped(&form.task, Interval::from_secs(secs), state.min_interval_secs) {
        Ok(r) => r,
        Err(NudgeError::EmptyTask) => {
            return (StatusCode::BAD_REQUEST, "Task cannot be empty.").into_response();
        }
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    state.controller.start(reminder, None).await;
    Redirect::to("/").into_response()
}

async fn stop(State(state): State<Arc<AppState>>) -> Redirect {
    state.controller.stop().await;
    Redirect::to("/")
}

async fn status(State(state): State<Arc<AppState>>) -> Json<Status> {
    Json(state.controller.status().await)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_page(status: &Status, min_interval_secs: u64) -> String {
    let status_html = match (&status.task, status.interval_secs) {
        (Some(task), Some(secs)) if status.active => format!(
            r#"<p class="active">ACTIVE: reminding you about '{}' every {} ({} sent)</p>
    <form method="post" action="/stop"><button type="submit">Stop Reminder</button></form>"#,
            escape_html(task),
            Interval::from_secs(secs).human(),
            status.fires
        ),
        _ => r#"<p class="idle">No reminder running.</p>"#.to_string(),
    };

    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>nudge</title>
  <style>
    body {{ font-family: sans-serif; max-width: 28rem; margin: 3rem auto; }}
    label {{ display: block; margin-top: 0.75rem; }}
    input {{ width: 100%; padding: 0.3rem; }}
    button {{ margin-top: 1rem; }}
    .active {{ color: green; }}
    .idle {{ color: red; }}
  </style>
</head>
<body>
  <h1>nudge</h1>
  {status_html}
  <form method="post" action="/start">
    <label>Task <input name="task" value="Take a break" required></label>
    <label>Interval (seconds, min {min_interval_secs}) <input name="interval" type="number" min="{min_interval_secs}" value="60" required></label>
    <button type="submit">Start Reminder</button>
  </form>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::tests::RecordingAlerter;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tower::ServiceExt;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            controller: Controller::new(Arc::new(RecordingAlerter::default()), None),
            min_interval_secs: 5,
        })
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn index_shows_idle_form() {
        let response = router(state())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("No reminder running."));
        assert!(html.contains(r#"action="/start""#));
    }

    #[tokio::test]
    async fn start_redirects_and_activates() {
        let state = state();
        let response = router(state.clone())
            .oneshot(post_form("/start", "task=stretch&interval=30"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let status = state.controller.status().await;
        assert!(status.active);
        assert_eq!(status.task.as_deref(), Some("stretch"));
        assert_eq!(status.interval_secs, Some(30));
    }

    #[tokio::test]
    async fn start_clamps_short_interval() {
        let state = state();
        router(state.clone())
            .oneshot(post_form("/start", "task=stretch&interval=1"))
            .await
            .unwrap();
        assert_eq!(state.controller.status().await.interval_secs, Some(5));
    }

    #[tokio::test]
    async fn start_clamps_negative_interval() {
        let state = state();
        let response = router(state.clone())
            .oneshot(post_form("/start", "task=stretch&interval=-3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(state.controller.status().await.interval_secs, Some(5));
    }

    #[tokio::test]
    async fn start_rejects_non_numeric_interval() {
        let state = state();
        let response = router(state.clone())
            .oneshot(post_form("/start", "task=stretch&interval=soon"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Invalid interval. Must be a number.");
        assert!(!state.controller.status().await.active);
    }

    #[tokio::test]
    async fn start_rejects_empty_task() {
        let response = router(state())
            .oneshot(post_form("/start", "task=++&interval=30"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Task cannot be empty.");
    }

    #[tokio::test]
    async fn stop_goes_idle() {
        let state = state();
        let app = router(state.clone());
        app.clone()
            .oneshot(post_form("/start", "task=stretch&interval=30"))
            .await
            .unwrap();
        let response = app.oneshot(post_form("/stop", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(!state.controller.status().await.active);
    }

    #[tokio::test]
    async fn status_endpoint_returns_json() {
        let state = state();
        let app = router(state.clone());
        app.clone()
            .oneshot(post_form("/start", "task=water&interval=60"))
            .await
            .unwrap();
        let response = app
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["active"], true);
        assert_eq!(json["task"], "water");
        assert_eq!(json["interval_secs"], 60);
    }

    #[test]
    fn active_page_escapes_task() {
        let status = Status {
            active: true,
            task: Some("<script>".to_string()),
            interval_secs: Some(60),
            fires: 2,
            started_at: None,
        };
        let html = render_page(&status, 5);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("every 1m (2 sent)"));
        assert!(html.contains(r#"action="/stop""#));
    }
}
