use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::queue::{Submission, SubmissionKind};
use crate::sequence::{Color, Message, Mode, Sequence};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;

/// Front page with the submission form and recent submissions
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let recent: String = state.queue.recent().iter().map(render_submission).collect();

    Html(
        state
            .frontend
            .replace("{{colors}}", &options(Color::ALL.iter().map(|c| c.name())))
            .replace("{{modes}}", &options(Mode::ALL.iter().map(|m| m.name())))
            .replace("{{recent}}", &recent),
    )
}

/// Fields posted by the front page form
#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub text: Option<String>,
    pub color: Option<String>,
    pub mode: Option<String>,
}

impl MessageForm {
    fn into_message(self) -> ApiResult<Message> {
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("text is required"))?;

        let mut message = Message::new(text);
        if let Some(color) = non_empty(self.color) {
            let color = color
                .parse::<Color>()
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            message = message.with_color(color);
        }
        if let Some(mode) = non_empty(self.mode) {
            let mode = mode
                .parse::<Mode>()
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            message = message.with_mode(mode);
        }
        Ok(message)
    }
}

pub async fn submit_form(
    State(state): State<AppState>,
    Form(form): Form<MessageForm>,
) -> ApiResult<Redirect> {
    let message = form.into_message()?;
    state.queue.enqueue_message(message)?;
    Ok(Redirect::to("/"))
}

pub async fn enqueue_message(
    State(state): State<AppState>,
    payload: Result<Json<Message>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(message) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    state.queue.enqueue_message(message)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "queued": "message" }))))
}

pub async fn enqueue_sequence(
    State(state): State<AppState>,
    payload: Result<Json<Sequence>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(sequence) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    state.queue.enqueue_sequence(sequence)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "queued": "sequence" }))))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn options<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .map(|n| format!("<option value=\"{0}\">{0}</option>", n))
        .collect()
}

fn render_submission(submission: &Submission) -> String {
    let kind = match submission.kind {
        SubmissionKind::Message => "message",
        SubmissionKind::Sequence => "sequence",
    };
    format!(
        "<li><span class=\"when\">{} ({})</span> {}</li>",
        submission.at.format("%-I:%M%P"),
        kind,
        escape_html(&submission.text)
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Tom & Jerry's\"</b>"),
            "&lt;b&gt;&quot;Tom &amp; Jerry&#39;s&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_form_empty_fields_ignored() {
        let form = MessageForm {
            text: Some("hello".into()),
            color: Some(String::new()),
            mode: Some("  ".into()),
        };
        assert_eq!(form.into_message().unwrap(), Message::new("hello"));
    }

    #[test]
    fn test_form_attributes_parsed() {
        let form = MessageForm {
            text: Some("hello".into()),
            color: Some("green".into()),
            mode: Some("FLASH".into()),
        };
        let message = form.into_message().unwrap();
        assert_eq!(message.color, Some(Color::Green));
        assert_eq!(message.mode, Some(Mode::Flash));
    }

    #[test]
    fn test_form_rejects_missing_text_and_bad_color() {
        let missing = MessageForm {
            text: None,
            color: None,
            mode: None,
        };
        assert!(matches!(missing.into_message(), Err(ApiError::BadRequest(_))));

        let bad = MessageForm {
            text: Some("hi".into()),
            color: Some("PLAID".into()),
            mode: None,
        };
        assert!(matches!(bad.into_message(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_form_rejects_unknown_mode() {
        let form = MessageForm {
            text: Some("hi".into()),
            color: Some("red".into()),
            mode: Some("wobble".into()),
        };
        match form.into_message() {
            Err(ApiError::BadRequest(msg)) => assert!(msg.contains("wobble"), "{msg}"),
            other => panic!("expected bad request, got {other:?}"),
        }
    }
}
