//! Endpoint handlers for the formrelay HTTP surface.

use async_trait::async_trait;
use axum::extract::{Form, FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::AppState;
use crate::mailer::templates;
use crate::submission::{
    generate_reference, EmailOutcomes, SubmissionForm, SubmissionRecord, REFERENCE_PREFIX,
};

/// Request body extractor that accepts both JSON and
/// `application/x-www-form-urlencoded` payloads, so plain HTML forms can
/// post directly without JavaScript.
#[derive(Debug)]
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let form_encoded = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if form_encoded {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|err| body_rejection(err.to_string()))?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|err| body_rejection(err.to_string()))?;
            Ok(Self(value))
        }
    }
}

fn body_rejection(message: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "error": message,
        })),
    )
}

/// Incoming contact-form payload. All fields optional so the handler can
/// echo back exactly what it received when required ones are missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionRequest {
    /// Submitter's name (required).
    pub name: Option<String>,
    /// Submitter's email address (required).
    pub email: Option<String>,
    /// Submitter's phone number (optional).
    pub phone: Option<String>,
    /// Service of interest (required).
    pub service: Option<String>,
    /// Free-text message (required).
    pub message: Option<String>,
}

impl SubmissionRequest {
    /// Validate presence of the required fields.
    ///
    /// Returns the validated form, or an echo of the received fields for
    /// the 400 response.
    fn into_form(self) -> Result<SubmissionForm, Value> {
        let received = json!({
            "name": &self.name,
            "email": &self.email,
            "service": &self.service,
            "message": &self.message,
        });

        let present = |field: &Option<String>| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        };

        match (
            present(&self.name),
            present(&self.email),
            present(&self.service),
            present(&self.message),
        ) {
            (Some(name), Some(email), Some(service), Some(message)) => Ok(SubmissionForm {
                name,
                email,
                phone: present(&self.phone),
                service,
                message,
            }),
            _ => Err(received),
        }
    }
}

/// `GET /` - service status banner and endpoint map.
pub async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "online",
        "service": state.config.mail.from_name,
        "email": state.config.support_address(),
        "endpoints": {
            "health": "/health",
            "test": "/test",
            "test-smtp": "/test-smtp",
            "send-with-reply": "/send-with-reply",
            "send": "/send",
            "save-submission": "/save-submission",
            "view-submissions": "/submissions/view",
        },
    }))
}

/// `GET /health` - liveness check.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service": state.config.mail.from_name,
        "version": env!("CARGO_PKG_VERSION"),
        "smtp": format!("{}:{}", state.config.smtp.host, state.config.smtp.port),
    }))
}

/// `GET /test-smtp` - verify the SMTP connection.
pub async fn verify_smtp(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.mailer.verify().await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "SMTP connection verified",
            })),
        ),
        Ok(false) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "SMTP connection failed",
            })),
        ),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "SMTP connection failed",
                "message": err.to_string(),
            })),
        ),
    }
}

/// `GET /test` - send a test email to the support address.
pub async fn send_test(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let email = templates::test_email(
        state.config.support_address(),
        &state.config.mail.from_name,
        Utc::now(),
    );

    match state.mailer.send(&email).await {
        Ok(message_id) => {
            info!("Test email sent: {message_id}");
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": "Test email sent successfully",
                    "message_id": message_id,
                })),
            )
        }
        Err(err) => {
            error!("Test email failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Failed to send test email",
                    "message": err.to_string(),
                })),
            )
        }
    }
}

/// `POST /send-with-reply` - the main submission endpoint.
///
/// Sends the support notification and the auto-reply independently (either
/// may fail without aborting the other), always persists a result record,
/// and reports success whenever the record was saved.
pub async fn submit(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<SubmissionRequest>,
) -> (StatusCode, Json<Value>) {
    let form = match request.into_form() {
        Ok(form) => form,
        Err(received) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Missing required fields",
                    "received": received,
                })),
            );
        }
    };

    let reference = generate_reference(REFERENCE_PREFIX);
    let timestamp = Utc::now();
    let site_name = &state.config.mail.from_name;
    info!(
        "Processing submission {reference} from {} <{}> ({})",
        form.name, form.email, form.service
    );

    let support_email = templates::support_notification(
        &form,
        &reference,
        timestamp,
        state.config.support_address(),
        site_name,
    );
    let support_id = match state.mailer.send(&support_email).await {
        Ok(id) => Some(id),
        Err(err) => {
            error!("Support notification failed for {reference}: {err}");
            None
        }
    };

    let reply_email = templates::auto_reply(&form, &reference, site_name);
    let reply_id = match state.mailer.send(&reply_email).await {
        Ok(id) => Some(id),
        Err(err) => {
            error!("Auto-reply failed for {reference}: {err}");
            None
        }
    };

    let outcomes = EmailOutcomes::new(support_id, reply_id);
    let to_support = outcomes.support_sent();
    let to_client = outcomes.auto_reply_sent();
    let record = SubmissionRecord::sent(reference.clone(), &form, outcomes);

    match state.log.append(&record).await {
        Ok(total) => {
            info!("Recorded submission {reference} ({total} total)");
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": "Form submitted successfully",
                    "data": {
                        "reference": reference,
                        "name": form.name,
                        "email": form.email,
                        "service": form.service,
                        "timestamp": timestamp.to_rfc3339(),
                        "emails_sent": {
                            "to_support": to_support,
                            "to_client": to_client,
                        },
                    },
                })),
            )
        }
        Err(err) => {
            error!("Failed to record submission {reference}: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Submission processed but could not be recorded",
                    "data": {
                        "reference": reference,
                        "saved": false,
                    },
                })),
            )
        }
    }
}

/// `POST /send` - simplified endpoint: one support email, no auto-reply,
/// no log record.
pub async fn send_simple(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<SubmissionRequest>,
) -> (StatusCode, Json<Value>) {
    let form = match request.into_form() {
        Ok(form) => form,
        Err(received) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Missing required fields",
                    "received": received,
                })),
            );
        }
    };

    let email = templates::simple_notification(&form, state.config.support_address(), Utc::now());

    match state.mailer.send(&email).await {
        Ok(message_id) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message_id": message_id,
            })),
        ),
        Err(err) => {
            error!("Simple send failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": err.to_string(),
                })),
            )
        }
    }
}

/// `POST /save-submission` - wrap an arbitrary JSON body in a backup record
/// and append it to the log without sending any mail.
pub async fn save_raw(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let extra = match body {
        Value::Object(map) => map,
        other => {
            let mut map = serde_json::Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };

    let record = SubmissionRecord::backup(extra);

    match state.log.append(&record).await {
        Ok(_) => {
            info!("Submission saved locally: {}", record.id);
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": "Saved locally",
                    "data": record,
                })),
            )
        }
        Err(err) => {
            error!("Failed to save submission {}: {err}", record.id);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": err.to_string(),
                })),
            )
        }
    }
}

/// `GET /submissions/view` - total count plus the most recent records,
/// newest first.
pub async fn view_submissions(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.log.recent(state.config.storage.view_limit).await {
        Ok((count, submissions)) => (
            StatusCode::OK,
            Json(json!({
                "count": count,
                "submissions": submissions,
            })),
        ),
        Err(err) => {
            error!("Failed to read submission log: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": err.to_string(),
                })),
            )
        }
    }
}
