use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, ResponseError, options, post, web};
use anyhow::Context;

use crate::domain::{SubscriberEmail, SubscriptionRecord};
use crate::storage::{EMAIL_LIST_KEY, EmailStore};

use super::CORS_ALLOW_ANY_ORIGIN;

/// How many times a lost index-list race is retried before giving up.
const INDEX_UPDATE_ATTEMPTS: usize = 5;

#[derive(serde::Deserialize)]
pub struct SubscribeRequest {
    // An absent field validates (and fails) like an empty address, while a
    // body that is not JSON at all is a server error.
    #[serde(default)]
    pub email: String,
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscribeError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            SubscribeError::ValidationError(_) => "Invalid email address",
            SubscribeError::UnexpectedError(_) => "Server error. Please try again.",
        };
        HttpResponse::build(self.status_code())
            .insert_header(CORS_ALLOW_ANY_ORIGIN)
            .json(serde_json::json!({ "success": false, "error": message }))
    }
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(body, request, store),
    fields(subscriber_email = tracing::field::Empty)
)]
#[post("/api/subscribe")]
pub async fn subscribe(
    body: web::Bytes,
    request: HttpRequest,
    store: web::Data<EmailStore>,
) -> Result<HttpResponse, SubscribeError> {
    let body: SubscribeRequest =
        serde_json::from_slice(&body).context("Failed to parse the request body as JSON")?;
    let email = SubscriberEmail::parse(&body.email).map_err(SubscribeError::ValidationError)?;
    tracing::Span::current().record("subscriber_email", tracing::field::display(&email));

    let existing = store
        .get(email.as_ref())
        .await
        .context("Failed to look up the subscriber")?;
    if existing.is_some() {
        return Ok(success_response("Already subscribed"));
    }

    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");
    let record = SubscriptionRecord::new(&email, user_agent);
    let record = serde_json::to_string(&record).context("Failed to encode the new record")?;
    store
        .put(email.as_ref(), &record)
        .await
        .context("Failed to store the new record")?;

    append_to_index(&store, email.as_ref()).await?;

    Ok(success_response("Successfully subscribed!"))
}

/// Read-modify-write of the index list, compare-and-swap protected so a
/// concurrent subscription cannot erase this one's entry. A crash between
/// the record write and this call still leaves the record unlisted; that
/// window is accepted.
#[tracing::instrument(name = "Appending the email to the index list", skip(store))]
async fn append_to_index(store: &EmailStore, email: &str) -> Result<(), anyhow::Error> {
    for _ in 0..INDEX_UPDATE_ATTEMPTS {
        let current = store
            .get(EMAIL_LIST_KEY)
            .await
            .context("Failed to read the index list")?;
        let mut list: Vec<String> = match current.as_deref() {
            Some(raw) => serde_json::from_str(raw).context("Failed to decode the index list")?,
            None => Vec::new(),
        };
        if list.iter().any(|listed| listed == email) {
            return Ok(());
        }
        list.push(email.to_owned());
        let updated = serde_json::to_string(&list).context("Failed to encode the index list")?;
        if store
            .compare_and_swap(EMAIL_LIST_KEY, current.as_deref(), &updated)
            .await
            .context("Failed to write the index list")?
        {
            return Ok(());
        }
        tracing::debug!("Lost an index list write race, retrying");
    }
    Err(anyhow::anyhow!(
        "Failed to append to the index list after {} attempts",
        INDEX_UPDATE_ATTEMPTS
    ))
}

fn success_response(message: &str) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(CORS_ALLOW_ANY_ORIGIN)
        .json(serde_json::json!({ "success": true, "message": message }))
}

#[options("/api/subscribe")]
pub async fn subscribe_preflight() -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header(CORS_ALLOW_ANY_ORIGIN)
        .insert_header(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .insert_header(("Access-Control-Allow-Headers", "Content-Type"))
        .insert_header(("Access-Control-Max-Age", "86400"))
        .finish()
}
