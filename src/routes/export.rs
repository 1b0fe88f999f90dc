use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, get, web};
use anyhow::Context;
use futures_util::future::try_join_all;
use secrecy::ExposeSecret;

use crate::domain::SubscriptionRecord;
use crate::startup::ExportApiKey;
use crate::storage::{EMAIL_LIST_KEY, EmailStore};

use super::{CORS_ALLOW_ANY_ORIGIN, error_chain_fmt};

/// Header carrying the caller-supplied export key.
pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(thiserror::Error)]
pub enum ExportError {
    #[error("Authorization failed.")]
    AuthError(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ExportError {
    fn status_code(&self) -> StatusCode {
        match self {
            ExportError::AuthError(_) => StatusCode::UNAUTHORIZED,
            ExportError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ExportError::AuthError(_) => "Unauthorized",
            ExportError::UnexpectedError(_) => "Failed to export emails",
        };
        HttpResponse::build(self.status_code())
            .insert_header(CORS_ALLOW_ANY_ORIGIN)
            .json(serde_json::json!({ "error": message }))
    }
}

#[tracing::instrument(name = "Exporting captured emails", skip_all)]
#[get("/api/emails")]
pub async fn export_emails(
    request: HttpRequest,
    store: web::Data<EmailStore>,
    api_key: web::Data<ExportApiKey>,
) -> Result<HttpResponse, ExportError> {
    // Storage is only touched once the caller is authorized.
    authorize(&request, &api_key).map_err(ExportError::AuthError)?;

    let listed = read_index(&store).await?;
    let emails = try_join_all(listed.iter().map(|email| resolve_record(&store, email))).await?;

    Ok(HttpResponse::Ok()
        .insert_header(CORS_ALLOW_ANY_ORIGIN)
        .json(serde_json::json!({
            "success": true,
            "count": emails.len(),
            "emails": emails,
        })))
}

fn authorize(request: &HttpRequest, api_key: &ExportApiKey) -> Result<(), anyhow::Error> {
    let supplied = request
        .headers()
        .get(API_KEY_HEADER)
        .ok_or_else(|| anyhow::anyhow!("The '{}' header was missing", API_KEY_HEADER))?
        .to_str()
        .context("The API key header was not valid UTF-8")?;
    if supplied != api_key.0.expose_secret() {
        return Err(anyhow::anyhow!("The supplied API key does not match"));
    }
    Ok(())
}

async fn read_index(store: &EmailStore) -> Result<Vec<String>, anyhow::Error> {
    match store
        .get(EMAIL_LIST_KEY)
        .await
        .context("Failed to read the index list")?
    {
        Some(raw) => serde_json::from_str(&raw).context("Failed to decode the index list"),
        None => Ok(Vec::new()),
    }
}

/// A listed email whose record is gone yields a placeholder instead of
/// failing the whole export.
async fn resolve_record(
    store: &EmailStore,
    email: &str,
) -> Result<SubscriptionRecord, anyhow::Error> {
    match store
        .get(email)
        .await
        .context("Failed to read a subscription record")?
    {
        Some(raw) => serde_json::from_str(&raw).context("Failed to decode a subscription record"),
        None => {
            tracing::warn!(email, "A listed email has no subscription record");
            Ok(SubscriptionRecord::placeholder(email))
        }
    }
}
