use chrono::{SecondsFormat, Utc};

use crate::domain::SubscriberEmail;

/// Where captured addresses come from. There is a single capture form today.
const SUBSCRIPTION_SOURCE: &str = "coming-soon-page";

/// The stored metadata for one subscriber, serialized as JSON both in the
/// key-value store and on the export wire.
///
/// `source` and `user_agent` are optional so that the export fallback for a
/// listed-but-missing record (`{ email, subscribedAt: "unknown" }`) uses the
/// same type.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub email: String,
    pub subscribed_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl SubscriptionRecord {
    pub fn new(email: &SubscriberEmail, user_agent: &str) -> Self {
        Self {
            email: email.as_ref().to_owned(),
            subscribed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            source: Some(SUBSCRIPTION_SOURCE.to_owned()),
            user_agent: Some(user_agent.to_owned()),
        }
    }

    /// Stand-in for a listed email whose record is missing from storage.
    pub fn placeholder(email: &str) -> Self {
        Self {
            email: email.to_owned(),
            subscribed_at: "unknown".to_owned(),
            source: None,
            user_agent: None,
        }
    }
}
