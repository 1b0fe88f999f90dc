mod subscriber_email;
mod subscription;

pub use subscriber_email::SubscriberEmail;
pub use subscription::SubscriptionRecord;
