mod error;
pub mod notification;
mod photo;
mod types;

pub use error::*;
pub use notification::{Notification, NotificationBus, Subscriber, Subscription, SubscriptionHandle};
pub use photo::Photos;
pub use types::*;

/// Handles every service command needs, constructed once at startup and
/// passed down explicitly.
#[derive(Clone)]
pub struct State<S> {
    pub store: S,
    pub bus: NotificationBus,
}

pub fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
