pub mod list;
mod subscription;
mod user;

pub use list::{CookList, Favorites, ListResponse, Recents};
pub use subscription::UserSubscriber;
pub use user::{Command, RegisterInput, UserRecord, UserView};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
