pub mod temporary_link;
pub mod user;

pub use temporary_link::{StoreError, TemporaryLinkRepository, TemporaryLinkStore};
pub use user::{UserRepository, UserStore};
