pub mod temporary_link;
pub mod user;

pub use temporary_link::{EmailInfo, LinkPurpose, NewTemporaryLink, TemporaryLink};
pub use user::User;
