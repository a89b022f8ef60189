pub mod activate;
pub mod health;
pub mod password_reset;
pub mod register;

pub use activate::activate_account;
pub use health::health_check;
pub use password_reset::{request_password_reset, reset_password};
pub use register::register;
