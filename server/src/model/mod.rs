pub mod auth;
pub mod note;
pub mod user;
