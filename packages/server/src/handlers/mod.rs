pub mod admin;
pub mod auth;
pub mod comment;
pub mod health;
pub mod report;
pub mod rice;
pub mod tag;
pub mod user;
