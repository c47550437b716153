pub mod admin;
pub mod auth;
pub mod comment;
pub mod report;
pub mod rice;
pub mod tag;
pub mod user;
