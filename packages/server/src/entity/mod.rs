pub mod report;
pub mod rice;
pub mod rice_comment;
pub mod rice_dotfiles;
pub mod rice_preview;
pub mod rice_star;
pub mod tag;
pub mod user;
pub mod user_ban;
