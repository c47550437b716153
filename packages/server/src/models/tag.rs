use serde::{Deserialize, Serialize};

use crate::entity::tag;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct TagNameRequest {
    #[schema(example = "minimal")]
    pub name: String,
}

pub fn validate_tag_name(name: &str) -> Result<(), AppError> {
    let len = name.chars().count();
    if len < 2 || len > 16 {
        return Err(AppError::Validation(
            "Tag name must be 2-16 characters".into(),
        ));
    }
    if !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::Validation(
            "Tag name must contain only letters".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(tag: tag::Model) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}
