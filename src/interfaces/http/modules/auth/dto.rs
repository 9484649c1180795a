//! Authentication DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "user is required"))]
    pub user: String,
    #[validate(length(min = 1, message = "passwd is required"))]
    pub passwd: String,
}

/// The signed-in account; secrets are never returned.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountInfo {
    pub user: String,
    pub net_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "old_passwd is required"))]
    pub old_passwd: String,
    #[validate(length(min = 1, message = "new_passwd is required"))]
    pub new_passwd: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeNetIdPasswordRequest {
    #[validate(length(min = 1, message = "new_passwd is required"))]
    pub new_passwd: String,
}
