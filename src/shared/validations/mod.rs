use super::types::PaginationParams;

pub fn validate_pagination(page: Option<u64>, limit: Option<u64>) -> PaginationParams {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20).clamp(1, 100);
    PaginationParams { page, limit }
}

/// A password or portal secret is stored in a single CSV field: it must be
/// non-empty and free of line breaks and separators.
pub fn is_valid_secret(secret: &str) -> bool {
    !secret.is_empty() && !secret.contains([',', '\n', '\r'])
}
