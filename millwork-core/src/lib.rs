pub mod identity;

pub use identity::{Permission, Role, UserProfile};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
    #[error("Permission denied: {role} cannot {permission}")]
    PermissionDenied { role: Role, permission: Permission },
}

pub type CoreResult<T> = Result<T, CoreError>;
