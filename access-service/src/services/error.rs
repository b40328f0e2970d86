use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Invite code not found")]
    AccessCodeNotFound,

    #[error("No invites remaining")]
    InvitesExhausted,

    #[error("Operation not permitted for this role")]
    NotPermitted,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error(transparent)]
    Store(AppError),
}

impl From<AppError> for ServiceError {
    fn from(err: AppError) -> Self {
        ServiceError::Store(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            // Never reveals whether the identifier or the password was wrong.
            ServiceError::InvalidCredentials => AppError::AuthError(anyhow::anyhow!(
                "Email/document or password is incorrect. Check your credentials and try again."
            )),
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::AccessCodeNotFound => {
                AppError::NotFound(anyhow::anyhow!("Invite code not found"))
            }
            ServiceError::InvitesExhausted => {
                AppError::Forbidden(anyhow::anyhow!("No invites remaining"))
            }
            ServiceError::NotPermitted => {
                AppError::Forbidden(anyhow::anyhow!("Operation not permitted for this role"))
            }
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::Store(e) => e,
        }
    }
}
