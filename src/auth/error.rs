/// Failure kinds surfaced by the auth facade.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidInput,
    #[error("User already exists.")]
    AlreadyExists,
    #[error("Incorrect email or password.")]
    InvalidCredentials,
    #[error("Invalid token.")]
    InvalidToken,
    /// Storage or hashing failure; never folded into the kinds above.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}
