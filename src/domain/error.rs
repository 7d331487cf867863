use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// A tip field breaks a catalog rule (blank text, column length).
    #[error("`{field}` is invalid: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

}
