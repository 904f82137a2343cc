use thiserror::Error;

pub type TypesResult<T> = Result<T, TypesError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid username: must be 1-{max} characters of [A-Za-z0-9_.-]", max = crate::ids::MAX_USERNAME_LEN)]
    InvalidUsername,

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid share link token")]
    InvalidLinkToken,
}
