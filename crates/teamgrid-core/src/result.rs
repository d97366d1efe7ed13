use crate::error::GridError;

pub type GridResult<T> = Result<T, GridError>;
