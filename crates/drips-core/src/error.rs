//! Error types for drips lists.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("invalid key: {0}")] InvalidKey(String),
    #[error("delta overflow at cycle {cycle}")] DeltaOverflow { cycle: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("invalid length: got {got}, expected {expected}")] InvalidLength { got: usize, expected: usize },
    #[error("invalid attached flag: {0}")] InvalidFlag(u64),
    #[error("non-zero padding")] NonZeroPadding,
}

#[derive(Error, Debug)]
pub enum DripsError {
    #[error(transparent)] List(#[from] ListError),
    #[error(transparent)] Layout(#[from] LayoutError),
    #[error("storage: {0}")] Storage(String),
    #[error("config: {0}")] Config(String),
}
