use thiserror::Error;

/// Errors produced by queries on a [`LazySorted`](crate::LazySorted) list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    /// The requested position lies outside `0..len`.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The requested range is inverted or extends past the end of the list.
    #[error("range {start}..{end} out of range for length {len}")]
    RangeOutOfRange {
        start: usize,
        end: usize,
        len: usize,
    },

    /// The active comparator refused to order a pair of elements.
    ///
    /// The query that hit the comparison is abandoned; positions resolved by
    /// earlier queries stay valid and the list remains usable.
    #[error("incomparable elements: {0}")]
    Incomparable(String),
}

impl SortError {
    /// Creates an [`Incomparable`](SortError::Incomparable) error.
    pub fn incomparable(message: impl Into<String>) -> Self {
        SortError::Incomparable(message.into())
    }
}

/// Convenience alias for results with a [`SortError`].
pub type Result<T> = std::result::Result<T, SortError>;
