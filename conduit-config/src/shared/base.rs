use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A field holds a value outside of its allowed range.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// The batch size exceeds the number of sources that can fill it.
    #[error(
        "`sequencer.batch_size` ({batch_size}) exceeds the number of sources ({sources}), batches would never fill"
    )]
    BatchLargerThanSources { batch_size: usize, sources: usize },
}
