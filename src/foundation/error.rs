/// Convenience result type used across the crate.
pub type DrawPoolResult<T> = Result<T, DrawPoolError>;

/// Error taxonomy for pool recording, caching and rendering.
#[derive(thiserror::Error, Debug)]
pub enum DrawPoolError {
    /// A retroactive edit addressed an object that does not exist.
    #[error("draw object index {index} out of range (pool holds {len})")]
    IndexOutOfRange {
        /// Requested object index.
        index: usize,
        /// Number of objects recorded at the time of the request.
        len: usize,
    },

    /// A buffer-backed draw kind was recorded without its buffer.
    #[error("{0:?} draws from a caller-built coordinate buffer")]
    MissingBuffer(crate::pool::method::DrawMethodType),

    /// Offscreen target could not be (re)allocated.
    #[error("resize error: {0}")]
    Resize(String),

    /// Invalid texture data.
    #[error("texture error: {0}")]
    Texture(String),

    /// Failure while replaying into a target.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid settings.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DrawPoolError {
    /// Build a [`DrawPoolError::IndexOutOfRange`] value.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Build a [`DrawPoolError::Resize`] value.
    pub fn resize(msg: impl Into<String>) -> Self {
        Self::Resize(msg.into())
    }

    /// Build a [`DrawPoolError::Texture`] value.
    pub fn texture(msg: impl Into<String>) -> Self {
        Self::Texture(msg.into())
    }

    /// Build a [`DrawPoolError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`DrawPoolError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
