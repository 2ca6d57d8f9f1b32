//! Error type shared by the codec, compositor and session.

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("decode timed out after {0} ms")]
    DecodeTimeout(u64),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("crop rectangle covers no pixels ({width}x{height})")]
    EmptyCrop { width: u32, height: u32 },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EditorError {
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            EditorError::encode("x")
                .to_string()
                .contains("encode error:")
        );
        assert!(
            EditorError::invalid_state("x")
                .to_string()
                .contains("invalid state:")
        );
        assert!(
            EditorError::surface("x")
                .to_string()
                .contains("surface error:")
        );
        assert_eq!(
            EditorError::EmptyCrop {
                width: 0,
                height: 12
            }
            .to_string(),
            "crop rectangle covers no pixels (0x12)"
        );
    }

    #[test]
    fn io_preserves_source() {
        let err = EditorError::from(std::io::Error::other("boom"));
        assert!(err.to_string().contains("boom"));
    }
}
