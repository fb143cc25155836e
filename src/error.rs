use thiserror::Error;

/// Per-call failures of the detection core.
///
/// None of these end the detection loop: the cycle that hit one is skipped
/// and the next tick proceeds normally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    #[error("invalid frame: {reason}")]
    InvalidFrame { reason: String },
    #[error(
        "frame dimensions {}x{} do not match reference {}x{}",
        .current.0, .current.1, .reference.0, .reference.1
    )]
    DimensionMismatch {
        current: (u32, u32),
        reference: (u32, u32),
    },
    #[error("invalid detector config: {0}")]
    InvalidConfig(String),
}

impl DetectError {
    pub(crate) fn invalid_frame(reason: impl Into<String>) -> Self {
        Self::InvalidFrame {
            reason: reason.into(),
        }
    }
}

pub type DetectResult<T> = std::result::Result<T, DetectError>;
