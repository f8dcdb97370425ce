use thiserror::Error;

use crate::draw::PrimitiveMode;
use crate::shader::{CompileError, SelectorId, ShaderStage};

/// Why a draw call was aborted.
///
/// Every variant leaves the previously bound state untouched, so the next draw
/// starts from exactly where the last successful one left off.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("state block budget exhausted ({live} live of {budget})")]
    OutOfStateBlocks { live: usize, budget: usize },
    #[error("upload heap exhausted")]
    UploadExhausted,
    #[error("failed to compile {stage:?} shader variant for selector {selector:?}")]
    ShaderCompile {
        selector: SelectorId,
        stage: ShaderStage,
        #[source]
        source: CompileError,
    },
    #[error("primitive mode {0:?} has no hardware equivalent")]
    UnsupportedPrimitive(PrimitiveMode),
    #[error("indexed draw without a bound index buffer")]
    MissingIndexBuffer,
}

impl DrawError {
    /// Resource exhaustion and compilation failures may succeed on a later try;
    /// the other kinds need the caller to change its request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DrawError::OutOfStateBlocks { .. }
                | DrawError::UploadExhausted
                | DrawError::ShaderCompile { .. }
        )
    }
}
