use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("invalid terrain parameter `{field}`: {reason}")]
    InvalidParam {
        field: &'static str,
        reason: String,
    },

    #[error("surface has zero area ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },

    #[error("no surface to draw on yet")]
    SurfaceNotCreated,

    #[error("invalid projection: {0}")]
    InvalidProjection(String),

    #[error("height map must be square, got a row of {cols} cells in a {rows}-row map")]
    NotSquare { rows: usize, cols: usize },

    #[error("failed to write height map image: {0}")]
    Image(#[from] image::ImageError),
}

impl TerrainError {
    pub(crate) fn param(field: &'static str, reason: impl Into<String>) -> Self {
        TerrainError::InvalidParam {
            field,
            reason: reason.into(),
        }
    }
}
