use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised while parsing markup, reading glyph metrics, or laying out a text box.
///
/// Every variant is fatal to the text box that produced it. Positions are byte offsets
/// into the box's source string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GlyphError {
    #[error("input is empty")]
    EmptyInput,

    #[error("'{open}' at byte {position} is never closed")]
    UnterminatedEnclosure { open: char, position: usize },

    #[error("enclosure opened at byte {position} is empty")]
    EmptyEnclosure { position: usize },

    #[error("'{close}' at byte {position} has no matching opener")]
    UnexpectedCloser { close: char, position: usize },

    #[error("no command at byte {position}")]
    UnrecognisedCommand { position: usize },

    #[error("math mode opened at byte {position} is never closed")]
    UnterminatedMathMode { position: usize },

    #[error("script marker at byte {position} has no argument")]
    MissingScriptArgument { position: usize },

    #[error(
        "metrics count mismatch: {positions} positions, {attributes} attributes, {rendered} rendered glyphs"
    )]
    MetricsCountMismatch {
        positions: usize,
        attributes: usize,
        rendered: usize,
    },

    #[error("malformed {resource} record on line {line}: {reason}")]
    MalformedMetrics {
        resource: &'static str,
        line: usize,
        reason: String,
    },

    #[error("glyph sheet unavailable: {0}")]
    SheetUnavailable(String),
}

impl GlyphError {
    /// Stable machine-readable code, used in HTTP error bodies and batch results.
    pub fn code(&self) -> &'static str {
        match self {
            GlyphError::EmptyInput => "EMPTY_INPUT",
            GlyphError::UnterminatedEnclosure { .. } => "UNTERMINATED_ENCLOSURE",
            GlyphError::EmptyEnclosure { .. } => "EMPTY_ENCLOSURE",
            GlyphError::UnexpectedCloser { .. } => "UNEXPECTED_CLOSER",
            GlyphError::UnrecognisedCommand { .. } => "UNRECOGNISED_COMMAND",
            GlyphError::UnterminatedMathMode { .. } => "UNTERMINATED_MATH_MODE",
            GlyphError::MissingScriptArgument { .. } => "MISSING_SCRIPT_ARGUMENT",
            GlyphError::MetricsCountMismatch { .. } => "METRICS_COUNT_MISMATCH",
            GlyphError::MalformedMetrics { .. } => "MALFORMED_METRICS",
            GlyphError::SheetUnavailable(_) => "SHEET_UNAVAILABLE",
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Glyph(#[from] GlyphError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Glyph(GlyphError::SheetUnavailable(msg)) => {
                tracing::warn!("Glyph sheet unavailable: {msg}");
                (StatusCode::NOT_FOUND, "SHEET_UNAVAILABLE", self.to_string())
            }
            AppError::Glyph(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.code(), e.to_string()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_error_codes_are_distinct() {
        let errors = [
            GlyphError::EmptyInput,
            GlyphError::UnterminatedEnclosure { open: '{', position: 0 },
            GlyphError::EmptyEnclosure { position: 0 },
            GlyphError::UnexpectedCloser { close: '}', position: 0 },
            GlyphError::UnrecognisedCommand { position: 0 },
            GlyphError::UnterminatedMathMode { position: 0 },
            GlyphError::MissingScriptArgument { position: 0 },
            GlyphError::MetricsCountMismatch {
                positions: 1,
                attributes: 2,
                rendered: 3,
            },
            GlyphError::MalformedMetrics {
                resource: "position",
                line: 1,
                reason: "x".to_string(),
            },
            GlyphError::SheetUnavailable("missing".to_string()),
        ];
        let mut codes: Vec<&str> = errors.iter().map(GlyphError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_markup_error_maps_to_unprocessable() {
        let err = AppError::from(GlyphError::UnterminatedMathMode { position: 3 });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_missing_sheet_maps_to_not_found() {
        let err = AppError::from(GlyphError::SheetUnavailable("title".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_mismatch_message_names_all_counts() {
        let msg = GlyphError::MetricsCountMismatch {
            positions: 4,
            attributes: 5,
            rendered: 6,
        }
        .to_string();
        assert!(msg.contains('4') && msg.contains('5') && msg.contains('6'));
    }
}
