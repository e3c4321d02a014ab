use thiserror::Error;

/// Errors raised while validating inputs or calculating feed-in.
///
/// All validation happens up front when a model is invoked; a single failing
/// column or parameter aborts the whole calculation. Numerically awkward
/// geometry near the horizon is handled by clipping/substitution in the solar
/// calculations and is never reported as an error.
#[derive(Debug, Error)]
pub enum FeedinError {
    #[error("weather data is missing required column '{column}' for model '{model}'")]
    MissingColumn {
        column: &'static str,
        model: &'static str,
    },
    #[error("no record named '{key}' in the {table} table")]
    UnknownRecord { key: String, table: &'static str },
    #[error("invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
    #[error("invalid weather series: {0}")]
    InvalidWeather(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub(crate) fn invalid_parameter(parameter: &'static str, reason: impl Into<String>) -> FeedinError {
    FeedinError::InvalidParameter {
        parameter,
        reason: reason.into(),
    }
}
