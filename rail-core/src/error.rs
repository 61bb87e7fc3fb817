use thiserror::Error;

/// Raised when an upstream payload cannot be mapped onto a domain entity.
///
/// `path` is the upstream-side location of the offending value, e.g.
/// `trips[0].legs[1].start.id`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{entity}: missing required field `{path}`")]
    MissingField { entity: &'static str, path: String },

    #[error("{entity}: invalid value at `{path}`: {reason}")]
    InvalidField {
        entity: &'static str,
        path: String,
        reason: String,
    },
}

impl ValidationError {
    pub fn entity(&self) -> &'static str {
        match self {
            Self::MissingField { entity, .. } | Self::InvalidField { entity, .. } => entity,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::MissingField { path, .. } | Self::InvalidField { path, .. } => path,
        }
    }
}
