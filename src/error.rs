/// Rejected arguments. Raised before any process is launched, so nothing
/// is written to the history for these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("{entry}: missing required argument <{name}>")]
    Missing { entry: String, name: String },

    #[error("{entry}: unknown option '{flag}'")]
    UnknownFlag { entry: String, flag: String },

    #[error("{entry}: option '{flag}' needs a value")]
    MissingValue { entry: String, flag: String },

    #[error("{entry}: unexpected argument '{value}'")]
    Unexpected { entry: String, value: String },

    #[error("{entry}: invalid value '{value}' for {name}: {reason}")]
    Invalid {
        entry: String,
        name: String,
        value: String,
        reason: String,
    },
}

impl ArgError {
    pub fn invalid(entry: &str, name: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ArgError::Invalid {
            entry: entry.to_string(),
            name: name.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(entry: &str, name: &str) -> Self {
        ArgError::Missing {
            entry: entry.to_string(),
            name: name.to_string(),
        }
    }
}
