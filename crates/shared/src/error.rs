use strum::{AsRefStr, Display};

/// Collaborator a call was addressed to.
#[derive(Display, AsRefStr, Clone, Copy, Debug, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum Target {
    Tag,
    User,
    Rating,
    Photo,
    Favorite,
    CookList,
    Recent,
    Recipe,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validate(#[from] validator::ValidationErrors),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("failed to resolve {target}: {source}")]
    Resolution {
        target: Target,
        #[source]
        source: Box<Error>,
    },

    #[error("{target} {operation} failed: {source}")]
    Collaborator {
        target: Target,
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("timed out")]
    Timeout,

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Unknown(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps a failed resolution during assembly. Integrity violations are
    /// never downgraded: they surface as they are.
    pub fn resolution(target: Target, source: Error) -> Self {
        match source {
            Error::Integrity(_) | Error::Resolution { .. } => source,
            source => Error::Resolution {
                target,
                source: Box::new(source),
            },
        }
    }

    /// Adds collaborator context to infrastructure failures. Business errors
    /// pass through untouched.
    pub fn within(self, target: Target, operation: &'static str) -> Self {
        match self {
            Error::Database(_) | Error::Serialization(_) | Error::Unknown(_) | Error::Timeout => {
                Error::Collaborator {
                    target,
                    operation,
                    source: Box::new(self),
                }
            }
            other => other,
        }
    }

    pub fn target(&self) -> Option<Target> {
        match self {
            Error::Resolution { target, .. } | Error::Collaborator { target, .. } => Some(*target),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Resolution { source, .. } | Error::Collaborator { source, .. } => {
                source.is_not_found()
            }
            _ => false,
        }
    }
}

pub trait ResultExt<T> {
    fn within(self, target: Target, operation: &'static str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn within(self, target: Target, operation: &'static str) -> Result<T> {
        self.map_err(|e| e.within(target, operation))
    }
}

#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Server(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Server(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! not_found {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::NotFound(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::NotFound(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! forbidden {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Forbidden(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Forbidden(format!($fmt, $($arg)*)))
    };
}
