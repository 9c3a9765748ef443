use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Workspace invalid: {0}")]
    Workspace(String),

    #[error("Command `{command}` exited with status {exit_code}")]
    Process { command: String, exit_code: i32 },

    #[error("Unresolved template placeholders: {}", .0.join(", "))]
    Template(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Workspace(_) => "WORKSPACE_INVALID",
            Error::Process { .. } => "PROCESS_FAILURE",
            Error::Template(_) => "TEMPLATE_UNRESOLVED",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Other(_) => "ERROR",
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Error::Other(message.into())
    }

    /// Exit status to report for this error. Process failures keep the
    /// child's exit code so the host build system sees the real status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Process { exit_code, .. } if *exit_code > 0 => *exit_code,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_error_keeps_exit_code() {
        let err = Error::Process {
            command: "mvn package".to_string(),
            exit_code: 127,
        };
        assert_eq!(err.exit_code(), 127);
        assert_eq!(err.code(), "PROCESS_FAILURE");
    }

    #[test]
    fn config_error_exit_code_is_one() {
        assert_eq!(Error::config("registry unresolved").exit_code(), 1);
    }
}
