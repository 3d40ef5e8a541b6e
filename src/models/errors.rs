use crate::tools::ToolExecutionError;

/// Errors surfaced by client operations.
///
/// `Send` and `Api` cover the transport leg (the request could not be
/// dispatched, or the service answered with a non-success status); `Parse`
/// covers a body that is not valid UTF-8 JSON of the expected shape. All
/// three are per-call failures, never fatal to the client. `Tool` wraps a
/// failed tool handler and is deliberately not recovered by the
/// orchestrator.
#[derive(Debug)]
pub enum ClientError {
    Send(String),
    Api(String),
    Parse(String),
    Config(String),
    Tool(ToolExecutionError),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Send(s) => write!(f, "Send Error: {s}"),
            ClientError::Api(s) => write!(f, "API Error: {s}"),
            ClientError::Parse(s) => write!(f, "Parse Error: {s}"),
            ClientError::Config(s) => write!(f, "Config Error: {s}"),
            ClientError::Tool(e) => write!(f, "Tool Error: {e}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Tool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Send(err.to_string())
    }
}

impl From<ToolExecutionError> for ClientError {
    fn from(err: ToolExecutionError) -> Self {
        ClientError::Tool(err)
    }
}
