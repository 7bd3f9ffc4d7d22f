use thiserror::Error;

/// Failures of the durable key-value store. Never surfaced past the
/// persistence adapter; callers only see them in the logs.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage io: {0}")] Io(#[from] std::io::Error),
    #[error("storage encoding: {0}")] Serde(#[from] serde_json::Error),
    #[error("storage persist: {0}")] Persist(#[from] tempfile::PersistError),
}

/// Caller precondition violations detected while building a request.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssembleError {
    #[error("no products selected")] EmptySelection,
    #[error("message is empty")] EmptyMessage,
}

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("HTTP error! status: {status}")] Http { status: u16 },
    #[error("Invalid response format from API: {0}")] Format(String),
    #[error("request timed out")] Timeout,
    #[error("request failed: {0}")] Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Transport(err)
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("reading catalog {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("fetching catalog: {0}")] Fetch(#[from] reqwest::Error),
    #[error("parsing catalog: {0}")] Parse(#[from] serde_json::Error),
    #[error("no product with id {0}")] UnknownProduct(i64),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)] Assemble(#[from] AssembleError),
    #[error(transparent)] Completion(#[from] CompletionError),
    #[error("response discarded: a newer action superseded it")] Superseded,
}
