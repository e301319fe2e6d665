use thiserror::Error;

/// Failure modes surfaced to the CLI. Extraction gaps are not represented
/// here: a page with missing metadata still yields (partially empty) fields.
#[derive(Debug, Error)]
pub enum CiteError {
    /// Unreachable host, timeout, or non-success HTTP status.
    #[error("failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// An `--override` key that names no citation field.
    #[error(
        "unknown field `{name}`; valid fields are author, title, publisher, publish_date, access_date, url"
    )]
    InvalidField { name: String },

    #[error("log store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
