//! Error types for catalog operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Main error type for the store, serializer, query engine and importer.
///
/// Store lookups never fail; absence is zero matches.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Malformed persisted text or malformed query text
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse { line: usize, column: usize, message: String },

    /// Malformed pattern or projection structure
    #[error("Query syntax error: {0}")]
    QuerySyntax(String),

    /// The projection names a variable no pattern mentions
    #[error("Unbound projection variable: ?{0}")]
    UnboundProjectionVariable(String),

    /// Persistence destination unreachable or unwritable
    #[error("Store I/O error on {}: {source}", path.display())]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A collaborator-level insert is missing a required attribute
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    /// Lexical form does not match its datatype
    #[error("Invalid literal '{lexical}' for datatype <{datatype}>")]
    InvalidLiteral { datatype: String, lexical: String },

    /// Import batch could not be decoded
    #[error("Import error: {0}")]
    Import(String),

    /// Named query lookup failed
    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    /// Well-formed RDF or SPARQL the catalog model cannot hold or evaluate
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The store could not be written as Turtle
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CatalogError {
    pub(crate) fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        CatalogError::Parse { line, column, message: message.into() }
    }

    pub(crate) fn store_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::StoreIo { path: path.into(), source }
    }
}

impl From<oxrdfio::RdfParseError> for CatalogError {
    fn from(err: oxrdfio::RdfParseError) -> Self {
        match err {
            oxrdfio::RdfParseError::Syntax(err) => {
                // oxrdfio positions are 0-based
                let (line, column) = err
                    .location()
                    .map_or((1, 1), |range| (range.start.line as usize + 1, range.start.column as usize + 1));
                CatalogError::parse(line, column, err.to_string())
            }
            oxrdfio::RdfParseError::Io(err) => CatalogError::parse(1, 1, err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Import(err.to_string())
    }
}
