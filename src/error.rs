use thiserror::Error;

/// Errors that abort a whole engine operation.
///
/// Everything recoverable (malformed delimiters, undecodable capsules, lock misses, ...) is
/// reported through [`crate::diagnostics::Diagnostics`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Content is not valid UTF-8 text: {0}")]
    InvalidUtf8(String),

    #[error("Block nesting exceeds the configured limit of {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while reading or writing an exchange XML document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Failed to parse exchange XML: {0}")]
    Xml(String),

    #[error("Failed to write exchange XML: {0}")]
    Write(String),

    #[error("Unexpected element '{found}' inside '{parent}'")]
    UnexpectedElement { parent: String, found: String },

    #[error("Element '{element}' is missing the required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    #[error("Exchange document has no root element")]
    MissingRoot,

    #[error("Exchange nesting exceeds the configured limit of {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Errors raised while decoding an attribute capsule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapsuleError {
    #[error("Capsule is not valid base64: {0}")]
    Base64(String),

    #[error("Capsule payload is not valid UTF-8")]
    Utf8,

    #[error("Capsule payload could not be decoded at offset {offset}: {message}")]
    Payload { offset: usize, message: String },

    #[error("Capsule payload decoded to a {found} instead of an attribute mapping")]
    NotAMapping { found: String },
}

/// Errors raised while loading or validating engine configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Rule '{rule}' refers to unregistered replacer '{replacer_id}'")]
    UnknownReplacer { rule: String, replacer_id: String },

    #[error("Failed to parse configuration JSON: {0}")]
    Json(String),

    #[error("Could not read configuration file '{path}': {message}")]
    Io { path: String, message: String },
}

/// Errors surfaced by a [`crate::context::ContentStore`] implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Entity '{0}' not found")]
    NotFound(String),

    #[error("Content store failure: {0}")]
    Backend(String),
}
