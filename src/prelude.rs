//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the blockport crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use blockport::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let engine = TranslationEngine::builder(EngineConfig::from_file("path/to/config.json")?).build()?;
//! let source = EntityFields::from_file("path/to/source.json")?;
//!
//! let export = engine.export(&source, &SubmissionContext::new("en", "fr"))?;
//! println!("{}", export.document.to_xml()?);
//! # Ok(())
//! # }
//! ```

// Engine and configuration
pub use crate::config::{EngineConfig, RuleConfig};
pub use crate::engine::{Export, ImportOutcome, TranslationEngine};

// Content model and codec
pub use crate::block::{Attributes, Block, Chunk};
pub use crate::codec::{BlockParser, has_blocks, parse_blocks, serialize_blocks};
pub use crate::flatten::{FlatAttributes, flatten, unflatten};

// Exchange
pub use crate::exchange::{ExchangeDocument, ExchangeNode, FieldContent};

// Replacers and merging
pub use crate::merge::{LockedPaths, apply_locks, apply_metadata_locks};
pub use crate::replacer::{
    CopyReplacer, ExcludeReplacer, RelatedReplacer, Replacement, Replacer, ReplacerRegistry, ReplacerRule,
};

// Collaborators
pub use crate::context::{ContentStore, IdentifierResolver, MapResolver, MemoryStore, SubmissionContext};
pub use crate::fields::EntityFields;

// Diagnostics and errors
pub use crate::diagnostics::{Diagnostics, Recovery};
pub use crate::error::{CapsuleError, ConfigError, EngineError, ExchangeError, StoreError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
