//! # Blockport - Content Structuring & Translation Merge Engine
//!
//! **Blockport** takes CMS content written with block-comment delimiters
//! (`<!-- wp:name {"attr":1} -->...<!-- /wp:name -->`), turns it into an addressable tree,
//! ships the translatable parts through an XML exchange document and merges the translated
//! result back onto a target entity without touching locked regions.
//!
//! ## Core Workflow
//!
//! 1.  **Configure**: Load an `EngineConfig` (or use the default) and build a `TranslationEngine`
//!     with `TranslationEngine::builder`, registering custom replacers and an identifier resolver.
//! 2.  **Export**: Call `export` with the source entity's fields. Block content is parsed, block
//!     attributes are flattened, and everything translatable lands in an `ExchangeDocument`.
//! 3.  **Translate**: Send `document.to_xml()` to a translator (out of scope for this crate).
//! 4.  **Import**: Call `import` with the translated XML plus the source and current target
//!     fields. Attributes keep their original types, identifiers are remapped, locked blocks and
//!     metadata keys keep the target's current value.
//!
//! Recoverable anomalies never fail an operation; they are counted in the returned
//! `Diagnostics`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockport::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let resolver = MapResolver::new().with_mapping("attachment", "17", "42");
//!     let engine = TranslationEngine::builder(EngineConfig::default())
//!         .with_resolver(Arc::new(resolver))
//!         .build()?;
//!
//!     let source = EntityFields::new()
//!         .with_entity("post_title", "Hello")
//!         .with_entity(
//!             "post_content",
//!             "<!-- wp:paragraph --><p>Hello world</p><!-- /wp:paragraph -->",
//!         );
//!     let ctx = SubmissionContext::new("en", "de").with_locked_path("meta/subtitle");
//!
//!     let export = engine.export(&source, &ctx)?;
//!     let xml = export.document.to_xml()?;
//!
//!     // ... the translator edits `xml` ...
//!
//!     let target = EntityFields::new();
//!     let outcome = engine.import(&xml, &source, &target, &ctx)?;
//!     println!("{:?}", outcome.fields.entity.get("post_content"));
//!     println!("Recoveries: {}", outcome.diagnostics);
//!     Ok(())
//! }
//! ```

pub mod block;
pub mod codec;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod fields;
pub mod flatten;
pub mod merge;
pub mod pipeline;
pub mod prelude;
pub mod replacer;
