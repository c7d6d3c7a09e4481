//! Caller-side glue between a [`ContentStore`] and the [`TranslationEngine`].

use crate::context::{ContentStore, SubmissionContext};
use crate::engine::{Export, ImportOutcome, TranslationEngine};
use crate::error::EngineError;
use crate::fields::EntityFields;

/// Outcome of a download, with the id the target entity was written under.
#[derive(Debug, Clone)]
pub struct Download {
    pub target_id: String,
    pub outcome: ImportOutcome,
}

/// Reads the source entity and exports it.
pub fn upload<S: ContentStore>(
    engine: &TranslationEngine,
    store: &S,
    source_id: &str,
    ctx: &SubmissionContext,
) -> Result<Export, EngineError> {
    let source = store.read_entity(source_id)?;
    log::debug!("Uploading entity '{}' with {} fields", source_id, source.len());
    engine.export(&source, ctx)
}

/// Imports a translated document and writes the merged fields to the target entity.
///
/// Without a `target_id` a new entity is created from the merge of the translation and the
/// source.
pub fn download<S: ContentStore>(
    engine: &TranslationEngine,
    store: &mut S,
    xml: &str,
    source_id: &str,
    target_id: Option<&str>,
    ctx: &SubmissionContext,
) -> Result<Download, EngineError> {
    let source = store.read_entity(source_id)?;
    let target = match target_id {
        Some(id) => store.read_entity(id)?,
        None => EntityFields::new(),
    };

    let outcome = engine.import(xml, &source, &target, ctx)?;
    let target_id = store.write_entity(target_id, outcome.fields.clone())?;
    log::debug!(
        "Wrote translated entity '{}' ({} metadata keys removed)",
        target_id,
        outcome.removed_meta.len()
    );
    Ok(Download { target_id, outcome })
}
