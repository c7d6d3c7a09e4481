//! The translation engine: export of entity fields to an exchange document and import of a
//! translated document back onto a target entity.

use crate::block::Block;
use crate::codec::{BlockParser, has_blocks, serialize_blocks};
use crate::config::EngineConfig;
use crate::context::{IdentifierResolver, SubmissionContext};
use crate::diagnostics::Diagnostics;
use crate::error::{ConfigError, EngineError};
use crate::exchange::{Decoder, Encoder, ExchangeDocument, FieldContent, is_numeric};
use crate::fields::{ENTITY_PREFIX, EntityFields, META_PREFIX, PatternFilter, content_block_paths};
use crate::merge::{LockedPaths, MetadataMap, apply_locks, apply_metadata_locks};
use crate::replacer::{RELATED_PREFIX, RelatedReplacer, Replacer, ReplacerRegistry, ReplacerRule, default_media_rules};
use std::sync::Arc;

/// Result of an export.
#[derive(Debug, Clone)]
pub struct Export {
    pub document: ExchangeDocument,
    pub diagnostics: Diagnostics,
}

/// Result of an import: the fields to write to the target entity.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub fields: EntityFields,
    /// Metadata keys to delete from the target.
    pub removed_meta: Vec<String>,
    pub diagnostics: Diagnostics,
}

pub struct TranslationEngine {
    config: EngineConfig,
    parser: BlockParser,
    registry: ReplacerRegistry,
    skip_attributes: PatternFilter,
    skip_fields: PatternFilter,
}

pub struct TranslationEngineBuilder {
    config: EngineConfig,
    replacers: Vec<Box<dyn Replacer>>,
    rules: Vec<ReplacerRule>,
    resolver: Option<Arc<dyn IdentifierResolver>>,
}

impl TranslationEngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            replacers: Vec::new(),
            rules: Vec::new(),
            resolver: None,
        }
    }

    pub fn with_replacer(mut self, replacer: Box<dyn Replacer>) -> Self {
        self.replacers.push(replacer);
        self
    }

    /// Adds a rule after the configured ones; earlier rules win.
    pub fn with_rule(mut self, rule: ReplacerRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Enables `related|<type>` replacers backed by `resolver`.
    pub fn with_resolver(mut self, resolver: Arc<dyn IdentifierResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Result<TranslationEngine, ConfigError> {
        let mut registry = ReplacerRegistry::new();
        for replacer in self.replacers {
            registry.register(replacer);
        }

        let mut rules = self.config.replacer_rules()?;
        rules.extend(self.rules);
        if self.resolver.is_some() && self.config.media_rules {
            rules.extend(default_media_rules()?);
        }

        if let Some(resolver) = &self.resolver {
            for rule in &rules {
                let id = rule.replacer_id();
                if let Some(entity_type) = id.strip_prefix(RELATED_PREFIX) {
                    if !registry.has_replacer(id) {
                        registry.register(Box::new(RelatedReplacer::new(entity_type, Arc::clone(resolver))));
                    }
                }
            }
        }
        for rule in rules {
            registry.add_rule(rule);
        }
        registry.validate()?;

        let engine = TranslationEngine {
            parser: BlockParser::new().with_max_depth(self.config.max_depth),
            skip_attributes: self.config.skip_attribute_filter()?,
            skip_fields: self.config.skip_field_filter()?,
            registry,
            config: self.config,
        };
        log::info!(
            "Translation engine ready: {} rules, {} skipped attribute patterns, {} skipped field patterns",
            engine.registry.rules().len(),
            engine.skip_attributes.len(),
            engine.skip_fields.len()
        );
        Ok(engine)
    }
}

impl TranslationEngine {
    pub fn builder(config: EngineConfig) -> TranslationEngineBuilder {
        TranslationEngineBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ReplacerRegistry {
        &self.registry
    }

    /// Parses raw content with the configured depth limit.
    pub fn parse(&self, raw: &str, diagnostics: &mut Diagnostics) -> Result<Vec<Block>, EngineError> {
        self.parser.parse(raw, diagnostics)
    }

    /// Lists the lockable block paths of every block field of `fields`.
    pub fn lockable_paths(&self, fields: &EntityFields) -> Result<Vec<(String, String)>, EngineError> {
        let mut diagnostics = Diagnostics::new();
        let mut paths = Vec::new();
        for (path, value) in fields.iter() {
            if has_blocks(value) {
                let blocks = self.parser.parse(value, &mut diagnostics)?;
                paths.extend(content_block_paths(&path, &blocks));
            }
        }
        Ok(paths)
    }

    /// Renders the translatable fields of `source` into an exchange document.
    pub fn export(&self, source: &EntityFields, ctx: &SubmissionContext) -> Result<Export, EngineError> {
        let mut diagnostics = Diagnostics::new();
        let encoder = Encoder::new(&self.registry, &self.skip_attributes, ctx);
        let mut document = ExchangeDocument::new();

        for (path, value) in source.iter() {
            if self.skip_fields.is_match(&path) {
                log::debug!("Field '{}' is not translatable", path);
                continue;
            }
            if value.trim().is_empty() || is_numeric(value) {
                continue;
            }
            if has_blocks(value) {
                let blocks = self.parser.parse(value, &mut diagnostics)?;
                document.push_blocks(&path, encoder.encode_blocks(&blocks));
            } else {
                document.push_text(&path, value);
            }
        }

        log::info!(
            "Exported {} fields ({} -> {}): {}",
            document.fields.len(),
            ctx.source_locale,
            ctx.target_locale,
            diagnostics
        );
        Ok(Export {
            document,
            diagnostics,
        })
    }

    /// Parses a translated exchange XML document and merges it onto `target`.
    pub fn import(
        &self,
        xml: &str,
        source: &EntityFields,
        target: &EntityFields,
        ctx: &SubmissionContext,
    ) -> Result<ImportOutcome, EngineError> {
        let document = ExchangeDocument::from_xml_with_depth(xml, self.config.max_depth)?;
        self.import_document(&document, source, target, ctx)
    }

    pub fn import_document(
        &self,
        document: &ExchangeDocument,
        source: &EntityFields,
        target: &EntityFields,
        ctx: &SubmissionContext,
    ) -> Result<ImportOutcome, EngineError> {
        let mut diagnostics = Diagnostics::new();
        let locks = LockedPaths::parse(&ctx.locked_paths, &mut diagnostics);
        let decoder = Decoder::new(&self.registry, ctx).with_max_depth(self.config.max_depth);

        let mut translated = EntityFields::new();
        for field in &document.fields {
            let value = match &field.content {
                FieldContent::Text(text) => text.clone(),
                FieldContent::Blocks(nodes) => {
                    let blocks = decoder.decode_blocks(nodes, &mut diagnostics)?;
                    let field_locks = locks.block_locks(&field.name);
                    if field_locks.is_empty() {
                        serialize_blocks(&blocks)
                    } else {
                        let current = match target.get(&field.name) {
                            Some(raw) => self.parser.parse(raw, &mut diagnostics)?,
                            None => Vec::new(),
                        };
                        serialize_blocks(&apply_locks(&blocks, &current, field_locks, &mut diagnostics))
                    }
                }
            };
            if !translated.set(&field.name, value) {
                log::warn!("Ignoring exchange field '{}' with an unknown prefix", field.name);
            }
        }

        let locked_fields: Vec<&str> = locks.locked_fields().collect();
        let entity = apply_metadata_locks(
            &translated.entity,
            &target.entity,
            &self.translatable_source(&source.entity, ENTITY_PREFIX),
            &locked_fields,
            false,
        );

        let clean = ctx.clean_metadata || self.config.clean_metadata_on_download;
        let locked_meta: Vec<&str> = locks.meta_keys().collect();
        let meta = apply_metadata_locks(
            &translated.meta,
            &target.meta,
            &self.translatable_source(&source.meta, META_PREFIX),
            &locked_meta,
            clean,
        );

        log::info!(
            "Imported {} fields ({} -> {}), {} metadata keys removed: {}",
            document.fields.len(),
            ctx.source_locale,
            ctx.target_locale,
            meta.removed.len(),
            diagnostics
        );
        Ok(ImportOutcome {
            fields: EntityFields {
                entity: entity.merged,
                meta: meta.merged,
            },
            removed_meta: meta.removed,
            diagnostics,
        })
    }

    /// Source values usable as a fallback: everything the field filter does not exclude.
    fn translatable_source(&self, values: &MetadataMap, prefix: &str) -> MetadataMap {
        values
            .iter()
            .filter(|(key, _)| !self.skip_fields.is_match(&format!("{}/{}", prefix, key)))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
