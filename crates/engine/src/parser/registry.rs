//! Parser registry
//!
//! Maps parser tags to parser instances. Parsers are registered explicitly at
//! startup; there is no discovery.

use super::{DefaultParser, SheetParser};
use crate::Error;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry for sheet parsers
///
/// Lookup is an exact, case-sensitive match on [`SheetParser::tag`].
///
/// # Example
///
/// ```ignore
/// use sheetsync_engine::ParserRegistry;
///
/// let mut registry = ParserRegistry::with_builtins();
/// registry.register(Arc::new(MyParser));
///
/// let parser = registry.resolve("my-parser")?;
/// let document = parser.parse(tab_id, &table)?;
/// ```
#[derive(Default, Clone)]
pub struct ParserRegistry {
    parsers: BTreeMap<String, Arc<dyn SheetParser>>,
}

impl ParserRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: BTreeMap::new(),
        }
    }

    /// Create a registry holding the built-in parsers (`"default"`)
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DefaultParser::new()));
        registry
    }

    /// Register a parser
    ///
    /// The parser's `tag()` is used as the key. Registering a tag that is
    /// already present replaces the earlier parser, so the last registration
    /// for a tag wins.
    pub fn register(&mut self, parser: Arc<dyn SheetParser>) {
        let tag = parser.tag().to_string();
        if self.parsers.insert(tag.clone(), parser).is_some() {
            tracing::warn!(%tag, "Replacing previously registered parser");
        }
    }

    /// Get a parser by tag
    ///
    /// Returns `None` if no parser is registered for the given tag.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<Arc<dyn SheetParser>> {
        self.parsers.get(tag).cloned()
    }

    /// Resolve a parser by tag
    ///
    /// # Errors
    ///
    /// Returns `Error::ParserNotFound` if no parser is registered for the tag.
    pub fn resolve(&self, tag: &str) -> Result<Arc<dyn SheetParser>, Error> {
        self.get(tag).ok_or_else(|| Error::ParserNotFound {
            tag: tag.to_string(),
            available: self.tags(),
        })
    }

    /// Check if a parser is registered for the given tag
    #[must_use]
    pub fn has(&self, tag: &str) -> bool {
        self.parsers.contains_key(tag)
    }

    /// All registered tags, sorted
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.parsers.keys().cloned().collect()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
