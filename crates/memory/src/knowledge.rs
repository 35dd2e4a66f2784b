//! Keyword knowledge store: a small, file-backed retriever.
//!
//! Documents are loaded from a TOML file:
//!
//! ```toml
//! [[documents]]
//! title = "Super Julio World"
//! content = "Super Julio World is a platformer inscribed on Bitcoin."
//! ```
//!
//! Retrieval scores each document by how often the words of the latest user
//! memory occur in it, and appends the best matches to the step as a single
//! recollection. No match leaves the step unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use soulturn_core::error::RetrievalError;
use soulturn_core::message::{Message, Role};
use soulturn_core::retrieval::Retriever;
use soulturn_core::step::ConversationStep;
use std::path::Path;
use tracing::debug;

/// Words shorter than this are ignored when scoring.
const MIN_KEYWORD_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub title: String,
    pub content: String,
}

impl KnowledgeDocument {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    documents: Vec<KnowledgeDocument>,
}

/// An in-memory document set searched by keyword overlap.
pub struct KnowledgeStore {
    documents: Vec<KnowledgeDocument>,
    limit: usize,
}

impl KnowledgeStore {
    pub fn new(documents: Vec<KnowledgeDocument>, limit: usize) -> Self {
        Self {
            documents,
            limit: limit.max(1),
        }
    }

    /// Load documents from a TOML file with a `[[documents]]` array.
    pub fn from_file(path: &Path, limit: usize) -> Result<Self, RetrievalError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::Unavailable(format!("{}: {e}", path.display()))
        })?;
        let file: KnowledgeFile = toml::from_str(&content).map_err(|e| {
            RetrievalError::Unavailable(format!("{}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), count = file.documents.len(), "Knowledge loaded");
        Ok(Self::new(file.documents, limit))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Best-matching documents for `query`, highest score first.
    pub fn search(&self, query: &str) -> Vec<&KnowledgeDocument> {
        let keywords = keywords(query);
        if keywords.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(f32, &KnowledgeDocument)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let haystack = format!("{} {}", doc.title, doc.content).to_lowercase();
                let occurrences: usize = keywords
                    .iter()
                    .map(|k| haystack.matches(k.as_str()).count())
                    .sum();
                if occurrences == 0 {
                    return None;
                }
                // Long documents shouldn't win just by being long
                let score = occurrences as f32 / (haystack.len() as f32 / 100.0).max(1.0);
                Some((score, doc))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.limit);
        scored.into_iter().map(|(_, doc)| doc).collect()
    }
}

fn keywords(text: &str) -> Vec<String> {
    let mut words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN)
        .map(str::to_lowercase)
        .collect();
    words.sort();
    words.dedup();
    words
}

#[async_trait]
impl Retriever for KnowledgeStore {
    fn name(&self) -> &str {
        "knowledge"
    }

    async fn augment(&self, step: &ConversationStep) -> Result<ConversationStep, RetrievalError> {
        let Some(question) = step.iter_rev().find(|m| m.role == Role::User) else {
            return Ok(step.clone());
        };

        let hits = self.search(&question.content);
        if hits.is_empty() {
            debug!("No knowledge matched");
            return Ok(step.clone());
        }

        let facts = hits
            .iter()
            .map(|doc| format!("- {}: {}", doc.title, doc.content))
            .collect::<Vec<_>>()
            .join("\n");
        debug!(hits = hits.len(), "Knowledge appended");

        Ok(step.with_memory(Message::assistant(format!(
            "{} remembers:\n{facts}",
            step.soul_name()
        ))))
    }
}
