//! Catalogue loading and validation.
//!
//! The catalogue is fetched once at startup from a [`CatalogueSource`],
//! normalized (keywords trimmed and lowercased), validated, and then shared
//! read-only by every session.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::CatalogueError;
use crate::types::{QuizQuestion, TopicEntry};

const BUILTIN_KNOWLEDGE: &str = include_str!("../data/knowledge.toml");

// =============================================================================
// Sources
// =============================================================================

/// Read-only record store the catalogue is fetched from.
pub trait CatalogueSource {
    fn list_topic_entries(&self) -> Result<Vec<TopicEntry>, CatalogueError>;
    fn list_quiz_questions(&self) -> Result<Vec<QuizQuestion>, CatalogueError>;
}

#[derive(Debug, Default, Deserialize)]
struct CatalogueDocument {
    #[serde(default)]
    topics: Vec<TopicEntry>,
    #[serde(default)]
    quiz: Vec<QuizQuestion>,
}

impl CatalogueDocument {
    fn parse(content: &str) -> Result<Self, CatalogueError> {
        Ok(toml::from_str(content)?)
    }
}

/// The knowledge base compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinCatalogue;

impl CatalogueSource for BuiltinCatalogue {
    fn list_topic_entries(&self) -> Result<Vec<TopicEntry>, CatalogueError> {
        Ok(CatalogueDocument::parse(BUILTIN_KNOWLEDGE)?.topics)
    }

    fn list_quiz_questions(&self) -> Result<Vec<QuizQuestion>, CatalogueError> {
        Ok(CatalogueDocument::parse(BUILTIN_KNOWLEDGE)?.quiz)
    }
}

/// A TOML file with `[[topics]]` and `[[quiz]]` tables.
#[derive(Debug, Clone)]
pub struct TomlCatalogueFile {
    path: PathBuf,
}

impl TomlCatalogueFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<CatalogueDocument, CatalogueError> {
        let content = std::fs::read_to_string(&self.path)?;
        CatalogueDocument::parse(&content)
    }
}

impl CatalogueSource for TomlCatalogueFile {
    fn list_topic_entries(&self) -> Result<Vec<TopicEntry>, CatalogueError> {
        Ok(self.read()?.topics)
    }

    fn list_quiz_questions(&self) -> Result<Vec<QuizQuestion>, CatalogueError> {
        Ok(self.read()?.quiz)
    }
}

/// In-memory lists, mostly for tests and embedding applications.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalogue {
    pub topics: Vec<TopicEntry>,
    pub quiz: Vec<QuizQuestion>,
}

impl CatalogueSource for StaticCatalogue {
    fn list_topic_entries(&self) -> Result<Vec<TopicEntry>, CatalogueError> {
        Ok(self.topics.clone())
    }

    fn list_quiz_questions(&self) -> Result<Vec<QuizQuestion>, CatalogueError> {
        Ok(self.quiz.clone())
    }
}

// =============================================================================
// Catalogue
// =============================================================================

/// Validated, read-only topic list and quiz bank.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    topics: Vec<TopicEntry>,
    quiz_bank: Vec<QuizQuestion>,
}

impl Catalogue {
    /// Normalize and validate the given records.
    pub fn new(
        topics: Vec<TopicEntry>,
        quiz_bank: Vec<QuizQuestion>,
    ) -> Result<Self, CatalogueError> {
        let topics = topics
            .into_iter()
            .map(normalize_topic)
            .collect::<Result<Vec<_>, _>>()?;
        let quiz_bank = quiz_bank
            .into_iter()
            .map(normalize_question)
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        for entry in &topics {
            if !seen.insert(entry.topic.as_str()) {
                return Err(CatalogueError::DuplicateTopic(entry.topic.clone()));
            }
        }
        let mut seen = HashSet::new();
        for q in &quiz_bank {
            if !seen.insert(q.id.as_str()) {
                return Err(CatalogueError::DuplicateQuestion(q.id.clone()));
            }
        }

        Ok(Self { topics, quiz_bank })
    }

    /// Topics in precedence order.
    pub fn topics(&self) -> &[TopicEntry] {
        &self.topics
    }

    pub fn quiz_bank(&self) -> &[QuizQuestion] {
        &self.quiz_bank
    }

    pub fn topic(&self, id: &str) -> Option<&TopicEntry> {
        self.topics.iter().find(|t| t.topic == id)
    }
}

/// Fetch, normalize and validate a catalogue from `source`.
pub fn load_catalogue(source: &dyn CatalogueSource) -> Result<Catalogue, CatalogueError> {
    let topics = source.list_topic_entries()?;
    let quiz = source.list_quiz_questions()?;
    let catalogue = Catalogue::new(topics, quiz)?;
    info!(
        topics = catalogue.topics.len(),
        quiz_questions = catalogue.quiz_bank.len(),
        "Catalogue loaded"
    );
    Ok(catalogue)
}

fn normalize_keywords(keywords: Vec<String>, owner: &str) -> Result<Vec<String>, CatalogueError> {
    keywords
        .into_iter()
        .map(|k| {
            let k = k.trim().to_lowercase();
            if k.is_empty() {
                Err(CatalogueError::BlankKeyword(owner.to_string()))
            } else {
                Ok(k)
            }
        })
        .collect()
}

fn normalize_topic(mut entry: TopicEntry) -> Result<TopicEntry, CatalogueError> {
    if entry.keywords.is_empty() {
        return Err(CatalogueError::EmptyKeywords(entry.topic));
    }
    if entry.responses.is_empty() {
        return Err(CatalogueError::EmptyResponses(entry.topic));
    }
    entry.keywords = normalize_keywords(entry.keywords, &entry.topic)?;

    if let Some(mut fu) = entry.follow_up.take() {
        if fu.trigger_keywords.is_empty() {
            return Err(CatalogueError::EmptyTriggerKeywords(entry.topic));
        }
        fu.trigger_keywords = normalize_keywords(fu.trigger_keywords, &entry.topic)?;
        entry.follow_up = Some(fu);
    }
    Ok(entry)
}

fn normalize_question(mut q: QuizQuestion) -> Result<QuizQuestion, CatalogueError> {
    if q.prompt.trim().is_empty() {
        return Err(CatalogueError::BlankPrompt(q.id));
    }
    if q.answer_keywords.is_empty() {
        return Err(CatalogueError::EmptyAnswerKeywords(q.id));
    }
    q.answer_keywords = normalize_keywords(q.answer_keywords, &q.id)?;
    Ok(q)
}

// =============================================================================
// Tests
// =============================================================================
