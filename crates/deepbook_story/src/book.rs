//! The book data model.
//!
//! Field names serialize the way the model is asked to produce them
//! (`chapter`, `synopsis`), so the same JSON is used for schema validation,
//! prompt context and export.

use deepbook_core::MediaSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Title page information, produced once by the metadata stage.
///
/// # Examples
///
/// ```
/// use deepbook_story::BookMetadata;
///
/// let metadata = BookMetadata::builder()
///     .title("Tilly Takes the Long Way")
///     .author("Professor Puddlejump")
///     .themes(vec!["kindness".to_string()])
///     .build()
///     .unwrap();
/// assert!(metadata.year().is_none());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct BookMetadata {
    /// Book title
    title: String,
    /// Author name
    author: String,
    /// Publication year, past or future
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<i64>,
    /// Theme tags, in the order given
    #[builder(default)]
    #[serde(default)]
    themes: Vec<String>,
    /// Where most of the story happens
    #[builder(default)]
    #[serde(default)]
    location: String,
}

impl BookMetadata {
    /// Creates a new builder for `BookMetadata`.
    pub fn builder() -> BookMetadataBuilder {
        BookMetadataBuilder::default()
    }
}

/// A character portrait and the text it was drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Illustration {
    /// Visual description written by the language model
    description: String,
    /// The generated picture
    image: MediaSource,
}

impl Illustration {
    /// Pair a description with its picture.
    pub fn new(description: impl Into<String>, image: MediaSource) -> Self {
        Self {
            description: description.into(),
            image,
        }
    }
}

/// A member of the cast.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct Character {
    /// Name, unique within a book
    name: String,
    /// One sentence biography
    personality: String,
    /// Physical description
    description: String,
    /// Portrait, attached by the illustrations stage
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    illustration: Option<Illustration>,
}

impl Character {
    /// Creates a new builder for `Character`.
    pub fn builder() -> CharacterBuilder {
        CharacterBuilder::default()
    }

    /// Attach a generated portrait.
    pub fn attach_illustration(&mut self, illustration: Illustration) {
        self.illustration = Some(illustration);
    }

    /// Name key used for uniqueness checks.
    pub(crate) fn name_key(&self) -> String {
        self.name.trim().to_lowercase()
    }

    /// The character without its portrait, as given to the model.
    pub(crate) fn without_illustration(&self) -> Self {
        Self {
            illustration: None,
            ..self.clone()
        }
    }
}

/// One entry in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ChapterOutline {
    /// Chapter number, starting at 1
    #[serde(rename = "chapter")]
    index: u32,
    /// Chapter title
    title: String,
    /// One or two sentence summary
    #[serde(rename = "synopsis")]
    summary: String,
}

impl ChapterOutline {
    /// Create an outline entry.
    pub fn new(index: u32, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            summary: summary.into(),
        }
    }
}

/// The plot of the book and its chapter plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct BookOutline {
    /// One or two sentence summary of the book
    synopsis: String,
    /// The obstacle that must be overcome
    conflict: String,
    /// Who overcomes it, how and when
    resolution: String,
    /// Chapter plan, indices `1..=n` in order
    chapters: Vec<ChapterOutline>,
}

impl BookOutline {
    /// Create an outline.
    pub fn new(
        synopsis: impl Into<String>,
        conflict: impl Into<String>,
        resolution: impl Into<String>,
        chapters: Vec<ChapterOutline>,
    ) -> Self {
        Self {
            synopsis: synopsis.into(),
            conflict: conflict.into(),
            resolution: resolution.into(),
            chapters,
        }
    }

    /// Outline entry for a chapter number.
    pub fn chapter(&self, index: u32) -> Option<&ChapterOutline> {
        self.chapters.iter().find(|c| c.index == index)
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.chapters.truncate(len);
    }
}

/// The full text of one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Chapter {
    /// Matches a [`ChapterOutline`] index
    #[serde(rename = "chapter")]
    index: u32,
    /// Text read aloud to children
    text: String,
}

impl Chapter {
    /// Create a chapter.
    pub fn new(index: u32, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// A fan-out item that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum IncompleteItem {
    /// A character portrait
    #[strum(to_string = "illustration for {character}")]
    Illustration {
        /// Character name
        character: String,
    },
    /// A chapter's text
    #[strum(to_string = "chapter {index}")]
    Chapter {
        /// Chapter number
        index: u32,
    },
}

/// Not a failure: one illustration or chapter is missing from an otherwise
/// usable book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PartialCompletionWarning {
    /// What is missing
    item: IncompleteItem,
    /// Why it is missing
    reason: String,
}

impl PartialCompletionWarning {
    /// Record a missing item.
    pub fn new(item: IncompleteItem, reason: impl Into<String>) -> Self {
        Self {
            item,
            reason: reason.into(),
        }
    }
}

/// The aggregate root, built up stage by stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct Book {
    /// The request the story was generated from
    prompt: String,
    /// Title page, once the metadata stage succeeds
    metadata: Option<BookMetadata>,
    /// Cast in display order
    characters: Vec<Character>,
    /// Plot and chapter plan, once the outline stage succeeds
    outline: Option<BookOutline>,
    /// Generated chapters, ordered by index
    chapters: Vec<Chapter>,
    /// Items that did not complete
    #[getter(skip)]
    warnings: Vec<PartialCompletionWarning>,
}

/// The parts of a book shown to the model as story context.
#[derive(Serialize)]
struct StoryContext<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a BookMetadata>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    characters: Vec<Character>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outline: Option<&'a BookOutline>,
}

impl Book {
    /// An empty book for a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Whether every outline entry has a chapter.
    ///
    /// # Examples
    ///
    /// ```
    /// use deepbook_story::Book;
    ///
    /// let book = Book::new("A turtle who helps his forest friends");
    /// assert!(!book.is_complete());
    /// ```
    pub fn is_complete(&self) -> bool {
        self.outline
            .as_ref()
            .is_some_and(|o| !o.chapters.is_empty())
            && self.missing_chapters().is_empty()
    }

    /// Outline indices with no generated chapter.
    pub fn missing_chapters(&self) -> Vec<u32> {
        let written: BTreeSet<u32> = self.chapters.iter().map(|c| c.index).collect();
        self.outline
            .iter()
            .flat_map(|o| o.chapters.iter())
            .map(|c| c.index)
            .filter(|index| !written.contains(index))
            .collect()
    }

    /// Fan-out items that did not complete.
    pub fn warnings(&self) -> &[PartialCompletionWarning] {
        &self.warnings
    }

    /// Character names in display order.
    pub fn character_names(&self) -> Vec<&str> {
        self.characters.iter().map(|c| c.name.as_str()).collect()
    }

    /// Chapter text for an index.
    pub fn chapter(&self, index: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.index == index)
    }

    pub(crate) fn set_metadata(&mut self, metadata: BookMetadata) {
        self.metadata = Some(metadata);
    }

    pub(crate) fn set_characters(&mut self, characters: Vec<Character>) {
        self.characters = characters;
    }

    pub(crate) fn characters_mut(&mut self) -> &mut [Character] {
        &mut self.characters
    }

    pub(crate) fn set_outline(&mut self, outline: BookOutline) {
        self.outline = Some(outline);
    }

    pub(crate) fn push_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
        self.chapters.sort_by_key(|c| c.index);
    }

    pub(crate) fn warn(&mut self, warning: PartialCompletionWarning) {
        self.warnings.push(warning);
    }

    /// Pretty JSON of the story so far, without portraits or chapter text.
    pub(crate) fn story_context(&self) -> String {
        let context = StoryContext {
            prompt: &self.prompt,
            metadata: self.metadata.as_ref(),
            characters: self
                .characters
                .iter()
                .map(Character::without_illustration)
                .collect(),
            outline: self.outline.as_ref(),
        };
        serde_json::to_string_pretty(&context).unwrap_or_else(|_| self.prompt.clone())
    }
}
