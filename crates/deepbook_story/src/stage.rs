//! The five generation stages.
//!
//! Every stage implements [`StoryStage`]: it reads the book built so far
//! from a [`StageContext`], makes its model calls and returns validated
//! output. Stages never modify the book themselves; the pipeline decides
//! what to attach.

use crate::schema::{conform_cast, conform_chapter, conform_metadata, conform_outline};
use crate::{
    Book, BookMetadata, BookOutline, CHAPTER_TEXT, CHARACTERS, Chapter, ChapterOutline, Character,
    ILLUSTRATION, Illustration, METADATA, OUTLINE, PromptContext, chapter_text_schema,
    characters_schema, metadata_schema, outline_schema,
};
use async_trait::async_trait;
use deepbook_core::{
    DuplicateCharacterPolicy, GenerateRequest, ImageRequest, OutlineLengthPolicy, StoryConfig,
};
use deepbook_error::{
    BuilderError, DeepbookResult, JsonError, ProviderError, ProviderErrorKind,
    SchemaValidationError, SchemaViolation, StoryError, StoryErrorKind,
};
use deepbook_interface::{ImageGeneration, StructuredGeneration};
use futures_util::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// A step of the generation pipeline, in execution order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Title page
    Metadata,
    /// Cast
    Characters,
    /// Character portraits (fan-out)
    Illustrations,
    /// Plot and chapter plan
    Outline,
    /// Chapter text (fan-out)
    ChapterText,
}

impl Stage {
    /// Whether items of this stage fail independently.
    pub fn is_fan_out(self) -> bool {
        matches!(self, Stage::Illustrations | Stage::ChapterText)
    }
}

/// Everything a stage may read.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    book: &'a Book,
    config: &'a StoryConfig,
}

impl<'a> StageContext<'a> {
    /// Context over a partially built book.
    pub fn new(book: &'a Book, config: &'a StoryConfig) -> Self {
        Self { book, config }
    }

    /// The book so far.
    pub fn book(&self) -> &'a Book {
        self.book
    }

    /// Story settings.
    pub fn config(&self) -> &'a StoryConfig {
        self.config
    }

    /// The user's original request.
    pub fn prompt(&self) -> &'a str {
        self.book.prompt()
    }

    fn metadata(&self, stage: Stage) -> DeepbookResult<&'a BookMetadata> {
        self.book
            .metadata()
            .as_ref()
            .ok_or_else(|| missing_prerequisite(stage, Stage::Metadata))
    }

    fn characters(&self, stage: Stage) -> DeepbookResult<&'a [Character]> {
        let characters = self.book.characters();
        if characters.is_empty() {
            return Err(missing_prerequisite(stage, Stage::Characters));
        }
        Ok(characters.as_slice())
    }

    fn outline(&self, stage: Stage) -> DeepbookResult<&'a BookOutline> {
        self.book
            .outline()
            .as_ref()
            .ok_or_else(|| missing_prerequisite(stage, Stage::Outline))
    }

    /// Keys shared by every prompt: the story JSON and, once known, the
    /// title, location, themes and cast.
    fn prompt_context(&self) -> PromptContext {
        let mut context = PromptContext::new().with("story", self.book.story_context());
        if let Some(metadata) = self.book.metadata() {
            context.insert("title", metadata.title().clone());
            context.insert("location", metadata.location().clone());
            context.insert("themes", metadata.themes().join(", "));
        }
        context.insert("cast", self.book.character_names().join(", "));
        context
    }
}

fn missing_prerequisite(stage: Stage, requires: Stage) -> deepbook_error::DeepbookError {
    StoryError::new(StoryErrorKind::MissingPrerequisite {
        stage: stage.to_string(),
        requires: requires.to_string(),
    })
    .into()
}

/// One step of story generation.
#[async_trait]
pub trait StoryStage: Send + Sync {
    /// What the stage produces. Fan-out stages return one result per item.
    type Output: Send;

    /// Which stage this is.
    fn stage(&self) -> Stage;

    /// Run the stage against the book built so far.
    ///
    /// # Errors
    ///
    /// Returns an error if a prerequisite stage has not completed, a prompt
    /// cannot be rendered, or (for all-or-nothing stages) the model call or
    /// validation fails.
    async fn execute(&self, context: &StageContext<'_>) -> DeepbookResult<Self::Output>;
}

/// Produces [`BookMetadata`] from the user prompt.
#[derive(Debug, Clone, Copy)]
pub struct MetadataStage<'a, L> {
    llm: &'a L,
}

impl<'a, L: StructuredGeneration> MetadataStage<'a, L> {
    /// Stage backed by a language model.
    pub fn new(llm: &'a L) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl<L: StructuredGeneration> StoryStage for MetadataStage<'_, L> {
    type Output = BookMetadata;

    fn stage(&self) -> Stage {
        Stage::Metadata
    }

    #[instrument(skip_all, fields(stage = %self.stage()))]
    async fn execute(&self, context: &StageContext<'_>) -> DeepbookResult<BookMetadata> {
        let prompt = METADATA.render(&context.prompt_context())?;
        let raw = self
            .llm
            .generate_structured(&prompt, &metadata_schema())
            .await?;
        let metadata = conform_metadata(&raw)?;
        info!(title = %metadata.title(), "Metadata generated");
        Ok(metadata)
    }
}

/// Produces the cast, applying the duplicate name policy.
#[derive(Debug, Clone, Copy)]
pub struct CharactersStage<'a, L> {
    llm: &'a L,
}

impl<'a, L: StructuredGeneration> CharactersStage<'a, L> {
    /// Stage backed by a language model.
    pub fn new(llm: &'a L) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl<L: StructuredGeneration> StoryStage for CharactersStage<'_, L> {
    type Output = Vec<Character>;

    fn stage(&self) -> Stage {
        Stage::Characters
    }

    #[instrument(skip_all, fields(stage = %self.stage()))]
    async fn execute(&self, context: &StageContext<'_>) -> DeepbookResult<Vec<Character>> {
        context.metadata(self.stage())?;
        let prompt = CHARACTERS.render(&context.prompt_context())?;
        let raw = self
            .llm
            .generate_structured(&prompt, &characters_schema())
            .await?;
        let cast = conform_cast(&raw)?;
        let characters =
            apply_duplicate_policy(cast.characters, context.config().duplicate_characters)?;
        info!(count = characters.len(), "Characters generated");
        Ok(characters)
    }
}

/// Enforce unique names (trimmed, case-insensitive).
fn apply_duplicate_policy(
    characters: Vec<Character>,
    policy: DuplicateCharacterPolicy,
) -> DeepbookResult<Vec<Character>> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(characters.len());

    for (position, character) in characters.into_iter().enumerate() {
        if seen.insert(character.name_key()) {
            kept.push(character);
            continue;
        }
        match policy {
            DuplicateCharacterPolicy::Reject => {
                return Err(SchemaValidationError::new(
                    format!("characters[{position}].name"),
                    SchemaViolation::Duplicate {
                        value: character.name().clone(),
                    },
                )
                .into());
            }
            DuplicateCharacterPolicy::Dedupe => {
                warn!(character = %character.name(), position, "Dropping duplicate character");
            }
        }
    }

    Ok(kept)
}

/// Draws one portrait per character.
///
/// The language model first writes a visual description from the story
/// state; the image model then renders it in the configured style.
#[derive(Debug, Clone, Copy)]
pub struct IllustrationsStage<'a, L, I> {
    llm: &'a L,
    images: &'a I,
}

impl<'a, L: StructuredGeneration, I: ImageGeneration> IllustrationsStage<'a, L, I> {
    /// Stage backed by a language model and an image model.
    pub fn new(llm: &'a L, images: &'a I) -> Self {
        Self { llm, images }
    }

    #[instrument(skip(self, context, character, style), fields(character = %character.name()))]
    async fn illustrate(
        &self,
        context: &StageContext<'_>,
        position: usize,
        character: &Character,
        style: &str,
    ) -> DeepbookResult<Illustration> {
        let character_json = serde_json::to_string_pretty(&character.without_illustration())
            .map_err(|e| JsonError::new(format!("Failed to serialize character: {}", e)))?;
        let prompt = ILLUSTRATION.render(
            &context
                .prompt_context()
                .with("position", (position + 1).to_string())
                .with("character", character_json),
        )?;

        let response = self.llm.generate(&GenerateRequest::from_prompt(prompt)).await?;
        let description = response.text()?.trim().to_string();
        if description.is_empty() {
            return Err(ProviderError::new(ProviderErrorKind::EmptyResponse).into());
        }
        debug!(description_length = description.len(), "Visual description written");

        let request = ImageRequest::builder()
            .prompt(format!(
                "A children's book illustration in {} style. {}",
                style, description
            ))
            .build()
            .map_err(|e| BuilderError::from_builder("ImageRequest", e))?;
        let image = self.images.generate_image(&request).await?.into_image();

        Ok(Illustration::new(description, image))
    }
}

#[async_trait]
impl<L: StructuredGeneration, I: ImageGeneration> StoryStage for IllustrationsStage<'_, L, I> {
    /// One result per character, in cast order.
    type Output = Vec<DeepbookResult<Illustration>>;

    fn stage(&self) -> Stage {
        Stage::Illustrations
    }

    #[instrument(skip_all, fields(stage = %self.stage()))]
    async fn execute(
        &self,
        context: &StageContext<'_>,
    ) -> DeepbookResult<Vec<DeepbookResult<Illustration>>> {
        let characters: Vec<(usize, Character)> = context
            .characters(self.stage())?
            .iter()
            .cloned()
            .enumerate()
            .collect();
        let style = context.config().style_text();
        let style = style.as_str();

        let mut results: Vec<(usize, DeepbookResult<Illustration>)> = stream::iter(characters)
            .map(move |(position, character)| async move {
                let result = self.illustrate(context, position, &character, style).await;
                (position, result)
            })
            .buffer_unordered(context.config().concurrency())
            .collect()
            .await;

        results.sort_by_key(|(position, _)| *position);
        Ok(results.into_iter().map(|(_, result)| result).collect())
    }
}

/// Produces the [`BookOutline`], applying the outline length policy.
#[derive(Debug, Clone, Copy)]
pub struct OutlineStage<'a, L> {
    llm: &'a L,
}

impl<'a, L: StructuredGeneration> OutlineStage<'a, L> {
    /// Stage backed by a language model.
    pub fn new(llm: &'a L) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl<L: StructuredGeneration> StoryStage for OutlineStage<'_, L> {
    type Output = BookOutline;

    fn stage(&self) -> Stage {
        Stage::Outline
    }

    #[instrument(skip_all, fields(stage = %self.stage()))]
    async fn execute(&self, context: &StageContext<'_>) -> DeepbookResult<BookOutline> {
        context.metadata(self.stage())?;
        context.characters(self.stage())?;

        let config = context.config();
        let requested = match config.outline_length {
            OutlineLengthPolicy::Accept => None,
            _ => config.chapter_count.filter(|n| *n > 0),
        };

        let mut prompt_context = context.prompt_context();
        if let Some(n) = requested {
            prompt_context.insert("chapter_count", n.to_string());
        }
        let prompt = OUTLINE.render(&prompt_context)?;

        let raw = self
            .llm
            .generate_structured(&prompt, &outline_schema())
            .await?;
        let mut outline = conform_outline(&raw)?;

        if let Some(expected) = requested {
            apply_length_policy(&mut outline, expected, config.outline_length)?;
        }
        check_sequential(outline.chapters())?;

        info!(chapters = outline.chapters().len(), "Outline generated");
        Ok(outline)
    }
}

fn apply_length_policy(
    outline: &mut BookOutline,
    expected: usize,
    policy: OutlineLengthPolicy,
) -> DeepbookResult<()> {
    let found = outline.chapters().len();
    if found == expected {
        return Ok(());
    }
    match policy {
        OutlineLengthPolicy::Strict => Err(SchemaValidationError::new(
            "chapters",
            SchemaViolation::CountMismatch { expected, found },
        )
        .into()),
        OutlineLengthPolicy::Truncate if found > expected => {
            warn!(expected, found, "Truncating outline to requested chapter count");
            outline.truncate(expected);
            Ok(())
        }
        OutlineLengthPolicy::Truncate | OutlineLengthPolicy::Accept => {
            debug!(expected, found, "Accepting outline with a different chapter count");
            Ok(())
        }
    }
}

/// Outline indices must run `1..=n` in order.
fn check_sequential(chapters: &[ChapterOutline]) -> DeepbookResult<()> {
    for (position, entry) in chapters.iter().enumerate() {
        let expected = position as i64 + 1;
        let found = i64::from(*entry.index());
        if found != expected {
            return Err(SchemaValidationError::new(
                format!("chapters[{position}].chapter"),
                SchemaViolation::NotSequential { expected, found },
            )
            .into());
        }
    }
    Ok(())
}

/// Writes the text of every outlined chapter.
#[derive(Debug, Clone, Copy)]
pub struct ChapterTextStage<'a, L> {
    llm: &'a L,
}

impl<'a, L: StructuredGeneration> ChapterTextStage<'a, L> {
    /// Stage backed by a language model.
    pub fn new(llm: &'a L) -> Self {
        Self { llm }
    }

    #[instrument(skip(self, context, entry), fields(chapter = entry.index()))]
    async fn write(
        &self,
        context: &StageContext<'_>,
        entry: &ChapterOutline,
    ) -> DeepbookResult<Chapter> {
        let index = *entry.index();
        let prompt = CHAPTER_TEXT.render(
            &context
                .prompt_context()
                .with("chapter", index.to_string())
                .with("chapter_title", entry.title().clone())
                .with("chapter_synopsis", entry.summary().clone()),
        )?;

        let raw = self
            .llm
            .generate_structured(&prompt, &chapter_text_schema())
            .await?;
        let draft = conform_chapter(&raw)?;

        if let Some(found) = draft.chapter
            && found != i64::from(index)
        {
            return Err(SchemaValidationError::new(
                "chapter",
                SchemaViolation::IndexMismatch {
                    expected: i64::from(index),
                    found,
                },
            )
            .into());
        }

        debug!(text_length = draft.text.len(), "Chapter written");
        Ok(Chapter::new(index, draft.text))
    }
}

#[async_trait]
impl<L: StructuredGeneration> StoryStage for ChapterTextStage<'_, L> {
    /// One result per outline entry, ordered by chapter index.
    type Output = Vec<(u32, DeepbookResult<Chapter>)>;

    fn stage(&self) -> Stage {
        Stage::ChapterText
    }

    #[instrument(skip_all, fields(stage = %self.stage()))]
    async fn execute(
        &self,
        context: &StageContext<'_>,
    ) -> DeepbookResult<Vec<(u32, DeepbookResult<Chapter>)>> {
        context.characters(self.stage())?;
        let entries: Vec<ChapterOutline> = context.outline(self.stage())?.chapters().clone();

        let mut results: Vec<(u32, DeepbookResult<Chapter>)> = stream::iter(entries)
            .map(move |entry| async move {
                let result = self.write(context, &entry).await;
                (*entry.index(), result)
            })
            .buffer_unordered(context.config().concurrency())
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(name: &str) -> Character {
        Character::builder()
            .name(name)
            .personality("Friendly.")
            .description("Small.")
            .build()
            .unwrap()
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let cast = vec![character("Tilly"), character("Otto"), character(" tilly ")];
        let kept = apply_duplicate_policy(cast, DuplicateCharacterPolicy::Dedupe).unwrap();
        assert_eq!(
            kept.iter().map(|c| c.name().as_str()).collect::<Vec<_>>(),
            vec!["Tilly", "Otto"]
        );
    }

    #[test]
    fn test_reject_reports_duplicate_path() {
        let cast = vec![character("Tilly"), character("Otto"), character("TILLY")];
        let err = apply_duplicate_policy(cast, DuplicateCharacterPolicy::Reject).unwrap_err();
        let schema_err = err.as_schema().unwrap();
        assert_eq!(schema_err.path, "characters[2].name");
        assert_eq!(
            schema_err.violation,
            SchemaViolation::Duplicate {
                value: "TILLY".to_string()
            }
        );
    }

    fn outline(indices: &[u32]) -> BookOutline {
        BookOutline::new(
            "A turtle helps.",
            "A flood.",
            "A raft.",
            indices
                .iter()
                .map(|i| ChapterOutline::new(*i, format!("Chapter {i}"), "Things happen."))
                .collect(),
        )
    }

    #[test]
    fn test_truncate_policy() {
        let mut long = outline(&[1, 2, 3, 4]);
        apply_length_policy(&mut long, 2, OutlineLengthPolicy::Truncate).unwrap();
        assert_eq!(long.chapters().len(), 2);

        let mut short = outline(&[1]);
        apply_length_policy(&mut short, 3, OutlineLengthPolicy::Truncate).unwrap();
        assert_eq!(short.chapters().len(), 1);
    }

    #[test]
    fn test_strict_policy() {
        let mut long = outline(&[1, 2, 3]);
        let err = apply_length_policy(&mut long, 2, OutlineLengthPolicy::Strict).unwrap_err();
        assert_eq!(
            err.as_schema().unwrap().violation,
            SchemaViolation::CountMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_sequential_indices() {
        assert!(check_sequential(outline(&[1, 2, 3]).chapters()).is_ok());

        let err = check_sequential(outline(&[1, 3]).chapters()).unwrap_err();
        let schema_err = err.as_schema().unwrap();
        assert_eq!(schema_err.path, "chapters[1].chapter");
        assert_eq!(
            schema_err.violation,
            SchemaViolation::NotSequential {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_stage_order_and_kind() {
        assert!(Stage::Metadata < Stage::ChapterText);
        assert!(Stage::Illustrations.is_fan_out());
        assert!(!Stage::Outline.is_fan_out());
        assert_eq!(Stage::ChapterText.to_string(), "chapter_text");
    }

    #[test]
    fn test_prerequisites_checked() {
        let book = Book::new("A turtle");
        let config = StoryConfig::default();
        let context = StageContext::new(&book, &config);
        let err = context.outline(Stage::ChapterText).unwrap_err();
        assert!(format!("{}", err).contains("requires 'outline'"));
    }
}
