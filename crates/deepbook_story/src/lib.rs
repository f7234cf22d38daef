//! Staged storybook generation for DeepBook.
//!
//! A story is produced by five stages run strictly in order, each feeding its
//! validated output forward as context for the next:
//!
//! 1. **Metadata** - title, author, year, themes, location
//! 2. **Characters** - the cast, with personalities and physical descriptions
//! 3. **Illustrations** - one picture per character (fan-out)
//! 4. **Outline** - synopsis, conflict, resolution and chapter outlines
//! 5. **Chapter text** - one call per outline entry (fan-out)
//!
//! Metadata, characters and outline are all-or-nothing: if one fails the run
//! stops in [`PipelineState::Failed`] and keeps whatever was already built.
//! Illustrations and chapters fail per item: the run still reaches
//! [`PipelineState::Done`] and the [`Book`] records a
//! [`PartialCompletionWarning`] for each missing item.
//!
//! # Example
//!
//! ```rust,ignore
//! use deepbook_core::DeepbookConfig;
//! use deepbook_models::OpenAIClient;
//! use deepbook_story::StoryPipeline;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeepbookConfig::load()?;
//! let client = OpenAIClient::from_config(&config.provider)?;
//! let pipeline = StoryPipeline::new(client.clone(), client, config.story);
//!
//! let run = pipeline.run("A turtle who helps his forest friends").await;
//! println!("{}", run.book().to_markdown());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod book;
mod export;
mod extraction;
mod pipeline;
mod prompts;
mod schema;
mod stage;
mod structured;

pub use book::{
    Book, BookMetadata, BookMetadataBuilder, BookOutline, Chapter, ChapterOutline, Character,
    CharacterBuilder, IncompleteItem, Illustration, PartialCompletionWarning,
};
pub use extraction::{extract_json, parse_json};
pub use pipeline::{PipelineState, StoryPipeline, StoryRun, StorySnapshot};
pub use prompts::{
    CHAPTER_TEXT, CHARACTERS, ILLUSTRATION, METADATA, OUTLINE, PromptContext, PromptTemplate,
};
pub use schema::{chapter_text_schema, characters_schema, metadata_schema, outline_schema};
pub use stage::{
    CharactersStage, ChapterTextStage, IllustrationsStage, MetadataStage, OutlineStage, Stage,
    StageContext, StoryStage,
};
pub use structured::PromptedJson;
