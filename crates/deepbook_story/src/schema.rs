//! Schemas for each stage's structured output.

use crate::{BookMetadata, BookOutline, Character};
use deepbook_core::{FieldSpec, SchemaDescriptor};
use deepbook_error::{DeepbookResult, JsonError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Shape of the metadata stage output.
pub fn metadata_schema() -> SchemaDescriptor {
    SchemaDescriptor::new("book_metadata")
        .field(
            FieldSpec::text("title")
                .non_empty()
                .describe("the title of the children's book"),
        )
        .field(FieldSpec::text("author").describe("the whimsical and fantastical name for the author"))
        .field(
            FieldSpec::integer("year")
                .optional()
                .describe("the year the book was published in the past or future!"),
        )
        .field(
            FieldSpec::text_list("themes")
                .non_empty()
                .describe("themes touched upon by the book"),
        )
        .field(
            FieldSpec::text("location")
                .optional()
                .describe("the place where the majority of the story takes place"),
        )
}

fn character_schema() -> SchemaDescriptor {
    SchemaDescriptor::new("character")
        .field(FieldSpec::text("name").non_empty().describe("name of the character"))
        .field(FieldSpec::text("description").describe("physical description of the character"))
        .field(FieldSpec::text("personality").describe("a one sentence biography of the character"))
}

/// Shape of the characters stage output.
pub fn characters_schema() -> SchemaDescriptor {
    SchemaDescriptor::new("book_characters").field(
        FieldSpec::list("characters", character_schema())
            .min_items(1)
            .describe("the cast of the story"),
    )
}

fn chapter_outline_schema() -> SchemaDescriptor {
    SchemaDescriptor::new("chapter_outline")
        .field(FieldSpec::integer("chapter").positive().describe("the number of the chapter"))
        .field(FieldSpec::text("title").non_empty().describe("the title of the chapter"))
        .field(
            FieldSpec::text("synopsis")
                .non_empty()
                .describe("1-2 sentence summary of the chapter"),
        )
}

/// Shape of the outline stage output.
pub fn outline_schema() -> SchemaDescriptor {
    SchemaDescriptor::new("book_outline")
        .field(
            FieldSpec::text("synopsis")
                .non_empty()
                .describe("1-2 sentence summary of the book"),
        )
        .field(
            FieldSpec::text("conflict")
                .non_empty()
                .describe("the specific conflict that must be resolved or obstacle that must be overcome"),
        )
        .field(
            FieldSpec::text("resolution")
                .non_empty()
                .describe("the specific way the conflict is resolved (who, how and when)"),
        )
        .field(
            FieldSpec::list("chapters", chapter_outline_schema())
                .min_items(1)
                .describe("outlines for the individual chapters, numbered from 1"),
        )
}

/// Shape of one chapter text response.
pub fn chapter_text_schema() -> SchemaDescriptor {
    SchemaDescriptor::new("chapter_text")
        .field(
            FieldSpec::integer("chapter")
                .positive()
                .optional()
                .describe("the number of the chapter"),
        )
        .field(FieldSpec::text("text").non_empty().describe(
            "the text for the chapter, read to children; it should read like a children's book \
             and follow the synopsis in the outline",
        ))
}

/// Characters stage payload.
#[derive(Debug, Deserialize)]
pub(crate) struct CastDraft {
    pub(crate) characters: Vec<Character>,
}

/// Chapter text payload; the model may omit the chapter number.
#[derive(Debug, Deserialize)]
pub(crate) struct ChapterDraft {
    #[serde(default)]
    pub(crate) chapter: Option<i64>,
    pub(crate) text: String,
}

/// Validate `raw` against `schema`, then deserialize the normalized value.
///
/// # Errors
///
/// Returns a schema validation error naming the offending field, or a JSON
/// error if the normalized value does not fit `T`.
pub(crate) fn conform<T: DeserializeOwned>(
    schema: &SchemaDescriptor,
    raw: &Value,
) -> DeepbookResult<T> {
    let normalized = schema.validate(raw)?;
    serde_json::from_value(normalized).map_err(|e| {
        JsonError::new(format!(
            "Validated '{}' output did not deserialize: {}",
            schema.name(),
            e
        ))
        .into()
    })
}

pub(crate) fn conform_metadata(raw: &Value) -> DeepbookResult<BookMetadata> {
    conform(&metadata_schema(), raw)
}

pub(crate) fn conform_cast(raw: &Value) -> DeepbookResult<CastDraft> {
    conform(&characters_schema(), raw)
}

pub(crate) fn conform_outline(raw: &Value) -> DeepbookResult<BookOutline> {
    conform(&outline_schema(), raw)
}

pub(crate) fn conform_chapter(raw: &Value) -> DeepbookResult<ChapterDraft> {
    conform(&chapter_text_schema(), raw)
}
