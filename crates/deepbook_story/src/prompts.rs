//! Prompt templates for each stage.
//!
//! Templates are static text with two kinds of markers:
//!
//! - `{{key}}` is replaced by the context value for `key`
//! - `{{#key}}...{{/key}}` is kept only when `key` has a value
//!
//! A key counts as missing when it is absent or blank. Required keys are
//! checked before anything is rendered, so a caller learns about missing
//! context before any model call is made.

use deepbook_error::{PromptError, PromptErrorKind};
use std::collections::BTreeMap;

/// Values substituted into a template.
///
/// # Examples
///
/// ```
/// use deepbook_story::PromptContext;
///
/// let context = PromptContext::new()
///     .with("title", "Tilly Takes the Long Way")
///     .with("themes", "");
/// assert_eq!(context.get("title"), Some("Tilly Takes the Long Way"));
/// assert_eq!(context.get("themes"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptContext {
    values: BTreeMap<String, String>,
}

impl PromptContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Non-blank value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// A named prompt with the context keys it cannot do without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    name: &'static str,
    text: &'static str,
    required: &'static [&'static str],
}

impl PromptTemplate {
    /// Declare a template.
    pub const fn new(
        name: &'static str,
        text: &'static str,
        required: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            text,
            required,
        }
    }

    /// Template name, used in errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Keys that must be present in the context.
    pub fn required(&self) -> &'static [&'static str] {
        self.required
    }

    /// Render the template.
    ///
    /// # Errors
    ///
    /// - [`PromptErrorKind::MissingContext`] if a required key, or a
    ///   placeholder outside a dropped section, has no value
    /// - [`PromptErrorKind::UnterminatedSection`] if a section or
    ///   placeholder is never closed
    ///
    /// # Examples
    ///
    /// ```
    /// use deepbook_story::{PromptContext, PromptTemplate};
    ///
    /// const GREETING: PromptTemplate = PromptTemplate::new(
    ///     "greeting",
    ///     "Hello {{name}}!{{#mood}} You seem {{mood}}.{{/mood}}",
    ///     &["name"],
    /// );
    ///
    /// let plain = GREETING.render(&PromptContext::new().with("name", "Tilly")).unwrap();
    /// assert_eq!(plain, "Hello Tilly!");
    ///
    /// let moody = GREETING
    ///     .render(&PromptContext::new().with("name", "Tilly").with("mood", "sleepy"))
    ///     .unwrap();
    /// assert_eq!(moody, "Hello Tilly! You seem sleepy.");
    ///
    /// assert!(GREETING.render(&PromptContext::new()).is_err());
    /// ```
    pub fn render(&self, context: &PromptContext) -> Result<String, PromptError> {
        if let Some(key) = self.required.iter().find(|key| context.get(key).is_none()) {
            return Err(self.missing(key));
        }
        self.render_segment(self.text, context)
    }

    fn render_segment(&self, text: &str, context: &PromptContext) -> Result<String, PromptError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or_else(|| self.unterminated(after.lines().next().unwrap_or_default()))?;
            let tag = after[..close].trim();
            rest = &after[close + 2..];

            if let Some(key) = tag.strip_prefix('#') {
                let end_marker = format!("{{{{/{key}}}}}");
                let end = rest.find(&end_marker).ok_or_else(|| self.unterminated(key))?;
                let body = &rest[..end];
                rest = &rest[end + end_marker.len()..];
                if context.get(key).is_some() {
                    out.push_str(&self.render_segment(body, context)?);
                }
            } else if let Some(key) = tag.strip_prefix('/') {
                return Err(self.unterminated(key));
            } else {
                let value = context.get(tag).ok_or_else(|| self.missing(tag))?;
                out.push_str(value);
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    fn missing(&self, key: &str) -> PromptError {
        PromptError::new(PromptErrorKind::MissingContext {
            template: self.name.to_string(),
            key: key.to_string(),
        })
    }

    fn unterminated(&self, key: &str) -> PromptError {
        PromptError::new(PromptErrorKind::UnterminatedSection {
            template: self.name.to_string(),
            key: key.to_string(),
        })
    }
}

/// Opening shared by every stage prompt.
macro_rules! story_frame {
    ($rest:literal) => {
        concat!(
            "We're imagining a new children's story together. We're going to fill in \
             the details of the story piece-by-piece. Our current story is described by \
             the following JSON.\n\n{{story}}\n\n",
            $rest
        )
    };
}

/// Title page prompt.
pub const METADATA: PromptTemplate = PromptTemplate::new(
    "metadata",
    story_frame!(
        "Now, we are going to add in the `metadata` field: the title of the book, \
         a whimsical and fantastical name for its author, the year it was published \
         (in the past or the future!), the themes it touches upon and the place where \
         most of the story happens."
    ),
    &["story"],
);

/// Cast prompt.
pub const CHARACTERS: PromptTemplate = PromptTemplate::new(
    "characters",
    story_frame!(
        "Now, we are going to add in the `characters` field for the book \"{{title}}\". \
         For each character give their name, a physical description and a one sentence \
         biography as their personality. Every character must have a different name.\
         {{#location}} The story takes place in {{location}}.{{/location}}"
    ),
    &["story", "title"],
);

/// Visual description prompt for one character's portrait.
pub const ILLUSTRATION: PromptTemplate = PromptTemplate::new(
    "illustration",
    story_frame!(
        "Please write a detailed visual description for character {{position}} that will \
         be used for image generation. I need you to create a rich, detailed description \
         that includes:\n\n\
         1. Their physical appearance (body shape, size, species if not human)\n\
         2. Their facial features and expression\n\
         3. Their clothing and accessories\n\
         4. Their pose or action they might be doing\n\
         5. Any key background elements that represent their world\n\
         6. The mood and atmosphere of the image\n\n\
         Make this description vivid and specific, mentioning colors, textures, and small \
         details. Do not include any disclaimers, explanations, or notes about the image \
         generation process. Only provide the descriptive prompt itself.\n\n\
         Again this character is described by the following JSON:\n\n{{character}}"
    ),
    &["story", "position", "character"],
);

/// Plot and chapter plan prompt.
pub const OUTLINE: PromptTemplate = PromptTemplate::new(
    "outline",
    story_frame!(
        "Now, we are going to add in the `outline` field: a 1-2 sentence synopsis of the \
         book, the specific conflict that must be resolved or obstacle that must be \
         overcome, the specific way the conflict is resolved (who, how and when), and an \
         outline for each chapter\
         {{#chapter_count}} (exactly {{chapter_count}} chapters){{/chapter_count}}. \
         Number the chapters from 1 and give each a title and a 1-2 sentence synopsis. \
         The story stars {{cast}}."
    ),
    &["story", "cast"],
);

/// Prompt for one chapter's text.
pub const CHAPTER_TEXT: PromptTemplate = PromptTemplate::new(
    "chapter_text",
    story_frame!(
        "Now, we are going to imagine the text for chapter {{chapter}}, \"{{chapter_title}}\". \
         Please follow the synopsis in the outline for chapter {{chapter}}: {{chapter_synopsis}}\n\n\
         This text is read to children, so it should read like a children's book. \
         Refer to the characters by name: {{cast}}.\
         {{#themes}} Let the chapter reflect the book's themes: {{themes}}.{{/themes}}"
    ),
    &["story", "chapter", "chapter_title", "chapter_synopsis", "cast"],
);
