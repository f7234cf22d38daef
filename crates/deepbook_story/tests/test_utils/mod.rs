//! Scripted collaborators for pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use deepbook_core::{
    GenerateRequest, GenerateResponse, ImageRequest, ImageResponse, MediaSource, Output,
    StoryConfig,
};
use deepbook_error::{DeepbookError, DeepbookResult, ProviderError, ProviderErrorKind};
use deepbook_interface::{DeepbookDriver, ImageGeneration};
use deepbook_story::{PromptedJson, StoryPipeline};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Which stage a prompt belongs to, recognised from its wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Metadata,
    Characters,
    Illustration,
    Outline,
    Chapter(u32),
    Unknown,
}

impl PromptKind {
    pub fn of(prompt: &str) -> Self {
        if prompt.contains("visual description for character") {
            PromptKind::Illustration
        } else if let Some(rest) = prompt.split("imagine the text for chapter ").nth(1) {
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits
                .parse()
                .map(PromptKind::Chapter)
                .unwrap_or(PromptKind::Unknown)
        } else if prompt.contains("add in the `metadata` field") {
            PromptKind::Metadata
        } else if prompt.contains("add in the `characters` field") {
            PromptKind::Characters
        } else if prompt.contains("add in the `outline` field") {
            PromptKind::Outline
        } else {
            PromptKind::Unknown
        }
    }
}

/// What the scripted model answers.
#[derive(Debug, Clone)]
pub struct Script {
    pub title: String,
    pub names: Vec<String>,
    pub outline_chapters: u32,
    pub fail_metadata: bool,
    pub fail_chapter: Option<u32>,
    pub misnumber_chapter: Option<u32>,
    pub blank_synopsis: Option<u32>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            title: "Tilly Takes the Long Way".to_string(),
            names: vec!["Tilly".to_string(), "Otto".to_string(), "Hazel".to_string()],
            outline_chapters: 5,
            fail_metadata: false,
            fail_chapter: None,
            misnumber_chapter: None,
            blank_synopsis: None,
        }
    }
}

/// A language model that answers each stage from a [`Script`].
///
/// Replies are free text with the JSON document embedded, so structured
/// calls go through [`PromptedJson`] extraction as a local model would.
#[derive(Debug, Clone, Default)]
pub struct MockStoryteller {
    script: Script,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockStoryteller {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: PromptKind) -> usize {
        self.prompts()
            .iter()
            .filter(|p| PromptKind::of(p) == kind)
            .count()
    }

    fn failure(message: &str) -> DeepbookError {
        ProviderError::new(ProviderErrorKind::Api {
            status: 500,
            message: message.to_string(),
        })
        .into()
    }

    fn reply(&self, prompt: &str) -> DeepbookResult<String> {
        let script = &self.script;
        match PromptKind::of(prompt) {
            PromptKind::Metadata if script.fail_metadata => Err(Self::failure("metadata unavailable")),
            PromptKind::Metadata => Ok(format!(
                "Here is the title page:\n```json\n{}\n```",
                json!({
                    "title": script.title,
                    "author": "Professor Puddlejump",
                    "year": 2087,
                    "themes": ["friendship", "helping others"],
                    "location": "the Whispering Woods"
                })
            )),
            PromptKind::Characters => {
                let characters: Vec<_> = script
                    .names
                    .iter()
                    .map(|name| {
                        json!({
                            "name": name,
                            "description": format!("{name} is small and round."),
                            "personality": format!("{name} always lends a hand.")
                        })
                    })
                    .collect();
                Ok(json!({ "characters": characters }).to_string())
            }
            PromptKind::Illustration => {
                let position = prompt
                    .split("visual description for character ")
                    .nth(1)
                    .map(|rest| rest.chars().take_while(char::is_ascii_digit).collect::<String>())
                    .unwrap_or_default();
                Ok(format!(
                    "A cheerful woodland friend number {position} under tall green trees."
                ))
            }
            PromptKind::Outline => {
                let chapters: Vec<_> = (1..=script.outline_chapters)
                    .map(|i| {
                        json!({
                            "chapter": i,
                            "title": format!("Part {i}"),
                            "synopsis": if script.blank_synopsis == Some(i) {
                                " ".to_string()
                            } else {
                                format!("Something kind happens in part {i}.")
                            }
                        })
                    })
                    .collect();
                Ok(format!(
                    "Sure! {}",
                    json!({
                        "synopsis": "A turtle helps her friends.",
                        "conflict": "The river floods the forest.",
                        "resolution": "Tilly leads everyone to high ground.",
                        "chapters": chapters
                    })
                ))
            }
            PromptKind::Chapter(index) if script.fail_chapter == Some(index) => {
                Err(Self::failure("chapter unavailable"))
            }
            PromptKind::Chapter(index) => {
                let number = if script.misnumber_chapter == Some(index) {
                    index + 10
                } else {
                    index
                };
                Ok(json!({
                    "chapter": number,
                    "text": format!("  Chapter {index} begins under the big oak tree.  ")
                })
                .to_string())
            }
            PromptKind::Unknown => Err(Self::failure("unrecognised prompt")),
        }
    }
}

#[async_trait]
impl DeepbookDriver for MockStoryteller {
    async fn generate(&self, req: &GenerateRequest) -> DeepbookResult<GenerateResponse> {
        let prompt = req.prompt_text();
        self.prompts.lock().unwrap().push(prompt.clone());
        let text = self.reply(&prompt)?;
        Ok(GenerateResponse::new(vec![Output::Text(text)]))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-storyteller"
    }
}

/// An image model that returns a URL per request.
#[derive(Debug, Clone, Default)]
pub struct MockIllustrator {
    fail_when: Option<String>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockIllustrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any request whose prompt contains `fragment`.
    pub fn failing_when(fragment: impl Into<String>) -> Self {
        Self {
            fail_when: Some(fragment.into()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGeneration for MockIllustrator {
    async fn generate_image(&self, req: &ImageRequest) -> DeepbookResult<ImageResponse> {
        let number = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(req.prompt().clone());
            requests.len()
        };
        if let Some(fragment) = &self.fail_when
            && req.prompt().contains(fragment.as_str())
        {
            return Err(ProviderError::new(ProviderErrorKind::Api {
                status: 400,
                message: "content policy".to_string(),
            })
            .into());
        }
        Ok(ImageResponse::new(
            MediaSource::Url(format!("https://images.test/{number}.png")),
            None,
        ))
    }

    fn image_model_name(&self) -> &str {
        "mock-illustrator"
    }
}

/// Pipeline over the scripted collaborators.
pub fn pipeline(
    llm: &MockStoryteller,
    images: &MockIllustrator,
    config: StoryConfig,
) -> StoryPipeline<PromptedJson<MockStoryteller>, MockIllustrator> {
    StoryPipeline::new(PromptedJson::new(llm.clone()), images.clone(), config)
}

/// Default config with a requested chapter count.
pub fn config_with_chapters(chapters: usize) -> StoryConfig {
    StoryConfig {
        chapter_count: Some(chapters),
        ..StoryConfig::default()
    }
}
