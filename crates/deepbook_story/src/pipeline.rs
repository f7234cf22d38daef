//! The pipeline orchestrator.
//!
//! Runs the stages in their fixed order, attaches validated output to the
//! [`Book`], and reports a snapshot after every state transition.

use crate::{
    Book, CharactersStage, ChapterTextStage, IllustrationsStage, IncompleteItem, MetadataStage,
    OutlineStage, PartialCompletionWarning, Stage, StageContext, StoryStage,
};
use deepbook_core::StoryConfig;
use deepbook_error::{DeepbookError, DeepbookResult};
use deepbook_interface::{ImageGeneration, StructuredGeneration};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, instrument, warn};

/// Where a run is.
///
/// `NotStarted → MetadataPending → CharactersPending → IllustrationsPending
/// → OutlinePending → ChaptersPending → Done`, or `Failed` from any pending
/// state whose all-or-nothing stage fails.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    /// Nothing has run
    NotStarted,
    /// Waiting on the metadata stage
    MetadataPending,
    /// Waiting on the characters stage
    CharactersPending,
    /// Waiting on the illustrations stage
    IllustrationsPending,
    /// Waiting on the outline stage
    OutlinePending,
    /// Waiting on the chapter text stage
    ChaptersPending,
    /// Every stage ran; some fan-out items may be missing
    Done,
    /// An all-or-nothing stage failed and the run stopped
    Failed {
        /// The stage that failed
        stage: Stage,
        /// Why it failed
        error: DeepbookError,
        /// The last stage whose output was attached
        last_completed: Option<Stage>,
    },
}

impl PipelineState {
    /// Whether no further transitions will happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed { .. })
    }

    /// The state that waits on `stage`.
    fn pending(stage: Stage) -> Self {
        match stage {
            Stage::Metadata => PipelineState::MetadataPending,
            Stage::Characters => PipelineState::CharactersPending,
            Stage::Illustrations => PipelineState::IllustrationsPending,
            Stage::Outline => PipelineState::OutlinePending,
            Stage::ChapterText => PipelineState::ChaptersPending,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::NotStarted => write!(f, "not started"),
            PipelineState::MetadataPending => write!(f, "writing title page"),
            PipelineState::CharactersPending => write!(f, "creating characters"),
            PipelineState::IllustrationsPending => write!(f, "drawing illustrations"),
            PipelineState::OutlinePending => write!(f, "outlining chapters"),
            PipelineState::ChaptersPending => write!(f, "writing chapters"),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Failed { stage, error, .. } => {
                write!(f, "failed at {}: {}", stage, error)
            }
        }
    }
}

/// The book as it stood after a state transition.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct StorySnapshot {
    /// State entered
    state: PipelineState,
    /// Book contents at that moment
    book: Book,
}

/// The outcome of a run: a terminal state and the book built before it.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct StoryRun {
    /// `Done` or `Failed`
    state: PipelineState,
    /// Everything generated
    book: Book,
}

impl StoryRun {
    /// Whether the run reached `Done`.
    pub fn is_done(&self) -> bool {
        self.state == PipelineState::Done
    }

    /// The error that stopped the run, if it failed.
    pub fn error(&self) -> Option<&DeepbookError> {
        match &self.state {
            PipelineState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Unwrap into the book.
    pub fn into_book(self) -> Book {
        self.book
    }
}

/// Mutable state of a run in progress.
struct RunState<'s> {
    book: Book,
    state: PipelineState,
    last_completed: Option<Stage>,
    updates: Option<&'s UnboundedSender<StorySnapshot>>,
}

impl RunState<'_> {
    fn transition(&mut self, state: PipelineState) {
        debug!(from = %self.state, to = %state, "Pipeline transition");
        self.state = state;
        if let Some(sender) = self.updates {
            let snapshot = StorySnapshot {
                state: self.state.clone(),
                book: self.book.clone(),
            };
            if sender.send(snapshot).is_err() {
                debug!("Snapshot receiver dropped");
            }
        }
    }

    fn complete(&mut self, stage: Stage) {
        self.last_completed = Some(stage);
    }

    fn fail(&mut self, stage: Stage, error: DeepbookError) {
        error!(stage = %stage, error = %error, "Stage failed, stopping pipeline");
        let last_completed = self.last_completed;
        self.transition(PipelineState::Failed {
            stage,
            error,
            last_completed,
        });
    }

    fn finish(self) -> StoryRun {
        StoryRun {
            state: self.state,
            book: self.book,
        }
    }
}

/// Drives the five stages for a prompt.
///
/// Generic over the language collaborator `L` and the image collaborator
/// `I`; the configuration is passed in explicitly and never read from
/// global state.
#[derive(Debug, Clone)]
pub struct StoryPipeline<L, I> {
    llm: L,
    images: I,
    config: StoryConfig,
}

impl<L, I> StoryPipeline<L, I>
where
    L: StructuredGeneration,
    I: ImageGeneration,
{
    /// Create a pipeline.
    pub fn new(llm: L, images: I, config: StoryConfig) -> Self {
        Self {
            llm,
            images,
            config,
        }
    }

    /// The language collaborator.
    pub fn llm(&self) -> &L {
        &self.llm
    }

    /// The image collaborator.
    pub fn images(&self) -> &I {
        &self.images
    }

    /// Story settings.
    pub fn config(&self) -> &StoryConfig {
        &self.config
    }

    /// Generate a book for `prompt`.
    ///
    /// Never returns an error: a failed all-or-nothing stage is reported in
    /// [`StoryRun::state`] together with the book built before it.
    pub async fn run(&self, prompt: &str) -> StoryRun {
        self.drive(prompt, None).await
    }

    /// Generate a book, sending a [`StorySnapshot`] after every transition.
    ///
    /// The final snapshot carries the terminal state. A dropped receiver
    /// does not stop the run.
    pub async fn run_with_updates(
        &self,
        prompt: &str,
        updates: UnboundedSender<StorySnapshot>,
    ) -> StoryRun {
        self.drive(prompt, Some(&updates)).await
    }

    #[instrument(skip(self, updates), fields(prompt_length = prompt.len()))]
    async fn drive(
        &self,
        prompt: &str,
        updates: Option<&UnboundedSender<StorySnapshot>>,
    ) -> StoryRun {
        let mut run = RunState {
            book: Book::new(prompt),
            state: PipelineState::NotStarted,
            last_completed: None,
            updates,
        };
        run.transition(PipelineState::NotStarted);

        // Metadata
        run.transition(PipelineState::pending(Stage::Metadata));
        match self.execute(&MetadataStage::new(&self.llm), &run.book).await {
            Ok(metadata) => {
                run.book.set_metadata(metadata);
                run.complete(Stage::Metadata);
            }
            Err(e) => {
                run.fail(Stage::Metadata, e);
                return run.finish();
            }
        }

        // Characters
        run.transition(PipelineState::pending(Stage::Characters));
        match self.execute(&CharactersStage::new(&self.llm), &run.book).await {
            Ok(characters) => {
                run.book.set_characters(characters);
                run.complete(Stage::Characters);
            }
            Err(e) => {
                run.fail(Stage::Characters, e);
                return run.finish();
            }
        }

        // Illustrations
        run.transition(PipelineState::pending(Stage::Illustrations));
        if self.config.illustrations {
            let stage = IllustrationsStage::new(&self.llm, &self.images);
            match self.execute(&stage, &run.book).await {
                Ok(results) => self.attach_illustrations(&mut run.book, results),
                Err(e) => {
                    run.fail(Stage::Illustrations, e);
                    return run.finish();
                }
            }
        } else {
            info!("Illustrations disabled, skipping stage");
        }
        run.complete(Stage::Illustrations);

        // Outline
        run.transition(PipelineState::pending(Stage::Outline));
        match self.execute(&OutlineStage::new(&self.llm), &run.book).await {
            Ok(outline) => {
                run.book.set_outline(outline);
                run.complete(Stage::Outline);
            }
            Err(e) => {
                run.fail(Stage::Outline, e);
                return run.finish();
            }
        }

        // Chapter text
        run.transition(PipelineState::pending(Stage::ChapterText));
        match self.execute(&ChapterTextStage::new(&self.llm), &run.book).await {
            Ok(results) => self.attach_chapters(&mut run.book, results),
            Err(e) => {
                run.fail(Stage::ChapterText, e);
                return run.finish();
            }
        }
        run.complete(Stage::ChapterText);

        info!(
            chapters = run.book.chapters().len(),
            warnings = run.book.warnings().len(),
            complete = run.book.is_complete(),
            "Story generation finished"
        );
        run.transition(PipelineState::Done);
        run.finish()
    }

    async fn execute<S: StoryStage>(&self, stage: &S, book: &Book) -> DeepbookResult<S::Output> {
        info!(stage = %stage.stage(), "Running stage");
        stage.execute(&StageContext::new(book, &self.config)).await
    }

    fn attach_illustrations(
        &self,
        book: &mut Book,
        results: Vec<DeepbookResult<crate::Illustration>>,
    ) {
        let mut failures = Vec::new();
        for (character, result) in book.characters_mut().iter_mut().zip(results) {
            match result {
                Ok(illustration) => character.attach_illustration(illustration),
                Err(e) => {
                    warn!(character = %character.name(), error = %e, "Illustration failed");
                    failures.push(PartialCompletionWarning::new(
                        IncompleteItem::Illustration {
                            character: character.name().clone(),
                        },
                        e.to_string(),
                    ));
                }
            }
        }
        for warning in failures {
            book.warn(warning);
        }
    }

    fn attach_chapters(
        &self,
        book: &mut Book,
        results: Vec<(u32, DeepbookResult<crate::Chapter>)>,
    ) {
        for (index, result) in results {
            match result {
                Ok(chapter) => book.push_chapter(chapter),
                Err(e) => {
                    warn!(chapter = index, error = %e, "Chapter failed");
                    book.warn(PartialCompletionWarning::new(
                        IncompleteItem::Chapter { index },
                        e.to_string(),
                    ));
                }
            }
        }
    }
}
