//! Story generation command handler.

use super::{Cli, OutputFormat};
use deepbook::{
    Book, DeepbookConfig, DeepbookResult, JsonError, OpenAIClient, PipelineState, StoryPipeline,
    StorySnapshot,
};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// Load configuration and apply command-line overrides.
pub fn load_config(cli: &Cli) -> DeepbookResult<DeepbookConfig> {
    let mut config = match &cli.config {
        Some(path) => DeepbookConfig::from_file(path)?,
        None => DeepbookConfig::load()?,
    };

    if let Some(chapters) = cli.chapters {
        config.story.chapter_count = Some(chapters as usize);
    }
    if cli.no_illustrations {
        config.story.illustrations = false;
    }

    Ok(config)
}

/// Generate a book, report progress on stderr and print it on stdout.
///
/// Returns whether the run reached `Done`.
pub async fn write_story(cli: &Cli) -> DeepbookResult<bool> {
    let config = load_config(cli)?;
    tracing::debug!(
        model = %config.provider.model,
        image_model = %config.provider.image_model,
        chapters = ?config.story.chapter_count,
        illustrations = config.story.illustrations,
        "Configuration loaded"
    );

    let client = OpenAIClient::from_config(&config.provider)?;
    let pipeline = StoryPipeline::new(client.clone(), client, config.story);

    let (tx, rx) = unbounded_channel();
    let reporter = tokio::spawn(report_progress(rx));
    let run = pipeline.run_with_updates(&cli.prompt, tx).await;
    if let Err(e) = reporter.await {
        tracing::warn!(error = %e, "Progress reporter stopped");
    }

    report_warnings(run.book());
    if let Some(error) = run.error() {
        eprintln!("Story generation failed: {}", error);
    }

    if run.book().metadata().is_some() {
        print_book(run.book(), cli.format)?;
    }

    Ok(run.is_done())
}

fn print_book(book: &Book, format: OutputFormat) -> DeepbookResult<()> {
    match format {
        OutputFormat::Markdown => print!("{}", book.to_markdown()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(book)
                .map_err(|e| JsonError::new(format!("Failed to serialize book: {}", e)))?;
            println!("{}", json);
        }
    }
    Ok(())
}

/// Step number of a pending state, out of five.
fn step(state: &PipelineState) -> Option<usize> {
    match state {
        PipelineState::MetadataPending => Some(1),
        PipelineState::CharactersPending => Some(2),
        PipelineState::IllustrationsPending => Some(3),
        PipelineState::OutlinePending => Some(4),
        PipelineState::ChaptersPending => Some(5),
        _ => None,
    }
}

async fn report_progress(mut rx: UnboundedReceiver<StorySnapshot>) {
    while let Some(snapshot) = rx.recv().await {
        let state = snapshot.state();
        match step(state) {
            Some(n) => eprintln!("[{}/5] {}...", n, state),
            None if *state == PipelineState::Done => {
                let book = snapshot.book();
                eprintln!(
                    "Done: {} characters, {} chapters",
                    book.characters().len(),
                    book.chapters().len()
                );
            }
            None => {}
        }
    }
}

fn report_warnings(book: &Book) {
    for warning in book.warnings() {
        eprintln!("warning: {} is missing: {}", warning.item(), warning.reason());
    }
}
