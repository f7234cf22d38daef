//! End-to-end pipeline behaviour against scripted collaborators.

mod test_utils;

use deepbook_core::{DuplicateCharacterPolicy, OutlineLengthPolicy, StoryConfig};
use deepbook_error::SchemaViolation;
use deepbook_story::{IncompleteItem, PipelineState, Stage};
use test_utils::{MockIllustrator, MockStoryteller, PromptKind, Script, config_with_chapters, pipeline};

const TURTLE: &str = "A turtle who helps his forest friends";

#[tokio::test]
async fn test_turtle_story_end_to_end() -> anyhow::Result<()> {
    let llm = MockStoryteller::default();
    let images = MockIllustrator::new();

    let run = pipeline(&llm, &images, StoryConfig::default()).run(TURTLE).await;

    assert!(run.is_done(), "state: {}", run.state());
    let book = run.book();
    assert_eq!(book.prompt(), TURTLE);
    assert_eq!(
        book.metadata().as_ref().map(|m| m.title().as_str()),
        Some("Tilly Takes the Long Way")
    );
    assert_eq!(book.character_names(), vec!["Tilly", "Otto", "Hazel"]);
    assert!(book.characters().iter().all(|c| c.illustration().is_some()));
    assert_eq!(book.chapters().len(), 5);
    assert!(book.is_complete());
    assert!(book.warnings().is_empty());
    assert_eq!(book.chapter(1).map(|c| c.text().as_str()), Some("Chapter 1 begins under the big oak tree."));

    // metadata + characters + 3 descriptions + outline + 5 chapters
    assert_eq!(llm.call_count(), 11);
    assert_eq!(images.call_count(), 3);
    assert!(images.requests().iter().all(|p| p.starts_with("A children's book illustration in whimsical")));

    let markdown = book.to_markdown();
    assert!(markdown.starts_with("# Tilly Takes the Long Way"));
    assert!(markdown.contains("### Chapter 5: Part 5"));
    Ok(())
}

#[tokio::test]
async fn test_later_prompts_carry_earlier_output() -> anyhow::Result<()> {
    let llm = MockStoryteller::default();
    let images = MockIllustrator::new();

    pipeline(&llm, &images, config_with_chapters(2)).run(TURTLE).await;

    let prompts = llm.prompts();
    let chapter_prompt = prompts
        .iter()
        .find(|p| PromptKind::of(p) == PromptKind::Chapter(2))
        .expect("chapter 2 prompt");
    assert!(chapter_prompt.contains(TURTLE));
    assert!(chapter_prompt.contains("Tilly Takes the Long Way"));
    assert!(chapter_prompt.contains("Something kind happens in part 2."));
    assert!(chapter_prompt.contains("Tilly, Otto, Hazel"));
    Ok(())
}

#[tokio::test]
async fn test_outline_truncated_to_chapter_count() -> anyhow::Result<()> {
    let llm = MockStoryteller::new(Script {
        outline_chapters: 7,
        ..Script::default()
    });
    let images = MockIllustrator::new();

    let run = pipeline(&llm, &images, config_with_chapters(3)).run(TURTLE).await;

    assert!(run.is_done());
    let outline = run.book().outline().as_ref().expect("outline attached");
    assert_eq!(outline.chapters().len(), 3);
    assert_eq!(run.book().chapters().len(), 3);
    assert_eq!(llm.calls_of(PromptKind::Chapter(4)), 0);

    let outline_prompt = llm
        .prompts()
        .into_iter()
        .find(|p| PromptKind::of(p) == PromptKind::Outline)
        .expect("outline prompt");
    assert!(outline_prompt.contains("(exactly 3 chapters)"));
    Ok(())
}

#[tokio::test]
async fn test_strict_outline_length_fails_run() -> anyhow::Result<()> {
    let llm = MockStoryteller::new(Script {
        outline_chapters: 4,
        ..Script::default()
    });
    let images = MockIllustrator::new();
    let config = StoryConfig {
        outline_length: OutlineLengthPolicy::Strict,
        ..config_with_chapters(2)
    };

    let run = pipeline(&llm, &images, config).run(TURTLE).await;

    match run.state() {
        PipelineState::Failed {
            stage,
            error,
            last_completed,
        } => {
            assert_eq!(*stage, Stage::Outline);
            assert_eq!(*last_completed, Some(Stage::Illustrations));
            assert_eq!(
                error.as_schema().map(|e| e.violation.clone()),
                Some(SchemaViolation::CountMismatch {
                    expected: 2,
                    found: 4
                })
            );
        }
        other => panic!("expected failure, got {other}"),
    }
    assert!(run.book().outline().is_none());
    assert!(run.book().chapters().is_empty());
    assert_eq!(llm.calls_of(PromptKind::Chapter(1)), 0);
    Ok(())
}

#[tokio::test]
async fn test_blank_chapter_synopsis_fails_outline() -> anyhow::Result<()> {
    let llm = MockStoryteller::new(Script {
        blank_synopsis: Some(2),
        ..Script::default()
    });
    let images = MockIllustrator::new();

    let run = pipeline(&llm, &images, config_with_chapters(3)).run(TURTLE).await;

    match run.state() {
        PipelineState::Failed { stage, error, .. } => {
            assert_eq!(*stage, Stage::Outline);
            let schema_error = error.as_schema().expect("schema violation");
            assert_eq!(schema_error.path, "chapters[1].synopsis");
            assert_eq!(schema_error.violation, SchemaViolation::EmptyText);
        }
        other => panic!("expected failure, got {other}"),
    }
    assert!(run.book().outline().is_none());
    assert_eq!(llm.calls_of(PromptKind::Chapter(1)), 0);
    Ok(())
}

#[tokio::test]
async fn test_metadata_failure_stops_pipeline() -> anyhow::Result<()> {
    let llm = MockStoryteller::new(Script {
        fail_metadata: true,
        ..Script::default()
    });
    let images = MockIllustrator::new();

    let run = pipeline(&llm, &images, StoryConfig::default()).run(TURTLE).await;

    assert!(matches!(
        run.state(),
        PipelineState::Failed {
            stage: Stage::Metadata,
            last_completed: None,
            ..
        }
    ));
    assert!(run.error().is_some());
    assert_eq!(llm.call_count(), 1);
    assert_eq!(images.call_count(), 0);

    let book = run.into_book();
    assert!(book.metadata().is_none());
    assert!(book.characters().is_empty());
    assert_eq!(book.prompt(), TURTLE);
    Ok(())
}

#[tokio::test]
async fn test_empty_title_rejected() -> anyhow::Result<()> {
    let llm = MockStoryteller::new(Script {
        title: "   ".to_string(),
        ..Script::default()
    });
    let images = MockIllustrator::new();

    let run = pipeline(&llm, &images, StoryConfig::default()).run(TURTLE).await;

    let error = run.error().expect("run should fail");
    let schema_error = error.as_schema().expect("schema violation");
    assert_eq!(schema_error.path, "title");
    assert_eq!(schema_error.violation, SchemaViolation::EmptyText);
    assert!(run.book().metadata().is_none());
    assert_eq!(llm.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_one_chapter_failure_keeps_the_rest() -> anyhow::Result<()> {
    let llm = MockStoryteller::new(Script {
        fail_chapter: Some(3),
        ..Script::default()
    });
    let images = MockIllustrator::new();

    let run = pipeline(&llm, &images, StoryConfig::default()).run(TURTLE).await;

    assert!(run.is_done());
    let book = run.book();
    assert_eq!(book.chapters().len(), 4);
    assert_eq!(book.missing_chapters(), vec![3]);
    assert!(!book.is_complete());
    assert_eq!(
        book.chapters().iter().map(|c| *c.index()).collect::<Vec<_>>(),
        vec![1, 2, 4, 5]
    );
    assert_eq!(book.warnings().len(), 1);
    assert_eq!(*book.warnings()[0].item(), IncompleteItem::Chapter { index: 3 });
    assert!(book.warnings()[0].reason().contains("chapter unavailable"));
    assert!(book.to_markdown().contains("_This chapter could not be generated._"));
    Ok(())
}

#[tokio::test]
async fn test_misnumbered_chapter_is_not_attached() -> anyhow::Result<()> {
    let llm = MockStoryteller::new(Script {
        misnumber_chapter: Some(2),
        ..Script::default()
    });
    let images = MockIllustrator::new();

    let run = pipeline(&llm, &images, config_with_chapters(3)).run(TURTLE).await;

    assert!(run.is_done());
    assert_eq!(run.book().missing_chapters(), vec![2]);
    assert_eq!(
        *run.book().warnings()[0].item(),
        IncompleteItem::Chapter { index: 2 }
    );
    Ok(())
}

#[tokio::test]
async fn test_illustration_failure_is_partial() -> anyhow::Result<()> {
    let llm = MockStoryteller::default();
    let images = MockIllustrator::failing_when("friend number 2");

    let run = pipeline(&llm, &images, config_with_chapters(2)).run(TURTLE).await;

    assert!(run.is_done());
    let characters = run.book().characters();
    assert!(characters[0].illustration().is_some());
    assert!(characters[1].illustration().is_none());
    assert!(characters[2].illustration().is_some());
    assert_eq!(run.book().warnings().len(), 1);
    assert_eq!(
        *run.book().warnings()[0].item(),
        IncompleteItem::Illustration {
            character: "Otto".to_string()
        }
    );
    assert_eq!(run.book().chapters().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_illustrations_can_be_disabled() -> anyhow::Result<()> {
    let llm = MockStoryteller::default();
    let images = MockIllustrator::new();
    let config = StoryConfig {
        illustrations: false,
        ..config_with_chapters(2)
    };

    let run = pipeline(&llm, &images, config).run(TURTLE).await;

    assert!(run.is_done());
    assert_eq!(images.call_count(), 0);
    assert_eq!(llm.calls_of(PromptKind::Illustration), 0);
    assert!(run.book().characters().iter().all(|c| c.illustration().is_none()));
    assert!(run.book().warnings().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_names_deduplicated() -> anyhow::Result<()> {
    let llm = MockStoryteller::new(Script {
        names: vec!["Tilly".into(), "Otto".into(), " tilly ".into()],
        ..Script::default()
    });
    let images = MockIllustrator::new();

    let run = pipeline(&llm, &images, config_with_chapters(2)).run(TURTLE).await;

    assert!(run.is_done());
    assert_eq!(run.book().character_names(), vec!["Tilly", "Otto"]);
    assert_eq!(images.call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_names_rejected() -> anyhow::Result<()> {
    let llm = MockStoryteller::new(Script {
        names: vec!["Tilly".into(), "Otto".into(), "TILLY".into()],
        ..Script::default()
    });
    let images = MockIllustrator::new();
    let config = StoryConfig {
        duplicate_characters: DuplicateCharacterPolicy::Reject,
        ..StoryConfig::default()
    };

    let run = pipeline(&llm, &images, config).run(TURTLE).await;

    match run.state() {
        PipelineState::Failed {
            stage,
            error,
            last_completed,
        } => {
            assert_eq!(*stage, Stage::Characters);
            assert_eq!(*last_completed, Some(Stage::Metadata));
            assert_eq!(
                error.as_schema().map(|e| e.path.as_str()),
                Some("characters[2].name")
            );
        }
        other => panic!("expected failure, got {other}"),
    }
    assert!(run.book().metadata().is_some());
    assert!(run.book().characters().is_empty());
    assert_eq!(images.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_snapshots_follow_state_order() -> anyhow::Result<()> {
    let llm = MockStoryteller::default();
    let images = MockIllustrator::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let run = pipeline(&llm, &images, config_with_chapters(2))
        .run_with_updates(TURTLE, tx)
        .await;

    let mut snapshots = Vec::new();
    while let Some(snapshot) = rx.recv().await {
        snapshots.push(snapshot);
    }

    let states: Vec<PipelineState> = snapshots.iter().map(|s| s.state().clone()).collect();
    assert_eq!(
        states,
        vec![
            PipelineState::NotStarted,
            PipelineState::MetadataPending,
            PipelineState::CharactersPending,
            PipelineState::IllustrationsPending,
            PipelineState::OutlinePending,
            PipelineState::ChaptersPending,
            PipelineState::Done,
        ]
    );

    // Each snapshot shows the book as it stood on entering that state.
    assert!(snapshots[2].book().metadata().is_some());
    assert!(snapshots[2].book().characters().is_empty());
    assert!(snapshots[5].book().outline().is_some());
    assert!(snapshots[5].book().chapters().is_empty());
    assert_eq!(snapshots[6].book(), run.book());
    Ok(())
}

#[tokio::test]
async fn test_snapshots_end_with_failure() -> anyhow::Result<()> {
    let llm = MockStoryteller::new(Script {
        fail_metadata: true,
        ..Script::default()
    });
    let images = MockIllustrator::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    pipeline(&llm, &images, StoryConfig::default())
        .run_with_updates(TURTLE, tx)
        .await;

    let mut last = None;
    while let Some(snapshot) = rx.recv().await {
        last = Some(snapshot);
    }
    let last = last.expect("at least one snapshot");
    assert!(last.state().is_terminal());
    assert!(matches!(
        last.state(),
        PipelineState::Failed {
            stage: Stage::Metadata,
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn test_dropped_receiver_does_not_stop_run() -> anyhow::Result<()> {
    let llm = MockStoryteller::default();
    let images = MockIllustrator::new();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    drop(rx);

    let run = pipeline(&llm, &images, config_with_chapters(1))
        .run_with_updates(TURTLE, tx)
        .await;

    assert!(run.is_done());
    assert_eq!(run.book().chapters().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_serial_fan_out_matches_parallel() -> anyhow::Result<()> {
    let llm = MockStoryteller::default();
    let images = MockIllustrator::new();
    let config = StoryConfig {
        max_concurrency: 0,
        ..config_with_chapters(4)
    };

    let run = pipeline(&llm, &images, config).run(TURTLE).await;

    assert!(run.is_done());
    assert_eq!(
        run.book().chapters().iter().map(|c| *c.index()).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    Ok(())
}
