//! Ranking orchestration tests against the keyword embedding provider

mod common;

use common::{song, theme_profile, themed_mood_profile, KeywordProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tunematch_common::config::{FailurePolicy, RankingConfig};
use tunematch_common::{DominantMood, ModelVariant, Profile, RankingRequest, Theme};
use tunematch_scorer::{Aspect, ContradictionLevel, MatchRanker, RankOptions, ScoringError};

fn ranker(provider: Arc<KeywordProvider>, policy: FailurePolicy) -> MatchRanker {
    let config = RankingConfig {
        concurrency: 4,
        failure_policy: policy,
        deadline_ms: None,
    };
    MatchRanker::new(provider, &config, ModelVariant::General)
}

fn scenario_a_playlist() -> Profile {
    Profile {
        themes: vec![Theme::new("t10", "", 0.9)],
        dominant_mood: Some(DominantMood::new("t11", "x".repeat(50))),
        intensity_score: Some(0.7),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_scenario_a_ranking_order_and_weights() {
    let provider = Arc::new(KeywordProvider::new());
    let request = RankingRequest {
        playlist: scenario_a_playlist(),
        songs: vec![
            song(
                "Opposite",
                Profile {
                    themes: vec![Theme::new("t20", "", 0.9)],
                    dominant_mood: Some(DominantMood::new("t21", "y")),
                    ..Default::default()
                },
            ),
            song("Unanalyzed", Profile::default()),
            song(
                "Aligned",
                Profile {
                    themes: vec![Theme::new("t10", "", 0.9)],
                    dominant_mood: Some(DominantMood::new("t11", "z")),
                    ..Default::default()
                },
            ),
        ],
    };

    let outcome = ranker(provider, FailurePolicy::SkipSong)
        .rank(&request, &RankOptions::new())
        .await
        .unwrap();

    let order: Vec<usize> = outcome.results.iter().map(|r| r.song_index).collect();
    assert_eq!(order, vec![2, 1, 0]);
    assert!(outcome.failures.is_empty());

    let top = &outcome.results[0];
    assert!((top.aspect_weights.theme - 0.476).abs() < 1e-3);
    assert!((top.aspect_weights.mood - 0.286).abs() < 1e-3);
    assert_eq!(top.aspect_weights.activity, 0.0);
    assert!((top.aspect_weights.intensity - 0.238).abs() < 1e-3);
    assert!((top.final_score - 1.0).abs() < 1e-9);
    assert!(!top.aspect_similarities.contains_key(&Aspect::Activity));
    assert_eq!(
        top.explanation,
        "Excellent match. Key factors: strong theme alignment, strong mood alignment, \
         strong intensity alignment"
    );

    // Absent analysis: neutral similarity with moderate contradictions
    let unanalyzed = &outcome.results[1];
    assert!(unanalyzed
        .aspect_similarities
        .values()
        .all(|s| (*s - 0.5).abs() < 1e-12));
    assert!(unanalyzed.final_score < 0.5);

    let opposite = &outcome.results[2];
    assert_eq!(opposite.final_score, 0.0);
    assert!(opposite.explanation.starts_with("Poor match."));
    assert!(opposite
        .explanation
        .ends_with("Warning: theme contradiction, mood contradiction, intensity contradiction"));
}

#[tokio::test]
async fn test_equal_scores_keep_input_order() {
    let provider = Arc::new(KeywordProvider::new());
    // Later songs answer first
    let songs = (0..5)
        .map(|i| {
            let delay = 50 - i * 10;
            song(&format!("Song {i}"), theme_profile(&format!("t10 wait{delay}")))
        })
        .collect();
    let request = RankingRequest {
        playlist: theme_profile("t10"),
        songs,
    };

    let config = RankingConfig {
        concurrency: 5,
        ..Default::default()
    };
    let outcome = MatchRanker::new(provider, &config, ModelVariant::General)
        .rank(&request, &RankOptions::new())
        .await
        .unwrap();

    let order: Vec<usize> = outcome.results.iter().map(|r| r.song_index).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
    assert!(outcome
        .results
        .windows(2)
        .all(|w| w[0].final_score == w[1].final_score));
}

#[tokio::test]
async fn test_playlist_embedded_once_and_blank_text_skipped() {
    let provider = Arc::new(KeywordProvider::new());
    let request = RankingRequest {
        playlist: theme_profile("t10"),
        songs: vec![
            song("A", theme_profile("t10")),
            song("B", theme_profile("t12")),
            song("C", Profile::default()),
        ],
    };

    ranker(provider.clone(), FailurePolicy::SkipSong)
        .rank(&request, &RankOptions::new())
        .await
        .unwrap();

    // One playlist theme plus two non-empty song themes
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_empty_profiles_never_reach_provider() {
    let provider = Arc::new(KeywordProvider::new());
    let request = RankingRequest {
        playlist: Profile::default(),
        songs: vec![song("Empty", Profile::default())],
    };

    let outcome = ranker(provider.clone(), FailurePolicy::SkipSong)
        .rank(&request, &RankOptions::new())
        .await
        .unwrap();

    assert_eq!(provider.calls(), 0);
    let result = &outcome.results[0];
    assert_eq!(result.aspect_similarities.len(), 4);
    // Uniform weights, four moderate contradictions: 0.5 * 0.9^4
    assert!((result.final_score - 0.5 * 0.9_f64.powi(4)).abs() < 1e-9);
}

fn failing_song_request() -> RankingRequest {
    RankingRequest {
        playlist: themed_mood_profile("t10", "t11"),
        songs: vec![
            song("Broken", themed_mood_profile("t10", "t11 boom")),
            song("Healthy", themed_mood_profile("t10", "t11")),
        ],
    }
}

#[tokio::test]
async fn test_skip_song_policy_reports_failure() {
    let provider = Arc::new(KeywordProvider::new());

    let outcome = ranker(provider, FailurePolicy::SkipSong)
        .rank(&failing_song_request(), &RankOptions::new())
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].song_index, 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].song_index, 0);
    assert_eq!(outcome.failures[0].track_info.title, "Broken");
    assert!(outcome.failures[0].error.contains("Embedding unavailable"));
}

#[tokio::test]
async fn test_neutral_policy_substitutes_failed_aspect() {
    let provider = Arc::new(KeywordProvider::new());

    let outcome = ranker(provider, FailurePolicy::Neutral)
        .rank(&failing_song_request(), &RankOptions::new())
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.failures.is_empty());

    let broken = outcome.results.iter().find(|r| r.song_index == 0).unwrap();
    assert_eq!(broken.aspect_similarities[&Aspect::Mood], 0.5);
    assert!((broken.aspect_similarities[&Aspect::Theme] - 1.0).abs() < 1e-9);
    assert_eq!(outcome.results[0].song_index, 1);
}

#[tokio::test]
async fn test_fail_request_policy_aborts() {
    let provider = Arc::new(KeywordProvider::new());

    let result = ranker(provider, FailurePolicy::FailRequest)
        .rank(&failing_song_request(), &RankOptions::new())
        .await;

    match result {
        Err(ScoringError::EmbeddingUnavailable { aspect, .. }) => assert_eq!(aspect, Aspect::Mood),
        other => panic!("expected EmbeddingUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_playlist_failure_handling() {
    let request = RankingRequest {
        playlist: themed_mood_profile("t10", "t11 boom"),
        songs: vec![song("A", themed_mood_profile("t10", "t11"))],
    };

    let skipped = ranker(Arc::new(KeywordProvider::new()), FailurePolicy::SkipSong)
        .rank(&request, &RankOptions::new())
        .await;
    assert!(matches!(
        skipped,
        Err(ScoringError::EmbeddingUnavailable { .. })
    ));

    let provider = Arc::new(KeywordProvider::new());
    let neutral = ranker(provider.clone(), FailurePolicy::Neutral)
        .rank(&request, &RankOptions::new())
        .await
        .unwrap();
    assert_eq!(neutral.results[0].aspect_similarities[&Aspect::Mood], 0.5);
    // Playlist theme and mood, song theme; the song mood is never embedded
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_absent_song_aspect_is_moderate_contradiction() {
    let request = RankingRequest {
        playlist: theme_profile("t7"),
        songs: vec![song("Unanalyzed", Profile::default())],
    };

    let outcome = ranker(Arc::new(KeywordProvider::new()), FailurePolicy::SkipSong)
        .rank(&request, &RankOptions::new())
        .await
        .unwrap();

    let result = &outcome.results[0];
    let theme = &result.contradictions[&Aspect::Theme];
    assert_eq!(theme.score, 0.5);
    assert_eq!(theme.label, ContradictionLevel::Moderate);
    // Theme carries all the weight: 0.5 * (1 - 0.5 * 1.0 * 0.8)
    assert!((result.final_score - 0.3).abs() < 1e-9);
    assert_eq!(
        result.explanation,
        "Poor match. Key factors: neutral theme relationship"
    );
}

#[tokio::test]
async fn test_dimension_mismatch_is_fatal_under_every_policy() {
    for policy in [
        FailurePolicy::SkipSong,
        FailurePolicy::Neutral,
        FailurePolicy::FailRequest,
    ] {
        let request = RankingRequest {
            playlist: theme_profile("t10"),
            songs: vec![
                song("Fine", theme_profile("t10")),
                song("Wrong model", theme_profile("t10 shrink")),
            ],
        };

        let result = ranker(Arc::new(KeywordProvider::new()), policy)
            .rank(&request, &RankOptions::new())
            .await;

        assert!(
            matches!(result, Err(ScoringError::DimensionMismatch { .. })),
            "policy {policy:?}"
        );
    }
}

#[tokio::test]
async fn test_deadline_affects_only_slow_song() {
    let provider = Arc::new(KeywordProvider::new());
    let request = RankingRequest {
        playlist: theme_profile("t10"),
        songs: vec![
            song("Slow", theme_profile("t10 wait2000")),
            song("Fast", theme_profile("t10")),
        ],
    };
    let options = RankOptions::new().with_deadline(Instant::now() + Duration::from_millis(200));

    let started = std::time::Instant::now();
    let outcome = ranker(provider, FailurePolicy::SkipSong)
        .rank(&request, &options)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].track_info.title, "Fast");
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].error.contains("Deadline exceeded"));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = ranker(Arc::new(KeywordProvider::new()), FailurePolicy::SkipSong)
        .rank(
            &RankingRequest {
                playlist: theme_profile("t10"),
                songs: vec![song("A", theme_profile("t10"))],
            },
            &RankOptions::new().with_cancel(cancel),
        )
        .await;

    assert!(matches!(result, Err(ScoringError::Cancelled)));
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_ranking() {
    let cancel = CancellationToken::new();
    let request = RankingRequest {
        playlist: theme_profile("t10"),
        songs: vec![
            song("A", theme_profile("t10 wait5000")),
            song("B", theme_profile("t10 wait5000")),
        ],
    };

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let result = ranker(Arc::new(KeywordProvider::new()), FailurePolicy::SkipSong)
        .rank(&request, &RankOptions::new().with_cancel(cancel))
        .await;

    assert!(matches!(result, Err(ScoringError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_match_song_single_pair() {
    let provider = Arc::new(KeywordProvider::new());
    let ranker = ranker(provider, FailurePolicy::SkipSong);

    let result = ranker
        .match_song(
            &themed_mood_profile("t10", "t11"),
            &song("Pair", themed_mood_profile("t10", "t11")),
            &RankOptions::new(),
        )
        .await
        .unwrap();

    assert!((result.final_score - 1.0).abs() < 1e-9);
    assert_eq!(result.track_info.title, "Pair");
}
