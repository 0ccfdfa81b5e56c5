//! Match Ranker
//!
//! Scores every candidate song of a ranking request against its playlist and
//! returns the results sorted by `final_score`, highest first.
//!
//! **Concurrency:**
//! - playlist aspect embeddings are computed once per request, only for
//!   aspects carrying weight
//! - songs are scored by `buffer_unordered(concurrency)` workers; each song's
//!   aspect embeddings are requested concurrently
//! - there is no cross-song state: a failed or timed-out embedding affects only
//!   the song it belongs to
//!
//! **Ordering:** results are put back in input order and then stable-sorted by
//! descending score, so equal scores keep their input order no matter which
//! worker finished first.
//!
//! **Failures** follow the configured [`FailurePolicy`]. `DimensionMismatch`
//! and cancellation always abort the request.

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tunematch_common::config::{FailurePolicy, RankingConfig};
use tunematch_common::{ModelVariant, Profile, RankingRequest, SongEntry, TrackInfo};
use uuid::Uuid;

use crate::aspect::{Aspect, AspectSimilarities, AspectWeights};
use crate::compose::compose_aspect_text;
use crate::embedding::{is_blank, Embedding, EmbeddingProvider};
use crate::error::{ScoringError, ScoringResult};
use crate::matcher::{score_match, MatchResult};
use crate::similarity::{aspect_similarity, NEUTRAL_SIMILARITY};
use crate::weights::extract_aspect_weights;

/// Playlist-side vectors; `None` marks an aspect substituted as neutral
type PlaylistEmbeddings = BTreeMap<Aspect, Option<Embedding>>;

/// Per-request controls supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    /// Every embedding call must complete before this instant
    pub deadline: Option<Instant>,
    /// Cancelling aborts the request with [`ScoringError::Cancelled`]
    pub cancel: CancellationToken,
}

impl RankOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `ms` milliseconds from now, or none
    pub fn with_deadline_ms(self, ms: Option<u64>) -> Self {
        match ms {
            Some(ms) => self.with_deadline(Instant::now() + Duration::from_millis(ms)),
            None => self,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Song omitted from a ranking under the `skip_song` policy
#[derive(Debug, Clone, Serialize)]
pub struct SongFailure {
    pub song_index: usize,
    pub track_info: TrackInfo,
    pub error: String,
}

/// Result of one ranking request
#[derive(Debug, Clone, Serialize)]
pub struct RankingOutcome {
    pub request_id: Uuid,
    pub model: ModelVariant,
    /// Sorted by `final_score` descending, stable on ties
    pub results: Vec<MatchResult>,
    /// Songs that could not be scored, in input order
    pub failures: Vec<SongFailure>,
}

/// Ranking orchestrator
///
/// Holds an injected embedding provider; constructed once and reused across
/// requests.
pub struct MatchRanker {
    provider: Arc<dyn EmbeddingProvider>,
    model: ModelVariant,
    concurrency: usize,
    failure_policy: FailurePolicy,
}

impl MatchRanker {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        config: &RankingConfig,
        model: ModelVariant,
    ) -> Self {
        Self {
            provider,
            model,
            concurrency: config.concurrency.max(1),
            failure_policy: config.failure_policy,
        }
    }

    pub fn model(&self) -> ModelVariant {
        self.model
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Rank every song of `request` against its playlist
    pub async fn rank(
        &self,
        request: &RankingRequest,
        options: &RankOptions,
    ) -> ScoringResult<RankingOutcome> {
        let request_id = Uuid::new_v4();
        let started = std::time::Instant::now();

        if options.cancel.is_cancelled() {
            return Err(ScoringError::Cancelled);
        }

        let weights = extract_aspect_weights(&request.playlist);

        info!(
            request_id = %request_id,
            songs = request.songs.len(),
            model = %self.model,
            provider = self.provider.name(),
            failure_policy = self.failure_policy.as_str(),
            theme = weights.theme,
            mood = weights.mood,
            activity = weights.activity,
            intensity = weights.intensity,
            "Ranking request started"
        );

        let embedded = tokio::select! {
            biased;
            _ = options.cancel.cancelled() => return Err(ScoringError::Cancelled),
            embedded = self.embed_playlist(&request.playlist, &weights, options) => embedded,
        };
        let playlist_embeddings = match embedded {
            Ok(embeddings) => embeddings,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Playlist embedding failed");
                return Err(e);
            }
        };

        let scoring = stream::iter(request.songs.iter().enumerate())
            .map(|(index, song)| {
                let weights = &weights;
                let playlist_embeddings = &playlist_embeddings;
                async move {
                    let outcome = self
                        .score_song(index, song, weights, playlist_embeddings, options)
                        .await;
                    (index, outcome)
                }
            })
            .buffer_unordered(self.concurrency);
        tokio::pin!(scoring);

        let mut results = Vec::with_capacity(request.songs.len());
        let mut failures = Vec::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = options.cancel.cancelled() => {
                    info!(request_id = %request_id, scored = results.len(), "Ranking cancelled");
                    return Err(ScoringError::Cancelled);
                }
                next = scoring.next() => next,
            };

            let Some((index, outcome)) = next else {
                break;
            };

            match outcome {
                Ok(result) => results.push(result),
                Err(e) if e.is_fatal() || self.failure_policy == FailurePolicy::FailRequest => {
                    error!(
                        request_id = %request_id,
                        song_index = index,
                        error = %e,
                        "Ranking aborted"
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        request_id = %request_id,
                        song_index = index,
                        track = %request.songs[index].track,
                        error = %e,
                        "Song skipped"
                    );
                    failures.push(SongFailure {
                        song_index: index,
                        track_info: request.songs[index].track.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        sort_by_score(&mut results);
        failures.sort_by_key(|f| f.song_index);

        info!(
            request_id = %request_id,
            ranked = results.len(),
            skipped = failures.len(),
            top_score = results.first().map(|r| r.final_score),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ranking request completed"
        );

        Ok(RankingOutcome {
            request_id,
            model: self.model,
            results,
            failures,
        })
    }

    /// Score a single song against a playlist
    pub async fn match_song(
        &self,
        playlist: &Profile,
        song: &SongEntry,
        options: &RankOptions,
    ) -> ScoringResult<MatchResult> {
        let weights = extract_aspect_weights(playlist);
        let playlist_embeddings = self.embed_playlist(playlist, &weights, options).await?;
        self.score_song(0, song, &weights, &playlist_embeddings, options)
            .await
    }

    async fn embed_playlist(
        &self,
        playlist: &Profile,
        weights: &AspectWeights,
        options: &RankOptions,
    ) -> ScoringResult<PlaylistEmbeddings> {
        let calls = weights.active_aspects().into_iter().map(|aspect| {
            let text = compose_aspect_text(playlist, aspect);
            async move { (aspect, self.embed_aspect("playlist", aspect, &text, options).await) }
        });

        let mut embeddings = PlaylistEmbeddings::new();
        for (aspect, outcome) in join_all(calls).await {
            match outcome {
                Ok(embedding) => {
                    embeddings.insert(aspect, Some(embedding));
                }
                // A playlist-side failure would hit every song alike
                Err(e) if !e.is_fatal() && self.failure_policy == FailurePolicy::Neutral => {
                    warn!(%aspect, error = %e, "Playlist aspect substituted with neutral similarity");
                    embeddings.insert(aspect, None);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(embeddings)
    }

    async fn score_song(
        &self,
        index: usize,
        song: &SongEntry,
        weights: &AspectWeights,
        playlist_embeddings: &PlaylistEmbeddings,
        options: &RankOptions,
    ) -> ScoringResult<MatchResult> {
        let subject = format!("song #{} ({})", index, song.track);
        let subject = subject.as_str();

        let mut similarities = AspectSimilarities::new();

        // Aspects already neutral on the playlist side need no song embedding
        let mut compared = Vec::new();
        for (&aspect, playlist_vector) in playlist_embeddings {
            match playlist_vector {
                Some(playlist_vector) => compared.push((aspect, playlist_vector)),
                None => {
                    similarities.insert(aspect, NEUTRAL_SIMILARITY);
                }
            }
        }

        let calls = compared.into_iter().map(|(aspect, playlist_vector)| {
            let text = compose_aspect_text(&song.analysis, aspect);
            async move {
                let outcome = self.embed_aspect(subject, aspect, &text, options).await;
                (aspect, playlist_vector, outcome)
            }
        });

        for (aspect, playlist_vector, outcome) in join_all(calls).await {
            let similarity = match outcome {
                Ok(song_vector) => aspect_similarity(playlist_vector, &song_vector)?,
                Err(e) if !e.is_fatal() && self.failure_policy == FailurePolicy::Neutral => {
                    warn!(
                        song_index = index,
                        %aspect,
                        error = %e,
                        "Song aspect substituted with neutral similarity"
                    );
                    NEUTRAL_SIMILARITY
                }
                Err(e) => return Err(e),
            };
            similarities.insert(aspect, similarity);
        }

        let result = score_match(index, song.track.clone(), weights, similarities);

        debug!(
            song_index = index,
            track = %result.track_info,
            final_score = result.final_score,
            "Song scored"
        );

        Ok(result)
    }

    async fn embed_aspect(
        &self,
        subject: &str,
        aspect: Aspect,
        text: &str,
        options: &RankOptions,
    ) -> ScoringResult<Embedding> {
        if is_blank(text) {
            return Ok(Embedding::zeros(self.model));
        }

        let call = self.provider.embed(text, self.model);
        let outcome = match options.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, call).await.map_err(|_| {
                ScoringError::DeadlineExceeded {
                    subject: subject.to_string(),
                    aspect,
                }
            })?,
            None => call.await,
        };

        outcome.map_err(|source| ScoringError::EmbeddingUnavailable {
            subject: subject.to_string(),
            aspect,
            source,
        })
    }
}

/// Stable descending sort by final score, after restoring input order
fn sort_by_score(results: &mut [MatchResult]) {
    results.sort_by_key(|r| r.song_index);
    results.sort_by(|a, b| rank_key(b.final_score).total_cmp(&rank_key(a.final_score)));
}

/// Total order key for descending score sorts; NaN ranks last
pub(crate) fn rank_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}
