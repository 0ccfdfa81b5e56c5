//! Evaluation reports and result sinks
//!
//! Reporting consumers sit outside the scoring core: they receive the ranked
//! [`MatchResult`] sequence through a [`MatchSink`], or a summarized
//! [`EvaluationReport`] comparing scores with human-judged ground truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tunematch_common::{ModelVariant, Result, SongEntry, TrackInfo};
use uuid::Uuid;

use crate::matcher::MatchResult;
use crate::ranker::RankingOutcome;

/// One ranked song in an evaluation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationEntry {
    /// 1-based position in the ranking
    pub rank: usize,
    pub song_index: usize,
    pub track: TrackInfo,
    pub final_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abs_error: Option<f64>,
}

/// Ranking compared against ground truth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub request_id: Uuid,
    pub model: ModelVariant,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<EvaluationEntry>,
    /// Songs that could not be scored
    pub skipped: usize,
    /// Mean absolute error over entries that carry ground truth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_abs_error: Option<f64>,
}

impl EvaluationReport {
    /// Build a report from a ranking and the songs of its request
    pub fn build(outcome: &RankingOutcome, songs: &[SongEntry]) -> Self {
        let entries: Vec<EvaluationEntry> = outcome
            .results
            .iter()
            .enumerate()
            .map(|(position, result)| {
                let ground_truth = songs
                    .get(result.song_index)
                    .and_then(|song| song.ground_truth)
                    .map(|truth| truth.score);
                EvaluationEntry {
                    rank: position + 1,
                    song_index: result.song_index,
                    track: result.track_info.clone(),
                    final_score: result.final_score,
                    ground_truth,
                    abs_error: ground_truth.map(|truth| (result.final_score - truth).abs()),
                }
            })
            .collect();

        let errors: Vec<f64> = entries.iter().filter_map(|e| e.abs_error).collect();
        let mean_abs_error = if errors.is_empty() {
            None
        } else {
            Some(errors.iter().sum::<f64>() / errors.len() as f64)
        };

        Self {
            request_id: outcome.request_id,
            model: outcome.model,
            generated_at: Utc::now(),
            entries,
            skipped: outcome.failures.len(),
            mean_abs_error,
        }
    }
}

/// Consumer of ranked match results
pub trait MatchSink {
    /// Receive one result; `rank` is 1-based
    fn publish(&mut self, request_id: Uuid, rank: usize, result: &MatchResult) -> Result<()>;

    /// Called once after the last result
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Serialize)]
struct SinkRecord<'a> {
    request_id: Uuid,
    rank: usize,
    #[serde(flatten)]
    result: &'a MatchResult,
}

/// Writes one JSON object per result, one per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create (or truncate) a JSON-lines file
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> MatchSink for JsonLinesSink<W> {
    fn publish(&mut self, request_id: Uuid, rank: usize, result: &MatchResult) -> Result<()> {
        let record = SinkRecord {
            request_id,
            rank,
            result,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Send every ranked result of `outcome` to `sink`, in rank order
pub fn publish(outcome: &RankingOutcome, sink: &mut dyn MatchSink) -> Result<usize> {
    for (position, result) in outcome.results.iter().enumerate() {
        sink.publish(outcome.request_id, position + 1, result)?;
    }
    sink.finish()?;

    tracing::debug!(
        request_id = %outcome.request_id,
        results = outcome.results.len(),
        "Published ranking to sink"
    );
    Ok(outcome.results.len())
}
