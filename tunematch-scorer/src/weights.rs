//! Aspect Weight Extractor
//!
//! Derives, from a playlist profile, how much each aspect should count when
//! scoring candidate songs. Each aspect gets a raw signal from the fields the
//! playlist actually carries; the signals are then normalized to sum to 1.0.
//!
//! | Aspect    | Raw signal                                             |
//! |-----------|--------------------------------------------------------|
//! | theme     | `min(1.0, mean(theme confidence) * 1.2)`               |
//! | mood      | `max(0.6, min(1.0, description chars / 100))`          |
//! | activity  | `min(1.0, activity count / 5 * 0.8)`                   |
//! | intensity | `0.5` when `intensity_score` is present (including 0)  |
//!
//! Missing fields contribute 0. When every signal is 0 the weights are uniform.
//!
//! The constants are empirically tuned and kept for parity with existing
//! rankings; they have no derivation beyond that.

use tunematch_common::Profile;

use crate::aspect::AspectWeights;

/// Multiplier applied to mean theme confidence
pub const THEME_CONFIDENCE_BOOST: f64 = 1.2;
/// Floor for the mood signal once a complete mood is present
pub const MOOD_MIN_SIGNAL: f64 = 0.6;
/// Description length (characters) at which the mood signal saturates
pub const MOOD_DESCRIPTION_SATURATION: f64 = 100.0;
/// Activity count used to scale the activity signal
pub const ACTIVITY_COUNT_SCALE: f64 = 5.0;
/// Activity signal multiplier
pub const ACTIVITY_SIGNAL_FACTOR: f64 = 0.8;
/// Signal for an explicitly specified intensity
pub const EXPLICIT_INTENSITY_SIGNAL: f64 = 0.5;

/// Raw (unnormalized) aspect signals for a playlist
pub fn raw_aspect_signals(playlist: &Profile) -> AspectWeights {
    let theme = if playlist.themes.is_empty() {
        0.0
    } else {
        let mean_confidence = playlist.themes.iter().map(|t| t.confidence).sum::<f64>()
            / playlist.themes.len() as f64;
        (mean_confidence * THEME_CONFIDENCE_BOOST).min(1.0)
    };

    let mood = match &playlist.dominant_mood {
        Some(mood) if mood.is_complete() => {
            let strength =
                (mood.description.chars().count() as f64 / MOOD_DESCRIPTION_SATURATION).min(1.0);
            strength.max(MOOD_MIN_SIGNAL)
        }
        _ => 0.0,
    };

    let activity = if playlist.activities.is_empty() {
        0.0
    } else {
        (playlist.activities.len() as f64 / ACTIVITY_COUNT_SCALE * ACTIVITY_SIGNAL_FACTOR).min(1.0)
    };

    let intensity = if playlist.intensity_score.is_some() {
        EXPLICIT_INTENSITY_SIGNAL
    } else {
        0.0
    };

    AspectWeights {
        theme: theme.max(0.0),
        mood,
        activity,
        intensity,
    }
}

/// Normalized aspect weights for a playlist
///
/// Never fails: an empty profile yields uniform weights.
pub fn extract_aspect_weights(playlist: &Profile) -> AspectWeights {
    let raw = raw_aspect_signals(playlist);
    let total = raw.sum();

    if total > 0.0 {
        AspectWeights {
            theme: raw.theme / total,
            mood: raw.mood / total,
            activity: raw.activity / total,
            intensity: raw.intensity / total,
        }
    } else {
        AspectWeights::uniform()
    }
}
