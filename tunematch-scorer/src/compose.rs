//! Aspect Text Composer
//!
//! One pure function builds the text embedded for an aspect, for playlists
//! and songs alike. An empty result means "aspect absent": callers map it to a
//! zero vector without contacting the embedding provider.

use tunematch_common::Profile;

use crate::aspect::Aspect;

/// Text describing `aspect` of `profile`, or an empty string when absent
pub fn compose_aspect_text(profile: &Profile, aspect: Aspect) -> String {
    let text = match aspect {
        Aspect::Theme => theme_text(profile),
        Aspect::Mood => mood_text(profile),
        Aspect::Activity => profile.activities.join(" "),
        Aspect::Intensity => intensity_text(profile),
    };
    text.trim().to_string()
}

fn theme_text(profile: &Profile) -> String {
    profile
        .themes
        .iter()
        .map(|theme| format!("{} {}", theme.name, theme.description))
        .collect::<Vec<_>>()
        .join(" ")
}

fn mood_text(profile: &Profile) -> String {
    match &profile.dominant_mood {
        Some(mood) => format!("{} {}", mood.mood, mood.description),
        None => String::new(),
    }
}

// Intensity is carried by how the mood is phrased and how it develops
fn intensity_text(profile: &Profile) -> String {
    let progression = profile
        .progression
        .iter()
        .map(|step| step.mood.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{} {}", mood_text(profile), progression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunematch_common::{DominantMood, MoodStep, Theme};

    fn full_profile() -> Profile {
        Profile {
            themes: vec![
                Theme::new("Self-Care", "Taking care of oneself", 0.9),
                Theme::new("Renewal", "Starting over", 0.7),
            ],
            dominant_mood: Some(DominantMood::new("Uplifting", "Warm and encouraging")),
            intensity_score: Some(0.6),
            progression: vec![
                MoodStep {
                    mood: "calm".into(),
                    description: None,
                },
                MoodStep {
                    mood: "bright".into(),
                    description: Some("opens up".into()),
                },
            ],
            activities: vec!["yoga".into(), "journaling".into()],
            primary_setting: Some("Morning".into()),
        }
    }

    #[test]
    fn test_each_aspect_text() {
        let profile = full_profile();

        assert_eq!(
            compose_aspect_text(&profile, Aspect::Theme),
            "Self-Care Taking care of oneself Renewal Starting over"
        );
        assert_eq!(
            compose_aspect_text(&profile, Aspect::Mood),
            "Uplifting Warm and encouraging"
        );
        assert_eq!(compose_aspect_text(&profile, Aspect::Activity), "yoga journaling");
        assert_eq!(
            compose_aspect_text(&profile, Aspect::Intensity),
            "Uplifting Warm and encouraging calm bright"
        );
    }

    #[test]
    fn test_absent_fields_compose_to_empty() {
        let profile = Profile::default();
        for aspect in Aspect::ALL {
            assert_eq!(compose_aspect_text(&profile, aspect), "", "{aspect}");
        }
    }

    #[test]
    fn test_intensity_without_mood_uses_progression() {
        let profile = Profile {
            progression: vec![MoodStep {
                mood: "restless".into(),
                description: None,
            }],
            ..Default::default()
        };

        assert_eq!(compose_aspect_text(&profile, Aspect::Intensity), "restless");
        assert_eq!(compose_aspect_text(&profile, Aspect::Mood), "");
    }
}
