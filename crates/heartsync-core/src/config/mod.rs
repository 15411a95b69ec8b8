//! Showcase configuration.
//!
//! Participant display names, photo prompts and competition timing. Loaded
//! from an optional JSON file; every field falls back to the defaults the
//! page ships with.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::Participant;
use crate::util::normalize_text_option;
use crate::{Error, Result};

/// Length of a timed heart competition.
pub const COMPETITION_DURATION_MS: i64 = 15_000;

const DEFAULT_SCENE_HEARTS: usize = 8;
const MAX_PROMPTS: usize = 32;
/// Upper bound on floating hearts in the decorative scene.
pub const MAX_SCENE_HEARTS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ParticipantNames {
    pub a: String,
    pub b: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ShowcaseConfig {
    pub participant_names: ParticipantNames,
    /// One photo slot per prompt, in display order
    pub prompts: Vec<String>,
    pub competition_duration_ms: i64,
    /// Prepended to every upload path, ahead of the participant key
    pub upload_prefix: String,
    /// Floating hearts in the decorative scene
    pub scene_hearts: usize,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            participant_names: ParticipantNames {
                a: "Partner A".to_string(),
                b: "Partner B".to_string(),
            },
            prompts: [
                "Our first photo together",
                "Favorite date",
                "Funniest moment",
                "Where we go next",
                "The photo that makes me smile",
            ]
            .map(String::from)
            .to_vec(),
            competition_duration_ms: COMPETITION_DURATION_MS,
            upload_prefix: String::new(),
            scene_hearts: DEFAULT_SCENE_HEARTS,
        }
    }
}

impl ShowcaseConfig {
    /// Load from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let payload = std::fs::read_to_string(path)?;
        parse_showcase_config(&payload)
    }

    pub fn display_name(&self, participant: Participant) -> &str {
        match participant {
            Participant::A => &self.participant_names.a,
            Participant::B => &self.participant_names.b,
        }
    }

    /// Accept a participant key (`a`/`b`) or a display name, case-insensitively.
    pub fn resolve_participant(&self, raw: &str) -> Result<Participant> {
        if let Ok(participant) = raw.parse::<Participant>() {
            return Ok(participant);
        }
        let wanted = raw.trim();
        Participant::ALL
            .into_iter()
            .find(|participant| self.display_name(*participant).eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown participant: {wanted}")))
    }

    pub fn slot_count(&self) -> usize {
        self.prompts.len()
    }

    pub fn prompt_label(&self, slot: usize) -> Option<&str> {
        self.prompts.get(slot).map(String::as_str)
    }

    pub fn competition_duration(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.competition_duration_ms).unwrap_or_default())
    }

    /// Path prefix handed to the upload service for this participant's photos.
    pub fn upload_prefix_for(&self, participant: Participant) -> String {
        let base = self.upload_prefix.trim().trim_matches('/');
        if base.is_empty() {
            format!("{}/", participant.key())
        } else {
            format!("{base}/{}/", participant.key())
        }
    }

    fn validate(self) -> Result<Self> {
        let names = &self.participant_names;
        if normalize_text_option(Some(names.a.clone())).is_none()
            || normalize_text_option(Some(names.b.clone())).is_none()
        {
            return Err(Error::Config("participant names must not be empty".into()));
        }
        if names.a.trim().eq_ignore_ascii_case(names.b.trim()) {
            return Err(Error::Config("participant names must differ".into()));
        }
        if self.prompts.is_empty() || self.prompts.len() > MAX_PROMPTS {
            return Err(Error::Config(format!(
                "prompts must list between 1 and {MAX_PROMPTS} entries"
            )));
        }
        if self.prompts.iter().any(|prompt| prompt.trim().is_empty()) {
            return Err(Error::Config("prompts must not be empty".into()));
        }
        if self.scene_hearts > MAX_SCENE_HEARTS {
            return Err(Error::Config(format!(
                "scene_hearts must be at most {MAX_SCENE_HEARTS}"
            )));
        }
        if self.competition_duration_ms <= 0 {
            return Err(Error::Config(
                "competition_duration_ms must be positive".into(),
            ));
        }
        Ok(self)
    }
}

/// Parse and validate a JSON configuration payload.
pub fn parse_showcase_config(payload: &str) -> Result<ShowcaseConfig> {
    let config: ShowcaseConfig = serde_json::from_str(payload)
        .map_err(|error| Error::Config(format!("invalid showcase config JSON: {error}")))?;
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scene_heart_count_is_bounded() {
        assert!(parse_showcase_config(r#"{"scene_hearts": 500}"#).is_ok());
        let error = parse_showcase_config(r#"{"scene_hearts": 1000000000}"#).unwrap_err();
        assert!(matches!(error, Error::Config(message) if message.contains("scene_hearts")));
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config = parse_showcase_config("{}").unwrap();
        assert_eq!(config, ShowcaseConfig::default());
        assert_eq!(config.competition_duration(), Duration::from_secs(15));
        assert_eq!(config.slot_count(), 5);
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        let error = parse_showcase_config(r#"{"prompts": ["x"], "surprise": true}"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn parse_rejects_empty_prompt_list_and_zero_duration() {
        assert!(parse_showcase_config(r#"{"prompts": []}"#).is_err());
        assert!(parse_showcase_config(r#"{"prompts": ["  "]}"#).is_err());
        assert!(parse_showcase_config(r#"{"competition_duration_ms": 0}"#).is_err());
    }

    #[test]
    fn parse_rejects_duplicate_names() {
        let payload = r#"{"participant_names": {"a": "Sam", "b": "sam"}}"#;
        assert!(parse_showcase_config(payload).is_err());
    }

    #[test]
    fn resolve_participant_by_key_or_name() {
        let config = parse_showcase_config(
            r#"{"participant_names": {"a": "Alex", "b": "Jordan"}, "prompts": ["Us"]}"#,
        )
        .unwrap();

        assert_eq!(config.resolve_participant("b").unwrap(), Participant::B);
        assert_eq!(config.resolve_participant("alex").unwrap(), Participant::A);
        assert_eq!(config.display_name(Participant::B), "Jordan");
        assert!(config.resolve_participant("Casey").is_err());
        assert_eq!(config.prompt_label(0), Some("Us"));
        assert_eq!(config.prompt_label(1), None);
    }

    #[test]
    fn upload_prefix_nests_participant_key() {
        let mut config = ShowcaseConfig::default();
        assert_eq!(config.upload_prefix_for(Participant::A), "a/");

        config.upload_prefix = "/valentine/".to_string();
        assert_eq!(config.upload_prefix_for(Participant::B), "valentine/b/");
    }

    #[test]
    fn load_without_path_uses_defaults() {
        assert_eq!(ShowcaseConfig::load(None).unwrap(), ShowcaseConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("showcase.json");
        std::fs::write(&path, r#"{"scene_hearts": 3}"#).unwrap();

        let config = ShowcaseConfig::load(Some(&path)).unwrap();
        assert_eq!(config.scene_hearts, 3);
    }
}
