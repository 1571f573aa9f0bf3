//! Study configuration: global defaults, per-deck overrides and the merged view.

use serde::{Deserialize, Serialize};

use crate::algorithm::SchedulerKind;
use crate::error::{DrillError, Result};
use crate::modes::ModePolicy;

/// Global settings configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    pub scheduler: SchedulerKind,
    pub new_cards_per_day: u32,
    /// Per-bucket cap for Relearning, Learning and Review cards.
    pub fetch_limit: usize,
    pub daily_reset_hour: u32,
    /// Attempts after which a still-failing mode finalises the card as Again.
    pub max_attempts_per_mode: Option<u32>,
    pub seed_when_starved: bool,
    pub mode_policy: ModePolicy,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            scheduler: SchedulerKind::default(),
            new_cards_per_day: 20,
            fetch_limit: 50,
            daily_reset_hour: 0,
            max_attempts_per_mode: None,
            seed_when_starved: true,
            mode_policy: ModePolicy::default(),
        }
    }
}

impl GlobalSettings {
    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.daily_reset_hour > 23 {
            return Err(DrillError::InvalidSettings(format!(
                "daily_reset_hour must be 0-23, got {}",
                self.daily_reset_hour
            )));
        }
        if self.fetch_limit == 0 {
            return Err(DrillError::InvalidSettings("fetch_limit must be positive".to_string()));
        }
        if self.max_attempts_per_mode == Some(0) {
            return Err(DrillError::InvalidSettings(
                "max_attempts_per_mode must be positive".to_string(),
            ));
        }
        self.mode_policy.validate()
    }
}

/// Per-deck settings (all fields optional for overrides).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSettings {
    pub deck_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_cards_per_day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts_per_mode: Option<u32>,
}

impl DeckSettings {
    /// Create new deck settings with only the path set.
    pub fn new(deck_path: String) -> Self {
        Self {
            deck_path,
            new_cards_per_day: None,
            fetch_limit: None,
            max_attempts_per_mode: None,
        }
    }

    /// Parse and validate deck overrides from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch_limit == Some(0) {
            return Err(DrillError::InvalidSettings(format!(
                "deck {}: fetch_limit must be positive",
                self.deck_path
            )));
        }
        if self.max_attempts_per_mode == Some(0) {
            return Err(DrillError::InvalidSettings(format!(
                "deck {}: max_attempts_per_mode must be positive",
                self.deck_path
            )));
        }
        Ok(())
    }
}

/// Effective settings (global merged with deck overrides).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub scheduler: SchedulerKind,
    pub new_cards_per_day: u32,
    pub fetch_limit: usize,
    pub daily_reset_hour: u32,
    pub max_attempts_per_mode: Option<u32>,
    pub seed_when_starved: bool,
    pub mode_policy: ModePolicy,
}

impl EffectiveSettings {
    /// Merge global settings with optional deck settings.
    ///
    /// Deck overrides are validated here, since they may not have come
    /// through [`DeckSettings::from_json`].
    pub fn merge(global: &GlobalSettings, deck: Option<&DeckSettings>) -> Result<Self> {
        let base = Self::from_global(global);
        match deck {
            Some(d) => {
                d.validate()?;
                Ok(Self {
                    new_cards_per_day: d.new_cards_per_day.unwrap_or(base.new_cards_per_day),
                    fetch_limit: d.fetch_limit.unwrap_or(base.fetch_limit),
                    max_attempts_per_mode: d.max_attempts_per_mode.or(base.max_attempts_per_mode),
                    ..base
                })
            }
            None => Ok(base),
        }
    }

    fn from_global(global: &GlobalSettings) -> Self {
        Self {
            scheduler: global.scheduler,
            new_cards_per_day: global.new_cards_per_day,
            fetch_limit: global.fetch_limit,
            daily_reset_hour: global.daily_reset_hour,
            max_attempts_per_mode: global.max_attempts_per_mode,
            seed_when_starved: global.seed_when_starved,
            mode_policy: global.mode_policy.clone(),
        }
    }
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        Self::from_global(&GlobalSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_json_gives_defaults() {
        let settings = GlobalSettings::from_json("{}").unwrap();
        assert_eq!(settings, GlobalSettings::default());
    }

    #[test]
    fn partial_json_overrides() {
        let settings =
            GlobalSettings::from_json(r#"{"new_cards_per_day": 5, "max_attempts_per_mode": 4}"#).unwrap();
        assert_eq!(settings.new_cards_per_day, 5);
        assert_eq!(settings.max_attempts_per_mode, Some(4));
        assert_eq!(settings.fetch_limit, 50);
    }

    #[test]
    fn bad_reset_hour_rejected() {
        let result = GlobalSettings::from_json(r#"{"daily_reset_hour": 24}"#);
        assert!(matches!(result, Err(DrillError::InvalidSettings(_))));
    }

    #[test]
    fn malformed_json_is_config_error() {
        let result = GlobalSettings::from_json("{not json");
        assert!(matches!(result, Err(DrillError::Config(_))));
    }

    #[test]
    fn invalid_policy_rejected() {
        let json = r#"{"mode_policy": {
            "new": {"intro": "reading", "pool": ["typing"], "pick": 1},
            "learning": {"pool": ["typing", "typing"], "pick": 1},
            "review": {"pool": ["cloze"], "pick": 1},
            "relearning": {"pool": ["cloze"], "pick": 1}
        }}"#;
        assert!(matches!(
            GlobalSettings::from_json(json),
            Err(DrillError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn deck_overrides_merge() {
        let global = GlobalSettings::default();
        let mut deck = DeckSettings::new("spanish".to_string());
        deck.new_cards_per_day = Some(3);
        deck.max_attempts_per_mode = Some(5);

        let merged = EffectiveSettings::merge(&global, Some(&deck)).unwrap();
        assert_eq!(merged.new_cards_per_day, 3);
        assert_eq!(merged.max_attempts_per_mode, Some(5));
        assert_eq!(merged.fetch_limit, global.fetch_limit);

        let merged = EffectiveSettings::merge(&global, None).unwrap();
        assert_eq!(merged.new_cards_per_day, 20);
        assert_eq!(merged, EffectiveSettings::default());
    }

    #[test]
    fn zero_deck_overrides_rejected() {
        let global = GlobalSettings::default();
        let mut deck = DeckSettings::new("spanish".to_string());
        deck.fetch_limit = Some(0);
        assert!(matches!(
            EffectiveSettings::merge(&global, Some(&deck)),
            Err(DrillError::InvalidSettings(_))
        ));

        let mut deck = DeckSettings::new("spanish".to_string());
        deck.max_attempts_per_mode = Some(0);
        assert!(matches!(
            EffectiveSettings::merge(&global, Some(&deck)),
            Err(DrillError::InvalidSettings(_))
        ));
    }

    #[test]
    fn deck_json_is_validated() {
        let deck = DeckSettings::from_json(r#"{"deck_path": "spanish", "fetch_limit": 10}"#).unwrap();
        assert_eq!(deck.fetch_limit, Some(10));
        assert_eq!(deck.new_cards_per_day, None);

        let result = DeckSettings::from_json(r#"{"deck_path": "spanish", "max_attempts_per_mode": 0}"#);
        assert!(matches!(result, Err(DrillError::InvalidSettings(_))));
    }
}
