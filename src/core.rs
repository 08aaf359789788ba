use serde::{Deserialize, Serialize};
pub use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{QualityLockError, Result};

/// Playback quality tokens understood by the host player, lowest first.
#[derive(
    EnumIter,
    EnumString,
    AsRefStr,
    Display,
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Quality {
    #[default]
    Auto,
    Tiny,
    Small,
    Medium,
    Large,
    Hd720,
    Hd1080,
    Hd1440,
    Hd2160,
    Highres,
}

/// Preference order used when degrading, highest resolution first and `auto` last.
pub const QUALITY_ORDER: [Quality; 10] = [
    Quality::Highres,
    Quality::Hd2160,
    Quality::Hd1440,
    Quality::Hd1080,
    Quality::Hd720,
    Quality::Large,
    Quality::Medium,
    Quality::Small,
    Quality::Tiny,
    Quality::Auto,
];

impl Quality {
    /// Human readable label shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            Quality::Auto => "Auto",
            Quality::Tiny => "144p",
            Quality::Small => "240p",
            Quality::Medium => "360p",
            Quality::Large => "480p",
            Quality::Hd720 => "720p",
            Quality::Hd1080 => "1080p",
            Quality::Hd1440 => "1440p",
            Quality::Hd2160 => "2160p (4K)",
            Quality::Highres => "High Resolution",
        }
    }

    /// Parse a token, rejecting anything outside the known set
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
            .map_err(|_| QualityLockError::UnknownQuality(s.to_string()))
    }

    fn rank(&self) -> usize {
        QUALITY_ORDER
            .iter()
            .position(|q| q == self)
            .unwrap_or(QUALITY_ORDER.len())
    }
}

/// Display label for a raw token; unknown tokens are shown as-is.
pub fn display_label(token: &str) -> String {
    Quality::parse(token)
        .map(|q| q.label().to_string())
        .unwrap_or_else(|_| token.to_string())
}

/// Pick the quality to apply given what the player offers.
///
/// Starting at `target` it walks down the order and returns the first offered
/// quality, `auto` being the last resort. An unknown `target`, or nothing
/// offered at or below it, yields the first offered entry unchanged so the
/// player keeps its own pick.
pub fn resolve_best_quality(target: &str, available: &[String]) -> Result<String> {
    let first = available.first().ok_or(QualityLockError::NoAvailableQuality)?;

    let Ok(target) = Quality::parse(target) else {
        return Ok(first.clone());
    };

    let found = QUALITY_ORDER[target.rank()..]
        .iter()
        .find(|q| available.iter().any(|a| a == q.as_ref()));

    Ok(found
        .map(|q| q.as_ref().to_string())
        .unwrap_or_else(|| first.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offered(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_degrades_to_next_lower() {
        let available = offered(&["hd720", "medium", "auto"]);
        assert_eq!(resolve_best_quality("hd1080", &available).unwrap(), "hd720");
    }

    #[test]
    fn test_falls_back_to_auto() {
        let available = offered(&["auto"]);
        assert_eq!(resolve_best_quality("hd2160", &available).unwrap(), "auto");
    }

    #[test]
    fn test_unknown_target_passes_first_through() {
        let available = offered(&["medium", "small"]);
        assert_eq!(
            resolve_best_quality("bogus-label", &available).unwrap(),
            "medium"
        );
    }

    #[test]
    fn test_exact_match_wins() {
        let available = offered(&["hd1080", "hd720", "auto"]);
        assert_eq!(resolve_best_quality("hd1080", &available).unwrap(), "hd1080");
    }

    #[test]
    fn test_only_unknown_offered() {
        let available = offered(&["weird", "other"]);
        assert_eq!(resolve_best_quality("hd720", &available).unwrap(), "weird");
    }

    #[test]
    fn test_auto_target_without_auto_offered_keeps_first() {
        let available = offered(&["hd1080", "hd720", "tiny"]);
        assert_eq!(resolve_best_quality("auto", &available).unwrap(), "hd1080");
    }

    #[test]
    fn test_nothing_lower_keeps_first() {
        let available = offered(&["hd2160", "hd1080", "hd1440"]);
        assert_eq!(resolve_best_quality("hd720", &available).unwrap(), "hd2160");
    }

    #[test]
    fn test_empty_available_is_error() {
        assert!(matches!(
            resolve_best_quality("hd720", &[]),
            Err(QualityLockError::NoAvailableQuality)
        ));
    }

    #[test]
    fn test_never_upgrades_past_target() {
        let all: Vec<Quality> = Quality::iter().collect();
        // every non-empty subset of the known qualities
        for mask in 1u32..(1 << all.len()) {
            let available: Vec<String> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, q)| q.to_string())
                .collect();

            for target in Quality::iter() {
                let best = resolve_best_quality(target.as_ref(), &available).unwrap();
                assert!(available.contains(&best), "{best} not offered");

                let reachable = available
                    .iter()
                    .any(|a| Quality::parse(a).unwrap().rank() >= target.rank());
                if reachable {
                    let best = Quality::parse(&best).unwrap();
                    assert!(
                        best.rank() >= target.rank(),
                        "{best} is above {target} for {available:?}"
                    );
                } else {
                    assert_eq!(best, available[0]);
                }
            }
        }
    }

    #[test]
    fn test_tokens_round_trip_through_strum_and_serde() {
        assert_eq!(Quality::Hd1080.to_string(), "hd1080");
        assert_eq!(Quality::parse("highres").unwrap(), Quality::Highres);
        assert_eq!(
            serde_json::to_string(&Quality::Hd720).unwrap(),
            "\"hd720\""
        );
        assert!(Quality::parse("1080p").is_err());
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label("hd2160"), "2160p (4K)");
        assert_eq!(display_label("mystery"), "mystery");
    }
}
