//! Advisory text for each disaster-risk label.

use crate::classify::DisasterLabel;

/// Returned for anything that does not name a known label.
pub const DEFAULT_RECOMMENDATION: &str =
    "No specific guidance available. Follow local authority advisories.";

/// Advisory text for `label`.
pub fn recommendation(label: DisasterLabel) -> &'static str {
    match label {
        DisasterLabel::NoDisaster => {
            "Conditions look normal. Keep monitoring forecasts and maintain routine preparedness."
        }
        DisasterLabel::Flood => {
            "Flood risk: clear drainage, move valuables above ground level and prepare evacuation routes."
        }
        DisasterLabel::Drought => {
            "Drought risk: conserve water, schedule irrigation carefully and watch for wildfire warnings."
        }
        DisasterLabel::Storm => {
            "Storm risk: secure loose objects, reinforce roofing and keep emergency supplies ready."
        }
    }
}

/// Advisory text for a label given by name, or [`DEFAULT_RECOMMENDATION`].
pub fn recommendation_for_name(name: &str) -> &'static str {
    DisasterLabel::parse(name)
        .map(recommendation)
        .unwrap_or(DEFAULT_RECOMMENDATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_label_has_distinct_text() {
        let texts: Vec<&str> = DisasterLabel::ALL.iter().map(|&l| recommendation(l)).collect();
        for (i, a) in texts.iter().enumerate() {
            assert_ne!(*a, DEFAULT_RECOMMENDATION);
            for b in &texts[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(recommendation_for_name("Flood"), recommendation(DisasterLabel::Flood));
        assert_eq!(recommendation_for_name("earthquake"), DEFAULT_RECOMMENDATION);
        assert_eq!(recommendation_for_name(""), DEFAULT_RECOMMENDATION);
    }
}
