use crate::documents::Plan;
use serde::{Deserialize, Serialize};

/// Access tier required to stream a content key.
///
/// Ordering is meaningful: a plan unlocks its own tier and everything
/// below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Premium,
    Gold,
}

impl Tier {
    /// Classifies a folder path by its segments: any segment containing
    /// "gold" (case-insensitive) makes the folder gold, else "premium"
    /// makes it premium, else it is free.
    pub fn of_path(path: &str) -> Tier {
        let mut tier = Tier::Free;
        for segment in path.split('/') {
            let segment = segment.to_lowercase();
            if segment.contains("gold") {
                return Tier::Gold;
            }
            if segment.contains("premium") {
                tier = Tier::Premium;
            }
        }
        tier
    }

    /// Highest tier a plan unlocks.
    pub fn of_plan(plan: Plan) -> Tier {
        match plan {
            Plan::Free => Tier::Free,
            Plan::Premium => Tier::Premium,
            Plan::Gold => Tier::Gold,
        }
    }

    pub fn accessible_with(self, plan: Plan) -> bool {
        self <= Tier::of_plan(plan)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
            Tier::Gold => "gold",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The containing folder of a key, empty for root-level keys.
///
/// A file's tier is the tier of its immediate parent folder; ancestor
/// folders are part of that string, nested re-classification is not
/// performed beyond the segment scan above.
pub fn parent_folder(key: &str) -> &str {
    key.rsplit_once('/').map(|(folder, _)| folder).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gold_segment_wins_over_premium() {
        assert_eq!(Tier::of_path("premium/GOLD HITS"), Tier::Gold);
    }

    #[test]
    fn test_classification_is_case_insensitive_per_segment() {
        assert_eq!(Tier::of_path("GOLD HITS"), Tier::Gold);
        assert_eq!(Tier::of_path("premium/sub"), Tier::Premium);
        assert_eq!(Tier::of_path("pop"), Tier::Free);
    }

    #[test]
    fn test_spec_examples_classify_by_parent_folder() {
        assert_eq!(Tier::of_path(parent_folder("GOLD HITS/track.mp3")), Tier::Gold);
        assert_eq!(
            Tier::of_path(parent_folder("premium/sub/track.mp3")),
            Tier::Premium
        );
        assert_eq!(Tier::of_path(parent_folder("pop/track.mp3")), Tier::Free);
    }

    #[test]
    fn test_root_level_key_has_empty_folder() {
        assert_eq!(parent_folder("track.mp3"), "");
        assert_eq!(Tier::of_path(""), Tier::Free);
    }

    #[test]
    fn test_access_matrix() {
        assert!(Tier::Free.accessible_with(Plan::Free));
        assert!(!Tier::Premium.accessible_with(Plan::Free));
        assert!(!Tier::Gold.accessible_with(Plan::Free));
        assert!(Tier::Premium.accessible_with(Plan::Premium));
        assert!(!Tier::Gold.accessible_with(Plan::Premium));
        assert!(Tier::Gold.accessible_with(Plan::Gold));
        assert!(Tier::Free.accessible_with(Plan::Gold));
    }
}
