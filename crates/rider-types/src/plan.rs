//! Subscription plans

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Built-in subscription plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanName {
    Free,
    Basic,
    Pro,
    Enterprise,
}

impl PlanName {
    pub const ALL: [PlanName; 4] = [Self::Free, Self::Basic, Self::Pro, Self::Enterprise];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Default rider quota. `0` means unlimited.
    pub const fn default_max_riders(&self) -> i32 {
        match self {
            Self::Free => 1,
            Self::Basic => 10,
            Self::Pro => 50,
            Self::Enterprise => 0,
        }
    }

    /// Abilities unlocked by this plan
    pub const fn abilities(&self) -> &'static [&'static str] {
        match self {
            Self::Free => &["rider_view", "rider_comment"],
            Self::Basic => &["rider_view", "rider_comment", "rider_edit", "project_create"],
            Self::Pro => &[
                "rider_view",
                "rider_comment",
                "rider_edit",
                "project_create",
                "export_pdf",
                "collaboration",
            ],
            Self::Enterprise => &[
                "rider_view",
                "rider_comment",
                "rider_edit",
                "project_create",
                "export_pdf",
                "collaboration",
                "priority_support",
            ],
        }
    }
}

impl std::fmt::Display for PlanName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(ParseError::new("plan", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abilities_are_cumulative() {
        for pair in PlanName::ALL.windows(2) {
            let lower = pair[0].abilities();
            let higher = pair[1].abilities();
            assert!(lower.iter().all(|a| higher.contains(a)), "{} abilities missing from {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_enterprise_unlimited() {
        assert_eq!(PlanName::Enterprise.default_max_riders(), 0);
        assert_eq!(PlanName::Free.default_max_riders(), 1);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("PRO".parse::<PlanName>().unwrap(), PlanName::Pro);
        assert!("gold".parse::<PlanName>().is_err());
    }
}
