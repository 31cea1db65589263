//! Domain value objects representing immutable concepts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// External catalog a tool was discovered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// npm package registry
    Npm,
    /// crates.io package registry
    Crates,
    /// GitHub repository search
    GitHub,
    /// Docker Hub image registry
    DockerHub,
}

impl SourceType {
    /// Every supported source, in fan-out order
    pub const ALL: [SourceType; 4] = [
        SourceType::Npm,
        SourceType::Crates,
        SourceType::GitHub,
        SourceType::DockerHub,
    ];

    /// Canonical lowercase identifier used in ids, slugs and config
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Npm => "npm",
            SourceType::Crates => "crates",
            SourceType::GitHub => "github",
            SourceType::DockerHub => "dockerhub",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "npm" => Ok(SourceType::Npm),
            "crates" | "crates.io" | "cargo" => Ok(SourceType::Crates),
            "github" => Ok(SourceType::GitHub),
            "dockerhub" | "docker" | "docker-hub" => Ok(SourceType::DockerHub),
            other => Err(format!("Unknown source type: {}", other)),
        }
    }
}

/// Pricing tier estimated for a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingTier {
    Free,
    Freemium,
    Paid,
    Enterprise,
}

impl PricingTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingTier::Free => "free",
            PricingTier::Freemium => "freemium",
            PricingTier::Paid => "paid",
            PricingTier::Enterprise => "enterprise",
        }
    }

    /// Fixed monthly cost estimate in USD associated with the tier
    pub fn monthly_cost(&self) -> f64 {
        match self {
            PricingTier::Free => 0.0,
            PricingTier::Freemium => 25.0,
            PricingTier::Paid => 50.0,
            PricingTier::Enterprise => 500.0,
        }
    }

    /// Budget bucket matching the monthly cost
    pub fn cost_category(&self) -> CostCategory {
        match self {
            PricingTier::Free => CostCategory::Free,
            PricingTier::Freemium => CostCategory::Low,
            PricingTier::Paid => CostCategory::Medium,
            PricingTier::Enterprise => CostCategory::High,
        }
    }
}

impl fmt::Display for PricingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget bucket used by the stack budgeting layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostCategory {
    Free,
    Low,
    Medium,
    High,
}

impl CostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostCategory::Free => "free",
            CostCategory::Low => "low",
            CostCategory::Medium => "medium",
            CostCategory::High => "high",
        }
    }
}

/// Estimated adoption difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "expert" | "advanced" => Ok(Difficulty::Expert),
            other => Err(format!("Unknown difficulty: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_parsing() {
        assert_eq!("npm".parse::<SourceType>().unwrap(), SourceType::Npm);
        assert_eq!("crates.io".parse::<SourceType>().unwrap(), SourceType::Crates);
        assert_eq!(" GitHub ".parse::<SourceType>().unwrap(), SourceType::GitHub);
        assert_eq!("docker".parse::<SourceType>().unwrap(), SourceType::DockerHub);
        assert!("pypi".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_source_type_serde_matches_display() {
        for source in SourceType::ALL {
            let json = serde_json::to_string(&source).unwrap();
            assert_eq!(json, format!("\"{}\"", source));
        }
    }

    #[test]
    fn test_pricing_tier_costs() {
        assert_eq!(PricingTier::Free.monthly_cost(), 0.0);
        assert_eq!(PricingTier::Freemium.monthly_cost(), 25.0);
        assert_eq!(PricingTier::Paid.monthly_cost(), 50.0);
        assert_eq!(PricingTier::Enterprise.monthly_cost(), 500.0);
        assert_eq!(PricingTier::Enterprise.cost_category(), CostCategory::High);
        assert_eq!(PricingTier::Free.cost_category().as_str(), "free");
    }
}
