//! Declarative scoring data: category rules, vocabularies and signal weights
//!
//! Everything the enrichment pipeline tunes on lives here as plain data so it
//! can be swapped or tested without touching control flow.

use regex::Regex;
use tracing::warn;

use super::entities::RawToolRecord;

/// Multiplier applied to regex hits relative to keyword hits
pub const REGEX_SIGNAL_FACTOR: f64 = 1.5;
/// Multiplier applied to declared-language overlap relative to keyword hits
pub const LANGUAGE_SIGNAL_FACTOR: f64 = 0.8;
/// Per-priority-step boost applied to a rule's total score
pub const PRIORITY_STEP: f64 = 0.1;

/// Weighted heuristic matcher classifying a tool into a taxonomy bucket
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub patterns: Vec<Regex>,
    pub languages: Vec<String>,
    pub weight: f64,
    pub priority: u32,
}

impl CategoryRule {
    /// Build a rule from static data, skipping patterns that fail to compile
    pub fn new(
        name: &str,
        keywords: &[&str],
        patterns: &[&str],
        languages: &[&str],
        weight: f64,
        priority: u32,
    ) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(rule = name, pattern = p, error = %e, "Skipping invalid category pattern");
                    None
                }
            })
            .collect();

        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            patterns,
            languages: languages.iter().map(|l| l.to_lowercase()).collect(),
            weight,
            priority,
        }
    }

    /// Score a record against this rule. `text` is the record's lowercased search text.
    pub fn score(&self, text: &str, record: &RawToolRecord) -> f64 {
        let keyword_hits = self
            .keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .count() as f64;

        let regex_hits = self.patterns.iter().filter(|p| p.is_match(text)).count() as f64;

        let language_hits = record
            .languages
            .iter()
            .filter(|l| self.languages.contains(&l.to_lowercase()))
            .count() as f64;

        let base = keyword_hits * self.weight
            + regex_hits * self.weight * REGEX_SIGNAL_FACTOR
            + language_hits * self.weight * LANGUAGE_SIGNAL_FACTOR;

        base * (1.0 + self.priority as f64 * PRIORITY_STEP)
    }
}

/// The single active rule set of an engine instance
#[derive(Debug, Clone)]
pub struct CategoryRuleSet {
    rules: Vec<CategoryRule>,
}

impl CategoryRuleSet {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Re-classify a record. The highest strictly-positive rule score wins;
    /// no positive score or a tie at the top keeps the source category.
    pub fn classify(&self, record: &RawToolRecord) -> String {
        let text = record.search_text();
        let mut best: Option<(&CategoryRule, f64)> = None;
        let mut tied = false;

        for rule in &self.rules {
            let score = rule.score(&text, record);
            if score <= 0.0 {
                continue;
            }
            match best {
                Some((_, best_score)) if score > best_score => {
                    best = Some((rule, score));
                    tied = false;
                }
                Some((_, best_score)) if score == best_score => tied = true,
                Some(_) => {}
                None => best = Some((rule, score)),
            }
        }

        match best {
            Some((rule, _)) if !tied => rule.name.clone(),
            _ => record.category.clone(),
        }
    }
}

impl Default for CategoryRuleSet {
    fn default() -> Self {
        Self::new(vec![
            CategoryRule::new(
                "frontend",
                &["react", "vue", "angular", "svelte", "frontend", "css", "component", "ui kit"],
                &[r"\b(spa|ssr|jsx|tsx)\b", r"\bui (library|framework)\b"],
                &["javascript", "typescript"],
                1.0,
                2,
            ),
            CategoryRule::new(
                "backend",
                &["server", "backend", "api", "express", "django", "flask", "rails", "microservice"],
                &[r"\b(rest|graphql|grpc)\b", r"\bweb framework\b"],
                &["go", "java", "python", "rust", "ruby", "php"],
                1.0,
                2,
            ),
            CategoryRule::new(
                "database",
                &["database", "sql", "postgres", "mysql", "mongodb", "redis", "orm", "sqlite"],
                &[r"\b(key-value|kv) store\b", r"\bquery (builder|engine)\b"],
                &[],
                1.2,
                3,
            ),
            CategoryRule::new(
                "devops",
                &["docker", "kubernetes", "deploy", "terraform", "ci/cd", "container", "helm", "ansible"],
                &[r"\binfrastructure[- ]as[- ]code\b", r"\b(ci|cd) pipeline\b"],
                &["hcl", "shell", "dockerfile"],
                1.0,
                2,
            ),
            CategoryRule::new(
                "testing",
                &["test", "jest", "mocha", "pytest", "mock", "assertion", "e2e", "coverage"],
                &[r"\b(unit|integration|end-to-end) test", r"\btest runner\b"],
                &[],
                1.1,
                2,
            ),
            CategoryRule::new(
                "ai-ml",
                &["machine learning", "deep learning", "neural", "llm", "tensorflow", "pytorch", "model", "inference"],
                &[r"\b(ai|ml|nlp|gpt)\b", r"\bembedding(s)?\b"],
                &["python", "jupyter notebook"],
                1.2,
                3,
            ),
            CategoryRule::new(
                "monitoring",
                &["monitoring", "observability", "metrics", "tracing", "logging", "prometheus", "grafana", "alert"],
                &[r"\bapm\b", r"\b(log|metric) (aggregation|collection)\b"],
                &[],
                1.0,
                2,
            ),
            CategoryRule::new(
                "security",
                &["security", "auth", "oauth", "encryption", "vulnerability", "scanner", "secret", "jwt"],
                &[r"\b(sast|dast|cve)\b", r"\bzero[- ]trust\b"],
                &[],
                1.1,
                3,
            ),
            CategoryRule::new(
                "mobile",
                &["mobile", "android", "ios", "react native", "flutter", "swiftui"],
                &[r"\bcross[- ]platform app\b"],
                &["swift", "kotlin", "dart", "objective-c"],
                1.0,
                2,
            ),
            CategoryRule::new(
                "cli",
                &["cli", "command line", "command-line", "terminal", "shell"],
                &[r"\btui\b"],
                &[],
                0.9,
                1,
            ),
            CategoryRule::new(
                "data-processing",
                &["etl", "pipeline", "stream", "dataframe", "analytics", "kafka", "spark", "batch"],
                &[r"\bdata (processing|engineering|pipeline)\b"],
                &["scala"],
                1.0,
                2,
            ),
        ])
    }
}

/// Weights and normalization ceilings for the popularity composite
#[derive(Debug, Clone, PartialEq)]
pub struct PopularityWeights {
    pub stars: f64,
    pub forks: f64,
    pub downloads: f64,
    pub recency: f64,
    pub documentation: f64,
    /// Star count that saturates the stars signal
    pub stars_ceiling: f64,
    pub forks_ceiling: f64,
    /// Weekly downloads that saturate the downloads signal
    pub downloads_ceiling: f64,
    /// Lifetime image pulls that saturate the downloads signal
    pub pulls_ceiling: f64,
    /// Weeks after the last update at which the recency bonus reaches zero
    pub recency_weeks: f64,
}

impl Default for PopularityWeights {
    fn default() -> Self {
        Self {
            stars: 0.30,
            forks: 0.15,
            downloads: 0.30,
            recency: 0.15,
            documentation: 0.10,
            stars_ceiling: 100_000.0,
            forks_ceiling: 10_000.0,
            downloads_ceiling: 10_000_000.0,
            pulls_ceiling: 1_000_000_000.0,
            recency_weeks: 20.0,
        }
    }
}

/// Vocabulary voting for "expert" difficulty
pub const EXPERT_TERMS: &[&str] = &[
    "advanced",
    "expert",
    "enterprise",
    "distributed",
    "low-level",
    "compiler",
    "kernel",
    "cluster",
    "orchestration",
    "high-performance",
    "concurrency",
    "scalable",
];

/// Vocabulary voting for "beginner" difficulty
pub const BEGINNER_TERMS: &[&str] = &[
    "beginner",
    "simple",
    "easy",
    "starter",
    "tutorial",
    "getting started",
    "lightweight",
    "minimal",
    "boilerplate",
    "template",
    "no-code",
    "zero-config",
];

/// Licenses that earn the full license indicator in the quality score
pub const PREFERRED_LICENSES: &[&str] = &[
    "mit",
    "apache-2.0",
    "apache 2.0",
    "bsd-2-clause",
    "bsd-3-clause",
    "isc",
    "mpl-2.0",
];

/// License fragments that mark a tool as free to use
pub const OPEN_LICENSE_MARKERS: &[&str] = &[
    "mit", "apache", "bsd", "gpl", "isc", "mpl", "unlicense", "cc0", "zlib",
];

/// Keywords that short-circuit the pricing estimate to "free"
pub const FREE_KEYWORDS: &[&str] = &[
    "open source",
    "open-source",
    "opensource",
    "free software",
    "free and open",
];
/// Keywords voting for the enterprise tier
pub const ENTERPRISE_KEYWORDS: &[&str] = &["enterprise", "sla", "on-premise", "dedicated support"];
/// Keywords voting for the paid tier
pub const PAID_KEYWORDS: &[&str] = &["paid", "commercial", "subscription", "license key", "proprietary"];
/// Keywords voting for the freemium tier
pub const FREEMIUM_KEYWORDS: &[&str] = &["freemium", "free tier", "trial", "pro plan", "saas", "cloud"];
