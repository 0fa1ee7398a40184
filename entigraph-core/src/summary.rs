//! Structured entity summaries.
//!
//! Summaries are pulled out of `## ` sections. Which section feeds which field
//! depends on the entity type; the mapping lives in [`KeywordTable`] as plain
//! data so it can be tested and extended without touching the parser.

use crate::node::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured summary extracted from an entity's sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    /// Main overview or principle.
    #[serde(default)]
    pub core_idea: Option<String>,
    /// Key characteristics or patterns.
    #[serde(default)]
    pub common_patterns: Option<String>,
    /// Warning signs or indicators.
    #[serde(default)]
    pub warning_signs: Option<String>,
    /// Source, history or validation examples.
    #[serde(default)]
    pub origin_story: Option<String>,
    /// Meta-cognitive insights or integrations.
    #[serde(default)]
    pub philosophy: Option<String>,
}

impl EntitySummary {
    /// True when no field is populated.
    pub fn is_empty(&self) -> bool {
        SummaryField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Reads one field.
    pub fn get(&self, field: SummaryField) -> Option<&str> {
        match field {
            SummaryField::CoreIdea => self.core_idea.as_deref(),
            SummaryField::CommonPatterns => self.common_patterns.as_deref(),
            SummaryField::WarningSigns => self.warning_signs.as_deref(),
            SummaryField::OriginStory => self.origin_story.as_deref(),
            SummaryField::Philosophy => self.philosophy.as_deref(),
        }
    }

    /// Writes one field.
    pub fn set(&mut self, field: SummaryField, value: Option<String>) {
        let slot = match field {
            SummaryField::CoreIdea => &mut self.core_idea,
            SummaryField::CommonPatterns => &mut self.common_patterns,
            SummaryField::WarningSigns => &mut self.warning_signs,
            SummaryField::OriginStory => &mut self.origin_story,
            SummaryField::Philosophy => &mut self.philosophy,
        };
        *slot = value;
    }
}

/// The five summary fields, in table column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryField {
    CoreIdea,
    CommonPatterns,
    WarningSigns,
    OriginStory,
    Philosophy,
}

impl SummaryField {
    pub const ALL: [SummaryField; 5] = [
        SummaryField::CoreIdea,
        SummaryField::CommonPatterns,
        SummaryField::WarningSigns,
        SummaryField::OriginStory,
        SummaryField::Philosophy,
    ];

    fn column(self) -> usize {
        match self {
            Self::CoreIdea => 0,
            Self::CommonPatterns => 1,
            Self::WarningSigns => 2,
            Self::OriginStory => 3,
            Self::Philosophy => 4,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyword tables
// ─────────────────────────────────────────────────────────────────────────────

type Keywords = [&'static [&'static str]; 5];

const PROTOCOL_KEYWORDS: Keywords = [
    &["purpose", "overview"],
    &["when to invoke", "protocol steps", "methodology"],
    &["warning signs", "anti-patterns"],
    &["user feedback", "source", "history"],
    &["philosophy", "principles"],
];

const PROJECT_KEYWORDS: Keywords = [
    &["overview", "summary"],
    &["technical architecture", "project approach", "architecture"],
    &["warning signs", "challenges"],
    &["project context", "context", "background"],
    &["philosophy", "principles"],
];

const ANTI_PATTERN_KEYWORDS: Keywords = [
    &["the problem", "overview"],
    &["the correct pattern", "correct approach", "solution"],
    &["why this is wrong", "warning signs", "consequences"],
    &["user feedback", "source", "specific example"],
    &[],
];

const ORGANIZATION_KEYWORDS: Keywords = [
    &["overview", "summary"],
    &["organizational patterns", "patterns", "approach"],
    &[],
    &["key projects", "background", "history"],
    &["philosophy", "technical philosophy"],
];

const GENERAL_KEYWORDS: Keywords = [
    &["overview", "core principle", "purpose", "summary"],
    &[
        "key characteristics",
        "key framework",
        "methodology",
        "key principles",
        "patterns observed",
        "key insights",
    ],
    &["warning signs", "challenges", "lessons learned"],
    &["source", "validation", "history", "background"],
    &[
        "meta-cognitive",
        "integration",
        "philosophy",
        "future applications",
    ],
];

/// Per-type keyword table used to map section headings to summary fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordTable {
    Protocols,
    Projects,
    AntiPatterns,
    Organizations,
    /// Concepts, patterns, people, skills and anything unrecognised.
    General,
}

impl KeywordTable {
    /// Picks the table for an entity type string.
    pub fn for_type(entity_type: &str) -> Self {
        match entity_type {
            "protocols" => Self::Protocols,
            "projects" => Self::Projects,
            "anti-patterns" => Self::AntiPatterns,
            "organizations" => Self::Organizations,
            _ => Self::General,
        }
    }

    /// Candidate heading keywords for a field, lowercase.
    pub fn keywords(self, field: SummaryField) -> &'static [&'static str] {
        let table = match self {
            Self::Protocols => &PROTOCOL_KEYWORDS,
            Self::Projects => &PROJECT_KEYWORDS,
            Self::AntiPatterns => &ANTI_PATTERN_KEYWORDS,
            Self::Organizations => &ORGANIZATION_KEYWORDS,
            Self::General => &GENERAL_KEYWORDS,
        };
        table[field.column()]
    }

    /// True when `heading` (any case) contains a keyword for `field`.
    pub fn matches(self, field: SummaryField, heading: &str) -> bool {
        let heading = heading.to_lowercase();
        self.keywords(field).iter().any(|kw| heading.contains(kw))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Overrides
// ─────────────────────────────────────────────────────────────────────────────

/// Hand-authored summaries that replace section mapping for specific entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryOverrides(BTreeMap<EntityId, EntitySummary>);

impl SummaryOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a curated summary for an entity id.
    pub fn insert(&mut self, id: impl Into<EntityId>, summary: EntitySummary) {
        self.0.insert(id.into(), summary);
    }

    pub fn get(&self, id: &str) -> Option<&EntitySummary> {
        self.0.get(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
