//! EntityParser - turns one markdown file into one graph node.
//!
//! Parsing is deliberately forgiving. A file with no heading, no sections or
//! no content at all still yields a node; only I/O failures are errors. The
//! steps are:
//!
//! 1. Derive id and type from the path relative to the repository root.
//! 2. Build a default label from the file stem, then let a leading markdown
//!    heading override it.
//! 3. Split the body into `## ` sections and map them onto summary fields
//!    using the keyword table for the entity type, unless a curated override
//!    exists for the id.

use crate::error::{EntityError, Result};
use crate::node::{relative_segments, EntityNode, ROOT_TYPE};
use crate::summary::{EntitySummary, KeywordTable, SummaryField, SummaryOverrides};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Prefix that starts a summary section.
const SECTION_PREFIX: &str = "## ";

/// One `## ` block of a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading text without the `## ` marker.
    pub heading: String,
    /// Body lines joined with `\n`, leading and trailing blank lines removed.
    pub body: String,
}

/// Parses entity files into [`EntityNode`]s.
#[derive(Debug, Clone, Default)]
pub struct EntityParser {
    overrides: SummaryOverrides,
}

impl EntityParser {
    /// Creates a parser that always uses section mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser that consults `overrides` before section mapping.
    pub fn with_overrides(overrides: SummaryOverrides) -> Self {
        Self { overrides }
    }

    /// Reads and parses a single entity file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, is not valid UTF-8, or does not
    /// live under `root`. Malformed markdown is never an error.
    pub fn parse_file(&self, path: &Path, root: &Path) -> Result<EntityNode> {
        let source = fs::read_to_string(path).map_err(|e| EntityError::io(path, e))?;
        self.parse_source(&source, path, root)
    }

    /// Parses already-loaded file content.
    pub fn parse_source(&self, source: &str, path: &Path, root: &Path) -> Result<EntityNode> {
        let segments = relative_segments(path, root)?;
        let id = segments.join("/");
        let entity_type = if segments.len() > 1 {
            segments[0].clone()
        } else {
            ROOT_TYPE.to_string()
        };

        let stem = segments.last().map(String::as_str).unwrap_or_default();
        let label = heading_label(source).unwrap_or_else(|| default_label(stem));

        let summary = match self.overrides.get(&id) {
            Some(curated) => {
                debug!("Using summary override for {}", id);
                Some(curated.clone())
            }
            None => extract_summary(&entity_type, &split_sections(source)),
        };

        Ok(EntityNode::new(id, label, entity_type, path.to_string_lossy())
            .with_summary(summary))
    }
}

/// Builds a display label from a file stem: `some_concept` → `Some Concept`.
pub fn default_label(stem: &str) -> String {
    title_case(&stem.replace(['_', '-'], " "))
}

/// Returns the label from a leading heading, if the first non-blank line is one.
pub fn heading_label(source: &str) -> Option<String> {
    let first = source.lines().map(str::trim).find(|l| !l.is_empty())?;
    first
        .starts_with('#')
        .then(|| first.trim_start_matches('#').trim().to_string())
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}

/// Splits markdown into `## ` sections. Text before the first one is dropped.
pub fn split_sections(source: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in source.lines() {
        if let Some(heading) = line.strip_prefix(SECTION_PREFIX) {
            if let Some((heading, body)) = current.take() {
                sections.push(finish_section(heading, &body));
            }
            current = Some((heading.trim().to_string(), Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some((heading, body)) = current {
        sections.push(finish_section(heading, &body));
    }

    sections
}

fn finish_section(heading: String, lines: &[&str]) -> Section {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(start);

    Section {
        heading,
        body: lines[start..end].join("\n"),
    }
}

/// Maps sections onto summary fields using the table for `entity_type`.
///
/// For each field the first section, in document order, whose heading
/// contains one of the field's keywords wins. A winning section with an
/// empty body leaves the field unset. Returns `None` when no field could be
/// filled.
pub fn extract_summary(entity_type: &str, sections: &[Section]) -> Option<EntitySummary> {
    let table = KeywordTable::for_type(entity_type);
    let mut summary = EntitySummary::default();

    for field in SummaryField::ALL {
        let body = sections
            .iter()
            .find(|s| table.matches(field, &s.heading))
            .filter(|s| !s.body.is_empty())
            .map(|s| s.body.clone());
        summary.set(field, body);
    }

    (!summary.is_empty()).then_some(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(source: &str, rel: &str) -> EntityNode {
        let root = PathBuf::from("/memory");
        EntityParser::new()
            .parse_source(source, &root.join(rel), &root)
            .unwrap()
    }

    #[test]
    fn test_heading_overrides_label() {
        let node = parse("\n\n# My Title  \n\nBody", "concepts/some_concept.md");

        assert_eq!(node.id, "concepts/some_concept");
        assert_eq!(node.entity_type, "concepts");
        assert_eq!(node.label, "My Title");
    }

    #[test]
    fn test_default_label_from_stem() {
        let node = parse("Plain text first.\n# Late heading", "concepts/some_concept.md");
        assert_eq!(node.label, "Some Concept");

        assert_eq!(default_label("fail-fast_PRINCIPLE"), "Fail Fast Principle");
        assert_eq!(default_label("web3tools"), "Web3Tools");
    }

    #[test]
    fn test_deeper_heading_still_counts_as_label() {
        let node = parse("### Nested Title\n", "people/ada.md");
        assert_eq!(node.label, "Nested Title");
    }

    #[test]
    fn test_empty_file_degrades_to_defaults() {
        let node = parse("", "patterns/quiet_pattern.md");

        assert_eq!(node.label, "Quiet Pattern");
        assert_eq!(node.summary, None);
    }

    #[test]
    fn test_split_sections() {
        let source = "# Title\npreamble\n## First\n\n  line one\nline two\n\n## Second\n### Sub\ntext\n\n";
        let sections = split_sections(source);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "First");
        assert_eq!(sections[0].body, "  line one\nline two");
        assert_eq!(sections[1].heading, "Second");
        assert_eq!(sections[1].body, "### Sub\ntext");
    }

    #[test]
    fn test_heading_without_space_is_not_a_section() {
        let sections = split_sections("##Tight\nbody\n## Real\nkept");

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Real");
        assert_eq!(sections[0].body, "kept");
    }

    #[test]
    fn test_protocol_purpose_maps_to_core_idea() {
        let node = parse("# Review\n## Purpose\nFoo\n", "protocols/review.md");
        let summary = node.summary.unwrap();

        assert_eq!(summary.core_idea.as_deref(), Some("Foo"));
        assert_eq!(summary.common_patterns, None);
    }

    #[test]
    fn test_first_matching_section_wins() {
        let source = "## Background\nfirst\n## History\nsecond\n## Overview\nidea";
        let node = parse(source, "concepts/layers.md");
        let summary = node.summary.unwrap();

        assert_eq!(summary.origin_story.as_deref(), Some("first"));
        assert_eq!(summary.core_idea.as_deref(), Some("idea"));
    }

    #[test]
    fn test_one_section_can_fill_several_fields() {
        let node = parse("## Purpose and History\nshared", "concepts/dual.md");
        let summary = node.summary.unwrap();

        assert_eq!(summary.core_idea.as_deref(), Some("shared"));
        assert_eq!(summary.origin_story.as_deref(), Some("shared"));
    }

    #[test]
    fn test_empty_first_match_claims_field() {
        let node = parse("## Overview\n\n## Summary\nfilled", "projects/app.md");
        assert_eq!(node.summary, None);

        let source = "## Overview\n\n## Summary\nfilled\n## Architecture\ngears";
        let summary = parse(source, "projects/app.md").summary.unwrap();
        assert_eq!(summary.core_idea, None);
        assert_eq!(summary.common_patterns.as_deref(), Some("gears"));
    }

    #[test]
    fn test_anti_pattern_table() {
        let source = "## The Problem\nbad\n## The Correct Pattern\ngood\n## Philosophy\nignored";
        let node = parse(source, "anti-patterns/silent_failure.md");
        let summary = node.summary.unwrap();

        assert_eq!(summary.core_idea.as_deref(), Some("bad"));
        assert_eq!(summary.common_patterns.as_deref(), Some("good"));
        assert_eq!(summary.philosophy, None);
    }

    #[test]
    fn test_unmatched_sections_give_no_summary() {
        let node = parse("## Random\ntext", "concepts/misc.md");
        assert_eq!(node.summary, None);
    }

    #[test]
    fn test_override_replaces_section_mapping() {
        let root = PathBuf::from("/memory");
        let mut overrides = SummaryOverrides::new();
        overrides.insert(
            "people/izzy",
            EntitySummary {
                core_idea: Some("Curated".into()),
                ..Default::default()
            },
        );
        let parser = EntityParser::with_overrides(overrides);

        let izzy = parser
            .parse_source("## Overview\ngeneric", &root.join("people/izzy.md"), &root)
            .unwrap();
        let other = parser
            .parse_source("## Overview\ngeneric", &root.join("people/ada.md"), &root)
            .unwrap();

        assert_eq!(izzy.summary.unwrap().core_idea.as_deref(), Some("Curated"));
        assert_eq!(other.summary.unwrap().core_idea.as_deref(), Some("generic"));
    }

    #[test]
    fn test_unknown_directory_is_kept_as_type() {
        let node = parse("", "journal/today.md");

        assert_eq!(node.entity_type, "journal");
        assert_eq!(node.id, "journal/today");
    }

    #[test]
    fn test_file_in_root_has_root_type() {
        let node = parse("", "readme.md");
        assert_eq!(node.entity_type, ROOT_TYPE);
        assert_eq!(node.id, "readme");
    }

    #[test]
    fn test_parse_file_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("concepts")).unwrap();
        let path = root.join("concepts/broken.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let err = EntityParser::new().parse_file(&path, root).unwrap_err();
        assert!(matches!(err, EntityError::Io { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
    }
}
