use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ArchscopeError, Result};

/// Label marking a diagram as derived from the model (regenerated on every
/// analysis pass) rather than supplied by an external caller.
pub const AUTO_LABEL: &str = "auto";

/// Diagram dialects the markup contract accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramDialect {
    Flowchart,
    Sequence,
    Class,
    State,
    EntityRelation,
}

impl DiagramDialect {
    /// Detect the dialect from the first meaningful markup line
    pub fn detect(markup: &str) -> Option<Self> {
        let first = markup.lines().map(str::trim).find(|l| !l.is_empty())?;

        if first.starts_with("flowchart") || first.starts_with("graph") {
            Some(DiagramDialect::Flowchart)
        } else if first.starts_with("sequenceDiagram") {
            Some(DiagramDialect::Sequence)
        } else if first.starts_with("classDiagram") {
            Some(DiagramDialect::Class)
        } else if first.starts_with("stateDiagram") {
            Some(DiagramDialect::State)
        } else if first.starts_with("erDiagram") {
            Some(DiagramDialect::EntityRelation)
        } else {
            None
        }
    }
}

/// One named, categorized diagram. `id` is stable per logical diagram;
/// merging a record with an existing id replaces it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramRecord {
    pub id: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub markup: String,
    pub labels: Vec<String>,

    /// Higher = more prominent
    pub priority: i32,
}

impl DiagramRecord {
    pub fn is_auto(&self) -> bool {
        self.labels.iter().any(|l| l == AUTO_LABEL)
    }
}

/// Fixed id/title/category/priority per externally mergeable diagram type.
/// Unknown types are rejected at the merge boundary.
fn merge_defaults(diagram_type: &str) -> Option<(&'static str, &'static str, &'static str, i32)> {
    match diagram_type {
        "architecture" => Some(("architecture", "Architecture Overview", "architecture", 100)),
        "dependencies" => Some(("dependencies", "Dependency Map", "dependencies", 85)),
        "sequence" | "flow" => Some(("sequence", "Request Flow", "flow", 75)),
        "class" => Some(("classes", "Class Structure", "structure", 65)),
        "er" | "entities" => Some(("entities", "Entity Relationships", "structure", 55)),
        "state" => Some(("states", "State Machine", "behavior", 45)),
        _ => None,
    }
}

/// The ordered collection of all current diagrams plus a content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramSet {
    /// Records in descending priority order
    pub records: Vec<DiagramRecord>,

    /// Hash over ids, markup, and descriptions, in order
    pub content_hash: String,

    pub generated_at: DateTime<Utc>,

    /// Free-text one-line summary of the analyzed model
    pub summary: String,
}

impl DiagramSet {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            content_hash: String::new(),
            generated_at: Utc::now(),
            summary: String::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&DiagramRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Replace all auto diagrams with a freshly projected set, leaving
    /// externally supplied records untouched. Auto diagrams sort first
    /// within equal priority.
    pub fn replace_auto(&mut self, autos: Vec<DiagramRecord>, summary: String) {
        self.records.retain(|r| !r.is_auto());
        self.records.extend(autos);
        self.records.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.is_auto().cmp(&a.is_auto()))
                .then_with(|| a.id.cmp(&b.id))
        });
        self.summary = summary;
        self.touch();
    }

    /// Merge an externally supplied diagram. The markup must be recognizably
    /// one of the supported dialects and the type must be known; rejected
    /// records are not stored. Replacing an existing id preserves every
    /// other record's position.
    pub fn merge(
        &mut self,
        diagram_type: &str,
        markup: &str,
        description: Option<&str>,
    ) -> Result<DiagramRecord> {
        if markup.trim().is_empty() {
            return Err(ArchscopeError::DiagramMarkup(
                "markup is empty".to_string(),
            ));
        }
        if DiagramDialect::detect(markup).is_none() {
            return Err(ArchscopeError::DiagramMarkup(format!(
                "markup is not a recognized diagram dialect (first line: {:?})",
                markup.lines().next().unwrap_or("")
            )));
        }

        let (id, title, category, priority) =
            merge_defaults(diagram_type).ok_or_else(|| {
                ArchscopeError::DiagramMarkup(format!(
                    "unknown diagram type: {}",
                    diagram_type
                ))
            })?;

        let record = DiagramRecord {
            id: id.to_string(),
            category: category.to_string(),
            title: title.to_string(),
            description: description.unwrap_or("").to_string(),
            markup: markup.to_string(),
            labels: vec!["external".to_string()],
            priority,
        };

        if let Some(existing) = self.records.iter_mut().find(|r| r.id == id) {
            *existing = record.clone();
        } else {
            // Splice at the position its priority calls for
            let pos = self
                .records
                .iter()
                .position(|r| r.priority < priority)
                .unwrap_or(self.records.len());
            self.records.insert(pos, record.clone());
        }

        self.touch();
        Ok(record)
    }

    /// Remove a diagram by id; reports not-found as an error
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);

        if self.records.len() == before {
            return Err(ArchscopeError::DiagramNotFound(id.to_string()));
        }

        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        let mut hasher = Sha256::new();
        for record in &self.records {
            hasher.update(record.id.as_bytes());
            hasher.update(record.markup.as_bytes());
            hasher.update(record.description.as_bytes());
        }
        self.content_hash = format!("{:x}", hasher.finalize());
        self.generated_at = Utc::now();
    }
}

impl Default for DiagramSet {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_detection() {
        assert_eq!(
            DiagramDialect::detect("flowchart TD\n  a --> b"),
            Some(DiagramDialect::Flowchart)
        );
        assert_eq!(
            DiagramDialect::detect("\n  graph LR\n  a --> b"),
            Some(DiagramDialect::Flowchart)
        );
        assert_eq!(
            DiagramDialect::detect("sequenceDiagram\n  A->>B: hi"),
            Some(DiagramDialect::Sequence)
        );
        assert_eq!(
            DiagramDialect::detect("stateDiagram-v2\n  [*] --> Idle"),
            Some(DiagramDialect::State)
        );
        assert_eq!(DiagramDialect::detect("not a diagram"), None);
        assert_eq!(DiagramDialect::detect(""), None);
    }

    #[test]
    fn test_merge_replaces_same_id_leaves_others() {
        let mut set = DiagramSet::empty();
        set.merge("architecture", "flowchart TD\n  a --> b", Some("v1"))
            .unwrap();
        set.merge("sequence", "sequenceDiagram\n  A->>B: hi", None)
            .unwrap();

        let record = set
            .merge("architecture", "flowchart TD\n  a --> c", Some("v2"))
            .unwrap();
        assert_eq!(record.id, "architecture");

        assert_eq!(set.records.len(), 2);
        let arch = set.get("architecture").unwrap();
        assert!(arch.markup.contains("a --> c"));
        assert_eq!(arch.description, "v2");
        assert!(set.get("sequence").is_some());
    }

    #[test]
    fn test_merge_rejects_bad_markup_and_unknown_type() {
        let mut set = DiagramSet::empty();

        assert!(matches!(
            set.merge("architecture", "   ", None),
            Err(ArchscopeError::DiagramMarkup(_))
        ));
        assert!(matches!(
            set.merge("architecture", "just some text", None),
            Err(ArchscopeError::DiagramMarkup(_))
        ));
        assert!(matches!(
            set.merge("mindmap", "flowchart TD\n a --> b", None),
            Err(ArchscopeError::DiagramMarkup(_))
        ));
        // Nothing was stored
        assert!(set.records.is_empty());
    }

    #[test]
    fn test_records_ordered_by_descending_priority() {
        let mut set = DiagramSet::empty();
        set.merge("state", "stateDiagram-v2\n  [*] --> A", None).unwrap();
        set.merge("architecture", "flowchart TD\n  a --> b", None).unwrap();
        set.merge("sequence", "sequenceDiagram\n  A->>B: x", None).unwrap();

        let priorities: Vec<i32> = set.records.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![100, 75, 45]);
    }

    #[test]
    fn test_delete_reports_not_found() {
        let mut set = DiagramSet::empty();
        set.merge("architecture", "flowchart TD\n  a --> b", None).unwrap();

        assert!(set.delete("architecture").is_ok());
        assert!(matches!(
            set.delete("architecture"),
            Err(ArchscopeError::DiagramNotFound(_))
        ));
    }

    #[test]
    fn test_content_hash_tracks_changes() {
        let mut set = DiagramSet::empty();
        set.merge("architecture", "flowchart TD\n  a --> b", None).unwrap();
        let first = set.content_hash.clone();

        set.merge("architecture", "flowchart TD\n  a --> c", None).unwrap();
        assert_ne!(set.content_hash, first);
    }

    #[test]
    fn test_replace_auto_keeps_external_records() {
        let mut set = DiagramSet::empty();
        set.merge("architecture", "flowchart TD\n  ext --> ext2", None).unwrap();

        let autos = vec![DiagramRecord {
            id: "layers".to_string(),
            category: "architecture".to_string(),
            title: "Layers".to_string(),
            description: String::new(),
            markup: "flowchart TD\n  api --> service".to_string(),
            labels: vec![AUTO_LABEL.to_string()],
            priority: 90,
        }];
        set.replace_auto(autos, "1 layer".to_string());

        assert_eq!(set.records.len(), 2);
        assert!(set.get("architecture").is_some());
        assert!(set.get("layers").is_some());

        // A second projection replaces the previous autos, not duplicates them
        let autos = vec![DiagramRecord {
            id: "layers".to_string(),
            category: "architecture".to_string(),
            title: "Layers".to_string(),
            description: String::new(),
            markup: "flowchart TD\n  api --> model".to_string(),
            labels: vec![AUTO_LABEL.to_string()],
            priority: 90,
        }];
        set.replace_auto(autos, "1 layer".to_string());
        assert_eq!(set.records.len(), 2);
        assert!(set.get("layers").unwrap().markup.contains("api --> model"));
    }
}
