//! Core data model: identifiers, structure specs, created nodes, and run context.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the primary store to a node. Authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimaryId(pub u64);

impl fmt::Display for PrimaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the container (template or document) the nodes belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub u64);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// AI-facing identifier of a node, derived from its `PrimaryId`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Deterministic derivation: `<prefix><primary id>`.
    pub fn derive(prefix: &str, primary_id: PrimaryId) -> Self {
        Self(format!("{}{}", prefix, primary_id.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle assigned by the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of field a node renders as (free text, rich text, table...).
/// Kept as an open string; the primary store owns the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKind(String);

impl FieldKind {
    pub const TEXT: &'static str = "TEXT";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        Self(Self::TEXT.to_string())
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One section definition. Sections may nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpec {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expected_length: Option<u32>,
    pub order_index: u32,
    #[serde(default)]
    pub field_kind: Option<FieldKind>,
    #[serde(default)]
    pub children: Vec<SectionSpec>,
}

impl SectionSpec {
    pub fn new(title: impl Into<String>, order_index: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            expected_length: None,
            order_index,
            field_kind: None,
            children: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_child(mut self, child: SectionSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// A section flattened into creation order, with its parent's position in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSection<'a> {
    pub section: &'a SectionSpec,
    pub parent_index: Option<usize>,
}

/// Input structure. Immutable once submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureSpec {
    pub sections: Vec<SectionSpec>,
}

impl StructureSpec {
    pub fn new(sections: Vec<SectionSpec>) -> Self {
        Self { sections }
    }

    /// Total number of sections at every depth.
    pub fn len(&self) -> usize {
        fn count(sections: &[SectionSpec]) -> usize {
            sections.iter().map(|s| 1 + count(&s.children)).sum()
        }
        count(&self.sections)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("structure spec contains no sections".to_string());
        }
        for planned in self.creation_order() {
            if planned.section.title.trim().is_empty() {
                return Err(format!(
                    "section at order index {} has an empty title",
                    planned.section.order_index
                ));
            }
        }
        Ok(())
    }

    /// Pre-order walk, siblings in ascending `order_index` (stable for ties).
    pub fn creation_order(&self) -> Vec<PlannedSection<'_>> {
        fn visit<'a>(
            sections: &'a [SectionSpec],
            parent_index: Option<usize>,
            out: &mut Vec<PlannedSection<'a>>,
        ) {
            let mut ordered: Vec<&SectionSpec> = sections.iter().collect();
            ordered.sort_by_key(|s| s.order_index);
            for section in ordered {
                let index = out.len();
                out.push(PlannedSection {
                    section,
                    parent_index,
                });
                visit(&section.children, Some(index), out);
            }
        }

        let mut out = Vec::with_capacity(self.len());
        visit(&self.sections, None, &mut out);
        out
    }
}

/// A node created in the primary store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureNode {
    pub primary_id: PrimaryId,
    pub parent_id: Option<PrimaryId>,
    pub title: String,
    pub content: String,
    pub field_kind: FieldKind,
    pub order_index: u32,
    pub expected_length: Option<u32>,
    pub correlation_id: CorrelationId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    LessonPlan,
    Exam,
}

impl WorkflowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowKind::LessonPlan => "lesson_plan",
            WorkflowKind::Exam => "exam",
        }
    }
}

/// Everything about a run that is not the structure itself: the container to create and
/// the domain context the AI job needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowContext {
    pub kind: WorkflowKind,
    pub container_name: String,
    #[serde(default)]
    pub container_description: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub book_id: Option<String>,
    #[serde(default)]
    pub lesson_ids: Vec<String>,
    pub requested_by: String,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WorkflowContext {
    pub fn new(
        kind: WorkflowKind,
        container_name: impl Into<String>,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            container_name: container_name.into(),
            container_description: String::new(),
            subject: None,
            book_id: None,
            lesson_ids: Vec::new(),
            requested_by: requested_by.into(),
            extra: serde_json::Map::new(),
        }
    }
}
