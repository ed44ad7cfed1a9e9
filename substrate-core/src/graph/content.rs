use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::temporal::truncate_millis;

/// Type-specific node content. One variant per node type; `Generic`
/// carries open-ended types whose attributes are stored as a JSON blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum NodeContent {
    Memory {
        occurred_at: DateTime<Utc>,
        participants: Vec<String>,
    },
    Concept {
        definition: String,
    },
    Principle {
        principle_statement: String,
        why_it_matters: String,
    },
    Realization {
        what_i_realized: String,
        context_when_discovered: String,
    },
    Task {
        priority: String,
        estimated_hours: f64,
        steps: Vec<String>,
    },
    Goal {
        goal_description: String,
        target_date: Option<DateTime<Utc>>,
    },
    Person {
        role: String,
        relationship_type: String,
    },
    Mechanism {
        how_it_works: String,
        inputs: Vec<String>,
        outputs: Vec<String>,
    },
    Generic {
        type_name: String,
        attributes: BTreeMap<String, serde_json::Value>,
    },
}

impl NodeContent {
    /// Type names owned by a dedicated variant.
    pub const BUILTIN_TYPES: &'static [&'static str] = &[
        "memory",
        "concept",
        "principle",
        "realization",
        "task",
        "goal",
        "person",
        "mechanism",
    ];

    pub fn type_name(&self) -> &str {
        match self {
            NodeContent::Memory { .. } => "memory",
            NodeContent::Concept { .. } => "concept",
            NodeContent::Principle { .. } => "principle",
            NodeContent::Realization { .. } => "realization",
            NodeContent::Task { .. } => "task",
            NodeContent::Goal { .. } => "goal",
            NodeContent::Person { .. } => "person",
            NodeContent::Mechanism { .. } => "mechanism",
            NodeContent::Generic { type_name, .. } => type_name,
        }
    }

    /// Content fields a formation must supply for this type to count as complete.
    pub fn required_fields(type_name: &str) -> &'static [&'static str] {
        match type_name {
            "memory" => &["participants"],
            "concept" => &["definition"],
            "principle" => &["principle_statement", "why_it_matters"],
            "realization" => &["what_i_realized", "context_when_discovered"],
            "task" => &["priority", "estimated_hours"],
            "goal" => &["goal_description"],
            "person" => &["role"],
            "mechanism" => &["how_it_works", "inputs", "outputs"],
            _ => &[],
        }
    }

    /// Timestamps inside the content, truncated to stored precision.
    pub fn with_millisecond_precision(self) -> Self {
        match self {
            NodeContent::Memory {
                occurred_at,
                participants,
            } => NodeContent::Memory {
                occurred_at: truncate_millis(occurred_at),
                participants,
            },
            NodeContent::Goal {
                goal_description,
                target_date,
            } => NodeContent::Goal {
                goal_description,
                target_date: target_date.map(truncate_millis),
            },
            other => other,
        }
    }
}

/// Link type with its type-specific content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum LinkKind {
    Enables {
        enabling_type: String,
        degree_of_necessity: String,
    },
    Blocks {
        blocking_condition: String,
        severity: f64,
    },
    RelatesTo {
        relationship_strength: String,
    },
    Requires {
        requirement_criticality: String,
    },
    Suppresses {
        suppression_mechanism: String,
    },
    JustifiedBy {
        justification_type: String,
        justification_strength: String,
    },
    Generic {
        type_name: String,
        attributes: BTreeMap<String, serde_json::Value>,
    },
}

impl LinkKind {
    pub const BUILTIN_TYPES: &'static [&'static str] = &[
        "enables",
        "blocks",
        "relates_to",
        "requires",
        "suppresses",
        "justified_by",
    ];

    pub fn type_name(&self) -> &str {
        match self {
            LinkKind::Enables { .. } => "enables",
            LinkKind::Blocks { .. } => "blocks",
            LinkKind::RelatesTo { .. } => "relates_to",
            LinkKind::Requires { .. } => "requires",
            LinkKind::Suppresses { .. } => "suppresses",
            LinkKind::JustifiedBy { .. } => "justified_by",
            LinkKind::Generic { type_name, .. } => type_name,
        }
    }

    pub fn required_fields(type_name: &str) -> &'static [&'static str] {
        match type_name {
            "enables" => &["enabling_type", "degree_of_necessity"],
            "blocks" => &["blocking_condition"],
            "relates_to" => &["relationship_strength"],
            "requires" => &["requirement_criticality"],
            "suppresses" => &["suppression_mechanism"],
            "justified_by" => &["justification_type"],
            _ => &[],
        }
    }

    /// Plain relation with no extra content.
    pub fn relates_to() -> Self {
        LinkKind::RelatesTo {
            relationship_strength: String::new(),
        }
    }
}
