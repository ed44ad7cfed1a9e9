//! Trace text → usage marks and formation blocks.
//!
//! ```text
//! The schema registry [node_schema: very useful] settled it.
//!
//! [NODE_FORMATION: Principle]
//! name: "schema_as_truth"
//! principle_statement: "The registry is authoritative"
//! confidence: 0.9
//!
//! [LINK_FORMATION: ENABLES]
//! source: "schema_as_truth"
//! target: "generated_docs"
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use substrate_core::errors::TraceError;
use substrate_core::signals::CycleSignals;
use substrate_core::{SubstrateResult, UsefulnessLevel};

static MARK: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\[([a-zA-Z0-9_]+):\s*(very useful|useful|somewhat useful|not useful|misleading)\]")
        .ok()
});

static HEADER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*\[(NODE_FORMATION|LINK_FORMATION):\s*([A-Za-z0-9_ ]+)\]\s*$").ok());

static FIELD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*:\s*(.*?)\s*$").ok());

#[derive(Debug, Clone, PartialEq)]
pub struct UsageMark {
    pub record_id: String,
    pub level: UsefulnessLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeFormation {
    /// Normalised type name (`Principle` → `principle`).
    pub type_name: String,
    pub fields: BTreeMap<String, String>,
    /// 1-based line of the header.
    pub line: usize,
}

impl NodeFormation {
    /// The node id: the `name` field.
    pub fn id(&self) -> &str {
        self.fields.get("name").map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkFormation {
    pub type_name: String,
    pub fields: BTreeMap<String, String>,
    pub line: usize,
}

impl LinkFormation {
    pub fn source(&self) -> &str {
        self.fields.get("source").map(String::as_str).unwrap_or_default()
    }

    pub fn target(&self) -> &str {
        self.fields.get("target").map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTrace {
    pub marks: Vec<UsageMark>,
    pub node_formations: Vec<NodeFormation>,
    pub link_formations: Vec<LinkFormation>,
}

impl ParsedTrace {
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty() && self.node_formations.is_empty() && self.link_formations.is_empty()
    }

    /// Add every mark's delta to the cycle's per-record sums.
    pub fn record_marks(&self, signals: &mut CycleSignals) {
        for mark in &self.marks {
            signals.add_mark(mark.record_id.clone(), mark.level.delta());
        }
    }
}

/// `Principle` → `principle`, `ENABLES` → `enables`, `Personal Goal` → `personal_goal`.
fn normalise_type(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

fn unquote(value: &str) -> String {
    let v = value.trim();
    let stripped = v
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| v.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));
    stripped.unwrap_or(v).to_string()
}

enum BlockKind {
    Node,
    Link,
}

struct OpenBlock {
    kind: BlockKind,
    type_name: String,
    line: usize,
    fields: BTreeMap<String, String>,
}

fn close_block(block: OpenBlock, parsed: &mut ParsedTrace) -> Result<(), TraceError> {
    if block.fields.is_empty() {
        return Err(TraceError::MalformedBlock {
            line: block.line,
            reason: "formation block has no fields".to_string(),
        });
    }
    match block.kind {
        BlockKind::Node => {
            if block.fields.get("name").map_or(true, |n| n.is_empty()) {
                return Err(TraceError::MalformedBlock {
                    line: block.line,
                    reason: "node formation needs a `name`".to_string(),
                });
            }
            parsed.node_formations.push(NodeFormation {
                type_name: block.type_name,
                fields: block.fields,
                line: block.line,
            });
        }
        BlockKind::Link => {
            for required in ["source", "target"] {
                if block.fields.get(required).map_or(true, |v| v.is_empty()) {
                    return Err(TraceError::MalformedBlock {
                        line: block.line,
                        reason: format!("link formation needs a `{required}`"),
                    });
                }
            }
            parsed.link_formations.push(LinkFormation {
                type_name: block.type_name,
                fields: block.fields,
                line: block.line,
            });
        }
    }
    Ok(())
}

/// Parse a trace. Marks anywhere in the text are collected; a formation
/// block runs from its header to the next blank line or header.
pub fn parse_trace(text: &str) -> SubstrateResult<ParsedTrace> {
    let (Some(mark_re), Some(header_re), Some(field_re)) =
        (MARK.as_ref(), HEADER.as_ref(), FIELD.as_ref())
    else {
        return Err(TraceError::MalformedBlock {
            line: 0,
            reason: "trace patterns failed to compile".to_string(),
        }
        .into());
    };

    let mut parsed = ParsedTrace::default();
    let mut open: Option<OpenBlock> = None;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;

        if let Some(caps) = header_re.captures(line) {
            if let Some(block) = open.take() {
                close_block(block, &mut parsed)?;
            }
            let kind = if &caps[1] == "NODE_FORMATION" {
                BlockKind::Node
            } else {
                BlockKind::Link
            };
            open = Some(OpenBlock {
                kind,
                type_name: normalise_type(&caps[2]),
                line: line_no,
                fields: BTreeMap::new(),
            });
            continue;
        }

        if let Some(block) = open.as_mut() {
            if line.trim().is_empty() {
                if let Some(block) = open.take() {
                    close_block(block, &mut parsed)?;
                }
                continue;
            }
            if let Some(caps) = field_re.captures(line) {
                block.fields.insert(caps[1].to_string(), unquote(&caps[2]));
                continue;
            }
        }

        for caps in mark_re.captures_iter(line) {
            if let Some(level) = UsefulnessLevel::parse_loose(&caps[2]) {
                parsed.marks.push(UsageMark {
                    record_id: caps[1].to_string(),
                    level,
                });
            }
        }
    }
    if let Some(block) = open.take() {
        close_block(block, &mut parsed)?;
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_stripped() {
        assert_eq!(unquote("\"a b\""), "a b");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("0.9"), "0.9");
    }

    #[test]
    fn type_names_are_normalised() {
        assert_eq!(normalise_type("Principle"), "principle");
        assert_eq!(normalise_type("JUSTIFIED_BY"), "justified_by");
        assert_eq!(normalise_type("Personal Goal"), "personal_goal");
    }
}
