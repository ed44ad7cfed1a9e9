use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Implements the string round-trip every stored enum needs:
/// `as_str`, `parse`, `ALL`, and `Display`.
macro_rules! stored_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Parse the stored string form.
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Which level of the graph a record belongs to. Part of the cohort key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    Personal,
    Organizational,
    Ecosystem,
}

stored_enum!(Scope {
    Personal => "personal",
    Organizational => "organizational",
    Ecosystem => "ecosystem",
});

/// How a record came to exist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FormationTrigger {
    #[default]
    DirectExperience,
    Inference,
    ExternalInput,
    TraversalDiscovery,
    SystematicAnalysis,
    SpontaneousInsight,
    AutomatedRecognition,
    CollectiveDeliberation,
}

stored_enum!(FormationTrigger {
    DirectExperience => "direct_experience",
    Inference => "inference",
    ExternalInput => "external_input",
    TraversalDiscovery => "traversal_discovery",
    SystematicAnalysis => "systematic_analysis",
    SpontaneousInsight => "spontaneous_insight",
    AutomatedRecognition => "automated_recognition",
    CollectiveDeliberation => "collective_deliberation",
});

/// Level attached to a usage mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsefulnessLevel {
    VeryUseful,
    Useful,
    SomewhatUseful,
    NotUseful,
    Misleading,
}

stored_enum!(UsefulnessLevel {
    VeryUseful => "very_useful",
    Useful => "useful",
    SomewhatUseful => "somewhat_useful",
    NotUseful => "not_useful",
    Misleading => "misleading",
});

impl UsefulnessLevel {
    /// Fixed numeric delta fed into the reinforcement EMA.
    pub fn delta(&self) -> f64 {
        match self {
            UsefulnessLevel::VeryUseful => constants::MARK_VERY_USEFUL,
            UsefulnessLevel::Useful => constants::MARK_USEFUL,
            UsefulnessLevel::SomewhatUseful => constants::MARK_SOMEWHAT_USEFUL,
            UsefulnessLevel::NotUseful => constants::MARK_NOT_USEFUL,
            UsefulnessLevel::Misleading => constants::MARK_MISLEADING,
        }
    }

    /// Accepts both `very useful` and `very_useful`, any case.
    pub fn parse_loose(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::parse(&normalized)
    }
}

/// Entity kind. Functional entities are curated and exempt from lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Functional,
    Emergent,
    Semantic,
}

stored_enum!(EntityKind {
    Functional => "functional",
    Emergent => "emergent",
    Semantic => "semantic",
});

/// Entity lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityState {
    #[default]
    Runtime,
    Provisional,
    Mature,
    Dissolved,
}

stored_enum!(StabilityState {
    Runtime => "runtime",
    Provisional => "provisional",
    Mature => "mature",
    Dissolved => "dissolved",
});

/// The three record families stored in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Node,
    Link,
    Entity,
}

stored_enum!(RecordKind {
    Node => "node",
    Link => "link",
    Entity => "entity",
});
