//! Result records and their locations.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::flows::{CodeFlow, Graph, GraphTraversal, Stack};
use super::PropertyBag;

/// Classification of a result relative to a baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaselineState {
    /// Present in the current run only.
    New,
    /// Present in both runs with the same rule, message and level.
    Unchanged,
    /// Present in both runs but with a changed rule, message or level.
    Updated,
    /// Present in the baseline run only.
    Absent,
}

impl BaselineState {
    /// All states, in reporting order.
    pub const ALL: [BaselineState; 4] = [
        BaselineState::New,
        BaselineState::Unchanged,
        BaselineState::Updated,
        BaselineState::Absent,
    ];

    /// Returns the SARIF spelling of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            BaselineState::New => "new",
            BaselineState::Unchanged => "unchanged",
            BaselineState::Updated => "updated",
            BaselineState::Absent => "absent",
        }
    }
}

impl fmt::Display for BaselineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message string, either inline or by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Message {
    /// Creates a plain-text message.
    pub fn text(text: impl Into<String>) -> Self {
        Message {
            text: Some(text.into()),
            id: None,
        }
    }
}

/// A reference to an artifact, by URI or by index into `run.artifacts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_base_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
}

impl ArtifactLocation {
    /// Creates a location holding an inline URI.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        ArtifactLocation {
            uri: Some(uri.into()),
            ..Default::default()
        }
    }

    /// Creates a location that refers to `run.artifacts[index]`.
    pub fn from_index(index: i64) -> Self {
        ArtifactLocation {
            index: Some(index),
            ..Default::default()
        }
    }
}

/// Literal artifact content, used for snippets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A region within an artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<ArtifactContent>,
}

impl Region {
    /// Creates a region covering a single line.
    pub fn line(line: u32) -> Self {
        Region {
            start_line: Some(line),
            ..Default::default()
        }
    }

    /// Attaches snippet text to the region.
    pub fn with_snippet(mut self, text: impl Into<String>) -> Self {
        self.snippet = Some(ArtifactContent {
            text: Some(text.into()),
        });
        self
    }
}

/// A physical location: an artifact plus regions within it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_location: Option<ArtifactLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    /// Surrounding source captured at scan time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_region: Option<Region>,
}

impl PhysicalLocation {
    /// Returns the context region's snippet text, if captured.
    pub fn context_snippet(&self) -> Option<&str> {
        self.context_region
            .as_ref()?
            .snippet
            .as_ref()?
            .text
            .as_deref()
    }
}

/// A logical location such as a function or namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
}

/// A location a result refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_location: Option<PhysicalLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logical_locations: Vec<LogicalLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

impl Location {
    /// Creates a location pointing at `uri` with the given region.
    pub fn physical(uri: impl Into<String>, region: Region) -> Self {
        Location {
            physical_location: Some(PhysicalLocation {
                artifact_location: Some(ArtifactLocation::from_uri(uri)),
                region: Some(region),
                context_region: None,
            }),
            ..Default::default()
        }
    }

    /// Attaches a context region to the physical location.
    pub fn with_context(mut self, context: Region) -> Self {
        self.physical_location
            .get_or_insert_with(PhysicalLocation::default)
            .context_region = Some(context);
        self
    }

    /// Returns the artifact location, if this is a physical location.
    pub fn artifact_location(&self) -> Option<&ArtifactLocation> {
        self.physical_location.as_ref()?.artifact_location.as_ref()
    }
}

/// Detection history of a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultProvenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_detection_time_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_detection_time_utc: Option<DateTime<Utc>>,
}

/// A single finding reported by an analysis tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default)]
    pub message: Message,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub partial_fingerprints: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fingerprints: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacks: Option<Vec<Stack>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_flows: Option<Vec<CodeFlow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphs: Option<Vec<Graph>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_traversals: Option<Vec<GraphTraversal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_state: Option<BaselineState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<ResultProvenance>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyBag,
}

impl SarifResult {
    /// Creates a result for `rule_id` with a plain-text message.
    pub fn new(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        SarifResult {
            rule_id: Some(rule_id.into()),
            message: Message::text(message),
            ..Default::default()
        }
    }

    /// Appends a location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Adds a partial fingerprint entry.
    pub fn with_partial_fingerprint(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.partial_fingerprints.insert(key.into(), value.into());
        self
    }

    /// Returns the level, applying the SARIF default when absent.
    pub fn effective_level(&self) -> &str {
        self.level
            .as_deref()
            .unwrap_or(crate::constants::DEFAULT_LEVEL)
    }
}
