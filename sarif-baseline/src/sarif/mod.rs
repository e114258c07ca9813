//! The subset of the SARIF 2.1.0 object model the baseliner reads and writes.
//!
//! Only members relevant to result matching are modelled. Unknown members
//! are dropped on input; nothing here validates a log against the schema.

mod flows;
mod log;
mod result;

pub use flows::{
    CodeFlow, Edge, EdgeTraversal, Graph, GraphTraversal, Node, Stack, StackFrame, ThreadFlow,
    ThreadFlowLocation,
};
pub use log::{
    Artifact, Invocation, ReportingDescriptor, Run, RunAutomationDetails, SarifLog, Tool,
    ToolComponent, VersionControlDetails,
};
pub use result::{
    ArtifactContent, ArtifactLocation, BaselineState, Location, LogicalLocation, Message,
    PhysicalLocation, Region, ResultProvenance, SarifResult,
};

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::Result;

/// A SARIF property bag.
pub type PropertyBag = std::collections::BTreeMap<String, serde_json::Value>;

/// Reads a SARIF log from a JSON file.
pub fn load_log(path: impl AsRef<Path>) -> Result<SarifLog> {
    let file = File::open(path.as_ref())?;
    let log = serde_json::from_reader(BufReader::new(file))?;
    Ok(log)
}

/// Parses a SARIF log from a JSON string.
pub fn parse_log(json: &str) -> Result<SarifLog> {
    Ok(serde_json::from_str(json)?)
}

/// Writes a SARIF log as pretty-printed JSON.
pub fn save_log(log: &SarifLog, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), log)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_log() {
        let json = r#"{
            "version": "2.1.0",
            "runs": [{
                "tool": { "driver": { "name": "lint" } },
                "results": [{
                    "ruleId": "R1",
                    "message": { "text": "bad thing" },
                    "partialFingerprints": { "primaryLocationLineHash": "abc" },
                    "baselineState": "unchanged",
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": { "uri": "src/a.c" },
                            "region": { "startLine": 3 },
                            "contextRegion": { "startLine": 2, "snippet": { "text": "int x;" } }
                        }
                    }]
                }]
            }]
        }"#;

        let log = parse_log(json).unwrap();
        assert_eq!(log.runs.len(), 1);
        assert_eq!(log.runs[0].tool.driver.name, "lint");

        let result = &log.runs[0].results[0];
        assert_eq!(result.rule_id.as_deref(), Some("R1"));
        assert_eq!(result.baseline_state, Some(BaselineState::Unchanged));
        assert_eq!(
            result.partial_fingerprints.get("primaryLocationLineHash"),
            Some(&"abc".to_string())
        );

        let physical = result.locations[0].physical_location.as_ref().unwrap();
        assert_eq!(physical.region.as_ref().unwrap().start_line, Some(3));
        assert_eq!(physical.context_snippet(), Some("int x;"));
    }

    #[test]
    fn test_serialize_skips_empty_members() {
        let log = SarifLog::new(vec![Run::new(Tool::named("lint"))]);
        let json = serde_json::to_value(&log).unwrap();

        assert_eq!(json["version"], "2.1.0");
        let run = &json["runs"][0];
        assert!(run.get("artifacts").is_none());
        assert!(run.get("baselineGuid").is_none());
        assert_eq!(run["results"], serde_json::json!([]));
    }

    #[test]
    fn test_unknown_members_are_ignored() {
        let json = r#"{
            "version": "2.1.0",
            "runs": [{
                "tool": { "driver": { "name": "lint", "organization": "acme" } },
                "columnKind": "utf16CodeUnits",
                "results": []
            }]
        }"#;

        let log = parse_log(json).unwrap();
        assert!(log.runs[0].results.is_empty());
    }
}
