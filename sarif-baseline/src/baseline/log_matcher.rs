//! Baselining whole SARIF logs.
//!
//! `SarifLogMatcher` groups the runs of any number of baseline and current
//! logs by tool, baselines each tool separately and writes one output run per
//! tool. Output locations carry explicit URIs so the results stay meaningful
//! without the artifact tables of the runs they came from.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::{BaselineConfig, PropertyBagMergeBehavior};
use crate::extracted::{resolve_artifact_uri, ExtractedResult};
use crate::sarif::{ArtifactLocation, Location, ReportingDescriptor, Run, SarifLog, SarifResult};

use super::annotate::annotate;
use super::{Baseliner, MatchLog};

/// Baselines sets of logs against each other.
#[derive(Debug, Clone, Default)]
pub struct SarifLogMatcher {
    baseliner: Baseliner,
}

impl SarifLogMatcher {
    pub fn new(config: BaselineConfig) -> Self {
        SarifLogMatcher {
            baseliner: Baseliner::new(config),
        }
    }

    /// Baselines `current_logs` against `baseline_logs`.
    pub fn match_logs(&self, baseline_logs: &[SarifLog], current_logs: &[SarifLog]) -> SarifLog {
        self.match_logs_with_stats(baseline_logs, current_logs).0
    }

    /// Like [`match_logs`](Self::match_logs), also returning the statistics
    /// summed over every tool.
    pub fn match_logs_with_stats(
        &self,
        baseline_logs: &[SarifLog],
        current_logs: &[SarifLog],
    ) -> (SarifLog, MatchLog) {
        let baseline_runs: Vec<&Run> = baseline_logs.iter().flat_map(|log| &log.runs).collect();
        let current_runs: Vec<&Run> = current_logs.iter().flat_map(|log| &log.runs).collect();
        let now = Utc::now();

        let mut runs = Vec::new();
        let mut total = MatchLog::new();
        for tool in tool_names(&baseline_runs, &current_runs) {
            let baseline: Vec<&Run> = runs_for(&baseline_runs, tool);
            let current: Vec<&Run> = runs_for(&current_runs, tool);
            info!(
                tool,
                baseline_runs = baseline.len(),
                current_runs = current.len(),
                "baselining tool"
            );

            let (run, match_log) = self.match_tool(&baseline, &current, now);
            total.merge(&match_log);
            if let Some(run) = run {
                runs.push(run);
            }
        }

        (SarifLog::new(runs), total)
    }

    fn match_tool(
        &self,
        baseline: &[&Run],
        current: &[&Run],
        now: DateTime<Utc>,
    ) -> (Option<Run>, MatchLog) {
        let outcome = self
            .baseliner
            .baseline(baseline.iter().copied(), current.iter().copied());

        let Some(template) = current.first().or(baseline.first()) else {
            return (None, outcome.match_log().clone());
        };

        let mut run = Run::new(template.tool.clone());
        merge_rules(
            &mut run.tool.driver.rules,
            current.iter().chain(baseline.iter()).copied(),
        );

        run.results = outcome
            .entries()
            .iter()
            .filter_map(|entry| {
                let source = entry.result()?;
                let mut result = annotate(entry, now)?;
                flatten(&mut result, source);
                Some(result)
            })
            .collect();

        run.baseline_guid = baseline
            .first()
            .and_then(|run| run.automation_guid())
            .map(str::to_string);
        if let [only] = current {
            run.automation_details = only.automation_details.clone();
        }
        for source in current {
            run.invocations.extend(source.invocations.iter().cloned());
            run.graphs.extend(source.graphs.iter().cloned());
            for details in &source.version_control_provenance {
                if !run.version_control_provenance.contains(details) {
                    run.version_control_provenance.push(details.clone());
                }
            }
        }

        let property_source = match self.baseliner.config().property_bag_merge {
            PropertyBagMergeBehavior::MostRecent => current.last().or(baseline.last()),
            PropertyBagMergeBehavior::Oldest => baseline.first().or(current.first()),
        };
        if let Some(source) = property_source {
            run.properties = source.properties.clone();
        }

        (Some(run), outcome.match_log().clone())
    }
}

/// Tool names in first-seen order, baseline runs first.
fn tool_names<'r>(baseline: &[&'r Run], current: &[&'r Run]) -> Vec<&'r str> {
    let mut names: Vec<&'r str> = Vec::new();
    for run in baseline.iter().chain(current.iter()) {
        let name = run.tool.driver.name.as_str();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn runs_for<'r>(runs: &[&'r Run], tool: &str) -> Vec<&'r Run> {
    runs.iter()
        .copied()
        .filter(|run| run.tool.driver.name == tool)
        .collect()
}

fn merge_rules<'r>(rules: &mut Vec<ReportingDescriptor>, runs: impl Iterator<Item = &'r Run>) {
    for run in runs {
        for rule in &run.tool.driver.rules {
            if !rules.iter().any(|existing| existing.id == rule.id) {
                rules.push(rule.clone());
            }
        }
    }
}

/// Rewrites `result` so it no longer depends on its source run's tables.
fn flatten(result: &mut SarifResult, source: &ExtractedResult<'_>) {
    result.rule_id = source.rule_id().map(str::to_string);
    result.rule_index = None;

    let run = source.run();
    for location in result
        .locations
        .iter_mut()
        .chain(result.related_locations.iter_mut())
    {
        flatten_location(location, run);
    }
}

fn flatten_location(location: &mut Location, run: &Run) {
    let Some(artifact) = location
        .physical_location
        .as_mut()
        .and_then(|physical| physical.artifact_location.as_mut())
    else {
        return;
    };
    *artifact = match resolve_artifact_uri(artifact, run) {
        Ok(Some(uri)) => ArtifactLocation::from_uri(uri),
        // Keep whatever inline URI there is; the index would dangle.
        _ => ArtifactLocation {
            uri: artifact.uri.clone(),
            uri_base_id: artifact.uri_base_id.clone(),
            index: None,
        },
    };
}
