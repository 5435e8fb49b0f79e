use std::collections::BTreeMap;

use itertools::Itertools as _;

use crate::crd::{
    fleet_job::v1beta1::{FailedItemStatus, FleetJobStatus},
    node_report::v1beta1::{ItemPhase, NodeReport},
};

/// Rolls the [`NodeReport`]s of a fleet up into a single [`FleetJobStatus`].
///
/// Reports are keyed by node name. Adding a second report for the same node replaces the first
/// one. The output only depends on the set of reports, never on the order they were added in.
#[derive(Debug, Default)]
pub struct FleetJobStatusBuilder<'a> {
    reports: BTreeMap<&'a str, &'a NodeReport>,
}

impl<'a> FleetJobStatusBuilder<'a> {
    /// Adds `report` under its own name, which is the name of the node it belongs to.
    ///
    /// Reports without a name can't be attributed to a node and are skipped.
    pub fn add(&mut self, report: &'a NodeReport) {
        match report.metadata.name.as_deref() {
            Some(node) if !node.is_empty() => self.add_for_node(node, report),
            _ => tracing::warn!(
                desired = report.desired_count(),
                "skipping node report without a name"
            ),
        }
    }

    pub fn add_for_node(&mut self, node: &'a str, report: &'a NodeReport) {
        self.reports.insert(node, report);
    }

    /// Computes the status for a job declaring `declared_items`.
    ///
    /// Reports which don't mention an item, or nodes which didn't report at all, contribute
    /// nothing. Tags without an observed status count as pending.
    pub fn build(&self, declared_items: &[String]) -> FleetJobStatus {
        let declared_items: Vec<&str> =
            declared_items.iter().map(String::as_str).unique().collect();

        let mut desired = 0;
        let mut completed = 0;
        let mut succeeded = 0;
        let mut failures: BTreeMap<&str, Vec<Failure<'_>>> = BTreeMap::new();

        for (&node, &report) in &self.reports {
            for item in &declared_items {
                let Some(spec) = report.spec.items.get(*item) else {
                    continue;
                };

                for tag in &spec.tags {
                    desired += 1;

                    let status = report.tag_status(item, &tag.tag);
                    match status.map_or(ItemPhase::Pending, |status| status.phase) {
                        ItemPhase::Succeeded => {
                            completed += 1;
                            succeeded += 1;
                        }
                        ItemPhase::Failed => {
                            completed += 1;
                            failures.entry(*item).or_default().push(Failure {
                                node,
                                tag: &tag.tag,
                                message: status.and_then(|status| status.message.as_deref()),
                            });
                        }
                        ItemPhase::Pending | ItemPhase::Pulling => {}
                    }
                }
            }
        }

        let failed_item_statuses = declared_items
            .iter()
            .filter_map(|item| {
                let failures = failures.get_mut(item)?;
                Some(FailedItemStatus {
                    job_ref: None,
                    item_name: (*item).to_owned(),
                    message: failure_message(failures),
                })
            })
            .collect();

        tracing::debug!(
            desired,
            completed,
            succeeded,
            nodes = self.reports.len(),
            "aggregated node reports"
        );

        FleetJobStatus {
            start_time: None,
            completion_time: None,
            desired,
            active: desired - completed,
            completed,
            succeeded,
            failed_item_statuses,
        }
    }
}

/// Aggregates `reports`, keyed by node name, into the status of a job declaring `declared_items`.
///
/// See [`FleetJobStatusBuilder`] for the exact semantics.
#[tracing::instrument(skip_all, fields(items = declared_items.len()))]
pub fn aggregate<'a, I>(declared_items: &[String], reports: I) -> FleetJobStatus
where
    I: IntoIterator<Item = (&'a str, &'a NodeReport)>,
{
    let mut builder = FleetJobStatusBuilder::default();
    for (node, report) in reports {
        builder.add_for_node(node, report);
    }

    builder.build(declared_items)
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Failure<'a> {
    node: &'a str,
    tag: &'a str,
    message: Option<&'a str>,
}

fn failure_message(failures: &mut [Failure<'_>]) -> String {
    failures.sort();

    let nodes = failures.iter().map(|failure| failure.node).dedup().count();
    let details = failures
        .iter()
        .map(|failure| match failure.message {
            Some(message) => format!(
                "{node}:{tag} ({message})",
                node = failure.node,
                tag = failure.tag
            ),
            None => format!("{node}:{tag}", node = failure.node, tag = failure.tag),
        })
        .join(", ");

    format!("failed on {nodes} node(s): {details}")
}
