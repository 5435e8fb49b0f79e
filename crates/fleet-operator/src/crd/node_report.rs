//! The [`NodeReport`](v1beta1::NodeReport) custom resource.
//!
//! Every node of the fleet owns exactly one report, named after the node. The agent running on
//! the node writes the status, other writers only ever touch the spec.

pub mod v1beta1 {
    use std::collections::BTreeMap;

    use jiff::Timestamp;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use kube::CustomResource;
    use schemars::JsonSchema;
    use serde::{Deserialize, Deserializer, Serialize};

    /// The images a single node should pull and how far it got.
    #[derive(
        Clone, CustomResource, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize,
    )]
    #[kube(
        group = "apps.fleet.dev",
        version = "v1beta1",
        kind = "NodeReport",
        status = "NodeReportStatus",
        shortname = "nr",
        derive = "PartialEq"
    )]
    #[serde(rename_all = "camelCase")]
    pub struct NodeReportSpec {
        /// Images to pull on this node, keyed by image name.
        #[serde(default)]
        pub items: BTreeMap<String, ItemSpec>,
    }

    #[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ItemSpec {
        #[serde(default)]
        pub tags: Vec<TagSpec>,
    }

    #[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TagSpec {
        pub tag: String,

        /// Bumped whenever the tag should be pulled again.
        #[serde(default)]
        pub version: i64,
    }

    #[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NodeReportStatus {
        #[serde(default)]
        pub desired: i32,

        #[serde(default)]
        pub succeeded: i32,

        #[serde(default)]
        pub failed: i32,

        #[serde(default)]
        pub pulling: i32,

        #[serde(default)]
        pub item_statuses: BTreeMap<String, ItemStatus>,
    }

    #[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ItemStatus {
        #[serde(default)]
        pub tags: Vec<TagStatus>,
    }

    #[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TagStatus {
        pub tag: String,

        /// Phases this version doesn't know are read as [`ItemPhase::Pending`].
        #[serde(default, deserialize_with = "phase_or_pending")]
        #[schemars(with = "ItemPhase")]
        pub phase: ItemPhase,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub completion_time: Option<Time>,

        /// The spec version this status was observed for.
        #[serde(default)]
        pub version: i64,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub message: Option<String>,
    }

    #[derive(
        Clone,
        Copy,
        Debug,
        Default,
        Deserialize,
        Eq,
        JsonSchema,
        PartialEq,
        Serialize,
        strum::Display,
        strum::EnumString,
    )]
    pub enum ItemPhase {
        #[default]
        Pending,
        Pulling,
        Succeeded,
        Failed,
    }

    fn phase_or_pending<'de, D>(deserializer: D) -> Result<ItemPhase, D::Error>
    where
        D: Deserializer<'de>,
    {
        let phase = match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(phase) => phase.parse().ok(),
            _ => None,
        };

        Ok(phase.unwrap_or_else(|| {
            tracing::warn!("unknown item phase in node report, treating it as pending");
            ItemPhase::Pending
        }))
    }

    impl ItemPhase {
        pub fn is_terminal(self) -> bool {
            matches!(self, Self::Succeeded | Self::Failed)
        }
    }

    impl NodeReport {
        /// Number of tags declared in the spec, across all items.
        pub fn desired_count(&self) -> i32 {
            self.spec.items.values().map(|item| item.tags.len() as i32).sum()
        }

        /// Returns the observed status of `tag` of `item`.
        ///
        /// Statuses which were observed for an older version of the tag spec are stale and
        /// treated as not observed at all.
        pub fn tag_status(&self, item: &str, tag: &str) -> Option<&TagStatus> {
            let spec_version = self
                .spec
                .items
                .get(item)
                .and_then(|item| item.tags.iter().find(|t| t.tag == tag))
                .map_or(0, |t| t.version);

            self.status
                .as_ref()?
                .item_statuses
                .get(item)?
                .tags
                .iter()
                .find(|t| t.tag == tag && t.version >= spec_version)
        }

        /// Returns the phase of `tag` of `item`. Tags without an observed status are
        /// [`ItemPhase::Pending`].
        pub fn phase_of(&self, item: &str, tag: &str) -> ItemPhase {
            self.tag_status(item, tag)
                .map_or(ItemPhase::Pending, |status| status.phase)
        }

        /// Marks every tag declared in the spec as [`ItemPhase::Failed`] with `message`.
        ///
        /// Used when the node stopped responding, so that a fleet job doesn't wait for it forever.
        pub fn mark_all_failed(&mut self, message: &str, now: Timestamp) {
            let mut status = self.status.take().unwrap_or_default();

            status.item_statuses = self
                .spec
                .items
                .iter()
                .map(|(name, item)| {
                    let tags = item
                        .tags
                        .iter()
                        .map(|tag| TagStatus {
                            tag: tag.tag.clone(),
                            phase: ItemPhase::Failed,
                            completion_time: Some(Time(now)),
                            version: tag.version,
                            message: Some(message.to_owned()),
                        })
                        .collect();

                    (name.clone(), ItemStatus { tags })
                })
                .collect();

            self.status = Some(status);
            self.recount();
        }

        /// Recomputes the counters of the status from the spec and the observed tag statuses.
        pub fn recount(&mut self) {
            let (mut succeeded, mut failed, mut pulling) = (0, 0, 0);

            for (item, spec) in &self.spec.items {
                for tag in &spec.tags {
                    match self.phase_of(item, &tag.tag) {
                        ItemPhase::Succeeded => succeeded += 1,
                        ItemPhase::Failed => failed += 1,
                        ItemPhase::Pulling => pulling += 1,
                        ItemPhase::Pending => {}
                    }
                }
            }

            let desired = self.desired_count();
            let status = self.status.get_or_insert_with(NodeReportStatus::default);
            status.desired = desired;
            status.succeeded = succeeded;
            status.failed = failed;
            status.pulling = pulling;
        }
    }
}
