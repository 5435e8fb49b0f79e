use fleet_versioned::{
    ConversionError, Convertible, EnumRemap, EnumRemapError, PrecedenceRule, PrecedenceRules,
    UnmappableEnumValueSnafu, convert_list, try_convert_list,
};
use snafu::ResultExt as _;

use crate::crd::workload::{WorkloadVersion, v1alpha1, v1beta1};

/// Objects carrying this label with the value `"true"` always exclude pods which are about to be
/// deleted from the replica count once converted to `v1beta1`.
pub const EXCLUDE_PREPARING_DELETE_LABEL: &str = "apps.fleet.dev/scaling-exclude-preparing-delete";

/// Fields of a `v1beta1` [`WorkloadSpec`](v1beta1::WorkloadSpec) which can be forced by a
/// [`PrecedenceRule`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum ForcedField {
    /// Forces `spec.scaleStrategy.excludePreparingDelete` to `true`.
    ExcludePreparingDelete,
}

impl ForcedField {
    fn apply(self, spec: &mut v1beta1::WorkloadSpec) {
        match self {
            Self::ExcludePreparingDelete => spec.scale_strategy.exclude_preparing_delete = true,
        }
    }
}

pub type WorkloadPrecedenceRules = PrecedenceRules<ForcedField>;

/// Returns the rule set forcing `excludePreparingDelete` when `label_key` is set to `"true"`.
pub fn precedence_rules(label_key: impl Into<String>) -> WorkloadPrecedenceRules {
    [PrecedenceRule::new(
        label_key,
        "true",
        ForcedField::ExcludePreparingDelete,
    )]
    .into_iter()
    .collect()
}

/// Same as [`precedence_rules`] with [`EXCLUDE_PREPARING_DELETE_LABEL`].
pub fn default_precedence_rules() -> WorkloadPrecedenceRules {
    precedence_rules(EXCLUDE_PREPARING_DELETE_LABEL)
}

impl EnumRemap for v1alpha1::UpdateStrategyType {
    type Newer = v1beta1::UpdateStrategyType;

    const ENUM_NAME: &'static str = "UpdateStrategyType";
    const TABLE: &'static [(Self, Self::Newer)] = &[
        (Self::ReCreate, v1beta1::UpdateStrategyType::ReCreate),
        (
            Self::InPlaceIfPossible,
            v1beta1::UpdateStrategyType::InPlaceIfPossible,
        ),
        (Self::InPlaceOnly, v1beta1::UpdateStrategyType::InPlaceOnly),
    ];
}

impl EnumRemap for v1alpha1::WorkloadConditionType {
    type Newer = v1beta1::WorkloadConditionType;

    const ENUM_NAME: &'static str = "WorkloadConditionType";
    const TABLE: &'static [(Self, Self::Newer)] = &[
        (Self::FailedScale, v1beta1::WorkloadConditionType::FailedScale),
        (Self::FailedUpdate, v1beta1::WorkloadConditionType::FailedUpdate),
    ];
}

impl Convertible<v1beta1::Workload> for v1alpha1::Workload {
    type Error = ConversionError;
    type Options = WorkloadPrecedenceRules;

    fn to_hub(self, rules: &Self::Options) -> Result<v1beta1::Workload, Self::Error> {
        convert_up(self, rules)
    }

    fn from_hub(hub: v1beta1::Workload, _rules: &Self::Options) -> Result<Self, Self::Error> {
        convert_down(hub)
    }
}

/// Converts a `v1alpha1` [`Workload`](v1alpha1::Workload) into `v1beta1`.
///
/// The precedence `rules` are evaluated against the labels of `workload` before any field is
/// converted. The targets of all matching rules are forced on the converted spec afterwards,
/// regardless of the value the `v1alpha1` spec carried.
#[tracing::instrument(skip_all, fields(k8s.object.name = ?workload.metadata.name))]
pub fn convert_up(
    workload: v1alpha1::Workload,
    rules: &WorkloadPrecedenceRules,
) -> Result<v1beta1::Workload, ConversionError> {
    let forced: Vec<ForcedField> = rules
        .matching(workload.metadata.labels.as_ref())
        .copied()
        .collect();

    let mut spec = upgrade_spec(workload.spec).context(UnmappableEnumValueSnafu {
        target_version: WorkloadVersion::V1Beta1.as_api_version(),
    })?;

    for field in forced {
        tracing::debug!(%field, "forcing field because of precedence rule");
        field.apply(&mut spec);
    }

    let status = workload
        .status
        .map(upgrade_status)
        .transpose()
        .context(UnmappableEnumValueSnafu {
            target_version: WorkloadVersion::V1Beta1.as_api_version(),
        })?;

    Ok(v1beta1::Workload {
        metadata: workload.metadata,
        spec,
        status,
    })
}

/// Converts a `v1beta1` [`Workload`](v1beta1::Workload) into `v1alpha1`.
///
/// Forced fields are copied like any other field. The labels which caused them to be forced are
/// neither added nor removed.
#[tracing::instrument(skip_all, fields(k8s.object.name = ?workload.metadata.name))]
pub fn convert_down(workload: v1beta1::Workload) -> Result<v1alpha1::Workload, ConversionError> {
    let context = || UnmappableEnumValueSnafu {
        target_version: WorkloadVersion::V1Alpha1.as_api_version(),
    };

    let spec = downgrade_spec(workload.spec).with_context(|_| context())?;
    let status = workload
        .status
        .map(downgrade_status)
        .transpose()
        .with_context(|_| context())?;

    Ok(v1alpha1::Workload {
        metadata: workload.metadata,
        spec,
        status,
    })
}

fn upgrade_spec(spec: v1alpha1::WorkloadSpec) -> Result<v1beta1::WorkloadSpec, EnumRemapError> {
    let v1alpha1::ScaleStrategy {
        pods_to_delete,
        max_unavailable,
        disable_pvc_reuse,
        exclude_preparing_delete,
    } = spec.scale_strategy;

    let v1alpha1::UpdateStrategy {
        type_,
        partition,
        max_unavailable: update_max_unavailable,
        max_surge,
        paused,
        priority_strategy,
        scatter_strategy,
        in_place_update_strategy,
    } = spec.update_strategy;

    Ok(v1beta1::WorkloadSpec {
        replicas: spec.replicas,
        selector: spec.selector,
        template: spec.template,
        volume_claim_templates: spec.volume_claim_templates,
        revision_history_limit: spec.revision_history_limit,
        min_ready_seconds: spec.min_ready_seconds,
        scale_strategy: v1beta1::ScaleStrategy {
            pods_to_delete,
            max_unavailable,
            disable_pvc_reuse,
            exclude_preparing_delete,
        },
        update_strategy: v1beta1::UpdateStrategy {
            type_: type_.map(EnumRemap::upgrade).transpose()?,
            partition,
            max_unavailable: update_max_unavailable,
            max_surge,
            paused,
            priority_strategy,
            scatter_strategy: convert_list(scatter_strategy, |term| v1beta1::UpdateScatterTerm {
                key: term.key,
                value: term.value,
            }),
            in_place_update_strategy,
        },
        lifecycle: spec.lifecycle,
    })
}

fn downgrade_spec(spec: v1beta1::WorkloadSpec) -> Result<v1alpha1::WorkloadSpec, EnumRemapError> {
    let v1beta1::ScaleStrategy {
        pods_to_delete,
        max_unavailable,
        disable_pvc_reuse,
        exclude_preparing_delete,
    } = spec.scale_strategy;

    let v1beta1::UpdateStrategy {
        type_,
        partition,
        max_unavailable: update_max_unavailable,
        max_surge,
        paused,
        priority_strategy,
        scatter_strategy,
        in_place_update_strategy,
    } = spec.update_strategy;

    Ok(v1alpha1::WorkloadSpec {
        replicas: spec.replicas,
        selector: spec.selector,
        template: spec.template,
        volume_claim_templates: spec.volume_claim_templates,
        revision_history_limit: spec.revision_history_limit,
        min_ready_seconds: spec.min_ready_seconds,
        scale_strategy: v1alpha1::ScaleStrategy {
            pods_to_delete,
            max_unavailable,
            disable_pvc_reuse,
            exclude_preparing_delete,
        },
        update_strategy: v1alpha1::UpdateStrategy {
            type_: type_
                .map(v1alpha1::UpdateStrategyType::downgrade)
                .transpose()?,
            partition,
            max_unavailable: update_max_unavailable,
            max_surge,
            paused,
            priority_strategy,
            scatter_strategy: convert_list(scatter_strategy, |term| v1alpha1::UpdateScatterTerm {
                key: term.key,
                value: term.value,
            }),
            in_place_update_strategy,
        },
        lifecycle: spec.lifecycle,
    })
}

fn upgrade_status(
    status: v1alpha1::WorkloadStatus,
) -> Result<v1beta1::WorkloadStatus, EnumRemapError> {
    let conditions = try_convert_list(status.conditions, |condition| {
        Ok(v1beta1::WorkloadCondition {
            type_: condition.type_.upgrade()?,
            status: condition.status,
            last_transition_time: condition.last_transition_time,
            reason: condition.reason,
            message: condition.message,
        })
    })?;

    Ok(v1beta1::WorkloadStatus {
        observed_generation: status.observed_generation,
        replicas: status.replicas,
        ready_replicas: status.ready_replicas,
        available_replicas: status.available_replicas,
        updated_replicas: status.updated_replicas,
        updated_ready_replicas: status.updated_ready_replicas,
        updated_available_replicas: status.updated_available_replicas,
        expected_updated_replicas: status.expected_updated_replicas,
        update_revision: status.update_revision,
        current_revision: status.current_revision,
        collision_count: status.collision_count,
        conditions,
        label_selector: status.label_selector,
    })
}

fn downgrade_status(
    status: v1beta1::WorkloadStatus,
) -> Result<v1alpha1::WorkloadStatus, EnumRemapError> {
    let conditions = try_convert_list(status.conditions, |condition| {
        Ok(v1alpha1::WorkloadCondition {
            type_: v1alpha1::WorkloadConditionType::downgrade(condition.type_)?,
            status: condition.status,
            last_transition_time: condition.last_transition_time,
            reason: condition.reason,
            message: condition.message,
        })
    })?;

    Ok(v1alpha1::WorkloadStatus {
        observed_generation: status.observed_generation,
        replicas: status.replicas,
        ready_replicas: status.ready_replicas,
        available_replicas: status.available_replicas,
        updated_replicas: status.updated_replicas,
        updated_ready_replicas: status.updated_ready_replicas,
        updated_available_replicas: status.updated_available_replicas,
        expected_updated_replicas: status.expected_updated_replicas,
        update_revision: status.update_revision,
        current_revision: status.current_revision,
        collision_count: status.collision_count,
        conditions,
        label_selector: status.label_selector,
    })
}
