use fleet_operator::{
    crd::workload::{
        EXCLUDE_PREPARING_DELETE_LABEL, VersionedWorkload, WorkloadVersion, convert_down,
        convert_up, default_precedence_rules, precedence_rules, v1alpha1, v1beta1,
    },
    kube::core::{conversion::ConversionReview, response::StatusSummary},
    versioned::{
        ConversionError,
        review::{VersionedObject as _, convert_objects, try_convert},
    },
};
use indoc::indoc;
use insta::assert_snapshot;
use rstest::rstest;
use serde_json::json;

const ALPHA_WORKLOAD: &str = indoc! {"
    apiVersion: apps.fleet.dev/v1alpha1
    kind: Workload
    metadata:
      name: web
      namespace: default
      labels:
        app: web
    spec:
      replicas: 5
      selector:
        matchLabels:
          app: web
      template:
        metadata:
          labels:
            app: web
      revisionHistoryLimit: 3
      scaleStrategy:
        podsToDelete:
          - web-x2k9d
        maxUnavailable: 25%
      updateStrategy:
        type: InPlaceIfPossible
        partition: 2
        maxSurge: 1
        scatterStrategy:
          - key: zone
            value: a
          - key: zone
            value: b
          - key: zone
            value: c
        inPlaceUpdateStrategy:
          gracePeriodSeconds: 10
    status:
      observedGeneration: 4
      replicas: 5
      readyReplicas: 4
      availableReplicas: 4
      updatedReplicas: 2
      updatedReadyReplicas: 2
      updatedAvailableReplicas: 2
      updateRevision: web-7d9f
      currentRevision: web-5c4b
      conditions:
        - type: FailedScale
          status: \"False\"
          reason: Scaled
"};

const BETA_WORKLOAD: &str = indoc! {"
    apiVersion: apps.fleet.dev/v1beta1
    kind: Workload
    metadata:
      name: api
      namespace: default
      labels:
        app: api
    spec:
      replicas: 6
      selector:
        matchLabels:
          app: api
      template:
        metadata:
          labels:
            app: api
      volumeClaimTemplates:
        - metadata:
            name: data
          spec:
            accessModes:
              - ReadWriteOnce
      revisionHistoryLimit: 5
      minReadySeconds: 15
      scaleStrategy:
        podsToDelete:
          - api-7xq2p
          - api-k3m8z
        maxUnavailable: 2
        disablePVCReuse: true
      updateStrategy:
        type: InPlaceOnly
        partition: 40%
        maxUnavailable: 1
        maxSurge: 0
        paused: true
        priorityStrategy:
          weightPriority:
            - weight: 50
              matchSelector:
                matchLabels:
                  tier: canary
          orderPriority:
            - orderByKey: rollout-order
        scatterStrategy:
          - key: zone
            value: c
          - key: zone
            value: a
          - key: rack
            value: r1
        inPlaceUpdateStrategy:
          gracePeriodSeconds: 30
      lifecycle:
        preDelete:
          labelHandler:
            example.com/drain: \"true\"
          finalizersHandler:
            - example.com/drain
        inPlaceUpdate:
          markPodNotReady: true
    status:
      observedGeneration: 9
      replicas: 6
      readyReplicas: 5
      availableReplicas: 5
      updatedReplicas: 3
      updatedReadyReplicas: 3
      updatedAvailableReplicas: 2
      expectedUpdatedReplicas: 4
      updateRevision: api-9a8b
      currentRevision: api-1c2d
      collisionCount: 1
      conditions:
        - type: FailedScale
          status: \"False\"
          lastTransitionTime: 2026-03-01T12:00:00Z
          reason: Scaled
        - type: FailedUpdate
          status: \"True\"
          lastTransitionTime: 2026-03-01T12:05:00Z
          reason: ImagePullBackOff
          message: image api:v2 not found
      labelSelector: app=api
"};

fn alpha_workload() -> v1alpha1::Workload {
    serde_yaml::from_str(ALPHA_WORKLOAD).expect("fixture must deserialize")
}

fn beta_workload() -> v1beta1::Workload {
    serde_yaml::from_str(BETA_WORKLOAD).expect("fixture must deserialize")
}

fn with_label(mut workload: v1alpha1::Workload, key: &str, value: &str) -> v1alpha1::Workload {
    workload
        .metadata
        .labels
        .get_or_insert_default()
        .insert(key.to_owned(), value.to_owned());
    workload
}

fn beta_with_conditions(types: &[v1beta1::WorkloadConditionType]) -> v1beta1::Workload {
    let mut workload = convert_up(alpha_workload(), &default_precedence_rules())
        .expect("fixture must convert");

    let status = workload.status.get_or_insert_default();
    status.conditions = Some(
        types
            .iter()
            .map(|type_| v1beta1::WorkloadCondition {
                type_: *type_,
                status: fleet_operator::crd::workload::common::ConditionStatus::True,
                last_transition_time: None,
                reason: None,
                message: None,
            })
            .collect(),
    );

    workload
}

#[test]
fn round_trip_without_label_is_lossless() {
    let original = alpha_workload();

    let hub = convert_up(original.clone(), &default_precedence_rules()).expect("must upgrade");
    assert_eq!(hub.spec.replicas, Some(5));
    assert_eq!(
        hub.spec.update_strategy.type_,
        Some(v1beta1::UpdateStrategyType::InPlaceIfPossible)
    );
    assert!(!hub.spec.scale_strategy.exclude_preparing_delete);

    let back = convert_down(hub).expect("must downgrade");
    assert_eq!(back, original);
}

#[test]
fn hub_round_trip_is_lossless() {
    let original = beta_workload();

    let spoke = convert_down(original.clone()).expect("must downgrade");
    let status = spoke.status.as_ref().expect("status must be kept");
    assert_eq!(status.updated_available_replicas, 2);
    assert_eq!(status.expected_updated_replicas, Some(4));

    let back = convert_up(spoke, &default_precedence_rules()).expect("must upgrade");
    assert_eq!(back, original);
}

#[test]
fn batch_round_trip_keeps_every_status_counter() {
    let original = serde_json::to_value(beta_workload()).expect("must serialize");
    assert_eq!(original["status"]["updatedAvailableReplicas"], 2);

    let down = convert_objects::<VersionedWorkload>(
        vec![original.clone()],
        "apps.fleet.dev/v1alpha1",
        &default_precedence_rules(),
    )
    .expect("must downgrade");
    let up = convert_objects::<VersionedWorkload>(
        down,
        "apps.fleet.dev/v1beta1",
        &default_precedence_rules(),
    )
    .expect("must upgrade");

    assert_eq!(up, [original]);
}

#[rstest]
#[case(Some("true"), true)]
#[case(Some("false"), false)]
#[case(Some("TRUE"), false)]
#[case(Some(""), false)]
#[case(None, false)]
fn label_forces_exclude_preparing_delete(#[case] label: Option<&str>, #[case] forced: bool) {
    let workload = match label {
        Some(value) => with_label(alpha_workload(), EXCLUDE_PREPARING_DELETE_LABEL, value),
        None => alpha_workload(),
    };
    assert!(!workload.spec.scale_strategy.exclude_preparing_delete);

    let hub = convert_up(workload, &default_precedence_rules()).expect("must upgrade");
    assert_eq!(hub.spec.scale_strategy.exclude_preparing_delete, forced);
}

#[test]
fn label_override_is_one_directional_and_stable() {
    let original = with_label(alpha_workload(), EXCLUDE_PREPARING_DELETE_LABEL, "true");
    let rules = default_precedence_rules();

    let hub = convert_up(original.clone(), &rules).expect("must upgrade");
    assert!(hub.spec.scale_strategy.exclude_preparing_delete);

    // Converting down copies the forced value and keeps the label, so the round trip is not
    // lossless for objects carrying the label.
    let back = convert_down(hub.clone()).expect("must downgrade");
    assert!(back.spec.scale_strategy.exclude_preparing_delete);
    assert_eq!(back.metadata.labels, original.metadata.labels);
    assert_ne!(back, original);

    // Re-applying the override yields the same hub object.
    let again = convert_up(back, &rules).expect("must upgrade again");
    assert_eq!(again, hub);
}

#[test]
fn label_key_is_configurable() {
    let workload = with_label(alpha_workload(), "example.com/exclude", "true");

    let default_hub =
        convert_up(workload.clone(), &default_precedence_rules()).expect("must upgrade");
    assert!(!default_hub.spec.scale_strategy.exclude_preparing_delete);

    let custom_hub =
        convert_up(workload, &precedence_rules("example.com/exclude")).expect("must upgrade");
    assert!(custom_hub.spec.scale_strategy.exclude_preparing_delete);
}

#[rstest]
#[case::absent(None)]
#[case::empty(Some(vec![]))]
fn absent_and_empty_scatter_strategy_stay_distinct(
    #[case] scatter_strategy: Option<Vec<v1alpha1::UpdateScatterTerm>>,
) {
    let mut workload = alpha_workload();
    workload.spec.update_strategy.scatter_strategy = scatter_strategy.clone();

    let hub = convert_up(workload, &default_precedence_rules()).expect("must upgrade");
    assert_eq!(
        hub.spec.update_strategy.scatter_strategy.as_ref().map(Vec::len),
        scatter_strategy.as_ref().map(Vec::len)
    );

    let wire = serde_json::to_value(&hub).expect("must serialize");
    assert_eq!(
        wire["spec"]["updateStrategy"].get("scatterStrategy").cloned(),
        scatter_strategy.as_ref().map(|_| json!([]))
    );

    let back = convert_down(hub).expect("must downgrade");
    assert_eq!(back.spec.update_strategy.scatter_strategy, scatter_strategy);
}

#[test]
fn scatter_strategy_order_is_preserved() {
    let hub = convert_up(alpha_workload(), &default_precedence_rules()).expect("must upgrade");

    let values: Vec<_> = hub
        .spec
        .update_strategy
        .scatter_strategy
        .iter()
        .flatten()
        .map(|term| term.value.as_str())
        .collect();
    assert_eq!(values, ["a", "b", "c"]);

    let back = convert_down(hub).expect("must downgrade");
    let values: Vec<_> = back
        .spec
        .update_strategy
        .scatter_strategy
        .iter()
        .flatten()
        .map(|term| term.value.as_str())
        .collect();
    assert_eq!(values, ["a", "b", "c"]);
}

#[test]
fn newer_only_condition_fails_downgrade() {
    let workload = beta_with_conditions(&[
        v1beta1::WorkloadConditionType::FailedScale,
        v1beta1::WorkloadConditionType::Progressing,
    ]);

    let err = convert_down(workload).expect_err("Progressing has no v1alpha1 counterpart");

    assert!(matches!(err, ConversionError::UnmappableEnumValue { .. }));
    assert_eq!(err.http_status_code(), 422);
    assert_eq!(
        err.join_errors(),
        "failed to convert object into apps.fleet.dev/v1alpha1: WorkloadConditionType value \
         \"Progressing\" has no counterpart when converting in the downgrade direction"
    );
}

#[test]
fn converting_into_the_same_version_is_a_noop() {
    let workload = VersionedWorkload::V1Alpha1(with_label(
        alpha_workload(),
        EXCLUDE_PREPARING_DELETE_LABEL,
        "true",
    ));

    let converted = workload
        .clone()
        .convert(WorkloadVersion::V1Alpha1, &default_precedence_rules())
        .expect("must convert");

    assert_eq!(converted, workload);
}

#[test]
fn batch_conversion_is_all_or_nothing() {
    let valid = serde_json::to_value(beta_with_conditions(&[
        v1beta1::WorkloadConditionType::FailedUpdate,
    ]))
    .expect("must serialize");
    let invalid = serde_json::to_value(beta_with_conditions(&[
        v1beta1::WorkloadConditionType::Progressing,
    ]))
    .expect("must serialize");

    let converted = convert_objects::<VersionedWorkload>(
        vec![valid.clone()],
        "apps.fleet.dev/v1alpha1",
        &default_precedence_rules(),
    )
    .expect("must convert");
    assert_eq!(converted.len(), 1);
    assert_eq!(converted[0]["apiVersion"], "apps.fleet.dev/v1alpha1");

    let result = convert_objects::<VersionedWorkload>(
        vec![valid, invalid],
        "apps.fleet.dev/v1alpha1",
        &default_precedence_rules(),
    );
    assert!(matches!(
        result,
        Err(ConversionError::UnmappableEnumValue { .. })
    ));
}

fn review(desired_api_version: &str, objects: Vec<serde_json::Value>) -> ConversionReview {
    serde_json::from_value(json!({
        "apiVersion": "apiextensions.k8s.io/v1",
        "kind": "ConversionReview",
        "request": {
            "uid": "6f1c7d52-8c0e-4a5e-a3f1-1b2c3d4e5f60",
            "desiredAPIVersion": desired_api_version,
            "objects": objects,
        }
    }))
    .expect("review must deserialize")
}

#[test]
fn review_downgrades_hub_objects() {
    let hub = convert_up(alpha_workload(), &default_precedence_rules()).expect("must upgrade");
    let request = review(
        "apps.fleet.dev/v1alpha1",
        vec![serde_json::to_value(hub).expect("must serialize")],
    );

    let response = try_convert::<VersionedWorkload>(request, &default_precedence_rules())
        .response
        .expect("review must have a response");

    assert_eq!(response.result.status, Some(StatusSummary::Success));
    assert_eq!(response.uid, "6f1c7d52-8c0e-4a5e-a3f1-1b2c3d4e5f60");
    assert_eq!(response.converted_objects.len(), 1);

    let converted: v1alpha1::Workload =
        serde_json::from_value(response.converted_objects[0].clone()).expect("must deserialize");
    assert_snapshot!(
        "downgraded_workload",
        serde_json::to_string_pretty(&converted).expect("must serialize")
    );
}

#[test]
fn review_with_unmappable_value_fails() {
    let workload = beta_with_conditions(&[v1beta1::WorkloadConditionType::Progressing]);
    let request = review(
        "apps.fleet.dev/v1alpha1",
        vec![serde_json::to_value(workload).expect("must serialize")],
    );

    let response = try_convert::<VersionedWorkload>(request, &default_precedence_rules())
        .response
        .expect("review must have a response");

    assert_eq!(response.result.status, Some(StatusSummary::Failure));
    assert_eq!(response.result.code, 422);
    assert_eq!(response.uid, "6f1c7d52-8c0e-4a5e-a3f1-1b2c3d4e5f60");
    assert!(response.converted_objects.is_empty());
    assert!(response.result.message.contains("\"Progressing\""));
}

#[rstest]
#[case::unknown_desired_version("apps.fleet.dev/v2", json!({
    "apiVersion": "apps.fleet.dev/v1beta1",
    "kind": "Workload",
}))]
#[case::unknown_object_version("apps.fleet.dev/v1beta1", json!({
    "apiVersion": "apps.fleet.dev/v1",
    "kind": "Workload",
}))]
#[case::wrong_kind("apps.fleet.dev/v1beta1", json!({
    "apiVersion": "apps.fleet.dev/v1alpha1",
    "kind": "FleetJob",
}))]
#[case::malformed_object("apps.fleet.dev/v1beta1", json!({
    "apiVersion": "apps.fleet.dev/v1alpha1",
    "kind": "Workload",
    "spec": { "replicas": "many" },
}))]
fn review_with_bad_request_fails(
    #[case] desired_api_version: &str,
    #[case] object: serde_json::Value,
) {
    let request = review(desired_api_version, vec![object]);

    let response = try_convert::<VersionedWorkload>(request, &default_precedence_rules())
        .response
        .expect("review must have a response");

    assert_eq!(response.result.status, Some(StatusSummary::Failure));
    assert_eq!(response.result.code, 400);
    assert!(response.converted_objects.is_empty());
}

#[test]
fn review_without_request_is_invalid() {
    let request: ConversionReview = serde_json::from_value(json!({
        "apiVersion": "apiextensions.k8s.io/v1",
        "kind": "ConversionReview",
    }))
    .expect("review must deserialize");

    let response = try_convert::<VersionedWorkload>(request, &default_precedence_rules())
        .response
        .expect("review must have a response");

    assert_eq!(response.result.status, Some(StatusSummary::Failure));
    assert_eq!(response.result.code, 400);
}
