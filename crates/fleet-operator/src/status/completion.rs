use jiff::{SignedDuration, Timestamp};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

use crate::{
    crd::{
        fleet_job::v1beta1::{CompletionPolicy, CompletionPolicyType, FleetJob, FleetJobStatus},
        node_report::v1beta1::NodeReport,
    },
    status::FleetJobStatusBuilder,
};

/// Returns `true` if a job with `status` is finished under `policy` at `now`.
///
/// Jobs with [`CompletionPolicyType::Always`] are finished once no pull is active anymore, no
/// matter how many of them failed, or once their active deadline passed. Jobs with
/// [`CompletionPolicyType::Never`] are never finished.
pub fn is_finished(policy: &CompletionPolicy, status: &FleetJobStatus, now: Timestamp) -> bool {
    match policy.type_ {
        CompletionPolicyType::Always => {
            status.active == 0 || deadline_exceeded(policy, status, now)
        }
        CompletionPolicyType::Never => false,
    }
}

fn deadline_exceeded(policy: &CompletionPolicy, status: &FleetJobStatus, now: Timestamp) -> bool {
    let (Some(deadline), Some(start_time)) = (policy.active_deadline_seconds, &status.start_time)
    else {
        return false;
    };

    start_time
        .0
        .checked_add(SignedDuration::from_secs(deadline))
        .is_ok_and(|deadline| deadline <= now)
}

/// Returns the completion time of a job after its status was recomputed as `status`.
///
/// A completion time which was set `previously` is kept as is. Otherwise it is set to `now` the
/// first time the job is finished.
pub fn completion_time_for(
    policy: &CompletionPolicy,
    previous: Option<Time>,
    status: &FleetJobStatus,
    now: Timestamp,
) -> Option<Time> {
    previous.or_else(|| is_finished(policy, status, now).then_some(Time(now)))
}

/// Returns the point in time after which a finished job may be garbage collected.
///
/// This is `None` if the job isn't finished or the policy has no time-to-live.
pub fn gc_eligible_at(policy: &CompletionPolicy, status: &FleetJobStatus) -> Option<Timestamp> {
    if policy.type_ == CompletionPolicyType::Never {
        return None;
    }

    let ttl = policy.ttl_seconds_after_finished?;
    let completion_time = status.completion_time.as_ref()?;

    completion_time
        .0
        .checked_add(SignedDuration::from_secs(i64::from(ttl)))
        .ok()
}

/// Returns `true` if the job may be deleted by an external garbage collector at `now`.
///
/// Nothing in this crate ever deletes a job.
pub fn is_gc_eligible(
    policy: &CompletionPolicy,
    status: &FleetJobStatus,
    now: Timestamp,
) -> bool {
    gc_eligible_at(policy, status).is_some_and(|at| at <= now)
}

/// Computes the next status of `job` from the current `reports` of the fleet.
///
/// The start time is set on the first call and kept afterwards, the completion time is set once
/// the job is finished under its [`CompletionPolicy`]. Failed items reference the job by name.
/// The returned status still has to be written back by the caller, usually with
/// [`retry_on_conflict`](crate::retry::retry_on_conflict).
#[tracing::instrument(skip_all, fields(k8s.object.name = ?job.metadata.name))]
pub fn apply_aggregate<'a, I>(job: &FleetJob, reports: I, now: Timestamp) -> FleetJobStatus
where
    I: IntoIterator<Item = &'a NodeReport>,
{
    let mut builder = FleetJobStatusBuilder::default();
    for report in reports {
        builder.add(report);
    }

    let mut status = builder.build(&job.spec.items);
    let previous = job.status.as_ref();
    let policy = &job.spec.template.completion_policy;

    status.start_time = previous
        .and_then(|previous| previous.start_time.clone())
        .or(Some(Time(now)));
    status.completion_time = completion_time_for(
        policy,
        previous.and_then(|previous| previous.completion_time.clone()),
        &status,
        now,
    );

    for failed in &mut status.failed_item_statuses {
        failed.job_ref.clone_from(&job.metadata.name);
    }

    if status.completion_time.is_some() && previous.is_none_or(|p| p.completion_time.is_none()) {
        tracing::info!(
            succeeded = status.succeeded,
            failed_items = status.failed_item_statuses.len(),
            "fleet job finished"
        );
    }

    status
}
