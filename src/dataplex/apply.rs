//! Apply: converge a resource to a desired state

use tracing::Instrument;
use uuid::Uuid;

use super::client::Client;
use super::resource::DataplexResource;
use crate::dcl::diff::{group_operations, FieldDiff};
use crate::dcl::error::{DclError, Result};
use crate::dcl::options::{has_lifecycle, state_hint, ApplyOption, LifecycleParam};

/// A mutating call planned by Apply.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOperation {
    Create,
    Update {
        name: &'static str,
        field_diffs: Vec<FieldDiff>,
    },
}

/// Decides what Apply must do given the initial state and the diffs.
///
/// `exists == false` means the initial GET returned 404.
pub fn plan<R>(
    exists: bool,
    diffs: &[FieldDiff],
    opts: &[ApplyOption<R>],
) -> Result<Vec<ApiOperation>> {
    if !exists {
        if has_lifecycle(opts, LifecycleParam::BlockCreation) {
            return Err(DclError::ApplyInfeasible(
                "creation blocked by lifecycle params".to_string(),
            ));
        }
        return Ok(vec![ApiOperation::Create]);
    }
    if has_lifecycle(opts, LifecycleParam::BlockAcquire) {
        return Err(DclError::ApplyInfeasible(
            "resource already exists - apply blocked by lifecycle params".to_string(),
        ));
    }

    let grouped = group_operations(diffs);
    if grouped.requires_recreate() {
        let fields: Vec<String> = grouped.recreate.iter().map(ToString::to_string).collect();
        return Err(DclError::ApplyInfeasible(format!(
            "infeasible update: ({}) would require recreation",
            fields.join("; ")
        )));
    }
    if has_lifecycle(opts, LifecycleParam::BlockModification) {
        if let Some(d) = grouped.operations.values().flatten().next() {
            return Err(DclError::ApplyInfeasible(format!(
                "modification blocked, diff ({}) unresolvable",
                d
            )));
        }
    }

    Ok(grouped
        .operations
        .into_iter()
        .map(|(name, field_diffs)| ApiOperation::Update { name, field_diffs })
        .collect())
}

impl Client {
    /// Creates or updates the resource so that it matches `raw_desired`,
    /// then returns the converged state. Restarts on 409 conflicts and
    /// gives up after the configured deadline.
    pub async fn apply<R: DataplexResource>(
        &self,
        raw_desired: &R,
        opts: &[ApplyOption<R>],
    ) -> Result<R> {
        let apply_id = Uuid::new_v4();
        let span = tracing::info_span!("apply", kind = R::KIND, %apply_id);

        let attempts = async {
            let mut conflicts = 0;
            loop {
                match self.apply_once(raw_desired, opts).await {
                    Err(e) if e.is_conflict() && conflicts < self.config().retry.conflict_retries => {
                        let delay = self.config().retry.backoff(conflicts);
                        tracing::warn!(
                            "{} apply hit a conflict ({}), retrying in {}ms",
                            R::KIND,
                            e,
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                        conflicts += 1;
                    }
                    other => return other,
                }
            }
        };

        self.with_deadline(format!("apply {}", R::KIND), attempts)
            .instrument(span)
            .await
    }

    /// Fetches the initial state and diffs it against the canonical desired
    /// state. Returns `(initial, desired, diffs)`; `initial` is `None` when
    /// the resource does not exist.
    pub async fn diffs_for_raw_desired<R: DataplexResource>(
        &self,
        raw_desired: &R,
        opts: &[ApplyOption<R>],
    ) -> Result<(Option<R>, R, Vec<FieldDiff>)> {
        tracing::info!("Fetching initial state...");
        let fetch_state = state_hint(opts).unwrap_or(raw_desired);

        let raw_initial = match self.get(fetch_state).await {
            Ok(r) => r,
            Err(e) if e.is_not_found() => {
                tracing::info!("Found that {} resource did not exist.", R::KIND);
                let desired = R::canonicalize_desired(raw_desired, None);
                return Ok((None, desired, Vec::new()));
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to retrieve whether a {} resource already exists: {}",
                    R::KIND,
                    e
                );
                return Err(e);
            }
        };
        tracing::info!("Found initial state for {}: {:?}", R::KIND, raw_initial);

        let desired = R::canonicalize_desired(raw_desired, Some(&raw_initial));
        tracing::info!("Canonicalized desired state for {}: {:?}", R::KIND, desired);

        let diffs = R::diff(&desired, &raw_initial);
        if !diffs.is_empty() {
            tracing::info!("Diff function found diffs: {:?}", diffs);
        }
        Ok((Some(raw_initial), desired, diffs))
    }

    async fn apply_once<R: DataplexResource>(
        &self,
        raw_desired: &R,
        opts: &[ApplyOption<R>],
    ) -> Result<R> {
        raw_desired.validate()?;

        let (initial, desired, diffs) = self.diffs_for_raw_desired(raw_desired, opts).await?;
        let ops = plan(initial.is_some(), &diffs, opts)?;
        tracing::info!("Created plan: {:?}", ops);

        let mut first_response = None;
        for op in &ops {
            tracing::info!("Performing operation {:?}", op);
            match op {
                ApiOperation::Create => first_response = self.create(&desired).await?,
                ApiOperation::Update { name, field_diffs } => {
                    self.update(&desired, name, field_diffs).await?
                }
            }
        }
        tracing::info!("Finished operation execution");

        tracing::info!("Retrieving raw new state...");
        let mut raw_new = self.get(&desired).await?;

        if let Some(response) = first_response {
            let mut full = R::flatten(&response);
            full.inherit_parent(raw_desired);
            raw_new = R::canonicalize_new(raw_new, &full);
        }

        let new_state = R::canonicalize_new(raw_new, raw_desired);
        let new_desired = R::canonicalize_desired(raw_desired, Some(&new_state));
        let remaining: Vec<FieldDiff> = R::diff(&new_desired, &new_state)
            .into_iter()
            .filter(FieldDiff::is_actionable)
            .collect();

        if remaining.is_empty() {
            tracing::info!("No diffs found. Apply was successful.");
            Ok(new_state)
        } else {
            tracing::info!("Found diffs after apply: {:?}", remaining);
            Err(DclError::DiffAfterApply {
                diffs: remaining.iter().map(ToString::to_string).collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcl::diff::Remediation;

    fn diff(name: &str, remediation: Remediation) -> FieldDiff {
        FieldDiff {
            field_name: name.to_string(),
            desired: Some("a".into()),
            actual: Some("b".into()),
            remediation,
        }
    }

    #[test]
    fn test_plan_create_when_missing() {
        let ops = plan::<()>(false, &[], &[]).unwrap();
        assert_eq!(ops, vec![ApiOperation::Create]);

        let err = plan::<()>(false, &[], &[ApplyOption::Lifecycle(LifecycleParam::BlockCreation)])
            .unwrap_err();
        assert!(matches!(err, DclError::ApplyInfeasible(_)));
    }

    #[test]
    fn test_plan_groups_updates_and_skips_noops() {
        let diffs = vec![
            diff("displayName", Remediation::Update("updateOp")),
            diff("labels", Remediation::Update("updateOp")),
            diff("uid", Remediation::NoOp),
        ];
        let ops = plan::<()>(true, &diffs, &[]).unwrap();
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            ApiOperation::Update { name, field_diffs } => {
                assert_eq!(*name, "updateOp");
                assert_eq!(field_diffs.len(), 2);
            }
            other => panic!("unexpected op {other:?}"),
        }

        let only_noop = vec![diff("uid", Remediation::NoOp)];
        assert!(plan::<()>(true, &only_noop, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_plan_rejects_recreate_and_blocked_modification() {
        let recreate = vec![
            diff("project", Remediation::Recreate),
            diff("labels", Remediation::Update("updateOp")),
            diff("type", Remediation::Recreate),
        ];
        match plan::<()>(true, &recreate, &[]) {
            Err(DclError::ApplyInfeasible(msg)) => {
                assert!(msg.contains("project") && msg.contains("type"), "got {msg}");
                assert!(!msg.contains("labels"));
            }
            other => panic!("expected ApplyInfeasible, got {other:?}"),
        }

        let update = vec![diff("labels", Remediation::Update("updateOp"))];
        let opts = [ApplyOption::Lifecycle(LifecycleParam::BlockModification)];
        assert!(matches!(
            plan::<()>(true, &update, &opts),
            Err(DclError::ApplyInfeasible(_))
        ));
        assert!(plan::<()>(true, &[], &opts).unwrap().is_empty());

        let acquire = [ApplyOption::Lifecycle(LifecycleParam::BlockAcquire)];
        assert!(plan::<()>(true, &[], &acquire).is_err());
    }
}
