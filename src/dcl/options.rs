//! Apply options

/// Guards that stop Apply from taking a class of action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleParam {
    /// Fail instead of creating a missing resource.
    BlockCreation,
    /// Fail instead of adopting a resource that already exists.
    BlockAcquire,
    /// Fail instead of updating an existing resource.
    BlockModification,
    /// Fail instead of deleting and recreating.
    BlockDestruction,
}

/// Per-call knobs for Apply. `R` is the resource type.
#[derive(Debug, Clone)]
pub enum ApplyOption<R> {
    /// Identity to fetch the initial state from, when it differs from desired.
    StateHint(R),
    Lifecycle(LifecycleParam),
}

pub fn state_hint<R>(opts: &[ApplyOption<R>]) -> Option<&R> {
    opts.iter().find_map(|o| match o {
        ApplyOption::StateHint(r) => Some(r),
        ApplyOption::Lifecycle(_) => None,
    })
}

pub fn has_lifecycle<R>(opts: &[ApplyOption<R>], param: LifecycleParam) -> bool {
    opts.iter()
        .any(|o| matches!(o, ApplyOption::Lifecycle(p) if *p == param))
}
