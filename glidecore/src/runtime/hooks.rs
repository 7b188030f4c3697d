//! Callbacks into the application around the core.

/// Notified when a stored task can no longer be resumed.
///
/// Fired once after the aircraft has been stationary for
/// `task_resume_timeout_secs`.
pub trait TaskResumeHook: Send + Sync {
    fn task_resume_invalidated(&self);
}

impl<F> TaskResumeHook for F
where
    F: Fn() + Send + Sync,
{
    fn task_resume_invalidated(&self) {
        self()
    }
}
