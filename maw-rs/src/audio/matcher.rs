//! Session matching against a target criterion.

use super::backend::SessionVolume;
use super::device::{MatchCriterion, UNKNOWN_NAME};
use super::policy::{strip_exe_suffix, ExclusionPolicy};
use crate::config::ConfigProvider;
use crate::platform::{ProcessIdentity, ProcessInspector};
use tracing::debug;

/// Decides whether a session is a target of the current operation.
pub struct SessionMatcher<'a, I, C> {
    identity: &'a ProcessIdentity<I>,
    policy: &'a ExclusionPolicy<C>,
}

impl<'a, I: ProcessInspector, C: ConfigProvider> SessionMatcher<'a, I, C> {
    pub fn new(identity: &'a ProcessIdentity<I>, policy: &'a ExclusionPolicy<C>) -> Self {
        Self { identity, policy }
    }

    /// True when `session` belongs to the target and its process is not
    /// excluded.
    ///
    /// Pid targeting rejects other pids before resolving any name. The
    /// executable name comparison is case-insensitive and exact; the target
    /// name is not extension-normalized.
    pub fn matches<S: SessionVolume>(&self, session: &S, criterion: &MatchCriterion) -> bool {
        let Some(pid) = session.owner_pid() else {
            debug!("Session has no owning process, skipping");
            return false;
        };

        if let MatchCriterion::ByProcessId(target) = criterion {
            if pid != *target {
                debug!("Session PID {} not the target, skipping", pid);
                return false;
            }
        }

        let exe_name = self.identity.image_name(pid);
        debug!("Session PID={}, EXE={}, target {}", pid, exe_name, criterion);

        let stem = strip_exe_suffix(&exe_name);
        if self.policy.is_process_excluded(stem) {
            debug!("Process '{}' is in exclusion list, skipping", stem);
            return false;
        }

        match criterion {
            MatchCriterion::ByProcessId(_) => true,
            MatchCriterion::ByExecutableName(_) if exe_name == UNKNOWN_NAME => {
                debug!("Process name unresolved, skipping");
                false
            }
            MatchCriterion::ByExecutableName(target) => {
                let matched = exe_name.to_lowercase() == target.to_lowercase();
                if !matched {
                    debug!("Executable mismatch, skipping");
                }
                matched
            }
        }
    }
}
