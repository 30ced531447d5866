//! Audio control façade.
//!
//! Every operation walks all active, non-excluded render devices, matches
//! each session against the target, and applies one actuator call per
//! matching session. Sessions are independent: a failure on one is logged
//! and the walk continues. Nothing here returns an error; "no matching
//! session" is reported as a zero count or a missing reading.

use super::backend::{AudioBackend, AudioEndpoint};
use super::device::{DeviceSummary, MatchCriterion};
use super::enumerator;
use super::matcher::SessionMatcher;
use super::policy::ExclusionPolicy;
use super::volume;
use crate::config::ConfigProvider;
use crate::platform::{ProcessIdentity, ProcessInspector};
use tracing::{debug, info, warn};

/// The operation surface used by hotkey handlers and hosts.
pub struct AudioControl<B, I, C> {
    backend: B,
    identity: ProcessIdentity<I>,
    policy: ExclusionPolicy<C>,
}

impl<B, I, C> AudioControl<B, I, C>
where
    B: AudioBackend,
    I: ProcessInspector,
    C: ConfigProvider,
{
    pub fn new(backend: B, inspector: I, config: C) -> Self {
        Self {
            backend,
            identity: ProcessIdentity::new(inspector),
            policy: ExclusionPolicy::new(config),
        }
    }

    pub fn toggle_mute_by_pid(&self, pid: u32) -> usize {
        self.toggle_mute(&MatchCriterion::ByProcessId(pid))
    }

    pub fn toggle_mute_by_exe_name(&self, name: &str) -> usize {
        self.toggle_mute(&MatchCriterion::by_name(name))
    }

    pub fn increase_volume_by_pid(&self, pid: u32, step_percent: f32) -> usize {
        self.adjust_volume(&MatchCriterion::ByProcessId(pid), step_percent)
    }

    pub fn decrease_volume_by_pid(&self, pid: u32, step_percent: f32) -> usize {
        self.adjust_volume(&MatchCriterion::ByProcessId(pid), -step_percent)
    }

    pub fn increase_volume_by_exe_name(&self, name: &str, step_percent: f32) -> usize {
        self.adjust_volume(&MatchCriterion::by_name(name), step_percent)
    }

    pub fn decrease_volume_by_exe_name(&self, name: &str, step_percent: f32) -> usize {
        self.adjust_volume(&MatchCriterion::by_name(name), -step_percent)
    }

    /// Average volume over the sessions owned by `pid`.
    pub fn get_volume_by_pid(&self, pid: u32) -> Option<f32> {
        self.read_volume(&MatchCriterion::ByProcessId(pid))
    }

    /// Average volume over the sessions of every process named `name`.
    pub fn get_volume_by_exe_name(&self, name: &str) -> Option<f32> {
        self.read_volume(&MatchCriterion::by_name(name))
    }

    /// Toggle mute on every matching session. Returns how many toggled.
    pub fn toggle_mute(&self, criterion: &MatchCriterion) -> usize {
        info!("Toggle mute for {}", criterion);
        let total = self.apply(criterion, |session| volume::toggle_mute(session));
        info!("Sessions toggled for {}: {}", criterion, total);
        total
    }

    /// Step the volume of every matching session. Returns how many changed.
    pub fn adjust_volume(&self, criterion: &MatchCriterion, step_percent: f32) -> usize {
        info!("Adjust volume by {}% for {}", step_percent, criterion);
        let total = self.apply(criterion, |session| {
            volume::adjust_volume(session, step_percent).is_some()
        });
        info!("Sessions adjusted for {}: {}", criterion, total);
        total
    }

    /// Average volume across matching sessions, `None` when none matched
    /// or none could be read.
    pub fn read_volume(&self, criterion: &MatchCriterion) -> Option<f32> {
        let mut sum = 0.0f32;
        let mut count = 0usize;
        self.apply(criterion, |session| match volume::read_volume(session) {
            Some(level) => {
                sum += level;
                count += 1;
                true
            }
            None => false,
        });

        if count == 0 {
            debug!("No readable sessions for {}", criterion);
            return None;
        }
        let average = sum / count as f32;
        debug!("Average volume for {}: {:.3} over {} sessions", criterion, average, count);
        Some(average)
    }

    /// Active render devices and whether each is excluded.
    pub fn devices(&self) -> Vec<DeviceSummary> {
        enumerator::list_devices(&self.backend, &self.policy).unwrap_or_else(|e| {
            warn!("Device listing unavailable: {}", e);
            Vec::new()
        })
    }

    /// Display executable name for a foreground pid.
    pub fn executable_name(&self, pid: u32) -> String {
        self.identity.executable_name(pid)
    }

    pub fn policy(&self) -> &ExclusionPolicy<C> {
        &self.policy
    }

    /// Run `act` on each matching session, counting the successes.
    fn apply<F>(&self, criterion: &MatchCriterion, mut act: F) -> usize
    where
        F: FnMut(&<B::Device as AudioEndpoint>::Session) -> bool,
    {
        let matcher = SessionMatcher::new(&self.identity, &self.policy);
        let mut total = 0;

        let walked = enumerator::for_each_session(&self.backend, &self.policy, |device, index, session| {
            if !matcher.matches(session, criterion) {
                return;
            }
            debug!("Session {} on {}: match found", index, device);
            if act(session) {
                total += 1;
            }
        });

        if let Err(e) = walked {
            warn!("Audio sessions unavailable: {}", e);
            return 0;
        }
        total
    }
}
