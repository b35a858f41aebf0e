//! Render cadence state machine.
//!
//! The scheduler never touches surfaces. Every entry point returns a [`TickPlan`] describing the
//! work to do right now, and the caller executes it. Time is supplied by the host so the machine
//! is fully deterministic.
//!
//! Cancellation is generation based: frame requests and timers remember the generation they were
//! armed under, and anything from an older generation is ignored. Resize, source swap and
//! teardown all bump the generation before arming new work, so two render chains can never
//! coexist.

use crate::config::SchedulerOpts;
use crate::foundation::core::HostTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleState {
    Idle,
    OneShotPending,
    ContinuousRunning,
    Suspended,
    /// Torn down; every further signal is ignored.
    Terminated,
}

/// Work requested by the scheduler for the current instant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickPlan {
    /// Measure the container again before rendering.
    pub remeasure: bool,
    pub render: bool,
    /// New presentation opacity for the visible surface.
    pub opacity: Option<f32>,
    /// Let geometry-dependent sources recompute their internal state.
    pub notify_geometry: bool,
}

impl TickPlan {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn render_now() -> Self {
        Self {
            remeasure: true,
            render: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Liveness {
    Static,
    Live,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Timer {
    deadline: HostTime,
    generation: u64,
}

#[derive(Debug)]
pub struct FrameScheduler {
    opts: SchedulerOpts,
    state: ScheduleState,
    liveness: Option<Liveness>,
    generation: u64,
    frame_request: Option<u64>,
    grace: Option<Timer>,
    debounce: Option<Timer>,
    last_render: Option<HostTime>,
}

impl FrameScheduler {
    pub fn new(opts: SchedulerOpts) -> Self {
        Self {
            opts,
            state: ScheduleState::Idle,
            liveness: None,
            generation: 0,
            frame_request: None,
            grace: None,
            debounce: None,
            last_render: None,
        }
    }

    pub fn state(&self) -> ScheduleState {
        self.state
    }

    pub fn opts(&self) -> &SchedulerOpts {
        &self.opts
    }

    /// Earliest pending timer deadline, for hosts that sleep between ticks.
    pub fn next_deadline(&self) -> Option<HostTime> {
        [self.grace, self.debounce]
            .into_iter()
            .flatten()
            .filter(|t| t.generation == self.generation)
            .map(|t| t.deadline)
            .min()
    }

    /// A source was attached or swapped in.
    pub fn attach(&mut self, live: bool, now: HostTime) -> TickPlan {
        if self.state == ScheduleState::Terminated {
            return TickPlan::default();
        }
        let was_suspended = self.state == ScheduleState::Suspended;
        self.cancel();

        let mut plan = TickPlan::render_now();
        if was_suspended {
            plan.opacity = Some(1.0);
        }
        if live {
            self.liveness = Some(Liveness::Live);
            self.state = ScheduleState::ContinuousRunning;
            self.frame_request = Some(self.generation);
        } else {
            self.liveness = Some(Liveness::Static);
            self.state = ScheduleState::OneShotPending;
            self.grace = Some(Timer {
                deadline: now.after_ms(self.opts.static_grace_ms),
                generation: self.generation,
            });
        }
        self.last_render = Some(now);
        tracing::debug!(state = ?self.state, "source attached");
        plan
    }

    /// Natural frame tick from the host; also where timers fire.
    pub fn tick(&mut self, now: HostTime) -> TickPlan {
        match self.state {
            ScheduleState::Terminated | ScheduleState::Idle => TickPlan::default(),
            ScheduleState::Suspended => self.poll_debounce(now),
            ScheduleState::OneShotPending => {
                if !self.timer_due(self.grace, now) {
                    return TickPlan::default();
                }
                self.grace = None;
                self.state = ScheduleState::Idle;
                self.last_render = Some(now);
                tracing::debug!("grace window elapsed; re-rendering still image");
                TickPlan::render_now()
            }
            ScheduleState::ContinuousRunning => {
                // Only a request armed under the current generation may continue the chain.
                if self.frame_request.take() != Some(self.generation) {
                    return TickPlan::default();
                }
                self.frame_request = Some(self.generation);
                let due = match self.opts.min_render_interval_ms() {
                    None => true,
                    Some(interval) => self
                        .last_render
                        .is_none_or(|last| now.ms_since(last) >= interval),
                };
                if !due {
                    return TickPlan::default();
                }
                self.last_render = Some(now);
                TickPlan {
                    render: true,
                    ..TickPlan::default()
                }
            }
        }
    }

    /// The container may have changed size. Suspends rendering and (re)starts the debounce.
    pub fn geometry_changed(&mut self, now: HostTime) -> TickPlan {
        if self.state == ScheduleState::Terminated || self.liveness.is_none() {
            return TickPlan::default();
        }
        let entering = self.state != ScheduleState::Suspended;
        self.cancel();
        self.state = ScheduleState::Suspended;
        self.debounce = Some(Timer {
            deadline: now.after_ms(self.opts.resize_debounce_ms),
            generation: self.generation,
        });
        if entering {
            tracing::debug!("geometry changed; suspending renders");
            TickPlan {
                opacity: Some(0.0),
                ..TickPlan::default()
            }
        } else {
            TickPlan::default()
        }
    }

    /// A still image reported that it finished decoding.
    pub fn source_mutated(&mut self, now: HostTime) -> TickPlan {
        match (self.state, self.liveness) {
            (ScheduleState::Terminated | ScheduleState::Suspended, _) => TickPlan::default(),
            (_, Some(Liveness::Static)) => {
                self.last_render = Some(now);
                TickPlan::render_now()
            }
            _ => TickPlan::default(),
        }
    }

    /// Explicit refresh request outside the normal cadence.
    pub fn force_refresh(&mut self, now: HostTime) -> TickPlan {
        if self.state == ScheduleState::Terminated || self.liveness.is_none() {
            return TickPlan::default();
        }
        self.last_render = Some(now);
        TickPlan::render_now()
    }

    /// A still image could not be drawn yet. When no grace timer is left (it already fired, or a
    /// resize cancelled it) a new one is armed so the late decode is still picked up.
    pub fn render_skipped(&mut self, now: HostTime) {
        if self.state != ScheduleState::Idle || self.liveness != Some(Liveness::Static) {
            return;
        }
        self.state = ScheduleState::OneShotPending;
        self.grace = Some(Timer {
            deadline: now.after_ms(self.opts.static_grace_ms),
            generation: self.generation,
        });
        tracing::debug!("still image not ready; re-arming the grace retry");
    }

    /// Cancel everything and stop for good. Returns `false` when already torn down.
    pub fn teardown(&mut self) -> bool {
        if self.state == ScheduleState::Terminated {
            return false;
        }
        self.cancel();
        self.liveness = None;
        self.state = ScheduleState::Terminated;
        true
    }

    fn poll_debounce(&mut self, now: HostTime) -> TickPlan {
        if !self.timer_due(self.debounce, now) {
            return TickPlan::default();
        }
        self.debounce = None;
        self.state = ScheduleState::Idle;
        if self.liveness == Some(Liveness::Live) {
            self.state = ScheduleState::ContinuousRunning;
            self.frame_request = Some(self.generation);
        }
        self.last_render = Some(now);
        tracing::debug!(state = ?self.state, "geometry settled; resuming");
        TickPlan {
            remeasure: true,
            render: true,
            opacity: Some(1.0),
            notify_geometry: true,
        }
    }

    fn timer_due(&self, timer: Option<Timer>, now: HostTime) -> bool {
        timer.is_some_and(|t| t.generation == self.generation && now >= t.deadline)
    }

    fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.frame_request = None;
        self.grace = None;
        self.debounce = None;
    }
}
