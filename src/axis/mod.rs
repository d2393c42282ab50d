macro_rules! axis_trace {
    ($flag:expr, $($arg:tt)+) => {
        if $flag.enabled() {
            tracing::info!($($arg)+);
        } else {
            tracing::trace!($($arg)+);
        }
    };
}

pub mod motion;
pub mod report;
pub mod stage_profile;
pub mod state;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::{RwLock, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use motion::MotionPlan;
use report::AxisReport;
use stage_profile::StageProfile;
use state::{Action, AxisState, AxisStatus};

/// Shared switch for the human-readable action trace.
#[derive(Debug, Clone, Default)]
pub struct TraceFlag(Arc<AtomicBool>);

impl TraceFlag {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }
}

/// One motorized stage axis.
///
/// All mutable state sits behind a single lock shared with the axis's
/// motion task. Queries take the read side, commands and motion ticks
/// take the write side, so every observation is a consistent snapshot.
pub struct Axis {
    id: usize,
    profile: Arc<StageProfile>,
    state: Arc<RwLock<AxisState>>,
    tick_interval: Duration,
    shutdown: CancellationToken,
    trace: TraceFlag,
}

impl Axis {
    pub fn new(
        id: usize,
        profile: Arc<StageProfile>,
        tick_interval: Duration,
        trace: TraceFlag,
    ) -> Self {
        let state = AxisState::new(profile.default_speed(), profile.default_acceleration_time());
        Self {
            id,
            profile,
            state: Arc::new(RwLock::new(state)),
            tick_interval,
            shutdown: CancellationToken::new(),
            trace,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn profile(&self) -> &StageProfile {
        &self.profile
    }

    /// Runs `action` through the state machine. Returns `false` when the
    /// action is not legal in the current state; nothing changes then.
    pub async fn apply(&self, action: Action) -> bool {
        let mut state = self.state.write().await;
        self.transition(&mut state, action)
    }

    pub(crate) fn transition(&self, state: &mut AxisState, action: Action) -> bool {
        let accepted = match (state.status, action) {
            (AxisStatus::Disabled, Action::Enable) => {
                state.status = AxisStatus::NoHome;
                true
            }
            (AxisStatus::NoHome, Action::Disable) | (AxisStatus::Ready, Action::Disable) => {
                state.status = AxisStatus::Disabled;
                true
            }
            (AxisStatus::NoHome, Action::Homing) => {
                state.current_position = self.profile.home_offset;
                state.target_position = self.profile.home_offset;
                state.status = AxisStatus::Ready;
                true
            }
            (AxisStatus::Ready, Action::MoveRelative(distance)) => {
                let target = state.current_position + distance;
                self.start_move(state, target)
            }
            (AxisStatus::Ready, Action::MoveAbsolute(target)) => self.start_move(state, target),
            (AxisStatus::Moving, Action::Stop) => {
                if let Some(motion) = state.motion.take() {
                    if !motion.is_finished() {
                        motion.cancel();
                    }
                }
                state.status = AxisStatus::Ready;
                true
            }
            _ => false,
        };

        if accepted {
            match action {
                Action::MoveRelative(value) | Action::MoveAbsolute(value) => {
                    axis_trace!(self.trace, "--> {} #{} {}", action.name(), self.id, value)
                }
                _ => axis_trace!(self.trace, "--> {} #{}", action.name(), self.id),
            }
        } else {
            debug!(
                "Axis {} rejected {} while {:?}",
                self.id,
                action.name(),
                state.status
            );
        }
        accepted
    }

    fn start_move(&self, state: &mut AxisState, target: f64) -> bool {
        if !self.profile.contains(target) {
            return false;
        }

        let plan = MotionPlan::new(state.current_position, target, state.speed, self.tick_interval);
        state.target_position = target;
        state.status = AxisStatus::Moving;
        state.motion = Some(motion::spawn(
            self.id,
            self.state.clone(),
            plan,
            self.tick_interval,
            self.shutdown.child_token(),
            self.trace.clone(),
        ));
        true
    }

    pub async fn set_speed(&self, speed: f64) -> bool {
        let mut state = self.state.write().await;
        self.apply_speed(&mut state, speed)
    }

    pub async fn set_acceleration_time(&self, acceleration_time: f64) -> bool {
        let mut state = self.state.write().await;
        self.apply_acceleration_time(&mut state, acceleration_time)
    }

    pub(crate) fn accepts_speed(&self, state: &AxisState, speed: f64) -> bool {
        state.status == AxisStatus::Ready && self.profile.accepts_speed(speed)
    }

    pub(crate) fn accepts_acceleration_time(
        &self,
        state: &AxisState,
        acceleration_time: f64,
    ) -> bool {
        state.status == AxisStatus::Ready && acceleration_time > 0.0
    }

    pub(crate) fn apply_speed(&self, state: &mut AxisState, speed: f64) -> bool {
        if !self.accepts_speed(state, speed) {
            return false;
        }
        state.speed = speed;
        axis_trace!(
            self.trace,
            "--> Set Speed #{} {}{}/s",
            self.id,
            speed,
            self.profile.units
        );
        true
    }

    pub(crate) fn apply_acceleration_time(
        &self,
        state: &mut AxisState,
        acceleration_time: f64,
    ) -> bool {
        if !self.accepts_acceleration_time(state, acceleration_time) {
            return false;
        }
        state.acceleration_time = acceleration_time;
        axis_trace!(self.trace, "--> Set Accel #{} {}s", self.id, acceleration_time);
        true
    }

    pub(crate) fn can_move_relative(&self, state: &AxisState, distance: f64) -> bool {
        self.profile.contains(state.current_position + distance)
    }

    pub(crate) async fn lock(&self) -> RwLockWriteGuard<'_, AxisState> {
        self.state.write().await
    }

    pub async fn report(&self) -> AxisReport {
        let state = self.state.read().await;
        AxisReport {
            id: self.id,
            status: state.status,
            position: state.current_position,
            units: self.profile.units.clone(),
        }
    }

    pub async fn status(&self) -> AxisStatus {
        self.state.read().await.status
    }

    pub async fn is_moving(&self) -> bool {
        self.state.read().await.is_moving()
    }

    pub async fn position(&self) -> f64 {
        self.state.read().await.current_position
    }

    pub async fn target_position(&self) -> f64 {
        self.state.read().await.target_position
    }

    pub async fn speed(&self) -> f64 {
        self.state.read().await.speed
    }

    pub async fn acceleration_time(&self) -> f64 {
        self.state.read().await.acceleration_time
    }
}

impl Drop for Axis {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
