use std::{sync::Arc, time::Duration};

use tokio::{sync::RwLock, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::{
    state::{AxisState, AxisStatus},
    TraceFlag,
};

/// Handle to the task simulating an in-flight move.
#[derive(Debug)]
pub struct MotionHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MotionHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Fixed-step trajectory from the current position to a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPlan {
    pub target: f64,
    pub step: f64,
    pub ticks: u64,
}

impl MotionPlan {
    pub fn new(start: f64, target: f64, speed: f64, tick: Duration) -> Self {
        let step_len = tick.as_secs_f64() * speed;
        let distance = (target - start).abs();
        let ticks = if distance > 0.0 && step_len > 0.0 {
            (distance / step_len).ceil() as u64
        } else {
            0
        };

        Self {
            target,
            step: step_len.copysign(target - start),
            ticks,
        }
    }

    /// One tick forward, clamped so the target is never overshot.
    pub fn advance(&self, position: f64) -> f64 {
        let next = position + self.step;
        if (self.step > 0.0 && next > self.target) || (self.step < 0.0 && next < self.target) {
            self.target
        } else {
            next
        }
    }
}

pub(crate) fn spawn(
    axis_id: usize,
    state: Arc<RwLock<AxisState>>,
    plan: MotionPlan,
    tick: Duration,
    cancel: CancellationToken,
    trace: TraceFlag,
) -> MotionHandle {
    let task = tokio::spawn(run(axis_id, state, plan, tick, cancel.clone(), trace));
    MotionHandle { cancel, task }
}

async fn run(
    axis_id: usize,
    state: Arc<RwLock<AxisState>>,
    plan: MotionPlan,
    tick: Duration,
    cancel: CancellationToken,
    trace: TraceFlag,
) {
    for _ in 0..plan.ticks {
        {
            let mut state = state.write().await;
            // STOP already flipped the status under this lock.
            if cancel.is_cancelled() {
                return;
            }
            state.current_position = plan.advance(state.current_position);
            axis_trace!(trace, "Position #{} {}", axis_id, state.current_position);
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(tick) => {}
        }
    }

    let mut state = state.write().await;
    if cancel.is_cancelled() {
        return;
    }
    state.current_position = plan.target;
    state.status = AxisStatus::Ready;
    state.motion = None;
    axis_trace!(trace, "Position #{} {} (target reached)", axis_id, state.current_position);
}
