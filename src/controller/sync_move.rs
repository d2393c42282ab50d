//! Synchronized multi-axis moves.
//!
//! Every participating axis is locked (in id order) for the whole plan,
//! so the batch is validated and committed against one consistent view
//! and nothing is written unless every axis accepts. Motion tasks are
//! still started one after the other, so simultaneity is approximate:
//! axes start within one scheduling round of each other, not in lock-step.

use tracing::debug;

use crate::axis::{state::Action, Axis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Number of axes set in motion.
    Started(usize),
    /// Axis id whose target lies outside its travel range.
    OutOfTravel(usize),
    /// Axis id that rejected the derived speed or acceleration time.
    RejectedParameters(usize),
}

/// Moves every axis with a non-zero distance so all of them take `time`
/// to traverse. `distances[i]` belongs to `axes[i]`.
pub async fn move_relative(
    axes: &[Axis],
    distances: &[f64],
    time: f64,
    acceleration_time: f64,
) -> SyncOutcome {
    let participants: Vec<(&Axis, f64)> = axes
        .iter()
        .zip(distances.iter().copied())
        .filter(|(_, distance)| *distance != 0.0)
        .collect();

    let mut guards = Vec::with_capacity(participants.len());
    for (axis, _) in &participants {
        guards.push(axis.lock().await);
    }

    for ((axis, distance), state) in participants.iter().zip(&guards) {
        if !axis.can_move_relative(state, *distance) {
            debug!("Sync move rejected: axis {} cannot travel {}", axis.id(), distance);
            return SyncOutcome::OutOfTravel(axis.id());
        }
    }

    for ((axis, distance), state) in participants.iter().zip(&guards) {
        let speed = distance.abs() / time;
        if !axis.accepts_speed(state, speed)
            || !axis.accepts_acceleration_time(state, acceleration_time)
        {
            debug!(
                "Sync move rejected: axis {} refuses speed {} / accel {}",
                axis.id(),
                speed,
                acceleration_time
            );
            return SyncOutcome::RejectedParameters(axis.id());
        }
    }

    for ((axis, distance), state) in participants.iter().zip(guards.iter_mut()) {
        axis.apply_speed(state, distance.abs() / time);
        axis.apply_acceleration_time(state, acceleration_time);
    }

    let mut started = 0;
    for ((axis, distance), state) in participants.iter().zip(guards.iter_mut()) {
        if axis.transition(state, Action::MoveRelative(*distance)) {
            started += 1;
        }
    }
    SyncOutcome::Started(started)
}

/// Absolute variant: targets become distances from each axis's current
/// position, then the relative plan applies.
pub async fn move_absolute(
    axes: &[Axis],
    targets: &[f64],
    time: f64,
    acceleration_time: f64,
) -> SyncOutcome {
    let mut distances = Vec::with_capacity(targets.len());
    for (axis, target) in axes.iter().zip(targets) {
        distances.push(target - axis.position().await);
    }
    move_relative(axes, &distances, time, acceleration_time).await
}
