use std::fmt;

use super::motion::MotionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisStatus {
    Disabled,
    NoHome,
    Ready,
    Moving,
}

impl AxisStatus {
    /// Label used on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            AxisStatus::Disabled => "Disable",
            AxisStatus::NoHome => "NoHome",
            AxisStatus::Ready => "Ready",
            AxisStatus::Moving => "Moving",
        }
    }
}

impl fmt::Display for AxisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Enable,
    Disable,
    Homing,
    Stop,
    MoveRelative(f64),
    MoveAbsolute(f64),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Enable => "ENABLE",
            Action::Disable => "DISABLE",
            Action::Homing => "HOMING",
            Action::Stop => "STOP",
            Action::MoveRelative(_) => "MOVE_RELATIVE",
            Action::MoveAbsolute(_) => "MOVE_ABSOLUTE",
        }
    }
}

/// Mutable part of an axis, guarded by the axis lock.
#[derive(Debug)]
pub struct AxisState {
    pub status: AxisStatus,
    pub current_position: f64,
    pub target_position: f64,
    pub speed: f64,
    pub acceleration_time: f64,
    pub motion: Option<MotionHandle>,
}

impl AxisState {
    pub fn new(speed: f64, acceleration_time: f64) -> Self {
        Self {
            status: AxisStatus::Disabled,
            current_position: 0.0,
            target_position: 0.0,
            speed,
            acceleration_time,
            motion: None,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.status == AxisStatus::Moving
    }
}
