use std::fmt;

use super::state::AxisStatus;

/// Point-in-time view of one axis, as returned by `?R` and `?RA`.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisReport {
    pub id: usize,
    pub status: AxisStatus,
    pub position: f64,
    pub units: String,
}

impl AxisReport {
    pub fn is_moving(&self) -> bool {
        self.status == AxisStatus::Moving
    }

    pub fn is_ready(&self) -> bool {
        self.status == AxisStatus::Ready
    }
}

impl fmt::Display for AxisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{};{};{};{}",
            self.id, self.status, self.position, self.units
        )
    }
}
