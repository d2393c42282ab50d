use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

/// Physical limits of one class of stage hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageProfile {
    pub name: String,
    pub max_velocity: f64,
    pub min_position: f64,
    pub max_position: f64,
    #[serde(default)]
    pub home_offset: f64,
    pub units: String,
}

impl StageProfile {
    pub fn new(
        name: &str,
        max_velocity: f64,
        min_position: f64,
        max_position: f64,
        home_offset: f64,
        units: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            max_velocity,
            min_position,
            max_position,
            home_offset,
            units: units.to_string(),
        }
    }

    pub fn contains(&self, position: f64) -> bool {
        position >= self.min_position && position <= self.max_position
    }

    pub fn accepts_speed(&self, speed: f64) -> bool {
        speed > 0.0 && speed < self.max_velocity
    }

    /// Speed an axis starts with before any `V` command.
    pub fn default_speed(&self) -> f64 {
        self.max_velocity * 0.2
    }

    pub fn default_acceleration_time(&self) -> f64 {
        1.0
    }
}

/// Catalog of stage profiles keyed by type name.
#[derive(Debug, Clone)]
pub struct StageProfileTable {
    profiles: HashMap<String, Arc<StageProfile>>,
}

impl StageProfileTable {
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Optics Focus stages supported by the FIPC controller.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.insert(StageProfile::new("MOX_02_30", 1875.0, 0.0, 30000.0, 0.0, "um"));
        table.insert(StageProfile::new("MOR_100_30", 3750.0, 0.0, 360000.0, 0.0, "mgrad"));
        table.insert(StageProfile::new(
            "MOG_65_10", 960.0, -15000.0, 15000.0, -15000.0, "mgrad",
        ));
        table.insert(StageProfile::new(
            "MOG_65_15", 1350.0, -21000.0, 21000.0, -21000.0, "mgrad",
        ));
        table
    }

    pub fn insert(&mut self, profile: StageProfile) {
        self.profiles.insert(profile.name.clone(), Arc::new(profile));
    }

    pub fn get(&self, name: &str) -> anyhow::Result<Arc<StageProfile>> {
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Unknown stage type: {}", name))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for StageProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_has_reference_stages() {
        let table = StageProfileTable::builtin();
        assert_eq!(
            table.names(),
            vec!["MOG_65_10", "MOG_65_15", "MOR_100_30", "MOX_02_30"]
        );

        let gonio = table.get("MOG_65_10").unwrap();
        assert_eq!(gonio.home_offset, -15000.0);
        assert_eq!(gonio.units, "mgrad");

        let linear = table.get("MOX_02_30").unwrap();
        assert_eq!(linear.default_speed(), 375.0);
    }

    #[test]
    fn test_unknown_stage_is_an_error() {
        let table = StageProfileTable::builtin();
        let err = table.get("MOX_99").unwrap_err();
        assert!(err.to_string().contains("MOX_99"));
    }

    #[test]
    fn test_profiles_are_shared() {
        let table = StageProfileTable::builtin();
        let a = table.get("MOX_02_30").unwrap();
        let b = table.get("MOX_02_30").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_speed_bounds_are_exclusive() {
        let profile = StageProfileTable::builtin().get("MOX_02_30").unwrap();
        assert!(profile.accepts_speed(1874.9));
        assert!(!profile.accepts_speed(1875.0));
        assert!(!profile.accepts_speed(0.0));
        assert!(!profile.accepts_speed(-5.0));
    }

    #[test]
    fn test_travel_bounds_are_inclusive() {
        let profile = StageProfileTable::builtin().get("MOG_65_15").unwrap();
        assert!(profile.contains(-21000.0));
        assert!(profile.contains(21000.0));
        assert!(!profile.contains(21000.1));
    }
}
