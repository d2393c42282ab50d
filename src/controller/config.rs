use std::{path::Path, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    axis::stage_profile::{StageProfile, StageProfileTable},
    protocol::{DEFAULT_DELIMITER, DEFAULT_MAX_TOKENS},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Stage type of each axis; axis ids are assigned 1..N in this order.
    pub axes: Vec<String>,
    /// Extra stage profiles, added to (or overriding) the built-in table.
    pub stages: Vec<StageProfile>,
    pub trace: bool,
    pub max_tokens: usize,
    pub delimiter: char,
    pub tick_interval_ms: u64,
    pub settle_delay_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            axes: ["MOX_02_30", "MOX_02_30", "MOX_02_30", "MOR_100_30", "MOG_65_10", "MOG_65_15"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            stages: Vec::new(),
            trace: false,
            max_tokens: DEFAULT_MAX_TOKENS,
            delimiter: DEFAULT_DELIMITER,
            tick_interval_ms: 100,
            settle_delay_ms: 100,
        }
    }
}

impl ControllerConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("Invalid controller config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.axes.is_empty() {
            anyhow::bail!("At least one axis must be configured");
        }
        if self.max_tokens == 0 {
            anyhow::bail!("max_tokens must be positive");
        }
        if self.tick_interval_ms == 0 {
            anyhow::bail!("tick_interval_ms must be positive");
        }
        if self.delimiter.is_control() {
            anyhow::bail!("delimiter must be a printable character");
        }

        let table = self.profile_table();
        for (index, stage) in self.axes.iter().enumerate() {
            table
                .get(stage)
                .with_context(|| format!("Axis {} has no stage profile", index + 1))?;
        }
        for stage in &self.stages {
            // Both fields are echoed in `?R` reports and must not break the reply framing.
            for field in [&stage.name, &stage.units] {
                if field.is_empty() || field.chars().any(|c| c.is_control() || c == ';') {
                    anyhow::bail!("Stage profile {:?} has an unusable name or unit", stage.name);
                }
            }
            if stage.min_position > stage.max_position || stage.max_velocity <= 0.0 {
                anyhow::bail!("Stage profile {} has invalid limits", stage.name);
            }
            if !stage.contains(stage.home_offset) {
                anyhow::bail!("Stage profile {} homes outside its travel", stage.name);
            }
        }
        Ok(())
    }

    pub fn profile_table(&self) -> StageProfileTable {
        let mut table = StageProfileTable::builtin();
        for stage in &self.stages {
            table.insert(stage.clone());
        }
        table
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
