pub mod config;
pub mod sync_move;

use config::ControllerConfig;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    axis::{report::AxisReport, state::Action, Axis, TraceFlag},
    protocol::{
        command::{AxisId, Command, CommandReader},
        error::ProtocolError,
        reply::Reply,
        tokenize, CommandHandler,
    },
};

/// Emulated multi-axis stage controller.
///
/// Axes are created once from the config and live as long as the
/// controller. Command batches are processed one at a time.
pub struct Controller {
    axes: Vec<Axis>,
    config: ControllerConfig,
    trace: TraceFlag,
    session: Mutex<()>,
}

impl Controller {
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;

        let table = config.profile_table();
        let trace = TraceFlag::new(config.trace);
        let mut axes = Vec::with_capacity(config.axes.len());
        for (index, stage) in config.axes.iter().enumerate() {
            let profile = table.get(stage)?;
            axes.push(Axis::new(
                index + 1,
                profile,
                config.tick_interval(),
                trace.clone(),
            ));
        }

        info!(
            "Controller ready with {} axes: {}",
            axes.len(),
            config.axes.join(", ")
        );

        Ok(Self {
            axes,
            config,
            trace,
            session: Mutex::new(()),
        })
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    pub fn get_axis(&self, id: usize) -> Result<&Axis> {
        id.checked_sub(1)
            .and_then(|index| self.axes.get(index))
            .ok_or_else(|| anyhow::anyhow!("Axis not found: {}", id))
    }

    fn axis(&self, id: AxisId) -> &Axis {
        &self.axes[id.index()]
    }

    pub fn set_trace(&self, enabled: bool) {
        self.trace.set(enabled);
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace.enabled()
    }

    /// Processes one command line and returns the reply text, after the
    /// settle delay. A protocol error anywhere in the batch yields `"Error"`.
    pub async fn request(&self, text: &str) -> String {
        let _session = self.session.lock().await;
        debug!("Received command: {}", text);

        let reply = Reply::from(self.dispatch(text).await);
        if let Reply::Error(e) = &reply {
            warn!("Command batch {:?} aborted: {}", text, e);
        }

        tokio::time::sleep(self.config.settle_delay()).await;
        reply.to_string()
    }

    /// Executes a batch without the settle delay or session lock.
    pub async fn dispatch(&self, text: &str) -> Result<String, ProtocolError> {
        let tokens = tokenize(text, self.config.delimiter, self.config.max_tokens);
        let mut reader = CommandReader::new(&tokens, self.axis_count());
        let mut out = String::new();
        while let Some(command) = reader.next_command()? {
            self.execute(command, &mut out).await;
        }
        Ok(out)
    }

    async fn execute(&self, command: Command, out: &mut String) {
        match command {
            Command::ReportAll => {
                for report in self.report_all().await {
                    out.push_str(&report.to_string());
                    out.push('\n');
                }
            }
            Command::Report(id) => out.push_str(&self.axis(id).report().await.to_string()),
            Command::QuerySpeed(id) => out.push_str(&self.axis(id).speed().await.to_string()),
            Command::QueryAccelerationTime(id) => {
                out.push_str(&self.axis(id).acceleration_time().await.to_string())
            }
            Command::QueryPosition(id) => {
                out.push_str(&self.axis(id).position().await.to_string())
            }
            Command::QueryMoving(id) => {
                out.push_str(if self.axis(id).is_moving().await { "1" } else { "0" })
            }
            Command::QueryStatus(id) => out.push_str(self.axis(id).status().await.label()),
            Command::EnableAll => {
                self.broadcast(Action::Enable).await;
            }
            Command::DisableAll => {
                self.broadcast(Action::Disable).await;
            }
            Command::HomeAll => {
                self.broadcast(Action::Homing).await;
            }
            Command::StopAll => {
                self.broadcast(Action::Stop).await;
            }
            Command::Home(id) => {
                self.axis(id).apply(Action::Homing).await;
            }
            Command::Stop(id) => {
                self.axis(id).apply(Action::Stop).await;
            }
            Command::SetSpeed(id, speed) => {
                self.axis(id).set_speed(speed).await;
            }
            Command::SetAccelerationTime(id, acceleration_time) => {
                self.axis(id).set_acceleration_time(acceleration_time).await;
            }
            Command::MoveRelative(id, distance) => {
                self.axis(id).apply(Action::MoveRelative(distance)).await;
            }
            Command::MoveAbsolute(id, target) => {
                self.axis(id).apply(Action::MoveAbsolute(target)).await;
            }
            Command::SyncRelative {
                distances,
                time,
                acceleration_time,
            } => {
                let outcome =
                    sync_move::move_relative(&self.axes, &distances, time, acceleration_time)
                        .await;
                debug!("SYNCR: {:?}", outcome);
            }
            Command::SyncAbsolute {
                targets,
                time,
                acceleration_time,
            } => {
                let outcome =
                    sync_move::move_absolute(&self.axes, &targets, time, acceleration_time).await;
                debug!("SYNCA: {:?}", outcome);
            }
        }
    }

    /// Sends `action` to every axis; returns how many accepted it.
    pub async fn broadcast(&self, action: Action) -> usize {
        let mut accepted = 0;
        for axis in &self.axes {
            if axis.apply(action).await {
                accepted += 1;
            }
        }
        accepted
    }

    pub async fn report_all(&self) -> Vec<AxisReport> {
        let mut reports = Vec::with_capacity(self.axes.len());
        for axis in &self.axes {
            reports.push(axis.report().await);
        }
        reports
    }

    pub async fn shutdown(&self) {
        let stopped = self.broadcast(Action::Stop).await;
        info!("Controller shutdown, stopped {} moving axes", stopped);
    }
}

#[async_trait::async_trait]
impl CommandHandler for Controller {
    async fn handle(&self, line: &str) -> String {
        self.request(line).await
    }
}
