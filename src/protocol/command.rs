use tracing::debug;

use super::error::ProtocolError;

/// 1-based axis id, checked against the controller's axis count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisId(usize);

impl AxisId {
    pub fn new(id: usize, axis_count: usize) -> Option<Self> {
        (1..=axis_count).contains(&id).then_some(Self(id))
    }

    pub fn index(self) -> usize {
        self.0 - 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ReportAll,
    Report(AxisId),
    QuerySpeed(AxisId),
    QueryAccelerationTime(AxisId),
    QueryPosition(AxisId),
    QueryMoving(AxisId),
    QueryStatus(AxisId),
    EnableAll,
    DisableAll,
    HomeAll,
    StopAll,
    Home(AxisId),
    Stop(AxisId),
    SetSpeed(AxisId, f64),
    SetAccelerationTime(AxisId, f64),
    MoveRelative(AxisId, f64),
    MoveAbsolute(AxisId, f64),
    SyncRelative {
        distances: Vec<f64>,
        time: f64,
        acceleration_time: f64,
    },
    SyncAbsolute {
        targets: Vec<f64>,
        time: f64,
        acceleration_time: f64,
    },
}

/// Cursor over a tokenized batch, yielding one command at a time.
///
/// Commands are handed out incrementally so a protocol error part-way
/// through a batch leaves earlier commands already executed.
pub struct CommandReader<'a> {
    tokens: &'a [String],
    cursor: usize,
    axis_count: usize,
}

impl<'a> CommandReader<'a> {
    pub fn new(tokens: &'a [String], axis_count: usize) -> Self {
        Self {
            tokens,
            cursor: 0,
            axis_count,
        }
    }

    pub fn next_command(&mut self) -> Result<Option<Command>, ProtocolError> {
        let tokens = self.tokens;
        while let Some(token) = tokens.get(self.cursor) {
            self.cursor += 1;
            let opcode = token.as_str();
            let command = match opcode {
                "?RA" => Command::ReportAll,
                "?R" => Command::Report(self.axis(opcode)?),
                "?V" => Command::QuerySpeed(self.axis(opcode)?),
                "?A" => Command::QueryAccelerationTime(self.axis(opcode)?),
                "?P" => Command::QueryPosition(self.axis(opcode)?),
                "?M" => Command::QueryMoving(self.axis(opcode)?),
                "?S" => Command::QueryStatus(self.axis(opcode)?),
                "E" => Command::EnableAll,
                "D" => Command::DisableAll,
                "HA" => Command::HomeAll,
                "SA" => Command::StopAll,
                "H" => Command::Home(self.axis(opcode)?),
                "S" => Command::Stop(self.axis(opcode)?),
                "V" => Command::SetSpeed(self.axis(opcode)?, self.number(opcode)?),
                "A" => Command::SetAccelerationTime(self.axis(opcode)?, self.number(opcode)?),
                "MR" => Command::MoveRelative(self.axis(opcode)?, self.number(opcode)?),
                "MA" => Command::MoveAbsolute(self.axis(opcode)?, self.number(opcode)?),
                "SYNCR" => Command::SyncRelative {
                    distances: self.per_axis(opcode)?,
                    time: self.number(opcode)?,
                    acceleration_time: self.number(opcode)?,
                },
                "SYNCA" => Command::SyncAbsolute {
                    targets: self.per_axis(opcode)?,
                    time: self.number(opcode)?,
                    acceleration_time: self.number(opcode)?,
                },
                _ => {
                    debug!("Skipping unknown token: {:?}", opcode);
                    continue;
                }
            };
            return Ok(Some(command));
        }
        Ok(None)
    }

    fn argument(&mut self, opcode: &str) -> Result<&'a str, ProtocolError> {
        let tokens = self.tokens;
        let token = tokens
            .get(self.cursor)
            .ok_or_else(|| ProtocolError::MissingArgument(opcode.to_string()))?;
        self.cursor += 1;
        Ok(token.trim())
    }

    fn axis(&mut self, opcode: &str) -> Result<AxisId, ProtocolError> {
        let token = self.argument(opcode)?;
        let id: i64 = token
            .parse()
            .map_err(|_| ProtocolError::InvalidNumber(token.to_string()))?;
        usize::try_from(id)
            .ok()
            .and_then(|id| AxisId::new(id, self.axis_count))
            .ok_or_else(|| ProtocolError::AxisOutOfRange(token.to_string()))
    }

    fn number(&mut self, opcode: &str) -> Result<f64, ProtocolError> {
        let token = self.argument(opcode)?;
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ProtocolError::InvalidNumber(token.to_string())),
        }
    }

    fn per_axis(&mut self, opcode: &str) -> Result<Vec<f64>, ProtocolError> {
        (0..self.axis_count).map(|_| self.number(opcode)).collect()
    }
}
