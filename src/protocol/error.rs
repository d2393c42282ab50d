#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    MissingArgument(String),
    InvalidNumber(String),
    AxisOutOfRange(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::MissingArgument(opcode) => {
                write!(f, "Missing argument for opcode: {}", opcode)
            }
            ProtocolError::InvalidNumber(token) => write!(f, "Invalid number: {:?}", token),
            ProtocolError::AxisOutOfRange(token) => write!(f, "Axis id out of range: {}", token),
        }
    }
}

impl std::error::Error for ProtocolError {}
