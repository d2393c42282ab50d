pub struct SocketServerConfig {
    pub socket_path: String,
    /// Clients served at once; the emulator models a single serial link.
    pub max_connections: usize,
    /// Longest accepted command line, in bytes.
    pub buffer_size: usize,
}

impl Default for SocketServerConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/stagemu.sock".to_string(),
            max_connections: 1,
            buffer_size: 8192,
        }
    }
}
