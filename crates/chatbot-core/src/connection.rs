/// Reachability of the Q&A service, as of the most recent health check or request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    Connected,
    Disconnected,
    #[default]
    Checking,
}

impl ConnectionState {
    pub fn from_healthy(healthy: bool) -> Self {
        if healthy {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Checking => "Checking connection...",
        }
    }

    pub fn color_hex(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "#4CAF50",
            ConnectionState::Disconnected => "#EF5350",
            ConnectionState::Checking => "#FFA726",
        }
    }

    /// Status color as an RGB triple, for UIs that can't take hex strings.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            ConnectionState::Connected => (0x4C, 0xAF, 0x50),
            ConnectionState::Disconnected => (0xEF, 0x53, 0x50),
            ConnectionState::Checking => (0xFF, 0xA7, 0x26),
        }
    }
}
