use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubErrorKind {
    InvalidRequest,
    Transport,
    Timeout,
    Protocol,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubError {
    pub kind: HubErrorKind,
    pub message: String,
    pub http_status: Option<u16>,
}

impl HubError {
    pub fn new(kind: HubErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "{} (http_status={})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for HubError {}

pub fn invalid_request(message: impl Into<String>) -> HubError {
    HubError::new(HubErrorKind::InvalidRequest, message)
}

pub fn transport_error(message: impl Into<String>) -> HubError {
    HubError::new(HubErrorKind::Transport, message)
}

pub fn timeout_error(message: impl Into<String>) -> HubError {
    HubError::new(HubErrorKind::Timeout, message)
}

pub fn protocol_violation(message: impl Into<String>) -> HubError {
    HubError::new(HubErrorKind::Protocol, message)
}

pub fn internal_error(message: impl Into<String>) -> HubError {
    HubError::new(HubErrorKind::Internal, message)
}
