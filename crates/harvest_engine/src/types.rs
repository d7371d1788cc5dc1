use std::fmt;

use harvest_core::{AppDetails, AppId, ItemOutcome};

/// Progress notifications emitted while a harvest runs.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ListingPage {
        page: u32,
        cursor: AppId,
        items: usize,
    },
    ListingFinished {
        pages: u32,
        total: usize,
        stop: ListingStop,
    },
    QueueReady {
        queued: usize,
    },
    ItemFinished {
        app_id: AppId,
        outcome: ItemOutcome,
    },
}

/// Why pagination ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingStop {
    EndOfCatalog,
    /// A non-empty page did not move the cursor forward.
    CursorStalled,
    Failed(FailureKind),
}

/// One page of the catalog listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPage {
    pub app_ids: Vec<AppId>,
    pub have_more_results: Option<bool>,
}

/// Detail response for one identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailPayload {
    Available(AppDetails),
    /// `success=false`, missing entry, or no `data` object.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(FailureKind::from_status(status), message)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Network,
    Timeout,
    RateLimited,
    ServerFault(u16),
    AuthRejected(u16),
    HttpStatus(u16),
    MalformedResponse,
}

impl FailureKind {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => FailureKind::RateLimited,
            401 | 403 => FailureKind::AuthRejected(status),
            s if s >= 500 => FailureKind::ServerFault(s),
            s => FailureKind::HttpStatus(s),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RateLimited => write!(f, "rate limited"),
            FailureKind::ServerFault(code) => write!(f, "server fault {code}"),
            FailureKind::AuthRejected(code) => write!(f, "authentication rejected {code}"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
        }
    }
}
