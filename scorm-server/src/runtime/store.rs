//! In-memory runtime session store
//!
//! Holds the data-model values of every active session plus the last error
//! code recorded per session. State lives for the life of the process and is
//! never persisted.
//!
//! Locking: the session map sits behind one reader/writer lock. `GetValue`
//! and `GetLastError` take the read side and may run concurrently;
//! `Initialize`, `Terminate`, `SetValue` and `Commit` take the write side.
//! Error codes live in a concurrent map so readers can record them. They are
//! kept per session and the last writer wins: two concurrent `GetValue` calls
//! on one session may each see the other's code from `GetLastError`.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Result string for successful operations
pub const TRUE: &str = "true";
/// Result string for failed operations
pub const FALSE: &str = "false";

/// Runtime error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `"0"`
    NoError,
    /// `"101"`
    GeneralException,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::NoError => "0",
            ErrorCode::GeneralException => "101",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::NoError => "No error",
            ErrorCode::GeneralException => "General exception",
        }
    }

    /// Parse a wire code; only `"0"` and `"101"` are known
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "0" => Some(ErrorCode::NoError),
            "101" => Some(ErrorCode::GeneralException),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Message for any code string, `"Unknown error"` for unrecognized codes
pub fn error_string(code: &str) -> &'static str {
    ErrorCode::from_code(code)
        .map(|code| code.message())
        .unwrap_or("Unknown error")
}

type SessionValues = HashMap<String, String>;

/// Session-keyed runtime state
#[derive(Debug, Default)]
pub struct RuntimeStore {
    sessions: RwLock<HashMap<String, SessionValues>>,
    last_error: DashMap<String, ErrorCode>,
}

impl RuntimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session; idempotent
    pub fn initialize(&self, session: &str) -> String {
        let mut sessions = self.sessions.write();
        sessions.entry(session.to_string()).or_default();
        self.record(session, ErrorCode::NoError);
        TRUE.to_string()
    }

    /// End a session; ending an absent session still succeeds
    pub fn terminate(&self, session: &str) -> String {
        let mut sessions = self.sessions.write();
        sessions.remove(session);
        self.record(session, ErrorCode::NoError);
        TRUE.to_string()
    }

    /// Value of `element`, or `""` with error 101 when the session or element
    /// does not exist
    pub fn get_value(&self, session: &str, element: &str) -> String {
        let sessions = self.sessions.read();
        match sessions.get(session).and_then(|values| values.get(element)) {
            Some(value) => {
                self.record(session, ErrorCode::NoError);
                value.clone()
            }
            None => {
                self.record(session, ErrorCode::GeneralException);
                String::new()
            }
        }
    }

    /// Store `value` under `element`, creating the session if needed
    pub fn set_value(&self, session: &str, element: &str, value: &str) -> String {
        let mut sessions = self.sessions.write();
        sessions
            .entry(session.to_string())
            .or_default()
            .insert(element.to_string(), value.to_string());
        self.record(session, ErrorCode::NoError);
        TRUE.to_string()
    }

    /// Acknowledge a commit; nothing is persisted
    pub fn commit(&self, session: &str) -> String {
        let sessions = self.sessions.write();
        if sessions.contains_key(session) {
            self.record(session, ErrorCode::NoError);
            TRUE.to_string()
        } else {
            self.record(session, ErrorCode::GeneralException);
            FALSE.to_string()
        }
    }

    /// Last error code of the session, `"0"` if none was recorded
    pub fn get_last_error(&self, session: &str) -> String {
        let _sessions = self.sessions.read();
        self.last_error
            .get(session)
            .map(|code| *code)
            .unwrap_or(ErrorCode::NoError)
            .code()
            .to_string()
    }

    pub fn get_error_string(&self, code: &str) -> String {
        error_string(code).to_string()
    }

    /// Same text as [`RuntimeStore::get_error_string`]
    pub fn get_diagnostic(&self, code: &str) -> String {
        error_string(code).to_string()
    }

    /// Number of active sessions
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn record(&self, session: &str, code: ErrorCode) {
        self.last_error.insert(session.to_string(), code);
    }
}
