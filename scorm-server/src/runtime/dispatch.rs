//! Runtime API dispatch
//!
//! A request names one of the eight runtime methods. It is converted into a
//! [`RuntimeCall`] first, so an unknown method is rejected before the store is
//! touched and every known method is matched exhaustively.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::store::RuntimeStore;

/// Wire request `{session, method, element?, value?}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeRequest {
    #[serde(default)]
    pub session: String,
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Method name outside the eight runtime operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown method '{0}'")]
pub struct UnknownMethod(pub String);

/// One runtime operation with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    Initialize { session: String },
    Terminate { session: String },
    GetValue { session: String, element: String },
    SetValue { session: String, element: String, value: String },
    Commit { session: String },
    GetLastError { session: String },
    /// Code is carried in the request's `value`
    GetErrorString { code: String },
    /// Code is carried in the request's `value`
    GetDiagnostic { code: String },
}

impl RuntimeCall {
    /// Wire name of the method
    pub fn method(&self) -> &'static str {
        match self {
            RuntimeCall::Initialize { .. } => "Initialize",
            RuntimeCall::Terminate { .. } => "Terminate",
            RuntimeCall::GetValue { .. } => "GetValue",
            RuntimeCall::SetValue { .. } => "SetValue",
            RuntimeCall::Commit { .. } => "Commit",
            RuntimeCall::GetLastError { .. } => "GetLastError",
            RuntimeCall::GetErrorString { .. } => "GetErrorString",
            RuntimeCall::GetDiagnostic { .. } => "GetDiagnostic",
        }
    }
}

impl TryFrom<RuntimeRequest> for RuntimeCall {
    type Error = UnknownMethod;

    fn try_from(request: RuntimeRequest) -> Result<Self, Self::Error> {
        let RuntimeRequest {
            session,
            method,
            element,
            value,
        } = request;
        let element = element.unwrap_or_default();
        let value = value.unwrap_or_default();

        let call = match method.as_str() {
            "Initialize" => RuntimeCall::Initialize { session },
            "Terminate" => RuntimeCall::Terminate { session },
            "GetValue" => RuntimeCall::GetValue { session, element },
            "SetValue" => RuntimeCall::SetValue {
                session,
                element,
                value,
            },
            "Commit" => RuntimeCall::Commit { session },
            "GetLastError" => RuntimeCall::GetLastError { session },
            "GetErrorString" => RuntimeCall::GetErrorString { code: value },
            "GetDiagnostic" => RuntimeCall::GetDiagnostic { code: value },
            _ => return Err(UnknownMethod(method)),
        };
        Ok(call)
    }
}

impl RuntimeStore {
    /// Execute a call and return its result string
    pub fn dispatch(&self, call: &RuntimeCall) -> String {
        match call {
            RuntimeCall::Initialize { session } => self.initialize(session),
            RuntimeCall::Terminate { session } => self.terminate(session),
            RuntimeCall::GetValue { session, element } => self.get_value(session, element),
            RuntimeCall::SetValue {
                session,
                element,
                value,
            } => self.set_value(session, element, value),
            RuntimeCall::Commit { session } => self.commit(session),
            RuntimeCall::GetLastError { session } => self.get_last_error(session),
            RuntimeCall::GetErrorString { code } => self.get_error_string(code),
            RuntimeCall::GetDiagnostic { code } => self.get_diagnostic(code),
        }
    }
}
