//! Runtime tracking API (Initialize, Terminate, GetValue, SetValue, Commit,
//! GetLastError, GetErrorString, GetDiagnostic)

pub mod dispatch;
pub mod store;

pub use dispatch::{RuntimeCall, RuntimeRequest, UnknownMethod};
pub use store::{error_string, ErrorCode, RuntimeStore};
