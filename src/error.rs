//! LDAP errors

use rasn::error::{DecodeError, EncodeError};
use rasn_ldap::{LdapResult, ResultCode};
use thiserror::Error;

use crate::{controls::Control, filter::Rule};

/// LDAP operation error, returned for a response with a non-success result code.
///
/// The response controls are kept so that typed controls can still be
/// extracted from a failed operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationError {
    /// Result code
    pub result_code: ResultCode,
    /// Matched DN
    pub matched_dn: String,
    /// Diagnostic message
    pub diagnostic_message: String,
    /// Response controls
    pub controls: Vec<Control>,
}

impl From<LdapResult> for OperationError {
    fn from(r: LdapResult) -> Self {
        OperationError {
            result_code: r.result_code,
            matched_dn: String::from_utf8_lossy(&r.matched_dn).into_owned(),
            diagnostic_message: String::from_utf8_lossy(&r.diagnostic_message).into_owned(),
            controls: Vec::new(),
        }
    }
}

/// LDAP errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0:?}")]
    AsnDecode(DecodeError),
    #[error("{0:?}")]
    AsnEncode(EncodeError),
    #[error("{0}")]
    InvalidFilter(pest::error::Error<Rule>),
    #[error("LDAP operation failed: {:?}", .0.result_code)]
    OperationFailed(OperationError),
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Unexpected control OID {actual}, expected {expected}")]
    UnexpectedOid { expected: String, actual: String },
    #[error("{0} requires a value")]
    MissingValue(&'static str),
    #[error("{0} must not have a value")]
    UnexpectedValue(&'static str),
    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
    #[error("Invalid JSON control: {0}")]
    InvalidJson(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_value<S: Into<String>>(name: &'static str, message: S) -> Self {
        Error::InvalidValue {
            name,
            message: message.into(),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::AsnDecode(e)
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Error::AsnEncode(e)
    }
}

impl From<pest::error::Error<Rule>> for Error {
    fn from(e: pest::error::Error<Rule>) -> Self {
        Error::InvalidFilter(e)
    }
}

impl From<OperationError> for Error {
    fn from(e: OperationError) -> Self {
        Error::OperationFailed(e)
    }
}
