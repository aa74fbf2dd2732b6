//! LDAP operation responses and control lookup

use std::convert::TryFrom;

use log::debug;
use rasn_ldap::{LdapMessage, LdapResult, ProtocolOp, ResultCode};

use crate::{
    controls::Control,
    error::{Error, OperationError},
};

/// Anything that carries response controls: a response, an extended result or an error.
///
/// Typed controls are extracted with [`LdapControl::get`](crate::controls::LdapControl::get).
pub trait ControlSource {
    fn controls(&self) -> &[Control];
}

impl ControlSource for [Control] {
    fn controls(&self) -> &[Control] {
        self
    }
}

impl ControlSource for Vec<Control> {
    fn controls(&self) -> &[Control] {
        self
    }
}

impl ControlSource for OperationError {
    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

impl ControlSource for Error {
    /// Controls of a failed operation, empty for any other kind of error
    fn controls(&self) -> &[Control] {
        match self {
            Error::OperationFailed(e) => &e.controls,
            _ => &[],
        }
    }
}

/// Result of a bind, modify, search or extended operation
#[derive(Debug, Clone, PartialEq)]
pub struct LdapResponse {
    pub message_id: u32,
    pub result_code: ResultCode,
    pub matched_dn: String,
    pub diagnostic_message: String,
    pub controls: Vec<Control>,
}

impl LdapResponse {
    fn new(message_id: u32, result: LdapResult, controls: Vec<Control>) -> Self {
        let error = OperationError::from(result);
        Self {
            message_id,
            result_code: error.result_code,
            matched_dn: error.matched_dn,
            diagnostic_message: error.diagnostic_message,
            controls,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result_code == ResultCode::Success
    }

    /// Turn a response with a non-success result code into [`Error::OperationFailed`].
    /// The error keeps the response controls.
    pub fn into_result(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            debug!(
                "Operation {} failed: {:?} {}",
                self.message_id, self.result_code, self.diagnostic_message
            );
            Err(Error::OperationFailed(OperationError {
                result_code: self.result_code,
                matched_dn: self.matched_dn,
                diagnostic_message: self.diagnostic_message,
                controls: self.controls,
            }))
        }
    }
}

impl ControlSource for LdapResponse {
    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

pub(crate) fn convert_controls(controls: Option<rasn_ldap::Controls>) -> Result<Vec<Control>, Error> {
    controls
        .unwrap_or_default()
        .into_iter()
        .map(Control::try_from)
        .collect()
}

impl TryFrom<LdapMessage> for LdapResponse {
    type Error = Error;

    fn try_from(msg: LdapMessage) -> Result<Self, Self::Error> {
        let controls = convert_controls(msg.controls)?;
        let result = match msg.protocol_op {
            ProtocolOp::BindResponse(resp) => {
                LdapResult::new(resp.result_code, resp.matched_dn, resp.diagnostic_message)
            }
            ProtocolOp::SearchResDone(done) => done.0,
            ProtocolOp::ModifyResponse(resp) => resp.0,
            ProtocolOp::AddResponse(resp) => resp.0,
            ProtocolOp::DelResponse(resp) => resp.0,
            ProtocolOp::ModDnResponse(resp) => resp.0,
            ProtocolOp::CompareResponse(resp) => resp.0,
            ProtocolOp::ExtendedResp(resp) => {
                LdapResult::new(resp.result_code, resp.matched_dn, resp.diagnostic_message)
            }
            _ => return Err(Error::InvalidResponse),
        };
        Ok(LdapResponse::new(msg.message_id, result, controls))
    }
}
