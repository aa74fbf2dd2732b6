//! LDAP extended operations

use std::{convert::TryFrom, fmt};

use bytes::Bytes;
use log::{debug, trace};
use rasn::{types::*, Decode, Encode};
use rasn_ldap::{LdapMessage, ProtocolOp, ResultCode};

use crate::{
    controls::{decode_ber, encode_ber, utf8, Control},
    error::{Error, OperationError},
    oid,
    response::{convert_controls, ControlSource},
};

/// Generic extended request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedRequest {
    oid: String,
    value: Option<Bytes>,
    controls: Vec<Control>,
}

impl ExtendedRequest {
    pub fn new<S: Into<String>>(oid: S, value: Option<Bytes>) -> Self {
        Self {
            oid: oid.into(),
            value,
            controls: Vec::new(),
        }
    }

    /// Attach request controls
    pub fn with_controls<I: IntoIterator<Item = Control>>(mut self, controls: I) -> Self {
        self.controls = controls.into_iter().collect();
        self
    }

    pub fn oid(&self) -> &str {
        &self.oid
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Build the protocol message with the given message ID
    pub fn into_message(self, message_id: u32) -> LdapMessage {
        let mut msg = LdapMessage::new(
            message_id,
            ProtocolOp::ExtendedReq(rasn_ldap::ExtendedRequest {
                request_name: self.oid.into_bytes().into(),
                request_value: self.value,
            }),
        );
        if !self.controls.is_empty() {
            msg.controls = Some(self.controls.into_iter().map(Into::into).collect());
        }
        msg
    }
}

/// Generic extended result
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedResult {
    pub message_id: u32,
    pub result_code: ResultCode,
    pub matched_dn: String,
    pub diagnostic_message: String,
    /// Response name
    pub oid: Option<String>,
    pub value: Option<Bytes>,
    pub controls: Vec<Control>,
}

impl ExtendedResult {
    /// Unsolicited notification that the server is about to close the connection (RFC 4511)
    pub fn is_notice_of_disconnection(&self) -> bool {
        self.message_id == 0 && self.oid.as_deref() == Some(oid::NOTICE_OF_DISCONNECTION_OID)
    }

    pub fn is_success(&self) -> bool {
        self.result_code == ResultCode::Success
    }

    /// Turn a non-success result into [`Error::OperationFailed`], keeping the controls
    pub fn into_result(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            debug!(
                "Extended operation {} failed: {:?} {}",
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

    // A result without a name is accepted, one with a different name is not
    fn check_oid(&self, expected: &str) -> Result<(), Error> {
        match self.oid {
            Some(ref actual) if actual != expected => Err(Error::UnexpectedOid {
                expected: expected.to_owned(),
                actual: actual.clone(),
            }),
            _ => Ok(()),
        }
    }
}

impl ControlSource for ExtendedResult {
    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

impl TryFrom<LdapMessage> for ExtendedResult {
    type Error = Error;

    fn try_from(msg: LdapMessage) -> Result<Self, Self::Error> {
        let controls = convert_controls(msg.controls)?;
        match msg.protocol_op {
            ProtocolOp::ExtendedResp(resp) => Ok(ExtendedResult {
                message_id: msg.message_id,
                result_code: resp.result_code,
                matched_dn: String::from_utf8_lossy(&resp.matched_dn).into_owned(),
                diagnostic_message: String::from_utf8_lossy(&resp.diagnostic_message).into_owned(),
                oid: resp.response_name.map(|n| utf8("response name", &n)).transpose()?,
                value: resp.response_value,
                controls,
            }),
            _ => Err(Error::InvalidResponse),
        }
    }
}

/// "Who am I?" extended request (RFC 4532)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoAmIRequest {
    controls: Vec<Control>,
}

impl WhoAmIRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_controls<I: IntoIterator<Item = Control>>(mut self, controls: I) -> Self {
        self.controls = controls.into_iter().collect();
        self
    }

    pub fn to_request(&self) -> ExtendedRequest {
        ExtendedRequest::new(oid::WHOAMI_OID, None).with_controls(self.controls.iter().cloned())
    }
}

/// "Who am I?" extended result
#[derive(Debug, Clone, PartialEq)]
pub struct WhoAmIResult {
    authorization_id: Option<String>,
    controls: Vec<Control>,
}

impl WhoAmIResult {
    /// Authorization ID of the connection, `None` if the server did not return one
    pub fn authorization_id(&self) -> Option<&str> {
        self.authorization_id.as_deref()
    }
}

impl ControlSource for WhoAmIResult {
    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

impl TryFrom<ExtendedResult> for WhoAmIResult {
    type Error = Error;

    fn try_from(result: ExtendedResult) -> Result<Self, Self::Error> {
        let result = result.into_result()?;
        let authorization_id = result
            .value
            .as_deref()
            .map(|v| utf8("Who Am I Result", v))
            .transpose()?;
        Ok(Self {
            authorization_id,
            controls: result.controls,
        })
    }
}

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct OtpRequestValue {
    #[rasn(tag(context, 0))]
    user_dn: OctetString,
}

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct OtpMechanismValue {
    #[rasn(tag(context, 0))]
    delivery_mechanism: OctetString,
    #[rasn(tag(context, 1))]
    is_supported: Option<bool>,
    #[rasn(tag(context, 2))]
    recipient_id: Option<OctetString>,
}

const OTP_RESULT_NAME: &str = "Get Supported OTP Delivery Mechanisms Result";

/// Request for the one-time password delivery mechanisms available to a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSupportedOtpDeliveryMechanismsRequest {
    user_dn: String,
    controls: Vec<Control>,
}

impl GetSupportedOtpDeliveryMechanismsRequest {
    pub fn new<S: Into<String>>(user_dn: S) -> Self {
        Self {
            user_dn: user_dn.into(),
            controls: Vec::new(),
        }
    }

    pub fn with_controls<I: IntoIterator<Item = Control>>(mut self, controls: I) -> Self {
        self.controls = controls.into_iter().collect();
        self
    }

    pub fn user_dn(&self) -> &str {
        &self.user_dn
    }

    pub fn to_request(&self) -> Result<ExtendedRequest, Error> {
        let value = encode_ber(&OtpRequestValue {
            user_dn: self.user_dn.clone().into(),
        })?;
        Ok(ExtendedRequest::new(oid::GET_SUPPORTED_OTP_DELIVERY_MECHANISMS_REQUEST_OID, Some(value))
            .with_controls(self.controls.iter().cloned()))
    }

    /// Decode a request received as a generic extended request
    pub fn from_request(request: &ExtendedRequest) -> Result<Self, Error> {
        if request.oid() != oid::GET_SUPPORTED_OTP_DELIVERY_MECHANISMS_REQUEST_OID {
            return Err(Error::UnexpectedOid {
                expected: oid::GET_SUPPORTED_OTP_DELIVERY_MECHANISMS_REQUEST_OID.to_owned(),
                actual: request.oid().to_owned(),
            });
        }
        let name = "Get Supported OTP Delivery Mechanisms Request";
        let value = request.value().ok_or(Error::MissingValue(name))?;
        let value = decode_ber::<OtpRequestValue>(name, value)?;
        Ok(Self::new(utf8(name, &value.user_dn)?).with_controls(request.controls().iter().cloned()))
    }
}

/// One delivery mechanism, e.g. `SMS` or `email`, and whether the user can use it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SupportedOtpDeliveryMechanismInfo {
    delivery_mechanism: String,
    is_supported: Option<bool>,
    recipient_id: Option<String>,
}

impl SupportedOtpDeliveryMechanismInfo {
    pub fn new<S: Into<String>>(delivery_mechanism: S, is_supported: Option<bool>, recipient_id: Option<String>) -> Self {
        Self {
            delivery_mechanism: delivery_mechanism.into(),
            is_supported,
            recipient_id,
        }
    }

    pub fn delivery_mechanism(&self) -> &str {
        &self.delivery_mechanism
    }

    /// `None` if the server could not determine whether the mechanism is supported
    pub fn is_supported(&self) -> Option<bool> {
        self.is_supported
    }

    /// Recipient for the mechanism, such as a phone number or e-mail address
    pub fn recipient_id(&self) -> Option<&str> {
        self.recipient_id.as_deref()
    }
}

impl fmt::Display for SupportedOtpDeliveryMechanismInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SupportedOTPDeliveryMechanismInfo(mechanism='{}'", self.delivery_mechanism)?;
        if let Some(supported) = self.is_supported {
            write!(f, ", isSupported={}", supported)?;
        }
        if let Some(ref recipient) = self.recipient_id {
            write!(f, ", recipientID='{}'", recipient)?;
        }
        f.write_str(")")
    }
}

/// Result with the one-time password delivery mechanisms available to a user
#[derive(Debug, Clone, PartialEq)]
pub struct GetSupportedOtpDeliveryMechanismsResult {
    mechanisms: Vec<SupportedOtpDeliveryMechanismInfo>,
    controls: Vec<Control>,
}

impl GetSupportedOtpDeliveryMechanismsResult {
    pub fn new<I>(mechanisms: I) -> Self
    where
        I: IntoIterator<Item = SupportedOtpDeliveryMechanismInfo>,
    {
        Self {
            mechanisms: mechanisms.into_iter().collect(),
            controls: Vec::new(),
        }
    }

    pub fn mechanisms(&self) -> &[SupportedOtpDeliveryMechanismInfo] {
        &self.mechanisms
    }

    /// Encode the result value, `None` when there are no mechanisms
    pub fn encode_value(&self) -> Result<Option<Bytes>, Error> {
        if self.mechanisms.is_empty() {
            return Ok(None);
        }
        let value = self
            .mechanisms
            .iter()
            .map(|m| OtpMechanismValue {
                delivery_mechanism: m.delivery_mechanism.clone().into(),
                is_supported: m.is_supported,
                recipient_id: m.recipient_id.clone().map(Into::into),
            })
            .collect::<Vec<_>>();
        encode_ber(&value).map(Some)
    }
}

impl ControlSource for GetSupportedOtpDeliveryMechanismsResult {
    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

impl TryFrom<ExtendedResult> for GetSupportedOtpDeliveryMechanismsResult {
    type Error = Error;

    fn try_from(result: ExtendedResult) -> Result<Self, Self::Error> {
        let result = result.into_result()?;
        let value = match result.value {
            None => return Ok(Self::new(Vec::new()).with_controls(result.controls)),
            Some(ref value) => {
                result.check_oid(oid::GET_SUPPORTED_OTP_DELIVERY_MECHANISMS_RESULT_OID)?;
                decode_ber::<Vec<OtpMechanismValue>>(OTP_RESULT_NAME, value)?
            }
        };
        trace!("{}: {} mechanisms", OTP_RESULT_NAME, value.len());
        let mechanisms = value
            .into_iter()
            .map(|m| {
                Ok(SupportedOtpDeliveryMechanismInfo::new(
                    utf8(OTP_RESULT_NAME, &m.delivery_mechanism)?,
                    m.is_supported,
                    m.recipient_id.map(|r| utf8(OTP_RESULT_NAME, &r)).transpose()?,
                ))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self::new(mechanisms).with_controls(result.controls))
    }
}

impl GetSupportedOtpDeliveryMechanismsResult {
    fn with_controls(mut self, controls: Vec<Control>) -> Self {
        self.controls = controls;
        self
    }
}
