//! LDAP controls
//!
//! Every typed control implements [`LdapControl`], which gives it a BER value
//! codec, a JSON codec and a [`get`](LdapControl::get) lookup against a
//! response or an error. Controls that are not known to the caller travel as a
//! generic [`Control`].

use std::convert::TryFrom;

use bytes::Bytes;
use log::trace;
use rasn::{ber, Decode, Encode};
use serde_json::Value;

use crate::{
    error::Error,
    json::{decode_base64, encode_base64, JsonFields, JsonObject},
    response::ControlSource,
};

pub use account_usable::{AccountUsableRequestControl, AccountUsableResponseControl};
pub use authz_identity::{AuthorizationIdentityRequestControl, AuthorizationIdentityResponseControl};
pub use effective_rights::GetEffectiveRightsRequestControl;
pub use intermediate_client::{
    IntermediateClientRequestControl, IntermediateClientRequestValue, IntermediateClientResponseControl,
    IntermediateClientResponseValue,
};
pub use join::{JoinBaseDn, JoinRequestControl, JoinRequestValue, JoinRule};
pub(crate) use join::check_size_limit;
pub use known::KnownControl;
pub use manage_dsa_it::ManageDsaItRequestControl;
pub use paged::SimplePagedResultsControl;
pub use password_policy_issues::{
    AuthenticationFailureReason, GetPasswordPolicyStateIssuesRequestControl,
    GetPasswordPolicyStateIssuesResponseControl, PasswordPolicyStateIssue,
};
pub use route_to_server::RouteToServerRequestControl;

mod account_usable;
mod authz_identity;
mod effective_rights;
mod intermediate_client;
mod join;
mod known;
mod manage_dsa_it;
mod paged;
mod password_policy_issues;
mod route_to_server;

const JSON_FIELD_OID: &str = "oid";
const JSON_FIELD_CONTROL_NAME: &str = "control-name";
const JSON_FIELD_CRITICALITY: &str = "criticality";
const JSON_FIELD_VALUE_BASE64: &str = "value-base64";
const JSON_FIELD_VALUE_JSON: &str = "value-json";

const JSON_CONTROL_FIELDS: &[&str] = &[
    JSON_FIELD_OID,
    JSON_FIELD_CONTROL_NAME,
    JSON_FIELD_CRITICALITY,
    JSON_FIELD_VALUE_BASE64,
    JSON_FIELD_VALUE_JSON,
];

/// Whether a control is attached to a request or to a response.
///
/// Some request and response controls share an OID, so decoding a generic
/// control into a typed one needs to know which side it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlDirection {
    Request,
    Response,
}

/// Generic LDAP control: OID, criticality and an optional opaque value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Control {
    oid: String,
    critical: bool,
    value: Option<Bytes>,
}

impl Control {
    /// Create a control from its parts
    pub fn new<S: Into<String>>(oid: S, critical: bool, value: Option<Bytes>) -> Self {
        Self {
            oid: oid.into(),
            critical,
            value,
        }
    }

    /// Return the control OID
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// Returns true if the control is marked critical
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Return the raw control value
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    /// Human-readable name of the control, or its OID if the control type is unknown
    pub fn name(&self) -> &str {
        KnownControl::name_for_oid(&self.oid).unwrap_or(self.oid.as_str())
    }

    /// Decode into a typed control, if the OID belongs to a known control type
    pub fn decode_known(&self, direction: ControlDirection) -> Result<Option<KnownControl>, Error> {
        KnownControl::decode(self, direction)
    }

    /// Encode as a JSON object, carrying the value as base64
    pub fn to_json(&self) -> Value {
        let mut object = json_envelope(&self.oid, self.name(), self.critical);
        if let Some(ref value) = self.value {
            object.insert(JSON_FIELD_VALUE_BASE64.to_owned(), Value::String(encode_base64(value)));
        }
        Value::Object(object)
    }

    /// Decode a JSON control object.
    ///
    /// A `value-json` value is converted through the typed control registered
    /// for the OID and direction; `value-base64` is taken as is.
    pub fn from_json(value: &Value, strict: bool, direction: ControlDirection) -> Result<Self, Error> {
        let envelope = JsonEnvelope::parse(value, strict)?;
        match envelope.value {
            JsonControlValue::Absent => Ok(Control::new(envelope.oid, envelope.critical, None)),
            JsonControlValue::Base64(bytes) => Ok(Control::new(envelope.oid, envelope.critical, Some(bytes.into()))),
            JsonControlValue::Json(_) => KnownControl::from_json(value, strict, direction)?
                .ok_or_else(|| {
                    Error::InvalidJson(format!(
                        "control {} has a JSON value but no JSON decoder is available for it",
                        envelope.oid
                    ))
                })?
                .to_control(),
        }
    }
}

impl From<Control> for rasn_ldap::Control {
    fn from(control: Control) -> Self {
        rasn_ldap::Control::new(control.oid.into_bytes().into(), control.critical, control.value)
    }
}

impl TryFrom<rasn_ldap::Control> for Control {
    type Error = Error;

    fn try_from(control: rasn_ldap::Control) -> Result<Self, Self::Error> {
        let oid = utf8("control OID", &control.control_type)?;
        Ok(Control::new(oid, control.criticality, control.control_value))
    }
}

/// A control with a fixed OID and a typed value
pub trait LdapControl: Sized {
    /// Control OID
    const OID: &'static str;

    /// Human-readable control name, used in JSON output and errors
    const NAME: &'static str;

    fn is_critical(&self) -> bool;

    /// Encode the value, `None` for controls without one
    fn encode_value(&self) -> Result<Option<Bytes>, Error>;

    /// Decode a control from its criticality and raw value
    fn decode_value(critical: bool, value: Option<&[u8]>) -> Result<Self, Error>;

    /// Represent the value as a JSON object, `None` for controls without one
    fn value_to_json(&self) -> Option<JsonObject>;

    /// Decode a control from its criticality and `value-json` object
    fn value_from_json(critical: bool, value: &JsonObject, strict: bool) -> Result<Self, Error>;

    /// Convert to a generic control
    fn to_control(&self) -> Result<Control, Error> {
        Ok(Control::new(Self::OID, self.is_critical(), self.encode_value()?))
    }

    /// Decode a generic control, which must carry this control's OID
    fn from_control(control: &Control) -> Result<Self, Error> {
        if control.oid() != Self::OID {
            return Err(Error::UnexpectedOid {
                expected: Self::OID.to_owned(),
                actual: control.oid().to_owned(),
            });
        }
        Self::decode_value(control.is_critical(), control.value())
    }

    /// Encode as a JSON control object with a `value-json` value
    fn to_json(&self) -> Value {
        let mut object = json_envelope(Self::OID, Self::NAME, self.is_critical());
        if let Some(value) = self.value_to_json() {
            object.insert(JSON_FIELD_VALUE_JSON.to_owned(), Value::Object(value));
        }
        Value::Object(object)
    }

    /// Decode a JSON control object carrying either `value-json` or `value-base64`
    fn from_json(value: &Value, strict: bool) -> Result<Self, Error> {
        let envelope = JsonEnvelope::parse(value, strict)?;
        if envelope.oid != Self::OID {
            return Err(Error::UnexpectedOid {
                expected: Self::OID.to_owned(),
                actual: envelope.oid.to_owned(),
            });
        }
        match envelope.value {
            JsonControlValue::Absent => Self::decode_value(envelope.critical, None),
            JsonControlValue::Base64(bytes) => Self::decode_value(envelope.critical, Some(bytes.as_slice())),
            JsonControlValue::Json(object) => Self::value_from_json(envelope.critical, object, strict),
        }
    }

    /// Extract this control from a response, extended result or error.
    ///
    /// Returns `Ok(None)` if no control with this OID is present and an error
    /// if one is present but cannot be decoded.
    fn get<S: ControlSource + ?Sized>(source: &S) -> Result<Option<Self>, Error> {
        match source.controls().iter().find(|c| c.oid() == Self::OID) {
            Some(control) => {
                trace!("Decoding {} from response", Self::NAME);
                Self::from_control(control).map(Some)
            }
            None => Ok(None),
        }
    }
}

fn json_envelope(oid: &str, name: &str, critical: bool) -> JsonObject {
    let mut object = JsonObject::new();
    object.insert(JSON_FIELD_OID.to_owned(), Value::String(oid.to_owned()));
    object.insert(JSON_FIELD_CONTROL_NAME.to_owned(), Value::String(name.to_owned()));
    object.insert(JSON_FIELD_CRITICALITY.to_owned(), Value::Bool(critical));
    object
}

pub(crate) enum JsonControlValue<'a> {
    Absent,
    Base64(Vec<u8>),
    Json(&'a JsonObject),
}

/// The outer part of a JSON control, common to all control types
pub(crate) struct JsonEnvelope<'a> {
    pub(crate) oid: &'a str,
    pub(crate) critical: bool,
    pub(crate) value: JsonControlValue<'a>,
}

impl<'a> JsonEnvelope<'a> {
    pub(crate) fn parse(value: &'a Value, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::from_value("JSON control", value)?;
        fields.check_fields(JSON_CONTROL_FIELDS, strict)?;

        let oid = fields.required_string(JSON_FIELD_OID)?;
        let critical = fields.required_boolean(JSON_FIELD_CRITICALITY)?;
        fields.string(JSON_FIELD_CONTROL_NAME)?;

        let value = match (
            fields.string(JSON_FIELD_VALUE_BASE64)?,
            fields.object(JSON_FIELD_VALUE_JSON)?,
        ) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidJson(format!(
                    "control {} must not have both {} and {}",
                    oid, JSON_FIELD_VALUE_BASE64, JSON_FIELD_VALUE_JSON
                )))
            }
            (Some(encoded), None) => {
                JsonControlValue::Base64(decode_base64("JSON control", JSON_FIELD_VALUE_BASE64, encoded)?)
            }
            (None, Some(object)) => JsonControlValue::Json(object),
            (None, None) => JsonControlValue::Absent,
        };

        Ok(Self { oid, critical, value })
    }
}

/// BER-encode a control value
pub(crate) fn encode_ber<T: Encode>(value: &T) -> Result<Bytes, Error> {
    Ok(ber::encode(value)?.into())
}

/// BER-decode a control value, rejecting trailing data after the top-level element
pub(crate) fn decode_ber<T: Decode>(name: &'static str, value: &[u8]) -> Result<T, Error> {
    if exceeds_nesting_depth(value, MAX_NESTING_DEPTH) {
        return Err(Error::invalid_value(
            name,
            format!("value is nested deeper than {} levels", MAX_NESTING_DEPTH),
        ));
    }
    let mut decoder = ber::de::Decoder::new(value, ber::de::DecoderOptions::ber());
    let decoded = T::decode(&mut decoder)?;
    let len = decoder.decoded_len();
    if len != value.len() {
        return Err(Error::invalid_value(
            name,
            format!("{} unexpected bytes after the encoded value", value.len() - len),
        ));
    }
    trace!("Decoded {} value: {} bytes", name, len);
    Ok(decoded)
}

/// Maximum depth of constructed BER elements accepted in a control value
const MAX_NESTING_DEPTH: usize = 32;

// Walks the TLV structure without recursion. Malformed input stops the scan
// and is left for the decoder to reject.
fn exceeds_nesting_depth(data: &[u8], max_depth: usize) -> bool {
    // end offset of each open constructed element, `None` for indefinite length
    let mut open: Vec<Option<usize>> = Vec::new();
    let mut pos = 0;

    loop {
        while let Some(Some(end)) = open.last() {
            if pos < *end {
                break;
            }
            open.pop();
        }
        if pos >= data.len() {
            return false;
        }
        if let Some(None) = open.last() {
            if data[pos..].starts_with(&[0, 0]) {
                pos += 2;
                open.pop();
                continue;
            }
        }

        let identifier = data[pos];
        let constructed = identifier & 0x20 != 0;
        pos += 1;
        if identifier & 0x1f == 0x1f {
            while pos < data.len() && data[pos] & 0x80 != 0 {
                pos += 1;
            }
            pos += 1;
        }
        if pos >= data.len() {
            return false;
        }

        let first = data[pos];
        pos += 1;
        let length = if first == 0x80 {
            if !constructed {
                return false;
            }
            None
        } else if first & 0x80 != 0 {
            let count = usize::from(first & 0x7f);
            if count > std::mem::size_of::<usize>() || pos + count > data.len() {
                return false;
            }
            let length = data[pos..pos + count]
                .iter()
                .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
            pos += count;
            Some(length)
        } else {
            Some(usize::from(first))
        };

        let end = match length {
            Some(length) => match pos.checked_add(length) {
                Some(end) => Some(end),
                None => return false,
            },
            None => None,
        };

        if constructed {
            open.push(end);
            if open.len() > max_depth {
                return true;
            }
        } else if let Some(end) = end {
            pos = end;
        }
    }
}

pub(crate) fn require_value<'a>(name: &'static str, value: Option<&'a [u8]>) -> Result<&'a [u8], Error> {
    value.ok_or(Error::MissingValue(name))
}

pub(crate) fn forbid_value(name: &'static str, value: Option<&[u8]>) -> Result<(), Error> {
    match value {
        Some(_) => Err(Error::UnexpectedValue(name)),
        None => Ok(()),
    }
}

pub(crate) fn utf8(name: &'static str, bytes: &[u8]) -> Result<String, Error> {
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::invalid_value(name, "value is not valid UTF-8"))
}
