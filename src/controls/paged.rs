use bytes::Bytes;
use rasn::{types::*, Decode, Encode};
use serde_json::Value;

use crate::{
    controls::{decode_ber, encode_ber, require_value, LdapControl},
    error::Error,
    json::{encode_base64, JsonFields, JsonObject},
};

const JSON_FIELD_SIZE: &str = "size";
const JSON_FIELD_COOKIE: &str = "cookie";

/// Simple paged result control, OID 1.2.840.113556.1.4.319
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimplePagedResultsControl {
    size: u32,
    cookie: OctetString,
    critical: bool,
}

impl SimplePagedResultsControl {
    /// Create paged result control with a given page size
    pub fn new(size: u32) -> Self {
        Self {
            size,
            cookie: OctetString::default(),
            critical: false,
        }
    }

    /// Create paged result control which continues a search with the given cookie
    pub fn with_cookie<C: Into<Bytes>>(size: u32, cookie: C) -> Self {
        Self {
            size,
            cookie: cookie.into(),
            critical: false,
        }
    }

    /// Replace the page size for a given control
    pub fn with_size(self, size: u32) -> Self {
        Self { size, ..self }
    }

    /// Replace the criticality for a given control
    pub fn with_critical(self, critical: bool) -> Self {
        Self { critical, ..self }
    }

    /// Return a cookie
    pub fn cookie(&self) -> &OctetString {
        &self.cookie
    }

    /// Return a current size
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns true if this control indicates more entries are available
    pub fn has_entries(&self) -> bool {
        !self.cookie.is_empty()
    }
}

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct RealSearchControlValue {
    size: u32,
    cookie: OctetString,
}

impl LdapControl for SimplePagedResultsControl {
    const OID: &'static str = crate::oid::SIMPLE_PAGED_RESULTS_CONTROL_OID;
    const NAME: &'static str = "Simple Paged Results Control";

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn encode_value(&self) -> Result<Option<Bytes>, Error> {
        let value = RealSearchControlValue {
            size: self.size,
            cookie: self.cookie.clone(),
        };
        encode_ber(&value).map(Some)
    }

    fn decode_value(critical: bool, value: Option<&[u8]>) -> Result<Self, Error> {
        let value = decode_ber::<RealSearchControlValue>(Self::NAME, require_value(Self::NAME, value)?)?;
        Ok(Self::with_cookie(value.size, value.cookie).with_critical(critical))
    }

    fn value_to_json(&self) -> Option<JsonObject> {
        let mut object = JsonObject::new();
        object.insert(JSON_FIELD_SIZE.to_owned(), Value::from(self.size));
        object.insert(JSON_FIELD_COOKIE.to_owned(), Value::String(encode_base64(&self.cookie)));
        Some(object)
    }

    fn value_from_json(critical: bool, value: &JsonObject, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::new(Self::NAME, value);
        fields.check_fields(&[JSON_FIELD_SIZE, JSON_FIELD_COOKIE], strict)?;
        let size = fields.required_unsigned(JSON_FIELD_SIZE)?;
        let cookie = fields.base64(JSON_FIELD_COOKIE)?.unwrap_or_default();
        Ok(Self::with_cookie(size, cookie).with_critical(critical))
    }
}
