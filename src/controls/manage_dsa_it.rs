use bytes::Bytes;

use crate::{
    controls::{forbid_value, LdapControl},
    error::Error,
    json::JsonObject,
};

/// ManageDsaIT request control (RFC 3296): treat referral objects as ordinary entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ManageDsaItRequestControl {
    critical: bool,
}

impl ManageDsaItRequestControl {
    pub fn new(critical: bool) -> Self {
        Self { critical }
    }
}

impl LdapControl for ManageDsaItRequestControl {
    const OID: &'static str = crate::oid::MANAGE_DSA_IT_CONTROL_OID;
    const NAME: &'static str = "ManageDsaIT Request Control";

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn encode_value(&self) -> Result<Option<Bytes>, Error> {
        Ok(None)
    }

    fn decode_value(critical: bool, value: Option<&[u8]>) -> Result<Self, Error> {
        forbid_value(Self::NAME, value)?;
        Ok(Self::new(critical))
    }

    fn value_to_json(&self) -> Option<JsonObject> {
        None
    }

    fn value_from_json(_critical: bool, _value: &JsonObject, _strict: bool) -> Result<Self, Error> {
        Err(Error::UnexpectedValue(Self::NAME))
    }
}
