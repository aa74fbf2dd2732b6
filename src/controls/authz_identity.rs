use bytes::Bytes;
use serde_json::Value;

use crate::{
    controls::{forbid_value, require_value, utf8, LdapControl},
    error::Error,
    json::{JsonFields, JsonObject},
};

const JSON_FIELD_AUTHORIZATION_ID: &str = "authorization-id";

/// Authorization identity request control (RFC 3829), sent with a bind request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AuthorizationIdentityRequestControl {
    critical: bool,
}

impl AuthorizationIdentityRequestControl {
    pub fn new(critical: bool) -> Self {
        Self { critical }
    }
}

impl LdapControl for AuthorizationIdentityRequestControl {
    const OID: &'static str = crate::oid::AUTHORIZATION_IDENTITY_REQUEST_OID;
    const NAME: &'static str = "Authorization Identity Request Control";

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

/// Authorization identity response control (RFC 3829).
///
/// The value is the authorization ID itself, not BER-encoded. An empty
/// value means the connection is anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorizationIdentityResponseControl {
    authorization_id: String,
    critical: bool,
}

impl AuthorizationIdentityResponseControl {
    pub fn new<S: Into<String>>(authorization_id: S) -> Self {
        Self {
            authorization_id: authorization_id.into(),
            critical: false,
        }
    }

    pub fn with_critical(self, critical: bool) -> Self {
        Self { critical, ..self }
    }

    /// Authorization ID such as `dn:uid=jdoe,dc=example,dc=com` or `u:jdoe`
    pub fn authorization_id(&self) -> &str {
        &self.authorization_id
    }

    /// Returns true if the bound identity is anonymous
    pub fn is_anonymous(&self) -> bool {
        self.authorization_id.is_empty()
    }
}

impl LdapControl for AuthorizationIdentityResponseControl {
    const OID: &'static str = crate::oid::AUTHORIZATION_IDENTITY_RESPONSE_OID;
    const NAME: &'static str = "Authorization Identity Response Control";

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn encode_value(&self) -> Result<Option<Bytes>, Error> {
        Ok(Some(self.authorization_id.clone().into()))
    }

    fn decode_value(critical: bool, value: Option<&[u8]>) -> Result<Self, Error> {
        Ok(Self::new(utf8(Self::NAME, require_value(Self::NAME, value)?)?).with_critical(critical))
    }

    fn value_to_json(&self) -> Option<JsonObject> {
        let mut object = JsonObject::new();
        object.insert(
            JSON_FIELD_AUTHORIZATION_ID.to_owned(),
            Value::String(self.authorization_id.clone()),
        );
        Some(object)
    }

    fn value_from_json(critical: bool, value: &JsonObject, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::new(Self::NAME, value);
        fields.check_fields(&[JSON_FIELD_AUTHORIZATION_ID], strict)?;
        Ok(Self::new(fields.required_string(JSON_FIELD_AUTHORIZATION_ID)?).with_critical(critical))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::controls::Control;

    #[test]
    fn test_request() {
        let control = AuthorizationIdentityRequestControl::new(false).to_control().unwrap();
        assert_eq!(control.value(), None);
        assert!(AuthorizationIdentityRequestControl::from_control(&control).is_ok());
        assert!(AuthorizationIdentityRequestControl::from_control(&Control::new(
            "2.16.840.1.113730.3.4.16",
            false,
            Some(Bytes::from_static(b"x"))
        ))
        .is_err());
    }

    #[test]
    fn test_response_raw_value() {
        let control = Control::new(
            "2.16.840.1.113730.3.4.15",
            false,
            Some(Bytes::from_static(b"dn:uid=jdoe,dc=example,dc=com")),
        );
        let decoded = AuthorizationIdentityResponseControl::from_control(&control).unwrap();
        assert_eq!(decoded.authorization_id(), "dn:uid=jdoe,dc=example,dc=com");
        assert!(!decoded.is_anonymous());
        assert_eq!(decoded.to_control().unwrap(), control);
    }

    #[test]
    fn test_response_anonymous() {
        let decoded = AuthorizationIdentityResponseControl::decode_value(false, Some(&b""[..])).unwrap();
        assert!(decoded.is_anonymous());
        assert!(AuthorizationIdentityResponseControl::decode_value(false, None).is_err());
        assert!(AuthorizationIdentityResponseControl::decode_value(false, Some(&b"\xff"[..])).is_err());
    }

    #[test]
    fn test_response_json() {
        let control = AuthorizationIdentityResponseControl::new("u:jdoe");
        let encoded = control.to_json();
        assert_eq!(encoded["value-json"], json!({"authorization-id": "u:jdoe"}));
        assert_eq!(AuthorizationIdentityResponseControl::from_json(&encoded, true).unwrap(), control);
    }

    #[test]
    fn test_response_keeps_criticality() {
        let control = Control::new(
            "2.16.840.1.113730.3.4.15",
            true,
            Some(Bytes::from_static(b"u:jdoe")),
        );
        let decoded = AuthorizationIdentityResponseControl::from_control(&control).unwrap();
        assert!(decoded.is_critical());
        assert_eq!(decoded.to_control().unwrap(), control);

        let encoded = json!({
            "oid": "2.16.840.1.113730.3.4.15",
            "criticality": true,
            "value-json": {"authorization-id": "u:jdoe"},
        });
        let decoded = AuthorizationIdentityResponseControl::from_json(&encoded, true).unwrap();
        assert_eq!(decoded, AuthorizationIdentityResponseControl::new("u:jdoe").with_critical(true));
        assert_eq!(decoded.to_json()["criticality"], json!(true));
    }
}
