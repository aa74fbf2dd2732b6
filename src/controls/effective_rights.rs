use bytes::Bytes;
use rasn::{types::*, Decode, Encode};
use serde_json::Value;

use crate::{
    controls::{decode_ber, encode_ber, utf8, LdapControl},
    error::Error,
    json::{JsonFields, JsonObject},
};

const JSON_FIELD_AUTHORIZATION_ID: &str = "authorization-id";
const JSON_FIELD_ATTRIBUTES: &str = "attributes";

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct GetRightsValue {
    authz_id: OctetString,
    attributes: Option<SequenceOf<OctetString>>,
}

/// Get effective rights request control, OID 1.3.6.1.4.1.42.2.27.9.5.2.
///
/// Without an authorization ID the control has no value and rights are
/// evaluated for the requester. Attributes can only be given together with
/// an authorization ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GetEffectiveRightsRequestControl {
    critical: bool,
    authorization_id: Option<String>,
    attributes: Vec<String>,
}

impl GetEffectiveRightsRequestControl {
    /// Request rights of the current authorization identity
    pub fn new(critical: bool) -> Self {
        Self {
            critical,
            ..Default::default()
        }
    }

    /// Request rights of another identity, e.g. `dn:uid=jdoe,dc=example,dc=com`,
    /// and the rights to the given attributes
    pub fn for_identity<S, I, T>(critical: bool, authorization_id: S, attributes: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            critical,
            authorization_id: Some(authorization_id.into()),
            attributes: attributes.into_iter().map(|a| a.as_ref().to_owned()).collect(),
        }
    }

    pub fn authorization_id(&self) -> Option<&str> {
        self.authorization_id.as_deref()
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

impl LdapControl for GetEffectiveRightsRequestControl {
    const OID: &'static str = crate::oid::GET_EFFECTIVE_RIGHTS_REQUEST_OID;
    const NAME: &'static str = "Get Effective Rights Request Control";

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn encode_value(&self) -> Result<Option<Bytes>, Error> {
        match self.authorization_id {
            None => Ok(None),
            Some(ref authz_id) => {
                let value = GetRightsValue {
                    authz_id: authz_id.clone().into(),
                    attributes: Some(self.attributes.iter().map(|a| a.clone().into()).collect()),
                };
                encode_ber(&value).map(Some)
            }
        }
    }

    fn decode_value(critical: bool, value: Option<&[u8]>) -> Result<Self, Error> {
        let value = match value {
            None => return Ok(Self::new(critical)),
            Some(value) => decode_ber::<GetRightsValue>(Self::NAME, value)?,
        };
        let attributes = value
            .attributes
            .unwrap_or_default()
            .iter()
            .map(|a| utf8(Self::NAME, a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::for_identity(critical, utf8(Self::NAME, &value.authz_id)?, attributes))
    }

    fn value_to_json(&self) -> Option<JsonObject> {
        let authz_id = self.authorization_id.as_ref()?;
        let mut object = JsonObject::new();
        object.insert(JSON_FIELD_AUTHORIZATION_ID.to_owned(), Value::String(authz_id.clone()));
        if !self.attributes.is_empty() {
            object.insert(
                JSON_FIELD_ATTRIBUTES.to_owned(),
                self.attributes.iter().cloned().map(Value::String).collect(),
            );
        }
        Some(object)
    }

    fn value_from_json(critical: bool, value: &JsonObject, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::new(Self::NAME, value);
        fields.check_fields(&[JSON_FIELD_AUTHORIZATION_ID, JSON_FIELD_ATTRIBUTES], strict)?;
        let attributes = fields.string_array(JSON_FIELD_ATTRIBUTES)?.unwrap_or_default();
        match fields.string(JSON_FIELD_AUTHORIZATION_ID)? {
            Some(authz_id) => Ok(Self::for_identity(critical, authz_id, attributes)),
            None if attributes.is_empty() => Ok(Self::new(critical)),
            None => Err(Error::InvalidJson(format!(
                "{}: '{}' requires '{}'",
                Self::NAME,
                JSON_FIELD_ATTRIBUTES,
                JSON_FIELD_AUTHORIZATION_ID
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_without_identity() {
        let control = GetEffectiveRightsRequestControl::new(true);
        let generic = control.to_control().unwrap();
        assert_eq!(generic.value(), None);
        assert_eq!(GetEffectiveRightsRequestControl::from_control(&generic).unwrap(), control);
        assert!(control.to_json().get("value-json").is_none());
    }

    #[test]
    fn test_known_bytes() {
        let control = GetEffectiveRightsRequestControl::for_identity(false, "u:jdoe", ["cn", "sn"]);
        let value = control.encode_value().unwrap().unwrap();
        assert_eq!(&value[..], b"\x30\x12\x04\x06u:jdoe\x30\x08\x04\x02cn\x04\x02sn");
        let decoded = GetEffectiveRightsRequestControl::decode_value(false, Some(&value[..])).unwrap();
        assert_eq!(decoded, control);
        assert_eq!(decoded.attributes(), ["cn", "sn"]);
    }

    #[test]
    fn test_decode_without_attribute_list() {
        let decoded = GetEffectiveRightsRequestControl::decode_value(false, Some(&b"\x30\x08\x04\x06u:jdoe"[..])).unwrap();
        assert_eq!(decoded.authorization_id(), Some("u:jdoe"));
        assert!(decoded.attributes().is_empty());
    }

    #[test]
    fn test_decode_malformed() {
        assert!(GetEffectiveRightsRequestControl::decode_value(false, Some(&b"\x04\x06u:jdoe"[..])).is_err());
        assert!(GetEffectiveRightsRequestControl::decode_value(false, Some(&b""[..])).is_err());
    }

    #[test]
    fn test_json() {
        let control =
            GetEffectiveRightsRequestControl::for_identity(false, "dn:uid=jdoe,dc=example,dc=com", ["userPassword"]);
        let encoded = control.to_json();
        assert_eq!(
            encoded["value-json"],
            json!({"authorization-id": "dn:uid=jdoe,dc=example,dc=com", "attributes": ["userPassword"]})
        );
        assert_eq!(GetEffectiveRightsRequestControl::from_json(&encoded, true).unwrap(), control);
    }

    #[test]
    fn test_json_attributes_require_identity() {
        let encoded = json!({
            "oid": "1.3.6.1.4.1.42.2.27.9.5.2",
            "criticality": false,
            "value-json": {"attributes": ["cn"]},
        });
        assert!(GetEffectiveRightsRequestControl::from_json(&encoded, false).is_err());

        let empty = json!({
            "oid": "1.3.6.1.4.1.42.2.27.9.5.2",
            "criticality": false,
            "value-json": {},
        });
        assert_eq!(
            GetEffectiveRightsRequestControl::from_json(&empty, true).unwrap(),
            GetEffectiveRightsRequestControl::new(false)
        );
    }
}
