use bytes::Bytes;
use rasn::{types::*, Decode, Encode};
use serde_json::Value;

use crate::{
    controls::{decode_ber, encode_ber, require_value, utf8, LdapControl},
    error::Error,
    json::{JsonFields, JsonObject},
};

const JSON_FIELD_SERVER_ID: &str = "server-id";
const JSON_FIELD_ALLOW_ALTERNATE_SERVER: &str = "allow-alternate-server";
const JSON_FIELD_PREFER_LOCAL_SERVER: &str = "prefer-local-server";
const JSON_FIELD_PREFER_NON_DEGRADED_SERVER: &str = "prefer-non-degraded-server";

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct RouteToServerValue {
    #[rasn(tag(context, 0))]
    server_id: OctetString,
    #[rasn(tag(context, 1))]
    allow_alternate_server: bool,
    #[rasn(tag(context, 2))]
    prefer_local_server: Option<bool>,
    #[rasn(tag(context, 3))]
    prefer_non_degraded_server: Option<bool>,
}

/// Route to server request control, OID 1.3.6.1.4.1.30221.2.5.16.
///
/// Asks a directory proxy to forward the request to a specific backend server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteToServerRequestControl {
    critical: bool,
    server_id: String,
    allow_alternate_server: bool,
    prefer_local_server: bool,
    prefer_non_degraded_server: bool,
}

impl RouteToServerRequestControl {
    /// Create the control. The server ID must not be empty.
    pub fn new<S: Into<String>>(
        critical: bool,
        server_id: S,
        allow_alternate_server: bool,
        prefer_local_server: bool,
        prefer_non_degraded_server: bool,
    ) -> Result<Self, Error> {
        let server_id = server_id.into();
        if server_id.is_empty() {
            return Err(Error::invalid_value(Self::NAME, "server ID must not be empty"));
        }
        Ok(Self {
            critical,
            server_id,
            allow_alternate_server,
            prefer_local_server,
            prefer_non_degraded_server,
        })
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Whether the request may go to another server if the target is unavailable
    pub fn allow_alternate_server(&self) -> bool {
        self.allow_alternate_server
    }

    pub fn prefer_local_server(&self) -> bool {
        self.prefer_local_server
    }

    pub fn prefer_non_degraded_server(&self) -> bool {
        self.prefer_non_degraded_server
    }
}

impl LdapControl for RouteToServerRequestControl {
    const OID: &'static str = crate::oid::ROUTE_TO_SERVER_REQUEST_OID;
    const NAME: &'static str = "Route to Server Request Control";

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn encode_value(&self) -> Result<Option<Bytes>, Error> {
        // both preferences default to true and are only sent when turned off
        let value = RouteToServerValue {
            server_id: self.server_id.clone().into(),
            allow_alternate_server: self.allow_alternate_server,
            prefer_local_server: (!self.prefer_local_server).then_some(false),
            prefer_non_degraded_server: (!self.prefer_non_degraded_server).then_some(false),
        };
        encode_ber(&value).map(Some)
    }

    fn decode_value(critical: bool, value: Option<&[u8]>) -> Result<Self, Error> {
        let value = decode_ber::<RouteToServerValue>(Self::NAME, require_value(Self::NAME, value)?)?;
        Self::new(
            critical,
            utf8(Self::NAME, &value.server_id)?,
            value.allow_alternate_server,
            value.prefer_local_server.unwrap_or(true),
            value.prefer_non_degraded_server.unwrap_or(true),
        )
    }

    fn value_to_json(&self) -> Option<JsonObject> {
        let mut object = JsonObject::new();
        object.insert(JSON_FIELD_SERVER_ID.to_owned(), Value::String(self.server_id.clone()));
        object.insert(
            JSON_FIELD_ALLOW_ALTERNATE_SERVER.to_owned(),
            Value::Bool(self.allow_alternate_server),
        );
        object.insert(
            JSON_FIELD_PREFER_LOCAL_SERVER.to_owned(),
            Value::Bool(self.prefer_local_server),
        );
        object.insert(
            JSON_FIELD_PREFER_NON_DEGRADED_SERVER.to_owned(),
            Value::Bool(self.prefer_non_degraded_server),
        );
        Some(object)
    }

    fn value_from_json(critical: bool, value: &JsonObject, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::new(Self::NAME, value);
        fields.check_fields(
            &[
                JSON_FIELD_SERVER_ID,
                JSON_FIELD_ALLOW_ALTERNATE_SERVER,
                JSON_FIELD_PREFER_LOCAL_SERVER,
                JSON_FIELD_PREFER_NON_DEGRADED_SERVER,
            ],
            strict,
        )?;
        Self::new(
            critical,
            fields.required_string(JSON_FIELD_SERVER_ID)?,
            fields.required_boolean(JSON_FIELD_ALLOW_ALTERNATE_SERVER)?,
            fields.boolean(JSON_FIELD_PREFER_LOCAL_SERVER)?.unwrap_or(true),
            fields.boolean(JSON_FIELD_PREFER_NON_DEGRADED_SERVER)?.unwrap_or(true),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_known_bytes() {
        let control = RouteToServerRequestControl::new(true, "ds1", false, true, true).unwrap();
        let value = control.encode_value().unwrap().unwrap();
        assert_eq!(&value[..], b"\x30\x08\x80\x03ds1\x81\x01\x00");

        let control = RouteToServerRequestControl::new(true, "ds1", true, false, false).unwrap();
        let value = control.encode_value().unwrap().unwrap();
        assert_eq!(
            &value[..],
            b"\x30\x0e\x80\x03ds1\x81\x01\xff\x82\x01\x00\x83\x01\x00"
        );
        assert_eq!(
            RouteToServerRequestControl::decode_value(true, Some(&value[..])).unwrap(),
            control
        );
    }

    #[test]
    fn test_defaults_on_decode() {
        let decoded =
            RouteToServerRequestControl::decode_value(false, Some(&b"\x30\x08\x80\x03ds2\x81\x01\xff"[..])).unwrap();
        assert_eq!(decoded.server_id(), "ds2");
        assert!(decoded.allow_alternate_server());
        assert!(decoded.prefer_local_server());
        assert!(decoded.prefer_non_degraded_server());
        assert!(!decoded.is_critical());
    }

    #[test]
    fn test_invalid() {
        assert!(RouteToServerRequestControl::new(true, "", false, true, true).is_err());
        assert!(RouteToServerRequestControl::decode_value(true, None).is_err());
        // missing allow-alternate-server element
        assert!(RouteToServerRequestControl::decode_value(true, Some(&b"\x30\x05\x80\x03ds1"[..])).is_err());
        // empty server ID
        assert!(RouteToServerRequestControl::decode_value(true, Some(&b"\x30\x05\x80\x00\x81\x01\x00"[..])).is_err());
    }

    #[test]
    fn test_json() {
        let control = RouteToServerRequestControl::new(true, "ds1", true, false, true).unwrap();
        let encoded = control.to_json();
        assert_eq!(
            encoded,
            json!({
                "oid": "1.3.6.1.4.1.30221.2.5.16",
                "control-name": "Route to Server Request Control",
                "criticality": true,
                "value-json": {
                    "server-id": "ds1",
                    "allow-alternate-server": true,
                    "prefer-local-server": false,
                    "prefer-non-degraded-server": true,
                },
            })
        );
        assert_eq!(RouteToServerRequestControl::from_json(&encoded, true).unwrap(), control);
    }

    #[test]
    fn test_json_defaults_and_errors() {
        let minimal = json!({
            "oid": "1.3.6.1.4.1.30221.2.5.16",
            "criticality": true,
            "value-json": {"server-id": "ds1", "allow-alternate-server": false},
        });
        let decoded = RouteToServerRequestControl::from_json(&minimal, true).unwrap();
        assert!(decoded.prefer_local_server());
        assert!(decoded.prefer_non_degraded_server());

        let missing_id = json!({
            "oid": "1.3.6.1.4.1.30221.2.5.16",
            "criticality": true,
            "value-json": {"allow-alternate-server": false},
        });
        assert!(RouteToServerRequestControl::from_json(&missing_id, false).is_err());

        let wrong_type = json!({
            "oid": "1.3.6.1.4.1.30221.2.5.16",
            "criticality": true,
            "value-json": {"server-id": "ds1", "allow-alternate-server": "no"},
        });
        assert!(RouteToServerRequestControl::from_json(&wrong_type, false).is_err());
    }
}
