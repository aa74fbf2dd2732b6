use bytes::Bytes;
use rasn::{types::*, Decode, Encode};
use serde_json::Value;

use crate::{
    controls::{decode_ber, encode_ber, require_value, utf8, LdapControl},
    error::Error,
    json::{JsonFields, JsonObject},
};

const JSON_FIELD_DOWNSTREAM_REQUEST: &str = "downstream-request";
const JSON_FIELD_DOWNSTREAM_CLIENT_ADDRESS: &str = "downstream-client-address";
const JSON_FIELD_DOWNSTREAM_CLIENT_SECURE: &str = "downstream-client-secure";
const JSON_FIELD_CLIENT_IDENTITY: &str = "client-identity";
const JSON_FIELD_CLIENT_NAME: &str = "client-name";
const JSON_FIELD_CLIENT_SESSION_ID: &str = "client-session-id";
const JSON_FIELD_CLIENT_REQUEST_ID: &str = "client-request-id";

const JSON_FIELD_UPSTREAM_RESPONSE: &str = "upstream-response";
const JSON_FIELD_UPSTREAM_SERVER_ADDRESS: &str = "upstream-server-address";
const JSON_FIELD_UPSTREAM_SERVER_SECURE: &str = "upstream-server-secure";
const JSON_FIELD_SERVER_NAME: &str = "server-name";
const JSON_FIELD_SERVER_SESSION_ID: &str = "server-session-id";
const JSON_FIELD_SERVER_RESPONSE_ID: &str = "server-response-id";

const REQUEST_NAME: &str = "Intermediate Client Request Control";
const RESPONSE_NAME: &str = "Intermediate Client Response Control";

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct RequestValueAsn {
    #[rasn(tag(context, 0))]
    downstream_request: Option<Box<RequestValueAsn>>,
    #[rasn(tag(context, 1))]
    downstream_client_address: Option<OctetString>,
    #[rasn(tag(context, 2))]
    downstream_client_secure: Option<bool>,
    #[rasn(tag(context, 3))]
    client_identity: Option<OctetString>,
    #[rasn(tag(context, 4))]
    client_name: Option<OctetString>,
    #[rasn(tag(context, 5))]
    client_session_id: Option<OctetString>,
    #[rasn(tag(context, 6))]
    client_request_id: Option<OctetString>,
}

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct ResponseValueAsn {
    #[rasn(tag(context, 0))]
    upstream_response: Option<Box<ResponseValueAsn>>,
    #[rasn(tag(context, 1))]
    upstream_server_address: Option<OctetString>,
    #[rasn(tag(context, 2))]
    upstream_server_secure: Option<bool>,
    #[rasn(tag(context, 3))]
    server_name: Option<OctetString>,
    #[rasn(tag(context, 4))]
    server_session_id: Option<OctetString>,
    #[rasn(tag(context, 5))]
    server_response_id: Option<OctetString>,
}

fn to_octets(value: &Option<String>) -> Option<OctetString> {
    value.clone().map(Into::into)
}

fn from_octets(context: &'static str, value: Option<OctetString>) -> Result<Option<String>, Error> {
    value.map(|v| utf8(context, &v)).transpose()
}

fn insert_string(object: &mut JsonObject, name: &str, value: &Option<String>) {
    if let Some(ref value) = value {
        object.insert(name.to_owned(), Value::String(value.clone()));
    }
}

fn insert_bool(object: &mut JsonObject, name: &str, value: Option<bool>) {
    if let Some(value) = value {
        object.insert(name.to_owned(), Value::Bool(value));
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(ToOwned::to_owned)
}

/// Information about a client on whose behalf a request is forwarded.
///
/// A chain of intermediaries is represented by nesting the value of the
/// next client downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IntermediateClientRequestValue {
    pub downstream_request: Option<Box<IntermediateClientRequestValue>>,
    pub downstream_client_address: Option<String>,
    pub downstream_client_secure: Option<bool>,
    pub client_identity: Option<String>,
    pub client_name: Option<String>,
    pub client_session_id: Option<String>,
    pub client_request_id: Option<String>,
}

impl IntermediateClientRequestValue {
    fn to_asn(&self) -> RequestValueAsn {
        RequestValueAsn {
            downstream_request: self.downstream_request.as_ref().map(|v| Box::new(v.to_asn())),
            downstream_client_address: to_octets(&self.downstream_client_address),
            downstream_client_secure: self.downstream_client_secure,
            client_identity: to_octets(&self.client_identity),
            client_name: to_octets(&self.client_name),
            client_session_id: to_octets(&self.client_session_id),
            client_request_id: to_octets(&self.client_request_id),
        }
    }

    fn from_asn(value: RequestValueAsn) -> Result<Self, Error> {
        Ok(Self {
            downstream_request: value
                .downstream_request
                .map(|v| Self::from_asn(*v).map(Box::new))
                .transpose()?,
            downstream_client_address: from_octets(REQUEST_NAME, value.downstream_client_address)?,
            downstream_client_secure: value.downstream_client_secure,
            client_identity: from_octets(REQUEST_NAME, value.client_identity)?,
            client_name: from_octets(REQUEST_NAME, value.client_name)?,
            client_session_id: from_octets(REQUEST_NAME, value.client_session_id)?,
            client_request_id: from_octets(REQUEST_NAME, value.client_request_id)?,
        })
    }

    fn to_json(&self) -> JsonObject {
        let mut object = JsonObject::new();
        if let Some(ref downstream) = self.downstream_request {
            object.insert(
                JSON_FIELD_DOWNSTREAM_REQUEST.to_owned(),
                Value::Object(downstream.to_json()),
            );
        }
        insert_string(
            &mut object,
            JSON_FIELD_DOWNSTREAM_CLIENT_ADDRESS,
            &self.downstream_client_address,
        );
        insert_bool(
            &mut object,
            JSON_FIELD_DOWNSTREAM_CLIENT_SECURE,
            self.downstream_client_secure,
        );
        insert_string(&mut object, JSON_FIELD_CLIENT_IDENTITY, &self.client_identity);
        insert_string(&mut object, JSON_FIELD_CLIENT_NAME, &self.client_name);
        insert_string(&mut object, JSON_FIELD_CLIENT_SESSION_ID, &self.client_session_id);
        insert_string(&mut object, JSON_FIELD_CLIENT_REQUEST_ID, &self.client_request_id);
        object
    }

    fn from_json(object: &JsonObject, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::new(REQUEST_NAME, object);
        fields.check_fields(
            &[
                JSON_FIELD_DOWNSTREAM_REQUEST,
                JSON_FIELD_DOWNSTREAM_CLIENT_ADDRESS,
                JSON_FIELD_DOWNSTREAM_CLIENT_SECURE,
                JSON_FIELD_CLIENT_IDENTITY,
                JSON_FIELD_CLIENT_NAME,
                JSON_FIELD_CLIENT_SESSION_ID,
                JSON_FIELD_CLIENT_REQUEST_ID,
            ],
            strict,
        )?;
        Ok(Self {
            downstream_request: fields
                .object(JSON_FIELD_DOWNSTREAM_REQUEST)?
                .map(|o| Self::from_json(o, strict).map(Box::new))
                .transpose()?,
            downstream_client_address: owned(fields.string(JSON_FIELD_DOWNSTREAM_CLIENT_ADDRESS)?),
            downstream_client_secure: fields.boolean(JSON_FIELD_DOWNSTREAM_CLIENT_SECURE)?,
            client_identity: owned(fields.string(JSON_FIELD_CLIENT_IDENTITY)?),
            client_name: owned(fields.string(JSON_FIELD_CLIENT_NAME)?),
            client_session_id: owned(fields.string(JSON_FIELD_CLIENT_SESSION_ID)?),
            client_request_id: owned(fields.string(JSON_FIELD_CLIENT_REQUEST_ID)?),
        })
    }
}

/// Information about a server that processed a forwarded request.
///
/// A chain of servers is represented by nesting the value returned by the
/// next server upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IntermediateClientResponseValue {
    pub upstream_response: Option<Box<IntermediateClientResponseValue>>,
    pub upstream_server_address: Option<String>,
    pub upstream_server_secure: Option<bool>,
    pub server_name: Option<String>,
    pub server_session_id: Option<String>,
    pub server_response_id: Option<String>,
}

impl IntermediateClientResponseValue {
    fn to_asn(&self) -> ResponseValueAsn {
        ResponseValueAsn {
            upstream_response: self.upstream_response.as_ref().map(|v| Box::new(v.to_asn())),
            upstream_server_address: to_octets(&self.upstream_server_address),
            upstream_server_secure: self.upstream_server_secure,
            server_name: to_octets(&self.server_name),
            server_session_id: to_octets(&self.server_session_id),
            server_response_id: to_octets(&self.server_response_id),
        }
    }

    fn from_asn(value: ResponseValueAsn) -> Result<Self, Error> {
        Ok(Self {
            upstream_response: value
                .upstream_response
                .map(|v| Self::from_asn(*v).map(Box::new))
                .transpose()?,
            upstream_server_address: from_octets(RESPONSE_NAME, value.upstream_server_address)?,
            upstream_server_secure: value.upstream_server_secure,
            server_name: from_octets(RESPONSE_NAME, value.server_name)?,
            server_session_id: from_octets(RESPONSE_NAME, value.server_session_id)?,
            server_response_id: from_octets(RESPONSE_NAME, value.server_response_id)?,
        })
    }

    fn to_json(&self) -> JsonObject {
        let mut object = JsonObject::new();
        if let Some(ref upstream) = self.upstream_response {
            object.insert(
                JSON_FIELD_UPSTREAM_RESPONSE.to_owned(),
                Value::Object(upstream.to_json()),
            );
        }
        insert_string(
            &mut object,
            JSON_FIELD_UPSTREAM_SERVER_ADDRESS,
            &self.upstream_server_address,
        );
        insert_bool(
            &mut object,
            JSON_FIELD_UPSTREAM_SERVER_SECURE,
            self.upstream_server_secure,
        );
        insert_string(&mut object, JSON_FIELD_SERVER_NAME, &self.server_name);
        insert_string(&mut object, JSON_FIELD_SERVER_SESSION_ID, &self.server_session_id);
        insert_string(&mut object, JSON_FIELD_SERVER_RESPONSE_ID, &self.server_response_id);
        object
    }

    fn from_json(object: &JsonObject, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::new(RESPONSE_NAME, object);
        fields.check_fields(
            &[
                JSON_FIELD_UPSTREAM_RESPONSE,
                JSON_FIELD_UPSTREAM_SERVER_ADDRESS,
                JSON_FIELD_UPSTREAM_SERVER_SECURE,
                JSON_FIELD_SERVER_NAME,
                JSON_FIELD_SERVER_SESSION_ID,
                JSON_FIELD_SERVER_RESPONSE_ID,
            ],
            strict,
        )?;
        Ok(Self {
            upstream_response: fields
                .object(JSON_FIELD_UPSTREAM_RESPONSE)?
                .map(|o| Self::from_json(o, strict).map(Box::new))
                .transpose()?,
            upstream_server_address: owned(fields.string(JSON_FIELD_UPSTREAM_SERVER_ADDRESS)?),
            upstream_server_secure: fields.boolean(JSON_FIELD_UPSTREAM_SERVER_SECURE)?,
            server_name: owned(fields.string(JSON_FIELD_SERVER_NAME)?),
            server_session_id: owned(fields.string(JSON_FIELD_SERVER_SESSION_ID)?),
            server_response_id: owned(fields.string(JSON_FIELD_SERVER_RESPONSE_ID)?),
        })
    }
}

/// Intermediate client request control, OID 1.3.6.1.4.1.30221.2.5.2
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntermediateClientRequestControl {
    critical: bool,
    value: IntermediateClientRequestValue,
}

impl IntermediateClientRequestControl {
    /// Create the control; it is usually critical
    pub fn new(critical: bool, value: IntermediateClientRequestValue) -> Self {
        Self { critical, value }
    }

    pub fn value(&self) -> &IntermediateClientRequestValue {
        &self.value
    }
}

impl LdapControl for IntermediateClientRequestControl {
    const OID: &'static str = crate::oid::INTERMEDIATE_CLIENT_CONTROL_OID;
    const NAME: &'static str = REQUEST_NAME;

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn encode_value(&self) -> Result<Option<Bytes>, Error> {
        encode_ber(&self.value.to_asn()).map(Some)
    }

    fn decode_value(critical: bool, value: Option<&[u8]>) -> Result<Self, Error> {
        let value = decode_ber::<RequestValueAsn>(Self::NAME, require_value(Self::NAME, value)?)?;
        Ok(Self::new(critical, IntermediateClientRequestValue::from_asn(value)?))
    }

    fn value_to_json(&self) -> Option<JsonObject> {
        Some(self.value.to_json())
    }

    fn value_from_json(critical: bool, value: &JsonObject, strict: bool) -> Result<Self, Error> {
        Ok(Self::new(
            critical,
            IntermediateClientRequestValue::from_json(value, strict)?,
        ))
    }
}

/// Intermediate client response control, OID 1.3.6.1.4.1.30221.2.5.2
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntermediateClientResponseControl {
    critical: bool,
    value: IntermediateClientResponseValue,
}

impl IntermediateClientResponseControl {
    pub fn new(critical: bool, value: IntermediateClientResponseValue) -> Self {
        Self { critical, value }
    }

    pub fn value(&self) -> &IntermediateClientResponseValue {
        &self.value
    }
}

impl LdapControl for IntermediateClientResponseControl {
    const OID: &'static str = crate::oid::INTERMEDIATE_CLIENT_CONTROL_OID;
    const NAME: &'static str = RESPONSE_NAME;

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn encode_value(&self) -> Result<Option<Bytes>, Error> {
        encode_ber(&self.value.to_asn()).map(Some)
    }

    fn decode_value(critical: bool, value: Option<&[u8]>) -> Result<Self, Error> {
        let value = decode_ber::<ResponseValueAsn>(Self::NAME, require_value(Self::NAME, value)?)?;
        Ok(Self::new(critical, IntermediateClientResponseValue::from_asn(value)?))
    }

    fn value_to_json(&self) -> Option<JsonObject> {
        Some(self.value.to_json())
    }

    fn value_from_json(critical: bool, value: &JsonObject, strict: bool) -> Result<Self, Error> {
        Ok(Self::new(
            critical,
            IntermediateClientResponseValue::from_json(value, strict)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response_chain() -> IntermediateClientResponseValue {
        IntermediateClientResponseValue {
            upstream_response: Some(Box::new(IntermediateClientResponseValue {
                upstream_server_address: Some("10.0.0.2".to_owned()),
                upstream_server_secure: Some(true),
                server_name: Some("backend".to_owned()),
                server_session_id: Some("conn=12".to_owned()),
                server_response_id: Some("op=3".to_owned()),
                ..Default::default()
            })),
            upstream_server_address: Some("10.0.0.1".to_owned()),
            upstream_server_secure: Some(false),
            server_name: Some("proxy".to_owned()),
            server_session_id: Some("conn=7".to_owned()),
            server_response_id: Some("op=1".to_owned()),
        }
    }

    #[test]
    fn test_request_known_bytes() {
        let value = IntermediateClientRequestValue {
            client_name: Some("app".to_owned()),
            ..Default::default()
        };
        let control = IntermediateClientRequestControl::new(true, value);
        let encoded = control.encode_value().unwrap().unwrap();
        assert_eq!(&encoded[..], b"\x30\x05\x84\x03app");
        assert_eq!(
            IntermediateClientRequestControl::decode_value(true, Some(&encoded[..])).unwrap(),
            control
        );
    }

    #[test]
    fn test_nested_request_round_trip() {
        let value = IntermediateClientRequestValue {
            downstream_request: Some(Box::new(IntermediateClientRequestValue {
                client_identity: Some("dn:uid=enduser,dc=example,dc=com".to_owned()),
                client_request_id: Some("42".to_owned()),
                ..Default::default()
            })),
            downstream_client_address: Some("192.168.1.5".to_owned()),
            downstream_client_secure: Some(true),
            client_identity: Some("u:proxy".to_owned()),
            client_name: Some("web-portal".to_owned()),
            client_session_id: Some("session-1".to_owned()),
            client_request_id: Some("request-1".to_owned()),
        };
        let control = IntermediateClientRequestControl::new(true, value);
        let decoded = IntermediateClientRequestControl::from_control(&control.to_control().unwrap()).unwrap();
        assert_eq!(decoded, control);
        assert_eq!(
            decoded.value().downstream_request.as_ref().unwrap().client_request_id.as_deref(),
            Some("42")
        );
        assert_eq!(IntermediateClientRequestControl::from_json(&control.to_json(), true).unwrap(), control);
    }

    #[test]
    fn test_nested_response_known_bytes() {
        let value = IntermediateClientResponseValue {
            upstream_response: Some(Box::new(IntermediateClientResponseValue {
                server_name: Some("b".to_owned()),
                ..Default::default()
            })),
            upstream_server_secure: Some(true),
            ..Default::default()
        };
        let encoded = IntermediateClientResponseControl::new(false, value.clone())
            .encode_value()
            .unwrap()
            .unwrap();
        assert_eq!(&encoded[..], b"\x30\x08\xa0\x03\x83\x01b\x82\x01\xff");
        let decoded = IntermediateClientResponseControl::decode_value(false, Some(&encoded[..])).unwrap();
        assert_eq!(decoded.value(), &value);
    }

    #[test]
    fn test_response_json() {
        let control = IntermediateClientResponseControl::new(false, response_chain());
        let encoded = control.to_json();
        assert_eq!(
            encoded["value-json"],
            json!({
                "upstream-response": {
                    "upstream-server-address": "10.0.0.2",
                    "upstream-server-secure": true,
                    "server-name": "backend",
                    "server-session-id": "conn=12",
                    "server-response-id": "op=3",
                },
                "upstream-server-address": "10.0.0.1",
                "upstream-server-secure": false,
                "server-name": "proxy",
                "server-session-id": "conn=7",
                "server-response-id": "op=1",
            })
        );
        assert_eq!(IntermediateClientResponseControl::from_json(&encoded, true).unwrap(), control);
        assert_eq!(
            IntermediateClientResponseControl::from_control(&control.to_control().unwrap()).unwrap(),
            control
        );
    }

    #[test]
    fn test_response_json_nested_unknown_field() {
        let encoded = json!({
            "oid": "1.3.6.1.4.1.30221.2.5.2",
            "criticality": false,
            "value-json": {"upstream-response": {"server-name": "b", "colour": "blue"}},
        });
        assert!(IntermediateClientResponseControl::from_json(&encoded, true).is_err());
        let decoded = IntermediateClientResponseControl::from_json(&encoded, false).unwrap();
        assert_eq!(
            decoded.value().upstream_response.as_ref().unwrap().server_name.as_deref(),
            Some("b")
        );
    }

    #[test]
    fn test_decode_errors() {
        assert!(IntermediateClientResponseControl::decode_value(false, None).is_err());
        // truncated server name
        assert!(IntermediateClientResponseControl::decode_value(false, Some(&b"\x30\x05\x83\x03ab"[..])).is_err());
        // server name is not UTF-8
        assert!(IntermediateClientResponseControl::decode_value(false, Some(&b"\x30\x03\x83\x01\xff"[..])).is_err());
        let wrong_type = json!({
            "oid": "1.3.6.1.4.1.30221.2.5.2",
            "criticality": true,
            "value-json": {"downstream-client-secure": "yes"},
        });
        assert!(IntermediateClientRequestControl::from_json(&wrong_type, false).is_err());
    }

    #[test]
    fn test_deeply_nested_value() {
        let depth = 20_000;
        let mut value = b"\x30\x80".to_vec();
        value.extend(std::iter::repeat(&b"\xa0\x80"[..]).take(depth).flatten());
        value.extend(std::iter::repeat(0u8).take(2 * depth + 2));
        assert!(matches!(
            IntermediateClientResponseControl::decode_value(false, Some(&value[..])),
            Err(Error::InvalidValue { .. })
        ));
        assert!(matches!(
            IntermediateClientRequestControl::decode_value(false, Some(&value[..])),
            Err(Error::InvalidValue { .. })
        ));
    }
}
