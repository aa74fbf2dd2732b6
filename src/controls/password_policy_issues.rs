use std::fmt;

use bytes::Bytes;
use rasn::{types::*, Decode, Encode};
use serde_json::Value;

use crate::{
    controls::{decode_ber, encode_ber, forbid_value, require_value, utf8, LdapControl},
    error::Error,
    json::{JsonFields, JsonObject},
};

const JSON_FIELD_NOTICES: &str = "notices";
const JSON_FIELD_WARNINGS: &str = "warnings";
const JSON_FIELD_ERRORS: &str = "errors";
const JSON_FIELD_AUTH_FAILURE_REASON: &str = "authentication-failure-reason";
const JSON_FIELD_TYPE: &str = "type";
const JSON_FIELD_NAME: &str = "name";
const JSON_FIELD_MESSAGE: &str = "message";

/// Get password policy state issues request control, OID 1.3.6.1.4.1.30221.2.5.46.
///
/// Sent with a bind request; the control has no value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GetPasswordPolicyStateIssuesRequestControl {
    critical: bool,
}

impl GetPasswordPolicyStateIssuesRequestControl {
    pub fn new(critical: bool) -> Self {
        Self { critical }
    }
}

impl LdapControl for GetPasswordPolicyStateIssuesRequestControl {
    const OID: &'static str = crate::oid::GET_PASSWORD_POLICY_STATE_ISSUES_REQUEST_OID;
    const NAME: &'static str = "Get Password Policy State Issues Request Control";

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

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct IssueValue {
    r#type: u32,
    name: OctetString,
    message: Option<OctetString>,
}

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct IssuesValue {
    #[rasn(tag(context, 0))]
    notices: Option<SequenceOf<IssueValue>>,
    #[rasn(tag(context, 1))]
    warnings: Option<SequenceOf<IssueValue>>,
    #[rasn(tag(context, 2))]
    errors: Option<SequenceOf<IssueValue>>,
    #[rasn(tag(context, 3))]
    auth_failure_reason: Option<IssueValue>,
}

/// A notice, warning or error about the state of an account.
///
/// Each issue has a numeric type, a name such as `password-expiring` and an
/// optional human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PasswordPolicyStateIssue {
    issue_type: u32,
    name: String,
    message: Option<String>,
}

impl PasswordPolicyStateIssue {
    pub fn new<S: Into<String>>(issue_type: u32, name: S, message: Option<String>) -> Self {
        Self {
            issue_type,
            name: name.into(),
            message,
        }
    }

    pub fn issue_type(&self) -> u32 {
        self.issue_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn to_asn(&self) -> IssueValue {
        IssueValue {
            r#type: self.issue_type,
            name: self.name.clone().into(),
            message: self.message.clone().map(Into::into),
        }
    }

    fn from_asn(context: &'static str, value: &IssueValue) -> Result<Self, Error> {
        Ok(Self::new(
            value.r#type,
            utf8(context, &value.name)?,
            value.message.as_deref().map(|m| utf8(context, m)).transpose()?,
        ))
    }

    fn to_json(&self) -> Value {
        let mut object = JsonObject::new();
        object.insert(JSON_FIELD_TYPE.to_owned(), Value::from(self.issue_type));
        object.insert(JSON_FIELD_NAME.to_owned(), Value::String(self.name.clone()));
        if let Some(ref message) = self.message {
            object.insert(JSON_FIELD_MESSAGE.to_owned(), Value::String(message.clone()));
        }
        Value::Object(object)
    }

    fn from_json(context: &'static str, object: &JsonObject, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::new(context, object);
        fields.check_fields(&[JSON_FIELD_TYPE, JSON_FIELD_NAME, JSON_FIELD_MESSAGE], strict)?;
        Ok(Self::new(
            fields.required_unsigned(JSON_FIELD_TYPE)?,
            fields.required_string(JSON_FIELD_NAME)?,
            fields.string(JSON_FIELD_MESSAGE)?.map(ToOwned::to_owned),
        ))
    }
}

impl fmt::Display for PasswordPolicyStateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.issue_type)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// The reason an authentication attempt failed, same shape as an issue
pub type AuthenticationFailureReason = PasswordPolicyStateIssue;

/// Get password policy state issues response control, OID 1.3.6.1.4.1.30221.2.5.47.
///
/// Returned with a bind response; lists the notices, warnings and errors for
/// the account and, on failure, why authentication failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GetPasswordPolicyStateIssuesResponseControl {
    notices: Vec<PasswordPolicyStateIssue>,
    warnings: Vec<PasswordPolicyStateIssue>,
    errors: Vec<PasswordPolicyStateIssue>,
    auth_failure_reason: Option<AuthenticationFailureReason>,
}

impl GetPasswordPolicyStateIssuesResponseControl {
    pub fn new(
        notices: Vec<PasswordPolicyStateIssue>,
        warnings: Vec<PasswordPolicyStateIssue>,
        errors: Vec<PasswordPolicyStateIssue>,
        auth_failure_reason: Option<AuthenticationFailureReason>,
    ) -> Self {
        Self {
            notices,
            warnings,
            errors,
            auth_failure_reason,
        }
    }

    pub fn notices(&self) -> &[PasswordPolicyStateIssue] {
        &self.notices
    }

    pub fn warnings(&self) -> &[PasswordPolicyStateIssue] {
        &self.warnings
    }

    /// Errors, each of which makes the account unusable
    pub fn errors(&self) -> &[PasswordPolicyStateIssue] {
        &self.errors
    }

    pub fn auth_failure_reason(&self) -> Option<&AuthenticationFailureReason> {
        self.auth_failure_reason.as_ref()
    }
}

fn issues_to_asn(issues: &[PasswordPolicyStateIssue]) -> Option<SequenceOf<IssueValue>> {
    if issues.is_empty() {
        None
    } else {
        Some(issues.iter().map(PasswordPolicyStateIssue::to_asn).collect())
    }
}

fn issues_from_asn(
    context: &'static str,
    issues: Option<SequenceOf<IssueValue>>,
) -> Result<Vec<PasswordPolicyStateIssue>, Error> {
    issues
        .unwrap_or_default()
        .iter()
        .map(|i| PasswordPolicyStateIssue::from_asn(context, i))
        .collect()
}

fn issues_from_json(
    fields: &JsonFields,
    name: &str,
    context: &'static str,
    strict: bool,
) -> Result<Vec<PasswordPolicyStateIssue>, Error> {
    fields
        .object_array(name)?
        .unwrap_or_default()
        .into_iter()
        .map(|o| PasswordPolicyStateIssue::from_json(context, o, strict))
        .collect()
}

impl LdapControl for GetPasswordPolicyStateIssuesResponseControl {
    const OID: &'static str = crate::oid::GET_PASSWORD_POLICY_STATE_ISSUES_RESPONSE_OID;
    const NAME: &'static str = "Get Password Policy State Issues Response Control";

    fn is_critical(&self) -> bool {
        false
    }

    fn encode_value(&self) -> Result<Option<Bytes>, Error> {
        let value = IssuesValue {
            notices: issues_to_asn(&self.notices),
            warnings: issues_to_asn(&self.warnings),
            errors: issues_to_asn(&self.errors),
            auth_failure_reason: self.auth_failure_reason.as_ref().map(PasswordPolicyStateIssue::to_asn),
        };
        encode_ber(&value).map(Some)
    }

    fn decode_value(_critical: bool, value: Option<&[u8]>) -> Result<Self, Error> {
        let value = decode_ber::<IssuesValue>(Self::NAME, require_value(Self::NAME, value)?)?;
        Ok(Self::new(
            issues_from_asn(Self::NAME, value.notices)?,
            issues_from_asn(Self::NAME, value.warnings)?,
            issues_from_asn(Self::NAME, value.errors)?,
            value
                .auth_failure_reason
                .as_ref()
                .map(|r| PasswordPolicyStateIssue::from_asn(Self::NAME, r))
                .transpose()?,
        ))
    }

    fn value_to_json(&self) -> Option<JsonObject> {
        let mut object = JsonObject::new();
        for (name, issues) in [
            (JSON_FIELD_NOTICES, &self.notices),
            (JSON_FIELD_WARNINGS, &self.warnings),
            (JSON_FIELD_ERRORS, &self.errors),
        ] {
            if !issues.is_empty() {
                object.insert(name.to_owned(), issues.iter().map(PasswordPolicyStateIssue::to_json).collect());
            }
        }
        if let Some(ref reason) = self.auth_failure_reason {
            object.insert(JSON_FIELD_AUTH_FAILURE_REASON.to_owned(), reason.to_json());
        }
        Some(object)
    }

    fn value_from_json(_critical: bool, value: &JsonObject, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::new(Self::NAME, value);
        fields.check_fields(
            &[
                JSON_FIELD_NOTICES,
                JSON_FIELD_WARNINGS,
                JSON_FIELD_ERRORS,
                JSON_FIELD_AUTH_FAILURE_REASON,
            ],
            strict,
        )?;
        Ok(Self::new(
            issues_from_json(&fields, JSON_FIELD_NOTICES, Self::NAME, strict)?,
            issues_from_json(&fields, JSON_FIELD_WARNINGS, Self::NAME, strict)?,
            issues_from_json(&fields, JSON_FIELD_ERRORS, Self::NAME, strict)?,
            fields
                .object(JSON_FIELD_AUTH_FAILURE_REASON)?
                .map(|o| PasswordPolicyStateIssue::from_json(Self::NAME, o, strict))
                .transpose()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> GetPasswordPolicyStateIssuesResponseControl {
        GetPasswordPolicyStateIssuesResponseControl::new(
            vec![PasswordPolicyStateIssue::new(1, "in-minimum-password-age", None)],
            vec![PasswordPolicyStateIssue::new(
                2,
                "password-expiring",
                Some("The password expires in 3 days".to_owned()),
            )],
            vec![PasswordPolicyStateIssue::new(5, "account-temporarily-locked", None)],
            Some(PasswordPolicyStateIssue::new(
                1,
                "account-not-usable",
                Some("The account is locked".to_owned()),
            )),
        )
    }

    #[test]
    fn test_request_has_no_value() {
        let control = GetPasswordPolicyStateIssuesRequestControl::new(false).to_control().unwrap();
        assert_eq!(control.oid(), "1.3.6.1.4.1.30221.2.5.46");
        assert_eq!(control.value(), None);
    }

    #[test]
    fn test_empty_known_bytes() {
        let control = GetPasswordPolicyStateIssuesResponseControl::default();
        let value = control.encode_value().unwrap().unwrap();
        assert_eq!(&value[..], b"\x30\x00");
        assert_eq!(
            GetPasswordPolicyStateIssuesResponseControl::decode_value(false, Some(&value[..])).unwrap(),
            control
        );
    }

    #[test]
    fn test_warning_known_bytes() {
        let control = GetPasswordPolicyStateIssuesResponseControl::new(
            Vec::new(),
            vec![PasswordPolicyStateIssue::new(2, "exp", None)],
            Vec::new(),
            None,
        );
        let value = control.encode_value().unwrap().unwrap();
        assert_eq!(&value[..], b"\x30\x0c\xa1\x0a\x30\x08\x02\x01\x02\x04\x03exp");
    }

    #[test]
    fn test_ber_round_trip() {
        let control = sample();
        let decoded =
            GetPasswordPolicyStateIssuesResponseControl::from_control(&control.to_control().unwrap()).unwrap();
        assert_eq!(decoded, control);
        assert_eq!(decoded.warnings()[0].message(), Some("The password expires in 3 days"));
        assert_eq!(decoded.auth_failure_reason().unwrap().name(), "account-not-usable");
    }

    #[test]
    fn test_decode_errors() {
        assert!(GetPasswordPolicyStateIssuesResponseControl::decode_value(false, None).is_err());
        // issue without a name
        assert!(
            GetPasswordPolicyStateIssuesResponseControl::decode_value(false, Some(&b"\x30\x07\xa0\x05\x30\x03\x02\x01\x01"[..]))
                .is_err()
        );
    }

    #[test]
    fn test_json() {
        let control = sample();
        let encoded = control.to_json();
        assert_eq!(
            encoded["value-json"],
            json!({
                "notices": [{"type": 1, "name": "in-minimum-password-age"}],
                "warnings": [{
                    "type": 2,
                    "name": "password-expiring",
                    "message": "The password expires in 3 days",
                }],
                "errors": [{"type": 5, "name": "account-temporarily-locked"}],
                "authentication-failure-reason": {
                    "type": 1,
                    "name": "account-not-usable",
                    "message": "The account is locked",
                },
            })
        );
        assert_eq!(
            GetPasswordPolicyStateIssuesResponseControl::from_json(&encoded, true).unwrap(),
            control
        );
    }

    #[test]
    fn test_json_nested_strictness() {
        let encoded = json!({
            "oid": "1.3.6.1.4.1.30221.2.5.47",
            "criticality": false,
            "value-json": {"errors": [{"type": 3, "name": "account-expired", "severity": "high"}]},
        });
        assert!(GetPasswordPolicyStateIssuesResponseControl::from_json(&encoded, true).is_err());
        let lenient = GetPasswordPolicyStateIssuesResponseControl::from_json(&encoded, false).unwrap();
        assert_eq!(lenient.errors()[0].to_string(), "account-expired (3)");
    }

    #[test]
    fn test_json_bad_issue_list() {
        let encoded = json!({
            "oid": "1.3.6.1.4.1.30221.2.5.47",
            "criticality": false,
            "value-json": {"notices": ["not an object"]},
        });
        assert!(GetPasswordPolicyStateIssuesResponseControl::from_json(&encoded, false).is_err());
    }
}
