use log::debug;
use serde_json::Value;

use crate::{
    controls::{
        AccountUsableRequestControl, AccountUsableResponseControl, AuthorizationIdentityRequestControl,
        AuthorizationIdentityResponseControl, Control, ControlDirection, GetEffectiveRightsRequestControl,
        GetPasswordPolicyStateIssuesRequestControl, GetPasswordPolicyStateIssuesResponseControl,
        IntermediateClientRequestControl, IntermediateClientResponseControl, JoinRequestControl, JsonEnvelope,
        LdapControl, ManageDsaItRequestControl, RouteToServerRequestControl, SimplePagedResultsControl,
    },
    error::Error,
};

/// Any of the typed controls known to this crate
#[derive(Debug, Clone, PartialEq)]
pub enum KnownControl {
    SimplePagedResults(SimplePagedResultsControl),
    AccountUsableRequest(AccountUsableRequestControl),
    AccountUsableResponse(AccountUsableResponseControl),
    AuthorizationIdentityRequest(AuthorizationIdentityRequestControl),
    AuthorizationIdentityResponse(AuthorizationIdentityResponseControl),
    GetEffectiveRightsRequest(GetEffectiveRightsRequestControl),
    GetPasswordPolicyStateIssuesRequest(GetPasswordPolicyStateIssuesRequestControl),
    GetPasswordPolicyStateIssuesResponse(GetPasswordPolicyStateIssuesResponseControl),
    IntermediateClientRequest(IntermediateClientRequestControl),
    IntermediateClientResponse(IntermediateClientResponseControl),
    JoinRequest(JoinRequestControl),
    ManageDsaItRequest(ManageDsaItRequestControl),
    RouteToServerRequest(RouteToServerRequestControl),
}

// Dispatch on the OID and direction; evaluates to None for unknown controls.
macro_rules! dispatch {
    ($oid:expr, $direction:expr, |$ty:ident, $variant:ident| $body:expr) => {{
        match ($oid, $direction) {
            (crate::oid::SIMPLE_PAGED_RESULTS_CONTROL_OID, _) => {
                type $ty = SimplePagedResultsControl;
                let $variant = KnownControl::SimplePagedResults;
                Some($body)
            }
            (crate::oid::ACCOUNT_USABLE_CONTROL_OID, ControlDirection::Request) => {
                type $ty = AccountUsableRequestControl;
                let $variant = KnownControl::AccountUsableRequest;
                Some($body)
            }
            (crate::oid::ACCOUNT_USABLE_CONTROL_OID, ControlDirection::Response) => {
                type $ty = AccountUsableResponseControl;
                let $variant = KnownControl::AccountUsableResponse;
                Some($body)
            }
            (crate::oid::AUTHORIZATION_IDENTITY_REQUEST_OID, ControlDirection::Request) => {
                type $ty = AuthorizationIdentityRequestControl;
                let $variant = KnownControl::AuthorizationIdentityRequest;
                Some($body)
            }
            (crate::oid::AUTHORIZATION_IDENTITY_RESPONSE_OID, ControlDirection::Response) => {
                type $ty = AuthorizationIdentityResponseControl;
                let $variant = KnownControl::AuthorizationIdentityResponse;
                Some($body)
            }
            (crate::oid::GET_EFFECTIVE_RIGHTS_REQUEST_OID, ControlDirection::Request) => {
                type $ty = GetEffectiveRightsRequestControl;
                let $variant = KnownControl::GetEffectiveRightsRequest;
                Some($body)
            }
            (crate::oid::GET_PASSWORD_POLICY_STATE_ISSUES_REQUEST_OID, ControlDirection::Request) => {
                type $ty = GetPasswordPolicyStateIssuesRequestControl;
                let $variant = KnownControl::GetPasswordPolicyStateIssuesRequest;
                Some($body)
            }
            (crate::oid::GET_PASSWORD_POLICY_STATE_ISSUES_RESPONSE_OID, ControlDirection::Response) => {
                type $ty = GetPasswordPolicyStateIssuesResponseControl;
                let $variant = KnownControl::GetPasswordPolicyStateIssuesResponse;
                Some($body)
            }
            (crate::oid::INTERMEDIATE_CLIENT_CONTROL_OID, ControlDirection::Request) => {
                type $ty = IntermediateClientRequestControl;
                let $variant = KnownControl::IntermediateClientRequest;
                Some($body)
            }
            (crate::oid::INTERMEDIATE_CLIENT_CONTROL_OID, ControlDirection::Response) => {
                type $ty = IntermediateClientResponseControl;
                let $variant = KnownControl::IntermediateClientResponse;
                Some($body)
            }
            (crate::oid::JOIN_REQUEST_CONTROL_OID, ControlDirection::Request) => {
                type $ty = JoinRequestControl;
                let $variant = KnownControl::JoinRequest;
                Some($body)
            }
            (crate::oid::MANAGE_DSA_IT_CONTROL_OID, ControlDirection::Request) => {
                type $ty = ManageDsaItRequestControl;
                let $variant = KnownControl::ManageDsaItRequest;
                Some($body)
            }
            (crate::oid::ROUTE_TO_SERVER_REQUEST_OID, ControlDirection::Request) => {
                type $ty = RouteToServerRequestControl;
                let $variant = KnownControl::RouteToServerRequest;
                Some($body)
            }
            _ => None,
        }
    }};
}

// Apply an expression to the typed control inside any variant.
macro_rules! with_inner {
    ($value:expr, |$c:ident| $body:expr) => {
        match $value {
            KnownControl::SimplePagedResults($c) => $body,
            KnownControl::AccountUsableRequest($c) => $body,
            KnownControl::AccountUsableResponse($c) => $body,
            KnownControl::AuthorizationIdentityRequest($c) => $body,
            KnownControl::AuthorizationIdentityResponse($c) => $body,
            KnownControl::GetEffectiveRightsRequest($c) => $body,
            KnownControl::GetPasswordPolicyStateIssuesRequest($c) => $body,
            KnownControl::GetPasswordPolicyStateIssuesResponse($c) => $body,
            KnownControl::IntermediateClientRequest($c) => $body,
            KnownControl::IntermediateClientResponse($c) => $body,
            KnownControl::JoinRequest($c) => $body,
            KnownControl::ManageDsaItRequest($c) => $body,
            KnownControl::RouteToServerRequest($c) => $body,
        }
    };
}

fn oid_of<C: LdapControl>(_: &C) -> &'static str {
    C::OID
}

fn name_of<C: LdapControl>(_: &C) -> &'static str {
    C::NAME
}

impl KnownControl {
    /// Decode a generic control into a typed one.
    ///
    /// Returns `Ok(None)` when no typed control exists for the OID in the given direction.
    pub fn decode(control: &Control, direction: ControlDirection) -> Result<Option<Self>, Error> {
        let decoded = dispatch!(control.oid(), direction, |C, variant| C::from_control(control).map(variant));
        match decoded {
            Some(result) => result.map(Some),
            None => {
                debug!("No typed {:?} control for OID {}", direction, control.oid());
                Ok(None)
            }
        }
    }

    /// Decode a JSON control object into a typed control, selected by its `oid` field.
    ///
    /// Returns `Ok(None)` when no typed control exists for the OID in the given direction.
    pub fn from_json(value: &Value, strict: bool, direction: ControlDirection) -> Result<Option<Self>, Error> {
        let envelope = JsonEnvelope::parse(value, strict)?;
        dispatch!(envelope.oid, direction, |C, variant| C::from_json(value, strict).map(variant)).transpose()
    }

    /// Human-readable name for a control OID, if it belongs to a known control type
    pub fn name_for_oid(oid: &str) -> Option<&'static str> {
        dispatch!(oid, ControlDirection::Request, |C, _variant| C::NAME)
            .or_else(|| dispatch!(oid, ControlDirection::Response, |C, _variant| C::NAME))
    }

    pub fn oid(&self) -> &'static str {
        with_inner!(self, |c| oid_of(c))
    }

    pub fn name(&self) -> &'static str {
        with_inner!(self, |c| name_of(c))
    }

    pub fn is_critical(&self) -> bool {
        with_inner!(self, |c| c.is_critical())
    }

    /// Whether the control is sent with requests or returned with responses,
    /// `None` for simple paged results which travels both ways
    pub fn direction(&self) -> Option<ControlDirection> {
        match self {
            KnownControl::SimplePagedResults(_) => None,
            KnownControl::AccountUsableResponse(_)
            | KnownControl::AuthorizationIdentityResponse(_)
            | KnownControl::GetPasswordPolicyStateIssuesResponse(_)
            | KnownControl::IntermediateClientResponse(_) => Some(ControlDirection::Response),
            _ => Some(ControlDirection::Request),
        }
    }

    pub fn to_control(&self) -> Result<Control, Error> {
        with_inner!(self, |c| c.to_control())
    }

    /// Encode as a JSON control object with a `value-json` value
    pub fn to_json(&self) -> Value {
        with_inner!(self, |c| c.to_json())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::controls::IntermediateClientRequestValue;

    #[test]
    fn test_decode_by_direction() {
        let response = AccountUsableResponseControl::usable(Some(3600)).to_control().unwrap();
        let decoded = KnownControl::decode(&response, ControlDirection::Response).unwrap();
        assert_eq!(
            decoded,
            Some(KnownControl::AccountUsableResponse(AccountUsableResponseControl::usable(Some(3600))))
        );

        // the request form has no value
        assert!(KnownControl::decode(&response, ControlDirection::Request).is_err());

        let request = AccountUsableRequestControl::new(true).to_control().unwrap();
        let decoded = KnownControl::decode(&request, ControlDirection::Request).unwrap().unwrap();
        assert_eq!(decoded.direction(), Some(ControlDirection::Request));
        assert!(decoded.is_critical());
    }

    #[test]
    fn test_paged_results_in_both_directions() {
        let paged = SimplePagedResultsControl::with_cookie(10, &b"c"[..]);
        let control = paged.to_control().unwrap();
        for direction in [ControlDirection::Request, ControlDirection::Response] {
            let decoded = KnownControl::decode(&control, direction).unwrap().unwrap();
            assert_eq!(decoded, KnownControl::SimplePagedResults(paged.clone()));
            assert_eq!(decoded.direction(), None);
        }
        let usable = KnownControl::AccountUsableResponse(AccountUsableResponseControl::usable(None));
        assert_eq!(usable.direction(), Some(ControlDirection::Response));
    }

    #[test]
    fn test_decode_unknown() {
        let control = Control::new("1.2.3.4", false, None);
        assert_eq!(KnownControl::decode(&control, ControlDirection::Request).unwrap(), None);

        // a response-only control sent the other way is not known
        let authz = AuthorizationIdentityResponseControl::new("u:jdoe").to_control().unwrap();
        assert_eq!(KnownControl::decode(&authz, ControlDirection::Request).unwrap(), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(
            KnownControl::name_for_oid("1.2.840.113556.1.4.319"),
            Some("Simple Paged Results Control")
        );
        assert_eq!(
            KnownControl::name_for_oid("2.16.840.1.113730.3.4.15"),
            Some("Authorization Identity Response Control")
        );
        assert_eq!(
            KnownControl::name_for_oid("1.3.6.1.4.1.30221.2.5.2"),
            Some("Intermediate Client Request Control")
        );
        assert_eq!(KnownControl::name_for_oid("1.2.3.4"), None);
        assert_eq!(Control::new("1.2.3.4", false, None).name(), "1.2.3.4");
    }

    #[test]
    fn test_json_dispatch() {
        let control = IntermediateClientRequestControl::new(
            true,
            IntermediateClientRequestValue {
                client_name: Some("app".to_owned()),
                ..Default::default()
            },
        );
        let known = KnownControl::IntermediateClientRequest(control);
        let encoded = known.to_json();
        assert_eq!(encoded["value-json"], json!({"client-name": "app"}));
        assert_eq!(
            KnownControl::from_json(&encoded, true, ControlDirection::Request).unwrap(),
            Some(known.clone())
        );

        let generic = Control::from_json(&encoded, true, ControlDirection::Request).unwrap();
        assert_eq!(generic, known.to_control().unwrap());
        assert_eq!(generic.decode_known(ControlDirection::Request).unwrap(), Some(known));
    }

    #[test]
    fn test_json_unknown_oid() {
        let encoded = json!({"oid": "1.2.3.4", "criticality": false});
        assert_eq!(KnownControl::from_json(&encoded, true, ControlDirection::Response).unwrap(), None);
    }

    #[test]
    fn test_oid_and_name() {
        let known = KnownControl::ManageDsaItRequest(ManageDsaItRequestControl::new(false));
        assert_eq!(known.oid(), "2.16.840.1.113730.3.4.2");
        assert_eq!(known.name(), "ManageDsaIT Request Control");
        assert_eq!(known.to_control().unwrap(), Control::new("2.16.840.1.113730.3.4.2", false, None));
    }
}
