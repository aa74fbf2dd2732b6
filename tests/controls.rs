use std::convert::TryFrom;

use ldap_controls::{
    controls::*,
    error::Error,
    rasn_ldap::{self, LdapMessage, ProtocolOp, ResultCode},
    serde_json::{self, json},
    ExtendedResult, JoinRequestValueBuilder, LdapResponse, SearchScope,
};

fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

fn request_controls() -> Vec<KnownControl> {
    let join = JoinRequestValueBuilder::new(
        JoinRule::or([JoinRule::dn("manager"), JoinRule::equality("uid", "memberUid", false)]).unwrap(),
    )
    .scope(SearchScope::WholeSubtree)
    .filter("(objectClass=*)")
    .attributes(["cn"])
    .build()
    .unwrap();

    vec![
        KnownControl::SimplePagedResults(SimplePagedResultsControl::new(50).with_critical(true)),
        KnownControl::AccountUsableRequest(AccountUsableRequestControl::new(false)),
        KnownControl::AuthorizationIdentityRequest(AuthorizationIdentityRequestControl::new(false)),
        KnownControl::GetEffectiveRightsRequest(GetEffectiveRightsRequestControl::for_identity(
            false,
            "u:jdoe",
            ["userPassword"],
        )),
        KnownControl::GetPasswordPolicyStateIssuesRequest(GetPasswordPolicyStateIssuesRequestControl::new(false)),
        KnownControl::IntermediateClientRequest(IntermediateClientRequestControl::new(
            true,
            IntermediateClientRequestValue {
                client_name: Some("portal".to_owned()),
                client_session_id: Some("s-1".to_owned()),
                ..Default::default()
            },
        )),
        KnownControl::JoinRequest(JoinRequestControl::new(true, join)),
        KnownControl::ManageDsaItRequest(ManageDsaItRequestControl::new(true)),
        KnownControl::RouteToServerRequest(
            RouteToServerRequestControl::new(true, "ds-east-1", true, true, false).unwrap(),
        ),
    ]
}

fn response_controls() -> Vec<KnownControl> {
    vec![
        KnownControl::SimplePagedResults(SimplePagedResultsControl::with_cookie(0, &b"\x00\x01cookie"[..])),
        KnownControl::AccountUsableResponse(AccountUsableResponseControl::unusable(
            false,
            true,
            false,
            Some(2),
            None,
        )),
        KnownControl::AuthorizationIdentityResponse(AuthorizationIdentityResponseControl::new(
            "dn:uid=jdoe,dc=example,dc=com",
        )),
        KnownControl::GetPasswordPolicyStateIssuesResponse(GetPasswordPolicyStateIssuesResponseControl::new(
            Vec::new(),
            vec![PasswordPolicyStateIssue::new(1, "password-expiring", Some("expires soon".to_owned()))],
            Vec::new(),
            None,
        )),
        KnownControl::IntermediateClientResponse(IntermediateClientResponseControl::new(
            false,
            IntermediateClientResponseValue {
                server_name: Some("proxy".to_owned()),
                ..Default::default()
            },
        )),
    ]
}

#[test]
fn test_all_controls_round_trip() {
    init_logger();

    for (direction, controls) in [
        (ControlDirection::Request, request_controls()),
        (ControlDirection::Response, response_controls()),
    ] {
        for known in controls {
            let generic = known.to_control().unwrap();
            assert_eq!(
                generic.decode_known(direction).unwrap().as_ref(),
                Some(&known),
                "{}",
                known.name()
            );

            // through the rasn representation
            let raw: rasn_ldap::Control = generic.clone().into();
            assert_eq!(Control::try_from(raw).unwrap(), generic);

            // typed JSON, then generic JSON carrying base64
            let typed_json = known.to_json();
            assert_eq!(
                KnownControl::from_json(&typed_json, true, direction).unwrap().as_ref(),
                Some(&known),
                "{}",
                typed_json
            );
            let generic_json = generic.to_json();
            assert_eq!(Control::from_json(&generic_json, true, direction).unwrap(), generic);
            assert_eq!(generic_json["control-name"], serde_json::Value::from(generic.name()));
        }
    }
}

#[test]
fn test_get_from_failed_search() {
    init_logger();

    let issues = GetPasswordPolicyStateIssuesResponseControl::new(
        Vec::new(),
        Vec::new(),
        vec![PasswordPolicyStateIssue::new(5, "account-locked", None)],
        Some(PasswordPolicyStateIssue::new(
            1,
            "account-temporarily-locked",
            Some("too many failures".to_owned()),
        )),
    );
    let mut msg = LdapMessage::new(
        9,
        ProtocolOp::SearchResDone(rasn_ldap::SearchResultDone(rasn_ldap::LdapResult::new(
            ResultCode::InvalidCredentials,
            Default::default(),
            "locked".into(),
        ))),
    );
    msg.controls = Some(vec![issues.to_control().unwrap().into()]);

    let err = LdapResponse::try_from(msg).unwrap().into_result().unwrap_err();
    assert!(matches!(err, Error::OperationFailed(_)));

    let found = GetPasswordPolicyStateIssuesResponseControl::get(&err).unwrap().unwrap();
    assert_eq!(found, issues);
    assert_eq!(
        found.auth_failure_reason().map(|r| r.name()),
        Some("account-temporarily-locked")
    );
    assert_eq!(AccountUsableResponseControl::get(&err).unwrap(), None);
}

#[test]
fn test_get_with_malformed_control() {
    init_logger();

    let result = ExtendedResult {
        message_id: 4,
        result_code: ResultCode::Success,
        matched_dn: String::new(),
        diagnostic_message: String::new(),
        oid: None,
        value: None,
        controls: vec![Control::new(
            "1.3.6.1.4.1.30221.2.5.16",
            true,
            Some(ldap_controls::bytes::Bytes::from_static(b"\x30\x00")),
        )],
    };
    assert!(RouteToServerRequestControl::get(&result).is_err());
    assert_eq!(JoinRequestControl::get(&result).unwrap(), None);
}

#[test]
fn test_lenient_json_control() {
    init_logger();

    let encoded = json!({
        "oid": "1.3.6.1.4.1.30221.2.5.16",
        "control-name": "Route to Server Request Control",
        "criticality": true,
        "comment": "added by hand",
        "value-json": {
            "server-id": "ds1",
            "allow-alternate-server": false,
            "weight": 5,
        },
    });
    assert!(Control::from_json(&encoded, true, ControlDirection::Request).is_err());

    let control = Control::from_json(&encoded, false, ControlDirection::Request).unwrap();
    let typed = RouteToServerRequestControl::from_control(&control).unwrap();
    assert_eq!(typed.server_id(), "ds1");
    assert!(!typed.allow_alternate_server());
    assert!(typed.prefer_local_server());
}
