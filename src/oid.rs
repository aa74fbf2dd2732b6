//! OID definitions

/// WHOAMI extended operation
pub const WHOAMI_OID: &str = "1.3.6.1.4.1.4203.1.11.3";

/// Notice of disconnection response sent by the server
pub const NOTICE_OF_DISCONNECTION_OID: &str = "1.3.6.1.4.1.1466.20036";

/// Get supported OTP delivery mechanisms extended request
pub const GET_SUPPORTED_OTP_DELIVERY_MECHANISMS_REQUEST_OID: &str = "1.3.6.1.4.1.30221.2.6.47";

/// Get supported OTP delivery mechanisms extended result
pub const GET_SUPPORTED_OTP_DELIVERY_MECHANISMS_RESULT_OID: &str = "1.3.6.1.4.1.30221.2.6.48";

/// SimplePagedResultsControl OID
pub const SIMPLE_PAGED_RESULTS_CONTROL_OID: &str = "1.2.840.113556.1.4.319";

/// Account usable request and response controls
pub const ACCOUNT_USABLE_CONTROL_OID: &str = "1.3.6.1.4.1.42.2.27.9.5.8";

/// Authorization identity request control (RFC 3829)
pub const AUTHORIZATION_IDENTITY_REQUEST_OID: &str = "2.16.840.1.113730.3.4.16";

/// Authorization identity response control (RFC 3829)
pub const AUTHORIZATION_IDENTITY_RESPONSE_OID: &str = "2.16.840.1.113730.3.4.15";

/// Get effective rights request control
pub const GET_EFFECTIVE_RIGHTS_REQUEST_OID: &str = "1.3.6.1.4.1.42.2.27.9.5.2";

/// Get password policy state issues request control
pub const GET_PASSWORD_POLICY_STATE_ISSUES_REQUEST_OID: &str = "1.3.6.1.4.1.30221.2.5.46";

/// Get password policy state issues response control
pub const GET_PASSWORD_POLICY_STATE_ISSUES_RESPONSE_OID: &str = "1.3.6.1.4.1.30221.2.5.47";

/// Intermediate client request and response controls
pub const INTERMEDIATE_CLIENT_CONTROL_OID: &str = "1.3.6.1.4.1.30221.2.5.2";

/// Join request control
pub const JOIN_REQUEST_CONTROL_OID: &str = "1.3.6.1.4.1.30221.2.5.9";

/// ManageDsaIT request control (RFC 3296)
pub const MANAGE_DSA_IT_CONTROL_OID: &str = "2.16.840.1.113730.3.4.2";

/// Route to server request control
pub const ROUTE_TO_SERVER_REQUEST_OID: &str = "1.3.6.1.4.1.30221.2.5.16";
