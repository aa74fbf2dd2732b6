use bytes::Bytes;
use rasn::{types::*, Decode, Encode};
use serde_json::Value;

use crate::{
    controls::{decode_ber, encode_ber, forbid_value, require_value, LdapControl},
    error::Error,
    json::{JsonFields, JsonObject},
};

const JSON_FIELD_ACCOUNT_IS_USABLE: &str = "account-is-usable";
const JSON_FIELD_SECONDS_UNTIL_EXPIRATION: &str = "seconds-until-password-expiration";
const JSON_FIELD_ACCOUNT_IS_INACTIVE: &str = "account-is-inactive";
const JSON_FIELD_MUST_CHANGE_PASSWORD: &str = "must-change-password";
const JSON_FIELD_PASSWORD_IS_EXPIRED: &str = "password-is-expired";
const JSON_FIELD_REMAINING_GRACE_LOGINS: &str = "remaining-grace-logins";
const JSON_FIELD_SECONDS_UNTIL_UNLOCK: &str = "seconds-until-account-unlock";

const UNUSABLE_ONLY_FIELDS: &[&str] = &[
    JSON_FIELD_ACCOUNT_IS_INACTIVE,
    JSON_FIELD_MUST_CHANGE_PASSWORD,
    JSON_FIELD_PASSWORD_IS_EXPIRED,
    JSON_FIELD_REMAINING_GRACE_LOGINS,
    JSON_FIELD_SECONDS_UNTIL_UNLOCK,
];

/// Account usable request control, OID 1.3.6.1.4.1.42.2.27.9.5.8.
///
/// Asks the server to attach an [`AccountUsableResponseControl`] to each
/// returned search entry. The control has no value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccountUsableRequestControl {
    critical: bool,
}

impl AccountUsableRequestControl {
    pub fn new(critical: bool) -> Self {
        Self { critical }
    }
}

impl LdapControl for AccountUsableRequestControl {
    const OID: &'static str = crate::oid::ACCOUNT_USABLE_CONTROL_OID;
    const NAME: &'static str = "Account Usable Request Control";

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
#[rasn(choice)]
enum AccountUsableValue {
    #[rasn(tag(context, 0))]
    IsAvailable(i64),
    #[rasn(tag(context, 1))]
    IsNotAvailable(MoreInfo),
}

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct MoreInfo {
    #[rasn(tag(context, 0))]
    inactive: Option<bool>,
    #[rasn(tag(context, 1))]
    reset: Option<bool>,
    #[rasn(tag(context, 2))]
    expired: Option<bool>,
    #[rasn(tag(context, 3))]
    remaining_grace: Option<i64>,
    #[rasn(tag(context, 4))]
    time_before_unlock: Option<i64>,
}

fn flag(value: bool) -> Option<bool> {
    value.then_some(true)
}

fn non_negative(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

/// Account usable response control, OID 1.3.6.1.4.1.42.2.27.9.5.8.
///
/// Either the account is usable, optionally with the number of seconds
/// before its password expires, or it is not usable and the control tells
/// why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountUsableResponseControl {
    critical: bool,
    usable: bool,
    seconds_until_expiration: Option<u32>,
    inactive: bool,
    must_change_password: bool,
    expired: bool,
    remaining_grace_logins: Option<u32>,
    seconds_until_unlock: Option<u32>,
}

impl AccountUsableResponseControl {
    /// Response for a usable account
    pub fn usable(seconds_until_expiration: Option<u32>) -> Self {
        Self {
            critical: false,
            usable: true,
            seconds_until_expiration,
            inactive: false,
            must_change_password: false,
            expired: false,
            remaining_grace_logins: None,
            seconds_until_unlock: None,
        }
    }

    /// Response for an account which cannot be used
    pub fn unusable(
        inactive: bool,
        must_change_password: bool,
        expired: bool,
        remaining_grace_logins: Option<u32>,
        seconds_until_unlock: Option<u32>,
    ) -> Self {
        Self {
            critical: false,
            usable: false,
            seconds_until_expiration: None,
            inactive,
            must_change_password,
            expired,
            remaining_grace_logins,
            seconds_until_unlock,
        }
    }

    pub fn with_critical(self, critical: bool) -> Self {
        Self { critical, ..self }
    }

    pub fn is_usable(&self) -> bool {
        self.usable
    }

    /// Seconds until the password expires, if the account is usable and an expiration is known
    pub fn seconds_until_expiration(&self) -> Option<u32> {
        self.seconds_until_expiration
    }

    pub fn is_inactive(&self) -> bool {
        self.inactive
    }

    pub fn must_change_password(&self) -> bool {
        self.must_change_password
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn remaining_grace_logins(&self) -> Option<u32> {
        self.remaining_grace_logins
    }

    /// Seconds until a locked account is unlocked automatically
    pub fn seconds_until_unlock(&self) -> Option<u32> {
        self.seconds_until_unlock
    }

    /// Human-readable reasons why the account cannot be used
    pub fn unusable_reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        if self.inactive {
            reasons.push("The account has been deactivated.".to_owned());
        }
        if self.must_change_password {
            reasons.push("The password has been reset and must be changed.".to_owned());
        }
        if self.expired {
            match self.remaining_grace_logins {
                Some(grace) => reasons.push(format!("The password is expired, {} grace logins remain.", grace)),
                None => reasons.push("The password is expired.".to_owned()),
            }
        }
        if let Some(seconds) = self.seconds_until_unlock {
            reasons.push(format!("The account is locked for another {} seconds.", seconds));
        }
        reasons
    }
}

impl LdapControl for AccountUsableResponseControl {
    const OID: &'static str = crate::oid::ACCOUNT_USABLE_CONTROL_OID;
    const NAME: &'static str = "Account Usable Response Control";

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn encode_value(&self) -> Result<Option<Bytes>, Error> {
        let value = if self.usable {
            AccountUsableValue::IsAvailable(self.seconds_until_expiration.map_or(-1, i64::from))
        } else {
            AccountUsableValue::IsNotAvailable(MoreInfo {
                inactive: flag(self.inactive),
                reset: flag(self.must_change_password),
                expired: flag(self.expired),
                remaining_grace: self.remaining_grace_logins.map(i64::from),
                time_before_unlock: self.seconds_until_unlock.map(i64::from),
            })
        };
        encode_ber(&value).map(Some)
    }

    fn decode_value(critical: bool, value: Option<&[u8]>) -> Result<Self, Error> {
        let value = decode_ber::<AccountUsableValue>(Self::NAME, require_value(Self::NAME, value)?)?;
        let control = match value {
            AccountUsableValue::IsAvailable(seconds) => Self::usable(u32::try_from(seconds).ok()),
            AccountUsableValue::IsNotAvailable(info) => Self::unusable(
                info.inactive.unwrap_or(false),
                info.reset.unwrap_or(false),
                info.expired.unwrap_or(false),
                non_negative(info.remaining_grace),
                non_negative(info.time_before_unlock),
            ),
        };
        Ok(control.with_critical(critical))
    }

    fn value_to_json(&self) -> Option<JsonObject> {
        let mut object = JsonObject::new();
        object.insert(JSON_FIELD_ACCOUNT_IS_USABLE.to_owned(), Value::Bool(self.usable));
        if self.usable {
            if let Some(seconds) = self.seconds_until_expiration {
                object.insert(JSON_FIELD_SECONDS_UNTIL_EXPIRATION.to_owned(), Value::from(seconds));
            }
        } else {
            object.insert(JSON_FIELD_ACCOUNT_IS_INACTIVE.to_owned(), Value::Bool(self.inactive));
            object.insert(
                JSON_FIELD_MUST_CHANGE_PASSWORD.to_owned(),
                Value::Bool(self.must_change_password),
            );
            object.insert(JSON_FIELD_PASSWORD_IS_EXPIRED.to_owned(), Value::Bool(self.expired));
            if let Some(grace) = self.remaining_grace_logins {
                object.insert(JSON_FIELD_REMAINING_GRACE_LOGINS.to_owned(), Value::from(grace));
            }
            if let Some(seconds) = self.seconds_until_unlock {
                object.insert(JSON_FIELD_SECONDS_UNTIL_UNLOCK.to_owned(), Value::from(seconds));
            }
        }
        Some(object)
    }

    fn value_from_json(critical: bool, value: &JsonObject, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::new(Self::NAME, value);
        let mut allowed = vec![JSON_FIELD_ACCOUNT_IS_USABLE, JSON_FIELD_SECONDS_UNTIL_EXPIRATION];
        allowed.extend_from_slice(UNUSABLE_ONLY_FIELDS);
        fields.check_fields(&allowed, strict)?;

        let control = if fields.required_boolean(JSON_FIELD_ACCOUNT_IS_USABLE)? {
            if let Some(name) = UNUSABLE_ONLY_FIELDS.iter().find(|name| fields.has(name)) {
                return Err(Error::InvalidJson(format!(
                    "{}: field '{}' is not allowed for a usable account",
                    Self::NAME,
                    name
                )));
            }
            Self::usable(fields.unsigned(JSON_FIELD_SECONDS_UNTIL_EXPIRATION)?)
        } else {
            if fields.has(JSON_FIELD_SECONDS_UNTIL_EXPIRATION) {
                return Err(Error::InvalidJson(format!(
                    "{}: field '{}' is not allowed for an unusable account",
                    Self::NAME,
                    JSON_FIELD_SECONDS_UNTIL_EXPIRATION
                )));
            }
            Self::unusable(
                fields.boolean(JSON_FIELD_ACCOUNT_IS_INACTIVE)?.unwrap_or(false),
                fields.boolean(JSON_FIELD_MUST_CHANGE_PASSWORD)?.unwrap_or(false),
                fields.boolean(JSON_FIELD_PASSWORD_IS_EXPIRED)?.unwrap_or(false),
                fields.unsigned(JSON_FIELD_REMAINING_GRACE_LOGINS)?,
                fields.unsigned(JSON_FIELD_SECONDS_UNTIL_UNLOCK)?,
            )
        };
        Ok(control.with_critical(critical))
    }
}
