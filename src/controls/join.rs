use bytes::Bytes;
use rasn::{types::*, Decode, Encode};
use serde_json::Value;

use crate::{
    controls::{decode_ber, encode_ber, require_value, utf8, LdapControl},
    error::Error,
    filter::{filter_to_string, parse_filter, Filter},
    json::{JsonFields, JsonObject},
    model::{names_match, DereferencePolicy, SearchScope},
};

const NAME: &str = "Join Request Control";

/// Upper bound of an LDAP `INTEGER (0..maxInt)`
const MAX_INT: u32 = i32::MAX as u32;

const JSON_FIELD_JOIN_RULE: &str = "join-rule";
const JSON_FIELD_BASE_DN_TYPE: &str = "base-dn-type";
const JSON_FIELD_BASE_DN_VALUE: &str = "base-dn-value";
const JSON_FIELD_SCOPE: &str = "scope";
const JSON_FIELD_ALIAS_DEREFERENCING_BEHAVIOR: &str = "alias-dereferencing-behavior";
const JSON_FIELD_SIZE_LIMIT: &str = "size-limit";
const JSON_FIELD_FILTER: &str = "filter";
const JSON_FIELD_ATTRIBUTES: &str = "attributes";
const JSON_FIELD_REQUIRE_MATCH: &str = "require-match";
const JSON_FIELD_NESTED_JOIN: &str = "nested-join";

const JSON_FIELD_RULE_TYPE: &str = "type";
const JSON_FIELD_RULE_RULES: &str = "rules";
const JSON_FIELD_RULE_ATTRIBUTE: &str = "attribute";
const JSON_FIELD_RULE_SOURCE_ATTRIBUTE: &str = "source-attribute";
const JSON_FIELD_RULE_TARGET_ATTRIBUTE: &str = "target-attribute";
const JSON_FIELD_RULE_MATCH_ALL: &str = "match-all";

const RULE_TYPE_AND: &str = "and";
const RULE_TYPE_OR: &str = "or";
const RULE_TYPE_DN: &str = "dn";
const RULE_TYPE_EQUALITY: &str = "equality";
const RULE_TYPE_CONTAINS: &str = "contains";
const RULE_TYPE_REVERSE_DN: &str = "reverse-dn";

const BASE_DN_TYPE_SEARCH_BASE: &str = "use-search-base-dn";
const BASE_DN_TYPE_SOURCE_ENTRY: &str = "use-source-entry-dn";
const BASE_DN_TYPE_CUSTOM: &str = "use-custom-base-dn";

// SET OF components are encoded in the given order
#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
#[rasn(choice)]
enum JoinRuleAsn {
    #[rasn(tag(context, 0))]
    And(Vec<JoinRuleAsn>),
    #[rasn(tag(context, 1))]
    Or(Vec<JoinRuleAsn>),
    #[rasn(tag(context, 2))]
    Dn(OctetString),
    #[rasn(tag(context, 3))]
    Equality(JoinRuleAssertion),
    #[rasn(tag(context, 4))]
    Contains(JoinRuleAssertion),
    #[rasn(tag(context, 5))]
    ReverseDn(OctetString),
}

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct JoinRuleAssertion {
    source_attribute: OctetString,
    target_attribute: OctetString,
    match_all: Option<bool>,
}

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq, Eq)]
#[rasn(choice)]
enum JoinBaseDnAsn {
    #[rasn(tag(context, 0))]
    UseSearchBaseDn(()),
    #[rasn(tag(context, 1))]
    UseSourceEntryDn(()),
    #[rasn(tag(context, 2))]
    UseCustomBaseDn(OctetString),
}

#[derive(AsnType, Encode, Decode, Debug, Clone, PartialEq)]
struct JoinValueAsn {
    join_rule: JoinRuleAsn,
    base_object: JoinBaseDnAsn,
    #[rasn(tag(context, 0))]
    scope: Option<SearchScope>,
    #[rasn(tag(context, 1))]
    deref_aliases: Option<DereferencePolicy>,
    #[rasn(tag(context, 2))]
    size_limit: Option<u32>,
    #[rasn(tag(explicit(context, 3)))]
    filter: Option<Filter>,
    #[rasn(tag(context, 4))]
    attributes: Option<SequenceOf<OctetString>>,
    #[rasn(tag(context, 5))]
    require_match: Option<bool>,
    #[rasn(tag(context, 6))]
    nested_join: Option<Box<JoinValueAsn>>,
}

/// Rule that links a search result entry with the entries joined to it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinRule {
    /// All components must match; at least one component is required
    And(Vec<JoinRule>),
    /// Any component must match; at least one component is required
    Or(Vec<JoinRule>),
    /// Join entries whose DN is a value of the source attribute
    Dn(String),
    /// Join entries whose target attribute equals a source attribute value
    Equality {
        source_attribute: String,
        target_attribute: String,
        match_all: bool,
    },
    /// Join entries whose target attribute contains a source attribute value
    Contains {
        source_attribute: String,
        target_attribute: String,
        match_all: bool,
    },
    /// Join entries that have the source entry DN as a value of the attribute
    ReverseDn(String),
}

impl JoinRule {
    pub fn and<I: IntoIterator<Item = JoinRule>>(rules: I) -> Result<Self, Error> {
        let rules = rules.into_iter().collect::<Vec<_>>();
        check_components(RULE_TYPE_AND, &rules)?;
        Ok(JoinRule::And(rules))
    }

    pub fn or<I: IntoIterator<Item = JoinRule>>(rules: I) -> Result<Self, Error> {
        let rules = rules.into_iter().collect::<Vec<_>>();
        check_components(RULE_TYPE_OR, &rules)?;
        Ok(JoinRule::Or(rules))
    }

    pub fn dn<S: Into<String>>(attribute: S) -> Self {
        JoinRule::Dn(attribute.into())
    }

    pub fn equality<S: Into<String>, T: Into<String>>(source_attribute: S, target_attribute: T, match_all: bool) -> Self {
        JoinRule::Equality {
            source_attribute: source_attribute.into(),
            target_attribute: target_attribute.into(),
            match_all,
        }
    }

    pub fn contains<S: Into<String>, T: Into<String>>(source_attribute: S, target_attribute: T, match_all: bool) -> Self {
        JoinRule::Contains {
            source_attribute: source_attribute.into(),
            target_attribute: target_attribute.into(),
            match_all,
        }
    }

    pub fn reverse_dn<S: Into<String>>(attribute: S) -> Self {
        JoinRule::ReverseDn(attribute.into())
    }

    /// Rule type as used in the JSON form
    pub fn type_name(&self) -> &'static str {
        match self {
            JoinRule::And(_) => RULE_TYPE_AND,
            JoinRule::Or(_) => RULE_TYPE_OR,
            JoinRule::Dn(_) => RULE_TYPE_DN,
            JoinRule::Equality { .. } => RULE_TYPE_EQUALITY,
            JoinRule::Contains { .. } => RULE_TYPE_CONTAINS,
            JoinRule::ReverseDn(_) => RULE_TYPE_REVERSE_DN,
        }
    }

    fn to_asn(&self) -> Result<JoinRuleAsn, Error> {
        let assertion = |source: &String, target: &String, match_all: bool| JoinRuleAssertion {
            source_attribute: source.clone().into(),
            target_attribute: target.clone().into(),
            match_all: match_all.then_some(true),
        };
        Ok(match self {
            JoinRule::And(rules) => JoinRuleAsn::And(components_to_asn(RULE_TYPE_AND, rules)?),
            JoinRule::Or(rules) => JoinRuleAsn::Or(components_to_asn(RULE_TYPE_OR, rules)?),
            JoinRule::Dn(attr) => JoinRuleAsn::Dn(attr.clone().into()),
            JoinRule::Equality {
                source_attribute,
                target_attribute,
                match_all,
            } => JoinRuleAsn::Equality(assertion(source_attribute, target_attribute, *match_all)),
            JoinRule::Contains {
                source_attribute,
                target_attribute,
                match_all,
            } => JoinRuleAsn::Contains(assertion(source_attribute, target_attribute, *match_all)),
            JoinRule::ReverseDn(attr) => JoinRuleAsn::ReverseDn(attr.clone().into()),
        })
    }

    fn from_asn(rule: JoinRuleAsn) -> Result<Self, Error> {
        let components = |rules: Vec<JoinRuleAsn>| rules.into_iter().map(Self::from_asn).collect::<Result<Vec<_>, _>>();
        match rule {
            JoinRuleAsn::And(rules) => Self::and(components(rules)?),
            JoinRuleAsn::Or(rules) => Self::or(components(rules)?),
            JoinRuleAsn::Dn(attr) => Ok(Self::dn(utf8(NAME, &attr)?)),
            JoinRuleAsn::Equality(a) => Ok(Self::equality(
                utf8(NAME, &a.source_attribute)?,
                utf8(NAME, &a.target_attribute)?,
                a.match_all.unwrap_or(false),
            )),
            JoinRuleAsn::Contains(a) => Ok(Self::contains(
                utf8(NAME, &a.source_attribute)?,
                utf8(NAME, &a.target_attribute)?,
                a.match_all.unwrap_or(false),
            )),
            JoinRuleAsn::ReverseDn(attr) => Ok(Self::reverse_dn(utf8(NAME, &attr)?)),
        }
    }

    fn to_json(&self) -> JsonObject {
        let mut object = JsonObject::new();
        object.insert(JSON_FIELD_RULE_TYPE.to_owned(), Value::String(self.type_name().to_owned()));
        match self {
            JoinRule::And(rules) | JoinRule::Or(rules) => {
                object.insert(
                    JSON_FIELD_RULE_RULES.to_owned(),
                    rules.iter().map(|r| Value::Object(r.to_json())).collect(),
                );
            }
            JoinRule::Dn(attr) | JoinRule::ReverseDn(attr) => {
                object.insert(JSON_FIELD_RULE_ATTRIBUTE.to_owned(), Value::String(attr.clone()));
            }
            JoinRule::Equality {
                source_attribute,
                target_attribute,
                match_all,
            }
            | JoinRule::Contains {
                source_attribute,
                target_attribute,
                match_all,
            } => {
                object.insert(
                    JSON_FIELD_RULE_SOURCE_ATTRIBUTE.to_owned(),
                    Value::String(source_attribute.clone()),
                );
                object.insert(
                    JSON_FIELD_RULE_TARGET_ATTRIBUTE.to_owned(),
                    Value::String(target_attribute.clone()),
                );
                object.insert(JSON_FIELD_RULE_MATCH_ALL.to_owned(), Value::Bool(*match_all));
            }
        }
        object
    }

    fn from_json(object: &JsonObject, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::new(NAME, object);
        let rule_type = fields.required_string(JSON_FIELD_RULE_TYPE)?;

        if names_match(rule_type, RULE_TYPE_AND) || names_match(rule_type, RULE_TYPE_OR) {
            fields.check_fields(&[JSON_FIELD_RULE_TYPE, JSON_FIELD_RULE_RULES], strict)?;
            let rules = fields
                .object_array(JSON_FIELD_RULE_RULES)?
                .ok_or_else(|| missing(JSON_FIELD_RULE_RULES))?
                .into_iter()
                .map(|o| Self::from_json(o, strict))
                .collect::<Result<Vec<_>, _>>()?;
            if names_match(rule_type, RULE_TYPE_AND) {
                Self::and(rules)
            } else {
                Self::or(rules)
            }
        } else if names_match(rule_type, RULE_TYPE_DN) || names_match(rule_type, RULE_TYPE_REVERSE_DN) {
            fields.check_fields(&[JSON_FIELD_RULE_TYPE, JSON_FIELD_RULE_ATTRIBUTE], strict)?;
            let attribute = fields.required_string(JSON_FIELD_RULE_ATTRIBUTE)?;
            if names_match(rule_type, RULE_TYPE_DN) {
                Ok(Self::dn(attribute))
            } else {
                Ok(Self::reverse_dn(attribute))
            }
        } else if names_match(rule_type, RULE_TYPE_EQUALITY) || names_match(rule_type, RULE_TYPE_CONTAINS) {
            fields.check_fields(
                &[
                    JSON_FIELD_RULE_TYPE,
                    JSON_FIELD_RULE_SOURCE_ATTRIBUTE,
                    JSON_FIELD_RULE_TARGET_ATTRIBUTE,
                    JSON_FIELD_RULE_MATCH_ALL,
                ],
                strict,
            )?;
            let source = fields.required_string(JSON_FIELD_RULE_SOURCE_ATTRIBUTE)?;
            let target = fields.required_string(JSON_FIELD_RULE_TARGET_ATTRIBUTE)?;
            let match_all = fields.boolean(JSON_FIELD_RULE_MATCH_ALL)?.unwrap_or(false);
            if names_match(rule_type, RULE_TYPE_EQUALITY) {
                Ok(Self::equality(source, target, match_all))
            } else {
                Ok(Self::contains(source, target, match_all))
            }
        } else {
            Err(Error::InvalidJson(format!("{}: unknown join rule type '{}'", NAME, rule_type)))
        }
    }
}

fn check_components(rule_type: &str, rules: &[JoinRule]) -> Result<(), Error> {
    if rules.is_empty() {
        Err(Error::invalid_value(
            NAME,
            format!("'{}' join rule must have at least one component", rule_type),
        ))
    } else {
        Ok(())
    }
}

fn components_to_asn(rule_type: &str, rules: &[JoinRule]) -> Result<Vec<JoinRuleAsn>, Error> {
    check_components(rule_type, rules)?;
    rules.iter().map(JoinRule::to_asn).collect()
}

pub(crate) fn check_size_limit(size_limit: Option<u32>) -> Result<Option<u32>, Error> {
    match size_limit {
        Some(limit) if limit > MAX_INT => Err(Error::invalid_value(
            NAME,
            format!("size limit {} is greater than {}", limit, MAX_INT),
        )),
        _ => Ok(size_limit),
    }
}

fn missing(field: &str) -> Error {
    Error::InvalidJson(format!("{}: missing required field '{}'", NAME, field))
}

/// Base DN used for the search of joined entries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinBaseDn {
    /// The base DN of the search request carrying the control
    SearchBase,
    /// The DN of the search result entry being joined
    SourceEntryDn,
    Custom(String),
}

impl JoinBaseDn {
    /// Base DN type as used in the JSON form
    pub fn type_name(&self) -> &'static str {
        match self {
            JoinBaseDn::SearchBase => BASE_DN_TYPE_SEARCH_BASE,
            JoinBaseDn::SourceEntryDn => BASE_DN_TYPE_SOURCE_ENTRY,
            JoinBaseDn::Custom(_) => BASE_DN_TYPE_CUSTOM,
        }
    }

    /// Custom base DN, if any
    pub fn dn(&self) -> Option<&str> {
        match self {
            JoinBaseDn::Custom(dn) => Some(dn),
            _ => None,
        }
    }

    fn to_asn(&self) -> JoinBaseDnAsn {
        match self {
            JoinBaseDn::SearchBase => JoinBaseDnAsn::UseSearchBaseDn(()),
            JoinBaseDn::SourceEntryDn => JoinBaseDnAsn::UseSourceEntryDn(()),
            JoinBaseDn::Custom(dn) => JoinBaseDnAsn::UseCustomBaseDn(dn.clone().into()),
        }
    }

    fn from_asn(value: JoinBaseDnAsn) -> Result<Self, Error> {
        Ok(match value {
            JoinBaseDnAsn::UseSearchBaseDn(()) => JoinBaseDn::SearchBase,
            JoinBaseDnAsn::UseSourceEntryDn(()) => JoinBaseDn::SourceEntryDn,
            JoinBaseDnAsn::UseCustomBaseDn(dn) => JoinBaseDn::Custom(utf8(NAME, &dn)?),
        })
    }

    fn from_json(base_type: &str, value: Option<&str>) -> Result<Self, Error> {
        let base = if names_match(base_type, BASE_DN_TYPE_SEARCH_BASE) {
            JoinBaseDn::SearchBase
        } else if names_match(base_type, BASE_DN_TYPE_SOURCE_ENTRY) {
            JoinBaseDn::SourceEntryDn
        } else if names_match(base_type, BASE_DN_TYPE_CUSTOM) {
            return value
                .map(|dn| JoinBaseDn::Custom(dn.to_owned()))
                .ok_or_else(|| missing(JSON_FIELD_BASE_DN_VALUE));
        } else {
            return Err(Error::InvalidJson(format!("{}: unknown base DN type '{}'", NAME, base_type)));
        };
        match value {
            Some(_) => Err(Error::InvalidJson(format!(
                "{}: '{}' is not allowed with base DN type '{}'",
                NAME,
                JSON_FIELD_BASE_DN_VALUE,
                base.type_name()
            ))),
            None => Ok(base),
        }
    }
}

/// Join request value: how to find the entries joined with each search result entry.
///
/// Use [`JoinRequestValueBuilder`](crate::request::JoinRequestValueBuilder) for anything
/// beyond a rule and a base DN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequestValue {
    pub(crate) join_rule: JoinRule,
    pub(crate) base_dn: JoinBaseDn,
    pub(crate) scope: Option<SearchScope>,
    pub(crate) deref_policy: Option<DereferencePolicy>,
    pub(crate) size_limit: Option<u32>,
    pub(crate) filter: Option<Filter>,
    pub(crate) attributes: Vec<String>,
    pub(crate) require_match: bool,
    pub(crate) nested_join: Option<Box<JoinRequestValue>>,
}

impl JoinRequestValue {
    pub fn new(join_rule: JoinRule, base_dn: JoinBaseDn) -> Self {
        Self {
            join_rule,
            base_dn,
            scope: None,
            deref_policy: None,
            size_limit: None,
            filter: None,
            attributes: Vec::new(),
            require_match: false,
            nested_join: None,
        }
    }

    pub fn join_rule(&self) -> &JoinRule {
        &self.join_rule
    }

    pub fn base_dn(&self) -> &JoinBaseDn {
        &self.base_dn
    }

    /// Scope of the join search, the search request scope if not set
    pub fn scope(&self) -> Option<SearchScope> {
        self.scope
    }

    pub fn deref_policy(&self) -> Option<DereferencePolicy> {
        self.deref_policy
    }

    /// Maximum number of joined entries per search result entry
    pub fn size_limit(&self) -> Option<u32> {
        self.size_limit
    }

    /// Additional filter that joined entries must match
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Whether entries without any joined entry are excluded from the results
    pub fn require_match(&self) -> bool {
        self.require_match
    }

    pub fn nested_join(&self) -> Option<&JoinRequestValue> {
        self.nested_join.as_deref()
    }

    fn to_asn(&self) -> Result<JoinValueAsn, Error> {
        Ok(JoinValueAsn {
            join_rule: self.join_rule.to_asn()?,
            base_object: self.base_dn.to_asn(),
            scope: self.scope,
            deref_aliases: self.deref_policy,
            size_limit: check_size_limit(self.size_limit)?,
            filter: self.filter.clone(),
            attributes: (!self.attributes.is_empty())
                .then(|| self.attributes.iter().map(|a| a.clone().into()).collect()),
            require_match: self.require_match.then_some(true),
            nested_join: self.nested_join.as_ref().map(|n| n.to_asn().map(Box::new)).transpose()?,
        })
    }

    fn from_asn(value: JoinValueAsn) -> Result<Self, Error> {
        Ok(Self {
            join_rule: JoinRule::from_asn(value.join_rule)?,
            base_dn: JoinBaseDn::from_asn(value.base_object)?,
            scope: value.scope,
            deref_policy: value.deref_aliases,
            size_limit: check_size_limit(value.size_limit)?,
            filter: value.filter,
            attributes: value
                .attributes
                .unwrap_or_default()
                .iter()
                .map(|a| utf8(NAME, a))
                .collect::<Result<Vec<_>, _>>()?,
            require_match: value.require_match.unwrap_or(false),
            nested_join: value
                .nested_join
                .map(|n| Self::from_asn(*n).map(Box::new))
                .transpose()?,
        })
    }

    fn to_json(&self) -> JsonObject {
        let mut object = JsonObject::new();
        object.insert(JSON_FIELD_JOIN_RULE.to_owned(), Value::Object(self.join_rule.to_json()));
        object.insert(
            JSON_FIELD_BASE_DN_TYPE.to_owned(),
            Value::String(self.base_dn.type_name().to_owned()),
        );
        if let Some(dn) = self.base_dn.dn() {
            object.insert(JSON_FIELD_BASE_DN_VALUE.to_owned(), Value::String(dn.to_owned()));
        }
        if let Some(scope) = self.scope {
            object.insert(JSON_FIELD_SCOPE.to_owned(), Value::String(scope.name().to_owned()));
        }
        if let Some(deref) = self.deref_policy {
            object.insert(
                JSON_FIELD_ALIAS_DEREFERENCING_BEHAVIOR.to_owned(),
                Value::String(deref.name().to_owned()),
            );
        }
        if let Some(size_limit) = self.size_limit {
            object.insert(JSON_FIELD_SIZE_LIMIT.to_owned(), Value::from(size_limit));
        }
        if let Some(ref filter) = self.filter {
            object.insert(JSON_FIELD_FILTER.to_owned(), Value::String(filter_to_string(filter)));
        }
        if !self.attributes.is_empty() {
            object.insert(
                JSON_FIELD_ATTRIBUTES.to_owned(),
                self.attributes.iter().cloned().map(Value::String).collect(),
            );
        }
        object.insert(JSON_FIELD_REQUIRE_MATCH.to_owned(), Value::Bool(self.require_match));
        if let Some(ref nested) = self.nested_join {
            object.insert(JSON_FIELD_NESTED_JOIN.to_owned(), Value::Object(nested.to_json()));
        }
        object
    }

    fn from_json(object: &JsonObject, strict: bool) -> Result<Self, Error> {
        let fields = JsonFields::new(NAME, object);
        fields.check_fields(
            &[
                JSON_FIELD_JOIN_RULE,
                JSON_FIELD_BASE_DN_TYPE,
                JSON_FIELD_BASE_DN_VALUE,
                JSON_FIELD_SCOPE,
                JSON_FIELD_ALIAS_DEREFERENCING_BEHAVIOR,
                JSON_FIELD_SIZE_LIMIT,
                JSON_FIELD_FILTER,
                JSON_FIELD_ATTRIBUTES,
                JSON_FIELD_REQUIRE_MATCH,
                JSON_FIELD_NESTED_JOIN,
            ],
            strict,
        )?;

        let join_rule = JoinRule::from_json(fields.required_object(JSON_FIELD_JOIN_RULE)?, strict)?;
        let base_dn = JoinBaseDn::from_json(
            fields.required_string(JSON_FIELD_BASE_DN_TYPE)?,
            fields.string(JSON_FIELD_BASE_DN_VALUE)?,
        )?;
        let scope = fields
            .string(JSON_FIELD_SCOPE)?
            .map(|s| {
                SearchScope::for_name(s).ok_or_else(|| Error::InvalidJson(format!("{}: unknown scope '{}'", NAME, s)))
            })
            .transpose()?;
        let deref_policy = fields
            .string(JSON_FIELD_ALIAS_DEREFERENCING_BEHAVIOR)?
            .map(|s| {
                DereferencePolicy::for_name(s).ok_or_else(|| {
                    Error::InvalidJson(format!("{}: unknown alias dereferencing behavior '{}'", NAME, s))
                })
            })
            .transpose()?;
        let filter = fields.string(JSON_FIELD_FILTER)?.map(parse_filter).transpose()?;
        let nested_join = fields
            .object(JSON_FIELD_NESTED_JOIN)?
            .map(|o| Self::from_json(o, strict).map(Box::new))
            .transpose()?;

        Ok(Self {
            join_rule,
            base_dn,
            scope,
            deref_policy,
            size_limit: check_size_limit(fields.unsigned(JSON_FIELD_SIZE_LIMIT)?)?,
            filter,
            attributes: fields.string_array(JSON_FIELD_ATTRIBUTES)?.unwrap_or_default(),
            require_match: fields.boolean(JSON_FIELD_REQUIRE_MATCH)?.unwrap_or(false),
            nested_join,
        })
    }
}

/// Join request control, OID 1.3.6.1.4.1.30221.2.5.9.
///
/// Asks the server to return, with each search result entry, the entries
/// related to it through the join rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequestControl {
    critical: bool,
    value: JoinRequestValue,
}

impl JoinRequestControl {
    pub fn new(critical: bool, value: JoinRequestValue) -> Self {
        Self { critical, value }
    }

    pub fn value(&self) -> &JoinRequestValue {
        &self.value
    }
}

impl LdapControl for JoinRequestControl {
    const OID: &'static str = crate::oid::JOIN_REQUEST_CONTROL_OID;
    const NAME: &'static str = NAME;

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn encode_value(&self) -> Result<Option<Bytes>, Error> {
        encode_ber(&self.value.to_asn()?).map(Some)
    }

    fn decode_value(critical: bool, value: Option<&[u8]>) -> Result<Self, Error> {
        let value = decode_ber::<JoinValueAsn>(Self::NAME, require_value(Self::NAME, value)?)?;
        Ok(Self::new(critical, JoinRequestValue::from_asn(value)?))
    }

    fn value_to_json(&self) -> Option<JsonObject> {
        Some(self.value.to_json())
    }

    fn value_from_json(critical: bool, value: &JsonObject, strict: bool) -> Result<Self, Error> {
        Ok(Self::new(critical, JoinRequestValue::from_json(value, strict)?))
    }
}
