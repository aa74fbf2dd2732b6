use crate::{
    controls::{check_size_limit, JoinBaseDn, JoinRequestValue, JoinRule},
    error::Error,
    filter::parse_filter,
    model::{DereferencePolicy, SearchScope},
};

/// Builder for the value of a join request control
pub struct JoinRequestValueBuilder {
    join_rule: JoinRule,
    base_dn: JoinBaseDn,
    scope: Option<SearchScope>,
    deref_policy: Option<DereferencePolicy>,
    size_limit: Option<u32>,
    filter: Option<String>,
    attributes: Vec<String>,
    require_match: bool,
    nested_join: Option<JoinRequestValue>,
}

impl JoinRequestValueBuilder {
    /// Start with a join rule; the base DN defaults to the search base DN
    pub fn new(join_rule: JoinRule) -> Self {
        Self {
            join_rule,
            base_dn: JoinBaseDn::SearchBase,
            scope: None,
            deref_policy: None,
            size_limit: None,
            filter: None,
            attributes: Vec::new(),
            require_match: false,
            nested_join: None,
        }
    }

    pub fn base_dn(mut self, base_dn: JoinBaseDn) -> Self {
        self.base_dn = base_dn;
        self
    }

    pub fn custom_base_dn<S: AsRef<str>>(mut self, base_dn: S) -> Self {
        self.base_dn = JoinBaseDn::Custom(base_dn.as_ref().to_owned());
        self
    }

    pub fn scope(mut self, scope: SearchScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn deref_policy(mut self, deref_policy: DereferencePolicy) -> Self {
        self.deref_policy = Some(deref_policy);
        self
    }

    pub fn size_limit(mut self, size_limit: u32) -> Self {
        self.size_limit = Some(size_limit);
        self
    }

    /// Filter in RFC 4515 string form, parsed by [`build`](Self::build)
    pub fn filter<S: AsRef<str>>(mut self, filter: S) -> Self {
        self.filter = Some(filter.as_ref().to_owned());
        self
    }

    pub fn attributes<I, T>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.attributes = attributes.into_iter().map(|a| a.as_ref().to_owned()).collect();
        self
    }

    pub fn require_match(mut self, require_match: bool) -> Self {
        self.require_match = require_match;
        self
    }

    pub fn nested_join(mut self, nested_join: JoinRequestValue) -> Self {
        self.nested_join = Some(nested_join);
        self
    }

    pub fn build(self) -> Result<JoinRequestValue, Error> {
        let mut value = JoinRequestValue::new(self.join_rule, self.base_dn);
        value.scope = self.scope;
        value.deref_policy = self.deref_policy;
        value.size_limit = check_size_limit(self.size_limit)?;
        value.filter = self.filter.map(parse_filter).transpose()?;
        value.attributes = self.attributes;
        value.require_match = self.require_match;
        value.nested_join = self.nested_join.map(Box::new);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter_to_string;

    #[test]
    fn test_builder() {
        let nested = JoinRequestValueBuilder::new(JoinRule::reverse_dn("member"))
            .base_dn(JoinBaseDn::SourceEntryDn)
            .build()
            .unwrap();
        let value = JoinRequestValueBuilder::new(JoinRule::dn("manager"))
            .custom_base_dn("ou=People,dc=example,dc=com")
            .scope(SearchScope::SingleLevel)
            .deref_policy(DereferencePolicy::NeverDerefAliases)
            .size_limit(10)
            .filter("(objectClass=person)")
            .attributes(["cn", "mail"])
            .require_match(true)
            .nested_join(nested.clone())
            .build()
            .unwrap();

        assert_eq!(value.join_rule(), &JoinRule::dn("manager"));
        assert_eq!(value.base_dn().dn(), Some("ou=People,dc=example,dc=com"));
        assert_eq!(value.scope(), Some(SearchScope::SingleLevel));
        assert_eq!(value.deref_policy(), Some(DereferencePolicy::NeverDerefAliases));
        assert_eq!(value.size_limit(), Some(10));
        assert_eq!(filter_to_string(value.filter().unwrap()), "(objectClass=person)");
        assert_eq!(value.attributes(), ["cn", "mail"]);
        assert!(value.require_match());
        assert_eq!(value.nested_join(), Some(&nested));
    }

    #[test]
    fn test_defaults() {
        let value = JoinRequestValueBuilder::new(JoinRule::dn("manager")).build().unwrap();
        assert_eq!(value, JoinRequestValue::new(JoinRule::dn("manager"), JoinBaseDn::SearchBase));
    }

    #[test]
    fn test_size_limit_out_of_range() {
        let builder = JoinRequestValueBuilder::new(JoinRule::dn("manager"));
        assert!(builder.size_limit(u32::MAX).build().is_err());
    }

    #[test]
    fn test_invalid_filter() {
        assert!(matches!(
            JoinRequestValueBuilder::new(JoinRule::dn("manager")).filter("(cn=").build(),
            Err(Error::InvalidFilter(_))
        ));
    }
}
