//! Data structures

use std::{fmt, str::FromStr};

use rasn::{AsnType, Decode, Encode};
pub use rasn_ldap::ResultCode;

use crate::error::Error;

/// Lowercase a name and strip `-` and `_` separators, so that `wholeSubtree`,
/// `whole-subtree` and `WHOLE_SUBTREE` compare equal.
pub(crate) fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

pub(crate) fn names_match(left: &str, right: &str) -> bool {
    normalize_name(left) == normalize_name(right)
}

/// Search scope, including the subordinate subtree extension
#[derive(AsnType, Encode, Decode, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[rasn(enumerated)]
pub enum SearchScope {
    BaseObject = 0,
    SingleLevel = 1,
    WholeSubtree = 2,
    SubordinateSubtree = 3,
}

impl SearchScope {
    /// All defined scopes in numeric order
    pub const ALL: [SearchScope; 4] = [
        SearchScope::BaseObject,
        SearchScope::SingleLevel,
        SearchScope::WholeSubtree,
        SearchScope::SubordinateSubtree,
    ];

    /// Numeric code as used on the wire
    pub fn int_value(self) -> u32 {
        self as u32
    }

    /// Canonical name
    pub fn name(self) -> &'static str {
        match self {
            SearchScope::BaseObject => "baseObject",
            SearchScope::SingleLevel => "singleLevel",
            SearchScope::WholeSubtree => "wholeSubtree",
            SearchScope::SubordinateSubtree => "subordinateSubtree",
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            SearchScope::BaseObject => "base",
            SearchScope::SingleLevel => "one",
            SearchScope::WholeSubtree => "sub",
            SearchScope::SubordinateSubtree => "subordinates",
        }
    }

    /// Look up a scope by its numeric code
    pub fn from_int(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.int_value() == value)
    }

    /// Look up a scope by name, ignoring case and separators.
    /// Both the canonical names and the short forms (`base`, `one`, `sub`, `subordinates`) are accepted.
    pub fn for_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| names_match(s.name(), name) || names_match(s.short_name(), name))
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::for_name(s).ok_or_else(|| Error::invalid_value("search scope", format!("unknown scope '{}'", s)))
    }
}

/// Alias dereferencing policy
#[derive(AsnType, Encode, Decode, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[rasn(enumerated)]
pub enum DereferencePolicy {
    NeverDerefAliases = 0,
    DerefInSearching = 1,
    DerefFindingBaseObj = 2,
    DerefAlways = 3,
}

impl DereferencePolicy {
    /// All defined policies in numeric order
    pub const ALL: [DereferencePolicy; 4] = [
        DereferencePolicy::NeverDerefAliases,
        DereferencePolicy::DerefInSearching,
        DereferencePolicy::DerefFindingBaseObj,
        DereferencePolicy::DerefAlways,
    ];

    pub fn int_value(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            DereferencePolicy::NeverDerefAliases => "neverDerefAliases",
            DereferencePolicy::DerefInSearching => "derefInSearching",
            DereferencePolicy::DerefFindingBaseObj => "derefFindingBaseObj",
            DereferencePolicy::DerefAlways => "derefAlways",
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            DereferencePolicy::NeverDerefAliases => "never",
            DereferencePolicy::DerefInSearching => "search",
            DereferencePolicy::DerefFindingBaseObj => "find",
            DereferencePolicy::DerefAlways => "always",
        }
    }

    pub fn from_int(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.int_value() == value)
    }

    /// Look up a policy by name, ignoring case and separators.
    /// Short forms `never`, `search`, `find` and `always` are accepted too.
    pub fn for_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| names_match(p.name(), name) || names_match(p.short_name(), name))
    }
}

impl fmt::Display for DereferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DereferencePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::for_name(s)
            .ok_or_else(|| Error::invalid_value("dereference policy", format!("unknown policy '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_names() {
        for scope in SearchScope::ALL {
            assert_eq!(SearchScope::for_name(scope.name()), Some(scope));
            assert_eq!(SearchScope::for_name(&scope.name().to_uppercase()), Some(scope));
            assert_eq!(SearchScope::from_int(scope.int_value()), Some(scope));
        }
        assert_eq!(SearchScope::for_name("whole-subtree"), Some(SearchScope::WholeSubtree));
        assert_eq!(SearchScope::for_name("WHOLE_SUBTREE"), Some(SearchScope::WholeSubtree));
        assert_eq!(SearchScope::for_name("sub"), Some(SearchScope::WholeSubtree));
        assert_eq!(
            SearchScope::for_name("subordinate-subtree"),
            Some(SearchScope::SubordinateSubtree)
        );
        assert_eq!(SearchScope::for_name("everything"), None);
        assert_eq!(SearchScope::from_int(4), None);
        assert!("nowhere".parse::<SearchScope>().is_err());
    }

    #[test]
    fn test_deref_names() {
        for policy in DereferencePolicy::ALL {
            assert_eq!(DereferencePolicy::for_name(policy.name()), Some(policy));
            assert_eq!(policy.to_string().parse::<DereferencePolicy>().unwrap(), policy);
        }
        assert_eq!(
            DereferencePolicy::for_name("deref-finding-base-obj"),
            Some(DereferencePolicy::DerefFindingBaseObj)
        );
        assert_eq!(DereferencePolicy::for_name("ALWAYS"), Some(DereferencePolicy::DerefAlways));
        assert_eq!(DereferencePolicy::for_name("sometimes"), None);
        assert_eq!(DereferencePolicy::from_int(7), None);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Use-Search_Base-DN"), "usesearchbasedn");
    }
}
