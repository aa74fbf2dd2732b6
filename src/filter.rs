//! RFC 4515 search filters: parsing into and rendering from `rasn_ldap::Filter`

use std::fmt::Write;

use bytes::Bytes;
use once_cell::sync::Lazy;
use pest::{
    error::ErrorVariant,
    iterators::{Pair, Pairs},
    Parser, Position,
};
use pest_derive::Parser;
use rasn::prelude::*;
pub use rasn_ldap::Filter;
use rasn_ldap::{AttributeValueAssertion, MatchingRuleAssertion, SubstringChoice, SubstringFilter};
use regex::bytes::{Captures, Regex};

use crate::error::Error;

type RulePair<'a> = Pair<'a, Rule>;
type RulePairs<'a> = Pairs<'a, Rule>;

fn unescape(s: &str) -> Bytes {
    static HEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\\([\da-fA-F]{2})"#).unwrap());

    HEX_RE
        .replace_all(s.as_bytes(), |caps: &Captures| {
            // unwrap is justified here by the regex expression
            let hex = std::str::from_utf8(&caps[1]).unwrap();
            [u8::from_str_radix(hex, 16).unwrap()]
        })
        .into_owned()
        .into()
}

#[derive(Parser)]
#[grammar = "filter.pest"]
pub struct FilterParser;

/// Parse a string filter such as `(&(objectClass=person)(uid=jdoe))`.
///
/// Hex escapes (`\2a`) are decoded after parsing, so escaped special
/// characters are kept as literal assertion bytes.
pub fn parse_filter<S: AsRef<str>>(filter: S) -> Result<Filter, Error> {
    let filter = filter.as_ref();
    check_nesting(filter)?;
    let mut parsed = FilterParser::parse(Rule::rfc2254, filter)?;
    Ok(parse_rule(parsed.next().expect("No top level rule")))
}

/// Maximum parenthesis depth of a filter string
const MAX_FILTER_DEPTH: usize = 64;

// Parentheses inside assertion values are always escaped, so every literal one is structural
fn check_nesting(filter: &str) -> Result<(), Error> {
    let mut depth = 0usize;
    for (offset, c) in filter.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => continue,
        }
        if depth > MAX_FILTER_DEPTH {
            let message = format!("filter is nested deeper than {} levels", MAX_FILTER_DEPTH);
            let pos = Position::new(filter, offset).unwrap_or_else(|| Position::from_start(filter));
            return Err(Error::InvalidFilter(pest::error::Error::new_from_pos(
                ErrorVariant::CustomError { message },
                pos,
            )));
        }
    }
    Ok(())
}

fn as_bytes(pair: &RulePair) -> Bytes {
    pair.as_str().as_bytes().to_vec().into()
}

fn as_value(pair: &RulePair) -> Bytes {
    unescape(pair.as_str())
}

fn as_inner(pair: RulePair) -> RulePair {
    pair.into_inner().next().expect("No inner rule")
}

fn parse_rule(pair: RulePair) -> Filter {
    match pair.as_rule() {
        Rule::and => Filter::And(parse_set(pair.into_inner())),
        Rule::or => Filter::Or(parse_set(pair.into_inner())),
        Rule::not => Filter::Not(Box::new(parse_rule(as_inner(pair)))),
        Rule::simple => parse_simple(pair.into_inner()),
        Rule::present => Filter::Present(as_bytes(&as_inner(pair))),
        Rule::substring => substring_to_ldap(pair.into_inner()),
        Rule::extensible => parse_extensible(pair.into_inner()),
        _ => panic!("Unexpected rule"),
    }
}

fn parse_extensible(pairs: RulePairs) -> Filter {
    let mut assertion = MatchingRuleAssertion::new(None, None, Bytes::default(), false);
    for pair in pairs {
        match pair.as_rule() {
            Rule::ruleid => assertion.matching_rule = Some(as_bytes(&pair)),
            Rule::ident => assertion.r#type = Some(as_bytes(&pair)),
            Rule::string => assertion.match_value = as_value(&pair),
            Rule::dnattr => assertion.dn_attributes = true,
            _ => panic!("Unexpected rule"),
        }
    }
    Filter::ExtensibleMatch(assertion)
}

fn substring_to_ldap(mut pairs: RulePairs) -> Filter {
    let attr = as_bytes(&pairs.next().expect("No attribute"));
    let choices = pairs
        .map(|pair| match pair.as_rule() {
            Rule::initial => SubstringChoice::Initial(as_value(&pair)),
            Rule::any => SubstringChoice::Any(as_value(&pair)),
            Rule::final_ => SubstringChoice::Final(as_value(&pair)),
            _ => panic!("Unexpected rule"),
        })
        .collect();
    Filter::Substrings(SubstringFilter::new(attr, choices))
}

fn parse_simple(pairs: RulePairs) -> Filter {
    let pairs = pairs.collect::<Vec<_>>();
    let assertion = AttributeValueAssertion::new(as_bytes(&pairs[0]), as_value(&pairs[2]));
    match pairs[1].as_rule() {
        Rule::equal => Filter::EqualityMatch(assertion),
        Rule::approx => Filter::ApproxMatch(assertion),
        Rule::greater => Filter::GreaterOrEqual(assertion),
        Rule::less => Filter::LessOrEqual(assertion),
        _ => panic!("Unexpected rule"),
    }
}

#[allow(clippy::mutable_key_type)]
fn parse_set(pairs: RulePairs) -> SetOf<Filter> {
    pairs.map(parse_rule).collect()
}

fn escape_value(value: &[u8], out: &mut String) {
    let escape = |b: u8, out: &mut String| {
        let _ = write!(out, "\\{:02x}", b);
    };
    match std::str::from_utf8(value) {
        Ok(s) => {
            for c in s.chars() {
                match c {
                    '*' | '(' | ')' | '\\' => escape(c as u8, out),
                    c if c.is_ascii_control() => escape(c as u8, out),
                    c => out.push(c),
                }
            }
        }
        Err(_) => {
            for b in value {
                if b.is_ascii_graphic() && !b"*()\\".contains(b) || *b == b' ' {
                    out.push(*b as char);
                } else {
                    escape(*b, out);
                }
            }
        }
    }
}

fn write_filter(filter: &Filter, out: &mut String) {
    let write_ava = |ava: &AttributeValueAssertion, op: &str, out: &mut String| {
        out.push_str(&String::from_utf8_lossy(&ava.attribute_desc));
        out.push_str(op);
        escape_value(&ava.assertion_value, out);
    };

    out.push('(');
    match filter {
        Filter::And(set) | Filter::Or(set) => {
            out.push(if matches!(filter, Filter::And(_)) { '&' } else { '|' });
            for f in set.iter() {
                write_filter(f, out);
            }
        }
        Filter::Not(f) => {
            out.push('!');
            write_filter(f, out);
        }
        Filter::EqualityMatch(ava) => write_ava(ava, "=", out),
        Filter::ApproxMatch(ava) => write_ava(ava, "~=", out),
        Filter::GreaterOrEqual(ava) => write_ava(ava, ">=", out),
        Filter::LessOrEqual(ava) => write_ava(ava, "<=", out),
        Filter::Present(attr) => {
            out.push_str(&String::from_utf8_lossy(attr));
            out.push_str("=*");
        }
        Filter::Substrings(sub) => {
            out.push_str(&String::from_utf8_lossy(&sub.r#type));
            out.push('=');
            let mut after_star = false;
            for choice in &sub.substrings {
                match choice {
                    SubstringChoice::Initial(v) => escape_value(v, out),
                    SubstringChoice::Any(v) => {
                        if !after_star {
                            out.push('*');
                        }
                        escape_value(v, out);
                    }
                    SubstringChoice::Final(v) => {
                        if !after_star {
                            out.push('*');
                        }
                        escape_value(v, out);
                        after_star = true;
                        continue;
                    }
                    _ => unreachable!("unknown substring choice"),
                }
                out.push('*');
                after_star = true;
            }
            if !after_star {
                out.push('*');
            }
        }
        Filter::ExtensibleMatch(mra) => {
            if let Some(ref attr) = mra.r#type {
                out.push_str(&String::from_utf8_lossy(attr));
            }
            if mra.dn_attributes {
                out.push_str(":dn");
            }
            if let Some(ref rule) = mra.matching_rule {
                out.push(':');
                out.push_str(&String::from_utf8_lossy(rule));
            }
            out.push_str(":=");
            escape_value(&mra.match_value, out);
        }
        _ => unreachable!("unknown filter variant"),
    }
    out.push(')');
}

/// Render a filter back to its RFC 4515 string form
pub fn filter_to_string(filter: &Filter) -> String {
    let mut out = String::new();
    write_filter(filter, &mut out);
    out
}
