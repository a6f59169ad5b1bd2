//! Individual checks a rule is made of.
//!
//! Every function here is pure and answers with a plain `bool`: anything
//! unexpected (invalid header name, non-UTF-8 values, undecodable query
//! strings) counts as "no match" so a broken setup falls through to the real
//! transport instead of faking responses.

use crate::rule::{QueryPredicate, WILDCARD};
use hyper::header::HeaderName;
use hyper::{HeaderMap, Uri};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Check the ambient headers for `expected` as one of the comma separated
/// tokens of header `name`.
///
/// All occurrences of the header are considered. Tokens are trimmed before
/// comparison; the comparison itself is exact and case-sensitive.
pub fn header_matches(name: &str, expected: &str, headers: &HeaderMap) -> bool {
    if name.trim().is_empty() || expected.trim().is_empty() {
        return false;
    }

    let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
        return false;
    };

    headers
        .get_all(&name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim() == expected)
}

/// Exact path check.
///
/// Absolute URIs compare their path component; relative URIs compare their
/// full text, query included. A blank rule path matches everything.
pub fn path_matches(path: &str, uri: Option<&Uri>) -> bool {
    if path.trim().is_empty() {
        return true;
    }

    match uri {
        Some(uri) if uri.scheme().is_some() => uri.path() == path,
        Some(uri) => uri.to_string() == path,
        None => false,
    }
}

/// Parse a raw query string into decoded parameters.
///
/// Pairs without `=` do not define a parameter and repeated names are joined
/// with `,`. Returns `None` for an empty query or when any pair fails to
/// decode.
pub fn parse_query_string(query: &str) -> Option<HashMap<String, String>> {
    if query.is_empty() {
        return None;
    }

    let mut params: HashMap<String, String> = HashMap::new();
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = decode_component(key)?;
        let value = decode_component(value)?;

        match params.entry(key) {
            Entry::Occupied(mut existing) => {
                let joined = existing.get_mut();
                joined.push(',');
                joined.push_str(&value);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
    Some(params)
}

fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|decoded| decoded.into_owned())
}

/// Literal (or wildcard) query parameter check.
pub fn query_matches(
    expected: &HashMap<String, String>,
    params: Option<&HashMap<String, String>>,
) -> bool {
    if expected.is_empty() {
        return true;
    }
    let Some(params) = params else {
        return false;
    };

    expected.iter().all(|(name, value)| {
        params
            .get(name)
            .is_some_and(|actual| value == WILDCARD || actual == value)
    })
}

/// Predicate-based query parameter check.
pub fn dynamic_query_matches(
    predicates: &HashMap<String, QueryPredicate>,
    params: Option<&HashMap<String, String>>,
) -> bool {
    if predicates.is_empty() {
        return true;
    }
    let Some(params) = params else {
        return false;
    };

    predicates
        .iter()
        .all(|(name, predicate)| params.get(name).is_some_and(|actual| predicate(actual)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;
    use std::sync::Arc;

    fn header_map(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(*name, HeaderValue::from_static(value));
        }
        headers
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_header_single_value() {
        let headers = header_map(&[("name", "value")]);
        assert!(header_matches("name", "value", &headers));
        assert!(!header_matches("name", "anotherValue", &headers));
        assert!(!header_matches("other", "value", &headers));
    }

    #[test]
    fn test_header_name_is_case_insensitive() {
        let headers = header_map(&[("x-fake", "on")]);
        assert!(header_matches("X-Fake", "on", &headers));
        assert!(header_matches("X-FAKE", "on", &headers));
    }

    #[test]
    fn test_header_value_is_case_sensitive() {
        let headers = header_map(&[("x-fake", "On")]);
        assert!(!header_matches("x-fake", "on", &headers));
    }

    #[test]
    fn test_header_blank_rule_never_matches() {
        let headers = header_map(&[("name", "value")]);
        assert!(!header_matches("", "value", &headers));
        assert!(!header_matches("  ", "value", &headers));
        assert!(!header_matches("name", "", &headers));
        assert!(!header_matches("name", " ", &headers));
    }

    #[test]
    fn test_header_invalid_name_never_matches() {
        let headers = header_map(&[("name", "value")]);
        assert!(!header_matches("bad name", "value", &headers));
    }

    #[test]
    fn test_header_empty_value_never_matches() {
        let headers = header_map(&[("name", "")]);
        assert!(!header_matches("name", "value", &headers));
    }

    #[test]
    fn test_header_comma_tokens() {
        let headers = header_map(&[("name", "a,b")]);
        assert!(header_matches("name", "a", &headers));
        assert!(header_matches("name", "b", &headers));

        let headers = header_map(&[("name", "ab")]);
        assert!(!header_matches("name", "a", &headers));
        assert!(!header_matches("name", "b", &headers));
    }

    #[test]
    fn test_header_tokens_are_trimmed() {
        let headers = header_map(&[("name", "a, b,c")]);
        assert!(header_matches("name", "a", &headers));
        assert!(header_matches("name", "b", &headers));
        assert!(header_matches("name", "c", &headers));

        let headers = header_map(&[("name", " a ,b")]);
        assert!(header_matches("name", "a", &headers));
    }

    #[test]
    fn test_header_expected_value_is_not_trimmed() {
        let headers = header_map(&[("name", "a, b,c")]);
        assert!(!header_matches("name", "a ", &headers));
        assert!(!header_matches("name", " b", &headers));
    }

    #[test]
    fn test_header_repeated_occurrences() {
        let headers = header_map(&[("name", "first"), ("name", "second,third")]);
        assert!(header_matches("name", "first", &headers));
        assert!(header_matches("name", "third", &headers));
    }

    #[test]
    fn test_path_blank_is_vacuous() {
        assert!(path_matches("", None));
        assert!(path_matches("   ", Some(&"https://host/a".parse().unwrap())));
        assert!(path_matches("", Some(&"/relative".parse().unwrap())));
    }

    #[test]
    fn test_path_absolute_uri_compares_path() {
        let uri: Uri = "https://example.com/path/for/fakeResponse?x=1".parse().unwrap();
        assert!(path_matches("/path/for/fakeResponse", Some(&uri)));

        let uri: Uri = "https://example.com/path/for/realResponse".parse().unwrap();
        assert!(!path_matches("/path/for/fakeResponse", Some(&uri)));
    }

    #[test]
    fn test_path_relative_uri_compares_full_text() {
        let uri: Uri = "/path/for/fakeResponse".parse().unwrap();
        assert!(path_matches("/path/for/fakeResponse", Some(&uri)));

        let uri: Uri = "/path/for/fakeResponse?x=1".parse().unwrap();
        assert!(!path_matches("/path/for/fakeResponse", Some(&uri)));
    }

    #[test]
    fn test_path_no_normalization() {
        let uri: Uri = "https://example.com/v1/items/".parse().unwrap();
        assert!(!path_matches("/v1/items", Some(&uri)));
    }

    #[test]
    fn test_path_missing_uri() {
        assert!(!path_matches("/v1/items", None));
    }

    #[test]
    fn test_parse_query_string() {
        let parsed = parse_query_string("a=1&b=two%20words&c=x+y&flag").unwrap();
        assert_eq!(parsed.get("a").map(String::as_str), Some("1"));
        assert_eq!(parsed.get("b").map(String::as_str), Some("two words"));
        assert_eq!(parsed.get("c").map(String::as_str), Some("x y"));
        assert!(!parsed.contains_key("flag"));
    }

    #[test]
    fn test_parse_query_string_repeated_names() {
        let parsed = parse_query_string("id=1&id=2").unwrap();
        assert_eq!(parsed.get("id").map(String::as_str), Some("1,2"));
    }

    #[test]
    fn test_parse_query_string_rejects_empty_and_undecodable() {
        assert!(parse_query_string("").is_none());
        assert!(parse_query_string("a=%FF").is_none());
    }

    #[test]
    fn test_query_matches_literal_and_wildcard() {
        let expected = params(&[("q", "*"), ("page", "1")]);

        assert!(query_matches(
            &expected,
            Some(&params(&[("q", "rust"), ("page", "1"), ("extra", "x")]))
        ));
        assert!(!query_matches(
            &expected,
            Some(&params(&[("q", "rust"), ("page", "2")]))
        ));
        assert!(!query_matches(&expected, Some(&params(&[("page", "1")]))));
        assert!(!query_matches(&expected, None));
    }

    #[test]
    fn test_query_matches_empty_expectation() {
        assert!(query_matches(&HashMap::new(), None));
    }

    #[test]
    fn test_dynamic_query_matches() {
        let mut predicates: HashMap<String, QueryPredicate> = HashMap::new();
        predicates.insert("status".to_string(), Arc::new(|v: &str| v == "active"));

        assert!(dynamic_query_matches(
            &predicates,
            Some(&params(&[("status", "active")]))
        ));
        assert!(!dynamic_query_matches(
            &predicates,
            Some(&params(&[("status", "inactive")]))
        ));
        assert!(!dynamic_query_matches(&predicates, Some(&params(&[]))));
        assert!(!dynamic_query_matches(&predicates, None));
        assert!(dynamic_query_matches(&HashMap::new(), None));
    }
}
