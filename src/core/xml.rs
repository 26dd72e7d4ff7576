//! XML qualified names, well-known namespaces and local-name encoding

use serde::{Deserialize, Serialize};
use std::fmt;

pub const SCHEMA_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const SERIALIZATION_NAMESPACE: &str = "http://schemas.microsoft.com/2003/10/Serialization/";
pub const COLLECTIONS_NAMESPACE: &str = "http://schemas.microsoft.com/2003/10/Serialization/Arrays";
pub const DATA_CONTRACT_BASE_NAMESPACE: &str = "http://schemas.datacontract.org/2004/07/";

pub const ARRAY_PREFIX: &str = "ArrayOf";
pub const KEY_LOCAL_NAME: &str = "Key";
pub const VALUE_LOCAL_NAME: &str = "Value";

/// A (local name, namespace) pair. This is the identity of a contract on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct XmlName {
    pub namespace: String,
    pub name: String,
}

impl XmlName {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: namespace.into() }
    }

    pub fn schema(name: &str) -> Self {
        Self::new(name, SCHEMA_NAMESPACE)
    }

    pub fn serialization(name: &str) -> Self {
        Self::new(name, SERIALIZATION_NAMESPACE)
    }

    pub fn is_builtin_namespace(&self) -> bool {
        is_builtin_namespace(&self.namespace)
    }
}

impl fmt::Display for XmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.namespace, self.name)
        }
    }
}

pub fn is_builtin_namespace(namespace: &str) -> bool {
    namespace == SCHEMA_NAMESPACE || namespace == SERIALIZATION_NAMESPACE
}

/// Encode a local name so it is always a legal NCName.
///
/// Plain ASCII identifiers and valid NCNames pass through unchanged. Any other
/// character becomes `_xHHHH_`; an underscore that would otherwise be read back
/// as the start of an escape is itself escaped.
pub fn encode_local_name(name: &str) -> String {
    if is_ascii_local_name(name) || is_valid_ncname(name) {
        return name.to_string();
    }

    let chars: Vec<char> = name.chars().collect();
    let mut encoded = String::with_capacity(name.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' && escape_length(&chars[i..]).is_some() {
            encoded.push_str("_x005F_");
        } else if (i == 0 && !is_name_start_char(c)) || (i > 0 && !is_name_char(c)) {
            push_escape(&mut encoded, c);
        } else {
            encoded.push(c);
        }
    }
    encoded
}

/// Reverse of [`encode_local_name`].
pub fn decode_local_name(name: &str) -> String {
    if !name.contains("_x") && !name.contains("_X") {
        return name.to_string();
    }

    let chars: Vec<char> = name.chars().collect();
    let mut decoded = String::with_capacity(name.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '_' {
            if let Some(len) = escape_length(&chars[i..]) {
                let hex: String = chars[i + 2..i + len - 1].iter().collect();
                if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    decoded.push(c);
                    i += len;
                    continue;
                }
            }
        }
        decoded.push(chars[i]);
        i += 1;
    }
    decoded
}

pub fn is_ascii_local_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

pub fn is_valid_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

fn is_name_start_char(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c) || c.is_numeric() || c == '-' || c == '.' || c == '\u{B7}'
}

/// Length of an `_xHHHH_` or `_xHHHHHHHH_` sequence at the start of `chars`.
fn escape_length(chars: &[char]) -> Option<usize> {
    if chars.len() < 7 || chars[0] != '_' || !matches!(chars[1], 'x' | 'X') {
        return None;
    }
    let hex_run = chars[2..].iter().take(8).take_while(|c| c.is_ascii_hexdigit()).count();
    if hex_run >= 8 && chars.get(10) == Some(&'_') {
        Some(11)
    } else if hex_run >= 4 && chars[6] == '_' {
        Some(7)
    } else {
        None
    }
}

fn push_escape(out: &mut String, c: char) {
    let code = c as u32;
    if code > 0xFFFF {
        out.push_str(&format!("_x{:08X}_", code));
    } else {
        out.push_str(&format!("_x{:04X}_", code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_names_pass_through() {
        assert_eq!(encode_local_name("Person"), "Person");
        assert_eq!(encode_local_name("ArrayOfint"), "ArrayOfint");
        assert_eq!(encode_local_name("Outer.Inner"), "Outer.Inner");
        assert_eq!(encode_local_name("_private"), "_private");
    }

    #[test]
    fn test_invalid_characters_are_escaped() {
        assert_eq!(encode_local_name("1st"), "_x0031_st");
        assert_eq!(encode_local_name("a b"), "a_x0020_b");
        assert_eq!(encode_local_name("a:b"), "a_x003A_b");
    }

    #[test]
    fn test_underscore_escape_lookalike() {
        let encoded = encode_local_name("a b_x0041_");
        assert_eq!(encoded, "a_x0020_b_x005F_x0041_");
        assert_eq!(decode_local_name(&encoded), "a b_x0041_");
    }

    #[test]
    fn test_builtin_namespaces() {
        assert!(is_builtin_namespace(SCHEMA_NAMESPACE));
        assert!(is_builtin_namespace(SERIALIZATION_NAMESPACE));
        assert!(!is_builtin_namespace(COLLECTIONS_NAMESPACE));
    }

    #[test]
    fn test_display() {
        assert_eq!(XmlName::schema("int").to_string(), "http://www.w3.org/2001/XMLSchema:int");
    }

    proptest! {
        #[test]
        fn encoded_names_are_ncnames(name in "\\PC{1,12}") {
            let encoded = encode_local_name(&name);
            prop_assert!(is_valid_ncname(&encoded));
        }

        #[test]
        fn encoding_round_trips(name in "[a-wyzA-WYZ0-9 _:#\\-]{1,12}") {
            prop_assert_eq!(decode_local_name(&encode_local_name(&name)), name);
        }
    }
}
