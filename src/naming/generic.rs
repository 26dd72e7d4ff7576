//! Generic contract names: `{i}` / `{#}` expansion and nesting arity

use smallvec::SmallVec;

use crate::core::xml::{is_builtin_namespace, XmlName};
use crate::errors::ContractError;
use crate::naming::digest::namespaces_digest;

/// Generic parameter count of every nesting level, outermost first.
pub type NestedCounts = SmallVec<[u32; 4]>;

/// Split a dotted nesting path such as ``Outer`1.Inner`` into the name without
/// arity suffixes (with `Of` appended) and the per-level parameter counts.
pub fn split_generic_name(type_name: &str) -> (String, NestedCounts) {
    let mut local = String::with_capacity(type_name.len() + 2);
    let mut counts = NestedCounts::new();
    let mut start = 0;

    loop {
        let Some(end) = find_from(type_name, '`', start) else {
            local.push_str(&type_name[start..]);
            counts.push(0);
            break;
        };
        local.push_str(&type_name[start..end]);

        // Non-generic nesting levels between the previous level and this arity.
        if end > start + 1 {
            counts.extend(type_name[start + 1..end].matches('.').map(|_| 0));
        }

        match find_from(type_name, '.', end) {
            Some(dot) => {
                counts.push(parse_arity(&type_name[end + 1..dot]));
                start = dot;
            }
            None => {
                counts.push(parse_arity(&type_name[end + 1..]));
                break;
            }
        }
    }

    local.push_str("Of");
    (local, counts)
}

fn find_from(text: &str, needle: char, from: usize) -> Option<usize> {
    text.get(from..)?.find(needle).map(|i| i + from)
}

fn parse_arity(text: &str) -> u32 {
    text.parse().unwrap_or(0)
}

/// Resolved names of the arguments of one generic instantiation.
#[derive(Debug, Clone)]
pub struct GenericNameProvider {
    pub parameters: Vec<XmlName>,
    pub nested_counts: NestedCounts,
}

impl GenericNameProvider {
    pub fn new(parameters: Vec<XmlName>, nested_counts: NestedCounts) -> Self {
        Self { parameters, nested_counts }
    }

    pub fn parameters_from_builtin_namespaces(&self) -> bool {
        self.parameters.iter().all(|p| is_builtin_namespace(&p.namespace))
    }

    pub fn needs_digest(&self) -> bool {
        self.nested_counts.len() > 1 || !self.parameters_from_builtin_namespaces()
    }

    pub fn digest(&self) -> String {
        let mut namespaces = String::new();
        for parameter in &self.parameters {
            namespaces.push(' ');
            namespaces.push_str(&parameter.namespace);
        }
        // Each count is inserted at the front, so the outermost ends up last.
        for count in &self.nested_counts {
            namespaces = format!(" {}{}", count, namespaces);
        }
        namespaces_digest(&namespaces)
    }
}

/// Expand `{i}` to the i-th argument's local name and `{#}` to the namespace
/// digest (empty when no digest is needed).
pub fn expand_generic_parameters(
    format: &str,
    provider: &GenericNameProvider,
    type_name: &str,
) -> Result<String, ContractError> {
    let invalid = |reason: String| ContractError::InvalidGenericName {
        type_name: type_name.to_string(),
        format: format.to_string(),
        reason,
    };

    let mut expanded = String::with_capacity(format.len());
    let mut digest: Option<String> = None;
    let mut rest = format;

    while let Some(open) = rest.find('{') {
        expanded.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(invalid("unmatched '{'".to_string()));
        };
        let placeholder = &after[..close];

        if placeholder == "#" {
            if provider.needs_digest() {
                expanded.push_str(digest.get_or_insert_with(|| provider.digest()));
            }
        } else {
            let index: usize = placeholder
                .parse()
                .map_err(|_| invalid(format!("'{{{}}}' is not a parameter index", placeholder)))?;
            let parameter = provider.parameters.get(index).ok_or_else(|| {
                invalid(format!(
                    "parameter {} is out of range for {} arguments",
                    index,
                    provider.parameters.len()
                ))
            })?;
            expanded.push_str(&parameter.name);
        }
        rest = &after[close + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::xml::SCHEMA_NAMESPACE;
    use smallvec::smallvec;

    fn provider(names: &[(&str, &str)], counts: NestedCounts) -> GenericNameProvider {
        GenericNameProvider::new(
            names.iter().map(|(n, ns)| XmlName::new(*n, *ns)).collect(),
            counts,
        )
    }

    #[test]
    fn test_split_simple_generic() {
        let (local, counts) = split_generic_name("List`1");
        assert_eq!(local, "ListOf");
        assert_eq!(counts.as_slice(), &[1]);
    }

    #[test]
    fn test_split_nested_generic() {
        let (local, counts) = split_generic_name("Outer`1.Inner");
        assert_eq!(local, "Outer.InnerOf");
        assert_eq!(counts.as_slice(), &[1, 0]);

        let (local, counts) = split_generic_name("Outer.Inner`2");
        assert_eq!(local, "Outer.InnerOf");
        assert_eq!(counts.as_slice(), &[0, 2]);
    }

    #[test]
    fn test_expand_parameters() {
        let p = provider(&[("string", SCHEMA_NAMESPACE), ("int", SCHEMA_NAMESPACE)], smallvec![2]);
        let name = expand_generic_parameters("PairOf{0}And{1}{#}", &p, "Pair`2").unwrap();
        assert_eq!(name, "PairOfstringAndint");
    }

    #[test]
    fn test_expand_digest_for_user_namespace() {
        let p = provider(&[("Animal", "http://schemas.datacontract.org/2004/07/Zoo")], smallvec![1]);
        let name = expand_generic_parameters("Box{#}", &p, "Box`1").unwrap();
        assert_eq!(name, "BoxXnRlto51");
    }

    #[test]
    fn test_expand_errors() {
        let p = provider(&[("int", SCHEMA_NAMESPACE)], smallvec![1]);
        assert!(expand_generic_parameters("Box{0", &p, "Box`1").is_err());
        assert!(expand_generic_parameters("Box{1}", &p, "Box`1").is_err());
        assert!(expand_generic_parameters("Box{x}", &p, "Box`1").is_err());
    }
}
