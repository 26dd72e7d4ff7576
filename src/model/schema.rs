//! Declarative type model input
//!
//! A [`ModelSpec`] is the JSON form of one assembly worth of type
//! declarations. Type references inside it are written as type expressions,
//! parsed by [`TypeExpr::parse`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::core::types::{
    CallbackRole, CollectionDataContractAttr, ContractNamespaceMapping, DataContractAttr, DataMemberAttr,
    EnumMemberAttr, IntegerType, MemberKind, SpecialType, Visibility, XmlRootAttr,
};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to parse model {path}: {source}")]
    Json { path: String, source: serde_json::Error },

    #[error("invalid type expression '{expression}' at offset {offset}: {reason}")]
    Expression { expression: String, offset: usize, reason: &'static str },

    #[error("unknown type '{name}' referenced from '{context}'")]
    UnknownType { name: String, context: String },

    #[error("type '{name}' is declared more than once")]
    DuplicateType { name: String },

    #[error("type '{name}' takes {expected} generic arguments, got {found}")]
    ArityMismatch { name: String, expected: usize, found: usize },

    #[error("type '{name}' is part of an inheritance cycle")]
    InheritanceCycle { name: String },

    #[error("invalid declaration of '{name}': {reason}")]
    InvalidDeclaration { name: String, reason: String },
}

/// Declarations of one assembly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSpec {
    pub assembly: String,
    pub contract_namespaces: Vec<ContractNamespaceMapping>,
    pub types: Vec<TypeSpec>,
}

impl ModelSpec {
    pub fn from_json(text: &str, origin: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|source| ModelError::Json { path: origin.to_string(), source })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    #[default]
    Class,
    Struct,
    Interface,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    /// Full metadata name, e.g. ``Zoo.Pen`1`` or `Zoo.Outer+Inner`.
    pub name: String,
    #[serde(default)]
    pub kind: DeclKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<SpecialType>,
    /// Names of the generic parameters; defaults to `T0`, `T1`, ...
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default = "default_true")]
    pub default_constructor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_contract: Option<DataContractAttr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_data_contract: Option<CollectionDataContractAttr>,
    #[serde(default)]
    pub serializable: bool,
    #[serde(default)]
    pub flags: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_root: Option<XmlRootAttr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying: Option<IntegerType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodSpec>,
    #[serde(default)]
    pub line: usize,
}

impl TypeSpec {
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility: Visibility::Public,
            special: None,
            generic_parameters: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            default_constructor: true,
            data_contract: None,
            collection_data_contract: None,
            serializable: false,
            flags: false,
            known_types: Vec::new(),
            xml_root: None,
            underlying: None,
            members: Vec::new(),
            methods: Vec::new(),
            line: 0,
        }
    }
}

/// Accessibility of a property accessor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorSpec {
    #[default]
    Public,
    Private,
    /// Public override of a base accessor.
    Override,
    None,
}

/// Enum literal value; unsigned for `ulong` enums above `i64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Signed(i64),
    Unsigned(u64),
}

impl LiteralValue {
    pub fn widen(self) -> i128 {
        match self {
            Self::Signed(v) => v as i128,
            Self::Unsigned(v) => v as i128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub name: String,
    #[serde(default = "default_member_kind")]
    pub kind: MemberKind,
    /// Type expression; enum literals default to the enum itself.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub member_type: Option<String>,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(default)]
    pub getter: AccessorSpec,
    #[serde(default)]
    pub setter: AccessorSpec,
    #[serde(default)]
    pub indexer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_member: Option<DataMemberAttr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_member: Option<EnumMemberAttr>,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub non_serialized: bool,
    #[serde(default)]
    pub optional_field: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<LiteralValue>,
    #[serde(default)]
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    /// Return type expression; absent or `void` for no return value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_interface: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callbacks: Vec<CallbackRole>,
    #[serde(default)]
    pub line: usize,
}

impl MethodSpec {
    pub fn new(name: &str, parameters: &[&str], returns: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            returns: returns.map(str::to_string),
            public: true,
            is_static: false,
            is_virtual: false,
            explicit_interface: None,
            callbacks: Vec::new(),
            line: 0,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_member_kind() -> MemberKind {
    MemberKind::Property
}

/// Parsed type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// Full metadata name, with arguments when constructed.
    Named { name: String, arguments: Vec<TypeExpr> },
    /// `!n`: generic parameter of the declaring definition.
    Parameter(u32),
    Array { element: Box<TypeExpr>, rank: u32 },
    Nullable(Box<TypeExpr>),
}

const KEYWORDS: [(&str, &str); 16] = [
    ("bool", "System.Boolean"),
    ("byte", "System.Byte"),
    ("sbyte", "System.SByte"),
    ("char", "System.Char"),
    ("short", "System.Int16"),
    ("ushort", "System.UInt16"),
    ("int", "System.Int32"),
    ("uint", "System.UInt32"),
    ("long", "System.Int64"),
    ("ulong", "System.UInt64"),
    ("float", "System.Single"),
    ("double", "System.Double"),
    ("decimal", "System.Decimal"),
    ("string", "System.String"),
    ("object", "System.Object"),
    ("void", "System.Void"),
];

impl TypeExpr {
    pub fn parse(expression: &str) -> Result<Self, ModelError> {
        let mut parser = ExprParser { text: expression, bytes: expression.as_bytes(), pos: 0 };
        let expr = parser.expr()?;
        parser.skip_whitespace();
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(expr)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into(), arguments: Vec::new() }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Named { name, arguments } if name == "System.Void" && arguments.is_empty())
    }
}

impl FromStr for TypeExpr {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name, arguments } => {
                write!(f, "{}", name)?;
                if !arguments.is_empty() {
                    write!(f, "[")?;
                    for (i, argument) in arguments.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", argument)?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            Self::Parameter(position) => write!(f, "!{}", position),
            Self::Array { element, rank } => {
                write!(f, "{}[{}]", element, ",".repeat(rank.saturating_sub(1) as usize))
            }
            Self::Nullable(inner) => write!(f, "{}?", inner),
        }
    }
}

struct ExprParser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl ExprParser<'_> {
    fn error(&self, reason: &'static str) -> ModelError {
        ModelError::Expression { expression: self.text.to_string(), offset: self.pos, reason }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, |b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expr(&mut self) -> Result<TypeExpr, ModelError> {
        self.skip_whitespace();
        let mut expr = self.primary()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'?') => {
                    self.pos += 1;
                    expr = TypeExpr::Nullable(Box::new(expr));
                }
                Some(b'[') if self.is_array_suffix() => {
                    self.pos += 1;
                    let mut rank = 1;
                    loop {
                        self.skip_whitespace();
                        match self.peek() {
                            Some(b',') => {
                                rank += 1;
                                self.pos += 1;
                            }
                            Some(b']') => {
                                self.pos += 1;
                                break;
                            }
                            _ => return Err(self.error("unterminated array rank")),
                        }
                    }
                    expr = TypeExpr::Array { element: Box::new(expr), rank };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// `[` followed only by commas and whitespace up to `]`.
    fn is_array_suffix(&self) -> bool {
        self.bytes[self.pos + 1..]
            .iter()
            .find(|b| !b.is_ascii_whitespace() && **b != b',')
            .map_or(false, |&b| b == b']')
    }

    fn primary(&mut self) -> Result<TypeExpr, ModelError> {
        if self.peek() == Some(b'!') {
            self.pos += 1;
            let start = self.pos;
            while self.peek().map_or(false, |b| b.is_ascii_digit()) {
                self.pos += 1;
            }
            let position = self.text[start..self.pos]
                .parse()
                .map_err(|_| self.error("expected a generic parameter position"))?;
            return Ok(TypeExpr::Parameter(position));
        }

        let start = self.pos;
        while self
            .peek()
            .map_or(false, |b| !matches!(b, b'[' | b']' | b',' | b'?' | b'!') && !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }
        let raw = &self.text[start..self.pos];
        let name = KEYWORDS
            .iter()
            .find(|(keyword, _)| *keyword == raw)
            .map_or(raw, |(_, full)| full)
            .to_string();

        let mut arguments = Vec::new();
        if raw.contains('`') && self.peek() == Some(b'[') && !self.is_array_suffix() {
            self.pos += 1;
            loop {
                arguments.push(self.expr()?);
                self.skip_whitespace();
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b']') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("expected ',' or ']' in generic arguments")),
                }
            }
        }
        Ok(TypeExpr::Named { name, arguments })
    }
}

/// Sum of the arity suffixes along a nested name, e.g. ``Outer`1+Inner`2`` is 3.
pub fn total_arity(name: &str) -> usize {
    name.split('+')
        .filter_map(|segment| segment.rsplit_once('`'))
        .filter_map(|(_, arity)| arity.parse::<usize>().ok())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords_and_arrays() {
        assert_eq!(TypeExpr::parse("int").unwrap(), TypeExpr::named("System.Int32"));
        assert_eq!(
            TypeExpr::parse("string[]").unwrap(),
            TypeExpr::Array { element: Box::new(TypeExpr::named("System.String")), rank: 1 }
        );
        assert_eq!(
            TypeExpr::parse("System.Int32[,]").unwrap(),
            TypeExpr::Array { element: Box::new(TypeExpr::named("System.Int32")), rank: 2 }
        );
    }

    #[test]
    fn test_parse_nested_generics() {
        let expr = TypeExpr::parse("System.Collections.Generic.Dictionary`2[string, System.Collections.Generic.List`1[!0]]")
            .unwrap();
        let TypeExpr::Named { name, arguments } = &expr else {
            panic!("expected a named type");
        };
        assert_eq!(name, "System.Collections.Generic.Dictionary`2");
        assert_eq!(arguments.len(), 2);
        assert_eq!(
            arguments[1],
            TypeExpr::Named {
                name: "System.Collections.Generic.List`1".into(),
                arguments: vec![TypeExpr::Parameter(0)],
            }
        );
    }

    #[test]
    fn test_parse_generic_array_and_nullable() {
        let expr = TypeExpr::parse("Zoo.Box`1[int][]").unwrap();
        assert!(matches!(expr, TypeExpr::Array { rank: 1, .. }));
        let expr = TypeExpr::parse("int?").unwrap();
        assert_eq!(expr, TypeExpr::Nullable(Box::new(TypeExpr::named("System.Int32"))));
        assert_eq!(expr.to_string(), "System.Int32?");
    }

    #[test]
    fn test_parse_errors() {
        assert!(TypeExpr::parse("").is_err());
        assert!(TypeExpr::parse("Zoo.Box`1[int").is_err());
        assert!(TypeExpr::parse("int]").is_err());
        assert!(TypeExpr::parse("!x").is_err());
    }

    #[test]
    fn test_total_arity() {
        assert_eq!(total_arity("Zoo.Animal"), 0);
        assert_eq!(total_arity("Zoo.Outer`1+Inner`2"), 3);
        assert_eq!(total_arity("Zoo.Outer`1+Inner"), 1);
    }

    #[test]
    fn test_spec_defaults() {
        let spec = ModelSpec::from_json(
            r#"{"types":[{"name":"Zoo.Animal","members":[{"name":"Name","type":"string"}]}]}"#,
            "inline",
        )
        .unwrap();
        let animal = &spec.types[0];
        assert_eq!(animal.kind, DeclKind::Class);
        assert!(animal.default_constructor);
        assert_eq!(animal.members[0].kind, MemberKind::Property);
        assert_eq!(animal.members[0].setter, AccessorSpec::Public);
    }
}
