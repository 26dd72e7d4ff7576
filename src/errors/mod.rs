//! Contract construction errors and the diagnostics surface
//!
//! Every invalid-contract condition has its own [`ContractError`] variant with a
//! stable short code. The closure resolver turns caught errors into
//! [`Diagnostic`]s so a batch always completes and reports every failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    #[serde(default)]
    pub line: usize,
    #[serde(default)]
    pub col: usize,
    #[serde(default)]
    pub end_line: usize,
    #[serde(default)]
    pub end_col: usize,
}

impl SourceLocation {
    pub fn new(line: usize, col: usize, end_line: usize, end_col: usize) -> Self {
        Self { file: String::new(), line, col, end_line, end_col }
    }

    pub fn in_file(file: impl Into<String>, line: usize, col: usize) -> Self {
        Self { file: file.into(), line, col, end_line: line, end_col: col }
    }

    pub fn is_unknown(&self) -> bool {
        self.file.is_empty() && self.line == 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.file.is_empty() {
            write!(f, "{}:", self.file)?;
        }
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Why an explicit contract namespace was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceDefect {
    Whitespace,
    DoubleHash,
    InvalidUri,
    Reserved,
}

impl fmt::Display for NamespaceDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whitespace => write!(f, "it consists only of whitespace"),
            Self::DoubleHash => write!(f, "it contains '##'"),
            Self::InvalidUri => write!(f, "it is not a valid URI"),
            Self::Reserved => write!(f, "it is reserved for the serializer itself"),
        }
    }
}

/// Why a type that looks like a collection cannot be one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionDefect {
    BuiltIn,
    HasDataContract,
    NotEnumerable,
    NoDefaultConstructor,
    NoAddMethod { item_type: String },
    NoGetEnumerator,
    MultipleDefinitions { interface: String },
}

impl fmt::Display for CollectionDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuiltIn => write!(f, "built-in types cannot be collections"),
            Self::HasDataContract => {
                write!(f, "it also carries a structured data contract annotation")
            }
            Self::NotEnumerable => write!(f, "it does not implement IEnumerable"),
            Self::NoDefaultConstructor => {
                write!(f, "it does not have a public parameterless constructor")
            }
            Self::NoAddMethod { item_type } => {
                write!(f, "it does not have a public Add method taking {}", item_type)
            }
            Self::NoGetEnumerator => write!(f, "it does not have a GetEnumerator method"),
            Self::MultipleDefinitions { interface } => {
                write!(f, "it has multiple definitions of interface {}", interface)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("type '{type_name}' cannot be serialized; annotate it with a data contract, mark it serializable, or give it a public parameterless constructor")]
    TypeNotSerializable { type_name: String },

    #[error("type '{type_name}' has an empty explicit {property}")]
    InvalidContractName { type_name: String, property: &'static str },

    #[error("type '{type_name}' declares namespace '{namespace}', which is invalid because {defect}")]
    InvalidNamespace { type_name: String, namespace: String, defect: NamespaceDefect },

    #[error("source namespace '{clr_namespace}' is mapped to both '{first}' and '{second}'")]
    NamespaceAlreadySet { clr_namespace: String, first: String, second: String },

    #[error("generic name '{format}' on type '{type_name}' is invalid: {reason}")]
    InvalidGenericName { type_name: String, format: String, reason: String },

    #[error("type '{type_name}' is a recursive collection type; its item type refers back to it")]
    RecursiveCollectionType { type_name: String },

    #[error("value type '{type_name}' cannot set IsReference")]
    ValueTypeCannotHaveIsReference { type_name: String },

    #[error("type '{type_name}' sets IsReference to {value} but its base '{base_name}' sets it to {base_value}")]
    IsReferenceMismatch { type_name: String, base_name: String, value: bool, base_value: bool },

    #[error("enum '{type_name}' cannot set IsReference")]
    EnumCannotHaveIsReference { type_name: String },

    #[error("type '{type_name}' is annotated but derives from '{base_name}', which is not")]
    AttributedTypeInheritsNonAttributed { type_name: String, base_name: String },

    #[error("type '{type_name}' has two members named '{name}': '{first}' and '{second}'")]
    DuplicateMemberName { type_name: String, name: String, first: String, second: String },

    #[error("enum '{type_name}' has two members with the wire value '{name}': '{first}' and '{second}'")]
    DuplicateEnumMemberValue { type_name: String, name: String, first: String, second: String },

    #[error("property '{member}' on type '{type_name}' has no get method")]
    NoGetMethodForProperty { type_name: String, member: String },

    #[error("indexed property '{member}' on type '{type_name}' cannot be serialized")]
    IndexedPropertyCannotBeSerialized { type_name: String, member: String },

    #[error("member '{member}' on type '{type_name}' is neither a field nor a property")]
    InvalidMember { type_name: String, member: String },

    #[error("member '{member}' on type '{type_name}' has an empty explicit name")]
    InvalidDataMemberName { type_name: String, member: String },

    #[error("member '{member}' on type '{type_name}' is required, which is not allowed on a reference-preserving contract")]
    RequiredMemberOnReferenceType { type_name: String, member: String },

    #[error("type '{type_name}' has two {role} callbacks: '{first}' and '{second}'")]
    DuplicateCallback { type_name: String, role: String, first: String, second: String },

    #[error("method '{method}' on type '{type_name}' carries the {role} marker more than once")]
    DuplicateAttribute { type_name: String, method: String, role: String },

    #[error("callback '{method}' on type '{type_name}' must not be virtual")]
    CallbackMustNotBeVirtual { type_name: String, method: String },

    #[error("callback '{method}' on type '{type_name}' must return void")]
    CallbackMustReturnVoid { type_name: String, method: String },

    #[error("callback '{method}' on type '{type_name}' must take a single StreamingContext parameter")]
    CallbackParameterInvalid { type_name: String, method: String },

    #[error("extension data setter '{method}' on type '{type_name}' is invalid: {reason}")]
    InvalidExtensionDataSetter { type_name: String, method: String, reason: &'static str },

    #[error("type '{type_name}' implements ISerializable and cannot also carry a data contract annotation")]
    ISerializableWithDataContract { type_name: String },

    #[error("type '{type_name}' is an invalid collection type since {defect}")]
    InvalidCollection { type_name: String, defect: CollectionDefect },

    #[error("multi-dimensional array '{type_name}' is not supported")]
    MultidimensionalArray { type_name: String },

    #[error("type '{type_name}' sets {property} but is not a dictionary")]
    KeyValueNameOnNonDictionary { type_name: String, property: &'static str },

    #[error("dictionary '{type_name}' uses '{name}' for both the key and the value name")]
    DuplicateKeyValueName { type_name: String, name: String },

    #[error("enum member '{member}' on type '{type_name}' has an empty explicit value")]
    InvalidEnumMemberValue { type_name: String, member: String },

    #[error("enum field '{member}' on type '{type_name}' carries a data member marker; use an enum member marker instead")]
    DataMemberOnEnumField { type_name: String, member: String },

    #[error("known types of '{type_name}' contain both '{first}' and '{second}' with the contract name '{name}'")]
    DuplicateContractInKnownTypes { type_name: String, name: String, first: String, second: String },

    #[error("get-only member of type '{type_name}' has no set method and its type is not a collection")]
    NoSetMethodForGetOnlyMember { type_name: String },

    #[error("contract for '{type_name}' was requested while it was still being constructed")]
    CyclicConstruction { type_name: String },

    #[error("self-describing type '{type_name}' has an empty XML type name")]
    InvalidXmlContractName { type_name: String },

    #[error("{feature} on type '{type_name}' is not supported yet")]
    NotSupported { type_name: String, feature: String },

    #[error("contract for '{type_name}' is a stub and cannot be emitted: {message}")]
    StubContract { type_name: String, message: String },

    #[error("type '{type_name}' is not known to the host")]
    UnknownType { type_name: String },

    #[error("DataContract cache overflow: more than {limit} contracts")]
    CacheOverflow { limit: usize },
}

impl ContractError {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TypeNotSerializable { .. } => "DCS001",
            Self::InvalidContractName { .. } => "DCS002",
            Self::InvalidNamespace { .. } => "DCS003",
            Self::NamespaceAlreadySet { .. } => "DCS004",
            Self::InvalidGenericName { .. } => "DCS005",
            Self::RecursiveCollectionType { .. } => "DCS006",
            Self::ValueTypeCannotHaveIsReference { .. } => "DCS007",
            Self::IsReferenceMismatch { .. } => "DCS008",
            Self::EnumCannotHaveIsReference { .. } => "DCS009",
            Self::AttributedTypeInheritsNonAttributed { .. } => "DCS010",
            Self::DuplicateMemberName { .. } => "DCS011",
            Self::DuplicateEnumMemberValue { .. } => "DCS012",
            Self::NoGetMethodForProperty { .. } => "DCS013",
            Self::IndexedPropertyCannotBeSerialized { .. } => "DCS014",
            Self::InvalidMember { .. } => "DCS015",
            Self::InvalidDataMemberName { .. } => "DCS016",
            Self::RequiredMemberOnReferenceType { .. } => "DCS017",
            Self::DuplicateCallback { .. } => "DCS018",
            Self::DuplicateAttribute { .. } => "DCS019",
            Self::CallbackMustNotBeVirtual { .. } => "DCS020",
            Self::CallbackMustReturnVoid { .. } => "DCS021",
            Self::CallbackParameterInvalid { .. } => "DCS022",
            Self::InvalidExtensionDataSetter { .. } => "DCS023",
            Self::ISerializableWithDataContract { .. } => "DCS025",
            Self::InvalidCollection { .. } => "DCS026",
            Self::MultidimensionalArray { .. } => "DCS027",
            Self::KeyValueNameOnNonDictionary { .. } => "DCS028",
            Self::DuplicateKeyValueName { .. } => "DCS029",
            Self::InvalidEnumMemberValue { .. } => "DCS030",
            Self::DataMemberOnEnumField { .. } => "DCS031",
            Self::DuplicateContractInKnownTypes { .. } => "DCS032",
            Self::NoSetMethodForGetOnlyMember { .. } => "DCS033",
            Self::CyclicConstruction { .. } => "DCS034",
            Self::InvalidXmlContractName { .. } => "DCS035",
            Self::NotSupported { .. } => "DCS036",
            Self::StubContract { .. } => "DCS037",
            Self::UnknownType { .. } => "DCS038",
            Self::CacheOverflow { .. } => "DCS099",
        }
    }

    /// Fatal errors abort the whole resolution pass instead of being
    /// recorded against a single type.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CacheOverflow { .. })
    }

    pub fn to_diagnostic(&self, symbol: impl Into<String>, location: SourceLocation) -> Diagnostic {
        Diagnostic {
            code: self.code().to_string(),
            severity: Severity::Error,
            symbol: symbol.into(),
            location,
            message: self.to_string(),
        }
    }
}

/// Codes for diagnostics that do not come from a [`ContractError`].
pub mod codes {
    pub const READ_ONLY_CONTRACT: &str = "DCS101";
    pub const INVALID_COLLECTION_PLACEHOLDER: &str = "DCS102";
    pub const UNSUPPORTED_FEATURE: &str = "DCS103";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub symbol: String,
    pub location: SourceLocation,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        code: &str,
        severity: Severity,
        symbol: impl Into<String>,
        location: SourceLocation,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.to_string(),
            severity,
            symbol: symbol.into(),
            location,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.location.is_unknown() {
            write!(f, "{}: ", self.location)?;
        }
        write!(f, "{}[{}] {}: {}", self.severity, self.code, self.symbol, self.message)
    }
}

/// Collects diagnostics for one resolution pass
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    max_errors: usize,
    error_count: usize,
    suppressed: Vec<String>,
    warnings_as_errors: bool,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::with_max_errors(100)
    }

    pub fn with_max_errors(max_errors: usize) -> Self {
        Self {
            diagnostics: Vec::new(),
            max_errors,
            error_count: 0,
            suppressed: Vec::new(),
            warnings_as_errors: false,
        }
    }

    pub fn suppress(mut self, codes: impl IntoIterator<Item = String>) -> Self {
        self.suppressed.extend(codes);
        self
    }

    pub fn warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }

    pub fn add(&mut self, mut diagnostic: Diagnostic) {
        if self.suppressed.iter().any(|code| *code == diagnostic.code) {
            return;
        }
        if self.warnings_as_errors && diagnostic.severity == Severity::Warning {
            diagnostic.severity = Severity::Error;
        }
        if diagnostic.is_error() {
            if self.error_count >= self.max_errors {
                return;
            }
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn add_error(&mut self, error: &ContractError, symbol: impl Into<String>, location: SourceLocation) {
        self.add(error.to_diagnostic(symbol, location));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn is_full(&self) -> bool {
        self.error_count >= self.max_errors
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics sorted by symbol, then code, then message.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by(|a, b| {
            a.symbol
                .cmp(&b.symbol)
                .then_with(|| a.code.cmp(&b.code))
                .then_with(|| a.message.cmp(&b.message))
        });
        self.diagnostics
    }
}

impl Default for DiagnosticCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(symbol: &str) -> Diagnostic {
        ContractError::TypeNotSerializable { type_name: symbol.to_string() }
            .to_diagnostic(symbol, SourceLocation::default())
    }

    #[test]
    fn test_codes_are_unique() {
        let errors = vec![
            ContractError::TypeNotSerializable { type_name: String::new() },
            ContractError::RecursiveCollectionType { type_name: String::new() },
            ContractError::MultidimensionalArray { type_name: String::new() },
            ContractError::CacheOverflow { limit: 1 },
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_only_overflow_is_fatal() {
        assert!(ContractError::CacheOverflow { limit: 8 }.is_fatal());
        assert!(!ContractError::MultidimensionalArray { type_name: "A".into() }.is_fatal());
    }

    #[test]
    fn test_collector_caps_errors() {
        let mut collector = DiagnosticCollector::with_max_errors(2);
        for name in ["A", "B", "C"] {
            collector.add(error(name));
        }
        collector.add(Diagnostic::new(
            codes::READ_ONLY_CONTRACT,
            Severity::Warning,
            "D",
            SourceLocation::default(),
            "read-only",
        ));
        assert_eq!(collector.error_count(), 2);
        assert!(collector.is_full());
        assert_eq!(collector.len(), 3);
    }

    #[test]
    fn test_suppression_and_promotion() {
        let mut collector = DiagnosticCollector::new()
            .suppress(vec!["DCS001".to_string()])
            .warnings_as_errors(true);
        collector.add(error("A"));
        collector.add(Diagnostic::new(
            codes::READ_ONLY_CONTRACT,
            Severity::Warning,
            "B",
            SourceLocation::default(),
            "read-only",
        ));
        let diagnostics = collector.into_sorted();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_display_includes_code_and_location() {
        let diagnostic = ContractError::MultidimensionalArray { type_name: "System.Int32[,]".into() }
            .to_diagnostic("System.Int32[,]", SourceLocation::in_file("model.json", 3, 7));
        let text = diagnostic.to_string();
        assert!(text.starts_with("model.json:3:7: error[DCS027]"));
    }
}
