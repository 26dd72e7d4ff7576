//! In-memory type host
//!
//! [`TypeModel`] answers [`TypeQuery`] over declarations loaded from JSON
//! [`ModelSpec`]s plus the framework [`prelude`]. Generic instantiations and
//! arrays are created lazily through the [`intern::TypeInterner`]; their
//! members, methods, base types and interfaces are the definition's with the
//! generic parameters substituted on every query.

pub mod intern;
pub mod prelude;
pub mod schema;

use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::core::types::{
    Accessor, ContractNamespaceMapping, IntegerType, MappingScope, MemberInfo, MemberKind, MethodInfo, SpecialType,
    TypeAttributes, TypeKind, TypeQuery, TypeRef, Visibility,
};
use crate::errors::SourceLocation;
use intern::{TypeInterner, TypeKey};
pub use schema::{
    AccessorSpec, DeclKind, LiteralValue, MemberSpec, MethodSpec, ModelError, ModelSpec, TypeExpr, TypeSpec,
};

#[derive(Debug, Clone)]
struct TypeDecl {
    full_name: String,
    name: String,
    namespace: Option<String>,
    declaring: Option<TypeRef>,
    kind: TypeKind,
    special: Option<SpecialType>,
    visibility: Visibility,
    parameters: Vec<TypeRef>,
    base: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    default_constructor: bool,
    attributes: TypeAttributes,
    members: Vec<MemberInfo>,
    methods: Vec<MethodInfo>,
    underlying: Option<IntegerType>,
    assembly: usize,
    location: SourceLocation,
}

impl TypeDecl {
    fn parameter(name: String, position: u32, assembly: usize, location: SourceLocation) -> Self {
        Self {
            full_name: name.clone(),
            name,
            namespace: None,
            declaring: None,
            kind: TypeKind::GenericParameter { position },
            special: None,
            visibility: Visibility::Public,
            parameters: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            default_constructor: false,
            attributes: TypeAttributes::default(),
            members: Vec::new(),
            methods: Vec::new(),
            underlying: None,
            assembly,
            location,
        }
    }
}

/// Declared pieces of a type that reference other types.
struct Body {
    declaring: Option<TypeRef>,
    base: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    known_types: Vec<TypeRef>,
    members: Vec<MemberInfo>,
    methods: Vec<MethodInfo>,
}

enum Node<'a> {
    Declared(&'a TypeDecl),
    Array { element: TypeRef, rank: u32 },
    Generic { definition: TypeRef, arguments: SmallVec<[TypeRef; 2]> },
    Unknown,
}

struct Substitution<'a> {
    parameters: &'a [TypeRef],
    arguments: &'a [TypeRef],
}

/// Scope for resolving type expressions inside one declaration.
struct Scope<'a> {
    owner: &'a str,
    parameters: &'a [TypeRef],
}

pub struct TypeModel {
    decls: Vec<TypeDecl>,
    by_name: HashMap<String, TypeRef>,
    well_known: HashMap<SpecialType, TypeRef>,
    assemblies: Vec<Vec<ContractNamespaceMapping>>,
    interner: TypeInterner,
}

/// Collects model sources; [`ModelLoader::finish`] resolves them together so
/// declarations may refer to each other across files in any order.
pub struct ModelLoader {
    sources: Vec<(ModelSpec, String)>,
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLoader {
    pub fn new() -> Self {
        Self { sources: vec![(prelude::prelude(), String::new())] }
    }

    pub fn add(&mut self, spec: ModelSpec, origin: impl Into<String>) -> &mut Self {
        self.sources.push((spec, origin.into()));
        self
    }

    pub fn add_json(&mut self, text: &str, origin: &str) -> Result<&mut Self, ModelError> {
        let spec = ModelSpec::from_json(text, origin)?;
        Ok(self.add(spec, origin))
    }

    pub fn add_file(&mut self, path: &Path) -> Result<&mut Self, ModelError> {
        let text = fs::read_to_string(path).map_err(|source| ModelError::Io { path: path.to_path_buf(), source })?;
        let origin = path.display().to_string();
        debug!(file = %origin, "model file read");
        self.add_json(&text, &origin)
    }

    pub fn finish(self) -> Result<TypeModel, ModelError> {
        let mut decls: Vec<TypeDecl> = Vec::new();
        let mut by_name = HashMap::new();
        let mut well_known = HashMap::new();
        let mut shells = Vec::new();

        for (assembly, (spec, origin)) in self.sources.iter().enumerate() {
            for (index, ts) in spec.types.iter().enumerate() {
                let ty = TypeRef(decls.len() as u32);
                if by_name.insert(ts.name.clone(), ty).is_some() {
                    return Err(ModelError::DuplicateType { name: ts.name.clone() });
                }
                if let Some(special) = ts.special {
                    well_known.entry(special).or_insert(ty);
                }
                let location = if origin.is_empty() {
                    SourceLocation::default()
                } else {
                    SourceLocation::in_file(origin.as_str(), ts.line, 1)
                };
                let (namespace, name) = split_name(&ts.name);
                decls.push(TypeDecl {
                    full_name: ts.name.clone(),
                    name,
                    namespace,
                    declaring: None,
                    kind: match ts.kind {
                        DeclKind::Class => TypeKind::Class,
                        DeclKind::Struct => TypeKind::Struct,
                        DeclKind::Interface => TypeKind::Interface,
                        DeclKind::Enum => TypeKind::Enum,
                    },
                    special: ts.special,
                    visibility: ts.visibility,
                    parameters: Vec::new(),
                    base: None,
                    interfaces: Vec::new(),
                    default_constructor: ts.default_constructor && ts.kind != DeclKind::Interface,
                    attributes: TypeAttributes {
                        data_contract: ts.data_contract.clone(),
                        collection_data_contract: ts.collection_data_contract.clone(),
                        serializable: ts.serializable,
                        flags: ts.flags,
                        known_types: Vec::new(),
                        xml_root: ts.xml_root.clone(),
                    },
                    members: Vec::new(),
                    methods: Vec::new(),
                    underlying: (ts.kind == DeclKind::Enum).then(|| ts.underlying.unwrap_or_default()),
                    assembly,
                    location: location.clone(),
                });

                let arity = schema::total_arity(&ts.name);
                if !ts.generic_parameters.is_empty() && ts.generic_parameters.len() != arity {
                    return Err(ModelError::ArityMismatch {
                        name: ts.name.clone(),
                        expected: arity,
                        found: ts.generic_parameters.len(),
                    });
                }
                let mut parameters = Vec::with_capacity(arity);
                for position in 0..arity {
                    let name = ts.generic_parameters.get(position).cloned().unwrap_or_else(|| format!("T{}", position));
                    parameters.push(TypeRef(decls.len() as u32));
                    decls.push(TypeDecl::parameter(name, position as u32, assembly, location.clone()));
                }
                decls[ty.0 as usize].parameters = parameters;
                shells.push((ty, assembly, index));
            }
        }

        let interner = TypeInterner::new(decls.len() as u32);
        let assemblies = self.sources.iter().map(|(spec, _)| spec.contract_namespaces.clone()).collect();
        let mut model = TypeModel { decls, by_name, well_known, assemblies, interner };

        let mut bodies = Vec::with_capacity(shells.len());
        for &(ty, assembly, index) in &shells {
            let (spec, origin) = &self.sources[assembly];
            bodies.push((ty, model.resolve_body(ty, &spec.types[index], origin)?));
        }
        for (ty, body) in bodies {
            let decl = &mut model.decls[ty.0 as usize];
            decl.declaring = body.declaring;
            decl.base = body.base;
            decl.interfaces = body.interfaces;
            decl.attributes.known_types = body.known_types;
            decl.members = body.members;
            decl.methods = body.methods;
        }

        model.check_cycles()?;
        info!(types = shells.len(), sources = self.sources.len(), "type model loaded");
        Ok(model)
    }
}

/// `Ns.Outer+Inner` into (`Some("Ns")`, `Inner`); nested types carry no namespace.
fn split_name(full_name: &str) -> (Option<String>, String) {
    if let Some((_, inner)) = full_name.rsplit_once('+') {
        return (None, inner.to_string());
    }
    match full_name.rsplit_once('.') {
        Some((namespace, name)) => (Some(namespace.to_string()), name.to_string()),
        None => (None, full_name.to_string()),
    }
}

fn accessor(spec: AccessorSpec) -> Option<Accessor> {
    match spec {
        AccessorSpec::Public => Some(Accessor::public()),
        AccessorSpec::Private => Some(Accessor { is_public: false, is_override: false }),
        AccessorSpec::Override => Some(Accessor { is_public: true, is_override: true }),
        AccessorSpec::None => None,
    }
}

impl TypeModel {
    /// Model holding only the prelude plus the given JSON document.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let mut loader = ModelLoader::new();
        loader.add_json(text, "model.json")?;
        loader.finish()
    }

    pub fn from_specs(specs: impl IntoIterator<Item = ModelSpec>) -> Result<Self, ModelError> {
        let mut loader = ModelLoader::new();
        for (i, spec) in specs.into_iter().enumerate() {
            loader.add(spec, format!("spec{}", i));
        }
        loader.finish()
    }

    pub fn lookup(&self, full_name: &str) -> Option<TypeRef> {
        self.by_name.get(full_name).copied()
    }

    /// Resolve a closed type expression such as ``System.Collections.Generic.List`1[int]``.
    pub fn parse_type(&self, expression: &str) -> Result<TypeRef, ModelError> {
        let expr = TypeExpr::parse(expression)?;
        self.resolve(&expr, &Scope { owner: expression, parameters: &[] })
    }

    pub fn is_generic_definition(&self, ty: TypeRef) -> bool {
        matches!(self.node(ty), Node::Declared(decl) if !decl.parameters.is_empty())
    }

    /// Closed, non-interface types declared outside the prelude, sorted by name.
    pub fn roots(&self) -> Vec<TypeRef> {
        let mut roots: Vec<(&str, TypeRef)> = self
            .decls
            .iter()
            .enumerate()
            .filter(|(_, decl)| {
                decl.assembly > 0
                    && decl.parameters.is_empty()
                    && !matches!(decl.kind, TypeKind::GenericParameter { .. } | TypeKind::Interface)
            })
            .map(|(i, decl)| (decl.full_name.as_str(), TypeRef(i as u32)))
            .collect();
        roots.sort();
        roots.into_iter().map(|(_, ty)| ty).collect()
    }

    /// Declared types, generic parameters excluded.
    pub fn declared_count(&self) -> usize {
        self.decls.iter().filter(|d| !matches!(d.kind, TypeKind::GenericParameter { .. })).count()
    }

    pub fn constructed_count(&self) -> usize {
        self.interner.len()
    }

    fn node(&self, ty: TypeRef) -> Node<'_> {
        if let Some(decl) = self.decls.get(ty.0 as usize) {
            return Node::Declared(decl);
        }
        match self.interner.key_of(ty) {
            Some(TypeKey::Array { element, rank }) => Node::Array { element, rank },
            Some(TypeKey::Generic { definition, arguments }) => Node::Generic { definition, arguments },
            None => Node::Unknown,
        }
    }

    fn decl(&self, ty: TypeRef) -> Option<&TypeDecl> {
        self.decls.get(ty.0 as usize)
    }

    fn array_of(&self, element: TypeRef, rank: u32) -> TypeRef {
        self.interner.intern(TypeKey::Array { element, rank })
    }

    fn substitute(&self, ty: TypeRef, map: &Substitution<'_>) -> TypeRef {
        if let Some(i) = map.parameters.iter().position(|&p| p == ty) {
            return map.arguments[i];
        }
        match self.node(ty) {
            Node::Array { element, rank } => {
                let replaced = self.substitute(element, map);
                if replaced == element {
                    ty
                } else {
                    self.array_of(replaced, rank)
                }
            }
            Node::Generic { definition, arguments } => {
                let replaced: Vec<TypeRef> = arguments.iter().map(|&a| self.substitute(a, map)).collect();
                if replaced.as_slice() == arguments.as_slice() {
                    ty
                } else {
                    self.make_generic(definition, &replaced).unwrap_or(ty)
                }
            }
            // An open definition named inside its own body stands for itself applied to its parameters.
            Node::Declared(decl) if !decl.parameters.is_empty() => {
                let replaced: Vec<TypeRef> = decl.parameters.iter().map(|&p| self.substitute(p, map)).collect();
                if replaced == decl.parameters {
                    ty
                } else {
                    self.make_generic(ty, &replaced).unwrap_or(ty)
                }
            }
            _ => ty,
        }
    }

    fn with_substitution<T>(&self, definition: TypeRef, arguments: &[TypeRef], f: impl FnOnce(&Substitution<'_>) -> T) -> T {
        let parameters = self.decl(definition).map(|d| d.parameters.as_slice()).unwrap_or(&[]);
        f(&Substitution { parameters, arguments })
    }

    fn resolve(&self, expr: &TypeExpr, scope: &Scope<'_>) -> Result<TypeRef, ModelError> {
        match expr {
            TypeExpr::Parameter(position) => {
                scope.parameters.get(*position as usize).copied().ok_or_else(|| ModelError::InvalidDeclaration {
                    name: scope.owner.to_string(),
                    reason: format!("it has no generic parameter !{}", position),
                })
            }
            TypeExpr::Named { name, arguments } => {
                let found = self.lookup(name).or_else(|| {
                    if !arguments.is_empty() {
                        return None;
                    }
                    scope
                        .parameters
                        .iter()
                        .copied()
                        .find(|&p| self.decl(p).map_or(false, |d| &d.name == name))
                });
                let ty = found.ok_or_else(|| ModelError::UnknownType {
                    name: name.clone(),
                    context: scope.owner.to_string(),
                })?;
                if arguments.is_empty() {
                    return Ok(ty);
                }
                let resolved = arguments.iter().map(|a| self.resolve(a, scope)).collect::<Result<Vec<_>, _>>()?;
                let expected = self.decl(ty).map_or(0, |d| d.parameters.len());
                if expected != resolved.len() {
                    return Err(ModelError::ArityMismatch { name: name.clone(), expected, found: resolved.len() });
                }
                self.make_generic(ty, &resolved).ok_or_else(|| ModelError::ArityMismatch {
                    name: name.clone(),
                    expected,
                    found: resolved.len(),
                })
            }
            TypeExpr::Array { element, rank } => Ok(self.array_of(self.resolve(element, scope)?, *rank)),
            TypeExpr::Nullable(inner) => {
                let inner = self.resolve(inner, scope)?;
                self.well_known(SpecialType::Nullable)
                    .and_then(|nullable| self.make_generic(nullable, &[inner]))
                    .ok_or_else(|| ModelError::UnknownType {
                        name: "System.Nullable`1".to_string(),
                        context: scope.owner.to_string(),
                    })
            }
        }
    }

    fn resolve_text(&self, text: &str, scope: &Scope<'_>) -> Result<TypeRef, ModelError> {
        self.resolve(&TypeExpr::parse(text)?, scope)
    }

    fn resolve_body(&self, ty: TypeRef, spec: &TypeSpec, origin: &str) -> Result<Body, ModelError> {
        let decl = &self.decls[ty.0 as usize];
        let scope = Scope { owner: &spec.name, parameters: &decl.parameters };
        let location = |line: usize| {
            if origin.is_empty() {
                SourceLocation::default()
            } else {
                SourceLocation::in_file(origin, if line == 0 { spec.line } else { line }, 1)
            }
        };

        let declaring = match spec.name.rsplit_once('+') {
            Some((outer, _)) => Some(self.lookup(outer).ok_or_else(|| ModelError::UnknownType {
                name: outer.to_string(),
                context: spec.name.clone(),
            })?),
            None => None,
        };

        let base = match &spec.base {
            Some(base) => Some(self.resolve_text(base, &scope)?),
            None => {
                let implicit = match spec.kind {
                    DeclKind::Class if spec.special != Some(SpecialType::Object) => SpecialType::Object,
                    DeclKind::Struct => SpecialType::ValueType,
                    DeclKind::Enum => SpecialType::Enum,
                    _ => SpecialType::Void,
                };
                if implicit == SpecialType::Void {
                    None
                } else {
                    self.well_known(implicit).filter(|&b| b != ty)
                }
            }
        };

        let interfaces = spec.interfaces.iter().map(|i| self.resolve_text(i, &scope)).collect::<Result<Vec<_>, _>>()?;
        let known_types = spec.known_types.iter().map(|k| self.resolve_text(k, &scope)).collect::<Result<Vec<_>, _>>()?;

        let is_enum = spec.kind == DeclKind::Enum;
        let mut next_literal: i128 = 0;
        let mut members = Vec::with_capacity(spec.members.len());
        for member in &spec.members {
            let member_type = match &member.member_type {
                Some(text) => self.resolve_text(text, &scope)?,
                None if is_enum => ty,
                None => {
                    return Err(ModelError::InvalidDeclaration {
                        name: spec.name.clone(),
                        reason: format!("member '{}' has no type", member.name),
                    })
                }
            };
            let constant = if is_enum {
                let value = member.value.map(LiteralValue::widen).unwrap_or(next_literal);
                next_literal = value + 1;
                Some(value)
            } else {
                member.value.map(LiteralValue::widen)
            };
            // Enum literals are always static fields.
            let kind = if is_enum { MemberKind::Field } else { member.kind };
            let (getter, setter) = match kind {
                MemberKind::Property => (accessor(member.getter), accessor(member.setter)),
                _ => (None, None),
            };
            let is_public = match kind {
                MemberKind::Property => getter.map_or(false, |g| g.is_public),
                _ => member.public,
            };
            members.push(MemberInfo {
                name: member.name.clone(),
                kind,
                member_type,
                is_public,
                is_static: member.is_static || is_enum,
                getter,
                setter,
                is_indexer: member.indexer,
                data_member: member.data_member.clone(),
                enum_member: member.enum_member.clone(),
                ignore: member.ignore,
                non_serialized: member.non_serialized,
                optional_field: member.optional_field,
                constant,
                location: location(member.line),
            });
        }

        let mut methods = Vec::with_capacity(spec.methods.len());
        for method in &spec.methods {
            let parameters =
                method.parameters.iter().map(|p| self.resolve_text(p, &scope)).collect::<Result<Vec<_>, _>>()?;
            let return_type = match &method.returns {
                Some(text) => {
                    let expr = TypeExpr::parse(text)?;
                    if expr.is_void() {
                        None
                    } else {
                        Some(self.resolve(&expr, &scope)?)
                    }
                }
                None => None,
            };
            let explicit_interface = match &method.explicit_interface {
                Some(text) => Some(self.resolve_text(text, &scope)?),
                None => None,
            };
            methods.push(MethodInfo {
                name: method.name.clone(),
                parameters,
                return_type,
                is_public: method.public,
                is_static: method.is_static,
                is_virtual: method.is_virtual,
                explicit_interface,
                callbacks: method.callbacks.clone(),
                location: location(method.line),
            });
        }

        Ok(Body { declaring, base, interfaces, known_types, members, methods })
    }

    /// Declared definition a type instantiates, for inheritance walks.
    fn definition_of(&self, ty: TypeRef) -> Option<TypeRef> {
        match self.node(ty) {
            Node::Declared(_) => Some(ty),
            Node::Generic { definition, .. } => Some(definition),
            _ => None,
        }
    }

    fn check_cycles(&self) -> Result<(), ModelError> {
        let mut done: HashSet<TypeRef> = HashSet::new();
        for start in 0..self.decls.len() {
            let start = TypeRef(start as u32);
            if done.contains(&start) {
                continue;
            }
            let mut on_path = HashSet::new();
            self.visit_supertypes(start, &mut on_path, &mut done)?;
        }
        Ok(())
    }

    fn visit_supertypes(
        &self,
        ty: TypeRef,
        on_path: &mut HashSet<TypeRef>,
        done: &mut HashSet<TypeRef>,
    ) -> Result<(), ModelError> {
        if done.contains(&ty) {
            return Ok(());
        }
        let Some(decl) = self.decl(ty) else {
            return Ok(());
        };
        if !on_path.insert(ty) {
            return Err(ModelError::InheritanceCycle { name: decl.full_name.clone() });
        }
        for parent in decl.base.iter().chain(decl.interfaces.iter()) {
            if let Some(definition) = self.definition_of(*parent) {
                self.visit_supertypes(definition, on_path, done)?;
            }
        }
        on_path.remove(&ty);
        done.insert(ty);
        Ok(())
    }

    fn array_interfaces(&self, element: TypeRef, rank: u32) -> Vec<TypeRef> {
        let mut specials = Vec::with_capacity(6);
        if rank == 1 {
            for special in [SpecialType::IListGeneric, SpecialType::ICollectionGeneric, SpecialType::IEnumerableGeneric] {
                if let Some(interface) = self.well_known(special).and_then(|d| self.make_generic(d, &[element])) {
                    specials.push(interface);
                }
            }
        }
        for special in [SpecialType::IList, SpecialType::ICollection, SpecialType::IEnumerable] {
            if let Some(interface) = self.well_known(special) {
                specials.push(interface);
            }
        }
        specials
    }
}

fn push_unique(list: &mut Vec<TypeRef>, ty: TypeRef) {
    if !list.contains(&ty) {
        list.push(ty);
    }
}

impl TypeQuery for TypeModel {
    fn kind(&self, ty: TypeRef) -> TypeKind {
        match self.node(ty) {
            Node::Declared(decl) => decl.kind,
            Node::Array { rank, .. } => TypeKind::Array { rank },
            Node::Generic { definition, .. } => self.kind(definition),
            Node::Unknown => TypeKind::Class,
        }
    }

    fn name(&self, ty: TypeRef) -> String {
        match self.node(ty) {
            Node::Declared(decl) => decl.name.clone(),
            Node::Array { element, rank } => {
                format!("{}[{}]", self.name(element), ",".repeat(rank.saturating_sub(1) as usize))
            }
            Node::Generic { definition, .. } => self.name(definition),
            Node::Unknown => format!("<unknown {}>", ty),
        }
    }

    fn namespace(&self, ty: TypeRef) -> Option<String> {
        match self.node(ty) {
            Node::Declared(decl) => decl.namespace.clone(),
            Node::Array { element, .. } => self.namespace(element),
            Node::Generic { definition, .. } => self.namespace(definition),
            Node::Unknown => None,
        }
    }

    fn declaring_type(&self, ty: TypeRef) -> Option<TypeRef> {
        match self.node(ty) {
            Node::Declared(decl) => decl.declaring,
            Node::Generic { definition, .. } => self.declaring_type(definition),
            _ => None,
        }
    }

    fn special_type(&self, ty: TypeRef) -> Option<SpecialType> {
        self.decl(ty).and_then(|d| d.special)
    }

    fn well_known(&self, special: SpecialType) -> Option<TypeRef> {
        self.well_known.get(&special).copied()
    }

    fn generic_definition(&self, ty: TypeRef) -> Option<TypeRef> {
        match self.node(ty) {
            Node::Generic { definition, .. } => Some(definition),
            _ => None,
        }
    }

    fn generic_arguments(&self, ty: TypeRef) -> Vec<TypeRef> {
        match self.node(ty) {
            Node::Declared(decl) => decl.parameters.clone(),
            Node::Generic { arguments, .. } => arguments.to_vec(),
            _ => Vec::new(),
        }
    }

    fn make_generic(&self, definition: TypeRef, arguments: &[TypeRef]) -> Option<TypeRef> {
        let decl = self.decl(definition)?;
        if decl.parameters.is_empty() || decl.parameters.len() != arguments.len() {
            return None;
        }
        if decl.parameters.as_slice() == arguments {
            return Some(definition);
        }
        Some(self.interner.intern(TypeKey::Generic { definition, arguments: arguments.iter().copied().collect() }))
    }

    fn make_array(&self, element: TypeRef) -> Option<TypeRef> {
        Some(self.array_of(element, 1))
    }

    fn element_type(&self, ty: TypeRef) -> Option<TypeRef> {
        match self.node(ty) {
            Node::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    fn base_type(&self, ty: TypeRef) -> Option<TypeRef> {
        match self.node(ty) {
            Node::Declared(decl) => decl.base,
            Node::Array { .. } => self.well_known(SpecialType::Object),
            Node::Generic { definition, arguments } => {
                let base = self.base_type(definition)?;
                Some(self.with_substitution(definition, &arguments, |map| self.substitute(base, map)))
            }
            Node::Unknown => None,
        }
    }

    fn interfaces(&self, ty: TypeRef) -> Vec<TypeRef> {
        match self.node(ty) {
            Node::Declared(decl) => {
                let mut all = Vec::new();
                for &interface in &decl.interfaces {
                    push_unique(&mut all, interface);
                    for inherited in self.interfaces(interface) {
                        push_unique(&mut all, inherited);
                    }
                }
                if let Some(base) = decl.base {
                    for inherited in self.interfaces(base) {
                        push_unique(&mut all, inherited);
                    }
                }
                all
            }
            Node::Array { element, rank } => self.array_interfaces(element, rank),
            Node::Generic { definition, arguments } => {
                let open = self.interfaces(definition);
                self.with_substitution(definition, &arguments, |map| {
                    let mut all = Vec::with_capacity(open.len());
                    for interface in open {
                        push_unique(&mut all, self.substitute(interface, map));
                    }
                    all
                })
            }
            Node::Unknown => Vec::new(),
        }
    }

    fn visibility(&self, ty: TypeRef) -> Visibility {
        match self.node(ty) {
            Node::Declared(decl) => decl.visibility,
            Node::Array { element, .. } => self.visibility(element),
            Node::Generic { definition, .. } => self.visibility(definition),
            Node::Unknown => Visibility::Private,
        }
    }

    fn has_public_default_constructor(&self, ty: TypeRef) -> bool {
        match self.node(ty) {
            Node::Declared(decl) => match decl.kind {
                TypeKind::Struct | TypeKind::Enum => true,
                TypeKind::Class => decl.default_constructor,
                _ => false,
            },
            Node::Generic { definition, .. } => self.has_public_default_constructor(definition),
            _ => false,
        }
    }

    fn attributes(&self, ty: TypeRef) -> TypeAttributes {
        match self.node(ty) {
            Node::Declared(decl) => decl.attributes.clone(),
            Node::Generic { definition, arguments } => {
                let mut attributes = self.attributes(definition);
                self.with_substitution(definition, &arguments, |map| {
                    for known in &mut attributes.known_types {
                        *known = self.substitute(*known, map);
                    }
                });
                attributes
            }
            _ => TypeAttributes::default(),
        }
    }

    fn members(&self, ty: TypeRef) -> Vec<MemberInfo> {
        match self.node(ty) {
            Node::Declared(decl) => decl.members.clone(),
            Node::Generic { definition, arguments } => {
                let mut members = self.members(definition);
                self.with_substitution(definition, &arguments, |map| {
                    for member in &mut members {
                        member.member_type = self.substitute(member.member_type, map);
                    }
                });
                members
            }
            _ => Vec::new(),
        }
    }

    fn methods(&self, ty: TypeRef) -> Vec<MethodInfo> {
        match self.node(ty) {
            Node::Declared(decl) => decl.methods.clone(),
            Node::Generic { definition, arguments } => {
                let mut methods = self.methods(definition);
                self.with_substitution(definition, &arguments, |map| {
                    for method in &mut methods {
                        for parameter in &mut method.parameters {
                            *parameter = self.substitute(*parameter, map);
                        }
                        method.return_type = method.return_type.map(|r| self.substitute(r, map));
                        method.explicit_interface = method.explicit_interface.map(|i| self.substitute(i, map));
                    }
                });
                methods
            }
            _ => Vec::new(),
        }
    }

    fn enum_underlying_type(&self, ty: TypeRef) -> Option<IntegerType> {
        self.decl(ty).and_then(|d| d.underlying)
    }

    fn contract_namespaces(&self, ty: TypeRef) -> Vec<ContractNamespaceMapping> {
        match self.node(ty) {
            Node::Declared(decl) => {
                let mut mappings = self.assemblies.get(decl.assembly).cloned().unwrap_or_default();
                mappings.sort_by_key(|m| m.scope != MappingScope::Module);
                mappings
            }
            Node::Array { element, .. } => self.contract_namespaces(element),
            Node::Generic { definition, .. } => self.contract_namespaces(definition),
            Node::Unknown => Vec::new(),
        }
    }

    fn location(&self, ty: TypeRef) -> SourceLocation {
        match self.node(ty) {
            Node::Declared(decl) => decl.location.clone(),
            Node::Array { element, .. } => self.location(element),
            Node::Generic { definition, .. } => self.location(definition),
            Node::Unknown => SourceLocation::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capabilities::{display_name, implements, unwrap_nullable};

    const ZOO: &str = r#"{
        "assembly": "Zoo",
        "types": [
            { "name": "Zoo.Box`1", "generic_parameters": ["T"],
              "members": [ { "name": "Item", "type": "T" }, { "name": "Next", "type": "Zoo.Box`1[!0]" } ] },
            { "name": "Zoo.Animal", "members": [ { "name": "Name", "type": "string" } ] },
            { "name": "Zoo.Dog", "base": "Zoo.Animal" },
            { "name": "Zoo.Outer+Inner" },
            { "name": "Zoo.Outer" },
            { "name": "Zoo.Color", "kind": "enum", "members": [ { "name": "Red" }, { "name": "Green", "value": 5 }, { "name": "Blue" } ] }
        ]
    }"#;

    fn zoo() -> TypeModel {
        TypeModel::from_json(ZOO).unwrap()
    }

    #[test]
    fn test_lookup_and_names() {
        let model = zoo();
        let inner = model.lookup("Zoo.Outer+Inner").unwrap();
        assert_eq!(model.name(inner), "Inner");
        assert_eq!(model.namespace(inner), None);
        assert_eq!(model.declaring_type(inner), model.lookup("Zoo.Outer"));
        assert_eq!(display_name(&model, inner), "Zoo.Outer+Inner");
    }

    #[test]
    fn test_generic_instantiation_is_interned() {
        let model = zoo();
        let a = model.parse_type("Zoo.Box`1[int]").unwrap();
        let b = model.parse_type("Zoo.Box`1[System.Int32]").unwrap();
        assert_eq!(a, b);
        assert_eq!(display_name(&model, a), "Zoo.Box`1[System.Int32]");
    }

    #[test]
    fn test_members_are_substituted() {
        let model = zoo();
        let boxed = model.parse_type("Zoo.Box`1[string]").unwrap();
        let members = model.members(boxed);
        assert_eq!(members[0].member_type, model.lookup("System.String").unwrap());
        assert_eq!(members[1].member_type, boxed);
    }

    #[test]
    fn test_list_interfaces_and_methods() {
        let model = zoo();
        let list = model.parse_type("System.Collections.Generic.List`1[int]").unwrap();
        assert!(implements(&model, list, SpecialType::IListGeneric));
        assert!(implements(&model, list, SpecialType::IEnumerable));
        let add = model.methods(list).into_iter().find(|m| m.name == "Add").unwrap();
        assert_eq!(add.parameters, vec![model.lookup("System.Int32").unwrap()]);
    }

    #[test]
    fn test_arrays_and_nullable() {
        let model = zoo();
        let array = model.parse_type("string[]").unwrap();
        assert_eq!(model.kind(array), TypeKind::Array { rank: 1 });
        assert!(implements(&model, array, SpecialType::IEnumerableGeneric));
        let nullable = model.parse_type("int?").unwrap();
        assert_eq!(unwrap_nullable(&model, nullable), model.lookup("System.Int32").unwrap());
    }

    #[test]
    fn test_enum_literals_autoincrement() {
        let model = zoo();
        let color = model.lookup("Zoo.Color").unwrap();
        let values: Vec<_> = model.members(color).iter().map(|m| m.constant.unwrap()).collect();
        assert_eq!(values, vec![0, 5, 6]);
        assert_eq!(model.enum_underlying_type(color), Some(IntegerType::Int32));
    }

    #[test]
    fn test_roots_skip_definitions() {
        let model = zoo();
        let names: Vec<_> = model.roots().into_iter().map(|t| display_name(&model, t)).collect();
        assert_eq!(names, vec!["Zoo.Animal", "Zoo.Color", "Zoo.Dog", "Zoo.Outer", "Zoo.Outer+Inner"]);
    }

    #[test]
    fn test_load_errors() {
        let unknown = TypeModel::from_json(r#"{"types":[{"name":"A","base":"Missing"}]}"#);
        assert!(matches!(unknown, Err(ModelError::UnknownType { .. })));
        let duplicate = TypeModel::from_json(r#"{"types":[{"name":"A"},{"name":"A"}]}"#);
        assert!(matches!(duplicate, Err(ModelError::DuplicateType { .. })));
        let cycle = TypeModel::from_json(r#"{"types":[{"name":"A","base":"B"},{"name":"B","base":"A"}]}"#);
        assert!(matches!(cycle, Err(ModelError::InheritanceCycle { .. })));
        let arity = TypeModel::from_json(r#"{"types":[{"name":"A","base":"System.Collections.Generic.List`1[int,int]"}]}"#);
        assert!(matches!(arity, Err(ModelError::ArityMismatch { .. })));
    }
}
