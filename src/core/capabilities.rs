//! Derived capability questions built on top of [`TypeQuery`]

use crate::core::types::{MethodInfo, SpecialType, TypeKind, TypeQuery, TypeRef, Visibility};

pub fn is_value_type(query: &dyn TypeQuery, ty: TypeRef) -> bool {
    query.kind(ty).is_value_type()
}

pub fn is_interface(query: &dyn TypeQuery, ty: TypeRef) -> bool {
    query.kind(ty) == TypeKind::Interface
}

/// Special identity of a type or of its generic definition.
pub fn special_of(query: &dyn TypeQuery, ty: TypeRef) -> Option<SpecialType> {
    query
        .special_type(ty)
        .or_else(|| query.generic_definition(ty).and_then(|def| query.special_type(def)))
}

pub fn is_special(query: &dyn TypeQuery, ty: TypeRef, special: SpecialType) -> bool {
    special_of(query, ty) == Some(special)
}

pub fn is_nullable(query: &dyn TypeQuery, ty: TypeRef) -> bool {
    query.generic_definition(ty).is_some() && is_special(query, ty, SpecialType::Nullable)
}

/// Strip every `Nullable<>` wrapper.
pub fn unwrap_nullable(query: &dyn TypeQuery, mut ty: TypeRef) -> TypeRef {
    while is_nullable(query, ty) {
        match query.generic_arguments(ty).first() {
            Some(&inner) => ty = inner,
            None => break,
        }
    }
    ty
}

/// Strip redundant wrappers, keeping the innermost `Nullable<T>`.
pub fn unwrap_redundant_nullable(query: &dyn TypeQuery, mut ty: TypeRef) -> TypeRef {
    let mut nullable = ty;
    while is_nullable(query, ty) {
        nullable = ty;
        match query.generic_arguments(ty).first() {
            Some(&inner) => ty = inner,
            None => break,
        }
    }
    nullable
}

/// Whether a value of this type may be absent on the wire.
pub fn accepts_null(query: &dyn TypeQuery, ty: TypeRef) -> bool {
    !is_value_type(query, ty) || is_nullable(query, ty)
}

pub fn implements(query: &dyn TypeQuery, ty: TypeRef, special: SpecialType) -> bool {
    is_special(query, ty, special)
        || query.interfaces(ty).into_iter().any(|iface| is_special(query, iface, special))
}

pub fn implements_type(query: &dyn TypeQuery, ty: TypeRef, interface: TypeRef) -> bool {
    ty == interface || query.interfaces(ty).contains(&interface)
}

/// Public all the way up the containing-type chain and across generic arguments.
pub fn is_visible(query: &dyn TypeQuery, ty: TypeRef) -> bool {
    if let TypeKind::GenericParameter { .. } = query.kind(ty) {
        return true;
    }
    if let Some(element) = query.element_type(ty) {
        return is_visible(query, element);
    }
    if query.generic_definition(ty).is_some()
        && !query.generic_arguments(ty).into_iter().all(|arg| is_visible(query, arg))
    {
        return false;
    }
    let mut current = Some(ty);
    while let Some(t) = current {
        if query.visibility(t) != Visibility::Public {
            return false;
        }
        current = query.declaring_type(t);
    }
    true
}

/// Base type unless it is one of the implicit roots.
pub fn effective_base(query: &dyn TypeQuery, ty: TypeRef) -> Option<TypeRef> {
    let base = query.base_type(ty)?;
    match special_of(query, base) {
        Some(SpecialType::Object | SpecialType::ValueType | SpecialType::Enum | SpecialType::Uri) => None,
        _ => Some(base),
    }
}

/// Containing types from the outermost down, ending with `ty` itself.
pub fn nesting_chain(query: &dyn TypeQuery, ty: TypeRef) -> Vec<TypeRef> {
    let mut chain = vec![ty];
    let mut current = query.declaring_type(ty);
    while let Some(outer) = current {
        chain.push(outer);
        current = query.declaring_type(outer);
    }
    chain.reverse();
    chain
}

/// Fully qualified display name, e.g. ``Zoo.Pen`1[Zoo.Animal]``.
pub fn display_name(query: &dyn TypeQuery, ty: TypeRef) -> String {
    match query.kind(ty) {
        TypeKind::Array { rank } => {
            let element = query
                .element_type(ty)
                .map(|e| display_name(query, e))
                .unwrap_or_else(|| "?".to_string());
            let commas = ",".repeat(rank.saturating_sub(1) as usize);
            return format!("{}[{}]", element, commas);
        }
        TypeKind::GenericParameter { .. } => return query.name(ty),
        _ => {}
    }

    if let Some(definition) = query.generic_definition(ty) {
        let arguments: Vec<String> = query
            .generic_arguments(ty)
            .into_iter()
            .map(|arg| display_name(query, arg))
            .collect();
        return format!("{}[{}]", display_name(query, definition), arguments.join(","));
    }

    let chain = nesting_chain(query, ty);
    let nested: Vec<String> = chain.iter().map(|&t| query.name(t)).collect();
    match query.namespace(chain[0]) {
        Some(ns) if !ns.is_empty() => format!("{}.{}", ns, nested.join("+")),
        _ => nested.join("+"),
    }
}

/// Public instance method with exactly these parameters, searching base types too.
pub fn find_public_method(
    query: &dyn TypeQuery,
    ty: TypeRef,
    name: &str,
    parameters: &[TypeRef],
) -> Option<(TypeRef, MethodInfo)> {
    let mut current = Some(ty);
    while let Some(t) = current {
        let found = query.methods(t).into_iter().find(|m| {
            m.is_public
                && !m.is_static
                && m.explicit_interface.is_none()
                && m.name == name
                && m.parameters == parameters
        });
        if let Some(method) = found {
            return Some((t, method));
        }
        current = query.base_type(t);
    }
    None
}

/// Method explicitly implementing `interface.name`, searching base types too.
pub fn find_explicit_implementation(
    query: &dyn TypeQuery,
    ty: TypeRef,
    interface: TypeRef,
    name: &str,
) -> Option<(TypeRef, MethodInfo)> {
    let mut current = Some(ty);
    while let Some(t) = current {
        let found = query
            .methods(t)
            .into_iter()
            .find(|m| m.explicit_interface == Some(interface) && m.name == name);
        if let Some(method) = found {
            return Some((t, method));
        }
        current = query.base_type(t);
    }
    None
}
