//! Single traversal over every TypeInstance reference a Policy can hold.
//!
//! The same walk backs metadata validation (shared borrows) and metadata
//! resolution (mutable handles), so each shape of the document is visited in
//! one place only.

use crate::{
    policy::{
        error::{TypeInstanceKind, UnresolvedTypeInstance},
        types::{Policy, Rule},
    },
    types::TypeRef,
};

/// Identity of a TypeInstance reference, detached from the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInstanceRefInfo {
    pub kind: TypeInstanceKind,
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl TypeInstanceRefInfo {
    pub fn to_unresolved(&self) -> UnresolvedTypeInstance {
        UnresolvedTypeInstance {
            kind: self.kind,
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Debug)]
pub struct TypeInstanceRef<'a> {
    pub info: TypeInstanceRefInfo,
    pub type_ref: Option<&'a TypeRef>,
}

impl TypeInstanceRef<'_> {
    pub fn is_resolved(&self) -> bool {
        self.type_ref.is_some_and(TypeRef::is_resolved)
    }
}

/// Handle that can fill in the Type reference of one document entry.
#[derive(Debug)]
pub struct TypeInstanceRefMut<'a> {
    pub info: TypeInstanceRefInfo,
    type_ref: &'a mut Option<TypeRef>,
}

impl TypeInstanceRefMut<'_> {
    pub fn is_resolved(&self) -> bool {
        self.type_ref.as_ref().is_some_and(TypeRef::is_resolved)
    }

    pub fn type_ref(&self) -> Option<&TypeRef> {
        self.type_ref.as_ref()
    }

    pub fn set(&mut self, type_ref: TypeRef) {
        *self.type_ref = Some(type_ref);
    }
}

fn required_info(id: &str, description: &Option<String>) -> TypeInstanceRefInfo {
    TypeInstanceRefInfo {
        kind: TypeInstanceKind::RequiredTypeInstance,
        id: id.to_string(),
        name: None,
        description: description.clone(),
    }
}

fn additional_info(id: &str, name: &str) -> TypeInstanceRefInfo {
    TypeInstanceRefInfo {
        kind: TypeInstanceKind::AdditionalTypeInstance,
        id: id.to_string(),
        name: Some(name.to_string()),
        description: None,
    }
}

fn backend_info(id: &str, description: &Option<String>) -> TypeInstanceRefInfo {
    TypeInstanceRefInfo {
        kind: TypeInstanceKind::BackendTypeInstance,
        id: id.to_string(),
        name: None,
        description: description.clone(),
    }
}

// `$iter`/`$opt` pick `iter`/`as_ref` or `iter_mut`/`as_mut`; `$mut` is the
// optional `mut` token for the pushed reference.
macro_rules! push_rule_refs {
    ($out:ident, $rule:expr, $iter:ident, $opt:ident $(, $mut:tt)?) => {
        if let Some(inject) = $rule.inject.$opt() {
            for ti in inject.required_type_instances.$iter() {
                $out.push((required_info(&ti.id, &ti.description), & $($mut)? ti.type_ref));
            }
            for ti in inject.additional_type_instances.$iter() {
                $out.push((additional_info(&ti.id, &ti.name), & $($mut)? ti.type_ref));
            }
        }
    };
}

macro_rules! push_policy_refs {
    ($out:ident, $policy:expr, $iter:ident, $opt:ident $(, $mut:tt)?) => {
        if let Some(inject) = $policy
            .interface
            .default
            .$opt()
            .and_then(|default| default.inject.$opt())
        {
            for ti in inject.required_type_instances.$iter() {
                $out.push((required_info(&ti.id, &ti.description), & $($mut)? ti.type_ref));
            }
        }
        for rules in $policy.interface.rules.$iter() {
            for rule in rules.one_of.$iter() {
                push_rule_refs!($out, rule, $iter, $opt $(, $mut)?);
            }
        }
        for rule in $policy.type_instance.rules.$iter() {
            let backend = & $($mut)? rule.backend;
            $out.push((backend_info(&backend.id, &backend.description), & $($mut)? backend.type_ref));
        }
    };
}

/// All TypeInstance references of a Policy, in document order.
pub fn type_instance_refs(policy: &Policy) -> Vec<TypeInstanceRef<'_>> {
    let mut out = Vec::new();
    push_policy_refs!(out, policy, iter, as_ref);
    out.into_iter()
        .map(|(info, type_ref)| TypeInstanceRef {
            info,
            type_ref: type_ref.as_ref(),
        })
        .collect()
}

/// Mutable handles for all TypeInstance references of a Policy, in document
/// order.
pub fn type_instance_refs_mut(policy: &mut Policy) -> Vec<TypeInstanceRefMut<'_>> {
    let mut out = Vec::new();
    push_policy_refs!(out, policy, iter_mut, as_mut, mut);
    out.into_iter()
        .map(|(info, type_ref)| TypeInstanceRefMut { info, type_ref })
        .collect()
}

pub fn rule_type_instance_refs(rule: &Rule) -> Vec<TypeInstanceRef<'_>> {
    let mut out = Vec::new();
    push_rule_refs!(out, rule, iter, as_ref);
    out.into_iter()
        .map(|(info, type_ref)| TypeInstanceRef {
            info,
            type_ref: type_ref.as_ref(),
        })
        .collect()
}
