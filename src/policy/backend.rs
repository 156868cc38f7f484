use std::collections::HashMap;

use crate::{
    policy::types::{Policy, RulesForTypeInstance, TypeInstanceBackend},
    types::{ManifestRef, OCF_PATH_PREFIX, TypeRef, trim_last_node_from_ocf_path},
};

/// Upper bound of path-trimming steps when matching a TypeRef against
/// wildcard patterns.
pub const MAX_BACKEND_LOOKUP_FOR_TYPE_REF: usize = 30;

/// Knows which storage backend should hold a TypeInstance, either by its
/// TypeRef or by an alias name.
///
/// Built once per resolution session and read-only afterwards, so shared
/// lookups from several tasks are safe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeInstanceBackendCollection {
    by_type_ref: HashMap<String, TypeInstanceBackend>,
    by_alias: HashMap<String, TypeInstanceBackend>,
    default: Option<TypeInstanceBackend>,
}

impl TypeInstanceBackendCollection {
    pub fn build(
        rules: &[RulesForTypeInstance],
        aliases: impl IntoIterator<Item = (String, TypeInstanceBackend)>,
    ) -> Self {
        let mut collection = Self::default();
        for rule in rules {
            collection.set_by_type_ref(&rule.type_ref, rule.backend.clone());
        }
        for (alias, backend) in aliases {
            collection.set_by_alias(alias, backend);
        }

        tracing::debug!(
            target: "policy.backend",
            type_ref_rules = collection.by_type_ref.len(),
            aliases = collection.by_alias.len(),
            "backend_collection_built"
        );
        collection
    }

    pub fn from_policy(
        policy: &Policy,
        aliases: impl IntoIterator<Item = (String, TypeInstanceBackend)>,
    ) -> Self {
        Self::build(&policy.type_instance.rules, aliases)
    }

    /// Associates a TypeRef, possibly ending with a `*` node, with a backend.
    pub fn set_by_type_ref(&mut self, type_ref: &ManifestRef, backend: TypeInstanceBackend) {
        self.by_type_ref.insert(key(type_ref), backend);
    }

    /// Returns the backend for a TypeRef.
    ///
    /// The explicit TypeRef is tried first. Then, for
    /// `cap.type.capactio.examples.message:0.1.0`, the patterns are checked in
    /// this order:
    ///   - cap.type.capactio.examples.*:0.1.0
    ///   - cap.type.capactio.examples.*
    ///   - cap.type.capactio.*:0.1.0
    ///   - cap.type.capactio.*
    ///   - cap.type.*:0.1.0
    ///   - cap.type.*
    ///   - cap.*:0.1.0
    ///   - cap.*
    ///
    /// `None` means the caller should fall back to the default backend.
    pub fn get_by_type_ref(&self, type_ref: &TypeRef) -> Option<&TypeInstanceBackend> {
        let explicit = ManifestRef::from(type_ref.clone());
        if let Some(backend) = self.by_type_ref.get(&key(&explicit)) {
            return Some(backend);
        }

        let revision = explicit.revision();
        let mut sub_path = type_ref.path.as_str();
        for _ in 0..MAX_BACKEND_LOOKUP_FOR_TYPE_REF {
            if format!("{sub_path}.") == OCF_PATH_PREFIX {
                break;
            }
            let Some(trimmed) = trim_last_node_from_ocf_path(sub_path) else {
                break;
            };
            sub_path = trimmed;

            if let Some(revision) = revision
                && let Some(backend) = self.by_type_ref.get(&format!("{sub_path}.*:{revision}"))
            {
                return Some(backend);
            }
            if let Some(backend) = self.by_type_ref.get(&format!("{sub_path}.*")) {
                return Some(backend);
            }
        }

        None
    }

    pub fn set_by_alias(&mut self, name: impl Into<String>, backend: TypeInstanceBackend) {
        self.by_alias.insert(name.into(), backend);
    }

    pub fn get_by_alias(&self, name: &str) -> Option<&TypeInstanceBackend> {
        self.by_alias.get(name)
    }

    pub fn set_default(&mut self, backend: TypeInstanceBackend) {
        self.default = Some(backend);
    }

    pub fn default_backend(&self) -> Option<&TypeInstanceBackend> {
        self.default.as_ref()
    }

    /// Backend for a TypeRef, falling back to the default one.
    pub fn get_by_type_ref_or_default(&self, type_ref: &TypeRef) -> Option<&TypeInstanceBackend> {
        self.get_by_type_ref(type_ref).or(self.default.as_ref())
    }

    /// All registered backends keyed by alias and by TypeRef key. TypeRef
    /// entries win on key collisions.
    pub fn get_all(&self) -> HashMap<String, TypeInstanceBackend> {
        self.by_alias
            .iter()
            .chain(self.by_type_ref.iter())
            .map(|(key, backend)| (key.clone(), backend.clone()))
            .collect()
    }
}

fn key(type_ref: &ManifestRef) -> String {
    match type_ref.revision() {
        Some(revision) => format!("{}:{}", type_ref.path, revision),
        None => type_ref.path.clone(),
    }
}
