use crate::policy::{
    error::{MissingMetadata, PolicyError},
    references::{TypeInstanceRef, rule_type_instance_refs, type_instance_refs},
    types::{Policy, Rule},
};

impl Policy {
    pub fn are_type_instances_metadata_resolved(&self) -> bool {
        type_instance_refs(self)
            .iter()
            .all(TypeInstanceRef::is_resolved)
    }

    /// Fails with [`PolicyError::MissingMetadata`] listing every TypeInstance
    /// reference without a complete Type reference.
    pub fn validate_type_instances_metadata(&self) -> Result<(), PolicyError> {
        validate_refs(type_instance_refs(self))
    }
}

impl Rule {
    pub fn validate_type_instance_metadata(&self) -> Result<(), PolicyError> {
        validate_refs(rule_type_instance_refs(self))
    }
}

fn validate_refs(refs: Vec<TypeInstanceRef<'_>>) -> Result<(), PolicyError> {
    let items: Vec<_> = refs
        .iter()
        .filter(|reference| !reference.is_resolved())
        .map(|reference| reference.info.to_unresolved())
        .collect();

    if items.is_empty() {
        return Ok(());
    }
    Err(PolicyError::MissingMetadata(MissingMetadata { items }))
}
