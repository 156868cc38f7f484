//! Policy attached to a single Workflow step.
//!
//! A step policy is narrower than a [`Policy`]: it only holds Interface rules,
//! its injection is limited to additional parameters, and its Interface may be
//! referenced through an alias of the enclosing Implementation's imports.

use serde::{Deserialize, Serialize};

use crate::{
    policy::{
        error::{PolicyError, unresolved_import},
        types::{
            AdditionalParametersToInject, ImplementationConstraints, InjectData, InterfacePolicy,
            Policy, Rule, RulesForInterface,
        },
    },
    types::ManifestRef,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPolicy {
    #[serde(default)]
    pub interface: WorkflowInterfacePolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInterfacePolicy {
    #[serde(default)]
    pub rules: Vec<WorkflowRulesForInterface>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRulesForInterface {
    pub interface: WorkflowInterfaceRef,
    #[serde(default)]
    pub one_of: Vec<WorkflowRule>,
}

/// Interface given either as a full manifest reference or as
/// `<import_alias>.<method_name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowInterfaceRef {
    ManifestRef(ManifestRef),
    Alias(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRule {
    #[serde(default, skip_serializing_if = "ImplementationConstraints::is_empty")]
    pub implementation_constraints: ImplementationConstraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject: Option<WorkflowInjectData>,
}

/// Step policies cannot inject TypeInstances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkflowInjectData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_parameters: Vec<AdditionalParametersToInject>,
}

/// Interface group imported by an Implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationImport {
    pub interface_group_path: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub methods: Vec<ImplementationImportMethod>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationImportMethod {
    pub name: String,
    #[serde(default)]
    pub revision: Option<String>,
}

impl WorkflowPolicy {
    pub fn from_yaml_str(raw: &str) -> Result<Self, PolicyError> {
        serde_yaml::from_str(raw).map_err(PolicyError::Parse)
    }

    pub fn to_yaml_string(&self) -> Result<String, PolicyError> {
        serde_yaml::to_string(self).map_err(PolicyError::Serialize)
    }

    /// Replaces every aliased Interface reference with the manifest reference
    /// it points to. Empty aliases are left untouched.
    pub fn resolve_imports(&mut self, imports: &[ImplementationImport]) -> Result<(), PolicyError> {
        for rules in &mut self.interface.rules {
            let WorkflowInterfaceRef::Alias(alias) = &rules.interface else {
                continue;
            };
            if alias.is_empty() {
                continue;
            }
            let manifest = resolve_action_ref(imports, alias)?;
            rules.interface = WorkflowInterfaceRef::ManifestRef(manifest);
        }
        Ok(())
    }

    /// Converts into a generic [`Policy`]. Aliases must be resolved first.
    pub fn to_policy(&self) -> Result<Policy, PolicyError> {
        let rules = self
            .interface
            .rules
            .iter()
            .map(|rules| {
                let interface = match &rules.interface {
                    WorkflowInterfaceRef::ManifestRef(manifest) => manifest.clone(),
                    WorkflowInterfaceRef::Alias(alias) => {
                        return Err(unresolved_import(format!(
                            "Interface alias {alias:?} is not resolved against Implementation imports"
                        )));
                    }
                };
                Ok(RulesForInterface {
                    interface,
                    one_of: rules.one_of.iter().map(WorkflowRule::to_rule).collect(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Policy {
            api_version: String::new(),
            interface: InterfacePolicy {
                default: None,
                rules,
            },
            type_instance: Default::default(),
        })
    }
}

impl WorkflowRule {
    fn to_rule(&self) -> Rule {
        Rule {
            implementation_constraints: self.implementation_constraints.clone(),
            inject: self.inject.as_ref().map(|inject| InjectData {
                additional_parameters: inject.additional_parameters.clone(),
                ..InjectData::default()
            }),
        }
    }
}

/// Resolves `<import_alias>.<method_name>` to the full Interface reference.
/// With duplicated aliases the first matching import wins.
pub fn resolve_action_ref(
    imports: &[ImplementationImport],
    action_ref: &str,
) -> Result<ManifestRef, PolicyError> {
    let Some((alias, name)) = action_ref.split_once('.') else {
        return Err(unresolved_import(format!(
            "Action reference {action_ref:?} doesn't follow pattern <import_alias>.<method_name>"
        )));
    };

    imports
        .iter()
        .filter(|import| import.alias.as_deref() == Some(alias))
        .find_map(|import| {
            import
                .methods
                .iter()
                .find(|method| method.name == name)
                .map(|method| ManifestRef {
                    path: format!("{}.{}", import.interface_group_path, name),
                    revision: method.revision.clone().filter(|revision| !revision.is_empty()),
                })
        })
        .ok_or_else(|| {
            unresolved_import(format!(
                "full path not found in Implementation imports for action {action_ref:?}"
            ))
        })
}
