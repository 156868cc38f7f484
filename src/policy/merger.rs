//! Combines Global, Action and Workflow step policies into one effective
//! Policy.
//!
//! Layers are applied in the given order; a layer applied earlier has higher
//! priority. Later layers only contribute what earlier ones do not define.

use serde::{Deserialize, Serialize};

use crate::{
    merge::merge,
    policy::{
        error::PolicyError,
        types::{
            AdditionalParametersToInject, AdditionalTypeInstanceToInject, CURRENT_API_VERSION,
            InjectData, Policy, RequiredTypeInstanceToInject, Rule, RulesForInterface,
        },
        workflow::WorkflowPolicy,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyLayer {
    Global,
    Action,
    Workflow,
}

pub fn default_merge_order() -> Vec<PolicyLayer> {
    vec![PolicyLayer::Action, PolicyLayer::Global, PolicyLayer::Workflow]
}

#[derive(Debug, Clone, Default)]
pub struct PolicyLayers {
    pub global: Option<Policy>,
    pub action: Option<Policy>,
    /// Step policies with their Interface aliases already resolved.
    pub workflow_steps: Vec<WorkflowPolicy>,
}

/// Fails only when a Workflow step still references an unresolved Interface
/// alias.
pub fn merge_policies(
    order: &[PolicyLayer],
    layers: &PolicyLayers,
) -> Result<Policy, PolicyError> {
    let mut merged = Policy::default();
    for layer in order {
        match layer {
            PolicyLayer::Global => {
                if let Some(policy) = &layers.global {
                    apply_policy(&mut merged, policy);
                }
            }
            PolicyLayer::Action => {
                if let Some(policy) = &layers.action {
                    apply_policy(&mut merged, policy);
                }
            }
            PolicyLayer::Workflow => {
                for step in &layers.workflow_steps {
                    apply_policy(&mut merged, &step.to_policy()?);
                }
            }
        }
    }

    if merged.api_version.is_empty() {
        merged.api_version = CURRENT_API_VERSION.to_string();
    }
    Ok(merged)
}

/// Applies `lower` below `current`: existing entries of `current` win.
pub fn apply_policy(current: &mut Policy, lower: &Policy) {
    if current.api_version.is_empty() {
        current.api_version = lower.api_version.clone();
    }
    if current.interface.default.is_none() {
        current.interface.default = lower.interface.default.clone();
    }

    for lower_rules in &lower.interface.rules {
        match current
            .interface
            .rules
            .iter_mut()
            .find(|rules| is_for_same_interface(rules, lower_rules))
        {
            Some(rules) => merge_alternatives(&mut rules.one_of, &lower_rules.one_of),
            None => current.interface.rules.push(lower_rules.clone()),
        }
    }

    for lower_rule in &lower.type_instance.rules {
        let exists = current
            .type_instance
            .rules
            .iter()
            .any(|rule| rule.type_ref == lower_rule.type_ref);
        if !exists {
            current.type_instance.rules.push(lower_rule.clone());
        }
    }
}

fn merge_alternatives(current: &mut Vec<Rule>, lower: &[Rule]) {
    for lower_rule in lower {
        let Some(rule) = current.iter_mut().find(|rule| is_same_alternative(rule, lower_rule))
        else {
            current.push(lower_rule.clone());
            continue;
        };

        if let Some(lower_inject) = &lower_rule.inject {
            let inject = rule.inject.get_or_insert_with(InjectData::default);
            merge_inject(inject, lower_inject);
        }
    }
}

fn merge_inject(current: &mut InjectData, lower: &InjectData) {
    merge_keyed(
        &mut current.required_type_instances,
        &lower.required_type_instances,
        required_type_instance_key,
    );
    merge_keyed(
        &mut current.additional_type_instances,
        &lower.additional_type_instances,
        |ti: &AdditionalTypeInstanceToInject| ti.name.clone(),
    );

    for lower_param in &lower.additional_parameters {
        match current
            .additional_parameters
            .iter_mut()
            .find(|param| param.name == lower_param.name)
        {
            Some(param) => param.value = merge(&lower_param.value, &param.value),
            None => current.additional_parameters.push(AdditionalParametersToInject {
                name: lower_param.name.clone(),
                value: lower_param.value.clone(),
            }),
        }
    }
}

fn merge_keyed<T: Clone>(current: &mut Vec<T>, lower: &[T], key: impl Fn(&T) -> String) {
    for item in lower {
        let item_key = key(item);
        if !current.iter().any(|existing| key(existing) == item_key) {
            current.push(item.clone());
        }
    }
}

fn required_type_instance_key(ti: &RequiredTypeInstanceToInject) -> String {
    match &ti.type_ref {
        Some(type_ref) if type_ref.is_resolved() => type_ref.to_string(),
        _ => ti.id.clone(),
    }
}

fn is_for_same_interface(a: &RulesForInterface, b: &RulesForInterface) -> bool {
    a.interface.path == b.interface.path && a.interface.revision() == b.interface.revision()
}

// Alternatives are matched on the explicit Implementation path only; pathless
// alternatives never match each other.
fn is_same_alternative(a: &Rule, b: &Rule) -> bool {
    match (
        &a.implementation_constraints.path,
        &b.implementation_constraints.path,
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
