use capact_policy::{
    policy::{
        AdditionalParametersToInject, DefaultInject, ImplementationConstraints, InjectData,
        InterfaceDefault, InterfacePolicy, Policy, PolicyError, PolicyLayer, PolicyLayers, Rule,
        RulesForInterface, RulesForTypeInstance, TypeInstanceBackend, TypeInstancePolicy,
        WorkflowInjectData, WorkflowInterfacePolicy, WorkflowInterfaceRef, WorkflowPolicy,
        WorkflowRule, WorkflowRulesForInterface, default_merge_order, merge_policies,
        merger::apply_policy,
    },
    types::{ManifestRef, TypeRef},
};
use serde_json::{Value, json};

use crate::{additional, required};

const POSTGRES_INTERFACE: &str = "cap.interface.database.postgresql.install";
const BITNAMI_IMPLEMENTATION: &str = "cap.implementation.bitnami.postgresql.install";

fn params(name: &str, value: Value) -> AdditionalParametersToInject {
    let Value::Object(value) = value else {
        panic!("additional parameters must be an object");
    };
    AdditionalParametersToInject {
        name: name.to_string(),
        value,
    }
}

fn policy_with_rule(inject: InjectData) -> Policy {
    Policy {
        api_version: "0.2.0".to_string(),
        interface: InterfacePolicy {
            default: None,
            rules: vec![RulesForInterface {
                interface: ManifestRef::new(POSTGRES_INTERFACE),
                one_of: vec![Rule {
                    implementation_constraints: ImplementationConstraints {
                        path: Some(BITNAMI_IMPLEMENTATION.to_string()),
                        ..ImplementationConstraints::default()
                    },
                    inject: Some(inject),
                }],
            }],
        },
        type_instance: TypeInstancePolicy::default(),
    }
}

fn backend_rule(path: &str, backend_id: &str) -> RulesForTypeInstance {
    RulesForTypeInstance {
        type_ref: ManifestRef::new(path),
        backend: TypeInstanceBackend::new(backend_id),
    }
}

fn merged_inject(policy: &Policy) -> &InjectData {
    policy.interface.rules[0].one_of[0]
        .inject
        .as_ref()
        .expect("merged rule should inject")
}

#[test]
fn given_no_layers_when_merged_then_empty_policy_with_current_version_is_returned() {
    let merged = merge_policies(&default_merge_order(), &PolicyLayers::default())
        .expect("empty layers should merge");

    assert_eq!(merged.api_version, "0.2.0");
    assert!(merged.interface.rules.is_empty());
    assert!(merged.type_instance.rules.is_empty());
}

#[test]
fn given_default_order_then_action_precedes_global_and_workflow() {
    assert_eq!(
        default_merge_order(),
        vec![PolicyLayer::Action, PolicyLayer::Global, PolicyLayer::Workflow]
    );
}

#[test]
fn given_same_parameters_in_two_layers_when_merged_then_higher_priority_values_win() {
    let action = policy_with_rule(InjectData {
        additional_parameters: vec![params(
            "additional-parameters",
            json!({"replicas": 3, "backup": {"enabled": true}}),
        )],
        ..InjectData::default()
    });
    let global = policy_with_rule(InjectData {
        additional_parameters: vec![params(
            "additional-parameters",
            json!({"replicas": 1, "backup": {"schedule": "daily"}, "region": "eu"}),
        )],
        ..InjectData::default()
    });

    let merged = merge_policies(
        &default_merge_order(),
        &PolicyLayers {
            global: Some(global),
            action: Some(action),
            workflow_steps: Vec::new(),
        },
    )
    .expect("policies should merge");

    let inject = merged_inject(&merged);
    assert_eq!(inject.additional_parameters.len(), 1);
    assert_eq!(
        Value::Object(inject.additional_parameters[0].value.clone()),
        json!({
            "replicas": 3,
            "backup": {"enabled": true, "schedule": "daily"},
            "region": "eu"
        })
    );
}

#[test]
fn given_type_instances_in_two_layers_when_merged_then_duplicates_are_dropped() {
    let gcp_sa = TypeRef::new("cap.type.gcp.auth.service-account", "0.1.0");
    let action = policy_with_rule(InjectData {
        required_type_instances: vec![required("action-sa", None, Some(gcp_sa.clone()))],
        additional_type_instances: vec![additional("config", "action-config", None)],
        ..InjectData::default()
    });
    let global = policy_with_rule(InjectData {
        required_type_instances: vec![
            required("global-sa", None, Some(gcp_sa)),
            required("global-extra", None, None),
        ],
        additional_type_instances: vec![
            additional("config", "global-config", None),
            additional("extra", "global-extra-config", None),
        ],
        ..InjectData::default()
    });

    let merged = merge_policies(
        &default_merge_order(),
        &PolicyLayers {
            global: Some(global),
            action: Some(action),
            workflow_steps: Vec::new(),
        },
    )
    .expect("policies should merge");

    let inject = merged_inject(&merged);
    let required_ids: Vec<_> = inject
        .required_type_instances
        .iter()
        .map(|ti| ti.id.as_str())
        .collect();
    assert_eq!(required_ids, vec!["action-sa", "global-extra"]);

    let additional_ids: Vec<_> = inject
        .additional_type_instances
        .iter()
        .map(|ti| ti.id.as_str())
        .collect();
    assert_eq!(additional_ids, vec!["action-config", "global-extra-config"]);
}

#[test]
fn given_backend_rules_in_several_layers_when_merged_then_first_layer_wins() {
    let mut global = Policy::default();
    global.type_instance.rules = vec![
        backend_rule("cap.type.aws.*", "global-aws"),
        backend_rule("cap.*", "global-any"),
    ];
    let mut action = Policy::default();
    action.type_instance.rules = vec![backend_rule("cap.type.aws.*", "action-aws")];
    let mut fallback = Policy::default();
    fallback.type_instance.rules = vec![
        backend_rule("cap.*", "fallback-any"),
        backend_rule("cap.type.gcp.*", "fallback-gcp"),
    ];

    let mut merged = merge_policies(
        &default_merge_order(),
        &PolicyLayers {
            global: Some(global),
            action: Some(action),
            workflow_steps: Vec::new(),
        },
    )
    .expect("policies should merge");
    apply_policy(&mut merged, &fallback);

    let backends: Vec<_> = merged
        .type_instance
        .rules
        .iter()
        .map(|rule| rule.backend.id.as_str())
        .collect();
    assert_eq!(backends, vec!["action-aws", "global-any", "fallback-gcp"]);
}

#[test]
fn given_custom_order_when_merged_then_global_takes_precedence() {
    let with_default = |id: &str| {
        let mut policy = Policy::default();
        policy.interface.default = Some(InterfaceDefault {
            inject: Some(DefaultInject {
                required_type_instances: vec![required(id, None, None)],
            }),
        });
        policy
    };

    let merged = merge_policies(
        &[PolicyLayer::Global, PolicyLayer::Action],
        &PolicyLayers {
            global: Some(with_default("global")),
            action: Some(with_default("action")),
            workflow_steps: Vec::new(),
        },
    )
    .expect("policies should merge");

    assert_eq!(merged.default_required_type_instances()[0].id, "global");
}

#[test]
fn given_distinct_alternatives_when_merged_then_both_are_kept() {
    let action = policy_with_rule(InjectData::default());
    let mut global = policy_with_rule(InjectData::default());
    global.interface.rules[0].one_of[0]
        .implementation_constraints
        .path = Some("cap.implementation.aws.rds.postgresql.install".to_string());

    let merged = merge_policies(
        &default_merge_order(),
        &PolicyLayers {
            global: Some(global),
            action: Some(action),
            workflow_steps: Vec::new(),
        },
    )
    .expect("policies should merge");

    assert_eq!(merged.interface.rules.len(), 1);
    assert_eq!(merged.interface.rules[0].one_of.len(), 2);
}

fn requires(path: &str) -> Rule {
    Rule {
        implementation_constraints: ImplementationConstraints {
            requires: Some(vec![ManifestRef::new(path)]),
            ..ImplementationConstraints::default()
        },
        inject: None,
    }
}

#[test]
fn given_pathless_alternatives_in_two_layers_when_merged_then_both_are_kept() {
    let with_alternative = |rule: Rule| {
        let mut policy = Policy::default();
        policy.interface.rules = vec![RulesForInterface {
            interface: ManifestRef::new(POSTGRES_INTERFACE),
            one_of: vec![rule],
        }];
        policy
    };

    let merged = merge_policies(
        &default_merge_order(),
        &PolicyLayers {
            global: Some(with_alternative(requires("cap.type.gcp.auth"))),
            action: Some(with_alternative(requires("cap.type.aws.auth"))),
            workflow_steps: Vec::new(),
        },
    )
    .expect("policies should merge");

    let required: Vec<_> = merged.interface.rules[0]
        .one_of
        .iter()
        .map(|rule| rule.implementation_constraints.requires.clone())
        .collect();
    assert_eq!(
        required,
        vec![
            Some(vec![ManifestRef::new("cap.type.aws.auth")]),
            Some(vec![ManifestRef::new("cap.type.gcp.auth")]),
        ]
    );
}

fn workflow_step(interface: WorkflowInterfaceRef, value: Value) -> WorkflowPolicy {
    WorkflowPolicy {
        interface: WorkflowInterfacePolicy {
            rules: vec![WorkflowRulesForInterface {
                interface,
                one_of: vec![WorkflowRule {
                    implementation_constraints: ImplementationConstraints {
                        path: Some(BITNAMI_IMPLEMENTATION.to_string()),
                        ..ImplementationConstraints::default()
                    },
                    inject: Some(WorkflowInjectData {
                        additional_parameters: vec![params("additional-parameters", value)],
                    }),
                }],
            }],
        },
    }
}

#[test]
fn given_workflow_step_when_merged_then_its_parameters_have_lowest_priority() {
    let action = policy_with_rule(InjectData {
        additional_parameters: vec![params("additional-parameters", json!({"replicas": 3}))],
        ..InjectData::default()
    });
    let step = workflow_step(
        WorkflowInterfaceRef::ManifestRef(ManifestRef::new(POSTGRES_INTERFACE)),
        json!({"replicas": 1, "region": "eu"}),
    );

    let merged = merge_policies(
        &default_merge_order(),
        &PolicyLayers {
            global: None,
            action: Some(action),
            workflow_steps: vec![step],
        },
    )
    .expect("policies should merge");

    let inject = merged_inject(&merged);
    assert!(inject.required_type_instances.is_empty());
    assert_eq!(
        Value::Object(inject.additional_parameters[0].value.clone()),
        json!({"replicas": 3, "region": "eu"})
    );
}

#[test]
fn given_workflow_step_with_unresolved_alias_when_merged_then_merge_fails() {
    let step = workflow_step(
        WorkflowInterfaceRef::Alias("postgres.install".to_string()),
        json!({}),
    );

    let err = merge_policies(
        &default_merge_order(),
        &PolicyLayers {
            workflow_steps: vec![step],
            ..PolicyLayers::default()
        },
    )
    .expect_err("alias must be resolved before merging");

    assert!(matches!(err, PolicyError::UnresolvedImport(_)));
}
