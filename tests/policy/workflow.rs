use capact_policy::{
    policy::{
        ImplementationImport, ImplementationImportMethod, PolicyError, WorkflowInterfaceRef,
        WorkflowPolicy, resolve_action_ref,
    },
    types::ManifestRef,
};
use serde_json::{Value, json};

const STEP_POLICY: &str = r#"
interface:
  rules:
    - interface: postgres.install
      oneOf:
        - implementationConstraints:
            path: cap.implementation.bitnami.postgresql.install
          inject:
            additionalParameters:
              - name: additional-parameters
                value:
                  replicas: 2
    - interface:
        path: cap.interface.runner.helm.run
        revision: 0.1.0
      oneOf:
        - implementationConstraints:
            requires:
              - path: cap.core.type.platform.kubernetes
"#;

fn imports() -> Vec<ImplementationImport> {
    vec![
        ImplementationImport {
            interface_group_path: "cap.interface.database.mysql".to_string(),
            alias: Some("mysql".to_string()),
            app_version: None,
            methods: vec![ImplementationImportMethod {
                name: "install".to_string(),
                revision: Some("0.1.0".to_string()),
            }],
        },
        ImplementationImport {
            interface_group_path: "cap.interface.database.postgresql".to_string(),
            alias: Some("postgres".to_string()),
            app_version: Some("10,11".to_string()),
            methods: vec![
                ImplementationImportMethod {
                    name: "backup".to_string(),
                    revision: None,
                },
                ImplementationImportMethod {
                    name: "install".to_string(),
                    revision: Some("0.2.0".to_string()),
                },
            ],
        },
    ]
}

#[test]
fn given_step_policy_when_parsed_then_alias_and_manifest_refs_are_distinguished() {
    let step = WorkflowPolicy::from_yaml_str(STEP_POLICY).expect("step policy should parse");

    assert_eq!(
        step.interface.rules[0].interface,
        WorkflowInterfaceRef::Alias("postgres.install".to_string())
    );
    assert_eq!(
        step.interface.rules[1].interface,
        WorkflowInterfaceRef::ManifestRef(
            ManifestRef::new("cap.interface.runner.helm.run").with_revision("0.1.0")
        )
    );
}

#[test]
fn given_step_policy_injecting_type_instances_when_parsed_then_it_is_rejected() {
    let raw = r#"
interface:
  rules:
    - interface: postgres.install
      oneOf:
        - inject:
            requiredTypeInstances:
              - id: 1314-142-123
"#;

    let err = WorkflowPolicy::from_yaml_str(raw).expect_err("TypeInstances are not injectable");
    assert!(matches!(err, PolicyError::Parse(_)));
}

#[test]
fn given_imports_when_resolving_then_alias_becomes_full_interface_ref() {
    let mut step = WorkflowPolicy::from_yaml_str(STEP_POLICY).expect("step policy should parse");

    step.resolve_imports(&imports()).expect("alias should resolve");

    assert_eq!(
        step.interface.rules[0].interface,
        WorkflowInterfaceRef::ManifestRef(
            ManifestRef::new("cap.interface.database.postgresql.install").with_revision("0.2.0")
        )
    );
}

#[test]
fn given_method_without_revision_when_resolving_then_revision_stays_empty() {
    let resolved = resolve_action_ref(&imports(), "postgres.backup").expect("method exists");

    assert_eq!(resolved, ManifestRef::new("cap.interface.database.postgresql.backup"));
}

#[test]
fn given_unknown_alias_when_resolving_then_import_error_is_returned() {
    let err = resolve_action_ref(&imports(), "redis.install").expect_err("alias is unknown");
    assert!(matches!(err, PolicyError::UnresolvedImport(_)));

    let err = resolve_action_ref(&imports(), "postgres.upgrade").expect_err("method is unknown");
    assert!(err.to_string().contains("postgres.upgrade"));
}

#[test]
fn given_ref_without_method_when_resolving_then_pattern_error_is_returned() {
    let err = resolve_action_ref(&imports(), "postgres").expect_err("method is missing");

    assert!(err.to_string().contains("<import_alias>.<method_name>"));
}

#[test]
fn given_resolved_step_when_converted_then_policy_keeps_rules_and_parameters() {
    let mut step = WorkflowPolicy::from_yaml_str(STEP_POLICY).expect("step policy should parse");
    step.resolve_imports(&imports()).expect("alias should resolve");

    let policy = step.to_policy().expect("resolved step should convert");

    assert_eq!(policy.interface.rules.len(), 2);
    assert!(policy.type_instance.rules.is_empty());
    assert!(policy.interface.default.is_none());
    let postgres = policy
        .rules_for_interface(
            &ManifestRef::new("cap.interface.database.postgresql.install").with_revision("0.2.0"),
        )
        .expect("resolved rule should be present");
    let inject = postgres.one_of[0].inject.as_ref().expect("inject should exist");
    assert!(inject.required_type_instances.is_empty());
    assert_eq!(
        Value::Object(inject.additional_parameters[0].value.clone()),
        json!({"replicas": 2})
    );
    assert!(policy.interface.rules[1].one_of[0].inject.is_none());
}

#[test]
fn given_unresolved_alias_when_converted_then_conversion_fails() {
    let step = WorkflowPolicy::from_yaml_str(STEP_POLICY).expect("step policy should parse");

    let err = step.to_policy().expect_err("alias is not resolved");
    assert!(matches!(err, PolicyError::UnresolvedImport(_)));
}

#[test]
fn given_step_policy_when_serialized_then_it_parses_back_identically() {
    let step = WorkflowPolicy::from_yaml_str(STEP_POLICY).expect("step policy should parse");

    let serialized = step.to_yaml_string().expect("step policy should serialize");

    assert_eq!(
        WorkflowPolicy::from_yaml_str(&serialized).expect("serialized step should parse"),
        step
    );
}
