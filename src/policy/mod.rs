pub mod backend;
pub mod error;
pub mod merger;
pub mod parser;
pub mod references;
pub mod types;
mod validate;
pub mod workflow;

pub use backend::{MAX_BACKEND_LOOKUP_FOR_TYPE_REF, TypeInstanceBackendCollection};
pub use error::{MissingMetadata, PolicyError, TypeInstanceKind, UnresolvedTypeInstance};
pub use merger::{PolicyLayer, PolicyLayers, default_merge_order, merge_policies};
pub use parser::{DEFAULT_SUPPORTED_API_VERSION, VersionGate, from_yaml_str, from_yaml_str_default};
pub use types::{
    AdditionalParametersToInject, AdditionalTypeInstanceToInject, DefaultInject,
    ImplementationConstraints, InjectData, InterfaceDefault, InterfacePolicy, Policy,
    RequiredTypeInstanceToInject, Rule, RulesForInterface, RulesForTypeInstance,
    TypeInstanceBackend, TypeInstancePolicy,
};
pub use workflow::{
    ImplementationImport, ImplementationImportMethod, WorkflowInjectData,
    WorkflowInterfacePolicy, WorkflowInterfaceRef, WorkflowPolicy, WorkflowRule,
    WorkflowRulesForInterface, resolve_action_ref,
};
