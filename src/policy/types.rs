use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;

use crate::{
    merge::ValueMap,
    types::{ManifestRef, TypeRef},
};

pub const CURRENT_API_VERSION: &str = "0.2.0";
pub const ANY_INTERFACE_PATH: &str = "cap.*";

/// Policy document driving Implementation constraints, TypeInstance injection
/// and storage backend assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub interface: InterfacePolicy,
    #[serde(default)]
    pub type_instance: TypeInstancePolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfacePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<InterfaceDefault>,
    #[serde(default)]
    pub rules: Vec<RulesForInterface>,
}

/// Injection applied for every Interface, independently of the matched rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDefault {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject: Option<DefaultInject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultInject {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_type_instances: Vec<RequiredTypeInstanceToInject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesForInterface {
    pub interface: ManifestRef,
    #[serde(default)]
    pub one_of: Vec<Rule>,
}

/// One alternative of an Interface rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default, skip_serializing_if = "ImplementationConstraints::is_empty")]
    pub implementation_constraints: ImplementationConstraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject: Option<InjectData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImplementationConstraints {
    /// Type references the Implementation must require.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Vec<ManifestRef>>,
    /// Attributes the Implementation must carry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<ManifestRef>>,
    /// Exact Implementation path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ImplementationConstraints {
    pub fn is_empty(&self) -> bool {
        self.requires.is_none() && self.attributes.is_none() && self.path.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_type_instances: Vec<RequiredTypeInstanceToInject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_parameters: Vec<AdditionalParametersToInject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_type_instances: Vec<AdditionalTypeInstanceToInject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredTypeInstanceToInject {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalParametersToInject {
    pub name: String,
    /// Only string keys are accepted, at any depth; YAML maps keyed by
    /// numbers or booleans fail to decode instead of being re-keyed.
    #[serde(default, deserialize_with = "deserialize_parameter_value")]
    pub value: ValueMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalTypeInstanceToInject {
    pub name: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeInstancePolicy {
    #[serde(default)]
    pub rules: Vec<RulesForTypeInstance>,
}

/// Assigns a storage backend to every TypeInstance whose Type matches
/// `type_ref`. The path may end with `*`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesForTypeInstance {
    pub type_ref: ManifestRef,
    pub backend: TypeInstanceBackend,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInstanceBackend {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
}

impl TypeInstanceBackend {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            type_ref: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Policy {
    pub fn default_required_type_instances(&self) -> &[RequiredTypeInstanceToInject] {
        self.interface
            .default
            .as_ref()
            .and_then(|default| default.inject.as_ref())
            .map(|inject| inject.required_type_instances.as_slice())
            .unwrap_or_default()
    }

    /// Finds the rules declared for exactly this Interface reference.
    pub fn rules_for_interface(&self, interface: &ManifestRef) -> Option<&RulesForInterface> {
        self.interface.rules.iter().find(|rule| {
            rule.interface.path == interface.path
                && rule.interface.revision() == interface.revision()
        })
    }
}

fn deserialize_parameter_value<'de, D>(deserializer: D) -> Result<ValueMap, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match yaml_to_json(value).map_err(D::Error::custom)? {
        Value::Object(map) => Ok(map),
        other => Err(D::Error::custom(format!(
            "additionalParameters value must be a map, got {other}"
        ))),
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(flag) => Value::Bool(flag),
        Yaml::Number(number) => {
            if let Some(int) = number.as_i64() {
                Value::from(int)
            } else if let Some(uint) = number.as_u64() {
                Value::from(uint)
            } else {
                number
                    .as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        format!("additionalParameters cannot hold non-finite number {number}")
                    })?
            }
        }
        Yaml::String(text) => Value::String(text),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut out = ValueMap::new();
            for (key, value) in mapping {
                let Yaml::String(key) = key else {
                    return Err(format!(
                        "additionalParameters keys must be strings, got {key:?}"
                    ));
                };
                out.insert(key, yaml_to_json(value)?);
            }
            Value::Object(out)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}
