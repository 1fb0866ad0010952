use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonSchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// JSON-schema fragment describing one function parameter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolParameter {
    #[serde(rename = "type")]
    pub schema_type: JsonSchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ToolParameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, ToolParameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ToolParameter {
    fn of(schema_type: JsonSchemaType) -> Self {
        Self {
            schema_type,
            description: None,
            enum_values: None,
            items: None,
            properties: None,
            required: None,
        }
    }

    pub fn string() -> Self {
        Self::of(JsonSchemaType::String)
    }

    pub fn number() -> Self {
        Self::of(JsonSchemaType::Number)
    }

    pub fn integer() -> Self {
        Self::of(JsonSchemaType::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(JsonSchemaType::Boolean)
    }

    pub fn array(items: ToolParameter) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(JsonSchemaType::Array)
        }
    }

    pub fn object() -> Self {
        Self {
            properties: Some(BTreeMap::new()),
            required: Some(vec![]),
            ..Self::of(JsonSchemaType::Object)
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameter,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ToolParameter::object(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, param: ToolParameter) -> Self {
        if let Some(props) = &mut self.parameters.properties {
            props.insert(name.into(), param);
        }
        self
    }

    pub fn with_required_param(self, name: impl Into<String>, param: ToolParameter) -> Self {
        let name = name.into();
        self.with_param(name.clone(), param).require_param(name)
    }

    pub fn require_param(mut self, name: impl Into<String>) -> Self {
        if let Some(req) = &mut self.parameters.required {
            req.push(name.into());
        }
        self
    }

    /// Required parameters absent from `input`. A non-object input is
    /// missing every required parameter.
    pub fn missing_required(&self, input: &Value) -> Vec<&str> {
        let required = match &self.parameters.required {
            Some(required) => required,
            None => return vec![],
        };
        let object = input.as_object();
        required
            .iter()
            .filter(|name| {
                object
                    .and_then(|o| o.get(name.as_str()))
                    .map_or(true, Value::is_null)
            })
            .map(String::as_str)
            .collect()
    }
}
