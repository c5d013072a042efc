use serde_json::{Map, Value};

/// A parsed and validated service config selected from a TXT record.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    json: Value,
}

impl ServiceConfig {
    pub fn empty() -> Self {
        Self {
            json: Value::Object(Map::new()),
        }
    }

    pub fn from_object(object: Map<String, Value>) -> Self {
        Self {
            json: Value::Object(object),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.json.as_object().map(|o| o.is_empty()).unwrap_or(true)
    }

    pub fn json(&self) -> &Value {
        &self.json
    }

    pub fn load_balancing_config(&self) -> Option<&Vec<Value>> {
        self.json.get("loadBalancingConfig").and_then(Value::as_array)
    }

    pub fn method_config(&self) -> Option<&Vec<Value>> {
        self.json.get("methodConfig").and_then(Value::as_array)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::empty()
    }
}
