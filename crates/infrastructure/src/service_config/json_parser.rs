use rpcdns_application::ports::ServiceConfigParser;
use rpcdns_domain::{DomainError, ServiceConfig};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

const CLIENT_LANGUAGE: &str = "rust";

/// One entry of the TXT payload array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ServiceConfigChoice {
    #[serde(default)]
    client_language: Option<Vec<String>>,

    #[serde(default)]
    percentage: Option<u32>,

    #[serde(default)]
    client_hostname: Option<Vec<String>>,

    #[serde(default)]
    service_config: Option<Map<String, Value>>,
}

/// Selects the service config choice that applies to this client from a
/// `grpc_config=` payload and validates it.
pub struct JsonServiceConfigParser {
    hostname: Option<String>,
}

impl JsonServiceConfigParser {
    pub fn new() -> Self {
        let hostname = hostname::get().ok().and_then(|h| h.into_string().ok());
        Self { hostname }
    }

    pub fn with_hostname(hostname: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
        }
    }

    fn matches(&self, choice: &ServiceConfigChoice) -> bool {
        if let Some(languages) = &choice.client_language {
            if !languages
                .iter()
                .any(|l| l.eq_ignore_ascii_case(CLIENT_LANGUAGE))
            {
                return false;
            }
        }

        if let Some(percentage) = choice.percentage {
            if fastrand::u32(0..100) >= percentage {
                return false;
            }
        }

        if let Some(hostnames) = &choice.client_hostname {
            let Some(local) = &self.hostname else {
                return false;
            };
            if !hostnames.iter().any(|h| h == local) {
                return false;
            }
        }

        true
    }
}

impl Default for JsonServiceConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(message: impl Into<String>) -> DomainError {
    DomainError::InvalidServiceConfig(message.into())
}

fn validate(config: &Map<String, Value>) -> Result<(), DomainError> {
    if let Some(lb) = config.get("loadBalancingConfig") {
        if !lb.is_array() {
            return Err(invalid("field:loadBalancingConfig error:should be of type array"));
        }
    }
    if let Some(methods) = config.get("methodConfig") {
        if !methods.is_array() {
            return Err(invalid("field:methodConfig error:should be of type array"));
        }
    }
    Ok(())
}

impl ServiceConfigParser for JsonServiceConfigParser {
    fn parse(&self, payload: &str) -> Result<Option<ServiceConfig>, DomainError> {
        let choices: Vec<ServiceConfigChoice> =
            serde_json::from_str(payload).map_err(|e| invalid(e.to_string()))?;

        for choice in &choices {
            if let Some(percentage) = choice.percentage {
                if percentage > 100 {
                    return Err(invalid(format!(
                        "field:percentage error:{} is out of range 0..=100",
                        percentage
                    )));
                }
            }
        }

        let Some(selected) = choices.into_iter().find(|c| self.matches(c)) else {
            debug!("No service config choice applies to this client");
            return Ok(None);
        };

        let config = selected.service_config.unwrap_or_default();
        validate(&config)?;
        Ok(Some(ServiceConfig::from_object(config)))
    }
}
