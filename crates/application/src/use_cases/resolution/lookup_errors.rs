use rpcdns_domain::Status;
use std::fmt::Display;

pub const HOSTNAME_FIELD: &str = "hostname lookup";
pub const SRV_FIELD: &str = "srv lookup";
pub const TXT_FIELD: &str = "txt lookup";

/// Used when an attempt found no addresses but recorded no errors either,
/// e.g. empty hostname and SRV answers.
pub const NO_RESULTS_MESSAGE: &str = "no results from lookup";

pub fn balancer_field(host: &str) -> String {
    format!("balancer lookup for {}", host)
}

/// Per-lookup failures of one attempt, in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupErrors {
    entries: Vec<(String, String)>,
}

impl LookupErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, error: impl Display) {
        self.entries.push((field.into(), error.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(f, m)| (f.as_str(), m.as_str()))
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.entries.iter().any(|(f, _)| f == field)
    }

    /// `errors resolving <name>: <field>: <msg>; <field>: <msg>`
    pub fn summary(&self, name: &str) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let joined = self
            .entries
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>()
            .join("; ");
        Some(format!("errors resolving {}: {}", name, joined))
    }

    pub fn to_status(&self, name: &str) -> Status {
        match self.summary(name) {
            Some(summary) => Status::unavailable(summary),
            None => Status::unavailable(NO_RESULTS_MESSAGE),
        }
    }
}
