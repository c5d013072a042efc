use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("NXDOMAIN")]
    NxDomain,

    #[error("no records found for {0}")]
    NoRecords(String),

    #[error("query timed out")]
    QueryTimeout,

    #[error("{0}")]
    LookupFailed(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Invalid service config: {0}")]
    InvalidServiceConfig(String),
}
