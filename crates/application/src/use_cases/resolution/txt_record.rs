use rpcdns_domain::Status;

pub const SERVICE_CONFIG_ATTRIBUTE_PREFIX: &str = "grpc_config=";

/// Picks the payload of the first TXT record carrying the service-config prefix.
pub fn select_service_config_record(records: &[String]) -> Result<String, Status> {
    records
        .iter()
        .find_map(|record| record.strip_prefix(SERVICE_CONFIG_ATTRIBUTE_PREFIX))
        .map(str::to_string)
        .ok_or_else(|| Status::unavailable("TXT record attribute prefix not found"))
}
