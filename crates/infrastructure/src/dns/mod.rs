pub mod hickory_lookup;

pub use hickory_lookup::HickoryDnsLookup;
