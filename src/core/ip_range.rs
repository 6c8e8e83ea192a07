use ipnetwork::IpNetwork;
use std::collections::BTreeSet;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  IP Range
-------------------------------------------------------------------------------------------------*/

/// GitHub IP range record containing the canonical IP prefix and the services that announce it.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct IpRange {
    /// IPv4 or IPv6 prefix.
    pub prefix: IpNetwork,

    /// GitHub services that use the IP prefix (`api`, `git`, `actions`, ...).
    pub services: BTreeSet<Arc<str>>,
}

impl IpRange {
    /// Whether the range is announced by the named service.
    pub fn has_service(&self, service: &str) -> bool {
        self.services.contains(service)
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
