use crate::core::ip_range::IpRange;
use crate::core::ip_ranges::IpRanges;
use ipnetwork::IpNetwork;
use std::collections::{BTreeMap, BTreeSet};

/*-------------------------------------------------------------------------------------------------
  Search Results
-------------------------------------------------------------------------------------------------*/

/// Search results containing the matching [IpRanges], a map of found prefixes, and the set of
/// prefixes not found in the GitHub IP ranges.
#[derive(Clone, Debug, Default)]
pub struct SearchResults {
    /// [IpRanges] object containing the matching IP ranges.
    pub ip_ranges: Box<IpRanges>,

    /// Map of found [IpNetwork] prefixes to the sets of [IpRange] records that contain them.
    pub prefix_matches: BTreeMap<IpNetwork, BTreeSet<IpRange>>,

    /// Set of [IpNetwork] prefixes not found in the GitHub IP ranges.
    pub prefixes_not_found: BTreeSet<IpNetwork>,
}

impl SearchResults {
    /// Whether every searched prefix was found.
    pub fn all_found(&self) -> bool {
        self.prefixes_not_found.is_empty()
    }
}
