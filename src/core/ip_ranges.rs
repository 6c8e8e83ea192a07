use crate::core::errors::{PrefixError, Result};
use crate::core::filter::Filter;
use crate::core::ip_range::IpRange;
use crate::core::json;
use crate::core::prefix_table::PrefixTable;
use crate::core::search_results::SearchResults;
use crate::core::utils;
use ipnetwork::IpNetwork;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  IP Ranges
-------------------------------------------------------------------------------------------------*/

/// Registry of GitHub IP ranges binding each prefix to the services that announce it. Answers
/// "is this address a GitHub address" ([IpRanges::is_known]) and "which range and services
/// does it belong to" ([IpRanges::range_for]) with longest-prefix-match semantics.
///
/// ```
/// let ip_ranges = githubipranges::IpRanges::build_from([
///     ("192.30.252.0/22", "api"),
///     ("192.30.252.0/22", "git"),
/// ])?;
///
/// let range = ip_ranges.range_for("192.30.252.1".parse()?).unwrap();
/// assert_eq!(range.prefix.to_string(), "192.30.252.0/22");
/// assert!(range.has_service("api") && range.has_service("git"));
///
/// assert!(!ip_ranges.is_known("8.8.8.8".parse()?));
/// # Ok::<(), githubipranges::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct IpRanges {
    pub(crate) services: BTreeSet<Arc<str>>,
    pub(crate) table: PrefixTable<IpRange>,
}

/*--------------------------------------------------------------------------------------
  IP Ranges Implementation
--------------------------------------------------------------------------------------*/

impl IpRanges {
    /*-------------------------------------------------------------------------
      Build
    -------------------------------------------------------------------------*/

    /// Build the registry from `(prefix, service)` pairs.
    ///
    /// Prefix literals are parsed as IPv4 or IPv6 CIDRs and canonicalized (host bits masked
    /// off). Entries sharing a canonical prefix are merged into one [IpRange] whose services
    /// are the union of the entries' services. The first malformed literal or empty service
    /// name aborts the build.
    pub fn build_from<I, P, S>(entries: I) -> std::result::Result<Self, PrefixError>
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<str>,
        S: AsRef<str>,
    {
        let mut services: BTreeSet<Arc<str>> = BTreeSet::new();
        let mut ranges: BTreeMap<IpNetwork, IpRange> = BTreeMap::new();

        for (prefix_text, service) in entries {
            let prefix_text = prefix_text.as_ref();
            let prefix = utils::ipnetwork::parse_cidr(prefix_text)?;

            let service = service.as_ref();
            if service.is_empty() {
                return Err(PrefixError::EmptyServiceName(prefix_text.to_string()));
            }
            let service = utils::intern_arc_str(service, &mut services);

            // Duplicate prefix entries indicate multiple services use a prefix
            ranges
                .entry(prefix)
                .and_modify(|ip_range| {
                    ip_range.services.insert(Arc::clone(&service));
                })
                .or_insert_with(|| IpRange {
                    prefix,
                    services: BTreeSet::from([Arc::clone(&service)]),
                });
        }

        let table = PrefixTable::build(ranges.into_iter())?;
        debug!(
            "Built IP ranges: {} prefixes, {} services",
            table.len(),
            services.len()
        );

        Ok(IpRanges { services, table })
    }

    /// Build the registry from a GitHub meta JSON document (`https://api.github.com/meta`).
    pub fn from_json(json: &str) -> Result<Box<IpRanges>> {
        let json_meta = json::parse(json)?;
        Ok(Box::new(IpRanges::build_from(json_meta.entries())?))
    }

    /*-------------------------------------------------------------------------
      Getters
    -------------------------------------------------------------------------*/

    /// Services represented in the IP ranges.
    pub fn services(&self) -> &BTreeSet<Arc<str>> {
        &self.services
    }

    /// [IpRange] records sorted by prefix.
    pub fn ranges(&self) -> impl Iterator<Item = &IpRange> {
        self.table.iter().map(|(_, ip_range)| ip_range)
    }

    /// Number of distinct prefixes.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Get a reference-counted string (`Arc<str>`) service for the provided service name.
    pub fn get_service(&self, value: &str) -> Option<Arc<str>> {
        utils::get_arc_str_from_set(value, &self.services)
    }

    /*-------------------------------------------------------------------------
      Address Queries
    -------------------------------------------------------------------------*/

    /// Whether the address falls within any of the IP ranges.
    pub fn is_known(&self, addr: IpAddr) -> bool {
        self.table.contains(addr)
    }

    /// The most specific [IpRange] containing the address.
    pub fn range_for(&self, addr: IpAddr) -> Option<&IpRange> {
        self.table.lookup(addr).map(|(_, ip_range)| ip_range)
    }

    /*-------------------------------------------------------------------------
      Prefix Queries
    -------------------------------------------------------------------------*/

    /// Get the [IpRange] record for exactly the provided [IpNetwork] CIDR.
    pub fn get_range(&self, value: &IpNetwork) -> Option<&IpRange> {
        self.table.get(value)
    }

    /// Get the longest matching [IpRange] record for the provided [IpNetwork] CIDR.
    pub fn get_longest_match_range(&self, value: &IpNetwork) -> Option<&IpRange> {
        self.table
            .longest_match(value)
            .map(|(_, ip_range)| ip_range)
    }

    /// Get all [IpRange] records that are supernets of the provided [IpNetwork] CIDR.
    pub fn get_supernet_ranges(&self, value: &IpNetwork) -> Option<BTreeSet<IpRange>> {
        let ip_ranges: BTreeSet<IpRange> = self
            .table
            .matches(value)
            .map(|(_, ip_range)| ip_range.clone())
            .collect();

        if !ip_ranges.is_empty() {
            Some(ip_ranges)
        } else {
            None
        }
    }

    /*-------------------------------------------------------------------------
      Search
    -------------------------------------------------------------------------*/

    /// Search for the IP ranges that contain the provided [IpNetwork] CIDRs.
    pub fn search<'p, I>(&self, values: I) -> Box<SearchResults>
    where
        I: IntoIterator<Item = &'p IpNetwork>,
    {
        let mut search_results = Box::<SearchResults>::default();
        let mut result_ip_ranges: BTreeSet<IpRange> = BTreeSet::new();

        for prefix in values.into_iter() {
            if let Some(ip_ranges) = self.get_supernet_ranges(prefix) {
                result_ip_ranges.extend(ip_ranges.iter().cloned());
                search_results.prefix_matches.insert(*prefix, ip_ranges);
            } else {
                warn!("Search CIDR not found in GitHub IP ranges: {prefix}");
                search_results.prefixes_not_found.insert(*prefix);
            }
        }

        search_results.ip_ranges = Box::new(IpRanges::from(result_ip_ranges));
        search_results
    }

    /*-------------------------------------------------------------------------
      Filter
    -------------------------------------------------------------------------*/

    /// Filter the IP ranges using the provided [Filter].
    pub fn filter(&self, filter: &Filter) -> Box<IpRanges> {
        let filtered_ip_ranges: BTreeSet<IpRange> = self
            .ranges()
            .filter(|ip_range| filter.include_range(ip_range))
            .cloned()
            .collect();

        Box::new(IpRanges::from(filtered_ip_ranges))
    }
}

/*--------------------------------------------------------------------------------------
  Create IP Ranges from BTreeSet of IP Ranges
--------------------------------------------------------------------------------------*/

impl From<BTreeSet<IpRange>> for IpRanges {
    /// Records sharing a canonical prefix are merged, so the conversion never fails.
    fn from(value: BTreeSet<IpRange>) -> Self {
        let mut ip_range_map: BTreeMap<IpNetwork, IpRange> = BTreeMap::new();

        for ip_range in value {
            let prefix = utils::ipnetwork::network_prefix(&ip_range.prefix);
            ip_range_map
                .entry(prefix)
                .and_modify(|existing| {
                    existing.services.extend(ip_range.services.iter().cloned());
                })
                .or_insert(IpRange { prefix, ..ip_range });
        }

        let services: BTreeSet<Arc<str>> = ip_range_map
            .values()
            .flat_map(|ip_range| &ip_range.services)
            .cloned()
            .collect();

        IpRanges {
            services,
            table: PrefixTable::from_map(ip_range_map),
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::filter::FilterBuilder;
    use crate::core::ip_range::tests::{test_ipv4_range, test_ipv6_range};

    /*----------------------------------------------------------------------------------
      Test Helper Functions
    ----------------------------------------------------------------------------------*/

    pub(crate) fn test_ip_ranges() -> Box<IpRanges> {
        let ip_ranges = IpRanges::build_from([
            ("10.0.0.0/8", "api"),
            ("10.0.0.0/16", "api"),
            ("10.1.0.0/16", "git"),
            ("10.1.0.0/16", "web"),
            ("2001:db8::/32", "api"),
            ("2001:db8::/48", "api"),
            ("2001:db8:1::/48", "git"),
            ("2001:db8:1::/48", "web"),
        ])
        .unwrap();

        Box::new(ip_ranges)
    }

    fn addr(value: &str) -> IpAddr {
        value.parse().unwrap()
    }

    fn net(value: &str) -> IpNetwork {
        value.parse().unwrap()
    }

    fn services(ip_range: &IpRange) -> Vec<&str> {
        ip_range.services.iter().map(|service| service.as_ref()).collect()
    }

    /*----------------------------------------------------------------------------------
      IP Ranges
    ----------------------------------------------------------------------------------*/

    /*-------------------------------------------------------------------------
      Build
    -------------------------------------------------------------------------*/

    #[test]
    fn test_build_from_merges_duplicate_prefixes() {
        let ip_ranges =
            IpRanges::build_from([("1.2.3.0/24", "web"), ("1.2.3.0/24", "api")]).unwrap();

        assert_eq!(ip_ranges.len(), 1);
        let ip_range = ip_ranges.ranges().next().unwrap();
        assert_eq!(ip_range.prefix, net("1.2.3.0/24"));
        assert_eq!(services(ip_range), vec!["api", "web"]);
    }

    #[test]
    fn test_build_from_merges_non_canonical_prefixes() {
        let ip_ranges =
            IpRanges::build_from([("1.2.3.4/24", "web"), ("1.2.3.0/24", "web")]).unwrap();

        assert_eq!(ip_ranges.len(), 1);
        let ip_range = ip_ranges.get_range(&net("1.2.3.0/24")).unwrap();
        assert_eq!(services(ip_range), vec!["web"]);
    }

    #[test]
    fn test_build_from_interns_service_names() {
        let ip_ranges = test_ip_ranges();
        let api = ip_ranges.get_service("api").unwrap();

        for ip_range in ip_ranges.ranges().filter(|ip_range| ip_range.has_service("api")) {
            let service = ip_range.services.get("api").unwrap();
            assert!(Arc::ptr_eq(service, &api));
        }
    }

    #[test]
    fn test_build_from_rejects_malformed_prefix() {
        let result = IpRanges::build_from([("10.0.0.0/8", "api"), ("10.0.0.0/40", "git")]);
        assert_eq!(
            result.unwrap_err(),
            PrefixError::MalformedPrefix("10.0.0.0/40".to_string())
        );
    }

    #[test]
    fn test_build_from_rejects_empty_service() {
        let result = IpRanges::build_from([("10.0.0.0/8", "")]);
        assert_eq!(
            result.unwrap_err(),
            PrefixError::EmptyServiceName("10.0.0.0/8".to_string())
        );
    }

    #[test]
    fn test_build_from_empty_input() {
        let ip_ranges = IpRanges::build_from(Vec::<(String, String)>::new()).unwrap();
        assert!(ip_ranges.is_empty());
        assert!(!ip_ranges.is_known(addr("10.0.0.1")));
    }

    #[test]
    fn test_build_from_is_idempotent() {
        let entries = [
            ("0.0.0.0/0", "default"),
            ("10.0.0.0/8", "api"),
            ("10.1.0.0/16", "git"),
            ("2001:db8::/32", "web"),
        ];
        let first = IpRanges::build_from(entries).unwrap();
        let second = IpRanges::build_from(entries.into_iter().rev()).unwrap();

        for value in ["10.1.0.1", "10.2.0.1", "8.8.8.8", "2001:db8::1", "2001:db9::1"] {
            assert_eq!(first.range_for(addr(value)), second.range_for(addr(value)));
        }
    }

    /*-------------------------------------------------------------------------
      Address Queries
    -------------------------------------------------------------------------*/

    #[test]
    fn test_range_for_end_to_end() {
        let ip_ranges = IpRanges::build_from([("192.30.252.0/22", "api")]).unwrap();

        let ip_range = ip_ranges.range_for(addr("192.30.252.1")).unwrap();
        assert_eq!(ip_range.prefix, net("192.30.252.0/22"));
        assert_eq!(services(ip_range), vec!["api"]);

        assert!(ip_ranges.is_known(addr("192.30.252.1")));
        assert!(!ip_ranges.is_known(addr("8.8.8.8")));
        assert_eq!(ip_ranges.range_for(addr("8.8.8.8")), None);
    }

    #[test]
    fn test_range_for_prefers_narrower_range() {
        let ip_ranges = test_ip_ranges();

        let ip_range = ip_ranges.range_for(addr("10.1.2.3")).unwrap();
        assert_eq!(ip_range.prefix, net("10.1.0.0/16"));
        assert_eq!(services(ip_range), vec!["git", "web"]);

        let ip_range = ip_ranges.range_for(addr("10.2.0.1")).unwrap();
        assert_eq!(ip_range.prefix, net("10.0.0.0/8"));
    }

    #[test]
    fn test_family_isolation() {
        let ip_ranges = IpRanges::build_from([("10.0.0.0/8", "api")]).unwrap();

        assert!(ip_ranges.is_known(addr("10.0.0.1")));
        assert!(!ip_ranges.is_known(addr("::ffff:10.0.0.1")));
        assert!(!ip_ranges.is_known(addr("a00::1")));
    }

    /*-------------------------------------------------------------------------
      Prefix Queries
    -------------------------------------------------------------------------*/

    #[test]
    fn test_get_range() {
        let ip_ranges = test_ip_ranges();

        let prefix_in_range = net("10.0.0.0/8");
        assert_eq!(
            ip_ranges.get_range(&prefix_in_range).unwrap().prefix,
            prefix_in_range
        );

        let prefix_not_in_range = net("192.168.0.0/24");
        assert_eq!(ip_ranges.get_range(&prefix_not_in_range), None);
    }

    #[test]
    fn test_get_longest_match_range() {
        let ip_ranges = test_ip_ranges();

        let prefix_in_range = net("10.0.0.0/32");
        assert_eq!(
            ip_ranges
                .get_longest_match_range(&prefix_in_range)
                .unwrap()
                .prefix,
            net("10.0.0.0/16")
        );

        let prefix_not_in_range = net("192.168.0.0/24");
        assert_eq!(ip_ranges.get_longest_match_range(&prefix_not_in_range), None);
    }

    #[test]
    fn test_get_supernet_ranges() {
        let ip_ranges = test_ip_ranges();

        let supernet_ranges = ip_ranges.get_supernet_ranges(&net("10.0.0.0/24")).unwrap();
        assert_eq!(supernet_ranges.len(), 2);
        assert!(supernet_ranges.contains(&test_ipv4_range()));

        assert_eq!(ip_ranges.get_supernet_ranges(&net("192.168.0.0/24")), None);
    }

    /*-------------------------------------------------------------------------
      Search
    -------------------------------------------------------------------------*/

    #[test]
    fn test_ip_ranges_search() {
        let ip_ranges = test_ip_ranges();

        let search_networks = [
            test_ipv4_range().prefix,
            net("10.0.0.1/32"),
            net("192.168.0.0/24"),
            test_ipv6_range().prefix,
            net("2001:db8::1/128"),
            net("2001:face:1::1/64"),
        ];

        let search_results = ip_ranges.search(&search_networks);

        assert!(search_results
            .prefix_matches
            .contains_key(&search_networks[0])); // Full prefix match
        assert!(search_results
            .prefix_matches
            .contains_key(&search_networks[3])); // Full prefix match

        assert_eq!(ip_ranges.len(), 6); // Original IP ranges unchanged
        assert_eq!(search_results.ip_ranges.len(), 4); // Search results IP ranges

        assert!(search_results
            .prefixes_not_found
            .contains(&search_networks[2])); // No prefix match
        assert!(search_results
            .prefixes_not_found
            .contains(&search_networks[5])); // No prefix match
    }

    /*-------------------------------------------------------------------------
      Filter
    -------------------------------------------------------------------------*/

    #[test]
    fn test_filter() {
        let ip_ranges = test_ip_ranges();

        let filter = FilterBuilder::new(&ip_ranges)
            .ipv4()
            .services(["git"])
            .unwrap()
            .build();

        let filtered_ip_ranges = ip_ranges.filter(&filter);

        assert_eq!(filtered_ip_ranges.len(), 1);
        assert!(filtered_ip_ranges.is_known(addr("10.1.0.1")));
        assert!(!filtered_ip_ranges.is_known(addr("10.2.0.1")));
        assert_eq!(filtered_ip_ranges.services().len(), 2);
    }

    /*-------------------------------------------------------------------------
      From JSON
    -------------------------------------------------------------------------*/

    #[test]
    fn test_from_json() {
        let json = r#"{
          "verifiable_password_authentication": false,
          "hooks": ["192.30.252.0/22"],
          "api": ["192.30.252.0/22", "2a0a:a440::/29"],
          "git": [""]
        }"#;

        let ip_ranges = IpRanges::from_json(json).unwrap();

        assert_eq!(ip_ranges.len(), 2);
        let ip_range = ip_ranges.range_for(addr("192.30.252.1")).unwrap();
        assert_eq!(services(ip_range), vec!["api", "hooks"]);
        assert!(ip_ranges.is_known(addr("2a0a:a440::1")));
        assert_eq!(ip_ranges.get_service("git"), None);
    }

    #[test]
    fn test_from_json_rejects_malformed_prefix() {
        let json = r#"{ "api": ["192.30.252.0/22", "192.30.252.0/99"] }"#;

        let error = IpRanges::from_json(json).unwrap_err();
        assert_eq!(
            error.downcast_ref::<PrefixError>(),
            Some(&PrefixError::MalformedPrefix("192.30.252.0/99".to_string()))
        );
    }

    /*-------------------------------------------------------------------------
      From BTreeSet
    -------------------------------------------------------------------------*/

    #[test]
    fn test_from_ip_range_set_merges_prefixes() {
        let ip_ranges = IpRanges::from(BTreeSet::from([
            test_ipv4_range(),
            IpRange {
                prefix: net("10.9.9.9/8"),
                services: [Arc::from("git")].into_iter().collect(),
            },
        ]));

        assert_eq!(ip_ranges.len(), 1);
        let ip_range = ip_ranges.get_range(&net("10.0.0.0/8")).unwrap();
        assert_eq!(ip_range.prefix, net("10.0.0.0/8"));
        assert_eq!(services(ip_range), vec!["api", "git"]);
    }
}
