use githubipranges::ipnetwork::IpNetwork;
use githubipranges::SearchResults;
use log::{info, warn};

/*-------------------------------------------------------------------------------------------------
  Logging Functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Search Results
--------------------------------------------------------------------------------------*/

pub fn search_results(search_cidrs: &[IpNetwork], search_results: &SearchResults) {
    let count_search_cidrs = search_cidrs.len();
    info!("Searched for {count_search_cidrs} CIDR(s) in the GitHub IP ranges");

    let count_search_cidrs_found = search_results.prefix_matches.len();
    let count_containing_ranges = search_results.ip_ranges.len();
    if count_search_cidrs_found > 0 {
        info!("Found {count_search_cidrs_found} search CIDR(s) contained in {count_containing_ranges} GitHub IP range(s)");
    };

    let count_search_cidrs_not_found = search_results.prefixes_not_found.len();
    if count_search_cidrs_not_found > 0 {
        warn!("Did not find {count_search_cidrs_not_found} search CIDR(s)");
    };
}
