//! Longest-prefix-match lookups against the published GitHub IP ranges.
//!
//! The GitHub meta API (`https://api.github.com/meta`) lists the IPv4 and IPv6 prefixes used by
//! each GitHub service (`hooks`, `web`, `api`, `git`, `actions`, ...). This crate loads those
//! lists into an [IpRanges] registry backed by a binary-trie [PrefixTable], so that
//! classifying an address costs at most one step per prefix bit no matter how many prefixes
//! are loaded.
//!
//! ```no_run
//! // Retrieve (or read from the local cache) and parse the GitHub IP ranges
//! let ip_ranges = githubipranges::get_ranges()?;
//!
//! let addr = "140.82.112.3".parse()?;
//! if let Some(ip_range) = ip_ranges.range_for(addr) {
//!     println!("{addr} is a GitHub address in {}", ip_range.prefix);
//! }
//! # Ok::<(), githubipranges::Error>(())
//! ```
//!
//! The registry can also be built directly from `(prefix, service)` pairs:
//!
//! ```
//! let ip_ranges = githubipranges::IpRanges::build_from([
//!     ("192.30.252.0/22", "hooks"),
//!     ("2a0a:a440::/29", "hooks"),
//! ])?;
//!
//! assert!(ip_ranges.is_known("192.30.252.7".parse()?));
//! assert!(ip_ranges.is_known("2a0a:a440::1".parse()?));
//! assert!(!ip_ranges.is_known("1.1.1.1".parse()?));
//! # Ok::<(), githubipranges::Error>(())
//! ```
//!
//! Long-running services that refresh the ranges while answering queries hold a
//! [SharedIpRanges] handle; see [Client::refresh].

mod core;

/*-------------------------------------------------------------------------------------------------
  Library Interface
-------------------------------------------------------------------------------------------------*/

pub use crate::core::client::{get_ranges, Client, ClientBuilder};
pub use crate::core::errors::{Error, PrefixError, Result};
pub use crate::core::filter::{Filter, FilterBuilder};
pub use crate::core::ip_range::IpRange;
pub use crate::core::ip_ranges::IpRanges;
pub use crate::core::json::JsonMeta;
pub use crate::core::prefix_table::{Matches, PrefixTable};
pub use crate::core::prefix_type::PrefixType;
pub use crate::core::search_results::SearchResults;
pub use crate::core::shared::SharedIpRanges;

pub use ipnetwork;
