/*-------------------------------------------------------------------------------------------------
  Core Modules
-------------------------------------------------------------------------------------------------*/

pub mod client;
pub mod errors;
pub mod filter;
pub mod ip_range;
pub mod ip_ranges;
pub mod json;
pub mod prefix_table;
pub mod prefix_type;
pub mod search_results;
pub mod shared;
pub mod utils;
