use crate::cli;
use githubipranges::ipnetwork::IpNetwork;
use githubipranges::{Error, FilterBuilder, IpRanges, Result};
use log::error;
use std::net::IpAddr;

/*-------------------------------------------------------------------------------------------------
  Core functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Parse IP Network prefixes from CLI arguments
--------------------------------------------------------------------------------------*/

/// Parse the search CIDRs. Bare IP addresses are searched as host prefixes (`/32` or `/128`).
pub fn parse_prefixes(args: &cli::Args) -> Result<Option<Vec<IpNetwork>>> {
    let Some(search_cidrs) = args.search_cidrs.as_ref() else {
        return Ok(None);
    };

    let prefixes: Result<Vec<IpNetwork>> = search_cidrs
        .iter()
        .map(|value| {
            parse_prefix(value).ok_or_else(|| {
                error!("Invalid IP address or prefix: {:?}", value);
                Error::from(format!("Invalid IP address or prefix: {value}"))
            })
        })
        .collect();

    prefixes.map(Some)
}

fn parse_prefix(value: &str) -> Option<IpNetwork> {
    let value = value.trim();
    if value.contains('/') {
        value.parse().ok()
    } else {
        value.parse::<IpAddr>().ok().map(IpNetwork::from)
    }
}

/*--------------------------------------------------------------------------------------
  Build GitHub IP Ranges filter from CLI arguments
--------------------------------------------------------------------------------------*/

pub fn build_filter(args: &cli::Args, ip_ranges: &IpRanges) -> Result<githubipranges::Filter> {
    let mut filter_builder = FilterBuilder::new(ip_ranges);

    if args.ipv4 {
        filter_builder = filter_builder.ipv4();
    }

    if args.ipv6 {
        filter_builder = filter_builder.ipv6();
    }

    if let Some(services) = &args.services {
        filter_builder = filter_builder
            .services(services.iter().map(|service| service.to_lowercase()))
            .inspect_err(|error| error!("{error}"))?;
    }

    Ok(filter_builder.build())
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
