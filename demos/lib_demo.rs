use githubipranges::ipnetwork::IpNetwork;
use githubipranges::{FilterBuilder, Result, SharedIpRanges};

fn main() -> Result<()> {
    // Get the GitHub IP Ranges
    let ip_ranges = githubipranges::get_ranges()?;

    // Classify an IP address
    let range = ip_ranges.range_for("140.82.112.3".parse()?);
    println!("{:?}", range);

    // Find the longest match range for a CIDR
    let cidr: IpNetwork = "192.30.252.0/24".parse()?;
    println!("{:?}", ip_ranges.get_longest_match_range(&cidr));

    // Search for IP ranges
    let search_prefixes: Vec<IpNetwork> = vec!["140.82.112.3".parse()?, "1.1.1.1".parse()?];
    let search_results = ip_ranges.search(&search_prefixes);
    for ip_range in search_results.ip_ranges.ranges() {
        println!("{:?}", ip_range);
    }

    // Filter the GitHub IP Ranges
    let filter = FilterBuilder::new(&ip_ranges)
        .ipv6()
        .services(["actions"])?
        .build();
    let filtered_ranges = ip_ranges.filter(&filter);
    for ip_range in filtered_ranges.ranges() {
        println!("{:?}", ip_range);
    }

    // Share the ranges with concurrent readers and refresh them in place
    let shared = SharedIpRanges::new(*ip_ranges);
    githubipranges::Client::new().refresh(&shared)?;
    println!("{} prefixes", shared.load().len());

    Ok(())
}
