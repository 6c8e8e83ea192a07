use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{NOTHING, UTF8_FULL};
use comfy_table::*;
use githubipranges::IpRanges;

/*-------------------------------------------------------------------------------------------------
  Output Functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Range Table
--------------------------------------------------------------------------------------*/

pub fn range_table(ip_ranges: &IpRanges) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("IP Prefix")
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
        Cell::new("Services")
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
    ]);

    for ip_range in ip_ranges.ranges() {
        let services = ip_range
            .services
            .iter()
            .map(|service| service.to_string())
            .collect::<Vec<String>>()
            .join(", ");

        table.add_row(vec![
            Cell::new(ip_range.prefix).add_attribute(Attribute::Bold),
            Cell::new(services),
        ]);
    }

    // Right-align the IP Prefix column
    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    println!("{table}");

    // Print range-table summary
    let mut summary_table = Table::new();
    summary_table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);

    summary_table.add_row(vec![
        Cell::new(ip_ranges.len()),
        Cell::new("GitHub IP Prefixes"),
    ]);
    summary_table.add_row(vec![
        Cell::new(ip_ranges.services().len()),
        Cell::new("GitHub Services"),
    ]);

    if let Some(column) = summary_table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    println!("{summary_table}");
}

/*--------------------------------------------------------------------------------------
  Prefixes In CIDR Format
--------------------------------------------------------------------------------------*/

pub fn prefixes_in_cidr_format(ip_ranges: &IpRanges) {
    for ip_range in ip_ranges.ranges() {
        println!("{}", ip_range.prefix);
    }
}

/*--------------------------------------------------------------------------------------
  Prefixes In Netmask Format
--------------------------------------------------------------------------------------*/

pub fn prefixes_in_netmask_format(ip_ranges: &IpRanges) {
    for ip_range in ip_ranges.ranges() {
        println!("{} {}", ip_range.prefix.network(), ip_range.prefix.mask());
    }
}

/*--------------------------------------------------------------------------------------
  Services
--------------------------------------------------------------------------------------*/

pub fn services(ip_ranges: &IpRanges) {
    for service in ip_ranges.services().iter() {
        println!("{service}");
    }
}
