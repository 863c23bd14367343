use comfy_table::presets::NOTHING;
use comfy_table::*;
use googleapiips::{PrefixSet, SyncReport};
use ipnetwork::IpNetwork;

/*-------------------------------------------------------------------------------------------------
  Output Functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Ranges In CIDR Format
--------------------------------------------------------------------------------------*/

pub fn ranges_in_cidr_format(ranges: &[IpNetwork]) {
    for range in ranges {
        println!("{range}");
    }
}

/*--------------------------------------------------------------------------------------
  Summary
--------------------------------------------------------------------------------------*/

pub fn summary(report: &SyncReport) {
    let ipv4_count = report.ranges.iter().filter(|range| range.is_ipv4()).count();
    let ipv6_count = report.ranges.len() - ipv4_count;
    let ranges = PrefixSet::from_networks(&report.ranges);

    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![Cell::new(ipv4_count), Cell::new("IPv4 CIDR blocks")]);
    table.add_row(vec![
        Cell::new(ranges.ipv4_address_count()),
        Cell::new("IPv4 addresses"),
    ]);
    table.add_row(vec![Cell::new(ipv6_count), Cell::new("IPv6 CIDR blocks")]);

    if let Some(ips_file) = &report.ips_file {
        table.add_row(vec![
            Cell::new(ips_file.display()).add_attribute(Attribute::Bold),
            Cell::new("IPs file"),
        ]);
    }

    if let Some(outcome) = report.alias_outcome {
        table.add_row(vec![
            Cell::new(outcome).add_attribute(Attribute::Bold).fg(Color::Green),
            Cell::new("Alias"),
        ]);
    }

    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    println!("{table}");
}
