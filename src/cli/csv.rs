use githubipranges::{IpRanges, Result};
use std::path::Path;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  Save GitHub IP Ranges to CSV File
-------------------------------------------------------------------------------------------------*/

pub fn save(ip_ranges: &IpRanges, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    // Write header
    writer.serialize(["IP Prefix", "Services"])?;

    // Write range records
    for ip_range in ip_ranges.ranges() {
        let record = (
            &ip_range.prefix,
            ip_range
                .services
                .iter()
                .cloned()
                .collect::<Vec<Arc<str>>>()
                .join(", "),
        );
        writer.serialize(record)?;
    }

    writer.flush()?;

    Ok(())
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_save() {
        let ip_ranges = IpRanges::build_from([
            ("192.30.252.0/22", "hooks"),
            ("192.30.252.0/22", "api"),
            ("2a0a:a440::/29", "git"),
        ])
        .unwrap();

        let scratch = TempDir::new().unwrap();
        let path = scratch.path().join("ranges.csv");
        save(&ip_ranges, &path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "IP Prefix,Services\n192.30.252.0/22,\"api, hooks\"\n2a0a:a440::/29,git\n"
        );
    }
}
