use crate::core::errors::PrefixError;
use crate::core::ip_range::IpRange;
use crate::core::ip_ranges::IpRanges;
use arc_swap::ArcSwap;
use log::info;
use std::net::IpAddr;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  Shared IP Ranges
-------------------------------------------------------------------------------------------------*/

/// Shareable handle to the current [IpRanges] snapshot.
///
/// Readers never lock: each query runs against one complete snapshot. A refresh builds the
/// replacement registry off to the side and publishes it with a single atomic swap; in-flight
/// lookups keep the snapshot they started with.
///
/// ```
/// use githubipranges::{IpRanges, SharedIpRanges};
///
/// let shared = SharedIpRanges::new(IpRanges::build_from([("192.30.252.0/22", "api")])?);
/// assert!(shared.is_known("192.30.252.1".parse()?));
///
/// shared.rebuild_from([("140.82.112.0/20", "git")])?;
/// assert!(!shared.is_known("192.30.252.1".parse()?));
/// assert!(shared.is_known("140.82.112.1".parse()?));
/// # Ok::<(), githubipranges::Error>(())
/// ```
#[derive(Debug)]
pub struct SharedIpRanges {
    current: ArcSwap<IpRanges>,
}

impl Default for SharedIpRanges {
    fn default() -> Self {
        Self::new(IpRanges::default())
    }
}

impl SharedIpRanges {
    pub fn new(ip_ranges: IpRanges) -> Self {
        Self {
            current: ArcSwap::from_pointee(ip_ranges),
        }
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<IpRanges> {
        self.current.load_full()
    }

    /// Publish a new snapshot, returning the one it replaced.
    pub fn store(&self, ip_ranges: IpRanges) -> Arc<IpRanges> {
        let ip_ranges = Arc::new(ip_ranges);
        info!("Publishing IP ranges snapshot: {} prefixes", ip_ranges.len());
        self.current.swap(ip_ranges)
    }

    /// Build a new snapshot from `(prefix, service)` pairs and publish it. On error the
    /// current snapshot stays in place.
    pub fn rebuild_from<I, P, S>(&self, entries: I) -> Result<(), PrefixError>
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<str>,
        S: AsRef<str>,
    {
        let ip_ranges = IpRanges::build_from(entries)?;
        self.store(ip_ranges);
        Ok(())
    }

    pub fn is_known(&self, addr: IpAddr) -> bool {
        self.current.load().is_known(addr)
    }

    /// Owned copy of the matching [IpRange]; the snapshot may be replaced after the call.
    pub fn range_for(&self, addr: IpAddr) -> Option<IpRange> {
        self.current.load().range_for(addr).cloned()
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;
    use ipnetwork::IpNetwork;
    use std::thread;

    fn addr(value: &str) -> IpAddr {
        value.parse().unwrap()
    }

    #[test]
    fn test_default_is_empty() {
        let shared = SharedIpRanges::default();
        assert!(shared.load().is_empty());
        assert!(!shared.is_known(addr("192.30.252.1")));
    }

    #[test]
    fn test_store_replaces_snapshot() {
        let shared =
            SharedIpRanges::new(IpRanges::build_from([("192.30.252.0/22", "api")]).unwrap());
        let before = shared.load();

        let replaced = shared.store(IpRanges::build_from([("140.82.112.0/20", "git")]).unwrap());

        assert!(Arc::ptr_eq(&before, &replaced));
        assert!(before.is_known(addr("192.30.252.1"))); // Old snapshot is unchanged
        assert!(!shared.is_known(addr("192.30.252.1")));
        assert_eq!(
            shared.range_for(addr("140.82.112.1")).unwrap().prefix,
            "140.82.112.0/20".parse::<IpNetwork>().unwrap()
        );
    }

    #[test]
    fn test_failed_rebuild_keeps_snapshot() {
        let shared =
            SharedIpRanges::new(IpRanges::build_from([("192.30.252.0/22", "api")]).unwrap());

        let result = shared.rebuild_from([("140.82.112.0/20", "git"), ("bogus", "api")]);

        assert_eq!(
            result,
            Err(PrefixError::MalformedPrefix("bogus".to_string()))
        );
        assert!(shared.is_known(addr("192.30.252.1")));
        assert!(!shared.is_known(addr("140.82.112.1")));
    }

    #[test]
    fn test_concurrent_readers_see_complete_snapshots() {
        let shared = Arc::new(SharedIpRanges::new(
            IpRanges::build_from([("10.0.0.0/8", "api"), ("10.1.0.0/16", "api")]).unwrap(),
        ));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        // Both prefixes are always published together
                        let snapshot = shared.load();
                        let broad = snapshot.range_for(addr("10.2.0.1")).map(|r| r.prefix);
                        let narrow = snapshot.range_for(addr("10.1.0.1")).map(|r| r.prefix);
                        assert_eq!(broad.is_some(), narrow.is_some());
                        if let (Some(broad), Some(narrow)) = (broad, narrow) {
                            assert!(broad.prefix() < narrow.prefix());
                        }
                    }
                })
            })
            .collect();

        for round in 0..100 {
            let service = if round % 2 == 0 { "git" } else { "web" };
            shared
                .rebuild_from([("10.0.0.0/8", service), ("10.1.0.0/16", service)])
                .unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
