use crate::core::errors::Result;
use crate::core::ip_range::IpRange;
use crate::core::ip_ranges::IpRanges;
use crate::core::prefix_type::PrefixType;
use log::trace;
use std::collections::BTreeSet;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  FilterBuilder
-------------------------------------------------------------------------------------------------*/

/// Builder used to construct a [Filter] object with the desired filter parameters.
#[derive(Debug)]
pub struct FilterBuilder<'a> {
    ip_ranges: &'a IpRanges,

    prefix_type: Option<PrefixType>,
    services: Option<BTreeSet<Arc<str>>>,
}

/*--------------------------------------------------------------------------------------
  Filter Builder Implementation
--------------------------------------------------------------------------------------*/

impl<'a> FilterBuilder<'a> {
    /// Create a new [FilterBuilder] object for an [IpRanges] object. By default, no filter
    /// parameters are set. Set the desired filter parameters using the builder methods and
    /// then call the [FilterBuilder::build] method to create the [Filter] object.
    ///
    /// ```rust
    /// # fn main() -> githubipranges::Result<()> {
    /// # let ip_ranges = githubipranges::IpRanges::build_from([("192.30.252.0/22", "api")])?;
    /// let filter = githubipranges::FilterBuilder::new(&ip_ranges)
    ///     .ipv4()
    ///     .services(["api"])?
    ///     .build();
    /// assert_eq!(ip_ranges.filter(&filter).len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(ip_ranges: &'a IpRanges) -> Self {
        Self {
            ip_ranges,
            prefix_type: None,
            services: None,
        }
    }

    /*-------------------------------------------------------------------------
      Setters
    -------------------------------------------------------------------------*/

    /// Include IPv4 prefixes.
    pub fn ipv4(mut self) -> Self {
        self.prefix_type = match self.prefix_type {
            None => Some(PrefixType::IPv4),
            Some(PrefixType::IPv4) => Some(PrefixType::IPv4),

            // Include both IPv4 and IPv6 by removing the filter
            Some(PrefixType::IPv6) => None,
        };
        self
    }

    /// Include IPv6 prefixes.
    pub fn ipv6(mut self) -> Self {
        self.prefix_type = match self.prefix_type {
            None => Some(PrefixType::IPv6),
            Some(PrefixType::IPv6) => Some(PrefixType::IPv6),

            // Include both IPv4 and IPv6 by removing the filter
            Some(PrefixType::IPv4) => None,
        };
        self
    }

    /// Include IP ranges used by the provided services.
    pub fn services<I, S>(mut self, services: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let services: Result<BTreeSet<Arc<str>>> = services
            .into_iter()
            .map(|service| {
                self.ip_ranges
                    .get_service(service.as_ref())
                    .ok_or(format!("Invalid service: {}", service.as_ref()).into())
            })
            .collect();
        self.services = Some(services?);
        Ok(self)
    }

    /*-------------------------------------------------------------------------
      Build Method
    -------------------------------------------------------------------------*/

    /// Build the [Filter] object with the provided filter parameters.
    pub fn build(self) -> Filter {
        Filter {
            prefix_type: self.prefix_type,
            services: self.services,
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Filter
-------------------------------------------------------------------------------------------------*/

/// Filter used to include IP ranges based on the prefix type (IPv4/IPv6) and the services
/// associated with the ranges. Use the [FilterBuilder] to construct a [Filter] object.
#[derive(Debug, Default)]
pub struct Filter {
    /// Only include IPv4 or IPv6 IP ranges.
    prefix_type: Option<PrefixType>,

    /// Include IP ranges used by these services.
    services: Option<BTreeSet<Arc<str>>>,
}

/*--------------------------------------------------------------------------------------
  Filter Implementation
--------------------------------------------------------------------------------------*/

impl Filter {
    /*-------------------------------------------------------------------------
      Getters
    -------------------------------------------------------------------------*/

    /// Check if the filter includes IPv4 prefixes.
    pub fn ipv4(&self) -> bool {
        match self.prefix_type {
            None => true, // No prefix type filter includes all prefix types
            Some(prefix_type) => prefix_type.is_ipv4(),
        }
    }

    /// Check if the filter includes IPv6 prefixes.
    pub fn ipv6(&self) -> bool {
        match self.prefix_type {
            None => true, // No prefix type filter includes all prefix types
            Some(prefix_type) => prefix_type.is_ipv6(),
        }
    }

    /// Services included in the filter.
    pub fn services(&self) -> Option<&BTreeSet<Arc<str>>> {
        self.services.as_ref()
    }

    /*-------------------------------------------------------------------------
      Filter Functions
    -------------------------------------------------------------------------*/

    pub(crate) fn match_prefix_type(&self, ip_range: &IpRange) -> bool {
        if let Some(prefix_type) = self.prefix_type {
            PrefixType::of_network(&ip_range.prefix) == prefix_type
        } else {
            // No prefix type filter includes all prefix types
            true
        }
    }

    pub(crate) fn match_services(&self, ip_range: &IpRange) -> bool {
        if let Some(filter_services) = &self.services {
            filter_services
                .intersection(&ip_range.services)
                .next()
                .is_some()
        } else {
            trace!("No `services` filter");
            true
        }
    }

    pub(crate) fn include_range(&self, ip_range: &IpRange) -> bool {
        let filters = [Filter::match_prefix_type, Filter::match_services];
        filters.iter().all(|filter| filter(self, ip_range))
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
