use ipnetwork::IpNetwork;
use thiserror::Error as ThisError;

/*-------------------------------------------------------------------------------------------------
  Errors and Results
-------------------------------------------------------------------------------------------------*/

// Error type alias used by the client, JSON, filter, and CLI layers.
pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

// Result type alias used by the client, JSON, filter, and CLI layers.
pub type Result<T> = std::result::Result<T, Error>;

/*--------------------------------------------------------------------------------------
  Prefix Errors
--------------------------------------------------------------------------------------*/

/// Errors raised while building a [PrefixTable](crate::PrefixTable) or an
/// [IpRanges](crate::IpRanges) registry. A failed build never publishes a partial table.
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PrefixError {
    /// The text is not a CIDR literal for IPv4 or IPv6.
    #[error("Malformed prefix: {0:?}")]
    MalformedPrefix(String),

    /// Two entries share the same canonical prefix and were not merged before the build.
    #[error("Duplicate prefix: {0}")]
    DuplicatePrefix(IpNetwork),

    /// A service name was empty.
    #[error("Empty service name for prefix: {0:?}")]
    EmptyServiceName(String),
}

/*--------------------------------------------------------------------------------------
  Log Error Function
--------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) fn log_error(error: &Error) {
    log::error!("{}", error);
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_error_messages() {
        let malformed = PrefixError::MalformedPrefix("10.0.0.0/33".to_string());
        assert_eq!(malformed.to_string(), r#"Malformed prefix: "10.0.0.0/33""#);

        let duplicate = PrefixError::DuplicatePrefix("10.0.0.0/8".parse().unwrap());
        assert_eq!(duplicate.to_string(), "Duplicate prefix: 10.0.0.0/8");
    }

    #[test]
    fn test_prefix_error_into_boxed_error() {
        let error: Error = PrefixError::EmptyServiceName("10.0.0.0/8".to_string()).into();
        assert_eq!(
            error.downcast_ref::<PrefixError>(),
            Some(&PrefixError::EmptyServiceName("10.0.0.0/8".to_string()))
        );
    }
}
