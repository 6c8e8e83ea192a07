use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
  Command Line Interface (CLI) Arguments
-------------------------------------------------------------------------------------------------*/

#[derive(Parser, Debug)]
#[command(author, version, about="Query GitHub IP ranges.", long_about = None)]
pub struct Args {
    /// Include IPv4 prefixes
    #[arg(short = '4', long)]
    pub ipv4: bool,

    /// Include IPv6 prefixes
    #[arg(short = '6', long)]
    pub ipv6: bool,

    /// Include prefixes used by these GitHub services (hooks, web, api, git, actions, ...)
    #[arg(short = 's', long = "service")]
    pub services: Option<Vec<String>>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Read the GitHub meta JSON from this file instead of the API or cache
    #[arg(long = "file")]
    pub file: Option<PathBuf>,

    /// Save the results to a CSV file
    #[arg(long = "csv")]
    pub csv_file: Option<PathBuf>,

    /// Logging verbosity
    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    /// Search CIDRs - find GitHub IP ranges that contain these IP addresses or networks
    pub search_cidrs: Option<Vec<String>>,
}

/*--------------------------------------------------------------------------------------
  Output Format
--------------------------------------------------------------------------------------*/

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Table of IP ranges and their services
    Table,

    /// List of (RFC4632) CIDR-format prefixes
    Cidr,

    /// List of IP networks in network mask format (n.n.n.n m.m.m.m)
    Netmask,

    /// List of the GitHub services in the IP ranges
    Services,
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_verify_args() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "githubipranges",
            "-4",
            "--service",
            "api",
            "-s",
            "git",
            "--output",
            "netmask",
            "192.30.252.1",
        ]);

        assert!(args.ipv4);
        assert!(!args.ipv6);
        assert_eq!(
            args.services,
            Some(vec!["api".to_string(), "git".to_string()])
        );
        assert_eq!(args.output, OutputFormat::Netmask);
        assert_eq!(args.search_cidrs, Some(vec!["192.30.252.1".to_string()]));
    }
}
