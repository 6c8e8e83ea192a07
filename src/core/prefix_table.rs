use crate::core::errors::PrefixError;
use crate::core::prefix_type::PrefixType;
use crate::core::utils;
use ipnetwork::IpNetwork;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::net::IpAddr;

/*-------------------------------------------------------------------------------------------------
  Prefix Table
-------------------------------------------------------------------------------------------------*/

/// Index over IPv4 and IPv6 CIDR prefixes answering longest-prefix-match queries.
///
/// The table is a binary trie stored in an arena of nodes addressed by integer handles. Each
/// stored prefix is the node reached by walking its leading `prefix-length` bits from the root
/// of its address family. A lookup walks the address bits from the most significant bit and
/// keeps the deepest stored prefix on the path, so a lookup visits at most `bits + 1` nodes
/// (33 for IPv4, 129 for IPv6) regardless of how many prefixes are stored.
///
/// Prefixes are canonicalized (host bits masked off) when they are loaded. The table is built
/// once and is read-only afterwards; share it freely between threads when `T` allows.
#[derive(Clone, Debug)]
pub struct PrefixTable<T> {
    nodes: Vec<Node>,
    entries: Vec<(IpNetwork, T)>,
}

type NodeId = usize;

const IPV4_ROOT: NodeId = 0;
const IPV6_ROOT: NodeId = 1;

#[derive(Clone, Debug, Default)]
struct Node {
    children: [Option<NodeId>; 2],
    entry: Option<usize>,
}

/*--------------------------------------------------------------------------------------
  Prefix Table Implementation
--------------------------------------------------------------------------------------*/

impl<T> Default for PrefixTable<T> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default(), Node::default()],
            entries: Vec::new(),
        }
    }
}

impl<T> PrefixTable<T> {
    /*-------------------------------------------------------------------------
      Build
    -------------------------------------------------------------------------*/

    /// Bulk-load a table from `(prefix, value)` entries.
    ///
    /// Fails with [PrefixError::DuplicatePrefix] when two entries share a canonical prefix;
    /// merge duplicates before loading. An empty input builds a table that never matches.
    ///
    /// ```
    /// use githubipranges::PrefixTable;
    ///
    /// let table = PrefixTable::build([
    ///     ("10.0.0.0/8".parse()?, "broad"),
    ///     ("10.1.0.0/16".parse()?, "narrow"),
    /// ])?;
    ///
    /// let (prefix, value) = table.lookup("10.1.2.3".parse()?).unwrap();
    /// assert_eq!(prefix.to_string(), "10.1.0.0/16");
    /// assert_eq!(*value, "narrow");
    /// # Ok::<(), githubipranges::Error>(())
    /// ```
    pub fn build<I>(entries: I) -> Result<Self, PrefixError>
    where
        I: IntoIterator<Item = (IpNetwork, T)>,
    {
        let mut table = Self::default();
        for (prefix, value) in entries {
            if let Err((prefix, _)) = table.insert(prefix, value) {
                return Err(PrefixError::DuplicatePrefix(prefix));
            }
        }
        debug!(
            "Built prefix table: {} prefixes, {} nodes",
            table.entries.len(),
            table.nodes.len()
        );
        Ok(table)
    }

    /// Load a table from a map whose keys are already canonical (and therefore unique).
    pub(crate) fn from_map(map: BTreeMap<IpNetwork, T>) -> Self {
        let mut table = Self::default();
        for (prefix, value) in map {
            if let Err((prefix, _)) = table.insert(prefix, value) {
                warn!("Skipping non-canonical duplicate prefix: {prefix}");
            }
        }
        table
    }

    /// Insert a prefix; hands the entry back when its canonical prefix is already stored.
    fn insert(&mut self, prefix: IpNetwork, value: T) -> Result<(), (IpNetwork, T)> {
        let prefix = utils::ipnetwork::network_prefix(&prefix);
        let bits = utils::ipnetwork::network_bits(&prefix);

        let mut node = root(PrefixType::of_network(&prefix));
        for depth in 0..prefix.prefix() {
            let bit = utils::ipnetwork::bit_at(bits, depth);
            node = match self.nodes[node].children[bit] {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children[bit] = Some(child);
                    child
                }
            };
        }

        if self.nodes[node].entry.is_some() {
            return Err((prefix, value));
        }
        self.nodes[node].entry = Some(self.entries.len());
        self.entries.push((prefix, value));
        Ok(())
    }

    /*-------------------------------------------------------------------------
      Getters
    -------------------------------------------------------------------------*/

    /// Number of stored prefixes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored `(prefix, value)` entries in load order.
    pub fn iter(&self) -> impl Iterator<Item = (&IpNetwork, &T)> {
        self.entries.iter().map(|(prefix, value)| (prefix, value))
    }

    /*-------------------------------------------------------------------------
      Queries
    -------------------------------------------------------------------------*/

    /// Most specific stored prefix containing `addr`, with its value.
    pub fn lookup(&self, addr: IpAddr) -> Option<(&IpNetwork, &T)> {
        let prefix_type = PrefixType::of_addr(&addr);
        let matches = Matches {
            table: self,
            prefix_type,
            bits: utils::ipnetwork::addr_bits(&addr),
            depth: 0,
            max_depth: prefix_type.bits(),
            node: Some(root(prefix_type)),
        };
        matches.last()
    }

    /// Whether any stored prefix contains `addr`.
    pub fn contains(&self, addr: IpAddr) -> bool {
        self.lookup(addr).is_some()
    }

    /// Most specific stored prefix that is equal to or a supernet of `network`.
    pub fn longest_match(&self, network: &IpNetwork) -> Option<(&IpNetwork, &T)> {
        self.matches(network).last()
    }

    /// Every stored prefix that is equal to or a supernet of `network`, least specific first.
    pub fn matches(&self, network: &IpNetwork) -> Matches<'_, T> {
        let prefix_type = PrefixType::of_network(network);
        Matches {
            table: self,
            prefix_type,
            bits: utils::ipnetwork::network_bits(network),
            depth: 0,
            max_depth: network.prefix(),
            node: Some(root(prefix_type)),
        }
    }

    /// Stored entry for exactly `prefix` (after canonicalization).
    pub fn get(&self, prefix: &IpNetwork) -> Option<&T> {
        let prefix = utils::ipnetwork::network_prefix(prefix);
        self.matches(&prefix)
            .last()
            .filter(|(found, _)| **found == prefix)
            .map(|(_, value)| value)
    }
}

fn root(prefix_type: PrefixType) -> NodeId {
    match prefix_type {
        PrefixType::IPv4 => IPV4_ROOT,
        PrefixType::IPv6 => IPV6_ROOT,
    }
}

/*--------------------------------------------------------------------------------------
  Matches Iterator
--------------------------------------------------------------------------------------*/

/// Iterator over the stored prefixes along a trie walk; see [PrefixTable::matches].
#[derive(Debug)]
pub struct Matches<'t, T> {
    table: &'t PrefixTable<T>,
    prefix_type: PrefixType,
    bits: u128,
    depth: u8,
    max_depth: u8,
    node: Option<NodeId>,
}

impl<'t, T> Iterator for Matches<'t, T> {
    type Item = (&'t IpNetwork, &'t T);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node_id) = self.node {
            let node = &self.table.nodes[node_id];

            self.node = if self.depth < self.max_depth {
                let bit = utils::ipnetwork::bit_at(self.bits, self.depth);
                self.depth += 1;
                node.children[bit]
            } else {
                None
            };

            if let Some(index) = node.entry {
                let (prefix, value) = &self.table.entries[index];
                debug_assert_eq!(
                    PrefixType::of_network(prefix),
                    self.prefix_type,
                    "address family mismatch in prefix table walk"
                );
                return Some((prefix, value));
            }
        }
        None
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
