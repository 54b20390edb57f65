//! CIDR aggregation for compacting rulesets.
//!
//! Merges a set of CIDR blocks into the minimal list of blocks covering
//! exactly the same addresses. IPv4 and IPv6 are aggregated independently
//! and never merged across families.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::warn;

/// Parse raw entry strings into CIDR blocks.
///
/// Entries that are not valid CIDR notation are reported and skipped;
/// a bad literal never aborts the run.
pub fn parse_cidr_entries(entries: &[String]) -> Vec<IpNet> {
    entries
        .iter()
        .filter_map(|entry| match entry.parse::<IpNet>() {
            Ok(net) => Some(net),
            Err(_) => {
                warn!("Skipping invalid CIDR entry: {}", entry);
                None
            }
        })
        .collect()
}

/// Aggregate a list of CIDR blocks into their minimal covering form.
///
/// Blocks are normalized to their true network address first, so entries
/// with host bits set (e.g. 10.0.0.1/24) fold into their block. Contained
/// blocks are absorbed and adjacent sibling blocks collapse into their
/// parent, repeatedly, until no further merge applies. For example:
/// [192.168.0.0/25, 192.168.0.128/25] -> [192.168.0.0/24]
pub fn aggregate(nets: &[IpNet]) -> Vec<IpNet> {
    let mut v4: Vec<(u128, u8)> = Vec::new();
    let mut v6: Vec<(u128, u8)> = Vec::new();

    for net in nets {
        match net.trunc() {
            IpNet::V4(n) => v4.push((u128::from(u32::from(n.network())), n.prefix_len())),
            IpNet::V6(n) => v6.push((u128::from(n.network()), n.prefix_len())),
        }
    }

    let v4 = merge_to_fixpoint(v4, 32);
    let v6 = merge_to_fixpoint(v6, 128);

    let mut result: Vec<IpNet> = v4
        .into_iter()
        .filter_map(|(base, prefix)| {
            Ipv4Net::new(Ipv4Addr::from(base as u32), prefix).ok()
        })
        .map(IpNet::V4)
        .collect();
    result.extend(
        v6.into_iter()
            .filter_map(|(base, prefix)| Ipv6Net::new(Ipv6Addr::from(base), prefix).ok())
            .map(IpNet::V6),
    );
    result
}

/// Mask covering the host bits of a block with the given prefix length.
fn host_mask(prefix: u8, max_prefix: u8) -> u128 {
    let host_bits = u32::from(max_prefix - prefix);
    if host_bits == 0 {
        0
    } else {
        u128::MAX >> (128 - host_bits)
    }
}

fn block_end(base: u128, prefix: u8, max_prefix: u8) -> u128 {
    base + host_mask(prefix, max_prefix)
}

/// Repeatedly sort and merge until a full pass performs no collapse.
///
/// A single left-to-right pass absorbs contained blocks and collapses
/// equal-length siblings, but a collapse can create a parent whose own
/// sibling was already emitted earlier in the pass. Re-running the pass
/// after any collapse closes those cascades; each collapse strictly
/// reduces the entry count, so the loop terminates.
fn merge_to_fixpoint(mut ranges: Vec<(u128, u8)>, max_prefix: u8) -> Vec<(u128, u8)> {
    loop {
        // Tuple order is (base ascending, prefix ascending): for an equal
        // base the widest block comes first and absorbs the rest.
        ranges.sort_unstable();
        ranges.dedup();

        let mut collapsed = false;
        let mut merged: Vec<(u128, u8)> = Vec::with_capacity(ranges.len());

        for cand in ranges {
            match merged.last_mut() {
                None => merged.push(cand),
                Some(cur) => {
                    let cur_end = block_end(cur.0, cur.1, max_prefix);
                    if cand.0 >= cur.0 && block_end(cand.0, cand.1, max_prefix) <= cur_end {
                        // Contained in the current block.
                        collapsed = true;
                    } else if cand.1 == cur.1
                        && cur.1 > 0
                        && cur.0 & host_mask(cur.1 - 1, max_prefix) == 0
                        && cand.0 == cur_end + 1
                    {
                        // Lower sibling followed by its upper sibling.
                        cur.1 -= 1;
                        collapsed = true;
                    } else {
                        merged.push(cand);
                    }
                }
            }
        }

        ranges = merged;
        if !collapsed {
            return ranges;
        }
    }
}

/// Calculate the total number of individual IPs covered by a list of CIDRs.
///
/// Uses saturating arithmetic to prevent overflow on large prefixes like /0.
pub fn count_ips(nets: &[IpNet]) -> u128 {
    nets.iter()
        .map(|net| {
            let prefix_len = net.prefix_len();
            let max_prefix = match net {
                IpNet::V4(_) => 32,
                IpNet::V6(_) => 128,
            };
            let shift = max_prefix - prefix_len;
            if shift >= 128 {
                u128::MAX
            } else {
                1u128 << shift
            }
        })
        .fold(0u128, |acc, count| acc.saturating_add(count))
}
