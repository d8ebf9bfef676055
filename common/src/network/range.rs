//! # Address Specification Expansion
//!
//! Turns the textual scan specification into the concrete addresses to
//! probe. A specification is a comma-separated list of tokens; each token is
//! either a single IPv4/IPv6 literal or an inclusive `low-high` range.
//!
//! Both families are widened to a 128-bit unsigned value so one iteration
//! algorithm covers IPv4 and IPv6 ranges alike. Expansion is lazy: the
//! producer interleaves it with task dispatch instead of materializing the
//! whole set up front.
//!
//! Malformed tokens never abort the rest of the specification; they are
//! logged and skipped.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::warn;

/// An inclusive span of addresses within one family, iterated in ascending
/// numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    next: Option<u128>,
    end: u128,
    v6: bool,
}

impl IpRange {
    pub fn new(start: IpAddr, end: IpAddr) -> Option<Self> {
        let v6 = match (start, end) {
            (IpAddr::V4(_), IpAddr::V4(_)) => false,
            (IpAddr::V6(_), IpAddr::V6(_)) => true,
            _ => return None,
        };
        let start = to_numeric(start);
        let end_n = to_numeric(end);
        Some(Self {
            next: (start <= end_n).then_some(start),
            end: end_n,
            v6,
        })
    }

    pub fn single(addr: IpAddr) -> Self {
        let n = to_numeric(addr);
        Self {
            next: Some(n),
            end: n,
            v6: addr.is_ipv6(),
        }
    }

    /// Number of addresses the range will yield.
    pub fn len(&self) -> u128 {
        match self.next {
            Some(next) => self.end - next + 1,
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_none()
    }
}

impl Iterator for IpRange {
    type Item = IpAddr;

    fn next(&mut self) -> Option<IpAddr> {
        let current = self.next?;
        self.next = if current < self.end {
            // cannot wrap below end, but the guard keeps u128::MAX safe
            current.checked_add(1)
        } else {
            None
        };
        Some(from_numeric(current, self.v6))
    }
}

fn to_numeric(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u32::from(v4) as u128,
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn from_numeric(value: u128, v6: bool) -> IpAddr {
    if v6 {
        IpAddr::V6(Ipv6Addr::from(value))
    } else {
        IpAddr::V4(Ipv4Addr::from(value as u32))
    }
}

/// Lazily expands a scan specification into the addresses it names.
///
/// `max_range` caps how many addresses a single range token may span;
/// oversized tokens are rejected with a warning rather than expanded.
pub fn expand(spec: &str, max_range: u128) -> impl Iterator<Item = IpAddr> + '_ {
    spec.split(',')
        .filter_map(move |token| parse_token(token.trim(), max_range))
        .flatten()
}

fn parse_token(token: &str, max_range: u128) -> Option<IpRange> {
    if token.is_empty() {
        return None;
    }
    match token.split_once('-') {
        Some((low, high)) => parse_range(token, low.trim(), high.trim(), max_range),
        None => match token.parse::<IpAddr>() {
            Ok(addr) => Some(IpRange::single(addr)),
            Err(_) => {
                warn!("invalid IP address {token}, skipping");
                None
            }
        },
    }
}

fn parse_range(token: &str, low: &str, high: &str, max_range: u128) -> Option<IpRange> {
    let (Ok(low), Ok(high)) = (low.parse::<IpAddr>(), high.parse::<IpAddr>()) else {
        warn!("invalid IP address in range {token}, skipping");
        return None;
    };
    let Some(range) = IpRange::new(low, high) else {
        warn!("range {token} mixes IPv4 and IPv6 endpoints, skipping");
        return None;
    };
    if range.is_empty() {
        warn!("range {token} ends before it starts, skipping");
        return None;
    }
    if range.len() > max_range {
        warn!(
            "range {token} spans {} addresses, over the {max_range} limit; skipping \
             (raise --max-range to scan it anyway)",
            range.len()
        );
        return None;
    }
    Some(range)
}
