//! Records: a block together with its payload.

use ipnet::Ipv4Net;
use serde::Serialize;
use std::fmt;

use crate::cidr::{range_to_cidrs, Cidr};
use crate::payload::Payload;

/// A CIDR block bound to a payload.
///
/// Records are what goes into [`Tree::add_record`](crate::Tree::add_record)
/// and what comes out of [`Tree::records`](crate::Tree::records).
#[derive(Debug, Clone, PartialEq)]
pub struct Record<P> {
    cidr: Cidr,
    payload: P,
}

impl<P> Record<P> {
    /// Create a record from a canonical block.
    pub fn new(cidr: Cidr, payload: P) -> Self {
        Self { cidr, payload }
    }

    /// Create a record from an `ipnet` network, dropping host bits.
    pub fn from_net(net: Ipv4Net, payload: P) -> Self {
        Self::new(Cidr::from(net), payload)
    }

    /// Cover the inclusive range `[low, high]` with the minimal set of
    /// records, all carrying a copy of `payload`.
    ///
    /// # Examples
    /// ```
    /// use geotrie::Record;
    ///
    /// let records = Record::from_range(0xC0A8_0002, 0xC0A8_000A, ());
    /// assert_eq!(records.len(), 4);
    /// assert_eq!(records[0].to_string(), "192.168.0.2/31 (-)");
    /// ```
    pub fn from_range(low: u32, high: u32, payload: P) -> Vec<Self>
    where
        P: Clone,
    {
        range_to_cidrs(low, high)
            .into_iter()
            .map(|cidr| Self::new(cidr, payload.clone()))
            .collect()
    }

    pub fn cidr(&self) -> Cidr {
        self.cidr
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_parts(self) -> (Cidr, P) {
        (self.cidr, self.payload)
    }
}

impl<P: Payload> fmt::Display for Record<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.cidr, self.payload.render())
    }
}

/// Serializable view of a record, used for JSON dumps.
#[derive(Debug, Serialize)]
pub struct RecordView {
    pub cidr: String,
    pub payload: String,
}

impl<P: Payload> From<&Record<P>> for RecordView {
    fn from(record: &Record<P>) -> Self {
        Self {
            cidr: record.cidr.to_string(),
            payload: record.payload.render(),
        }
    }
}
