//! Streaming parser for Redis RDB snapshot files (format versions 1–6).
//!
//! The parser reads the dump once, front to back, and yields decoded
//! records as an ordered sequence of [`Event`]s. Composite values (lists,
//! sets, hashes, sorted sets) are announced by a `*Start` event carrying
//! the declared length, followed by one event per element; a `Database`
//! event precedes all records of the selected database. Version 5+ files
//! are verified against their CRC64 trailer.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() -> rdbstream::RdbResult<()> {
//! let file = File::open("dump.rdb")?;
//! let parser = rdbstream::parse(BufReader::new(file), rdbstream::filter::Simple::new())?;
//!
//! for event in parser {
//!     match event? {
//!         rdbstream::Event::String { key, value } => println!("{} -> {}", key, value),
//!         other => println!("{:?}", other),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Consumers that only care about some event kinds can say so up front
//! with [`filter::Simple::add_kind`]; everything else is decoded but never
//! yielded.

use std::io::Read;

pub mod checksum;
pub mod constants;
pub mod filter;
pub mod parser;
pub mod stats;
pub mod types;

pub use filter::Subscription;
pub use parser::RdbParser;
pub use stats::Stats;
pub use types::{Event, EventKind, Key, RdbError, RdbOk, RdbResult, RdbString};

/// Builds a parser over `input`, verifying the header eagerly.
///
/// `subscription` selects the event kinds the iterator will yield.
pub fn parse<R: Read, S: Subscription>(input: R, subscription: S) -> RdbResult<RdbParser<R, S>> {
    RdbParser::new(input, subscription)
}
