//! A consumer that aggregates per-type counts and per-key sizes.

use std::io::{self, Write};

use indexmap::IndexMap;

use crate::types::Event;

/// Aggregated figures over one parsed dump.
///
/// Sizes are the sum of wire payload bytes over a key's values, a cheap
/// proxy for the memory the key occupies in a live server.
#[derive(Default)]
pub struct Stats {
    databases: u64,
    counts: IndexMap<&'static str, u64>,
    sizes: IndexMap<String, u64>,
    current_key: Option<String>,
}

impl Stats {
    pub fn new() -> Stats {
        Stats::default()
    }

    pub fn observe(&mut self, event: &Event) {
        match event {
            Event::Database(_) => {
                self.databases += 1;
                self.current_key = None;
            }
            Event::String { key, value } => {
                self.record_key("string", key.to_string());
                self.grow(value.encoded_len());
                self.current_key = None;
            }
            Event::ListStart { key, .. } => self.record_key("list", key.to_string()),
            Event::SetStart { key, .. } => self.record_key("set", key.to_string()),
            Event::SortedSetStart { key, .. } => self.record_key("sortedset", key.to_string()),
            Event::HashStart { key, .. } => self.record_key("hash", key.to_string()),
            Event::ListElement(value) | Event::SetElement(value) => {
                self.grow(value.encoded_len());
            }
            Event::SortedSetElement { value, .. } => {
                // member bytes plus the stored double
                self.grow(value.encoded_len() + 8);
            }
            Event::HashElement { field, value } => {
                self.grow(field.encoded_len() + value.encoded_len());
            }
        }
    }

    fn record_key(&mut self, type_name: &'static str, key: String) {
        *self.counts.entry(type_name).or_insert(0) += 1;
        self.sizes.entry(key.clone()).or_insert(0);
        self.current_key = Some(key);
    }

    fn grow(&mut self, bytes: usize) {
        if let Some(key) = &self.current_key {
            if let Some(size) = self.sizes.get_mut(key) {
                *size += bytes as u64;
            }
        }
    }

    pub fn key_count(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The `limit` largest keys by accumulated size, largest first.
    pub fn top_keys(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .sizes
            .iter()
            .map(|(key, size)| (key.as_str(), *size))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }

    pub fn report<W: Write>(&self, out: &mut W, top: usize) -> io::Result<()> {
        writeln!(
            out,
            "{} keys across {} database(s)",
            self.key_count(),
            self.databases
        )?;

        writeln!(out)?;
        writeln!(out, "Keys per type:")?;
        for (type_name, count) in &self.counts {
            writeln!(out, "  {:<10} {}", type_name, count)?;
        }

        writeln!(out)?;
        writeln!(out, "Top {} keys by size:", top)?;
        for (key, size) in self.top_keys(top) {
            writeln!(out, "  {:>10} B  {}", size, key)?;
        }

        Ok(())
    }
}
