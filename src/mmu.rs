// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;

use crate::error::VmError;

const PAGE_SIZE: usize = 512;
const PAGE_MASK: i64 = 0x1ff;

macro_rules! page_index {
    ($i: expr) => {{
        #[allow(clippy::cast_sign_loss, reason = "masked down anyway")]
        {
            ($i & PAGE_MASK) as usize
        }
    }};
}

/// Sparse, paged Intcode memory.
///
/// Addresses are split into 512-word pages, each allocated the first time any address inside it
/// is read or written. An address that was never written reads as `0`, and reading it makes its
/// page resident, so later reads of the same address are plain lookups.
///
/// Negative addresses are rejected with [`VmError::AddressFault`].
pub struct Memory {
    pages: HashMap<i64, Box<[i64; PAGE_SIZE]>>,
}

static EMPTY: [i64; PAGE_SIZE] = [0; PAGE_SIZE];

/// Addresses at or above this are too far out for [`Memory::snapshot`]
pub const SNAPSHOT_LIMIT: i64 = 1 << 24;

fn check(address: i64) -> Result<i64, VmError> {
    if address < 0 {
        Err(VmError::AddressFault { address })
    } else {
        Ok(address)
    }
}

impl Memory {
    /// Create an empty memory, where every address reads as `0`
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    /// Read the value at `address`, materializing it as `0` if it was never set
    pub fn load(&mut self, address: i64) -> Result<i64, VmError> {
        let address = check(address)?;
        Ok(self.page_mut(address)[page_index!(address)])
    }

    /// Write `value` to `address`
    pub fn store(&mut self, address: i64, value: i64) -> Result<(), VmError> {
        let address = check(address)?;
        self.page_mut(address)[page_index!(address)] = value;
        Ok(())
    }

    /// Read the value at `address` without materializing anything
    pub fn peek(&self, address: i64) -> Result<i64, VmError> {
        let address = check(address)?;
        Ok(self
            .pages
            .get(&(address & !PAGE_MASK))
            .map_or(0, |page| page[page_index!(address)]))
    }

    /// Whether `address` lies in a page that has been read or written
    pub fn is_resident(&self, address: i64) -> bool {
        address >= 0 && self.pages.contains_key(&(address & !PAGE_MASK))
    }

    /// Number of resident pages
    pub fn resident_pages(&self) -> usize {
        self.pages.len()
    }

    /// Base addresses of the pages holding anything other than zeroes, in ascending order
    fn active_pages(&self) -> Vec<i64> {
        self.pages
            .iter()
            .filter(|(_, page)| page.as_ref() != &EMPTY)
            .map(|(&base, _)| base)
            .sorted_unstable()
            .collect()
    }

    /// Copy out the contents from `0` up to and including the highest non-zero address.
    ///
    /// Returns [`None`] if that address is [`SNAPSHOT_LIMIT`] or higher, as a sparse memory can
    /// hold values far beyond what fits in one contiguous buffer.
    pub fn snapshot(&self) -> Option<Vec<i64>> {
        let Some(&last_page) = self.active_pages().last() else {
            return Some(Vec::new());
        };
        if last_page >= SNAPSHOT_LIMIT {
            return None;
        }
        let mut out = Vec::with_capacity(usize::try_from(last_page).ok()? + PAGE_SIZE);
        for base in (0..=last_page).step_by(PAGE_SIZE) {
            out.extend_from_slice(self.pages.get(&base).map_or(&EMPTY, |p| p.as_ref()));
        }
        while out.last() == Some(&0) {
            out.pop();
        }
        Some(out)
    }

    fn page_mut(&mut self, address: i64) -> &mut [i64; PAGE_SIZE] {
        self.pages
            .entry(address & !PAGE_MASK)
            .or_insert_with(|| Box::new([0; PAGE_SIZE]))
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::iter::FromIterator<i64> for Memory {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut pages = HashMap::with_capacity(iter.size_hint().0.div_ceil(PAGE_SIZE));
        let mut base = 0;

        for chunk in &iter.chunks(PAGE_SIZE) {
            let mut page = Box::new([0; PAGE_SIZE]);
            for (slot, value) in page.iter_mut().zip(chunk) {
                *slot = value;
            }
            pages.insert(base, page);
            base += PAGE_SIZE as i64;
        }

        Self { pages }
    }
}

impl Clone for Memory {
    fn clone(&self) -> Self {
        // blank pages carry no information
        let pages = self
            .pages
            .iter()
            .filter(|&(_, page)| page.as_ref() != &EMPTY)
            .map(|(&base, page)| (base, page.clone()))
            .collect();
        Self { pages }
    }
}

impl PartialEq for Memory {
    fn eq(&self, other: &Self) -> bool {
        let active_pages = self.active_pages();
        other.active_pages() == active_pages
            && active_pages
                .into_iter()
                .all(|base| self.pages[&base] == other.pages[&base])
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = fmt.debug_map();
        for base in self.active_pages() {
            map.entry(
                &format_args!("{{ page 0x{base:04x} }}"),
                &format_args!("{:?}", self.pages[&base]),
            );
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_addresses_fault() {
        let mut mem: Memory = [1, 2, 3].into_iter().collect();
        for address in [-1, -512, i64::MIN] {
            assert_eq!(mem.load(address), Err(VmError::AddressFault { address }));
            assert_eq!(mem.store(address, 7), Err(VmError::AddressFault { address }));
            assert!(!mem.is_resident(address));
        }
    }

    #[test]
    fn unset_reads_are_zero_and_materialize() {
        let mut mem = Memory::new();
        assert!(!mem.is_resident(5000));
        assert_eq!(mem.load(5000), Ok(0));
        assert!(mem.is_resident(5000));
        assert_eq!(mem.resident_pages(), 1);
        assert_eq!(mem.load(5000), Ok(0));
        assert_eq!(mem.resident_pages(), 1);
        assert_eq!(mem.snapshot(), Some(Vec::new()));
    }

    #[test]
    fn peek_does_not_materialize() {
        let mem = Memory::new();
        assert_eq!(mem.peek(1 << 40), Ok(0));
        assert_eq!(mem.resident_pages(), 0);
    }

    #[test]
    fn stores_cross_pages() {
        let mut mem: Memory = (0..600).collect();
        assert_eq!(mem.load(511), Ok(511));
        assert_eq!(mem.load(512), Ok(512));
        mem.store(2000, -4).unwrap();
        assert_eq!(mem.load(2000), Ok(-4));
        let snapshot = mem.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2001);
        assert_eq!(snapshot[599], 599);
        assert_eq!(snapshot[600], 0);
        assert_eq!(snapshot[2000], -4);
    }

    #[test]
    fn clone_skips_blank_pages() {
        let mut mem: Memory = [1, 2].into_iter().collect();
        mem.load(100_000).unwrap();
        let cloned = mem.clone();
        assert_eq!(cloned.resident_pages(), 1);
        assert_eq!(cloned, mem);
    }

    #[test]
    fn far_addresses_compare_by_page() {
        let mut mem: Memory = [1, 2].into_iter().collect();
        mem.store(1 << 60, 1).unwrap();
        let mut other = mem.clone();
        assert_eq!(other, mem);
        assert_eq!(mem.snapshot(), None);

        other.store(1 << 60, 2).unwrap();
        assert_ne!(other, mem);
        other.store(1 << 60, 0).unwrap();
        assert_ne!(other, mem);
        // a blank page is the same as no page at all
        mem.store(1 << 60, 0).unwrap();
        assert_eq!(other, mem);
        assert_eq!(mem.snapshot(), Some(vec![1, 2]));
    }
}
