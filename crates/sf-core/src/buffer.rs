use crate::record::DisplayRecord;
use std::collections::VecDeque;

pub const FEED_CAPACITY: usize = 8;

/// The most recent display records, oldest first.
#[derive(Debug, Clone)]
pub struct FeedBuffer {
    records: VecDeque<DisplayRecord>,
    capacity: usize,
    sealed: bool,
}

impl FeedBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity + 1),
            capacity,
            sealed: false,
        }
    }

    /// Appends and evicts from the front down to capacity. Returns `false`
    /// without touching the buffer once it has been sealed.
    pub fn append(&mut self, record: DisplayRecord) -> bool {
        if self.sealed {
            return false;
        }
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
        true
    }

    pub fn records(&self) -> impl Iterator<Item = &DisplayRecord> {
        self.records.iter()
    }

    pub fn to_vec(&self) -> Vec<DisplayRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

impl Default for FeedBuffer {
    fn default() -> Self {
        Self::new(FEED_CAPACITY)
    }
}
