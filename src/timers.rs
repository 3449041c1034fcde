//! Timer Wheels (component G): two min-heaps keyed on simulation seconds,
//! one for scheduled match ends and one for cooldown (between-match) end.
//! Both drain every tick by popping all entries with key <= now.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::player::{DatacenterId, PlayerId};

/// A match committed by the Match Assembler, alive until its scheduled
/// end time.
#[derive(Clone, Debug)]
pub struct Match {
    pub end_time: u64,
    pub datacenter_id: DatacenterId,
    pub players: Vec<PlayerId>,
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.end_time == other.end_time
    }
}
impl Eq for Match {}

impl PartialOrd for Match {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Match {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap (a max-heap) pops the earliest end_time first.
        other.end_time.cmp(&self.end_time)
    }
}

/// A min-heap of [`Match`]es, keyed on `end_time`.
#[derive(Default)]
pub struct MatchEndHeap {
    heap: BinaryHeap<Match>,
}

impl MatchEndHeap {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new() }
    }

    pub fn push(&mut self, m: Match) {
        self.heap.push(m);
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pop every match with `end_time <= now`, in key order.
    pub fn drain_due(&mut self, now: u64) -> Vec<Match> {
        let mut due = Vec::new();
        while let Some(top) = self.heap.peek() {
            if top.end_time > now {
                break;
            }
            due.push(self.heap.pop().unwrap());
        }
        due
    }
}

/// A single player's cooldown entry, keyed on when it ends.
#[derive(Clone, Copy, Debug)]
struct CooldownEntry {
    end_time: u64,
    player_id: PlayerId,
}

impl PartialEq for CooldownEntry {
    fn eq(&self, other: &Self) -> bool {
        self.end_time == other.end_time
    }
}
impl Eq for CooldownEntry {}

impl PartialOrd for CooldownEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CooldownEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.end_time.cmp(&self.end_time)
    }
}

/// A min-heap of player cooldown expirations, keyed on end time.
#[derive(Default)]
pub struct CooldownHeap {
    heap: BinaryHeap<CooldownEntry>,
}

impl CooldownHeap {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new() }
    }

    pub fn push(&mut self, player_id: PlayerId, end_time: u64) {
        self.heap.push(CooldownEntry { end_time, player_id });
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pop every player id whose cooldown end is `<= now`, in key order.
    pub fn drain_due(&mut self, now: u64) -> Vec<PlayerId> {
        let mut due = Vec::new();
        while let Some(top) = self.heap.peek() {
            if top.end_time > now {
                break;
            }
            due.push(self.heap.pop().unwrap().player_id);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_end_heap_drains_in_key_order_regardless_of_insertion_order() {
        let mut heap = MatchEndHeap::new();
        heap.push(Match { end_time: 20, datacenter_id: 1, players: vec![1] });
        heap.push(Match { end_time: 5, datacenter_id: 1, players: vec![2] });
        heap.push(Match { end_time: 10, datacenter_id: 1, players: vec![3] });

        let due = heap.drain_due(10);
        let ends: Vec<u64> = due.iter().map(|m| m.end_time).collect();
        assert_eq!(ends, vec![5, 10]);
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn match_end_heap_drain_is_exhaustive_at_exact_key() {
        let mut heap = MatchEndHeap::new();
        heap.push(Match { end_time: 7, datacenter_id: 1, players: vec![1] });
        heap.push(Match { end_time: 7, datacenter_id: 1, players: vec![2] });
        let due = heap.drain_due(7);
        assert_eq!(due.len(), 2);
        assert!(heap.is_empty());
    }

    #[test]
    fn cooldown_heap_drains_due_entries() {
        let mut heap = CooldownHeap::new();
        heap.push(100, 4);
        heap.push(200, 1);
        heap.push(300, 9);
        let due = heap.drain_due(4);
        assert_eq!(due, vec![200, 100]);
        assert_eq!(heap.len(), 1);
    }
}
