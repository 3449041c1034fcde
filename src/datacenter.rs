//! Datacenter record and its candidate queue (component D): an ordered
//! list of player ids eligible to be drawn into a match here, plus the
//! rolling latency/matching-time averages the Match Assembler updates.

use crate::oracle::LatencyGrid;
use crate::player::{DatacenterId, PlayerId};

const LATENCY_ALPHA: f64 = 0.05;
const MATCHING_TIME_ALPHA: f64 = 0.01;

#[derive(Clone, Debug)]
pub struct Datacenter {
    pub id: DatacenterId,
    pub name: String,
    pub lat: f64,
    pub long: f64,
    pub latency_grid: Option<LatencyGrid>,

    pub avg_latency: f64,
    pub avg_matching_time: f64,
    pub in_match_count: u64,

    /// Ordered candidate queue; scanned front-to-back by the Match
    /// Assembler. No duplicates within a tick.
    queue: Vec<PlayerId>,
}

impl Datacenter {
    pub fn new(id: DatacenterId, name: String, lat: f64, long: f64) -> Self {
        Self {
            id,
            name,
            lat,
            long,
            latency_grid: None,
            avg_latency: 0.0,
            avg_matching_time: 0.0,
            in_match_count: 0,
            queue: Vec::new(),
        }
    }

    pub fn queue(&self) -> &[PlayerId] {
        &self.queue
    }

    /// Enroll `player_id` unless it is already present (check-or-append).
    pub fn enroll(&mut self, player_id: PlayerId) {
        if !self.queue.contains(&player_id) {
            self.queue.push(player_id);
        }
    }

    /// Rebuild the queue to retain only ids for which `keep` returns true.
    /// Used between ticks to drop everything but surviving Ideal/Expand
    /// players before WarmBody and New players are re-enrolled.
    pub fn retain_queue<F: FnMut(PlayerId) -> bool>(&mut self, mut keep: F) {
        self.queue.retain(|&id| keep(id));
    }

    pub fn record_rolling_latency(&mut self, sample_ms: f32) {
        self.avg_latency += (sample_ms as f64 - self.avg_latency) * LATENCY_ALPHA;
    }

    pub fn record_rolling_matching_time(&mut self, sample_seconds: u32) {
        self.avg_matching_time += (sample_seconds as f64 - self.avg_matching_time) * MATCHING_TIME_ALPHA;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enroll_is_idempotent_within_a_tick() {
        let mut dc = Datacenter::new(1, "a".into(), 0.0, 0.0);
        dc.enroll(10);
        dc.enroll(10);
        dc.enroll(20);
        assert_eq!(dc.queue(), &[10, 20]);
    }

    #[test]
    fn retain_queue_drops_non_matching_ids() {
        let mut dc = Datacenter::new(1, "a".into(), 0.0, 0.0);
        dc.enroll(1);
        dc.enroll(2);
        dc.enroll(3);
        dc.retain_queue(|id| id != 2);
        assert_eq!(dc.queue(), &[1, 3]);
    }

    #[test]
    fn rolling_average_uses_exponential_smoothing() {
        let mut dc = Datacenter::new(1, "a".into(), 0.0, 0.0);
        assert_eq!(dc.avg_latency, 0.0);
        dc.record_rolling_latency(100.0);
        assert!((dc.avg_latency - 5.0).abs() < 1e-9);
        dc.record_rolling_latency(100.0);
        assert!((dc.avg_latency - 9.75).abs() < 1e-9);
    }
}
