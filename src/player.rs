//! Player entity: position, matching state, and the per-datacenter cost
//! vector the Matchmaker and Match Assembler read from.

use std::collections::HashMap;

pub type PlayerId = u64;
pub type DatacenterId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    New,
    Ideal,
    Expand,
    WarmBody,
    Playing,
    Cooldown,
}

/// One entry of a player's cost vector: the datacenter id and the
/// estimated RTT (ms) to reach it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cost {
    pub datacenter_id: DatacenterId,
    pub ms: f32,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub lat: f64,
    pub long: f64,
    pub state: PlayerState,

    /// datacenter id -> estimated RTT in ms.
    pub cost_map: HashMap<DatacenterId, f32>,
    /// `cost_map` as a vector sorted ascending by ms; a permutation of
    /// `cost_map`'s values.
    pub sorted_costs: Vec<Cost>,

    /// Seconds spent in the current state.
    pub elapsed: u32,
    /// Cumulative seconds spent searching across this search episode.
    pub matching_time: u32,

    /// Datacenter the player is bound to while Playing.
    pub bound_datacenter: Option<DatacenterId>,
    /// Latency recorded at match commit.
    pub last_latency: f32,
}

impl Player {
    pub fn new(id: PlayerId, lat: f64, long: f64, cost_map: HashMap<DatacenterId, f32>) -> Self {
        let mut sorted_costs: Vec<Cost> = cost_map
            .iter()
            .map(|(&datacenter_id, &ms)| Cost { datacenter_id, ms })
            .collect();
        sorted_costs.sort_by(|a, b| a.ms.partial_cmp(&b.ms).unwrap_or(std::cmp::Ordering::Equal));

        Self {
            id,
            lat,
            long,
            state: PlayerState::New,
            cost_map,
            sorted_costs,
            elapsed: 0,
            matching_time: 0,
            bound_datacenter: None,
            last_latency: 0.0,
        }
    }

    pub fn best_cost(&self) -> Option<Cost> {
        self.sorted_costs.first().copied()
    }

    /// Reset transient search bookkeeping; called on (re-)entry to New.
    pub fn reset_for_new_episode(&mut self) {
        self.elapsed = 0;
        self.matching_time = 0;
        self.bound_datacenter = None;
    }

    pub fn in_queueable_state(&self) -> bool {
        matches!(
            self.state,
            PlayerState::Ideal | PlayerState::Expand | PlayerState::WarmBody
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs(pairs: &[(DatacenterId, f32)]) -> HashMap<DatacenterId, f32> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn sorted_costs_is_ascending_permutation_of_cost_map() {
        let p = Player::new(1, 0.0, 0.0, costs(&[(1, 50.0), (2, 10.0), (3, 30.0)]));
        let ms: Vec<f32> = p.sorted_costs.iter().map(|c| c.ms).collect();
        assert_eq!(ms, vec![10.0, 30.0, 50.0]);

        let mut from_map: Vec<f32> = p.cost_map.values().copied().collect();
        from_map.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(ms, from_map);
    }

    #[test]
    fn best_cost_is_vector_head() {
        let p = Player::new(1, 0.0, 0.0, costs(&[(1, 50.0), (2, 10.0)]));
        assert_eq!(p.best_cost().unwrap().datacenter_id, 2);
    }

    #[test]
    fn queueable_states() {
        let mut p = Player::new(1, 0.0, 0.0, HashMap::new());
        p.state = PlayerState::New;
        assert!(!p.in_queueable_state());
        p.state = PlayerState::Ideal;
        assert!(p.in_queueable_state());
        p.state = PlayerState::Playing;
        assert!(!p.in_queueable_state());
    }
}
