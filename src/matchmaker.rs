//! Matchmaker State Machine (component E): drives each active player
//! through {New, Ideal, Expand, WarmBody} once per simulated second and
//! decides which datacenter queues it should be enrolled in.

use crate::config::MatchingConfig;
use crate::player::{Cost, Player, PlayerState};

/// Which datacenters a player should be (re-)enrolled in after this
/// second's transition. The [`crate::simulator::Simulator`] resolves this
/// against the player's cost map and calls [`crate::datacenter::Datacenter::enroll`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Enrollment {
    None,
    /// Enroll in every datacenter whose cost is <= the given ms.
    CostAtMost(f32),
    /// Enroll in every datacenter whose cost is in (lo, hi].
    CostInRange(f32, f32),
    /// Enroll in every datacenter, regardless of cost (WarmBody re-seed).
    All,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SweepOutcome {
    Continuing(Enrollment),
    /// WarmBody timed out with no match; caller removes the player from
    /// the active-set and counts it as a search failure.
    Failed,
}

/// Advance one player by one simulated second. Mutates `player.state`,
/// `player.elapsed`, and `player.matching_time` in place and returns the
/// enrollment action the caller must apply.
pub fn sweep(player: &mut Player, cfg: &MatchingConfig) -> SweepOutcome {
    match player.state {
        PlayerState::New => {
            player.reset_for_new_episode();
            let best: Option<Cost> = player.best_cost();
            let Some(best) = best else {
                // No reachable datacenter at all; treat as an immediate
                // WarmBody so the usual timeout logic handles it.
                player.state = PlayerState::WarmBody;
                return SweepOutcome::Continuing(Enrollment::All);
            };

            if best.ms <= cfg.ideal_cost_threshold {
                player.state = PlayerState::Ideal;
                SweepOutcome::Continuing(Enrollment::CostAtMost(best.ms + cfg.ideal_cost_spread))
            } else if best.ms < cfg.warm_body_cost_threshold {
                player.state = PlayerState::Expand;
                SweepOutcome::Continuing(Enrollment::CostAtMost(cfg.expand_cost_threshold))
            } else {
                player.state = PlayerState::WarmBody;
                SweepOutcome::Continuing(Enrollment::All)
            }
        }

        PlayerState::Ideal => {
            player.elapsed += 1;
            player.matching_time += 1;
            if player.elapsed > cfg.ideal_time {
                player.state = PlayerState::Expand;
                player.elapsed = 0;
                SweepOutcome::Continuing(Enrollment::CostInRange(
                    cfg.ideal_cost_threshold,
                    cfg.expand_cost_threshold,
                ))
            } else {
                SweepOutcome::Continuing(Enrollment::None)
            }
        }

        PlayerState::Expand => {
            player.elapsed += 1;
            player.matching_time += 1;
            if player.elapsed > cfg.expand_time {
                player.state = PlayerState::WarmBody;
                player.elapsed = 0;
            }
            SweepOutcome::Continuing(Enrollment::None)
        }

        PlayerState::WarmBody => {
            player.elapsed += 1;
            player.matching_time += 1;
            if player.elapsed > cfg.warm_body_time {
                return SweepOutcome::Failed;
            }
            SweepOutcome::Continuing(Enrollment::All)
        }

        PlayerState::Playing | PlayerState::Cooldown => {
            // Driven by the timer wheels, not the per-second sweep.
            SweepOutcome::Continuing(Enrollment::None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn player_with_best(ms: f32) -> Player {
        let mut map = HashMap::new();
        map.insert(1, ms);
        map.insert(2, ms + 500.0);
        Player::new(1, 0.0, 0.0, map)
    }

    fn cfg() -> MatchingConfig {
        MatchingConfig::default()
    }

    #[test]
    fn best_cost_equal_to_ideal_threshold_enters_ideal() {
        let cfg = cfg();
        let mut p = player_with_best(cfg.ideal_cost_threshold);
        let outcome = sweep(&mut p, &cfg);
        assert_eq!(p.state, PlayerState::Ideal);
        assert!(matches!(outcome, SweepOutcome::Continuing(Enrollment::CostAtMost(_))));
    }

    #[test]
    fn best_cost_just_above_ideal_enters_expand() {
        let cfg = cfg();
        let mut p = player_with_best(cfg.ideal_cost_threshold + 1.0);
        sweep(&mut p, &cfg);
        assert_eq!(p.state, PlayerState::Expand);
    }

    #[test]
    fn best_cost_between_expand_and_warm_body_threshold_enters_expand() {
        // The New-state gate is WarmBodyCostThreshold, not
        // ExpandCostThreshold: a cost past ExpandCostThreshold but still
        // below WarmBodyCostThreshold still lands in Expand.
        let cfg = cfg();
        let mut p = player_with_best(cfg.expand_cost_threshold + 1.0);
        sweep(&mut p, &cfg);
        assert_eq!(p.state, PlayerState::Expand);
    }

    #[test]
    fn best_cost_at_or_above_warm_body_threshold_enters_warm_body() {
        let cfg = cfg();
        let mut p = player_with_best(cfg.warm_body_cost_threshold);
        sweep(&mut p, &cfg);
        assert_eq!(p.state, PlayerState::WarmBody);
    }

    #[test]
    fn ideal_timeout_transitions_to_expand_not_warm_body() {
        let mut cfg = cfg();
        cfg.ideal_time = 2;
        let mut p = player_with_best(cfg.ideal_cost_threshold);
        sweep(&mut p, &cfg); // -> Ideal
        sweep(&mut p, &cfg); // elapsed 1
        sweep(&mut p, &cfg); // elapsed 2
        let outcome = sweep(&mut p, &cfg); // elapsed 3 > 2 -> Expand
        assert_eq!(p.state, PlayerState::Expand);
        assert_eq!(p.elapsed, 0);
        assert!(matches!(outcome, SweepOutcome::Continuing(Enrollment::CostInRange(_, _))));
    }

    #[test]
    fn expand_timeout_transitions_to_warm_body() {
        let mut cfg = cfg();
        cfg.expand_time = 1;
        let mut p = player_with_best(cfg.expand_cost_threshold);
        sweep(&mut p, &cfg); // -> Expand
        sweep(&mut p, &cfg); // elapsed 1
        sweep(&mut p, &cfg); // elapsed 2 > 1 -> WarmBody
        assert_eq!(p.state, PlayerState::WarmBody);
    }

    #[test]
    fn warm_body_timeout_fails_search() {
        let mut cfg = cfg();
        cfg.warm_body_time = 1;
        let mut p = player_with_best(cfg.warm_body_cost_threshold + 1000.0);
        sweep(&mut p, &cfg); // -> WarmBody
        sweep(&mut p, &cfg); // elapsed 1
        let outcome = sweep(&mut p, &cfg); // elapsed 2 > 1 -> Failed
        assert_eq!(outcome, SweepOutcome::Failed);
    }

    #[test]
    fn warm_body_reseeds_every_tick_until_timeout() {
        let mut cfg = cfg();
        cfg.warm_body_time = 5;
        let mut p = player_with_best(cfg.warm_body_cost_threshold + 1000.0);
        sweep(&mut p, &cfg); // -> WarmBody
        for _ in 0..3 {
            let outcome = sweep(&mut p, &cfg);
            assert_eq!(outcome, SweepOutcome::Continuing(Enrollment::All));
        }
    }
}
