//! Match Assembler (component F): scans a datacenter's candidate queue
//! front-to-back, commits fixed-size matches, and updates the
//! datacenter's rolling statistics and the density map.

use std::collections::HashMap;

use crate::config::MatchingConfig;
use crate::datacenter::Datacenter;
use crate::player::{Player, PlayerId, PlayerState};
use crate::reporter::DensityGrid;
use crate::timers::{Match, MatchEndHeap};

/// One player's row for the matches CSV sink, recorded at commit time.
#[derive(Clone, Debug)]
pub struct CommittedPlayer {
    pub second: u64,
    pub lat: f64,
    pub long: f64,
    pub city: String,
    pub latency: f32,
    pub matching_time: u32,
}

/// Scan `dc`'s queue front-to-back, committing every run of
/// `players_per_match` queueable candidates into a match. Returns one
/// [`CommittedPlayer`] row per player committed, for the matches-CSV sink.
///
/// A player already transitioned to Playing earlier in this tick (by an
/// earlier datacenter's scan) is skipped here rather than double-booked:
/// the state check acts as the lazy-cleanup-on-scan the player arena
/// design relies on.
pub fn assemble_matches(
    dc: &mut Datacenter,
    arena: &mut HashMap<PlayerId, Player>,
    now: u64,
    cfg: &MatchingConfig,
    density: &mut DensityGrid,
    heap: &mut MatchEndHeap,
) -> (Vec<CommittedPlayer>, Vec<PlayerId>) {
    let mut committed_rows = Vec::new();
    let mut committed_ids = Vec::new();
    let snapshot: Vec<PlayerId> = dc.queue().to_vec();
    let mut batch: Vec<PlayerId> = Vec::with_capacity(cfg.players_per_match);

    for player_id in snapshot {
        let Some(player) = arena.get(&player_id) else { continue };
        if !player.in_queueable_state() {
            continue;
        }
        batch.push(player_id);

        if batch.len() == cfg.players_per_match {
            let mut match_players = Vec::with_capacity(batch.len());
            for &id in &batch {
                let player = arena.get_mut(&id).expect("candidate vanished mid-commit");
                let latency = *player.cost_map.get(&dc.id).unwrap_or(&player.last_latency);

                dc.record_rolling_latency(latency);
                dc.record_rolling_matching_time(player.matching_time);

                committed_rows.push(CommittedPlayer {
                    second: now,
                    lat: player.lat,
                    long: player.long,
                    city: dc.name.clone(),
                    latency,
                    matching_time: player.matching_time,
                });

                density.increment(player.lat, player.long);

                player.state = PlayerState::Playing;
                player.bound_datacenter = Some(dc.id);
                player.elapsed = 0;
                player.last_latency = latency;

                match_players.push(id);
            }

            committed_ids.extend_from_slice(&match_players);
            dc.in_match_count += match_players.len() as u64;
            heap.push(Match {
                end_time: now + cfg.match_length_seconds,
                datacenter_id: dc.id,
                players: match_players,
            });

            batch.clear();
        }
    }

    // Drop committed (now Playing) and any stale non-queueable ids; the
    // remaining Ideal/Expand/WarmBody leftovers that didn't fill a full
    // batch stay queued for the next tick's scan.
    dc.retain_queue(|id| arena.get(&id).map(|p| p.in_queueable_state()).unwrap_or(false));

    (committed_rows, committed_ids)
}
