//! The Simulator: owns every piece of simulation state and drives the
//! nine-step per-second tick described in the concurrency & resource
//! model. This replaces the historical source's process-wide globals
//! with a single explicit value.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::arrivals::ArrivalSource;
use crate::assembler::{self, CommittedPlayer};
use crate::config::MatchingConfig;
use crate::datacenter::Datacenter;
use crate::io::output::{MatchesWriter, StatsRow, StatsWriter};
use crate::matchmaker::{self, Enrollment, SweepOutcome};
use crate::oracle;
use crate::player::{DatacenterId, Player, PlayerId, PlayerState};
use crate::reporter::{DensityGrid, DensityHandle, StateCounters};
use crate::timers::{CooldownHeap, MatchEndHeap};

pub struct Simulator {
    matching: MatchingConfig,
    datacenters: BTreeMap<DatacenterId, Datacenter>,
    arena: HashMap<PlayerId, Player>,
    active_set: HashSet<PlayerId>,
    match_end_heap: MatchEndHeap,
    cooldown_heap: CooldownHeap,
    counters: StateCounters,
    density: DensityGrid,
    density_handle: DensityHandle,
    arrival_source: ArrivalSource,
    rng: StdRng,
    now: u64,
    next_player_id: PlayerId,
    matches_writer: Option<MatchesWriter>,
    stats_writer: Option<StatsWriter>,
}

impl Simulator {
    pub fn new(
        matching: MatchingConfig,
        datacenters: Vec<Datacenter>,
        arrival_source: ArrivalSource,
        rng_seed: u64,
        density_handle: DensityHandle,
        matches_writer: Option<MatchesWriter>,
        stats_writer: Option<StatsWriter>,
    ) -> Self {
        Self {
            matching,
            datacenters: datacenters.into_iter().map(|dc| (dc.id, dc)).collect(),
            arena: HashMap::new(),
            active_set: HashSet::new(),
            match_end_heap: MatchEndHeap::new(),
            cooldown_heap: CooldownHeap::new(),
            counters: StateCounters::default(),
            density: DensityGrid::new(),
            density_handle,
            arrival_source,
            rng: StdRng::seed_from_u64(rng_seed),
            now: 0,
            next_player_id: 1,
            matches_writer,
            stats_writer,
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn counters(&self) -> StateCounters {
        self.counters
    }

    pub fn active_set_len(&self) -> usize {
        self.active_set.len()
    }

    pub fn datacenter(&self, id: DatacenterId) -> Option<&Datacenter> {
        self.datacenters.get(&id)
    }

    pub fn match_end_heap_len(&self) -> usize {
        self.match_end_heap.len()
    }

    /// Instantiate a new player at arrival, computing its full cost
    /// vector against every known datacenter.
    pub fn spawn_player(&mut self, lat: f64, long: f64) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;

        let cost_map: HashMap<DatacenterId, f32> = self
            .datacenters
            .values()
            .map(|dc| (dc.id, oracle::rtt(dc, lat, long, self.matching.speed_of_light_factor)))
            .collect();

        let player = Player::new(id, lat, long, cost_map);
        self.arena.insert(id, player);
        self.active_set.insert(id);
        id
    }

    /// Run one simulated second, per the nine-step ordering: (1) schedule
    /// arrival generation, (2) drain match-end heap, (3) drain cooldown
    /// heap, (4) sweep active-set, (5) assemble matches, (6) re-seed warm
    /// bodies (folded into step 4's enrollment, since it is a pure
    /// function of each player's state evaluated once per second), (7)
    /// publish stats/density, (8) merge staged arrivals, (9) advance time.
    pub fn tick(&mut self) {
        let second_of_day = (self.now % crate::arrivals::SECONDS_PER_DAY as u64) as u32;
        let staged_arrivals =
            self.arrival_source
                .sample_for_second(second_of_day, self.matching.sample_days, &mut self.rng);

        self.drain_match_end_heap();
        self.drain_cooldown_heap();
        self.sweep_active_set();
        let matches_rows = self.assemble_all_matches();
        self.publish(&matches_rows);

        for (lat, long) in staged_arrivals {
            self.spawn_player(lat, long);
        }

        self.now += 1;
    }

    fn drain_match_end_heap(&mut self) {
        let due = self.match_end_heap.drain_due(self.now);
        for m in due {
            if let Some(dc) = self.datacenters.get_mut(&m.datacenter_id) {
                dc.in_match_count = dc.in_match_count.saturating_sub(m.players.len() as u64);
            }
            for player_id in &m.players {
                if let Some(player) = self.arena.get_mut(player_id) {
                    self.density.decrement(player.lat, player.long);
                    player.state = PlayerState::Cooldown;
                }
                self.cooldown_heap.push(*player_id, self.now + self.matching.between_match_seconds);
            }
        }
    }

    fn drain_cooldown_heap(&mut self) {
        let due = self.cooldown_heap.drain_due(self.now);
        let play_again_probability = (self.matching.play_again_percent / 100.0).clamp(0.0, 1.0);
        for player_id in due {
            let play_again = self.rng.gen_bool(play_again_probability);
            if play_again {
                if let Some(player) = self.arena.get_mut(&player_id) {
                    player.state = PlayerState::New;
                    player.reset_for_new_episode();
                    self.active_set.insert(player_id);
                }
            } else {
                self.arena.remove(&player_id);
            }
        }
    }

    fn sweep_active_set(&mut self) {
        let active_ids: Vec<PlayerId> = self.active_set.iter().copied().collect();
        let mut failed = Vec::new();
        let mut enrollments = Vec::with_capacity(active_ids.len());

        for player_id in active_ids {
            let Some(player) = self.arena.get_mut(&player_id) else { continue };
            match matchmaker::sweep(player, &self.matching) {
                SweepOutcome::Failed => failed.push(player_id),
                SweepOutcome::Continuing(enrollment) => enrollments.push((player_id, enrollment)),
            }
        }

        for (player_id, enrollment) in enrollments {
            self.apply_enrollment(player_id, enrollment);
        }

        for player_id in failed {
            self.active_set.remove(&player_id);
            self.arena.remove(&player_id);
            self.counters.cumulative_failures += 1;
            tracing::debug!(player_id, "warm body search timed out, dropping player");
        }
    }

    fn apply_enrollment(&mut self, player_id: PlayerId, enrollment: Enrollment) {
        if enrollment == Enrollment::None {
            return;
        }
        let Some(player) = self.arena.get(&player_id) else { return };

        match enrollment {
            Enrollment::None => {}
            Enrollment::All => {
                for dc in self.datacenters.values_mut() {
                    dc.enroll(player_id);
                }
            }
            Enrollment::CostAtMost(max_ms) => {
                for (&dc_id, &ms) in &player.cost_map {
                    if ms <= max_ms {
                        if let Some(dc) = self.datacenters.get_mut(&dc_id) {
                            dc.enroll(player_id);
                        }
                    }
                }
            }
            Enrollment::CostInRange(lo, hi) => {
                for (&dc_id, &ms) in &player.cost_map {
                    if ms > lo && ms <= hi {
                        if let Some(dc) = self.datacenters.get_mut(&dc_id) {
                            dc.enroll(player_id);
                        }
                    }
                }
            }
        }
    }

    fn assemble_all_matches(&mut self) -> Vec<CommittedPlayer> {
        let dc_ids: Vec<DatacenterId> = self.datacenters.keys().copied().collect();
        let mut all_rows = Vec::new();

        for dc_id in dc_ids {
            let Some(mut dc) = self.datacenters.remove(&dc_id) else { continue };
            let (rows, committed_ids) = assembler::assemble_matches(
                &mut dc,
                &mut self.arena,
                self.now,
                &self.matching,
                &mut self.density,
                &mut self.match_end_heap,
            );
            for player_id in committed_ids {
                self.active_set.remove(&player_id);
            }
            all_rows.extend(rows);
            self.datacenters.insert(dc_id, dc);
        }

        all_rows
    }

    fn publish(&mut self, matches_rows: &[CommittedPlayer]) {
        self.counters.reset_tick_counts();
        for player in self.arena.values() {
            self.counters.record(player.state);
        }

        let stats_rows: Vec<StatsRow> = self
            .datacenters
            .values()
            .map(|dc| StatsRow {
                second: self.now,
                city: dc.name.clone(),
                player_count: dc.in_match_count,
                avg_latency: dc.avg_latency,
                avg_matching_time: dc.avg_matching_time,
            })
            .collect();

        if let Some(writer) = &mut self.matches_writer {
            if let Err(e) = writer.write_rows(matches_rows).and_then(|_| writer.flush()) {
                let err = crate::error::RuntimeError::PublishFailed(e.to_string());
                tracing::warn!(error = %err, "failed writing matches.csv");
            }
        }
        if let Some(writer) = &mut self.stats_writer {
            if let Err(e) = writer.write_rows(&stats_rows).and_then(|_| writer.flush()) {
                let err = crate::error::RuntimeError::PublishFailed(e.to_string());
                tracing::warn!(error = %err, "failed writing stats.csv");
            }
        }

        self.density_handle.publish(&self.density);
    }
}
