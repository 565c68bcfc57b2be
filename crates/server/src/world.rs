//! World state and the per-tick simulation pipeline.
//!
//! The world owns every player, cell and food pellet. All mutation happens
//! on the scheduler's tick; sessions only reach the world through queued
//! commands, and bots go through the same mutators as humans.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use protocol::{
    unix_millis, CellInfo, CellState, Event, EventPayload, FoodInfo, FoodState, PlayerState,
    WorldSnapshot,
};

use crate::constants::*;
use crate::entity::{Cell, Food, Player};
use crate::events::EventBus;
use crate::geometry::{direction, distance, Vec2};

/// Colors assigned to joining players.
const PLAYER_COLORS: &[&str] = &[
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E2",
];

/// Colors assigned to natural food.
const FOOD_COLORS: &[&str] = &[
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E2",
    "#F8B739", "#52BE80", "#EC7063", "#5DADE2",
];

/// The authoritative game world.
#[derive(Debug)]
pub struct World {
    pub players: HashMap<Uuid, Player>,
    pub food: HashMap<Uuid, Food>,
    events: EventBus,
    rng: StdRng,
    /// Monotonic simulation clock in seconds, advanced by `dt` each step.
    clock: f64,
    tick_count: u64,
}

impl World {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Deterministic world for tests and replay.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let mut world = Self {
            players: HashMap::new(),
            food: HashMap::with_capacity(MAX_FOOD_COUNT),
            events: EventBus::new(),
            rng,
            clock: 0.0,
            tick_count: 0,
        };
        // The initial fill happens before any viewer exists, so no
        // FoodSpawned event is published for it.
        for _ in 0..MAX_FOOD_COUNT {
            let food = world.random_food();
            world.food.insert(food.id, food);
        }
        world
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Simulation clock in seconds.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn player(&self, id: Uuid) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Random color for a joining player.
    pub fn random_player_color(&mut self) -> String {
        PLAYER_COLORS[self.rng.random_range(0..PLAYER_COLORS.len())].to_string()
    }

    fn random_food(&mut self) -> Food {
        let position = Vec2::new(
            self.rng.random_range(0.0..WORLD_WIDTH),
            self.rng.random_range(0.0..WORLD_HEIGHT),
        );
        let color = FOOD_COLORS[self.rng.random_range(0..FOOD_COLORS.len())].to_string();
        Food::new(position, color, self.clock)
    }

    /// Add a player with one starting cell at a random interior point.
    pub fn add_player(&mut self, name: &str, color: String, is_bot: bool) -> Uuid {
        let position = Vec2::new(
            self.rng.random_range(START_RADIUS..WORLD_WIDTH - START_RADIUS),
            self.rng.random_range(START_RADIUS..WORLD_HEIGHT - START_RADIUS),
        );
        let player = Player::new(name, color, is_bot, position, self.clock);
        let cell = &player.cells[0];
        self.events.publish(Event::now(EventPayload::PlayerJoined {
            player_id: player.id,
            name: player.name.clone(),
            color: player.color.clone(),
            is_bot,
            cell_id: cell.id,
            x: cell.position.x,
            y: cell.position.y,
            radius: cell.radius,
        }));
        let id = player.id;
        self.players.insert(id, player);
        id
    }

    pub fn remove_player(&mut self, id: Uuid) {
        self.players.remove(&id);
    }

    /// Update a player's shared movement target. No-op for unknown players.
    pub fn set_target(&mut self, id: Uuid, x: f64, y: f64) {
        let now = self.clock;
        if let Some(player) = self.players.get_mut(&id) {
            player.target = Vec2::new(x, y);
            player.last_input_at = now;
        }
    }

    /// Split every eligible cell of the player toward its target.
    ///
    /// The split is all-or-nothing: if the new total would exceed the
    /// per-player cell cap, nothing happens and no event is published.
    pub fn split(&mut self, id: Uuid) {
        let now = self.clock;
        let Some(player) = self.players.get_mut(&id) else { return };

        let eligible: Vec<usize> = player
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.can_split(now) && cell.mass() >= 20.0)
            .map(|(i, _)| i)
            .collect();
        if eligible.is_empty() || player.cells.len() + eligible.len() > PLAYER_MAX_CELLS {
            return;
        }

        let target = player.target;
        let mut siblings = Vec::with_capacity(eligible.len());
        for i in eligible {
            let cell = &mut player.cells[i];
            let half = cell.mass() / 2.0;
            cell.set_mass(half);
            cell.last_split_at = now;

            let dir = direction(cell.position, target);
            let mut sibling = Cell::new(cell.position + dir * (cell.radius * 1.2), 0.0, now);
            sibling.set_mass(half);
            sibling.velocity = dir * SPLIT_IMPULSE;
            siblings.push(sibling);
        }

        let new_cells: Vec<CellInfo> = siblings
            .iter()
            .map(|cell| CellInfo {
                cell_id: cell.id,
                x: cell.position.x,
                y: cell.position.y,
                radius: cell.radius,
                vel_x: cell.velocity.x,
                vel_y: cell.velocity.y,
            })
            .collect();
        let player_id = player.id;
        player.cells.extend(siblings);

        self.events.publish(Event::now(EventPayload::PlayerSplit { player_id, new_cells }));
    }

    /// Eject mass from every sufficiently heavy cell toward the target.
    pub fn eject(&mut self, id: Uuid) {
        let now = self.clock;
        let Some(player) = self.players.get_mut(&id) else { return };

        let target = player.target;
        let color = player.color.clone();
        let player_id = player.id;

        let mut ejected = Vec::new();
        for cell in &mut player.cells {
            if cell.mass() < EJECT_MASS + 10.0 {
                continue;
            }
            cell.set_mass(cell.mass() - EJECT_MASS);

            let dir = direction(cell.position, target);
            let speed = (EJECT_SPEED * cell.mass().sqrt() / 10.0).min(EJECT_SPEED * 2.0);
            ejected.push(Food::ejected(
                cell.position + dir * (cell.radius * 1.5),
                color.clone(),
                EJECT_MASS,
                dir * speed,
                now,
            ));
        }
        if ejected.is_empty() {
            return;
        }

        let food: Vec<FoodInfo> = ejected.iter().map(food_info).collect();
        for pellet in ejected {
            self.food.insert(pellet.id, pellet);
        }
        self.events.publish(Event::now(EventPayload::PlayerEjected { player_id, food }));
    }

    /// Spawn up to `count` food pellets immediately (admin surface); the
    /// world cap still applies. Returns how many were actually spawned.
    pub fn spawn_food(&mut self, count: usize) -> usize {
        let count = count.min(MAX_FOOD_COUNT.saturating_sub(self.food.len()));
        if count == 0 {
            return 0;
        }
        let mut foods = Vec::with_capacity(count);
        for _ in 0..count {
            let food = self.random_food();
            foods.push(food_info(&food));
            self.food.insert(food.id, food);
        }
        self.events.publish(Event::now(EventPayload::FoodSpawned { foods }));
        count
    }

    /// Advance the simulation by one fixed tick.
    pub fn step(&mut self, dt: f64) {
        self.clock += dt;
        self.tick_count += 1;

        self.move_cells(dt);
        self.degrade_mass(dt);
        self.move_food(dt);
        self.eat_food();
        self.resolve_player_collisions();
        self.merge_cells();
        self.clamp_cells();
        self.sweep_dead();
        self.replenish_food();
        if self.tick_count % CELL_UPDATE_EVERY == 0 {
            self.publish_cell_updates();
        }

        #[cfg(debug_assertions)]
        self.assert_invariants();
    }

    /// Move every cell toward its player's target, without overshooting,
    /// then clamp inside the world by the cell radius.
    fn move_cells(&mut self, dt: f64) {
        for player in self.players.values_mut() {
            for cell in &mut player.cells {
                let to_target = player.target - cell.position;
                let dist = to_target.length();
                if dist == 0.0 {
                    continue;
                }
                let step = (cell.speed() * dt).min(dist);
                cell.position += to_target / dist * step;
                cell.position.x = cell.position.x.clamp(cell.radius, WORLD_WIDTH - cell.radius);
                cell.position.y = cell.position.y.clamp(cell.radius, WORLD_HEIGHT - cell.radius);
            }
        }
    }

    /// Cells above the safe threshold bleed mass; this bounds runaway growth.
    fn degrade_mass(&mut self, dt: f64) {
        for player in self.players.values_mut() {
            for cell in &mut player.cells {
                let mass = cell.mass();
                if mass <= SAFE_MASS_THRESHOLD {
                    continue;
                }
                let excess = mass - SAFE_MASS_THRESHOLD;
                let loss =
                    (excess * DEGRADATION_LINEAR + excess * excess * DEGRADATION_QUADRATIC) * dt;
                cell.set_mass((mass - loss).max(SAFE_MASS_THRESHOLD));
            }
        }
    }

    /// Integrate ejected food under friction, reflecting off world edges.
    fn move_food(&mut self, dt: f64) {
        for food in self.food.values_mut() {
            if food.velocity.length() <= 0.1 {
                continue;
            }
            food.position += food.velocity * dt;
            food.velocity *= 0.95;

            if food.position.x < 0.0 || food.position.x > WORLD_WIDTH {
                food.velocity.x *= -0.5;
                food.position.x = food.position.x.clamp(0.0, WORLD_WIDTH);
            }
            if food.position.y < 0.0 || food.position.y > WORLD_HEIGHT {
                food.velocity.y *= -0.5;
                food.position.y = food.position.y.clamp(0.0, WORLD_HEIGHT);
            }
        }
    }

    /// Cells absorb any food within their radius, grace window permitting.
    fn eat_food(&mut self) {
        let now = self.clock;
        let mut eaten: Vec<(Uuid, Uuid, Uuid)> = Vec::new();
        for player in self.players.values_mut() {
            let player_id = player.id;
            for cell in &mut player.cells {
                self.food.retain(|&food_id, food| {
                    if !food.edible(now) {
                        return true;
                    }
                    if distance(cell.position, food.position) < cell.radius {
                        cell.set_mass(cell.mass() + food.mass);
                        eaten.push((food_id, player_id, cell.id));
                        false
                    } else {
                        true
                    }
                });
            }
        }
        for (food_id, player_id, cell_id) in eaten {
            self.events.publish(Event::now(EventPayload::FoodEaten { food_id, player_id, cell_id }));
        }
    }

    /// Resolve eating between every unordered pair of players.
    fn resolve_player_collisions(&mut self) {
        let ids: Vec<Uuid> = self.players.keys().copied().collect();
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                // Take both players out of the map so the pair can be
                // resolved with plain mutable access.
                let Some(mut first) = self.players.remove(&ids[i]) else { continue };
                let Some(mut second) = self.players.remove(&ids[j]) else {
                    self.players.insert(first.id, first);
                    continue;
                };
                self.resolve_pair(&mut first, &mut second);
                self.players.insert(first.id, first);
                self.players.insert(second.id, second);
            }
        }
    }

    /// Contact is `dist < max(r1, r2)`; the heavier cell eats when it
    /// outweighs the other by at least `MASS_TO_EAT`.
    fn resolve_pair(&mut self, first: &mut Player, second: &mut Player) {
        let mut i = first.cells.len();
        while i > 0 {
            i -= 1;
            let mut j = second.cells.len();
            while j > 0 {
                j -= 1;
                let (c1_id, c1_pos, c1_radius, c1_mass) = {
                    let c = &first.cells[i];
                    (c.id, c.position, c.radius, c.mass())
                };
                let c2 = &second.cells[j];
                let dist = distance(c1_pos, c2.position);
                if dist >= c1_radius && dist >= c2.radius {
                    continue;
                }

                if c1_mass > c2.mass() * MASS_TO_EAT {
                    let gained = c2.mass();
                    let eaten_id = c2.id;
                    second.cells.remove(j);
                    let c1 = &mut first.cells[i];
                    c1.set_mass(c1.mass() + gained);
                    self.events.publish(Event::now(EventPayload::CellEaten {
                        eaten_cell_id: eaten_id,
                        eaten_by: first.id,
                        eater_cell_id: c1_id,
                    }));
                } else if c2.mass() > c1_mass * MASS_TO_EAT {
                    first.cells.remove(i);
                    let c2 = &mut second.cells[j];
                    c2.set_mass(c2.mass() + c1_mass);
                    self.events.publish(Event::now(EventPayload::CellEaten {
                        eaten_cell_id: c1_id,
                        eaten_by: second.id,
                        eater_cell_id: c2.id,
                    }));
                    break;
                }
            }
        }
    }

    /// Deeply overlapping sibling cells merge once both cooldowns allow it.
    fn merge_cells(&mut self) {
        let now = self.clock;
        let mut merges = Vec::new();
        for player in self.players.values_mut() {
            let player_id = player.id;
            let mut i = 0;
            while i < player.cells.len() {
                let mut j = i + 1;
                while j < player.cells.len() {
                    let (a, b) = (&player.cells[i], &player.cells[j]);
                    if a.can_merge(now)
                        && b.can_merge(now)
                        && distance(a.position, b.position) < (a.radius + b.radius) / 2.0
                    {
                        let absorbed = player.cells.remove(j);
                        let survivor = &mut player.cells[i];
                        survivor.set_mass(survivor.mass() + absorbed.mass());
                        survivor.last_merge_at = now;
                        merges.push(EventPayload::CellMerged {
                            player_id,
                            cell1_id: survivor.id,
                            cell2_id: absorbed.id,
                            new_cell_id: survivor.id,
                            x: survivor.position.x,
                            y: survivor.position.y,
                            radius: survivor.radius,
                        });
                        // The next cell shifted into slot j; do not advance.
                    } else {
                        j += 1;
                    }
                }
                i += 1;
            }
        }
        for payload in merges {
            self.events.publish(Event::now(payload));
        }
    }

    /// Re-clamp positions after growth; eating at the border can push the
    /// radius past the movement-time clamp.
    fn clamp_cells(&mut self) {
        for player in self.players.values_mut() {
            for cell in &mut player.cells {
                cell.position.x = cell.position.x.clamp(cell.radius, WORLD_WIDTH - cell.radius);
                cell.position.y = cell.position.y.clamp(cell.radius, WORLD_HEIGHT - cell.radius);
            }
        }
    }

    /// Remove players with no cells left and announce their death.
    fn sweep_dead(&mut self) {
        let mut died = Vec::new();
        self.players.retain(|&id, player| {
            if player.is_alive() {
                true
            } else {
                died.push(id);
                false
            }
        });
        for player_id in died {
            self.events.publish(Event::now(EventPayload::PlayerDied { player_id }));
        }
    }

    /// Refill food to the cap, announcing the whole batch in one event.
    fn replenish_food(&mut self) {
        if self.food.len() >= MAX_FOOD_COUNT {
            return;
        }
        let missing = MAX_FOOD_COUNT - self.food.len();
        let mut foods = Vec::with_capacity(missing);
        for _ in 0..missing {
            let food = self.random_food();
            foods.push(food_info(&food));
            self.food.insert(food.id, food);
        }
        self.events.publish(Event::now(EventPayload::FoodSpawned { foods }));
    }

    /// ~10 Hz position stream; between these, movement is only visible to
    /// clients through snapshots.
    fn publish_cell_updates(&self) {
        for player in self.players.values() {
            for cell in &player.cells {
                self.events.publish(Event::now(EventPayload::CellUpdated {
                    cell_id: cell.id,
                    player_id: player.id,
                    x: cell.position.x,
                    y: cell.position.y,
                    radius: cell.radius,
                }));
            }
        }
    }

    /// Build a full snapshot of the world for resync.
    pub fn snapshot(&self) -> WorldSnapshot {
        let players = self
            .players
            .values()
            .map(|player| PlayerState {
                id: player.id,
                name: player.name.clone(),
                color: player.color.clone(),
                is_bot: player.is_bot,
                score: player.score(),
                cells: player
                    .cells
                    .iter()
                    .map(|cell| CellState {
                        id: cell.id,
                        x: cell.position.x,
                        y: cell.position.y,
                        radius: cell.radius,
                    })
                    .collect(),
            })
            .collect();
        let food = self
            .food
            .values()
            .map(|f| FoodState {
                id: f.id,
                x: f.position.x,
                y: f.position.y,
                radius: f.radius,
                color: f.color.clone(),
            })
            .collect();
        WorldSnapshot { timestamp: unix_millis(), players, food }
    }

    // A violated invariant means the authoritative timeline is compromised;
    // aborting here lets a supervisor restart the process.
    #[cfg(debug_assertions)]
    fn assert_invariants(&self) {
        for player in self.players.values() {
            assert!(player.cells.len() <= PLAYER_MAX_CELLS);
            for cell in &player.cells {
                assert!((MIN_CELL_RADIUS..=MAX_CELL_RADIUS).contains(&cell.radius));
                assert!(cell.position.x >= cell.radius && cell.position.x <= WORLD_WIDTH - cell.radius);
                assert!(cell.position.y >= cell.radius && cell.position.y <= WORLD_HEIGHT - cell.radius);
            }
        }
        assert!(self.food.len() <= MAX_FOOD_COUNT);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn food_info(food: &Food) -> FoodInfo {
    FoodInfo {
        food_id: food.id,
        x: food.position.x,
        y: food.position.y,
        radius: food.radius,
        color: food.color.clone(),
        vel_x: food.velocity.x,
        vel_y: food.velocity.y,
    }
}
