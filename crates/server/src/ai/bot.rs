//! Per-bot decision policy.

use rand::Rng;
use uuid::Uuid;

use crate::constants::{PLAYER_MAX_CELLS, WORLD_HEIGHT, WORLD_WIDTH};
use crate::geometry::{distance, Vec2};
use crate::world::World;

/// How far a bot looks for food and enemies.
const SEARCH_RADIUS: f64 = 400.0;
/// Seconds of world clock between decisions.
const DECISION_DELAY: f64 = 0.3;

/// A server-owned player whose target is chosen by `act`.
#[derive(Debug)]
pub struct Bot {
    pub player_id: Uuid,
    next_decision_at: f64,
}

impl Bot {
    pub fn new(player_id: Uuid) -> Self {
        Self { player_id, next_decision_at: 0.0 }
    }

    /// Run one decision pass: pick a target, maybe split toward it.
    pub fn act(&mut self, world: &mut World) {
        let now = world.clock();
        if now < self.next_decision_at {
            return;
        }
        self.next_decision_at = now + DECISION_DELAY;

        let Some(player) = world.player(self.player_id) else { return };
        let Some(center) = player.center() else { return };
        let own_mass = player.total_mass();

        let target = match find_target(world, self.player_id, center, own_mass) {
            Some(target) => target,
            None => wander(world, center),
        };
        world.set_target(self.player_id, target.x, target.y);

        if self.should_split(world, center, target, own_mass) {
            world.split(self.player_id);
        }
    }

    /// Occasionally split-charge a target that is close and worth it.
    fn should_split(&self, world: &mut World, center: Vec2, target: Vec2, own_mass: f64) -> bool {
        let Some(player) = world.player(self.player_id) else { return false };
        if player.cells.len() >= PLAYER_MAX_CELLS / 2 {
            return false;
        }
        if distance(center, target) >= 100.0 || own_mass <= 80.0 {
            return false;
        }
        if world.rng_mut().random::<f64>() >= 0.3 {
            return false;
        }
        let now = world.clock();
        world
            .player(self.player_id)
            .is_some_and(|p| p.cells.iter().any(|c| c.can_split(now)))
    }
}

/// Pick the most interesting point within the search radius: flee a heavier
/// enemy, chase a clearly lighter one, otherwise head for the closest food.
fn find_target(world: &World, self_id: Uuid, center: Vec2, own_mass: f64) -> Option<Vec2> {
    let mut closest_food: Option<Vec2> = None;
    let mut closest_food_dist = f64::MAX;
    for food in world.food.values() {
        let dist = distance(center, food.position);
        if dist < SEARCH_RADIUS && dist < closest_food_dist {
            closest_food_dist = dist;
            closest_food = Some(food.position);
        }
    }

    let mut closest_enemy: Option<Vec2> = None;
    let mut closest_enemy_dist = f64::MAX;
    for enemy in world.players.values() {
        if enemy.id == self_id || !enemy.is_alive() {
            continue;
        }
        let Some(enemy_center) = enemy.center() else { continue };
        let enemy_mass = enemy.total_mass();
        let dist = distance(center, enemy_center);

        // Prey: noticeably lighter and within reach.
        if own_mass > enemy_mass * 1.2 && dist < SEARCH_RADIUS && dist < closest_enemy_dist {
            closest_enemy_dist = dist;
            closest_enemy = Some(enemy_center);
        }

        // Threat: noticeably heavier and close; run the other way.
        if own_mass < enemy_mass * 0.8 && dist < SEARCH_RADIUS / 2.0 {
            let away = (center - enemy_center).normalize_or_zero();
            return Some(center + away * SEARCH_RADIUS);
        }
    }

    // Prey wins over food only when it is twice as close.
    if let Some(enemy) = closest_enemy {
        if closest_enemy_dist < closest_food_dist / 2.0 {
            return Some(enemy);
        }
    }
    closest_food
}

/// No target in sight: drift toward a random nearby point.
fn wander(world: &mut World, center: Vec2) -> Vec2 {
    let rng = world.rng_mut();
    let angle = rng.random_range(0.0..std::f64::consts::TAU);
    let dist = 200.0 + rng.random::<f64>() * 300.0;
    Vec2::new(
        (center.x + angle.cos() * dist).clamp(50.0, WORLD_WIDTH - 50.0),
        (center.y + angle.sin() * dist).clamp(50.0, WORLD_HEIGHT - 50.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_bot(seed: u64) -> (World, Bot) {
        let mut world = World::with_seed(seed);
        world.food.clear();
        let color = world.random_player_color();
        let id = world.add_player("bot", color, true);
        (world, Bot::new(id))
    }

    #[test]
    fn wander_when_nothing_in_sight() {
        let (mut world, mut bot) = world_with_bot(1);
        let before = world.player(bot.player_id).unwrap().target;

        bot.act(&mut world);

        let target = world.player(bot.player_id).unwrap().target;
        assert_ne!(target, before);
        assert!(target.x >= 50.0 && target.x <= WORLD_WIDTH - 50.0);
        assert!(target.y >= 50.0 && target.y <= WORLD_HEIGHT - 50.0);
    }

    #[test]
    fn heads_for_nearby_food() {
        let (mut world, mut bot) = world_with_bot(2);
        let center = world.player(bot.player_id).unwrap().center().unwrap();
        let pellet_pos = center + Vec2::new(150.0, 0.0);
        let pellet =
            crate::entity::Food::new(pellet_pos, "#F7DC6F".to_string(), -1.0);
        world.food.insert(pellet.id, pellet);

        bot.act(&mut world);

        assert_eq!(world.player(bot.player_id).unwrap().target, pellet_pos);
    }

    #[test]
    fn chases_much_lighter_enemy_when_twice_as_close() {
        let (mut world, mut bot) = world_with_bot(3);
        let center = world.player(bot.player_id).unwrap().center().unwrap();
        {
            let player = world.players.get_mut(&bot.player_id).unwrap();
            player.cells[0].set_mass(100.0);
        }
        // Lighter enemy nearby, food much farther away.
        let color = world.random_player_color();
        let enemy = world.add_player("prey", color, false);
        let enemy_pos = center + Vec2::new(80.0, 0.0);
        world.players.get_mut(&enemy).unwrap().cells[0].position = enemy_pos;
        let pellet =
            crate::entity::Food::new(center + Vec2::new(0.0, 390.0), "#F7DC6F".to_string(), -1.0);
        world.food.insert(pellet.id, pellet);

        bot.act(&mut world);

        assert_eq!(world.player(bot.player_id).unwrap().target, enemy_pos);
    }

    #[test]
    fn flees_from_much_heavier_enemy() {
        let (mut world, mut bot) = world_with_bot(4);
        let center = world.player(bot.player_id).unwrap().center().unwrap();
        let color = world.random_player_color();
        let enemy = world.add_player("hunter", color, false);
        let enemy_pos = center + Vec2::new(100.0, 0.0);
        {
            let player = world.players.get_mut(&enemy).unwrap();
            player.cells[0].position = enemy_pos;
            player.cells[0].set_mass(400.0);
        }

        bot.act(&mut world);

        let target = world.player(bot.player_id).unwrap().target;
        // The escape point lies on the far side of the bot from the enemy.
        assert!(target.x < center.x);
        assert!((distance(center, target) - SEARCH_RADIUS).abs() < 1e-9);
    }

    #[test]
    fn decisions_are_rate_limited() {
        let (mut world, mut bot) = world_with_bot(5);
        bot.act(&mut world);
        let first = world.player(bot.player_id).unwrap().target;

        // Still within the decision delay: a second act changes nothing.
        bot.act(&mut world);
        assert_eq!(world.player(bot.player_id).unwrap().target, first);
    }
}
