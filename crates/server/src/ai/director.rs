//! Bot lifecycle and repopulation.

use tracing::debug;

use super::Bot;
use crate::world::World;

/// Cycling pool of bot display names.
const BOT_NAMES: &[&str] = &[
    "BotAlpha", "BotBeta", "BotGamma", "BotDelta", "BotEpsilon", "BotZeta", "BotEta", "BotTheta",
    "BotIota", "BotKappa", "BotLambda", "BotMu", "BotNu", "BotXi", "BotOmicron", "BotPi",
];

/// Keeps the arena populated with `max_bots` bots.
#[derive(Debug)]
pub struct BotDirector {
    bots: Vec<Bot>,
    max_bots: usize,
    name_index: usize,
}

impl BotDirector {
    pub fn new(max_bots: usize) -> Self {
        Self { bots: Vec::new(), max_bots, name_index: 0 }
    }

    pub fn bot_count(&self) -> usize {
        self.bots.len()
    }

    pub fn max_bots(&self) -> usize {
        self.max_bots
    }

    /// Spawn bots until the target population is reached.
    pub fn spawn_to_target(&mut self, world: &mut World) {
        while self.bots.len() < self.max_bots {
            let name = BOT_NAMES[self.name_index % BOT_NAMES.len()];
            self.name_index += 1;
            let color = world.random_player_color();
            let player_id = world.add_player(name, color, true);
            debug!("spawned bot {name} as player {player_id}");
            self.bots.push(Bot::new(player_id));
        }
    }

    /// Raise the target and refill immediately.
    pub fn add_bots(&mut self, world: &mut World, count: usize) {
        self.max_bots += count;
        self.spawn_to_target(world);
    }

    /// Remove up to `count` bots; their players leave the world with them.
    /// Returns how many were removed.
    pub fn remove_bots(&mut self, world: &mut World, count: usize) -> usize {
        let mut removed = 0;
        while removed < count {
            let Some(bot) = self.bots.pop() else { break };
            world.remove_player(bot.player_id);
            removed += 1;
        }
        self.max_bots = self.max_bots.saturating_sub(removed);
        removed
    }

    /// Drop bots whose player died, let the rest act, then refill.
    pub fn tick(&mut self, world: &mut World) {
        let mut i = 0;
        while i < self.bots.len() {
            if world.player(self.bots[i].player_id).is_none() {
                debug!("bot player {} died, retiring bot", self.bots[i].player_id);
                self.bots.swap_remove(i);
                continue;
            }
            self.bots[i].act(world);
            i += 1;
        }
        self.spawn_to_target(world);
    }
}
