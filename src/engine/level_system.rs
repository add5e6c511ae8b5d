use super::*;
use crate::constants::{FRUIT_FIRST_THRESHOLD, FRUIT_SECOND_THRESHOLD, MAX_FRUIT_SPAWNS_PER_LEVEL};

impl GameEngine {
    /// Fresh board, pills and fruit for the current level; score and lives are untouched.
    pub(super) fn load_level(&mut self) {
        self.board = self.pristine_board.clone();
        self.remaining_dots = self.board.dot_count();
        self.dots_consumed = 0;
        self.fruits_spawned = 0;
        self.pills = self
            .board
            .pill_spawns()
            .into_iter()
            .map(Collectible::pill)
            .collect();
        self.fruit = Collectible::dormant_fruit(self.fruit_tier);
        self.player.power_down();
        self.reset_consumed_ghost_reward();
        self.restart_positions();
    }

    pub(super) fn advance_level(&mut self) {
        self.events.push(RuntimeEvent::LevelCleared { level: self.level });
        self.level += 1;
        self.fruit_tier = self.fruit_tier.next();
        self.load_level();
    }

    pub(super) fn reset_after_game_over(&mut self) {
        self.events.push(RuntimeEvent::GameOver {
            summary: self.summary(),
        });

        self.level = 1;
        self.score = 0;
        self.got_extra_life = false;
        self.totals = GameTotals::default();
        self.fruit_tier = fruit_tier_for_level(self.level);
        self.player = Player::new(PLAYER_START);
        self.load_level();
        self.phase = GamePhase::Ready;
    }

    pub(super) fn maybe_spawn_fruit(&mut self) {
        if self.fruit.alive || self.fruits_spawned >= MAX_FRUIT_SPAWNS_PER_LEVEL {
            return;
        }
        let due = self.dots_consumed == FRUIT_FIRST_THRESHOLD
            || self.dots_consumed >= FRUIT_SECOND_THRESHOLD;
        if !due {
            return;
        }

        let mut taken: Vec<Position> = self
            .pills
            .iter()
            .filter(|pill| pill.alive)
            .map(|pill| pill.pos)
            .collect();
        taken.push(self.player.pos);

        let Some(spot) = self.board.random_passable_cell(&mut self.rng, &taken) else {
            return;
        };
        self.fruit.live_at(spot);
        self.fruits_spawned += 1;
        self.events.push(RuntimeEvent::FruitSpawned {
            at: spot,
            tier: self.fruit_tier,
        });
    }
}
