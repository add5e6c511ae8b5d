use crate::board::{Board, CLASSIC_LAYOUT};
use crate::constants::{
    fruit_tier_for_level, power_duration_ms, pursuer_start, DOT_REWARD, EXTRA_LIFE_SCORE,
    GHOST_BASE_REWARD, PLAYER_MOVE_COOLDOWN_MS, PLAYER_START, PURSUER_MOVE_COOLDOWN_MS,
};
use crate::entity::{Collectible, Entity, Player, Pursuer};
use crate::error::EngineError;
use crate::rng::Rng;
use crate::types::{
    Frame, FruitTier, GamePhase, GameSummary, HeldDirections, Position, PursuerName,
    RuntimeEvent,
};

mod level_system;
mod pursuer_system;

#[derive(Clone, Debug, Default)]
struct GameTotals {
    dots: u32,
    pursuers: u32,
    fruits: u32,
}

#[derive(Clone, Debug, Default)]
pub struct GameEngineOptions {
    pub seed: u32,
}

/// Owns one game session. Every rule is applied here and nowhere else.
#[derive(Clone, Debug)]
pub struct GameEngine {
    seed: u32,
    rng: Rng,
    phase: GamePhase,

    pristine_board: Board,
    board: Board,
    player: Player,
    pursuers: Vec<Pursuer>,
    pills: Vec<Collectible>,
    fruit: Collectible,
    fruit_tier: FruitTier,

    level: u32,
    score: u32,
    remaining_dots: u32,
    dots_consumed: u32,
    fruits_spawned: u32,
    ghost_reward: u32,
    got_extra_life: bool,
    player_hit: bool,
    totals: GameTotals,

    clock_ms: u64,
    last_player_move_ms: u64,
    last_pursuer_move_ms: u64,
    events: Vec<RuntimeEvent>,
}

impl GameEngine {
    pub fn new(options: GameEngineOptions) -> Result<Self, EngineError> {
        Self::with_layout(CLASSIC_LAYOUT, options)
    }

    pub fn with_layout(layout: &[&str], options: GameEngineOptions) -> Result<Self, EngineError> {
        let pristine_board = Board::from_layout(layout)?;
        pristine_board.require_passable(PLAYER_START, "player start")?;
        for idx in 0..PursuerName::ROSTER.len() {
            pristine_board.require_passable(pursuer_start(idx), "pursuer start")?;
        }
        for pill in pristine_board.pill_spawns() {
            pristine_board.require_passable(pill, "power pill")?;
        }
        if pristine_board.dot_count() == 0 {
            return Err(EngineError::NoDots);
        }

        let pursuers = PursuerName::ROSTER
            .iter()
            .enumerate()
            .map(|(idx, name)| Pursuer::new(*name, pursuer_start(idx)))
            .collect();
        let fruit_tier = fruit_tier_for_level(1);

        let mut engine = Self {
            seed: options.seed,
            rng: Rng::new(options.seed),
            phase: GamePhase::Ready,
            board: pristine_board.clone(),
            pristine_board,
            player: Player::new(PLAYER_START),
            pursuers,
            pills: Vec::new(),
            fruit: Collectible::dormant_fruit(fruit_tier),
            fruit_tier,
            level: 1,
            score: 0,
            remaining_dots: 0,
            dots_consumed: 0,
            fruits_spawned: 0,
            ghost_reward: GHOST_BASE_REWARD,
            got_extra_life: false,
            player_hit: false,
            totals: GameTotals::default(),
            clock_ms: 0,
            last_player_move_ms: 0,
            last_pursuer_move_ms: 0,
            events: Vec::new(),
        };
        engine.load_level();
        Ok(engine)
    }

    /// Leaves the pre-game state. Returns false if a game is already running.
    pub fn start(&mut self) -> bool {
        if self.phase == GamePhase::Playing {
            return false;
        }
        self.phase = GamePhase::Playing;
        self.last_player_move_ms = self.clock_ms;
        self.last_pursuer_move_ms = self.clock_ms;
        true
    }

    /// Runs one tick: `elapsed_ms` is the time since the previous call.
    pub fn advance(&mut self, elapsed_ms: u64, held: HeldDirections) -> Frame {
        self.clock_ms = self.clock_ms.saturating_add(elapsed_ms);
        if self.phase == GamePhase::Ready {
            return self.drain_frame();
        }
        let now_ms = self.clock_ms;

        if self.is_game_over() {
            self.reset_after_game_over();
            return self.drain_frame();
        }
        if self.level_ended() {
            self.advance_level();
        }

        self.update_power(now_ms);

        if now_ms.saturating_sub(self.last_player_move_ms) >= PLAYER_MOVE_COOLDOWN_MS {
            let target = held.target_from(self.player.pos);
            if target != self.player.pos {
                self.try_move_player(target);
            }
            self.last_player_move_ms = now_ms;
        }
        self.maybe_spawn_fruit();

        if now_ms.saturating_sub(self.last_pursuer_move_ms) >= PURSUER_MOVE_COOLDOWN_MS {
            self.move_pursuers();
            self.last_pursuer_move_ms = now_ms;
        }

        if self.player_hit {
            self.player.lose_life();
            self.events.push(RuntimeEvent::PlayerHit {
                lives_left: self.player.lives,
            });
            self.restart_positions();
        }

        self.drain_frame()
    }

    /// Attempts to put the player on `target`. False when the cell is a wall or a
    /// pursuer blocks it; in the latter case a collision is left pending.
    pub fn try_move_player(&mut self, target: Position) -> bool {
        if !self.board.is_passable(target) {
            return false;
        }

        let blockers = self.pursuers_at(target);
        if !blockers.is_empty() {
            if !self.player.powered_up {
                self.player_hit = true;
                return false;
            }
            for idx in blockers {
                self.eat_pursuer(idx, target);
            }
        }

        if let Some(pill_idx) = self.pills.iter().position(|pill| pill.is_at(target)) {
            let reward = self.pills[pill_idx].reward();
            self.pills[pill_idx].die();
            let power_ms = power_duration_ms(self.level);
            self.player.power_up(self.clock_ms.saturating_add(power_ms));
            self.events.push(RuntimeEvent::PillTaken {
                at: target,
                power_ms,
            });
            self.award(reward);
        }

        self.player.pos = target;

        if self.board.take_dot(target) {
            self.dots_consumed += 1;
            self.remaining_dots = self.remaining_dots.saturating_sub(1);
            self.totals.dots += 1;
            self.events.push(RuntimeEvent::DotEaten { at: target });
            self.award(DOT_REWARD);
        }

        if self.fruit.is_at(target) {
            let reward = self.fruit.reward();
            self.fruit.die();
            self.totals.fruits += 1;
            self.events.push(RuntimeEvent::FruitTaken {
                tier: self.fruit_tier,
            });
            self.award(reward);
        }

        true
    }

    pub fn reset_consumed_ghost_reward(&mut self) {
        self.ghost_reward = GHOST_BASE_REWARD;
    }

    /// Puts the player and every pursuer back on their level-start cells.
    pub fn restart_positions(&mut self) {
        for pursuer in &mut self.pursuers {
            pursuer.send_home();
        }
        self.player.pos = PLAYER_START;
        self.player_hit = false;
    }

    pub fn level_ended(&self) -> bool {
        self.remaining_dots == 0
    }

    pub fn is_game_over(&self) -> bool {
        self.player.lives == 0
    }

    pub fn has_pending_collision(&self) -> bool {
        self.player_hit
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.player.lives
    }

    pub fn is_powered_up(&self) -> bool {
        self.player.powered_up
    }

    pub fn ghost_reward(&self) -> u32 {
        self.ghost_reward
    }

    pub fn remaining_dots(&self) -> u32 {
        self.remaining_dots
    }

    pub fn dots_consumed(&self) -> u32 {
        self.dots_consumed
    }

    /// Reward tier of this level's bonus fruit; renderers use it to pick a sprite.
    pub fn fruit_tier(&self) -> FruitTier {
        self.fruit_tier
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn pursuers(&self) -> &[Pursuer] {
        &self.pursuers
    }

    pub fn pills(&self) -> &[Collectible] {
        &self.pills
    }

    pub fn fruit(&self) -> &Collectible {
        &self.fruit
    }

    /// Every entity in paint order: fruit, pills, pursuers, then the player on top.
    pub fn entities(&self) -> Vec<Entity<'_>> {
        let mut out = Vec::with_capacity(2 + self.pills.len() + self.pursuers.len());
        out.push(Entity::Collectible(&self.fruit));
        out.extend(self.pills.iter().map(Entity::Collectible));
        out.extend(self.pursuers.iter().map(Entity::Pursuer));
        out.push(Entity::Player(&self.player));
        out
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            score: self.score,
            level: self.level,
            dots_eaten: self.totals.dots,
            pursuers_eaten: self.totals.pursuers,
            fruits_eaten: self.totals.fruits,
        }
    }

    /// Current frame without draining pending events.
    pub fn frame(&self) -> Frame {
        self.build_frame(Vec::new())
    }

    fn drain_frame(&mut self) -> Frame {
        let events = std::mem::take(&mut self.events);
        self.build_frame(events)
    }

    fn build_frame(&self, events: Vec<RuntimeEvent>) -> Frame {
        let mut grid = self.board.symbol_grid();
        for entity in self.entities() {
            if !entity.is_present() {
                continue;
            }
            let pos = entity.position();
            if pos.row < 0 || pos.col < 0 {
                continue;
            }
            if let Some(cell) = grid
                .get_mut(pos.row as usize)
                .and_then(|row| row.get_mut(pos.col as usize))
            {
                *cell = entity.symbol();
            }
        }

        Frame {
            phase: self.phase,
            level: self.level,
            score: self.score,
            lives: self.player.lives,
            powered_up: self.player.powered_up,
            fruit_tier: self.fruit_tier,
            remaining_dots: self.remaining_dots,
            grid,
            events,
        }
    }

    fn update_power(&mut self, now_ms: u64) {
        if self.player.powered_up && now_ms >= self.player.power_until_ms {
            self.player.power_down();
            self.reset_consumed_ghost_reward();
            self.events.push(RuntimeEvent::PowerExpired);
        }
    }

    fn award(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        if !self.got_extra_life && self.score >= EXTRA_LIFE_SCORE {
            self.got_extra_life = true;
            self.player.lives += 1;
            self.events.push(RuntimeEvent::ExtraLife {
                lives: self.player.lives,
            });
        }
    }

    /// `player_cell` is where the player stands once the capture resolves.
    fn eat_pursuer(&mut self, idx: usize, player_cell: Position) {
        let Some(home) = self.pursuers.get(idx).map(|pursuer| pursuer.home) else {
            return;
        };
        let landing = cluster_cell_clear_of(home, player_cell);
        let pursuer = &mut self.pursuers[idx];
        pursuer.pos = landing;
        let name = pursuer.name;
        let reward = self.ghost_reward;
        self.ghost_reward = self.ghost_reward.saturating_mul(2);
        self.totals.pursuers += 1;
        self.events.push(RuntimeEvent::PursuerEaten { name, reward });
        self.award(reward);
    }

    fn pursuers_at(&self, pos: Position) -> Vec<usize> {
        self.pursuers
            .iter()
            .enumerate()
            .filter(|(_, pursuer)| pursuer.pos == pos)
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// The pursuer's own home, or the nearest other cluster cell when the player stands on it.
fn cluster_cell_clear_of(home: Position, player_cell: Position) -> Position {
    if home != player_cell {
        return home;
    }
    (0..PursuerName::ROSTER.len())
        .map(pursuer_start)
        .filter(|cell| *cell != player_cell)
        .min_by_key(|cell| cell.manhattan(home))
        .unwrap_or(home)
}
