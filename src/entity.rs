use crate::constants::{PILL_REWARD, STARTING_LIVES};
use crate::types::{CellSymbol, FruitTier, Position, PursuerName};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub pos: Position,
    pub lives: u32,
    pub powered_up: bool,
    pub power_until_ms: u64,
}

impl Player {
    pub fn new(start: Position) -> Self {
        Self {
            pos: start,
            lives: STARTING_LIVES,
            powered_up: false,
            power_until_ms: 0,
        }
    }

    pub fn power_up(&mut self, until_ms: u64) {
        self.powered_up = true;
        self.power_until_ms = until_ms;
    }

    pub fn power_down(&mut self) {
        self.powered_up = false;
        self.power_until_ms = 0;
    }

    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pursuer {
    pub name: PursuerName,
    pub pos: Position,
    pub home: Position,
    pub chases_player: bool,
}

impl Pursuer {
    pub fn new(name: PursuerName, home: Position) -> Self {
        Self {
            name,
            pos: home,
            home,
            chases_player: name.chases_player(),
        }
    }

    pub fn send_home(&mut self) {
        self.pos = self.home;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectibleKind {
    PowerPill,
    Fruit(FruitTier),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collectible {
    pub kind: CollectibleKind,
    pub pos: Position,
    pub alive: bool,
}

impl Collectible {
    pub fn pill(at: Position) -> Self {
        Self {
            kind: CollectibleKind::PowerPill,
            pos: at,
            alive: true,
        }
    }

    /// Fruit starts dormant and waits for the spawn policy.
    pub fn dormant_fruit(tier: FruitTier) -> Self {
        Self {
            kind: CollectibleKind::Fruit(tier),
            pos: Position::new(0, 0),
            alive: false,
        }
    }

    pub fn reward(&self) -> u32 {
        match self.kind {
            CollectibleKind::PowerPill => PILL_REWARD,
            CollectibleKind::Fruit(tier) => tier.reward(),
        }
    }

    pub fn live_at(&mut self, pos: Position) {
        self.pos = pos;
        self.alive = true;
    }

    pub fn die(&mut self) {
        self.alive = false;
    }

    pub fn is_at(&self, pos: Position) -> bool {
        self.alive && self.pos == pos
    }
}

/// Borrowed view over any entity the engine owns.
#[derive(Clone, Copy, Debug)]
pub enum Entity<'a> {
    Player(&'a Player),
    Pursuer(&'a Pursuer),
    Collectible(&'a Collectible),
}

impl Entity<'_> {
    pub fn position(&self) -> Position {
        match self {
            Entity::Player(player) => player.pos,
            Entity::Pursuer(pursuer) => pursuer.pos,
            Entity::Collectible(item) => item.pos,
        }
    }

    /// Dead collectibles stay owned by the engine but are not on the board.
    pub fn is_present(&self) -> bool {
        match self {
            Entity::Player(_) | Entity::Pursuer(_) => true,
            Entity::Collectible(item) => item.alive,
        }
    }

    pub fn symbol(&self) -> CellSymbol {
        match self {
            Entity::Player(_) => CellSymbol::Player,
            Entity::Pursuer(pursuer) => CellSymbol::Pursuer(pursuer.name),
            Entity::Collectible(item) => match item.kind {
                CollectibleKind::PowerPill => CellSymbol::PowerPill,
                CollectibleKind::Fruit(_) => CellSymbol::Fruit,
            },
        }
    }
}
