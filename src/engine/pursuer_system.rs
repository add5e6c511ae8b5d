use super::*;
use crate::pathfind::find_path;

impl GameEngine {
    /// Steps every pursuer once, in roster order. A pursuer landing on the player
    /// is eaten while powered up; otherwise the collision waits for the tick to resolve it.
    pub fn move_pursuers(&mut self) {
        for idx in 0..self.pursuers.len() {
            let next = self.choose_pursuer_destination(idx);
            self.pursuers[idx].pos = next;
            if next != self.player.pos {
                continue;
            }
            if self.player.powered_up {
                self.eat_pursuer(idx, next);
            } else {
                self.player_hit = true;
            }
        }
    }

    pub(super) fn choose_pursuer_destination(&mut self, idx: usize) -> Position {
        let Some(pursuer) = self.pursuers.get(idx) else {
            return self.player.pos;
        };
        let from = pursuer.pos;

        if pursuer.chases_player {
            let path = find_path(self.board.passability(), from, self.player.pos);
            if let Some(step) = path.first() {
                return *step;
            }
        }
        self.wander_from(from)
    }

    fn wander_from(&mut self, from: Position) -> Position {
        let options = self.board.passability().passable_neighbours(from);
        self.rng.choose(&options).copied().unwrap_or(from)
    }
}
