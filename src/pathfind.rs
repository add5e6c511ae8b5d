use std::collections::VecDeque;

use crate::board::PassabilityMap;
use crate::types::Position;

/// Shortest 4-connected path from `start` to `goal`, excluding `start` and ending at `goal`.
///
/// Empty when the goal is unreachable, impassable, or already reached.
pub fn find_path(map: &PassabilityMap, start: Position, goal: Position) -> Vec<Position> {
    if !map.is_passable(goal) {
        return Vec::new();
    }
    find_path_where(map, start, |pos| pos == goal)
}

/// Breadth-first search toward the nearest cell accepted by `is_goal`.
///
/// Neighbours expand in up, down, left, right order, so ties resolve the same way every run.
pub fn find_path_where<F>(map: &PassabilityMap, start: Position, is_goal: F) -> Vec<Position>
where
    F: Fn(Position) -> bool,
{
    if !map.contains(start) || is_goal(start) {
        return Vec::new();
    }

    let width = map.width() as usize;
    let index = |pos: Position| pos.row as usize * width + pos.col as usize;
    let mut came_from: Vec<Option<Position>> = vec![None; width * map.height() as usize];
    let mut visited = vec![false; came_from.len()];
    let mut queue = VecDeque::new();

    visited[index(start)] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for next in map.passable_neighbours(current) {
            let slot = index(next);
            if visited[slot] {
                continue;
            }
            visited[slot] = true;
            came_from[slot] = Some(current);
            if is_goal(next) {
                return rebuild_path(&came_from, index, start, next);
            }
            queue.push_back(next);
        }
    }

    Vec::new()
}

fn rebuild_path<I>(
    came_from: &[Option<Position>],
    index: I,
    start: Position,
    goal: Position,
) -> Vec<Position>
where
    I: Fn(Position) -> usize,
{
    let mut path = vec![goal];
    let mut cursor = goal;
    while let Some(prev) = came_from[index(cursor)] {
        if prev == start {
            break;
        }
        path.push(prev);
        cursor = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_from_rows(rows: &[&str]) -> PassabilityMap {
        let height = rows.len();
        let width = rows.first().map(|row| row.len()).unwrap_or(0);
        PassabilityMap::new(
            height,
            width,
            rows.iter()
                .flat_map(|row| row.chars())
                .map(|c| c != '#')
                .collect(),
        )
    }

    fn assert_contiguous(start: Position, path: &[Position]) {
        let mut prev = start;
        for step in path {
            assert_eq!(prev.manhattan(*step), 1, "jump from {prev:?} to {step:?}");
            prev = *step;
        }
    }

    #[test]
    fn open_grid_path_has_manhattan_length() {
        let map = PassabilityMap::open(5, 5);
        let start = Position::new(0, 0);
        let goal = Position::new(4, 4);
        let path = find_path(&map, start, goal);
        assert_eq!(path.len(), 8);
        assert_eq!(path.last(), Some(&goal));
        assert!(!path.contains(&start));
        assert_contiguous(start, &path);
    }

    #[test]
    fn path_goes_around_walls() {
        let map = map_from_rows(&[
            "     ", //
            " ### ", //
            "   # ", //
            "## # ", //
            "     ",
        ]);
        let start = Position::new(2, 0);
        let goal = Position::new(2, 2);
        let path = find_path(&map, start, goal);
        assert_eq!(path, vec![Position::new(2, 1), goal]);

        let far = Position::new(4, 0);
        let detour = find_path(&map, start, far);
        assert_contiguous(start, &detour);
        assert_eq!(detour.last(), Some(&far));
        for step in &detour {
            assert!(map.is_passable(*step));
        }
        assert_eq!(detour.len(), 6);
    }

    #[test]
    fn walled_off_goal_yields_empty_path() {
        let map = map_from_rows(&[
            "     ", //
            " ### ", //
            " # # ", //
            " ### ", //
            "     ",
        ]);
        assert!(find_path(&map, Position::new(0, 0), Position::new(2, 2)).is_empty());
    }

    #[test]
    fn impassable_or_reached_goal_yields_empty_path() {
        let map = map_from_rows(&["  #", "   "]);
        assert!(find_path(&map, Position::new(0, 0), Position::new(0, 2)).is_empty());
        assert!(find_path(&map, Position::new(1, 1), Position::new(1, 1)).is_empty());
        assert!(find_path(&map, Position::new(0, 0), Position::new(9, 9)).is_empty());
    }

    #[test]
    fn adjacent_goal_is_single_step() {
        let map = PassabilityMap::open(3, 3);
        let path = find_path(&map, Position::new(1, 1), Position::new(1, 2));
        assert_eq!(path, vec![Position::new(1, 2)]);
    }

    #[test]
    fn predicate_search_finds_nearest_match() {
        let map = PassabilityMap::open(1, 7);
        let start = Position::new(0, 3);
        let targets = [Position::new(0, 0), Position::new(0, 5)];
        let path = find_path_where(&map, start, |pos| targets.contains(&pos));
        assert_eq!(path, vec![Position::new(0, 4), Position::new(0, 5)]);
    }

    #[test]
    fn equal_length_paths_resolve_deterministically() {
        let map = PassabilityMap::open(3, 3);
        let start = Position::new(0, 0);
        let goal = Position::new(1, 1);
        let first = find_path(&map, start, goal);
        for _ in 0..10 {
            assert_eq!(find_path(&map, start, goal), first);
        }
        // down is expanded before right
        assert_eq!(first, vec![Position::new(1, 0), goal]);
    }
}
