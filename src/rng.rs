/// Small seeded generator so a game replays identically from its seed.
#[derive(Clone, Debug)]
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b79f5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform index in `0..len`; zero for empty or singleton ranges.
    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        ((self.next_u32() as u64 * len as u64) >> 32) as usize
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.pick_index(items.len());
        items.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn pick_index_stays_in_range() {
        let mut rng = Rng::new(7);
        for len in 1..20usize {
            for _ in 0..200 {
                assert!(rng.pick_index(len) < len);
            }
        }
        assert_eq!(rng.pick_index(0), 0);
    }

    #[test]
    fn pick_index_reaches_every_slot() {
        let mut rng = Rng::new(99);
        let mut seen = [false; 4];
        for _ in 0..400 {
            seen[rng.pick_index(4)] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }

    #[test]
    fn choose_on_empty_slice_is_none() {
        let mut rng = Rng::new(1);
        let empty: [i32; 0] = [];
        assert_eq!(rng.choose(&empty), None);
        assert_eq!(rng.choose(&[5]), Some(&5));
    }
}
