//! Playback window rules.

use crate::variants::{Difficulty, Dimension};
use anyhow::{bail, Result};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Songs whose computed start falls this close to the beginning start at 0.
const SNAP_TO_START_SECS: u32 = 10;

/// The window start never goes past this fraction of the playable remainder.
const MAX_START_FRACTION: f64 = 0.8;

/// Clip bounds for one difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ClipTier {
    pub min_secs: u32,
    pub max_secs: u32,
    /// Probability of starting at 0 regardless of the drawn offset.
    pub start_from_beginning_chance: f64,
}

impl ClipTier {
    pub const fn fixed(secs: u32) -> Self {
        ClipTier {
            min_secs: secs,
            max_secs: secs,
            start_from_beginning_chance: 0.0,
        }
    }

    fn validate(&self, difficulty: Difficulty) -> Result<()> {
        if self.min_secs == 0 || self.min_secs > self.max_secs {
            bail!(
                "Clip tier {}: expected 0 < min_secs <= max_secs, got {}..{}",
                difficulty,
                self.min_secs,
                self.max_secs
            );
        }
        if !(0.0..=1.0).contains(&self.start_from_beginning_chance) {
            bail!(
                "Clip tier {}: start_from_beginning_chance must be within [0, 1], got {}",
                difficulty,
                self.start_from_beginning_chance
            );
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClipTiers {
    tiers: BTreeMap<Difficulty, ClipTier>,
}

impl Default for ClipTiers {
    fn default() -> Self {
        let tiers = BTreeMap::from([
            (Difficulty::VeryEasy, ClipTier::fixed(60)),
            (Difficulty::Easy, ClipTier::fixed(45)),
            (Difficulty::Medium, ClipTier::fixed(30)),
            (Difficulty::Hard, ClipTier::fixed(15)),
            (
                Difficulty::VeryHard,
                ClipTier {
                    min_secs: 6,
                    max_secs: 12,
                    start_from_beginning_chance: 0.0,
                },
            ),
        ]);
        ClipTiers { tiers }
    }
}

impl ClipTiers {
    /// Replaces the bounds of a concrete tier.
    pub fn set(&mut self, difficulty: Difficulty, tier: ClipTier) -> Result<()> {
        if difficulty.is_wildcard() {
            bail!("Clip tiers can only be set for concrete difficulties");
        }
        tier.validate(difficulty)?;
        self.tiers.insert(difficulty, tier);
        Ok(())
    }

    pub fn get(&self, difficulty: Difficulty) -> Option<&ClipTier> {
        self.tiers.get(&difficulty)
    }

    /// The tier used for `difficulty`; a wildcard picks a concrete tier
    /// uniformly.
    fn pick<R: Rng>(&self, difficulty: Difficulty, rng: &mut R) -> (Difficulty, ClipTier) {
        let concrete = if difficulty.is_wildcard() {
            let all: Vec<Difficulty> = Difficulty::concrete().collect();
            all[rng.random_range(0..all.len())]
        } else {
            difficulty
        };
        let tier = self
            .tiers
            .get(&concrete)
            .copied()
            .unwrap_or(ClipTier::fixed(30));
        (concrete, tier)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ClipWindow {
    pub start_secs: u32,
    pub duration_secs: u32,
    /// Tier the bounds were taken from (the drawn one for RANDOM).
    #[serde(skip)]
    pub tier: Difficulty,
}

/// Picks where to start playing a song of `song_duration_secs` and for how
/// long.
pub fn compute_window<R: Rng>(
    tiers: &ClipTiers,
    difficulty: Difficulty,
    song_duration_secs: u32,
    rng: &mut R,
) -> ClipWindow {
    let (tier_name, tier) = tiers.pick(difficulty, rng);
    let duration = rng.random_range(tier.min_secs..=tier.max_secs);

    if song_duration_secs <= duration {
        return ClipWindow {
            start_secs: 0,
            duration_secs: song_duration_secs,
            tier: tier_name,
        };
    }

    let remaining = song_duration_secs - duration;
    let max_start = (remaining as f64 * MAX_START_FRACTION).floor() as u32;
    let mut start = rng.random_range(0..max_start.max(1));
    if start < SNAP_TO_START_SECS {
        start = 0;
    }
    if tier.start_from_beginning_chance > 0.0 && rng.random_bool(tier.start_from_beginning_chance) {
        start = 0;
    }

    ClipWindow {
        start_secs: start,
        duration_secs: duration,
        tier: tier_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn default_durations_per_tier() {
        let tiers = ClipTiers::default();
        let mut rng = rng();
        for (difficulty, expected) in [
            (Difficulty::VeryEasy, 60),
            (Difficulty::Easy, 45),
            (Difficulty::Medium, 30),
            (Difficulty::Hard, 15),
        ] {
            let window = compute_window(&tiers, difficulty, 300, &mut rng);
            assert_eq!(window.duration_secs, expected);
            assert_eq!(window.tier, difficulty);
        }
        for _ in 0..100 {
            let window = compute_window(&tiers, Difficulty::VeryHard, 300, &mut rng);
            assert!((6..=12).contains(&window.duration_secs));
        }
    }

    #[test]
    fn window_stays_inside_song() {
        let tiers = ClipTiers::default();
        let mut rng = rng();
        for _ in 0..1000 {
            let window = compute_window(&tiers, Difficulty::Medium, 200, &mut rng);
            // remaining = 170, max_start = floor(170 * 0.8) = 136
            assert!(window.start_secs < 136);
            assert!(window.start_secs == 0 || window.start_secs >= 10);
            assert!(window.start_secs + window.duration_secs <= 200);
        }
    }

    #[test]
    fn easy_window_on_four_minute_song() {
        let tiers = ClipTiers::default();
        let mut rng = rng();
        for _ in 0..1000 {
            let window = compute_window(&tiers, Difficulty::Easy, 240, &mut rng);
            assert_eq!(window.duration_secs, 45);
            // remaining = 195, max_start = floor(195 * 0.8) = 156
            assert!(window.start_secs < 156);
            assert!(window.start_secs == 0 || window.start_secs >= 10);
        }
    }

    #[test]
    fn short_song_is_played_whole() {
        let tiers = ClipTiers::default();
        let window = compute_window(&tiers, Difficulty::Easy, 40, &mut rng());
        assert_eq!(window.start_secs, 0);
        assert_eq!(window.duration_secs, 40);

        let exact = compute_window(&tiers, Difficulty::Easy, 45, &mut rng());
        assert_eq!((exact.start_secs, exact.duration_secs), (0, 45));
    }

    #[test]
    fn tiny_remainder_starts_at_zero() {
        // remaining = 1, max_start = 0, start drawn from [0, 1)
        let tiers = ClipTiers::default();
        let window = compute_window(&tiers, Difficulty::Hard, 16, &mut rng());
        assert_eq!(window.start_secs, 0);
        assert_eq!(window.duration_secs, 15);
    }

    #[test]
    fn hard_tier_on_very_short_song() {
        // duration 15 >= D = 8, so the song plays whole
        let tiers = ClipTiers::default();
        let window = compute_window(&tiers, Difficulty::Hard, 8, &mut rng());
        assert_eq!((window.start_secs, window.duration_secs), (0, 8));
    }

    fn starts_at_zero(tiers: &ClipTiers, difficulty: Difficulty) -> usize {
        let mut rng = rng();
        (0..2000)
            .filter(|_| compute_window(tiers, difficulty, 400, &mut rng).start_secs == 0)
            .count()
    }

    #[test]
    fn default_tiers_only_snap_short_offsets() {
        // remaining = 340, max_start = 272: about 10 / 272 of the draws snap
        let tiers = ClipTiers::default();
        for difficulty in [Difficulty::VeryEasy, Difficulty::Easy] {
            let from_zero = starts_at_zero(&tiers, difficulty);
            assert!(from_zero < 200, "{} windows started at 0 for {}", from_zero, difficulty);
        }
    }

    #[test]
    fn start_from_beginning_chance_is_opt_in() {
        let mut tiers = ClipTiers::default();
        tiers
            .set(
                Difficulty::VeryEasy,
                ClipTier {
                    start_from_beginning_chance: 0.5,
                    ..ClipTier::fixed(60)
                },
            )
            .unwrap();
        let from_zero = starts_at_zero(&tiers, Difficulty::VeryEasy);
        // 50% forced plus the snapped draws
        assert!(from_zero > 900, "only {} windows started at 0", from_zero);
        assert!(from_zero < 1300, "{} windows started at 0", from_zero);
    }

    #[test]
    fn wildcard_draws_a_concrete_tier() {
        let tiers = ClipTiers::default();
        let mut rng = rng();
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..500 {
            let window = compute_window(&tiers, Difficulty::Random, 600, &mut rng);
            assert!(!window.tier.is_wildcard());
            seen.insert(window.tier);
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn same_seed_same_window() {
        let tiers = ClipTiers::default();
        let a = compute_window(&tiers, Difficulty::Random, 250, &mut StdRng::seed_from_u64(99));
        let b = compute_window(&tiers, Difficulty::Random, 250, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_invalid_overrides() {
        let mut tiers = ClipTiers::default();
        assert!(tiers
            .set(
                Difficulty::Hard,
                ClipTier {
                    min_secs: 20,
                    max_secs: 10,
                    start_from_beginning_chance: 0.0
                }
            )
            .is_err());
        assert!(tiers
            .set(
                Difficulty::Hard,
                ClipTier {
                    start_from_beginning_chance: 1.5,
                    ..ClipTier::fixed(10)
                }
            )
            .is_err());
        assert!(tiers.set(Difficulty::Random, ClipTier::fixed(10)).is_err());

        tiers.set(Difficulty::Hard, ClipTier::fixed(20)).unwrap();
        assert_eq!(tiers.get(Difficulty::Hard), Some(&ClipTier::fixed(20)));
    }
}
