//! Level, power and enchantment cost conversions
//!
//! The save stores raw ("serialized") values; the game displays values
//! transformed by these formulas. All functions are pure.

/// Per-level cost tables, indexed by `[powerful][glided]`
const COST_TABLES: [[[u32; 3]; 2]; 2] = [
    // common
    [[1, 2, 3], [2, 3, 4]],
    // powerful
    [[2, 3, 4], [3, 4, 5]],
];

/// Highest level an enchantment slot can reach
pub const MAX_ENCHANTMENT_LEVEL: u8 = 3;

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Convert serialized XP to the displayed character level (4 decimals)
pub fn to_in_game_level(xp: i64) -> f64 {
    let xp = xp.max(0) as f64;
    round_to(((3.0 * xp + 100.0).sqrt() + 20.0) / 30.0, 4)
}

/// Convert a displayed character level back to serialized XP
pub fn to_serialized_level(level: f64) -> i64 {
    (100.0 * (level - 1.0) * (3.0 * level - 1.0)).floor() as i64
}

/// Convert a serialized item power to the displayed gear power
pub fn to_in_game_power(power: f64) -> f64 {
    (power.max(1.0) - 1.0) * 10.0 + 1.0
}

/// Convert a displayed gear power back to the serialized item power
pub fn to_serialized_power(in_game: f64) -> f64 {
    if in_game <= 0.0 {
        return 0.0;
    }
    round_to((in_game.max(1.0) - 1.0) / 10.0 + 1.0, 5)
}

/// Per-level cost table for an ordinary enchantment slot
pub fn cost_table(powerful: bool, glided: bool) -> &'static [u32; 3] {
    &COST_TABLES[usize::from(powerful)][usize::from(glided)]
}

/// Points invested to bring an ordinary enchantment to `level`
///
/// Levels above the maximum are clamped.
pub fn invested_points(level: u8, powerful: bool, glided: bool) -> u32 {
    let level = usize::from(level.min(MAX_ENCHANTMENT_LEVEL));
    cost_table(powerful, glided)[..level].iter().sum()
}

/// Points invested in a netherite enchant, which is always free
pub fn netherite_invested_points(_level: u8) -> u32 {
    0
}

/// Displayed power of the equipped loadout
///
/// Gear slots (melee, armor, ranged) weigh 1/4 each and artifact slots
/// 1/12 each. Empty slots are passed as `None` and contribute nothing.
pub fn player_power(gear: [Option<f64>; 3], artifacts: [Option<f64>; 3]) -> i64 {
    let sum = |powers: &[Option<f64>]| -> f64 {
        powers.iter().flatten().map(|p| to_in_game_power(*p)).sum()
    };
    (sum(&gear) / 4.0 + sum(&artifacts) / 12.0).trunc() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_at_zero_xp() {
        assert_eq!(to_in_game_level(0), 1.0);
        assert_eq!(to_serialized_level(1.0), 0);
    }

    #[test]
    fn test_level_known_values() {
        // level 2: 100 * 1 * 5
        assert_eq!(to_serialized_level(2.0), 500);
        assert_eq!(to_in_game_level(500), 2.0);
        // level 10: 100 * 9 * 29
        assert_eq!(to_serialized_level(10.0), 26100);
        assert_eq!(to_in_game_level(26100), 10.0);
    }

    #[test]
    fn test_level_12345() {
        let expected = ((3.0f64 * 12345.0 + 100.0).sqrt() + 20.0) / 30.0;
        assert!((to_in_game_level(12345) - expected).abs() < 5e-5);
        assert_eq!(
            (to_in_game_level(12345) * 1000.0).round() / 1000.0,
            (expected * 1000.0).round() / 1000.0
        );
    }

    #[test]
    fn test_power_conversions() {
        assert_eq!(to_in_game_power(1.0), 1.0);
        assert_eq!(to_in_game_power(0.5), 1.0);
        assert_eq!(to_in_game_power(20.0), 191.0);
        assert_eq!(to_serialized_power(191.0), 20.0);
        assert_eq!(to_serialized_power(0.0), 0.0);
        assert_eq!(to_serialized_power(-5.0), 0.0);
        assert_eq!(to_serialized_power(0.5), 1.0);
    }

    #[test]
    fn test_invested_points_tables() {
        assert_eq!(invested_points(0, false, false), 0);
        assert_eq!(invested_points(1, false, false), 1);
        assert_eq!(invested_points(3, false, false), 6);
        assert_eq!(invested_points(3, true, false), 9);
        assert_eq!(invested_points(3, false, true), 9);
        assert_eq!(invested_points(3, true, true), 12);
        assert_eq!(invested_points(2, true, true), 7);
    }

    #[test]
    fn test_invested_points_clamps_level() {
        assert_eq!(invested_points(9, false, false), 6);
    }

    #[test]
    fn test_netherite_is_free() {
        for level in 0..=MAX_ENCHANTMENT_LEVEL {
            assert_eq!(netherite_invested_points(level), 0);
        }
    }

    #[test]
    fn test_player_power() {
        // three gear pieces at 191 and three artifacts at 191
        let gear = [Some(20.0), Some(20.0), Some(20.0)];
        let artifacts = [Some(20.0), Some(20.0), Some(20.0)];
        assert_eq!(player_power(gear, artifacts), 191);
    }

    #[test]
    fn test_player_power_missing_slots() {
        assert_eq!(player_power([None; 3], [None; 3]), 0);
        // (191 + 1) / 4 = 48
        assert_eq!(player_power([Some(20.0), Some(1.0), None], [None; 3]), 48);
    }

    proptest! {
        #[test]
        fn prop_level_roundtrip_within_rounding(xp in 0i64..=10_000_000) {
            let level = to_in_game_level(xp);
            let back = to_serialized_level(level);
            // displayed level keeps 4 decimals, so the error grows with the
            // slope of the inverse: d(xp)/d(level) = 600 * level - 400
            let tolerance = (600.0 * level) * 5e-5 + 1.0 + 1e-6;
            prop_assert!(((back - xp) as f64).abs() <= tolerance);
        }

        #[test]
        fn prop_level_exact_for_small_xp(xp in 0i64..=1000) {
            let back = to_serialized_level(to_in_game_level(xp));
            prop_assert!((back - xp).abs() <= 1);
        }

        #[test]
        fn prop_level_non_decreasing(xp in 0i64..10_000_000) {
            prop_assert!(to_in_game_level(xp) <= to_in_game_level(xp + 1));
        }

        #[test]
        fn prop_power_roundtrip(p in 1.0f64..=1000.0) {
            let back = to_serialized_power(to_in_game_power(p));
            prop_assert!((back - p).abs() <= 1e-5);
        }
    }
}
