//! Height-indexed collateral and block subsidy schedules
//!
//! Both are piecewise-constant tables over 1,000,000-block bands. The
//! collateral requirement rises, bumps once, then descends back to its
//! floor; the subsidy follows the same staircase scaled down roughly a
//! thousandfold. Values are consensus; do not touch them.

use meridian_core::{ChainParams, COIN};

/// Required collateral, in base units, for a masternode at `height`.
pub fn collateral_at(height: i32) -> u64 {
    let units: u64 = if height >= 53_000_000 {
        100_000
    } else if height >= 52_000_000 {
        106_921
    } else if height >= 51_000_000 {
        112_549
    } else if height >= 50_000_000 {
        118_472
    } else if height >= 49_000_000 {
        124_708
    } else if height >= 48_000_000 {
        131_271
    } else if height >= 47_000_000 {
        138_180
    } else if height >= 46_000_000 {
        145_453
    } else if height >= 45_000_000 {
        153_108
    } else if height >= 44_000_000 {
        161_166
    } else if height >= 43_000_000 {
        169_649
    } else if height >= 42_000_000 {
        178_578
    } else if height >= 41_000_000 {
        187_977
    } else if height >= 40_000_000 {
        197_870
    } else if height >= 39_000_000 {
        208_284
    } else if height >= 38_000_000 {
        219_247
    } else if height >= 37_000_000 {
        230_786
    } else if height >= 36_000_000 {
        242_933
    } else if height >= 35_000_000 {
        255_719
    } else if height >= 34_000_000 {
        269_177
    } else if height >= 33_000_000 {
        283_345
    } else if height >= 32_000_000 {
        298_258
    } else if height >= 31_000_000 {
        313_955
    } else if height >= 30_000_000 {
        330_479
    } else if height >= 29_000_000 {
        347_873
    } else if height >= 28_000_000 {
        366_182
    } else if height >= 27_000_000 {
        385_455
    } else if height >= 26_000_000 {
        405_742
    } else if height >= 25_000_000 {
        427_097
    } else if height >= 24_000_000 {
        449_576
    } else if height >= 23_000_000 {
        473_237
    } else if height >= 22_000_000 {
        498_145
    } else if height >= 21_000_000 {
        524_363
    } else if height >= 20_000_000 {
        551_961
    } else if height >= 19_000_000 {
        581_011
    } else if height >= 18_000_000 {
        611_591
    } else if height >= 17_000_000 {
        505_447
    } else if height >= 16_000_000 {
        459_497
    } else if height >= 15_000_000 {
        417_725
    } else if height >= 14_000_000 {
        379_750
    } else if height >= 13_000_000 {
        345_227
    } else if height >= 12_000_000 {
        313_843
    } else if height >= 11_000_000 {
        285_312
    } else if height >= 10_000_000 {
        259_374
    } else if height >= 9_000_000 {
        235_795
    } else if height >= 8_000_000 {
        214_359
    } else if height >= 7_000_000 {
        194_872
    } else if height >= 6_000_000 {
        177_156
    } else if height >= 5_000_000 {
        161_051
    } else if height >= 4_000_000 {
        146_410
    } else if height >= 3_000_000 {
        133_100
    } else if height >= 2_000_000 {
        121_000
    } else if height >= 1_000_000 {
        110_000
    } else if height >= 2 {
        100_000
    } else {
        0
    };
    units * COIN
}

/// Materialized collateral transition points, built once at startup by
/// scanning the table.
#[derive(Debug, Clone)]
pub struct CollateralSchedule {
    transitions: Vec<(i32, u64)>,
}

impl CollateralSchedule {
    /// Scan heights 0..=9,999,999 and record every change.
    pub fn new() -> Self {
        let mut transitions = Vec::new();
        let mut prev = u64::MAX;
        for height in 0..=9_999_999 {
            let amount = collateral_at(height);
            if amount != prev {
                prev = amount;
                transitions.push((height, amount));
            }
        }
        CollateralSchedule { transitions }
    }

    pub fn transitions(&self) -> &[(i32, u64)] {
        &self.transitions
    }

    /// Blocks until the collateral next changes after `height`, and the
    /// new amount. `(-1, -1)` when no further change is on record.
    pub fn next_change(&self, height: i32) -> (i32, i64) {
        for (at, amount) in &self.transitions {
            if *at > height {
                return (*at - height, *amount as i64);
            }
        }
        (-1, -1)
    }
}

impl Default for CollateralSchedule {
    fn default() -> Self {
        Self::new()
    }
}

fn base_subsidy(height: i32) -> u64 {
    let units: u64 = if height == 1 {
        400_200 // genesis premine
    } else if height <= 1_000 {
        100
    } else if height <= 2_700 {
        110
    } else if height <= 999_999 {
        100
    } else if height <= 1_999_999 {
        110
    } else if height <= 2_999_999 {
        121
    } else if height <= 3_999_999 {
        133
    } else if height <= 4_999_999 {
        146
    } else if height <= 5_999_999 {
        161
    } else if height <= 6_999_999 {
        177
    } else if height <= 7_999_999 {
        195
    } else if height <= 8_999_999 {
        214
    } else if height <= 9_999_999 {
        236
    } else if height <= 10_999_999 {
        259
    } else if height <= 11_999_999 {
        285
    } else if height <= 12_999_999 {
        314
    } else if height <= 13_999_999 {
        345
    } else if height <= 14_999_999 {
        380
    } else if height <= 15_999_999 {
        418
    } else if height <= 16_999_999 {
        459
    } else if height <= 17_999_999 {
        505
    } else if height <= 18_999_999 {
        556
    } else if height <= 19_999_999 {
        612
    } else if height <= 20_999_999 {
        581
    } else if height <= 21_999_999 {
        552
    } else if height <= 22_999_999 {
        524
    } else if height <= 23_999_999 {
        498
    } else if height <= 24_999_999 {
        473
    } else if height <= 25_999_999 {
        450
    } else if height <= 26_999_999 {
        427
    } else if height <= 27_999_999 {
        406
    } else if height <= 28_999_999 {
        385
    } else if height <= 29_999_999 {
        366
    } else if height <= 30_999_999 {
        348
    } else if height <= 31_999_999 {
        330
    } else if height <= 32_999_999 {
        314
    } else if height <= 33_999_999 {
        298
    } else if height <= 34_999_999 {
        283
    } else if height <= 35_999_999 {
        269
    } else if height <= 36_999_999 {
        256
    } else if height <= 37_999_999 {
        243
    } else if height <= 38_999_999 {
        231
    } else if height <= 39_999_999 {
        219
    } else if height <= 40_999_999 {
        209
    } else if height <= 41_999_999 {
        198
    } else if height <= 42_999_999 {
        188
    } else if height <= 43_999_999 {
        179
    } else if height <= 44_999_999 {
        170
    } else if height <= 45_999_999 {
        161
    } else if height <= 46_999_999 {
        153
    } else if height <= 47_999_999 {
        145
    } else if height <= 48_999_999 {
        138
    } else if height <= 49_999_999 {
        131
    } else if height <= 50_999_999 {
        125
    } else if height <= 51_999_999 {
        118
    } else if height <= 52_999_999 {
        113
    } else if height <= 53_999_999 {
        107
    } else {
        100
    };
    units * COIN
}

/// Block subsidy at `height` given the coin supply before this block.
///
/// Emission stops at the supply cap; the final block below the cap
/// emits exactly the remaining headroom. The `legacy-supply-wraparound`
/// build preserves the historic formula for that final block verbatim.
pub fn block_subsidy(height: i32, money_supply: u64, params: &ChainParams) -> u64 {
    let max_money = params.max_money;

    if money_supply >= max_money {
        return 0;
    }

    let subsidy = base_subsidy(height);

    if money_supply + subsidy > max_money {
        #[cfg(feature = "legacy-supply-wraparound")]
        return money_supply + subsidy - max_money;
        #[cfg(not(feature = "legacy-supply-wraparound"))]
        return max_money - money_supply;
    }

    subsidy
}

/// The masternode share of a block's subsidy: 85% once past the
/// proof-of-work ramp, nothing before.
pub fn masternode_payment(height: i32, money_supply: u64, params: &ChainParams) -> u64 {
    if height > 1_000 {
        return block_subsidy(height, money_supply, params) * 85 / 100;
    }
    0
}
