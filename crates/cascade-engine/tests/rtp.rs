//! Long-run return to player
//!
//! Run explicitly: `cargo test -p cascade-engine --release -- --ignored`

use cascade_engine::{CascadeGame, SimulationReport, simulate};

#[test]
fn test_short_run_is_sane() {
    let game = CascadeGame::standard();
    let report = simulate(&game, 1, 2_000, 1.0).unwrap();

    assert!(report.measured_rtp().is_finite());
    assert!(report.stats.hit_rate() > 0.0);
    assert!(report.stats.total_win > 0.0);
    assert!(report.stats.cascade_chains > 0);
}

#[test]
fn test_rtp_stays_near_target() {
    let game = CascadeGame::standard();
    let reports = (100..102).map(|seed| simulate(&game, seed, 25_000, 1.0).unwrap());
    let report = SimulationReport::merge(reports).unwrap();

    let tolerance = report.target_rtp * 0.15;
    assert!(
        report.within(tolerance),
        "RTP {:.4} against target {:.2}",
        report.measured_rtp(),
        report.target_rtp
    );
}

#[test]
#[ignore]
fn test_rtp_converges_to_target() {
    let game = CascadeGame::standard();
    let reports = (0..8).map(|seed| simulate(&game, seed, 25_000, 1.0).unwrap());
    let report = SimulationReport::merge(reports).unwrap();

    println!(
        "RTP {:.3}% over {} spins (target {:.2}%), hit rate {:.2}%",
        report.stats.rtp(),
        report.stats.total_spins,
        report.target_rtp * 100.0,
        report.stats.hit_rate()
    );
    assert!(report.within(0.05), "deviation {:.4}", report.deviation());
}
