// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bundled Etal station demo topology: 2 block ends, 2 block starts, 8
//! turnouts, 8 signals, 4 distant signals, 10 tracks, and 8 routes. Used by
//! the `frischen-tower` binary's demo mode and by integration tests as a
//! realistic topology rather than a minimal round-trip toy.

use crate::error::Result;
use crate::tower::Tower;

/// Assemble the Etal station onto `tower`, in construction order (block
/// apparatus, turnouts, signals, distant signals, tracks, then routes).
pub async fn build_etal(tower: &Tower) -> Result<()> {
    tower.add_block_end("blockend-d", "blockstart-d", "1-1").await?;
    tower.add_block_end("blockend-m", "blockstart-m", "3-4").await?;
    tower.add_block_start("blockstart-d", "blockend-d", "1-6").await?;
    tower.add_block_start("blockstart-m", "blockend-m", "2-6").await?;

    for name in ["W1", "W2", "W3", "W4", "W10", "W11", "W12", "W13"] {
        tower.add_turnout(name).await?;
    }

    tower.add_signal("p1p3").await?;
    for name in ["P1", "P3", "N2", "N3"] {
        let s = tower.add_signal(name).await?;
        s.add_home().await;
        s.add_shunting().await;
        s.add_alt().await;
    }
    for name in ["A", "F"] {
        let s = tower.add_signal(name).await?;
        s.add_home().await;
        s.add_alt().await;
    }
    tower.add_signal("n2n3").await?;

    tower.add_distant_signal("a", "A", None).await?;
    tower.add_distant_signal_switched("n2n3", "W3", "N2", "N3", Some("A")).await?;
    tower.add_distant_signal_switched("p1p3", "W13", "P1", "P3", Some("F")).await?;
    tower.add_distant_signal("f", "F", None).await?;

    for name in ["1-1", "1-4", "1-6", "2-1", "2-2", "2-3", "2-4", "2-5", "2-6", "3-4"] {
        tower.add_track(name).await?;
    }

    let route = tower.add_route("P1", "p1p3").await?;
    route.add_turnout(tower.turnout("W1").await?, false).await;
    route.add_track(tower.track("1-1").await?).await;
    route.add_flank_protection(tower.turnout("W2").await?, false).await;

    let route = tower.add_route("F", "P1").await?;
    route.add_turnout(tower.turnout("W13").await?, false).await;
    route.add_track(tower.track("1-4").await?).await;
    route.add_flank_protection(tower.turnout("W12").await?, false).await;

    let route = tower.add_route("P3", "p1p3").await?;
    route.add_turnout(tower.turnout("W4").await?, true).await;
    route.add_turnout(tower.turnout("W3").await?, true).await;
    route.add_track(tower.track("2-3").await?).await;
    route.add_turnout(tower.turnout("W2").await?, true).await;
    route.add_turnout(tower.turnout("W1").await?, true).await;
    route.add_track(tower.track("1-1").await?).await;

    let route = tower.add_route("F", "P3").await?;
    route.add_turnout(tower.turnout("W13").await?, true).await;
    route.add_turnout(tower.turnout("W12").await?, true).await;
    route.add_track(tower.track("2-5").await?).await;
    route.add_turnout(tower.turnout("W11").await?, true).await;
    route.add_turnout(tower.turnout("W10").await?, true).await;
    route.add_track(tower.track("3-4").await?).await;
    route.add_flank_protection(tower.turnout("W3").await?, true).await;
    route.add_flank_protection(tower.turnout("W4").await?, true).await;

    let route = tower.add_route("A", "N2").await?;
    route.add_track(tower.track("2-2").await?).await;
    route.add_turnout(tower.turnout("W2").await?, false).await;
    route.add_track(tower.track("2-3").await?).await;
    route.add_turnout(tower.turnout("W3").await?, false).await;
    route.add_track(tower.track("2-4").await?).await;
    route.add_flank_protection(tower.turnout("W1").await?, false).await;
    route.add_flank_protection(tower.turnout("W4").await?, false).await;

    let route = tower.add_route("A", "N3").await?;
    route.add_track(tower.track("2-2").await?).await;
    route.add_turnout(tower.turnout("W2").await?, false).await;
    route.add_track(tower.track("2-3").await?).await;
    route.add_turnout(tower.turnout("W3").await?, true).await;
    route.add_turnout(tower.turnout("W4").await?, true).await;
    route.add_track(tower.track("3-4").await?).await;
    route.add_flank_protection(tower.turnout("W1").await?, false).await;

    let route = tower.add_route("N2", "n2n3").await?;
    route.add_turnout(tower.turnout("W11").await?, false).await;
    route.add_track(tower.track("2-5").await?).await;
    route.add_turnout(tower.turnout("W12").await?, false).await;
    route.add_track(tower.track("2-6").await?).await;
    route.add_flank_protection(tower.turnout("W10").await?, false).await;
    route.add_flank_protection(tower.turnout("W13").await?, false).await;

    let route = tower.add_route("N3", "n2n3").await?;
    route.add_turnout(tower.turnout("W10").await?, true).await;
    route.add_turnout(tower.turnout("W11").await?, true).await;
    route.add_track(tower.track("2-5").await?).await;
    route.add_turnout(tower.turnout("W12").await?, false).await;
    route.add_track(tower.track("2-6").await?).await;
    route.add_flank_protection(tower.turnout("W13").await?, false).await;

    Ok(())
}
