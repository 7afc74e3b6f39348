mod common;

use snatch_core::{run_frame, MatchEventLog, MatchSnapshot, SnapshotHistory};

fn run_match(frames: usize) -> (MatchSnapshot, u64) {
    let mut app = common::test_app();
    for _ in 0..frames {
        run_frame(&mut app);
    }
    let snapshot = app
        .world
        .resource::<SnapshotHistory>()
        .last_snapshot
        .clone()
        .expect("snapshot available");
    let events = app.world.resource::<MatchEventLog>().total;
    (snapshot, events)
}

#[test]
fn same_seed_produces_identical_matches() {
    let (snapshot_a, events_a) = run_match(600);
    let (snapshot_b, events_b) = run_match(600);

    assert_eq!(events_a, events_b);
    assert_eq!(snapshot_a.phase, snapshot_b.phase);
    assert_eq!(snapshot_a.slots, snapshot_b.slots);
    assert_eq!(snapshot_a.hosts, snapshot_b.hosts);
    assert_eq!(snapshot_a.standings, snapshot_b.standings);
}
