use charter_dash::algorithm::peers::{
    PeerCandidate, PeerEngine, PeerQuery, reconcile, selection::sort_by_distance,
};
use charter_dash::{AnalysisType, DataProvider, GradeSpan, SchoolId};

use crate::utils::{PEER_A, PEER_B, PEER_C, PEER_D, SELECTED, sample_snapshot};

fn query(universe_size: usize) -> PeerQuery {
    PeerQuery {
        school_id: SELECTED,
        year: 2023,
        analysis: AnalysisType::K8,
        universe_size,
        min_tested: 20.0,
        overlap_grades_required: 2,
    }
}

#[test]
fn overlap_gate_keeps_a_and_c() {
    let snapshot = sample_snapshot();
    let engine = PeerEngine::new();
    let peers = engine.comparable_schools(&snapshot, &query(20)).unwrap();
    let ids: Vec<SchoolId> = peers.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![PEER_A, PEER_C]);
    assert!(!ids.contains(&PEER_B));
    assert!(!ids.contains(&PEER_D));
}

#[test]
fn selection_respects_bounds_and_order() {
    let snapshot = sample_snapshot();
    let engine = PeerEngine::new();
    let index = engine.index(&snapshot, 2023, AnalysisType::K8).unwrap();
    let selected_span = index.get(SELECTED).and_then(|p| p.span).unwrap();

    for n_max in 0..4 {
        let peers = engine.comparable_schools(&snapshot, &query(n_max)).unwrap();
        assert!(peers.len() <= n_max);
        assert!(peers.iter().all(|p| p.id != SELECTED));
        assert!(peers.windows(2).all(|w| w[0].distance <= w[1].distance));
        for peer in &peers {
            let span: GradeSpan = index.get(peer.id).and_then(|p| p.span).unwrap();
            assert!(selected_span.overlaps(&span, 2));
        }
    }
}

#[test]
fn cohort_minimum_filters_small_schools() {
    let snapshot = sample_snapshot();
    let engine = PeerEngine::new();
    let strict = PeerQuery {
        min_tested: 75.0,
        ..query(20)
    };
    let peers = engine.comparable_schools(&snapshot, &strict).unwrap();
    assert_eq!(peers.iter().map(|p| p.id).collect::<Vec<_>>(), vec![PEER_A]);
}

#[test]
fn spatial_index_is_memoised_per_snapshot() {
    let snapshot = sample_snapshot();
    let engine = PeerEngine::new();
    let first = engine.index(&snapshot, 2023, AnalysisType::K8).unwrap();
    let second = engine.index(&snapshot, 2023, AnalysisType::K8).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(engine.cached_indexes(), 1);

    // a new snapshot evicts entries of the old one
    let reloaded = sample_snapshot();
    assert_ne!(reloaded.snapshot_id(), snapshot.snapshot_id());
    engine.index(&reloaded, 2023, AnalysisType::K8).unwrap();
    assert_eq!(engine.cached_indexes(), 1);
}

#[test]
fn sorting_by_distance_is_idempotent() {
    let mut peers = vec![
        PeerCandidate { id: SchoolId(3), name: "c".into(), distance: 0.5 },
        PeerCandidate { id: SchoolId(1), name: "a".into(), distance: 0.1 },
        PeerCandidate { id: SchoolId(2), name: "b".into(), distance: 0.5 },
    ];
    sort_by_distance(&mut peers);
    let once = peers.clone();
    sort_by_distance(&mut peers);
    assert_eq!(peers, once);
    assert_eq!(peers.iter().map(|p| p.id.0).collect::<Vec<_>>(), vec![1, 2, 3]);
}

fn candidates(n: u32) -> Vec<PeerCandidate> {
    (1..=n)
        .map(|i| PeerCandidate {
            id: SchoolId(i),
            name: format!("School {i}"),
            distance: f64::from(i),
        })
        .collect()
}

#[test]
fn reconcile_resets_when_held_peers_are_stale() {
    let computed = candidates(10);
    let fresh = reconcile(&[], &computed, 4, 7);
    assert_eq!(fresh.peers, (1..=4).map(SchoolId).collect::<Vec<_>>());

    let stale = reconcile(&[SchoolId(2), SchoolId(99)], &computed, 4, 7);
    assert_eq!(stale.peers.len(), 4);
    assert!(stale.warning.is_none());

    let kept = reconcile(&[SchoolId(9), SchoolId(2)], &computed, 4, 7);
    assert_eq!(kept.peers, vec![SchoolId(9), SchoolId(2)]);
    assert!(kept.options.iter().all(|o| !o.disabled));
}

#[test]
fn reconcile_warns_over_the_limit() {
    let computed = candidates(10);
    let held: Vec<SchoolId> = (1..=8).map(SchoolId).collect();
    let selection = reconcile(&held, &computed, 4, 7);
    assert_eq!(selection.peers, held);
    assert_eq!(selection.warning.as_deref(), Some("Limit reached (Maximum schools: 7)"));
    assert!(selection.options.iter().all(|o| o.disabled));
}
