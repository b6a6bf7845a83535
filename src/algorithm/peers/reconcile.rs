//! Reconciling a held peer selection with a freshly computed peer list

use serde::Serialize;

use super::selection::PeerCandidate;
use crate::models::SchoolId;

/// A selectable peer option
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerOption {
    pub id: SchoolId,
    pub label: String,
    pub disabled: bool,
}

/// Reconciled peer state returned alongside a view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeerSelection {
    pub peers: Vec<SchoolId>,
    pub warning: Option<String>,
    pub options: Vec<PeerOption>,
}

impl PeerSelection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// Reconcile the held list `held` with the computed list `computed`
///
/// * nothing held, nothing in common, or some held peer no longer comparable:
///   reset to the first `default_n` computed peers
/// * more than `max_n` held: keep them and disable every option
/// * otherwise keep the held list with options enabled
#[must_use]
pub fn reconcile(
    held: &[SchoolId],
    computed: &[PeerCandidate],
    default_n: usize,
    max_n: usize,
) -> PeerSelection {
    if computed.is_empty() {
        return PeerSelection::default();
    }
    let common = held
        .iter()
        .filter(|id| computed.iter().any(|c| c.id == **id))
        .count();

    let (peers, warning, disabled) = if held.is_empty() || common == 0 || common < held.len() {
        (
            computed.iter().take(default_n).map(|c| c.id).collect(),
            None,
            false,
        )
    } else if held.len() > max_n {
        (
            held.to_vec(),
            Some(format!("Limit reached (Maximum schools: {max_n})")),
            true,
        )
    } else {
        (held.to_vec(), None, false)
    };

    let options = computed
        .iter()
        .map(|c| PeerOption {
            id: c.id,
            label: c.name.clone(),
            disabled,
        })
        .collect();
    PeerSelection {
        peers,
        warning,
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn computed(n: u32) -> Vec<PeerCandidate> {
        (1..=n)
            .map(|i| PeerCandidate {
                id: SchoolId(i),
                name: format!("S{i}"),
                distance: f64::from(i),
            })
            .collect()
    }

    #[test]
    fn empty_held_resets_to_defaults() {
        let sel = reconcile(&[], &computed(10), 4, 7);
        assert_eq!(sel.peers, (1..=4).map(SchoolId).collect::<Vec<_>>());
        assert!(sel.options.iter().all(|o| !o.disabled));
        assert_eq!(sel.options.len(), 10);
    }

    #[test]
    fn stale_peer_resets_selection() {
        let sel = reconcile(&[SchoolId(2), SchoolId(99)], &computed(10), 4, 7);
        assert_eq!(sel.peers.len(), 4);
        assert_eq!(sel.peers[0], SchoolId(1));
    }

    #[test]
    fn over_limit_disables_options() {
        let held: Vec<SchoolId> = (1..=8).map(SchoolId).collect();
        let sel = reconcile(&held, &computed(10), 4, 7);
        assert_eq!(sel.peers, held);
        assert!(sel.warning.is_some());
        assert!(sel.options.iter().all(|o| o.disabled));
    }

    #[test]
    fn valid_held_selection_is_kept() {
        let held = vec![SchoolId(5), SchoolId(3)];
        let sel = reconcile(&held, &computed(10), 4, 7);
        assert_eq!(sel.peers, held);
        assert!(sel.warning.is_none());
    }

    #[test]
    fn nothing_computed_means_nothing_selected() {
        let sel = reconcile(&[SchoolId(1)], &[], 4, 7);
        assert_eq!(sel, PeerSelection::default());
    }
}
