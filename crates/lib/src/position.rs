//! Gap-based position allocation.
//!
//! Positions are `f64` sort keys. Placing an entity at a slot derives its key
//! from the neighbours at that slot, so a move rewrites a single row in the
//! common case. Repeated inserts into one gap halve it each time; once two
//! neighbours end up closer than [`MIN_GAP`] the list is renumbered with
//! [`rebalance`] and the slot is recomputed against the fresh keys.
//!
//! The same functions run on the client (provisional position) and the server
//! (authoritative position), so both sides agree on relative order.

/// Spacing used for the first entity, for tail appends and for renumbering.
pub const BASE_GAP: f64 = 65536.0;

/// Smallest distance to a neighbour that still counts as a usable gap.
pub const MIN_GAP: f64 = 1e-6;

/// Compute the position for an entity landing at `target_index`.
///
/// `siblings` are the positions of the other entities in ascending order,
/// excluding the one being placed. Any `target_index` at or past the end
/// means "append".
///
/// ```
/// use boardsync::position::{compute_position, BASE_GAP};
///
/// assert_eq!(compute_position(&[], 0), BASE_GAP);
/// assert_eq!(compute_position(&[65536.0, 131072.0], 0), 32768.0);
/// assert_eq!(compute_position(&[65536.0, 131072.0], 1), 98304.0);
/// assert_eq!(compute_position(&[65536.0, 131072.0], 2), 196608.0);
/// ```
pub fn compute_position(siblings: &[f64], target_index: usize) -> f64 {
    match siblings {
        [] => BASE_GAP,
        [first, ..] if target_index == 0 => {
            // Halving only moves toward zero, so a non-positive head needs a fixed step below.
            if *first > 0.0 {
                first / 2.0
            } else {
                first - BASE_GAP
            }
        }
        [.., last] if target_index >= siblings.len() => last + BASE_GAP,
        _ => (siblings[target_index - 1] + siblings[target_index]) / 2.0,
    }
}

/// Whether `position` leaves too little room next to its neighbours at
/// `target_index`, or fails to sort strictly between them.
pub fn needs_rebalance(siblings: &[f64], target_index: usize, position: f64) -> bool {
    if !position.is_finite() {
        return true;
    }
    let target_index = target_index.min(siblings.len());
    let before = target_index
        .checked_sub(1)
        .and_then(|i| siblings.get(i))
        .is_some_and(|prev| position - prev < MIN_GAP);
    let after = siblings
        .get(target_index)
        .is_some_and(|next| next - position < MIN_GAP);
    before || after
}

/// Evenly spaced positions for `len` entities: `BASE_GAP, 2 * BASE_GAP, ...`.
pub fn rebalance(len: usize) -> Vec<f64> {
    (1..=len).map(|i| i as f64 * BASE_GAP).collect()
}

/// Slot a position falls into: the number of siblings strictly below it.
///
/// Used by the server to recover the slot a client meant from the position it
/// proposed, so the authoritative position can be recomputed against the
/// persisted neighbours.
pub fn index_for_position(siblings: &[f64], position: f64) -> usize {
    siblings.partition_point(|p| *p < position)
}

/// Outcome of placing an entity into a list.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// The gap had room; only the placed entity gets a new position.
    Fits(f64),
    /// The gap was exhausted. Every sibling takes the matching entry of
    /// `siblings` (same order as the input) and the placed entity takes
    /// `position`.
    Rebalanced { position: f64, siblings: Vec<f64> },
}

impl Placement {
    /// The position assigned to the placed entity.
    pub fn position(&self) -> f64 {
        match self {
            Placement::Fits(position) | Placement::Rebalanced { position, .. } => *position,
        }
    }
}

/// Place an entity at `target_index`, renumbering the siblings if needed.
pub fn place(siblings: &[f64], target_index: usize) -> Placement {
    let position = compute_position(siblings, target_index);
    if !needs_rebalance(siblings, target_index, position) {
        return Placement::Fits(position);
    }

    let fresh = rebalance(siblings.len());
    let position = compute_position(&fresh, target_index);
    tracing::debug!(
        siblings = siblings.len(),
        target_index,
        "position gap exhausted, renumbering list"
    );
    Placement::Rebalanced {
        position,
        siblings: fresh,
    }
}
