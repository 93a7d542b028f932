// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles the driving-log records and splits them into:
//   - Training set:   fed to the optimiser
//   - Validation set: monitored by checkpointing / early stopping
//
// The split happens on records, not samples, so the six
// augmented views of one frame never straddle both sets.
//
// Validation size is ceil(n × validation_fraction), the same
// rounding sklearn's train_test_split uses for test_size.
//
// Reference: rand crate documentation

use rand::{seq::SliceRandom, Rng};

/// Shuffle `items` and split into (train, validation).
///
/// # Arguments
/// * `items`               - All records (consumed)
/// * `validation_fraction` - Share moved to validation, e.g. 0.2
/// * `rng`                 - Source of randomness for the shuffle
pub fn split_train_val<T, R: Rng + ?Sized>(
    mut items:           Vec<T>,
    validation_fraction: f64,
    rng:                 &mut R,
) -> (Vec<T>, Vec<T>) {
    items.shuffle(rng);

    let total    = items.len();
    let fraction = validation_fraction.clamp(0.0, 1.0);
    let val_len  = ((total as f64) * fraction).ceil() as usize;
    let split_at = total - val_len.min(total);

    // split_off(n) leaves [0..n) in `items` and returns [n..total)
    let val = items.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        items.len(),
        val.len(),
        (items.len() * 100) / total.max(1),
        (val.len()   * 100) / total.max(1),
    );

    (items, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.2, &mut rng());
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_validation_size_rounds_up() {
        // 7 × 0.2 = 1.4 → 2 validation records
        let items: Vec<usize> = (0..7).collect();
        let (train, val)      = split_train_val(items, 0.2, &mut rng());
        assert_eq!(val.len(),   2);
        assert_eq!(train.len(), 5);
    }

    #[test]
    fn test_partition_has_no_overlap_and_loses_nothing() {
        let items: Vec<usize> = (0..50).collect();
        let (train, val)      = split_train_val(items, 0.3, &mut rng());

        let train_set: HashSet<_> = train.iter().copied().collect();
        let val_set:   HashSet<_> = val.iter().copied().collect();

        assert!(train_set.is_disjoint(&val_set));
        assert_eq!(train_set.len() + val_set.len(), 50);
        assert_eq!(train_set.union(&val_set).count(), 50);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 0.2, &mut rng());
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_zero_fraction_keeps_everything_for_training() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(items, 0.0, &mut rng());
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
