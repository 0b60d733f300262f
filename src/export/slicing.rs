use crate::geometry::clamp;

/// A strip of full image width covering pixel rows `y_start..y_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub y_start: u32,
    pub y_end: u32,
}

impl Slice {
    pub fn new(y_start: u32, y_end: u32) -> Self {
        Self { y_start, y_end }
    }

    pub fn height(&self) -> u32 {
        self.y_end - self.y_start
    }
}

/// The strips to export plus how many zero-height boundary pairs were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlicePlan {
    pub slices: Vec<Slice>,
    pub skipped: usize,
}

impl SlicePlan {
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Splits an image of `image_height` rows at the given guide positions.
///
/// Boundaries are `0`, every position rounded to the nearest row and clamped to the
/// image, then `image_height`. Each consecutive pair with positive height becomes a
/// slice; zero-height pairs (duplicates or guides on the image edge) are counted in
/// [`SlicePlan::skipped`] and never cause a failure.
pub fn compute_slices(image_height: u32, sorted_positions: &[f64]) -> SlicePlan {
    let height = f64::from(image_height);
    let mut boundaries: Vec<u32> = Vec::with_capacity(sorted_positions.len() + 2);
    boundaries.push(0);
    boundaries.extend(
        sorted_positions
            .iter()
            .map(|&y| clamp(y.round(), 0.0, height) as u32),
    );
    boundaries.push(image_height);
    // Unsorted input must not produce inverted slices
    boundaries.sort_unstable();

    let mut plan = SlicePlan::default();
    for pair in boundaries.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if end > start {
            plan.slices.push(Slice::new(start, end));
        } else {
            plan.skipped += 1;
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(plan: &SlicePlan) -> Vec<(u32, u32)> {
        plan.slices.iter().map(|s| (s.y_start, s.y_end)).collect()
    }

    #[test]
    fn test_no_guides_yields_whole_image() {
        let plan = compute_slices(240, &[]);
        assert_eq!(pairs(&plan), vec![(0, 240)]);
        assert_eq!(plan.skipped, 0);
    }

    #[test]
    fn test_duplicate_positions_are_skipped() {
        let plan = compute_slices(100, &[30.0, 30.0, 70.0]);
        assert_eq!(pairs(&plan), vec![(0, 30), (30, 70), (70, 100)]);
        assert_eq!(plan.skipped, 1);
    }

    #[test]
    fn test_edge_guides_produce_no_zero_height_slices() {
        let plan = compute_slices(100, &[0.0, 100.0]);
        assert_eq!(pairs(&plan), vec![(0, 100)]);
        assert_eq!(plan.skipped, 2);
        assert!(plan.slices.iter().all(|s| s.height() > 0));
    }

    #[test]
    fn test_positions_round_to_rows() {
        let plan = compute_slices(100, &[10.4, 10.6, 55.5]);
        assert_eq!(pairs(&plan), vec![(0, 10), (10, 11), (11, 56), (56, 100)]);

        let plan = compute_slices(100, &[20.2, 20.4]);
        assert_eq!(pairs(&plan), vec![(0, 20), (20, 100)]);
        assert_eq!(plan.skipped, 1);
    }

    #[test]
    fn test_out_of_range_positions_are_clamped() {
        let plan = compute_slices(50, &[-10.0, 25.0, 80.0]);
        assert_eq!(pairs(&plan), vec![(0, 25), (25, 50)]);
        assert_eq!(plan.skipped, 2);
    }

    #[test]
    fn test_empty_image() {
        let plan = compute_slices(0, &[]);
        assert!(plan.is_empty());
        assert_eq!(plan.skipped, 1);
    }
}
