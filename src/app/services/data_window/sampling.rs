//! Fixed-stride downsampling for chart series

/// Downsample a series to at most `max_points` items
///
/// Takes every `ceil(len / max_points)`-th item starting with the first, so
/// the output preserves order and is deterministic. A series already within
/// the limit is returned unchanged.
pub fn downsample<T: Clone>(items: &[T], max_points: usize) -> Vec<T> {
    if max_points == 0 {
        return Vec::new();
    }
    if items.len() <= max_points {
        return items.to_vec();
    }

    let stride = items.len().div_ceil(max_points);
    items.iter().step_by(stride).cloned().collect()
}
