use crate::types::Keypoint;

/// Keeps keypoints whose response is strictly the largest in their 3x3 neighbourhood.
///
/// Ties keep the first keypoint in raster order, so flat plateaus still yield one survivor.
pub fn local_maxima(keypoints: Vec<Keypoint>, width: u32, height: u32) -> Vec<Keypoint> {
    let w = width as usize;
    let h = height as usize;
    if keypoints.is_empty() || w == 0 || h == 0 {
        return keypoints;
    }
    let mut score = vec![f32::NEG_INFINITY; w * h];
    let mut order = vec![usize::MAX; w * h];
    for (i, kp) in keypoints.iter().enumerate() {
        let (x, y) = (kp.pt.x as usize, kp.pt.y as usize);
        if x < w && y < h {
            score[y * w + x] = kp.response;
            order[y * w + x] = i;
        }
    }
    keypoints
        .into_iter()
        .enumerate()
        .filter(|(i, kp)| {
            let (x, y) = (kp.pt.x as usize, kp.pt.y as usize);
            if x >= w || y >= h {
                return false;
            }
            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    if nx == x && ny == y {
                        continue;
                    }
                    let idx = ny * w + nx;
                    if score[idx] > kp.response || (score[idx] == kp.response && order[idx] < *i) {
                        return false;
                    }
                }
            }
            true
        })
        .map(|(_, kp)| kp)
        .collect()
}

/// Grid suppression keeping the strongest keypoint per cell.
pub struct OccupancyNms {
    pub cell_size: u32,
}

impl OccupancyNms {
    /// # Panics
    /// Panics if `cell_size == 0`.
    pub fn new(cell_size: u32) -> Self {
        assert!(cell_size > 0, "cell_size must be > 0");
        OccupancyNms { cell_size }
    }

    /// Survivors are returned in cell order.
    pub fn suppress(&self, keypoints: &[Keypoint], width: u32, height: u32) -> Vec<Keypoint> {
        if keypoints.is_empty() {
            return Vec::new();
        }
        let cols = width.div_ceil(self.cell_size).max(1) as usize;
        let rows = height.div_ceil(self.cell_size).max(1) as usize;
        let mut grid: Vec<Option<usize>> = vec![None; rows * cols];
        for (i, kp) in keypoints.iter().enumerate() {
            let col = ((kp.pt.x.max(0.0) as u32) / self.cell_size) as usize;
            let row = ((kp.pt.y.max(0.0) as u32) / self.cell_size) as usize;
            let cell = row.min(rows - 1) * cols + col.min(cols - 1);
            match grid[cell] {
                Some(prev) if keypoints[prev].response >= kp.response => {}
                _ => grid[cell] = Some(i),
            }
        }
        grid.iter()
            .filter_map(|cell| cell.map(|i| keypoints[i].clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(x: f32, y: f32, response: f32) -> Keypoint {
        Keypoint::new(x, y, 7.0).with_response(response)
    }

    #[test]
    fn local_maxima_keeps_peak() {
        let kps = vec![kp(5.0, 5.0, 10.0), kp(6.0, 5.0, 20.0), kp(9.0, 9.0, 1.0)];
        let kept = local_maxima(kps, 16, 16);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].response, 20.0);
        assert_eq!(kept[1].response, 1.0);
    }

    #[test]
    fn local_maxima_plateau_keeps_one() {
        let kps = vec![kp(5.0, 5.0, 3.0), kp(6.0, 5.0, 3.0)];
        assert_eq!(local_maxima(kps, 16, 16).len(), 1);
    }

    #[test]
    fn same_cell_keeps_best() {
        let nms = OccupancyNms::new(32);
        let kps = vec![kp(10.0, 10.0, 30.0), kp(15.0, 15.0, 80.0), kp(20.0, 20.0, 50.0)];
        let result = nms.suppress(&kps, 640, 480);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].response, 80.0);
    }

    #[test]
    fn different_cells_all_survive() {
        let nms = OccupancyNms::new(32);
        let kps = vec![kp(10.0, 10.0, 1.0), kp(40.0, 10.0, 1.0), kp(10.0, 40.0, 1.0)];
        assert_eq!(nms.suppress(&kps, 640, 480).len(), 3);
    }

    #[test]
    #[should_panic(expected = "cell_size")]
    fn zero_cell_size_panics() {
        OccupancyNms::new(0);
    }
}
