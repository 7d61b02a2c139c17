//! Connected-component scanning over a labeled grid.
//!
//! Components are grown breadth-first from each unvisited cell, joining
//! neighbors that carry the same label. Growth stops once a component
//! reaches `size_cap` cells; cells already queued at that point stay marked
//! as visited and never seed a component of their own.

use std::collections::VecDeque;

/// Neighborhood used when growing a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Four,
    Eight,
}

impl Connectivity {
    fn offsets(self) -> &'static [(i32, i32)] {
        const FOUR: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        const EIGHT: [(i32, i32); 8] = [
            (-1, 0), (1, 0), (0, -1), (0, 1),
            (-1, -1), (1, -1), (-1, 1), (1, 1),
        ];
        match self {
            Connectivity::Four => &FOUR,
            Connectivity::Eight => &EIGHT,
        }
    }
}

/// A component found by [`scan_components`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component<L> {
    pub label: L,
    /// Number of cells taken before the cap stopped growth.
    pub size: usize,
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl<L> Component<L> {
    pub fn bbox_width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn bbox_height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Fraction of the bounding box covered by the component.
    pub fn density(&self) -> f64 {
        self.size as f64 / (self.bbox_width() as f64 * self.bbox_height() as f64)
    }
}

/// Label every component of cells accepted by `include`, scanning seeds in
/// row-major order.
pub fn scan_components<L, F>(
    width: u32,
    height: u32,
    labels: &[L],
    include: F,
    connectivity: Connectivity,
    size_cap: usize,
) -> Vec<Component<L>>
where
    L: Copy + PartialEq,
    F: Fn(L) -> bool,
{
    let w = width as usize;
    let h = height as usize;
    if labels.len() != w * h || size_cap == 0 {
        return Vec::new();
    }

    let iw = width as i32;
    let ih = height as i32;
    let offsets = connectivity.offsets();
    let mut visited = vec![false; w * h];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for y in 0..h {
        let row_offset = y * w;
        for x in 0..w {
            let idx = row_offset + x;
            let label = labels[idx];
            if visited[idx] || !include(label) {
                continue;
            }

            queue.clear();
            queue.push_back((x as i32, y as i32));
            visited[idx] = true;

            let mut component = Component {
                label,
                size: 0,
                min_x: x as u32,
                max_x: x as u32,
                min_y: y as u32,
                max_y: y as u32,
            };

            while component.size < size_cap {
                let Some((cx, cy)) = queue.pop_front() else {
                    break;
                };
                component.size += 1;
                component.min_x = component.min_x.min(cx as u32);
                component.max_x = component.max_x.max(cx as u32);
                component.min_y = component.min_y.min(cy as u32);
                component.max_y = component.max_y.max(cy as u32);

                for &(dx, dy) in offsets {
                    let nx = cx + dx;
                    let ny = cy + dy;
                    if nx >= 0 && nx < iw && ny >= 0 && ny < ih {
                        let nidx = ny as usize * w + nx as usize;
                        if !visited[nidx] && labels[nidx] == label {
                            visited[nidx] = true;
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }

            components.push(component);
        }
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_region_four_connected() {
        let labels = vec![0u8; 16];
        let comps = scan_components(4, 4, &labels, |_| true, Connectivity::Four, 1000);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].size, 16);
        assert_eq!(comps[0].bbox_width(), 4);
        assert_eq!(comps[0].bbox_height(), 4);
    }

    #[test]
    fn test_two_regions_split_by_label() {
        let mut labels = vec![0u8; 16];
        for y in 0..4 {
            for x in 2..4 {
                labels[y * 4 + x] = 1;
            }
        }
        let comps = scan_components(4, 4, &labels, |_| true, Connectivity::Four, 1000);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].label, 0);
        assert_eq!(comps[0].size, 8);
        assert_eq!(comps[1].label, 1);
        assert_eq!(comps[1].size, 8);
    }

    #[test]
    fn test_diagonal_joins_only_with_eight() {
        // Diagonal line of set cells on a 3x3 grid
        let labels = vec![
            true, false, false,
            false, true, false,
            false, false, true,
        ];
        let four = scan_components(3, 3, &labels, |l| l, Connectivity::Four, 1000);
        assert_eq!(four.len(), 3);
        let eight = scan_components(3, 3, &labels, |l| l, Connectivity::Eight, 1000);
        assert_eq!(eight.len(), 1);
        assert_eq!(eight[0].size, 3);
        assert!((eight[0].density() - 3.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_size_cap_stops_growth_and_consumes_queue() {
        let labels = vec![1u8; 100];
        let comps = scan_components(10, 10, &labels, |_| true, Connectivity::Four, 5);
        // Cells left in the queue are visited, so they never seed new components,
        // but unreached cells do.
        assert!(comps.iter().all(|c| c.size <= 5));
        assert_eq!(comps[0].size, 5);
        let total: usize = comps.iter().map(|c| c.size).sum();
        assert!(total <= 100);
    }

    #[test]
    fn test_mismatched_length_returns_empty() {
        let labels = vec![0u8; 5];
        assert!(scan_components(3, 3, &labels, |_| true, Connectivity::Four, 10).is_empty());
    }
}
