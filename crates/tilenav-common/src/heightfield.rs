//! Voxel heightfield
//!
//! A heightfield is a 2D grid of cell columns. Each column holds the solid
//! vertical intervals ("spans") found in that cell, sorted bottom to top and
//! never overlapping. Span heights are in cell-height units above `bmin.y`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Largest span height representable in a heightfield
pub const SPAN_MAX_HEIGHT: i32 = (1 << 13) - 1;

/// Area id of a span that cannot be walked on
pub const NULL_AREA: u8 = 0;

/// Default area id for walkable spans
pub const WALKABLE_AREA: u8 = 63;

/// A solid vertical interval in one heightfield cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Bottom of the span, in cell-height units
    pub min: i32,
    /// Top of the span, in cell-height units
    pub max: i32,
    /// Area id of the span's top surface
    pub area: u8,
}

impl Span {
    pub fn new(min: i32, max: i32, area: u8) -> Self {
        Self { min, max, area }
    }
}

/// Grid of span columns covering an axis-aligned box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heightfield {
    /// Number of cells along the x-axis
    pub width: i32,
    /// Number of cells along the z-axis
    pub height: i32,

    /// The minimum bounds of the heightfield's AABB
    pub bmin: Vec3,
    /// The maximum bounds of the heightfield's AABB
    pub bmax: Vec3,

    /// Cell size (horizontal resolution)
    pub cs: f32,
    /// Cell height (vertical resolution)
    pub ch: f32,

    /// Number of border cells on each side of the usable area
    pub border_size: i32,

    columns: Vec<Vec<Span>>,
}

impl Heightfield {
    /// Creates an empty heightfield
    pub fn new(width: i32, height: i32, bmin: Vec3, bmax: Vec3, cs: f32, ch: f32) -> Self {
        let cells = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width,
            height,
            bmin,
            bmax,
            cs,
            ch,
            border_size: 0,
            columns: vec![Vec::new(); cells],
        }
    }

    pub fn with_border_size(mut self, border_size: i32) -> Self {
        self.border_size = border_size;
        self
    }

    fn cell_index(&self, x: i32, z: i32) -> Option<usize> {
        if x < 0 || z < 0 || x >= self.width || z >= self.height {
            return None;
        }
        Some((z * self.width + x) as usize)
    }

    fn checked_index(&self, x: i32, z: i32) -> Result<usize> {
        self.cell_index(x, z).ok_or_else(|| {
            Error::Heightfield(format!(
                "cell ({}, {}) outside {}x{} grid",
                x, z, self.width, self.height
            ))
        })
    }

    /// Spans of the column at `(x, z)`, bottom to top
    pub fn column(&self, x: i32, z: i32) -> Option<&[Span]> {
        self.cell_index(x, z).map(|i| self.columns[i].as_slice())
    }

    /// Adds a span, merging it with every span it overlaps.
    ///
    /// When the merged top lies within `flag_merge_threshold` units of an
    /// absorbed span's top, the area keeps the larger of the two ids so that
    /// walkable surfaces are not lost to slightly taller obstacles.
    pub fn add_span(
        &mut self,
        x: i32,
        z: i32,
        min: i32,
        max: i32,
        area: u8,
        flag_merge_threshold: i32,
    ) -> Result<()> {
        if min > max {
            return Err(Error::Heightfield(format!(
                "span min {} above max {}",
                min, max
            )));
        }
        let index = self.checked_index(x, z)?;
        let column = &mut self.columns[index];

        let mut new_span = Span::new(min, max, area);
        let mut i = 0;
        while i < column.len() {
            let cur = column[i];
            if cur.min > new_span.max {
                break;
            }
            if cur.max < new_span.min {
                i += 1;
                continue;
            }

            new_span.min = new_span.min.min(cur.min);
            new_span.max = new_span.max.max(cur.max);
            if (new_span.max - cur.max).abs() <= flag_merge_threshold {
                new_span.area = new_span.area.max(cur.area);
            }
            column.remove(i);
        }
        column.insert(i, new_span);
        Ok(())
    }

    /// Appends a span on top of a column without merging.
    ///
    /// Used when decoding serialized tiles whose columns are already sorted.
    pub fn push_span(&mut self, x: i32, z: i32, span: Span) -> Result<()> {
        let index = self.checked_index(x, z)?;
        let column = &mut self.columns[index];
        if let Some(top) = column.last() {
            if span.min < top.max {
                return Err(Error::Heightfield(format!(
                    "span {}..{} overlaps column top {} at ({}, {})",
                    span.min, span.max, top.max, x, z
                )));
            }
        }
        column.push(span);
        Ok(())
    }

    /// Total number of spans in the heightfield
    pub fn span_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Vec::is_empty)
    }

    /// Lowest span bottom and highest span top, if any span exists
    pub fn height_range(&self) -> Option<(i32, i32)> {
        self.columns
            .iter()
            .flatten()
            .fold(None, |acc, s| match acc {
                None => Some((s.min, s.max)),
                Some((lo, hi)) => Some((lo.min(s.min), hi.max(s.max))),
            })
    }

    /// World-space vertical extent of a span
    pub fn span_world_extent(&self, span: &Span) -> (f32, f32) {
        (
            self.bmin.y + span.min as f32 * self.ch,
            self.bmin.y + span.max as f32 * self.ch,
        )
    }

    /// World-space XZ rectangle of a cell as `(min_x, min_z, max_x, max_z)`
    pub fn cell_rect(&self, x: i32, z: i32) -> (f32, f32, f32, f32) {
        let min_x = self.bmin.x + x as f32 * self.cs;
        let min_z = self.bmin.z + z as f32 * self.cs;
        (min_x, min_z, min_x + self.cs, min_z + self.cs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Heightfield {
        Heightfield::new(4, 3, Vec3::ZERO, Vec3::new(4.0, 10.0, 3.0), 1.0, 0.5)
    }

    #[test]
    fn test_add_span_keeps_column_sorted() {
        let mut hf = field();
        hf.add_span(1, 1, 10, 12, 1, 0).unwrap();
        hf.add_span(1, 1, 0, 2, 1, 0).unwrap();
        hf.add_span(1, 1, 5, 6, 1, 0).unwrap();

        let column = hf.column(1, 1).unwrap();
        let mins: Vec<i32> = column.iter().map(|s| s.min).collect();
        assert_eq!(mins, vec![0, 5, 10]);
        assert_eq!(hf.span_count(), 3);
    }

    #[test]
    fn test_add_span_merges_overlaps() {
        let mut hf = field();
        hf.add_span(0, 0, 0, 4, 1, 0).unwrap();
        hf.add_span(0, 0, 8, 10, 1, 0).unwrap();
        hf.add_span(0, 0, 3, 9, 2, 0).unwrap();

        assert_eq!(hf.column(0, 0).unwrap(), &[Span::new(0, 10, 2)]);
    }

    #[test]
    fn test_flag_merge_threshold_keeps_walkable_area() {
        let mut hf = field();
        hf.add_span(2, 0, 0, 10, WALKABLE_AREA, 0).unwrap();
        // Top differs by 1, inside the threshold: area stays walkable
        hf.add_span(2, 0, 5, 9, NULL_AREA, 1).unwrap();
        assert_eq!(hf.column(2, 0).unwrap()[0].area, WALKABLE_AREA);

        // New top well above the old one: obstacle area wins
        hf.add_span(2, 0, 5, 20, NULL_AREA, 1).unwrap();
        assert_eq!(hf.column(2, 0).unwrap(), &[Span::new(0, 20, NULL_AREA)]);
    }

    #[test]
    fn test_out_of_bounds_cells() {
        let mut hf = field();
        assert!(hf.column(4, 0).is_none());
        assert!(hf.column(-1, 0).is_none());
        assert!(matches!(
            hf.add_span(0, 3, 0, 1, 1, 0),
            Err(Error::Heightfield(_))
        ));
        assert!(hf.add_span(0, 0, 2, 1, 1, 0).is_err());
    }

    #[test]
    fn test_push_span_rejects_overlap() {
        let mut hf = field();
        hf.push_span(3, 2, Span::new(0, 4, 1)).unwrap();
        hf.push_span(3, 2, Span::new(6, 8, 1)).unwrap();
        assert!(hf.push_span(3, 2, Span::new(7, 9, 1)).is_err());
        assert_eq!(hf.height_range(), Some((0, 8)));
    }

    #[test]
    fn test_span_world_extent() {
        let mut hf = field();
        hf.bmin.y = -1.0;
        let (lo, hi) = hf.span_world_extent(&Span::new(2, 6, 1));
        assert!((lo - 0.0).abs() < 1e-6);
        assert!((hi - 2.0).abs() < 1e-6);
        assert_eq!(hf.cell_rect(2, 1), (2.0, 1.0, 3.0, 2.0));
    }

    #[test]
    fn test_serde_preserves_columns() {
        let mut hf = field().with_border_size(2);
        hf.add_span(1, 2, 3, 7, WALKABLE_AREA, 0).unwrap();
        let json = serde_json::to_string(&hf).unwrap();
        let back: Heightfield = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hf);
    }
}
