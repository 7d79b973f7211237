//! Raw color mutations of [`Geometry`].
//!
//! These run inside [`GeometryCommand::apply`](super::GeometryCommand) and are
//! not recorded in the history themselves.

use crate::color::{ColorManager, Rgba};
use crate::detail::TriangleDetail;
use crate::error::{GeometryError, Result};
use crate::math::distance_3d::circle_polygon;
use crate::math::{Point3, TOLERANCE};
use crate::mesh::{ColorIndex, DetailedTriangleId, TriangleId};

use super::Geometry;

impl Geometry {
    /// Sets the color of a whole triangle or of one sub-triangle.
    pub(crate) fn set_triangle_color(
        &mut self,
        id: DetailedTriangleId,
        color: ColorIndex,
    ) -> Result<()> {
        self.palette.check_index(color)?;
        self.triangle(id.base)?;
        match id.detail {
            None => {
                self.details.remove(&id.base);
                self.triangles[id.base.0].color = color;
            }
            Some(index) => {
                let detail = self.details.get_mut(&id.base).ok_or(
                    GeometryError::InvalidDetailId {
                        base: id.base.0,
                        detail: index,
                    },
                )?;
                detail.set_color(index, color)?;
                self.sync_detail(id.base);
            }
        }
        Ok(())
    }

    /// Paints whole triangles.
    pub(crate) fn set_region_color(&mut self, ids: &[TriangleId], color: ColorIndex) -> Result<()> {
        self.palette.check_index(color)?;
        for &id in ids {
            self.set_triangle_color(id.into(), color)?;
        }
        Ok(())
    }

    /// Paints the part of a triangle covered by a world-space polygon.
    pub(crate) fn paint_area(
        &mut self,
        id: TriangleId,
        polygon: &[Point3],
        color: ColorIndex,
    ) -> Result<()> {
        self.palette.check_index(color)?;
        let result = self.detail_mut(id)?.paint_polygon(polygon, color);
        self.sync_detail(id);
        result
    }

    /// Paints whatever part of a triangle a world-space polygon covers,
    /// leaving the triangle untouched when the polygon misses it.
    pub(crate) fn paint_area_clipped(
        &mut self,
        id: TriangleId,
        polygon: &[Point3],
        color: ColorIndex,
    ) -> Result<()> {
        self.palette.check_index(color)?;
        let result = self.detail_mut(id)?.paint_polygon_clipped(polygon, color);
        self.sync_detail(id);
        result.map(|_| ())
    }

    /// Paints the part of a triangle covered by a circle in its plane.
    pub(crate) fn paint_circle_area(
        &mut self,
        id: TriangleId,
        center: &Point3,
        radius: f64,
        color: ColorIndex,
    ) -> Result<()> {
        let normal = self.triangle(id)?.normal;
        if radius <= TOLERANCE || !radius.is_finite() {
            return Ok(());
        }
        self.paint_area_clipped(id, &circle_polygon(center, &normal, radius), color)
    }

    /// Existing detail of `id`, or a fresh one covering the whole triangle.
    fn detail_mut(&mut self, id: TriangleId) -> Result<&mut TriangleDetail> {
        if !self.details.contains_key(&id) {
            let detail = TriangleDetail::new(self.triangle(id)?)?;
            self.details.insert(id, detail);
        }
        self.details.get_mut(&id).ok_or_else(|| {
            GeometryError::InvalidTriangleId {
                id: id.0,
                count: self.triangles.len(),
            }
            .into()
        })
    }

    /// Collapses a single-colored detail and keeps the triangle color equal to
    /// the detail's dominant color.
    fn sync_detail(&mut self, id: TriangleId) {
        let Some(detail) = self.details.get(&id) else {
            return;
        };
        if let Some(color) = detail.uniform_color() {
            self.details.remove(&id);
            self.triangles[id.0].color = color;
        } else {
            self.triangles[id.0].color = detail.dominant_color();
        }
    }

    /// Rewrites every color reference through `map`.
    fn remap_all(&mut self, map: impl Fn(ColorIndex) -> ColorIndex) {
        for triangle in &mut self.triangles {
            triangle.color = map(triangle.color);
        }
        for detail in self.details.values_mut() {
            detail.remap_colors(&map);
        }
        let ids: Vec<TriangleId> = self.details.keys().copied().collect();
        for id in ids {
            self.sync_detail(id);
        }
    }

    // --- Palette ---

    pub(crate) fn add_palette_color(&mut self, color: Rgba) -> Result<ColorIndex> {
        self.palette.add_color(color)
    }

    /// Removes a palette entry. Triangles using it fall back to color 0,
    /// higher indices shift down by one.
    pub(crate) fn remove_palette_color(&mut self, index: ColorIndex) -> Result<()> {
        self.palette.remove_color(index)?;
        self.remap_all(|c| match c.cmp(&index) {
            std::cmp::Ordering::Less => c,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => c - 1,
        });
        Ok(())
    }

    /// Exchanges two palette entries and the triangles referencing them, so
    /// the visible colors stay the same.
    pub(crate) fn reorder_palette_colors(&mut self, a: ColorIndex, b: ColorIndex) -> Result<()> {
        self.palette.swap_colors(a, b)?;
        self.remap_all(|c| {
            if c == a {
                b
            } else if c == b {
                a
            } else {
                c
            }
        });
        Ok(())
    }

    /// Exchanges two palette entries only; triangles swap their visible colors.
    pub(crate) fn swap_palette_colors(&mut self, a: ColorIndex, b: ColorIndex) -> Result<()> {
        self.palette.swap_colors(a, b)
    }

    pub(crate) fn change_palette_color(&mut self, index: ColorIndex, color: Rgba) -> Result<()> {
        self.palette.set_color(index, color)
    }

    /// Replaces the palette; indices beyond the new palette are clamped.
    pub(crate) fn replace_palette_colors(&mut self, colors: &[Rgba]) -> Result<()> {
        self.palette.replace_colors(colors.iter().copied())?;
        let last = self.palette.len() - 1;
        self.remap_all(|c| c.min(last));
        Ok(())
    }

    /// Restores the default palette; indices beyond it are clamped.
    pub(crate) fn reset_palette(&mut self) {
        self.palette = ColorManager::new();
        let last = self.palette.len() - 1;
        self.remap_all(|c| c.min(last));
    }

    /// Selects the palette entry tools paint with. Not recorded in the history.
    pub fn set_active_color_index(&mut self, index: ColorIndex) {
        self.palette.set_active_color_index(index);
    }
}
