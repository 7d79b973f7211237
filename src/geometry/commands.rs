//! Undoable commands over [`Geometry`].

use std::any::Any;
use std::sync::Arc;

use crate::color::Rgba;
use crate::command::Command;
use crate::error::{Result, SegmentationError};
use crate::math::{Point3, Ray};
use crate::mesh::{ColorIndex, DetailedTriangleId, TriangleId};
use crate::progress::{AtomicProgress, NoProgress};

use super::{BrushSettings, Geometry, LetterTriangles};

/// Every color mutation a tool can issue against a [`Geometry`].
#[derive(Debug, Clone)]
pub enum GeometryCommand {
    /// Paint a whole triangle or a single sub-triangle.
    PaintTriangle {
        triangle: DetailedTriangleId,
        color: ColorIndex,
    },
    /// Paint a set of whole triangles (bucket fill result).
    PaintRegion {
        triangles: Vec<TriangleId>,
        color: ColorIndex,
    },
    /// Paint several regions, each with its own color (seed spreading result).
    PaintRegions {
        regions: Vec<(ColorIndex, Vec<TriangleId>)>,
    },
    /// Paint the part of a triangle covered by a polygon.
    PaintSubTriangleArea {
        triangle: TriangleId,
        polygon: Vec<Point3>,
        color: ColorIndex,
    },
    /// Brush stroke, one ray per stamp.
    PaintBrush {
        strokes: Vec<Ray>,
        settings: BrushSettings,
    },
    /// Text stamp projected along a ray.
    PaintText {
        ray: Ray,
        letters: Vec<LetterTriangles>,
        color: ColorIndex,
        progress: Option<Arc<AtomicProgress>>,
    },
    /// Replace the palette and assign one color per triangle.
    PaintSegments {
        colors: Vec<Rgba>,
        assignments: Vec<ColorIndex>,
    },
    AddColor {
        color: Rgba,
    },
    /// Remove a palette entry; its triangles fall back to color 0.
    RemoveColor {
        index: ColorIndex,
    },
    /// Exchange two palette entries together with the triangles using them.
    ReorderColors {
        a: ColorIndex,
        b: ColorIndex,
    },
    /// Exchange two palette entries only.
    SwapColors {
        a: ColorIndex,
        b: ColorIndex,
    },
    ChangeColor {
        index: ColorIndex,
        color: Rgba,
    },
    ReplaceColors {
        colors: Vec<Rgba>,
    },
    /// Restore the default palette.
    ResetColors,
}

impl GeometryCommand {
    fn apply_segments(
        target: &mut Geometry,
        colors: &[Rgba],
        assignments: &[ColorIndex],
    ) -> Result<()> {
        if assignments.len() != target.triangle_count() {
            return Err(SegmentationError::InvalidParameters(format!(
                "{} segment colors for {} triangles",
                assignments.len(),
                target.triangle_count()
            ))
            .into());
        }
        target.replace_palette_colors(colors)?;
        for (index, &color) in assignments.iter().enumerate() {
            target.set_triangle_color(TriangleId(index).into(), color)?;
        }
        Ok(())
    }
}

impl Command<Geometry> for GeometryCommand {
    fn apply(&self, target: &mut Geometry) -> Result<()> {
        match self {
            Self::PaintTriangle { triangle, color } => target.set_triangle_color(*triangle, *color),
            Self::PaintRegion { triangles, color } => target.set_region_color(triangles, *color),
            Self::PaintRegions { regions } => regions
                .iter()
                .try_for_each(|(color, triangles)| target.set_region_color(triangles, *color)),
            Self::PaintSubTriangleArea {
                triangle,
                polygon,
                color,
            } => target.paint_area(*triangle, polygon, *color),
            Self::PaintBrush { strokes, settings } => target.paint_brush(strokes, settings),
            Self::PaintText {
                ray,
                letters,
                color,
                progress,
            } => match progress {
                Some(progress) => target.paint_text(ray, letters, *color, progress.as_ref()),
                None => target.paint_text(ray, letters, *color, &NoProgress),
            },
            Self::PaintSegments {
                colors,
                assignments,
            } => Self::apply_segments(target, colors, assignments),
            Self::AddColor { color } => target.add_palette_color(*color).map(|_| ()),
            Self::RemoveColor { index } => target.remove_palette_color(*index),
            Self::ReorderColors { a, b } => target.reorder_palette_colors(*a, *b),
            Self::SwapColors { a, b } => target.swap_palette_colors(*a, *b),
            Self::ChangeColor { index, color } => target.change_palette_color(*index, *color),
            Self::ReplaceColors { colors } => target.replace_palette_colors(colors),
            Self::ResetColors => {
                target.reset_palette();
                Ok(())
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::PaintTriangle { triangle, color } => match triangle.detail {
                Some(detail) => format!(
                    "Paint sub-triangle {detail} of triangle {} with color {color}",
                    triangle.base
                ),
                None => format!("Paint triangle {} with color {color}", triangle.base),
            },
            Self::PaintRegion { triangles, color } => {
                format!("Paint {} triangles with color {color}", triangles.len())
            }
            Self::PaintRegions { regions } => format!("Paint {} seeded regions", regions.len()),
            Self::PaintSubTriangleArea { triangle, color, .. } => {
                format!("Paint area of triangle {triangle} with color {color}")
            }
            Self::PaintBrush { strokes, settings } => {
                format!("Brush stroke ({} stamps) with color {}", strokes.len(), settings.color)
            }
            Self::PaintText { letters, color, .. } => {
                format!("Paint text ({} letters) with color {color}", letters.len())
            }
            Self::PaintSegments { colors, .. } => format!("Paint {} segments", colors.len()),
            Self::AddColor { .. } => "Add color".to_owned(),
            Self::RemoveColor { index } => format!("Remove color {index}"),
            Self::ReorderColors { a, b } => format!("Reorder colors {a} and {b}"),
            Self::SwapColors { a, b } => format!("Swap colors {a} and {b}"),
            Self::ChangeColor { index, .. } => format!("Change color {index}"),
            Self::ReplaceColors { colors } => {
                format!("Replace palette with {} colors", colors.len())
            }
            Self::ResetColors => "Reset colors".to_owned(),
        }
    }

    fn is_slow(&self) -> bool {
        matches!(
            self,
            Self::PaintBrush { .. }
                | Self::PaintText { .. }
                | Self::PaintSegments { .. }
                | Self::PaintRegions { .. }
        )
    }

    fn join(&mut self, next: &dyn Command<Geometry>) -> bool {
        let Some(next) = next.as_any().downcast_ref::<Self>() else {
            return false;
        };
        match (self, next) {
            (
                Self::PaintRegion { triangles, color },
                Self::PaintRegion {
                    triangles: more,
                    color: next_color,
                },
            ) if color == next_color => {
                triangles.extend_from_slice(more);
                true
            }
            (
                Self::PaintBrush { strokes, settings },
                Self::PaintBrush {
                    strokes: more,
                    settings: next_settings,
                },
            ) if settings == next_settings => {
                strokes.extend_from_slice(more);
                true
            }
            (
                Self::ChangeColor { index, color },
                Self::ChangeColor {
                    index: next_index,
                    color: next_color,
                },
            ) if index == next_index => {
                *color = *next_color;
                true
            }
            _ => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::Snapshot;
    use crate::error::{Error, GeometryError};
    use crate::math::Vector3;
    use crate::mesh::fixtures;

    fn cube() -> Geometry {
        Geometry::from_triangles(fixtures::cube()).unwrap()
    }

    #[test]
    fn n_commands_then_n_undos_restore_state() {
        let mut g = cube();
        let initial = g.snapshot();
        let commands = vec![
            GeometryCommand::PaintTriangle {
                triangle: TriangleId(0).into(),
                color: 1,
            },
            GeometryCommand::PaintRegion {
                triangles: vec![TriangleId(2), TriangleId(3)],
                color: 2,
            },
            GeometryCommand::PaintSubTriangleArea {
                triangle: TriangleId(4),
                polygon: vec![
                    Point3::new(0.6, 0.0, 0.1),
                    Point3::new(0.9, 0.0, 0.1),
                    Point3::new(0.9, 0.0, 0.4),
                ],
                color: 3,
            },
            GeometryCommand::AddColor {
                color: Rgba::new(0.5, 0.5, 0.5, 1.0),
            },
            GeometryCommand::ReorderColors { a: 1, b: 4 },
            GeometryCommand::RemoveColor { index: 2 },
            GeometryCommand::PaintBrush {
                strokes: vec![Ray::new(Point3::new(0.5, 0.5, 5.0), -Vector3::z())],
                settings: BrushSettings::new(0, 0.3),
            },
            GeometryCommand::ResetColors,
        ];
        let n = commands.len();
        for command in commands {
            g.execute(command).unwrap();
        }
        assert_eq!(g.history().undo_len(), n);
        assert_ne!(g.snapshot(), initial);
        for _ in 0..n {
            assert!(g.undo());
        }
        assert_eq!(g.snapshot(), initial);
        assert!(!g.undo());
    }

    #[test]
    fn undo_and_redo_on_empty_stacks_are_noops() {
        let mut g = cube();
        let initial = g.snapshot();
        assert!(!g.undo());
        assert!(!g.redo());
        assert_eq!(g.snapshot(), initial);
    }

    #[test]
    fn failed_command_is_not_recorded() {
        let mut g = cube();
        g.paint_triangle(TriangleId(0), 1).unwrap();
        let before = g.snapshot();
        let result = g.execute(GeometryCommand::PaintRegion {
            triangles: vec![TriangleId(1), TriangleId(2), TriangleId(99)],
            color: 2,
        });
        assert!(matches!(
            result,
            Err(Error::Geometry(GeometryError::InvalidTriangleId { id: 99, .. }))
        ));
        assert_eq!(g.snapshot(), before);
        assert_eq!(g.history().undo_len(), 1);
    }

    #[test]
    fn region_paints_join_by_color() {
        let mut g = cube();
        g.execute_joined(GeometryCommand::PaintRegion {
            triangles: vec![TriangleId(0)],
            color: 1,
        })
        .unwrap();
        g.execute_joined(GeometryCommand::PaintRegion {
            triangles: vec![TriangleId(1)],
            color: 1,
        })
        .unwrap();
        assert_eq!(g.history().undo_len(), 1);
        g.execute_joined(GeometryCommand::PaintRegion {
            triangles: vec![TriangleId(2)],
            color: 2,
        })
        .unwrap();
        assert_eq!(g.history().undo_len(), 2);

        g.undo();
        g.undo();
        assert!(g.triangles().iter().all(|t| t.color == 0));
    }

    #[test]
    fn change_color_joins_on_same_slot() {
        let mut g = cube();
        let original = g.color_manager().color(1).unwrap();
        for shade in [0.1, 0.2, 0.3] {
            g.execute_joined(GeometryCommand::ChangeColor {
                index: 1,
                color: Rgba::new(shade, shade, shade, 1.0),
            })
            .unwrap();
        }
        assert_eq!(g.history().undo_len(), 1);
        g.undo();
        assert_eq!(g.color_manager().color(1).unwrap(), original);
    }

    #[test]
    fn segments_replace_palette_and_colors() {
        let mut g = Geometry::from_triangles(fixtures::triangle_pair()).unwrap();
        let colors = vec![Rgba::new(1.0, 0.0, 0.0, 1.0), Rgba::new(0.0, 1.0, 0.0, 1.0)];
        g.execute(GeometryCommand::PaintSegments {
            colors: colors.clone(),
            assignments: vec![1, 0],
        })
        .unwrap();
        assert_eq!(g.color_manager().colors(), colors.as_slice());
        assert_eq!(g.triangle_color(TriangleId(0)).unwrap(), 1);

        let wrong = g.execute(GeometryCommand::PaintSegments {
            colors,
            assignments: vec![0],
        });
        assert!(wrong.is_err());
    }

    #[test]
    fn slow_commands_are_flagged() {
        let brush = GeometryCommand::PaintBrush {
            strokes: Vec::new(),
            settings: BrushSettings::default(),
        };
        assert!(brush.is_slow());
        assert!(!GeometryCommand::ResetColors.is_slow());
        assert_eq!(
            GeometryCommand::PaintTriangle {
                triangle: TriangleId(4).into(),
                color: 2
            }
            .describe(),
            "Paint triangle #4 with color 2"
        );
    }
}
