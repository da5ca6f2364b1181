use std::collections::{BTreeSet, HashMap};

use crate::foundation::core::{LayerId, Rgb8};
use crate::foundation::error::{RasterError, RasterResult};
use crate::geometry::shape::TextKind;

/// Which compositor turns planes into pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositeMode {
    /// Ordered alpha blending per layer.
    #[default]
    Continuous,
    /// Transparent bits index the technology color map; opaque layers overwrite.
    Legacy,
}

/// How port and export labels are shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelDisplay {
    /// The whole name.
    #[default]
    Full,
    /// The name up to its first non-alphanumeric character.
    Short,
    /// A cross at the label position.
    Cross,
}

/// Per-category text switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextVisibility {
    /// Cell variables.
    pub cell: bool,
    /// Export labels.
    pub export: bool,
    /// Node variables.
    pub node: bool,
    /// Arc variables.
    pub arc: bool,
    /// Annotation text.
    pub annotation: bool,
    /// Unexpanded instance names.
    pub instance: bool,
    /// Port labels.
    pub port: bool,
}

impl Default for TextVisibility {
    fn default() -> Self {
        Self {
            cell: true,
            export: true,
            node: true,
            arc: true,
            annotation: true,
            instance: true,
            port: true,
        }
    }
}

impl TextVisibility {
    /// Return `true` when text of `kind` is drawn.
    pub fn shows(&self, kind: TextKind) -> bool {
        match kind {
            TextKind::Cell => self.cell,
            TextKind::Export => self.export,
            TextKind::Node => self.node,
            TextKind::Arc => self.arc,
            TextKind::Annotation => self.annotation,
            TextKind::Instance => self.instance,
            TextKind::Port => self.port,
        }
    }

    /// Switch one category.
    pub fn with(mut self, kind: TextKind, on: bool) -> Self {
        let slot = match kind {
            TextKind::Cell => &mut self.cell,
            TextKind::Export => &mut self.export,
            TextKind::Node => &mut self.node,
            TextKind::Arc => &mut self.arc,
            TextKind::Annotation => &mut self.annotation,
            TextKind::Instance => &mut self.instance,
            TextKind::Port => &mut self.port,
        };
        *slot = on;
        self
    }
}

/// Grid overlay settings, in grid units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridOpts {
    /// Horizontal dot spacing.
    pub spacing_x: f64,
    /// Vertical dot spacing.
    pub spacing_y: f64,
    /// Every n-th column of dots is bold.
    pub bold_every_x: u32,
    /// Every n-th row of dots is bold.
    pub bold_every_y: u32,
    /// Draw lines through the origin.
    pub show_axes: bool,
}

impl Default for GridOpts {
    fn default() -> Self {
        Self {
            spacing_x: 1.0,
            spacing_y: 1.0,
            bold_every_x: 10,
            bold_every_y: 10,
            show_axes: false,
        }
    }
}

/// Options for one render session.
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Singletons promoted to cached bitmaps per redraw.
    pub singleton_quota: usize,
    /// An instance is too large to cache when both of its sides reach the viewport side divided
    /// by this.
    pub large_instance_divisor: u32,
    /// Stipple fills are used only above this scale.
    pub patterned_scale_limit: f64,
    /// Alpha-blending-overcolor is used only above this scale.
    pub overcolor_scale_limit: f64,
    /// Greeking threshold in pixels.
    pub min_text_size: i32,
    /// Text size clamp in pixels.
    pub max_text_size: i32,
    /// Treat every instance as expanded.
    pub full_instantiate: bool,
    /// Compositor.
    pub composite: CompositeMode,
    /// Compose strips on the rayon pool.
    pub parallel_composite: bool,
    /// Per-category text switches.
    pub text_visibility: TextVisibility,
    /// Port label display.
    pub port_display: LabelDisplay,
    /// Export label display.
    pub export_display: LabelDisplay,
    /// Grid overlay; `None` disables it.
    pub grid: Option<GridOpts>,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            singleton_quota: 5,
            large_instance_divisor: 32,
            patterned_scale_limit: 0.5,
            overcolor_scale_limit: 0.5,
            min_text_size: 5,
            max_text_size: 200,
            full_instantiate: false,
            composite: CompositeMode::Continuous,
            parallel_composite: false,
            text_visibility: TextVisibility::default(),
            port_display: LabelDisplay::Full,
            export_display: LabelDisplay::Full,
            grid: None,
        }
    }
}

impl RenderOpts {
    /// Set the singleton promotion quota.
    pub fn with_singleton_quota(mut self, quota: usize) -> Self {
        self.singleton_quota = quota;
        self
    }

    /// Set the large-instance divisor.
    pub fn with_large_instance_divisor(mut self, divisor: u32) -> Self {
        self.large_instance_divisor = divisor;
        self
    }

    /// Set the stipple scale limit.
    pub fn with_patterned_scale_limit(mut self, limit: f64) -> Self {
        self.patterned_scale_limit = limit;
        self
    }

    /// Set the overcolor scale limit.
    pub fn with_overcolor_scale_limit(mut self, limit: f64) -> Self {
        self.overcolor_scale_limit = limit;
        self
    }

    /// Set the greeking threshold and size clamp.
    pub fn with_text_sizes(mut self, min: i32, max: i32) -> Self {
        self.min_text_size = min;
        self.max_text_size = max;
        self
    }

    /// Expand every instance.
    pub fn with_full_instantiate(mut self, on: bool) -> Self {
        self.full_instantiate = on;
        self
    }

    /// Pick the compositor.
    pub fn with_composite(mut self, mode: CompositeMode) -> Self {
        self.composite = mode;
        self
    }

    /// Compose strips in parallel.
    pub fn with_parallel_composite(mut self, on: bool) -> Self {
        self.parallel_composite = on;
        self
    }

    /// Replace the text switches.
    pub fn with_text_visibility(mut self, v: TextVisibility) -> Self {
        self.text_visibility = v;
        self
    }

    /// Set port label display.
    pub fn with_port_display(mut self, d: LabelDisplay) -> Self {
        self.port_display = d;
        self
    }

    /// Set export label display.
    pub fn with_export_display(mut self, d: LabelDisplay) -> Self {
        self.export_display = d;
        self
    }

    /// Enable the grid overlay.
    pub fn with_grid(mut self, grid: GridOpts) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> RasterResult<()> {
        if self.large_instance_divisor == 0 {
            return Err(RasterError::validation(
                "render opts 'large_instance_divisor' must be >= 1",
            ));
        }
        if self.min_text_size < 1 || self.max_text_size < self.min_text_size {
            return Err(RasterError::validation(
                "render opts text sizes must satisfy 1 <= min <= max",
            ));
        }
        if !self.patterned_scale_limit.is_finite() || !self.overcolor_scale_limit.is_finite() {
            return Err(RasterError::validation("render opts scale limits must be finite"));
        }
        if let Some(g) = &self.grid
            && (!(g.spacing_x > 0.0 && g.spacing_y > 0.0) || g.bold_every_x == 0 || g.bold_every_y == 0)
        {
            return Err(RasterError::validation(
                "grid spacing must be > 0 and bold intervals >= 1",
            ));
        }
        Ok(())
    }
}

/// Colors of everything that is not a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayColors {
    /// Background.
    pub background: Rgb8,
    /// Unexpanded instance outlines and layer-less shapes.
    pub instance: Rgb8,
    /// Grid dots and axes.
    pub grid: Rgb8,
    /// Text without a layer.
    pub text: Rgb8,
}

impl Default for DisplayColors {
    fn default() -> Self {
        Self {
            background: Rgb8::new(255, 255, 255),
            instance: Rgb8::new(0, 0, 0),
            grid: Rgb8::new(0, 0, 0),
            text: Rgb8::new(0, 0, 0),
        }
    }
}

/// Per-layer visibility, opacity and highlight overrides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerVisibility {
    hidden: BTreeSet<LayerId>,
    opacity: HashMap<LayerId, f64>,
    highlighted: BTreeSet<LayerId>,
}

impl LayerVisibility {
    /// Everything visible at technology opacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide a layer.
    pub fn with_hidden(mut self, layer: LayerId) -> Self {
        self.hidden.insert(layer);
        self
    }

    /// Override a layer's opacity; clamped to `[0, 1]`.
    pub fn with_opacity(mut self, layer: LayerId, opacity: f64) -> Self {
        self.opacity.insert(layer, opacity.clamp(0.0, 1.0));
        self
    }

    /// Highlight a layer; all others are dimmed.
    pub fn with_highlight(mut self, layer: LayerId) -> Self {
        self.highlighted.insert(layer);
        self
    }

    /// Return `true` when the layer is drawn.
    pub fn is_visible(&self, layer: LayerId) -> bool {
        !self.hidden.contains(&layer)
    }

    /// Effective opacity of a layer.
    pub fn opacity(&self, layer: LayerId, technology_default: f64) -> f64 {
        self.opacity.get(&layer).copied().unwrap_or(technology_default)
    }

    /// Return `true` when the layer is highlighted.
    pub fn is_highlighted(&self, layer: LayerId) -> bool {
        self.highlighted.contains(&layer)
    }

    /// Return `true` when any layer is highlighted.
    pub fn any_highlighted(&self) -> bool {
        !self.highlighted.is_empty()
    }

    /// Return `true` when the two differ in which layers are drawn at all.
    pub(crate) fn hidden_differs(&self, other: &Self) -> bool {
        self.hidden != other.hidden
    }
}
