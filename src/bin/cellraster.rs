use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use cellraster::{
    CompositeMode, DeferredText, DesignSnapshot, FrameRGBA, GridOpts, MemoryDesign, PaintSink,
    RasterResult, RenderOpts, RenderSession, Rgb8, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "cellraster", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one cell of a design as a PNG.
    Render(RenderArgs),
    /// List the cells of a design with their bounds.
    Cells(CellsArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input design JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Name of the cell to render.
    #[arg(long)]
    cell: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Pixels per grid unit; fits the cell into the image when omitted.
    #[arg(long)]
    scale: Option<f64>,

    /// Image width in pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Draw every instance expanded.
    #[arg(long, default_value_t = false)]
    expand_all: bool,

    /// Use the color-map compositor.
    #[arg(long, default_value_t = false)]
    legacy: bool,

    /// Overlay a dot grid with this spacing in grid units.
    #[arg(long)]
    grid: Option<f64>,

    /// Compose strips in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Print pass statistics.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

#[derive(Parser, Debug)]
struct CellsArgs {
    /// Input design JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Cells(args) => cmd_cells(args),
    }
}

fn load(path: &Path) -> anyhow::Result<MemoryDesign> {
    MemoryDesign::from_path(path).with_context(|| format!("load design '{}'", path.display()))
}

/// Headless sink: keeps the composited pixels and draws deferred text as simple marks.
struct PngSink {
    image: Option<image::RgbaImage>,
}

impl PngSink {
    fn put(img: &mut image::RgbaImage, x: i32, y: i32, c: Rgb8) {
        if x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
            return;
        }
        img.put_pixel(x as u32, y as u32, image::Rgba([c.r, c.g, c.b, 255]));
    }

    fn hline(img: &mut image::RgbaImage, y: i32, lx: i32, hx: i32, c: Rgb8) {
        for x in lx..=hx {
            Self::put(img, x, y, c);
        }
    }

    fn vline(img: &mut image::RgbaImage, x: i32, ly: i32, hy: i32, c: Rgb8) {
        for y in ly..=hy {
            Self::put(img, x, y, c);
        }
    }
}

impl PaintSink for PngSink {
    fn paint(&mut self, frame: &FrameRGBA, text: &[DeferredText]) -> RasterResult<()> {
        let mut img = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| cellraster::RasterError::render("frame buffer has the wrong size"))?;
        for item in text {
            match item {
                DeferredText::Greek(g) => Self::hline(&mut img, g.y, g.lx, g.hx, g.color),
                DeferredText::Cross(c) => {
                    Self::hline(&mut img, c.y, c.x - 3, c.x + 3, c.color);
                    Self::vline(&mut img, c.x, c.y - 3, c.y + 3, c.color);
                }
                DeferredText::Text(t) => {
                    // no font rasterizer here: underline the text's box
                    let (x, y, w, h) = t.bounds;
                    Self::hline(&mut img, y + h - 1, x, x + w - 1, t.color);
                    Self::vline(&mut img, x, y, y + h - 1, t.color);
                }
            }
        }
        self.image = Some(img);
        Ok(())
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let design = load(&args.in_path)?;
    let top = design
        .cell_by_name(&args.cell)
        .with_context(|| format!("no cell named '{}'", args.cell))?;
    let bounds = design.cell_bounds(top).unwrap_or_default();

    let fitted = Viewport::fit(bounds, args.width, args.height)?;
    let viewport = match args.scale {
        Some(scale) => {
            let (cx, cy) = fitted.center();
            Viewport::new(args.width, args.height, scale)?.with_center(cx, cy)
        }
        None => fitted,
    };

    let mut opts = RenderOpts::default()
        .with_full_instantiate(args.expand_all)
        .with_parallel_composite(args.parallel);
    if args.legacy {
        opts = opts.with_composite(CompositeMode::Legacy);
    }
    if let Some(spacing) = args.grid {
        opts = opts.with_grid(GridOpts {
            spacing_x: spacing,
            spacing_y: spacing,
            ..GridOpts::default()
        });
    }

    let session = RenderSession::new(Arc::new(design), opts)?;
    session
        .render_now(top, &viewport)
        .with_context(|| format!("render cell '{}'", args.cell))?;
    let mut sink = PngSink { image: None };
    session.paint(&mut sink)?;
    let img = sink.image.context("nothing was painted")?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    img.save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    if args.stats {
        let s = session.stats();
        eprintln!(
            "cells={} bitmaps_created={} bitmaps_used={} recomputes={}",
            s.cells_rendered, s.bitmaps_created, s.bitmaps_used, s.recomputes
        );
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_cells(args: CellsArgs) -> anyhow::Result<()> {
    let design = load(&args.in_path)?;
    for id in design.cells_bottom_up() {
        let name = design.cell_name(id).unwrap_or_default();
        let b = design.cell_bounds(id).unwrap_or_default();
        println!("{name}\t{} {} {} {}", b.lx, b.ly, b.hx, b.hy);
    }
    Ok(())
}
