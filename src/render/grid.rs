use crate::render::surface::{Canvas, PlaneTarget};
use crate::session::opts::GridOpts;

fn to_nearest(v: f64, step: f64) -> f64 {
    (v / step).round() * step
}

fn is_bold(v: f64, bold: f64, thresh: f64) -> bool {
    let v = if v < 0.0 { v - thresh / 2.0 } else { v + thresh / 2.0 };
    v.abs() % bold < thresh
}

/// Dot grid on the grid plane.
///
/// When regular dots would be closer than 5 pixels only bold dots are drawn; when those would
/// be closer than 10 pixels the grid is skipped. Far zoomed in, every dot is drawn bold.
pub(crate) fn draw_grid(canvas: &mut Canvas, grid: &GridOpts) {
    let map = canvas.map;
    let clip = canvas.clip;
    let (w, h) = (clip.hx + 1, clip.hy + 1);
    let scale = map.scale();
    let mut sx = grid.spacing_x;
    let mut sy = grid.spacing_y;
    if !(sx > 0.0 && sy > 0.0) {
        return;
    }
    let bold_x = sx * f64::from(grid.bold_every_x.max(1));
    let bold_y = sy * f64::from(grid.bold_every_y.max(1));
    let thresh_x = sx / 4.0;
    let thresh_y = sy / 4.0;

    let lx = map.grid_x(0);
    let hx = map.grid_x(w);
    let top = map.grid_y(0);
    let bottom = map.grid_y(h);
    let mut x1 = to_nearest(lx, sx);
    let mut y1 = to_nearest(top, sy);

    let mut all_bold = false;
    if sx * scale < 5.0 || sy * scale < 5.0 {
        x1 = to_nearest(x1, bold_x);
        y1 = to_nearest(y1, bold_y);
        sx = bold_x;
        sy = bold_y;
        if sx * scale < 10.0 || sy * scale < 10.0 {
            tracing::debug!(scale, "grid too dense, not drawn");
            return;
        }
    } else if sx * scale > 75.0 && sy * scale > 75.0 {
        all_bold = true;
    }

    let mut raster = canvas.raster(PlaneTarget::Grid);
    let raster = raster.get();
    let mut gy = y1;
    while gy > bottom {
        let bold_row = is_bold(gy, bold_y, thresh_y);
        let y = map.y(gy);
        let mut gx = x1;
        while gx < hx {
            let cur = gx;
            gx += sx;
            let x = map.x(cur);
            if x < 0 || x >= w || y < 0 || y >= h {
                continue;
            }
            let bold = bold_row && is_bold(cur, bold_x, thresh_x);
            if all_bold && bold {
                raster.fill_box((x - 2).max(0), (x + 2).min(w - 1), (y - 2).max(0), (y + 2).min(h - 1));
                for (px, py) in [(x - 2, y), (x + 2, y), (x, y - 2), (x, y + 2)] {
                    if px >= 0 && px < w && py >= 0 && py < h {
                        raster.fill_point(px, py);
                    }
                }
            } else if all_bold || bold {
                for (px, py) in [(x, y), (x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
                    if px >= 0 && px < w && py >= 0 && py < h {
                        raster.fill_point(px, py);
                    }
                }
            } else {
                raster.fill_point(x, y);
            }
        }
        gy -= sy;
    }

    if grid.show_axes {
        let x = map.x(0.0);
        let y = map.y(0.0);
        if x >= 0 && x < w {
            raster.fill_vline(x, 0, h - 1);
        }
        if y >= 0 && y < h {
            raster.fill_hline(y, 0, w - 1);
        }
    }
}
