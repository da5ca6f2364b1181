use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crate::bitmap::cache::BitmapCache;
use crate::design::snapshot::DesignSnapshot;
use crate::foundation::core::{CellId, GridPoint, GridRect, LayerId};
use crate::foundation::error::{RasterError, RasterResult};
use crate::foundation::orient::Orient;
use crate::geometry::cache::GeometryCache;
use crate::raster::text::{ApproxMetrics, TextMetrics};
use crate::render::compositor::composite;
use crate::render::drawing::{PassCounters, PassInput, render_pass};
use crate::render::surface::RenderedPlanes;
use crate::render::{FrameRGBA, PaintSink};
use crate::session::fingerprint::{PlaneFingerprint, fingerprint_planes};
use crate::session::opts::{DisplayColors, LayerVisibility, RenderOpts};
use crate::session::viewport::{Viewport, ViewportInfo};

/// Totals over the life of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Completed passes.
    pub passes: u64,
    /// Passes that failed and published nothing.
    pub failed_passes: u64,
    /// Passes whose output matched the previously published snapshot.
    pub unchanged_passes: u64,
    /// Cell geometries walked.
    pub cells_rendered: u64,
    /// Offscreen bitmaps rendered.
    pub bitmaps_created: u64,
    /// Instances drawn by copying a stored bitmap.
    pub bitmaps_used: u64,
    /// Geometry cache rebuilds.
    pub recomputes: u64,
}

/// One finished pass, immutable once published.
///
/// Holds everything the paint path needs, so compositing never waits for a running pass.
#[derive(Clone)]
pub struct RenderSnapshot {
    generation: u64,
    top: CellId,
    scale: f64,
    planes: RenderedPlanes,
    fingerprint: PlaneFingerprint,
    counters: PassCounters,
    design: Arc<dyn DesignSnapshot>,
    opts: RenderOpts,
    colors: DisplayColors,
    layers: LayerVisibility,
}

impl std::fmt::Debug for RenderSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSnapshot")
            .field("generation", &self.generation)
            .field("top", &self.top)
            .field("scale", &self.scale)
            .field("fingerprint", &self.fingerprint)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl RenderSnapshot {
    /// Position in the session's sequence of completed passes, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rendered top cell.
    pub fn top(&self) -> CellId {
        self.top
    }

    /// Scale the planes were drawn at.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Bit planes and deferred text.
    pub fn planes(&self) -> &RenderedPlanes {
        &self.planes
    }

    /// Digest of the planes and text.
    pub fn fingerprint(&self) -> PlaneFingerprint {
        self.fingerprint
    }

    /// Work done by the pass.
    pub fn counters(&self) -> PassCounters {
        self.counters
    }

    /// Composite the planes to pixels. Cheap enough to repeat on every paint.
    pub fn composite(&self) -> FrameRGBA {
        composite(
            &self.planes,
            self.design.technology(),
            &self.layers,
            &self.colors,
            &self.opts,
            self.scale,
        )
    }
}

/// Caches and settings a pass reads and updates.
struct Renderer {
    design: Arc<dyn DesignSnapshot>,
    opts: RenderOpts,
    colors: DisplayColors,
    layers: LayerVisibility,
    metrics: Arc<dyn TextMetrics>,
    geometry: GeometryCache,
    bitmaps: BitmapCache,
    stats: RenderStats,
    generation: u64,
    last_fingerprint: Option<PlaneFingerprint>,
}

impl Renderer {
    fn render(&mut self, top: CellId, viewport: &Viewport) -> RasterResult<RenderSnapshot> {
        let recomputes = self.geometry.recomputes();
        let input = PassInput {
            design: self.design.as_ref(),
            top,
            viewport,
            opts: &self.opts,
            colors: &self.colors,
            layers: &self.layers,
            metrics: self.metrics.as_ref(),
        };
        let geometry = &mut self.geometry;
        let bitmaps = &mut self.bitmaps;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| render_pass(&input, geometry, bitmaps)));
        let result = match outcome {
            Ok(r) => r,
            Err(_) => {
                tracing::error!(cell = top.0, "render pass aborted, dropping caches");
                self.geometry.clear();
                self.bitmaps.clear();
                Err(RasterError::render("render pass aborted"))
            }
        };
        let (planes, counters) = match result {
            Ok(v) => v,
            Err(e) => {
                self.stats.failed_passes += 1;
                return Err(e);
            }
        };

        let fingerprint = fingerprint_planes(&planes);
        self.generation += 1;
        self.stats.passes += 1;
        if self.last_fingerprint == Some(fingerprint) {
            self.stats.unchanged_passes += 1;
        }
        self.last_fingerprint = Some(fingerprint);
        self.stats.cells_rendered += counters.cells_drawn;
        self.stats.bitmaps_created += counters.bitmaps_created;
        self.stats.bitmaps_used += counters.bitmaps_copied;
        self.stats.recomputes += self.geometry.recomputes() - recomputes;

        Ok(RenderSnapshot {
            generation: self.generation,
            top,
            scale: viewport.scale(),
            planes,
            fingerprint,
            counters,
            design: Arc::clone(&self.design),
            opts: self.opts.clone(),
            colors: self.colors,
            layers: self.layers.clone(),
        })
    }
}

type Slot = Mutex<Option<Arc<RenderSnapshot>>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Job {
    Render { top: CellId, viewport: Viewport },
    Flush(Sender<()>),
}

fn publish(slot: &Slot, snapshot: RenderSnapshot) -> Arc<RenderSnapshot> {
    let snapshot = Arc::new(snapshot);
    *lock(slot) = Some(Arc::clone(&snapshot));
    snapshot
}

fn worker_loop(jobs: Receiver<Job>, renderer: Arc<Mutex<Renderer>>, slot: Arc<Slot>) {
    while let Ok(first) = jobs.recv() {
        let mut pending = None;
        let mut waiters = Vec::new();
        for job in std::iter::once(first).chain(jobs.try_iter()) {
            match job {
                Job::Render { top, viewport } => {
                    if pending.is_some() {
                        tracing::trace!("render request superseded");
                    }
                    pending = Some((top, viewport));
                }
                Job::Flush(reply) => waiters.push(reply),
            }
        }
        if let Some((top, viewport)) = pending {
            let result = lock(&renderer).render(top, &viewport);
            match result {
                Ok(snapshot) => {
                    publish(&slot, snapshot);
                }
                Err(e) => tracing::error!(error = %e, "background render failed"),
            }
        }
        for reply in waiters {
            let _ = reply.send(());
        }
    }
    tracing::debug!("render worker stopped");
}

/// Owns the caches of one view and a background worker that renders into a single published
/// slot.
///
/// Requests are coalesced, not queued: the worker renders the newest request it finds. Whatever
/// finishes last is what [`RenderSession::latest`] returns, even when an older request finishes
/// after a newer synchronous render.
pub struct RenderSession {
    renderer: Arc<Mutex<Renderer>>,
    slot: Arc<Slot>,
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession")
            .field("latest", &self.latest())
            .finish_non_exhaustive()
    }
}

impl RenderSession {
    /// Session over `design` with validated options and a running worker thread.
    pub fn new(design: Arc<dyn DesignSnapshot>, opts: RenderOpts) -> RasterResult<Self> {
        opts.validate()?;
        let mut geometry = GeometryCache::new();
        // record current revisions so the first set_design reports real edits
        geometry.propagate_invalidation(design.as_ref(), &[], opts.full_instantiate);
        let renderer = Arc::new(Mutex::new(Renderer {
            design,
            opts,
            colors: DisplayColors::default(),
            layers: LayerVisibility::default(),
            metrics: Arc::new(ApproxMetrics::default()),
            geometry,
            bitmaps: BitmapCache::new(),
            stats: RenderStats::default(),
            generation: 0,
            last_fingerprint: None,
        }));
        let slot: Arc<Slot> = Arc::new(Mutex::new(None));
        let (tx, rx) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("cellraster-render".to_owned())
            .spawn({
                let renderer = Arc::clone(&renderer);
                let slot = Arc::clone(&slot);
                move || worker_loop(rx, renderer, slot)
            })
            .map_err(|e| RasterError::render(format!("failed to start render worker: {e}")))?;
        Ok(Self {
            renderer,
            slot,
            jobs: Some(tx),
            worker: Some(worker),
        })
    }

    /// Replace the text measurer used for layout.
    pub fn with_metrics(self, metrics: Arc<dyn TextMetrics>) -> Self {
        lock(&self.renderer).metrics = metrics;
        self
    }

    /// Swap in a new design revision and drop what the change affects.
    ///
    /// `changed` names cells edited in place; cells whose record was replaced are found on
    /// their own. Returns the cells whose drawing may differ.
    pub fn set_design(
        &self,
        design: Arc<dyn DesignSnapshot>,
        changed: &[CellId],
    ) -> BTreeSet<CellId> {
        let mut r = lock(&self.renderer);
        let expand_all = r.opts.full_instantiate;
        let dirty = r
            .geometry
            .propagate_invalidation(design.as_ref(), changed, expand_all);
        r.bitmaps.invalidate(&dirty);
        r.design = design;
        dirty
    }

    /// Change options; bitmaps are dropped because fill patterns and expansion may differ.
    pub fn set_opts(&self, opts: RenderOpts) -> RasterResult<()> {
        opts.validate()?;
        let mut r = lock(&self.renderer);
        r.opts = opts;
        r.bitmaps.clear();
        Ok(())
    }

    /// Change the non-layer colors. Takes effect on the next pass.
    pub fn set_colors(&self, colors: DisplayColors) {
        lock(&self.renderer).colors = colors;
    }

    /// Change layer visibility, opacity and highlighting.
    pub fn set_layers(&self, layers: LayerVisibility) {
        let mut r = lock(&self.renderer);
        if r.layers.hidden_differs(&layers) {
            r.bitmaps.clear();
        }
        r.layers = layers;
    }

    /// Inject a rectangle into a cell's cached geometry.
    pub fn add_box_to_cell(&self, cell: CellId, layer: LayerId, rect: GridRect) {
        let mut r = lock(&self.renderer);
        let design = Arc::clone(&r.design);
        r.geometry.add_box_to_cell(design.as_ref(), cell, layer, rect);
        r.bitmaps.invalidate(&BTreeSet::from([cell]));
    }

    /// Inject an unexpanded instance outline into a cell's cached geometry.
    pub fn add_instance_to_cell(&self, cell: CellId, child: CellId, at: GridPoint, orient: Orient) {
        let mut r = lock(&self.renderer);
        let design = Arc::clone(&r.design);
        r.geometry
            .add_instance_to_cell(design.as_ref(), cell, child, at, orient);
        r.bitmaps.invalidate(&BTreeSet::from([cell]));
    }

    /// Drop every cached geometry and bitmap.
    pub fn clear_caches(&self) {
        let mut r = lock(&self.renderer);
        r.geometry.clear();
        r.bitmaps.clear();
    }

    /// Render on the calling thread and publish the result.
    pub fn render_now(&self, top: CellId, viewport: &Viewport) -> RasterResult<Arc<RenderSnapshot>> {
        let snapshot = lock(&self.renderer).render(top, viewport)?;
        Ok(publish(&self.slot, snapshot))
    }

    /// Ask the worker for a redraw and return immediately.
    pub fn request_render(&self, top: CellId, viewport: Viewport) -> RasterResult<()> {
        self.send(Job::Render { top, viewport })
    }

    /// Block until every request sent so far has been handled.
    pub fn flush(&self) -> RasterResult<()> {
        let (tx, rx) = mpsc::channel();
        self.send(Job::Flush(tx))?;
        rx.recv()
            .map_err(|_| RasterError::render("render worker stopped"))
    }

    fn send(&self, job: Job) -> RasterResult<()> {
        self.jobs
            .as_ref()
            .and_then(|tx| tx.send(job).ok())
            .ok_or_else(|| RasterError::render("render worker stopped"))
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> Option<Arc<RenderSnapshot>> {
        lock(&self.slot).clone()
    }

    /// Composite the latest snapshot on the calling thread and hand it to `sink`.
    ///
    /// Returns `false` when nothing has been published yet.
    pub fn paint(&self, sink: &mut dyn PaintSink) -> RasterResult<bool> {
        let Some(snapshot) = self.latest() else {
            return Ok(false);
        };
        let frame = snapshot.composite();
        sink.paint(&frame, snapshot.planes().text())?;
        Ok(true)
    }

    /// Totals so far.
    pub fn stats(&self) -> RenderStats {
        lock(&self.renderer).stats
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("render worker panicked");
        }
    }
}
