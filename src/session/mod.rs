//! Render orchestration: options, viewport, the background worker and the published snapshot.

pub(crate) mod fingerprint;
pub(crate) mod opts;
pub(crate) mod render_session;
pub(crate) mod viewport;
