pub(crate) mod context;
pub(crate) mod model;
pub(crate) mod snapshot;
pub(crate) mod tech;
pub(crate) mod text;
