//! CLI command implementations.

pub(crate) mod inspect;
pub(crate) mod render;

pub(crate) use inspect::InspectArgs;
pub(crate) use render::RenderArgs;
