mod component;
mod config;
mod error;
mod highlight;
mod interaction;
mod lanes;
mod model;
mod render;
mod scale;
mod solver;
mod state;
mod types;

pub use component::AtlasCanvas;
pub use config::{AtlasConfig, LanePolicy};
pub use error::{Error, Result};
pub use highlight::{EdgeVisual, HighlightState, NodeVisual, label_threshold};
pub use interaction::{Interaction, ViewTransform};
pub use lanes::{Lane, LaneMap};
pub use model::{Edge, GraphModel, Node, NodeIdx, year_from_timestamp};
pub use scale::TemporalScale;
pub use solver::{Body, ForceKind, ForceSet, Point, Simulation};
pub use state::{AtlasEngine, AtlasEvent, EdgeSegment, NodeFilter, NodeView, radius_for};
pub use types::{AtlasData, RawLink, RawNode};
