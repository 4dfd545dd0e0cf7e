mod component;
mod frame;
mod links;
mod render;
mod state;
mod store;
mod types;

pub use component::{CanvasContext, NODE_MOVE_EVENT, NodeCanvas, NodeItem};
pub use render::LinkStyle;
pub use state::GraphError;
pub use store::{LocalStorageStore, MemoryStore, PositionMap, PositionStore, StoreError};
pub use types::{Curve, CurveParams, DEFAULT_STORAGE_KEY, NodeGraphConfig, Point, Position, Rect};
