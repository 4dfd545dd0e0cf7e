use log::error;
use thiserror::Error;

use super::links::resolve_links;
use super::store::PositionMap;
use super::types::{Curve, Link, NodeEntry, Point, Position};

/// Errors raised while building a canvas.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
	/// Two nodes in one canvas share an id.
	#[error("duplicate node id `{0}`")]
	DuplicateId(String),
}

/// Pointer drag of a single node. Positions are in canvas space.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	offset: Point,
	pending: Option<Point>,
	last: Point,
}

impl DragState {
	/// Remember where inside the node the pointer grabbed it.
	pub fn begin(&mut self, pointer: Point, origin: Point) {
		self.active = true;
		self.offset = pointer - origin;
		self.pending = None;
		self.last = origin;
	}

	/// Record the latest pointer position. Returns `true` when nothing was
	/// pending yet, i.e. a frame task has to be scheduled to apply it.
	pub fn move_to(&mut self, pointer: Point) -> bool {
		if !self.active {
			return false;
		}
		self.pending.replace(pointer - self.offset).is_none()
	}

	/// Position to apply this frame, if any move arrived since the last one.
	pub fn take_pending(&mut self) -> Option<Point> {
		let next = self.pending.take()?;
		self.last = next;
		Some(next)
	}

	/// Finish the drag, returning the final position.
	pub fn end(&mut self) -> Option<Point> {
		if !self.active {
			return None;
		}
		self.take_pending();
		self.active = false;
		Some(self.last)
	}
}

/// Nodes registered with one canvas, in mount order.
#[derive(Clone, Debug, Default)]
pub struct GraphState {
	nodes: Vec<NodeEntry>,
	pub redraws: u64,
	/// Curves of the latest redraw.
	pub drawn: Vec<Curve>,
}

impl GraphState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, entry: NodeEntry) -> Result<(), GraphError> {
		if self.contains(&entry.id) {
			error!("node `{}` is already mounted in this canvas", entry.id);
			return Err(GraphError::DuplicateId(entry.id));
		}
		self.nodes.push(entry);
		Ok(())
	}

	pub fn unregister(&mut self, id: &str) {
		self.nodes.retain(|n| n.id != id);
	}

	pub fn contains(&self, id: &str) -> bool {
		self.nodes.iter().any(|n| n.id == id)
	}

	pub fn nodes(&self) -> &[NodeEntry] {
		&self.nodes
	}

	/// Persisted entries that belong to a mounted node.
	pub fn apply_positions(&self, positions: &PositionMap) -> Vec<(String, Position)> {
		positions
			.iter()
			.filter(|(id, _)| self.contains(id))
			.map(|(id, p)| (id.clone(), *p))
			.collect()
	}

	pub fn links(&self) -> Vec<Link> {
		resolve_links(self.nodes())
	}
}
