use serde::{Deserialize, Serialize};

/// `localStorage` key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "node_graph_pos";

/// A point in canvas space (pixels from the canvas's top-left corner).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Pixels from the left edge.
	pub x: f64,
	/// Pixels from the top edge.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

impl std::ops::Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

/// Persisted position of a node, stored as `{"x": .., "y": ..}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	/// CSS `left`, in pixels.
	pub x: f64,
	/// CSS `top`, in pixels.
	pub y: f64,
}

impl From<Point> for Position {
	fn from(p: Point) -> Self {
		Self { x: p.x, y: p.y }
	}
}

impl From<Position> for Point {
	fn from(p: Position) -> Self {
		Point::new(p.x, p.y)
	}
}

/// Axis-aligned box, usually a node's bounding rect in canvas space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	/// X of the left edge.
	pub left: f64,
	/// Y of the top edge.
	pub top: f64,
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

impl Rect {
	/// Rect from its top-left corner and size.
	pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
		Self {
			left,
			top,
			width,
			height,
		}
	}

	/// X of the right edge.
	pub fn right(&self) -> f64 {
		self.left + self.width
	}

	/// Vertical midpoint of the right edge, where outgoing links start.
	pub fn right_mid(&self) -> Point {
		Point::new(self.right(), self.top + self.height / 2.0)
	}

	/// Vertical midpoint of the left edge, where incoming links end.
	pub fn left_mid(&self) -> Point {
		Point::new(self.left, self.top + self.height / 2.0)
	}

	/// Re-express this rect relative to `origin`'s top-left corner.
	pub fn relative_to(&self, origin: &Rect) -> Rect {
		Rect::new(
			self.left - origin.left,
			self.top - origin.top,
			self.width,
			self.height,
		)
	}
}

impl From<&web_sys::DomRect> for Rect {
	fn from(r: &web_sys::DomRect) -> Self {
		Rect::new(r.left(), r.top(), r.width(), r.height())
	}
}

/// Horizontal control-point offset: `max(min_offset, |dx| * factor)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveParams {
	/// Smallest offset, used for nodes that sit close together.
	pub min_offset: f64,
	/// Share of the horizontal distance used as the offset.
	pub factor: f64,
}

impl Default for CurveParams {
	fn default() -> Self {
		Self {
			min_offset: 60.0,
			factor: 0.4,
		}
	}
}

impl CurveParams {
	/// Control-point offset for a horizontal distance of `dx`.
	pub fn offset(&self, dx: f64) -> f64 {
		self.min_offset.max(dx.abs() * self.factor)
	}
}

/// Cubic Bézier connector between two nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Curve {
	/// Right-edge midpoint of the source.
	pub start: Point,
	/// First control point, `start` pushed right.
	pub c1: Point,
	/// Second control point, `end` pushed left.
	pub c2: Point,
	/// Left-edge midpoint of the target.
	pub end: Point,
}

impl Curve {
	/// Connector leaving `from` on the right and entering `to` on the left.
	pub fn between(from: &Rect, to: &Rect, params: &CurveParams) -> Self {
		let (start, end) = (from.right_mid(), to.left_mid());
		let k = params.offset(end.x - start.x);
		Self {
			start,
			c1: Point::new(start.x + k, start.y),
			c2: Point::new(end.x - k, end.y),
			end,
		}
	}

	/// The same curve as an SVG path, `M x y C c1x c1y, c2x c2y, x y`.
	pub fn svg_path(&self) -> String {
		format!(
			"M {} {} C {} {}, {} {}, {} {}",
			self.start.x,
			self.start.y,
			self.c1.x,
			self.c1.y,
			self.c2.x,
			self.c2.y,
			self.end.x,
			self.end.y
		)
	}
}

/// A node as seen by its canvas: its id and the ids it links to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeEntry {
	pub id: String,
	pub targets: Vec<String>,
}

/// Directed connector from `source` to `target`, derived on every redraw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
	pub source: String,
	pub target: String,
}

/// Behavioural settings for a [`NodeCanvas`](super::NodeCanvas).
#[derive(Clone, Debug, PartialEq)]
pub struct NodeGraphConfig {
	/// Key of the position blob in `localStorage`.
	pub storage_key: String,
	/// Connector shape.
	pub curve: CurveParams,
	/// Delay before the initial layout pass. `None` waits one animation frame.
	pub initial_delay_ms: Option<u32>,
}

impl Default for NodeGraphConfig {
	fn default() -> Self {
		Self {
			storage_key: DEFAULT_STORAGE_KEY.into(),
			curve: CurveParams::default(),
			initial_delay_ms: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn anchors_sit_on_vertical_midpoints() {
		let r = Rect::new(10.0, 20.0, 140.0, 40.0);
		assert_eq!(r.right_mid(), Point::new(150.0, 40.0));
		assert_eq!(r.left_mid(), Point::new(10.0, 40.0));
	}

	#[test]
	fn relative_to_subtracts_origin() {
		let canvas = Rect::new(100.0, 50.0, 800.0, 600.0);
		let node = Rect::new(130.0, 70.0, 140.0, 40.0);
		assert_eq!(node.relative_to(&canvas), Rect::new(30.0, 20.0, 140.0, 40.0));
	}

	#[test]
	fn close_nodes_get_minimum_bulge() {
		let params = CurveParams::default();
		let a = Rect::new(0.0, 0.0, 100.0, 40.0);
		let b = Rect::new(150.0, 100.0, 100.0, 40.0);
		let curve = Curve::between(&a, &b, &params);
		assert_eq!(curve.start, Point::new(100.0, 20.0));
		assert_eq!(curve.end, Point::new(150.0, 120.0));
		assert_eq!(curve.c1, Point::new(160.0, 20.0));
		assert_eq!(curve.c2, Point::new(90.0, 120.0));
	}

	#[test]
	fn distant_nodes_scale_with_distance() {
		let params = CurveParams::default();
		let a = Rect::new(0.0, 0.0, 100.0, 40.0);
		let b = Rect::new(600.0, 0.0, 100.0, 40.0);
		let curve = Curve::between(&a, &b, &params);
		// |600 - 100| * 0.4
		assert_eq!(curve.c1.x, 300.0);
		assert_eq!(curve.c2.x, 400.0);
	}

	#[test]
	fn backwards_links_use_absolute_distance() {
		let params = CurveParams {
			min_offset: 10.0,
			factor: 0.5,
		};
		assert_eq!(params.offset(-200.0), 100.0);
		assert_eq!(params.offset(4.0), 10.0);
	}

	#[test]
	fn svg_path_matches_bezier_points() {
		let curve = Curve {
			start: Point::new(1.0, 2.0),
			c1: Point::new(3.0, 2.0),
			c2: Point::new(4.0, 5.0),
			end: Point::new(6.0, 5.0),
		};
		assert_eq!(curve.svg_path(), "M 1 2 C 3 2, 4 5, 6 5");
	}

	#[test]
	fn position_json_shape() {
		let json = serde_json::to_string(&Position { x: 10.0, y: 20.5 }).unwrap();
		assert_eq!(json, r#"{"x":10.0,"y":20.5}"#);
	}
}
