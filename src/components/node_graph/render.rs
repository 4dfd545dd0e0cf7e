use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement};

use super::types::Curve;

/// Stroke color when `--line-color` is unset.
pub const DEFAULT_LINE_COLOR: &str = "#1e293b";
/// Stroke width when `--line-width` is unset or invalid.
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// Stroke used for every link.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkStyle {
	/// Any CSS color.
	pub color: String,
	/// Line width in pixels.
	pub width: f64,
}

impl Default for LinkStyle {
	fn default() -> Self {
		Self {
			color: DEFAULT_LINE_COLOR.into(),
			width: DEFAULT_LINE_WIDTH,
		}
	}
}

impl LinkStyle {
	/// Read `--line-color` and `--line-width` from the element's computed style.
	pub fn from_element(el: &Element) -> Self {
		let Some(decl) = web_sys::window().and_then(|w| w.get_computed_style(el).ok().flatten())
		else {
			return Self::default();
		};
		let prop = |name: &str| decl.get_property_value(name).unwrap_or_default();
		Self::from_properties(&prop("--line-color"), &prop("--line-width"))
	}

	/// Build from raw custom-property values, falling back to the defaults.
	pub fn from_properties(color: &str, width: &str) -> Self {
		let color = color.trim();
		Self {
			color: if color.is_empty() {
				DEFAULT_LINE_COLOR.into()
			} else {
				color.into()
			},
			width: parse_length(width).unwrap_or(DEFAULT_LINE_WIDTH),
		}
	}
}

/// Parse a unitless or `px` CSS length.
fn parse_length(raw: &str) -> Option<f64> {
	let raw = raw.trim();
	let n: f64 = raw.strip_suffix("px").unwrap_or(raw).trim().parse().ok()?;
	(n.is_finite() && n >= 0.0).then_some(n)
}

pub fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

/// Match the backing store to the on-screen size. Resizing clears the canvas.
pub fn sync_size(canvas: &HtmlCanvasElement, width: f64, height: f64) {
	let (w, h) = (width.max(0.0) as u32, height.max(0.0) as u32);
	if canvas.width() != w {
		canvas.set_width(w);
	}
	if canvas.height() != h {
		canvas.set_height(h);
	}
}

pub fn render(
	ctx: &CanvasRenderingContext2d,
	width: f64,
	height: f64,
	curves: &[Curve],
	style: &LinkStyle,
) {
	ctx.clear_rect(0.0, 0.0, width, height);
	ctx.set_stroke_style_str(&style.color);
	ctx.set_line_width(style.width);
	for curve in curves {
		ctx.begin_path();
		ctx.move_to(curve.start.x, curve.start.y);
		ctx.bezier_curve_to(
			curve.c1.x,
			curve.c1.y,
			curve.c2.x,
			curve.c2.y,
			curve.end.x,
			curve.end.y,
		);
		ctx.stroke();
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn style_falls_back_when_unset() {
		assert_eq!(LinkStyle::from_properties("", ""), LinkStyle::default());
	}

	#[test]
	fn style_reads_overrides() {
		let style = LinkStyle::from_properties(" #ff0000 ", " 3.5px");
		assert_eq!(style.color, "#ff0000");
		assert_eq!(style.width, 3.5);
	}

	#[test]
	fn bad_width_uses_default() {
		assert_eq!(parse_length("thick"), None);
		assert_eq!(parse_length("-1"), None);
		assert_eq!(parse_length("4"), Some(4.0));
		assert_eq!(LinkStyle::from_properties("red", "wide").width, DEFAULT_LINE_WIDTH);
	}
}
