use std::collections::HashMap;
use std::rc::Rc;

use leptos::html::{Canvas, Div};
use leptos::prelude::*;
use leptos_meta::Style;
use log::{debug, error, info};
use wasm_bindgen::prelude::*;
use web_sys::{
	CustomEvent, CustomEventInit, Element, Event, HtmlElement, MouseEvent, ResizeObserver,
};

use super::frame::{FrameThrottle, schedule_after, schedule_frame};
use super::links::{link_curves, parse_targets};
use super::render::{self, LinkStyle};
use super::state::{DragState, GraphError, GraphState};
use super::store::{LocalStorageStore, PositionStore};
use super::types::{Curve, CurveParams, NodeEntry, NodeGraphConfig, Point, Position, Rect};

const STYLES: &str = r#"
.node-canvas {
	display: block;
	position: relative;
	width: 100%;
	overflow: hidden;
	background: var(--canvas-bg, transparent);
}
.node-canvas > .node-canvas-overlay {
	position: absolute;
	inset: 0;
	width: 100%;
	height: 100%;
	pointer-events: none;
	z-index: 0;
}
.node-item {
	position: absolute;
	min-width: 140px;
	cursor: grab;
	user-select: none;
	z-index: 1;
}
.node-item > .card {
	background: var(--node-bg, white);
	border: var(--node-border, 1px solid #cbd5e1);
	border-radius: var(--node-radius, 8px);
	color: var(--node-color, inherit);
	padding: 12px;
	text-align: center;
}
"#;

/// Bubbling DOM event a [`NodeItem`] dispatches from its element whenever it
/// moves. [`NodeCanvas`] redraws on it; any other ancestor may listen too.
pub const NODE_MOVE_EVENT: &str = "node-move";

type ResizeHook = (ResizeObserver, Closure<dyn FnMut(js_sys::Array)>);
type DragListeners = (WindowListenerHandle, WindowListenerHandle);

#[derive(Default)]
struct CanvasHooks {
	resize: Option<ResizeHook>,
	node_move: Option<Closure<dyn FnMut(Event)>>,
}

#[derive(Clone, Copy)]
struct MountedNode {
	node_ref: NodeRef<Div>,
	position: RwSignal<Position>,
}

fn announce_move(el: &Element) {
	let init = CustomEventInit::new();
	init.set_bubbles(true);
	match CustomEvent::new_with_event_init_dict(NODE_MOVE_EVENT, &init) {
		Ok(ev) => {
			let _ = el.dispatch_event(&ev);
		}
		Err(e) => error!("could not create {} event: {:?}", NODE_MOVE_EVENT, e),
	}
}

// style is written directly so a redraw later in this frame measures the new spot
fn place(el: &HtmlElement, position: Position) {
	let style = el.style();
	let _ = style.set_property("left", &format!("{}px", position.x));
	let _ = style.set_property("top", &format!("{}px", position.y));
}

/// Shared by a [`NodeCanvas`] with the nodes inside it.
#[derive(Clone, Copy)]
pub struct CanvasContext {
	root: NodeRef<Div>,
	overlay: NodeRef<Canvas>,
	curve: CurveParams,
	graph: StoredValue<GraphState>,
	mounted: StoredValue<HashMap<String, MountedNode>>,
	store: StoredValue<Rc<dyn PositionStore>, LocalStorage>,
	throttle: StoredValue<Rc<FrameThrottle>, LocalStorage>,
}

impl CanvasContext {
	fn new(
		root: NodeRef<Div>,
		overlay: NodeRef<Canvas>,
		curve: CurveParams,
		store: Rc<dyn PositionStore>,
	) -> Self {
		Self {
			root,
			overlay,
			curve,
			graph: StoredValue::new(GraphState::new()),
			mounted: StoredValue::new(HashMap::new()),
			store: StoredValue::new_local(store),
			throttle: StoredValue::new_local(Rc::new(FrameThrottle::new())),
		}
	}

	fn register(
		&self,
		entry: NodeEntry,
		node_ref: NodeRef<Div>,
		position: RwSignal<Position>,
	) -> Result<(), GraphError> {
		let id = entry.id.clone();
		self.graph
			.try_update_value(|g| g.register(entry))
			.unwrap_or(Ok(()))?;
		self.mounted.update_value(|m| {
			m.insert(id, MountedNode { node_ref, position });
		});
		self.request_redraw();
		Ok(())
	}

	fn unregister(&self, id: &str) {
		self.graph.try_update_value(|g| g.unregister(id));
		self.mounted.try_update_value(|m| {
			m.remove(id);
		});
		self.request_redraw();
	}

	/// Redraw on the next animation frame, coalescing bursts.
	pub fn request_redraw(&self) {
		let Some(throttle) = self.throttle.try_get_value() else {
			return;
		};
		let this = *self;
		throttle.run(move || this.redraw_all_links());
	}

	/// Redraw before the next paint. Node moves are already applied once
	/// per frame, so this keeps links in step with the card being dragged.
	fn redraw_before_paint(&self) {
		let Some(throttle) = self.throttle.try_get_value() else {
			return;
		};
		let this = *self;
		throttle.run_before_paint(move || this.redraw_all_links());
	}

	/// Save one node's position. Write failures are logged, not raised.
	pub fn persist_position(&self, id: &str, position: Position) {
		match self.store.try_with_value(|s| s.save_one(id, position)) {
			Some(Ok(())) => debug!("saved `{}` at ({}, {})", id, position.x, position.y),
			Some(Err(e)) => error!("could not save position of `{}`: {}", id, e),
			None => {}
		}
	}

	/// Apply persisted positions to the nodes currently mounted.
	pub fn load_positions(&self) {
		let Some(saved) = self.store.try_with_value(|s| s.load_all()) else {
			return;
		};
		let Some(applied) = self.graph.try_with_value(|g| g.apply_positions(&saved)) else {
			return;
		};
		info!(
			"restored {} of {} saved node positions",
			applied.len(),
			saved.len()
		);
		self.mounted.try_with_value(|m| {
			for (id, position) in applied {
				if let Some(node) = m.get(&id) {
					node.position.set(position);
				}
			}
		});
	}

	/// Clear the overlay and draw one curve per resolvable link.
	pub fn redraw_all_links(&self) {
		let Some(root) = self.root.get_untracked() else {
			return;
		};
		let Some(overlay) = self.overlay.get_untracked() else {
			return;
		};
		// padding box: the overlay and node offsets are measured inside the border
		let outer = root.get_bounding_client_rect();
		let origin = Rect::new(
			outer.left() + root.client_left() as f64,
			outer.top() + root.client_top() as f64,
			root.client_width() as f64,
			root.client_height() as f64,
		);
		let Some(rects) = self.mounted.try_with_value(|m| {
			m.iter()
				.filter_map(|(id, node)| {
					let el = node.node_ref.get_untracked()?;
					let rect = Rect::from(&el.get_bounding_client_rect()).relative_to(&origin);
					Some((id.clone(), rect))
				})
				.collect::<HashMap<_, _>>()
		}) else {
			return;
		};
		let Some(links) = self.graph.try_with_value(GraphState::links) else {
			return;
		};
		let curves = link_curves(&links, &rects, &self.curve);

		render::sync_size(&overlay, origin.width, origin.height);
		let Some(ctx) = render::context_2d(&overlay) else {
			error!("overlay has no 2d context");
			return;
		};
		render::render(
			&ctx,
			origin.width,
			origin.height,
			&curves,
			&LinkStyle::from_element(&root),
		);
		let count = curves.len();
		let redraws = self.graph.try_update_value(|g| {
			g.redraws += 1;
			g.drawn = curves;
			g.redraws
		});
		debug!("redraw #{}: {} links", redraws.unwrap_or_default(), count);
	}

	/// Number of completed redraws since the canvas mounted.
	pub fn redraw_count(&self) -> u64 {
		self.graph.try_with_value(|g| g.redraws).unwrap_or_default()
	}

	/// Curves drawn by the latest redraw, in canvas space.
	pub fn drawn_curves(&self) -> Vec<Curve> {
		self.graph
			.try_with_value(|g| g.drawn.clone())
			.unwrap_or_default()
	}
}

/// Container that draws curved links between the [`NodeItem`]s inside it
/// and remembers where they were dragged to.
#[component]
pub fn NodeCanvas(
	/// Storage key, curve constants and initial layout timing.
	#[prop(optional)]
	config: NodeGraphConfig,
	/// Where positions are kept. Defaults to `localStorage` under `config.storage_key`.
	#[prop(optional)]
	store: Option<Rc<dyn PositionStore>>,
	/// CSS height of the canvas.
	#[prop(into, default = "600px".into())]
	height: String,
	/// The nodes.
	children: Children,
) -> impl IntoView {
	let root_ref = NodeRef::<Div>::new();
	let overlay_ref = NodeRef::<Canvas>::new();
	let store = store.unwrap_or_else(|| {
		Rc::new(LocalStorageStore::new(config.storage_key.clone())) as Rc<dyn PositionStore>
	});
	let ctx = CanvasContext::new(root_ref, overlay_ref, config.curve, store);
	provide_context(ctx);

	let hooks: StoredValue<CanvasHooks, LocalStorage> =
		StoredValue::new_local(CanvasHooks::default());
	let initial_delay = config.initial_delay_ms;

	Effect::new(move |_| {
		let Some(root) = root_ref.get() else {
			return;
		};
		info!("node canvas mounted");

		let on_node_move = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
			ctx.redraw_before_paint();
		});
		if let Err(e) = root.add_event_listener_with_callback(
			NODE_MOVE_EVENT,
			on_node_move.as_ref().unchecked_ref(),
		) {
			error!("could not listen for {}: {:?}", NODE_MOVE_EVENT, e);
		}
		hooks.update_value(|h| h.node_move = Some(on_node_move));

		let on_resize = Closure::<dyn FnMut(js_sys::Array)>::new(move |_: js_sys::Array| {
			ctx.request_redraw();
		});
		let observed = ResizeObserver::new(on_resize.as_ref().unchecked_ref());
		match observed {
			Ok(ro) => {
				ro.observe(&root);
				hooks.update_value(|h| h.resize = Some((ro, on_resize)));
			}
			Err(e) => error!("resize observer unavailable: {:?}", e),
		}

		let initial_load = move || {
			ctx.load_positions();
			ctx.request_redraw();
		};
		match initial_delay {
			Some(ms) => schedule_after(ms, initial_load),
			None => schedule_frame(initial_load),
		}
	});

	on_cleanup(move || {
		hooks.try_update_value(|h| {
			if let Some((ro, _)) = h.resize.take() {
				ro.disconnect();
			}
			if let (Some(cb), Some(root)) = (h.node_move.take(), root_ref.get_untracked()) {
				let _ = root.remove_event_listener_with_callback(
					NODE_MOVE_EVENT,
					cb.as_ref().unchecked_ref(),
				);
			}
		});
	});

	view! {
		<Style>{STYLES}</Style>
		<div node_ref=root_ref class="node-canvas" style:height=height>
			<canvas node_ref=overlay_ref class="node-canvas-overlay" />
			{children()}
		</div>
	}
}

/// A draggable card. Links to the comma-separated ids in `to`.
#[component]
pub fn NodeItem(
	/// Unique id; the link target and storage key for this node.
	#[prop(into)]
	id: String,
	/// Comma-separated ids this node links to.
	#[prop(optional, into)]
	to: Option<String>,
	/// Initial left offset, used until a saved position is loaded.
	#[prop(optional)]
	x: f64,
	/// Initial top offset, used until a saved position is loaded.
	#[prop(optional)]
	y: f64,
	/// Card content. Defaults to "Node".
	#[prop(optional)]
	children: Option<Children>,
) -> Result<impl IntoView, GraphError> {
	let node_ref = NodeRef::<Div>::new();
	let position = RwSignal::new(Position { x, y });
	let drag = StoredValue::new(DragState::default());
	let listeners: StoredValue<Option<DragListeners>, LocalStorage> = StoredValue::new_local(None);
	let canvas = use_context::<CanvasContext>();

	if let Some(canvas) = canvas {
		let entry = NodeEntry {
			id: id.clone(),
			targets: to.as_deref().map(parse_targets).unwrap_or_default(),
		};
		canvas.register(entry, node_ref, position)?;
		let id = id.clone();
		on_cleanup(move || canvas.unregister(&id));
	}

	let remove_listeners = move || {
		listeners.try_update_value(|l| {
			if let Some((on_move, on_up)) = l.take() {
				on_move.remove();
				on_up.remove();
			}
		});
	};
	on_cleanup(remove_listeners);

	let move_to = move |next: Position| {
		position.set(next);
		if let Some(el) = node_ref.get_untracked() {
			place(&el, next);
			announce_move(&el);
		}
	};

	let apply_pending = move || {
		if let Some(next) = drag.try_update_value(|d| d.take_pending()).flatten() {
			move_to(next.into());
		}
	};

	let on_move = move |ev: MouseEvent| {
		let pointer = Point::new(ev.client_x() as f64, ev.client_y() as f64);
		if drag.try_update_value(|d| d.move_to(pointer)) == Some(true) {
			schedule_frame(apply_pending);
		}
	};

	let node_id = id.clone();
	let on_up = move |_: MouseEvent| {
		remove_listeners();
		let Some(last) = drag.try_update_value(|d| d.end()).flatten() else {
			return;
		};
		move_to(last.into());
		if let Some(canvas) = canvas {
			canvas.persist_position(&node_id, last.into());
		}
	};

	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		ev.prevent_default();
		let pointer = Point::new(ev.client_x() as f64, ev.client_y() as f64);
		let origin: Point = position.get_untracked().into();
		drag.update_value(|d| d.begin(pointer, origin));
		remove_listeners();
		let handles = (
			window_event_listener(leptos::ev::mousemove, on_move),
			window_event_listener(leptos::ev::mouseup, on_up.clone()),
		);
		listeners.set_value(Some(handles));
	};

	let body = match children {
		Some(children) => children(),
		None => "Node".into_any(),
	};

	Ok(view! {
		<div
			node_ref=node_ref
			id=id
			class="node-item"
			style:left=move || format!("{}px", position.get().x)
			style:top=move || format!("{}px", position.get().y)
			on:mousedown=on_mousedown
		>
			<div class="card">{body}</div>
		</div>
	})
}
