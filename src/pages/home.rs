use leptos::prelude::*;

use crate::components::node_graph::{NodeCanvas, NodeItem};

/// Sample nodes: (id, targets, initial x, initial y).
const SAMPLE_NODES: &[(&str, &str, f64, f64)] = &[
	("ingest", "parse, audit", 40.0, 60.0),
	("parse", "enrich", 300.0, 20.0),
	("audit", "", 300.0, 200.0),
	("enrich", "store, missing", 560.0, 90.0),
	("store", "", 820.0, 160.0),
];

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="graph-page">
				<div class="graph-overlay">
					<h1>"Node Graph"</h1>
					<p class="subtitle">"Drag nodes to reposition. Positions are kept between visits."</p>
				</div>
				<NodeCanvas height="80vh">
					{SAMPLE_NODES
						.iter()
						.map(|&(id, to, x, y)| {
							view! {
								<NodeItem id=id to=to x=x y=y>
									{id}
								</NodeItem>
							}
						})
						.collect_view()}
				</NodeCanvas>
			</div>
		</ErrorBoundary>
	}
}
