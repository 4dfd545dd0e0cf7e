use std::collections::HashMap;

use log::debug;

use super::types::{Curve, CurveParams, Link, NodeEntry, Rect};

/// Split a `to` attribute into target ids. Whitespace is trimmed and empty
/// entries (`"a,,b"`, trailing commas) are dropped.
pub fn parse_targets(to: &str) -> Vec<String> {
	to.split(',')
		.map(str::trim)
		.filter(|id| !id.is_empty())
		.map(String::from)
		.collect()
}

/// Resolve every declared target against the nodes currently present.
/// Links are produced in node order; unknown targets are skipped.
pub fn resolve_links(nodes: &[NodeEntry]) -> Vec<Link> {
	let mut links = Vec::new();
	for node in nodes {
		for target in &node.targets {
			// first match wins
			match nodes.iter().find(|n| &n.id == target) {
				Some(found) => links.push(Link {
					source: node.id.clone(),
					target: found.id.clone(),
				}),
				None => debug!("link {} -> {} skipped: no such node", node.id, target),
			}
		}
	}
	links
}

/// One curve per link whose endpoints both have a measured rect.
pub fn link_curves(
	links: &[Link],
	rects: &HashMap<String, Rect>,
	params: &CurveParams,
) -> Vec<Curve> {
	links
		.iter()
		.filter_map(|link| {
			let (from, to) = (rects.get(&link.source)?, rects.get(&link.target)?);
			Some(Curve::between(from, to, params))
		})
		.collect()
}
