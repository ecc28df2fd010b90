//! Side panel describing the selected graph node.

use leptos::prelude::*;

use super::health::{Health, NodeView};
use super::style::health_color;

/// Details of the selected node, hidden when nothing is selected.
#[component]
pub fn NodeDetailsPanel(selected: RwSignal<Option<NodeView>>) -> impl IntoView {
	move || {
		selected.get().map(|view| {
			let kind_name = view
				.kind
				.display_name()
				.map_or_else(|| view.node.resource_type.clone(), str::to_string);
			let layer = view.layer.map_or("Unclassified", |l| l.label);
			let location = view.location();
			let mut tags: Vec<(String, String)> = view.node.tags.clone().into_iter().collect();
			tags.sort();

			let rows = [
				("Type", kind_name),
				("ID", view.node.id.clone()),
				("Location", if location.is_empty() { "-".into() } else { location }),
				("Layer", layer.to_string()),
				("Exposure", if view.public { "Public" } else { "Private" }.to_string()),
			]
			.into_iter()
			.chain(view.details.iter().map(|(k, v)| (*k, v.clone())))
			.map(|(k, v)| view! { <dt>{k}</dt> <dd>{v}</dd> })
			.collect_view();

			let tag_list = (!tags.is_empty()).then(|| {
				let items = tags
					.into_iter()
					.map(|(k, v)| view! { <li><span class="tag-key">{k}</span> "=" {v}</li> })
					.collect_view();
				view! {
					<h4>"Tags"</h4>
					<ul class="tags">{items}</ul>
				}
			});

			view! {
				<aside class="node-details">
					<header>
						<h3>{view.label.clone()}</h3>
						<button class="close" on:click=move |_| selected.set(None)>
							"\u{00d7}"
						</button>
					</header>
					<HealthBadge health=view.health />
					<dl>{rows}</dl>
					{tag_list}
				</aside>
			}
		})
	}
}

#[component]
fn HealthBadge(health: Health) -> impl IntoView {
	view! {
		<span class="health-badge" style:border-color=health_color(health).to_css()>
			{health.label()}
		</span>
	}
}
