use leptos::prelude::*;

use crate::components::atlas::{AtlasCanvas, AtlasData, AtlasEvent};

const ECONOMISTS: &str = include_str!("economists.json");

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let status = RwSignal::new(String::from("Click a node or a school header."));
	let on_event = Callback::new(move |ev: AtlasEvent| {
		status.set(match ev {
			AtlasEvent::NodeClicked(id) => format!("Selected {id}"),
			AtlasEvent::SelectionCleared => String::from("Selection cleared"),
			AtlasEvent::LaneClicked(lane) => format!("Lane {lane}"),
		});
	});

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

			<div class="fullscreen-graph">
				{move || {
					AtlasData::from_json(ECONOMISTS)
						.map(|data| {
							view! {
								<AtlasCanvas
									data=Signal::stored(data)
									fullscreen=true
									on_event=on_event
								/>
							}
						})
				}}
				<div class="graph-overlay">
					<h1>"Influence Atlas"</h1>
					<p class="subtitle">
						"Schools run left to right, birth years top to bottom. Drag nodes, scroll to zoom, drag the background to pan."
					</p>
					<p class="status">{move || status.get()}</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
