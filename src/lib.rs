//! Influence atlas: a lane-by-timeline force layout for influence networks,
//! with the Leptos client-side app wiring and routes.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
mod components;
mod pages;

pub use components::atlas::{
	AtlasCanvas, AtlasConfig, AtlasData, AtlasEngine, AtlasEvent, Body, Edge, EdgeSegment,
	EdgeVisual, ForceKind, ForceSet, GraphModel, HighlightState, Interaction, Lane, LaneMap,
	LanePolicy, Node, NodeFilter, NodeIdx, NodeView, NodeVisual, Point, RawLink, RawNode,
	Simulation, TemporalScale, ViewTransform, label_threshold, radius_for, year_from_timestamp,
};
pub use components::atlas::Error as AtlasError;

// Top-Level pages
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the homepage and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Influence Atlas" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
