use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::AtlasConfig;
use super::interaction::Interaction;
use super::render::{self, HEADER_HEIGHT};
use super::solver::Point;
use super::state::{AtlasEngine, AtlasEvent};
use super::types::AtlasData;

#[derive(Clone, Debug, Default)]
struct DragState {
	node: Option<String>,
	grab_dx: f64,
	grab_dy: f64,
}

#[derive(Clone, Debug, Default)]
struct PanState {
	active: bool,
	last_x: f64,
	last_y: f64,
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window
			.inner_width()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(800.0),
		window
			.inner_height()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(600.0),
	)
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Canvas host for an [`AtlasEngine`]: runs the frame loop and forwards pointer input.
#[component]
pub fn AtlasCanvas(
	#[prop(into)] data: Signal<AtlasData>,
	#[prop(optional)] config: Option<AtlasConfig>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional, into)] on_event: Option<Callback<AtlasEvent>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<AtlasEngine>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));
	let drag: Rc<RefCell<DragState>> = Rc::default();
	let pan: Rc<RefCell<PanState>> = Rc::default();

	let alive_cleanup = alive.clone();
	on_cleanup(move || alive_cleanup.store(false, Ordering::Relaxed));

	let (state_init, animate_init, resize_cb_init, alive_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), alive.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("canvas has no 2d context");
			return;
		};

		let mut engine =
			match AtlasEngine::new(&data.get(), config.clone().unwrap_or_default(), w, h) {
				Ok(engine) => engine,
				Err(err) => {
					error!("cannot start atlas: {err}");
					return;
				}
			};
		if let Some(cb) = on_event {
			engine.subscribe(move |ev| cb.run(ev.clone()));
		}
		if let Some(mut old) = state_init.borrow_mut().replace(engine) {
			old.stop();
		}

		if fullscreen && resize_cb_init.borrow().is_none() {
			let (state_resize, canvas_resize, alive_resize) =
				(state_init.clone(), canvas.clone(), alive_init.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				if !alive_resize.load(Ordering::Relaxed) {
					return;
				}
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		if animate_init.borrow().is_some() {
			return;
		}
		let (state_anim, animate_inner, alive_anim, resize_anim) = (
			state_init.clone(),
			animate_init.clone(),
			alive_init.clone(),
			resize_cb_init.clone(),
		);
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			// Unmounted: tear down here, on_cleanup can't hold the JS closures.
			if !alive_anim.load(Ordering::Relaxed) {
				if let Some(ref mut s) = *state_anim.borrow_mut() {
					s.stop();
				}
				if let (Some(cb), Some(win)) = (resize_anim.borrow_mut().take(), web_sys::window()) {
					let _ =
						win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick();
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let (state_md, drag_md, pan_md) = (state.clone(), drag.clone(), pan.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let mut engine = state_md.borrow_mut();
		let Some(s) = engine.as_mut() else {
			return;
		};

		if y < HEADER_HEIGHT {
			if let Some(label) = s.lane_at_screen(x).map(|l| l.label.clone()) {
				s.click_lane(&label);
			}
			return;
		}

		if let Some(id) = s.node_at_screen(x, y).map(String::from) {
			let grab = s.screen_to_sim(x, y);
			let at = s.position(&id).unwrap_or(grab);
			s.on_select(Some(&id));
			s.on_drag_start(&id);
			*drag_md.borrow_mut() = DragState {
				node: Some(id),
				grab_dx: at.x - grab.x,
				grab_dy: at.y - grab.y,
			};
		} else {
			s.on_select(None);
			*pan_md.borrow_mut() = PanState {
				active: true,
				last_x: x,
				last_y: y,
			};
		}
	};

	let (state_mm, drag_mm, pan_mm) = (state.clone(), drag.clone(), pan.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let mut engine = state_mm.borrow_mut();
		let Some(s) = engine.as_mut() else {
			return;
		};

		let drag = drag_mm.borrow();
		if let Some(id) = drag.node.as_deref() {
			let p = s.screen_to_sim(x, y);
			s.on_drag_move(id, Point::new(p.x + drag.grab_dx, p.y + drag.grab_dy));
			return;
		}
		let mut pan = pan_mm.borrow_mut();
		if pan.active {
			s.pan_by(x - pan.last_x, y - pan.last_y);
			pan.last_x = x;
			pan.last_y = y;
		}
	};

	let (state_mu, drag_mu, pan_mu) = (state.clone(), drag.clone(), pan.clone());
	let release = move || {
		if let Some(id) = drag_mu.borrow_mut().node.take() {
			if let Some(ref mut s) = *state_mu.borrow_mut() {
				s.on_drag_end(&id);
			}
		}
		pan_mu.borrow_mut().active = false;
	};
	let release_leave = release.clone();
	let on_mouseup = move |_: MouseEvent| release();
	let on_mouseleave = move |_: MouseEvent| release_leave();

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="atlas-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
