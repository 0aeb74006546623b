use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::solver::Point;
use super::state::AtlasEngine;

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Screen-space height of the lane header strip.
pub const HEADER_HEIGHT: f64 = 28.0;
const AXIS_STEP_YEARS: i32 = 50;

fn lane_color(index: usize) -> &'static str {
	COLORS[index % COLORS.len()]
}

pub fn render(engine: &AtlasEngine, ctx: &CanvasRenderingContext2d) {
	let (width, height) = engine.size();
	let t = engine.transform();
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, width, height);
	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_lanes(engine, ctx);
	draw_axis(engine, ctx);
	draw_edges(engine, ctx);
	draw_nodes(engine, ctx);
	ctx.restore();
	draw_header(engine, ctx);
}

fn draw_lanes(engine: &AtlasEngine, ctx: &CanvasRenderingContext2d) {
	let lanes = engine.lanes();
	let (_, height) = engine.size();
	let w = lanes.lane_width();
	for lane in lanes.lanes() {
		let alpha = match engine.focus() {
			Some(f) if f == lane.label => 0.12,
			Some(_) => 0.02,
			None if lane.index % 2 == 0 => 0.05,
			None => 0.03,
		};
		ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {alpha})"));
		ctx.fill_rect(lane.x - w / 2.0, 0.0, w, height);
	}
}

fn draw_axis(engine: &AtlasEngine, ctx: &CanvasRenderingContext2d) {
	let k = engine.transform().k;
	let right = engine.lanes().total_width();
	ctx.set_stroke_style_str("rgba(255, 255, 255, 0.08)");
	ctx.set_line_width(1.0 / k);
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.4)");
	ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(4.0 / k),
		&JsValue::from_f64(4.0 / k),
	));
	for (year, y) in engine.scale().ticks(AXIS_STEP_YEARS) {
		ctx.begin_path();
		ctx.move_to(0.0, y);
		ctx.line_to(right, y);
		ctx.stroke();
		let _ = ctx.fill_text(&year.to_string(), 4.0 / k, y - 3.0 / k);
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_edges(engine: &AtlasEngine, ctx: &CanvasRenderingContext2d) {
	let k = engine.transform().k;
	for (_, seg, visual) in engine.visible_edges() {
		let width = if visual.emphasized { 1.8 / k } else { 0.8 / k };
		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {})", visual.opacity));
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(seg.x1, seg.y1);
		ctx.line_to(seg.x2, seg.y2);
		ctx.stroke();
	}
}

fn draw_nodes(engine: &AtlasEngine, ctx: &CanvasRenderingContext2d) {
	let t = engine.transform();
	let k = t.k;
	let lanes = engine.lanes();

	for view in engine.visible_nodes() {
		let Point { x, y } = view.pos;
		let radius = t.screen_radius(view.radius) / k;
		let color = lane_color(lanes.lane_for(view.node.category.as_deref()).index);

		ctx.set_global_alpha(view.visual.opacity);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(color);
		ctx.fill();

		if view.visual.matched || view.visual.highlighted {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(if view.visual.matched { "#ffd54f" } else { "white" });
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		if view.visual.label_visible {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.85)");
			ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
			let _ = ctx.fill_text(&view.node.label, x + radius + 3.0 / k, y + 3.0 / k);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_header(engine: &AtlasEngine, ctx: &CanvasRenderingContext2d) {
	let (width, _) = engine.size();
	let t = engine.transform();
	ctx.set_fill_style_str("rgba(10, 10, 25, 0.85)");
	ctx.fill_rect(0.0, 0.0, width, HEADER_HEIGHT);
	ctx.set_font("11px sans-serif");
	ctx.set_text_align("center");
	for lane in engine.lanes().lanes() {
		let sx = t.apply(Point::new(lane.x, 0.0)).x;
		let focused = engine.focus() == Some(lane.label.as_str());
		ctx.set_fill_style_str(if focused { "white" } else { lane_color(lane.index) });
		let _ = ctx.fill_text(&lane.label, sx, HEADER_HEIGHT - 10.0);
	}
	ctx.set_text_align("start");
}
