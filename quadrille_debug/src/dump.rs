// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON snapshots of frames and display lists.
//!
//! These mirror what a compositor's "as value" tracing would capture: every
//! pass with its shared states and quads, and every display item with its
//! payload. The output is for people and tools reading a frame after the
//! fact; nothing parses it back.

use std::io::{self, Write};

use kurbo::{Affine, BezPath, Rect, RoundedRect};
use quadrille_core::color::Color;
use quadrille_core::filter::FilterOperations;
use quadrille_core::geometry::{IntRect, IntSize};
use quadrille_core::id::RenderPassId;
use quadrille_core::quad::{DrawQuad, QuadKind};
use quadrille_core::render_pass::RenderPass;
use quadrille_core::shared_quad_state::SharedQuadState;
use quadrille_core::transform::Transform3d;
use quadrille_paint::item::{DisplayItem, DisplayItemPayload};
use quadrille_paint::picture::{PaintOp, Picture};
use serde_json::{Map, Value, json};

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

fn int_rect(r: IntRect) -> Value {
    json!([r.x, r.y, r.width, r.height])
}

fn int_size(s: IntSize) -> Value {
    json!([s.width, s.height])
}

fn rect(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}

fn rounded_rect(r: &RoundedRect) -> Value {
    let radii = r.radii();
    json!({
        "rect": rect(r.rect()),
        "radii": [radii.top_left, radii.top_right, radii.bottom_right, radii.bottom_left],
    })
}

fn color(c: Color) -> Value {
    Value::String(format!("#{:08x}", c.0))
}

fn pass_id(id: RenderPassId) -> Value {
    Value::String(format!("{}.{}", id.layer_id, id.index))
}

fn transform(t: &Transform3d) -> Value {
    json!(t.cols)
}

fn affine(a: Affine) -> Value {
    json!(a.as_coeffs())
}

fn path(p: &BezPath) -> Value {
    Value::String(p.to_svg())
}

fn filters(f: &FilterOperations) -> Value {
    Value::Array(f.iter().map(|op| Value::String(format!("{op:?}"))).collect())
}

// ---------------------------------------------------------------------------
// Render passes
// ---------------------------------------------------------------------------

/// Snapshot of one shared quad state.
#[must_use]
pub fn shared_quad_state(sqs: &SharedQuadState) -> Value {
    json!({
        "quad_to_target_transform": transform(&sqs.quad_to_target_transform),
        "quad_layer_bounds": int_size(sqs.quad_layer_bounds),
        "visible_quad_layer_rect": int_rect(sqs.visible_quad_layer_rect),
        "clip_rect": int_rect(sqs.clip_rect),
        "is_clipped": sqs.is_clipped,
        "opacity": sqs.opacity,
        "blend_mode": sqs.blend_mode.name(),
        "sorting_context_id": sqs.sorting_context_id,
    })
}

/// Snapshot of one quad, including its material-specific fields.
#[must_use]
pub fn draw_quad(quad: &DrawQuad) -> Value {
    let mut map = Map::new();
    map.insert("material".into(), quad.material().name().into());
    map.insert("rect".into(), int_rect(quad.rect));
    map.insert("opaque_rect".into(), int_rect(quad.opaque_rect));
    map.insert("visible_rect".into(), int_rect(quad.visible_rect));
    map.insert("needs_blending".into(), quad.needs_blending.into());
    map.insert("shared_quad_state".into(), quad.shared_quad_state.0.into());
    map.insert(
        "resources".into(),
        quad.resources.iter().map(|id| id.0).collect::<Vec<_>>().into(),
    );

    let mut put = |key: &str, value: Value| {
        map.insert(key.to_owned(), value);
    };
    match &quad.kind {
        QuadKind::Invalid => {}
        QuadKind::DebugBorder(q) => {
            put("color", color(q.color));
            put("width", q.width.into());
        }
        QuadKind::SolidColor(q) => {
            put("color", color(q.color));
            put("force_anti_aliasing_off", q.force_anti_aliasing_off.into());
        }
        QuadKind::Texture(q) => {
            put("premultiplied_alpha", q.premultiplied_alpha.into());
            put(
                "uv",
                json!([
                    q.uv_top_left.x,
                    q.uv_top_left.y,
                    q.uv_bottom_right.x,
                    q.uv_bottom_right.y
                ]),
            );
            put("background_color", color(q.background_color));
            put("vertex_opacity", json!(q.vertex_opacity));
            put("y_flipped", q.y_flipped.into());
            put("nearest_neighbor", q.nearest_neighbor.into());
            put("resource_size", int_size(q.resource_size_in_pixels));
        }
        QuadKind::Tile(q) => {
            put("tex_coord_rect", rect(q.tex_coord_rect));
            put("texture_size", int_size(q.texture_size));
            put("swizzle_contents", q.swizzle_contents.into());
            put("nearest_neighbor", q.nearest_neighbor.into());
        }
        QuadKind::RenderPass(q) => {
            put("render_pass_id", pass_id(q.render_pass_id));
            put("mask_uv_scale", json!([q.mask_uv_scale.x, q.mask_uv_scale.y]));
            put("mask_texture_size", int_size(q.mask_texture_size));
            put("filters", filters(&q.filters));
            put("filters_scale", json!([q.filters_scale.x, q.filters_scale.y]));
            put("background_filters", filters(&q.background_filters));
        }
        QuadKind::Surface(q) => put("surface_id", q.surface_id.0.into()),
        QuadKind::YuvVideo(q) => {
            put("ya_tex_coord_rect", rect(q.ya_tex_coord_rect));
            put("uv_tex_coord_rect", rect(q.uv_tex_coord_rect));
            put("ya_tex_size", int_size(q.ya_tex_size));
            put("uv_tex_size", int_size(q.uv_tex_size));
            put("color_space", format!("{:?}", q.color_space).into());
        }
        QuadKind::StreamVideo(q) => {
            put("matrix", transform(&q.matrix));
            put("resource_size", int_size(q.resource_size_in_pixels));
        }
        QuadKind::IoSurface(q) => {
            put("io_surface_size", int_size(q.io_surface_size));
            put("orientation", format!("{:?}", q.orientation).into());
        }
    }
    Value::Object(map)
}

/// Snapshot of one pass with its shared states and quads.
#[must_use]
pub fn render_pass(pass: &RenderPass) -> Value {
    json!({
        "id": pass_id(pass.id),
        "output_rect": int_rect(pass.output_rect),
        "damage_rect": int_rect(pass.damage_rect),
        "transform_to_root_target": transform(&pass.transform_to_root_target),
        "has_transparent_background": pass.has_transparent_background,
        "copy_requests": pass.copy_requests.len(),
        "shared_quad_state_list": pass
            .shared_quad_state_list
            .iter()
            .map(shared_quad_state)
            .collect::<Vec<_>>(),
        "quad_list": pass.quad_list.iter().map(draw_quad).collect::<Vec<_>>(),
    })
}

/// Snapshot of a frame's passes in draw order.
#[must_use]
pub fn render_pass_list(passes: &[RenderPass]) -> Value {
    Value::Array(passes.iter().map(render_pass).collect())
}

/// Writes [`render_pass_list`] as pretty-printed JSON.
pub fn write_render_passes(passes: &[RenderPass], writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &render_pass_list(passes))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Display lists
// ---------------------------------------------------------------------------

fn paint_op(op: &PaintOp) -> Value {
    match op {
        PaintOp::FillRect { rect: r, color: c } => json!({
            "op": "fill-rect",
            "rect": rect(*r),
            "color": color(*c),
        }),
        PaintOp::StrokeRect {
            rect: r,
            color: c,
            width,
        } => json!({
            "op": "stroke-rect",
            "rect": rect(*r),
            "color": color(*c),
            "width": width,
        }),
        PaintOp::FillRoundedRect { rect: r, color: c } => json!({
            "op": "fill-rounded-rect",
            "rect": rounded_rect(r),
            "color": color(*c),
        }),
        PaintOp::FillPath { path: p, color: c } => json!({
            "op": "fill-path",
            "path": path(p),
            "color": color(*c),
        }),
        PaintOp::DrawImage { image, dest } => json!({
            "op": "draw-image",
            "image": image.0,
            "dest": rect(*dest),
        }),
    }
}

/// Snapshot of a recorded picture.
#[must_use]
pub fn picture(picture: &Picture) -> Value {
    json!({
        "cull_rect": rect(picture.cull_rect),
        "ops": picture.ops.iter().map(paint_op).collect::<Vec<_>>(),
    })
}

fn payload(payload: &DisplayItemPayload) -> Value {
    match payload {
        DisplayItemPayload::Empty => Value::Null,
        DisplayItemPayload::Drawing(p) => picture(p),
        DisplayItemPayload::Clip {
            rect: r,
            rounded_rect_clips,
        } => json!({
            "rect": rect(*r),
            "rounded_rect_clips": rounded_rect_clips.iter().map(rounded_rect).collect::<Vec<_>>(),
        }),
        DisplayItemPayload::FloatClip { rect: r } => json!({ "rect": rect(*r) }),
        DisplayItemPayload::Scroll { offset } => json!({ "offset": [offset.x, offset.y] }),
        DisplayItemPayload::Transform3D {
            transform: t,
            origin,
        } => json!({
            "transform": transform(t),
            "origin": origin,
        }),
        DisplayItemPayload::Filter {
            filters: f,
            bounds,
        } => json!({
            "filters": filters(f),
            "bounds": rect(*bounds),
        }),
        DisplayItemPayload::Compositing {
            blend_mode,
            opacity,
            bounds,
            color_filter,
        } => json!({
            "blend_mode": blend_mode.name(),
            "opacity": opacity,
            "bounds": bounds.map(rect),
            "color_filter": format!("{color_filter:?}"),
        }),
        DisplayItemPayload::Transform { affine: a } => json!({ "affine": affine(*a) }),
        DisplayItemPayload::ClipPath {
            path: p,
            anti_alias,
        } => json!({
            "path": path(p),
            "anti_alias": anti_alias,
        }),
    }
}

/// Snapshot of one display item.
#[must_use]
pub fn display_item(item: &DisplayItem) -> Value {
    json!({
        "client": item.client.0,
        "type": item.item_type.to_string(),
        "scope": item.scope.map(|s| json!({ "id": s.id, "container": s.container.0 })),
        "skipped_cache": item.skipped_cache,
        "payload": payload(&item.payload),
    })
}

/// Snapshot of a sequence of display items, for example
/// [`DisplayItemList::display_items`](quadrille_paint::list::DisplayItemList::display_items).
#[must_use]
pub fn display_items(items: &[DisplayItem]) -> Value {
    Value::Array(items.iter().map(display_item).collect())
}

/// Writes [`display_items`] as pretty-printed JSON.
pub fn write_display_items(items: &[DisplayItem], writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &display_items(items))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;
    use quadrille_core::filter::FilterOperation;
    use quadrille_core::id::{ResourceId, SharedQuadStateId};
    use quadrille_core::quad::{RenderPassQuad, SolidColorQuad};
    use quadrille_core::shared_quad_state::BlendMode;
    use quadrille_paint::item::{ClipType, DisplayItemClient, DisplayItemType, DrawingType, PaintPhase};
    use quadrille_paint::list::DisplayItemList;

    fn frame() -> Vec<RenderPass> {
        let child_id = RenderPassId::new(2, 0);
        let output = IntRect::new(0, 0, 20, 10);

        let mut child = RenderPass::new();
        child.set_all(child_id, output, output, Transform3d::IDENTITY, true);
        let sqs = add_state(&mut child, 0.5);
        SolidColorQuad::set_new(
            child.create_and_append_draw_quad(),
            sqs,
            IntRect::new(0, 0, 5, 5),
            IntRect::new(0, 0, 5, 5),
            Color::RED,
            false,
        );

        let mut root = RenderPass::new();
        root.set_all(RenderPassId::new(1, 0), output, output, Transform3d::IDENTITY, false);
        let sqs = add_state(&mut root, 1.0);
        let mut chain = FilterOperations::new();
        chain.append(FilterOperation::Blur(2.0));
        RenderPassQuad::set_new(
            root.create_and_append_draw_quad(),
            sqs,
            output,
            output,
            child_id,
            ResourceId::NONE,
            Vec2::ZERO,
            IntSize::default(),
            chain,
            Vec2::new(1.0, 1.0),
            FilterOperations::new(),
        );
        vec![child, root]
    }

    fn add_state(pass: &mut RenderPass, opacity: f32) -> SharedQuadStateId {
        let id = pass.create_and_append_shared_quad_state();
        pass.shared_quad_state_mut(id).set_all(
            Transform3d::IDENTITY,
            IntSize::new(20, 10),
            IntRect::new(0, 0, 20, 10),
            IntRect::default(),
            false,
            opacity,
            BlendMode::SrcOver,
            0,
        );
        id
    }

    #[test]
    fn passes_dump_in_draw_order() {
        let value = render_pass_list(&frame());
        let passes = value.as_array().unwrap();
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0]["id"], "2.0");
        assert_eq!(passes[0]["has_transparent_background"], true);
        assert_eq!(passes[1]["id"], "1.0");

        let solid = &passes[0]["quad_list"][0];
        assert_eq!(solid["material"], "solid-color");
        assert_eq!(solid["color"], "#ffff0000");
        assert_eq!(solid["rect"], json!([0, 0, 5, 5]));
        assert_eq!(passes[0]["shared_quad_state_list"][0]["opacity"], 0.5);
        assert_eq!(passes[0]["shared_quad_state_list"][0]["blend_mode"], "src-over");

        let pass_quad = &passes[1]["quad_list"][0];
        assert_eq!(pass_quad["material"], "render-pass");
        assert_eq!(pass_quad["render_pass_id"], "2.0");
        assert_eq!(pass_quad["filters"].as_array().unwrap().len(), 1);
        assert_eq!(pass_quad["background_filters"], json!([]));
    }

    #[test]
    fn display_list_dump_names_types() {
        const CLIENT: DisplayItemClient = DisplayItemClient(9);
        let clip_type = ClipType::BoxPaintPhase(PaintPhase::Foreground);
        let mut list = DisplayItemList::new();
        list.create_and_append(DisplayItem::clip(
            CLIENT,
            clip_type,
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Vec::new(),
        ));
        let mut content = Picture::new(Rect::new(0.0, 0.0, 4.0, 4.0));
        content.ops.push(PaintOp::FillRect {
            rect: Rect::new(1.0, 1.0, 2.0, 2.0),
            color: Color::BLUE,
        });
        list.create_and_append(DisplayItem::drawing(
            CLIENT,
            DrawingType::PaintPhase(PaintPhase::Foreground),
            content,
        ));
        list.end_item(CLIENT, DisplayItemType::EndClip(clip_type));
        let _ = list.commit_new_display_items();

        let value = display_items(list.display_items());
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["type"], "ClipBoxForeground");
        assert_eq!(items[0]["payload"]["rect"], json!([0.0, 0.0, 4.0, 4.0]));
        assert_eq!(items[1]["type"], "DrawingPaintPhaseForeground");
        assert_eq!(items[1]["client"], 9);
        assert_eq!(items[1]["payload"]["ops"][0]["op"], "fill-rect");
        assert_eq!(items[1]["payload"]["ops"][0]["color"], "#ff0000ff");
        assert_eq!(items[2]["type"], "EndClipBoxForeground");
        assert_eq!(items[2]["payload"], Value::Null);
    }

    #[test]
    fn writers_emit_parseable_json() {
        let mut out = Vec::new();
        write_render_passes(&frame(), &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));

        let mut out = Vec::new();
        write_display_items(&[], &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, json!([]));
    }
}
