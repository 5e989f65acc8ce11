use eframe::egui;
use sysml_canvas::geometry::intersect_border;
use sysml_canvas::{
    Element, ElementType, Engine, LineStyle, Position, Rect, Relationship, RelationshipType,
    ResizeHandle, Snapshot, Viewport,
};

use super::to_screen;

const SELECTION: egui::Color32 = egui::Color32::from_rgb(40, 120, 220);
const PREVIEW: egui::Color32 = egui::Color32::from_rgb(120, 170, 230);

fn screen_rect(origin: egui::Pos2, viewport: &Viewport, rect: Rect) -> egui::Rect {
    egui::Rect::from_min_max(
        to_screen(origin, viewport, rect.min),
        to_screen(origin, viewport, rect.max),
    )
}

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect, viewport: &Viewport) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);
    let grid_color = egui::Color32::from_gray(60);
    let spacing_screen = 64.0 * viewport.scale();
    if spacing_screen < 24.0 {
        return;
    }
    let scroll = viewport.scroll();
    let x0 = rect.min.x - scroll.x.rem_euclid(spacing_screen);
    let y0 = rect.min.y - scroll.y.rem_euclid(spacing_screen);
    let stroke = egui::Stroke::new(1.0, grid_color);
    let mut x = x0;
    while x < rect.max.x {
        painter.line_segment([egui::pos2(x, rect.min.y), egui::pos2(x, rect.max.y)], stroke);
        x += spacing_screen;
    }
    let mut y = y0;
    while y < rect.max.y {
        painter.line_segment([egui::pos2(rect.min.x, y), egui::pos2(rect.max.x, y)], stroke);
        y += spacing_screen;
    }
}

fn fill_for(element_type: ElementType) -> egui::Color32 {
    match element_type {
        ElementType::Requirement => egui::Color32::from_rgb(250, 240, 210),
        ElementType::Action | ElementType::State => egui::Color32::from_rgb(220, 240, 225),
        ElementType::PortDefinition | ElementType::PortUsage | ElementType::InterfaceDefinition => {
            egui::Color32::from_rgb(230, 225, 245)
        }
        ElementType::Package => egui::Color32::from_rgb(235, 235, 235),
        ElementType::ConstraintBlock | ElementType::ConstraintProperty => {
            egui::Color32::from_rgb(245, 225, 225)
        }
        _ => egui::Color32::from_rgb(225, 235, 250),
    }
}

pub(super) fn draw_elements(painter: &egui::Painter, origin: egui::Pos2, snapshot: &Snapshot<'_>) {
    for element in &snapshot.diagram.elements {
        let highlighted = snapshot.selection.contains(element.id)
            || snapshot.box_preview.contains(&element.id);
        draw_element(painter, origin, &snapshot.viewport, element, highlighted);
    }
}

fn draw_element(
    painter: &egui::Painter,
    origin: egui::Pos2,
    viewport: &Viewport,
    element: &Element,
    highlighted: bool,
) {
    let zoom = viewport.scale();
    let r = screen_rect(origin, viewport, element.bounds());
    let rounding = if element.element_type == ElementType::Action {
        12.0 * zoom
    } else {
        2.0 * zoom
    };
    painter.rect_filled(r, rounding, fill_for(element.element_type));
    let stroke = if highlighted {
        egui::Stroke::new(2.0, SELECTION)
    } else {
        egui::Stroke::new(1.0 * zoom, egui::Color32::from_gray(40))
    };
    painter.rect_stroke(r, rounding, stroke, egui::StrokeKind::Middle);

    let keyword = element
        .stereotype
        .clone()
        .unwrap_or_else(|| element.element_type.name().to_lowercase());
    let text_color = egui::Color32::from_gray(20);
    painter.text(
        egui::pos2(r.center().x, r.min.y + 14.0 * zoom),
        egui::Align2::CENTER_CENTER,
        format!("«{keyword}»"),
        egui::FontId::proportional(11.0 * zoom),
        text_color,
    );
    painter.text(
        r.center(),
        egui::Align2::CENTER_CENTER,
        &element.name,
        egui::FontId::proportional(14.0 * zoom),
        text_color,
    );
}

/// Draws every relationship of the active diagram along its routed path.
pub(super) fn draw_relationships(
    painter: &egui::Painter,
    origin: egui::Pos2,
    engine: &Engine,
    snapshot: &Snapshot<'_>,
) {
    let selected = snapshot.selection.relationship();
    for relationship in &snapshot.diagram.relationships {
        let Some(path) = engine.relationship_path(relationship.id) else {
            continue;
        };
        let points: Vec<egui::Pos2> = path
            .iter()
            .map(|&p| to_screen(origin, &snapshot.viewport, p))
            .collect();
        let stroke = relationship_stroke(relationship, selected == Some(relationship.id));
        draw_styled_polyline(painter, &points, stroke, relationship.line_style());
        if let [.., a, b] = points.as_slice() {
            draw_end_marker(painter, *a, *b, stroke, relationship.relationship_type);
        }
        if let Some(label) = relationship.label.as_ref().or(relationship.name.as_ref())
            && let Some(mid) = midpoint(&points)
        {
            painter.text(
                mid,
                egui::Align2::CENTER_BOTTOM,
                label,
                egui::FontId::proportional(12.0),
                stroke.color,
            );
        }
    }
}

fn relationship_stroke(relationship: &Relationship, selected: bool) -> egui::Stroke {
    if selected {
        return egui::Stroke::new(2.5, SELECTION);
    }
    let style = relationship.properties.as_ref();
    let color = style
        .and_then(|s| s.line_color.as_deref())
        .and_then(|hex| egui::Color32::from_hex(hex).ok())
        .unwrap_or(egui::Color32::from_gray(200));
    let width = style.and_then(|s| s.line_width).unwrap_or(1.5);
    egui::Stroke::new(width, color)
}

fn midpoint(points: &[egui::Pos2]) -> Option<egui::Pos2> {
    let (first, last) = (points.first()?, points.last()?);
    Some(first.lerp(*last, 0.5))
}

fn draw_styled_polyline(
    painter: &egui::Painter,
    points: &[egui::Pos2],
    stroke: egui::Stroke,
    line_style: LineStyle,
) {
    match line_style {
        LineStyle::Solid => {
            painter.add(egui::Shape::line(points.to_vec(), stroke));
        }
        LineStyle::Dashed | LineStyle::Dotted => {
            let (dash, gap) = if line_style == LineStyle::Dashed {
                (10.0, 5.0)
            } else {
                (2.0, 4.0)
            };
            for pair in points.windows(2) {
                draw_dashed_line(painter, pair[0], pair[1], stroke, dash, gap);
            }
        }
    }
}

fn draw_dashed_line(
    painter: &egui::Painter,
    a: egui::Pos2,
    b: egui::Pos2,
    stroke: egui::Stroke,
    dash_len: f32,
    gap_len: f32,
) {
    let v = b - a;
    let len = v.length();
    if len <= f32::EPSILON {
        return;
    }
    let dir = v / len;
    let mut pos = 0.0;
    let mut drawing = true;
    while pos < len {
        let next_pos = (pos + if drawing { dash_len } else { gap_len }).min(len);
        if drawing {
            painter.line_segment([a + dir * pos, a + dir * next_pos], stroke);
        }
        pos = next_pos;
        drawing = !drawing;
    }
}

/// Target-end marker: hollow triangle for specialization, diamond for
/// containment, open arrow otherwise.
fn draw_end_marker(
    painter: &egui::Painter,
    a: egui::Pos2,
    b: egui::Pos2,
    stroke: egui::Stroke,
    relationship_type: RelationshipType,
) {
    let v = b - a;
    if v.length_sq() <= f32::EPSILON {
        return;
    }
    let dir = v.normalized();
    let perp = egui::vec2(-dir.y, dir.x);
    let size = 12.0;
    let base = b - dir * size;
    let left = base + perp * (size * 0.6);
    let right = base - perp * (size * 0.6);
    let outline = egui::Stroke::new(stroke.width.max(1.0), stroke.color);
    match relationship_type {
        RelationshipType::Specialization | RelationshipType::Subsetting => {
            painter.add(egui::Shape::convex_polygon(
                vec![b, left, right],
                egui::Color32::TRANSPARENT,
                outline,
            ));
        }
        RelationshipType::Containment => {
            let back = b - dir * size * 2.0;
            painter.add(egui::Shape::convex_polygon(
                vec![b, left, back, right],
                stroke.color,
                egui::Stroke::NONE,
            ));
        }
        _ => {
            painter.line_segment([b, left], outline);
            painter.line_segment([b, right], outline);
        }
    }
}

/// Handles of the primary selection, the live rubber band and the
/// relationship being drawn.
pub(super) fn draw_overlays(
    painter: &egui::Painter,
    origin: egui::Pos2,
    snapshot: &Snapshot<'_>,
    handle_size: f32,
) {
    let viewport = &snapshot.viewport;

    if let Some(element) = snapshot
        .selection
        .primary()
        .and_then(|id| snapshot.diagram.element(id))
    {
        let bounds = element.bounds();
        for handle in ResizeHandle::ALL {
            let center = to_screen(origin, viewport, handle.anchor(bounds));
            let r = egui::Rect::from_center_size(center, egui::vec2(handle_size, handle_size));
            painter.rect_filled(r, 1.0, egui::Color32::WHITE);
            painter.rect_stroke(r, 1.0, egui::Stroke::new(1.0, SELECTION), egui::StrokeKind::Middle);
        }
    }

    if let Some(rect) = snapshot.selection_rect {
        let r = screen_rect(origin, viewport, rect);
        painter.rect_filled(r, 0.0, PREVIEW.gamma_multiply(0.15));
        let corners = [r.left_top(), r.right_top(), r.right_bottom(), r.left_bottom(), r.left_top()];
        for pair in corners.windows(2) {
            draw_dashed_line(painter, pair[0], pair[1], egui::Stroke::new(1.0, PREVIEW), 6.0, 4.0);
        }
    }

    if let Some(pending) = snapshot.pending_relationship
        && let Some(source) = snapshot.diagram.element(pending.source_id)
        && let Some(endpoint) = pending.endpoint
    {
        let start: Position = intersect_border(source.bounds(), source.center(), endpoint);
        let a = to_screen(origin, viewport, start);
        let b = to_screen(origin, viewport, endpoint);
        let stroke = egui::Stroke::new(1.5, PREVIEW);
        draw_dashed_line(painter, a, b, stroke, 8.0, 4.0);
        draw_end_marker(painter, a, b, stroke, pending.relationship_type);
    }
}
