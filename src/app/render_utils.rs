use eframe::egui::{Color32, ColorImage, Painter, Pos2, Rect, Stroke, Vec2};

pub(super) const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
pub(super) const LAND: Color32 = Color32::from_rgb(58, 66, 78);
pub(super) const BORDER: Color32 = Color32::from_rgb(146, 156, 170);
pub(super) const LINK: Color32 = Color32::from_rgb(255, 177, 177);
pub(super) const NODE: Color32 = Color32::from_rgb(220, 38, 38);
pub(super) const NODE_HOVERED: Color32 = Color32::from_rgb(255, 120, 96);

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let step = 50.0;
    let grid = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 50));

    let mut x = rect.left() + step;
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], grid);
        x += step;
    }

    let mut y = rect.top() + step;
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], grid);
        y += step;
    }
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

pub(super) fn viewport_to_screen(rect: Rect, point: Pos2) -> Pos2 {
    rect.min + point.to_vec2()
}

pub(super) fn screen_to_viewport(rect: Rect, screen: Pos2) -> Pos2 {
    (screen - rect.min).to_pos2()
}

pub(super) fn land_image(mask: &[bool], size: Vec2) -> ColorImage {
    let width = size.x.max(0.0) as usize;
    let height = size.y.max(0.0) as usize;
    let rgba = mask
        .iter()
        .take(width * height)
        .flat_map(|&land| if land { [255; 4] } else { [0; 4] })
        .collect::<Vec<u8>>();
    ColorImage::from_rgba_unmultiplied([width, height], &rgba)
}
