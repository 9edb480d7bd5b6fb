use crate::params::{CompositeMode, ObjectParameters, REPETITION_SLOTS};
use core_model::{Rect, RgbaColour};

/// Parameters effective for one rendered repetition of an object, after
/// parent composition.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub visible: bool,
    pub x: i32,
    pub y: i32,
    /// Final source alpha in 0..=255.
    pub alpha: i32,
    pub clip: Option<Rect>,
    pub composite_mode: CompositeMode,
    pub mono_transform: i32,
    pub invert_transform: i32,
    pub tint: RgbaColour,
    pub blend: RgbaColour,
    pub light_level: i32,
    pub pattern_no: i32,
    pub width_percent: i32,
    pub height_percent: i32,
    pub rotation_div10: i32,
    pub z_order: i32,
    pub z_layer: i32,
    pub z_depth: i32,
}

fn mul_alpha(a: i32, b: i32) -> i32 {
    a.clamp(0, 255) * b.clamp(0, 255) / 255
}

fn own_params(p: &ObjectParameters, repno: usize) -> RenderParams {
    let rep = repno % REPETITION_SLOTS;
    RenderParams {
        visible: p.visible,
        x: p.x + p.adjust_x[rep],
        y: p.y + p.adjust_y[rep] + p.adjust_vert,
        alpha: mul_alpha(p.alpha_source, p.adjust_alpha[rep]),
        clip: intersect_opt(p.clip, p.own_clip),
        composite_mode: p.composite_mode,
        mono_transform: p.mono_transform,
        invert_transform: p.invert_transform,
        tint: p.tint,
        blend: p.blend,
        light_level: p.light_level,
        pattern_no: p.pattern_no,
        width_percent: p.width_percent,
        height_percent: p.height_percent,
        rotation_div10: p.rotation_div10,
        z_order: p.z_order,
        z_layer: p.z_layer,
        z_depth: p.z_depth,
    }
}

fn intersect_opt(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.intersect(&b)),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

/// Compute the effective render parameters for `child` at repetition
/// `repno`, composed with its parent when one exists.
///
/// Always composed with the parent: visibility (multiplicative), alpha
/// source and per-repetition alpha adjustments (multiplicative), position
/// with per-repetition offsets and vertical adjustment (additive), and
/// clipping (intersected). Inherited only while the child's own value is
/// neutral: composite mode, monochrome/invert transforms, tint, blend
/// colour and light level. Pattern number, origins, scales, rotation and
/// the display-order fields never propagate.
pub fn compose(
    parent: Option<&ObjectParameters>,
    child: &ObjectParameters,
    repno: usize,
) -> RenderParams {
    let mut out = own_params(child, repno);
    let Some(parent) = parent else {
        return out;
    };
    let parent_own = own_params(parent, repno);

    out.visible = out.visible && parent_own.visible;
    out.alpha = mul_alpha(out.alpha, parent_own.alpha);
    out.x += parent_own.x;
    out.y += parent_own.y;
    out.clip = intersect_opt(out.clip, parent_own.clip);

    if child.composite_mode == CompositeMode::Normal {
        out.composite_mode = parent.composite_mode;
    }
    if child.mono_transform == 0 {
        out.mono_transform = parent.mono_transform;
    }
    if child.invert_transform == 0 {
        out.invert_transform = parent.invert_transform;
    }
    if child.tint == RgbaColour::rgb(0, 0, 0) {
        out.tint = parent.tint;
    }
    if child.blend.a == 0 {
        out.blend = parent.blend;
    }
    if child.light_level == 0 {
        out.light_level = parent.light_level;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_composes_multiplicatively() {
        let mut parent = ObjectParameters::default();
        parent.visible = true;
        parent.alpha_source = 128;
        let mut child = ObjectParameters::default();
        child.visible = true;
        child.alpha_source = 128;

        let rendered = compose(Some(&parent), &child, 0);
        assert_eq!(rendered.alpha, 64);
    }

    #[test]
    fn visibility_is_multiplicative() {
        let mut parent = ObjectParameters::default();
        parent.visible = false;
        let mut child = ObjectParameters::default();
        child.visible = true;
        assert!(!compose(Some(&parent), &child, 0).visible);
        assert!(compose(None, &child, 0).visible);
    }

    #[test]
    fn position_is_additive_including_adjustments() {
        let mut parent = ObjectParameters::default();
        parent.visible = true;
        parent.x = 100;
        parent.y = 10;
        parent.adjust_x[1] = 5;
        parent.adjust_vert = 2;
        let mut child = ObjectParameters::default();
        child.visible = true;
        child.x = 30;
        child.y = 40;

        let rendered = compose(Some(&parent), &child, 1);
        assert_eq!(rendered.x, 135);
        assert_eq!(rendered.y, 52);
    }

    #[test]
    fn clip_regions_intersect() {
        let mut parent = ObjectParameters::default();
        parent.clip = Some(Rect::rec(0, 0, 100, 100));
        let mut child = ObjectParameters::default();
        child.clip = Some(Rect::rec(50, 50, 100, 100));

        let rendered = compose(Some(&parent), &child, 0);
        assert_eq!(rendered.clip, Some(Rect::rec(50, 50, 50, 50)));
    }

    #[test]
    fn neutral_child_inherits_tint_and_composite() {
        let mut parent = ObjectParameters::default();
        parent.tint = RgbaColour::rgb(10, 20, 30);
        parent.composite_mode = CompositeMode::Additive;
        let child = ObjectParameters::default();

        let rendered = compose(Some(&parent), &child, 0);
        assert_eq!(rendered.tint, RgbaColour::rgb(10, 20, 30));
        assert_eq!(rendered.composite_mode, CompositeMode::Additive);
    }

    #[test]
    fn non_neutral_child_keeps_its_own_transforms() {
        let mut parent = ObjectParameters::default();
        parent.tint = RgbaColour::rgb(10, 20, 30);
        parent.mono_transform = 1;
        let mut child = ObjectParameters::default();
        child.tint = RgbaColour::rgb(1, 1, 1);
        child.mono_transform = 2;

        let rendered = compose(Some(&parent), &child, 0);
        assert_eq!(rendered.tint, RgbaColour::rgb(1, 1, 1));
        assert_eq!(rendered.mono_transform, 2);
    }

    #[test]
    fn scales_rotation_and_order_never_propagate() {
        let mut parent = ObjectParameters::default();
        parent.width_percent = 50;
        parent.rotation_div10 = 900;
        parent.z_order = 7;
        parent.pattern_no = 3;
        let child = ObjectParameters::default();

        let rendered = compose(Some(&parent), &child, 0);
        assert_eq!(rendered.width_percent, 100);
        assert_eq!(rendered.rotation_div10, 0);
        assert_eq!(rendered.z_order, 0);
        assert_eq!(rendered.pattern_no, 0);
    }
}
