use core_model::{Rect, RgbaColour};
use serde::{Deserialize, Serialize};

/// Number of repetition slots for per-repetition adjustments.
pub const REPETITION_SLOTS: usize = 8;

/// Blending mode used when compositing an object onto the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositeMode {
    #[default]
    Normal,
    Additive,
    Subtractive,
}

impl CompositeMode {
    pub fn from_int(value: i32) -> Self {
        match value {
            1 => CompositeMode::Additive,
            2 => CompositeMode::Subtractive,
            _ => CompositeMode::Normal,
        }
    }

    pub fn as_int(self) -> i32 {
        match self {
            CompositeMode::Normal => 0,
            CompositeMode::Additive => 1,
            CompositeMode::Subtractive => 2,
        }
    }
}

/// Digit-drawer settings (drawn when the drawer renders a number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DigitProperties {
    pub value: i32,
    pub digits: i32,
    pub zero: i32,
    pub sign: i32,
    pub pack: i32,
    pub space: i32,
}

/// Button behaviour attached to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ButtonProperties {
    pub is_button: bool,
    pub action: i32,
    pub se: i32,
    pub group: i32,
    pub button_number: i32,
    /// Override frame published while hovered / pushed.
    pub state: i32,
}

/// Text-drawer settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextProperties {
    pub value: String,
    pub text_size: i32,
    pub xspace: i32,
    pub yspace: i32,
    pub char_count: i32,
    pub colour: i32,
    pub shadow_colour: i32,
}

/// Drift-drawer settings (falling petals/snow style effects).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriftProperties {
    pub count: i32,
    pub use_animation: bool,
    pub start_pattern: i32,
    pub end_pattern: i32,
    pub total_animation_time_ms: i32,
    pub yspeed: i32,
    pub period: i32,
    pub amplitude: i32,
    pub use_drift: bool,
    pub drift_speed: i32,
    pub drift_area: Option<Rect>,
}

/// The flat parameter record of a graphics object.
///
/// Every field has a defined neutral value, produced by `Default`; "neutral"
/// is what parent-to-child inheritance tests against (a child with a
/// neutral value inherits the parent's for the inherit-if-neutral group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectParameters {
    pub visible: bool,
    pub x: i32,
    pub y: i32,
    pub adjust_x: [i32; REPETITION_SLOTS],
    pub adjust_y: [i32; REPETITION_SLOTS],
    pub adjust_alpha: [i32; REPETITION_SLOTS],
    pub adjust_vert: i32,
    pub origin_x: i32,
    pub origin_y: i32,
    pub rep_origin_x: i32,
    pub rep_origin_y: i32,
    /// Scale in percent; 100 is neutral.
    pub width_percent: i32,
    pub height_percent: i32,
    pub hq_width_percent: i32,
    pub hq_height_percent: i32,
    /// Rotation in tenths of a degree.
    pub rotation_div10: i32,
    pub z_order: i32,
    pub z_layer: i32,
    pub z_depth: i32,
    /// Additive tint; black is neutral.
    pub tint: RgbaColour,
    /// Blend colour; zero alpha is neutral.
    pub blend: RgbaColour,
    pub mono_transform: i32,
    pub invert_transform: i32,
    pub light_level: i32,
    /// 0..=255 source alpha; 255 is neutral.
    pub alpha_source: i32,
    pub composite_mode: CompositeMode,
    pub clip: Option<Rect>,
    pub own_clip: Option<Rect>,
    pub pattern_no: i32,
    pub scroll_rate_x: i32,
    pub scroll_rate_y: i32,
    pub digit: DigitProperties,
    pub button: ButtonProperties,
    pub text: TextProperties,
    pub drift: DriftProperties,
    /// When set the object survives wipe-copy promotion.
    pub wipe_copy: bool,
}

impl Default for ObjectParameters {
    fn default() -> Self {
        Self {
            visible: false,
            x: 0,
            y: 0,
            adjust_x: [0; REPETITION_SLOTS],
            adjust_y: [0; REPETITION_SLOTS],
            adjust_alpha: [255; REPETITION_SLOTS],
            adjust_vert: 0,
            origin_x: 0,
            origin_y: 0,
            rep_origin_x: 0,
            rep_origin_y: 0,
            width_percent: 100,
            height_percent: 100,
            hq_width_percent: 100,
            hq_height_percent: 100,
            rotation_div10: 0,
            z_order: 0,
            z_layer: 0,
            z_depth: 0,
            tint: RgbaColour::rgb(0, 0, 0),
            blend: RgbaColour::rgba(0, 0, 0, 0),
            mono_transform: 0,
            invert_transform: 0,
            light_level: 0,
            alpha_source: 255,
            composite_mode: CompositeMode::Normal,
            clip: None,
            own_clip: None,
            pattern_no: 0,
            scroll_rate_x: 0,
            scroll_rate_y: 0,
            digit: DigitProperties::default(),
            button: ButtonProperties::default(),
            text: TextProperties::default(),
            drift: DriftProperties::default(),
            wipe_copy: false,
        }
    }
}

impl ObjectParameters {
    /// Reset to neutral values.
    pub fn initialize(&mut self) {
        *self = ObjectParameters::default();
    }
}

/// Addressable scalar parameters, the primitive behind both mutators and
/// the opcode get/set adapter. Tuple parameters (Move writes X and Y) and
/// nested parameters (the red channel of the tint) are wired as several
/// `ParamId` writes by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamId {
    Visible,
    X,
    Y,
    AdjustX(usize),
    AdjustY(usize),
    AdjustAlpha(usize),
    AdjustVert,
    OriginX,
    OriginY,
    RepOriginX,
    RepOriginY,
    WidthPercent,
    HeightPercent,
    HqWidthPercent,
    HqHeightPercent,
    RotationDiv10,
    ZOrder,
    ZLayer,
    ZDepth,
    TintR,
    TintG,
    TintB,
    BlendR,
    BlendG,
    BlendB,
    BlendA,
    MonoTransform,
    InvertTransform,
    LightLevel,
    AlphaSource,
    CompositeMode,
    PatternNo,
    ScrollRateX,
    ScrollRateY,
    DigitValue,
}

impl ParamId {
    pub fn get(self, p: &ObjectParameters) -> i32 {
        match self {
            ParamId::Visible => p.visible as i32,
            ParamId::X => p.x,
            ParamId::Y => p.y,
            ParamId::AdjustX(rep) => p.adjust_x[rep % REPETITION_SLOTS],
            ParamId::AdjustY(rep) => p.adjust_y[rep % REPETITION_SLOTS],
            ParamId::AdjustAlpha(rep) => p.adjust_alpha[rep % REPETITION_SLOTS],
            ParamId::AdjustVert => p.adjust_vert,
            ParamId::OriginX => p.origin_x,
            ParamId::OriginY => p.origin_y,
            ParamId::RepOriginX => p.rep_origin_x,
            ParamId::RepOriginY => p.rep_origin_y,
            ParamId::WidthPercent => p.width_percent,
            ParamId::HeightPercent => p.height_percent,
            ParamId::HqWidthPercent => p.hq_width_percent,
            ParamId::HqHeightPercent => p.hq_height_percent,
            ParamId::RotationDiv10 => p.rotation_div10,
            ParamId::ZOrder => p.z_order,
            ParamId::ZLayer => p.z_layer,
            ParamId::ZDepth => p.z_depth,
            ParamId::TintR => p.tint.r as i32,
            ParamId::TintG => p.tint.g as i32,
            ParamId::TintB => p.tint.b as i32,
            ParamId::BlendR => p.blend.r as i32,
            ParamId::BlendG => p.blend.g as i32,
            ParamId::BlendB => p.blend.b as i32,
            ParamId::BlendA => p.blend.a as i32,
            ParamId::MonoTransform => p.mono_transform,
            ParamId::InvertTransform => p.invert_transform,
            ParamId::LightLevel => p.light_level,
            ParamId::AlphaSource => p.alpha_source,
            ParamId::CompositeMode => p.composite_mode.as_int(),
            ParamId::PatternNo => p.pattern_no,
            ParamId::ScrollRateX => p.scroll_rate_x,
            ParamId::ScrollRateY => p.scroll_rate_y,
            ParamId::DigitValue => p.digit.value,
        }
    }

    pub fn set(self, p: &mut ObjectParameters, value: i32) {
        let channel = |v: i32| v.clamp(0, 255) as u8;
        match self {
            ParamId::Visible => p.visible = value != 0,
            ParamId::X => p.x = value,
            ParamId::Y => p.y = value,
            ParamId::AdjustX(rep) => p.adjust_x[rep % REPETITION_SLOTS] = value,
            ParamId::AdjustY(rep) => p.adjust_y[rep % REPETITION_SLOTS] = value,
            ParamId::AdjustAlpha(rep) => p.adjust_alpha[rep % REPETITION_SLOTS] = value,
            ParamId::AdjustVert => p.adjust_vert = value,
            ParamId::OriginX => p.origin_x = value,
            ParamId::OriginY => p.origin_y = value,
            ParamId::RepOriginX => p.rep_origin_x = value,
            ParamId::RepOriginY => p.rep_origin_y = value,
            ParamId::WidthPercent => p.width_percent = value,
            ParamId::HeightPercent => p.height_percent = value,
            ParamId::HqWidthPercent => p.hq_width_percent = value,
            ParamId::HqHeightPercent => p.hq_height_percent = value,
            ParamId::RotationDiv10 => p.rotation_div10 = value,
            ParamId::ZOrder => p.z_order = value,
            ParamId::ZLayer => p.z_layer = value,
            ParamId::ZDepth => p.z_depth = value,
            ParamId::TintR => p.tint.r = channel(value),
            ParamId::TintG => p.tint.g = channel(value),
            ParamId::TintB => p.tint.b = channel(value),
            ParamId::BlendR => p.blend.r = channel(value),
            ParamId::BlendG => p.blend.g = channel(value),
            ParamId::BlendB => p.blend.b = channel(value),
            ParamId::BlendA => p.blend.a = channel(value),
            ParamId::MonoTransform => p.mono_transform = value,
            ParamId::InvertTransform => p.invert_transform = value,
            ParamId::LightLevel => p.light_level = value,
            ParamId::AlphaSource => p.alpha_source = value.clamp(0, 255),
            ParamId::CompositeMode => p.composite_mode = CompositeMode::from_int(value),
            ParamId::PatternNo => p.pattern_no = value,
            ParamId::ScrollRateX => p.scroll_rate_x = value,
            ParamId::ScrollRateY => p.scroll_rate_y = value,
            ParamId::DigitValue => p.digit.value = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_values_match_the_documented_defaults() {
        let p = ObjectParameters::default();
        assert!(!p.visible);
        assert_eq!(p.alpha_source, 255);
        assert_eq!(p.width_percent, 100);
        assert_eq!(p.hq_height_percent, 100);
        assert_eq!(p.adjust_alpha, [255; REPETITION_SLOTS]);
        assert_eq!(p.composite_mode, CompositeMode::Normal);
        assert_eq!(p.blend.a, 0);
        assert!(p.clip.is_none());
        assert!(!p.wipe_copy);
    }

    #[test]
    fn param_id_round_trips_scalar_fields() {
        let mut p = ObjectParameters::default();
        for (id, value) in [
            (ParamId::X, -40),
            (ParamId::Y, 300),
            (ParamId::AlphaSource, 128),
            (ParamId::RotationDiv10, 900),
            (ParamId::AdjustX(2), 17),
            (ParamId::TintG, 200),
            (ParamId::CompositeMode, 1),
        ] {
            id.set(&mut p, value);
            assert_eq!(id.get(&p), value, "{id:?}");
        }
    }

    #[test]
    fn repetition_indices_wrap_at_the_slot_count() {
        let mut p = ObjectParameters::default();
        ParamId::AdjustY(REPETITION_SLOTS + 1).set(&mut p, 9);
        assert_eq!(p.adjust_y[1], 9);
    }

    #[test]
    fn colour_channels_clamp() {
        let mut p = ObjectParameters::default();
        ParamId::TintR.set(&mut p, 999);
        assert_eq!(p.tint.r, 255);
        ParamId::BlendA.set(&mut p, -5);
        assert_eq!(p.blend.a, 0);
    }
}
