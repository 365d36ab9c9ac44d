//! Physical length units for image geometry
//!
//! ODF length attributes accept cm, mm, in and pt; pixel lengths are
//! normalized to centimeters with a fixed factor. Unitless numeric values
//! default to centimeters.

/// Fixed pixel-to-centimeter factor
pub const PX_TO_CM: f64 = 0.035_277_8;

/// Centimeters per point (1pt = 1/72 inch)
pub const PT_TO_CM: f64 = 2.54 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Centimeter,
    Millimeter,
    Inch,
    Point,
    Pixel,
}

impl LengthUnit {
    fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Centimeter => "cm",
            LengthUnit::Millimeter => "mm",
            LengthUnit::Inch => "in",
            LengthUnit::Point => "pt",
            LengthUnit::Pixel => "px",
        }
    }

    fn cm_per_unit(self) -> f64 {
        match self {
            LengthUnit::Centimeter => 1.0,
            LengthUnit::Millimeter => 0.1,
            LengthUnit::Inch => 2.54,
            LengthUnit::Point => PT_TO_CM,
            LengthUnit::Pixel => PX_TO_CM,
        }
    }
}

/// A parsed length expression, e.g. `4cm`, `72pt`, or the unitless `4`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    /// Parse a length with an optional unit suffix (defaults to cm)
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_ascii_lowercase();

        let (number, unit) = if let Some(n) = text.strip_suffix("cm") {
            (n, LengthUnit::Centimeter)
        } else if let Some(n) = text.strip_suffix("mm") {
            (n, LengthUnit::Millimeter)
        } else if let Some(n) = text.strip_suffix("in") {
            (n, LengthUnit::Inch)
        } else if let Some(n) = text.strip_suffix("pt") {
            (n, LengthUnit::Point)
        } else if let Some(n) = text.strip_suffix("px") {
            (n, LengthUnit::Pixel)
        } else {
            (text.as_str(), LengthUnit::Centimeter)
        };

        let value: f64 = number.trim().parse().ok()?;
        Some(Self { value, unit })
    }

    pub fn to_cm(self) -> f64 {
        self.value * self.unit.cm_per_unit()
    }

    /// Convert centimeters back into this length's unit
    pub fn from_cm(cm: f64, unit: LengthUnit) -> Self {
        Self {
            value: cm / unit.cm_per_unit(),
            unit,
        }
    }

    /// Render as an ODF length attribute value
    ///
    /// Pixel lengths are rewritten to centimeters; everything else keeps
    /// its unit. Values are rounded to 3 fractional digits.
    pub fn to_odf_attr(self) -> String {
        match self.unit {
            LengthUnit::Pixel => format!("{}cm", round3(self.to_cm())),
            unit => format!("{}{}", round3(self.value), unit.suffix()),
        }
    }
}

/// Render a centimeter value as an ODF length attribute
pub fn format_cm(cm: f64) -> String {
    format!("{}cm", round3(cm))
}

/// Round to 3 fractional digits, trimming trailing zeros
///
/// Rounding happens on the scaled value, half away from zero, so decimal
/// boundary inputs like 0.1235 land on 0.124 despite their binary
/// representation sitting just below the boundary.
fn round3(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let text = format!("{:.3}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
