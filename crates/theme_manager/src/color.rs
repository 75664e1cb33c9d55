//! CSS color parsing for palette validation.
//!
//! Supported forms: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`,
//! `rgba()`, `hsl()`, and `hsla()` with comma-separated arguments.

/// An sRGB color with alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// Opaque white.
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 1.0,
    };

    /// WCAG relative luminance.
    pub fn relative_luminance(&self) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = f64::from(c) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }

        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }
}

/// WCAG contrast ratio between two colors (1.0 to 21.0).
pub fn contrast_ratio(a: Rgba, b: Rgba) -> f64 {
    let la = a.relative_luminance();
    let lb = b.relative_luminance();
    let lighter = la.max(lb);
    let darker = la.min(lb);
    (lighter + 0.05) / (darker + 0.05)
}

/// Parse a CSS color string.
pub fn parse_css_color(input: &str) -> Option<Rgba> {
    let s = input.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    let (name, args) = s.split_once('(')?;
    let args = args.trim_end().strip_suffix(')')?;
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    match name.trim().to_ascii_lowercase().as_str() {
        "rgb" | "rgba" => parse_rgb(&parts),
        "hsl" | "hsla" => parse_hsl(&parts),
        _ => None,
    }
}

/// Returns true if `input` is a supported CSS color.
pub fn is_valid_color(input: &str) -> bool {
    parse_css_color(input).is_some()
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let short = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Rgba {
            r: short(0)?,
            g: short(1)?,
            b: short(2)?,
            a: 1.0,
        }),
        4 => Some(Rgba {
            r: short(0)?,
            g: short(1)?,
            b: short(2)?,
            a: f64::from(short(3)?) / 255.0,
        }),
        6 => Some(Rgba {
            r: long(0)?,
            g: long(2)?,
            b: long(4)?,
            a: 1.0,
        }),
        8 => Some(Rgba {
            r: long(0)?,
            g: long(2)?,
            b: long(4)?,
            a: f64::from(long(6)?) / 255.0,
        }),
        _ => None,
    }
}

fn parse_alpha(part: Option<&&str>) -> Option<f64> {
    let Some(part) = part else {
        return Some(1.0);
    };
    let value = match part.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
        None => part.parse::<f64>().ok()?,
    };
    (0.0..=1.0).contains(&value).then_some(value)
}

fn parse_rgb(parts: &[&str]) -> Option<Rgba> {
    if !(3..=4).contains(&parts.len()) {
        return None;
    }
    let channel = |part: &str| -> Option<u8> {
        let value = match part.strip_suffix('%') {
            Some(pct) => pct.trim().parse::<f64>().ok()? * 2.55,
            None => part.parse::<f64>().ok()?,
        };
        (0.0..=255.0)
            .contains(&value)
            .then(|| value.round() as u8)
    };

    Some(Rgba {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: parse_alpha(parts.get(3))?,
    })
}

fn parse_hsl(parts: &[&str]) -> Option<Rgba> {
    if !(3..=4).contains(&parts.len()) {
        return None;
    }
    let hue = parts[0]
        .strip_suffix("deg")
        .unwrap_or(parts[0])
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|h| h.is_finite())?;
    let percent = |part: &str| -> Option<f64> {
        let value = part.strip_suffix('%')?.trim().parse::<f64>().ok()?;
        (0.0..=100.0).contains(&value).then_some(value / 100.0)
    };
    let s = percent(parts[1])?;
    let l = percent(parts[2])?;
    let alpha = parse_alpha(parts.get(3))?;

    let h = hue.rem_euclid(360.0);
    let a = s * l.min(1.0 - l);
    let f = |n: f64| -> u8 {
        let k = (n + h / 30.0) % 12.0;
        let v = l - a * (k - 3.0).min(9.0 - k).clamp(-1.0, 1.0);
        (v * 255.0).round() as u8
    };

    Some(Rgba {
        r: f(0.0),
        g: f(8.0),
        b: f(4.0),
        a: alpha,
    })
}
