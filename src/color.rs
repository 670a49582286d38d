use serde::{Deserialize, Serialize};
use crate::error::{SketchError, SketchResult};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 255.0, g: 255.0, b: 255.0 };
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };

    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Rgb { r: r.clamp(0.0, 255.0), g: g.clamp(0.0, 255.0), b: b.clamp(0.0, 255.0) }
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`. Alpha is ignored.
    pub fn from_hex(hex: &str) -> SketchResult<Self> {
        let invalid = || SketchError::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map(f64::from).map_err(|_| invalid());
        match digits.len() {
            3 | 4 => {
                let mut out = [0.0; 3];
                for (i, c) in digits.chars().take(3).enumerate() {
                    out[i] = channel(&c.to_string().repeat(2))?;
                }
                Ok(Rgb { r: out[0], g: out[1], b: out[2] })
            }
            6 | 8 => Ok(Rgb {
                r: channel(&digits[0..2])?,
                g: channel(&digits[2..4])?,
                b: channel(&digits[4..6])?,
            }),
            _ => Err(invalid()),
        }
    }

    /// Parses the CSS color forms a canvas accepts: hex, `rgb()`/`rgba()`,
    /// `hsl()`/`hsla()` and named colors. Alpha is ignored.
    pub fn from_css(css: &str) -> SketchResult<Self> {
        let trimmed = css.trim();
        if trimmed.starts_with('#') {
            return Rgb::from_hex(trimmed);
        }
        let lower = trimmed.to_ascii_lowercase();
        if let Some(open) = lower.find('(') {
            return parse_functional(&lower[..open], &lower[open + 1..])
                .ok_or_else(|| SketchError::InvalidColor(css.to_string()));
        }
        NAMED_COLORS
            .binary_search_by(|(name, _)| name.cmp(&lower.as_str()))
            .map(|idx| {
                let [r, g, b] = NAMED_COLORS[idx].1;
                Rgb { r: r as f64, g: g as f64, b: b as f64 }
            })
            .map_err(|_| SketchError::InvalidColor(css.to_string()))
    }

    pub fn channels(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_css(&self) -> String {
        format!("rgb({}, {}, {})", self.r.round(), self.g.round(), self.b.round())
    }

    pub fn to_css_alpha(&self, alpha: f64) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.r.round(),
            self.g.round(),
            self.b.round(),
            alpha.clamp(0.0, 1.0)
        )
    }
}

/// A color as callers hand it over: a CSS color string or a raw channel triple.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(untagged)]
pub enum ColorInput {
    Css(String),
    Channels([f64; 3]),
}

impl ColorInput {
    pub fn resolve(&self) -> SketchResult<Rgb> {
        match self {
            ColorInput::Css(s) => Rgb::from_css(s),
            ColorInput::Channels([r, g, b]) => Ok(Rgb::new(*r, *g, *b)),
        }
    }
}

impl From<&str> for ColorInput {
    fn from(s: &str) -> Self {
        ColorInput::Css(s.to_string())
    }
}

/// `name(args)` with comma, space or slash separated arguments.
fn parse_functional(name: &str, rest: &str) -> Option<Rgb> {
    let args: Vec<&str> = rest
        .strip_suffix(')')?
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|a| !a.is_empty())
        .collect();
    if args.len() < 3 || args.len() > 4 {
        return None;
    }
    match name.trim() {
        "rgb" | "rgba" => {
            let channel = |arg: &str| match arg.strip_suffix('%') {
                Some(pct) => pct.parse::<f64>().ok().map(|v| v / 100.0 * 255.0),
                None => arg.parse::<f64>().ok(),
            };
            Some(Rgb::new(channel(args[0])?, channel(args[1])?, channel(args[2])?))
        }
        "hsl" | "hsla" => {
            let hue = args[0].strip_suffix("deg").unwrap_or(args[0]).parse::<f64>().ok()?;
            let percent = |arg: &str| arg.strip_suffix('%')?.parse::<f64>().ok().map(|v| (v / 100.0).clamp(0.0, 1.0));
            Some(hsl_to_rgb(hue, percent(args[1])?, percent(args[2])?))
        }
        _ => None,
    }
}

fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let h = hue.rem_euclid(360.0) / 60.0;
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    Rgb::new(((r + m) * 255.0).round(), ((g + m) * 255.0).round(), ((b + m) * 255.0).round())
}

/// CSS named colors, sorted by name.
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("aliceblue", [240, 248, 255]),
    ("antiquewhite", [250, 235, 215]),
    ("aqua", [0, 255, 255]),
    ("aquamarine", [127, 255, 212]),
    ("azure", [240, 255, 255]),
    ("beige", [245, 245, 220]),
    ("bisque", [255, 228, 196]),
    ("black", [0, 0, 0]),
    ("blanchedalmond", [255, 235, 205]),
    ("blue", [0, 0, 255]),
    ("blueviolet", [138, 43, 226]),
    ("brown", [165, 42, 42]),
    ("burlywood", [222, 184, 135]),
    ("cadetblue", [95, 158, 160]),
    ("chartreuse", [127, 255, 0]),
    ("chocolate", [210, 105, 30]),
    ("coral", [255, 127, 80]),
    ("cornflowerblue", [100, 149, 237]),
    ("cornsilk", [255, 248, 220]),
    ("crimson", [220, 20, 60]),
    ("cyan", [0, 255, 255]),
    ("darkblue", [0, 0, 139]),
    ("darkcyan", [0, 139, 139]),
    ("darkgoldenrod", [184, 134, 11]),
    ("darkgray", [169, 169, 169]),
    ("darkgreen", [0, 100, 0]),
    ("darkgrey", [169, 169, 169]),
    ("darkkhaki", [189, 183, 107]),
    ("darkmagenta", [139, 0, 139]),
    ("darkolivegreen", [85, 107, 47]),
    ("darkorange", [255, 140, 0]),
    ("darkorchid", [153, 50, 204]),
    ("darkred", [139, 0, 0]),
    ("darksalmon", [233, 150, 122]),
    ("darkseagreen", [143, 188, 143]),
    ("darkslateblue", [72, 61, 139]),
    ("darkslategray", [47, 79, 79]),
    ("darkslategrey", [47, 79, 79]),
    ("darkturquoise", [0, 206, 209]),
    ("darkviolet", [148, 0, 211]),
    ("deeppink", [255, 20, 147]),
    ("deepskyblue", [0, 191, 255]),
    ("dimgray", [105, 105, 105]),
    ("dimgrey", [105, 105, 105]),
    ("dodgerblue", [30, 144, 255]),
    ("firebrick", [178, 34, 34]),
    ("floralwhite", [255, 250, 240]),
    ("forestgreen", [34, 139, 34]),
    ("fuchsia", [255, 0, 255]),
    ("gainsboro", [220, 220, 220]),
    ("ghostwhite", [248, 248, 255]),
    ("gold", [255, 215, 0]),
    ("goldenrod", [218, 165, 32]),
    ("gray", [128, 128, 128]),
    ("green", [0, 128, 0]),
    ("greenyellow", [173, 255, 47]),
    ("grey", [128, 128, 128]),
    ("honeydew", [240, 255, 240]),
    ("hotpink", [255, 105, 180]),
    ("indianred", [205, 92, 92]),
    ("indigo", [75, 0, 130]),
    ("ivory", [255, 255, 240]),
    ("khaki", [240, 230, 140]),
    ("lavender", [230, 230, 250]),
    ("lavenderblush", [255, 240, 245]),
    ("lawngreen", [124, 252, 0]),
    ("lemonchiffon", [255, 250, 205]),
    ("lightblue", [173, 216, 230]),
    ("lightcoral", [240, 128, 128]),
    ("lightcyan", [224, 255, 255]),
    ("lightgoldenrodyellow", [250, 250, 210]),
    ("lightgray", [211, 211, 211]),
    ("lightgreen", [144, 238, 144]),
    ("lightgrey", [211, 211, 211]),
    ("lightpink", [255, 182, 193]),
    ("lightsalmon", [255, 160, 122]),
    ("lightseagreen", [32, 178, 170]),
    ("lightskyblue", [135, 206, 250]),
    ("lightslategray", [119, 136, 153]),
    ("lightslategrey", [119, 136, 153]),
    ("lightsteelblue", [176, 196, 222]),
    ("lightyellow", [255, 255, 224]),
    ("lime", [0, 255, 0]),
    ("limegreen", [50, 205, 50]),
    ("linen", [250, 240, 230]),
    ("magenta", [255, 0, 255]),
    ("maroon", [128, 0, 0]),
    ("mediumaquamarine", [102, 205, 170]),
    ("mediumblue", [0, 0, 205]),
    ("mediumorchid", [186, 85, 211]),
    ("mediumpurple", [147, 112, 219]),
    ("mediumseagreen", [60, 179, 113]),
    ("mediumslateblue", [123, 104, 238]),
    ("mediumspringgreen", [0, 250, 154]),
    ("mediumturquoise", [72, 209, 204]),
    ("mediumvioletred", [199, 21, 133]),
    ("midnightblue", [25, 25, 112]),
    ("mintcream", [245, 255, 250]),
    ("mistyrose", [255, 228, 225]),
    ("moccasin", [255, 228, 181]),
    ("navajowhite", [255, 222, 173]),
    ("navy", [0, 0, 128]),
    ("oldlace", [253, 245, 230]),
    ("olive", [128, 128, 0]),
    ("olivedrab", [107, 142, 35]),
    ("orange", [255, 165, 0]),
    ("orangered", [255, 69, 0]),
    ("orchid", [218, 112, 214]),
    ("palegoldenrod", [238, 232, 170]),
    ("palegreen", [152, 251, 152]),
    ("paleturquoise", [175, 238, 238]),
    ("palevioletred", [219, 112, 147]),
    ("papayawhip", [255, 239, 213]),
    ("peachpuff", [255, 218, 185]),
    ("peru", [205, 133, 63]),
    ("pink", [255, 192, 203]),
    ("plum", [221, 160, 221]),
    ("powderblue", [176, 224, 230]),
    ("purple", [128, 0, 128]),
    ("rebeccapurple", [102, 51, 153]),
    ("red", [255, 0, 0]),
    ("rosybrown", [188, 143, 143]),
    ("royalblue", [65, 105, 225]),
    ("saddlebrown", [139, 69, 19]),
    ("salmon", [250, 128, 114]),
    ("sandybrown", [244, 164, 96]),
    ("seagreen", [46, 139, 87]),
    ("seashell", [255, 245, 238]),
    ("sienna", [160, 82, 45]),
    ("silver", [192, 192, 192]),
    ("skyblue", [135, 206, 235]),
    ("slateblue", [106, 90, 205]),
    ("slategray", [112, 128, 144]),
    ("slategrey", [112, 128, 144]),
    ("snow", [255, 250, 250]),
    ("springgreen", [0, 255, 127]),
    ("steelblue", [70, 130, 180]),
    ("tan", [210, 180, 140]),
    ("teal", [0, 128, 128]),
    ("thistle", [216, 191, 216]),
    ("tomato", [255, 99, 71]),
    ("turquoise", [64, 224, 208]),
    ("violet", [238, 130, 238]),
    ("wheat", [245, 222, 179]),
    ("white", [255, 255, 255]),
    ("whitesmoke", [245, 245, 245]),
    ("yellow", [255, 255, 0]),
    ("yellowgreen", [154, 205, 50]),
];

/// Stroke color that ping-pongs between the base color and `base ± range`.
#[derive(Clone, Debug)]
pub struct ColorCycler {
    current: Rgb,
    base: Rgb,
    direction: f64,
    increments: [f64; 3],
    range: f64,
}

impl ColorCycler {
    pub fn new(base: Rgb, increments: [f64; 3], range: f64) -> Self {
        ColorCycler { current: base, base, direction: 1.0, increments, range }
    }

    pub fn current(&self) -> Rgb {
        self.current
    }

    pub fn base(&self) -> Rgb {
        self.base
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn is_active(&self) -> bool {
        self.increments.iter().any(|inc| *inc != 0.0)
    }

    /// Steps every channel once. The direction flip takes effect on the next call.
    pub fn advance(&mut self) -> Rgb {
        let mut next = self.current.channels();
        for (value, inc) in next.iter_mut().zip(self.increments) {
            *value = (*value + inc * self.direction).clamp(0.0, 255.0);
        }
        self.current = Rgb { r: next[0], g: next[1], b: next[2] };

        let base = self.base.channels();
        let past_bound = (0..3).any(|i| {
            let v = next[i];
            self.increments[i] != 0.0
                && (v >= base[i] + self.range || v <= base[i] - self.range || v >= 255.0 || v <= 0.0)
        });
        if past_bound {
            self.direction = -self.direction;
        }
        self.current
    }
}
