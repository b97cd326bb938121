//! A minimal CSS cascade: simple selectors, inline styles, and inheritance
//! of the text properties a slide cares about.

use crate::dom::Element;
use deck_core::TextAlign;
use regex::Regex;
use std::sync::LazyLock;

/// Browser default font size (16px).
pub const DEFAULT_FONT_SIZE_PT: f64 = 12.0;

/// Points per CSS pixel.
const PT_PER_PX: f64 = 0.75;

/// Regex matching `/* ... */` comments.
static COMMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Regex matching a compound selector such as `p`, `.lead`, `h1.title#top`, `*`.
static SELECTOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*|[a-zA-Z][a-zA-Z0-9-]*)?((?:[.#][a-zA-Z_][a-zA-Z0-9_-]*)*)$").unwrap()
});

/// Regex matching `rgb(r, g, b)` and `rgba(r, g, b, a)`.
static RGB_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([\d.]+)\s*)?\)$")
        .unwrap()
});

/// One `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// Parse the body of a rule or a `style` attribute.
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    block
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_lowercase();
            let value = value.trim().trim_end_matches("!important").trim().to_string();
            if property.is_empty() || value.is_empty() {
                None
            } else {
                Some(Declaration { property, value })
            }
        })
        .collect()
}

/// A compound selector without combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    fn parse(text: &str) -> Option<Self> {
        let caps = SELECTOR_REGEX.captures(text)?;
        let tag = caps
            .get(1)
            .map(|m| m.as_str().to_lowercase())
            .filter(|t| t != "*");

        let mut id = None;
        let mut classes = Vec::new();
        let rest = caps.get(2).map_or("", |m| m.as_str());
        let mut current = String::new();
        let mut kind = ' ';
        for c in rest.chars().chain(std::iter::once('\0')) {
            if c == '.' || c == '#' || c == '\0' {
                match kind {
                    '.' => classes.push(std::mem::take(&mut current)),
                    '#' => id = Some(std::mem::take(&mut current)),
                    _ => {}
                }
                kind = c;
            } else {
                current.push(c);
            }
        }

        Some(Self { tag, id, classes })
    }

    fn specificity(&self) -> (usize, usize, usize) {
        (
            usize::from(self.id.is_some()),
            self.classes.len(),
            usize::from(self.tag.is_some()),
        )
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != element.tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes
            .iter()
            .all(|class| element.classes().any(|c| c == class))
    }
}

#[derive(Debug, Clone)]
struct Rule {
    selector: Selector,
    order: usize,
    declarations: Vec<Declaration>,
}

/// Rules collected from `<style>` elements.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
}

impl Stylesheet {
    /// Parse a stylesheet. Selectors with combinators, pseudo-classes or
    /// attribute tests are skipped, as are at-rules other than `@media`
    /// blocks for screen.
    pub fn parse(css: &str) -> Self {
        let css = COMMENT_REGEX.replace_all(css, "");
        let mut sheet = Self::default();
        sheet.collect(&css);
        sheet
    }

    fn collect(&mut self, css: &str) {
        for (prelude, block) in top_level_blocks(css) {
            if let Some(query) = prelude.strip_prefix("@media") {
                if media_applies(query) {
                    self.collect(block);
                } else {
                    log::debug!("Skipping @media {}", query.trim());
                }
                continue;
            }
            if prelude.starts_with('@') {
                log::debug!("Skipping at-rule '{}'", prelude);
                continue;
            }

            let declarations = parse_declarations(block);
            for text in prelude.split(',').map(str::trim) {
                match Selector::parse(text) {
                    Some(selector) => self.rules.push(Rule {
                        selector,
                        order: self.rules.len(),
                        declarations: declarations.clone(),
                    }),
                    None => log::debug!("Skipping unsupported selector '{}'", text),
                }
            }
        }
    }

    /// Merge another sheet's rules after this one's.
    pub fn extend(&mut self, other: Stylesheet) {
        for mut rule in other.rules {
            rule.order = self.rules.len();
            self.rules.push(rule);
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Declarations that apply to `element`, lowest priority first.
    pub fn matching(&self, element: &Element) -> Vec<&Declaration> {
        let mut matched: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| r.selector.matches(element))
            .collect();
        matched.sort_by_key(|r| (r.selector.specificity(), r.order));
        matched
            .into_iter()
            .flat_map(|r| r.declarations.iter())
            .collect()
    }
}

/// Resolved style of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub font_size_pt: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<String>,
    pub font_family: Option<String>,
    pub align: TextAlign,
    pub background: Option<String>,
    pub width_pt: Option<f64>,
    pub height_pt: Option<f64>,
    pub hidden: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            font_size_pt: DEFAULT_FONT_SIZE_PT,
            bold: false,
            italic: false,
            underline: false,
            color: None,
            font_family: None,
            align: TextAlign::Left,
            background: None,
            width_pt: None,
            height_pt: None,
            hidden: false,
        }
    }
}

impl ComputedStyle {
    /// Style of a child before its own rules apply: inherited text
    /// properties are kept, box properties reset.
    pub fn inherit(&self) -> Self {
        Self {
            background: None,
            width_pt: None,
            height_pt: None,
            hidden: false,
            ..self.clone()
        }
    }

    /// Compute the style of `element` given its parent's style.
    pub fn for_element(parent: &Self, element: &Element, sheet: &Stylesheet) -> Self {
        let mut style = parent.inherit();
        style.apply_tag_defaults(&element.tag);
        for decl in sheet.matching(element) {
            style.apply(decl);
        }
        if let Some(inline) = element.attr("style") {
            for decl in parse_declarations(inline) {
                style.apply(&decl);
            }
        }
        style
    }

    fn apply_tag_defaults(&mut self, tag: &str) {
        let heading_scale = match tag {
            "h1" => Some(2.0),
            "h2" => Some(1.5),
            "h3" => Some(1.17),
            "h4" => Some(1.0),
            "h5" => Some(0.83),
            "h6" => Some(0.67),
            _ => None,
        };
        if let Some(scale) = heading_scale {
            self.font_size_pt *= scale;
            self.bold = true;
            return;
        }
        match tag {
            "b" | "strong" | "th" => self.bold = true,
            "i" | "em" | "cite" | "var" => self.italic = true,
            "u" | "ins" | "a" => self.underline = true,
            "small" => self.font_size_pt *= 0.83,
            "code" | "pre" | "kbd" | "samp" => {
                self.font_family = Some("Courier New".to_string());
            }
            "center" => self.align = TextAlign::Center,
            _ => {}
        }
    }

    /// Apply one declaration.
    pub fn apply(&mut self, decl: &Declaration) {
        let value = decl.value.as_str();
        match decl.property.as_str() {
            "color" => {
                if let Some(color) = parse_color(value) {
                    self.color = Some(color);
                }
            }
            "background" | "background-color" => {
                self.background = parse_color(value)
                    .or_else(|| value.split_whitespace().find_map(parse_color));
            }
            "font-size" => {
                if let Some(size) = parse_length(value, self.font_size_pt) {
                    self.font_size_pt = size;
                }
            }
            "font-weight" => {
                self.bold = match value {
                    "bold" | "bolder" => true,
                    "normal" | "lighter" => false,
                    n => n.parse::<u32>().map(|w| w >= 600).unwrap_or(self.bold),
                };
            }
            "font-style" => self.italic = matches!(value, "italic" | "oblique"),
            "text-decoration" | "text-decoration-line" => {
                self.underline = value.contains("underline");
            }
            "text-align" => {
                self.align = match value {
                    "center" => TextAlign::Center,
                    "right" | "end" => TextAlign::Right,
                    "justify" => TextAlign::Justify,
                    _ => TextAlign::Left,
                };
            }
            "font-family" => {
                self.font_family = value
                    .split(',')
                    .next()
                    .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
                    .filter(|f| !f.is_empty());
            }
            "width" => self.width_pt = parse_length(value, self.font_size_pt),
            "height" => self.height_pt = parse_length(value, self.font_size_pt),
            "display" => self.hidden = value == "none",
            "visibility" => self.hidden = value == "hidden",
            _ => {}
        }
    }
}

/// Parse a CSS length into points. Unitless numbers are pixels.
pub fn parse_length(value: &str, font_size_pt: f64) -> Option<f64> {
    let value = value.trim().to_lowercase();
    let (number, factor) = if let Some(n) = value.strip_suffix("pt") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("px") {
        (n, PT_PER_PX)
    } else if let Some(n) = value.strip_suffix("in") {
        (n, 72.0)
    } else if let Some(n) = value.strip_suffix("rem") {
        (n, DEFAULT_FONT_SIZE_PT)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, font_size_pt)
    } else if let Some(n) = value.strip_suffix("cm") {
        (n, 72.0 / 2.54)
    } else {
        (value.as_str(), PT_PER_PX)
    };
    let number: f64 = number.trim().parse().ok()?;
    (number >= 0.0).then_some(number * factor)
}

/// Parse a CSS colour into `RRGGBB`. Transparent colours yield `None`.
pub fn parse_color(value: &str) -> Option<String> {
    let value = value.trim().to_lowercase();

    if let Some(hex) = value.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return match hex.len() {
            3 => Some(hex.chars().flat_map(|c| [c, c]).collect::<String>().to_uppercase()),
            6 => Some(hex.to_uppercase()),
            _ => None,
        };
    }

    if let Some(caps) = RGB_REGEX.captures(&value) {
        if let Some(alpha) = caps.get(4) {
            if alpha.as_str().parse::<f64>().ok()? == 0.0 {
                return None;
            }
        }
        let channel = |i: usize| caps[i].parse::<u32>().ok().map(|v| v.min(255));
        return Some(format!("{:02X}{:02X}{:02X}", channel(1)?, channel(2)?, channel(3)?));
    }

    let named = match value.as_str() {
        "black" => "000000",
        "white" => "FFFFFF",
        "red" => "FF0000",
        "green" => "008000",
        "lime" => "00FF00",
        "blue" => "0000FF",
        "navy" => "000080",
        "gray" | "grey" => "808080",
        "silver" => "C0C0C0",
        "yellow" => "FFFF00",
        "orange" => "FFA500",
        "purple" => "800080",
        "maroon" => "800000",
        "teal" => "008080",
        "olive" => "808000",
        "aqua" | "cyan" => "00FFFF",
        "fuchsia" | "magenta" => "FF00FF",
        _ => return None,
    };
    Some(named.to_string())
}

/// Split CSS into top-level `(prelude, block)` pairs, keeping nested blocks
/// whole. Statement at-rules (`@import ...;`) and unterminated blocks are
/// dropped.
fn top_level_blocks(css: &str) -> Vec<(&str, &str)> {
    let mut blocks = Vec::new();
    let mut depth = 0usize;
    let mut prelude_start = 0;
    let mut open = 0;
    for (i, c) in css.char_indices() {
        match c {
            '{' => {
                if depth == 0 {
                    open = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    blocks.push((css[prelude_start..open].trim(), &css[open + 1..i]));
                    prelude_start = i + 1;
                }
            }
            '}' | ';' if depth == 0 => prelude_start = i + 1,
            _ => {}
        }
    }
    blocks
}

/// Whether a media query list matches a slide shown on screen. Queries with
/// feature tests are treated as not matching.
fn media_applies(query: &str) -> bool {
    query.split(',').any(|q| {
        let q = q.trim().to_ascii_lowercase();
        let q = q.strip_prefix("only ").unwrap_or(q.as_str()).trim();
        matches!(q, "" | "all" | "screen")
    })
}
