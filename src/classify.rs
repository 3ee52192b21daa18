//! Keyword classification of product photos.
//!
//! Detected labels and URL words are matched against fixed vocabularies.
//! The first matching rule wins; there is no scoring.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// What the vision service detected in a photo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub labels: Vec<String>,
    pub objects: Vec<String>,
    pub web_entities: Vec<String>,
    pub dominant_color: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub furniture_type: &'static str,
    pub sub_type: Option<&'static str>,
    pub style: &'static str,
    pub material: &'static str,
    pub color: &'static str,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.furniture_type)?;
        if let Some(sub_type) = self.sub_type {
            write!(f, " ({sub_type})")?;
        }
        write!(
            f,
            ", style: {}, material: {}, color: {}",
            self.style, self.material, self.color
        )
    }
}

/// Lower-cased hint words gathered from a photo and its context URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hints(Vec<String>);

impl Hints {
    pub fn new(annotations: &Annotations, context_url: Option<&str>) -> Self {
        let mut hints = annotations
            .labels
            .iter()
            .chain(&annotations.objects)
            .chain(&annotations.web_entities)
            .filter(|hint| !hint.is_empty())
            .map(|hint| hint.to_lowercase())
            .collect::<Vec<_>>();
        if let Some(url) = context_url {
            hints.extend(url_words(url));
        }
        Self(hints)
    }

    /// Some hint equals `word`.
    fn has(&self, word: &str) -> bool {
        self.0.iter().any(|hint| hint == word)
    }

    fn has_any(&self, words: &[&str]) -> bool {
        words.iter().any(|word| self.has(word))
    }

    /// Some single hint satisfies `predicate`.
    fn any(&self, predicate: impl Fn(&str) -> bool) -> bool {
        self.0.iter().any(|hint| predicate(hint.as_str()))
    }
}

impl<S: Into<String>> FromIterator<S> for Hints {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(|s| s.into().to_lowercase()).collect())
    }
}

fn url_words(url: &str) -> Vec<String> {
    url.to_lowercase()
        .replace(['-', '/'], " ")
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

pub fn classify(annotations: &Annotations, context_url: Option<&str>) -> Classification {
    let hints = Hints::new(annotations, context_url);
    let (furniture_type, sub_type) = furniture_type(&hints);
    Classification {
        furniture_type,
        sub_type,
        style: style(&hints),
        material: material(&hints),
        color: annotations
            .dominant_color
            .map(color_description)
            .unwrap_or(DEFAULT_COLOR),
    }
}

pub const DEFAULT_FURNITURE: &str = "furniture piece";
pub const DEFAULT_COLOR: &str = "medium wood";

pub fn furniture_type(hints: &Hints) -> (&'static str, Option<&'static str>) {
    if hints.any(|h| h.contains("clock")) {
        if hints.has_any(&["grandfather", "floor"]) {
            ("grandfather clock", Some("floor clock"))
        } else if hints.has("wall") {
            ("wall clock", None)
        } else if hints.has_any(&["mantel", "mantle"]) {
            ("mantel clock", None)
        } else if hints.has("table") {
            ("table clock", None)
        } else {
            ("clock", None)
        }
    } else if hints.has("curio") {
        ("curio cabinet", Some("display cabinet"))
    } else if hints.any(|h| {
        h.contains("wine") && ["bar", "cabinet", "rack"].iter().any(|x| h.contains(*x))
    }) {
        ("wine cabinet", Some("wine bar"))
    } else if hints.any(|h| h.contains("bar") && (h.contains("cabinet") || h.contains("cart"))) {
        ("bar cabinet", hints.has("cart").then_some("bar cart"))
    } else if hints.has("console") {
        ("console cabinet", None)
    } else if hints.any(|h| h.contains("display") && h.contains("cabinet")) {
        ("display cabinet", None)
    } else if hints.has("cabinet") {
        ("cabinet", None)
    } else if hints.has_any(&["bookcase", "bookshelf"]) {
        ("bookcase", None)
    } else if hints.has("chest") {
        ("chest", None)
    } else {
        (DEFAULT_FURNITURE, None)
    }
}

pub fn style(hints: &Hints) -> &'static str {
    const RULES: &[(&[&str], &str)] = &[
        (&["modern", "contemporary"], "modern"),
        (&["rustic", "farmhouse"], "rustic"),
        (&["industrial"], "industrial"),
        (&["transitional"], "transitional"),
        (&["vintage", "antique"], "vintage"),
        (&["elegant", "formal"], "elegant traditional"),
        (&["traditional", "classic"], "traditional"),
    ];
    first_match(hints, RULES).unwrap_or("traditional")
}

pub fn material(hints: &Hints) -> &'static str {
    const RULES: &[(&[&str], &str)] = &[
        (&["cherry"], "cherry wood"),
        (&["oak"], "oak wood"),
        (&["mahogany"], "mahogany wood"),
        (&["walnut"], "walnut wood"),
        (&["wood", "wooden"], "wood"),
        (&["metal"], "metal and wood"),
        (&["glass"], "wood with glass"),
    ];
    first_match(hints, RULES).unwrap_or("wood")
}

fn first_match(hints: &Hints, rules: &[(&[&str], &'static str)]) -> Option<&'static str> {
    rules
        .iter()
        .find(|(words, _)| hints.has_any(words))
        .map(|(_, value)| *value)
}

pub fn color_description(color: Rgb) -> &'static str {
    let Rgb { red: r, green: g, blue: b } = color;
    if r < 50 && g < 50 && b < 50 {
        "dark"
    } else if r > 200 && g > 200 && b > 200 {
        "light"
    } else if r > 150 && g < 100 && b < 100 {
        "warm wood"
    } else if r > 100 && g > 80 && b < 70 {
        "rich wood"
    } else {
        DEFAULT_COLOR
    }
}
