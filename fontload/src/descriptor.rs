//! Parsing of font identifiers.
//!
//! A font identifier is written the way the CSS `font` shorthand is:
//!
//! ```text
//! [style] [variant] [weight] [stretch] size[/line-height] family[, family]*
//! ```
//!
//! e.g. `16px CustomFont` or `italic bold 12px/30px Georgia, serif`. Only the parts needed to
//! pick a face are kept; line height and `small-caps` are accepted and recorded but do not take
//! part in matching.

use std::str::FromStr;

use fontdb::{Family, Stretch, Style, Weight};
use getset::{CopyGetters, Getters};
use strum::EnumString;
use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("font descriptor is empty")]
    Empty,
    #[error("font size is missing")]
    MissingSize,
    #[error("invalid font size: {0}")]
    InvalidSize(String),
    #[error("invalid font weight: {0}")]
    InvalidWeight(String),
    #[error("font family is missing")]
    MissingFamily,
    #[error("invalid font family: {0}")]
    InvalidFamily(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LengthUnit {
    Px,
    Pt,
    Pc,
    In,
    Cm,
    Mm,
    Em,
    Rem,
    Ex,
    Ch,
    Vw,
    Vh,
    #[strum(serialize = "%")]
    Percent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SizeKeyword {
    XxSmall,
    XSmall,
    Small,
    Medium,
    Large,
    XLarge,
    XxLarge,
    XxxLarge,
    Smaller,
    Larger,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FontSize {
    Length(f32, LengthUnit),
    Keyword(SizeKeyword),
}

impl FromStr for FontSize {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(keyword) = SizeKeyword::from_str(&s.to_ascii_lowercase()) {
            return Ok(FontSize::Keyword(keyword));
        }
        if s == "0" {
            return Ok(FontSize::Length(0.0, LengthUnit::Px));
        }
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
            .ok_or_else(|| DescriptorError::InvalidSize(s.to_string()))?;
        let (value, unit) = s.split_at(split);
        let value = value
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| DescriptorError::InvalidSize(s.to_string()))?;
        let unit = LengthUnit::from_str(&unit.to_ascii_lowercase())
            .map_err(|_| DescriptorError::InvalidSize(s.to_string()))?;
        Ok(FontSize::Length(value, unit))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FamilyName {
    Named(String),
    Serif,
    SansSerif,
    Monospace,
    Cursive,
    Fantasy,
}

impl FamilyName {
    fn from_unquoted(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "serif" => FamilyName::Serif,
            "sans-serif" => FamilyName::SansSerif,
            "monospace" => FamilyName::Monospace,
            "cursive" => FamilyName::Cursive,
            "fantasy" => FamilyName::Fantasy,
            _ => FamilyName::Named(name.to_string()),
        }
    }

    pub fn as_family(&self) -> Family<'_> {
        match self {
            FamilyName::Named(name) => Family::Name(name),
            FamilyName::Serif => Family::Serif,
            FamilyName::SansSerif => Family::SansSerif,
            FamilyName::Monospace => Family::Monospace,
            FamilyName::Cursive => Family::Cursive,
            FamilyName::Fantasy => Family::Fantasy,
        }
    }
}

#[derive(Clone, Debug, PartialEq, CopyGetters, Getters)]
pub struct FontDescriptor {
    #[getset(get_copy = "pub")]
    style: Style,

    #[getset(get_copy = "pub")]
    small_caps: bool,

    #[getset(get_copy = "pub")]
    weight: Weight,

    #[getset(get_copy = "pub")]
    stretch: Stretch,

    #[getset(get_copy = "pub")]
    size: FontSize,

    #[getset(get = "pub")]
    line_height: Option<String>,

    #[getset(get = "pub")]
    families: Vec<FamilyName>,
}

impl FontDescriptor {
    /// Families in preference order, ready for a `fontdb::Query`.
    pub fn query_families(&self) -> Vec<Family<'_>> {
        self.families.iter().map(FamilyName::as_family).collect()
    }
}

impl FromStr for FontDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err(DescriptorError::Empty);
        }

        let mut style = Style::Normal;
        let mut small_caps = false;
        let mut weight = Weight::NORMAL;
        let mut stretch = Stretch::Normal;

        let size_token = loop {
            let (token, remaining) = next_token(rest).ok_or(DescriptorError::MissingSize)?;
            rest = remaining;
            // size and line height may be glued together, e.g. `12px/30px`
            let head = token.split('/').next().unwrap_or(token);
            match head.to_ascii_lowercase().as_str() {
                "normal" => {}
                "italic" => style = Style::Italic,
                "oblique" => style = Style::Oblique,
                "small-caps" => small_caps = true,
                "bold" | "bolder" => weight = Weight::BOLD,
                "lighter" => weight = Weight::THIN,
                lower => {
                    if let Some(s) = parse_stretch(lower) {
                        stretch = s;
                    } else if head == "0" {
                        // unitless zero is a length, never a weight
                        break token;
                    } else if head.bytes().all(|b| b.is_ascii_digit()) {
                        weight = parse_weight(head)?;
                    } else if head.starts_with(|c: char| c.is_ascii_digit() || c == '.')
                        || SizeKeyword::from_str(lower).is_ok()
                    {
                        break token;
                    } else {
                        return Err(DescriptorError::MissingSize);
                    }
                }
            }
        };

        let (size, mut line_height) = match size_token.split_once('/') {
            Some((size, line_height)) => (size, Some(line_height)),
            None => (size_token, None),
        };
        let size = FontSize::from_str(size)?;

        if line_height == Some("") {
            // `12px/ 30px`
            let (token, remaining) =
                next_token(rest).ok_or_else(|| DescriptorError::InvalidSize(s.to_string()))?;
            line_height = Some(token);
            rest = remaining;
        } else if line_height.is_none() && rest.starts_with('/') {
            // `12px / 30px` or `12px /30px`
            let after_slash = rest[1..].trim_start();
            let (token, remaining) =
                next_token(after_slash).ok_or_else(|| DescriptorError::InvalidSize(s.to_string()))?;
            line_height = Some(token);
            rest = remaining;
        }

        let families = parse_families(rest)?;

        Ok(Self {
            style,
            small_caps,
            weight,
            stretch,
            size,
            line_height: line_height.map(str::to_string),
            families,
        })
    }
}

fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], s[end..].trim_start()))
}

fn parse_weight(token: &str) -> Result<Weight, DescriptorError> {
    token
        .parse::<u16>()
        .ok()
        .filter(|w| (1..=1000).contains(w))
        .map(Weight)
        .ok_or_else(|| DescriptorError::InvalidWeight(token.to_string()))
}

fn parse_stretch(token: &str) -> Option<Stretch> {
    let stretch = match token {
        "ultra-condensed" => Stretch::UltraCondensed,
        "extra-condensed" => Stretch::ExtraCondensed,
        "condensed" => Stretch::Condensed,
        "semi-condensed" => Stretch::SemiCondensed,
        "semi-expanded" => Stretch::SemiExpanded,
        "expanded" => Stretch::Expanded,
        "extra-expanded" => Stretch::ExtraExpanded,
        "ultra-expanded" => Stretch::UltraExpanded,
        _ => return None,
    };
    Some(stretch)
}

fn parse_families(s: &str) -> Result<Vec<FamilyName>, DescriptorError> {
    if s.trim().is_empty() {
        return Err(DescriptorError::MissingFamily);
    }

    let mut families = vec![];
    let mut chars = s.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let family = match chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some(c) => name.push(c),
                        None => return Err(DescriptorError::InvalidFamily(s.to_string())),
                    }
                }
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
                if !matches!(chars.peek(), None | Some(',')) {
                    return Err(DescriptorError::InvalidFamily(s.to_string()));
                }
                if name.is_empty() {
                    return Err(DescriptorError::MissingFamily);
                }
                FamilyName::Named(name)
            }
            _ => {
                let mut raw = String::new();
                while let Some(c) = chars.next_if(|c| *c != ',') {
                    raw.push(c);
                }
                let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    return Err(DescriptorError::MissingFamily);
                }
                if name.contains(['"', '\'']) {
                    return Err(DescriptorError::InvalidFamily(name));
                }
                FamilyName::from_unquoted(&name)
            }
        };
        families.push(family);
        if chars.next().is_none() {
            break;
        }
    }
    Ok(families)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> FontDescriptor {
        s.parse().unwrap()
    }

    #[test]
    fn size_and_family() {
        let d = parse("16px CustomFont");
        assert_eq!(d.size(), FontSize::Length(16.0, LengthUnit::Px));
        assert_eq!(d.families(), &vec![FamilyName::Named("CustomFont".to_string())]);
        assert_eq!(d.style(), Style::Normal);
        assert_eq!(d.weight(), Weight::NORMAL);
        assert_eq!(d.stretch(), Stretch::Normal);
        assert!(d.line_height().is_none());
    }

    #[test]
    fn full_shorthand() {
        let d = parse("italic small-caps bold condensed 12px/30px Georgia, serif");
        assert_eq!(d.style(), Style::Italic);
        assert!(d.small_caps());
        assert_eq!(d.weight(), Weight::BOLD);
        assert_eq!(d.stretch(), Stretch::Condensed);
        assert_eq!(d.size(), FontSize::Length(12.0, LengthUnit::Px));
        assert_eq!(d.line_height().as_deref(), Some("30px"));
        assert_eq!(
            d.families(),
            &vec![FamilyName::Named("Georgia".to_string()), FamilyName::Serif]
        );
    }

    #[test]
    fn numeric_weight_and_spaced_line_height() {
        let d = parse("oblique 300 1.5em / 2 \"Noto Sans CJK JP\", 'Source Han Sans', sans-serif");
        assert_eq!(d.style(), Style::Oblique);
        assert_eq!(d.weight(), Weight(300));
        assert_eq!(d.size(), FontSize::Length(1.5, LengthUnit::Em));
        assert_eq!(d.line_height().as_deref(), Some("2"));
        assert_eq!(
            d.families(),
            &vec![
                FamilyName::Named("Noto Sans CJK JP".to_string()),
                FamilyName::Named("Source Han Sans".to_string()),
                FamilyName::SansSerif,
            ]
        );
    }

    #[test]
    fn keyword_size_and_multi_word_family() {
        let d = parse("x-large   DejaVu   Sans Mono");
        assert_eq!(d.size(), FontSize::Keyword(SizeKeyword::XLarge));
        assert_eq!(
            d.families(),
            &vec![FamilyName::Named("DejaVu Sans Mono".to_string())]
        );
    }

    #[test]
    fn quoted_generic_is_a_name() {
        let d = parse("10pt \"serif\", monospace");
        assert_eq!(d.size(), FontSize::Length(10.0, LengthUnit::Pt));
        assert_eq!(
            d.families(),
            &vec![FamilyName::Named("serif".to_string()), FamilyName::Monospace]
        );
        assert_eq!(
            d.query_families(),
            vec![Family::Name("serif"), Family::Monospace]
        );
    }

    #[test]
    fn unitless_zero_size() {
        let d = parse("0 Arial");
        assert_eq!(d.size(), FontSize::Length(0.0, LengthUnit::Px));
        assert_eq!(d.families(), &vec![FamilyName::Named("Arial".to_string())]);

        let d = parse("bold 0/1 Arial");
        assert_eq!(d.weight(), Weight::BOLD);
        assert_eq!(d.size(), FontSize::Length(0.0, LengthUnit::Px));
        assert_eq!(d.line_height().as_deref(), Some("1"));
    }

    #[test]
    fn percent_size() {
        let d = parse("120% Arial");
        assert_eq!(d.size(), FontSize::Length(120.0, LengthUnit::Percent));
    }

    #[test]
    fn rejects_malformed_descriptors() {
        assert_eq!("".parse::<FontDescriptor>(), Err(DescriptorError::Empty));
        assert_eq!("   ".parse::<FontDescriptor>(), Err(DescriptorError::Empty));
        assert_eq!(
            "CustomFont".parse::<FontDescriptor>(),
            Err(DescriptorError::MissingSize)
        );
        assert_eq!(
            "bold italic".parse::<FontDescriptor>(),
            Err(DescriptorError::MissingSize)
        );
        assert_eq!(
            "16px".parse::<FontDescriptor>(),
            Err(DescriptorError::MissingFamily)
        );
        assert_eq!(
            "16px A,,B".parse::<FontDescriptor>(),
            Err(DescriptorError::MissingFamily)
        );
        assert_eq!(
            "16qx A".parse::<FontDescriptor>(),
            Err(DescriptorError::InvalidSize("16qx".to_string()))
        );
        assert_eq!(
            "1200 16px A".parse::<FontDescriptor>(),
            Err(DescriptorError::InvalidWeight("1200".to_string()))
        );
        assert!(matches!(
            "16px \"Unclosed".parse::<FontDescriptor>(),
            Err(DescriptorError::InvalidFamily(_))
        ));
    }
}
