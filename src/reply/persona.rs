//! Reply personas: a random opening and closing phrase around the body.

use super::lexicon::{
    BLUNT_CLOSE, BLUNT_OPEN, SASSY_CLOSE, SASSY_OPEN, SWEET_CLOSE, SWEET_OPEN,
};
use rand::seq::SliceRandom;
use rand::Rng;

/// Named response style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Persona {
    #[default]
    Sweet,
    Blunt,
    Sassy,
}

impl Persona {
    /// Parse a stored setting. Unknown or missing values fall back to `Sweet`.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("blunt") => Self::Blunt,
            Some("sassy") => Self::Sassy,
            _ => Self::Sweet,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sweet => "sweet",
            Self::Blunt => "blunt",
            Self::Sassy => "sassy",
        }
    }

    pub fn openings(&self) -> &'static [&'static str] {
        match self {
            Self::Sweet => SWEET_OPEN,
            Self::Blunt => BLUNT_OPEN,
            Self::Sassy => SASSY_OPEN,
        }
    }

    pub fn closings(&self) -> &'static [&'static str] {
        match self {
            Self::Sweet => SWEET_CLOSE,
            Self::Blunt => BLUNT_CLOSE,
            Self::Sassy => SASSY_CLOSE,
        }
    }

    /// `"{opening} {body} {closing}"`, phrases picked uniformly at random.
    pub fn wrap<R: Rng + ?Sized>(&self, body: &str, rng: &mut R) -> String {
        let open = self.openings().choose(rng).copied().unwrap_or_default();
        let close = self.closings().choose(rng).copied().unwrap_or_default();
        format!("{open} {body} {close}")
    }
}
