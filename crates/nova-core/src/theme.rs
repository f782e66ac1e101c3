use serde::{Deserialize, Serialize};

/// Visual theme of the presentation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Midnight,
    Neon,
    Solar,
    Pastel,
}

impl Theme {
    pub fn all() -> Vec<Theme> {
        vec![Theme::Midnight, Theme::Neon, Theme::Solar, Theme::Pastel]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Theme::Midnight => "Midnight (Dark)",
            Theme::Neon => "Neon (Cyber)",
            Theme::Solar => "Solar (Warm)",
            Theme::Pastel => "Pastel (Soft)",
        }
    }

    /// Next theme in `all()` order, wrapping around.
    pub fn next(&self) -> Theme {
        let all = Theme::all();
        let idx = all.iter().position(|t| t == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    /// Previous theme in `all()` order, wrapping around.
    pub fn prev(&self) -> Theme {
        let all = Theme::all();
        let idx = all.iter().position(|t| t == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_lowercase_id() {
        for (theme, id) in Theme::all().into_iter().zip(["midnight", "neon", "solar", "pastel"]) {
            assert_eq!(serde_json::to_string(&theme).unwrap(), format!("\"{}\"", id));
        }
        assert!(serde_json::from_str::<Theme>("\"sepia\"").is_err());
    }

    #[test]
    fn test_cycling_wraps() {
        assert_eq!(Theme::Pastel.next(), Theme::Midnight);
        assert_eq!(Theme::Midnight.prev(), Theme::Pastel);
        assert_eq!(Theme::Neon.next().prev(), Theme::Neon);
    }
}
