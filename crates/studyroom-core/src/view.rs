use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Screen the host shows. Navigation commands select one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Home,
    Timer,
    Statistics,
    Shop,
    StudyMethods,
    Motivation,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Home,
        View::Timer,
        View::Statistics,
        View::Shop,
        View::StudyMethods,
        View::Motivation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            View::Home => "home",
            View::Timer => "timer",
            View::Statistics => "statistics",
            View::Shop => "shop",
            View::StudyMethods => "study_methods",
            View::Motivation => "motivation",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        View::ALL
            .into_iter()
            .find(|view| view.as_str() == wanted)
            .ok_or_else(|| format!("unknown view '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loose_spellings() {
        assert_eq!("Study Methods".parse::<View>(), Ok(View::StudyMethods));
        assert_eq!("study-methods".parse::<View>(), Ok(View::StudyMethods));
        assert_eq!("timer".parse::<View>(), Ok(View::Timer));
        assert!("garden".parse::<View>().is_err());
    }

    #[test]
    fn display_matches_serde() {
        for view in View::ALL {
            let json = serde_json::to_string(&view).unwrap();
            assert_eq!(json, format!("\"{view}\""));
        }
    }
}
