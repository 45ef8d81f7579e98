//! Focus modes: topic presets with canned prompt suggestions.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusMode {
    General,
    Health,
    Local,
    Sports,
    Finance,
}

impl FocusMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "general" => Some(Self::General),
            "health" => Some(Self::Health),
            "local" => Some(Self::Local),
            "sports" => Some(Self::Sports),
            "finance" => Some(Self::Finance),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Health => "health",
            Self::Local => "local",
            Self::Sports => "sports",
            Self::Finance => "finance",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::General => "Ask anything...",
            Self::Health => "What do you want to know?",
            Self::Local => "What's going on in your area?",
            Self::Sports => "What's the latest in sports?",
            Self::Finance => "How's the market looking?",
        }
    }

    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            Self::General => &[],
            Self::Health => &[
                "What lifestyle changes can improve metabolic health?",
                "What are physical therapy exercises to reduce hip pain?",
                "What are some strategies for managing stress?",
            ],
            Self::Local => &[
                "What is happening in my city this weekend?",
                "What are the top-rated restaurants in my city?",
                "What are concerts in my city next month?",
            ],
            Self::Sports => &[
                "Recap of last night's championship game",
                "Who are the rising stars in international football?",
                "What are the major rule changes in baseball this year?",
            ],
            Self::Finance => &[
                "What are the predictions for the stock market next quarter?",
                "Explain the concept of compound interest with examples",
                "What are the pros and cons of investing in index funds?",
            ],
        }
    }
}
