use serde::{Deserialize, Serialize};

/// The language the answer text should be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// Guess the query language: any CJK ideograph means Chinese.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_cjk) {
            Self::Zh
        } else {
            Self::En
        }
    }

    /// Parse a loose language tag such as `"zh"`, `"zh-CN"`, `"en"`, `"english"`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        if tag.starts_with("zh") || tag == "chinese" || tag == "cn" {
            Some(Self::Zh)
        } else if tag.starts_with("en") {
            Some(Self::En)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Zh => "Chinese",
        }
    }
}

pub(crate) fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_chinese_queries() {
        assert_eq!(Language::detect("最后一半讲了啥"), Language::Zh);
        assert_eq!(Language::detect("summarize the 3:00 part"), Language::En);
        assert_eq!(Language::detect(""), Language::En);
    }

    #[test]
    fn parses_loose_tags() {
        assert_eq!(Language::from_tag("zh-CN"), Some(Language::Zh));
        assert_eq!(Language::from_tag(" English "), Some(Language::En));
        assert_eq!(Language::from_tag("fr"), None);
    }
}
