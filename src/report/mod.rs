//! Insight report core: prompt construction, model invocation and section
//! extraction.

pub mod extract;
pub mod generator;
pub mod prompt;
pub mod render;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub use extract::extract_section;
pub use generator::{GeneratorSettings, ReportGenerator};
pub use prompt::build_prompt;
pub use render::{RenderOptions, render_html};

/// Industry plus the three questionnaire answers, in order: data management
/// challenges, technology integration gaps, long-term goals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRequest {
    pub industry: String,
    pub answers: [String; 3],
}

impl ReportRequest {
    /// Checked constructor for untrusted input. Values are kept verbatim.
    pub fn new(industry: impl Into<String>, answers: Vec<String>) -> AppResult<Self> {
        let count = answers.len();
        let answers: [String; 3] = answers.try_into().map_err(|_| {
            AppError::Validation(format!(
                "answers must contain exactly 3 entries, got {count}"
            ))
        })?;

        Ok(Self {
            industry: industry.into(),
            answers,
        })
    }
}

/// The five report sections, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Introduction,
    IndustryTrends,
    AiSolutions,
    Analysis,
    Conclusion,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Introduction,
        Section::IndustryTrends,
        Section::AiSolutions,
        Section::Analysis,
        Section::Conclusion,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Section::Introduction => "introduction",
            Section::IndustryTrends => "industry_trends",
            Section::AiSolutions => "ai_solutions",
            Section::Analysis => "analysis",
            Section::Conclusion => "conclusion",
        }
    }

    /// Label searched for as `**{heading}**` in the completion.
    pub fn heading(self) -> &'static str {
        match self {
            Section::Introduction => "Introduction",
            Section::IndustryTrends => "Industry Trends",
            Section::AiSolutions => "AI Solutions",
            Section::Analysis => "Analysis",
            Section::Conclusion => "Conclusion",
        }
    }
}

/// Report content keyed by section. Every key is always present; a section
/// that could not be produced is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedReport {
    pub introduction: String,
    pub industry_trends: String,
    pub ai_solutions: String,
    pub analysis: String,
    pub conclusion: String,
}

impl GeneratedReport {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Splits a raw completion into the five sections.
    pub fn from_completion(content: &str) -> Self {
        let mut report = Self::empty();
        for section in Section::ALL {
            *report.section_mut(section) = extract_section(content, section.heading());
        }
        report
    }

    pub fn section(&self, section: Section) -> &str {
        match section {
            Section::Introduction => &self.introduction,
            Section::IndustryTrends => &self.industry_trends,
            Section::AiSolutions => &self.ai_solutions,
            Section::Analysis => &self.analysis,
            Section::Conclusion => &self.conclusion,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut String {
        match section {
            Section::Introduction => &mut self.introduction,
            Section::IndustryTrends => &mut self.industry_trends,
            Section::AiSolutions => &mut self.ai_solutions,
            Section::Analysis => &mut self.analysis,
            Section::Conclusion => &mut self.conclusion,
        }
    }

    pub fn populated_sections(&self) -> usize {
        Section::ALL
            .iter()
            .filter(|s| !self.section(**s).is_empty())
            .count()
    }

    /// Keys of the sections the completion did not fill.
    pub fn missing_sections(&self) -> Vec<&'static str> {
        Section::ALL
            .iter()
            .filter(|s| self.section(**s).is_empty())
            .map(|s| s.key())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.populated_sections() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("answer {i}")).collect()
    }

    #[test]
    fn test_request_requires_exactly_three_answers() {
        let request = ReportRequest::new("Retail", answers(3)).unwrap();
        assert_eq!(request.answers[2], "answer 2");

        for n in [0, 2, 4] {
            let err = ReportRequest::new("Retail", answers(n)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{n} answers");
        }
    }

    #[test]
    fn test_request_keeps_values_verbatim() {
        let request = ReportRequest::new(
            "",
            vec!["  padded ".into(), "<b>".into(), String::new()],
        )
        .unwrap();
        assert_eq!(request.industry, "");
        assert_eq!(request.answers[0], "  padded ");
        assert_eq!(request.answers[1], "<b>");
    }

    #[test]
    fn test_empty_report_serializes_all_five_keys() {
        let value = serde_json::to_value(GeneratedReport::empty()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 5);
        for section in Section::ALL {
            assert_eq!(object[section.key()], "");
        }
    }

    #[test]
    fn test_from_completion_populates_sections() {
        let content = "**Introduction** Intro text\n\
            **Industry Trends** Trends text\n\
            **AI Solutions** Solutions text\n\
            **Analysis** Analysis text\n\
            **Conclusion** Closing text";
        let report = GeneratedReport::from_completion(content);

        assert_eq!(report.introduction, "Intro text");
        assert_eq!(report.industry_trends, "Trends text");
        assert_eq!(report.ai_solutions, "Solutions text");
        assert_eq!(report.analysis, "Analysis text");
        assert_eq!(report.conclusion, "Closing text");
        assert_eq!(report.populated_sections(), 5);
    }

    #[test]
    fn test_from_completion_partial() {
        let report = GeneratedReport::from_completion("**Conclusion** Only this.");

        assert_eq!(report.conclusion, "Only this.");
        assert_eq!(report.introduction, "");
        assert_eq!(report.populated_sections(), 1);
        assert!(!report.is_empty());
        assert_eq!(
            report.missing_sections(),
            vec!["introduction", "industry_trends", "ai_solutions", "analysis"]
        );
    }

    #[test]
    fn test_section_keys_and_headings() {
        let keys: Vec<_> = Section::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(
            keys,
            vec![
                "introduction",
                "industry_trends",
                "ai_solutions",
                "analysis",
                "conclusion"
            ]
        );
        assert_eq!(Section::AiSolutions.heading(), "AI Solutions");
    }
}
