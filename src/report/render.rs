use askama::Template;
use chrono::Datelike;

use super::prompt::CONSULTANCY_NAME;
use super::{GeneratedReport, Section};
use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub industry: String,
    pub contact_email: String,
    pub logo_url: Option<String>,
    pub current_year: i32,
}

impl RenderOptions {
    pub fn new(industry: impl Into<String>, contact_email: impl Into<String>) -> Self {
        Self {
            industry: industry.into(),
            contact_email: contact_email.into(),
            logo_url: None,
            current_year: chrono::Utc::now().year(),
        }
    }
}

struct SectionView {
    heading: &'static str,
    paragraphs: Vec<String>,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    industry: &'a str,
    consultancy: &'a str,
    contact_email: &'a str,
    logo_url: Option<&'a str>,
    current_year: i32,
    sections: Vec<SectionView>,
}

/// Renders the report as a standalone HTML page. Section text is escaped;
/// blank lines in a section start a new paragraph.
pub fn render_html(report: &GeneratedReport, options: &RenderOptions) -> AppResult<String> {
    let sections = Section::ALL
        .iter()
        .map(|section| SectionView {
            heading: section.heading(),
            paragraphs: paragraphs(report.section(*section)),
        })
        .collect();

    let template = ReportTemplate {
        industry: &options.industry,
        consultancy: CONSULTANCY_NAME,
        contact_email: &options.contact_email,
        logo_url: options.logo_url.as_deref(),
        current_year: options.current_year,
        sections,
    };

    Ok(template.render()?)
}

fn paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> RenderOptions {
        RenderOptions {
            industry: "Retail".to_string(),
            contact_email: "hello@example.com".to_string(),
            logo_url: None,
            current_year: 2026,
        }
    }

    fn report() -> GeneratedReport {
        GeneratedReport {
            introduction: "Intro paragraph one.\n\nIntro paragraph two.".to_string(),
            industry_trends: "Trends".to_string(),
            ai_solutions: "Use <script>alert(1)</script> & more".to_string(),
            analysis: String::new(),
            conclusion: "Act now.".to_string(),
        }
    }

    #[test]
    fn test_renders_all_section_headings() {
        let html = render_html(&report(), &options()).unwrap();
        for section in Section::ALL {
            assert!(
                html.contains(&format!("<h2>{}</h2>", section.heading())),
                "{:?}",
                section
            );
        }
    }

    #[test]
    fn test_escapes_section_text() {
        let html = render_html(&report(), &options()).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_splits_paragraphs() {
        let html = render_html(&report(), &options()).unwrap();
        assert!(html.contains("<p>Intro paragraph one.</p>"));
        assert!(html.contains("<p>Intro paragraph two.</p>"));
    }

    #[test]
    fn test_footer_year_and_contact() {
        let html = render_html(&report(), &options()).unwrap();
        assert!(html.contains("All Rights Reserved &copy; 2026"));
        assert!(html.contains("mailto:hello@example.com"));
        assert!(html.contains("AI Insights Consulting"));
    }

    #[test]
    fn test_logo_only_when_configured() {
        let html = render_html(&report(), &options()).unwrap();
        assert!(!html.contains("<img"));

        let mut with_logo = options();
        with_logo.logo_url = Some("logo.png".to_string());
        let html = render_html(&report(), &with_logo).unwrap();
        assert!(html.contains("<img src=\"logo.png\""));
    }

    #[test]
    fn test_empty_report_still_renders() {
        let html = render_html(&GeneratedReport::empty(), &options()).unwrap();
        assert!(html.contains("<h1>AI Insights Report</h1>"));
    }

    #[test]
    fn test_new_uses_current_year() {
        let options = RenderOptions::new("Retail", "a@b.c");
        assert!(options.current_year >= 2024);
    }
}
