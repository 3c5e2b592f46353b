/// Firm named in the call-to-action, both in the prompt and the rendered page.
pub const CONSULTANCY_NAME: &str = "AI Insights Consulting";

/// Output skeleton the model is asked to follow. The bold headings requested
/// above it are what `extract_section` anchors on, so the two must stay in step.
const HTML_SKELETON: &str = r#"<body>
    <header>
        <img src="{{ logo_url }}" alt="AI Insights Consulting">
        <h1>AI Insights Report</h1>
    </header>

    <div class="container">
        <section>
            <h2>Introduction</h2>
            <p>{{ introduction }}</p>
        </section>

        <section>
            <h2>Industry Trends</h2>
            <p>{{ industry_trends }}</p>
        </section>

        <section>
            <h2>AI Solutions</h2>
            <p>{{ ai_solutions }}</p>
        </section>

        <section>
            <h2>Analysis</h2>
            <p>{{ analysis }}</p>
        </section>

        <section>
            <h2>Conclusion</h2>
            <p>{{ conclusion }}</p>
        </section>

        <section class="cta">
            <h2>Ready to Implement AI in Your Business?</h2>
            <p>Contact AI Insights Consulting for expert guidance on how AI can transform your business. Let us help you stay ahead of the competition with cutting-edge AI solutions.</p>
            <a href="mailto:{{ contact_email }}">Contact Us Today</a>
        </section>
    </div>

    <footer>
        <p>AI Insights Consulting | All Rights Reserved &copy; {{ current_year }}</p>
    </footer>
</body>"#;

/// Renders the instruction sent to the model. Pure; the industry and answers
/// are interpolated verbatim.
pub fn build_prompt(industry: &str, answers: &[String; 3]) -> String {
    let [data_challenges, integration_gaps, long_term_goals] = answers;

    format!(
        "You are an AI consultant preparing a comprehensive report for a business owner in the {industry} industry. \
The report must be detailed, insightful, and structured into the following sections:

1. **Introduction**: Provide a brief overview of the business's context based on the industry.
2. **Industry Trends**: Provide the latest AI trends in the {industry} industry.
3. **AI Solutions**: Offer AI-driven solutions for the following business needs:
    - Current data management and utilization challenges: {data_challenges}
    - Areas of technology integration and inefficiency: {integration_gaps}
    - Long-term business goals and AI's role in achieving them: {long_term_goals}
4. **Analysis and Recommendations**:
    - Include a detailed analysis of how AI can address the specific challenges mentioned.
    - Offer actionable recommendations for AI implementation.
5. **Conclusion**: Summarize the key insights and recommend next steps.

Ensure the report is structured professionally, with clear headings and well-organized content. \
Also, include a call-to-action encouraging the business owner to engage with {CONSULTANCY_NAME} for further AI consulting services.

The report should be in the following format embedded in HTML code with the brackets filled in with the appropriate content:

## Format
```
{HTML_SKELETON}
```
"
    )
}
