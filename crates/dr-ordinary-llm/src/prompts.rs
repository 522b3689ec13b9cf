//! Page analysis prompts for the drug extraction agent.

/// Characters of page content embedded in one prompt.
pub const PROMPT_CONTENT_CAP: usize = 8000;

/// User prompt asking the agent for the drug names on a page.
pub fn make_page_analysis_prompt(url: &str, content: &str) -> String {
    let content = truncate_chars(content, PROMPT_CONTENT_CAP);
    format!(
        r#"Analyze this webpage content and identify any drug names mentioned.

URL: {url}
Content: {content}

Please identify all drug names (generic and brand names) mentioned in the content.

Respond with ONLY a JSON array of drug names, like this:
["drug1", "drug2", "drug3"]

If no drugs are found, respond with an empty array: []

Do not include any other text, just the JSON array."#
    )
}

fn truncate_chars(text: &str, cap: usize) -> &str {
    match text.char_indices().nth(cap) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_url_and_content() {
        let prompt = make_page_analysis_prompt("https://example.org/a", "Take aspirin daily");
        assert!(prompt.contains("URL: https://example.org/a"));
        assert!(prompt.contains("Content: Take aspirin daily"));
        assert!(prompt.contains(r#"["drug1", "drug2", "drug3"]"#));
    }

    #[test]
    fn test_prompt_caps_content() {
        let content = "é".repeat(PROMPT_CONTENT_CAP + 50);
        let prompt = make_page_analysis_prompt("u", &content);
        assert_eq!(prompt.matches('é').count(), PROMPT_CONTENT_CAP);
    }
}
