//! Summary prompt.

const SUMMARY_TEMPLATE: &str = "You are an advanced summarization model. Your task is to provide a concise \
summary of the given document. The summary must not exceed {max_length} characters, \
while staying clear and relevant. Avoid unnecessary details and do not repeat information. \
If needed, keep only the most critical points so the summary fits the character limit.\n\n\
Document:\n{document}\n\n\
Summary (max {max_length} characters):";

/// The template with the length limit filled in and `{document}` left as a placeholder.
///
/// This is the form recorded in each analysis result.
pub fn summary_template(max_length: usize) -> String {
    SUMMARY_TEMPLATE.replace("{max_length}", &max_length.to_string())
}

/// The full prompt sent to the provider.
pub fn render_summary_prompt(document: &str, max_length: usize) -> String {
    // Fill the limit first so text inside the document is never substituted.
    summary_template(max_length).replace("{document}", document)
}
