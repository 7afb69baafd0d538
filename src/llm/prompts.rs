//! Prompt templates for query rewriting and answering

/// A piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Var(String),
}

/// Template with `{{name}}` placeholders, parsed once at construction.
///
/// Rendering is single-pass: substituted values are never scanned for
/// placeholders, so retrieved text containing `{{question}}` stays literal.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        let segments = parse_segments(&template.into());
        let mut variables: Vec<String> = Vec::new();
        for segment in &segments {
            if let Segment::Var(name) = segment {
                if !variables.contains(name) {
                    variables.push(name.clone());
                }
            }
        }
        Self {
            segments,
            variables,
        }
    }

    /// Render from `(name, value)` pairs; unknown placeholders are kept as written
    #[must_use]
    pub fn format(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Var(name) => match values.iter().find(|(k, _)| *k == name.as_str()) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                },
            }
        }
        out
    }

    /// Placeholder names in order of first appearance
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

fn parse_segments(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        let name = &after_open[..close];
        // `{{` followed by anything but a bare identifier is literal text
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            segments.push(Segment::Text(rest[..open + 2].to_string()));
            rest = after_open;
            continue;
        }
        if open > 0 {
            segments.push(Segment::Text(rest[..open].to_string()));
        }
        segments.push(Segment::Var(name.to_string()));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    segments
}

/// Marker the rewrite model emits for requests that are not about coding
pub const NOT_CODING_MARKER: &str = "I don't know.";

/// Standard prompt templates
pub struct DocPrompts;

impl DocPrompts {
    /// Rewrite one request into documentation-seeking questions, one per line
    #[must_use]
    pub fn multi_query() -> PromptTemplate {
        PromptTemplate::new(
            r#"You are an AI language model assistant specialized in software development and programming. Your task is to generate five detailed and specific questions related to the given user request for coding. These questions should only request specifically the documentation needed to implement the request. Your goal is to ensure you have all the documentation that would aid in solving the task at hand. Provide these alternative questions separated by newlines. If the user's question is not coding related respond only with "I don't know".

Original user request: {{question}}"#,
        )
    }

    /// Answer a question from retrieved documentation
    #[must_use]
    pub fn context_qa() -> PromptTemplate {
        PromptTemplate::new(
            r"You are an expert programmer well-versed in the latest React documentation and development practices. Use the most current documentation and information provided in the context below to answer React-related questions. If the question cannot be directly answered with the given context, please attempt to provide a general answer based on your comprehensive understanding of React's most recent standards and practices. Should a question be unanswerable even with this approach, kindly explain the necessity of additional context or documentation to provide a specific answer. Additionally, when answering questions, if applicable, elaborate on your answers by providing explanations, examples, or reasoning to ensure clarity and depth of understanding.

Context:

{{context}}

---

Question: {{question}}

Answer: ",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_in_first_appearance_order() {
        let template = PromptTemplate::new("{{question}} about {{topic}}, again {{question}}");
        assert_eq!(template.variables(), &["question", "topic"]);
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let template = PromptTemplate::new("Context: {{context}}\nQ: {{question}}");
        let prompt = template.format(&[("context", "see {{question}}"), ("question", "why?")]);
        assert_eq!(prompt, "Context: see {{question}}\nQ: why?");
    }

    #[test]
    fn test_jsx_braces_are_literal() {
        let template = PromptTemplate::new("<div style={{ color: 'red' }}>{{name}}</div>");
        assert_eq!(template.variables(), &["name"]);
        assert_eq!(
            template.format(&[("name", "hi")]),
            "<div style={{ color: 'red' }}>hi</div>"
        );
    }

    #[test]
    fn test_missing_value_left_in_place() {
        let template = PromptTemplate::new("{{a}} and {{b}}");
        assert_eq!(template.format(&[("a", "x")]), "x and {{b}}");
    }

    #[test]
    fn test_context_qa_layout() {
        let prompt =
            DocPrompts::context_qa().format(&[("context", "useState docs"), ("question", "How?")]);
        assert!(prompt.contains("Context:\n\nuseState docs\n\n---\n\nQuestion: How?"));
        assert!(prompt.ends_with("Answer: "));
    }

    #[test]
    fn test_multi_query_asks_for_marker() {
        let template = DocPrompts::multi_query();
        assert!(NOT_CODING_MARKER.starts_with("I don't know"));
        assert_eq!(template.variables(), &["question"]);
        assert!(template
            .format(&[("question", "build a modal")])
            .ends_with("Original user request: build a modal"));
    }
}
