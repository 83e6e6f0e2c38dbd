use tl::{HTMLTag, Node, Parser};

/// Result of analyzing an element's direct content.
#[derive(Debug, Clone, Default)]
pub struct ContentAnalysis {
    /// Concatenation of all text-node contents, for whitespace extraction.
    pub text: String,
    /// True if any non-whitespace text node's content is not matched by
    /// the text-ignore predicate (e.g. interpolation markers).
    pub has_text: bool,
    /// True if the element has any child element.
    pub has_elements: bool,
}

pub fn analyze(
    tag: &HTMLTag<'_>,
    parser: &Parser<'_>,
    text_ignore: &dyn Fn(&str) -> bool,
) -> ContentAnalysis {
    let mut analysis = ContentAnalysis::default();

    for handle in tag.children().top().iter() {
        let Some(node) = handle.get(parser) else {
            continue;
        };
        match node {
            Node::Raw(bytes) => {
                let text = bytes.as_utf8_str();
                if !text_ignore(&text) {
                    analysis.text.push_str(&text);
                    if !text.trim().is_empty() {
                        analysis.has_text = true;
                    }
                }
            }
            Node::Tag(_) => {
                analysis.has_elements = true;
            }
            Node::Comment(_) => {}
        }
    }

    analysis
}
