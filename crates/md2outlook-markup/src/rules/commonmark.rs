//! Rules shared by both dialects.
//!
//! The dialect tables in [`markdown`](super::markdown) and [`wiki`](super::wiki)
//! start from this set and register their own rules on top, so anything a
//! dialect redefines here is shadowed by the later registration.

use super::list::{list, list_item};
use super::{Filter, Rule, Rules};
use crate::context::RenderContext;
use crate::node::NodeRef;
use crate::options::{CodeBlockStyle, HeadingStyle, LinkReferenceStyle, LinkStyle};
use crate::utilities::{clean_attribute, repeat};

/// Create the shared rule set
pub fn commonmark_rules() -> Rules {
    let mut rules = Rules::new();
    rules.add("paragraph", paragraph_rule());
    rules.add("lineBreak", line_break_rule());
    rules.add("heading", heading_rule());
    rules.add("blockquote", blockquote_rule());
    rules.add("list", Rule::for_tags(&["ul", "ol"], list));
    rules.add("listItem", Rule::for_tag("li", list_item));
    rules.add("codeBlock", code_block_rule());
    rules.add("horizontalRule", horizontal_rule());
    rules.add("link", link_rule());
    rules.add("emphasis", emphasis_rule());
    rules.add("strong", strong_rule());
    rules.add("code", code_rule());
    rules.add("image", image_rule());
    rules.add("remove", remove_rule());
    rules
}

fn paragraph_rule() -> Rule {
    Rule::for_tag("p", |_, content, _| format!("\n\n{}\n\n", content.trim()))
}

fn line_break_rule() -> Rule {
    Rule::for_tag("br", |_, _, _| "  \n".to_string())
}

fn heading_rule() -> Rule {
    Rule::new(
        Filter::tags(&["h1", "h2", "h3", "h4", "h5", "h6"]),
        |node, content, ctx| {
            let level = heading_level(node);

            let content = content.trim();
            if content.is_empty() {
                return String::new();
            }

            match ctx.options.heading_style {
                HeadingStyle::Setext if level <= 2 => {
                    let underline = if level == 1 { "=" } else { "-" };
                    format!(
                        "\n\n{}\n{}\n\n",
                        content,
                        repeat(underline, content.chars().count())
                    )
                }
                _ => format!("\n\n{} {}\n\n", repeat("#", level), content),
            }
        },
    )
}

/// 1 to 6, from the `hN` tag name
pub(super) fn heading_level(node: &NodeRef) -> usize {
    node.tag_name()
        .get(1..)
        .and_then(|n| n.parse().ok())
        .unwrap_or(1)
}

fn blockquote_rule() -> Rule {
    Rule::for_tag("blockquote", |_, content, _| {
        let content = content.trim();
        if content.is_empty() {
            return String::new();
        }
        let quoted: Vec<String> = content
            .lines()
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {}", line)
                }
            })
            .collect();
        format!("\n\n{}\n\n", quoted.join("\n"))
    })
}

/// Language named by a `language-xxx` class on the block or its `code` child
pub fn code_language<'a>(node: &NodeRef<'a>) -> Option<&'a str> {
    let from_class = |class: Option<&'a str>| {
        class?
            .split_whitespace()
            .find_map(|c| c.strip_prefix("language-"))
            .filter(|lang| !lang.is_empty())
    };
    node.element_children()
        .find(|c| c.tag_name() == "code")
        .and_then(|code| from_class(code.attr("class")))
        .or_else(|| from_class(node.attr("class")))
}

fn code_block_rule() -> Rule {
    Rule::for_tag("pre", |node, content, ctx| {
        let code = content.trim_end_matches('\n');
        match ctx.options.code_block_style {
            CodeBlockStyle::Indented => {
                let indented: Vec<String> =
                    code.lines().map(|line| format!("    {}", line)).collect();
                format!("\n\n{}\n\n", indented.join("\n"))
            }
            CodeBlockStyle::Fenced => {
                let language = code_language(node).unwrap_or("");
                let fence = fence_for(code, &ctx.options.fence);
                format!("\n\n{}{}\n{}\n{}\n\n", fence, language, code, fence)
            }
        }
    })
    .verbatim()
}

/// Lengthen the fence until no line of the code starts with it
fn fence_for(code: &str, fence: &str) -> String {
    let mut fence = fence.to_string();
    let Some(fence_char) = fence.chars().next() else {
        return fence;
    };
    while code.lines().any(|line| line.trim_start().starts_with(&fence)) {
        fence.push(fence_char);
    }
    fence
}

fn horizontal_rule() -> Rule {
    Rule::for_tag("hr", |_, _, ctx| format!("\n\n{}\n\n", ctx.options.hr))
}

fn link_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| tag == "a" && node.has_attr("href")),
        link,
    )
}

/// `[text](href "title")`, or a reference link when the options ask for one
pub(super) fn link(node: &NodeRef, content: &str, ctx: &mut RenderContext) -> String {
    let href = clean_attribute(node.attr("href"));
    if href.is_empty() {
        return content.to_string();
    }
    let title = node
        .attr("title")
        .filter(|t| !t.is_empty())
        .map(|t| format!(" \"{}\"", t.replace('"', "\\\"")))
        .unwrap_or_default();

    match ctx.options.link_style {
        LinkStyle::Inlined => format!("[{}]({}{})", content, href, title),
        LinkStyle::Referenced => match ctx.options.link_reference_style {
            LinkReferenceStyle::Full => {
                let id = ctx.references_len() + 1;
                ctx.add_reference(format!("[{}]: {}{}", id, href, title));
                format!("[{}][{}]", content, id)
            }
            LinkReferenceStyle::Collapsed => {
                ctx.add_reference(format!("[{}]: {}{}", content, href, title));
                format!("[{}][]", content)
            }
            LinkReferenceStyle::Shortcut => {
                ctx.add_reference(format!("[{}]: {}{}", content, href, title));
                format!("[{}]", content)
            }
        },
    }
}

/// Wrap inline content in a delimiter, keeping surrounding whitespace outside
pub(super) fn delimit(content: &str, delimiter: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return content.to_string();
    }
    let leading = &content[..content.len() - content.trim_start().len()];
    let trailing = &content[content.trim_end().len()..];
    format!("{}{}{}{}{}", leading, delimiter, trimmed, delimiter, trailing)
}

fn emphasis_rule() -> Rule {
    Rule::for_tags(&["em", "i"], |_, content, ctx| {
        delimit(content, &ctx.options.em_delimiter)
    })
}

fn strong_rule() -> Rule {
    Rule::for_tags(&["strong", "b"], |_, content, ctx| {
        delimit(content, &ctx.options.strong_delimiter)
    })
}

fn code_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| tag == "code" && node.parent_tag() != Some("pre")),
        |_, content, _| code_span(content),
    )
    .verbatim()
}

/// Backtick span fenced by one more backtick than the longest run inside
pub(super) fn code_span(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let longest_run = content
        .chars()
        .fold((0, 0), |(max, current), c| {
            if c == '`' {
                (max.max(current + 1), current + 1)
            } else {
                (max, 0)
            }
        })
        .0;
    let backticks = "`".repeat(longest_run + 1);

    if content.starts_with('`') || content.ends_with('`') {
        format!("{} {} {}", backticks, content, backticks)
    } else {
        format!("{}{}{}", backticks, content, backticks)
    }
}

fn image_rule() -> Rule {
    Rule::for_tag("img", |node, _, _| {
        let alt = clean_attribute(node.attr("alt"));
        let src = clean_attribute(node.attr("src"));
        if src.is_empty() {
            return String::new();
        }
        let title = node
            .attr("title")
            .filter(|t| !t.is_empty())
            .map(|t| format!(" \"{}\"", t))
            .unwrap_or_default();
        format!("![{}]({}{})", alt, src, title)
    })
}

/// Document metadata and scripting carry no text
fn remove_rule() -> Rule {
    Rule::for_tags(&["head", "style", "script", "meta", "title", "link"], |_, _, _| {
        String::new()
    })
    .verbatim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimit_keeps_outer_whitespace() {
        assert_eq!(delimit(" bold ", "**"), " **bold** ");
        assert_eq!(delimit("x", "_"), "_x_");
        assert_eq!(delimit("  ", "*"), "  ");
    }

    #[test]
    fn test_code_span_backticks() {
        assert_eq!(code_span("code"), "`code`");
        assert_eq!(code_span("a ` b"), "``a ` b``");
        assert_eq!(code_span("`tick"), "`` `tick ``");
        assert_eq!(code_span(""), "");
    }

    #[test]
    fn test_fence_grows_past_inner_fence() {
        assert_eq!(fence_for("plain", "```"), "```");
        assert_eq!(fence_for("```\nnested\n```", "```"), "````");
    }

    #[test]
    fn test_shared_rules_registered() {
        let rules = commonmark_rules();
        assert!(rules.keys().any(|k| k == "codeBlock"));
        assert!(rules.keys().any(|k| k == "remove"));
    }
}
