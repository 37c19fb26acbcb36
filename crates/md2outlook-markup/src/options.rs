//! Configuration options for tree-to-markup conversion

/// Heading style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStyle {
    /// Use setext-style headings (underlined with = or -)
    /// Only works for h1 and h2, falls back to ATX for h3-h6
    Setext,
    /// Use ATX-style headings (prefixed with #)
    #[default]
    Atx,
}

/// Code block style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeBlockStyle {
    /// Use indented code blocks (4 spaces)
    Indented,
    /// Use fenced code blocks (```)
    #[default]
    Fenced,
}

/// How nested lists are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStyle {
    /// Nesting depth encoded as a run of markers on each line (`** item`)
    #[default]
    MarkerRun,
    /// `* item` with nested lists indented under the item's content
    Indented,
}

/// Link style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStyle {
    /// Use inline links [text](url)
    #[default]
    Inlined,
    /// Use reference links [text][ref]
    Referenced,
}

/// Reference style for referenced links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkReferenceStyle {
    /// Full reference: [text][label]
    #[default]
    Full,
    /// Collapsed reference: [text][]
    Collapsed,
    /// Shortcut reference: [text]
    Shortcut,
}

/// Options for one conversion call. Never mutated while rendering.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Heading style (setext or atx)
    pub heading_style: HeadingStyle,

    /// Horizontal rule string
    pub hr: String,

    /// Bullet list marker
    pub bullet_list_marker: char,

    /// Marker for ordered list items in marker-run lists
    pub ordered_list_marker: char,

    /// Nested list layout
    pub list_style: ListStyle,

    /// Code block style
    pub code_block_style: CodeBlockStyle,

    /// Fence string for fenced code blocks
    pub fence: String,

    /// Emphasis delimiter
    pub em_delimiter: String,

    /// Strong delimiter
    pub strong_delimiter: String,

    /// Link style
    pub link_style: LinkStyle,

    /// Reference style for referenced links
    pub link_reference_style: LinkReferenceStyle,
}

impl RenderOptions {
    /// Markdown output as produced by the paste path
    pub fn markdown() -> Self {
        Self {
            heading_style: HeadingStyle::Atx,
            hr: "---".to_string(),
            bullet_list_marker: '*',
            ordered_list_marker: '#',
            list_style: ListStyle::MarkerRun,
            code_block_style: CodeBlockStyle::Fenced,
            fence: "```".to_string(),
            em_delimiter: "*".to_string(),
            strong_delimiter: "**".to_string(),
            link_style: LinkStyle::Inlined,
            link_reference_style: LinkReferenceStyle::Full,
        }
    }

    /// Wiki markup output
    pub fn wiki() -> Self {
        Self {
            heading_style: HeadingStyle::Atx,
            hr: "----".to_string(),
            bullet_list_marker: '*',
            ordered_list_marker: '#',
            list_style: ListStyle::MarkerRun,
            code_block_style: CodeBlockStyle::Fenced,
            fence: "```".to_string(),
            em_delimiter: "_".to_string(),
            strong_delimiter: "*".to_string(),
            link_style: LinkStyle::Inlined,
            link_reference_style: LinkReferenceStyle::Full,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::markdown()
    }
}
