//! Per-document parse and serialization settings.

/// Settings consulted by the tree builder and serializer.
///
/// Built fluently:
///
/// ```
/// use domforge::Configuration;
///
/// let config = Configuration::new()
///     .lowercase(false)
///     .default_br_text("\r\n");
/// assert!(!config.is_lowercase());
/// ```
#[derive(Debug, Clone)]
pub struct Configuration {
    target_charset: String,
    lowercase: bool,
    force_tags_closed: bool,
    remove_line_breaks: bool,
    default_br_text: String,
    default_span_text: String,
    self_closing_tags: Option<Vec<String>>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            target_charset: "UTF-8".to_string(),
            lowercase: true,
            force_tags_closed: true,
            remove_line_breaks: true,
            default_br_text: "\n".to_string(),
            default_span_text: " ".to_string(),
            self_closing_tags: None,
        }
    }
}

impl Configuration {
    /// The default configuration.
    #[must_use]
    pub fn new() -> Self {
        Configuration::default()
    }

    /// Charset that file output is encoded to (default `"UTF-8"`).
    #[must_use]
    pub fn target_charset(&self) -> &str {
        &self.target_charset
    }

    /// Set the output charset.
    #[must_use]
    pub fn with_target_charset(mut self, charset: impl Into<String>) -> Self {
        self.target_charset = charset.into();
        self
    }

    /// Whether tag and attribute names are folded to lower case at parse
    /// time (default `true`).
    #[must_use]
    pub fn is_lowercase(&self) -> bool {
        self.lowercase
    }

    /// Set lower-case folding of tag and attribute names.
    #[must_use]
    pub fn lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Whether implicit-close recovery for optional-closing tags is active
    /// (default `true`). When off, every tag must be closed explicitly to
    /// nest.
    #[must_use]
    pub fn is_force_tags_closed(&self) -> bool {
        self.force_tags_closed
    }

    /// Set implicit-close recovery.
    #[must_use]
    pub fn force_tags_closed(mut self, force: bool) -> Self {
        self.force_tags_closed = force;
        self
    }

    /// Whether carriage returns and line feeds in the input are replaced
    /// by spaces before parsing (default `true`). Script content extracted
    /// ahead of this step keeps its line breaks either way.
    #[must_use]
    pub fn should_remove_line_breaks(&self) -> bool {
        self.remove_line_breaks
    }

    /// Set line-break removal.
    #[must_use]
    pub fn remove_line_breaks(mut self, remove: bool) -> Self {
        self.remove_line_breaks = remove;
        self
    }

    /// Text a `<br>` contributes to plain-text extraction (default `"\n"`).
    #[must_use]
    pub fn get_default_br_text(&self) -> &str {
        &self.default_br_text
    }

    /// Set the `<br>` replacement text.
    #[must_use]
    pub fn default_br_text(mut self, text: impl Into<String>) -> Self {
        self.default_br_text = text.into();
        self
    }

    /// Separator appended after a `<span>`'s content in plain-text
    /// extraction (default `" "`).
    #[must_use]
    pub fn get_default_span_text(&self) -> &str {
        &self.default_span_text
    }

    /// Set the `<span>` separator text.
    #[must_use]
    pub fn default_span_text(mut self, text: impl Into<String>) -> Self {
        self.default_span_text = text.into();
        self
    }

    /// Extra tag names to register as void before parsing, if any.
    #[must_use]
    pub fn get_self_closing_tags(&self) -> Option<&[String]> {
        self.self_closing_tags.as_deref()
    }

    /// Replace the extra void-tag list.
    #[must_use]
    pub fn self_closing_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.self_closing_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Append to the extra void-tag list.
    #[must_use]
    pub fn add_self_closing_tags(
        mut self,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.self_closing_tags
            .get_or_insert_with(Vec::new)
            .extend(tags.into_iter().map(Into::into));
        self
    }
}
