//! Rendering options and configuration.

/// Options for flattening a document to text.
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// Include tables as textified rows.
    pub include_tables: bool,

    /// Include image/figure captions.
    pub include_images: bool,
}

impl FlattenOptions {
    /// Create new flatten options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable table inclusion.
    pub fn with_tables(mut self, include: bool) -> Self {
        self.include_tables = include;
        self
    }

    /// Enable or disable image caption inclusion.
    pub fn with_images(mut self, include: bool) -> Self {
        self.include_images = include;
        self
    }
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            include_tables: true,
            include_images: false,
        }
    }
}
