/// What to do when two extensions map to the same channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Append `_<hdu index>` to the later extension's name.
    #[default]
    Disambiguate,
    /// The later extension replaces the earlier one.
    Overwrite,
    /// Keep the earlier extension and report the later one.
    Reject,
}

/// Which catalogued extension supplies the image width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimarySelection {
    /// The first extension found while scanning the file.
    #[default]
    FirstScanned,
    /// The extension whose channel name sorts lowest.
    LowestChannel,
}

/// How image HDUs without an `EXTNAME` are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnnamedPolicy {
    #[default]
    Skip,
    /// Name them `PRIMARY` (HDU 1) or `HDU<index>`.
    Synthesize,
}

/// Longest string one header card can hold.
pub const DEFAULT_NAME_CAPACITY: usize = 68;

/// Tunables for cataloguing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    pub channel_suffix: String,
    pub duplicates: DuplicatePolicy,
    pub primary: PrimarySelection,
    pub unnamed: UnnamedPolicy,
    pub name_capacity: usize,
}

impl ReaderOptions {
    pub fn new() -> Self {
        ReaderOptions {
            channel_suffix: String::from("r"),
            duplicates: DuplicatePolicy::default(),
            primary: PrimarySelection::default(),
            unnamed: UnnamedPolicy::default(),
            name_capacity: DEFAULT_NAME_CAPACITY,
        }
    }

    pub fn with_channel_suffix(mut self, suffix: &str) -> Self {
        self.channel_suffix = suffix.to_string();
        self
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn with_primary(mut self, selection: PrimarySelection) -> Self {
        self.primary = selection;
        self
    }

    pub fn with_unnamed(mut self, policy: UnnamedPolicy) -> Self {
        self.unnamed = policy;
        self
    }

    pub fn with_name_capacity(mut self, capacity: usize) -> Self {
        self.name_capacity = capacity;
        self
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self::new()
    }
}
