use std::path::PathBuf;

/// One searchable text property. A virtual property (spec GLOSSARY) is
/// configured the same way -- the core only ever sees a name and a pool
/// size, never how the caller derived its tokens.
#[derive(Debug, Clone)]
pub struct PropertyConfig {
    pub name: String,
    /// Bytes budgeted per pool; converted into a block count at
    /// construction time (see `pool::segment_pool`).
    pub pool_size: usize,
}

impl PropertyConfig {
    pub fn new(name: impl Into<String>, pool_size: usize) -> Self {
        PropertyConfig {
            name: name.into(),
            pool_size,
        }
    }
}

/// Recognized configuration options (spec EXTERNAL INTERFACES).
#[derive(Debug, Clone)]
pub struct Config {
    pub properties: Vec<PropertyConfig>,
    pub virtual_properties: Vec<PropertyConfig>,
    /// Max pools a property may allocate before further writes fail hard.
    pub pool_count: u32,
    pub reverse: bool,
    /// Tokenizer dictionary location -- opaque to the core.
    pub token_path: Option<PathBuf>,
    pub index_file_path: PathBuf,
    /// Suppresses internal tokenizer construction: the host supplies
    /// tokens directly instead of raw text.
    pub has_attr_token: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            properties: Vec::new(),
            virtual_properties: Vec::new(),
            pool_count: 64,
            reverse: false,
            token_path: None,
            index_file_path: PathBuf::from("./zambezi_index"),
            has_attr_token: false,
        }
    }
}
