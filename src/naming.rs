//! The `NNN-name` convention shared by album directories, group directories
//! and photo filenames.
//!
//! The optional numeric prefix orders entries and becomes the Hugo `weight`.
//! The name after the prefix becomes the display title, with dashes turned
//! into spaces:
//!
//! - `020-My-Best-Photos/` → weight 20, "My Best Photos"
//! - `001-Old-Harbour.jpg` → weight 1, "Old Harbour"
//! - `wip-drafts/` → no weight, "wip drafts"

/// A parsed entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Number prefix, if the name starts with digits followed by `-` (or is all digits).
    pub number: Option<u32>,
    /// Raw name after the prefix, dashes preserved. Empty for `001` and `001-`.
    pub name: String,
    /// `name` with dashes replaced by spaces.
    pub display_title: String,
}

impl ParsedName {
    /// Sort key placing numbered entries first (by number), then unnumbered ones.
    ///
    /// Ties and unnumbered entries are broken by the raw name.
    pub fn sort_key(&self) -> (u32, String) {
        (self.number.unwrap_or(u32::MAX), self.name.to_lowercase())
    }
}

/// Parse an entry name (directory name or file stem).
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some((prefix, rest)) = name.split_once('-')
        && let Ok(num) = prefix.parse::<u32>()
    {
        return ParsedName {
            number: Some(num),
            name: rest.to_string(),
            display_title: rest.replace('-', " "),
        };
    }
    if let Ok(num) = name.parse::<u32>() {
        return ParsedName {
            number: Some(num),
            name: String::new(),
            display_title: String::new(),
        };
    }
    ParsedName {
        number: None,
        name: name.to_string(),
        display_title: name.replace('-', " "),
    }
}
