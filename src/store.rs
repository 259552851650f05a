use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{error::StoreError, model::Block, settings::AppSettings};

/// `AppSettings` as JSON. A missing or blank file means defaults.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<AppSettings, StoreError> {
        match read_optional(&self.path)? {
            Some(raw) => parse(&self.path, &raw),
            None => Ok(AppSettings::default()),
        }
    }

    pub fn save(&self, settings: &AppSettings) -> Result<(), StoreError> {
        write_json(&self.path, settings)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BlockFile {
    #[serde(default)]
    blocks: BTreeMap<String, Vec<String>>,
}

/// Named text blocks persisted as one JSON file.
///
/// Nothing is cached: every read goes back to disk and every mutation
/// rewrites the whole file before returning.
pub struct BlockStore {
    path: PathBuf,
}

impl BlockStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block names in lexicographic order.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.blocks.into_keys().collect())
    }

    pub fn get(&self, name: &str) -> Result<Vec<String>, StoreError> {
        self.load()?
            .blocks
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    pub fn block(&self, name: &str) -> Result<Block, StoreError> {
        Ok(Block {
            name: name.to_string(),
            lines: self.get(name)?,
        })
    }

    /// Insert or overwrite `name`.
    pub fn put(&self, name: &str, lines: Vec<String>) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        let mut file = self.load()?;
        file.blocks.insert(name.to_string(), lines);
        self.persist(&file)?;
        log::info!("saved block '{name}'");
        Ok(())
    }

    /// Store `lines` under `name`, dropping `old_name` in the same write.
    pub fn rename(&self, old_name: &str, name: &str, lines: Vec<String>) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        let mut file = self.load()?;
        if file.blocks.remove(old_name).is_none() {
            return Err(StoreError::NotFound(old_name.to_string()));
        }
        file.blocks.insert(name.to_string(), lines);
        self.persist(&file)?;
        log::info!("renamed block '{old_name}' to '{name}'");
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let mut file = self.load()?;
        if file.blocks.remove(name).is_none() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        self.persist(&file)?;
        log::info!("removed block '{name}'");
        Ok(())
    }

    /// Create a block from editor text. Existing names are rejected.
    pub fn add(&self, name: &str, text: &str) -> Result<String, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.load()?.blocks.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        self.put(name, split_lines(text))?;
        Ok(name.to_string())
    }

    /// Save an edited block, renaming it when `name` differs from `old_name`.
    pub fn replace(&self, old_name: &str, name: &str, text: &str) -> Result<String, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        let file = self.load()?;
        if !file.blocks.contains_key(old_name) {
            return Err(StoreError::NotFound(old_name.to_string()));
        }
        if name != old_name && file.blocks.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }

        let lines = split_lines(text);
        if name == old_name {
            self.put(name, lines)?;
        } else {
            self.rename(old_name, name, lines)?;
        }
        Ok(name.to_string())
    }

    /// Block content as it appears in an editor field.
    pub fn edit_text(&self, name: &str) -> Result<String, StoreError> {
        Ok(self.get(name)?.join("\n"))
    }

    fn load(&self) -> Result<BlockFile, StoreError> {
        match read_optional(&self.path)? {
            Some(raw) => parse(&self.path, &raw),
            None => Ok(BlockFile::default()),
        }
    }

    fn persist(&self, file: &BlockFile) -> Result<(), StoreError> {
        write_json(&self.path, file)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    Ok((!raw.trim().is_empty()).then_some(raw))
}

fn parse<T: DeserializeOwned>(path: &Path, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Parse {
        path: path.display().to_string(),
        source,
    })
}

// Temp file + rename so a crash never leaves a half-written file behind.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| io_error(path, source))?;
        }
    }
    let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let mut tmp = path.to_path_buf().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut out = File::create(&tmp).map_err(|source| io_error(path, source))?;
    out.write_all(content.as_bytes())
        .and_then(|_| out.sync_all())
        .map_err(|source| io_error(path, source))?;
    drop(out);
    fs::rename(&tmp, path).map_err(|source| io_error(path, source))
}

/// Line boundaries recognised in editor text: `\n`, `\r`, `\r\n`, vertical tab,
/// form feed, the file/group/record separators, NEL and the Unicode line and
/// paragraph separators.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split editor text into lines. `\r\n` counts as one break, a trailing break
/// does not produce an empty last line, and blank lines and whitespace are kept.
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            c if is_line_break(c) => lines.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
