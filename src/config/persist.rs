//! Configuration persistence using toml_edit to preserve formatting and comments.

use super::Config;
use anyhow::{Context, Result};
use std::path::Path;
use toml_edit::{DocumentMut, Item, Table};

/// Save the config to a TOML file.
///
/// An existing file is updated in place: comments and key order survive,
/// values are replaced, and keys the config no longer sets are removed.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let new_content = toml::to_string_pretty(config).with_context(|| "Failed to serialize config")?;
    let new_doc: DocumentMut = new_content
        .parse()
        .with_context(|| "Failed to parse serialized config")?;

    let mut doc = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        content
            .parse::<DocumentMut>()
            .with_context(|| format!("Failed to parse config file: {:?}", path))?
    } else {
        DocumentMut::new()
    };

    merge_table(doc.as_table_mut(), new_doc.as_table());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

fn merge_table(dst: &mut Table, src: &Table) {
    let stale: Vec<String> = dst
        .iter()
        .map(|(key, _)| key.to_string())
        .filter(|key| !src.contains_key(key))
        .collect();
    for key in stale {
        dst.remove(&key);
    }

    for (key, item) in src.iter() {
        match (dst.get_mut(key), item) {
            (Some(Item::Table(existing)), Item::Table(updated)) => merge_table(existing, updated),
            (Some(Item::Value(existing)), Item::Value(updated)) => {
                let decor = existing.decor().clone();
                *existing = updated.clone();
                *existing.decor_mut() = decor;
            }
            _ => {
                dst.insert(key, item.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_save_new_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.scan.source_dir = Some(PathBuf::from("/media/in"));
        config.merge.max_workers = 3;

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_save_preserves_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "# avmerge settings\n\n[merge]\n# keep this small on laptops\nmax_workers = 4\n",
        )
        .unwrap();

        let mut config = load_config(&path).unwrap();
        config.merge.max_workers = 1;
        save_config(&path, &config).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("# avmerge settings"));
        assert!(written.contains("# keep this small on laptops"));
        assert!(written.contains("max_workers = 1"));
        assert_eq!(load_config(&path).unwrap().merge.max_workers, 1);
    }

    #[test]
    fn test_save_removes_unset_options() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scan]\nsource_dir = \"/old\"\n").unwrap();

        save_config(&path, &Config::default()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("source_dir"));
        assert_eq!(load_config(&path).unwrap(), Config::default());
    }
}
