//! Save file command handlers

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use dungeons::{crypto, EquipmentSlot, SaveDocument, Session, INVENTORY_CAPACITY};

use crate::config::Config;
use crate::file_io::{read_input, write_output};

/// Character edits requested on the command line
#[derive(Debug, Default)]
pub struct Edits {
    pub level: Option<f64>,
    pub xp: Option<i64>,
    pub currency: Vec<String>,
}

impl Edits {
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.xp.is_none() && self.currency.is_empty()
    }
}

/// Load and decrypt a save, with the path in any error
pub fn load(input: &Path) -> Result<Session> {
    Session::load(input).with_context(|| format!("Failed to load {}", input.display()))
}

/// Whether a write should back up first, from config and a per-command override
pub fn backup_enabled(no_backup: bool) -> Result<bool> {
    Ok(!no_backup && Config::load()?.backup)
}

/// Write a session back to the file it came from
pub fn write_session(session: &Session, backup: bool) -> Result<()> {
    let path = session.path();
    if backup {
        let backup_path = session
            .save()
            .with_context(|| format!("Failed to save {}", path.display()))?;
        eprintln!("Backup written to {}", backup_path.display());
    } else {
        let bytes = session
            .document()
            .to_bytes()
            .context("Failed to encode save file")?;
        dungeons::write_atomic(path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Handle `save decrypt` command
pub fn decrypt(input: &Path, output: Option<&Path>, pretty: bool) -> Result<()> {
    let encrypted =
        fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let text = crypto::decode_save(&encrypted).context("Failed to decrypt save file")?;

    let text = if pretty {
        let value: serde_json::Value =
            serde_json::from_str(&text).context("Decrypted save is not valid JSON")?;
        serde_json::to_string_pretty(&value)?
    } else {
        text
    };

    write_output(output, text.as_bytes())
}

/// Handle `save encrypt` command
pub fn encrypt(output: &Path, json: Option<&Path>) -> Result<()> {
    let data = read_input(json)?;
    let text = String::from_utf8(data).context("Input is not valid UTF-8")?;

    SaveDocument::from_json(&text).context("Input is not a valid save document")?;

    let encrypted = crypto::encode_save(text.trim_end()).context("Failed to encrypt JSON")?;
    fs::write(output, &encrypted)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

/// Parse a `TYPE=COUNT` currency argument
fn parse_currency(arg: &str) -> Result<(&str, u64)> {
    let (name, count) = arg
        .split_once('=')
        .with_context(|| format!("Expected TYPE=COUNT, got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Currency type is empty in '{}'", arg);
    }
    let count = count
        .trim()
        .parse()
        .with_context(|| format!("Invalid currency count in '{}'", arg))?;
    Ok((name, count))
}

/// Apply command-line edits to a document
pub fn apply_edits(document: &mut SaveDocument, edits: &Edits) -> Result<()> {
    // Validate everything before touching the document
    let currencies = edits
        .currency
        .iter()
        .map(|arg| parse_currency(arg))
        .collect::<Result<Vec<_>>>()?;

    if let Some(level) = edits.level {
        if !level.is_finite() || level < 1.0 {
            bail!("Level must be at least 1, got {}", level);
        }
        document.set_player_level(level);
    }
    if let Some(xp) = edits.xp {
        if xp < 0 {
            bail!("XP cannot be negative, got {}", xp);
        }
        document.set_xp(xp);
    }
    for (name, count) in currencies {
        document.set_currency(name, count);
    }
    Ok(())
}

/// Handle `save set` command
pub fn set(input: &Path, edits: &Edits, no_backup: bool) -> Result<()> {
    if edits.is_empty() {
        bail!("Nothing to set. Use --level, --xp or --currency TYPE=COUNT");
    }

    let mut session = load(input)?;
    apply_edits(session.document_mut(), edits)?;
    write_session(&session, backup_enabled(no_backup)?)?;

    let document = session.document();
    println!(
        "Level {:.3} (xp {})",
        document.player_level(),
        document.xp()
    );
    for currency in document.currencies() {
        println!("{}: {}", currency.currency_type, currency.count);
    }
    Ok(())
}

/// Handle `inspect` command
pub fn inspect(input: &Path, full: bool) -> Result<()> {
    let session = load(input)?;
    let document = session.document();

    if full {
        let json = document.export().context("Failed to export save")?;
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("File: {}", input.display());
    println!(
        "Level: {:.3} (xp {})",
        document.player_level(),
        document.xp()
    );
    println!("Power: {}", document.player_power());
    println!(
        "Inventory: {}/{} items",
        document.inventory_count(),
        INVENTORY_CAPACITY
    );
    println!("Storage chest: {} items", document.storage_items().len());

    if !document.currencies().is_empty() {
        println!("Currencies:");
        for currency in document.currencies() {
            println!("  {}: {}", currency.currency_type, currency.count);
        }
    }

    println!("Equipped:");
    for slot in EquipmentSlot::ALL {
        match document.equipped(slot) {
            Some(item) => println!(
                "  {:<12} {} ({}, power {:.0})",
                slot.to_string(),
                item.item_type(),
                item.rarity(),
                item.in_game_power()
            ),
            None => println!("  {:<12} -", slot.to_string()),
        }
    }

    if let Some(tower) = document.tower() {
        println!(
            "Tower progress: {}",
            if tower.is_enabled() { "present" } else { "disabled" }
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn document() -> SaveDocument {
        let text = json!({
            "items": [],
            "currency": [{"type": "Emerald", "count": 10}],
            "xp": 0
        })
        .to_string();
        SaveDocument::from_json(&text).unwrap()
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("Emerald=500").unwrap(), ("Emerald", 500));
        assert_eq!(parse_currency(" Gold = 7 ").unwrap(), ("Gold", 7));
        assert!(parse_currency("Emerald").is_err());
        assert!(parse_currency("=5").is_err());
        assert!(parse_currency("Emerald=-5").is_err());
    }

    #[test]
    fn test_apply_edits() {
        let mut doc = document();
        let edits = Edits {
            level: Some(10.0),
            xp: None,
            currency: vec!["Emerald=999".into(), "EyeOfEnder=3".into()],
        };
        apply_edits(&mut doc, &edits).unwrap();

        assert_eq!(doc.xp(), 26100);
        assert_eq!(doc.currency("Emerald"), 999);
        assert_eq!(doc.currency("EyeOfEnder"), 3);
    }

    #[test]
    fn test_apply_edits_rejects_bad_input_untouched() {
        let mut doc = document();
        let edits = Edits {
            level: Some(5.0),
            xp: None,
            currency: vec!["Emerald=lots".into()],
        };
        assert!(apply_edits(&mut doc, &edits).is_err());
        assert_eq!(doc.xp(), 0);
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_encrypt_then_write_session() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("save.json");
        let dat_path = dir.path().join("save.dat");
        fs::write(&json_path, document().to_json().unwrap()).unwrap();

        encrypt(&dat_path, Some(&json_path)).unwrap();

        let mut session = load(&dat_path).unwrap();
        session.document_mut().set_xp(500);
        write_session(&session, false).unwrap();

        assert_eq!(load(&dat_path).unwrap().document().xp(), 500);
        // No backup was requested
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_encrypt_rejects_non_save_json() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("bad.json");
        fs::write(&json_path, r#"{"hello": "world"}"#).unwrap();
        assert!(encrypt(&dir.path().join("out.dat"), Some(&json_path)).is_err());
        assert!(!dir.path().join("out.dat").exists());
    }
}
