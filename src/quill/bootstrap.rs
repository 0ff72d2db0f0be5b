//! First-run seeding of the note collection.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use serde_json::Value;

use crate::errors::Result;
use crate::kv::KeyValueStore;
use crate::specific_fail;
use crate::store::STORAGE_KEY;

static BUNDLED: &str = include_str!("../../data/default_notes.json");

/// Somewhere a default dataset can be fetched from.
pub trait DefaultsSource {
    fn fetch(&self) -> Result<String>;
}

/// The dataset compiled into the binary.
pub struct Bundled;

impl DefaultsSource for Bundled {
    fn fetch(&self) -> Result<String> {
        Ok(BUNDLED.to_string())
    }
}

pub struct DefaultsFile(pub PathBuf);

impl DefaultsSource for DefaultsFile {
    fn fetch(&self) -> Result<String> {
        let mut contents = String::new();
        File::open(&self.0)?.read_to_string(&mut contents)?;
        Ok(contents)
    }
}

fn fetch_array<D: DefaultsSource + ?Sized>(source: &D) -> Result<String> {
    let raw = source.fetch()?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Array(_) => Ok(raw),
        _ => specific_fail!("default notes are not a JSON array".to_string()),
    }
}

/// Seed the collection when its key has never been written. Returns whether
/// anything was written. A failed fetch still writes an empty collection so
/// the key exists from then on.
pub fn seed_if_absent<S, D>(area: &mut S, source: &D) -> Result<bool>
    where S: KeyValueStore + ?Sized,
          D: DefaultsSource + ?Sized
{
    if area.get(STORAGE_KEY)?.is_some() {
        return Ok(false);
    }
    let data = match fetch_array(source) {
        Ok(d) => d,
        Err(e) => {
            log::error!("Error loading default notes: {}", e);
            "[]".to_string()
        }
    };
    area.set(STORAGE_KEY, &data)?;
    log::info!("seeded note storage");
    Ok(true)
}
