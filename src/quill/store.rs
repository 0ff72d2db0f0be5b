use std::cell::Cell;
use std::cmp::Reverse;
use std::rc::Rc;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

use crate::errors::Result;
use crate::kv::KeyValueStore;
use crate::note::Note;
use crate::utils::strip_tags;

/// key the note collection lives under
pub static STORAGE_KEY: &str = "notesAppData";

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone)]
pub struct ManualClock {
    millis: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn at_millis(millis: i64) -> ManualClock {
        ManualClock { millis: Rc::new(Cell::new(millis)) }
    }

    pub fn advance(&self, millis: i64) {
        self.millis.set(self.millis.get() + millis);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis.get())
           .single()
           .unwrap_or_else(Utc::now)
    }
}

pub fn iso_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One element of the stored array. Records that do not read as a note are
/// written back exactly as they were found.
enum Record {
    Note(Note),
    Raw(Value),
}

impl Record {
    fn id(&self) -> Option<&str> {
        match *self {
            Record::Note(ref n) => Some(&n.id),
            Record::Raw(ref v) => v.get("id").and_then(Value::as_str),
        }
    }
}

/// The single gateway to the persisted note collection.
pub struct NoteStore<S: KeyValueStore> {
    area: S,
    clock: Box<dyn Clock>,
    last_minted: i64,
}

impl<S: KeyValueStore> NoteStore<S> {
    pub fn new(area: S) -> NoteStore<S> {
        NoteStore::with_clock(area, SystemClock)
    }

    pub fn with_clock<C: Clock + 'static>(area: S, clock: C) -> NoteStore<S> {
        NoteStore {
            area: area,
            clock: Box::new(clock),
            last_minted: 0,
        }
    }

    pub fn area(&self) -> &S {
        &self.area
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Every stored note in storage order. Missing or unreadable storage is
    /// an empty collection; single records that do not read as notes are
    /// skipped here but kept in storage.
    pub fn get_all(&self) -> Vec<Note> {
        self.load()
            .into_iter()
            .filter_map(|r| match r {
                Record::Note(n) => Some(n),
                Record::Raw(_) => None,
            })
            .collect()
    }

    fn load(&self) -> Vec<Record> {
        let raw = match self.area.get(STORAGE_KEY) {
            Ok(Some(r)) => r,
            Ok(None) => return vec![],
            Err(e) => {
                log::warn!("could not read notes: {}", e);
                return vec![];
            }
        };
        let values: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("stored notes are not a valid JSON array, treating as empty: {}", e);
                return vec![];
            }
        };
        values.into_iter()
              .map(|v| match serde_json::from_value::<Note>(v.clone()) {
                  Ok(mut n) => {
                      n.normalize_color();
                      Record::Note(n)
                  }
                  Err(e) => {
                      log::warn!("keeping unreadable note record as is: {}", e);
                      Record::Raw(v)
                  }
              })
              .collect()
    }

    pub fn get_by_id(&self, id: &str) -> Option<Note> {
        self.get_all().into_iter().find(|n| n.id == id)
    }

    /// Insert or merge `note` and persist. Returns `None` when the note has
    /// neither title nor content, in which case nothing is written.
    pub fn save(&mut self, mut note: Note) -> Result<Option<String>> {
        if note.is_blank() {
            log::debug!("skipping save of empty note '{}'", note.id);
            return Ok(None);
        }
        let mut records = self.load();
        let now = self.clock.now();

        if note.id.is_empty() {
            note.id = self.mint_id(&records, now.timestamp_millis());
        }
        if note.created_at.is_none() {
            note.created_at = Some(iso_timestamp(&now));
        }
        note.modified_at = Some(iso_timestamp(&now));
        if note.timestamp.is_none() {
            note.timestamp = Some(now.timestamp_millis());
        }
        note.normalize_color();

        let id = note.id.clone();
        let existing = records.iter_mut().find_map(|r| match r {
            Record::Note(n) if n.id == id => Some(n),
            _ => None,
        });
        match existing {
            Some(existing) => {
                log::debug!("updating note {}", id);
                existing.merge_from(note);
            }
            None => {
                log::debug!("adding note {}", id);
                records.insert(0, Record::Note(note));
            }
        }
        self.persist(&records)?;
        Ok(Some(id))
    }

    pub fn delete_by_id(&mut self, id: &str) -> Result<bool> {
        let mut records = self.load();
        let before = records.len();
        records.retain(|r| r.id() != Some(id));
        if records.len() == before {
            return Ok(false);
        }
        self.persist(&records)?;
        log::debug!("deleted note {}", id);
        Ok(true)
    }

    /// Case-insensitive substring search over titles and tag-stripped content.
    pub fn search(&self, query: &str) -> Vec<Note> {
        let needle = query.trim().to_lowercase();
        let notes = self.get_all();
        if needle.is_empty() {
            return notes;
        }
        notes.into_iter()
             .filter(|n| {
                 let title_match = n.title
                                    .as_deref()
                                    .map_or(false, |t| t.to_lowercase().contains(&needle));
                 let content_match = n.content
                                      .as_deref()
                                      .map_or(false, |c| {
                                          strip_tags(&c.to_lowercase(), " ").contains(&needle)
                                      });
                 title_match || content_match
             })
             .collect()
    }

    /// All notes, newest first.
    pub fn get_sorted(&self) -> Vec<Note> {
        let mut notes = self.get_all();
        notes.sort_by_key(|n| Reverse(sort_key(n)));
        notes
    }

    fn persist(&mut self, records: &[Record]) -> Result<()> {
        let mut values = Vec::with_capacity(records.len());
        for r in records {
            values.push(match *r {
                Record::Note(ref n) => serde_json::to_value(n)?,
                Record::Raw(ref v) => v.clone(),
            });
        }
        let encoded = serde_json::to_string(&values)?;
        self.area.set(STORAGE_KEY, &encoded)
    }

    fn mint_id(&mut self, records: &[Record], now_millis: i64) -> String {
        let mut millis = now_millis.max(self.last_minted + 1);
        while records.iter().any(|r| r.id() == Some(format!("note-{}", millis).as_str())) {
            millis += 1;
        }
        self.last_minted = millis;
        format!("note-{}", millis)
    }
}

/// `timestamp` when present, else `modifiedAt` in epoch millis. Every pair of
/// notes is compared on this one value so the ordering stays total.
pub fn sort_key(note: &Note) -> i64 {
    note.timestamp
        .or_else(|| {
            note.modified_at
                .as_deref()
                .and_then(|m| DateTime::parse_from_rfc3339(m).ok())
                .map(|d| d.timestamp_millis())
        })
        .unwrap_or(0)
}
