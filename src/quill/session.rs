//! The editor page: one note being edited, auto-saved after a quiet period.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose, Engine as _};

use crate::errors::Result;
use crate::format::{Command, FormatFlags, FormattingTracker, RichTextEngine, Toolbar};
use crate::kv::KeyValueStore;
use crate::note::{Note, NoteColor, UNTITLED};
use crate::store::NoteStore;
use crate::utils::escape_markup;

/// key of the "note being edited" entry in the session area
pub static EDIT_KEY: &str = "editNoteId";

/// toast shown after an explicit save
pub static SAVED_MESSAGE: &str = "Note saved!";

/// A deadline that can be pushed back or dropped. There is never more than
/// one pending.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Debouncer {
        Debouncer { delay: delay, deadline: None }
    }

    /// cancel whatever is pending and start over from `now`
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the deadline if it has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Where the id of the note being edited is handed between pages.
pub trait Navigation {
    fn note_to_edit(&self) -> Option<String>;
    fn remember(&mut self, id: &str) -> Result<()>;
    fn forget(&mut self) -> Result<()>;
}

/// Navigation context kept in a key-value area.
pub struct KvNavigation<K: KeyValueStore> {
    area: K,
}

impl<K: KeyValueStore> KvNavigation<K> {
    pub fn new(area: K) -> KvNavigation<K> {
        KvNavigation { area: area }
    }
}

impl<K: KeyValueStore> Navigation for KvNavigation<K> {
    fn note_to_edit(&self) -> Option<String> {
        match self.area.get(EDIT_KEY) {
            Ok(id) => id.map(|i| i.trim().to_string()).filter(|i| !i.is_empty()),
            Err(e) => {
                log::warn!("could not read the note being edited: {}", e);
                None
            }
        }
    }

    fn remember(&mut self, id: &str) -> Result<()> {
        self.area.set(EDIT_KEY, id)
    }

    fn forget(&mut self) -> Result<()> {
        self.area.remove(EDIT_KEY)
    }
}

/// A file to embed in note content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Attachment> {
        let path = path.as_ref();
        let mut data = vec![];
        File::open(path)?.read_to_end(&mut data)?;
        let file_name = path.file_name()
                            .map(|f| f.to_string_lossy().into_owned())
                            .unwrap_or_else(|| "attachment".to_string());
        Ok(Attachment {
            mime_type: guess_mime(&file_name).to_string(),
            file_name: file_name,
            data: data,
        })
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, general_purpose::STANDARD.encode(&self.data))
    }

    pub fn to_markup(&self) -> String {
        let name = escape_markup(&self.file_name);
        format!("<div class=\"attachment-container\" data-file=\"{}\" data-filename=\"{}\" data-filetype=\"{}\">\
                 <span class=\"material-icons attachment-icon\">attachment</span>\
                 <span class=\"attachment-filename\">{}</span></div>",
                self.data_url(),
                name,
                escape_markup(&self.mime_type),
                name)
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name.rsplit_once('.').map(|(_, e)| e.to_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

pub struct EditorSession<'a, S: KeyValueStore, N: Navigation> {
    store: &'a mut NoteStore<S>,
    nav: N,
    note_id: Option<String>,
    title: String,
    content: String,
    color: NoteColor,
    autosave: Debouncer,
    tracker: FormattingTracker,
    delete_requested: bool,
    closed: bool,
    status: Option<String>,
}

impl<'a, S: KeyValueStore, N: Navigation> EditorSession<'a, S, N> {
    /// Open the note the navigation context points at, or a blank one.
    pub fn open(store: &'a mut NoteStore<S>, nav: N, autosave_delay: Duration) -> EditorSession<'a, S, N> {
        let note_id = nav.note_to_edit();
        let loaded = note_id.as_deref().and_then(|id| store.get_by_id(id));
        let (title, content, color) = match loaded {
            Some(n) => (n.title.unwrap_or_default(),
                        n.content.unwrap_or_default(),
                        n.color.unwrap_or(NoteColor::None)),
            None => (String::new(), String::new(), NoteColor::None),
        };
        EditorSession {
            store: store,
            nav: nav,
            note_id: note_id,
            title: title,
            content: content,
            color: color,
            autosave: Debouncer::new(autosave_delay),
            tracker: FormattingTracker::new(),
            delete_requested: false,
            closed: false,
            status: None,
        }
    }

    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn color(&self) -> &NoteColor {
        &self.color
    }

    pub fn flags(&self) -> FormatFlags {
        self.tracker.flags()
    }

    pub fn autosave_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn delete_requested(&self) -> bool {
        self.delete_requested
    }

    /// last transient message for the user, cleared on read
    pub fn take_status(&mut self) -> Option<String> {
        self.status.take()
    }

    pub fn edit_title(&mut self, title: &str, now: Instant) {
        self.title = title.to_string();
        self.autosave.schedule(now);
    }

    pub fn edit_content(&mut self, content: &str, now: Instant) {
        self.content = content.to_string();
        self.autosave.schedule(now);
    }

    pub fn insert_attachment(&mut self, attachment: &Attachment, now: Instant) {
        log::debug!("attaching {} ({} bytes)", attachment.file_name, attachment.data.len());
        let content = self.content.clone() + &attachment.to_markup();
        self.edit_content(&content, now);
    }

    /// Append translated text as plain text.
    pub fn insert_text(&mut self, text: &str, now: Instant) {
        let content = self.content.clone() + &escape_markup(text);
        self.edit_content(&content, now);
    }

    /// Run the auto-save if its quiet period is over.
    pub fn tick(&mut self, now: Instant) -> Result<Option<String>> {
        if self.autosave.fire_if_due(now) {
            log::debug!("auto-saving");
            return self.persist();
        }
        Ok(None)
    }

    pub fn save(&mut self) -> Result<Option<String>> {
        let saved = self.persist()?;
        if saved.is_some() {
            self.status = Some(SAVED_MESSAGE.to_string());
        }
        Ok(saved)
    }

    /// Save and leave the editor.
    pub fn back(&mut self) -> Result<Option<String>> {
        let saved = self.persist()?;
        self.closed = true;
        Ok(saved)
    }

    pub fn change_color(&mut self, color: NoteColor) -> Result<Option<String>> {
        self.color = color.normalize();
        self.persist()
    }

    pub fn request_delete(&mut self) {
        self.delete_requested = true;
    }

    pub fn cancel_delete(&mut self) {
        self.delete_requested = false;
    }

    /// Delete the note after `request_delete`. Returns whether a stored note
    /// was removed.
    pub fn confirm_delete(&mut self) -> Result<bool> {
        if !self.delete_requested {
            return Ok(false);
        }
        self.delete_requested = false;
        // flushes the pending auto-save so it cannot write the note back later
        self.persist()?;
        let removed = match self.note_id.take() {
            Some(id) => self.store.delete_by_id(&id)?,
            None => false,
        };
        self.nav.forget()?;
        self.closed = true;
        Ok(removed)
    }

    pub fn toggle_format<E, T>(&mut self, cmd: Command, engine: &mut E, toolbar: &mut T)
        where E: RichTextEngine,
              T: Toolbar + ?Sized
    {
        self.tracker.toggle(cmd, engine, toolbar);
    }

    pub fn selection_changed<E, T>(&mut self, engine: &E, toolbar: &mut T)
        where E: RichTextEngine,
              T: Toolbar + ?Sized
    {
        self.tracker.selection_changed(engine, toolbar);
    }

    fn persist(&mut self) -> Result<Option<String>> {
        self.autosave.cancel();
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() && content.is_empty() {
            return Ok(None);
        }
        let note = Note {
            id: self.note_id.clone().unwrap_or_default(),
            title: Some(if title.is_empty() { UNTITLED.to_string() } else { title.to_string() }),
            content: Some(content.to_string()),
            color: Some(self.color.clone()),
            timestamp: Some(self.store.now().timestamp_millis()),
            ..Default::default()
        };
        let saved = self.store.save(note)?;
        if let Some(ref id) = saved {
            self.nav.remember(id)?;
            self.note_id = Some(id.clone());
        }
        Ok(saved)
    }
}
