use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile, TempDir};

use clap::Parser;
use quill::args::Cli;
use quill::bootstrap::{seed_if_absent, Bundled, DefaultsFile};
use quill::config::Config;
use quill::errors::Result;
use quill::kv::{FileStore, KeyValueStore};
use quill::note::Swatch;
use quill::note::NoteColor;
use quill::session::{KvNavigation, EDIT_KEY};
use quill::store::{NoteStore, STORAGE_KEY};
use quill::translate::{TranslationOutcome, Translator};
use quill::{execute, translate_text, TranslateOptions};

fn seeded_folder() -> TempDir {
    let dir = Builder::new().prefix("quill").tempdir().unwrap();
    let mut area = FileStore::new(dir.path());
    assert!(seed_if_absent(&mut area, &Bundled).unwrap());
    dir
}

fn quill(dir: &Path, argv: &[&str]) -> Result<String> {
    let mut full = vec!["quill", "--yes"];
    full.extend_from_slice(argv);
    let cli = Cli::try_parse_from(full).unwrap();
    let mut store = NoteStore::new(FileStore::new(dir));
    let nav = KvNavigation::new(FileStore::new(dir));
    let mut out = vec![];
    execute(&cli, &Config::default(), &mut store, nav, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn editing(dir: &Path) -> Option<String> {
    FileStore::new(dir).get(EDIT_KEY).unwrap()
}

struct Tagged;

impl Translator for Tagged {
    fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome {
        TranslationOutcome::Translated(format!("[{}>{}] {}", source, target, text))
    }
}

#[test]
fn fresh_folder_lists_bundled_notes_newest_first() {
    let dir = seeded_folder();
    let out = quill(dir.path(), &["list"]).unwrap();
    let welcome = out.find("note-welcome").unwrap();
    let formatting = out.find("note-formatting").unwrap();
    assert!(welcome < formatting);
    assert!(out.contains("blue"));
    // the legacy class is shown as its swatch name
    assert!(out.contains("green"));
    assert!(!out.contains("<b>"));

    assert_eq!(quill(dir.path(), &[]).unwrap(), out);
}

#[test]
fn seeding_does_not_overwrite_existing_notes() {
    let dir = seeded_folder();
    quill(dir.path(), &["del", "note-welcome"]).unwrap();
    let mut area = FileStore::new(dir.path());
    assert!(!seed_if_absent(&mut area, &Bundled).unwrap());
    assert!(!quill(dir.path(), &["list"]).unwrap().contains("note-welcome"));
}

#[test]
fn custom_defaults_file_seeds_the_store() {
    let dir = Builder::new().prefix("quill").tempdir().unwrap();
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"[{{"id":"mine","title":"Mine","color":"note-pink"}}]"#).unwrap();

    let mut area = FileStore::new(dir.path());
    seed_if_absent(&mut area, &DefaultsFile(file.path().to_path_buf())).unwrap();
    let store = NoteStore::new(area);
    let n = store.get_by_id("mine").unwrap();
    assert_eq!(n.color, Some(NoteColor::Structured(Swatch::named("pink").unwrap())));
}

#[test]
fn create_edit_format_and_color_a_note() {
    let dir = seeded_folder();
    let out = quill(dir.path(), &["new", "-t", "Groceries", "-c", "milk"]).unwrap();
    let id = editing(dir.path()).unwrap();
    assert_eq!(out, format!("created {}\n", id));

    assert_eq!(quill(dir.path(), &["edit", "--append", " and eggs"]).unwrap(), "Note saved!\n");
    quill(dir.path(), &["type", "urgent", "--bold"]).unwrap();
    quill(dir.path(), &["type", "bread", "--bullets"]).unwrap();
    assert_eq!(quill(dir.path(), &["color", "yellow"]).unwrap(), "color set to yellow\n");

    let store = NoteStore::new(FileStore::new(dir.path()));
    let n = store.get_by_id(&id).unwrap();
    assert_eq!(n.title.as_deref(), Some("Groceries"));
    assert_eq!(n.content.as_deref(),
               Some("milk and eggs<b>urgent</b><ul><li>bread</li></ul>"));
    assert_eq!(n.color, Some(NoteColor::Structured(Swatch::named("yellow").unwrap())));
    assert_eq!(store.get_sorted()[0].id, id);
    assert_eq!(store.get_all().len(), 3);
}

#[test]
fn empty_new_note_is_not_saved() {
    let dir = seeded_folder();
    assert_eq!(quill(dir.path(), &["new"]).unwrap(), "nothing to save\n");
    assert_eq!(editing(dir.path()), None);
    let store = NoteStore::new(FileStore::new(dir.path()));
    assert_eq!(store.get_all().len(), 2);
}

#[test]
fn editing_needs_an_open_note() {
    let dir = seeded_folder();
    assert!(quill(dir.path(), &["edit", "-t", "x"]).is_err());
    assert!(quill(dir.path(), &["open", "note-missing"]).is_err());

    let out = quill(dir.path(), &["open", "note-formatting"]).unwrap();
    assert!(out.contains("Formatting"));
    assert_eq!(editing(dir.path()).as_deref(), Some("note-formatting"));
    quill(dir.path(), &["edit", "-t", "Formatting tips"]).unwrap();

    let store = NoteStore::new(FileStore::new(dir.path()));
    let n = store.get_by_id("note-formatting").unwrap();
    assert_eq!(n.title.as_deref(), Some("Formatting tips"));
    assert_eq!(n.created_at.as_deref(), Some("2024-01-01T08:00:00.000Z"));
}

#[test]
fn deleting_the_open_note_clears_the_context() {
    let dir = seeded_folder();
    quill(dir.path(), &["open", "note-welcome"]).unwrap();
    assert_eq!(quill(dir.path(), &["del"]).unwrap(), "deleted note-welcome\n");
    assert_eq!(editing(dir.path()), None);
    assert!(quill(dir.path(), &["del"]).is_err());
    assert!(quill(dir.path(), &["note-welcome"]).is_err());
}

#[test]
fn search_ignores_markup() {
    let dir = seeded_folder();
    let hits = quill(dir.path(), &["search", "QUILL"]).unwrap();
    assert!(hits.contains("note-welcome"));
    assert!(!hits.contains("note-formatting"));
    assert_eq!(quill(dir.path(), &["search", "<li>"]).unwrap(), "No results found\n");
}

#[test]
fn empty_store_says_so() {
    let dir = Builder::new().prefix("quill").tempdir().unwrap();
    FileStore::new(dir.path()).set(STORAGE_KEY, "[]").unwrap();
    assert_eq!(quill(dir.path(), &["list"]).unwrap(), "No notes yet.\n");
}

fn translate(dir: &Path, text: &str, opts: &TranslateOptions) -> Result<String> {
    let mut store = NoteStore::new(FileStore::new(dir));
    let mut out = vec![];
    translate_text(text,
                   opts,
                   &Config::default(),
                   &mut store,
                   KvNavigation::new(FileStore::new(dir)),
                   &Tagged,
                   &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn translation_is_appended_to_the_open_note() {
    let dir = seeded_folder();
    quill(dir.path(), &["open", "note-welcome"]).unwrap();

    let opts = TranslateOptions { from: Some("en".to_string()), insert: true, ..Default::default() };
    assert_eq!(translate(dir.path(), "hello", &opts).unwrap(), "[en>ru] hello\nNote saved!\n");

    let n = NoteStore::new(FileStore::new(dir.path())).get_by_id("note-welcome").unwrap();
    assert!(n.content.unwrap().ends_with("[en&gt;ru] hello"));
}

#[test]
fn translation_without_languages_changes_nothing() {
    let dir = seeded_folder();
    quill(dir.path(), &["open", "note-welcome"]).unwrap();
    let before = FileStore::new(dir.path()).get(STORAGE_KEY).unwrap();

    let opts = TranslateOptions { insert: true, ..Default::default() };
    assert_eq!(translate(dir.path(), "hello", &opts).unwrap(), "Please select both languages\n");
    assert_eq!(FileStore::new(dir.path()).get(STORAGE_KEY).unwrap(), before);
}

#[test]
fn swapped_languages_translate_the_other_way() {
    let dir = seeded_folder();
    let opts = TranslateOptions { from: Some("en".to_string()), swap: true, ..Default::default() };
    assert_eq!(translate(dir.path(), "hello", &opts).unwrap(), "[ru>en] hello\n");

    // nothing to swap with while the source is unset
    let opts = TranslateOptions { swap: true, ..Default::default() };
    assert_eq!(translate(dir.path(), "hello", &opts).unwrap(), "Please select both languages\n");
}

#[test]
fn unknown_language_is_refused() {
    let dir = seeded_folder();
    let opts = TranslateOptions { from: Some("en".to_string()), to: Some("klingon".to_string()), ..Default::default() };
    let err = translate(dir.path(), "hello", &opts).unwrap_err();
    assert!(err.to_string().starts_with("unknown language 'klingon'"));

    let err = quill(dir.path(), &["translate", "hello", "--from", "xx"]).unwrap_err();
    assert!(err.to_string().starts_with("unknown language 'xx'"));
}
