pub mod args;
pub mod bootstrap;
pub mod config;
pub mod document;
pub mod errors;
pub mod format;
pub mod kv;
pub mod note;
pub mod session;
pub mod store;
pub mod translate;
pub mod utils;
pub mod view;

use std::io::{stdout, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use args::{Cli, Commands};
use bootstrap::{seed_if_absent, Bundled, DefaultsFile};
use config::Config;
use document::Document;
use errors::Result;
use format::{Command, Indicators};
use kv::{FileStore, KeyValueStore};
use note::{NoteColor, Swatch};
use session::{Attachment, EditorSession, KvNavigation, Navigation};
use store::NoteStore;
use translate::{check_language, MyMemoryClient, TranslationPanel, Translator};
use view::{write_list, write_note, EMPTY_LIST, NO_RESULTS};

pub fn r#run() -> Result<()> {
    let cli = Cli::parse();

    let folder = utils::find_data_folder(&cli.data_folder)?;
    let config = Config::load(&folder)?;
    let mut area = FileStore::new(&folder);

    let defaults = cli.defaults
                      .as_ref()
                      .map(PathBuf::from)
                      .or_else(|| config.defaults_path.clone());
    match defaults {
        Some(path) => seed_if_absent(&mut area, &DefaultsFile(path))?,
        None => seed_if_absent(&mut area, &Bundled)?,
    };

    let mut store = NoteStore::new(area);
    let nav = KvNavigation::new(FileStore::new(&folder));
    let mut out = stdout();
    execute(&cli, &config, &mut store, nav, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Carry out one parsed command line against an already seeded store.
pub fn execute<S, N, W>(cli: &Cli,
                        config: &Config,
                        store: &mut NoteStore<S>,
                        mut nav: N,
                        out: &mut W)
                        -> Result<()>
    where S: KeyValueStore,
          N: Navigation,
          W: Write
{
    match &cli.command {
        Some(Commands::List { limit }) => {
            write_list(out, &store.get_sorted(), limit.unwrap_or(0), EMPTY_LIST)?;
        }
        Some(Commands::Search { query, limit }) => {
            write_list(out, &store.search(query), limit.unwrap_or(0), NO_RESULTS)?;
        }
        Some(Commands::New { title, content, color }) => {
            let color = color.as_deref().map(parse_color).transpose()?;
            nav.forget()?;
            let mut session = EditorSession::open(store, nav, config.autosave_delay());
            let now = Instant::now();
            session.edit_title(title, now);
            session.edit_content(content, now);
            let saved = match color {
                Some(c) => session.change_color(c)?,
                None => session.save()?,
            };
            match saved {
                Some(id) => writeln!(out, "created {}", id)?,
                None => writeln!(out, "nothing to save")?,
            }
        }
        Some(Commands::Open { id }) => {
            let note = match store.get_by_id(id) {
                Some(n) => n,
                None => return specific_fail!(format!("note {} doesn't exist", id)),
            };
            nav.remember(&note.id)?;
            write_note(out, &note, utils::istty())?;
        }
        Some(Commands::Edit { title, content, append }) => {
            let mut session = current_session(store, nav, config)?;
            let now = Instant::now();
            if let Some(t) = title {
                session.edit_title(t, now);
            }
            if let Some(c) = content {
                session.edit_content(c, now);
            }
            if let Some(a) = append {
                let joined = format!("{}{}", session.content(), a);
                session.edit_content(&joined, now);
            }
            session.save()?;
            report(out, &mut session)?;
        }
        Some(Commands::Color { name }) => {
            let color = parse_color(name)?;
            let mut session = current_session(store, nav, config)?;
            session.change_color(color)?;
            writeln!(out, "color set to {}", name)?;
        }
        Some(Commands::Attach { file }) => {
            let attachment = Attachment::from_path(file)?;
            let mut session = current_session(store, nav, config)?;
            session.insert_attachment(&attachment, Instant::now());
            session.save()?;
            report(out, &mut session)?;
        }
        Some(Commands::Type { text, bold, italic, underline, bullets, numbered }) => {
            let mut session = current_session(store, nav, config)?;
            let mut doc = Document::new();
            let mut toolbar = Indicators::default();
            let wanted = [(*bold, Command::Bold),
                          (*italic, Command::Italic),
                          (*underline, Command::Underline),
                          (*bullets, Command::UnorderedList),
                          (*numbered, Command::OrderedList)];
            for &(_, cmd) in wanted.iter().filter(|w| w.0) {
                session.toggle_format(cmd, &mut doc, &mut toolbar);
            }
            doc.type_text(text);
            let joined = format!("{}{}", session.content(), doc.to_markup());
            session.edit_content(&joined, Instant::now());
            session.save()?;
            report(out, &mut session)?;
        }
        Some(Commands::Del { id }) => {
            let current = nav.note_to_edit();
            let target = match id.clone().or_else(|| current.clone()) {
                Some(t) => t,
                None => return specific_fail_str!("no note given and none is being edited"),
            };
            let note = match store.get_by_id(&target) {
                Some(n) => n,
                None => return specific_fail!(format!("note {} doesn't exist", target)),
            };
            if !cli.yes &&
               !utils::get_yn_input(&format!("delete \"{}\"? ", note.display_title()))? {
                writeln!(out, "kept {}", target)?;
                return Ok(());
            }
            if current.as_deref() == Some(target.as_str()) {
                let mut session = EditorSession::open(store, nav, config.autosave_delay());
                session.request_delete();
                session.confirm_delete()?;
            } else {
                store.delete_by_id(&target)?;
            }
            writeln!(out, "deleted {}", target)?;
        }
        Some(Commands::Translate { text, from, to, swap, insert }) => {
            let opts = TranslateOptions {
                from: from.clone(),
                to: to.clone(),
                swap: *swap,
                insert: *insert,
            };
            let client = MyMemoryClient::new(&config.translation_email)?;
            translate_text(text, &opts, config, store, nav, &client, out)?;
        }
        None => {
            match cli.id {
                Some(ref id) => {
                    match store.get_by_id(id) {
                        Some(n) => write_note(out, &n, utils::istty())?,
                        None => return specific_fail!(format!("note {} doesn't exist", id)),
                    }
                }
                None => write_list(out, &store.get_sorted(), 0, EMPTY_LIST)?,
            }
        }
    }
    Ok(())
}

/// Language choice for one translation and what to do with the result.
#[derive(Clone, Debug, Default)]
pub struct TranslateOptions {
    /// falls back to `default_source_lang`
    pub from: Option<String>,
    /// falls back to `default_target_lang`
    pub to: Option<String>,
    pub swap: bool,
    /// append the result to the note being edited
    pub insert: bool,
}

/// Run one translation through the panel and optionally append the result
/// to the note being edited.
pub fn translate_text<S, N, T, W>(text: &str,
                                  opts: &TranslateOptions,
                                  config: &Config,
                                  store: &mut NoteStore<S>,
                                  nav: N,
                                  translator: &T,
                                  out: &mut W)
                                  -> Result<()>
    where S: KeyValueStore,
          N: Navigation,
          T: Translator + ?Sized,
          W: Write
{
    let source = opts.from.as_deref().unwrap_or(&config.default_source_lang);
    let target = opts.to.as_deref().unwrap_or(&config.default_target_lang);
    check_language(source)?;
    check_language(target)?;

    let mut panel = TranslationPanel::new();
    panel.open(source, target);
    if opts.swap && !panel.swap() {
        log::debug!("not swapping, a language is missing");
    }
    panel.text = text.to_string();
    let translated = panel.run(translator).map(str::to_string);
    match translated {
        Some(t) => writeln!(out, "{}", t)?,
        None => writeln!(out, "{}", panel.status())?,
    }
    if opts.insert {
        if let Some(t) = panel.take_for_insert() {
            let mut session = current_session(store, nav, config)?;
            session.insert_text(&t, Instant::now());
            session.save()?;
            report(out, &mut session)?;
        }
    }
    Ok(())
}

fn parse_color(name: &str) -> Result<NoteColor> {
    match Swatch::named(&name.to_lowercase()) {
        Some(s) if s.name.is_empty() => Ok(NoteColor::None),
        Some(s) => Ok(NoteColor::Structured(s)),
        None => specific_fail!(format!("unknown color '{}' (pink, blue, green, yellow, white)", name)),
    }
}

fn current_session<'a, S, N>(store: &'a mut NoteStore<S>,
                             nav: N,
                             config: &Config)
                             -> Result<EditorSession<'a, S, N>>
    where S: KeyValueStore,
          N: Navigation
{
    match nav.note_to_edit() {
        Some(ref id) if store.get_by_id(id).is_some() => {
            Ok(EditorSession::open(store, nav, config.autosave_delay()))
        }
        Some(id) => specific_fail!(format!("note {} doesn't exist; open another with `quill open <id>`", id)),
        None => specific_fail_str!("no note is being edited; use `quill new` or `quill open <id>`"),
    }
}

fn report<W, S, N>(out: &mut W, session: &mut EditorSession<S, N>) -> Result<()>
    where W: Write,
          S: KeyValueStore,
          N: Navigation
{
    if let Some(msg) = session.take_status() {
        writeln!(out, "{}", msg)?;
    }
    Ok(())
}
