//! Inline formatting state: one flag per toolbar command, kept in step with
//! the rich-text engine and the toolbar indicators.

use std::error::Error;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Command {
    Bold,
    Italic,
    Underline,
    UnorderedList,
    OrderedList,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Bold,
        Command::Italic,
        Command::Underline,
        Command::UnorderedList,
        Command::OrderedList,
    ];

    /// the engine's name for the command
    pub fn name(self) -> &'static str {
        match self {
            Command::Bold => "bold",
            Command::Italic => "italic",
            Command::Underline => "underline",
            Command::UnorderedList => "insertUnorderedList",
            Command::OrderedList => "insertOrderedList",
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, Command::UnorderedList | Command::OrderedList)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// the engine cannot answer active-state queries
    QueryUnsupported(Command),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::QueryUnsupported(c) => write!(f, "cannot query state of '{}'", c),
        }
    }
}

impl Error for EngineError {}

/// What one element on the path from the selection to the editor root says
/// about its own styling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleFact {
    /// lowercase tag name
    pub tag: String,
    pub font_weight: u16,
    pub italic: bool,
    pub text_decoration: String,
    /// the editor root itself; nothing at or above it counts
    pub is_root: bool,
}

impl StyleFact {
    pub fn element(tag: &str) -> StyleFact {
        StyleFact {
            tag: tag.to_lowercase(),
            font_weight: 400,
            italic: false,
            text_decoration: String::new(),
            is_root: false,
        }
    }

    pub fn root() -> StyleFact {
        StyleFact { is_root: true, ..StyleFact::element("div") }
    }

    fn list_kind(&self) -> Option<Command> {
        match self.tag.as_str() {
            "ul" => Some(Command::UnorderedList),
            "ol" => Some(Command::OrderedList),
            _ => None,
        }
    }
}

fn fact_matches(cmd: Command, fact: &StyleFact) -> bool {
    match cmd {
        Command::Bold => fact.font_weight >= 700 || fact.tag == "b" || fact.tag == "strong",
        Command::Italic => fact.italic || fact.tag == "i" || fact.tag == "em",
        Command::Underline => fact.text_decoration.contains("underline") || fact.tag == "u",
        Command::UnorderedList | Command::OrderedList => fact.list_kind() == Some(cmd),
    }
}

/// Derive whether `cmd` applies from the selection's ancestry, innermost
/// first. Stops at the editor root. For lists only the nearest list
/// container counts.
pub fn active_from_ancestry(cmd: Command, facts: &[StyleFact]) -> bool {
    for fact in facts.iter().take_while(|f| !f.is_root) {
        if cmd.is_list() {
            if let Some(kind) = fact.list_kind() {
                return kind == cmd;
            }
        } else if fact_matches(cmd, fact) {
            return true;
        }
    }
    false
}

fn is_active<E: RichTextEngine>(engine: &E, cmd: Command) -> bool {
    engine.query_command_state(cmd)
          .unwrap_or_else(|_| active_from_ancestry(cmd, &engine.anchor_ancestry()))
}

/// A surface that can apply inline formatting to its current selection.
pub trait RichTextEngine {
    type Marker: Copy;

    /// authoritative "is `cmd` active for the selection"
    fn query_command_state(&self, cmd: Command) -> Result<bool, EngineError>;
    fn exec_command(&mut self, cmd: Command);
    /// `None` when there is no selection at all
    fn is_collapsed(&self) -> Option<bool>;
    /// style facts from the selection anchor outwards, ending at the root
    fn anchor_ancestry(&self) -> Vec<StyleFact>;

    /// put a zero-width placeholder at the caret
    fn insert_marker(&mut self) -> Self::Marker;
    fn select_marker(&mut self, marker: Self::Marker);
    /// splice the marker's children into its parent and drop the marker
    fn unwrap_marker(&mut self, marker: Self::Marker);
    /// caret immediately after what the marker used to hold
    fn collapse_after_marked(&mut self, marker: Self::Marker);
}

/// Toolbar indicator sink.
pub trait Toolbar {
    fn set_indicator(&mut self, cmd: Command, active: bool);
}

/// Indicator state kept in memory, for front ends that render it themselves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Indicators {
    pub flags: FormatFlags,
}

impl Toolbar for Indicators {
    fn set_indicator(&mut self, cmd: Command, active: bool) {
        self.flags.set(cmd, active);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FormatFlags {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub unordered_list: bool,
    pub ordered_list: bool,
}

impl FormatFlags {
    pub fn get(&self, cmd: Command) -> bool {
        match cmd {
            Command::Bold => self.bold,
            Command::Italic => self.italic,
            Command::Underline => self.underline,
            Command::UnorderedList => self.unordered_list,
            Command::OrderedList => self.ordered_list,
        }
    }

    pub fn set(&mut self, cmd: Command, value: bool) {
        let flag = match cmd {
            Command::Bold => &mut self.bold,
            Command::Italic => &mut self.italic,
            Command::Underline => &mut self.underline,
            Command::UnorderedList => &mut self.unordered_list,
            Command::OrderedList => &mut self.ordered_list,
        };
        *flag = value;
    }

    pub fn any(&self) -> bool {
        Command::ALL.iter().any(|c| self.get(*c))
    }

    pub fn active(&self) -> Vec<Command> {
        Command::ALL.iter().copied().filter(|c| self.get(*c)).collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct FormattingTracker {
    flags: FormatFlags,
}

impl FormattingTracker {
    pub fn new() -> FormattingTracker {
        FormattingTracker::default()
    }

    pub fn flags(&self) -> FormatFlags {
        self.flags
    }

    /// Toolbar press: flip, apply, show. With a bare caret the new state is
    /// carried onto the next keystroke.
    pub fn toggle<E, T>(&mut self, cmd: Command, engine: &mut E, toolbar: &mut T)
        where E: RichTextEngine,
              T: Toolbar + ?Sized
    {
        let value = !self.flags.get(cmd);
        self.flags.set(cmd, value);
        engine.exec_command(cmd);
        toolbar.set_indicator(cmd, value);

        if engine.is_collapsed() == Some(true) {
            self.apply_sticky(engine);
        }
        self.selection_changed(engine, toolbar);
    }

    /// Re-derive every flag from the engine after the selection moved.
    pub fn selection_changed<E, T>(&mut self, engine: &E, toolbar: &mut T)
        where E: RichTextEngine,
              T: Toolbar + ?Sized
    {
        let mut ancestry = None;
        for cmd in Command::ALL {
            let active = match engine.query_command_state(cmd) {
                Ok(a) => a,
                Err(e) => {
                    log::debug!("Error checking command state: {}", e);
                    if engine.is_collapsed().is_none() {
                        continue;
                    }
                    let facts = ancestry.get_or_insert_with(|| engine.anchor_ancestry());
                    active_from_ancestry(cmd, facts)
                }
            };
            self.flags.set(cmd, active);
            toolbar.set_indicator(cmd, active);
        }
    }

    /// Wrap a zero-width marker at the caret in every active format so the
    /// next characters typed land inside it.
    pub fn apply_sticky<E: RichTextEngine>(&self, engine: &mut E) {
        if engine.is_collapsed() != Some(true) || !self.flags.any() {
            return;
        }
        let marker = engine.insert_marker();
        engine.select_marker(marker);
        for cmd in self.flags.active() {
            // already in effect from an enclosing element
            if !is_active(engine, cmd) {
                engine.exec_command(cmd);
            }
        }
        engine.unwrap_marker(marker);
        engine.collapse_after_marked(marker);
    }
}
