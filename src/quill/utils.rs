use std::borrow::Cow;
use std::fs::File;
use std::io::{stdin, stdout, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::{DateTime, Local};
use crossterm::{
    queue,
    style::{Attribute, SetAttribute},
};
use regex::Regex;

use crate::errors::Result;
use crate::note::Note;
use crate::specific_fail_str;

/// short date format used in listings
pub static DATEFMT_SHORT: &str = "%b %e, %Y";

/// number of characters kept in a listing preview
pub static PREVIEW_LEN: usize = 100;

pub fn istty() -> bool {
    stdout().is_terminal()
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Replace every `<...>` tag in `markup` with `with`.
pub fn strip_tags<'a>(markup: &'a str, with: &str) -> Cow<'a, str> {
    tag_pattern().replace_all(markup, with)
}

/// Escape text for use inside markup, attribute values included.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Tag-free preview of note content, cut at `max` characters.
pub fn preview(content: &str, max: usize) -> String {
    let text = strip_tags(content, "");
    if text.chars().count() <= max {
        return text.into_owned();
    }
    let cut: String = text.chars().take(max).collect();
    cut + "..."
}

pub fn format_field(value: &str, width: usize, truncate: bool) -> String {
    if value.chars().count() > width && width > 3 && truncate {
        let cut: String = value.chars().take(width - 3).collect();
        format!("{}...", cut)
    } else {
        format!("{: <1$.1$}", value, width)
    }
}

/// `modifiedAt`, else `createdAt`, as a short local date
pub fn short_date(note: &Note) -> String {
    note.modified_at
        .as_deref()
        .or(note.created_at.as_deref())
        .and_then(|d| d.parse::<DateTime<Local>>().ok())
        .map(|d| d.format(DATEFMT_SHORT).to_string())
        .unwrap_or_default()
}

pub fn pretty_line<W: Write>(out: &mut W, bold: &str, plain: &str, tty: bool) -> Result<()> {
    if tty {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    write!(out, "{}", bold)?;
    if tty {
        queue!(out, SetAttribute(Attribute::Reset))?;
    }
    write!(out, "{}", plain)?;
    Ok(())
}

pub fn get_yn_input(message: &str) -> Result<bool> {
    print!("{}", message);
    stdout().flush()?;

    let stdin = stdin();
    let yes = ["y", "Y", "yes", "YES", "Yes"];
    let no = ["n", "N", "no", "NO", "No"];

    loop {
        print!("[y/n]# ");
        stdout().flush()?;
        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            return Ok(false);
        }
        let input = input.trim();
        if yes.contains(&input) {
            return Ok(true);
        } else if no.contains(&input) {
            return Ok(false);
        };
        println!("invalid input.");
    }
}

/// Resolve the data folder: explicit setting, else `~/.quill`. When
/// `~/.quill` is a file it holds the path of the real folder.
pub fn find_data_folder(data_folder: &Option<String>) -> Result<PathBuf> {
    if let Some(df) = data_folder {
        return Ok(PathBuf::from(df));
    }
    match dirs::home_dir() {
        Some(p) => {
            let default_path = p.join(".quill");
            if default_path.is_file() {
                let mut file = File::open(&default_path)?;
                let mut contents = String::new();
                file.read_to_string(&mut contents)?;
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    return specific_fail_str!("~/.quill is a file but is empty. It should contain a path to the data directory.");
                }
                Ok(PathBuf::from(trimmed))
            } else {
                Ok(default_path)
            }
        }
        None => specific_fail_str!("failed to find your home directory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_every_tag() {
        assert_eq!(strip_tags("<b>Hello</b> <i class=\"x\">world</i>", ""), "Hello world");
        assert_eq!(strip_tags("a<br>b", " "), "a b");
        assert_eq!(strip_tags("no tags", ""), "no tags");
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_markup(r#"a<b>&"c""#), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn preview_truncates_after_tags_are_gone() {
        let long = format!("<p>{}</p>", "x".repeat(120));
        let p = preview(&long, PREVIEW_LEN);
        assert_eq!(p.len(), PREVIEW_LEN + 3);
        assert!(p.ends_with("..."));
        assert_eq!(preview("<b>short</b>", PREVIEW_LEN), "short");
    }

    #[test]
    fn format_field_pads_and_truncates() {
        assert_eq!(format_field("ab", 4, true), "ab  ");
        assert_eq!(format_field("abcdefgh", 6, true), "abc...");
        assert_eq!(format_field("abcdefgh", 4, false), "abcd");
    }

    #[test]
    fn short_date_prefers_modified() {
        let mut n = Note::new("t", "");
        assert_eq!(short_date(&n), "");
        n.created_at = Some("2024-05-01T12:00:00.000Z".to_string());
        assert!(!short_date(&n).is_empty());
        n.modified_at = Some("garbage".to_string());
        assert_eq!(short_date(&n), "");
    }

    #[test]
    fn pretty_line_without_tty_is_plain() {
        let mut out = vec![];
        pretty_line(&mut out, "title: ", "x\n", false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "title: x\n");
    }

    #[test]
    fn explicit_data_folder_wins() {
        let folder = find_data_folder(&Some("/tmp/quill-test".to_string())).unwrap();
        assert_eq!(folder, PathBuf::from("/tmp/quill-test"));
    }
}
