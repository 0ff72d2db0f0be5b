use std::io::Write;
use std::iter::repeat;

use crate::errors::Result;
use crate::note::{Note, NoteColor};
use crate::utils::{format_field, preview, pretty_line, short_date, PREVIEW_LEN};

pub static EMPTY_LIST: &str = "No notes yet.";
pub static NO_RESULTS: &str = "No results found";

/// Column widths for one listing.
#[derive(Clone, Copy, Debug)]
pub struct LineFormat {
    pub colsep: usize,
    pub id_width: usize,
    pub title_width: usize,
    pub color_width: usize,
}

impl LineFormat {
    pub fn new(notes: &[Note]) -> LineFormat {
        LineFormat {
            colsep: 2,
            id_width: widest(notes, |n| n.id.chars().count(), 2),
            title_width: widest(notes, |n| n.display_title().chars().count(), 5).min(40),
            color_width: widest(notes, |n| color_name(n).chars().count(), 0),
        }
    }
}

fn widest<F: Fn(&Note) -> usize>(notes: &[Note], f: F, min: usize) -> usize {
    notes.iter().map(f).max().unwrap_or(0).max(min)
}

fn color_name(note: &Note) -> String {
    note.color.as_ref().map(NoteColor::to_string).unwrap_or_default()
}

fn write_row<W: Write>(out: &mut W, note: &Note, lf: &LineFormat) -> Result<()> {
    let sep: String = repeat(' ').take(lf.colsep).collect();
    write!(out, "{}", format_field(&note.id, lf.id_width, false))?;
    write!(out, "{}{}", sep, format_field(note.display_title(), lf.title_width, true))?;
    if lf.color_width != 0 {
        write!(out, "{}{}", sep, format_field(&color_name(note), lf.color_width, false))?;
    }
    writeln!(out, "{}{}", sep, short_date(note))?;
    let text = preview(note.content_str(), PREVIEW_LEN);
    if !text.trim().is_empty() {
        writeln!(out, "    {}", text.trim())?;
    }
    Ok(())
}

/// Print `notes` as a table, at most `limit` rows when it is non-zero.
pub fn write_list<W: Write>(out: &mut W, notes: &[Note], limit: usize, empty: &str) -> Result<()> {
    if notes.is_empty() {
        writeln!(out, "{}", empty)?;
        return Ok(());
    }
    let shown = if limit != 0 && limit < notes.len() { &notes[..limit] } else { notes };
    let lf = LineFormat::new(shown);
    for n in shown {
        write_row(out, n, &lf)?;
    }
    Ok(())
}

/// Print one note in full.
pub fn write_note<W: Write>(out: &mut W, note: &Note, tty: bool) -> Result<()> {
    pretty_line(out, "id: ", &format!("{}\n", note.id), tty)?;
    pretty_line(out, "title: ", &format!("{}\n", note.display_title()), tty)?;
    let color = color_name(note);
    if !color.is_empty() {
        pretty_line(out, "color: ", &format!("{}\n", color), tty)?;
    }
    let date = short_date(note);
    if !date.is_empty() {
        pretty_line(out, "modified: ", &format!("{}\n", date), tty)?;
    }
    let content = note.content_str();
    if !content.is_empty() {
        pretty_line(out, "\ncontent\n-------\n", &format!("{}\n", content), tty)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Swatch;

    fn render(notes: &[Note], limit: usize, empty: &str) -> String {
        let mut out = vec![];
        write_list(&mut out, notes, limit, empty).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn empty_messages() {
        assert_eq!(render(&[], 0, EMPTY_LIST), "No notes yet.\n");
        assert_eq!(render(&[], 0, NO_RESULTS), "No results found\n");
    }

    #[test]
    fn rows_show_title_color_and_preview() {
        let notes = vec![
            Note::new("", &format!("<b>{}</b>", "y".repeat(150)))
                .with_id("note-1")
                .with_color(NoteColor::Structured(Swatch::named("pink").unwrap())),
            Note::new("Short", "").with_id("note-22"),
        ];
        let text = render(&notes, 0, EMPTY_LIST);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("note-1   Untitled  pink"));
        assert_eq!(lines[1], format!("    {}...", "y".repeat(100)));
        assert!(lines[2].starts_with("note-22  Short"));
    }

    #[test]
    fn limit_cuts_rows() {
        let notes: Vec<Note> = (0..5).map(|i| Note::new(&format!("n{}", i), "").with_id(&i.to_string())).collect();
        assert_eq!(render(&notes, 2, EMPTY_LIST).lines().count(), 2);
        assert_eq!(render(&notes, 0, EMPTY_LIST).lines().count(), 5);
    }

    #[test]
    fn single_note_view() {
        let n = Note::new("Plan", "<i>soon</i>").with_id("note-7");
        let mut out = vec![];
        write_note(&mut out, &n, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("id: note-7\ntitle: Plan\n"));
        assert!(text.ends_with("content\n-------\n<i>soon</i>\n"));
    }
}
