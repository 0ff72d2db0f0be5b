use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "quill")]
#[command(version)]
#[command(about = "a small rich-text note keeper for the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// View note by ID (positional)
    #[arg(required = false)]
    pub id: Option<String>,

    /// Data folder to use
    #[arg(long, env = "QUILL_DATA_FOLDER")]
    pub data_folder: Option<String>,

    /// Seed an empty store from this JSON file instead of the bundled notes
    #[arg(long)]
    pub defaults: Option<String>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List notes, newest first (default if no command)
    List {
        /// Limit results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Search titles and content
    Search {
        query: String,

        /// Limit results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Create a note and make it the one being edited
    New {
        #[arg(short, long, default_value = "")]
        title: String,

        #[arg(short, long, default_value = "")]
        content: String,

        /// pink, blue, green, yellow or white
        #[arg(long)]
        color: Option<String>,
    },

    /// Make an existing note the one being edited
    Open {
        id: String,
    },

    /// Change the note being edited
    Edit {
        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        /// Add to the end of the content instead of replacing it
        #[arg(short, long)]
        append: Option<String>,
    },

    /// Set the color of the note being edited
    Color {
        /// pink, blue, green, yellow or white
        name: String,
    },

    /// Embed a file in the note being edited
    Attach {
        file: String,
    },

    /// Type text into the note being edited with inline formatting
    Type {
        text: String,

        #[arg(long)]
        bold: bool,

        #[arg(long)]
        italic: bool,

        #[arg(long)]
        underline: bool,

        /// Put the text in a bulleted list
        #[arg(long)]
        bullets: bool,

        /// Put the text in a numbered list
        #[arg(long, conflicts_with = "bullets")]
        numbered: bool,
    },

    /// Delete a note (the one being edited when no ID is given)
    Del {
        id: Option<String>,
    },

    /// Translate text, optionally appending it to the note being edited
    Translate {
        text: String,

        /// Source language code
        #[arg(long)]
        from: Option<String>,

        /// Target language code
        #[arg(long)]
        to: Option<String>,

        /// Exchange source and target before translating
        #[arg(short, long)]
        swap: bool,

        #[arg(short, long)]
        insert: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_id_views() {
        let cli = Cli::try_parse_from(["quill", "note-1"]).unwrap();
        assert_eq!(cli.id.as_deref(), Some("note-1"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn type_flags() {
        let cli = Cli::try_parse_from(["quill", "type", "hello", "--bold", "--numbered"]).unwrap();
        match cli.command {
            Some(Commands::Type { text, bold, numbered, bullets, .. }) => {
                assert_eq!(text, "hello");
                assert!(bold && numbered && !bullets);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Cli::try_parse_from(["quill", "type", "x", "--bullets", "--numbered"]).is_err());
    }

    #[test]
    fn translate_options() {
        let cli = Cli::try_parse_from(["quill", "translate", "hola", "--to", "es", "-s", "-i"]).unwrap();
        match cli.command {
            Some(Commands::Translate { text, from, to, swap, insert }) => {
                assert_eq!(text, "hola");
                assert_eq!(from, None);
                assert_eq!(to.as_deref(), Some("es"));
                assert!(swap && insert);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn global_options() {
        let cli = Cli::try_parse_from(["quill", "--data-folder", "/tmp/q", "-y", "del"]).unwrap();
        assert_eq!(cli.data_folder.as_deref(), Some("/tmp/q"));
        assert!(cli.yes);
        assert!(matches!(cli.command, Some(Commands::Del { id: None })));
    }
}
