use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "instarelay")]
#[command(author, version, about = "Discord bot that relays Instagram media into a channel", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to Discord and run the bot (default)
    Run,

    /// Print the installed yt-dlp version and exit
    CheckYtdlp,

    /// Download one Instagram link with the relay's source chain
    Download {
        /// Instagram post, reel, or story URL
        url: String,

        /// Directory to keep the file in (default: current directory)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Look up a profile and print it as JSON
    Profile {
        /// Instagram username, with or without @
        username: String,
    },

    /// Look up active stories and print them as JSON
    Stories {
        /// Instagram username, with or without @
        username: String,
    },

    /// Look up a reel and print it as JSON
    Reel {
        /// Reel URL
        url: String,
    },

    /// Look up a post and print it as JSON
    Post {
        /// Post URL
        url: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
