// Copyright 2026 Bizsearch Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(
    name = "bizsearch",
    version,
    about = "Listing search shaping and result formatting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build or parse outbound search queries
    #[command(subcommand)]
    Query(QueryCommands),

    /// Format a search response into listing view models
    Present(PresentArgs),

    /// Compute the pagination window
    Window(WindowArgs),

    /// Run a single formatter
    #[command(subcommand)]
    Format(FormatCommands),

    /// Replay a filter edit script through the filter controller
    Replay(ReplayArgs),

    /// Show or initialize configuration
    Config {
        /// Write the default config file
        #[arg(long)]
        init: bool,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum QueryCommands {
    /// Build query parameters from filter criteria
    Build(BuildArgs),

    /// Reconstruct filter criteria from a query string or URL
    Parse(ParseArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// ZIP code
    #[arg(long)]
    pub zip: Option<String>,

    /// Maximum distance in miles ("all" for no limit)
    #[arg(long)]
    pub distance: Option<String>,

    /// Category ("all" for any)
    #[arg(long)]
    pub category: Option<String>,

    /// Keyword
    #[arg(long)]
    pub keyword: Option<String>,

    /// Page number
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Print a navigable link instead of the bare query string
    #[arg(long)]
    pub url: bool,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Query string, path, or URL
    pub input: String,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PresentArgs {
    /// Search response JSON file ("-" for stdin)
    #[arg(required_unless_present = "failed")]
    pub response: Option<PathBuf>,

    /// Listing ids to show with full narrative
    #[arg(long)]
    pub expand: Vec<String>,

    /// Narrative length before truncation
    #[arg(long)]
    pub narrative_len: Option<usize>,

    /// Treat the fetch as failed with this message
    #[arg(long, conflicts_with = "response")]
    pub failed: Option<String>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Current page
    #[arg(long)]
    pub current: u32,

    /// Total pages
    #[arg(long)]
    pub total: u32,

    /// Window size
    #[arg(long)]
    pub size: Option<u32>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum FormatCommands {
    /// Format a price range
    Price {
        /// Minimum price
        #[arg(long)]
        min: Option<f64>,

        /// Maximum price
        #[arg(long)]
        max: Option<f64>,

        /// Price unit
        #[arg(long)]
        unit: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Mask a phone number
    Phone {
        /// Raw phone number
        raw: String,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Truncate narrative text
    Truncate {
        /// Text to truncate
        text: String,

        /// Maximum characters
        #[arg(long)]
        max_len: Option<usize>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSONL script of timestamped edits ("-" for stdin)
    pub script: PathBuf,

    /// Apply policy: auto or explicit
    #[arg(long, default_value = "auto")]
    pub mode: String,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}
