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

mod classify;
mod cli;
mod config;
mod filter;
mod format;
mod model;
mod output;
mod present;
mod query;
mod replay;

use std::collections::BTreeSet;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use anyhow::Context as _;
use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::cli::BuildArgs;
use crate::cli::Cli;
use crate::cli::Commands;
use crate::cli::FormatCommands;
use crate::cli::ParseArgs;
use crate::cli::PresentArgs;
use crate::cli::QueryCommands;
use crate::cli::ReplayArgs;
use crate::cli::WindowArgs;
use crate::config::Config;
use crate::filter::ApplyPolicy;
use crate::filter::FilterField;
use crate::filter::assign_field;
use crate::model::ALLOWED_MAX_MILES;
use crate::model::FilterCriteria;
use crate::model::SearchResponse;
use crate::output::JsonResponse;
use crate::output::QueryOut;
use crate::output::StatsOut;
use crate::output::print_json;
use crate::present::ResultState;
use crate::present::SearchResultPresenter;
use crate::query::QueryParams;
use crate::query::SearchQueryBuilder;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_global_config()?;
    match cli.command {
        Commands::Query(QueryCommands::Build(args)) => {
            let json = args.json;
            handle_result(cmd_query_build(&config, args), json)
        }
        Commands::Query(QueryCommands::Parse(args)) => {
            let json = args.json;
            handle_result(cmd_query_parse(&config, args), json)
        }
        Commands::Present(args) => {
            let json = args.json;
            handle_result(cmd_present(&config, args), json)
        }
        Commands::Window(args) => {
            let json = args.json;
            handle_result(cmd_window(&config, args), json)
        }
        Commands::Format(command) => cmd_format(&config, command),
        Commands::Replay(args) => {
            let json = args.json;
            handle_result(cmd_replay(&config, args), json)
        }
        Commands::Config { init, json } => handle_result(cmd_config(&config, init, json), json),
    }
}

fn handle_result(result: Result<()>, json: bool) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            if json {
                let resp = JsonResponse::error("error", &format!("{err:#}"));
                print_json(&resp)?;
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn query_out(
    builder: &SearchQueryBuilder,
    config: &Config,
    criteria: FilterCriteria,
    page: u32,
    with_url: bool,
) -> QueryOut {
    let query_string = builder.build(&criteria, page).to_query_string();
    let url = with_url.then(|| builder.deep_link(&config.search_path, &criteria, page));
    QueryOut {
        criteria,
        page,
        limit: builder.limit(),
        query_string,
        url,
    }
}

fn cmd_query_build(config: &Config, args: BuildArgs) -> Result<()> {
    if args.page == 0 {
        anyhow::bail!("page numbers start at 1");
    }
    let mut criteria = FilterCriteria::default();
    let fields = [
        (FilterField::ZipCode, args.zip.as_deref()),
        (FilterField::MaxMiles, args.distance.as_deref()),
        (FilterField::Category, args.category.as_deref()),
        (FilterField::Keyword, args.keyword.as_deref()),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            assign_field(&mut criteria, field, value)?;
        }
    }
    if let Some(miles) = criteria.max_miles
        && !ALLOWED_MAX_MILES.contains(&miles)
    {
        anyhow::bail!(
            "distance must be one of {:?} miles (got {miles})",
            ALLOWED_MAX_MILES
        );
    }

    let builder = SearchQueryBuilder::new(config.page_limit);
    let out = query_out(&builder, config, criteria, args.page, args.url);

    if args.json {
        print_json(&JsonResponse::ok().with_query(out))?;
    } else if let Some(url) = out.url {
        println!("{url}");
    } else {
        println!("{}", out.query_string);
    }
    Ok(())
}

fn cmd_query_parse(config: &Config, args: ParseArgs) -> Result<()> {
    let params = QueryParams::parse(&args.input);
    let criteria = query::parse_query(&params)?;
    let page = query::parse_page(&params)?;

    let builder = SearchQueryBuilder::new(config.page_limit);
    let out = query_out(&builder, config, criteria, page, true);

    if args.json {
        print_json(&JsonResponse::ok().with_query(out))?;
    } else {
        let c = &out.criteria;
        if c.is_empty() {
            println!("(no filters)");
        }
        let show = |v: Option<&str>| v.unwrap_or("-").to_string();
        println!("zipCode\t{}", show(c.zip_code.as_deref()));
        println!(
            "maxMiles\t{}",
            c.max_miles.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string())
        );
        println!("category\t{}", show(c.category.as_deref()));
        println!("keyword\t{}", show(c.keyword.as_deref()));
        println!("page\t{}", out.page);
    }
    Ok(())
}

fn cmd_present(config: &Config, args: PresentArgs) -> Result<()> {
    let narrative_len = args.narrative_len.unwrap_or(config.narrative_max_len);
    let mut presenter = SearchResultPresenter::new(narrative_len, config.window_size);
    let mut warnings = Vec::new();

    if let Some(message) = args.failed {
        presenter.fail(message);
    } else if let Some(path) = &args.response {
        let mut text = String::new();
        open_input(path)?
            .read_to_string(&mut text)
            .with_context(|| format!("read {}", path.display()))?;
        let response: SearchResponse =
            serde_json::from_str(&text).context("decode search response")?;
        let known: BTreeSet<String> = response
            .results
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        presenter.replace_results(response);

        let requested: BTreeSet<&str> = args.expand.iter().map(String::as_str).collect();
        for id in requested {
            if !known.contains(id) {
                warnings.push(format!("no listing with id `{id}` in results"));
                continue;
            }
            presenter.toggle_narrative(id);
        }
    }

    let (response, window) = match presenter.state() {
        ResultState::Failed(message) => {
            if args.json {
                let resp = JsonResponse::error("search_failed", message);
                print_json(&resp)?;
                return Ok(());
            }
            anyhow::bail!("search failed: {message}");
        }
        ResultState::Empty => anyhow::bail!("no search response given"),
        ResultState::Loaded(response) => (response, presenter.page_window()),
    };

    let view_models = presenter.view_models();
    if args.json {
        let results = view_models
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        let mut resp = JsonResponse::ok()
            .with_results(results)
            .with_stats(StatsOut {
                total_count: response.total_count,
                returned: view_models.len(),
                expanded: presenter.expanded().len(),
            })
            .with_warnings(warnings);
        if let Some(window) = window {
            resp = resp.with_page(window);
        }
        print_json(&resp)?;
    } else {
        for warn in &warnings {
            eprintln!("warning: {warn}");
        }
        for vm in &view_models {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                vm.id,
                vm.badge_label,
                vm.title,
                vm.price_display.as_deref().unwrap_or("-"),
                vm.masked_phone.as_deref().unwrap_or("-"),
                vm.narrative_display
            );
        }
        if let Some(window) = window {
            println!(
                "page {} of {} (showing {}-{})",
                window.current_page, window.total_pages, window.window_start, window.window_end
            );
        }
    }
    Ok(())
}

fn cmd_window(config: &Config, args: WindowArgs) -> Result<()> {
    let size = args.size.unwrap_or(config.window_size);
    if size == 0 {
        anyhow::bail!("window size must be at least 1");
    }
    let window = format::compute_window(args.current, args.total, size);
    if args.json {
        print_json(&JsonResponse::ok().with_page(window))?;
    } else {
        let mut pages: Vec<String> = Vec::new();
        if window.has_previous() {
            pages.push("<".to_string());
        }
        pages.extend(window.pages().map(|p| {
            if p == window.current_page {
                format!("[{p}]")
            } else {
                p.to_string()
            }
        }));
        if window.has_next() {
            pages.push(">".to_string());
        }
        println!("{}", pages.join(" "));
    }
    Ok(())
}

fn cmd_format(config: &Config, command: FormatCommands) -> Result<()> {
    match command {
        FormatCommands::Price {
            min,
            max,
            unit,
            json,
        } => {
            let price = format::format_price(min, max, unit.as_deref());
            if json {
                print_json(&JsonResponse::ok().with_value(json!(price)))?;
            } else {
                println!("{}", price.as_deref().unwrap_or("(no price)"));
            }
        }
        FormatCommands::Phone { raw, json } => {
            let masked = format::mask_phone(&raw);
            if json {
                print_json(&JsonResponse::ok().with_value(json!(masked)))?;
            } else {
                println!("{masked}");
            }
        }
        FormatCommands::Truncate {
            text,
            max_len,
            json,
        } => {
            let t = format::truncate(&text, max_len.unwrap_or(config.narrative_max_len));
            if json {
                let value = json!({
                    "display": t.display,
                    "wasTruncated": t.was_truncated,
                });
                print_json(&JsonResponse::ok().with_value(value))?;
            } else {
                println!("{}", t.display);
            }
        }
    }
    Ok(())
}

fn cmd_replay(config: &Config, args: ReplayArgs) -> Result<()> {
    let policy: ApplyPolicy = args.mode.parse()?;
    let steps = replay::read_script(open_input(&args.script)?)?;
    let builder = SearchQueryBuilder::new(config.page_limit);
    let report = replay::replay(&steps, policy, config.debounce(), &builder)?;

    if args.json {
        let resp = JsonResponse::ok().with_replay(serde_json::to_value(&report)?);
        print_json(&resp)?;
    } else {
        for apply in &report.applies {
            println!(
                "{}ms\t{:?}\t#{}\t{}",
                apply.at_ms, apply.trigger, apply.sequence, apply.query
            );
        }
        if report.pending_changes {
            println!("pending changes not applied");
        }
    }
    Ok(())
}

fn cmd_config(config: &Config, init: bool, json: bool) -> Result<()> {
    let path = config::global_config_path()
        .ok_or_else(|| anyhow::anyhow!("config directory unavailable"))?;
    if init {
        config::write_config(&path, &Config::default())?;
    }
    if json {
        let value = json!({
            "path": path.display().to_string(),
            "config": serde_json::to_value(config)?,
        });
        print_json(&JsonResponse::ok().with_value(value))?;
    } else if init {
        println!("Wrote default config to {}", path.display());
    } else {
        println!("# {}", path.display());
        print!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}
