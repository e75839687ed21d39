use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};

use snipdex_lib::config::{self, BrowserConfig};
use snipdex_lib::{
    logging, render_rows, CatalogBrowser, CatalogState, ContentView, FolderPath, HttpCatalogSource,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Catalog host, e.g. https://example.github.io/snippets-api
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the catalog tree
    Tree {
        #[arg(short, long)]
        query: Option<String>,
        /// Folder path to collapse; repeatable
        #[arg(long)]
        collapse: Vec<String>,
        /// Emit rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one snippet
    Show { leaf_path: String },
    /// Interactive session on stdin
    Browse,
    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

type Browser = CatalogBrowser<HttpCatalogSource>;

fn resolve_config(cli: &Cli) -> (PathBuf, BrowserConfig) {
    dotenv().ok();
    let path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut cfg = config::load_config(&path);
    cfg.apply_env_overrides();
    if let Some(url) = &cli.base_url {
        cfg.base_url = url.clone();
    }
    (path, cfg)
}

fn print_content(view: Option<ContentView>) {
    match view {
        Some(view) => {
            println!("── {} ({}) ──", view.path, view.language);
            println!("{}", view.text);
        }
        None => println!("(no snippet selected)"),
    }
}

fn print_tree(browser: &Browser) {
    let rows = browser.rows();
    if rows.is_empty() {
        println!("(no matches)");
    } else {
        print!("{}", render_rows(&rows));
    }
}

/// Block on the index; a failed load replaces the whole tree with a message.
async fn mount_or_report(browser: &Browser) -> bool {
    match browser.mount().await {
        CatalogState::Loaded(_) => true,
        CatalogState::Failed(message) => {
            eprintln!("Could not load the snippet catalog: {}", message);
            false
        }
        other => {
            eprintln!("Catalog not available ({:?})", other);
            false
        }
    }
}

/// Accept either a leaf path or a leaf name that is unique in the catalog.
fn resolve_leaf(browser: &Browser, arg: &str) -> Option<String> {
    let CatalogState::Loaded(root) = browser.catalog_status() else {
        return None;
    };
    if root.contains_leaf(arg) {
        return Some(arg.to_string());
    }
    let matches: Vec<String> = root
        .leaves()
        .into_iter()
        .filter(|leaf| leaf.name == arg)
        .map(|leaf| leaf.path.to_string())
        .collect();
    match matches.as_slice() {
        [only] => Some(only.clone()),
        [] => None,
        _ => {
            eprintln!("'{}' is ambiguous: {}", arg, matches.join(", "));
            None
        }
    }
}

/// Match a folder by its displayed path, so names containing `/` still resolve.
fn resolve_folder(browser: &Browser, arg: &str) -> Option<FolderPath> {
    match browser.catalog_status() {
        CatalogState::Loaded(root) => root.find_folder(arg),
        _ => None,
    }
}

const BROWSE_HELP: &str = "\
commands:
  /<text>          filter the catalog (/ alone clears)
  toggle <folder>  collapse or expand a folder, e.g. toggle basics/useState
  open <leaf>      show a snippet by path or name
  tree             print the catalog
  reload           fetch the catalog again
  help | quit";

async fn browse(browser: &Browser) -> Result<(), Box<dyn std::error::Error>> {
    if mount_or_report(browser).await {
        print_tree(browser);
    }
    println!("{}", BROWSE_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if let Some(query) = line.strip_prefix('/') {
            browser.set_query(query);
            print_tree(browser);
            continue;
        }
        let (command, arg) = line
            .split_once(char::is_whitespace)
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((line, ""));
        match command {
            "" => {}
            "quit" | "exit" => break,
            "help" => println!("{}", BROWSE_HELP),
            "tree" => print_tree(browser),
            "reload" => {
                if reload_or_report(browser).await {
                    print_tree(browser);
                }
            }
            "toggle" => match resolve_folder(browser, arg) {
                Some(path) => {
                    let collapsed = browser.toggle(path);
                    println!("{} {}", if collapsed { "collapsed" } else { "expanded" }, arg);
                    print_tree(browser);
                }
                None => println!("no folder named '{}'", arg),
            },
            "open" => match resolve_leaf(browser, arg) {
                Some(path) => {
                    if browser.select(path) {
                        println!("Loading snippet...");
                        browser.settle().await;
                    }
                    print_content(browser.content());
                }
                None => println!("no snippet named '{}'", arg),
            },
            other => println!("unknown command '{}'; try help", other),
        }
    }
    Ok(())
}

async fn reload_or_report(browser: &Browser) -> bool {
    match browser.reload().await {
        CatalogState::Loaded(_) => true,
        CatalogState::Failed(message) => {
            eprintln!("Could not load the snippet catalog: {}", message);
            false
        }
        _ => false,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let (config_path, cfg) = resolve_config(&cli);
    if let Some(Commands::Config { save }) = &cli.command {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        if *save {
            config::save_config(&config_path, &cfg)?;
            println!("Saved to {}", config_path.display());
        }
        return Ok(ExitCode::SUCCESS);
    }
    tracing::info!("[SNIPDEX] Using catalog at {}", cfg.normalized_base_url());
    let source = HttpCatalogSource::new(&cfg)?;
    let browser = CatalogBrowser::new(source, &cfg);

    match cli.command.unwrap_or(Commands::Browse) {
        Commands::Tree {
            query,
            collapse,
            json,
        } => {
            if !mount_or_report(&browser).await {
                return Ok(ExitCode::FAILURE);
            }
            if let Some(query) = query {
                browser.set_query(query);
            }
            for folder in collapse {
                match resolve_folder(&browser, &folder) {
                    Some(path) => {
                        browser.toggle(path);
                    }
                    None => eprintln!("no folder named '{}'", folder),
                }
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&browser.rows())?);
            } else {
                print_tree(&browser);
            }
        }
        Commands::Show { leaf_path } => {
            if !mount_or_report(&browser).await {
                return Ok(ExitCode::FAILURE);
            }
            let Some(path) = resolve_leaf(&browser, &leaf_path) else {
                eprintln!("'{}' is not in the catalog", leaf_path);
                return Ok(ExitCode::FAILURE);
            };
            browser.select(path);
            browser.settle().await;
            let view = browser.content();
            let failed = view.as_ref().is_some_and(|v| v.failed);
            print_content(view);
            if failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Browse => browse(&browser).await?,
        Commands::Config { .. } => {}
    }
    Ok(ExitCode::SUCCESS)
}
