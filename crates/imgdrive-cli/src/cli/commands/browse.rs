//! Folder browsing commands and the interactive `browse` shell.

use std::io::{IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result};
use imgdrive_core::browser::{DisplaySet, FolderBrowserModel};
use imgdrive_core::config::Config;
use imgdrive_core::upload::UploadFile;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::require_session;

const SHELL_HELP: &str = "\
Commands:
  ls                 list the open folder
  cd NAME            open a sub-folder
  cd ..              open the parent folder
  crumb N            jump to breadcrumb N (0 is the root)
  search QUERY       search all images by name
  clear              leave search mode
  mkdir NAME         create a folder here
  upload FILE [NAME] upload an image here
  pwd                show the open folder's path
  help               show this help
  quit               exit";

pub async fn ls(config: &Config, path: &str) -> Result<()> {
    let mut browser = open_browser(config).await?;
    open_path(&mut browser, path).await?;
    print_listing(&browser);
    Ok(())
}

pub async fn search(config: &Config, query: &str) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Search query is required");
    }

    let mut browser = open_browser(config).await?;
    browser.search(query).await?;
    let shown = browser.display();
    if shown.is_empty() {
        println!("No images found for \"{query}\"");
    } else {
        print_items(&shown);
    }
    Ok(())
}

pub async fn mkdir(config: &Config, path: &str) -> Result<()> {
    let (parent, name) = match path.trim_matches('/').rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", path.trim_matches('/')),
    };

    let mut browser = open_browser(config).await?;
    open_path(&mut browser, parent).await?;
    let parent_id = browser.current_folder().id.clone();
    let folder = browser.create_folder(name, &parent_id).await?;
    println!("Created folder {} in {}", folder.name, browser.path());
    Ok(())
}

pub async fn upload(config: &Config, file: &Path, to: &str, name: Option<&str>) -> Result<()> {
    let upload = UploadFile::read(file)?;
    let name = name.map_or_else(|| default_image_name(file), str::to_string);
    tracing::debug!(file = %file.display(), to, "upload requested");

    let mut browser = open_browser(config).await?;
    open_path(&mut browser, to).await?;
    let folder_id = browser.current_folder().id.clone();
    let image = browser.upload_image(&name, &upload, &folder_id).await?;
    println!("Uploaded {} to {}", image.name, browser.path());
    Ok(())
}

/// Reads shell commands from stdin until `quit` or end of input.
pub async fn shell(config: &Config) -> Result<()> {
    let mut browser = open_browser(config).await?;
    browser.open_root().await?;
    print_listing(&browser);

    let interactive = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            print!("{}> ", browser.current_folder().name);
            std::io::stdout().flush().context("flush stdout")?;
        }

        let Some(line) = lines.next_line().await.context("read command")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        match run_shell_command(&mut browser, command, arg).await {
            Ok(ShellFlow::Continue) => {}
            Ok(ShellFlow::Quit) => break,
            Err(e) => {
                tracing::debug!(command, error = %e, "shell command failed");
                eprintln!("Error: {e:#}");
            }
        }
    }
    Ok(())
}

enum ShellFlow {
    Continue,
    Quit,
}

async fn run_shell_command(
    browser: &mut FolderBrowserModel,
    command: &str,
    arg: &str,
) -> Result<ShellFlow> {
    match command {
        "ls" => print_listing(browser),
        "cd" if arg == ".." => {
            if browser.navigate_up().await? {
                print_listing(browser);
            } else {
                println!("Already at {}", browser.current_folder().name);
            }
        }
        "cd" => {
            enter_sub_folder(browser, arg).await?;
            print_listing(browser);
        }
        "crumb" => {
            let index: usize = arg
                .parse()
                .with_context(|| format!("invalid breadcrumb index '{arg}'"))?;
            if index >= browser.path().len() {
                anyhow::bail!("No breadcrumb {index}");
            }
            browser.navigate_to_breadcrumb(index).await?;
            print_listing(browser);
        }
        "search" => {
            browser.search(arg).await?;
            print_listing(browser);
        }
        "clear" => {
            browser.clear_search().await?;
            print_listing(browser);
        }
        "mkdir" => {
            let parent_id = browser.current_folder().id.clone();
            let folder = browser.create_folder(arg, &parent_id).await?;
            println!("Created folder {}", folder.name);
            browser.refresh().await?;
        }
        "upload" => {
            let (file, name) = match arg.split_once(char::is_whitespace) {
                Some((file, name)) => (Path::new(file), name.trim().to_string()),
                None => (Path::new(arg), default_image_name(Path::new(arg))),
            };
            if file.as_os_str().is_empty() {
                anyhow::bail!("Please select an image file.");
            }
            let upload = UploadFile::read(file)?;
            let folder_id = browser.current_folder().id.clone();
            let image = browser.upload_image(&name, &upload, &folder_id).await?;
            println!("Uploaded {}", image.name);
            browser.refresh().await?;
        }
        "pwd" => print_breadcrumbs(browser),
        "help" => println!("{SHELL_HELP}"),
        "quit" | "exit" => return Ok(ShellFlow::Quit),
        other => anyhow::bail!("Unknown command '{other}'. Type 'help' for commands."),
    }
    Ok(ShellFlow::Continue)
}

async fn open_browser(config: &Config) -> Result<FolderBrowserModel> {
    let session = require_session(config).await?;
    Ok(FolderBrowserModel::new(session.api().clone()))
}

/// Opens the root, then each '/'-separated folder name in turn.
async fn open_path(browser: &mut FolderBrowserModel, path: &str) -> Result<()> {
    browser.open_root().await?;
    for name in path.split('/').map(str::trim).filter(|s| !s.is_empty()) {
        enter_sub_folder(browser, name).await?;
    }
    Ok(())
}

async fn enter_sub_folder(browser: &mut FolderBrowserModel, name: &str) -> Result<()> {
    if browser.display().searching {
        anyhow::bail!("Folders are hidden while searching. Type 'clear' first.");
    }
    let folder = browser
        .state()
        .find_sub_folder(name)
        .cloned()
        .with_context(|| format!("No folder named '{name}' in {}", browser.path()))?;
    browser.navigate_into(folder).await?;
    Ok(())
}

fn default_image_name(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn print_breadcrumbs(browser: &FolderBrowserModel) {
    let crumbs: Vec<String> = browser
        .path()
        .labels()
        .into_iter()
        .enumerate()
        .map(|(i, label)| format!("[{i}] {label}"))
        .collect();
    println!("{}", crumbs.join(" > "));
}

fn print_listing(browser: &FolderBrowserModel) {
    let shown = browser.display();
    if shown.searching {
        println!("Search: \"{}\"", browser.state().query());
    } else {
        print_breadcrumbs(browser);
    }

    match shown.empty_message() {
        Some(message) => println!("{message}"),
        None => print_items(&shown),
    }
}

fn print_items(shown: &DisplaySet<'_>) {
    for folder in shown.sub_folders {
        println!("{}/", folder.name);
    }
    for image in shown.images {
        println!("{}  {}", image.name, image.image_url);
    }
}
