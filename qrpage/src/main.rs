use std::path::PathBuf;
use std::sync::Arc;

use qrpage::config::ConfigOverrides;
use qrpage::download::DirectorySink;
use qrpage::{KeyPress, Page, PageConfig, QrCodeEncoder};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn die(msg: &str) -> ! {
    eprintln!("ERROR: {msg}");
    std::process::exit(1);
}

fn usage() -> ! {
    eprintln!(
        r#"qrpage - QR code page driven from stdin

Usage:
  qrpage [--dir <config_dir>] [--out <download_dir>] [--size <px>] [--color <#hex>]

Config resolution (if omitted):
  flag > QRPAGE_* env > <dir>/.env > defaults
  keys: QRPAGE_DOWNLOAD_DIR, QRPAGE_SIZE, QRPAGE_COLOR, QRPAGE_DEBOUNCE_MS, QRPAGE_STATUS_CLEAR_MS

Input (one per line):
  <text>           Replace the text field (auto-generates after a quiet period)
  :enter           Press Enter in the text field
  :generate        Click the generate button
  :download        Click the download button
  :size <px>       Pick a size
  :color <#hex>    Pick a color
  :show            Print the page state
  :quit            Exit
"#
    );
    std::process::exit(2);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qrpage=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The value following the flag at `i`; a missing value is fatal.
fn flag_value(args: &[String], i: usize) -> String {
    match args.get(i + 1) {
        Some(v) if !v.starts_with("--") => v.clone(),
        _ => die(&format!("missing value for {}", args[i])),
    }
}

fn print_view(page: &Page) {
    let view = page.view();
    match serde_json::to_string_pretty(&view) {
        Ok(s) => println!("{s}"),
        Err(e) => error!("failed to serialize page state: {}", e),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let mut args: Vec<String> = std::env::args().collect();
    let _exe = args.remove(0);

    let mut dir: Option<String> = None;
    let mut overrides = ConfigOverrides::default();

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "--help" || flag == "-h" {
            usage();
        }
        match flag {
            "--dir" => dir = Some(flag_value(&args, i)),
            "--out" => overrides.download_dir = Some(flag_value(&args, i)),
            "--size" => overrides.size = Some(flag_value(&args, i)),
            "--color" => overrides.color = Some(flag_value(&args, i)),
            other => die(&format!("unknown argument: {other}")),
        }
        i += 2;
    }

    let dir = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let config = PageConfig::load(&dir, overrides).unwrap_or_else(|e| die(&e.to_string()));
    info!(
        "page ready: {}px {}, downloads to {}",
        config.default_size,
        config.default_color,
        config.download_dir.display()
    );

    let sink = Arc::new(DirectorySink::new(config.download_dir.clone()));
    let page = Page::new(config, Arc::new(QrCodeEncoder), sink);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => die(&format!("failed to read stdin: {e}")),
        };

        let (cmd, arg) = match line.split_once(' ') {
            Some((c, a)) if c.starts_with(':') => (c, a.trim()),
            _ => (line.as_str(), ""),
        };
        match cmd {
            ":enter" => {
                page.on_key_press(&KeyPress::new("Enter", false));
            }
            ":generate" => page.on_generate_click(),
            ":download" => page.on_download_click(),
            ":size" => page.set_size_str(arg),
            ":color" => page.set_color(arg),
            ":show" => print_view(&page),
            ":quit" => break,
            _ if cmd.starts_with(':') => eprintln!("unknown command: {cmd} (see --help)"),
            _ => page.on_text_input(&line),
        }
    }

    // Pending debounced input and overlapping generations land before exit.
    page.settle().await;
    print_view(&page);
}
