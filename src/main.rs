use std::env;
use std::path::Path;
use tracing::error;

use dashdeck::collection::MoveRequest;
use dashdeck::config::Config;
use dashdeck::format::format_bytes;
use dashdeck::logging;
use dashdeck::models::LayoutMode;
use dashdeck::notifications::NotificationLevel;
use dashdeck::persistence::Persistence;
use dashdeck::upload::RawFile;
use dashdeck::{Dashboard, Surface};

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };
    logging::init(config.debug);
    config.log_summary();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let persistence = match Persistence::open(&config.store).await {
        Ok(persistence) => persistence,
        Err(e) => {
            error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let mut dashboard = Dashboard::from_config(&config, persistence).await;
    let mut notifications = dashboard.notifier().subscribe();

    let ok = run(&mut dashboard, &args[1], &args[2..]).await;

    while let Ok(notification) = notifications.try_recv() {
        // Loading toasts are replaced by their outcome, nothing to show headless
        if notification.level != NotificationLevel::Loading {
            println!("[{:?}] {}", notification.level, notification.message);
        }
    }

    if !ok {
        print_usage(&args[0]);
        std::process::exit(1);
    }
}

/// Run one command. `false` means the arguments were not understood.
async fn run(dashboard: &mut Dashboard, command: &str, rest: &[String]) -> bool {
    match (command, rest) {
        ("widgets", []) => {
            for (index, widget) in dashboard.widgets().iter().enumerate() {
                println!("{:>2}. {:<14} {}", index + 1, widget.id, widget.title);
            }
        }
        ("move-widget", [active, target]) => {
            let request = MoveRequest::new(active.as_str(), target.as_str());
            if dashboard.apply_move(Surface::Widgets, &request).await {
                let ids: Vec<_> = dashboard.widgets().iter().map(|w| w.id.as_str()).collect();
                println!("{}", ids.join(" "));
            } else {
                println!("Nothing to move");
            }
        }
        ("assets", []) => {
            println!("Layout: {}", dashboard.layout_mode());
            for asset in dashboard.assets() {
                println!(
                    "{}  {:<32} {:<24} {:>10}  {}",
                    asset.id,
                    asset.name,
                    asset.mime_type,
                    format_bytes(asset.size),
                    asset.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        ("upload", paths) if !paths.is_empty() => {
            let mut files = Vec::with_capacity(paths.len());
            for path in paths {
                let path = Path::new(path);
                match RawFile::from_path(path, guess_mime_type(path)).await {
                    Ok(file) => files.push(file),
                    Err(e) => error!("Skipping {}: {}", path.display(), e),
                }
            }

            let report = dashboard.stage_files(files);
            println!(
                "Staged {} files, rejected {}",
                report.accepted.len(),
                report.rejected.len()
            );

            match dashboard.commit_upload().await {
                Ok(added) => println!("Added {} assets", added),
                Err(e) => error!("Upload failed: {}", e),
            }
        }
        ("rename", [id, name]) => {
            if !dashboard.rename_asset(id, name).await {
                println!("Nothing renamed");
            }
        }
        ("delete", [id]) => {
            if !dashboard.delete_asset(id).await {
                println!("No asset {}", id);
            }
        }
        ("layout", []) => println!("{}", dashboard.layout_mode()),
        ("layout", [mode]) => match mode.parse::<LayoutMode>() {
            Ok(mode) => {
                dashboard.set_layout_mode(mode).await;
                println!("{}", dashboard.layout_mode());
            }
            Err(e) => {
                error!("{}", e);
                return false;
            }
        },
        _ => return false,
    }
    true
}

/// MIME type from the file extension, octet-stream when unknown
fn guess_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command>", program);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  widgets                     List widgets in order");
    eprintln!("  move-widget <id> <target>   Move a widget onto another's slot");
    eprintln!("  assets                      List uploaded assets");
    eprintln!("  upload <file>...            Upload files (5 MiB limit by default)");
    eprintln!("  rename <id> <name>          Rename an asset");
    eprintln!("  delete <id>                 Delete an asset");
    eprintln!("  layout [grid|table]         Show or set the gallery layout");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  DASHDECK_STORE_PATH         Database file (default ~/.dashdeck/dashboard.db)");
    eprintln!("  DASHDECK_MEMORY_STORE=1     Keep nothing between runs");
    eprintln!("  RUST_LOG                    Log filter");
}
