use camcast::config::CamcastConfig;
use camcast::service::StreamService;
use camcast::testing::SyntheticCamera;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    camcast::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "run" => cmd_run(&args).await,
        "print-config" => cmd_print_config(&args),
        "version" => {
            println!("{} {}", camcast::NAME, camcast::VERSION);
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: camcast-cli <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  run [--config <path>] [--duration <secs>] [--port <port>]");
    eprintln!("      Start the demo with the synthetic camera and record until");
    eprintln!("      ctrl-c (or for --duration seconds).");
    eprintln!("  print-config [--config <path>]");
    eprintln!("      Print the effective configuration as TOML.");
    eprintln!("  version");
}

fn load_config(args: &[String]) -> anyhow::Result<CamcastConfig> {
    let config = match arg_value(args, "--config") {
        Some(path) => CamcastConfig::load_from_file(path)?,
        None => CamcastConfig::load_or_default(),
    };
    Ok(config)
}

fn arg_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn cmd_print_config(args: &[String]) -> anyhow::Result<()> {
    let config = load_config(args)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

async fn cmd_run(args: &[String]) -> anyhow::Result<()> {
    let mut config = load_config(args)?;
    if let Some(port) = arg_value(args, "--port") {
        config.server.port = port.parse()?;
    }
    let duration: Option<u64> = match arg_value(args, "--duration") {
        Some(v) => Some(v.parse()?),
        None => None,
    };

    let camera = Arc::new(SyntheticCamera::new(
        "./capture",
        Duration::from_secs(config.camera.segment_duration_secs),
    ));
    let service = StreamService::init(&config, camera).await?;

    println!("Serving at {}/playlist.m3u8", service.base_url());
    println!("Open {}/index.html in a browser to watch.", service.base_url());

    service.start_recording().await;

    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = interrupted.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })?;

    let started = Instant::now();
    loop {
        if interrupted.load(Ordering::SeqCst) {
            println!("Interrupted, shutting down");
            break;
        }
        if let Some(secs) = duration {
            if started.elapsed() >= Duration::from_secs(secs) {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    service.stop_recording().await;
    service.shutdown().await;
    Ok(())
}
