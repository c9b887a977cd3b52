use clap::Parser;
use rustzw_controller::{ControllerConfig, ControllerEvent, Effect, NodeStage, VersionFallback};
use rustzw_core::{CommandClass, Registry};
use rustzw_tools::{start_controller, CommandClassArg};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "zwave-negotiate")]
struct Args {
    #[arg(long)]
    port: String,
    #[arg(long, default_value_t = 115_200)]
    baud: u32,
    #[arg(long)]
    node: u8,
    /// Command classes the node implements besides Version.
    #[arg(long = "class", value_enum, required = true)]
    classes: Vec<CommandClassArg>,
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
    #[arg(long, default_value_t = 3)]
    retries: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let config = ControllerConfig::default()
        .with_response_timeout(Duration::from_secs(args.timeout_secs))
        .with_retry_budget(args.retries)
        .with_version_fallback(VersionFallback::Fail);
    let (handle, mut events) = start_controller(&args.port, args.baud, config)?;

    let mut classes: Vec<CommandClass> = args
        .classes
        .iter()
        .map(|c| c.into_command_class())
        .collect();
    classes.push(CommandClass::Version);
    handle.add_node(args.node).await?;
    handle.set_command_classes(args.node, classes).await?;

    let registry = Registry::standard();
    let stage = loop {
        match events.recv().await {
            Some(ControllerEvent::CommandClassReport {
                effect: Effect::CommandClassVersion(report),
                ..
            }) => {
                match registry.lookup(report.command_class) {
                    Ok(d) => println!(
                        "{}: reported v{}, using v{}",
                        d.label,
                        report.version,
                        d.clamp_version(report.version)
                    ),
                    Err(_) => println!(
                        "0x{:02x}: reported v{}",
                        report.command_class, report.version
                    ),
                }
            }
            Some(ControllerEvent::StageChanged { stage, .. }) if stage.is_terminal() => {
                break stage
            }
            Some(ControllerEvent::RequestFailed { reason, .. }) => {
                eprintln!("request failed: {reason:?}")
            }
            Some(_) => {}
            None => return Err("controller stopped".into()),
        }
    };

    println!("node {}: {stage:?}", args.node);
    handle.shutdown();
    if stage == NodeStage::Failed {
        std::process::exit(1);
    }
    Ok(())
}
