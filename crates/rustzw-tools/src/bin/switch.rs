use clap::{ArgGroup, Parser};
use rustzw_controller::{ControllerConfig, ControllerEvent, Effect, Request};
use rustzw_core::CommandClass;
use rustzw_tools::start_controller;

#[derive(Parser, Debug)]
#[command(name = "zwave-switch")]
#[command(group(ArgGroup::new("action").required(true).args(["on", "off", "get"])))]
struct Args {
    #[arg(long)]
    port: String,
    #[arg(long, default_value_t = 115_200)]
    baud: u32,
    #[arg(long)]
    node: u8,
    #[arg(long)]
    on: bool,
    #[arg(long)]
    off: bool,
    #[arg(long)]
    get: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let (handle, mut events) =
        start_controller(&args.port, args.baud, ControllerConfig::default())?;

    // Without the Version class the switch is usable at version 1 straight away.
    handle.add_node(args.node).await?;
    handle
        .set_command_classes(args.node, vec![CommandClass::SwitchBinary])
        .await?;

    let request = if args.get {
        Request::SwitchBinaryGet
    } else {
        Request::SwitchBinarySet(args.on)
    };
    let result = handle.submit(args.node, request).await?.wait().await;
    if let Err(e) = result {
        eprintln!("switch failed: {e}");
        std::process::exit(1);
    }

    if args.get {
        while let Some(event) = events.recv().await {
            if let ControllerEvent::CommandClassReport {
                effect: Effect::SwitchBinary(on),
                ..
            } = event
            {
                println!("node {}: {}", args.node, if on { "on" } else { "off" });
                break;
            }
        }
    } else {
        println!("node {}: {}", args.node, if args.on { "on" } else { "off" });
    }
    handle.shutdown();
    Ok(())
}
