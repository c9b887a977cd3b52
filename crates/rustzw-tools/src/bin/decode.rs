use clap::Parser;
use rustzw_core::frame::MessageClass;
use rustzw_core::serial_api::ApplicationCommand;
use rustzw_core::{FrameBuffer, Inbound, Registry};
use rustzw_tools::parse_hex;

#[derive(Parser, Debug)]
#[command(name = "zwave-decode")]
struct Args {
    /// Captured bytes in hex; each argument is appended to the same stream.
    #[arg(required = true)]
    hex: Vec<String>,
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let registry = Registry::standard();
    let mut frames = FrameBuffer::new();
    for input in &args.hex {
        frames.push(&parse_hex(input)?);
    }

    while let Some(next) = frames.next_inbound() {
        let inbound = match next {
            Ok(inbound) => inbound,
            Err(err) => {
                eprintln!("dropped bytes: {err}");
                continue;
            }
        };
        let label = match &inbound {
            Inbound::Frame(frame)
                if frame.message_class == MessageClass::ApplicationCommandHandler =>
            {
                ApplicationCommand::decode_payload(&frame.payload)
                    .ok()
                    .and_then(|app| app.command_class())
                    .map(|id| registry.lookup(id).map_or("UNKNOWN", |d| d.label))
            }
            _ => None,
        };
        if args.json {
            let value = serde_json::json!({ "inbound": inbound, "command_class": label });
            println!("{}", serde_json::to_string(&value)?);
        } else {
            match label {
                Some(label) => println!("{inbound:02x?} [{label}]"),
                None => println!("{inbound:02x?}"),
            }
        }
    }
    if !frames.is_empty() {
        eprintln!("{} trailing bytes of an incomplete frame", frames.len());
    }
    Ok(())
}
