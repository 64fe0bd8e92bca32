use std::path::PathBuf;

use clap::{
    Parser,
    Subcommand,
};
use sensor_ringlog_tool::{
    decode_hex,
    Error,
    MetaImage,
    Packet,
    Persisted,
    RecordLog,
    Session,
    Status,
};

#[derive(Parser)]
#[command(name = "sensor-ringlog-tool")]
#[command(about = "sensor-ringlog capture and flash dump decoder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a captured notification stream to a CSV file
    Capture {
        /// Input capture, one hex encoded packet per line
        input: PathBuf,

        /// Output CSV file path
        output: PathBuf,
    },
    /// Decode a data partition dump to a CSV file
    Image {
        /// Input data partition dump
        data: PathBuf,

        /// Output CSV file path
        output: PathBuf,

        /// Metadata partition dump holding the write pointer
        #[arg(short, long, conflicts_with = "next_index")]
        meta: Option<PathBuf>,

        /// Write pointer to use instead of a metadata dump
        #[arg(short, long, value_parser = parse_number, required_unless_present = "meta")]
        next_index: Option<u32>,

        /// The log has wrapped at least once, rejected when the write pointer is below the
        /// partition capacity
        #[arg(short, long, requires = "next_index")]
        wrapped: bool,
    },
    /// Decode a status characteristic value
    Status {
        /// Hex encoded value
        hex: String,
    },
    /// Decode a single notification packet
    Packet {
        /// Hex encoded packet
        hex: String,
    },
}

fn parse_number(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<u32>().map_err(|e| e.to_string())
    }
}

fn print_packet(packet: &Packet) {
    match packet {
        Packet::Header {
            interval_sec,
            total,
            last_sent,
        } => println!("header: interval {interval_sec} s, {total} records, last sent {last_sent}"),
        Packet::Data { seq, .. } => {
            println!("data: seq {seq}");
            for (i, record) in packet.records().iter().enumerate() {
                println!("  #{}: {}", u32::from(*seq) + i as u32, record);
            }
        }
        Packet::End { total_sent } => println!("end: {total_sent} records sent"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Capture { input, output } => {
            println!("Parsing capture: {}", input.display());
            let session = Session::from_capture_file(&input)?;

            match session.header {
                Some(header) => println!(
                    "Session: interval {} s, {} records announced, last sent {}",
                    header.interval_sec, header.total, header.last_sent
                ),
                None => println!("Warning: no header packet found"),
            }
            println!("Received {} records", session.records.len());
            if !session.is_complete() {
                println!("Warning: session is incomplete");
            }

            println!("Writing CSV file...");
            session.to_csv_file(&output)?;

            println!("Successfully decoded capture to: {}", output.display());

            Ok(())
        }
        Commands::Image {
            data,
            output,
            meta,
            next_index,
            wrapped,
        } => {
            let persisted = match (meta, next_index) {
                (Some(meta), _) => {
                    println!("Parsing metadata dump: {}", meta.display());
                    MetaImage::parse_file(&meta)?.persisted
                }
                (None, Some(next_index)) => Persisted {
                    next_index,
                    last_sent_index: 0,
                    wrapped,
                },
                (None, None) => {
                    return Err(Error::InvalidValue("missing write pointer".to_string()).into())
                }
            };
            println!(
                "Write pointer {}, last sent {}, wrapped {}",
                persisted.next_index, persisted.last_sent_index, persisted.wrapped
            );

            println!("Parsing data dump: {}", data.display());
            let log = RecordLog::from_image_file(&data, &persisted)?;
            println!(
                "Found {} records ({} slots)",
                log.records.len(),
                log.capacity
            );

            println!("Writing CSV file...");
            log.to_csv_file(&output)?;

            println!("Successfully decoded data dump to: {}", output.display());

            Ok(())
        }
        Commands::Status { hex } => {
            let status = Status::decode(&decode_hex(&hex)?).map_err(Error::Payload)?;
            println!("count {}, last sent {}", status.count, status.last_sent);
            Ok(())
        }
        Commands::Packet { hex } => {
            let packet = Packet::decode(&decode_hex(&hex)?).map_err(Error::Payload)?;
            print_packet(&packet);
            Ok(())
        }
    }
}
