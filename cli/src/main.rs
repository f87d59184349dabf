use am32_melody_core::{decode, encode, is_erased, parse, EncodedMelody, NoteStatus, DEFAULT_DECODE_NAME, DEFAULT_MELODY_LENGTH};
use anyhow::{bail, Context, Result};
use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "am32-melody")]
#[command(about = "Convert between RTTTL ring tones and AM32 startup melody images")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode an RTTTL melody into an AM32 startup melody image
    Encode {
        /// RTTTL text file, or - for stdin
        #[arg(value_name = "INPUT.TXT")]
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Image length in bytes
        #[arg(short, long, default_value_t = DEFAULT_MELODY_LENGTH)]
        length: usize,

        /// Output format (raw for files, hex for stdout by default)
        #[arg(short, long, value_enum)]
        format: Option<ImageFormat>,

        /// Fail when any note could not be encoded
        #[arg(long)]
        strict: bool,
    },

    /// Decode an AM32 startup melody image into RTTTL text
    Decode {
        /// Melody image file, or - for stdin
        #[arg(value_name = "INPUT.BIN")]
        input: PathBuf,

        /// Melody name written into the RTTTL text
        #[arg(short, long, default_value = DEFAULT_DECODE_NAME)]
        name: String,

        /// Input format
        #[arg(short, long, value_enum, default_value = "raw")]
        format: ImageFormat,
    },

    /// Parse an RTTTL melody and print it as JSON
    Parse {
        /// RTTTL text file, or - for stdin
        #[arg(value_name = "INPUT.TXT")]
        input: PathBuf,
    },

    /// Encode then decode a melody, showing what survives the image format
    Roundtrip {
        /// RTTTL text file, or - for stdin
        #[arg(value_name = "INPUT.TXT")]
        input: PathBuf,

        /// Image length in bytes
        #[arg(short, long, default_value_t = DEFAULT_MELODY_LENGTH)]
        length: usize,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ImageFormat {
    Raw,
    Hex,
    Base64,
    /// Image and per-note error codes (encode only)
    Json,
}

#[derive(Serialize)]
struct RoundTripReport<'a> {
    input: &'a str,
    encoded: &'a EncodedMelody,
    decoded: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Encode {
            input,
            output,
            length,
            format,
            strict,
        } => encode_command(&input, output.as_deref(), length, format, strict),
        Commands::Decode { input, name, format } => decode_command(&input, &name, format),
        Commands::Parse { input } => parse_command(&input),
        Commands::Roundtrip { input, length } => roundtrip_command(&input, length),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("Failed to read stdin")?;
        return Ok(data);
    }
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    let data = read_input(path)?;
    let text = String::from_utf8(data).context("Input is not valid UTF-8")?;
    Ok(text.trim().to_string())
}

fn encode_command(
    input: &Path,
    output: Option<&Path>,
    length: usize,
    format: Option<ImageFormat>,
    strict: bool,
) -> Result<()> {
    let text = read_text(input)?;
    let encoded = encode(&text, length).context("Failed to encode melody")?;
    log::info!("Encoded {} into {} bytes", input.display(), encoded.data.len());

    let mut failed = 0;
    for (index, status) in encoded.error_codes.iter().flatten().enumerate() {
        match status {
            NoteStatus::Ok => {}
            NoteStatus::OutOfRange => {
                failed += 1;
                log::warn!("Note {}: frequency out of range, skipped", index + 1);
            }
            NoteStatus::Truncated => {
                failed += 1;
                log::warn!("Note {}: does not fit into {} bytes", index + 1, length);
            }
        }
    }

    let format = format.unwrap_or(if output.is_some() {
        ImageFormat::Raw
    } else {
        ImageFormat::Hex
    });
    let bytes = match format {
        ImageFormat::Raw => encoded.data.clone(),
        ImageFormat::Hex => format!("{}\n", hex::encode(&encoded.data)).into_bytes(),
        ImageFormat::Base64 => {
            format!("{}\n", base64::engine::general_purpose::STANDARD.encode(&encoded.data)).into_bytes()
        }
        ImageFormat::Json => format!("{}\n", serde_json::to_string_pretty(&encoded)?).into_bytes(),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => std::io::stdout().write_all(&bytes)?,
    }

    if strict && failed > 0 {
        bail!("{} note(s) could not be encoded", failed);
    }
    Ok(())
}

fn decode_command(input: &Path, name: &str, format: ImageFormat) -> Result<()> {
    let raw = read_input(input)?;
    let data = match format {
        ImageFormat::Raw => raw,
        ImageFormat::Hex => {
            let text: String = String::from_utf8(raw)
                .context("Hex input is not valid UTF-8")?
                .split_whitespace()
                .collect();
            hex::decode(text).context("Invalid hex input")?
        }
        ImageFormat::Base64 => {
            let text = String::from_utf8(raw).context("Base64 input is not valid UTF-8")?;
            base64::engine::general_purpose::STANDARD
                .decode(text.trim())
                .context("Invalid base64 input")?
        }
        ImageFormat::Json => bail!("JSON is only supported as an encode output format"),
    };
    log::info!("Read {} byte melody image", data.len());

    let text = if is_erased(&data) {
        String::new()
    } else {
        decode(&data, name)
    };

    println!("{}", text);
    Ok(())
}

fn parse_command(input: &Path) -> Result<()> {
    let text = read_text(input)?;
    let melody = parse(&text).context("Failed to parse melody")?;
    for diagnostic in &melody.diagnostics {
        log::warn!("{}", diagnostic);
    }
    println!("{}", serde_json::to_string_pretty(&melody)?);
    Ok(())
}

fn roundtrip_command(input: &Path, length: usize) -> Result<()> {
    let text = read_text(input)?;
    let encoded = encode(&text, length).context("Failed to encode melody")?;
    let name = parse(&text).map(|m| m.name).unwrap_or_else(|_| DEFAULT_DECODE_NAME.to_string());
    let decoded = decode(&encoded.data, &name);

    let report = RoundTripReport {
        input: &text,
        encoded: &encoded,
        decoded,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
