//! blockjpeg CLI - encode BMP images into transform-domain artifacts and back.

use blockjpeg::{DecodeJob, EncodeJob, Method};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Textbook 8x8 DCT codec with inspectable intermediate artifacts
#[derive(Parser)]
#[command(name = "blockjpeg")]
#[command(version)]
#[command(about = "Encode a 24-bit BMP into DCT artifacts and decode them back", long_about = None)]
#[command(after_help = "METHODS:
    0    Raw R/G/B channel passthrough (lossless)
    1|2  DCT + quantization, coefficients stored as binary i16 blocks
    3    DCT + quantization + DC differential and AC run-length tokens

EXAMPLES:
    blockjpeg encode 1 -i lena.bmp -a work/
    blockjpeg decode 2 -a work/ -o lena_decoded.bmp --original lena.bmp
    RUST_LOG=debug blockjpeg encode 3 -i lena.bmp -a tokens/")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a BMP image into an artifact directory
    #[command(visible_alias = "e")]
    Encode {
        /// Pipeline method number (0, 1 or 3)
        #[arg(value_parser = parse_method)]
        method: Method,

        /// Input 24-bit BMP image
        #[arg(short, long, help = "Path to the input BMP file")]
        input: PathBuf,

        /// Directory receiving the artifacts
        #[arg(short, long, help = "Artifact directory (created if missing)")]
        artifacts: PathBuf,
    },

    /// Decode an artifact directory back into a BMP image
    #[command(visible_alias = "d")]
    Decode {
        /// Pipeline method number (0, 2 or 3)
        #[arg(value_parser = parse_method)]
        method: Method,

        /// Directory holding the artifacts
        #[arg(short, long, help = "Artifact directory written by the encoder")]
        artifacts: PathBuf,

        /// Output BMP image
        #[arg(short, long, help = "Path for the reconstructed BMP file")]
        output: PathBuf,

        /// Original image; when given, PSNR is printed and written to psnr.txt
        #[arg(long)]
        original: Option<PathBuf>,
    },
}

fn parse_method(s: &str) -> Result<Method, String> {
    s.parse::<Method>().map_err(|e| e.to_string())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encode {
            method,
            input,
            artifacts,
        } => encode(method, input, artifacts),
        Commands::Decode {
            method,
            artifacts,
            output,
            original,
        } => decode(method, artifacts, output, original),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn encode(method: Method, input: PathBuf, artifacts: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let job = EncodeJob::new(method, input, artifacts)?;
    let dimensions = job.run()?;
    println!(
        "✓ Encoded {}x{} image into {:?}",
        dimensions.width,
        dimensions.height,
        job.artifacts.dir()
    );
    println!("Method {} Encoder Complete", u8::from(method));
    Ok(())
}

fn decode(
    method: Method,
    artifacts: PathBuf,
    output: PathBuf,
    original: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let job = DecodeJob::new(method, artifacts, output, original)?;
    let report = job.run()?;
    println!(
        "✓ Decoded {}x{} image to {:?}",
        report.dimensions.width, report.dimensions.height, job.output
    );
    if let Some(psnr) = report.psnr {
        println!("PSNR: {:.2} dB", psnr);
    }
    println!("Method {} Decoder Complete", u8::from(method));
    Ok(())
}
