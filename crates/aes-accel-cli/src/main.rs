//! `aes-accel` — command-line interface for the AES_v1.0 accelerator.
//!
//! ```text
//! USAGE:
//!   aes-accel enumerate              List accelerators on the platform bus
//!   aes-accel regs [-d DEV]          Dump every readable register
//!   aes-accel encrypt [OPTIONS]      Encrypt 16-64 bytes (prompts for missing input)
//! ```

use aes_accel_driver::chip::block::{BLOCK_SIZE, MAX_DATA_LEN};
use aes_accel_driver::chip::platform::COMPATIBLE;
use aes_accel_driver::{
    collect_job_input, AesDevice, AesError, BlockCipherDriver, DeviceManager, DriverConfig,
    GatewaySelection, JobInputProvider, RegisterGateway, SimulatedAccelerator,
};
use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aes-accel", about = "AES_v1.0 accelerator CLI", version)]
struct Cli {
    /// More logging (-v info, -vv debug); RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List AES accelerators and the gateways each one offers.
    Enumerate,
    /// Print every readable register with its offset, access and value.
    Regs {
        #[command(flatten)]
        target: Target,
    },
    /// Encrypt a plaintext of 16, 32, 48 or 64 bytes.
    Encrypt(EncryptArgs),
}

#[derive(Args)]
struct Target {
    /// Device index (e.g. 0) or platform name (e.g. 43c00000.AES_v1.0).
    #[arg(short, long, default_value = "0")]
    device: String,

    /// Register gateway: auto, sysfs, uio or sim.
    #[arg(short, long, default_value = "auto")]
    gateway: GatewaySelection,

    /// Use the simulated accelerator instead of hardware.
    #[arg(long)]
    simulate: bool,
}

#[derive(Args)]
struct EncryptArgs {
    #[command(flatten)]
    target: Target,

    /// Key size: 0 = 128-bit, 1 = 192-bit, 2 = 256-bit.
    #[arg(short = 'k', long)]
    key_size: Option<u32>,

    /// Key text (16, 24 or 32 characters).
    #[arg(long)]
    key: Option<String>,

    /// Plaintext (16, 32, 48 or 64 characters).
    #[arg(short, long)]
    plaintext: Option<String>,

    /// Completion poll interval in milliseconds.
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Completion polls per block before giving up (0 = never).
    #[arg(long)]
    max_polls: Option<u32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .init();

    match cli.command {
        Cmd::Enumerate => cmd_enumerate()?,
        Cmd::Regs { target } => cmd_regs(&target)?,
        Cmd::Encrypt(args) => cmd_encrypt(&args, cli.verbose > 0)?,
    }

    Ok(())
}

fn attach(target: &Target) -> Result<AesDevice> {
    if target.simulate || target.gateway == GatewaySelection::Simulated {
        let sim: Box<dyn RegisterGateway> = Box::new(SimulatedAccelerator::new());
        return Ok(AesDevice::with_gateway(sim)?);
    }

    let mgr = DeviceManager::discover()?;
    let info = mgr.find(&target.device)?;
    println!("INFO: Found AES device at: {}", info.sysfs_path().display());
    AesDevice::attach(info, target.gateway)
        .with_context(|| format!("attaching {} via {}", info.name(), target.gateway))
}

fn cmd_enumerate() -> Result<()> {
    let mgr = DeviceManager::discover()?;

    println!(
        "{COMPATIBLE} accelerators under {}: {}",
        mgr.root().display(),
        mgr.device_count()
    );
    println!();

    for info in mgr.devices() {
        let addr = info
            .phys_addr
            .map_or_else(|| "unknown".to_string(), |a| format!("{a:#010x}"));
        println!("[{}] {} @ {addr}", info.index(), info.name());
        println!("     sysfs {}", info.sysfs_path().display());
        match info.uio_path() {
            Some(p) => println!("     uio   {}", p.display()),
            None => println!("     uio   (not bound)"),
        }
        println!();
    }

    Ok(())
}

fn cmd_regs(target: &Target) -> Result<()> {
    let mut dev = attach(target)?;
    println!("Registers via {} gateway:", dev.gateway_type());
    println!();

    for (reg, value) in dev.snapshot()? {
        println!(
            "  {:#04x}  {:<2}  {:<14} {value:#010x}  ({value})",
            reg.offset(),
            reg.access().to_string(),
            reg.attr_name()
        );
    }

    Ok(())
}

fn cmd_encrypt(args: &EncryptArgs, verbose: bool) -> Result<()> {
    let mut config = DriverConfig::from_env();
    if let Some(ms) = args.poll_interval_ms {
        config = config.with_poll_interval(Duration::from_millis(ms));
    }
    if let Some(n) = args.max_polls {
        config = config.with_max_poll_attempts((n > 0).then_some(n));
    }

    let mut dev = attach(&args.target)?;

    let mut prompt = PromptInput::new(
        args.key_size,
        args.key.clone(),
        args.plaintext.clone(),
    );
    let input = collect_job_input(&mut prompt).map_err(explain_input_error)?;

    if verbose {
        for chunk in input.plaintext.chunks(BLOCK_SIZE) {
            print_hex("Plaintext Chunk:", chunk);
        }
    }

    let driver = BlockCipherDriver::new(config);
    let result = driver
        .encrypt(&mut dev, input.key_choice, &input.key, &input.plaintext)
        .context("Encryption failed")?;

    print_hex("Final Ciphertext:", &result.ciphertext);
    println!();
    println!(
        "✅ {} block(s), {} poll(s), {:?}",
        result.blocks, result.poll_reads, result.elapsed
    );

    Ok(())
}

/// Add the interactive wording to validation failures
fn explain_input_error(e: AesError) -> anyhow::Error {
    let msg = match &e {
        AesError::InvalidKeyChoice { .. } => Some("Invalid key choice.".to_string()),
        AesError::InvalidDataLength { .. } => Some(format!(
            "Invalid length. Must be a multiple of 16, up to {MAX_DATA_LEN}."
        )),
        AesError::KeyLengthMismatch { expected, actual } => Some(format!(
            "Key length mismatch. Expected {expected} characters, but got {actual}."
        )),
        _ => None,
    };
    match msg {
        Some(msg) => anyhow::Error::new(e).context(msg),
        None => e.into(),
    }
}

fn print_hex(label: &str, data: &[u8]) {
    let hex: Vec<String> = data.iter().map(|b| format!("{b:02X}")).collect();
    println!("{label:<20}{}", hex.join(" "));
}

/// Reads missing job parameters from stdin, using flag values where given
struct PromptInput {
    key_choice: Option<u32>,
    key: Option<String>,
    plaintext: Option<String>,
}

impl PromptInput {
    fn new(key_choice: Option<u32>, key: Option<String>, plaintext: Option<String>) -> Self {
        Self {
            key_choice,
            key,
            plaintext,
        }
    }

    fn ask(prompt: &str) -> aes_accel_driver::Result<String> {
        let mut stdout = std::io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        let trimmed = line.strip_suffix('\n').unwrap_or(&line);
        Ok(trimmed.strip_suffix('\r').unwrap_or(trimmed).to_string())
    }

    fn ask_number<T: std::str::FromStr>(prompt: &str) -> aes_accel_driver::Result<T> {
        let answer = Self::ask(prompt)?;
        answer.trim().parse().map_err(|_| {
            AesError::from(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("expected a number, got {answer:?}"),
            ))
        })
    }
}

impl JobInputProvider for PromptInput {
    fn key_choice(&mut self) -> aes_accel_driver::Result<u32> {
        match self.key_choice {
            Some(c) => Ok(c),
            None => Self::ask_number(
                "Select AES Key Size:\n  0. 128-bit\n  1. 192-bit\n  2. 256-bit\nEnter choice: ",
            ),
        }
    }

    fn data_len(&mut self) -> aes_accel_driver::Result<usize> {
        match &self.plaintext {
            Some(p) => Ok(p.len()),
            None => Self::ask_number(
                "Enter plaintext data length in bytes (must be 16, 32, 48, or 64): ",
            ),
        }
    }

    fn key(&mut self, expected_len: usize) -> aes_accel_driver::Result<Vec<u8>> {
        match self.key.take() {
            Some(k) => Ok(k.into_bytes()),
            None => Ok(Self::ask(&format!("Enter a key of exactly {expected_len} characters: "))?
                .into_bytes()),
        }
    }

    fn plaintext(&mut self, len: usize) -> aes_accel_driver::Result<Vec<u8>> {
        match self.plaintext.take() {
            Some(p) => Ok(p.into_bytes()),
            None => Ok(
                Self::ask(&format!("Enter a plaintext message of exactly {len} bytes: "))?
                    .into_bytes(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_bypass_prompts() {
        let mut p = PromptInput::new(
            Some(1),
            Some("k".repeat(24)),
            Some("p".repeat(48)),
        );
        let input = collect_job_input(&mut p).unwrap();
        assert_eq!(input.key_choice, 1);
        assert_eq!(input.key.len(), 24);
        assert_eq!(input.plaintext.len(), 48);
    }

    #[test]
    fn cli_parses_encrypt_flags() {
        let cli = Cli::try_parse_from([
            "aes-accel", "-vv", "encrypt", "--simulate", "-k", "2", "--key", "K", "-p", "P",
            "--max-polls", "0",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Cmd::Encrypt(args) = cli.command else {
            panic!("expected encrypt");
        };
        assert!(args.target.simulate);
        assert_eq!(args.key_size, Some(2));
        assert_eq!(args.max_polls, Some(0));
        assert_eq!(args.target.gateway, GatewaySelection::Auto);
    }

    #[test]
    fn simulated_encrypt_end_to_end() {
        let target = Target {
            device: "0".into(),
            gateway: GatewaySelection::Simulated,
            simulate: false,
        };
        let mut dev = attach(&target).unwrap();
        let ct = aes_accel_driver::encrypt_bytes(&mut dev, 0, &[b'A'; 16], &[b'B'; 16]).unwrap();
        assert_eq!(ct.len(), 16);
    }

    #[test]
    fn input_errors_keep_typed_source() {
        let e = explain_input_error(AesError::InvalidKeyChoice { choice: 7 });
        assert_eq!(e.to_string(), "Invalid key choice.");
        assert!(matches!(
            e.downcast_ref::<AesError>(),
            Some(AesError::InvalidKeyChoice { choice: 7 })
        ));
    }
}
