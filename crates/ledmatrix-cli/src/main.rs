//! LED Matrix Control Tool
//!
//! CLI that claims the connected LED matrix modules, runs one command on
//! each of them and releases them again.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ledmatrix_hw::matrix::{Pattern, PwmFrequency};
use ledmatrix_hw::{LedMatrix, PixelBuffer, UsbManager, MATRIX_HEIGHT, MATRIX_WIDTH};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> Self {
        switch == Switch::On
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

#[derive(Parser)]
#[command(name = "ledmatrixctl")]
#[command(about = "Control tool for LED matrix modules")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Only talk to the device with this id (default: all devices)
    #[arg(short, long)]
    device: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected devices
    List,
    /// Set or show the brightness
    Brightness {
        /// Brightness (0-255, omit to show current)
        value: Option<u8>,
    },
    /// Enable, disable or show the scrolling animation
    Animate {
        /// on or off (omit to show current)
        state: Option<Switch>,
    },
    /// Put the matrix to sleep, wake it, or show the sleep state
    Sleep {
        /// on or off (omit to show current)
        state: Option<Switch>,
    },
    /// Show a built-in pattern
    Pattern {
        /// percentage, gradient, double-gradient, lotus, zigzag,
        /// full-brightness, panic, lotus2
        name: Pattern,

        /// Fill level for the percentage pattern (0-100)
        #[arg(long)]
        value: Option<u8>,
    },
    /// Draw up to five characters
    Text {
        /// Text to draw (upper case)
        text: String,
    },
    /// Draw up to five glyphs by name
    Symbols {
        /// Glyph names (e.g. sun degC 2 5)
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Light the first N pixels
    Count {
        /// Number of pixels (0-306)
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    /// Draw individual pixels
    Matrix {
        /// Pixels to light as x,y pairs (x 0-8, y 0-33)
        #[arg(value_parser = parse_point)]
        pixels: Vec<(usize, usize)>,
    },
    /// Draw an equalizer with one bar per column
    Equalizer {
        /// Bar heights (0-34), up to nine values
        #[arg(required = true)]
        values: Vec<u8>,
    },
    /// Set or show the PWM frequency
    Pwm {
        /// Frequency in Hz: 29000, 3600, 1800, 900 (omit to show current)
        hz: Option<u32>,
    },
    /// Show the firmware version
    Version,
}

/// Parses an `x,y` pixel coordinate.
fn parse_point(s: &str) -> std::result::Result<(usize, usize), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{}'", s))?;
    let x: usize = x
        .trim()
        .parse()
        .map_err(|e| format!("invalid x in '{}': {}", s, e))?;
    let y: usize = y
        .trim()
        .parse()
        .map_err(|e| format!("invalid y in '{}': {}", s, e))?;
    if x >= MATRIX_WIDTH || y >= MATRIX_HEIGHT {
        return Err(format!(
            "pixel {},{} is outside the {}x{} matrix",
            x, y, MATRIX_WIDTH, MATRIX_HEIGHT
        ));
    }
    Ok((x, y))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pwm = match &cli.command {
        Commands::Pwm { hz: Some(hz) } => Some(PwmFrequency::from_hz(*hz).with_context(|| {
            format!("Invalid PWM frequency: {}. Use: 29000, 3600, 1800, 900", hz)
        })?),
        _ => None,
    };

    let mut manager = UsbManager::new().context("Failed to initialize USB")?;
    let mut matrices = manager.enumerate();
    debug!("Enumerated {} device(s)", matrices.len());

    let selected = matrices
        .iter()
        .filter(|m| cli.device.map_or(true, |id| m.id() == id))
        .count();
    if selected == 0 {
        ledmatrix_hw::teardown_all(matrices);
        match cli.device {
            Some(id) => bail!("Device {} not found", id),
            None => bail!("No devices found"),
        }
    }

    let mut result = Ok(());
    for matrix in matrices
        .iter_mut()
        .filter(|m| cli.device.map_or(true, |id| m.id() == id))
    {
        result = handle(&cli.command, pwm, matrix);
        if result.is_err() {
            break;
        }
    }

    ledmatrix_hw::teardown_all(matrices);
    result
}

fn handle(command: &Commands, pwm: Option<PwmFrequency>, matrix: &mut LedMatrix) -> Result<()> {
    let id = matrix.id();
    match command {
        Commands::List => match matrix.get_firmware_version() {
            Some(version) => println!("Device {}: firmware {}", id, version),
            None => println!("Device {}: firmware unknown", id),
        },
        Commands::Brightness { value } => {
            if let Some(value) = value {
                matrix.set_brightness(*value);
                println!("Device {}: brightness set to {}", id, value);
            } else {
                println!("Device {}: brightness {}", id, matrix.get_brightness());
            }
        }
        Commands::Animate { state } => {
            if let Some(state) = state {
                matrix.set_animate((*state).into());
                println!("Device {}: animation {}", id, on_off((*state).into()));
            } else {
                println!("Device {}: animation {}", id, on_off(matrix.get_animate()));
            }
        }
        Commands::Sleep { state } => {
            if let Some(state) = state {
                matrix.set_sleep((*state).into());
                println!("Device {}: sleep {}", id, on_off((*state).into()));
            } else {
                println!("Device {}: sleep {}", id, on_off(matrix.get_sleep()));
            }
        }
        Commands::Pattern { name, value } => {
            matrix
                .select_pattern(*name, *value)
                .with_context(|| format!("Failed to show pattern {} on device {}", name, id))?;
            println!("Device {}: pattern {}", id, name);
        }
        Commands::Text { text } => {
            matrix.draw_text(text);
            println!("Device {}: drew '{}'", id, text);
        }
        Commands::Symbols { symbols } => {
            matrix.draw_symbols(symbols);
            println!("Device {}: drew {}", id, symbols.join(" "));
        }
        Commands::Count { value } => {
            matrix
                .draw_count(*value)
                .with_context(|| format!("Failed to draw count on device {}", id))?;
            println!("Device {}: lit {} pixels", id, value);
        }
        Commands::Matrix { pixels } => {
            let buffer = PixelBuffer::from_points(pixels.iter().copied());
            matrix.draw_matrix(&buffer);
            println!("Device {}: lit {} pixels", id, buffer.lit_count());
        }
        Commands::Equalizer { values } => {
            matrix
                .draw_equalizer(values)
                .with_context(|| format!("Failed to draw equalizer on device {}", id))?;
            println!("Device {}: equalizer drawn", id);
        }
        Commands::Pwm { .. } => {
            if let Some(frequency) = pwm {
                matrix.set_pwm_frequency(frequency);
                println!("Device {}: PWM frequency set to {}", id, frequency);
            } else {
                match matrix.get_pwm_frequency() {
                    Some(frequency) => println!("Device {}: PWM frequency {}", id, frequency),
                    None => println!("Device {}: PWM frequency unknown", id),
                }
            }
        }
        Commands::Version => match matrix.get_firmware_version() {
            Some(version) => println!("Device {}: {}", id, version),
            None => println!("Device {}: version unavailable", id),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("3,17"), Ok((3, 17)));
        assert_eq!(parse_point(" 8 , 33 "), Ok((8, 33)));
        assert!(parse_point("9,0").is_err());
        assert!(parse_point("0,34").is_err());
        assert!(parse_point("4").is_err());
        assert!(parse_point("a,1").is_err());
    }

    #[test]
    fn test_parse_pattern_subcommand() {
        let cli = Cli::try_parse_from(["ledmatrixctl", "pattern", "percentage", "--value", "40"])
            .unwrap();
        match cli.command {
            Commands::Pattern { name, value } => {
                assert_eq!(name, Pattern::Percentage);
                assert_eq!(value, Some(40));
            }
            _ => panic!("expected pattern"),
        }

        assert!(Cli::try_parse_from(["ledmatrixctl", "pattern", "rainbow"]).is_err());
    }

    #[test]
    fn test_parse_device_and_switch() {
        let cli = Cli::try_parse_from(["ledmatrixctl", "--device", "2", "sleep", "on"]).unwrap();
        assert_eq!(cli.device, Some(2));
        assert!(matches!(
            cli.command,
            Commands::Sleep {
                state: Some(Switch::On)
            }
        ));
    }

    #[test]
    fn test_parse_negative_count() {
        let cli = Cli::try_parse_from(["ledmatrixctl", "count", "-1"]).unwrap();
        assert!(matches!(cli.command, Commands::Count { value: -1 }));
    }

    #[test]
    fn test_parse_matrix_points() {
        let cli = Cli::try_parse_from(["ledmatrixctl", "matrix", "0,0", "8,33"]).unwrap();
        match cli.command {
            Commands::Matrix { pixels } => assert_eq!(pixels, vec![(0, 0), (8, 33)]),
            _ => panic!("expected matrix"),
        }
    }
}
