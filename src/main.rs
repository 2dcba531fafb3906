//! MMA8452Q reader - Live accelerometer display
//!
//! Starts the polling thread on the selected I2C platform and renders every
//! event it posts: startup status, X/Y/Z counts, or the per-tick failure text.
//!
//! Usage:
//!   mma8452q-reader [--backend linux|ftdi] [--samples N] [--duration SECS] [--plain]

use chrono::Local;
use clap::{Parser, ValueEnum};
use log::info;
use mma8452q_interface::{
    axis_bar, axis_lines, Acceleration, I2cPlatform, PollingLoop, SensorEvent, DEVICE_LABEL,
};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "ftdi")]
use mma8452q_interface::platform::FtdiPlatform;
#[cfg(target_os = "linux")]
use mma8452q_interface::platform::LinuxPlatform;

/// How often the main loop wakes to check Ctrl+C and the deadline
const UI_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Kernel i2c-dev nodes (/dev/i2c-N)
    Linux,
    /// FT232H USB-to-I2C bridge via libMPSSE (needs the `ftdi` feature)
    Ftdi,
}

impl Default for Backend {
    #[cfg(target_os = "linux")]
    fn default() -> Self {
        Backend::Linux
    }

    #[cfg(not(target_os = "linux"))]
    fn default() -> Self {
        Backend::Ftdi
    }
}

#[derive(Parser, Debug)]
#[command(name = "mma8452q-reader")]
#[command(about = "Live readout of an MMA8452Q accelerometer over I2C", long_about = None)]
struct Args {
    /// I2C platform to take the controller from
    #[arg(short, long, value_enum, default_value_t = Backend::default())]
    backend: Backend,

    /// Stop after this many successful readings
    #[arg(short = 'n', long)]
    samples: Option<u64>,

    /// Duration in seconds (optional, runs until Ctrl+C if omitted)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Print one timestamped line per event instead of the live view
    #[arg(long)]
    plain: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Setup Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    match args.backend {
        Backend::Linux => run_linux(&args, &running),
        Backend::Ftdi => run_ftdi(&args, &running),
    }
}

#[cfg(target_os = "linux")]
fn run_linux(args: &Args, running: &AtomicBool) -> Result<(), Box<dyn std::error::Error>> {
    run(LinuxPlatform::new(), args, running)
}

#[cfg(not(target_os = "linux"))]
fn run_linux(_args: &Args, _running: &AtomicBool) -> Result<(), Box<dyn std::error::Error>> {
    Err("the linux backend is only available on Linux hosts".into())
}

#[cfg(feature = "ftdi")]
fn run_ftdi(args: &Args, running: &AtomicBool) -> Result<(), Box<dyn std::error::Error>> {
    run(FtdiPlatform::new(), args, running)
}

#[cfg(not(feature = "ftdi"))]
fn run_ftdi(_args: &Args, _running: &AtomicBool) -> Result<(), Box<dyn std::error::Error>> {
    Err("the ftdi backend is not compiled in; rebuild with `--features ftdi`".into())
}

fn run<P>(platform: P, args: &Args, running: &AtomicBool) -> Result<(), Box<dyn std::error::Error>>
where
    P: I2cPlatform + Send + 'static,
{
    info!("Starting MMA8452Q reader ({:?} backend)", args.backend);

    let (tx, rx) = mpsc::channel();
    let poller = PollingLoop::start(platform, tx);

    let mut console = Console::new(args.plain);
    let end_time = args.duration.map(|d| console.start + Duration::from_secs(d));
    let mut startup_failure = None;

    if !args.plain {
        // Clear screen once at start
        print!("\x1B[2J\x1B[H");
        io::stdout().flush()?;
    }

    while running.load(Ordering::SeqCst) {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        if args.samples.is_some_and(|n| console.readings >= n) {
            break;
        }

        match rx.recv_timeout(UI_POLL) {
            Ok(event) => {
                if let SensorEvent::Halted(text) = &event {
                    startup_failure = Some(text.clone());
                }
                console.show(&event)?;
            }
            Err(RecvTimeoutError::Timeout) => {}
            // Worker finished: startup failed or the device was released
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    poller.shutdown();
    console.summary();

    match startup_failure {
        Some(text) => Err(text.into()),
        None => Ok(()),
    }
}

/// Presentation sink: renders events to stdout
struct Console {
    plain: bool,
    start: Instant,
    status: String,
    last: Option<Acceleration>,
    tick_failed: bool,
    readings: u64,
    errors: u64,
}

impl Console {
    fn new(plain: bool) -> Self {
        Self {
            plain,
            start: Instant::now(),
            status: "Status: Initializing".to_string(),
            last: None,
            tick_failed: false,
            readings: 0,
            errors: 0,
        }
    }

    fn show(&mut self, event: &SensorEvent) -> io::Result<()> {
        match event {
            SensorEvent::Status(text) | SensorEvent::Halted(text) => self.status = text.clone(),
            SensorEvent::Reading(accel) => {
                self.last = Some(*accel);
                self.tick_failed = false;
                self.readings += 1;
                self.status = "Status: Running".to_string();
            }
            SensorEvent::Error(text) => {
                self.last = None;
                self.tick_failed = true;
                self.errors += 1;
                self.status = text.clone();
            }
        }

        if self.plain {
            self.print_line(event)
        } else {
            self.redraw()
        }
    }

    fn print_line(&self, event: &SensorEvent) -> io::Result<()> {
        let stamp = Local::now().format("%H:%M:%S%.3f");
        let mut stdout = io::stdout().lock();
        match event {
            SensorEvent::Reading(accel) => {
                let [x, y, z] = axis_lines(accel);
                writeln!(stdout, "[{}] {}  {}  {}  Status: Running", stamp, x, y, z)?;
            }
            SensorEvent::Status(text) | SensorEvent::Halted(text) | SensorEvent::Error(text) => {
                writeln!(stdout, "[{}] {}", stamp, text)?;
            }
        }
        stdout.flush()
    }

    fn redraw(&self) -> io::Result<()> {
        let elapsed = self.start.elapsed().as_secs_f64();
        let mut stdout = io::stdout().lock();

        // Move cursor to top without clearing (reduces flicker); \x1B[K erases stale text
        write!(stdout, "\x1B[H")?;
        writeln!(stdout, "MMA8452Q Reader - Live Data\x1B[K")?;
        writeln!(stdout, "===========================\x1B[K")?;
        writeln!(
            stdout,
            "Time: {:.2}s | Readings: {} | Errors: {}\x1B[K",
            elapsed, self.readings, self.errors
        )?;
        writeln!(stdout, "{}\x1B[K", DEVICE_LABEL)?;
        writeln!(stdout, "\x1B[K")?;

        writeln!(stdout, "ACCELERATION (counts, ±2g)      -2048 ◄─────────┼─────────► +2047\x1B[K")?;
        match &self.last {
            Some(accel) => {
                let lines = axis_lines(accel);
                for (line, count) in lines.iter().zip([accel.x, accel.y, accel.z]) {
                    writeln!(stdout, "  {:<14} [{}]\x1B[K", line, axis_bar(count, 40))?;
                }
            }
            None => {
                let value = if self.tick_failed { "Error" } else { "--" };
                for axis in ["X", "Y", "Z"] {
                    writeln!(stdout, "  {} Axis: {}\x1B[K", axis, value)?;
                }
            }
        }

        writeln!(stdout, "\x1B[K")?;
        writeln!(stdout, "{}\x1B[K", self.status)?;
        writeln!(stdout, "Press Ctrl+C to exit\x1B[K")?;

        stdout.flush()
    }

    fn summary(&self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        println!();
        println!("Stopped.");
        println!("Readings: {}", self.readings);
        println!("Failed reads: {}", self.errors);
        println!("Elapsed time: {:.2} seconds", elapsed);
    }
}
