use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use misty_voice::voice::{AudioCapture, rms};
use misty_voice::{
    ChatCompletion, Command as SpokenCommand, Config, Conversation, LoopOptions, MistyClient,
    ResponseGenerator, Robot, drive_for,
};

/// Misty - voice conversation loop for the Misty robot
#[derive(Parser)]
#[command(name = "misty", version, about)]
struct Cli {
    /// Robot IP address, host:port, or base URL
    #[arg(short, long, env = "MISTY_IP")]
    robot: Option<String>,

    /// Config file (defaults to ~/.config/misty/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Handle every utterance instead of waiting for the wake phrase
    #[arg(long)]
    no_wake_word: bool,

    /// Ask whether to continue after each answer; anything but yes exits
    #[arg(long)]
    ask_to_continue: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the robot is reachable
    Probe,
    /// Make the robot say something
    Say {
        /// Text to speak
        text: String,
    },
    /// Drive forward for a number of seconds
    Move {
        /// Seconds to drive
        seconds: f64,
    },
    /// Send text to the completion service and print the reply
    Ask {
        /// Question to ask
        text: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Missing .env is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,misty_voice=info",
        1 => "info,misty_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(Command::TestMic { duration }) = cli.command {
        return test_mic(duration).await;
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(robot) = cli.robot {
        config.robot.address = robot;
    }
    if cli.no_wake_word {
        config.voice.wake_word_required = false;
    }
    if cli.ask_to_continue {
        config.voice.ask_to_continue = true;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Some(Command::Probe) => probe(&config).await,
        Some(Command::Say { text }) => say(&config, &text).await,
        Some(Command::Move { seconds }) => drive(&config, seconds).await,
        Some(Command::Ask { text }) => ask(&config, &text).await,
        Some(Command::TestMic { .. }) | None => converse(&config).await,
    }
}

/// Run the conversation loop
#[allow(clippy::future_not_send)]
async fn converse(config: &Config) -> anyhow::Result<()> {
    let options = LoopOptions {
        wake_word_required: config.voice.wake_word_required,
        exit_on_negative_answer: config.voice.ask_to_continue,
    };

    tracing::info!(
        robot = %config.robot.address,
        wake_word = ?options.wake_word_required.then_some(config.voice.wake_word.as_str()),
        ask_to_continue = options.exit_on_negative_answer,
        "starting Misty conversation"
    );

    Conversation::from_config(config, options)?.run().await?;
    Ok(())
}

/// Check robot reachability
#[allow(clippy::future_not_send)]
async fn probe(config: &Config) -> anyhow::Result<()> {
    let robot = MistyClient::from_config(&config.robot)?;
    if !robot.probe().await {
        anyhow::bail!("Misty is not reachable at {}", robot.base_url());
    }
    println!("Misty is online at {}", robot.base_url());
    Ok(())
}

/// Speak text through the robot
#[allow(clippy::future_not_send)]
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    let robot = MistyClient::from_config(&config.robot)?;
    if !robot.speak(text, true).await {
        anyhow::bail!("Misty did not accept the speech request");
    }
    Ok(())
}

/// Timed forward drive, validated like the spoken command
#[allow(clippy::future_not_send)]
async fn drive(config: &Config, seconds: f64) -> anyhow::Result<()> {
    let Some(SpokenCommand::Move { duration }) = SpokenCommand::moving(seconds) else {
        anyhow::bail!("duration must be a positive number of seconds");
    };

    let robot = MistyClient::from_config(&config.robot)?;
    if !robot.probe().await {
        anyhow::bail!("Misty is not reachable at {}", robot.base_url());
    }
    drive_for(&robot, config.robot.linear_velocity, duration).await?;
    Ok(())
}

/// Ask the completion service directly
#[allow(clippy::future_not_send)]
async fn ask(config: &Config, text: &str) -> anyhow::Result<()> {
    let generator = ChatCompletion::new(config.api_keys.openai.clone(), &config.llm)?;
    let reply = generator.complete(text).await?;
    println!("{reply}");
    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {} Hz", capture.sample_rate());
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If the meter moved while you spoke, the microphone is working.");
    println!("Quiet-room RMS is the floor the listener calibrates against.");

    Ok(())
}
