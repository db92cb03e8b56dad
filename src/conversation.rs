//! The conversation loop
//!
//! ```text
//! probe ─► AwaitingInput ──move──► Driving ─────────────────────────┐
//!               ▲   │                                                │
//!               │   └─freeform─► AwaitingCompletion ─► Speaking ─┐   │
//!               │                                                ▼   │
//!               └──────────── yes ◄── continuation check ──no──► Terminated
//! ```
//!
//! Every step is awaited before the next begins, so at most one remote call
//! is ever in flight.

use crate::command::{Command, drive_for};
use crate::config::Config;
use crate::llm::{ChatCompletion, ResponseGenerator};
use crate::robot::{MistyClient, Robot};
use crate::voice::{CpalMicrophone, SpeechCapture, SpeechToText, WakeWord};
use crate::{Error, Result};

const CONTINUE_QUESTION: &str = "Do you want to ask another question? (yes/no)";

/// Which of the two loop behaviours to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOptions {
    /// Only handle utterances that contain the wake phrase
    pub wake_word_required: bool,

    /// Ask after each answer whether to go on; anything but yes exits
    pub exit_on_negative_answer: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            wake_word_required: true,
            exit_on_negative_answer: false,
        }
    }
}

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Listening for the next utterance
    AwaitingInput,
    /// Running a timed move
    Driving,
    /// Waiting on the completion service
    AwaitingCompletion,
    /// Sending the reply to the robot
    Speaking,
    /// The user declined to continue
    Terminated,
}

/// What the loop does after a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Listen again
    Continue,
    /// Stop the loop
    Exit,
}

/// Asks the user whether to keep going
pub trait ContinuePrompt {
    /// Return the user's raw answer
    ///
    /// # Errors
    ///
    /// Returns error if the terminal cannot be read
    fn ask(&mut self) -> Result<String>;
}

/// Reads the continuation answer from the terminal
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl ContinuePrompt for TerminalPrompt {
    fn ask(&mut self) -> Result<String> {
        dialoguer::Input::<String>::new()
            .with_prompt(CONTINUE_QUESTION)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| Error::Prompt(e.to_string()))
    }
}

/// True for `yes`/`y` in any case, surrounding whitespace ignored
#[must_use]
pub fn wants_to_continue(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Listens, acts on moves, answers everything else through the robot
pub struct Conversation {
    listener: SpeechCapture,
    robot: Box<dyn Robot>,
    generator: Box<dyn ResponseGenerator>,
    prompt: Option<Box<dyn ContinuePrompt>>,
    linear_velocity: f64,
    state: LoopState,
}

impl Conversation {
    /// Assemble a loop from its parts; without a prompt it never exits
    #[must_use]
    pub fn new(
        listener: SpeechCapture,
        robot: Box<dyn Robot>,
        generator: Box<dyn ResponseGenerator>,
        linear_velocity: f64,
    ) -> Self {
        Self {
            listener,
            robot,
            generator,
            prompt: None,
            linear_velocity,
            state: LoopState::AwaitingInput,
        }
    }

    /// Ask whether to continue after each non-move turn
    #[must_use]
    pub fn with_continue_prompt(mut self, prompt: Box<dyn ContinuePrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Build the production loop: cpal microphone, hosted STT, chat
    /// completions and the Misty HTTP client
    ///
    /// # Errors
    ///
    /// Returns error if a required API key is missing or the robot address
    /// is invalid
    pub fn from_config(config: &Config, options: LoopOptions) -> Result<Self> {
        let transcriber = SpeechToText::from_config(&config.voice, &config.api_keys)?;
        let microphone = CpalMicrophone::new(config.voice.calibration);

        let mut listener = SpeechCapture::new(Box::new(microphone), Box::new(transcriber));
        if options.wake_word_required {
            listener = listener.with_wake_word(WakeWord::new(&config.voice.wake_word));
        }

        let robot = MistyClient::from_config(&config.robot)?;
        let generator = ChatCompletion::new(config.api_keys.openai.clone(), &config.llm)?;

        let conversation = Self::new(
            listener,
            Box::new(robot),
            Box::new(generator),
            config.robot.linear_velocity,
        );

        Ok(if options.exit_on_negative_answer {
            conversation.with_continue_prompt(Box::new(TerminalPrompt))
        } else {
            conversation
        })
    }

    /// Current loop state
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Probe the robot, then run turns until the user declines to continue
    ///
    /// # Errors
    ///
    /// Returns `Error::RobotUnreachable` if the probe fails, and propagates
    /// completion, drive and audio device failures
    pub async fn run(mut self) -> Result<()> {
        if !self.robot.probe().await {
            return Err(Error::RobotUnreachable);
        }

        while self.turn().await? == Flow::Continue {}

        tracing::info!("exiting Misty conversation, have a great day");
        Ok(())
    }

    /// Run one listen-act-respond cycle
    ///
    /// A failed drive or completion leaves the loop in `AwaitingInput`.
    ///
    /// # Errors
    ///
    /// Propagates completion, drive, prompt and audio device failures
    pub async fn turn(&mut self) -> Result<Flow> {
        self.state = LoopState::AwaitingInput;

        if let Some(text) = self.listener.listen().await? {
            match Command::parse(&text) {
                Command::Move { duration } => {
                    self.state = LoopState::Driving;
                    let driven = drive_for(&*self.robot, self.linear_velocity, duration).await;
                    self.state = LoopState::AwaitingInput;
                    driven?;
                    return Ok(Flow::Continue);
                }
                Command::Freeform(text) => {
                    self.state = LoopState::AwaitingCompletion;
                    let reply = self
                        .generator
                        .complete(&text)
                        .await
                        .inspect_err(|_| self.state = LoopState::AwaitingInput)?;

                    self.state = LoopState::Speaking;
                    if !self.robot.speak(&reply, true).await {
                        tracing::warn!("Misty did not speak the reply");
                    }
                }
            }
        }

        let Some(prompt) = self.prompt.as_mut() else {
            self.state = LoopState::AwaitingInput;
            return Ok(Flow::Continue);
        };

        if wants_to_continue(&prompt.ask()?) {
            self.state = LoopState::AwaitingInput;
            Ok(Flow::Continue)
        } else {
            self.state = LoopState::Terminated;
            Ok(Flow::Exit)
        }
    }
}
