//! Shared test utilities
//!
//! Scripted stand-ins for the microphone, STT service, robot, completion
//! service and continuation prompt.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::time::Instant;

use misty_voice::conversation::ContinuePrompt;
use misty_voice::voice::{Microphone, SpeechCapture, Transcriber, WakeWord};
use misty_voice::{Error, ResponseGenerator, Result, Robot};

/// A short block of near-silence standing in for a recorded utterance
#[must_use]
pub fn utterance() -> Vec<f32> {
    vec![0.0; 1600]
}

/// Microphone that yields one utterance per call until the script runs out
pub struct ScriptedMicrophone {
    remaining: usize,
}

impl ScriptedMicrophone {
    pub fn new(utterances: usize) -> Self {
        Self {
            remaining: utterances,
        }
    }
}

#[async_trait(?Send)]
impl Microphone for ScriptedMicrophone {
    async fn record(&mut self) -> Result<Vec<f32>> {
        if self.remaining == 0 {
            return Err(Error::Audio("microphone script exhausted".to_string()));
        }
        self.remaining -= 1;
        Ok(utterance())
    }
}

/// Transcriber that returns scripted results in order
pub struct ScriptedTranscriber {
    results: RefCell<VecDeque<std::result::Result<String, String>>>,
}

impl ScriptedTranscriber {
    pub fn new(results: Vec<std::result::Result<&str, &str>>) -> Self {
        Self {
            results: RefCell::new(
                results
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(*t)).collect())
    }
}

#[async_trait(?Send)]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, wav: &[u8]) -> Result<String> {
        assert_eq!(&wav[0..4], b"RIFF", "transcriber should receive WAV audio");

        match self.results.borrow_mut().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(e)) => Err(Error::Stt(e)),
            None => panic!("transcriber script exhausted"),
        }
    }
}

/// Listener fed by a scripted microphone and transcriber
pub fn scripted_listener(texts: &[&str], wake_word: Option<&str>) -> SpeechCapture {
    let listener = SpeechCapture::new(
        Box::new(ScriptedMicrophone::new(texts.len())),
        Box::new(ScriptedTranscriber::texts(texts)),
    );

    match wake_word {
        Some(phrase) => listener.with_wake_word(WakeWord::new(phrase)),
        None => listener,
    }
}

/// One request the conversation made of the robot
#[derive(Debug, Clone, PartialEq)]
pub enum RobotCall {
    Probe,
    Drive {
        linear_velocity: f64,
        angular_velocity: f64,
        at: Instant,
    },
    Speak {
        text: String,
        flush: bool,
    },
}

/// Robot that records every call and answers as configured
#[derive(Clone)]
pub struct RecordingRobot {
    pub calls: Rc<RefCell<Vec<RobotCall>>>,
    reachable: bool,
    speaks: bool,
    drive_fails: bool,
}

impl RecordingRobot {
    pub fn new() -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
            reachable: true,
            speaks: true,
            drive_fails: false,
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn mute(mut self) -> Self {
        self.speaks = false;
        self
    }

    pub fn stalled(mut self) -> Self {
        self.drive_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<RobotCall> {
        self.calls.borrow().clone()
    }

    pub fn drives(&self) -> Vec<(f64, f64, Instant)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RobotCall::Drive {
                    linear_velocity,
                    angular_velocity,
                    at,
                } => Some((linear_velocity, angular_velocity, at)),
                _ => None,
            })
            .collect()
    }

    pub fn spoken(&self) -> Vec<(String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RobotCall::Speak { text, flush } => Some((text, flush)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait(?Send)]
impl Robot for RecordingRobot {
    async fn probe(&self) -> bool {
        self.calls.borrow_mut().push(RobotCall::Probe);
        self.reachable
    }

    async fn drive(&self, linear_velocity: f64, angular_velocity: f64) -> Result<()> {
        self.calls.borrow_mut().push(RobotCall::Drive {
            linear_velocity,
            angular_velocity,
            at: Instant::now(),
        });
        if self.drive_fails {
            return Err(Error::Io(std::io::Error::other("connection reset")));
        }
        Ok(())
    }

    async fn speak(&self, text: &str, flush: bool) -> bool {
        self.calls.borrow_mut().push(RobotCall::Speak {
            text: text.to_string(),
            flush,
        });
        self.speaks
    }
}

/// Completion service that records prompts and returns a fixed reply
#[derive(Clone)]
pub struct RecordingGenerator {
    pub prompts: Rc<RefCell<Vec<String>>>,
    reply: std::result::Result<String, String>,
}

impl RecordingGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            prompts: Rc::new(RefCell::new(Vec::new())),
            reply: Ok(reply.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            prompts: Rc::new(RefCell::new(Vec::new())),
            reply: Err(message.to_string()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

#[async_trait(?Send)]
impl ResponseGenerator for RecordingGenerator {
    async fn complete(&self, text: &str) -> Result<String> {
        self.prompts.borrow_mut().push(text.to_string());
        self.reply.clone().map_err(Error::Upstream)
    }
}

/// Continuation prompt with scripted answers
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub asked: Rc<RefCell<usize>>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| (*a).to_string()).collect(),
            asked: Rc::new(RefCell::new(0)),
        }
    }
}

impl ContinuePrompt for ScriptedPrompt {
    fn ask(&mut self) -> Result<String> {
        *self.asked.borrow_mut() += 1;
        self.answers
            .pop_front()
            .ok_or_else(|| Error::Prompt("no more answers".to_string()))
    }
}
