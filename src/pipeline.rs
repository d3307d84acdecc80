use crate::components::{EventExtractor, MailFetcher};
use crate::components::gmail::extract_text;
use crate::error::AppResult;
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Authenticating,
    Fetching,
    ExtractingText,
    SubmittingForClassification,
    ParsingResponse,
    Persisting,
    Done,
    Aborted,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStage::Idle => "idle",
            RunStage::Authenticating => "authenticating",
            RunStage::Fetching => "fetching newest message",
            RunStage::ExtractingText => "extracting text",
            RunStage::SubmittingForClassification => "submitting for classification",
            RunStage::ParsingResponse => "parsing model response",
            RunStage::Persisting => "saving events",
            RunStage::Done => "done",
            RunStage::Aborted => "aborted",
        };
        write!(f, "{}", label)
    }
}

/// How a run ended when nothing went wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No message from the sender; nothing was classified
    NoMatch,
    /// The message had no readable text; nothing was classified
    EmptyBody,
    /// Events were written to `path`
    Completed { events: usize, path: PathBuf },
}

/// Fetch-then-extract run over one message
pub struct Pipeline {
    fetcher: MailFetcher,
    extractor: EventExtractor,
    stage: RunStage,
}

impl Pipeline {
    pub fn new(fetcher: MailFetcher, extractor: EventExtractor) -> Self {
        Self {
            fetcher,
            extractor,
            stage: RunStage::Idle,
        }
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    fn advance(&mut self, next: RunStage) {
        info!("[{}] {}", step_number(next), next);
        self.stage = next;
    }

    /// Run every stage once. Any failure leaves the pipeline `Aborted` and
    /// nothing written.
    pub async fn run(&mut self) -> AppResult<RunOutcome> {
        match self.run_stages().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Run failed during '{}': {}", self.stage, e);
                self.advance(RunStage::Aborted);
                Err(e)
            }
        }
    }

    async fn run_stages(&mut self) -> AppResult<RunOutcome> {
        self.advance(RunStage::Authenticating);
        self.fetcher.authenticate().await?;

        self.advance(RunStage::Fetching);
        let Some(message) = self.fetcher.fetch_latest_raw().await? else {
            info!("No message from {}, skipping extraction", self.fetcher.sender());
            self.advance(RunStage::Aborted);
            return Ok(RunOutcome::NoMatch);
        };

        self.advance(RunStage::ExtractingText);
        let text = extract_text(&message);
        if text.is_empty() {
            info!("Message has no readable text, skipping extraction");
            self.advance(RunStage::Aborted);
            return Ok(RunOutcome::EmptyBody);
        }
        info!("Extracted {} characters of text", text.chars().count());

        self.advance(RunStage::SubmittingForClassification);
        let response = self.extractor.submit(&text).await?;

        self.advance(RunStage::ParsingResponse);
        let events = self.extractor.parse(&response)?;

        self.advance(RunStage::Persisting);
        self.extractor.persist(&events)?;

        self.advance(RunStage::Done);
        Ok(RunOutcome::Completed {
            events: events.len(),
            path: self.extractor.output_path().to_path_buf(),
        })
    }
}

fn step_number(stage: RunStage) -> &'static str {
    match stage {
        RunStage::Idle => "0/7",
        RunStage::Authenticating => "1/7",
        RunStage::Fetching => "2/7",
        RunStage::ExtractingText => "3/7",
        RunStage::SubmittingForClassification => "4/7",
        RunStage::ParsingResponse => "5/7",
        RunStage::Persisting => "6/7",
        RunStage::Done => "7/7",
        RunStage::Aborted => "x",
    }
}
