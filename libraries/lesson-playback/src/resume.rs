//! Resume banner
//!
//! `Hidden -> Visible(countdown) -> {Resumed | Restarted | Dismissed} -> Hidden`
//!
//! The banner only decides; the session applies the decision (seek, clear the
//! saved position). Once an outcome is reached the banner never shows again
//! for this mount.

use crate::types::ResumeConfig;
use lesson_core::ProgressValue;
use serde::Serialize;
use tracing::debug;

/// Banner visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BannerState {
    Hidden,
    /// Counting down; `remaining` seconds until auto-resume
    Visible { remaining: u32 },
}

/// How the banner was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BannerOutcome {
    Resumed,
    Restarted,
    Dismissed,
}

/// Effect the player must apply
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResumeDecision {
    /// Seek to the saved position
    Resume { position: f64 },
    /// Start from zero and forget the saved position
    Restart,
}

impl ResumeDecision {
    /// Playback position the decision seeks to
    pub fn position(&self) -> f64 {
        match self {
            Self::Resume { position } => *position,
            Self::Restart => 0.0,
        }
    }
}

/// Resume/restart banner with an auto-resume countdown
#[derive(Debug, Clone)]
pub struct ResumeBanner {
    config: ResumeConfig,
    state: BannerState,
    prior: Option<ProgressValue>,
    outcome: Option<BannerOutcome>,
}

impl ResumeBanner {
    pub fn new(config: ResumeConfig) -> Self {
        Self {
            config,
            state: BannerState::Hidden,
            prior: None,
            outcome: None,
        }
    }

    /// Offer a resume for prior progress. Returns whether the banner is shown.
    ///
    /// Only percentages strictly inside the configured window qualify.
    pub fn present(&mut self, prior: Option<ProgressValue>) -> bool {
        if self.outcome.is_some() {
            return false;
        }

        match prior {
            Some(progress) if self.config.in_window(progress.percentage()) => {
                self.prior = Some(progress);
                self.state = BannerState::Visible {
                    remaining: self.config.countdown_secs,
                };
                debug!(
                    percentage = progress.percentage(),
                    countdown = self.config.countdown_secs,
                    "Resume banner shown"
                );
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> BannerState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, BannerState::Visible { .. })
    }

    pub fn outcome(&self) -> Option<BannerOutcome> {
        self.outcome
    }

    /// Saved progress being offered
    pub fn prior(&self) -> Option<ProgressValue> {
        self.prior
    }

    /// One countdown second. Reaching zero resumes.
    pub fn tick(&mut self) -> Option<ResumeDecision> {
        let BannerState::Visible { remaining } = self.state else {
            return None;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            debug!("Resume countdown elapsed");
            return self.resume();
        }

        self.state = BannerState::Visible { remaining };
        None
    }

    /// Viewer chose resume
    pub fn resume(&mut self) -> Option<ResumeDecision> {
        let position = self.prior?.current_time();
        self.close(BannerOutcome::Resumed)
            .then_some(ResumeDecision::Resume { position })
    }

    /// Viewer chose to start over
    pub fn restart(&mut self) -> Option<ResumeDecision> {
        self.close(BannerOutcome::Restarted)
            .then_some(ResumeDecision::Restart)
    }

    /// Hide without deciding. Playback position is left alone.
    pub fn dismiss(&mut self) -> bool {
        self.close(BannerOutcome::Dismissed)
    }

    /// Stop the countdown on unmount without applying anything
    pub fn stop(&mut self) {
        self.state = BannerState::Hidden;
    }

    fn close(&mut self, outcome: BannerOutcome) -> bool {
        if !self.is_visible() {
            return false;
        }
        self.state = BannerState::Hidden;
        self.outcome = Some(outcome);
        debug!(?outcome, "Resume banner closed");
        true
    }
}
