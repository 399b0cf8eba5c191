//! Analysis feedback (warnings, errors, info).
//!
//! The generous philosophy: analysis and concatenation keep going when they
//! hit a structural oddity, collecting feedback for the caller instead of
//! failing.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub message: String,
}

impl Feedback {
    pub fn error(message: impl Into<String>) -> Self {
        Feedback {
            level: FeedbackLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Feedback {
            level: FeedbackLevel::Warning,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Feedback {
            level: FeedbackLevel::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackLevel {
    /// A needed structural element is missing; the result degrades.
    Error,
    /// Processed with assumptions, may not be what the file intended.
    Warning,
    /// Minor observation.
    Info,
}

impl fmt::Display for FeedbackLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FeedbackLevel::Error => "error",
            FeedbackLevel::Warning => "warning",
            FeedbackLevel::Info => "info",
        };
        f.write_str(label)
    }
}

/// Collector for feedback during a scan.
#[derive(Debug, Default)]
pub struct FeedbackCollector {
    feedback: Vec<Feedback>,
}

impl FeedbackCollector {
    pub fn new() -> Self {
        FeedbackCollector::default()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.feedback.push(Feedback::error(message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.feedback.push(Feedback::warning(message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.feedback.push(Feedback::info(message));
    }

    pub fn has_errors(&self) -> bool {
        self.feedback
            .iter()
            .any(|f| f.level == FeedbackLevel::Error)
    }

    pub fn into_feedback(self) -> Vec<Feedback> {
        self.feedback
    }

    pub fn feedback(&self) -> &[Feedback] {
        &self.feedback
    }
}

/// A value plus the feedback gathered while producing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analyzed<T> {
    pub value: T,
    pub feedback: Vec<Feedback>,
}

impl<T> Analyzed<T> {
    pub fn new(value: T, feedback: Vec<Feedback>) -> Self {
        Analyzed { value, feedback }
    }

    pub fn ok(value: T) -> Self {
        Analyzed {
            value,
            feedback: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.feedback
            .iter()
            .any(|f| f.level == FeedbackLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Feedback> {
        self.feedback
            .iter()
            .filter(|f| f.level == FeedbackLevel::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Feedback> {
        self.feedback
            .iter()
            .filter(|f| f.level == FeedbackLevel::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector() {
        let mut collector = FeedbackCollector::new();
        collector.warning("staff count mismatch");
        assert!(!collector.has_errors());
        collector.error("no Bass staff");
        assert!(collector.has_errors());

        let feedback = collector.into_feedback();
        assert_eq!(feedback.len(), 2);
        assert_eq!(feedback[0].level, FeedbackLevel::Warning);
    }

    #[test]
    fn test_analyzed() {
        let result = Analyzed::new(
            7,
            vec![Feedback::warning("w"), Feedback::error("e")],
        );
        assert!(result.has_errors());
        assert_eq!(result.warnings().count(), 1);
        assert_eq!(result.errors().count(), 1);
    }
}
