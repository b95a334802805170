//! Result classification of completed verification jobs.

use crate::backend::types::ResultPayload;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No unsafe marking is reachable.
    Safe,
    /// At least one unsafe marking is reachable.
    Unsafe,
    /// The backend failed to analyse the system.
    Error(String),
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Safe => write!(f, "SAFE"),
            Outcome::Unsafe => write!(f, "UNSAFE"),
            Outcome::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}

pub struct ResultClassifier;

impl ResultClassifier {
    /// An error always wins over the unsafe flag.
    pub fn classify(payload: &ResultPayload) -> Outcome {
        if let Some(message) = &payload.error {
            return Outcome::Error(message.clone());
        }
        if payload.r#unsafe {
            Outcome::Unsafe
        } else {
            Outcome::Safe
        }
    }

    /// Classification of a completion signal, which may lack its payload.
    pub fn classify_completion(payload: Option<&ResultPayload>) -> Outcome {
        match payload {
            Some(payload) => Self::classify(payload),
            None => Outcome::Error("job completed without a result".to_string()),
        }
    }
}
