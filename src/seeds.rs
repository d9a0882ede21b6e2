//! Built-in subject documents, inserted at startup when absent.

use crate::domain::{Subject, SubjectDoc};

/// One document per subject so a fresh store is immediately usable.
pub fn seed_subjects() -> Vec<(Subject, SubjectDoc)> {
    Subject::ALL
        .into_iter()
        .map(|subject| {
            let (name, description) = match subject {
                Subject::Alphabet => {
                    ("Alphabet", "Letters A to Z: phonics, tracing, cards and sounds")
                }
                Subject::Numbers => ("Numbers", "Counting and recognising numbers"),
                Subject::Colors => ("Colors", "Naming, matching and catching colors"),
                Subject::Shapes => ("Shapes", "Recognising basic shapes"),
            };
            (subject, SubjectDoc { name: name.into(), description: Some(description.into()) })
        })
        .collect()
}
