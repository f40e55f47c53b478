use std::path::PathBuf;

use crate::core::config::Settings;

/// The fixed exam: five questions in a fixed order, each with an immutable
/// duration. Question text lives on disk next to the server.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QuestionSpec {
    pub(crate) id: &'static str,
    pub(crate) duration_seconds: i64,
}

const QUESTIONS: &[QuestionSpec] = &[
    QuestionSpec { id: "question1", duration_seconds: 600 },
    QuestionSpec { id: "question2", duration_seconds: 900 },
    QuestionSpec { id: "question3", duration_seconds: 1200 },
    QuestionSpec { id: "question4", duration_seconds: 900 },
    QuestionSpec { id: "question5", duration_seconds: 600 },
];

#[derive(Debug, Clone)]
pub(crate) struct QuestionBank {
    questions_dir: PathBuf,
}

impl QuestionBank {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        Self { questions_dir: PathBuf::from(&settings.exam().questions_dir) }
    }

    pub(crate) fn all(&self) -> &'static [QuestionSpec] {
        QUESTIONS
    }

    pub(crate) fn get(&self, id: &str) -> Option<&'static QuestionSpec> {
        QUESTIONS.iter().find(|q| q.id == id)
    }

    /// The question that follows `id` in the fixed order, if any.
    pub(crate) fn next_after(&self, id: &str) -> Option<&'static str> {
        let index = QUESTIONS.iter().position(|q| q.id == id)?;
        QUESTIONS.get(index + 1).map(|q| q.id)
    }

    pub(crate) async fn text(&self, id: &str) -> Option<String> {
        let path = self.questions_dir.join(format!("{id}.txt"));
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Some(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(question = id, path = %path.display(), "Question text missing");
                None
            }
            Err(err) => {
                tracing::error!(error = %err, question = id, "Failed to read question text");
                None
            }
        }
    }
}
