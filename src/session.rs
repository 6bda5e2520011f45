//! Outline, classify, reveal: the flow a trainee walks through for one case.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::raster::{AnnotationLayer, ReferenceMask};
use crate::scorer::{MaskOverlapScorer, OverlapReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the trainee to outline the pathology.
    Outline,
    /// Outline scored; waiting for a diagnosis.
    Classify,
    /// Answer recorded; results visible.
    Reveal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    OutlineSubmitted,
    AnswerSubmitted,
    Reset,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub label: String,
    pub image_file: String,
    pub diagnosis: String,
}

impl Case {
    pub fn new(label: &str, image_file: &str, diagnosis: &str) -> Self {
        Self {
            label: label.to_string(),
            image_file: image_file.to_string(),
            diagnosis: diagnosis.to_string(),
        }
    }

    /// The teaching set shipped with the tutor.
    pub fn catalog() -> Vec<Case> {
        vec![
            Case::new("Patient A: Cerebral Mass", "glioma.jpg", "Glioma"),
            Case::new("Patient B: Parasagittal Mass", "meningioma.jpg", "Meningioma"),
            Case::new("Patient C: Sellar Region", "pituitary.jpg", "Pituitary"),
            Case::new("Patient D: Normal Control", "no_tumor.jpg", "No Tumor"),
        ]
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        answer.trim().eq_ignore_ascii_case(self.diagnosis.trim())
    }
}

/// What the trainee sees once the case is revealed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict<'a> {
    pub case: &'a Case,
    pub overlap: &'a OverlapReport,
    pub answer: &'a str,
    pub correct: bool,
}

pub struct TutorSession {
    case: Case,
    scorer: MaskOverlapScorer,
    phase: Phase,
    overlap: Option<OverlapReport>,
    answer: Option<String>,
}

impl TutorSession {
    pub fn new(case: Case, scorer: MaskOverlapScorer) -> Self {
        Self {
            case,
            scorer,
            phase: Phase::Outline,
            overlap: None,
            answer: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn case(&self) -> &Case {
        &self.case
    }

    pub fn overlap(&self) -> Option<&OverlapReport> {
        self.overlap.as_ref()
    }

    fn expect(&self, phase: Phase, event: Event) -> Result<()> {
        if self.phase != phase {
            return Err(ScoreError::InvalidTransition {
                from: self.phase,
                event,
            });
        }
        Ok(())
    }

    /// Scores the outline and moves on to classification. A scoring error
    /// leaves the session in `Outline` so the trainee can redraw.
    pub fn submit_outline(
        &mut self,
        annotation: &AnnotationLayer,
        reference: &ReferenceMask,
    ) -> Result<&OverlapReport> {
        self.expect(Phase::Outline, Event::OutlineSubmitted)?;
        let report = self.scorer.report(annotation, reference)?;
        log::info!("{}: outline scored dice={:.3}", self.case.label, report.dice);
        self.phase = Phase::Classify;
        Ok(self.overlap.insert(report))
    }

    /// Records the diagnosis and reveals the case. Returns whether it matched.
    pub fn submit_answer(&mut self, answer: &str) -> Result<bool> {
        self.expect(Phase::Classify, Event::AnswerSubmitted)?;
        let correct = self.case.is_correct(answer);
        log::info!("{}: answered {:?} (correct: {})", self.case.label, answer, correct);
        self.answer = Some(answer.to_string());
        self.phase = Phase::Reveal;
        Ok(correct)
    }

    pub fn verdict(&self) -> Option<Verdict<'_>> {
        match (self.phase, &self.overlap, &self.answer) {
            (Phase::Reveal, Some(overlap), Some(answer)) => Some(Verdict {
                case: &self.case,
                overlap,
                answer,
                correct: self.case.is_correct(answer),
            }),
            _ => None,
        }
    }

    /// Clears the canvas state. Valid from any phase.
    pub fn reset(&mut self) {
        log::debug!("{}: reset from {:?}", self.case.label, self.phase);
        self.phase = Phase::Outline;
        self.overlap = None;
        self.answer = None;
    }
}
