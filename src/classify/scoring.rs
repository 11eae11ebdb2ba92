//! # Ensemble scorer
//! Pure, testable logic that combines sentiment polarity, keyword hits, an
//! optional zero-shot hint, and structural signals into two competing sums.
//! No I/O, suitable for unit tests and offline calibration.
//!
//! Policy: the larger sum names the label (ties go non-productive), and
//! confidence is `0.6 + winning sum`, clipped at 0.95.

use serde::Serialize;

use super::weights::Weights;
use super::Label;
use crate::sentiment::SentimentScores;

/// Which side of the business/social partition a zero-shot label fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroShotSide {
    Business,
    Social,
    Neither,
}

/// Structural features read off the raw (uncleaned) email text.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StructureSignals {
    pub word_count: usize,
    pub question_marks: usize,
    pub exclamation_marks: usize,
    pub uppercase_ratio: f32,
}

impl StructureSignals {
    pub fn from_text(text: &str) -> Self {
        let word_count = text.split_whitespace().count();
        let question_marks = text.matches('?').count();
        let exclamation_marks = text.matches('!').count();

        let alpha = text.chars().filter(|c| c.is_alphabetic()).count();
        let upper = text.chars().filter(|c| c.is_uppercase()).count();
        let uppercase_ratio = if alpha == 0 {
            0.0
        } else {
            upper as f32 / alpha as f32
        };

        Self {
            word_count,
            question_marks,
            exclamation_marks,
            uppercase_ratio,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnsembleOutcome {
    pub label: Label,
    pub confidence: f32,
    pub productive_score: f32,
    pub nonproductive_score: f32,
}

/// Combine all signals into a label and confidence.
pub fn combine(
    sentiment: SentimentScores,
    productive_hits: usize,
    nonproductive_hits: usize,
    zero_shot: Option<(ZeroShotSide, f32)>,
    signals: &StructureSignals,
    w: &Weights,
) -> EnsembleOutcome {
    // Sentiment carries the smallest weight: negative tone hints at a
    // trouble report, positive tone at social mail, but both mislead often
    // enough that keywords dominate.
    let mut productive = sentiment.negative * w.w_sentiment_negative;
    let mut nonproductive = sentiment.positive * w.w_sentiment_positive;

    productive += productive_hits as f32 * w.w_keyword_productive;
    nonproductive += nonproductive_hits as f32 * w.w_keyword_nonproductive;

    if let Some((side, score)) = zero_shot {
        match side {
            ZeroShotSide::Business => productive += score * w.w_zero_shot,
            ZeroShotSide::Social => nonproductive += score * w.w_zero_shot,
            ZeroShotSide::Neither => {}
        }
    }

    if signals.question_marks > 0 {
        productive += w.question_bonus;
    }
    if signals.word_count < 30 && nonproductive_hits > 0 {
        nonproductive += w.short_social_bonus;
    }
    if signals.word_count > 100 {
        productive += w.long_body_bonus;
    }
    // All-caps bodies read as shouted urgency; require a few words so a
    // short "OK" does not trip it.
    if signals.uppercase_ratio > 0.3 && signals.word_count >= 5 {
        productive += w.shouting_bonus;
    }
    if signals.exclamation_marks >= 3 && nonproductive_hits > productive_hits {
        nonproductive += w.exclamation_bonus;
    }

    let (label, winning) = if productive > nonproductive {
        (Label::Productive, productive)
    } else {
        (Label::NonProductive, nonproductive)
    };

    EnsembleOutcome {
        label,
        confidence: round2((0.6 + winning).min(0.95)),
        productive_score: productive,
        nonproductive_score: nonproductive,
    }
}

/// Two-decimal rounding for reported confidences.
pub fn round2(x: f32) -> f32 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neutral_signals(word_count: usize) -> StructureSignals {
        StructureSignals {
            word_count,
            ..Default::default()
        }
    }

    #[test]
    fn keyword_hits_drive_the_label() {
        let out = combine(
            SentimentScores::neutral(),
            4,
            0,
            None,
            &neutral_signals(40),
            &Weights::default(),
        );
        assert_eq!(out.label, Label::Productive);
        assert!(out.confidence <= 0.95);
    }

    #[test]
    fn tie_goes_non_productive() {
        let out = combine(
            SentimentScores {
                positive: 0.0,
                negative: 0.0,
            },
            0,
            0,
            None,
            &neutral_signals(40),
            &Weights::default(),
        );
        assert_eq!(out.label, Label::NonProductive);
    }

    #[test]
    fn question_marks_boost_productive() {
        let base = combine(
            SentimentScores::neutral(),
            1,
            1,
            None,
            &neutral_signals(40),
            &Weights::default(),
        );
        let with_question = combine(
            SentimentScores::neutral(),
            1,
            1,
            None,
            &StructureSignals {
                word_count: 40,
                question_marks: 2,
                ..Default::default()
            },
            &Weights::default(),
        );
        assert!(with_question.productive_score > base.productive_score);
    }

    #[test]
    fn short_social_mail_gets_the_bonus() {
        let out = combine(
            SentimentScores::neutral(),
            0,
            1,
            None,
            &neutral_signals(10),
            &Weights::default(),
        );
        // 0.5*0.3 + 0.4 + 0.3 vs 0.5*0.2
        assert_eq!(out.label, Label::NonProductive);
        assert!(out.nonproductive_score > 0.8);
    }

    #[test]
    fn zero_shot_sides_push_their_sum() {
        let business = combine(
            SentimentScores::neutral(),
            0,
            0,
            Some((ZeroShotSide::Business, 0.9)),
            &neutral_signals(40),
            &Weights::default(),
        );
        assert_eq!(business.label, Label::Productive);

        let social = combine(
            SentimentScores::neutral(),
            0,
            0,
            Some((ZeroShotSide::Social, 0.9)),
            &neutral_signals(40),
            &Weights::default(),
        );
        assert_eq!(social.label, Label::NonProductive);
    }

    #[test]
    fn shouting_counts_toward_productive() {
        let shouted = StructureSignals::from_text("SERVER IS DOWN FIX NOW");
        assert!(shouted.uppercase_ratio > 0.9);
        let out = combine(
            SentimentScores::neutral(),
            0,
            0,
            None,
            &shouted,
            &Weights::default(),
        );
        assert!(out.productive_score > 0.1);
    }

    #[test]
    fn confidence_is_clipped_and_rounded() {
        let out = combine(
            SentimentScores::neutral(),
            10,
            0,
            None,
            &neutral_signals(40),
            &Weights::default(),
        );
        assert!((out.confidence - 0.95).abs() < f32::EPSILON);
        assert_eq!(round2(0.123_456), 0.12);
    }

    #[test]
    fn signals_read_from_text() {
        let s = StructureSignals::from_text("Is it broken? Really?! Help!");
        assert_eq!(s.word_count, 5);
        assert_eq!(s.question_marks, 2);
        assert_eq!(s.exclamation_marks, 2);
    }
}
