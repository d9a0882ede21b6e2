//! Stage validation: per (subject, game type) field rules.
//!
//! `validate_stage` never stops at the first problem. It normalizes the
//! candidate (trimming, letter case, derived ids), evaluates every rule for
//! the concrete game type and either returns the normalized stage tagged
//! with that game type or a `ValidationFailed` listing all violations.

use std::collections::HashSet;

use serde_json::Number;
use tracing::debug;

use crate::catalog::{self, UNSET_COLOR, VOWELS};
use crate::domain::{CardPair, GameType, StageData, Subject};
use crate::error::{AuthoringError, Result, Violation};

const CARD_PAIRS_EXACT: usize = 3;
const MATCHING_MIN_PAIRS: usize = 2;
const SOUND_MIN_PAIRS: usize = 2;
const SOUND_MAX_PAIRS: usize = 5;
const MIN_CHOICES: usize = 2;
const COUNTING_CHOICES: usize = 3;
const MATCHING_COLORS: usize = 4;
const DRAG_COUNT_RANGE: std::ops::RangeInclusive<i64> = 1..=9;

#[derive(Default)]
struct Findings(Vec<Violation>);

impl Findings {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(Violation::new(field, message));
    }

    fn into_result<T>(self, value: T) -> Result<T> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(AuthoringError::ValidationFailed { violations: self.0 })
        }
    }
}

/// Validate one candidate stage for a level of `level_game_type`.
///
/// For `mixed` levels the candidate must carry its own concrete game type,
/// restricted to the subject's mixed subtypes; the nested type's rules then
/// apply. For every other level type the stage is tagged with the level's
/// game type, whatever tag the candidate carried.
pub fn validate_stage(
    subject: Subject,
    level_game_type: GameType,
    candidate: &StageData,
) -> Result<StageData> {
    catalog::lookup(subject, level_game_type)?;

    let mut stage = candidate.clone();
    let mut findings = Findings::default();

    let concrete = if level_game_type == GameType::Mixed {
        match candidate.game_type {
            Some(nested) if catalog::mixed_subtypes(subject).contains(&nested) => Some(nested),
            Some(nested) => {
                let message = format!("{nested} stages cannot be part of a mixed level");
                findings.push("gameType", message);
                None
            }
            None => {
                findings.push("gameType", "a mixed stage must declare its own game type");
                None
            }
        }
    } else {
        Some(level_game_type)
    };

    if let Some(game_type) = concrete {
        check_stage(subject, game_type, &mut stage, &mut findings);
        stage.game_type = Some(game_type);
    }

    debug!(
        target: "authoring",
        %subject,
        %level_game_type,
        violations = findings.0.len(),
        "Stage validated"
    );
    findings.into_result(stage)
}

fn check_stage(subject: Subject, game_type: GameType, stage: &mut StageData, f: &mut Findings) {
    use GameType as G;
    match (subject, game_type) {
        (Subject::Alphabet, G::Phonics | G::Image) => alphabet_choice(stage, f),
        (Subject::Alphabet, G::Catching) => alphabet_catching(stage, f),
        (Subject::Alphabet, G::Tracing) => alphabet_tracing(stage, f),
        (Subject::Alphabet, G::Cards) => card_pairs(stage, f, PairCount::Exactly(CARD_PAIRS_EXACT)),
        (Subject::Alphabet, G::Matching) => {
            card_pairs(stage, f, PairCount::AtLeast(MATCHING_MIN_PAIRS))
        }
        (Subject::Alphabet, G::Sound) => alphabet_sound(stage, f),
        (Subject::Numbers, G::Counting) => numbers_counting(stage, f),
        (Subject::Numbers, G::Dragndrop) => numbers_dragndrop(stage, f),
        (Subject::Numbers, G::Catching) => {
            stage.correct_number = trimmed(&stage.correct_number);
            if stage.correct_number.is_none() {
                f.push("correctNumber", "is required");
            }
        }
        (Subject::Colors, G::ColorMultipleChoice | G::Catching) => {
            let options = catalog::color_options(game_type);
            pick_option(f, "correctColor", &mut stage.correct_color, options);
        }
        (Subject::Colors, G::Rocket) => {
            pick_option(f, "correctChoice", &mut stage.correct_choice, catalog::COLOR_LIBRARY);
        }
        (Subject::Colors, G::Matching) => colors_matching(stage, f),
        (Subject::Shapes, G::ShapesMultipleChoice | G::RocketShapes | G::Racing | G::Catching) => {
            let options = catalog::shape_options(game_type);
            pick_option(f, "correctShape", &mut stage.correct_shape, options);
        }
        _ => f.push("gameType", format!("no stage rules for {game_type} in {subject}")),
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn upper(value: &Option<String>) -> Option<String> {
    trimmed(value).map(|s| s.to_uppercase())
}

fn clean_list(list: &Option<Vec<String>>, uppercase: bool) -> Option<Vec<String>> {
    list.as_ref().map(|items| {
        items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| if uppercase { s.to_uppercase() } else { s.to_string() })
            .collect()
    })
}

fn list_len<T>(list: &Option<Vec<T>>) -> usize {
    list.as_ref().map_or(0, Vec::len)
}

fn require_letter(f: &mut Findings, field: &str, value: &Option<String>) {
    match value {
        None => f.push(field, "is required"),
        Some(v) if v.chars().count() != 1 => f.push(field, "must be a single letter"),
        Some(_) => {}
    }
}

fn is_single_latin_letter(s: &str) -> bool {
    let mut chars = s.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

fn alphabet_choice(stage: &mut StageData, f: &mut Findings) {
    stage.correct_letter = upper(&stage.correct_letter);
    stage.choices = clean_list(&stage.choices, true);

    require_letter(f, "correctLetter", &stage.correct_letter);
    if list_len(&stage.choices) < MIN_CHOICES {
        f.push("choices", format!("needs at least {MIN_CHOICES} entries"));
    }
}

fn alphabet_catching(stage: &mut StageData, f: &mut Findings) {
    let letters = clean_list(&stage.correct_letters, true).filter(|l| !l.is_empty());

    if let Some(letters) = &letters {
        let given: HashSet<&str> = letters.iter().map(String::as_str).collect();
        let vowels: HashSet<&str> = VOWELS.iter().copied().collect();
        if letters.len() == VOWELS.len() && given == vowels {
            let vowel_list: Vec<String> = VOWELS.iter().map(|v| v.to_string()).collect();
            stage.correct_letter = Some("vowels".into());
            stage.correct_letters = Some(vowel_list.clone());
            stage.choices = Some(vowel_list);
            return;
        }
    }

    // Single target letter. An unsupported letter set only matters when this
    // branch cannot carry the stage either.
    let mut single = Findings::default();
    stage.correct_letter = upper(&stage.correct_letter);
    stage.choices = clean_list(&stage.choices, true);
    require_letter(&mut single, "correctLetter", &stage.correct_letter);
    if list_len(&stage.choices) == 0 {
        single.push("choices", "is required");
    }

    if single.0.is_empty() {
        stage.correct_letters = None;
        return;
    }
    if letters.is_some() {
        f.push("correctLetters", "only the vowel set A, E, I, O, U is supported");
    }
    stage.correct_letters = letters;
    f.0.extend(single.0);
}

fn alphabet_tracing(stage: &mut StageData, f: &mut Findings) {
    stage.letter = upper(&stage.letter);
    stage.stroke_order = clean_list(&stage.stroke_order, false);

    require_letter(f, "letter", &stage.letter);
    if list_len(&stage.stroke_order) == 0 {
        f.push("strokeOrder", "needs at least one stroke");
    }
}

enum PairCount {
    Exactly(usize),
    AtLeast(usize),
}

fn card_pairs(stage: &mut StageData, f: &mut Findings, count: PairCount) {
    if let Some(pairs) = stage.card_pairs.as_mut() {
        for pair in pairs.iter_mut() {
            *pair = CardPair {
                letter: pair.letter.trim().to_uppercase(),
                image_name: trimmed(&pair.image_name),
            };
        }
    }

    let n = list_len(&stage.card_pairs);
    match count {
        PairCount::Exactly(want) if n != want => {
            f.push("cardPairs", format!("needs exactly {want} entries"))
        }
        PairCount::AtLeast(min) if n < min => {
            f.push("cardPairs", format!("needs at least {min} entries"))
        }
        _ => {}
    }

    for (i, pair) in stage.card_pairs.iter().flatten().enumerate() {
        if pair.letter.is_empty() {
            f.push(format!("cardPairs[{i}].letter"), "is required");
        }
    }
}

fn alphabet_sound(stage: &mut StageData, f: &mut Findings) {
    if let Some(pairs) = stage.sound_pairs.as_mut() {
        for (i, pair) in pairs.iter_mut().enumerate() {
            pair.letter = pair.letter.trim().to_uppercase();
            if is_single_latin_letter(&pair.letter) {
                pair.sound_id = format!("sound_{}", pair.letter);
            } else {
                f.push(format!("soundPairs[{i}].letter"), "must be a single letter A-Z");
            }
        }
    }

    let n = list_len(&stage.sound_pairs);
    if n < SOUND_MIN_PAIRS {
        f.push("soundPairs", format!("needs at least {SOUND_MIN_PAIRS} entries"));
    } else if n > SOUND_MAX_PAIRS {
        f.push("soundPairs", format!("allows at most {SOUND_MAX_PAIRS} entries"));
    }
}

fn numbers_counting(stage: &mut StageData, f: &mut Findings) {
    stage.correct_answer = trimmed(&stage.correct_answer);
    stage.choices = clean_list(&stage.choices, false);

    if stage.correct_answer.is_none() {
        f.push("correctAnswer", "is required");
    }
    if stage.image_count.unwrap_or(0) == 0 {
        f.push("imageCount", "is required");
    }
    if list_len(&stage.choices) != COUNTING_CHOICES {
        f.push("choices", format!("needs exactly {COUNTING_CHOICES} entries"));
    }
    if let (Some(answer), Some(choices)) = (&stage.correct_answer, &stage.choices) {
        if !choices.contains(answer) {
            f.push("choices", "must include the correct answer");
        }
    }
}

/// Accepts `3` and `3.0`, rejects `3.5`.
fn whole_number(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

fn numbers_dragndrop(stage: &mut StageData, f: &mut Findings) {
    match stage.correct_count.as_ref().map(whole_number) {
        None => f.push("correctCount", "is required"),
        Some(Some(count)) if DRAG_COUNT_RANGE.contains(&count) => {
            stage.correct_count = Some(Number::from(count));
        }
        Some(_) => f.push(
            "correctCount",
            format!(
                "must be a whole number from {} to {}",
                DRAG_COUNT_RANGE.start(),
                DRAG_COUNT_RANGE.end()
            ),
        ),
    }
}

fn pick_option(f: &mut Findings, field: &str, value: &mut Option<String>, options: &[&str]) {
    *value = trimmed(value).map(|s| s.to_lowercase());
    match value.as_deref() {
        None => f.push(field, "is required"),
        Some(v) if !options.contains(&v) => {
            f.push(field, format!("'{v}' is not one of: {}", options.join(", ")))
        }
        Some(_) => {}
    }
}

fn colors_matching(stage: &mut StageData, f: &mut Findings) {
    stage.colors = stage
        .colors
        .as_ref()
        .map(|colors| colors.iter().map(|c| c.trim().to_lowercase()).collect());
    let colors = stage.colors.as_deref().unwrap_or_default();

    if colors.len() != MATCHING_COLORS {
        f.push("colors", format!("needs exactly {MATCHING_COLORS} entries"));
    }
    if colors.iter().any(|c| c == UNSET_COLOR || c.is_empty()) {
        f.push("colors", "every slot must have a color selected");
    }

    let chosen: Vec<&str> = colors
        .iter()
        .map(String::as_str)
        .filter(|c| *c != UNSET_COLOR && !c.is_empty())
        .collect();
    let distinct: HashSet<&str> = chosen.iter().copied().collect();
    if distinct.len() != chosen.len() {
        f.push("colors", "colors must all be different");
    }
    for color in chosen {
        if !catalog::COLOR_LIBRARY.contains(&color) {
            f.push("colors", format!("'{color}' is not a known color"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SoundPair;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn stage(value: serde_json::Value) -> StageData {
        serde_json::from_value(value).unwrap()
    }

    fn violations(result: Result<StageData>) -> Vec<Violation> {
        match result {
            Err(AuthoringError::ValidationFailed { violations }) => violations,
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    fn fields(result: Result<StageData>) -> Vec<String> {
        violations(result).into_iter().map(|v| v.field).collect()
    }

    // -- Required fields ------------------------------------------------------

    #[test]
    fn empty_stage_names_every_required_field() {
        for subject in Subject::ALL {
            for entry in catalog::entries_for(subject) {
                let found = fields(validate_stage(subject, entry.game_type, &StageData::default()));
                for required in entry.required_fields {
                    assert!(
                        found.iter().any(|f| f == required),
                        "{subject}/{}: expected violation for {required}, got {found:?}",
                        entry.game_type
                    );
                }
            }
        }
    }

    #[test]
    fn unknown_pair_is_rejected_before_field_checks() {
        assert_matches!(
            validate_stage(Subject::Shapes, GameType::Counting, &StageData::default()),
            Err(AuthoringError::UnknownGameType { .. })
        );
    }

    // -- Alphabet -------------------------------------------------------------

    #[test]
    fn phonics_normalizes_and_tags() {
        let out = validate_stage(
            Subject::Alphabet,
            GameType::Phonics,
            &stage(json!({ "correctLetter": " b ", "choices": ["a", " b", "", "c"] })),
        )
        .unwrap();
        assert_eq!(out.correct_letter.as_deref(), Some("B"));
        assert_eq!(out.choices, Some(vec!["A".into(), "B".into(), "C".into()]));
        assert_eq!(out.game_type, Some(GameType::Phonics));
    }

    #[test]
    fn phonics_reports_all_problems_at_once() {
        let found = fields(validate_stage(
            Subject::Alphabet,
            GameType::Image,
            &stage(json!({ "correctLetter": "AB", "choices": ["A"] })),
        ));
        assert_eq!(found, vec!["correctLetter".to_string(), "choices".to_string()]);
    }

    #[test]
    fn catching_accepts_target_letter_with_choices() {
        let out = validate_stage(
            Subject::Alphabet,
            GameType::Catching,
            &stage(json!({ "correctLetter": "m", "choices": ["M", "N"] })),
        )
        .unwrap();
        assert_eq!(out.correct_letter.as_deref(), Some("M"));
    }

    #[test]
    fn catching_vowel_set_is_normalized() {
        let out = validate_stage(
            Subject::Alphabet,
            GameType::Catching,
            &stage(json!({ "correctLetters": ["u", "o", "i", "e", "a"] })),
        )
        .unwrap();
        assert_eq!(out.correct_letter.as_deref(), Some("vowels"));
        assert_eq!(out.correct_letters.as_ref().map(Vec::len), Some(5));
        assert_eq!(out.choices, out.correct_letters);

        let again = validate_stage(Subject::Alphabet, GameType::Catching, &out).unwrap();
        assert_eq!(again, out);
    }

    #[test]
    fn catching_rejects_other_letter_sets_without_a_target() {
        let found = fields(validate_stage(
            Subject::Alphabet,
            GameType::Catching,
            &stage(json!({ "correctLetters": ["A", "B"] })),
        ));
        assert_eq!(
            found,
            vec!["correctLetters".to_string(), "correctLetter".to_string(), "choices".to_string()]
        );
    }

    #[test]
    fn catching_target_letter_wins_over_unsupported_letter_set() {
        let out = validate_stage(
            Subject::Alphabet,
            GameType::Catching,
            &stage(json!({ "correctLetter": "M", "choices": ["M", "N"], "correctLetters": ["B"] })),
        )
        .unwrap();
        assert_eq!(out.correct_letter.as_deref(), Some("M"));
        assert_eq!(out.choices, Some(vec!["M".to_string(), "N".to_string()]));
        assert_eq!(out.correct_letters, None);
    }

    #[test]
    fn tracing_needs_letter_and_strokes() {
        let ok = validate_stage(
            Subject::Alphabet,
            GameType::Tracing,
            &stage(json!({ "letter": "a", "strokeOrder": ["down", "across"] })),
        );
        assert!(ok.is_ok());
        let found = fields(validate_stage(
            Subject::Alphabet,
            GameType::Tracing,
            &stage(json!({ "letter": "a", "strokeOrder": [" "] })),
        ));
        assert_eq!(found, vec!["strokeOrder".to_string()]);
    }

    #[test]
    fn cards_need_exactly_three_pairs() {
        let two = stage(json!({ "cardPairs": [{ "letter": "a" }, { "letter": "b" }] }));
        assert_eq!(
            fields(validate_stage(Subject::Alphabet, GameType::Cards, &two)),
            vec!["cardPairs".to_string()]
        );

        let three = stage(json!({
            "cardPairs": [{ "letter": "a" }, { "letter": "b" }, { "letter": "c" }]
        }));
        let out = validate_stage(Subject::Alphabet, GameType::Cards, &three).unwrap();
        assert_eq!(out.card_pairs.unwrap()[2].letter, "C");

        // Matching accepts two pairs.
        assert!(validate_stage(Subject::Alphabet, GameType::Matching, &two).is_ok());
    }

    #[test]
    fn sound_pairs_derive_ids_and_cap_at_five() {
        let out = validate_stage(
            Subject::Alphabet,
            GameType::Sound,
            &stage(json!({
                "soundPairs": [{ "letter": "a" }, { "letter": "B", "soundId": "whatever" }]
            })),
        )
        .unwrap();
        assert_eq!(
            out.sound_pairs.unwrap(),
            vec![
                SoundPair { letter: "A".into(), sound_id: "sound_A".into() },
                SoundPair { letter: "B".into(), sound_id: "sound_B".into() },
            ]
        );

        let six: Vec<_> = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .map(|l| json!({ "letter": l }))
            .collect();
        let too_many = stage(json!({ "soundPairs": six }));
        let found = violations(validate_stage(Subject::Alphabet, GameType::Sound, &too_many));
        assert_eq!(found[0].field, "soundPairs");
        assert!(found[0].message.contains("at most 5"));
    }

    #[test]
    fn sound_pair_letters_must_be_latin() {
        let found = fields(validate_stage(
            Subject::Alphabet,
            GameType::Sound,
            &stage(json!({ "soundPairs": [{ "letter": "A" }, { "letter": "7" }] })),
        ));
        assert_eq!(found, vec!["soundPairs[1].letter".to_string()]);
    }

    // -- Mixed ----------------------------------------------------------------

    #[test]
    fn mixed_dispatches_on_nested_type() {
        let out = validate_stage(
            Subject::Alphabet,
            GameType::Mixed,
            &stage(json!({ "gameType": "image", "correctLetter": "c", "choices": ["C", "D"] })),
        )
        .unwrap();
        assert_eq!(out.game_type, Some(GameType::Image));

        let found = fields(validate_stage(
            Subject::Alphabet,
            GameType::Mixed,
            &stage(json!({ "gameType": "cards", "cardPairs": [] })),
        ));
        assert_eq!(found, vec!["cardPairs".to_string()]);
    }

    #[test]
    fn mixed_rejects_excluded_or_missing_nested_type() {
        for nested in ["catching", "tracing", "matching", "mixed"] {
            let found = fields(validate_stage(
                Subject::Alphabet,
                GameType::Mixed,
                &stage(json!({ "gameType": nested, "correctLetter": "A", "choices": ["A", "B"] })),
            ));
            assert_eq!(found, vec!["gameType".to_string()], "{nested}");
        }
    }

    #[test]
    fn non_mixed_stage_tag_is_overwritten() {
        let out = validate_stage(
            Subject::Alphabet,
            GameType::Phonics,
            &stage(json!({ "gameType": "sound", "correctLetter": "A", "choices": ["A", "B"] })),
        )
        .unwrap();
        assert_eq!(out.game_type, Some(GameType::Phonics));
    }

    // -- Numbers --------------------------------------------------------------

    #[test]
    fn counting_accepts_answer_among_choices() {
        let ok =
            stage(json!({ "correctAnswer": "3", "imageCount": 3, "choices": ["1", "2", "3"] }));
        assert!(validate_stage(Subject::Numbers, GameType::Counting, &ok).is_ok());
    }

    #[test]
    fn counting_rejects_answer_missing_from_choices() {
        let bad =
            stage(json!({ "correctAnswer": "3", "imageCount": 3, "choices": ["1", "2", "4"] }));
        let found = violations(validate_stage(Subject::Numbers, GameType::Counting, &bad));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].field, "choices");
        assert!(found[0].message.contains("correct answer"));
    }

    #[test]
    fn counting_requires_three_choices_and_image_count() {
        let bad = stage(json!({ "correctAnswer": "2", "imageCount": 0, "choices": ["1", "2"] }));
        assert_eq!(
            fields(validate_stage(Subject::Numbers, GameType::Counting, &bad)),
            vec!["imageCount".to_string(), "choices".to_string()]
        );
    }

    #[test]
    fn dragndrop_count_range() {
        for ok in [json!(1), json!(9), json!(4.0)] {
            let candidate = stage(json!({ "correctCount": ok }));
            let out = validate_stage(Subject::Numbers, GameType::Dragndrop, &candidate).unwrap();
            assert!(out.correct_count.unwrap().is_i64());
        }
        for bad in [json!(0), json!(10), json!(2.5), json!(-1)] {
            let candidate = stage(json!({ "correctCount": bad }));
            let found = fields(validate_stage(Subject::Numbers, GameType::Dragndrop, &candidate));
            assert_eq!(found, vec!["correctCount".to_string()]);
        }
    }

    // -- Colors ---------------------------------------------------------------

    #[test]
    fn color_matching_rejects_duplicates_even_when_full() {
        let dup = stage(json!({ "colors": ["red", "blue", "red", "green"] }));
        let found = violations(validate_stage(Subject::Colors, GameType::Matching, &dup));
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("different"));
    }

    #[test]
    fn color_matching_rejects_unset_slots() {
        let unset = stage(json!({ "colors": ["red", "-", "blue", "green"] }));
        let found = violations(validate_stage(Subject::Colors, GameType::Matching, &unset));
        assert!(found.iter().any(|v| v.message.contains("selected")));

        let ok = stage(json!({ "colors": ["Red", "blue", "pink", "green"] }));
        let out = validate_stage(Subject::Colors, GameType::Matching, &ok).unwrap();
        assert_eq!(out.colors.unwrap()[0], "red");
    }

    #[test]
    fn color_catching_uses_restricted_palette() {
        let pink = stage(json!({ "correctColor": "pink" }));
        assert!(validate_stage(Subject::Colors, GameType::ColorMultipleChoice, &pink).is_ok());
        assert_eq!(
            fields(validate_stage(Subject::Colors, GameType::Catching, &pink)),
            vec!["correctColor".to_string()]
        );
    }

    #[test]
    fn rocket_needs_correct_choice() {
        let ok = stage(json!({ "correctChoice": "blue" }));
        assert!(validate_stage(Subject::Colors, GameType::Rocket, &ok).is_ok());
    }

    // -- Shapes ---------------------------------------------------------------

    #[test]
    fn racing_and_catching_use_rhombus_library() {
        let rhombus = stage(json!({ "correctShape": "rhombus" }));
        let diamond = stage(json!({ "correctShape": "diamond" }));
        for gt in [GameType::Racing, GameType::Catching] {
            assert!(validate_stage(Subject::Shapes, gt, &rhombus).is_ok());
            assert!(validate_stage(Subject::Shapes, gt, &diamond).is_err());
        }
        for gt in [GameType::ShapesMultipleChoice, GameType::RocketShapes] {
            assert!(validate_stage(Subject::Shapes, gt, &diamond).is_ok());
            assert!(validate_stage(Subject::Shapes, gt, &rhombus).is_err());
        }
    }

    #[test]
    fn extra_fields_survive_normalization() {
        let out = validate_stage(
            Subject::Shapes,
            GameType::ShapesMultipleChoice,
            &stage(json!({ "correctShape": "star", "question": "Which one is the star?" })),
        )
        .unwrap();
        assert_eq!(out.extra["question"], json!("Which one is the star?"));
    }
}
