//! Morphological tag decoding
//!
//! Tags are fixed-position codes: the first character selects the part of
//! speech, every later position is a field whose meaning depends on it
//! (`Ncfs` = noun, common, feminine, singular). Decoding is lossy and never
//! fails: unknown positions or codes are skipped.

/// Returned for an empty or missing tag
pub const NO_ANNOTATION: &str = "Нема морфолошка ознака!";

/// Part-of-speech variants, keyed by the first tag character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Pronoun,
    Adverb,
    Adposition,
    Conjunction,
    Numeral,
    Particle,
    Interjection,
    Abbreviation,
    Residual,
    Punctuation,
}

impl PartOfSpeech {
    pub fn from_code(code: char) -> Option<Self> {
        let pos = match code {
            'N' => PartOfSpeech::Noun,
            'V' => PartOfSpeech::Verb,
            'A' => PartOfSpeech::Adjective,
            'P' => PartOfSpeech::Pronoun,
            'R' => PartOfSpeech::Adverb,
            'S' => PartOfSpeech::Adposition,
            'C' => PartOfSpeech::Conjunction,
            'M' => PartOfSpeech::Numeral,
            'Q' => PartOfSpeech::Particle,
            'I' => PartOfSpeech::Interjection,
            'Y' => PartOfSpeech::Abbreviation,
            'X' => PartOfSpeech::Residual,
            'Z' => PartOfSpeech::Punctuation,
            _ => return None,
        };
        Some(pos)
    }

    pub fn label(self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "именка",
            PartOfSpeech::Verb => "глагол",
            PartOfSpeech::Adjective => "придавка",
            PartOfSpeech::Pronoun => "заменка",
            PartOfSpeech::Adverb => "прилог",
            PartOfSpeech::Adposition => "предлог",
            PartOfSpeech::Conjunction => "сврзник",
            PartOfSpeech::Numeral => "бројка",
            PartOfSpeech::Particle => "честичка",
            PartOfSpeech::Interjection => "интерјекција",
            PartOfSpeech::Abbreviation => "кратенка",
            PartOfSpeech::Residual => "резидуален",
            PartOfSpeech::Punctuation => "интерпункција",
        }
    }

    /// Positional layout: (character index, field), in output order
    pub fn fields(self) -> &'static [(usize, Field)] {
        use Field::*;
        match self {
            PartOfSpeech::Noun => &[(1, NounType), (2, Gender), (3, Number)],
            // position 3 (verb form) carries no label
            PartOfSpeech::Verb => &[
                (1, VerbType),
                (2, Aspect),
                (4, Tense),
                (5, Person),
                (6, Number),
                (7, Gender),
            ],
            PartOfSpeech::Adjective => &[
                (1, AdjectiveType),
                (2, AdjectiveDegree),
                (3, Gender),
                (4, Number),
            ],
            PartOfSpeech::Pronoun => &[(1, PronounType), (2, Person), (3, Gender), (4, Number)],
            PartOfSpeech::Adverb => &[(1, AdverbType), (2, AdverbDegree)],
            PartOfSpeech::Adposition => &[(1, AdpositionType), (2, AdpositionForm)],
            PartOfSpeech::Conjunction => &[(1, ConjunctionType), (2, ConjunctionForm)],
            PartOfSpeech::Numeral => &[(1, NumeralForm), (3, Gender)],
            PartOfSpeech::Particle => &[(1, ParticleForm)],
            PartOfSpeech::Residual => &[(1, ResidualType)],
            PartOfSpeech::Interjection | PartOfSpeech::Abbreviation | PartOfSpeech::Punctuation => {
                &[]
            }
        }
    }
}

/// A positional field with its own code table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    NounType,
    Gender,
    Number,
    VerbType,
    Aspect,
    Tense,
    Person,
    AdjectiveType,
    AdjectiveDegree,
    PronounType,
    AdverbType,
    AdverbDegree,
    AdpositionType,
    AdpositionForm,
    ConjunctionType,
    ConjunctionForm,
    NumeralForm,
    ParticleForm,
    ResidualType,
}

impl Field {
    /// Label for `code`, or `None` when the table has no such entry
    pub fn label(self, code: char) -> Option<&'static str> {
        let label = match (self, code) {
            (Field::NounType, 'c') => "општа",
            (Field::NounType, 'p') => "сопствена",

            (Field::Gender, 'm') => "машки род",
            (Field::Gender, 'f') => "женски род",
            (Field::Gender, 'n') => "среден род",

            (Field::Number, 's') => "еднина",
            (Field::Number, 'p') => "множина",

            (Field::VerbType, 'm') => "главен",
            (Field::VerbType, 'a') => "помошен",
            (Field::VerbType, 'o') => "модален",

            (Field::Aspect, 'p') => "несвршен",
            (Field::Aspect, 'e') => "свршен",

            (Field::Tense, 'p') => "сегашно време",
            (Field::Tense, 'i') => "несвршено минато",
            (Field::Tense, 'a') => "аорист",
            (Field::Tense, 'c') => "сложено време",

            (Field::Person, '1') => "прво лице",
            (Field::Person, '2') => "второ лице",
            (Field::Person, '3') => "трето лице",

            (Field::AdjectiveType, 'g') => "општа",
            (Field::AdjectiveType, 's') => "сопственa",

            (Field::AdjectiveDegree | Field::AdverbDegree, 'p') => "позитивна форма",
            (Field::AdjectiveDegree | Field::AdverbDegree, 'c') => "компаратна (споредбена)",
            (Field::AdjectiveDegree | Field::AdverbDegree, 's') => "суперлативна",

            (Field::PronounType, 'p') => "личен",
            (Field::PronounType, 'd') => "демонстративен",
            (Field::PronounType, 'i') => "недефиниран",
            (Field::PronounType, 'q') => "прашален",
            (Field::PronounType, 'r') => "релационен",
            (Field::PronounType, 'x') => "рефлексивен",
            (Field::PronounType, 'z') => "негативен",
            (Field::PronounType, 'g') => "општ",

            (Field::AdverbType, 'g') => "општ прилог",
            (Field::AdverbType, 'a') => "прилог-придавка",
            (Field::AdverbType, 'v') => "вербален прилог",
            (Field::AdverbType, 'd') => "модален прилог",

            (Field::AdpositionType, 'p') => "прост предлог",

            (Field::AdpositionForm | Field::ConjunctionForm, 's') => "прост",
            (Field::AdpositionForm | Field::ConjunctionForm, 'c') => "сложен",

            (Field::ConjunctionType, 'c') => "координативен",
            (Field::ConjunctionType, 's') => "субординативен",

            (Field::NumeralForm, 'd') => "арапска цифра",
            (Field::NumeralForm, 'r') => "римска цифра",
            (Field::NumeralForm, 'l') => "со букви",

            (Field::ParticleForm, 's') => "проста честичка",
            (Field::ParticleForm, 'c') => "сложена честичка",

            (Field::ResidualType, 'f') => "странски збор",
            (Field::ResidualType, 't') => "типографска грешка",
            (Field::ResidualType, 'w') => "веб-локација",
            (Field::ResidualType, 'e') => "емоџи",
            (Field::ResidualType, 'h') => "хаштагови",
            (Field::ResidualType, 'a') => "„@“ ознака",
            (Field::ResidualType, 'p') => "име на програма",

            _ => return None,
        };
        Some(label)
    }
}

/// Resolved labels for a tag, part of speech first
///
/// Empty when the tag is empty or its first character is not a known
/// part-of-speech code.
pub fn describe_tag(tag: &str) -> Vec<&'static str> {
    let letters: Vec<char> = tag.chars().collect();
    let Some(pos) = letters.first().copied().and_then(PartOfSpeech::from_code) else {
        return Vec::new();
    };

    let mut parts = vec![pos.label()];
    for &(index, field) in pos.fields() {
        if let Some(label) = letters.get(index).and_then(|&c| field.label(c)) {
            parts.push(label);
        }
    }
    parts
}

/// Human-readable, comma-joined description of a tag
pub fn decode_tag(tag: Option<&str>) -> String {
    match tag {
        Some(tag) if !tag.is_empty() => describe_tag(tag).join(", "),
        _ => NO_ANNOTATION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_missing_tags() {
        assert_eq!(decode_tag(None), NO_ANNOTATION);
        assert_eq!(decode_tag(Some("")), NO_ANNOTATION);
    }

    #[test]
    fn test_noun_field_order() {
        assert_eq!(
            decode_tag(Some("Ncfs")),
            "именка, општа, женски род, еднина"
        );
        assert_eq!(decode_tag(Some("Npmp")), "именка, сопствена, машки род, множина");
    }

    #[test]
    fn test_unresolved_codes_are_skipped() {
        assert_eq!(decode_tag(Some("Nxxx")), "именка");
        assert_eq!(decode_tag(Some("Ncxs")), "именка, општа, еднина");
        assert_eq!(decode_tag(Some("N")), "именка");
    }

    #[test]
    fn test_unknown_part_of_speech() {
        assert_eq!(decode_tag(Some("W123")), "");
        assert!(describe_tag("ncfs").is_empty());
    }

    #[test]
    fn test_verb_skips_position_three() {
        // Vmpip3s: main, imperfective, (form i), present, 3rd person, singular
        assert_eq!(
            decode_tag(Some("Vmpip3s")),
            "глагол, главен, несвршен, сегашно време, трето лице, еднина"
        );
        assert_eq!(
            decode_tag(Some("Vmeca3sf")),
            "глагол, главен, свршен, аорист, трето лице, еднина, женски род"
        );
    }

    #[test]
    fn test_adjective_and_pronoun() {
        assert_eq!(
            decode_tag(Some("Agpfs")),
            "придавка, општа, позитивна форма, женски род, еднина"
        );
        assert_eq!(
            decode_tag(Some("Pp1-s")),
            "заменка, личен, прво лице, еднина"
        );
    }

    #[test]
    fn test_short_variants() {
        assert_eq!(decode_tag(Some("Rgc")), "прилог, општ прилог, компаратна (споредбена)");
        assert_eq!(decode_tag(Some("Sps")), "предлог, прост предлог, прост");
        assert_eq!(decode_tag(Some("Csc")), "сврзник, субординативен, сложен");
        assert_eq!(decode_tag(Some("Ml-f")), "бројка, со букви, женски род");
        assert_eq!(decode_tag(Some("Qs")), "честичка, проста честичка");
        assert_eq!(decode_tag(Some("Xw")), "резидуален, веб-локација");
        assert_eq!(decode_tag(Some("I")), "интерјекција");
        assert_eq!(decode_tag(Some("Yxx")), "кратенка");
        assert_eq!(decode_tag(Some("Z")), "интерпункција");
    }

    #[test]
    fn test_part_of_speech_codes() {
        let codes = "NVAPRSCMQIYXZ";
        let labels: Vec<_> = codes
            .chars()
            .filter_map(PartOfSpeech::from_code)
            .map(PartOfSpeech::label)
            .collect();
        assert_eq!(labels.len(), 13);
        assert!(PartOfSpeech::from_code('n').is_none());
    }

    proptest! {
        #[test]
        fn decode_never_panics(tag in "\\PC{0,12}") {
            let _ = decode_tag(Some(&tag));
        }

        #[test]
        fn known_pos_label_comes_first(
            pos in prop::sample::select(vec!['N', 'V', 'A', 'P', 'R', 'S', 'C', 'M', 'Q', 'I', 'Y', 'X', 'Z']),
            rest in "[a-z0-9-]{0,8}",
        ) {
            let tag = format!("{}{}", pos, rest);
            let decoded = decode_tag(Some(&tag));
            let label = PartOfSpeech::from_code(pos).unwrap().label();
            prop_assert!(decoded.starts_with(label));
        }
    }
}
