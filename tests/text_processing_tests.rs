#[cfg(test)]
mod tests {
    use isp_support_bot::config::CorrectionConfig;
    use isp_support_bot::intent_catalog::IntentCatalog;
    use isp_support_bot::learning_store::TypoEntry;
    use isp_support_bot::text_processing::TextNormalizer;
    use isp_support_bot::typo_corrector::{fuzzy_ratio, Correction, CorrectionMethod, TypoCorrector};

    fn create_normalizer() -> TextNormalizer {
        TextNormalizer::new()
    }

    fn dictionary(normalizer: &TextNormalizer) -> Vec<String> {
        IntentCatalog::embedded(normalizer)
            .unwrap()
            .dictionary()
            .to_vec()
    }

    #[test]
    fn test_punctuation_and_case_are_ignored() {
        let normalizer = create_normalizer();

        assert_eq!(
            normalizer.normalize("ИНТЕРНЕТ!!!"),
            normalizer.normalize("интернет")
        );
        assert_eq!(
            normalizer.normalize("Где, когда?"),
            normalizer.normalize("где когда")
        );
    }

    #[test]
    fn test_empty_and_symbol_only_input() {
        let normalizer = create_normalizer();

        assert!(normalizer.normalize("").is_empty());
        assert!(normalizer.normalize("?!... ,,").is_empty());
        assert!(normalizer.normalize("   ").is_empty());
    }

    #[test]
    fn test_stop_words_are_dropped() {
        let normalizer = create_normalizer();

        let tokens = normalizer.normalize("у меня не работает интернет");
        assert_eq!(tokens.len(), 2);
        assert!(normalizer.is_stop_word("меня"));
        assert!(!normalizer.is_stop_word("интернет"));
    }

    #[test]
    fn test_dictionary_words_are_returned_unchanged() {
        let normalizer = create_normalizer();
        let dictionary = dictionary(&normalizer);
        let corrector =
            TypoCorrector::new(CorrectionConfig::default()).with_static_typos(&normalizer);

        for word in dictionary.iter().take(20) {
            let correction = corrector.correct(word, &dictionary);
            assert_eq!(correction, Correction::Exact(word.clone()));
        }
    }

    #[test]
    fn test_static_typo_is_corrected_without_learning() {
        let normalizer = create_normalizer();
        let dictionary = dictionary(&normalizer);
        let corrector =
            TypoCorrector::new(CorrectionConfig::default()).with_static_typos(&normalizer);

        let token = normalizer.normalize("привт").remove(0);
        let correction = corrector.correct(&token, &dictionary);
        assert_eq!(correction.word(), normalizer.normalize("привет")[0]);
        assert!(correction.learned().is_none());
    }

    #[test]
    fn test_close_match_is_learned() {
        let normalizer = create_normalizer();
        let dictionary = dictionary(&normalizer);
        let corrector =
            TypoCorrector::new(CorrectionConfig::default()).with_static_typos(&normalizer);

        let correction = corrector.correct("интернед", &dictionary);
        assert_eq!(correction.word(), "интернет");
        let learned = correction.learned().expect("similarity correction is learned");
        assert_eq!(learned.typo, "интернед");
        assert_eq!(learned.method, CorrectionMethod::CloseMatch);
        assert!(learned.similarity > 0.5);
    }

    #[test]
    fn test_persisted_typos_are_used() {
        let normalizer = create_normalizer();
        let dictionary = dictionary(&normalizer);
        let persisted = [TypoEntry {
            correct_word: "интернет".to_string(),
            typo: "инет".to_string(),
            frequency: 3,
        }];
        let corrector =
            TypoCorrector::new(CorrectionConfig::default()).with_persisted_typos(&persisted);

        let correction = corrector.correct("инет", &dictionary);
        assert_eq!(
            correction,
            Correction::KnownTypo {
                word: "интернет".to_string(),
                typo: "инет".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_words_pass_through() {
        let normalizer = create_normalizer();
        let dictionary = dictionary(&normalizer);
        let corrector = TypoCorrector::new(CorrectionConfig::default());

        let correction = corrector.correct("zzzzzzzz", &dictionary);
        assert_eq!(correction, Correction::Unrecognized("zzzzzzzz".to_string()));
    }

    #[test]
    fn test_fuzzy_ratio_bounds() {
        assert_eq!(fuzzy_ratio("тариф", "тариф"), 100);
        assert_eq!(fuzzy_ratio("abc", "xyz"), 0);
        assert!(fuzzy_ratio("роутер", "ротер") > 50);
    }
}
