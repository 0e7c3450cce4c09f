//! Unit tests for the strategy engine.

use rstest::{fixture, rstest};

use super::*;

#[fixture]
fn registry() -> StrategyRegistry {
    StrategyRegistry::with_builtins()
}

fn run(
    registry: &StrategyRegistry,
    name: &str,
    key: MatchKey<'_>,
    words: &[&str],
) -> Vec<String> {
    let strategy = registry.get(name).expect("strategy registered");
    select(strategy, &key, words.iter().copied(), |word| *word)
        .matches
        .into_iter()
        .map(str::to_owned)
        .collect()
}

// ---------------------------------------------------------------------------
// Edit distance
// ---------------------------------------------------------------------------

#[rstest]
#[case("kitten", "sitting", 3)]
#[case("", "abc", 3)]
#[case("abc", "", 3)]
#[case("flaw", "lawn", 2)]
#[case("Cat", "cAT", 0)]
#[case("Köln", "koln", 1)]
#[case("ab", "ba", 2)]
fn levenshtein_distances(#[case] a: &str, #[case] b: &str, #[case] expected: usize) {
    assert_eq!(levenshtein(a, b), expected);
    assert_eq!(levenshtein(b, a), expected, "distance must be symmetric");
}

#[rstest]
#[case("ab", "ba", 1)]
#[case("kitten", "sitting", 3)]
#[case("abcd", "acbd", 1)]
#[case("ca", "abc", 3)]
#[case("", "", 0)]
fn damerau_distances(#[case] a: &str, #[case] b: &str, #[case] expected: usize) {
    assert_eq!(damerau_levenshtein(a, b), expected);
}

#[rstest]
#[case("")]
#[case("dictionary")]
#[case("Straße")]
fn distance_to_self_is_zero(#[case] word: &str) {
    assert_eq!(levenshtein(word, word), 0);
    assert_eq!(damerau_levenshtein(word, word), 0);
}

const VOCABULARY: [&str; 10] = [
    "", "a", "ab", "ba", "abc", "acb", "kitten", "Sitting", "Straße", "strasse",
];

#[rstest]
#[case::levenshtein(levenshtein as fn(&str, &str) -> usize)]
#[case::damerau(damerau_levenshtein as fn(&str, &str) -> usize)]
fn distances_are_symmetric_over_every_pair(#[case] distance: fn(&str, &str) -> usize) {
    for a in VOCABULARY {
        for b in VOCABULARY {
            assert_eq!(distance(a, b), distance(b, a), "{a:?} vs {b:?}");
        }
    }
}

#[rstest]
fn damerau_never_exceeds_levenshtein() {
    for a in VOCABULARY {
        for b in VOCABULARY {
            assert!(damerau_levenshtein(a, b) <= levenshtein(a, b), "{a:?} vs {b:?}");
        }
    }
}

#[rstest]
fn lev_strategy_honours_threshold(registry: StrategyRegistry) {
    let words = ["cat", "cart", "dog", "kite"];
    assert_eq!(run(&registry, "lev", MatchKey::new("kat"), &words), ["cat"]);
    assert_eq!(
        run(
            &registry,
            "lev",
            MatchKey::new("kat").with_lev_distance(2),
            &words
        ),
        ["cat", "cart", "kite"]
    );
}

#[rstest]
fn dlev_strategy_accepts_transpositions(registry: StrategyRegistry) {
    let words = ["form", "from", "farm"];
    assert_eq!(run(&registry, "dlev", MatchKey::new("fomr"), &words), ["form"]);
    assert!(run(&registry, "lev", MatchKey::new("fomr"), &words).is_empty());
}

// ---------------------------------------------------------------------------
// Soundex
// ---------------------------------------------------------------------------

#[rstest]
#[case("Robert", "R163")]
#[case("Rupert", "R163")]
#[case("Rubin", "R150")]
#[case("Ashcraft", "A261")]
#[case("Tymczak", "T522")]
#[case("Pfister", "P236")]
#[case("Lee", "L000")]
#[case("  o'hara", "O600")]
fn soundex_codes(#[case] word: &str, #[case] code: &str) {
    assert_eq!(soundex(word).as_deref(), Some(code));
}

#[rstest]
#[case("Müller")]
#[case("")]
#[case("1234")]
fn soundex_skips_unencodable_words(#[case] word: &str) {
    assert_eq!(soundex(word), None);
}

#[rstest]
fn soundex_strategy_skips_non_ascii_candidates(registry: StrategyRegistry) {
    let words = ["Robert", "Rupert", "Röbert", "Rubin"];
    assert_eq!(
        run(&registry, "soundex", MatchKey::new("rupert"), &words),
        ["Robert", "Rupert"]
    );
}

// ---------------------------------------------------------------------------
// Regular expressions
// ---------------------------------------------------------------------------

#[rstest]
#[case(r"a\(b\)c", "a(b)c")]
#[case("a+b?", r"a\+b\?")]
#[case("*star", r"\*star")]
#[case("a|b", r"a\|b")]
#[case("^ab$", "^ab$")]
#[case("a^b$c", r"a\^b\$c")]
#[case(r"x\{2\}", "x{2}")]
#[case("[]a]", r"[\]a]")]
#[case("[[:alpha:]]", "[[:alpha:]]")]
#[case(r"\<cat\>", r"\bcat\b")]
fn translates_basic_syntax(#[case] pattern: &str, #[case] expected: &str) {
    assert_eq!(translate_basic(pattern), expected);
}

#[rstest]
#[case(r"ca(t|r)", "ca(t|r)")]
#[case(r"[a\]", r"[a\\]")]
fn translates_extended_syntax(#[case] pattern: &str, #[case] expected: &str) {
    assert_eq!(translate(pattern, RegexSyntax::Extended), expected);
}

#[rstest]
fn regex_strategies_match_case_insensitively(registry: StrategyRegistry) {
    let words = ["Cat", "cart", "scatter", "dog"];
    assert_eq!(
        run(&registry, "re", MatchKey::new("^ca(t|r)"), &words),
        ["Cat", "cart"]
    );
    assert_eq!(
        run(&registry, "regexp", MatchKey::new(r"^c.*t$"), &words),
        ["Cat", "cart"]
    );
    assert_eq!(run(&registry, "re", MatchKey::new("at"), &words), ["Cat", "scatter"]);
}

#[rstest]
fn bad_pattern_yields_no_matches(registry: StrategyRegistry) {
    let strategy = registry.get("re").expect("re registered");
    assert!(matches!(
        strategy.begin(&MatchKey::new("(unclosed")),
        Err(StrategyError::InvalidPattern { .. })
    ));
    let selection = select(strategy, &MatchKey::new("(unclosed"), ["x"], |word| *word);
    assert!(selection.matches.is_empty());
    assert_eq!(selection.compared, 0);
}

// ---------------------------------------------------------------------------
// Simple predicates
// ---------------------------------------------------------------------------

#[rstest]
#[case("exact", "CAT", &["cat"])]
#[case("prefix", "ca", &["cat", "cart", "Cab"])]
#[case("all", "zzz", &["cat", "cart", "Cab", "dog"])]
fn folded_strategies(
    registry: StrategyRegistry,
    #[case] name: &str,
    #[case] query: &str,
    #[case] expected: &[&str],
) {
    let words = ["cat", "cart", "Cab", "dog"];
    assert_eq!(run(&registry, name, MatchKey::new(query), &words), expected);
}

#[rstest]
fn select_counts_every_comparison(registry: StrategyRegistry) {
    let strategy = registry.get("exact").expect("exact registered");
    let selection = select(strategy, &MatchKey::new("b"), ["a", "b", "c"], |word| *word);
    assert_eq!(selection.matches, ["b"]);
    assert_eq!(selection.compared, 3);
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[rstest]
fn builtins_are_listed_in_registration_order(registry: StrategyRegistry) {
    let names: Vec<&str> = registry.iter().map(Strategy::name).collect();
    assert_eq!(
        names,
        ["exact", "prefix", "soundex", "all", "lev", "dlev", "re", "regexp"]
    );
    assert_eq!(registry.default_strategy().map(Strategy::name), Some("lev"));
}

#[rstest]
fn first_registration_wins(mut registry: StrategyRegistry) {
    let before = registry.len();
    let replaced = registry.register(Strategy::folded("exact", "impostor", |_, _| false));
    assert!(!replaced);
    assert_eq!(registry.len(), before);
    assert_eq!(
        registry.get("exact").map(Strategy::description),
        Some("Match words exactly")
    );
}

#[rstest]
fn alias_resolves_to_default(mut registry: StrategyRegistry) {
    registry.set_default("prefix").expect("prefix registered");
    assert_eq!(
        registry.get(DEFAULT_STRATEGY_ALIAS).map(Strategy::name),
        Some("prefix")
    );
}

#[rstest]
#[case(".")]
#[case("nosuch")]
#[case("LEV")]
fn set_default_rejects_unknown_names(mut registry: StrategyRegistry, #[case] name: &str) {
    assert!(matches!(
        registry.set_default(name),
        Err(StrategyError::Unknown { .. })
    ));
    assert_eq!(registry.default_strategy().map(Strategy::name), Some("lev"));
}

#[test]
fn empty_registry_has_no_default() {
    let registry = StrategyRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.get(DEFAULT_STRATEGY_ALIAS).is_none());
}
