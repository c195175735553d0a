//! End-to-end resolution through the public API.
//!
//! The first half pins down the precedence and compatibility rules; the
//! second half replays fixtures from long-lived content sites, which were
//! authored against the list-only alias rule (`bare_tags = "sequences"`).

use locale_fields::{
    BareTagRetention, Field, Fields, ResolveError, ResolveOptions, Resolver, WildcardAnchoring,
    untag_fields,
};
use serde_json::{Value, json};

fn fields(value: Value) -> Fields {
    serde_json::from_value(value).expect("field mapping")
}

fn untag(input: &Value, locale: Option<&str>) -> Fields {
    untag_fields(&fields(input.clone()), locale).expect("resolves")
}

fn legacy_resolver() -> Resolver {
    Resolver::new(ResolveOptions {
        bare_tags: BareTagRetention::Sequences,
        ..ResolveOptions::default()
    })
}

fn untag_legacy(input: &Value, locale: Option<&str>) -> Fields {
    legacy_resolver()
        .resolve(&fields(input.clone()), locale)
        .expect("resolves")
}

// =========================================================================
// Precedence
// =========================================================================

#[test]
fn pattern_override_for_matching_locale() {
    let input = json!({"foo": "bar-base", "foo@de": "bar-de", "foo@fr.*": "bar-fr"});
    assert_eq!(untag(&input, Some("fr_FR")), fields(json!({"foo": "bar-fr"})));
    assert_eq!(untag(&input, Some("de")), fields(json!({"foo": "bar-de"})));
    assert_eq!(untag(&input, Some("ja")), fields(json!({"foo": "bar-base"})));
}

#[test]
fn exact_beats_pattern_beats_default() {
    let input = json!({
        "t@": "default",
        "t@fr.*": "pattern",
        "t@fr": "exact",
    });
    assert_eq!(untag(&input, Some("fr"))["t"].as_str(), Some("exact"));
    assert_eq!(untag(&input, Some("fr_CA"))["t"].as_str(), Some("pattern"));
    assert_eq!(untag(&input, Some("de"))["t"].as_str(), Some("default"));
}

#[test]
fn declaration_order_does_not_change_precedence() {
    let forward = json!({"t": "base", "t@fr.*": "pattern", "t@fr": "exact"});
    let reverse = json!({"t@fr": "exact", "t@fr.*": "pattern", "t": "base"});
    for locale in ["fr", "fr_BE", "de"] {
        assert_eq!(untag(&forward, Some(locale)), untag(&reverse, Some(locale)));
    }
}

#[test]
fn alternation_is_symmetric() {
    let input = json!({"foo": "base", "foo@fr|it": "any"});
    assert_eq!(untag(&input, Some("fr")), untag(&input, Some("it")));
    assert_eq!(untag(&input, Some("it"))["foo"].as_str(), Some("any"));
    assert_eq!(untag(&input, Some("es"))["foo"].as_str(), Some("base"));
}

#[test]
fn no_locale_keeps_only_base_and_bare() {
    let input = json!({
        "title": "Home",
        "title@fr": "Accueil",
        "menu@de.*": ["Start"],
        "footer@": "Footer",
    });
    assert_eq!(
        untag(&input, None),
        fields(json!({"title": "Home", "footer": "Footer", "footer@": "Footer"}))
    );
}

#[test]
fn bare_default_example() {
    let input = json!({"title@": "X"});
    assert_eq!(
        untag(&input, None),
        fields(json!({"title": "X", "title@": "X"}))
    );
}

#[test]
fn sequence_of_mappings_resolves_each_element() {
    let input = json!({
        "list": [
            {"item": "value-1", "item@de": "value-1-de", "item@fr": "value-1-fr"},
            {"item": "value-2"},
            {"item@fr": "value-3-fr"},
        ]
    });
    assert_eq!(
        untag(&input, Some("fr")),
        fields(json!({"list": [
            {"item": "value-1-fr"},
            {"item": "value-2"},
            {"item": "value-3-fr"},
        ]}))
    );
    assert_eq!(
        untag(&input, Some("ja")),
        fields(json!({"list": [{"item": "value-1"}, {"item": "value-2"}, {}]}))
    );
}

// =========================================================================
// Properties
// =========================================================================

#[test]
fn resolving_twice_changes_nothing() {
    let input = json!({
        "foo": "base",
        "foo@fr": "fr",
        "nested": {"a@fr.*": [1, {"b": 2, "b@fr": 3}]},
    });
    let once = untag(&input, Some("fr"));
    let twice = untag_fields(&once, Some("fr")).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn output_has_no_tagged_keys_outside_aliases() {
    let input = json!({
        "a@fr": 1,
        "b": {"c@de|fr": [{"d@fr.*": true}]},
        "e@": 2,
    });
    let out = untag(&input, Some("fr"));
    let keys: Vec<&str> = out.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["a", "b", "e", "e@"]);
    assert_eq!(out["b"], Field::Mapping(fields(json!({"c": [{"d": true}]}))));
}

#[test]
fn input_is_left_untouched() {
    let input = fields(json!({"foo": "base", "foo@fr": "fr", "list@": ["x"]}));
    let snapshot = input.clone();
    untag_fields(&input, Some("fr")).unwrap();
    assert_eq!(input, snapshot);
}

#[test]
fn resolver_is_shareable_across_threads() {
    let resolver = Resolver::default();
    let input = fields(json!({"foo": "base", "foo@fr": "fr", "foo@de": "de"}));
    std::thread::scope(|s| {
        let handles: Vec<_> = ["fr", "de", "ja"]
            .into_iter()
            .map(|locale| {
                let resolver = &resolver;
                let input = &input;
                s.spawn(move || resolver.resolve(input, Some(locale)).unwrap())
            })
            .collect();
        let results: Vec<Fields> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results[0]["foo"].as_str(), Some("fr"));
        assert_eq!(results[1]["foo"].as_str(), Some("de"));
        assert_eq!(results[2]["foo"].as_str(), Some("base"));
    });
}

// =========================================================================
// Options
// =========================================================================

#[test]
fn language_subtag_anchoring_matches_regional_locales() {
    let resolver = Resolver::new(ResolveOptions {
        wildcard: WildcardAnchoring::LanguageSubtag,
        ..ResolveOptions::default()
    });
    let input = fields(json!({"foo": "base", "foo@(de|at)": "german"}));
    let out = resolver.resolve(&input, Some("de_AT")).unwrap();
    assert_eq!(out["foo"].as_str(), Some("german"));

    let default = untag_fields(&input, Some("de_AT")).unwrap();
    assert_eq!(default["foo"].as_str(), Some("base"));
}

#[test]
fn invalid_pattern_is_an_error() {
    let input = fields(json!({"title@": "x", "title@[fr": "y"}));
    let err = untag_fields(&input, Some("fr")).unwrap_err();
    assert!(matches!(err, ResolveError::InvalidPattern { ref key, .. } if key == "title@[fr"));
    assert!(err.to_string().contains("title@[fr"));
}

#[test]
fn deep_tree_is_rejected_not_overflowed() {
    let mut value = json!("leaf");
    for _ in 0..200 {
        value = json!({"n": value});
    }
    let input = fields(value);
    assert!(matches!(
        untag_fields(&input, Some("fr")),
        Err(ResolveError::DepthExceeded { limit: 128, .. })
    ));

    let roomy = Resolver::new(ResolveOptions {
        max_depth: 512,
        ..ResolveOptions::default()
    });
    assert!(roomy.resolve(&input, Some("fr")).is_ok());
}

// =========================================================================
// Site fixtures (list-only aliases)
// =========================================================================

#[test]
fn nested_overrides_replace_whole_subtrees() {
    let input = json!({
        "title": "value-none",
        "title@fr": "value-fr",
        "list": [{"list-item-title": "value-none", "list-item-title@fr": "value-fr"}],
        "sub-nested": {"sub-nested": {"nested@": "sub-sub-nested-value"}},
        "nested": {"nested-none": "nested-value-none", "nested-title@": "nested-value-none"},
        "nested@fr": {"nested-title@": "nested-value-fr"},
        "list@de": ["list-item-de"],
    });
    assert_eq!(
        untag_legacy(&input, Some("fr")),
        fields(json!({
            "title": "value-fr",
            "list": [{"list-item-title": "value-fr"}],
            "nested": {"nested-title": "nested-value-fr"},
            "sub-nested": {"sub-nested": {"nested": "sub-sub-nested-value"}},
        }))
    );
    assert_eq!(
        untag_legacy(&input, Some("de")),
        fields(json!({
            "title": "value-none",
            "list": ["list-item-de"],
            "nested": {"nested-none": "nested-value-none", "nested-title": "nested-value-none"},
            "sub-nested": {"sub-nested": {"nested": "sub-sub-nested-value"}},
        }))
    );
}

#[test]
fn nested_mapping_resolves_independently() {
    let input = json!({
        "foo": "bar-base",
        "foo@de": "bar-de",
        "foo@fr": "bar-fr",
        "nested": {"nested": "nested-base", "nested@fr": "nested-fr"},
    });
    assert_eq!(
        untag_legacy(&input, Some("fr")),
        fields(json!({"foo": "bar-fr", "nested": {"nested": "nested-fr"}}))
    );
    assert_eq!(
        untag_legacy(&input, Some("de")),
        fields(json!({"foo": "bar-de", "nested": {"nested": "nested-base"}}))
    );
}

#[test]
fn reserved_keys_localize_like_any_other() {
    let input = json!({
        "$view": "/views/base.html",
        "$view@ja": "/views/base-ja.html",
        "qaz": "qux",
        "qaz@ja": "qux-ja",
        "qaz@de": "qux-de",
        "foo": "bar-base",
        "foo@en": "bar-en",
        "foo@de": "bar-de",
        "foo@ja": "bar-ja",
        "nested": {"nested": "nested-base", "nested@ja": "nested-ja"},
    });
    assert_eq!(
        untag_legacy(&input, Some("ja")),
        fields(json!({
            "$view": "/views/base-ja.html",
            "qaz": "qux-ja",
            "foo": "bar-ja",
            "nested": {"nested": "nested-ja"},
        }))
    );
    assert_eq!(
        untag_legacy(&input, Some("de")),
        fields(json!({
            "$view": "/views/base.html",
            "qaz": "qux-de",
            "foo": "bar-de",
            "nested": {"nested": "nested-base"},
        }))
    );
}

#[test]
fn doubled_tag_scalars_get_no_alias() {
    let input = json!({"foo@": "bar", "foo@fr@": "bar-fr"});
    assert_eq!(untag_legacy(&input, None), fields(json!({"foo": "bar"})));
    assert_eq!(untag_legacy(&input, Some("de")), fields(json!({"foo": "bar"})));
    assert_eq!(untag_legacy(&input, Some("fr")), fields(json!({"foo": "bar-fr"})));
}

#[test]
fn bare_tagged_lists_keep_alias() {
    let input = json!({
        "list@": ["value1", "value2", "value3"],
        "list@fr": ["value1-fr", "value2-fr", "value3-fr"],
    });
    let de = json!(["value1", "value2", "value3"]);
    let fr = json!(["value1-fr", "value2-fr", "value3-fr"]);
    assert_eq!(
        untag_legacy(&input, Some("de")),
        fields(json!({"list": de.clone(), "list@": de}))
    );
    assert_eq!(
        untag_legacy(&input, Some("fr")),
        fields(json!({"list": fr.clone(), "list@": fr}))
    );
}

#[test]
fn doubled_tag_lists_in_sibling_mappings() {
    let input = json!({
        "nested1": {
            "list@": ["value1", "value2", "value3", "value4"],
            "list@fr@": ["value1-fr", "value2-fr", "value3-fr"],
        },
        "nested2": {
            "list@": ["value1", "value2"],
            "list@fr@": ["value1-fr", "value2-fr"],
        },
    });
    let one = json!(["value1", "value2", "value3", "value4"]);
    let two = json!(["value1", "value2"]);
    assert_eq!(
        untag_legacy(&input, Some("de")),
        fields(json!({
            "nested1": {"list": one.clone(), "list@": one},
            "nested2": {"list": two.clone(), "list@": two},
        }))
    );

    let one_fr = json!(["value1-fr", "value2-fr", "value3-fr"]);
    let two_fr = json!(["value1-fr", "value2-fr"]);
    assert_eq!(
        untag_legacy(&input, Some("fr")),
        fields(json!({
            "nested1": {"list": one_fr.clone(), "list@": one_fr},
            "nested2": {"list": two_fr.clone(), "list@": two_fr},
        }))
    );
}

#[test]
fn backwards_compatible_bare_tags_without_locale() {
    let input = json!({
        "title@": "foo",
        "nested": {"list@": ["value1"]},
        "list@": ["top-value1", "top-value2", "top-value3"],
    });
    let top = json!(["top-value1", "top-value2", "top-value3"]);
    assert_eq!(
        untag_legacy(&input, None),
        fields(json!({
            "title": "foo",
            "list": top.clone(),
            "list@": top,
            "nested": {"list": ["value1"], "list@": ["value1"]},
        }))
    );
}

#[test]
fn wildcards_match_whole_locale() {
    let input = json!({
        "foo": "bar-base",
        "foo@de": "bar-de",
        "foo@fr.*": "bar-fr",
        "nested": {"nested": "nested-base", "nested@de_AT": "nested-de", "nested@fr": "nested-fr"},
    });
    let cases = [
        ("fr", "bar-fr", "nested-fr"),
        ("fr_FR", "bar-fr", "nested-base"),
        ("fr_CA", "bar-fr", "nested-base"),
        ("de", "bar-de", "nested-base"),
        ("de_AT", "bar-base", "nested-de"),
    ];
    for (locale, foo, nested) in cases {
        assert_eq!(
            untag_legacy(&input, Some(locale)),
            fields(json!({"foo": foo, "nested": {"nested": nested}})),
            "locale {locale}"
        );
    }
}

#[test]
fn alternation_overrides() {
    let input = json!({
        "foo": "bar-base",
        "foo@de": "bar-de",
        "foo@fr|it": "bar-any",
        "nested": {"nested": "nested-base", "nested@fr|it": "nested-any"},
    });
    for locale in ["fr", "it"] {
        assert_eq!(
            untag_legacy(&input, Some(locale)),
            fields(json!({"foo": "bar-any", "nested": {"nested": "nested-any"}}))
        );
    }
    assert_eq!(
        untag_legacy(&input, Some("de")),
        fields(json!({"foo": "bar-de", "nested": {"nested": "nested-base"}}))
    );
}
