use std::sync::Arc;

use cogspace::truth;
use cogspace::{
    AtomId, AtomKind, AtomSpace, AtomStore, CogConfig, Formula, Pattern, PlnEngine, Rule,
    TruthValue, UreChainer,
};

const TOL: f32 = 1e-3;

fn engine_with_chain(labels: &[&str], tv: TruthValue) -> (Arc<PlnEngine>, Vec<AtomId>) {
    let store: Arc<dyn AtomStore> = Arc::new(AtomSpace::new());
    let ids: Vec<AtomId> = labels
        .iter()
        .map(|l| store.create_node(AtomKind::Concept, Some(*l)).unwrap().id())
        .collect();
    for pair in ids.windows(2) {
        store
            .create_link(AtomKind::Inheritance, pair.to_vec())
            .unwrap()
            .set_truth(tv);
    }
    (Arc::new(PlnEngine::new(store)), ids)
}

#[test]
fn algebra_reference_values() {
    let out = truth::deduction(TruthValue::new(0.8, 0.9, 10), TruthValue::new(0.7, 0.8, 10));
    assert!(out.approx_eq(&TruthValue::new(0.56, 0.72, 20), TOL));

    let out = truth::revision(TruthValue::new(0.8, 0.0, 10), TruthValue::new(0.6, 0.0, 10));
    assert!(out.approx_eq(&TruthValue::new(0.5, 0.0, 20), TOL));
}

#[test]
fn forward_chaining_toward_target() {
    let (pln, ids) = engine_with_chain(&["A", "B", "C"], TruthValue::new(0.8, 0.9, 10));
    let (a, c) = (ids[0], ids[2]);

    let derived = pln.forward_chain(Some(a), pln.max_steps()).unwrap();
    assert_eq!(derived.len(), 1);
    assert_eq!(derived[0].kind(), AtomKind::Inheritance);
    assert_eq!(derived[0].outgoing(), &[a, c]);
    assert!(derived[0]
        .truth()
        .approx_eq(&TruthValue::new(0.64, 0.81, 20), TOL));
    assert!(pln.store().contains(derived[0].id()).unwrap());
}

#[test]
fn backward_chaining_finds_all_ancestors() {
    let (pln, ids) = engine_with_chain(&["A", "B", "C", "D"], TruthValue::default());
    let premises: Vec<AtomId> = pln
        .backward_chain(ids[3], 10)
        .unwrap()
        .iter()
        .map(|a| a.id())
        .collect();
    assert_eq!(premises, vec![ids[2], ids[1], ids[0]]);
}

#[test]
fn rule_guided_chaining_with_config() {
    let config = CogConfig::from_toml_str(
        "[ure]\nmax_iter = 4\ninitial_complexity = 0.5\ncomplexity_step = 0.25\n",
    )
    .unwrap();
    let (pln, _) = engine_with_chain(&["A", "B", "C"], TruthValue::new(0.9, 0.9, 3));

    let pair = || Pattern::link(AtomKind::Inheritance, vec![Pattern::any(), Pattern::any()]);
    pln.add_rule(
        Rule::builder("conjoin")
            .premise(pair())
            .premise(pair())
            .conclusion(Pattern::link(AtomKind::List, vec![Pattern::any(), Pattern::any()]))
            .formula(Formula::And)
            .build()
            .unwrap(),
    );

    let mut ure = UreChainer::from_config(Arc::clone(&pln), &config.ure);
    let out = ure.chain(None).unwrap();
    assert_eq!(out.len(), 4);
    assert!(out.iter().all(|a| a.kind() == AtomKind::List));
    assert!((ure.complexity() - 1.5).abs() < 1e-5);

    let stats = pln.stats();
    assert_eq!(stats.rule_matches, 4);
    assert_eq!(stats.inferences, 4);

    // The penalty carries over between runs.
    ure.set_max_iter(1);
    ure.chain(None).unwrap();
    assert!((ure.complexity() - 1.75).abs() < 1e-5);
}

#[test]
fn chaining_sees_concurrent_writes() {
    let (pln, ids) = engine_with_chain(&["A", "B"], TruthValue::default());
    let c = pln.store().create_node(AtomKind::Concept, Some("C")).unwrap().id();

    // Nothing to chain yet.
    assert!(pln.forward_chain(None, 5).unwrap().is_empty());

    let writer = {
        let store = Arc::clone(pln.store());
        let b = ids[1];
        std::thread::spawn(move || {
            store.create_link(AtomKind::Inheritance, vec![b, c]).unwrap();
        })
    };
    writer.join().unwrap();

    let derived = pln.forward_chain(None, 5).unwrap();
    assert_eq!(derived.len(), 1);
    assert_eq!(derived[0].outgoing(), &[ids[0], c]);
}
