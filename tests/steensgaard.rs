// To debug a failing scenario, try `eprintln!("{:#?}", classes)`

use std::collections::BTreeSet;

use ptflow::analysis::steensgaard::{self, Classes};
use ptflow::{ModuleBuilder, ValueId};

// ------------------------------------------------------------------
// Helpers

/// The class partition as a canonical set of sorted member lists.
fn partition(classes: &Classes) -> BTreeSet<Vec<ValueId>> {
    classes
        .groups()
        .map(|(_, members)| {
            let mut members = members.to_vec();
            members.sort();
            members
        })
        .collect()
}

fn class_points_to(classes: &Classes, v: ValueId) -> BTreeSet<ValueId> {
    let root = classes.representative(v).unwrap();
    classes.points_to(root).collect()
}

// ------------------------------------------------------------------
// Unification scenarios

#[test]
fn phi_unifies_incoming() {
    let mut mb = ModuleBuilder::new();
    let f = mb.function("f", 0, true);
    let mut b = mb.body(f);
    let a1 = b.alloca();
    let a2 = b.alloca();
    b.block();
    let p = b.phi(&[a1, a2]);
    let module = mb.finish();

    let classes = steensgaard::analyze(&module);
    assert!(classes.same_class(p, a1));
    assert!(classes.same_class(a1, a2));
}

#[test]
fn alloca_points_to_its_own_class() {
    let mut mb = ModuleBuilder::new();
    let f = mb.function("f", 0, true);
    let mut b = mb.body(f);
    let a = b.alloca();
    let module = mb.finish();

    let classes = steensgaard::analyze(&module);
    let root = classes.representative(a).unwrap();
    assert!(class_points_to(&classes, a).contains(&root));
}

#[test]
fn store_then_load_share_a_class() {
    let mut mb = ModuleBuilder::new();
    let f = mb.function("f", 0, true);
    let mut b = mb.body(f);
    let p = b.alloca();
    let v = b.alloca();
    b.store(v, p);
    let y = b.load(p);
    let module = mb.finish();

    let classes = steensgaard::analyze(&module);
    // The stored value and the loaded value both stand for *p.
    assert!(classes.same_class(v, y));
    assert!(class_points_to(&classes, p).contains(&classes.representative(v).unwrap()));
}

#[test]
fn load_before_any_store() {
    let mut mb = ModuleBuilder::new();
    let f = mb.function("f", 1, true);
    let mut b = mb.body(f);
    let q = b.param(0);
    let y = b.load(q);
    let v = b.alloca();
    b.store(v, q);
    let module = mb.finish();

    let classes = steensgaard::analyze(&module);
    assert!(classes.same_class(y, v));
}

#[test]
fn select_and_cast_unify() {
    let mut mb = ModuleBuilder::new();
    let f = mb.function("f", 0, true);
    let mut b = mb.body(f);
    let a1 = b.alloca();
    let a2 = b.alloca();
    let s = b.select(a1, a2);
    let c = b.cast(s);
    let module = mb.finish();

    let classes = steensgaard::analyze(&module);
    assert!(classes.same_class(s, a1));
    assert!(classes.same_class(s, a2));
    assert!(classes.same_class(c, s));
}

#[test]
fn call_unifies_arguments_and_returns() {
    let mut mb = ModuleBuilder::new();
    let id = mb.function("id", 1, false);
    let f = mb.function("f", 0, true);
    {
        let mut b = mb.body(id);
        let q = b.param(0);
        b.ret(Some(q));
    }
    let (a, r) = {
        let mut b = mb.body(f);
        let a = b.alloca();
        let r = b.call(id, &[a]);
        (a, r)
    };
    let module = mb.finish();

    let classes = steensgaard::analyze(&module);
    let q = module.function(id).params[0];
    assert!(classes.same_class(a, q));
    assert!(classes.same_class(a, r));
}

#[test]
fn unknown_callee_is_ignored() {
    let mut mb = ModuleBuilder::new();
    let f = mb.function("f", 0, true);
    let mut b = mb.body(f);
    let a = b.alloca();
    let r = b.call_unknown(&[a]);
    let module = mb.finish();

    let classes = steensgaard::analyze(&module);
    assert!(!classes.same_class(a, r));
    assert!(classes.representative(r).is_none());
}

#[test]
fn gep_stays_in_its_own_class() {
    let mut mb = ModuleBuilder::new();
    let f = mb.function("f", 0, true);
    let mut b = mb.body(f);
    let a = b.alloca();
    let g = b.gep();
    let c = b.cast(g);
    let module = mb.finish();

    let classes = steensgaard::analyze(&module);
    assert!(classes.same_class(c, g));
    assert!(!classes.same_class(g, a));
}

#[test]
fn whole_module_walk_covers_every_function() {
    let mut mb = ModuleBuilder::new();
    let f = mb.function("f", 0, true);
    let g = mb.function("g", 0, true);
    let (a1, p1) = {
        let mut b = mb.body(f);
        let a = b.alloca();
        let p = b.cast(a);
        (a, p)
    };
    let (a2, p2) = {
        let mut b = mb.body(g);
        let a = b.alloca();
        let p = b.cast(a);
        (a, p)
    };
    let module = mb.finish();

    let classes = steensgaard::analyze(&module);
    assert!(classes.same_class(a1, p1));
    assert!(classes.same_class(a2, p2));
    // Nothing links the two functions, so the classes stay apart.
    assert!(!classes.same_class(a1, a2));
    assert_eq!(classes.len(), 2);
}

#[test]
fn empty_module_yields_no_classes() {
    let mut mb = ModuleBuilder::new();
    mb.function("f", 0, true);
    let module = mb.finish();

    let classes = steensgaard::analyze(&module);
    assert!(classes.is_empty());
}

// ------------------------------------------------------------------
// Properties

#[test]
fn reruns_are_idempotent() {
    let mut mb = ModuleBuilder::new();
    let callee = mb.function("callee", 1, false);
    let f = mb.function("f", 0, true);
    {
        let mut b = mb.body(callee);
        let q = b.param(0);
        let h = b.alloca();
        b.store(h, q);
        let loaded = b.load(q);
        b.ret(Some(loaded));
    }
    {
        let mut b = mb.body(f);
        let a1 = b.alloca();
        let a2 = b.alloca();
        let p = b.phi(&[a1, a2]);
        let r = b.call(callee, &[p]);
        b.store(r, a2);
    }
    let module = mb.finish();

    let first = steensgaard::analyze(&module);
    let second = steensgaard::analyze(&module);
    assert_eq!(partition(&first), partition(&second));
}

/// The pointed-to target is tracked per value, not per representative:
/// two loads through different members of one class keep distinct
/// targets, and the class reports both points-to groups.
#[test]
fn class_may_point_to_several_groups() {
    let mut mb = ModuleBuilder::new();
    let f = mb.function("f", 1, true);
    let mut b = mb.body(f);
    let p = b.param(0);
    let y1 = b.load(p);
    let c = b.cast(p);
    let y2 = b.load(c);
    let module = mb.finish();

    let classes = steensgaard::analyze(&module);
    assert!(classes.same_class(p, c));
    assert!(!classes.same_class(y1, y2));
    let targets = class_points_to(&classes, p);
    assert!(targets.contains(&classes.representative(y1).unwrap()));
    assert!(targets.contains(&classes.representative(y2).unwrap()));
    assert_eq!(targets.len(), 2);
}
