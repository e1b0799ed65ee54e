use std::cell::Cell;

use super::*;

fn announcer(cx: &mut Cx<'_>, ready: &Setter<bool>) -> RenderResult {
    let ready = ready.clone();
    cx.effect_once(move || {
        ready.set(true);
        None
    })?;
    Ok(Render::Empty)
}

#[test]
fn state_changed_during_a_pass_renders_in_the_next_frame() {
    let mut h = mount(|cx| {
        let (ready, set_ready, _) = cx.state(false)?;
        record(format!("root {ready}"));
        root(vec![Some(node(announcer, set_ready))])
    });
    assert_eq!(take_events(), ["root false"]);
    assert!(h.runtime.needs_frame());

    assert_eq!(h.settle(), 1);
    assert_eq!(take_events(), ["root true"]);
}

#[test]
fn request_rerender_runs_once_per_frame() {
    let mut h = mount(|cx| {
        let ticks = cx.remember(|| Cell::new(0u32))?;
        ticks.set(ticks.get() + 1);
        record(format!("tick {}", ticks.get()));
        if ticks.get() < 3 {
            cx.request_rerender();
        }
        root(vec![])
    });
    assert_eq!(h.settle(), 2);
    assert_eq!(take_events(), ["tick 1", "tick 2", "tick 3"]);
}

fn runaway(cx: &mut Cx<'_>) -> Result<(Attributes, Children), Error> {
    let (n, set_n, _) = cx.state(0u32)?;
    cx.effect(n, move |n| {
        set_n.set(n + 1);
        None
    })?;
    root(vec![])
}

#[test]
fn endless_cascade_is_reported_as_a_feedback_loop() {
    let config = Config {
        max_chained_frames: Some(3),
        ..Config::strict()
    };
    let mut h = try_mount(config, runaway).unwrap();
    h.frame();
    h.frame();
    let err = h.runtime.frame().unwrap_err();
    assert!(matches!(err, Error::FeedbackLoop { frames: 4 }));
    assert!(matches!(h.runtime.frame(), Err(Error::Poisoned)));
}

#[test]
fn fast_mode_does_not_limit_cascades() {
    let mut h = try_mount(Config::fast(), runaway).unwrap();
    for _ in 0..10 {
        h.frame();
    }
    assert!(h.runtime.needs_frame());
    assert!(!h.runtime.is_poisoned());
}

#[test]
fn frames_are_requested_once_and_only_for_changes() {
    let mut h = mount(|cx| {
        let (n, set_n, _) = cx.state(0u8)?;
        keep(set_n);
        record(format!("n {n}"));
        root(vec![])
    });
    take_events();
    assert_eq!(h.scheduler.count(), 0);

    let set = handle::<Setter<u8>>();
    set.set(0);
    assert!(!h.runtime.needs_frame());
    assert_eq!(h.scheduler.count(), 0);

    set.set(1);
    set.set(2);
    assert_eq!(h.scheduler.count(), 1);
    h.frame();
    assert_eq!(take_events(), ["n 2"]);

    set.set(2);
    assert_eq!(h.scheduler.count(), 1);
    set.set(3);
    assert_eq!(h.scheduler.count(), 2);
}

#[test]
fn frame_refuses_to_run_inside_a_pass() {
    let mut h = mount(|_cx| root(vec![]));
    h.runtime.shared.queues.borrow_mut().in_pass = true;
    assert!(matches!(h.runtime.frame(), Err(Error::Reentrant)));
    h.runtime.shared.queues.borrow_mut().in_pass = false;
    assert!(h.runtime.frame().is_ok());
}

fn cleanup(cx: &mut Cx<'_>, name: &&'static str) -> RenderResult {
    let name = *name;
    cx.effect_once(move || on_unmount(move || record(format!("cleanup {name}"))))?;
    Ok(Render::children([Some(el("div").call())]))
}

#[test]
fn unmounting_the_runtime_runs_cleanups_and_empties_the_container() {
    let h = mount(|_cx| {
        root(vec![
            Some(node(cleanup, "a")),
            None,
            Some(node(cleanup, "b")),
        ])
    });
    assert_eq!(h.markup(), "<body><div></div><div></div></body>");
    let Harness { runtime, body, .. } = h;
    let target = runtime.unmount();
    assert_eq!(take_events(), ["cleanup a", "cleanup b"]);
    assert_eq!(target.markup(body), "<body></body>");
}

#[test]
fn setters_of_unmounted_instances_are_ignored() {
    let mut h = mount(|cx| {
        let (show, set_show, _) = cx.state(true)?;
        keep(set_show);
        root(vec![show.then(|| node(cleanup_counter, ()))])
    });
    let stale = handle::<Setter<u32>>();
    handle::<Setter<bool>>().set(false);
    h.frame();
    take_events();

    stale.set(5);
    let report = h.frame();
    assert_eq!(report.renders, 0);
    assert!(take_events().is_empty());
}

fn cleanup_counter(cx: &mut Cx<'_>, _props: &()) -> RenderResult {
    let (n, set_n, _) = cx.state(0u32)?;
    keep(set_n);
    record(format!("counter {n}"));
    Ok(Render::Empty)
}

#[test]
fn marks_are_rendered_in_marking_order() {
    let mut h = mount(|_cx| {
        root(vec![
            Some(node(labelled, "first")),
            Some(node(labelled, "second")),
        ])
    });
    take_events();
    let setters = SETTERS.with(|s| s.borrow().clone());
    // "second" registered first: children are reconciled last to first
    setters[1].set(1);
    setters[0].set(1);
    h.frame();
    assert_eq!(take_events(), ["first 1", "second 1"]);

    setters[0].set(2);
    setters[1].set(2);
    h.frame();
    assert_eq!(take_events(), ["second 2", "first 2"]);
}

thread_local! {
    static SETTERS: RefCell<Vec<Setter<u32>>> = const { RefCell::new(Vec::new()) };
}

fn labelled(cx: &mut Cx<'_>, label: &&'static str) -> RenderResult {
    let (n, set_n, _) = cx.state(0u32)?;
    if cx.is_first_render() {
        SETTERS.with(|s| s.borrow_mut().push(set_n));
    }
    record(format!("{label} {n}"));
    Ok(Render::Empty)
}
