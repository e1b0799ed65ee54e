use std::time::Duration;

use super::*;
use crate::HookKind;

fn counter(cx: &mut Cx<'_>, _props: &()) -> RenderResult {
    let (count, set_count, get_count) = cx.state(0i32)?;
    keep(set_count);
    keep(get_count);
    record(format!("count {count}"));
    Ok(Render::Empty)
}

#[test]
fn state_persists_and_updates_coalesce() {
    let mut h = mount(|_cx| root(vec![Some(node(counter, ()))]));
    assert_eq!(take_events(), ["count 0"]);

    let set = handle::<Setter<i32>>();
    set.set(1);
    set.update(|n| n + 1);
    assert_eq!(handle::<Getter<i32>>().get(), 2);

    let report = h.frame();
    assert_eq!(report.renders, 1);
    assert_eq!(take_events(), ["count 2"]);

    assert_eq!(h.frame().renders, 0);
    assert!(take_events().is_empty());
}

#[test]
fn handles_compare_by_identity() {
    let _h = mount(|_cx| root(vec![Some(node(counter, ()))]));
    let a = handle::<Setter<i32>>();
    assert_eq!(a, a.clone());
    assert_eq!(handle::<Getter<i32>>().with(|n| *n), 0);
}

fn flip_body(
    second: fn(&mut Cx<'_>, bool) -> Result<(), Error>,
) -> impl Fn(&mut Cx<'_>) -> Result<(Attributes, Children), Error> {
    move |cx: &mut Cx<'_>| {
        let (flip, set_flip, _) = cx.state(false)?;
        keep(set_flip);
        second(cx, flip)?;
        root(vec![])
    }
}

#[test]
fn changed_hook_order_is_rejected() {
    let mut h = mount(flip_body(|cx, flip| {
        if flip {
            cx.remember(|| 0u8)?;
        } else {
            cx.state(0u8)?;
        }
        Ok(())
    }));
    handle::<Setter<bool>>().set(true);
    let err = h.runtime.frame().unwrap_err();
    assert!(matches!(
        err,
        Error::HookOrder {
            component: "root",
            index: 1,
            expected: HookKind::State,
            found: HookKind::Static,
        }
    ));
}

#[test]
fn extra_hook_after_the_first_render_is_rejected() {
    let mut h = mount(flip_body(|cx, flip| {
        if flip {
            cx.state(1u8)?;
        }
        Ok(())
    }));
    handle::<Setter<bool>>().set(true);
    let err = h.runtime.frame().unwrap_err();
    assert!(matches!(
        err,
        Error::HookCount {
            expected: 1,
            found: 2,
            ..
        }
    ));
}

#[test]
fn missing_hook_is_rejected() {
    let mut h = mount(flip_body(|cx, flip| {
        if !flip {
            cx.state(1u8)?;
        }
        Ok(())
    }));
    handle::<Setter<bool>>().set(true);
    let err = h.runtime.frame().unwrap_err();
    assert!(matches!(
        err,
        Error::HookCount {
            expected: 2,
            found: 1,
            ..
        }
    ));
}

#[test]
fn fast_mode_still_catches_a_mismatched_slot_type() {
    let mut h = try_mount(
        Config::fast(),
        flip_body(|cx, flip| {
            if flip {
                cx.prev(0u8, 0)?;
            } else {
                cx.state(0u8)?;
            }
            Ok(())
        }),
    )
    .unwrap();
    handle::<Setter<bool>>().set(true);
    let err = h.runtime.frame().unwrap_err();
    assert!(matches!(
        err,
        Error::SlotType {
            index: 1,
            kind: HookKind::Prev,
            ..
        }
    ));
    assert!(h.runtime.is_poisoned());
}

#[test]
fn memo_recomputes_only_when_deps_change() {
    let mut h = mount(|cx| {
        let (n, set_n, _) = cx.state(0u32)?;
        keep(set_n);
        let bucket = cx.memo(n / 10, |bucket| {
            record(format!("compute {bucket}"));
            bucket * 10
        })?;
        record(format!("bucket {bucket}"));
        root(vec![])
    });
    assert_eq!(take_events(), ["compute 0", "bucket 0"]);

    handle::<Setter<u32>>().set(5);
    h.frame();
    assert_eq!(take_events(), ["bucket 0"]);

    handle::<Setter<u32>>().set(12);
    h.frame();
    assert_eq!(take_events(), ["compute 1", "bucket 10"]);
}

#[test]
fn effect_cleanup_runs_before_the_next_run_and_on_unmount() {
    let mut h = mount(|cx| {
        let (n, set_n, _) = cx.state(0u32)?;
        keep(set_n);
        cx.effect(n / 2, |half| {
            let half = *half;
            record(format!("run {half}"));
            on_unmount(move || record(format!("clean {half}")))
        })?;
        root(vec![])
    });
    assert_eq!(take_events(), ["run 0"]);

    handle::<Setter<u32>>().set(1);
    h.frame();
    assert!(take_events().is_empty());

    handle::<Setter<u32>>().set(2);
    h.frame();
    assert_eq!(take_events(), ["clean 0", "run 1"]);

    let Harness { runtime, .. } = h;
    runtime.unmount();
    assert_eq!(take_events(), ["clean 1"]);
}

#[test]
fn prev_returns_the_value_of_the_previous_render() {
    let mut h = mount(|cx| {
        let (n, set_n, _) = cx.state(0i32)?;
        keep(set_n);
        let previous = cx.prev(n, -1)?;
        record(format!("{previous}->{n}"));
        root(vec![])
    });
    handle::<Setter<i32>>().set(3);
    h.frame();
    handle::<Setter<i32>>().set(7);
    h.frame();
    assert_eq!(take_events(), ["-1->0", "0->3", "3->7"]);
}

static COUNTER: ReducerTable<i32, i32> = ReducerTable {
    init: || 10,
    actions: &[|value, by| value + by, |value, _| *value],
};

#[test]
fn reducer_applies_table_commands() {
    let mut h = mount(|cx| {
        let (value, dispatch) = cx.reducer(&COUNTER)?;
        keep(dispatch);
        record(format!("value {value}"));
        root(vec![])
    });
    let dispatch = handle::<CommandDispatch<i32, i32>>();

    dispatch.dispatch(1, 5).unwrap();
    h.frame();
    // identity action leaves nothing to render
    dispatch.dispatch(2, 0).unwrap();
    assert_eq!(h.frame().renders, 0);
    dispatch.dispatch(0, 0).unwrap();
    h.frame();
    assert_eq!(take_events(), ["value 10", "value 15", "value 10"]);

    let err = dispatch.dispatch(3, 0).unwrap_err();
    assert!(matches!(err, Error::UnknownCommand { command: 3, len: 3 }));
}

fn push(list: &Vec<u32>, item: u32) -> Vec<u32> {
    let mut list = list.clone();
    list.push(item);
    list
}

#[test]
fn reducer_fn_starts_from_default() {
    let mut h = mount(|cx| {
        let (list, dispatch) = cx.reducer_fn(push, None)?;
        keep(dispatch);
        record(format!("{list:?}"));
        root(vec![])
    });
    let dispatch = handle::<Dispatch<Vec<u32>, u32>>();
    dispatch.dispatch(4);
    dispatch.dispatch(2);
    h.frame();
    assert_eq!(take_events(), ["[]", "[4, 2]"]);
}

fn seed() -> Vec<u32> {
    vec![1]
}

#[test]
fn reducer_fn_uses_the_init_function() {
    let _h = mount(|cx| {
        let (list, _) = cx.reducer_fn(push, Some(seed as fn() -> Vec<u32>))?;
        record(format!("{list:?}"));
        root(vec![])
    });
    assert_eq!(take_events(), ["[1]"]);
}

#[test]
fn delay_expires_after_its_duration() {
    let mut h = mount(|cx| {
        let done = cx.delay(Duration::from_millis(100))?;
        record(format!("{done}"));
        root(vec![])
    });
    assert!(h.runtime.needs_frame());
    h.frame();
    h.clock.advance(Duration::from_millis(100));
    h.frame();
    assert!(!h.runtime.needs_frame());
    assert_eq!(take_events(), ["false", "false", "true"]);
}

#[test]
fn transition_eases_toward_a_new_target() {
    let mut h = mount(|cx| {
        let (to, set_to, _) = cx.state(0.0f32)?;
        keep(set_to);
        let value = cx.transition(to, AnimationSpec::linear(Duration::from_secs(1)))?;
        record(format!("{value:.1}"));
        root(vec![])
    });
    assert!(!h.runtime.needs_frame());

    handle::<Setter<f32>>().set(10.0);
    h.frame();
    h.clock.advance(Duration::from_millis(250));
    h.frame();
    h.clock.advance(Duration::from_secs(1));
    h.frame();
    assert!(!h.runtime.needs_frame());
    assert_eq!(take_events(), ["0.0", "0.0", "2.5", "10.0"]);
}

#[test]
fn first_render_is_reported_once() {
    let mut h = mount(|cx| {
        let (_, set_n, _) = cx.state(0u8)?;
        keep(set_n);
        record(format!("{}", cx.is_first_render()));
        root(vec![])
    });
    handle::<Setter<u8>>().set(1);
    h.frame();
    assert_eq!(take_events(), ["true", "false"]);
}

#[test]
fn remember_keeps_the_first_value() {
    let mut h = mount(|cx| {
        let (n, set_n, _) = cx.state(0u8)?;
        keep(set_n);
        let made_at = cx.remember(|| {
            record("init");
            n
        })?;
        record(format!("{made_at}/{n}"));
        root(vec![])
    });
    handle::<Setter<u8>>().set(1);
    h.frame();
    assert_eq!(take_events(), ["init", "0/0", "0/1"]);
}
