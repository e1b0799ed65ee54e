//! Headless demo: mounts a small counter app over a `MemoryTarget`, drives a
//! few frames with a manual clock and prints the resulting markup.
//!
//! Run with `RUST_LOG=trellis_core=trace` to see every mount, move and skip.

use std::cell::RefCell;
use std::time::Duration;

use anyhow::Context as _;
use trellis_core::prelude::*;
use trellis_devtools::Inspector;
use web_time::Instant;

thread_local! {
    static CONTROLS: RefCell<Option<Controls>> = const { RefCell::new(None) };
}

#[derive(Clone)]
struct Controls {
    counter: CommandDispatch<i32, i32>,
    items: Dispatch<Vec<u32>, ItemAction>,
}

fn controls() -> anyhow::Result<Controls> {
    CONTROLS
        .with(|c| c.borrow().clone())
        .context("app is not mounted")
}

const RESET: usize = 0;
const ADD: usize = 1;

static COUNTER: ReducerTable<i32, i32> = ReducerTable {
    init: || 0,
    actions: &[|count, by| count + by],
};

enum ItemAction {
    Push(u32),
    Rotate,
}

fn items_reducer(items: &Vec<u32>, action: ItemAction) -> Vec<u32> {
    let mut items = items.clone();
    match action {
        ItemAction::Push(item) => items.push(item),
        ItemAction::Rotate => items.rotate_left(1),
    }
    items
}

fn badge(cx: &mut Cx<'_>, count: &i32) -> RenderResult {
    let width = cx.transition(
        *count as f32 * 10.0,
        AnimationSpec::linear(Duration::from_millis(200)),
    )?;
    Ok(Render::children([Some(
        el("span")
            .flag("badge", true)
            .flag("negative", *count < 0)
            .style("width", format!("{width:.0}px"))
            .attr("count", *count)
            .call(),
    )]))
}

fn item(cx: &mut Cx<'_>, props: &ItemProps<u32, String>) -> RenderResult {
    let id = props.item;
    cx.effect_once(move || {
        log::info!("item {id} mounted");
        on_unmount(move || log::info!("item {id} unmounted"))
    })?;
    Ok(Render::children([Some(
        el("li")
            .attr("id", id as i64)
            .attr("title", format!("{} {id}", props.shared))
            .call(),
    )]))
}

fn app(cx: &mut Cx<'_>, title: &&'static str) -> RenderResult {
    let (count, counter) = cx.reducer(&COUNTER)?;
    let (items, dispatch) = cx.reducer_fn(items_reducer, None)?;
    let ready = cx.delay(Duration::from_millis(50))?;
    if cx.is_first_render() {
        CONTROLS.with(|c| {
            *c.borrow_mut() = Some(Controls {
                counter,
                items: dispatch,
            })
        });
    }

    Ok(Render::children([
        Some(el("h1").attr("title", *title).call()),
        Some(node(badge, count)),
        Some(
            el("ul")
                .children([Some(node_list(item, items, "item".to_string()))])
                .call(),
        ),
        ready.then(|| el("footer").attr("ready", true).call()),
    ]))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut target = MemoryTarget::new();
    let body = target.create_root("body");
    let clock = ManualClock::new();
    let mut runtime = Runtime::builder(target, body)
        .config(Config::strict())
        .clock(clock.clone())
        .mount(|_cx| {
            Ok((
                Attributes::new().attr("lang", "en"),
                vec![Some(node(app, "Counter"))],
            ))
        })?;

    let mut inspector = Inspector::new();
    inspector.toggle();
    let started = Instant::now();

    let step = |runtime: &mut Runtime<MemoryTarget>,
                inspector: &mut Inspector|
     -> anyhow::Result<()> {
        let mut frames = 0;
        while runtime.needs_frame() {
            let report = runtime.frame()?;
            inspector.frame(&report);
            clock.advance(Duration::from_millis(16));
            frames += 1;
            anyhow::ensure!(frames < 100, "app did not settle");
        }
        Ok(())
    };

    step(&mut runtime, &mut inspector)?;

    let controls = controls()?;
    controls.counter.dispatch(ADD, 3)?;
    for id in 1..=3 {
        controls.items.dispatch(ItemAction::Push(id));
    }
    step(&mut runtime, &mut inspector)?;
    println!("{}", runtime.target().markup(body));

    controls.items.dispatch(ItemAction::Rotate);
    controls.counter.dispatch(ADD, -5)?;
    step(&mut runtime, &mut inspector)?;
    println!("{}", runtime.target().markup(body));

    controls.counter.dispatch(RESET, 0)?;
    step(&mut runtime, &mut inspector)?;
    println!("{}", runtime.target().markup(body));

    print!("{}", inspector.tree(&runtime));
    println!("{}", inspector.stats.summary());
    log::debug!("demo finished in {:?}", started.elapsed());

    let target = runtime.unmount();
    println!("{}", target.markup(body));
    Ok(())
}
