use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use config::{Format, markers};
use domkey_dom::{ElementSpec, MemDom, MutationRecord};
use domkey_engine::{
    ClickBefore, Config, Controller, Dom, ElementId, Error, Listener, Namespace, NodeHandle,
    Options, Outcome, ResolvedTarget, Scope,
};
use keybind::{KeyBinder, KeyEvent, Keyboard, Modifier, Press};
use parking_lot::Mutex;
use tokio::time::{Instant, sleep};
use tracing_subscriber::{layer::SubscriberExt, registry};

type Notes = Arc<Mutex<Vec<(Option<ElementId>, usize, String)>>>;

fn config(json: &str) -> Config {
    config::load_from_str(json, Format::Json).expect("valid test config")
}

fn controller(dom: &Arc<MemDom>, options: Options) -> (Controller, Arc<Keyboard>) {
    let keyboard = Arc::new(Keyboard::new());
    let ctl = Controller::new(dom.clone(), keyboard.clone(), options).expect("controller");
    (ctl, keyboard)
}

fn recorder() -> (Listener, Notes) {
    let notes: Notes = Arc::new(Mutex::new(Vec::new()));
    let n = notes.clone();
    let listener: Listener = Arc::new(move |t: &ResolvedTarget, i: usize, k: &str| {
        n.lock().push((t.element(), i, k.to_string()));
    });
    (listener, notes)
}

fn q(dom: &MemDom, selector: &str) -> ElementId {
    dom.query(Scope::Document, selector)
        .expect("query")
        .expect("element present")
}

const CHAIN: &str = r#"{
    "keys": ["1", "2", "3"],
    "hotKeyConfig": {
        "1": { "operation": [".a", ".b"] },
        "2": { "operation": [[".missing"], [".tab:1"]] }
    },
    "operationControl": {
        "main": { "control": "ALL" },
        "limited": { "control": ["2"] }
    }
}"#;

/// `span.b` outside `.a`, then `div.a > span.b`, then two tabs.
fn chain_dom() -> Arc<MemDom> {
    let dom = Arc::new(MemDom::new());
    dom.append(Scope::Document, ElementSpec::new("span").class("b").text("outside"))
        .unwrap();
    dom.append(
        Scope::Document,
        ElementSpec::new("div")
            .class("a")
            .child(ElementSpec::new("span").class("b").text("inside")),
    )
    .unwrap();
    dom.append(Scope::Document, ElementSpec::new("li").class("tab"))
        .unwrap();
    dom.append(Scope::Document, ElementSpec::new("li").class("tab"))
        .unwrap();
    dom
}

#[tokio::test(start_paused = true)]
async fn chained_steps_are_scoped_and_notified_in_order() {
    let dom = chain_dom();
    let (ctl, _kb) = controller(&dom, Options::new(config(CHAIN)));
    ctl.set_focus_id(Some("main".into()));

    let (global, global_notes) = recorder();
    let (cb, cb_notes) = recorder();
    ctl.on(global);

    let outcome = ctl.action("1", Some(cb), false).await;
    assert_eq!(outcome, Outcome::Completed { steps: 2 });

    let a = q(&dom, ".a");
    let inner = q(&dom, ".a .b");
    let expected = vec![(Some(a), 0, "1".to_string()), (Some(inner), 1, "1".to_string())];
    assert_eq!(*cb_notes.lock(), expected);
    assert_eq!(*global_notes.lock(), expected);
    assert_eq!(dom.clicks(), vec![a, inner]);
}

#[tokio::test(start_paused = true)]
async fn chains_run_independently() {
    let dom = chain_dom();
    let (ctl, _kb) = controller(&dom, Options::new(config(CHAIN)));
    ctl.set_focus_id(Some("main".into()));

    let outcome = ctl.action("2", None, false).await;
    assert_eq!(outcome, Outcome::Completed { steps: 1 });
    let tabs = dom.query_all(Scope::Document, ".tab").unwrap();
    assert_eq!(dom.clicks(), vec![tabs[1]]);
}

#[tokio::test(start_paused = true)]
async fn denied_press_has_no_side_effects() {
    let dom = chain_dom();
    let (ctl, _kb) = controller(&dom, Options::new(config(CHAIN)));
    let (listener, notes) = recorder();
    ctl.on(listener);

    // No focus at all.
    assert_eq!(ctl.action("1", None, true).await, Outcome::Denied);

    ctl.set_focus_id(Some("limited".into()));
    assert_eq!(ctl.action("1", None, true).await, Outcome::Denied);
    assert_eq!(ctl.action("2", None, false).await, Outcome::Completed { steps: 1 });

    ctl.set_focus_id(Some("nowhere".into()));
    assert_eq!(ctl.action("2", None, true).await, Outcome::Denied);

    assert_eq!(dom.clicks().len(), 1);
    assert_eq!(notes.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn registered_trigger_preempts_config_and_permissions() {
    let dom = Arc::new(MemDom::new());
    dom.append(
        Scope::Document,
        ElementSpec::new("div")
            .class("dialog")
            .child(ElementSpec::new("button").class("ok")),
    )
    .unwrap();
    dom.append(Scope::Document, ElementSpec::new("div").class("a"))
        .unwrap();
    let (ctl, _kb) = controller(&dom, Options::new(config(CHAIN)));
    let (cb, notes) = recorder();

    ctl.register("1", ".dialog", [".cancel", ".ok"]);
    assert_eq!(ctl.triggers(), vec!["1"]);
    assert_eq!(ctl.action("1", Some(cb), false).await, Outcome::Triggered);
    let ok = q(&dom, ".ok");
    assert_eq!(dom.clicks(), vec![ok]);
    assert_eq!(*notes.lock(), vec![(Some(ok), 0, "1".to_string())]);

    // A missing container still ends the press without consulting the config.
    dom.clear_clicks();
    ctl.register("1", ".modal", [".ok"]);
    ctl.set_focus_id(Some("main".into()));
    let start = Instant::now();
    assert_eq!(ctl.action("1", None, true).await, Outcome::Triggered);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(dom.clicks().is_empty());

    assert!(ctl.unregister("1"));
    assert_eq!(ctl.action("1", None, false).await, Outcome::Completed { steps: 1 });
}

#[tokio::test(start_paused = true)]
async fn polling_waits_for_elements_rendered_after_a_click() {
    let dom = Arc::new(MemDom::new());
    let menu = dom
        .append(Scope::Document, ElementSpec::new("ul").class("menu"))
        .unwrap();
    let d = dom.clone();
    dom.on_click(menu, move |_, el| {
        let d = d.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(30)).await;
            d.append(Scope::Element(el), ElementSpec::new("li").class("item"))
                .unwrap();
        });
    });
    let cfg = config(
        r#"{
            "keys": ["m"],
            "hotKeyConfig": { "m": { "operation": [".menu", ".item"] } },
            "operationControl": { "main": { "control": "ALL" } }
        }"#,
    );
    let (ctl, _kb) = controller(&dom, Options::new(cfg));
    ctl.set_focus_id(Some("main".into()));

    let start = Instant::now();
    assert_eq!(ctl.action("m", None, true).await, Outcome::Completed { steps: 2 });
    let waited = start.elapsed();
    assert!(waited >= Duration::from_millis(30), "{waited:?}");
    assert!(waited <= Duration::from_millis(40), "{waited:?}");
    assert_eq!(dom.clicks(), vec![menu, q(&dom, ".item")]);
}

#[tokio::test(start_paused = true)]
async fn misses_without_polling_are_immediate_and_polling_is_bounded() {
    let dom = Arc::new(MemDom::new());
    let cfg = config(
        r#"{
            "keys": ["x"],
            "hotKeyConfig": { "x": { "operation": [".never"] } },
            "operationControl": { "main": { "control": "ALL" } },
            "polling": { "delayMs": 10, "maxAttempts": 5 }
        }"#,
    );
    let (ctl, _kb) = controller(&dom, Options::new(cfg));
    ctl.set_focus_id(Some("main".into()));

    let start = Instant::now();
    assert_eq!(ctl.action("x", None, false).await, Outcome::Completed { steps: 0 });
    assert_eq!(start.elapsed(), Duration::ZERO);

    assert_eq!(ctl.action("x", None, true).await, Outcome::Completed { steps: 0 });
    assert_eq!(start.elapsed(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn veto_hook_suppresses_clicks_but_not_resolution() {
    let dom = chain_dom();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let veto: ClickBefore = Arc::new(move |key: &str, handle: &NodeHandle| {
        s.lock().push((key.to_string(), handle.current()));
        true
    });
    let (ctl, _kb) = controller(&dom, Options::new(config(CHAIN)).with_click_before(veto));
    ctl.set_focus_id(Some("main".into()));

    assert_eq!(ctl.action("1", None, false).await, Outcome::Completed { steps: 2 });
    assert!(dom.clicks().is_empty());
    assert_eq!(
        *seen.lock(),
        vec![
            ("1".to_string(), Some(q(&dom, ".a"))),
            ("1".to_string(), Some(q(&dom, ".a .b")))
        ]
    );
}

const DYNAMIC: &str = r#"{
    "keys": ["up", "down", "enter"],
    "hotKeyConfig": {
        "up": { "operation": [".list"], "dynamic": true },
        "down": { "operation": [".list"], "dynamic": true },
        "enter": { "operation": [".list"], "dynamic": true }
    },
    "operationControl": {
        "rows": {
            "control": "ALL",
            "dynamicSelector": { "up,down": ".active", "enter": ".row:0" }
        },
        "other": { "control": "ALL" }
    }
}"#;

fn rows_dom() -> (Arc<MemDom>, Vec<ElementId>) {
    let dom = Arc::new(MemDom::new());
    dom.append(
        Scope::Document,
        ElementSpec::new("ul")
            .class("list")
            .child(ElementSpec::new("li").class("row"))
            .child(ElementSpec::new("li").class("row active"))
            .child(ElementSpec::new("li").class("row")),
    )
    .unwrap();
    let rows = dom.query_all(Scope::Document, ".row").unwrap();
    (dom, rows)
}

#[tokio::test(start_paused = true)]
async fn dynamic_keys_move_from_the_focus_selector() {
    let (dom, rows) = rows_dom();
    let (ctl, _kb) = controller(&dom, Options::new(config(DYNAMIC)));
    ctl.set_focus_id(Some("rows".into()));
    let (cb, notes) = recorder();

    assert_eq!(ctl.action("down", Some(cb.clone()), false).await, Outcome::Completed { steps: 1 });
    assert_eq!(ctl.action("up", Some(cb.clone()), false).await, Outcome::Completed { steps: 1 });
    assert_eq!(ctl.action("enter", Some(cb), false).await, Outcome::Completed { steps: 1 });
    assert_eq!(dom.clicks(), vec![rows[2], rows[0], rows[0]]);
    assert_eq!(
        *notes.lock(),
        vec![
            (Some(rows[2]), 0, "down".to_string()),
            (Some(rows[0]), 0, "up".to_string()),
            (Some(rows[0]), 0, "enter".to_string()),
        ]
    );

    // A focus region without a dynamic selector resolves nothing.
    ctl.set_focus_id(Some("other".into()));
    assert_eq!(ctl.action("down", None, false).await, Outcome::Completed { steps: 0 });
    assert_eq!(dom.clicks().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn dynamic_keys_fall_back_to_the_document_without_a_focus_container() {
    let (dom, rows) = rows_dom();
    let cfg = config(
        r#"{
            "keys": ["down"],
            "hotKeyConfig": { "down": { "dynamic": true } },
            "operationControl": {
                "1": { "control": "ALL", "dynamicSelector": { "down": ".list .active" } }
            }
        }"#,
    );
    let (ctl, _kb) = controller(&dom, Options::new(cfg));
    ctl.set_focus_id(Some("1".into()));
    let (cb, notes) = recorder();

    let start = Instant::now();
    assert_eq!(ctl.action("down", Some(cb), true).await, Outcome::Completed { steps: 1 });
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(dom.clicks(), vec![rows[2]]);
    assert_eq!(*notes.lock(), vec![(Some(rows[2]), 0, "down".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn unconfigured_key_clicks_the_focus_container() {
    let dom = Arc::new(MemDom::new());
    let left = dom
        .append(
            Scope::Document,
            ElementSpec::new("section").class(&markers::bind_class("main", "left")),
        )
        .unwrap();
    let right = dom
        .append(Scope::Document, ElementSpec::new("section").class("right"))
        .unwrap();
    let (ctl, _kb) = controller(&dom, Options::new(config(CHAIN)));

    ctl.set_focus(Some(right));
    ctl.node(Some(left)).set_focus();
    assert!(dom.has_class(left, markers::FOCUS_CONTAINER));
    assert!(!dom.has_class(right, markers::FOCUS_CONTAINER));
    assert_eq!(ctl.focus_id().map(|id| id.to_string()), Some("main".to_string()));

    assert_eq!(ctl.action("3", None, false).await, Outcome::Completed { steps: 1 });
    assert_eq!(dom.clicks(), vec![left]);

    ctl.clear_focus();
    assert!(!dom.has_class(left, markers::FOCUS_CONTAINER));
}

#[tokio::test(start_paused = true)]
async fn node_handles_navigate_siblings() {
    let (dom, rows) = rows_dom();
    let (ctl, _kb) = controller(&dom, Options::new(config(DYNAMIC)));

    let first = ctl.find(".list .row", false).await;
    assert_eq!(first.current(), Some(rows[0]));
    assert_eq!(first.next(2).current(), Some(rows[2]));
    assert_eq!(first.next(2).prev(1).current(), Some(rows[1]));
    assert!(first.prev(1).is_empty());
    assert!(first.next(5).is_empty());

    let list = ctl.find(".list", false).await;
    let scoped = list.find(".row:2", false, false).await;
    assert_eq!(scoped.current(), Some(rows[2]));
    let fresh = scoped.find(".list", true, false).await;
    assert_eq!(fresh.current(), list.current());

    assert!(scoped.click("k"));
    assert!(!first.prev(1).click("k"));
    assert_eq!(dom.clicks(), vec![rows[2]]);
}

#[tokio::test(start_paused = true)]
async fn bound_keys_run_the_action_on_press() {
    let dom = chain_dom();
    let (ctl, keyboard) = controller(&dom, Options::new(config(CHAIN)));
    ctl.set_focus_id(Some("main".into()));

    assert_eq!(keyboard.press(&KeyEvent::new("1")), 1);
    sleep(Duration::from_millis(1)).await;
    assert_eq!(dom.clicks(), vec![q(&dom, ".a"), q(&dom, ".a .b")]);

    // Typing into a text field is ignored by the default filter.
    dom.clear_clicks();
    assert_eq!(keyboard.press(&KeyEvent::new("1").with_target("input", "")), 0);
    sleep(Duration::from_millis(1)).await;
    assert!(dom.clicks().is_empty());

    assert_eq!(ctl.unbind("1"), 1);
    assert_eq!(keyboard.press(&KeyEvent::new("1")), 0);
}

#[tokio::test(start_paused = true)]
async fn pressed_hook_and_filter_replace_defaults() {
    let dom = chain_dom();
    let pressed = Arc::new(Mutex::new(Vec::new()));
    let p = pressed.clone();
    let options = Options::new(config(CHAIN))
        .with_pressed(Arc::new(move |press: &Press, ctl: &Controller| {
            p.lock().push((press.shortcut.clone(), ctl.keys().len()));
        }))
        .with_filter(Arc::new(|ev: &KeyEvent| ev.key != "3"));
    let (_ctl, keyboard) = controller(&dom, options);

    assert_eq!(keyboard.press(&KeyEvent::new("1")), 1);
    assert_eq!(keyboard.press(&KeyEvent::new("3")), 0);
    // The custom filter replaced the form-field rule.
    assert_eq!(keyboard.press(&KeyEvent::new("2").with_target("textarea", "")), 1);
    sleep(Duration::from_millis(1)).await;

    assert_eq!(*pressed.lock(), vec![("1".to_string(), 3), ("2".to_string(), 3)]);
    assert!(dom.clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn extra_bindings_go_through_the_same_binder() {
    let dom = chain_dom();
    let (ctl, keyboard) = controller(&dom, Options::new(config(CHAIN)));
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    ctl.bind("ctrl+k", Arc::new(move |_: &Press| {
        h.fetch_add(1, Ordering::SeqCst);
    }))
    .unwrap();
    let event = KeyEvent::new("k").with_modifier(Modifier::Ctrl);
    assert_eq!(keyboard.press(&event), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(matches!(ctl.bind("ctrl+", Arc::new(|_: &Press| {})), Err(Error::Bind(_))));
}

#[tokio::test(start_paused = true)]
async fn listeners_can_be_removed() {
    let dom = chain_dom();
    let (ctl, _kb) = controller(&dom, Options::new(config(CHAIN)));
    ctl.set_focus_id(Some("main".into()));
    let (listener, notes) = recorder();
    let id = ctl.on(listener.clone());
    assert_eq!(ctl.on(listener), id);

    ctl.action("1", None, false).await;
    assert_eq!(notes.lock().len(), 2);
    assert!(ctl.off(id));
    ctl.action("1", None, false).await;
    assert_eq!(notes.lock().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn namespace_rejects_taken_handler_names() {
    let dom = chain_dom();
    let keyboard = Arc::new(Keyboard::new());
    let ns = Namespace::new();
    let mut cfg = config(CHAIN);
    cfg.handler = Some("hotKey".into());

    let first = ns
        .initialize(dom.clone(), keyboard.clone(), Options::new(cfg.clone()))
        .unwrap();
    let bound = keyboard.bound();
    let err = ns
        .initialize(dom.clone(), keyboard.clone(), Options::new(cfg))
        .unwrap_err();
    assert!(matches!(err, Error::HandlerConflict(ref name) if name == "hotKey"));
    assert_eq!(keyboard.bound(), bound);
    assert_eq!(ns.names(), vec!["hotKey"]);
    assert_eq!(ns.get("hotKey").map(|c| c.keys().to_vec()), Some(first.keys().to_vec()));

    // Anonymous controllers are never published.
    ns.initialize(dom, keyboard, Options::new(config(CHAIN))).unwrap();
    assert_eq!(ns.names().len(), 1);
    assert!(ns.remove("hotKey").is_some());
    assert!(ns.names().is_empty());
}

#[test]
fn invalid_config_is_rejected_before_binding() {
    let dom = Arc::new(MemDom::new());
    let keyboard = Arc::new(Keyboard::new());
    let mut cfg = config(CHAIN);
    cfg.keys.push("  ".into());
    let err = Controller::new(dom, keyboard.clone(), Options::new(cfg)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(keyboard.bound().is_empty());
}

#[test]
fn unparsable_keys_leave_the_binder_untouched() {
    let dom = Arc::new(MemDom::new());
    let keyboard = Arc::new(Keyboard::new());
    let fired = Arc::new(AtomicUsize::new(0));
    let f = fired.clone();
    keyboard
        .bind(
            "z",
            Arc::new(move |_: &Press| {
                f.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    let mut cfg = config(CHAIN);
    cfg.keys.push("ctrl+".into());
    let options = Options::new(cfg).with_filter(Arc::new(|_: &KeyEvent| false));
    let err = Controller::new(dom, keyboard.clone(), options).unwrap_err();
    assert!(matches!(err, Error::Bind(_)), "{err:?}");
    assert_eq!(keyboard.bound().len(), 1);

    assert_eq!(keyboard.press(&KeyEvent::new("z")), 1);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn diagnostics_report_misses_when_enabled() {
    let (layer, captured) = logging::capture::layer();
    let _guard = tracing::subscriber::set_default(registry().with(layer));

    let dom = Arc::new(MemDom::new());
    let mut cfg = config(CHAIN);
    cfg.log = true;
    let (ctl, _kb) = controller(&dom, Options::new(cfg));
    assert!(ctl.diagnostics().enabled());

    ctl.set_focus_id(Some("main".into()));
    ctl.action("1", None, false).await;
    let messages = captured.messages_for(domkey_engine::DIAGNOSTICS_TARGET);
    assert!(messages.contains(&"[hot-key]: 1".to_string()), "{messages:?}");
    assert!(captured.contains("[hot-key-warning]: not found hot key target of [.a]"));

    // Silent when disabled.
    captured.clear();
    let (quiet, _kb) = controller(&dom, Options::new(config(CHAIN)));
    quiet.set_focus_id(Some("main".into()));
    quiet.action("1", None, false).await;
    assert!(captured.messages_for(domkey_engine::DIAGNOSTICS_TARGET).is_empty());
}

#[tokio::test(start_paused = true)]
async fn observer_attaches_the_configured_callback() {
    let dom = chain_dom();
    let (plain, _kb) = controller(&dom, Options::new(config(CHAIN)));
    assert!(matches!(plain.observer(None, None), Err(Error::NoObserverCallback)));
    assert!(plain.observer_trigger().is_none());

    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let options = Options::new(config(CHAIN)).with_observer_callback(Arc::new(
        move |records: &[MutationRecord]| {
            h.fetch_add(records.len(), Ordering::SeqCst);
        },
    ));
    let (ctl, _kb) = controller(&dom, options);
    assert!(ctl.observer_trigger().is_some());

    let a = q(&dom, ".a");
    ctl.observer(Some(a), None).unwrap();
    dom.add_class(q(&dom, ".a .b"), "hit");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    dom.add_class(q(&dom, ".tab"), "elsewhere");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    ctl.set_focus(Some(a));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
