//! Integration tests for the shell run loop on a headless device

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use bridge_shell::app::input::{KeyCode, Modifiers};
use bridge_shell::app::{
    AppEvent, DefaultHooks, DeviceError, ElementId, Frame, GuiEnvironment, GuiEventKind,
    HeadlessDevice, HeadlessProbe, InitContext, Shell, ShellHooks,
};
use bridge_shell::config::AppConfig;
use bridge_shell::logger::{AppLogger, MemoryWriter};
use tempfile::TempDir;

fn memory_logger() -> (Rc<RefCell<AppLogger>>, MemoryWriter) {
    let memory = MemoryWriter::default();
    let mut logger = AppLogger::new();
    logger.enabled = true;
    logger.write_to_file = false;
    logger.write_to_interface = true;
    logger.set_write_interface(Box::new(memory.clone()));
    (logger.into_handle(), memory)
}

/// Script directory with `project.lua` holding `source`
fn scripts(source: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("project.lua"), source).expect("write startup script");
    dir
}

fn config_for(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.scripts.root = root.to_path_buf();
    config
}

fn shell<H: ShellHooks>(root: &Path, hooks: H) -> (Shell<H>, MemoryWriter) {
    let (logger, memory) = memory_logger();
    (Shell::new(config_for(root), hooks).with_logger(logger), memory)
}

/// Runs the shell on a headless device prepared by `setup`, returning the
/// exit code and the device probe
fn run_on<H, F>(shell: &mut Shell<H>, setup: F) -> (i32, HeadlessProbe)
where
    H: ShellHooks,
    F: FnOnce(HeadlessDevice) -> HeadlessDevice,
{
    let device = setup(HeadlessDevice::new(&shell.config().window));
    let probe = device.probe();
    let code = shell.run(move |_| Ok(device));
    (code, probe)
}

fn key(key: KeyCode, pressed: bool) -> AppEvent {
    AppEvent::Key {
        key,
        pressed,
        repeat: false,
        modifiers: Modifiers::default(),
    }
}

#[derive(Default)]
struct Recorder {
    inits: u32,
    pauses: u32,
    extra: Vec<AppEvent>,
}

impl ShellHooks for Recorder {
    fn init(&mut self, ctx: &mut InitContext<'_>) {
        self.inits += 1;
        ctx.engine
            .register_function("host_ping", |_, ()| Ok("pong"))
            .expect("register host_ping");
    }

    fn on_render_pause(&mut self) {
        self.pauses += 1;
    }

    fn on_extra_event(&mut self, event: &AppEvent) -> bool {
        self.extra.push(event.clone());
        true
    }
}

#[test]
fn missing_startup_script_exits_with_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut shell, memory) = shell(dir.path(), DefaultHooks);

    let (code, probe) = run_on(&mut shell, |d| d.with_frames(3));

    assert_eq!(code, 1);
    assert_eq!(probe.frames(), 0);
    assert!(probe.closed());
    assert!(memory.contains("File does not exist"));
}

#[test]
fn successful_run_renders_until_device_stops() {
    let dir = scripts("print('started')");
    let (mut shell, memory) = shell(dir.path(), DefaultHooks);

    let (code, probe) = run_on(&mut shell, |d| d.with_frames(4));

    assert_eq!(code, 0);
    assert_eq!(probe.frames(), 4);
    assert!(probe.closed());
    assert!(memory.contains("started"));
}

#[test]
fn script_error_exits_with_one() {
    let dir = scripts("error('boom')");
    let (mut shell, memory) = shell(dir.path(), DefaultHooks);

    let (code, probe) = run_on(&mut shell, |d| d.with_frames(2));

    assert_eq!(code, 1);
    assert_eq!(probe.frames(), 0);
    assert!(memory.contains("boom"));
}

#[test]
fn device_creation_failure_exits_with_one() {
    let dir = scripts("print('never')");
    let (mut shell, memory) = shell(dir.path(), DefaultHooks);

    let code = shell.run(|_| Err::<HeadlessDevice, _>(DeviceError::NoWindow));

    assert_eq!(code, 1);
    assert!(!memory.contains("never"));
}

#[test]
fn close_application_from_startup_sets_code() {
    let dir = scripts("close_application(3) print('unreachable')");
    let (mut shell, memory) = shell(dir.path(), DefaultHooks);

    let (code, probe) = run_on(&mut shell, |d| d.with_frames(5));

    assert_eq!(code, 3);
    assert_eq!(probe.frames(), 0);
    assert!(!memory.contains("unreachable"));
}

#[test]
fn close_application_with_bad_argument_keeps_code() {
    let dir = scripts("close_application('soon')");
    let (mut shell, memory) = shell(dir.path(), DefaultHooks);

    let (code, probe) = run_on(&mut shell, |d| d.with_frames(2));

    assert_eq!(code, 0);
    assert_eq!(probe.frames(), 0);
    assert!(memory.contains("close_application"));
}

#[test]
fn key_handler_can_close_the_application() {
    let dir = scripts(
        r#"
        on_event("key", function(e)
            if e.key == "Escape" and e.pressed then
                close_application(5)
            end
        end)
        "#,
    );
    let (mut shell, _memory) = shell(dir.path(), DefaultHooks);

    let (code, probe) = run_on(&mut shell, |device| {
        device
            .with_frames(1)
            .with_batch(vec![key(KeyCode::Enter, true)])
            .with_batch(vec![key(KeyCode::Escape, true)])
            .with_frames(10)
    });

    assert_eq!(code, 5);
    assert_eq!(probe.frames(), 2);
}

#[test]
fn unconsumed_events_reach_hooks() {
    let dir = scripts(
        r#"
        on_event("text", function(e) return e.text == "eaten" end)
        "#,
    );
    let (mut shell, _memory) = shell(dir.path(), Recorder::default());

    let (code, _probe) = run_on(&mut shell, |device| {
        device.with_batch(vec![
            AppEvent::Text {
                text: "eaten".to_string(),
            },
            AppEvent::Text {
                text: "left".to_string(),
            },
            AppEvent::Wheel { dx: 0.0, dy: 1.0 },
        ])
    });

    assert_eq!(code, 0);
    assert_eq!(shell.hooks().inits, 1);
    assert_eq!(
        shell.hooks().extra,
        vec![
            AppEvent::Text {
                text: "left".to_string()
            },
            AppEvent::Wheel { dx: 0.0, dy: 1.0 },
        ]
    );
}

#[test]
fn init_hook_registers_functions_before_startup() {
    let dir = scripts("print(host_ping())");
    let (mut shell, memory) = shell(dir.path(), Recorder::default());

    let (code, _probe) = run_on(&mut shell, |d| d.with_frames(1));

    assert_eq!(code, 0);
    assert!(memory.contains("pong"));
}

#[test]
fn paused_rendering_calls_the_pause_hook() {
    let dir = scripts("pause_rendering(true)");
    let (mut shell, _memory) = shell(dir.path(), Recorder::default());

    let (code, probe) = run_on(&mut shell, |d| d.with_frames(3));

    assert_eq!(code, 0);
    assert_eq!(probe.frames(), 0);
    assert_eq!(shell.hooks().pauses, 3);
}

#[test]
fn inactive_window_yields_when_pause_is_enabled() {
    let dir = scripts("print('idle')");
    let (mut shell, _memory) = shell(dir.path(), DefaultHooks);
    shell.parse_args(["--inactive-pause"]);
    assert!(shell.config().window.pause_when_inactive);

    let (code, probe) = run_on(&mut shell, |device| {
        device.with_active(false).with_frames(3)
    });

    assert_eq!(code, 0);
    assert_eq!(probe.yields(), 3);
    assert_eq!(probe.frames(), 0);
}

#[test]
fn inactive_window_keeps_rendering_without_pause_flag() {
    let dir = scripts("print('busy')");
    let (mut shell, _memory) = shell(dir.path(), DefaultHooks);

    let (_code, probe) = run_on(&mut shell, |device| {
        device.with_active(false).with_frames(2)
    });

    assert_eq!(probe.yields(), 0);
    assert_eq!(probe.frames(), 2);
}

#[test]
fn gui_events_reach_watchers() {
    let dir = scripts(
        r#"
        local win = gui.window("Main")
        local ok = gui.button("OK", win)
        gui.watch(ok, function(e)
            if e.action == "clicked" and gui.same(e.element, ok) then
                close_application(7)
            end
        end)
        "#,
    );
    let (mut shell, _memory) = shell(dir.path(), DefaultHooks);

    let (code, probe) = run_on(&mut shell, |device| {
        device
            .with_frames(1)
            .with_batch(vec![AppEvent::Gui {
                element: ElementId(2),
                kind: GuiEventKind::Clicked,
            }])
            .with_frames(3)
    });

    assert_eq!(code, 7);
    assert_eq!(probe.frames(), 1);
    assert_eq!(shell.gui().borrow().len(), 2);
}

#[test]
fn draw_hook_replaces_gui_drawing() {
    struct Counting(u32);

    impl ShellHooks for Counting {
        fn draw_all(&mut self, _frame: &mut Frame<'_>, _gui: &mut GuiEnvironment) {
            self.0 += 1;
        }
    }

    let dir = scripts("gui.label('hidden')");
    let (mut shell, _memory) = shell(dir.path(), Counting(0));

    let (code, probe) = run_on(&mut shell, |d| d.with_frames(2));

    assert_eq!(code, 0);
    assert_eq!(probe.frames(), 2);
    assert_eq!(shell.hooks().0, 2);
}

#[test]
fn required_modules_run_once() {
    let dir = scripts(
        r#"
        local a = require("lib/counter.lua")
        local b = require("lib/counter.lua")
        local c = import("lib/counter.lua")
        print("count " .. counter)
        "#,
    );
    fs::create_dir(dir.path().join("lib")).expect("mkdir");
    fs::write(
        dir.path().join("lib/counter.lua"),
        "counter = (counter or 0) + 1 return counter",
    )
    .expect("write module");
    let (mut shell, memory) = shell(dir.path(), DefaultHooks);

    let (code, _probe) = run_on(&mut shell, |d| d.with_frames(1));

    assert_eq!(code, 0);
    assert!(memory.contains("count 2"), "{:?}", memory.lines());
}

#[test]
fn ignored_bad_gui_calls_let_the_script_continue() {
    let dir = scripts("local w = gui.window('x') gui.set_text(w, {}) print('after')");
    let (logger, memory) = memory_logger();
    let mut config = config_for(dir.path());
    config.scripts.ignore_bad_foreign_calls = true;
    let mut shell = Shell::new(config, DefaultHooks).with_logger(logger);

    let (code, probe) = run_on(&mut shell, |d| d.with_frames(1));

    assert_eq!(code, 0);
    assert_eq!(probe.frames(), 1);
    assert!(memory.contains("after"), "{:?}", memory.lines());
    assert!(!memory.contains("STACK TRACE"));
}

#[test]
fn bad_gui_calls_abort_the_script_by_default() {
    let dir = scripts("local w = gui.window('x') gui.set_text(w, {}) print('after')");
    let (mut shell, memory) = shell(dir.path(), DefaultHooks);

    let (code, probe) = run_on(&mut shell, |d| d.with_frames(1));

    assert_eq!(code, 1);
    assert_eq!(probe.frames(), 0);
    assert!(!memory.contains("after"));
}

#[test]
fn second_run_starts_with_fresh_requests() {
    let dir = scripts("pause_rendering(true) close_application(2)");
    let (mut shell, memory) = shell(dir.path(), DefaultHooks);

    let (code, probe) = run_on(&mut shell, |d| d.with_frames(3));
    assert_eq!(code, 2);
    assert_eq!(probe.frames(), 0);

    fs::write(dir.path().join("project.lua"), "print('second')").expect("rewrite startup");
    let (code, probe) = run_on(&mut shell, |d| d.with_frames(2));

    assert_eq!(code, 2);
    assert_eq!(probe.frames(), 2);
    assert!(memory.contains("second"));
}
