// Overlay status bar - Wayland Layer Shell implementation
//
// One process owns the overlay surface, the 1-second update loop, and the
// battery watcher, all serialized on a single calloop event loop. `start`
// and `stop` are idempotent through a pidfile guard.

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use smithay_client_toolkit::reexports::calloop_wayland_source::WaylandSource;
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_layer, delegate_output, delegate_registry, delegate_shm,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    shell::{
        wlr_layer::{
            Anchor, KeyboardInteractivity, Layer, LayerShell, LayerShellHandler, LayerSurface,
            LayerSurfaceConfigure,
        },
        WaylandSurface,
    },
    shm::{Shm, ShmHandler},
};
use wayland_client::{
    globals::{registry_queue_init, GlobalList},
    protocol::{wl_output, wl_surface},
    Connection, QueueHandle,
};

use overlay_statusbar::{
    battery, control, fields, net, tick,
    control::{Acquire, PidFile},
    error::BarError,
    BarRenderer, BatteryMonitor, BatteryReader, BufferPool, DisplayFields, OverlaySurface,
    RxCounter, SpeedEstimator, TextRenderer, Theme, UpdateFlags, BAR_HEIGHT, BAR_WIDTH,
};

/// Main application state
struct StatusBar {
    // Wayland states
    registry_state: RegistryState,
    output_state: OutputState,
    compositor_state: CompositorState,
    shm_state: Shm,
    layer_shell: LayerShell,

    // The single overlay surface
    surface: OverlaySurface,

    // Rendering
    renderer: BarRenderer,

    // Display state
    fields: DisplayFields,
    theme: Theme,

    // Platform readers
    speed: SpeedEstimator,
    rx_counter: RxCounter,
    battery: BatteryMonitor,

    // Exit coordination
    loop_signal: calloop::LoopSignal,
}

impl StatusBar {
    #[allow(clippy::too_many_arguments)]
    fn new(
        registry_state: RegistryState,
        output_state: OutputState,
        compositor_state: CompositorState,
        shm_state: Shm,
        layer_shell: LayerShell,
        renderer: BarRenderer,
        loop_signal: calloop::LoopSignal,
    ) -> Self {
        Self {
            registry_state,
            output_state,
            compositor_state,
            shm_state,
            layer_shell,
            surface: OverlaySurface::new(),
            renderer,
            fields: DisplayFields::new(),
            theme: Theme::for_hour(fields::local_hour(&Local::now())),
            speed: SpeedEstimator::new(),
            rx_counter: RxCounter::new(),
            battery: BatteryMonitor::new(BatteryReader::new()),
            loop_signal,
        }
    }

    /// Create and attach the overlay surface: fixed 320x36, top-left,
    /// above application content, non-focusable, reserving no space.
    fn attach_overlay(&mut self, qh: &QueueHandle<Self>) {
        if self.surface.is_attached() {
            tracing::warn!("Overlay already attached, ignoring start");
            return;
        }

        let wl_surface = self.compositor_state.create_surface(qh);
        let layer = self.layer_shell.create_layer_surface(
            qh,
            wl_surface,
            Layer::Overlay,
            Some("overlay-statusbar"),
            None, // Compositor picks the output
        );

        layer.set_anchor(Anchor::TOP | Anchor::LEFT);
        layer.set_size(BAR_WIDTH, BAR_HEIGHT);
        layer.set_margin(0, 0, 0, 0);
        layer.set_keyboard_interactivity(KeyboardInteractivity::None);
        layer.set_exclusive_zone(-1); // Don't reserve space
        layer.commit();

        self.surface.set_attached(layer);
        tracing::info!(width = %BAR_WIDTH, height = %BAR_HEIGHT, "Overlay surface attached");
    }

    /// One updater tick: clock every time, network/speed/theme when the
    /// slow gate holds, then a redraw.
    fn tick(&mut self) {
        let now = Local::now();
        let now_ms = Utc::now().timestamp_millis() as u64;
        let flags = UpdateFlags::for_tick(now_ms);

        self.fields.clock = fields::format_clock(&now);

        if flags.network {
            self.fields.network = net::classify_active_network().glyph().to_string();
            let bytes = self.rx_counter.total_rx_bytes();
            let rate = self.speed.sample(bytes, now_ms);
            self.fields.speed = net::format_speed(rate);
        }

        if flags.theme {
            self.theme = Theme::for_hour(fields::local_hour(&now));
        }

        if flags.needs_redraw() {
            self.draw();
        }
    }

    /// Battery watcher callback; redraws only when the level changed
    fn poll_battery(&mut self) {
        if let Some(percent) = self.battery.poll() {
            self.fields.battery = battery::format_battery(percent);
            self.draw();
        }
    }

    fn draw(&mut self) {
        if !self.surface.is_configured() {
            return;
        }

        if self.surface.buffer_pool_mut().is_none() {
            match BufferPool::new(BAR_WIDTH, BAR_HEIGHT, &self.shm_state) {
                Ok(pool) => *self.surface.buffer_pool_mut() = Some(pool),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create buffer pool, skipping frame");
                    return;
                }
            }
        }

        let Some((layer, pool)) = self.surface.render_parts() else {
            return;
        };

        let (buffer, canvas) = match pool.get_buffer() {
            Ok(buf) => buf,
            Err(e) => {
                tracing::error!(error = %e, "Failed to get buffer, skipping frame");
                return;
            }
        };

        self.renderer
            .render(canvas, BAR_WIDTH, BAR_HEIGHT, &self.fields, &self.theme);

        layer
            .wl_surface()
            .damage_buffer(0, 0, BAR_WIDTH as i32, BAR_HEIGHT as i32);

        if let Err(e) = buffer.attach_to(layer.wl_surface()) {
            tracing::error!(error = %e, "Failed to attach buffer to surface");
            return;
        }

        layer.wl_surface().commit();
    }

    fn request_stop(&mut self) {
        self.loop_signal.stop();
        self.loop_signal.wakeup();
    }

    /// Detach the surface; safe to repeat
    fn teardown(&mut self) {
        self.surface.detach();
    }
}

impl CompositorHandler for StatusBar {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {
    }

    fn frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
        self.draw();
    }
}

impl OutputHandler for StatusBar {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }

    fn update_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }

    fn output_destroyed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }
}

impl LayerShellHandler for StatusBar {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        tracing::info!("Layer surface closed by compositor");
        self.surface.detach();
        self.request_stop();
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _layer: &LayerSurface,
        configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        // Geometry is fixed; the compositor echoes it back
        tracing::info!(
            width = %configure.new_size.0,
            height = %configure.new_size.1,
            "Surface configured"
        );
        self.surface.mark_configured();
        self.draw();
    }
}

impl ShmHandler for StatusBar {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm_state
    }
}

impl ProvidesRegistryState for StatusBar {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }
    registry_handlers![OutputState];
}

delegate_compositor!(StatusBar);
delegate_output!(StatusBar);
delegate_shm!(StatusBar);
delegate_layer!(StatusBar);
delegate_registry!(StatusBar);

/// The layer-shell global is this platform's "draw over other apps"
/// capability. A compositor without it denies the overlay outright: the
/// denial is user-visible and terminal, with no retry.
fn ensure_overlay_permission(
    globals: &GlobalList,
    qh: &QueueHandle<StatusBar>,
) -> Result<LayerShell> {
    match LayerShell::bind(globals, qh) {
        Ok(shell) => {
            tracing::debug!("Overlay permission granted (layer shell available)");
            Ok(shell)
        }
        Err(e) => {
            let err = BarError::PermissionDenied(format!(
                "compositor does not support zwlr_layer_shell_v1 ({})",
                e
            ));
            tracing::error!("{} - the status bar cannot start", err);
            Err(err.into())
        }
    }
}

enum Command {
    Start,
    Stop,
}

fn parse_command() -> Result<Command> {
    match std::env::args().nth(1).as_deref() {
        None | Some("start") => Ok(Command::Start),
        Some("stop") => Ok(Command::Stop),
        Some(other) => {
            anyhow::bail!("unknown command '{}' (expected 'start' or 'stop')", other)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let pidfile_path = control::default_pidfile()?;

    match parse_command()? {
        Command::Stop => {
            match control::stop(&pidfile_path)? {
                Some(pid) => tracing::info!(pid = %pid, "Status bar stopping"),
                None => tracing::info!("Status bar is not running"),
            }
            Ok(())
        }
        Command::Start => match control::acquire(&pidfile_path)? {
            Acquire::AlreadyRunning(pid) => {
                tracing::info!(pid = %pid, "Status bar already running");
                Ok(())
            }
            Acquire::Acquired(pidfile) => run(pidfile),
        },
    }
}

fn run(pidfile: PidFile) -> Result<()> {
    tracing::info!("Starting overlay status bar");

    let conn = Connection::connect_to_env()
        .context("Failed to connect to Wayland compositor. Is a Wayland compositor running?")?;

    let (globals, event_queue) =
        registry_queue_init(&conn).context("Failed to initialize Wayland registry")?;
    let qh = event_queue.handle();

    let registry_state = RegistryState::new(&globals);
    let output_state = OutputState::new(&globals, &qh);
    let compositor_state =
        CompositorState::bind(&globals, &qh).context("wl_compositor protocol not available")?;
    let shm_state = Shm::bind(&globals, &qh).context("wl_shm protocol not available")?;

    // Permission gate: no layer shell, no overlay
    let layer_shell = ensure_overlay_permission(&globals, &qh)?;

    let renderer = BarRenderer::new(TextRenderer::new()?);

    let mut event_loop =
        calloop::EventLoop::<StatusBar>::try_new().context("Failed to create event loop")?;

    let mut bar = StatusBar::new(
        registry_state,
        output_state,
        compositor_state,
        shm_state,
        layer_shell,
        renderer,
        event_loop.get_signal(),
    );

    bar.attach_overlay(&qh);

    WaylandSource::new(conn.clone(), event_queue)
        .insert(event_loop.handle())
        .context("Failed to insert Wayland event source into event loop")?;

    // The 1-second updater, first tick immediately
    let tick_timer = calloop::timer::Timer::immediate();
    let tick_token = event_loop
        .handle()
        .insert_source(tick_timer, |_deadline, _metadata, bar: &mut StatusBar| {
            bar.tick();
            calloop::timer::TimeoutAction::ToDuration(tick::TICK_INTERVAL)
        })
        .map_err(|e| anyhow::anyhow!("Failed to insert tick timer: {:?}", e))?;

    // Battery watcher; the immediate first poll mirrors the sticky
    // change notification delivered on registration
    let battery_timer = calloop::timer::Timer::immediate();
    let battery_token = event_loop
        .handle()
        .insert_source(battery_timer, |_deadline, _metadata, bar: &mut StatusBar| {
            bar.poll_battery();
            calloop::timer::TimeoutAction::ToDuration(tick::BATTERY_POLL_INTERVAL)
        })
        .map_err(|e| anyhow::anyhow!("Failed to insert battery timer: {:?}", e))?;

    // Graceful shutdown on SIGINT (^C) and SIGTERM (`overlay-statusbar stop`)
    let signals = calloop::signals::Signals::new(&[
        calloop::signals::Signal::SIGINT,
        calloop::signals::Signal::SIGTERM,
    ])
    .context("Failed to create signal handler for graceful shutdown")?;
    event_loop
        .handle()
        .insert_source(signals, |event, _metadata, bar: &mut StatusBar| {
            tracing::info!(signal = ?event.signal(), "Received stop signal, exiting");
            bar.request_stop();
        })
        .map_err(|e| anyhow::anyhow!("Failed to insert signal handler: {:?}", e))?;

    tracing::info!("Event loop starting");
    event_loop
        .run(None, &mut bar, |_| {})
        .context("Event loop dispatch error")?;

    // Teardown: cancel the repeating sources, detach the surface, drop the
    // pidfile. None of these may abort the shutdown.
    event_loop.handle().remove(tick_token);
    event_loop.handle().remove(battery_token);
    bar.teardown();
    let _ = conn.flush();
    drop(pidfile);

    tracing::info!("Status bar stopped");
    Ok(())
}
